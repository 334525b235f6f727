use axum::{
    routing::{get, post},
    Router,
};
use raspadinha_core::{EntropySource, FileStore, GameStore, RoundController};
use raspadinha_shared::ApiError;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod game;
mod pixup;

use config::ServerConfig;
use error::AppError;

pub type Game = RoundController<Box<dyn GameStore + Send>, EntropySource>;

pub struct AppState {
    game: Mutex<Game>,
    db: SqlitePool,
    http: reqwest::Client,
    config: ServerConfig,
}

impl AppState {
    pub fn new(game: Game, db: SqlitePool, config: ServerConfig) -> Self {
        Self {
            game: Mutex::new(game),
            db,
            http: reqwest::Client::new(),
            config,
        }
    }

    /// The single game state; never held across an await.
    pub fn game(&self) -> Result<MutexGuard<'_, Game>, AppError> {
        self.game.lock().map_err(|_| {
            error!("game state lock poisoned");
            AppError(ApiError::Internal)
        })
    }
}

async fn init_db(db: &SqlitePool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(db).await?;
    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/state", get(game::route_state))
        .route("/chance", get(game::route_chance))
        .route("/rounds", post(game::route_start_round))
        .route("/rounds/current/reveal", post(game::route_reveal))
        .route("/rounds/current/complete", post(game::route_complete_round))
        .route("/deposits", post(game::route_deposit))
        .route("/prizes/iphone/acknowledge", post(game::route_acknowledge_iphone))
        .route("/kyc/step1", post(game::route_kyc_step1))
        .route("/kyc/step2", post(game::route_kyc_step2))
        .route(
            "/api/pixup/token",
            post(pixup::route_token).fallback(pixup::method_not_allowed),
        )
        .route(
            "/api/pixup/qrcode",
            post(pixup::route_qrcode).fallback(pixup::method_not_allowed),
        )
        .route(
            "/api/pixup/webhook",
            post(pixup::route_webhook).fallback(pixup::method_not_allowed),
        )
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();
    let config = ServerConfig::from_env();

    let db = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    init_db(&db).await?;

    let store: Box<dyn GameStore + Send> = Box::new(FileStore::new(&config.state_dir));
    let game = RoundController::open(store, EntropySource::new());
    info!(
        balance = %game.state().balance,
        rounds = game.state().scratch_cards_used,
        state_dir = %config.state_dir.display(),
        "game state ready"
    );

    let addr = config.bind.clone();
    let state = Arc::new(AppState::new(game, db, config));
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("listening on {addr}");
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PixupConfig;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request, StatusCode};
    use raspadinha_core::{GameState, MemoryStore, Money};
    use raspadinha_shared::Payer;
    use serde_json::{json, Value};
    use std::time::Duration;
    use tower::ServiceExt;

    fn test_config(payment_delay: Duration) -> ServerConfig {
        ServerConfig {
            bind: "127.0.0.1:0".into(),
            database_url: "sqlite::memory:".into(),
            state_dir: ".".into(),
            payment_delay,
            pixup: PixupConfig {
                api_url: None,
                client_id: None,
                client_secret: None,
                public_base_url: None,
                payer: Payer {
                    name: String::new(),
                    email: String::new(),
                    document: String::new(),
                },
            },
        }
    }

    async fn test_state(balance: Money) -> Arc<AppState> {
        let db = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        init_db(&db).await.unwrap();
        let store = MemoryStore::new();
        store.save(&GameState::with_balance(balance)).unwrap();
        let store: Box<dyn GameStore + Send> = Box::new(store);
        let game = RoundController::open(store, EntropySource::seeded(7));
        Arc::new(AppState::new(game, db, test_config(Duration::ZERO)))
    }

    async fn call(state: &Arc<AppState>, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(v) => {
                req = req.header("content-type", "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };
        let res = router(state.clone())
            .oneshot(req.body(body).unwrap())
            .await
            .unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn broke_player_gets_payment_required() {
        let state = test_state(Money::from_reais(4)).await;
        let (status, body) = call(&state, Method::POST, "/rounds", None).await;
        assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
        assert!(body["error"].as_str().unwrap().contains("insufficient balance"));
        let (_, body) = call(&state, Method::GET, "/state", None).await;
        assert_eq!(body["state"]["balance"], json!(4.0));
        assert_eq!(body["state"]["scratchCardsUsed"], json!(0));
        assert_eq!(body["nextRoundChance"], json!(25));
    }

    #[tokio::test]
    async fn full_round_over_http() {
        let state = test_state(Money::from_reais(10)).await;
        let (status, body) = call(&state, Method::POST, "/rounds", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"]["balance"], json!(5.1));
        assert_eq!(body["card"]["hasWon"], json!(false));

        let (status, _) = call(&state, Method::POST, "/rounds", None).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, body) = call(&state, Method::POST, "/rounds/current/reveal", Some(json!({"block": 4}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["winningLine"], Value::Null);

        let (status, body) = call(&state, Method::POST, "/rounds/current/complete", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["card"]["isCompleted"], json!(true));

        let (status, _) = call(&state, Method::POST, "/rounds/current/complete", None).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn deposit_is_credited_after_delay() {
        let state = test_state(Money::ZERO).await;
        let (status, _) = call(&state, Method::POST, "/deposits", Some(json!({"amount": 10}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = call(&state, Method::POST, "/deposits", Some(json!({"amount": 25.5}))).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["pix"]["transactionId"].as_str().unwrap().starts_with("TXN"));

        let mut credited = false;
        for _ in 0..50 {
            tokio::time::sleep(Duration::from_millis(10)).await;
            if state.game().unwrap().state().balance == Money::from_cents(2550) {
                credited = true;
                break;
            }
        }
        assert!(credited);
    }

    #[tokio::test]
    async fn kyc_checks_format() {
        let state = test_state(Money::ZERO).await;
        let bad = json!({"cpf": "123", "fullName": "Ana Souza", "birthDate": "01/01/1990"});
        let (status, _) = call(&state, Method::POST, "/kyc/step1", Some(bad)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let good = json!({"cpf": "529.982.247-25", "fullName": "Ana Souza", "birthDate": "01/01/1990"});
        let (status, body) = call(&state, Method::POST, "/kyc/step1", Some(good)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["kycStep1Complete"], json!(true));
        assert_eq!(body["kycData"]["fullName"], json!("Ana Souza"));

        let (_, body) = call(&state, Method::POST, "/kyc/step2", None).await;
        assert_eq!(body["kycVerified"], json!(true));
    }

    #[tokio::test]
    async fn iphone_acknowledge_without_win_conflicts() {
        let state = test_state(Money::ZERO).await;
        let (status, _) = call(&state, Method::POST, "/prizes/iphone/acknowledge", None).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn webhook_is_acknowledged_and_logged() {
        let state = test_state(Money::ZERO).await;
        let event = json!({"requestBody": {"status": "PAID", "transactionId": "t-1", "external_id": "42", "amount": 30.0}});
        let (status, body) = call(&state, Method::POST, "/api/pixup/webhook", Some(event)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"received": true}));

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM pix_webhooks WHERE status = 'PAID'")
            .fetch_one(&state.db)
            .await
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(state.game().unwrap().state().balance, Money::ZERO);
    }

    #[tokio::test]
    async fn pixup_relay_guards() {
        let state = test_state(Money::ZERO).await;
        let (status, body) = call(&state, Method::GET, "/api/pixup/token", None).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body["error"], json!("Method not allowed"));

        let (status, body) = call(&state, Method::POST, "/api/pixup/token", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], json!("Configuração Pix Up incompleta"));

        let (status, body) = call(&state, Method::POST, "/api/pixup/qrcode", Some(json!({"amount": 20}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], json!("amount e external_id são obrigatórios"));
    }

    #[tokio::test]
    async fn webhook_with_numeric_ids_is_logged_as_paid() {
        let state = test_state(Money::ZERO).await;
        let event = json!({"requestBody": {"status": "PAID", "transactionId": 77, "external_id": 42, "amount": "30.00"}});
        let (status, body) = call(&state, Method::POST, "/api/pixup/webhook", Some(event)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"received": true}));

        let (status, external_id, amount): (Option<String>, Option<String>, Option<f64>) =
            sqlx::query_as("SELECT status, external_id, amount FROM pix_webhooks")
                .fetch_one(&state.db)
                .await
                .unwrap();
        assert_eq!(status.as_deref(), Some("PAID"));
        assert_eq!(external_id.as_deref(), Some("42"));
        assert_eq!(amount, Some(30.0));
    }

    #[tokio::test]
    async fn webhook_is_acknowledged_when_log_fails() {
        let state = test_state(Money::ZERO).await;
        sqlx::query("DROP TABLE pix_webhooks")
            .execute(&state.db)
            .await
            .unwrap();
        let event = json!({"requestBody": {"status": "PAID", "external_id": "9"}});
        let (status, body) = call(&state, Method::POST, "/api/pixup/webhook", Some(event)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"received": true}));
    }
}
