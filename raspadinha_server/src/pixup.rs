//! Thin relay to the Pix Up provider plus its webhook receiver.
//!
//! None of this touches the game state: deposits are credited by the simulated
//! flow in `game::route_deposit` regardless of what the provider reports.

use crate::error::{AppError, AppResult};
use crate::AppState;
use axum::{extract::State, http::StatusCode, Json};
use axum_extra::{headers::Host, TypedHeader};
use raspadinha_shared::{
    value_number, value_text, ApiError, PixChargeRequest, QrCodeRequest, WebhookAck,
    WebhookEnvelope, WebhookEvent,
};
use serde_json::Value;
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{error, info};

type Passthrough = (StatusCode, Json<Value>);

fn status_of(res: &reqwest::Response) -> StatusCode {
    StatusCode::from_u16(res.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY)
}

async fn json_body(res: reqwest::Response) -> AppResult<Value> {
    let text = res.text().await?;
    Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
}

/// Fetches an OAuth token with the configured client credentials.
async fn fetch_token(state: &AppState) -> AppResult<(StatusCode, Value)> {
    let cfg = &state.config.pixup;
    let (Some(api_url), Some(id), Some(secret)) = (&cfg.api_url, &cfg.client_id, &cfg.client_secret)
    else {
        return Err(ApiError::Misconfigured("Configuração Pix Up incompleta".into()).into());
    };
    let res = state
        .http
        .post(format!("{api_url}/oauth/token"))
        .basic_auth(id, Some(secret))
        .header("Content-Type", "application/json")
        .send()
        .await?;
    let status = status_of(&res);
    Ok((status, json_body(res).await?))
}

pub async fn route_token(State(state): State<Arc<AppState>>) -> AppResult<Passthrough> {
    let (status, body) = fetch_token(&state).await?;
    Ok((status, Json(body)))
}

fn base_url(state: &AppState, host: Option<TypedHeader<Host>>) -> String {
    if let Some(url) = &state.config.pixup.public_base_url {
        return url.clone();
    }
    match host {
        Some(TypedHeader(host)) => match host.port() {
            Some(port) => format!("https://{}:{}", host.hostname(), port),
            None => format!("https://{}", host.hostname()),
        },
        None => format!("http://{}", state.config.bind),
    }
}

fn as_amount(v: &Value) -> Option<f64> {
    value_number(v).filter(|a| *a > 0.0)
}

pub async fn route_qrcode(
    State(state): State<Arc<AppState>>,
    host: Option<TypedHeader<Host>>,
    Json(req): Json<QrCodeRequest>,
) -> AppResult<Passthrough> {
    let amount = req.amount.as_ref().and_then(as_amount);
    let external_id = req.external_id.as_ref().and_then(value_text);
    let (Some(amount), Some(external_id)) = (amount, external_id) else {
        return Err(ApiError::BadRequest("amount e external_id são obrigatórios".into()).into());
    };

    let (_, token) = fetch_token(&state).await?;
    let Some(access_token) = token
        .get("access_token")
        .and_then(Value::as_str)
        .map(str::to_owned)
    else {
        return Err(ApiError::Upstream {
            status: 400,
            message: "Falha ao gerar token Pix Up".into(),
            body: Some(token),
        }
        .into());
    };

    let base = base_url(&state, host);
    let charge = PixChargeRequest {
        amount,
        payer_question: format!("Pagamento do pedido #{external_id}"),
        external_id,
        payer: state.config.pixup.payer.clone(),
        postback_url: format!("{base}/api/pixup/webhook"),
    };
    // fetch_token already checked the configuration
    let api_url = state.config.pixup.api_url.as_deref().unwrap_or_default();
    let res = state
        .http
        .post(format!("{api_url}/pix/qrcode"))
        .bearer_auth(access_token)
        .json(&charge)
        .send()
        .await?;
    let status = status_of(&res);
    info!(external_id = %charge.external_id, %status, "pix qrcode requested");
    Ok((status, Json(json_body(res).await?)))
}

async fn log_webhook(db: &SqlitePool, event: &WebhookEvent, payload: &Value) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO pix_webhooks (ts, status, transaction_id, external_id, amount, payload_json) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(chrono::Utc::now().to_rfc3339())
    .bind(&event.status)
    .bind(&event.transaction_id)
    .bind(&event.external_id)
    .bind(event.amount)
    .bind(payload.to_string())
    .execute(db)
    .await?;
    Ok(())
}

pub async fn route_webhook(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> AppResult<Json<WebhookAck>> {
    let payload = body.get("requestBody").cloned().unwrap_or(Value::Null);
    let event = serde_json::from_value::<WebhookEnvelope>(body)
        .ok()
        .and_then(|e| e.request_body)
        .unwrap_or_default();
    info!(payload = %payload, "pix webhook received");

    if event.is_paid() {
        info!(
            transaction = ?event.transaction_id,
            external_id = ?event.external_id,
            amount = ?event.amount,
            approved_at = ?event.date_approval,
            payer = ?event.credit_party,
            "payment confirmed"
        );
    }

    if let Err(e) = log_webhook(&state.db, &event, &payload).await {
        error!(error = %e, "failed to store pix webhook");
    }
    Ok(Json(WebhookAck { received: true }))
}

pub async fn method_not_allowed() -> AppError {
    AppError(ApiError::MethodNotAllowed)
}
