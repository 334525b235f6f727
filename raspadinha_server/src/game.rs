use crate::error::AppResult;
use crate::AppState;
use axum::{extract::State, Json};
use raspadinha_core::{GameState, KycData};
use raspadinha_shared::{
    ChanceResponse, DepositRequest, DepositResponse, KycStep1Request, RevealRequest,
    RevealResponse, RoundResponse, StateResponse,
};
use std::sync::Arc;
use tracing::{error, info};

pub async fn route_state(State(state): State<Arc<AppState>>) -> AppResult<Json<StateResponse>> {
    let mut game = state.game()?;
    let next_round_chance = game.next_round_chance();
    Ok(Json(StateResponse {
        state: game.state().clone(),
        current_card: game.current_card().cloned(),
        next_round_chance,
        pending_iphone: game.has_pending_iphone(),
    }))
}

pub async fn route_chance(State(state): State<Arc<AppState>>) -> AppResult<Json<ChanceResponse>> {
    let mut game = state.game()?;
    Ok(Json(ChanceResponse {
        round: game.state().next_round(),
        chance: game.next_round_chance(),
    }))
}

pub async fn route_start_round(
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<RoundResponse>> {
    let mut game = state.game()?;
    let card = game.start_round()?.clone();
    info!(card = %card.id, round = game.state().scratch_cards_used, "card dealt");
    Ok(Json(RoundResponse {
        card,
        state: game.state().clone(),
    }))
}

pub async fn route_reveal(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RevealRequest>,
) -> AppResult<Json<RevealResponse>> {
    let reveal = state.game()?.reveal(req.block)?;
    Ok(Json(RevealResponse {
        block: reveal.block,
        symbol: reveal.symbol,
        winning_line: reveal.winning_line,
        fully_revealed: reveal.fully_revealed,
    }))
}

pub async fn route_complete_round(
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<RoundResponse>> {
    let mut game = state.game()?;
    let card = game.complete_round()?;
    info!(card = %card.id, won = card.has_won, balance = %game.state().balance, "card completed");
    Ok(Json(RoundResponse {
        card,
        state: game.state().clone(),
    }))
}

/// Issues a fictional charge and credits it after the fixed confirmation delay.
pub async fn route_deposit(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DepositRequest>,
) -> AppResult<Json<DepositResponse>> {
    let pix = state.game()?.request_deposit(req.amount, chrono::Utc::now())?;
    let delay = state.config.payment_delay;

    let pending = pix.clone();
    let app = state.clone();
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        let credited = match app.game() {
            Ok(mut game) => game.confirm_deposit(&pending).map(|_| ()).map_err(|e| e.to_string()),
            Err(e) => Err(e.0.to_string()),
        };
        if let Err(e) = credited {
            error!(transaction = %pending.transaction_id, error = %e, "failed to credit deposit");
        }
    });

    Ok(Json(DepositResponse {
        pix,
        confirms_in_ms: delay.as_millis() as u64,
    }))
}

pub async fn route_acknowledge_iphone(
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<GameState>> {
    let mut game = state.game()?;
    Ok(Json(game.acknowledge_iphone_win()?.clone()))
}

pub async fn route_kyc_step1(
    State(state): State<Arc<AppState>>,
    Json(req): Json<KycStep1Request>,
) -> AppResult<Json<GameState>> {
    req.validate()?;
    let data = KycData {
        cpf: req.cpf,
        full_name: req.full_name,
        birth_date: req.birth_date,
    };
    let mut game = state.game()?;
    Ok(Json(game.complete_kyc_step1(data)?.clone()))
}

pub async fn route_kyc_step2(State(state): State<Arc<AppState>>) -> AppResult<Json<GameState>> {
    let mut game = state.game()?;
    Ok(Json(game.complete_kyc_step2()?.clone()))
}
