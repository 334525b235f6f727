use crate::{
    card::{generate_losing_card, generate_winning_card, ScratchCard},
    error::{GameError, GameResult},
    money::Money,
    outcome::{decide_outcome, PrizeType, CARD_COST},
    rng::RandomSource,
    state::{GameState, KycData},
};
use tracing::debug;

/// Debits one card and deals it. The debit happens regardless of the outcome.
pub fn start_round<R: RandomSource + ?Sized>(
    state: &GameState,
    rng: &mut R,
) -> GameResult<(ScratchCard, GameState)> {
    let balance = state
        .balance
        .checked_sub(CARD_COST)
        .ok_or(GameError::InsufficientBalance {
            balance: state.balance,
            cost: CARD_COST,
        })?;
    let round = state
        .scratch_cards_used
        .checked_add(1)
        .ok_or(GameError::RoundLimit(state.scratch_cards_used))?;
    let outcome = decide_outcome(round, rng);
    let card = if outcome.should_win {
        generate_winning_card(outcome.prize_amount, outcome.prize_type, rng)
    } else {
        generate_losing_card(rng)
    };
    debug!(round, won = card.has_won, card = %card.id, "round started");
    let next = GameState {
        balance,
        scratch_cards_used: round,
        ..state.clone()
    };
    Ok((card, next))
}

/// Applies a finished card. iPhone wins only set the flag; the credit comes on acknowledgement.
pub fn complete_round(card: &ScratchCard, state: &GameState) -> GameState {
    let mut next = state.clone();
    if !card.has_won {
        return next;
    }
    match card.prize_type {
        Some(PrizeType::Iphone) => {
            next.has_won_iphone = true;
            next.iphone_credit_pending = true;
        }
        Some(PrizeType::Airpods) | Some(PrizeType::Money) | None => {
            if let Some(amount) = card.prize_amount {
                next.balance += amount;
            }
        }
    }
    next
}

pub fn add_balance(state: &GameState, amount: Money) -> GameState {
    GameState {
        balance: state.balance + amount,
        ..state.clone()
    }
}

pub fn complete_kyc_step1(state: &GameState, data: KycData) -> GameState {
    GameState {
        kyc_step1_complete: true,
        kyc_data: Some(data),
        ..state.clone()
    }
}

pub fn complete_kyc_step2(state: &GameState) -> GameState {
    GameState {
        kyc_step2_complete: true,
        kyc_verified: true,
        ..state.clone()
    }
}
