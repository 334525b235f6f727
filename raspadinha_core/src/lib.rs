pub mod card;
pub mod controller;
pub mod error;
pub mod money;
pub mod outcome;
pub mod pix;
pub mod rng;
pub mod round;
pub mod simulate;
pub mod state;
pub mod store;
pub mod symbols;

pub use crate::card::{generate_losing_card, generate_winning_card, Position, ScratchBlock, ScratchCard};
pub use crate::controller::{Reveal, RoundController};
pub use crate::error::{GameError, GameResult, StoreError};
pub use crate::money::Money;
pub use crate::outcome::{
    decide_outcome, display_chance, Outcome, PrizeType, AIRPODS_PRIZE_VALUE, CARD_COST,
    IPHONE_PRIZE_VALUE, MONEY_PRIZES,
};
pub use crate::pix::{create_fictional_pix, FictionalPix, MIN_DEPOSIT, PAYMENT_CONFIRMATION_DELAY};
pub use crate::rng::{derive_hash_hex, EntropySource, FixedSequence, HmacSource, RandomSource};
pub use crate::round::{add_balance, complete_round, start_round};
pub use crate::simulate::{simulate, RoundRecord, SimulationReport};
pub use crate::state::{GameState, KycData};
pub use crate::store::{FileStore, GameStore, MemoryStore, GAME_STATE_KEY};
pub use crate::symbols::{Symbol, WIN_PATTERNS};
