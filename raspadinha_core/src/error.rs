use crate::money::Money;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("storage io: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialize game state: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("storage slot poisoned")]
    Poisoned,
}

#[derive(thiserror::Error, Debug)]
pub enum GameError {
    #[error("insufficient balance: have {balance}, card costs {cost}")]
    InsufficientBalance { balance: Money, cost: Money },
    #[error("a scratch card is already in progress")]
    RoundInProgress,
    #[error("no scratch card in progress")]
    NoRoundInProgress,
    #[error("block {0} is outside the 3x3 grid")]
    InvalidBlock(u8),
    #[error("deposit of {amount} is below the minimum of {minimum}")]
    DepositTooSmall { amount: Money, minimum: Money },
    #[error("round counter exhausted after {0} cards")]
    RoundLimit(u32),
    #[error("no unacknowledged iPhone win")]
    NoPendingIphone,
    #[error("persist game state: {0}")]
    Persistence(#[from] StoreError),
}

pub type GameResult<T> = Result<T, GameError>;
