use chrono::{DateTime, Utc};
use raspadinha_core::{FictionalPix, GameError, GameState, Money, ScratchCard, Symbol};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct StateResponse {
    pub state: GameState,
    pub current_card: Option<ScratchCard>,
    pub next_round_chance: u8,
    pub pending_iphone: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChanceResponse {
    pub round: u32,
    pub chance: u8,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RoundResponse {
    pub card: ScratchCard,
    pub state: GameState,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RevealRequest {
    pub block: u8,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RevealResponse {
    pub block: u8,
    pub symbol: Symbol,
    pub winning_line: Option<[u8; 3]>,
    pub fully_revealed: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DepositRequest {
    pub amount: Money,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DepositResponse {
    pub pix: FictionalPix,
    pub confirms_in_ms: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct KycStep1Request {
    pub cpf: String,
    pub full_name: String,
    pub birth_date: String,
}

fn digits(s: &str) -> usize {
    s.chars().filter(|c| c.is_ascii_digit()).count()
}

impl KycStep1Request {
    /// Format checks only; nothing is verified against any registry.
    pub fn validate(&self) -> ApiResult<()> {
        if digits(&self.cpf) != 11 {
            return Err(ApiError::Invalid("CPF inválido".into()));
        }
        if self.full_name.split_whitespace().count() < 2 {
            return Err(ApiError::Invalid("Digite seu nome completo".into()));
        }
        if digits(&self.birth_date) != 8 {
            return Err(ApiError::Invalid("Data inválida".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct QrCodeRequest {
    pub amount: Option<serde_json::Value>,
    pub external_id: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Payer {
    pub name: String,
    pub email: String,
    pub document: String,
}

/// Body posted to the provider's `/pix/qrcode`.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PixChargeRequest {
    pub amount: f64,
    #[serde(rename = "external_id")]
    pub external_id: String,
    pub payer: Payer,
    pub payer_question: String,
    pub postback_url: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEnvelope {
    pub request_body: Option<WebhookEvent>,
}

/// Text form of a provider field sent either as a string or a number.
pub fn value_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Numeric form of a provider field sent either as a number or a numeric string.
pub fn value_number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn lenient_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(value_text(&Value::deserialize(d)?))
}

fn lenient_number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    Ok(value_number(&Value::deserialize(d)?))
}

/// Provider callback body. Scalar fields accept strings or numbers.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEvent {
    #[serde(default, deserialize_with = "lenient_text")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub transaction_id: Option<String>,
    #[serde(rename = "external_id", default, deserialize_with = "lenient_text")]
    pub external_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub amount: Option<f64>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub date_approval: Option<String>,
    pub credit_party: Option<serde_json::Value>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl WebhookEvent {
    pub fn is_paid(&self) -> bool {
        self.status.as_deref() == Some("PAID")
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WebhookAck {
    pub received: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WebhookLogEntry {
    pub id: i64,
    pub ts: DateTime<Utc>,
    pub status: Option<String>,
    pub transaction_id: Option<String>,
    pub external_id: Option<String>,
    pub amount: Option<f64>,
    pub payload: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("invalid request: {0}")]
    Invalid(String),
    /// 400 whose message is passed through unchanged.
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    PaymentRequired(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("{message}")]
    Upstream {
        status: u16,
        message: String,
        body: Option<serde_json::Value>,
    },
    #[error("{0}")]
    Misconfigured(String),
    #[error("internal server error")]
    Internal,
}

impl ApiError {
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::Invalid(_) | ApiError::BadRequest(_) => 400,
            ApiError::PaymentRequired(_) => 402,
            ApiError::MethodNotAllowed => 405,
            ApiError::Conflict(_) => 409,
            ApiError::Upstream { status, .. } => *status,
            ApiError::Misconfigured(_) | ApiError::Internal => 500,
        }
    }

    pub fn body(&self) -> ErrorBody {
        match self {
            ApiError::Upstream { body: Some(body), .. } => ErrorBody {
                error: self.to_string(),
                details: Some(body.clone()),
            },
            _ => ErrorBody {
                error: self.to_string(),
                details: None,
            },
        }
    }
}

impl From<GameError> for ApiError {
    fn from(e: GameError) -> Self {
        match e {
            GameError::InsufficientBalance { .. } => ApiError::PaymentRequired(e.to_string()),
            GameError::RoundInProgress
            | GameError::NoRoundInProgress
            | GameError::NoPendingIphone
            | GameError::RoundLimit(_) => ApiError::Conflict(e.to_string()),
            GameError::InvalidBlock(_) | GameError::DepositTooSmall { .. } => {
                ApiError::Invalid(e.to_string())
            }
            GameError::Persistence(_) => ApiError::Internal,
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
