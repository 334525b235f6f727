use raspadinha_core::PAYMENT_CONFIRMATION_DELAY;
use raspadinha_shared::Payer;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct PixupConfig {
    pub api_url: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub public_base_url: Option<String>,
    pub payer: Payer,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: String,
    pub database_url: String,
    pub state_dir: PathBuf,
    pub payment_delay: Duration,
    pub pixup: PixupConfig,
}

fn var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let payment_delay = var("PAYMENT_DELAY_MS")
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(PAYMENT_CONFIRMATION_DELAY);
        Self {
            bind: var("BIND").unwrap_or_else(|| "127.0.0.1:8080".to_string()),
            database_url: var("DATABASE_URL")
                .unwrap_or_else(|| "sqlite://raspadinha.db?mode=rwc".to_string()),
            state_dir: var("STATE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".raspadinha")),
            payment_delay,
            pixup: PixupConfig {
                api_url: var("PIXUP_API_URL").map(|u| u.trim_end_matches('/').to_string()),
                client_id: var("PIXUP_CLIENT_ID"),
                client_secret: var("PIXUP_CLIENT_SECRET"),
                public_base_url: var("PUBLIC_BASE_URL")
                    .map(|u| u.trim_end_matches('/').to_string()),
                payer: Payer {
                    name: var("PIXUP_PAYER_NAME").unwrap_or_default(),
                    email: var("PIXUP_PAYER_EMAIL").unwrap_or_default(),
                    document: var("PIXUP_PAYER_DOCUMENT").unwrap_or_default(),
                },
            },
        }
    }
}
