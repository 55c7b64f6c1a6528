use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use tracing::warn;

/// Placeholder secrets that must never sign real sessions.
const PLACEHOLDER_SECRETS: &[&str] = &["it's a secret", "change-me", "dev-secret-change-me"];

pub struct Config {
    pub database_url: String,
    pub secret_key: String,
    pub host: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://warbler.db".into());
        let host = std::env::var("WARBLER_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port: u16 = std::env::var("WARBLER_PORT")
            .unwrap_or_else(|_| "5000".into())
            .parse()?;

        let secret_key = match std::env::var("WARBLER_SECRET_KEY") {
            Ok(key) if !key.is_empty() && !PLACEHOLDER_SECRETS.contains(&key.as_str()) => key,
            _ => {
                warn!(
                    "WARBLER_SECRET_KEY is unset or a placeholder; \
                     sessions will not survive a restart"
                );
                B64.encode(rand::random::<[u8; 32]>())
            }
        };

        Ok(Self {
            database_url,
            secret_key,
            host,
            port,
        })
    }
}
