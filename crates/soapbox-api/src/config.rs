use std::fmt::Display;
use std::str::FromStr;

use anyhow::{Result, anyhow, bail};
use jsonwebtoken::Algorithm;
use tracing::info;

/// Secrets that ship in example `.env` files and must never sign real tokens.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me",
    "change-me-to-a-random-string",
    "dev-secret-change-me",
    "secret",
];

/// Process configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    /// SQLite path, or `:memory:`.
    pub database_url: String,
    pub secret_key: String,
    pub algorithm: Algorithm,
    pub access_token_expire_minutes: i64,
    pub host: String,
    pub port: u16,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup so tests need not touch the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret_key = lookup("SOAPBOX_SECRET_KEY").unwrap_or_default();
        if secret_key.is_empty() || PLACEHOLDER_SECRETS.contains(&secret_key.as_str()) {
            bail!("SOAPBOX_SECRET_KEY is unset or still a placeholder");
        }

        let algorithm_name = load_or(&lookup, "SOAPBOX_ALGORITHM", "HS256");
        let algorithm = Algorithm::from_str(&algorithm_name)
            .map_err(|_| anyhow!("Unknown signing algorithm '{}'", algorithm_name))?;
        if !matches!(algorithm, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) {
            bail!(
                "SOAPBOX_ALGORITHM must be HS256, HS384 or HS512 (got {})",
                algorithm_name
            );
        }

        let access_token_expire_minutes: i64 =
            parse_or(&lookup, "SOAPBOX_ACCESS_TOKEN_EXPIRE_MINUTES", "30")?;
        if access_token_expire_minutes <= 0 {
            bail!("SOAPBOX_ACCESS_TOKEN_EXPIRE_MINUTES must be positive");
        }

        Ok(Self {
            database_url: load_or(&lookup, "SOAPBOX_DATABASE_URL", "soapbox.db"),
            secret_key,
            algorithm,
            access_token_expire_minutes,
            host: load_or(&lookup, "SOAPBOX_HOST", "0.0.0.0"),
            port: parse_or(&lookup, "SOAPBOX_PORT", "8000")?,
        })
    }
}

fn load_or<F>(lookup: &F, key: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    })
}

fn parse_or<F, T>(lookup: &F, key: &str, default: &str) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    let raw = load_or(lookup, key, default);
    raw.parse()
        .map_err(|e| anyhow!("Invalid {key} value '{raw}': {e}"))
}
