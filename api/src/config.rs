use std::env;
use std::path::PathBuf;

use anyhow::Context;

/// Signing secret used when SECRET_KEY is not configured (local development only)
const DEV_SECRET_KEY: &str = "unsafe_dev_secret_key";

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    /// HS256 signing secret for access tokens
    pub secret_key: String,
    /// Lifetime of issued access tokens
    pub access_token_expire_minutes: i64,
    /// Directory where uploaded images are written
    pub upload_dir: PathBuf,
    /// Upper bound on expenses fetched for balances, export and stats
    pub expense_fetch_limit: u64,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let secret_key = match env::var("SECRET_KEY") {
            Ok(key) if !key.is_empty() => key,
            _ => {
                tracing::warn!("SECRET_KEY not set in environment, using unsafe default");
                DEV_SECRET_KEY.to_string()
            }
        };

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            secret_key,
            access_token_expire_minutes: parse_or("ACCESS_TOKEN_EXPIRE_MINUTES", 30)?,
            upload_dir: env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("uploads")),
            expense_fetch_limit: parse_or("EXPENSE_FETCH_LIMIT", 1000)?,
            port: parse_or("PORT", 8080)?,
        })
    }
}

fn parse_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value: {}", key, raw)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
impl Config {
    /// Configuration for tests that never touch the environment
    pub fn for_tests() -> Self {
        Self {
            database_url: "postgres://localhost/splitledger_test".to_string(),
            secret_key: "test-secret-key".to_string(),
            access_token_expire_minutes: 30,
            upload_dir: env::temp_dir().join("splitledger-test-uploads"),
            expense_fetch_limit: 1000,
            port: 0,
        }
    }
}
