use std::fmt;
use std::str::FromStr;

use yamdb_auth_types::token::DEFAULT_ACCESS_TOKEN_TTL_SECS;
use yamdb_domain::pagination::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

use crate::domain::types::RelationLookup;

/// Confirmation codes stay valid for three days unless configured otherwise.
pub const DEFAULT_CONFIRMATION_CODE_TTL_SECS: u64 = 3 * 86_400;

/// API service configuration loaded from environment variables.
#[derive(Debug)]
pub struct ApiConfig {
    /// Database connection URL.
    pub database_url: String,
    /// HMAC secret for signing access tokens. Env var: `JWT_SECRET`.
    pub jwt_secret: String,
    /// HMAC secret for confirmation codes. Env var: `CONFIRMATION_SECRET`.
    pub confirmation_secret: String,
    /// TCP port for the HTTP server (default 3112). Env var: `API_PORT`.
    pub api_port: u16,
    pub access_token_ttl_secs: u64,
    pub confirmation_code_ttl_secs: u64,
    /// Default list page size, capped at 100. Env var: `PAGE_SIZE`.
    pub page_size: u32,
    /// How title writes reference genres and categories. Env var: `TITLE_RELATION_LOOKUP`.
    pub relation_lookup: RelationLookup,
    /// Sender address for confirmation emails. Env var: `DEFAULT_FROM_EMAIL`.
    pub default_from_email: String,
}

impl ApiConfig {
    pub fn from_env() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL").expect("DATABASE_URL"),
            jwt_secret: std::env::var("JWT_SECRET").expect("JWT_SECRET"),
            confirmation_secret: std::env::var("CONFIRMATION_SECRET")
                .expect("CONFIRMATION_SECRET"),
            api_port: env_or("API_PORT", 3112),
            access_token_ttl_secs: env_or("ACCESS_TOKEN_TTL_SECS", DEFAULT_ACCESS_TOKEN_TTL_SECS),
            confirmation_code_ttl_secs: env_or(
                "CONFIRMATION_CODE_TTL_SECS",
                DEFAULT_CONFIRMATION_CODE_TTL_SECS,
            ),
            page_size: env_or::<u32>("PAGE_SIZE", DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
            relation_lookup: env_or("TITLE_RELATION_LOOKUP", RelationLookup::default()),
            default_from_email: std::env::var("DEFAULT_FROM_EMAIL")
                .unwrap_or_else(|_| "noreply@yamdb.local".to_owned()),
        }
    }
}

/// Optional variable: unset yields `default`, a malformed value aborts startup.
fn env_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: fmt::Display,
{
    parse_or(key, std::env::var(key).ok().as_deref(), default).unwrap_or_else(|e| panic!("{e}"))
}

fn parse_or<T>(key: &str, raw: Option<&str>, default: T) -> Result<T, String>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|e| format!("{key}: invalid value {raw:?}: {e}")),
    }
}
