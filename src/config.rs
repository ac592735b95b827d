use std::str::FromStr;

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub db_max_connections: u32,
    pub jwt: JwtConfig,
}

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_TTL_MINUTES: i64 = 60 * 24 * 30;
/// Upper bound for `JWT_TTL_MINUTES`: ten years.
pub const MAX_TTL_MINUTES: i64 = 60 * 24 * 365 * 10;

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET is not set")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "marketplace".into()),
            audience: std::env::var("JWT_AUDIENCE")
                .unwrap_or_else(|_| "marketplace-users".into()),
            ttl_minutes: ttl_minutes(std::env::var("JWT_TTL_MINUTES").ok().as_deref()),
        };
        let port = std::env::var("APP_PORT")
            .or_else(|_| std::env::var("PORT"))
            .ok();
        Ok(Self {
            database_url,
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: parse_or(port.as_deref(), DEFAULT_PORT),
            db_max_connections: parse_or(std::env::var("DB_MAX_CONNECTIONS").ok().as_deref(), 10),
            jwt,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Parses an optional raw value, falling back to `default` when it is absent or malformed.
fn parse_or<T: FromStr>(raw: Option<&str>, default: T) -> T {
    raw.and_then(|v| v.trim().parse::<T>().ok()).unwrap_or(default)
}

fn ttl_minutes(raw: Option<&str>) -> i64 {
    parse_or(raw, DEFAULT_TTL_MINUTES).clamp(1, MAX_TTL_MINUTES)
}
