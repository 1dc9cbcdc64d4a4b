use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use crate::error::AppError;

const DEFAULT_DATABASE_URL: &str = "sqlite://homework.db";
const DEFAULT_PORT: u16 = 10000;
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub host: IpAddr,
    pub port: u16,
    pub max_connections: u32,
}

impl AppConfig {
    /// `.env` を読み込んでから環境変数で上書きする
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());

        let host = parse_value("HOST", env::var("HOST").ok(), IpAddr::V4(Ipv4Addr::LOCALHOST))?;
        let port = parse_value("PORT", env::var("PORT").ok(), DEFAULT_PORT)?;
        let max_connections = parse_value(
            "DB_MAX_CONNECTIONS",
            env::var("DB_MAX_CONNECTIONS").ok(),
            DEFAULT_MAX_CONNECTIONS,
        )?;

        Ok(Self {
            database_url,
            host,
            port,
            max_connections,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Unset or blank falls back to `default`; anything else must parse.
fn parse_value<T>(name: &str, raw: Option<String>, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map_err(|e| AppError::Config(format!("{} is invalid ({}): {}", name, raw, e))),
        _ => Ok(default),
    }
}
