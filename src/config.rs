use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(Error::Config(format!("Unknown STORAGE_BACKEND: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub storage_backend: StorageBackend,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub replay_default_timeout_secs: u64,
    pub log_format: LogFormat,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let server_address = match env::var("SERVER_ADDRESS").ok() {
            Some(addr) => addr,
            None => format!("0.0.0.0:{}", env::var("PORT").unwrap_or_else(|_| "3000".into())),
        };

        let storage_backend = match env::var("STORAGE_BACKEND").ok() {
            Some(raw) => raw.parse()?,
            None => StorageBackend::Postgres,
        };

        let database_url = env::var("DATABASE_URL").ok();
        if storage_backend == StorageBackend::Postgres && database_url.is_none() {
            return Err(Error::Config(
                "Missing environment variable: DATABASE_URL".to_string(),
            ));
        }

        let log_format = match env::var("LOG_FORMAT").ok().as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Ok(Self {
            server_address,
            storage_backend,
            database_url,
            database_max_connections: get_env_parse_or("DATABASE_MAX_CONNECTIONS", 20)?,
            replay_default_timeout_secs: get_env_parse_or("REPLAY_DEFAULT_TIMEOUT_SECS", 30)?,
            log_format,
        })
    }

    /// In-memory configuration that does not touch the process environment.
    pub fn for_tests() -> Self {
        Self {
            server_address: "127.0.0.1:0".to_string(),
            storage_backend: StorageBackend::Memory,
            database_url: None,
            database_max_connections: 1,
            replay_default_timeout_secs: 30,
            log_format: LogFormat::Text,
        }
    }
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> Result<&'static Config> {
    CONFIG
        .get()
        .ok_or_else(|| Error::Config("Configuration has not been initialized".to_string()))
}
