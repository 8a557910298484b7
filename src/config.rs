//! Environment-derived configuration, loaded once at startup and passed down
//! explicitly.

use anyhow::{bail, Context};
use chrono::FixedOffset;
use std::env;
use std::path::PathBuf;

use crate::documents::DocumentSettings;

const DEFAULT_BUSINESS_NAME: &str = "Servicio Técnico de Impresoras";
const DEFAULT_UTC_OFFSET_HOURS: i32 = -5;
const DEFAULT_LIST_CACHE_SECS: u64 = 60;

/// Which `CaseStore` implementation backs the service.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreBackend {
    Postgres {
        database_url: String,
        max_connections: u32,
        /// Seconds a listing snapshot is reused; 0 disables the cache.
        list_cache_secs: u64,
    },
    Memory,
}

/// Where the document logo comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum LogoLocation {
    Url(String),
    Path(PathBuf),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub store: StoreBackend,
    pub bind_address: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub logo: Option<LogoLocation>,
    pub documents: DocumentSettings,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let store = match env_or("STORE_BACKEND", "postgres").to_lowercase().as_str() {
            "postgres" => StoreBackend::Postgres {
                database_url: env::var("DATABASE_URL")
                    .context("DATABASE_URL must be set when STORE_BACKEND=postgres")?,
                max_connections: parse_env("DATABASE_MAX_CONNECTIONS", 10)?,
                list_cache_secs: parse_env("CASE_LIST_CACHE_SECS", DEFAULT_LIST_CACHE_SECS)?,
            },
            "memory" => StoreBackend::Memory,
            other => bail!("unknown STORE_BACKEND '{}' (expected postgres or memory)", other),
        };

        let logo = match (non_empty_env("LOGO_URL"), non_empty_env("LOGO_PATH")) {
            (Some(url), _) => Some(LogoLocation::Url(url)),
            (None, Some(path)) => Some(LogoLocation::Path(PathBuf::from(path))),
            (None, None) => None,
        };

        let offset_hours: i32 = parse_env("BUSINESS_UTC_OFFSET_HOURS", DEFAULT_UTC_OFFSET_HOURS)?;
        let utc_offset = FixedOffset::east_opt(offset_hours * 3600)
            .with_context(|| format!("BUSINESS_UTC_OFFSET_HOURS out of range: {}", offset_hours))?;

        Ok(Self {
            store,
            bind_address: env_or("BIND_ADDRESS", "0.0.0.0"),
            port: parse_env("PORT", 8080)?,
            allowed_origins: env_or("ALLOWED_ORIGINS", "http://localhost:5173,http://localhost:3000")
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            logo,
            documents: DocumentSettings {
                business_name: env_or("BUSINESS_NAME", DEFAULT_BUSINESS_NAME),
                contact_line: env_or("BUSINESS_CONTACT", ""),
                utc_offset,
            },
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    non_empty_env(key).unwrap_or_else(|| default.to_string())
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match non_empty_env(key) {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("invalid value for {}: '{}'", key, raw)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_falls_back_to_default() {
        let value: u16 = parse_env("PRINTER_SERVICE_TEST_UNSET_PORT", 8080).unwrap();
        assert_eq!(value, 8080);
    }

    #[test]
    fn test_parse_env_rejects_garbage() {
        env::set_var("PRINTER_SERVICE_TEST_BAD_PORT", "eighty");
        let result: anyhow::Result<u16> = parse_env("PRINTER_SERVICE_TEST_BAD_PORT", 8080);
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("PRINTER_SERVICE_TEST_BAD_PORT"));
    }

    #[test]
    fn test_blank_env_counts_as_unset() {
        env::set_var("PRINTER_SERVICE_TEST_BLANK", "   ");
        assert_eq!(non_empty_env("PRINTER_SERVICE_TEST_BLANK"), None);
        assert_eq!(env_or("PRINTER_SERVICE_TEST_BLANK", "fallback"), "fallback");
    }
}
