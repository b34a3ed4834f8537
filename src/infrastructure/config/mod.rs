use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::domain::error::{AppError, Result};
use crate::domain::identifier::DEFAULT_KNOWN_PREFIXES;

pub const CONFIG_FILE: &str = "fleetscan.toml";
pub const ENV_PREFIX: &str = "FLEETSCAN_";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub max_connections: u32,
    pub log_filter: String,
    pub known_prefixes: Vec<String>,
    pub cors_permissive: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            database_url: "sqlite://fleetscan.db".to_string(),
            max_connections: 4,
            log_filter: "info".to_string(),
            known_prefixes: DEFAULT_KNOWN_PREFIXES
                .iter()
                .map(|prefix| prefix.to_string())
                .collect(),
            cors_permissive: true,
        }
    }
}

impl AppConfig {
    /// Defaults, then `fleetscan.toml` if present, then `FLEETSCAN_*` variables.
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_figment(Self::figment(Path::new(CONFIG_FILE)))
    }

    pub fn figment(config_file: &Path) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(config_file))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: AppConfig = figment
            .extract()
            .map_err(|e| AppError::ConfigError(format!("Failed to load configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }

    fn validate(&self) -> Result<()> {
        if self.database_url.trim().is_empty() {
            return Err(AppError::ConfigError(
                "database_url must not be empty".to_string(),
            ));
        }
        if self.max_connections == 0 {
            return Err(AppError::ConfigError(
                "max_connections must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
