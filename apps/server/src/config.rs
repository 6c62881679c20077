//! Server configuration module.
//!
//! Configuration is loaded from environment variables with fallback to
//! defaults that suit a single-register shop machine.

use std::env;
use std::path::PathBuf;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP listen port
    pub port: u16,

    /// Path to the SQLite database file
    pub database_path: PathBuf,

    /// Directory backup snapshots are written into
    pub backup_dir: PathBuf,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable          | Default          |
    /// |-------------------|------------------|
    /// | `SHOP_PORT`       | `8700`           |
    /// | `SHOP_DB_PATH`    | `./data/shop.db` |
    /// | `SHOP_BACKUP_DIR` | `./backups`      |
    pub fn load() -> Result<Self, ConfigError> {
        let config = ServerConfig {
            port: env::var("SHOP_PORT")
                .unwrap_or_else(|_| "8700".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("SHOP_PORT".to_string()))?,

            database_path: env::var("SHOP_DB_PATH")
                .unwrap_or_else(|_| "./data/shop.db".to_string())
                .into(),

            backup_dir: env::var("SHOP_BACKUP_DIR")
                .unwrap_or_else(|_| "./backups".to_string())
                .into(),
        };

        Ok(config)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            port: 8700,
            database_path: PathBuf::from("./data/shop.db"),
            backup_dir: PathBuf::from("./backups"),
        }
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 8700);
        assert_eq!(config.database_path, PathBuf::from("./data/shop.db"));
        assert_eq!(config.backup_dir, PathBuf::from("./backups"));
    }
}
