//! Configuration loading
//!
//! Each setting resolves in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (handled by clap's env fallbacks in the binary)
//! 3. TOML config file (explicit `--config` path)
//! 4. Compiled default (fallback)

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 5780;
/// Default SQLite database path
pub const DEFAULT_DATABASE_PATH: &str = "joblens.db";
/// Default cap on concurrently running update cycles
pub const DEFAULT_MAX_CONCURRENT_UPDATES: usize = 4;
/// Frontend origin allowed by CORS
pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:3000";

/// Optional TOML config file contents
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub port: Option<u16>,
    pub database_path: Option<PathBuf>,
    pub jwt_secret: Option<String>,
    pub search_feed_url: Option<String>,
    pub detail_feed_url: Option<String>,
    pub allowed_origin: Option<String>,
    pub max_concurrent_updates: Option<usize>,
}

impl FileConfig {
    /// Parse a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Cannot read config file {:?}: {}", path, e)))?;
        toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Invalid config file {:?}: {}", path, e)))
    }
}

/// Fully resolved server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub database_path: PathBuf,
    pub jwt_secret: String,
    pub search_feed_url: String,
    pub detail_feed_url: String,
    pub allowed_origin: String,
    pub max_concurrent_updates: usize,
}

/// Per-field overrides collected from CLI arguments / environment
#[derive(Debug, Default)]
pub struct ConfigOverrides {
    pub port: Option<u16>,
    pub database_path: Option<PathBuf>,
    pub jwt_secret: Option<String>,
    pub search_feed_url: Option<String>,
    pub detail_feed_url: Option<String>,
    pub allowed_origin: Option<String>,
    pub max_concurrent_updates: Option<usize>,
}

impl ServerConfig {
    /// Merge overrides with an optional config file and defaults.
    ///
    /// The JWT secret and both feed URLs have no compiled default; a missing
    /// secret or feed URL is a fatal configuration error.
    pub fn resolve(overrides: ConfigOverrides, config_path: Option<&Path>) -> Result<Self> {
        let file = match config_path {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };

        let jwt_secret = overrides
            .jwt_secret
            .or(file.jwt_secret)
            .ok_or_else(|| Error::Config("JWT secret is not configured".to_string()))?;
        let search_feed_url = overrides
            .search_feed_url
            .or(file.search_feed_url)
            .ok_or_else(|| Error::Config("Search feed URL is not configured".to_string()))?;
        let detail_feed_url = overrides
            .detail_feed_url
            .or(file.detail_feed_url)
            .ok_or_else(|| Error::Config("Detail feed URL is not configured".to_string()))?;

        Ok(Self {
            port: overrides.port.or(file.port).unwrap_or(DEFAULT_PORT),
            database_path: overrides
                .database_path
                .or(file.database_path)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_PATH)),
            jwt_secret,
            search_feed_url,
            detail_feed_url,
            allowed_origin: overrides
                .allowed_origin
                .or(file.allowed_origin)
                .unwrap_or_else(|| DEFAULT_ALLOWED_ORIGIN.to_string()),
            max_concurrent_updates: overrides
                .max_concurrent_updates
                .or(file.max_concurrent_updates)
                .unwrap_or(DEFAULT_MAX_CONCURRENT_UPDATES),
        })
    }
}
