//! Server configuration
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! `LECTERN_*` environment variables. Command-line flags are applied last by
//! the binary.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::chat::ChatConfig;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_DATABASE: &str = "lectern.db";
pub const DEFAULT_STORAGE_DIR: &str = "storage";
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 24;

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    pub port: u16,
    pub database: String,
    /// Allowed browser origin; `None` allows any
    pub cors_origin: Option<String>,
    pub storage_dir: PathBuf,
    pub max_upload_bytes: u64,
    pub session_ttl_hours: i64,
    pub password_hash_cost: u32,
    pub chat: ChatConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            database: DEFAULT_DATABASE.to_string(),
            cors_origin: None,
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            session_ttl_hours: DEFAULT_SESSION_TTL_HOURS,
            password_hash_cost: bcrypt::DEFAULT_COST,
            chat: ChatConfig::default(),
        }
    }
}

impl Config {
    /// Defaults, overlaid with `path` when given, then with the process environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(&std::env::vars().collect());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&raw).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Overlay `LECTERN_*` values from an environment snapshot
    pub fn apply_env(&mut self, values: &HashMap<String, String>) {
        let read = |key: &str| values.get(key).filter(|value| !value.trim().is_empty());

        if let Some(port) = read("LECTERN_PORT") {
            parse_into(&mut self.port, "LECTERN_PORT", port);
        }
        if let Some(database) = read("LECTERN_DATABASE") {
            self.database = database.clone();
        }
        if let Some(origin) = read("LECTERN_CORS_ORIGIN") {
            self.cors_origin = Some(origin.clone());
        }
        if let Some(dir) = read("LECTERN_STORAGE_DIR") {
            self.storage_dir = PathBuf::from(dir);
        }
        if let Some(bytes) = read("LECTERN_MAX_UPLOAD_BYTES") {
            parse_into(&mut self.max_upload_bytes, "LECTERN_MAX_UPLOAD_BYTES", bytes);
        }
        if let Some(hours) = read("LECTERN_SESSION_TTL_HOURS") {
            parse_into(&mut self.session_ttl_hours, "LECTERN_SESSION_TTL_HOURS", hours);
        }

        self.chat.apply_env(values);
    }

    /// `*` is treated the same as no origin
    pub fn allowed_origin(&self) -> Option<&str> {
        self.cors_origin
            .as_deref()
            .map(str::trim)
            .filter(|origin| !origin.is_empty() && *origin != "*")
    }
}

fn parse_into<T: std::str::FromStr>(target: &mut T, key: &str, raw: &str) {
    match raw.trim().parse() {
        Ok(value) => *target = value,
        Err(_) => tracing::warn!("Ignoring invalid {}={}", key, raw),
    }
}
