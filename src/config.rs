use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api::ApiSettings;

pub const CONFIG_PATH_ENV: &str = "READY_ROOM_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "ready_room.yaml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub bind_addr: String,
    /// Captured server responses replayed by the fixture transport.
    pub fixture_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub static_dir: PathBuf,
    pub log_filter: String,
    pub server_url: String,
    pub platform_url: String,
    pub client_id: String,
    pub client_api_version: u32,
    /// Account used when no saved token is available; the password comes from
    /// `READY_ROOM_PASSWORD`.
    pub username: String,
    /// Save the access token after a password login.
    pub auto_login: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        let api = ApiSettings::default();
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
            fixture_dir: PathBuf::from("data/fixtures"),
            cache_dir: PathBuf::from("data/cache"),
            static_dir: PathBuf::from("frontend/dist"),
            log_filter: "info".to_string(),
            server_url: api.server_url,
            platform_url: api.platform_url,
            client_id: api.client_id,
            client_api_version: api.client_api_version,
            username: String::new(),
            auto_login: false,
        }
    }
}

impl AppConfig {
    /// Reads a YAML config file. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(raw) if raw.trim().is_empty() => Ok(Self::default()),
            Ok(raw) => Ok(serde_yaml::from_str(&raw)?),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Config from `READY_ROOM_CONFIG` (or `ready_room.yaml`) plus environment overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        let path = env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut config = Self::load(path)?;
        config.apply_overrides(|name| env::var(name).ok());
        Ok(config)
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(bind) = lookup("READY_ROOM_BIND") {
            self.bind_addr = bind;
        }
        if let Some(dir) = lookup("READY_ROOM_FIXTURES") {
            self.fixture_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("READY_ROOM_CACHE") {
            self.cache_dir = PathBuf::from(dir);
        }
    }

    pub fn api_settings(&self) -> ApiSettings {
        ApiSettings {
            server_url: self.server_url.clone(),
            platform_url: self.platform_url.clone(),
            client_id: self.client_id.clone(),
            client_api_version: self.client_api_version,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(dir.path().join("absent.yaml")).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.bind_addr, "127.0.0.1:3000");
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ready_room.yaml");
        fs::write(&path, "bind_addr: 0.0.0.0:8080\nclient_api_version: 17\n").unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.api_settings().client_api_version, 17);
        assert_eq!(config.fixture_dir, PathBuf::from("data/fixtures"));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ready_room.yaml");
        fs::write(&path, "bind_addr: [unterminated\n").unwrap();
        assert!(matches!(AppConfig::load(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn overrides_replace_paths_and_bind() {
        let vars: HashMap<&str, &str> = [
            ("READY_ROOM_BIND", "127.0.0.1:9999"),
            ("READY_ROOM_CACHE", "/tmp/rr-cache"),
        ]
        .into_iter()
        .collect();
        let mut config = AppConfig::default();
        config.apply_overrides(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(config.bind_addr, "127.0.0.1:9999");
        assert_eq!(config.cache_dir, PathBuf::from("/tmp/rr-cache"));
        assert_eq!(config.fixture_dir, PathBuf::from("data/fixtures"));
    }
}
