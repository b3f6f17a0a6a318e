//! Client configuration.
//!
//! Values come from an optional JSON file and are then overridden by
//! `RETAIL_ADMIN_*` environment variables. The API key is kept in zeroizing
//! memory and masked in `Debug` output.

use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use zeroize::Zeroizing;

use crate::api::normalize_admin_url;
use crate::paging::DEFAULT_PAGE_SIZE;

pub const ENV_CONFIG_FILE: &str = "RETAIL_ADMIN_CONFIG";
pub const ENV_ADMIN_URL: &str = "RETAIL_ADMIN_URL";
pub const ENV_API_KEY: &str = "RETAIL_ADMIN_API_KEY";
pub const ENV_PAGE_SIZE: &str = "RETAIL_ADMIN_PAGE_SIZE";
pub const ENV_TIMEOUT_SECS: &str = "RETAIL_ADMIN_TIMEOUT_SECS";
pub const ENV_LOG_DIR: &str = "RETAIL_ADMIN_LOG_DIR";

const MAX_PAGE_SIZE: u32 = 500;
const MAX_TIMEOUT_SECS: u64 = 300;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// On-disk shape; every field optional so partial files are fine.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileConfig {
    #[serde(alias = "admin_url")]
    admin_url: Option<String>,
    #[serde(alias = "api_key")]
    api_key: Option<String>,
    #[serde(alias = "page_size")]
    page_size: Option<u32>,
    #[serde(alias = "request_timeout_secs")]
    request_timeout_secs: Option<u64>,
    #[serde(alias = "log_dir")]
    log_dir: Option<PathBuf>,
    #[serde(alias = "log_format")]
    log_format: Option<LogFormat>,
}

#[derive(Clone)]
pub struct AppConfig {
    pub admin_url: String,
    api_key: Zeroizing<String>,
    pub page_size: u32,
    pub request_timeout_secs: u64,
    pub log_dir: Option<PathBuf>,
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            admin_url: String::new(),
            api_key: Zeroizing::new(String::new()),
            page_size: DEFAULT_PAGE_SIZE,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            log_dir: None,
            log_format: LogFormat::Text,
        }
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("admin_url", &self.admin_url)
            .field("api_key", &mask_secret(&self.api_key))
            .field("page_size", &self.page_size)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("log_dir", &self.log_dir)
            .field("log_format", &self.log_format)
            .finish()
    }
}

/// Keep the last four characters of a secret.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{tail}", "*".repeat(chars.len() - 4))
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    match env_nonempty(key) {
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::Invalid(format!("{key} is not a valid number: {raw}"))),
        None => Ok(None),
    }
}

impl AppConfig {
    /// Load from `path` (or `$RETAIL_ADMIN_CONFIG`), then apply env overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        let file_path = path
            .map(Path::to_path_buf)
            .or_else(|| env_nonempty(ENV_CONFIG_FILE).map(PathBuf::from));
        if let Some(file_path) = file_path {
            config.apply_file(&file_path)?;
        }

        config.apply_env()?;
        config.admin_url = normalize_admin_url(&config.admin_url);
        config.validate()?;
        Ok(config)
    }

    fn apply_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let file: FileConfig =
            serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        if let Some(url) = file.admin_url {
            self.admin_url = url;
        }
        if let Some(key) = file.api_key {
            self.api_key = Zeroizing::new(key.trim().to_string());
        }
        if let Some(size) = file.page_size {
            self.page_size = size;
        }
        if let Some(secs) = file.request_timeout_secs {
            self.request_timeout_secs = secs;
        }
        if file.log_dir.is_some() {
            self.log_dir = file.log_dir;
        }
        if let Some(format) = file.log_format {
            self.log_format = format;
        }
        Ok(())
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Some(url) = env_nonempty(ENV_ADMIN_URL) {
            self.admin_url = url;
        }
        if let Some(key) = env_nonempty(ENV_API_KEY) {
            self.api_key = Zeroizing::new(key);
        }
        if let Some(size) = parse_env::<u32>(ENV_PAGE_SIZE)? {
            self.page_size = size;
        }
        if let Some(secs) = parse_env::<u64>(ENV_TIMEOUT_SECS)? {
            self.request_timeout_secs = secs;
        }
        if let Some(dir) = env_nonempty(ENV_LOG_DIR) {
            self.log_dir = Some(PathBuf::from(dir));
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.admin_url.trim().is_empty() {
            return Err(ConfigError::Invalid(format!(
                "admin URL is not set (use adminUrl in the config file or {ENV_ADMIN_URL})"
            )));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&self.page_size) {
            return Err(ConfigError::Invalid(format!(
                "page size must be between 1 and {MAX_PAGE_SIZE}, got {}",
                self.page_size
            )));
        }
        if !(1..=MAX_TIMEOUT_SECS).contains(&self.request_timeout_secs) {
            return Err(ConfigError::Invalid(format!(
                "request timeout must be between 1 and {MAX_TIMEOUT_SECS} seconds, got {}",
                self.request_timeout_secs
            )));
        }
        Ok(())
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn with_api_key(mut self, key: &str) -> Self {
        self.api_key = Zeroizing::new(key.trim().to_string());
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const ALL_ENV: &[&str] = &[
        ENV_CONFIG_FILE,
        ENV_ADMIN_URL,
        ENV_API_KEY,
        ENV_PAGE_SIZE,
        ENV_TIMEOUT_SECS,
        ENV_LOG_DIR,
    ];

    fn clear_env() {
        for key in ALL_ENV {
            std::env::remove_var(key);
        }
    }

    fn temp_config(name: &str, body: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("retail-admin-config-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    #[serial]
    fn loads_file_then_env_overrides() {
        clear_env();
        let path = temp_config(
            "admin.json",
            r#"{ "adminUrl": "painel.loja.com.br/api/", "apiKey": "abc123456", "pageSize": 25, "logFormat": "json" }"#,
        );
        std::env::set_var(ENV_PAGE_SIZE, "50");

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.admin_url, "https://painel.loja.com.br");
        assert_eq!(config.api_key(), "abc123456");
        assert_eq!(config.page_size, 50);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        clear_env();
    }

    #[test]
    #[serial]
    fn env_only_configuration() {
        clear_env();
        std::env::set_var(ENV_ADMIN_URL, "localhost:8000");
        std::env::set_var(ENV_API_KEY, "k-1");
        let config = AppConfig::load(None).unwrap();
        assert_eq!(config.admin_url, "http://localhost:8000");
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
        clear_env();
    }

    #[test]
    #[serial]
    fn missing_url_is_invalid() {
        clear_env();
        assert!(matches!(AppConfig::load(None), Err(ConfigError::Invalid(_))));
    }

    #[test]
    #[serial]
    fn out_of_range_page_size_is_invalid() {
        clear_env();
        std::env::set_var(ENV_ADMIN_URL, "x.com");
        std::env::set_var(ENV_PAGE_SIZE, "0");
        assert!(matches!(AppConfig::load(None), Err(ConfigError::Invalid(_))));
        std::env::set_var(ENV_PAGE_SIZE, "dez");
        assert!(matches!(AppConfig::load(None), Err(ConfigError::Invalid(_))));
        clear_env();
    }

    #[test]
    #[serial]
    fn malformed_file_reports_path() {
        clear_env();
        let path = temp_config("broken.json", "{ not json");
        let err = AppConfig::load(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("broken.json"));
    }

    #[test]
    fn debug_output_masks_api_key() {
        let config = AppConfig::default().with_api_key("super-secret-9876");
        let shown = format!("{config:?}");
        assert!(!shown.contains("super-secret"));
        assert!(shown.contains("9876"));
        assert_eq!(mask_secret("abc"), "***");
    }
}
