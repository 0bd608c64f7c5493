//! TOML configuration for the ingestor.
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! working setup against the public CryptoCompare endpoint.
//!
//! ```toml
//! base_url = "https://min-api.cryptocompare.com/data"
//! page_limit = 2000
//! default_exchange = "CCCAGG"
//! requests_per_second = 10
//! output_dir = "./data"
//!
//! [retry]
//! max_attempts = 5
//! backoff_ms = 1000
//! ```

use std::{fs, path::{Path, PathBuf}};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};
use shared_utils::env::get_optional_env_var;
use thiserror::Error;
use tracing::error;

use crate::retry::RetryPolicy;

pub const DEFAULT_BASE_URL: &str = "https://min-api.cryptocompare.com/data";

/// Largest page the histo endpoints will serve.
pub const DEFAULT_PAGE_LIMIT: u32 = 2000;

/// CryptoCompare's aggregate-across-exchanges index.
pub const DEFAULT_EXCHANGE: &str = "CCCAGG";

/// Environment variable consulted for the API key before the config file.
pub const API_KEY_ENV: &str = "CRYPTOCOMPARE_API_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct IngestorConfig {
    pub base_url: String,
    pub page_limit: u32,
    pub default_exchange: String,
    pub requests_per_second: u32,
    pub retry: RetryPolicy,
    pub output_dir: Option<PathBuf>,
    #[serde(deserialize_with = "deserialize_secret")]
    api_key: Option<SecretString>,
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.map(|key| SecretString::new(key.into())))
}

impl Default for IngestorConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            page_limit: DEFAULT_PAGE_LIMIT,
            default_exchange: DEFAULT_EXCHANGE.to_string(),
            requests_per_second: 10,
            retry: RetryPolicy::default(),
            output_dir: None,
            api_key: None,
        }
    }
}

impl IngestorConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| {
            error!("Failed to read config file: {:?}", source);
            ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }
        })?;
        Self::from_toml_str(&content)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_page_limit(mut self, page_limit: u32) -> Self {
        self.page_limit = page_limit;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        let api_key: String = api_key.into();
        self.api_key = Some(SecretString::new(api_key.into()));
        self
    }

    /// API key from `CRYPTOCOMPARE_API_KEY`, falling back to the config file.
    pub fn api_key(&self) -> Option<SecretString> {
        get_optional_env_var(API_KEY_ENV)
            .map(|key| SecretString::new(key.into()))
            .or_else(|| {
                self.api_key
                    .as_ref()
                    .map(|key| SecretString::new(key.expose_secret().into()))
            })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_limit == 0 {
            return Err(ConfigError::Invalid("page_limit must be > 0".into()));
        }
        if self.requests_per_second == 0 {
            return Err(ConfigError::Invalid(
                "requests_per_second must be > 0".into(),
            ));
        }
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("base_url must not be empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use serial_test::serial;
    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config = IngestorConfig::from_toml_str("").unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.page_limit, 2000);
        assert_eq!(config.default_exchange, "CCCAGG");
        assert_eq!(config.retry, RetryPolicy::default());
        assert!(config.output_dir.is_none());
    }

    #[test]
    fn overrides_are_applied() {
        let config = IngestorConfig::from_toml_str(
            r#"
            page_limit = 500
            default_exchange = "binance"
            output_dir = "/tmp/bars"

            [retry]
            max_attempts = 4
            "#,
        )
        .unwrap();
        assert_eq!(config.page_limit, 500);
        assert_eq!(config.default_exchange, "binance");
        assert_eq!(config.output_dir, Some(PathBuf::from("/tmp/bars")));
        assert_eq!(config.retry.max_attempts, Some(4));
        assert_eq!(config.retry.backoff_ms, 1_000);
    }

    #[test]
    fn zero_page_limit_is_invalid() {
        assert!(matches!(
            IngestorConfig::from_toml_str("page_limit = 0"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn load_reads_from_disk() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "requests_per_second = 3").unwrap();
        let config = IngestorConfig::load(file.path()).unwrap();
        assert_eq!(config.requests_per_second, 3);

        assert!(matches!(
            IngestorConfig::load("/definitely/not/here.toml"),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    #[serial]
    fn env_api_key_takes_precedence() {
        let config = IngestorConfig::default().with_api_key("from-file");

        // SAFETY: serialised with the other env-touching tests.
        unsafe { std::env::remove_var(API_KEY_ENV) };
        assert_eq!(config.api_key().unwrap().expose_secret(), "from-file");

        unsafe { std::env::set_var(API_KEY_ENV, "from-env") };
        assert_eq!(config.api_key().unwrap().expose_secret(), "from-env");
        unsafe { std::env::remove_var(API_KEY_ENV) };
    }
}
