//! Layered Configuration with Validation
//!
//! Auth settings are read from an optional file (TOML, YAML or JSON,
//! picked by extension) and overridden by `AUTH_*` environment variables.
//! The signing key may come from a secret file mounted next to the service.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use ::config::{Config as Settings, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::auth::{AuthOptions, JwtAuthApi};
use crate::observability::LogConfig;

/// Prefix of the environment variables read by [`AuthConfig::from_env`]
pub const ENV_PREFIX: &str = "AUTH";

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Missing required field
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    /// Secret file could not be read
    #[error("Failed to read secret file {path}: {reason}")]
    SecretFile {
        /// Path of the secret file
        path: PathBuf,
        /// Underlying I/O failure
        reason: String,
    },

    /// Sources could not be read or deserialized
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),
}

/// Auth configuration assembled from file and environment.
#[derive(Clone, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct AuthConfig {
    /// Inline HMAC signing key
    #[serde(default)]
    pub signing_key: Option<String>,
    /// File holding the signing key; wins over `signing_key`
    #[serde(default)]
    #[zeroize(skip)]
    pub signing_key_file: Option<PathBuf>,
    /// Token issuer
    #[serde(default)]
    pub issuer: String,
    /// Token audience
    #[serde(default)]
    pub audience: String,
    /// Admin groups (comma-separated in the environment)
    #[serde(default)]
    pub admin_groups: Vec<String>,
    /// Log filter used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Emit JSON log lines
    #[serde(default)]
    pub log_json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AuthConfig {
    /// Loads configuration from `AUTH_*` environment variables (and `.env`).
    ///
    /// # Errors
    ///
    /// Fails when a source cannot be read or a required field is missing.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::load(None, Environment::with_prefix(ENV_PREFIX))
    }

    /// Loads `path`, then lets `AUTH_*` environment variables override it.
    ///
    /// # Errors
    ///
    /// Fails when the file is missing or invalid, or a required field is missing.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::load(Some(path), Environment::with_prefix(ENV_PREFIX))
    }

    /// Builds the configuration from an optional file and an environment source.
    ///
    /// # Errors
    ///
    /// Fails when a source cannot be read, the signing key file cannot be
    /// read, or validation fails.
    pub fn load(file: Option<&Path>, env: Environment) -> Result<Self, ConfigError> {
        let mut builder = Settings::builder();
        if let Some(path) = file {
            builder = builder.add_source(File::from(path).required(true));
        }

        let settings = builder
            .add_source(
                env.try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("admin_groups"),
            )
            .build()?;

        let mut config: Self = settings.try_deserialize()?;
        config.read_secrets()?;
        config.validate()?;
        Ok(config)
    }

    /// Replaces the inline key with the contents of `signing_key_file`.
    fn read_secrets(&mut self) -> Result<(), ConfigError> {
        let Some(path) = self.signing_key_file.as_ref() else {
            return Ok(());
        };
        if path.as_os_str().is_empty() {
            return Ok(());
        }

        let contents = fs::read_to_string(path).map_err(|e| ConfigError::SecretFile {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        self.signing_key = Some(contents.trim().to_string());
        Ok(())
    }

    /// Validates the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.signing_key.as_deref().map_or(true, str::is_empty) {
            return Err(ConfigError::MissingRequired("signing_key".to_string()));
        }
        if self.issuer.trim().is_empty() {
            return Err(ConfigError::MissingRequired("issuer".to_string()));
        }
        if self.audience.trim().is_empty() {
            return Err(ConfigError::MissingRequired("audience".to_string()));
        }
        Ok(())
    }

    /// Options for constructing the auth API.
    #[must_use]
    pub fn auth_options(&self) -> AuthOptions {
        let key = self.signing_key.clone().unwrap_or_default();
        AuthOptions::new(key.into_bytes(), self.issuer.clone(), self.audience.clone())
            .with_admin_groups(self.admin_groups.iter().cloned())
    }

    /// Builds the auth API from this configuration.
    ///
    /// # Errors
    ///
    /// Returns `MissingRequired` if a required field is empty.
    pub fn build_api(&self) -> Result<JwtAuthApi, ConfigError> {
        JwtAuthApi::new(self.auth_options())
    }

    /// Logging settings carried by this configuration.
    #[must_use]
    pub fn log_config(&self) -> LogConfig {
        let config = LogConfig::default().with_filter(self.log_level.clone());
        if self.log_json {
            config.json()
        } else {
            config
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("signing_key", &self.signing_key.as_ref().map(|_| "[REDACTED]"))
            .field("signing_key_file", &self.signing_key_file)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("admin_groups", &self.admin_groups)
            .field("log_level", &self.log_level)
            .field("log_json", &self.log_json)
            .finish()
    }
}
