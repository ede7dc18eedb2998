//! Structured logging setup.
//!
//! Services embedding the auth layer call [`init_tracing`] once at startup;
//! `RUST_LOG` takes precedence over the configured level.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub use tracing_subscriber::util::TryInitError;

/// Line format written by the subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human readable lines
    #[default]
    Plain,
    /// One JSON object per event, with the current span attached
    Json,
}

/// Subscriber settings carried from [`AuthConfig`](crate::AuthConfig).
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Value of the `service` field on the startup event
    pub service_name: String,
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub filter: String,
    /// Output format
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::for_service(env!("CARGO_PKG_NAME"))
    }
}

impl LogConfig {
    /// Plain `info` logging for `service_name`
    pub fn for_service(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            filter: "info".to_string(),
            format: LogFormat::Plain,
        }
    }

    /// Replaces the fallback filter directive (`debug`, `service_auth=trace`, ...)
    #[must_use]
    pub fn with_filter(mut self, directive: impl Into<String>) -> Self {
        self.filter = directive.into();
        self
    }

    /// Switches to JSON lines
    #[must_use]
    pub const fn json(mut self) -> Self {
        self.format = LogFormat::Json;
        self
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.filter))
            .unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// Installs the global subscriber.
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init_tracing(config: &LogConfig) -> Result<(), TryInitError> {
    let filter = config.env_filter();

    let result = if config.format == LogFormat::Json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_current_span(true),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init()
    };

    if result.is_ok() {
        tracing::info!(service = %config.service_name, "Tracing initialized");
    }
    result
}
