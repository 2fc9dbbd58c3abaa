use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Runtime configuration.
///
/// Sources, later ones winning:
/// - built-in defaults
/// - an optional `trivia.{toml,yaml,json,...}` file in the working directory
/// - `TRIVIA_*` environment variables (`TRIVIA_BIND_ADDR`, `TRIVIA_DATABASE_URL`, ...)
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub bind_addr: String,
    pub database_url: String,
    pub request_timeout_secs: u64,
    pub log_level: String,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        Self::builder()?
            .add_source(File::with_name("trivia").required(false))
            .add_source(Environment::with_prefix("TRIVIA"))
            .build()?
            .try_deserialize()
    }

    fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            .set_default("bind_addr", "0.0.0.0:8080")?
            .set_default("database_url", "sqlite:trivia.db")?
            .set_default("request_timeout_secs", 30)?
            .set_default("log_level", "info")
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
