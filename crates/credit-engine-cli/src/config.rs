use std::env;

use crate::OutputFormat;

/// Runtime settings for the `cde` binary, read from `.env` and the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub log_level: String,
    /// Used when `--output` is not given on the command line.
    pub default_output: OutputFormat,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("CDE_OUTPUT must be one of json, table, csv, minimal (got '{0}')")]
    InvalidOutput(String),
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let log_level = env::var("CDE_LOG_LEVEL").unwrap_or_else(|_| "warn".to_string());
        let default_output = match env::var("CDE_OUTPUT") {
            Ok(raw) => parse_output(&raw).ok_or(ConfigError::InvalidOutput(raw))?,
            Err(_) => OutputFormat::Json,
        };

        Ok(Self {
            log_level,
            default_output,
        })
    }
}

fn parse_output(raw: &str) -> Option<OutputFormat> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "json" => Some(OutputFormat::Json),
        "table" => Some(OutputFormat::Table),
        "csv" => Some(OutputFormat::Csv),
        "minimal" => Some(OutputFormat::Minimal),
        _ => None,
    }
}
