use std::path::PathBuf;

use crate::{Error, OandaEnvironment, Result};

/// Runtime configuration loaded from environment variables at startup.
/// Credentials never live in the screener file or in code.
#[derive(Debug, Clone)]
pub struct Config {
    // Broker credentials
    pub oanda_api_token: String,
    /// Only needed for instrument discovery.
    pub oanda_account_id: Option<String>,
    pub oanda_environment: OandaEnvironment,

    // Screener
    pub screener_config_path: String,
    pub output_dir: PathBuf,
}

impl Config {
    /// Load configuration from the process environment.
    /// Loads `.env` if present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv(); // ignore error if .env not present
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. `from_env` passes the process environment.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let oanda_environment = match lookup("OANDA_ENVIRONMENT")
            .map(|v| v.to_lowercase())
            .as_deref()
        {
            None | Some("practice") => OandaEnvironment::Practice,
            Some("live") => OandaEnvironment::Live,
            Some(other) => {
                return Err(Error::Config(format!(
                    "OANDA_ENVIRONMENT must be 'practice' or 'live', got: '{other}'"
                )))
            }
        };

        Ok(Config {
            oanda_api_token: required(&lookup, "OANDA_API_TOKEN")?,
            oanda_account_id: lookup("OANDA_ACCOUNT_ID").filter(|v| !v.trim().is_empty()),
            oanda_environment,
            screener_config_path: lookup("SCREENER_CONFIG_PATH")
                .unwrap_or_else(|| "config/screener.toml".to_string()),
            output_dir: lookup("SCREENER_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
        })
    }

    pub fn require_account_id(&self) -> Result<&str> {
        self.oanda_account_id.as_deref().ok_or_else(|| {
            Error::Config("OANDA_ACCOUNT_ID is not set. Check your .env file.".to_string())
        })
    }
}

fn required(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String> {
    lookup(key).filter(|v| !v.trim().is_empty()).ok_or_else(|| {
        Error::Config(format!(
            "Required environment variable '{key}' is not set. Check your .env file."
        ))
    })
}
