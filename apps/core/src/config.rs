//! Runtime configuration read from the environment (and `.env` when present).

use crate::error::AppError;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use url::Url;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
pub const DEFAULT_MODEL_URL: &str =
    "https://api-inference.huggingface.co/models/facebook/blenderbot-400M-distill";
pub const DEFAULT_RESPONDER_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Everything the server needs to start.
#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_addr: String,
    pub port: u16,
    /// SQLite URL; `None` runs the server without transcript storage.
    pub database_url: Option<String>,
    /// Bearer credential for the inference API; `None` keeps replies rule-based.
    pub huggingface_api_key: Option<String>,
    pub huggingface_model_url: Url,
    pub responder_timeout: Duration,
    /// Optional JSON file replacing the built-in response bank.
    pub response_bank_path: Option<PathBuf>,
    /// Seeds the random reply picks so a run can be replayed.
    pub response_seed: Option<u64>,
}

impl Settings {
    /// Reads settings from the process environment.
    ///
    /// Blank variables count as unset. Malformed numbers or URLs are configuration errors.
    pub fn from_env() -> Result<Self, AppError> {
        let port = match non_blank_var("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|e| AppError::Config(format!("PORT must be a port number ({}): {}", raw, e)))?,
            None => DEFAULT_PORT,
        };

        let responder_timeout = match non_blank_var("RESPONDER_TIMEOUT_MS") {
            Some(raw) => {
                let millis = raw.parse::<u64>().map_err(|e| {
                    AppError::Config(format!("RESPONDER_TIMEOUT_MS must be milliseconds ({}): {}", raw, e))
                })?;
                if millis == 0 {
                    return Err(AppError::Config("RESPONDER_TIMEOUT_MS must be positive".to_string()));
                }
                Duration::from_millis(millis)
            }
            None => DEFAULT_RESPONDER_TIMEOUT,
        };

        let response_seed = match non_blank_var("RESPONSE_SEED") {
            Some(raw) => Some(raw.parse::<u64>().map_err(|e| {
                AppError::Config(format!("RESPONSE_SEED must be an unsigned integer ({}): {}", raw, e))
            })?),
            None => None,
        };

        let huggingface_model_url = match non_blank_var("HUGGINGFACE_MODEL_URL") {
            Some(raw) => Url::parse(&raw)?,
            None => Url::parse(DEFAULT_MODEL_URL)?,
        };

        Ok(Self {
            bind_addr: non_blank_var("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            port,
            database_url: non_blank_var("DATABASE_URL"),
            huggingface_api_key: non_blank_var("HUGGINGFACE_API_KEY"),
            huggingface_model_url,
            responder_timeout,
            response_bank_path: non_blank_var("RESPONSE_BANK_PATH").map(PathBuf::from),
            response_seed,
        })
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, AppError> {
        format!("{}:{}", self.bind_addr, self.port)
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid bind address {}:{}: {}", self.bind_addr, self.port, e)))
    }

    /// Logs the effective configuration without leaking the credential.
    pub fn log_summary(&self) {
        info!(
            bind = %self.bind_addr,
            port = self.port,
            database = self.database_url.is_some(),
            external_responder = self.huggingface_api_key.is_some(),
            timeout_ms = self.responder_timeout.as_millis() as u64,
            seeded = self.response_seed.is_some(),
            "Loaded settings"
        );
        if self.huggingface_api_key.is_none() {
            info!("No Hugging Face API key found, using rule-based responses");
        }
        if self.database_url.is_none() {
            info!("No DATABASE_URL found. Running without database.");
        }
    }
}

fn non_blank_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
