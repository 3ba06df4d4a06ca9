use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;

/// User identifier stored when the client does not send one.
pub const ANONYMOUS_USER: &str = "anonymous";

/// Represents one persisted chat exchange.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptRecord {
    /// The unique identifier for the record.
    pub id: i64,
    /// The text the user sent.
    pub message: String,
    /// The reply the bot produced.
    pub reply: String,
    /// Free-text identifier of the sender, `anonymous` when absent.
    pub user_id: String,
    /// Unix timestamp (UTC, seconds) of when the exchange was stored.
    #[serde(rename = "timestamp")]
    pub created_at: i64,
}

/// Body of `POST /api/chat`, as read from either a JSON or a form payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatRequest {
    pub message: Option<String>,
    pub user_id: Option<String>,
}

impl ChatRequest {
    /// Reads the fields from a decoded body object.
    ///
    /// Only a string `message` counts. A non-string `userId` is kept as its text form, and
    /// `null`, `false`, `0` or `""` mean no id at all.
    pub fn from_fields(fields: &Map<String, Value>) -> Self {
        Self {
            message: fields.get("message").and_then(Value::as_str).map(str::to_string),
            user_id: fields.get("userId").and_then(user_id_text),
        }
    }

    /// Returns the message if it holds anything besides whitespace.
    pub fn non_blank_message(&self) -> Option<&str> {
        self.message
            .as_deref()
            .filter(|message| !message.trim().is_empty())
    }

    /// Returns the sender id, falling back to [`ANONYMOUS_USER`].
    pub fn user_id_or_anonymous(&self) -> &str {
        self.user_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .unwrap_or(ANONYMOUS_USER)
    }
}

fn user_id_text(value: &Value) -> Option<String> {
    match value {
        Value::String(id) => Some(id.clone()),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(true) => Some("true".to_string()),
        _ => None,
    }
}

/// Success envelope of `POST /api/chat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub success: bool,
    pub message: String,
    pub reply: String,
    pub timestamp: DateTime<Utc>,
}

/// Error envelope shared by every endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorEnvelope {
    pub fn new(error: impl Into<String>, details: Option<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            details,
            path: None,
            message: None,
        }
    }

    /// Generic 500 body for failures outside any route's own handling.
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: "Internal server error".to_string(),
            details: None,
            path: None,
            message: Some(message.into()),
        }
    }

    pub fn not_found(path: impl Into<String>) -> Self {
        Self {
            success: false,
            error: "Endpoint not found".to_string(),
            details: None,
            path: Some(path.into()),
            message: None,
        }
    }
}

/// Query string of `GET /api/history`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryQuery {
    /// Kept as raw text so that garbage falls back to the default limit instead of a 400.
    pub limit: Option<String>,
}

/// Response of `GET /api/history`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub success: bool,
    pub count: usize,
    pub history: Vec<TranscriptRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Counters reported by `GET /api/stats`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatStats {
    pub total_chats: i64,
    pub today_chats: i64,
    /// Seconds since the server started.
    pub server_uptime: f64,
}

/// Response of `GET /api/stats`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
    pub success: bool,
    pub stats: ChatStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Response of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub uptime: f64,
    pub database: String,
}

/// Generic `{success, message}` acknowledgement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Acknowledgement {
    pub success: bool,
    pub message: String,
}
