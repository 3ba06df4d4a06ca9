//! HTTP surface: routing, handlers and middleware.

use crate::brain::ResponseSelector;
use crate::database;
use crate::error::AppError;
use crate::models::{
    Acknowledgement, ChatRequest, ChatResponse, ChatStats, ErrorEnvelope, HealthResponse,
    HistoryQuery, HistoryResponse, StatsResponse,
};
use axum::body::Bytes;
use axum::extract::{Query, Request, State};
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    CONTENT_TYPE,
};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, Uri};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde_json::{json, Map, Value};
use sqlx::sqlite::SqlitePool;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, instrument, warn};
use url::form_urlencoded;

pub const DEFAULT_HISTORY_LIMIT: i64 = 50;

/// Shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub selector: Arc<ResponseSelector>,
    pub pool: Option<SqlitePool>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(selector: ResponseSelector, pool: Option<SqlitePool>) -> Self {
        Self {
            selector: Arc::new(selector),
            pool,
            started_at: Instant::now(),
        }
    }

    fn uptime_secs(&self) -> f64 {
        self.started_at.elapsed().as_secs_f64()
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/chat", post(chat))
        .route("/api/history", get(history).delete(clear_history))
        .route("/api/stats", get(stats))
        .fallback(not_found)
        .layer(middleware::from_fn(permissive_cors))
        .layer(middleware::from_fn(log_requests))
        .with_state(state)
}

// --- Middleware ---

async fn log_requests(req: Request, next: Next) -> Response {
    info!("{} {}", req.method(), req.uri().path());
    next.run(req).await
}

/// Lets browser front ends served from any origin call the API.
async fn permissive_cors(req: Request, next: Next) -> Response {
    let mut response = if req.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(req).await
    };
    let headers = response.headers_mut();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, DELETE, OPTIONS"),
    );
    headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static("Content-Type"));
    response
}

// --- Handlers ---

/// Decodes a chat body the way the content type announces it.
///
/// JSON and URL-encoded forms are read; any other content type leaves every field unset. An
/// empty JSON body counts as `{}` and a JSON array carries no fields.
fn decode_chat_body(content_type: Option<&str>, body: &[u8]) -> Result<ChatRequest, AppError> {
    let mime = content_type
        .and_then(|value| value.split(';').next())
        .map(|value| value.trim().to_ascii_lowercase())
        .unwrap_or_default();

    if mime == "application/x-www-form-urlencoded" {
        let mut fields = Map::new();
        for (key, value) in form_urlencoded::parse(body) {
            fields
                .entry(key.into_owned())
                .or_insert_with(|| Value::String(value.into_owned()));
        }
        return Ok(ChatRequest::from_fields(&fields));
    }

    if mime == "application/json" || mime.ends_with("+json") {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(ChatRequest::default());
        }
        return match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(fields)) => Ok(ChatRequest::from_fields(&fields)),
            Ok(Value::Array(_)) => Ok(ChatRequest::default()),
            Ok(other) => Err(AppError::MalformedBody(format!(
                "Expected a JSON object or array, got {}",
                other
            ))),
            Err(e) => Err(AppError::MalformedBody(e.to_string())),
        };
    }

    Ok(ChatRequest::default())
}

#[instrument(skip_all)]
async fn chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ChatResponse>, AppError> {
    let content_type = headers.get(CONTENT_TYPE).and_then(|value| value.to_str().ok());
    let request = decode_chat_body(content_type, &body).inspect_err(|e| {
        warn!("Unreadable chat body: {}", e);
    })?;

    let message = request
        .non_blank_message()
        .ok_or_else(|| AppError::Validation("Message is required".to_string()))?;

    let reply = state.selector.select_reply(message).await;

    if let Some(pool) = &state.pool {
        if let Err(e) =
            database::save_transcript(pool, message, &reply, request.user_id_or_anonymous()).await
        {
            warn!("Database save skipped: {}", e);
        }
    }

    Ok(Json(ChatResponse {
        success: true,
        message: message.to_string(),
        reply,
        timestamp: Utc::now(),
    }))
}

/// Positive integers only; anything else means the default.
fn parse_limit(raw: Option<&str>) -> i64 {
    raw.and_then(|value| value.trim().parse::<i64>().ok())
        .filter(|limit| *limit > 0)
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
}

async fn history(State(state): State<AppState>, Query(query): Query<HistoryQuery>) -> Json<HistoryResponse> {
    let unavailable = |note: &str| HistoryResponse {
        success: true,
        count: 0,
        history: Vec::new(),
        note: Some(note.to_string()),
    };

    let Some(pool) = &state.pool else {
        return Json(unavailable("Database not connected, history unavailable"));
    };

    match database::get_history(pool, parse_limit(query.limit.as_deref())).await {
        Ok(history) => Json(HistoryResponse {
            success: true,
            count: history.len(),
            history,
            note: None,
        }),
        Err(e) => {
            error!("History retrieval error: {}", e);
            Json(unavailable("Database not connected, history unavailable"))
        }
    }
}

async fn clear_history(State(state): State<AppState>) -> Response {
    let result = match &state.pool {
        Some(pool) => database::clear_history(pool).await.map_err(AppError::from),
        None => Err(AppError::Config("Database not configured".to_string())),
    };

    match result {
        Ok(deleted) => {
            info!("Cleared {} transcripts", deleted);
            Json(Acknowledgement {
                success: true,
                message: "Chat history cleared".to_string(),
            })
            .into_response()
        }
        Err(e) => {
            error!("History deletion error: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorEnvelope::new("Failed to clear history", None)),
            )
                .into_response()
        }
    }
}

async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let counts = match &state.pool {
        Some(pool) => {
            let since = database::start_of_local_day();
            match tokio::try_join!(
                database::count_transcripts(pool),
                database::count_transcripts_since(pool, since)
            ) {
                Ok(counts) => Some(counts),
                Err(e) => {
                    error!("Stats query error: {}", e);
                    None
                }
            }
        }
        None => None,
    };

    let (total_chats, today_chats, note) = match counts {
        Some((total, today)) => (total, today, None),
        None => (0, 0, Some("Database not connected".to_string())),
    };

    Json(StatsResponse {
        success: true,
        stats: ChatStats {
            total_chats,
            today_chats,
            server_uptime: state.uptime_secs(),
        },
        note,
    })
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let connected = match &state.pool {
        Some(pool) => sqlx::query("SELECT 1").execute(pool).await.is_ok(),
        None => false,
    };

    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
        uptime: state.uptime_secs(),
        database: if connected { "connected" } else { "disconnected" }.to_string(),
    })
}

async fn index() -> Json<Value> {
    Json(json!({
        "message": "AI Chatbot API - Manish Kumar",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "chat": "POST /api/chat",
            "history": "GET /api/history",
            "clearHistory": "DELETE /api/history",
            "stats": "GET /api/stats",
            "health": "GET /health"
        },
        "documentation": "See README.md for full API documentation"
    }))
}

async fn not_found(uri: Uri) -> (StatusCode, Json<ErrorEnvelope>) {
    (StatusCode::NOT_FOUND, Json(ErrorEnvelope::not_found(uri.path())))
}
