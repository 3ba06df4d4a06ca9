use crate::error::AppError;
use crate::models::TranscriptRecord;
use chrono::{Local, TimeZone, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::info;

/// Opens (creating if needed) the SQLite transcript store and applies migrations.
pub async fn init_db(db_url: &str) -> Result<SqlitePool, AppError> {
    info!("Initializing database at: {}", db_url);

    let options = SqliteConnectOptions::from_str(db_url)?.create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    info!("Database initialized and migrations applied.");

    Ok(pool)
}

// --- Transcripts ---

pub async fn save_transcript(
    pool: &SqlitePool,
    message: &str,
    reply: &str,
    user_id: &str,
) -> Result<TranscriptRecord, sqlx::Error> {
    let created_at = Utc::now().timestamp();

    sqlx::query_as::<_, TranscriptRecord>(
        r#"
        INSERT INTO transcripts (message, reply, user_id, created_at)
        VALUES (?, ?, ?, ?)
        RETURNING id, message, reply, user_id, created_at
        "#,
    )
    .bind(message)
    .bind(reply)
    .bind(user_id)
    .bind(created_at)
    .fetch_one(pool)
    .await
}

/// Most recent exchanges first.
pub async fn get_history(pool: &SqlitePool, limit: i64) -> Result<Vec<TranscriptRecord>, sqlx::Error> {
    sqlx::query_as::<_, TranscriptRecord>(
        r#"
        SELECT id, message, reply, user_id, created_at
        FROM transcripts
        ORDER BY created_at DESC, id DESC
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Removes every stored exchange and returns how many rows went away.
pub async fn clear_history(pool: &SqlitePool) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM transcripts").execute(pool).await?;
    Ok(result.rows_affected())
}

pub async fn count_transcripts(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM transcripts")
        .fetch_one(pool)
        .await
}

pub async fn count_transcripts_since(pool: &SqlitePool, since: i64) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM transcripts WHERE created_at >= ?")
        .bind(since)
        .fetch_one(pool)
        .await
}

/// Unix timestamp of today's local midnight.
pub fn start_of_local_day() -> i64 {
    let today = Local::now().date_naive();
    today
        .and_hms_opt(0, 0, 0)
        .and_then(|midnight| Local.from_local_datetime(&midnight).earliest())
        .map(|midnight| midnight.timestamp())
        // DST gaps at midnight: fall back to UTC midnight
        .unwrap_or_else(|| today.and_hms_opt(0, 0, 0).map(|m| m.and_utc().timestamp()).unwrap_or(0))
}
