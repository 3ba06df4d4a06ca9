// Chatbot Backend Entry Point
// Rule-based replies with an optional hosted inference API in front.

mod brain;
mod config;
mod database;
mod error;
mod models;
mod responder;
mod server;
mod telemetry;

#[cfg(test)]
mod tests;

use brain::{
    IntentClassifier, RandomSource, ResponseBank, ResponseSelector, SeededRandom, SelectorConfig,
    ThreadRandom,
};
use config::Settings;
use responder::{ExternalResponder, HuggingFaceResponder};
use server::AppState;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Assembles the selector from the loaded settings.
fn build_selector(settings: &Settings) -> anyhow::Result<ResponseSelector> {
    let bank = match &settings.response_bank_path {
        Some(path) => ResponseBank::load(path)?,
        None => ResponseBank::default(),
    };

    let responder = match &settings.huggingface_api_key {
        Some(api_key) => {
            let responder = HuggingFaceResponder::new(
                settings.huggingface_model_url.clone(),
                api_key.clone(),
                settings.responder_timeout,
            )?;
            Some(Arc::new(responder) as Arc<dyn ExternalResponder>)
        }
        None => None,
    };

    let random: Arc<dyn RandomSource> = match settings.response_seed {
        Some(seed) => Arc::new(SeededRandom::new(seed)),
        None => Arc::new(ThreadRandom),
    };

    Ok(ResponseSelector::new(SelectorConfig {
        bank,
        responder,
        responder_timeout: settings.responder_timeout,
        random,
    }))
}

fn log_reply_rules() {
    for (position, rule) in IntentClassifier::new().rules().enumerate() {
        debug!(
            position,
            category = %rule.category,
            mode = ?rule.mode,
            tokens = ?rule.tokens,
            "Reply rule"
        );
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    if let Err(e) = telemetry::init() {
        warn!("Tracing subscriber not installed: {}", e);
    }

    let settings = Settings::from_env()?;
    settings.log_summary();

    let selector = build_selector(&settings)?;
    info!(
        external_responder = selector.has_external_responder(),
        "Response selector ready"
    );
    log_reply_rules();

    // The server keeps running without storage when the database is unreachable.
    let pool = match &settings.database_url {
        Some(url) => match database::init_db(url).await {
            Ok(pool) => {
                info!("Database connected successfully");
                Some(pool)
            }
            Err(e) => {
                warn!("Database connection failed: {}", e);
                warn!("Server will run without database features");
                None
            }
        },
        None => None,
    };

    let addr = settings.socket_addr()?;
    let app = server::build_router(AppState::new(selector, pool));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("AI Chatbot Server Started");
    info!("Server running on {}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}
