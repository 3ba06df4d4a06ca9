//! Reply selection: external responder first, rule cascade as the fallback.

use crate::brain::bank::{fixed_reply, ResponseBank, APOLOGY_REPLY, TIME_REPLY_PREFIX};
use crate::brain::intent::{IntentClassifier, ResponseCategory};
use crate::error::AppError;
use crate::responder::ExternalResponder;
use chrono::{DateTime, Local};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, error, instrument, warn};

/// Picks an index in `0..len` for a randomized reply.
pub trait RandomSource: Send + Sync {
    fn pick_index(&self, len: usize) -> usize;
}

/// Uniform picks from the thread-local generator, fresh for every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn pick_index(&self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }
}

/// Reproducible picks for tests and demos.
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandom {
    fn pick_index(&self, len: usize) -> usize {
        match self.rng.lock() {
            Ok(mut rng) => rng.gen_range(0..len),
            // a poisoned generator still holds a usable state
            Err(poisoned) => poisoned.into_inner().gen_range(0..len),
        }
    }
}

/// `M/D/YYYY, h:mm:ss AM` in local time.
pub fn format_local_timestamp(now: DateTime<Local>) -> String {
    now.format("%-m/%-d/%Y, %-I:%M:%S %p").to_string()
}

/// Everything the selector is built from.
pub struct SelectorConfig {
    pub bank: ResponseBank,
    pub responder: Option<Arc<dyn ExternalResponder>>,
    pub responder_timeout: Duration,
    pub random: Arc<dyn RandomSource>,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            bank: ResponseBank::default(),
            responder: None,
            responder_timeout: crate::config::DEFAULT_RESPONDER_TIMEOUT,
            random: Arc::new(ThreadRandom),
        }
    }
}

/// Turns one user message into one displayable reply.
///
/// Holds only immutable configuration, so a single instance is shared by every request.
pub struct ResponseSelector {
    classifier: IntentClassifier,
    bank: ResponseBank,
    responder: Option<Arc<dyn ExternalResponder>>,
    responder_timeout: Duration,
    random: Arc<dyn RandomSource>,
}

impl Default for ResponseSelector {
    fn default() -> Self {
        Self::new(SelectorConfig::default())
    }
}

impl ResponseSelector {
    pub fn new(config: SelectorConfig) -> Self {
        Self {
            classifier: IntentClassifier::new(),
            bank: config.bank,
            responder: config.responder,
            responder_timeout: config.responder_timeout,
            random: config.random,
        }
    }

    pub fn has_external_responder(&self) -> bool {
        self.responder.is_some()
    }

    /// Produces a reply for `utterance`. Never fails and never returns an empty string.
    ///
    /// The external responder, when configured, gets one attempt bounded by the configured
    /// timeout; any failure falls through to the rule cascade.
    #[instrument(skip(self, utterance))]
    pub async fn select_reply(&self, utterance: &str) -> String {
        if let Some(responder) = &self.responder {
            match timeout(self.responder_timeout, responder.generate(utterance)).await {
                Ok(Ok(text)) if !text.trim().is_empty() => return text,
                Ok(Ok(_)) => warn!("External responder returned empty text, using rule-based reply"),
                Ok(Err(e)) => warn!("External responder failed, using rule-based reply: {}", e),
                Err(elapsed) => warn!(
                    "External responder timed out, using rule-based reply: {}",
                    AppError::from(elapsed)
                ),
            }
        }

        match self.rule_based_reply(utterance) {
            Ok(reply) if !reply.trim().is_empty() => reply,
            Ok(_) => {
                error!("Rule-based reply was empty");
                APOLOGY_REPLY.to_string()
            }
            Err(e) => {
                error!("Reply selection failed: {}", e);
                APOLOGY_REPLY.to_string()
            }
        }
    }

    /// The rule cascade alone, with the current local time for time queries.
    pub fn rule_based_reply(&self, utterance: &str) -> Result<String, AppError> {
        self.rule_based_reply_at(utterance, Local::now())
    }

    /// The rule cascade alone, answering time queries with `now`.
    pub fn rule_based_reply_at(&self, utterance: &str, now: DateTime<Local>) -> Result<String, AppError> {
        let classification = self.classifier.classify(utterance);
        let category = classification.category;
        debug!(category = %category, matched = ?classification.matched, "Classified message");

        if let Some(reply) = fixed_reply(category) {
            return Ok(reply.to_string());
        }
        if category == ResponseCategory::TimeQuery {
            return Ok(format!("{}{}", TIME_REPLY_PREFIX, format_local_timestamp(now)));
        }
        if category.is_randomized() {
            return self.pick(category);
        }
        Err(AppError::Internal(format!("No reply source for category {}", category)))
    }

    fn pick(&self, category: ResponseCategory) -> Result<String, AppError> {
        let entries = self
            .bank
            .entries(category)
            .ok_or_else(|| AppError::Internal(format!("No response bank for category {}", category)))?;
        if entries.is_empty() {
            return Err(AppError::Internal(format!("Response bank for {} is empty", category)));
        }
        let index = self.random.pick_index(entries.len()).min(entries.len() - 1);
        Ok(entries[index].clone())
    }
}
