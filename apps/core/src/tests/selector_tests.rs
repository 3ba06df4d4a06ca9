//! Response Selector Tests
//!
//! Reply selection over the rule cascade, the random bank picks and the external
//! responder fallback.

use crate::brain::bank::{
    ABOUT_REPLY, APOLOGY_REPLY, HOW_TO_REPLY, IDENTITY_REPLY, PROBLEM_REPLY, QUESTION_REPLY,
    THANKS_REPLY, TIME_REPLY_PREFIX, WEATHER_REPLY,
};
use crate::brain::intent::ResponseCategory;
use crate::brain::{
    IntentClassifier, RandomSource, ResponseBank, ResponseSelector, SeededRandom, SelectorConfig,
};
use crate::error::AppError;
use crate::responder::ExternalResponder;
use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Test Fixtures
// ============================================================================

/// Responder double with a scripted outcome.
enum Scripted {
    Reply(&'static str),
    Fail,
    Hang,
}

struct MockResponder {
    outcome: Scripted,
    calls: AtomicUsize,
}

impl MockResponder {
    fn new(outcome: Scripted) -> Arc<Self> {
        Arc::new(Self {
            outcome,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExternalResponder for MockResponder {
    async fn generate(&self, _utterance: &str) -> Result<String, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.outcome {
            Scripted::Reply(text) => Ok(text.to_string()),
            Scripted::Fail => Err(AppError::Responder("connection refused".to_string())),
            Scripted::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok("never delivered".to_string())
            }
        }
    }
}

/// Always picks the same slot; lets tests name the exact bank entry.
struct FixedIndex(usize);

impl RandomSource for FixedIndex {
    fn pick_index(&self, _len: usize) -> usize {
        self.0
    }
}

fn rules_only() -> ResponseSelector {
    ResponseSelector::new(SelectorConfig {
        random: Arc::new(SeededRandom::new(7)),
        ..SelectorConfig::default()
    })
}

fn with_responder(responder: Arc<MockResponder>, timeout: Duration) -> ResponseSelector {
    ResponseSelector::new(SelectorConfig {
        responder: Some(responder as Arc<dyn ExternalResponder>),
        responder_timeout: timeout,
        random: Arc::new(SeededRandom::new(7)),
        ..SelectorConfig::default()
    })
}

fn greeting_bank() -> Vec<String> {
    ResponseBank::default().greeting
}

// ============================================================================
// Rule cascade
// ============================================================================

#[cfg(test)]
mod rule_tests {
    use super::*;

    #[tokio::test]
    async fn test_hi_returns_a_greeting() {
        let selector = rules_only();
        let reply = selector.select_reply("Hi").await;
        let expected = [
            "Hello! How can I assist you today?",
            "Hi there! What can I help you with?",
            "Greetings! I'm here to help.",
            "Hey! What would you like to know?",
        ];
        assert!(expected.contains(&reply.as_str()), "unexpected greeting: {}", reply);
    }

    #[tokio::test]
    async fn test_anchored_greetings_come_from_the_bank() {
        let selector = rules_only();
        let bank = greeting_bank();
        for input in ["hello", "Hey you", "GREETINGS", "good morning!", "  good afternoon", "good evening all"] {
            let reply = selector.select_reply(input).await;
            assert!(bank.contains(&reply), "Expected a greeting for '{}', got '{}'", input, reply);
        }
    }

    #[tokio::test]
    async fn test_farewell_and_help_come_from_their_banks() {
        let selector = rules_only();
        let bank = ResponseBank::default();

        for input in ["bye", "Goodbye friend", "take care", "farewell"] {
            let reply = selector.select_reply(input).await;
            assert!(bank.farewell.contains(&reply), "Expected a farewell for '{}'", input);
        }
        for input in ["I need help", "what can you do", "How does this work"] {
            let reply = selector.select_reply(input).await;
            assert!(bank.help.contains(&reply), "Expected help for '{}'", input);
        }
    }

    #[tokio::test]
    async fn test_identity_is_exact() {
        let selector = rules_only();
        assert_eq!(selector.select_reply("what is your name").await, IDENTITY_REPLY);
        assert_eq!(selector.select_reply("Who are you?").await, IDENTITY_REPLY);
    }

    #[tokio::test]
    async fn test_fixed_categories() {
        let selector = rules_only();
        let cases = [
            ("How is the weather", WEATHER_REPLY),
            ("tell me about adtip", ABOUT_REPLY),
            ("which company made you", ABOUT_REPLY),
            ("thanks a lot", THANKS_REPLY),
            ("thank you!", THANKS_REPLY),
            ("I appreciate it", THANKS_REPLY),
            ("is this real?", QUESTION_REPLY),
            ("there is an error in my code", PROBLEM_REPLY),
            ("how do I bake bread", HOW_TO_REPLY),
        ];
        for (input, expected) in cases {
            assert_eq!(selector.select_reply(input).await, expected, "input: '{}'", input);
        }
    }

    #[tokio::test]
    async fn test_thanks_is_identical_every_time() {
        let selector = rules_only();
        for _ in 0..20 {
            assert_eq!(selector.select_reply("thanks").await, THANKS_REPLY);
        }
    }

    #[tokio::test]
    async fn test_question_mark_fallback_when_nothing_else_matches() {
        let selector = rules_only();
        for input in ["really?", "is it big?", "?", "are cats nice?"] {
            assert_eq!(selector.select_reply(input).await, QUESTION_REPLY, "input: '{}'", input);
        }
    }

    #[tokio::test]
    async fn test_default_comes_from_default_bank() {
        let selector = rules_only();
        let reply = selector.select_reply("pizza is great").await;
        assert!(ResponseBank::default().default.contains(&reply));
    }

    #[test]
    fn test_time_query_interpolates_local_clock() {
        let selector = rules_only();
        let before = Local::now().naive_local();
        let reply = selector.rule_based_reply("what time is it").unwrap();
        let after = Local::now().naive_local();

        let stamp = reply
            .strip_prefix(TIME_REPLY_PREFIX)
            .unwrap_or_else(|| panic!("unexpected time reply: {}", reply));
        let parsed = NaiveDateTime::parse_from_str(stamp, "%m/%d/%Y, %I:%M:%S %p")
            .unwrap_or_else(|e| panic!("unparseable timestamp '{}': {}", stamp, e));

        // the rendered time has whole-second precision
        let lower = before - chrono::Duration::seconds(1);
        let upper = after + chrono::Duration::seconds(1);
        assert!(parsed >= lower && parsed <= upper, "{} not within [{}, {}]", parsed, lower, upper);
    }

    #[test]
    fn test_time_query_uses_given_instant() {
        use chrono::TimeZone;
        let selector = rules_only();
        let now = Local.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap();
        let reply = selector.rule_based_reply_at("what day is today", now).unwrap();
        assert_eq!(reply, format!("{}3/5/2024, 2:07:09 PM", TIME_REPLY_PREFIX));
    }

    #[test]
    fn test_fixed_index_selects_named_entry() {
        let selector = ResponseSelector::new(SelectorConfig {
            random: Arc::new(FixedIndex(2)),
            ..SelectorConfig::default()
        });
        assert_eq!(selector.rule_based_reply("hello").unwrap(), "Greetings! I'm here to help.");
        assert_eq!(
            selector.rule_based_reply("bye").unwrap(),
            "Take care! It was nice chatting with you."
        );
    }

    #[test]
    fn test_out_of_range_pick_is_clamped() {
        let selector = ResponseSelector::new(SelectorConfig {
            random: Arc::new(FixedIndex(99)),
            ..SelectorConfig::default()
        });
        assert_eq!(
            selector.rule_based_reply("hello").unwrap(),
            "Hey! What would you like to know?"
        );
    }

    #[tokio::test]
    async fn test_empty_bank_yields_apology() {
        let mut bank = ResponseBank::default();
        bank.default.clear();
        let selector = ResponseSelector::new(SelectorConfig {
            bank,
            ..SelectorConfig::default()
        });

        assert!(matches!(selector.rule_based_reply("zzz"), Err(AppError::Internal(_))));
        assert_eq!(selector.select_reply("zzz").await, APOLOGY_REPLY);
        // other categories are unaffected
        assert_eq!(selector.select_reply("thanks").await, THANKS_REPLY);
    }
}

// ============================================================================
// Randomness
// ============================================================================

#[cfg(test)]
mod distribution_tests {
    use super::*;

    #[tokio::test]
    async fn test_hello_only_yields_greeting_bank_entries() {
        let selector = ResponseSelector::default();
        let bank = greeting_bank();
        for _ in 0..100 {
            let reply = selector.select_reply("hello").await;
            assert!(bank.contains(&reply), "unexpected reply: {}", reply);
        }
    }

    #[tokio::test]
    async fn test_every_greeting_entry_appears() {
        let selector = rules_only();
        let seen: HashSet<String> = {
            let mut seen = HashSet::new();
            for _ in 0..1_000 {
                seen.insert(selector.select_reply("hello").await);
            }
            seen
        };
        assert_eq!(seen.len(), greeting_bank().len());
    }

    #[test]
    fn test_seeded_sources_are_reproducible() {
        let a = SeededRandom::new(42);
        let b = SeededRandom::new(42);
        let picks_a: Vec<usize> = (0..50).map(|_| a.pick_index(4)).collect();
        let picks_b: Vec<usize> = (0..50).map(|_| b.pick_index(4)).collect();
        assert_eq!(picks_a, picks_b);
        assert!(picks_a.iter().all(|i| *i < 4));
    }

    #[test]
    fn test_classification_is_deterministic() {
        let classifier = IntentClassifier::new();
        for input in ["Hi", "what is your name", "the weather?", "bug report", "xyz"] {
            let first = classifier.classify(input);
            for _ in 0..10 {
                assert_eq!(classifier.classify(input), first);
            }
        }
        assert_eq!(classifier.classify("  HELLO  ").category, ResponseCategory::Greeting);
    }
}

// ============================================================================
// External responder
// ============================================================================

#[cfg(test)]
mod responder_fallback_tests {
    use super::*;

    #[tokio::test]
    async fn test_external_reply_is_returned_verbatim() {
        let responder = MockResponder::new(Scripted::Reply("  A model said this.  "));
        let selector = with_responder(responder.clone(), Duration::from_secs(1));

        assert!(selector.has_external_responder());
        assert_eq!(selector.select_reply("hello").await, "  A model said this.  ");
        assert_eq!(responder.calls(), 1);
    }

    #[tokio::test]
    async fn test_failure_falls_back_to_rules() {
        let responder = MockResponder::new(Scripted::Fail);
        let selector = with_responder(responder.clone(), Duration::from_secs(1));

        assert_eq!(selector.select_reply("what is your name").await, IDENTITY_REPLY);
        assert_eq!(selector.select_reply("thanks").await, THANKS_REPLY);
        // no retry
        assert_eq!(responder.calls(), 2);
    }

    #[tokio::test]
    async fn test_empty_external_reply_falls_back_to_rules() {
        let responder = MockResponder::new(Scripted::Reply("   "));
        let selector = with_responder(responder, Duration::from_secs(1));

        assert_eq!(selector.select_reply("is it ok?").await, QUESTION_REPLY);
    }

    #[tokio::test]
    async fn test_timeout_falls_back_to_rules() {
        let responder = MockResponder::new(Scripted::Hang);
        let selector = with_responder(responder.clone(), Duration::from_millis(50));

        let started = std::time::Instant::now();
        let reply = selector.select_reply("what is your name").await;

        assert_eq!(reply, IDENTITY_REPLY);
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(responder.calls(), 1);
    }

    #[tokio::test]
    async fn test_fallback_reply_matches_rule_path() {
        let responder = MockResponder::new(Scripted::Fail);
        let selector = ResponseSelector::new(SelectorConfig {
            responder: Some(responder as Arc<dyn ExternalResponder>),
            random: Arc::new(FixedIndex(1)),
            ..SelectorConfig::default()
        });

        for input in ["hello", "bye", "help", "weather", "pizza"] {
            let expected = selector.rule_based_reply(input).unwrap();
            assert_eq!(selector.select_reply(input).await, expected, "input: '{}'", input);
        }
    }
}
