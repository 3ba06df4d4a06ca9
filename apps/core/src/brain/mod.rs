//! # Brain Module
//!
//! Rule-based reply engine for the chatbot.
//!
//! ## Components
//! - `intent`: ordered regex rule cascade mapping a message to a category
//! - `bank`: canned replies, randomized and fixed
//! - `selector`: external responder first, rule cascade as fallback

pub mod bank;
pub mod intent;
pub mod selector;

pub use bank::ResponseBank;
pub use intent::IntentClassifier;
pub use selector::{RandomSource, ResponseSelector, SeededRandom, SelectorConfig, ThreadRandom};
