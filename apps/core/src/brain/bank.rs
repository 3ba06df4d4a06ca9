//! Canned replies.
//!
//! Randomized categories draw from a [`ResponseBank`], which can be replaced at startup by a
//! JSON file. Fixed categories always answer with the same constant.

use crate::brain::intent::ResponseCategory;
use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;
use validator::{Validate, ValidationError};

pub const IDENTITY_REPLY: &str =
    "I'm an AI-powered chatbot built by Manish Kumar to assist you with your questions!";
pub const TIME_REPLY_PREFIX: &str = "The current date and time is: ";
pub const WEATHER_REPLY: &str = "I don't have real-time weather data, but I suggest checking a weather website or app for accurate information!";
pub const ABOUT_REPLY: &str = "I’m an AI assistant designed to help you with quick, clear, and useful answers. You can ask me anything—I'm here to make things easier for you.";
pub const THANKS_REPLY: &str = "You're welcome! Happy to help! 😊";
pub const QUESTION_REPLY: &str = "That's a great question! While I'm working with basic AI capabilities, I can try to help. For more accurate responses, you can connect me to advanced AI models like GPT or Claude.";
pub const PROBLEM_REPLY: &str = "I understand you're facing a challenge. Could you provide more specific details so I can better assist you?";
pub const HOW_TO_REPLY: &str = "I'd be happy to guide you through that! Could you provide more specific details about what you're trying to achieve?";
pub const APOLOGY_REPLY: &str =
    "I apologize, but I'm having trouble processing your request right now. Please try again!";

/// The constant reply of a fixed category, `None` for randomized or templated ones.
pub fn fixed_reply(category: ResponseCategory) -> Option<&'static str> {
    match category {
        ResponseCategory::IdentityQuery => Some(IDENTITY_REPLY),
        ResponseCategory::WeatherQuery => Some(WEATHER_REPLY),
        ResponseCategory::AboutQuery => Some(ABOUT_REPLY),
        ResponseCategory::Thanks => Some(THANKS_REPLY),
        ResponseCategory::QuestionMark => Some(QUESTION_REPLY),
        ResponseCategory::ProblemReport => Some(PROBLEM_REPLY),
        ResponseCategory::HowTo => Some(HOW_TO_REPLY),
        _ => None,
    }
}

/// Candidate replies for each randomized category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ResponseBank {
    #[validate(length(min = 1), custom(function = "no_blank_entries"))]
    pub greeting: Vec<String>,
    #[validate(length(min = 1), custom(function = "no_blank_entries"))]
    pub farewell: Vec<String>,
    #[validate(length(min = 1), custom(function = "no_blank_entries"))]
    pub help: Vec<String>,
    #[validate(length(min = 1), custom(function = "no_blank_entries"))]
    pub default: Vec<String>,
}

impl Default for ResponseBank {
    fn default() -> Self {
        Self {
            greeting: strings(&[
                "Hello! How can I assist you today?",
                "Hi there! What can I help you with?",
                "Greetings! I'm here to help.",
                "Hey! What would you like to know?",
            ]),
            farewell: strings(&[
                "Goodbye! Have a great day!",
                "See you later! Feel free to come back anytime.",
                "Take care! It was nice chatting with you.",
            ]),
            help: strings(&[
                "I'm an AI assistant here to help answer your questions. Just type your question and I'll do my best to help!",
                "I can assist you with various topics. What would you like to know?",
            ]),
            default: strings(&[
                "That's an interesting question. Could you provide more details?",
                "I understand. Can you tell me more about that?",
                "I'm here to help! Could you rephrase that question?",
                "Interesting! Let me think about that...",
            ]),
        }
    }
}

impl ResponseBank {
    /// Parses and validates a bank from JSON. Every category must list at least one reply,
    /// and no reply may be blank.
    pub fn from_json(json: &str) -> Result<Self, AppError> {
        let bank: ResponseBank = serde_json::from_str(json)?;
        bank.validate()?;
        Ok(bank)
    }

    pub fn load(path: &Path) -> Result<Self, AppError> {
        let json = std::fs::read_to_string(path)?;
        let bank = Self::from_json(&json)?;
        info!("Loaded response bank from {:?}", path);
        Ok(bank)
    }

    /// The candidates of a randomized category, `None` for fixed ones.
    pub fn entries(&self, category: ResponseCategory) -> Option<&[String]> {
        match category {
            ResponseCategory::Greeting => Some(self.greeting.as_slice()),
            ResponseCategory::Farewell => Some(self.farewell.as_slice()),
            ResponseCategory::HelpRequest => Some(self.help.as_slice()),
            ResponseCategory::Default => Some(self.default.as_slice()),
            _ => None,
        }
    }
}

/// A blank candidate would be picked and then rejected as an empty reply.
fn no_blank_entries(entries: &[String]) -> Result<(), ValidationError> {
    if entries.iter().any(|entry| entry.trim().is_empty()) {
        return Err(ValidationError::new("blank_entry"));
    }
    Ok(())
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
