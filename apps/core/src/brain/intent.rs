//! Response category classification using regex patterns.
//!
//! Rules are an explicit, ordered list: the first rule whose pattern matches decides the
//! category, and anything no rule claims falls through to [`ResponseCategory::Default`].
//! Greeting and farewell rules only match at the start of the message; every other rule
//! matches anywhere in it.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// Which reply family a message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseCategory {
    Greeting,
    Farewell,
    HelpRequest,
    IdentityQuery,
    TimeQuery,
    WeatherQuery,
    AboutQuery,
    Thanks,
    QuestionMark,
    ProblemReport,
    HowTo,
    Default,
}

impl fmt::Display for ResponseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl ResponseCategory {
    pub fn label(&self) -> &'static str {
        match self {
            ResponseCategory::Greeting => "greeting",
            ResponseCategory::Farewell => "farewell",
            ResponseCategory::HelpRequest => "help_request",
            ResponseCategory::IdentityQuery => "identity_query",
            ResponseCategory::TimeQuery => "time_query",
            ResponseCategory::WeatherQuery => "weather_query",
            ResponseCategory::AboutQuery => "about_query",
            ResponseCategory::Thanks => "thanks",
            ResponseCategory::QuestionMark => "question_mark",
            ResponseCategory::ProblemReport => "problem_report",
            ResponseCategory::HowTo => "how_to",
            ResponseCategory::Default => "default",
        }
    }

    /// Categories answered by a random pick from the response bank.
    pub fn is_randomized(&self) -> bool {
        matches!(
            self,
            ResponseCategory::Greeting
                | ResponseCategory::Farewell
                | ResponseCategory::HelpRequest
                | ResponseCategory::Default
        )
    }
}

/// Where a rule's tokens may appear in the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// The message must start with one of the tokens.
    Prefix,
    /// One of the tokens may appear anywhere.
    Anywhere,
}

/// One (pattern, category) pair of the cascade.
#[derive(Debug, Clone)]
pub struct Rule {
    pub category: ResponseCategory,
    pub mode: MatchMode,
    pub tokens: &'static [&'static str],
    pattern: Regex,
}

impl Rule {
    fn new(category: ResponseCategory, mode: MatchMode, tokens: &'static [&'static str]) -> Self {
        let alternatives = tokens
            .iter()
            .map(|token| regex::escape(token))
            .collect::<Vec<_>>()
            .join("|");
        let source = match mode {
            MatchMode::Prefix => format!("^(?:{})", alternatives),
            MatchMode::Anywhere => format!("(?:{})", alternatives),
        };
        // NOTE: tokens are escaped literals, so the pattern always compiles.
        let pattern = Regex::new(&source).expect("Invalid regex: escaped rule tokens");
        Self {
            category,
            mode,
            tokens,
            pattern,
        }
    }
}

pub const GREETING_TOKENS: &[&str] = &[
    "hi",
    "hello",
    "hey",
    "greetings",
    "good morning",
    "good afternoon",
    "good evening",
];
pub const FAREWELL_TOKENS: &[&str] = &["bye", "goodbye", "see you", "take care", "farewell"];
pub const HELP_TOKENS: &[&str] = &["help", "what can you do", "how does this work"];
pub const IDENTITY_TOKENS: &[&str] = &["who are you", "what are you", "your name"];
pub const TIME_TOKENS: &[&str] = &["time", "date", "day"];
pub const WEATHER_TOKENS: &[&str] = &["weather"];
pub const ABOUT_TOKENS: &[&str] = &["adtip", "company", "about"];
pub const THANKS_TOKENS: &[&str] = &["thank you", "thanks", "appreciate"];
pub const QUESTION_TOKENS: &[&str] = &["?"];
pub const PROBLEM_TOKENS: &[&str] = &["problem", "issue", "error", "bug"];
pub const HOW_TO_TOKENS: &[&str] = &["how to", "how do", "how can"];

/// Evaluated in order against the trimmed, lower-cased message.
static PRIMARY_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        Rule::new(ResponseCategory::Greeting, MatchMode::Prefix, GREETING_TOKENS),
        Rule::new(ResponseCategory::Farewell, MatchMode::Prefix, FAREWELL_TOKENS),
        Rule::new(ResponseCategory::HelpRequest, MatchMode::Anywhere, HELP_TOKENS),
        Rule::new(ResponseCategory::IdentityQuery, MatchMode::Anywhere, IDENTITY_TOKENS),
        Rule::new(ResponseCategory::TimeQuery, MatchMode::Anywhere, TIME_TOKENS),
        Rule::new(ResponseCategory::WeatherQuery, MatchMode::Anywhere, WEATHER_TOKENS),
        Rule::new(ResponseCategory::AboutQuery, MatchMode::Anywhere, ABOUT_TOKENS),
        Rule::new(ResponseCategory::Thanks, MatchMode::Anywhere, THANKS_TOKENS),
    ]
});

/// Evaluated in order against the lower-cased, untrimmed message once no primary rule fired.
static SECONDARY_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        Rule::new(ResponseCategory::QuestionMark, MatchMode::Anywhere, QUESTION_TOKENS),
        Rule::new(ResponseCategory::ProblemReport, MatchMode::Anywhere, PROBLEM_TOKENS),
        Rule::new(ResponseCategory::HowTo, MatchMode::Anywhere, HOW_TO_TOKENS),
    ]
});

/// Result of classifying one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub category: ResponseCategory,
    /// The text that matched, `None` for the default fallthrough.
    pub matched: Option<String>,
}

/// Stateless classifier over the fixed rule cascade.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntentClassifier;

impl IntentClassifier {
    pub fn new() -> Self {
        Self
    }

    /// The full cascade, primary rules first.
    pub fn rules(&self) -> impl Iterator<Item = &'static Rule> {
        PRIMARY_RULES.iter().chain(SECONDARY_RULES.iter())
    }

    /// Deterministically maps a message to its category.
    pub fn classify(&self, text: &str) -> Classification {
        let lowered = text.to_lowercase();
        let normalized = lowered.trim();

        if let Some(found) = first_match(&PRIMARY_RULES, normalized) {
            return found;
        }
        if let Some(found) = first_match(&SECONDARY_RULES, &lowered) {
            return found;
        }

        Classification {
            category: ResponseCategory::Default,
            matched: None,
        }
    }
}

fn first_match(rules: &[Rule], text: &str) -> Option<Classification> {
    rules.iter().find_map(|rule| {
        rule.pattern.find(text).map(|m| Classification {
            category: rule.category,
            matched: Some(m.as_str().to_string()),
        })
    })
}
