//! Test Module
//!
//! Test suite for the chatbot backend.
//!
//! ## Test Categories
//! - `selector_tests`: rule cascade, bank picks and external responder fallback
//! - `database_tests`: transcript persistence
//! - `api_tests`: end-to-end HTTP workflows

pub mod selector_tests;
