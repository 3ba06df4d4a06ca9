//! External text-generation capability tried before the rule engine.

pub mod huggingface;
pub mod traits;

pub use huggingface::HuggingFaceResponder;
pub use traits::ExternalResponder;
