//! Translation of questions into SQL through a text-completion backend.

pub mod client;
pub mod prompt;

pub use client::{CompletionBackend, GeminiBackend, OpenAiBackend, from_settings};
pub use prompt::build_prompt;
