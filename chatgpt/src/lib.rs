//! Chat-completions client used to generate decks and image keywords.
//!
//! Works against any OpenAI-compatible `/chat/completions` endpoint; the
//! defaults point at Mistral.

pub mod api_log;
pub mod client;
pub mod error;
pub mod parse;
pub mod prompts;

pub use api_log::{ApiExchange, ApiLog};
pub use client::{ChatCompletionsClient, ChatSettings};
pub use error::GenerationError;
