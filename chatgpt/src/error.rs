use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Response has no message content")]
    EmptyResponse,

    #[error("Could not parse deck from model reply: {reason}")]
    Parse { reason: String },

    #[error("Model returned an empty deck")]
    EmptyDeck,
}
