use thiserror::Error;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Image API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Unknown image provider: {0}")]
    UnknownProvider(String),
}
