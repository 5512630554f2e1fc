use thiserror::Error;

use crate::placeholders::PlaceholderSlot;

/// Failures reported by the host document API.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HostError {
    #[error("Host integration layer is not loaded")]
    IntegrationMissing,

    #[error("Presentation automation API is not available")]
    AutomationUnavailable,

    #[error("Host rejected the request: {0}")]
    Rejected(String),

    #[error("Host object not found: {0}")]
    NotFound(String),

    #[error("Host batch timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
}

/// Errors surfaced to callers of the insertion orchestrator.
#[derive(Error, Debug)]
pub enum InsertError {
    #[error("Host unavailable: {0}")]
    HostUnavailable(HostError),

    #[error("Deck is empty, nothing to insert")]
    EmptyDeck,

    #[error("All insertion strategies failed: {trail}")]
    AllStrategiesExhausted { trail: String },
}

/// A whole strategy failed; the orchestrator moves on to the next one.
#[derive(Error, Debug)]
pub enum StrategyError {
    #[error("{0}")]
    Host(#[from] HostError),

    #[error("Slide layout '{name}' not found in the presentation template")]
    LayoutMissing { name: String },
}

/// One slide could not be written; the writer skips it and continues.
#[derive(Error, Debug)]
pub enum SlideError {
    #[error("{0}")]
    Host(#[from] HostError),

    #[error("Slide is missing placeholder slots {missing:?} (shapes found: {found:?})")]
    MissingPlaceholders {
        missing: Vec<PlaceholderSlot>,
        found: Vec<String>,
    },
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Image download failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Image download returned status {0}")]
    Status(u16),

    #[error("Image download timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Image at {url} is empty")]
    Empty { url: String },
}

/// Per-phase failures of the image attachment updater. Earlier phases are
/// not rolled back.
#[derive(Error, Debug)]
pub enum ImageUpdateError {
    #[error("Slide {} does not exist", .index + 1)]
    SlideNotFound { index: usize },

    #[error("No content region found on the slide")]
    NoContentRegion,

    #[error("{0}")]
    Host(#[from] HostError),

    #[error("{0}")]
    Fetch(#[from] FetchError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    FileNotFound { path: String },

    #[error("IO error: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },

    #[error("JSON parse error: {source}")]
    ParseError {
        #[from]
        source: serde_json::Error,
    },

    #[error("TOML parse error: {source}")]
    TomlParseError {
        #[from]
        source: toml::de::Error,
    },

    #[error("TOML serialize error: {source}")]
    TomlSerializeError {
        #[from]
        source: toml::ser::Error,
    },
}
