//! Deck insertion core: host abstraction, strategy chain, image updater.

pub mod config;
pub mod error;
pub mod geometry;
pub mod host;
pub mod image_fetch;
pub mod image_updater;
pub mod operation_log;
pub mod orchestrator;
pub mod placeholders;
pub mod probe;
pub mod session;
pub mod strategy;

pub use config::Config;
pub use error::{FetchError, HostError, ImageUpdateError, InsertError, SlideError, StrategyError};
pub use host::{HostSession, MemoryHost};
pub use image_fetch::{HttpImageFetcher, ImageFetcher};
pub use image_updater::{ImageAttachmentUpdater, ImageUpdateReport};
pub use operation_log::{Operation, OperationLog, OperationLogEntry};
pub use orchestrator::{InsertionOrchestrator, InsertionReport};
pub use session::DocumentSession;
pub use strategy::render_instructions;
