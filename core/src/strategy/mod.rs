//! Ways of getting a deck into the document, tried in priority order.

pub mod native;
pub mod text_fallback;

use async_trait::async_trait;
use serde::Serialize;
use slide_common::Slide;

use crate::config::InsertionConfig;
use crate::error::StrategyError;
use crate::host::HostSession;
use crate::operation_log::OperationLog;
use crate::probe::HostCapabilities;

pub use native::NativeSlideWriter;
pub use text_fallback::{render_instructions, TextFallbackWriter};

/// Everything a strategy may touch during one insertion.
pub struct InsertionContext<'a> {
    pub host: &'a dyn HostSession,
    pub log: &'a OperationLog,
    pub capabilities: &'a HostCapabilities,
    pub config: &'a InsertionConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StrategySuccess {
    pub slides_written: usize,
    pub slides_failed: usize,
}

#[async_trait]
pub trait InsertionStrategy: Send + Sync {
    /// Stable name recorded in the `method` detail of the log.
    fn name(&self) -> &'static str;

    async fn attempt(
        &self,
        ctx: &InsertionContext<'_>,
        deck: &[Slide],
    ) -> Result<StrategySuccess, StrategyError>;
}

/// Per-strategy result of one insertion run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum StrategyOutcome {
    NotAttempted,
    Failed { error: String },
    Succeeded(StrategySuccess),
}

/// The default chain: native object model first, plain text last.
pub fn default_strategies() -> Vec<Box<dyn InsertionStrategy>> {
    vec![Box::new(NativeSlideWriter), Box::new(TextFallbackWriter)]
}
