//! Host document API.
//!
//! The add-in only ever talks to the presentation editor through these two
//! traits. `HostSession` is the ambient environment (is the integration layer
//! loaded, is slide automation offered, the selection-based insertion
//! primitive); `AutomationContext` is one batched mutation run whose queued
//! changes are committed by `sync`.

pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

use crate::error::HostError;
use crate::geometry::ShapeBox;
use crate::image_fetch::EncodedImage;

pub use memory::MemoryHost;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostIdentity {
    pub name: String,
    pub version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutInfo {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeInfo {
    pub id: String,
    pub name: String,
    pub bounds: ShapeBox,
    pub text: Option<String>,
}

/// Payload for the selection-based insertion primitive.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionPayload {
    Text(String),
    Image { image: EncodedImage, bounds: ShapeBox },
}

#[async_trait]
pub trait HostSession: Send + Sync {
    /// `None` when the host integration layer is not loaded at all.
    fn identity(&self) -> Option<HostIdentity>;

    /// Whether the presentation automation namespace and its run entry point
    /// are present.
    fn supports_automation(&self) -> bool;

    /// Opens a batched mutation run.
    async fn run(&self) -> Result<Box<dyn AutomationContext>, HostError>;

    /// Inserts at the current selection, independent of any run.
    async fn set_selected_data(&self, payload: SelectionPayload) -> Result<(), HostError>;
}

/// Reads are answered immediately from the committed document state;
/// mutations are queued until `sync`.
#[async_trait]
pub trait AutomationContext: Send {
    async fn layouts(&mut self) -> Result<Vec<LayoutInfo>, HostError>;

    /// Ids of the committed slides, in document order.
    async fn slide_ids(&mut self) -> Result<Vec<String>, HostError>;

    /// Queues a new slide and returns the id it will have once synced.
    async fn add_slide(&mut self, layout_id: &str) -> Result<String, HostError>;

    async fn shapes(&mut self, slide_id: &str) -> Result<Vec<ShapeInfo>, HostError>;

    async fn set_text(&mut self, slide_id: &str, shape_id: &str, text: &str) -> Result<(), HostError>;

    async fn set_bounds(&mut self, slide_id: &str, shape_id: &str, bounds: ShapeBox) -> Result<(), HostError>;

    async fn delete_shape(&mut self, slide_id: &str, shape_id: &str) -> Result<(), HostError>;

    /// Native picture shape sourced from a URL.
    async fn add_image_shape(&mut self, slide_id: &str, url: &str, bounds: ShapeBox) -> Result<(), HostError>;

    /// Makes `slide_id` the target of the selection-based primitive.
    async fn select_slide(&mut self, slide_id: &str) -> Result<(), HostError>;

    /// Commits every queued mutation, in order.
    async fn sync(&mut self) -> Result<(), HostError>;

    /// Drops every queued mutation without committing it. Used after a
    /// failed or abandoned `sync` so the leftovers do not ride along with
    /// the next one.
    fn discard_pending(&mut self);
}

/// Bounds one host round trip.
pub async fn within<T, F>(limit: Duration, fut: F) -> Result<T, HostError>
where
    F: Future<Output = Result<T, HostError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(HostError::Timeout {
            timeout_ms: limit.as_millis() as u64,
        }),
    }
}

/// `sync` bounded by the configured batch timeout.
pub async fn sync_within(ctx: &mut dyn AutomationContext, limit: Duration) -> Result<(), HostError> {
    within(limit, ctx.sync()).await
}
