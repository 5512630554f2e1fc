use anyhow::Result;
use async_trait::async_trait;

use crate::slide::{ImageResult, SearchCursor, Slide};

/// Produces a deck from a free-form prompt.
#[async_trait]
pub trait DeckGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<Vec<Slide>>;

    /// Comma-separated keywords suitable for an image search query.
    async fn keywords_for_image(&self, slide_text: &str) -> Result<String>;
}

/// Stock photo search with caller-owned pagination.
#[async_trait]
pub trait ImageSearch: Send + Sync {
    fn provider(&self) -> &'static str;

    /// Results per page when the caller has no preference.
    fn default_page_size(&self) -> u32;

    async fn search(&self, keywords: &str, page_size: u32)
        -> Result<(Vec<ImageResult>, SearchCursor)>;

    /// Fetches the page after `cursor` (wrapping to the first) and advances it.
    async fn next_page(&self, cursor: &mut SearchCursor) -> Result<Vec<ImageResult>>;
}
