use async_trait::async_trait;
use serde::Deserialize;
use slide_common::{ImageResult, ImageSearch, SearchCursor};
use std::time::Duration;

use crate::error::SearchError;

pub const DEFAULT_PAGE_SIZE: u32 = 3;
/// Pexels caps `per_page` at 80.
pub const MAX_PAGE_SIZE: u32 = 80;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    total_results: u32,
    #[serde(default)]
    per_page: u32,
    photos: Vec<Photo>,
}

#[derive(Debug, Deserialize)]
struct Photo {
    id: u64,
    photographer: Option<String>,
    alt: Option<String>,
    src: PhotoSrc,
}

#[derive(Debug, Deserialize)]
struct PhotoSrc {
    large: String,
    tiny: String,
}

impl From<Photo> for ImageResult {
    fn from(photo: Photo) -> Self {
        Self {
            id: photo.id.to_string(),
            thumbnail_url: photo.src.tiny,
            full_url: photo.src.large,
            alt_text: photo.alt.filter(|a| !a.is_empty()),
            author: photo.photographer,
        }
    }
}

fn total_pages(total_results: u32, per_page: u32) -> u32 {
    if per_page == 0 {
        return 0;
    }
    total_results.div_ceil(per_page)
}

/// Pexels wants a full locale. A locale passes through unchanged; a bare
/// language code gets its usual region.
pub fn locale_for(language: &str) -> String {
    if let Some((lang, region)) = language.split_once(['-', '_']) {
        return format!("{}-{}", lang.to_ascii_lowercase(), region.to_ascii_uppercase());
    }
    let lang = language.to_ascii_lowercase();
    let region = match lang.as_str() {
        "en" => "US",
        "pt" => "BR",
        "ja" => "JP",
        "zh" => "CN",
        "ko" => "KR",
        "sv" => "SE",
        "cs" => "CZ",
        "da" => "DK",
        "el" => "GR",
        "uk" => "UA",
        "vi" => "VN",
        _ => return format!("{lang}-{}", lang.to_ascii_uppercase()),
    };
    format!("{lang}-{region}")
}

pub struct PexelsClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    locale: String,
}

impl PexelsClient {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self, SearchError> {
        Ok(Self {
            http: crate::http_client(timeout)?,
            api_key,
            base_url: "https://api.pexels.com/v1".to_string(),
            locale: "en-US".to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    pub async fn search_page(
        &self,
        keywords: &str,
        page_size: u32,
        page: u32,
    ) -> Result<(Vec<ImageResult>, u32), SearchError> {
        let per_page = page_size.clamp(1, MAX_PAGE_SIZE);
        let per_page_param = per_page.to_string();
        let page_param = page.to_string();
        let resp = self
            .http
            .get(format!("{}/search", self.base_url.trim_end_matches('/')))
            .header("Authorization", &self.api_key)
            .query(&[
                ("query", keywords),
                ("per_page", per_page_param.as_str()),
                ("page", page_param.as_str()),
                ("locale", self.locale.as_str()),
            ])
            .send()
            .await?;
        let parsed: SearchResponse = crate::check_status(resp).await?.json().await?;
        let effective = if parsed.per_page == 0 { per_page } else { parsed.per_page };
        let pages = total_pages(parsed.total_results, effective);
        tracing::debug!(
            "Pexels page {page}/{pages} for '{keywords}': {} results",
            parsed.photos.len()
        );
        let results = parsed.photos.into_iter().map(ImageResult::from).collect();
        Ok((results, pages))
    }
}

#[async_trait]
impl ImageSearch for PexelsClient {
    fn provider(&self) -> &'static str {
        "pexels"
    }

    fn default_page_size(&self) -> u32 {
        DEFAULT_PAGE_SIZE
    }

    async fn search(
        &self,
        keywords: &str,
        page_size: u32,
    ) -> anyhow::Result<(Vec<ImageResult>, SearchCursor)> {
        let mut cursor = SearchCursor::new(keywords, page_size);
        let (results, pages) = self.search_page(keywords, page_size, 1).await?;
        cursor.update(1, pages);
        Ok((results, cursor))
    }

    async fn next_page(&self, cursor: &mut SearchCursor) -> anyhow::Result<Vec<ImageResult>> {
        let page = cursor.next_page();
        let (results, pages) = self
            .search_page(&cursor.keywords, cursor.page_size, page)
            .await?;
        cursor.update(page, pages);
        Ok(results)
    }
}
