use async_trait::async_trait;
use serde::Deserialize;
use slide_common::{ImageResult, ImageSearch, SearchCursor};
use std::time::Duration;

use crate::error::SearchError;

pub const DEFAULT_PAGE_SIZE: u32 = 4;
/// Unsplash caps `per_page` at 30.
pub const MAX_PAGE_SIZE: u32 = 30;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    total_pages: u32,
    results: Vec<Photo>,
}

#[derive(Debug, Deserialize)]
struct Photo {
    id: String,
    urls: PhotoUrls,
    alt_description: Option<String>,
    description: Option<String>,
    user: Option<PhotoUser>,
}

#[derive(Debug, Deserialize)]
struct PhotoUrls {
    regular: String,
    thumb: String,
}

#[derive(Debug, Deserialize)]
struct PhotoUser {
    name: Option<String>,
}

impl From<Photo> for ImageResult {
    fn from(photo: Photo) -> Self {
        Self {
            id: photo.id,
            thumbnail_url: photo.urls.thumb,
            full_url: photo.urls.regular,
            alt_text: photo.alt_description.or(photo.description),
            author: photo.user.and_then(|u| u.name),
        }
    }
}

/// Unsplash takes a bare ISO 639-1 code; `fr-FR` becomes `fr`.
pub fn lang_for(language: &str) -> String {
    language
        .split(['-', '_'])
        .next()
        .unwrap_or(language)
        .to_ascii_lowercase()
}

pub struct UnsplashClient {
    http: reqwest::Client,
    access_key: String,
    base_url: String,
    lang: String,
}

impl UnsplashClient {
    pub fn new(access_key: String, timeout: Duration) -> Result<Self, SearchError> {
        Ok(Self {
            http: crate::http_client(timeout)?,
            access_key,
            base_url: "https://api.unsplash.com".to_string(),
            lang: "en".to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_language(mut self, lang: impl Into<String>) -> Self {
        self.lang = lang.into();
        self
    }

    pub async fn search_page(
        &self,
        keywords: &str,
        page_size: u32,
        page: u32,
    ) -> Result<(Vec<ImageResult>, u32), SearchError> {
        let per_page = page_size.clamp(1, MAX_PAGE_SIZE).to_string();
        let page_param = page.to_string();
        let resp = self
            .http
            .get(format!("{}/search/photos", self.base_url.trim_end_matches('/')))
            .header("Authorization", format!("Client-ID {}", self.access_key))
            .header("Accept-Version", "v1")
            .query(&[
                ("query", keywords),
                ("per_page", per_page.as_str()),
                ("page", page_param.as_str()),
                ("lang", self.lang.as_str()),
            ])
            .send()
            .await?;
        let parsed: SearchResponse = crate::check_status(resp).await?.json().await?;
        tracing::debug!(
            "Unsplash page {page}/{} for '{keywords}': {} results",
            parsed.total_pages,
            parsed.results.len()
        );
        let results = parsed.results.into_iter().map(ImageResult::from).collect();
        Ok((results, parsed.total_pages))
    }
}

#[async_trait]
impl ImageSearch for UnsplashClient {
    fn provider(&self) -> &'static str {
        "unsplash"
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
        let (results, total_pages) = self.search_page(keywords, page_size, 1).await?;
        cursor.update(1, total_pages);
        Ok((results, cursor))
    }

    async fn next_page(&self, cursor: &mut SearchCursor) -> anyhow::Result<Vec<ImageResult>> {
        let page = cursor.next_page();
        let (results, total_pages) = self
            .search_page(&cursor.keywords, cursor.page_size, page)
            .await?;
        cursor.update(page, total_pages);
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_server;

    fn page(total_pages: u32, id: &str) -> String {
        serde_json::json!({
            "total": 8,
            "total_pages": total_pages,
            "results": [{
                "id": id,
                "width": 10,
                "height": 10,
                "urls": {
                    "raw": "r", "full": "f",
                    "regular": format!("https://images/{id}/regular"),
                    "small": "s",
                    "thumb": format!("https://images/{id}/thumb")
                },
                "alt_description": null,
                "description": "a beach",
                "user": { "name": "Ana" }
            }]
        })
        .to_string()
    }

    #[test]
    fn test_lang_for_strips_region() {
        assert_eq!(lang_for("fr-FR"), "fr");
        assert_eq!(lang_for("pt_BR"), "pt");
        assert_eq!(lang_for("EN"), "en");
    }

    #[tokio::test]
    async fn test_search_then_wrap_around() {
        let (url, server) = test_server::serve(vec![page(2, "a"), page(2, "b"), page(2, "c")]).await;
        let client = UnsplashClient::new("key".into(), Duration::from_secs(5))
            .unwrap()
            .with_base_url(url)
            .with_language(lang_for("fr-FR"));

        let (first, mut cursor) = client.search("beach", 4).await.unwrap();
        assert_eq!(first[0].id, "a");
        assert_eq!(first[0].alt_text.as_deref(), Some("a beach"));
        assert_eq!(first[0].author.as_deref(), Some("Ana"));
        assert_eq!(cursor.page, 1);
        assert_eq!(cursor.total_pages, 2);

        let second = client.next_page(&mut cursor).await.unwrap();
        assert_eq!(second[0].full_url, "https://images/b/regular");
        assert_eq!(cursor.page, 2);

        client.next_page(&mut cursor).await.unwrap();
        assert_eq!(cursor.page, 1);

        let requests = server.await.unwrap();
        assert!(requests[0].starts_with("GET /search/photos?query=beach&per_page=4&page=1"));
        assert!(requests[0].contains("Client-ID key"));
        assert!(requests[0].contains("lang=fr"));
        assert!(requests[1].contains("page=2"));
        assert!(requests[2].contains("page=1"));
    }
}
