//! Stock photo search clients (Unsplash, Pexels) behind the
//! [`slide_common::ImageSearch`] trait.

pub mod error;
pub mod pexels;
pub mod unsplash;

#[cfg(test)]
pub(crate) mod test_server;

pub use error::SearchError;
pub use pexels::PexelsClient;
pub use unsplash::UnsplashClient;

use std::time::Duration;

/// Builds the provider selected by name (`unsplash` or `pexels`), searching
/// in `language` (an ISO 639-1 code such as `fr`, or a locale such as `fr-FR`).
pub fn provider_by_name(
    name: &str,
    api_key: String,
    language: &str,
    timeout: Duration,
) -> Result<Box<dyn slide_common::ImageSearch>, SearchError> {
    match name.to_ascii_lowercase().as_str() {
        "unsplash" => Ok(Box::new(
            UnsplashClient::new(api_key, timeout)?.with_language(unsplash::lang_for(language)),
        )),
        "pexels" => Ok(Box::new(
            PexelsClient::new(api_key, timeout)?.with_locale(pexels::locale_for(language)),
        )),
        other => Err(SearchError::UnknownProvider(other.to_string())),
    }
}

pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client, SearchError> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

pub(crate) async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, SearchError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(SearchError::Status {
        status: status.as_u16(),
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_by_name() {
        let timeout = Duration::from_secs(5);
        let unsplash = provider_by_name("Unsplash", "k".into(), "en", timeout).unwrap();
        assert_eq!(unsplash.provider(), "unsplash");
        assert_eq!(unsplash.default_page_size(), 4);

        let pexels = provider_by_name("pexels", "k".into(), "en", timeout).unwrap();
        assert_eq!(pexels.provider(), "pexels");
        assert_eq!(pexels.default_page_size(), 3);

        assert!(matches!(
            provider_by_name("flickr", "k".into(), "en", timeout),
            Err(SearchError::UnknownProvider(_))
        ));
    }
}
