use async_trait::async_trait;
use base64::Engine;
use std::time::Duration;

use crate::error::FetchError;

/// Image bytes in the form the host's selection primitive accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub mime: String,
    pub base64: String,
}

impl EncodedImage {
    /// Sniffs the format from magic bytes, falling back to the server's
    /// content type.
    pub fn from_bytes(bytes: &[u8], content_type: Option<&str>) -> Self {
        let mime = sniff_mime(bytes)
            .map(str::to_string)
            .or_else(|| content_type.map(|c| c.split(';').next().unwrap_or(c).trim().to_string()))
            .unwrap_or_else(|| "application/octet-stream".to_string());
        Self {
            mime,
            base64: base64::engine::general_purpose::STANDARD.encode(bytes),
        }
    }

    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, self.base64)
    }
}

fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
        Some("image/png")
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if bytes.starts_with(b"GIF8") {
        Some("image/gif")
    } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("image/webp")
    } else {
        None
    }
}

/// Downloads an image so it can be inserted as binary content.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<EncodedImage, FetchError>;
}

pub struct HttpImageFetcher {
    http: reqwest::Client,
    timeout: Duration,
}

impl HttpImageFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, timeout })
    }

    /// The client's own deadline surfaces as a reqwest error; report it the
    /// same way as the outer bound.
    fn classify(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout {
                timeout_ms: self.timeout.as_millis() as u64,
            }
        } else {
            FetchError::Http(err)
        }
    }

    async fn download(&self, url: &str) -> Result<EncodedImage, FetchError> {
        let resp = self.http.get(url).send().await.map_err(|e| self.classify(e))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = resp.bytes().await.map_err(|e| self.classify(e))?;
        if bytes.is_empty() {
            return Err(FetchError::Empty { url: url.to_string() });
        }
        tracing::debug!("Fetched {} bytes from {url}", bytes.len());
        Ok(EncodedImage::from_bytes(&bytes, content_type.as_deref()))
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> Result<EncodedImage, FetchError> {
        match tokio::time::timeout(self.timeout, self.download(url)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout {
                timeout_ms: self.timeout.as_millis() as u64,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Answers a single request with `status` and `body` after `delay`.
    async fn serve_once(status: &'static str, content_type: &'static str, body: Vec<u8>, delay: Duration) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                request.extend_from_slice(&buf[..n]);
                if n == 0 || memchr::memmem::find(&request, b"\r\n\r\n").is_some() {
                    break;
                }
            }
            tokio::time::sleep(delay).await;
            let head = format!(
                "HTTP/1.1 {status}\r\ncontent-type: {content_type}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n",
                body.len()
            );
            let _ = socket.write_all(head.as_bytes()).await;
            let _ = socket.write_all(&body).await;
            let _ = socket.shutdown().await;
        });
        format!("http://{addr}/photo.png")
    }

    #[tokio::test]
    async fn test_fetch_encodes_body() {
        let url = serve_once("200 OK", "image/png", vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A], Duration::ZERO).await;
        let fetcher = HttpImageFetcher::new(Duration::from_secs(5)).unwrap();

        let image = fetcher.fetch(&url).await.unwrap();
        assert_eq!(image.mime, "image/png");
        assert_eq!(image.base64, "iVBORw0K");
    }

    #[tokio::test]
    async fn test_fetch_rejects_error_status() {
        let url = serve_once("404 Not Found", "text/plain", b"gone".to_vec(), Duration::ZERO).await;
        let fetcher = HttpImageFetcher::new(Duration::from_secs(5)).unwrap();

        let err = fetcher.fetch(&url).await.unwrap_err();
        assert!(matches!(err, FetchError::Status(404)));
    }

    #[tokio::test]
    async fn test_fetch_rejects_empty_body() {
        let url = serve_once("200 OK", "image/jpeg", Vec::new(), Duration::ZERO).await;
        let fetcher = HttpImageFetcher::new(Duration::from_secs(5)).unwrap();

        let err = fetcher.fetch(&url).await.unwrap_err();
        assert!(matches!(err, FetchError::Empty { url: ref u } if *u == url));
    }

    #[tokio::test]
    async fn test_fetch_gives_up_after_timeout() {
        let url = serve_once("200 OK", "image/png", b"late".to_vec(), Duration::from_millis(500)).await;
        let fetcher = HttpImageFetcher::new(Duration::from_millis(50)).unwrap();

        let err = fetcher.fetch(&url).await.unwrap_err();
        assert!(matches!(err, FetchError::Timeout { timeout_ms: 50 }));
    }

    #[test]
    fn test_sniffs_png() {
        let image = EncodedImage::from_bytes(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A], Some("text/plain"));
        assert_eq!(image.mime, "image/png");
        assert_eq!(image.base64, "iVBORw0K");
        assert!(image.data_url().starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_falls_back_to_content_type() {
        let image = EncodedImage::from_bytes(b"abc", Some("image/svg+xml; charset=utf-8"));
        assert_eq!(image.mime, "image/svg+xml");
        assert_eq!(image.base64, "YWJj");
    }

    #[test]
    fn test_unknown_bytes() {
        let image = EncodedImage::from_bytes(b"abc", None);
        assert_eq!(image.mime, "application/octet-stream");
    }
}
