use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use slide_common::Slide;
use slide_core::config::InsertionConfig;
use slide_core::host::memory::FailurePlan;
use slide_core::image_fetch::EncodedImage;
use slide_core::{DocumentSession, FetchError, ImageFetcher, InsertError, MemoryHost, Operation};

struct PngFetcher;

#[async_trait]
impl ImageFetcher for PngFetcher {
    async fn fetch(&self, _url: &str) -> Result<EncodedImage, FetchError> {
        Ok(EncodedImage::from_bytes(&[0x89, b'P', b'N', b'G'], Some("image/png")))
    }
}

fn session(host: &MemoryHost, config: InsertionConfig) -> DocumentSession {
    DocumentSession::new(Arc::new(host.clone()), config, Arc::new(PngFetcher))
}

fn deck(prefix: &str) -> Vec<Slide> {
    vec![
        Slide::new(format!("{prefix} intro"), "Welcome"),
        Slide::new(format!("{prefix} one"), "Detail A"),
        Slide::new(format!("{prefix} two"), "Detail B"),
    ]
}

#[tokio::test]
async fn insert_then_attach_image() {
    let host = MemoryHost::new();
    let session = session(&host, InsertionConfig::default());

    let report = session.insert_deck(&deck("Rust")).await.unwrap();
    assert_eq!(report.winner().map(|(m, _)| m), Some("PowerPointAPI"));
    assert_eq!(host.slide_count(), 3);

    let update = session
        .update_slide_image(2, "https://images.example/rust.png")
        .await
        .unwrap();
    assert_eq!(update.removed_images, 0);
    assert_eq!(host.slides()[2].pictures().len(), 1);

    let log = session.log();
    assert_eq!(log.count(Operation::AddSlide), 3);
    assert_eq!(log.count(Operation::UpdateSlideImage), 1);
    assert_eq!(log.entries()[0].operation, Operation::UpdateSlideImage);
}

#[tokio::test]
async fn manual_host_gets_text_instructions() {
    let host = MemoryHost::new().without_automation();
    let session = session(&host, InsertionConfig::default());

    let report = session.insert_deck(&deck("Manual")).await.unwrap();
    assert_eq!(report.winner().map(|(m, _)| m), Some("TextFormat"));
    assert_eq!(host.slide_count(), 0);

    let text = &host.inserted_text()[0];
    assert!(text.contains("TITLE: Manual intro"));
    assert!(text.contains("==== SLIDE 3 ===="));
}

#[tokio::test]
async fn slow_sync_times_out_and_falls_back() {
    let host = MemoryHost::new().with_failures(FailurePlan {
        sync_delay: Some(Duration::from_millis(200)),
        ..FailurePlan::default()
    });
    let config = InsertionConfig {
        host_batch_timeout_ms: 20,
        ..InsertionConfig::default()
    };
    let session = session(&host, config);

    let report = session.insert_deck(&deck("Slow")).await.unwrap();
    assert_eq!(report.winner().map(|(m, _)| m), Some("TextFormat"));

    let failed_slides = session
        .log()
        .entries()
        .into_iter()
        .filter(|e| e.operation == Operation::AddSlide && !e.success)
        .count();
    assert_eq!(failed_slides, 3);
    assert_eq!(session.log().count(Operation::RunSync), 1);
}

#[tokio::test]
async fn concurrent_inserts_do_not_interleave() {
    let host = MemoryHost::new().with_failures(FailurePlan {
        sync_delay: Some(Duration::from_millis(5)),
        ..FailurePlan::default()
    });
    let session = session(&host, InsertionConfig::default());

    let first = deck("A");
    let second = deck("B");
    let (a, b) = tokio::join!(session.insert_deck(&first), session.insert_deck(&second));
    a.unwrap();
    b.unwrap();

    let titles: Vec<String> = host
        .slides()
        .iter()
        .map(|s| s.shape_named("Title").and_then(|t| t.text.clone()).unwrap_or_default())
        .collect();
    assert_eq!(titles.len(), 6);
    let first_batch = titles[0].chars().next();
    assert!(titles[..3].iter().all(|t| t.chars().next() == first_batch));
    assert!(titles[3..].iter().all(|t| t.chars().next() != first_batch));
}

#[tokio::test]
async fn detached_host_is_fatal() {
    let host = MemoryHost::detached();
    let session = session(&host, InsertionConfig::default());

    let err = session.insert_deck(&deck("None")).await.unwrap_err();
    assert!(matches!(err, InsertError::HostUnavailable(_)));
    assert_eq!(session.log().trail(), "OfficeAPICheck:FAIL");
}
