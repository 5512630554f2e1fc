//! Replaces the image on an existing slide.
//!
//! The content placeholder is narrowed and shifted right, the new picture
//! goes into the freed space on the left. Each phase commits on its own;
//! a later failure leaves earlier phases in place.

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::config::InsertionConfig;
use crate::error::{HostError, ImageUpdateError};
use crate::geometry::ShapeBox;
use crate::host::{sync_within, within, AutomationContext, HostSession, SelectionPayload, ShapeInfo};
use crate::image_fetch::ImageFetcher;
use crate::operation_log::{Operation, OperationLog};
use crate::placeholders::{content_region, image_shapes};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageUpdateReport {
    pub slide_index: usize,
    pub slide_id: String,
    pub removed_images: usize,
    pub image: ShapeBox,
    pub content: ShapeBox,
}

pub struct ImageAttachmentUpdater {
    fetcher: Arc<dyn ImageFetcher>,
}

impl ImageAttachmentUpdater {
    pub fn new(fetcher: Arc<dyn ImageFetcher>) -> Self {
        Self { fetcher }
    }

    pub async fn update(
        &self,
        host: &dyn HostSession,
        log: &OperationLog,
        config: &InsertionConfig,
        slide_index: usize,
        image_url: &str,
    ) -> Result<ImageUpdateReport, ImageUpdateError> {
        let result = self
            .replace(host, log, config, slide_index, image_url)
            .await;
        match &result {
            Ok(report) => log.ok(
                Operation::UpdateSlideImage,
                Some(slide_index),
                Some(serde_json::json!({ "imageUrl": image_url, "slideId": report.slide_id })),
            ),
            Err(e) => log.fail(
                Operation::UpdateSlideImage,
                Some(slide_index),
                e,
                Some(serde_json::json!({ "imageUrl": image_url })),
            ),
        }
        result
    }

    async fn replace(
        &self,
        host: &dyn HostSession,
        log: &OperationLog,
        config: &InsertionConfig,
        slide_index: usize,
        image_url: &str,
    ) -> Result<ImageUpdateReport, ImageUpdateError> {
        if host.identity().is_none() {
            return Err(HostError::IntegrationMissing.into());
        }
        if !host.supports_automation() {
            return Err(HostError::AutomationUnavailable.into());
        }
        let timeout = config.host_batch_timeout();
        let mut batch = within(timeout, host.run()).await?;

        let slide_id = within(timeout, batch.slide_ids())
            .await?
            .into_iter()
            .nth(slide_index)
            .ok_or(ImageUpdateError::SlideNotFound { index: slide_index })?;

        let shapes = select(batch.as_mut(), &slide_id, timeout, log, slide_index).await?;
        let content = content_region(&shapes)
            .cloned()
            .ok_or(ImageUpdateError::NoContentRegion)?;
        let stale: Vec<_> = image_shapes(&shapes).into_iter().cloned().collect();

        if !stale.is_empty() {
            if let Err(e) = delete_images(batch.as_mut(), &slide_id, &stale, timeout).await {
                log.fail(Operation::DeleteExistingImage, Some(slide_index), &e, None);
                return Err(e.into());
            }
            for shape in &stale {
                log.ok(
                    Operation::DeleteExistingImage,
                    Some(slide_index),
                    Some(serde_json::json!({ "shapeName": shape.name })),
                );
            }
        }

        let placed = config.image_layout.place_beside(content.bounds);
        if let Err(e) = resize(batch.as_mut(), &slide_id, &content.id, placed.content, timeout).await {
            log.fail(Operation::ResizeContent, Some(slide_index), &e, None);
            return Err(e.into());
        }
        log.ok(
            Operation::ResizeContent,
            Some(slide_index),
            Some(serde_json::json!({
                "originalWidth": content.bounds.width,
                "newWidth": placed.content.width,
                "newLeft": placed.content.left,
            })),
        );

        let image = match self.fetcher.fetch(image_url).await {
            Ok(image) => image,
            Err(e) => {
                log.fail(
                    Operation::ImageProcessing,
                    Some(slide_index),
                    &e,
                    Some(serde_json::json!({ "imageUrl": image_url })),
                );
                return Err(e.into());
            }
        };
        log.ok(
            Operation::ImageEncoded,
            Some(slide_index),
            Some(serde_json::json!({ "mimeType": image.mime, "encodedLength": image.base64.len() })),
        );

        let payload = SelectionPayload::Image {
            image,
            bounds: placed.image,
        };
        if let Err(e) = within(timeout, host.set_selected_data(payload)).await {
            log.fail(Operation::InsertImage, Some(slide_index), &e, None);
            return Err(e.into());
        }
        log.ok(Operation::InsertImage, Some(slide_index), None);

        Ok(ImageUpdateReport {
            slide_index,
            slide_id,
            removed_images: stale.len(),
            image: placed.image,
            content: placed.content,
        })
    }
}

/// Selects the slide and reads back its shapes.
async fn select(
    batch: &mut dyn AutomationContext,
    slide_id: &str,
    timeout: Duration,
    log: &OperationLog,
    slide_index: usize,
) -> Result<Vec<ShapeInfo>, HostError> {
    let selected = match batch.select_slide(slide_id).await {
        Ok(()) => match sync_within(batch, timeout).await {
            Ok(()) => within(timeout, batch.shapes(slide_id)).await,
            Err(e) => Err(e),
        },
        Err(e) => Err(e),
    };
    match &selected {
        Ok(_) => log.ok(Operation::SelectSlide, Some(slide_index), None),
        Err(e) => log.fail(Operation::SelectSlide, Some(slide_index), e, None),
    }
    selected
}

async fn delete_images(
    batch: &mut dyn AutomationContext,
    slide_id: &str,
    stale: &[ShapeInfo],
    timeout: Duration,
) -> Result<(), HostError> {
    for shape in stale {
        batch.delete_shape(slide_id, &shape.id).await?;
    }
    sync_within(batch, timeout).await
}

async fn resize(
    batch: &mut dyn AutomationContext,
    slide_id: &str,
    shape_id: &str,
    bounds: ShapeBox,
    timeout: Duration,
) -> Result<(), HostError> {
    batch.set_bounds(slide_id, shape_id, bounds).await?;
    sync_within(batch, timeout).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::host::memory::{FailurePlan, MemoryHost};
    use crate::image_fetch::EncodedImage;
    use crate::orchestrator::InsertionOrchestrator;
    use async_trait::async_trait;
    use slide_common::Slide;

    /// Serves a fixed PNG header for any URL.
    struct StaticFetcher;

    #[async_trait]
    impl ImageFetcher for StaticFetcher {
        async fn fetch(&self, _url: &str) -> Result<EncodedImage, FetchError> {
            Ok(EncodedImage::from_bytes(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A], None))
        }
    }

    struct BrokenFetcher;

    #[async_trait]
    impl ImageFetcher for BrokenFetcher {
        async fn fetch(&self, _url: &str) -> Result<EncodedImage, FetchError> {
            Err(FetchError::Status(404))
        }
    }

    async fn seeded(host: &MemoryHost) {
        let deck = vec![
            Slide::new("Intro", "Welcome"),
            Slide::new("Point 1", "Detail A"),
            Slide::new("Point 2", "Detail B"),
        ];
        InsertionOrchestrator::default()
            .insert(host, &OperationLog::new(), &InsertionConfig::default(), &deck)
            .await
            .unwrap();
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[tokio::test]
    async fn test_places_image_beside_content() {
        let host = MemoryHost::new();
        seeded(&host).await;
        let log = OperationLog::new();
        let updater = ImageAttachmentUpdater::new(Arc::new(StaticFetcher));

        let report = updater
            .update(&host, &log, &InsertionConfig::default(), 1, "https://img/a.png")
            .await
            .unwrap();
        assert_eq!(report.removed_images, 0);

        // Content Placeholder 2 is 620 x 343 at (50, 144).
        assert!(close(report.image.width, 248.0));
        assert!(close(report.image.height, 308.7));
        assert!(close(report.image.left, 50.0));
        assert!(close(report.content.left, 308.0));
        assert!(close(report.content.width, 362.0));

        let slide = &host.slides()[1];
        assert_eq!(host.selected_slide(), Some(slide.id.clone()));
        assert_eq!(slide.shape_named("Content").unwrap().bounds, report.content);
        let pictures = slide.pictures();
        assert_eq!(pictures.len(), 1);
        assert_eq!(pictures[0].bounds, report.image);
        assert!(pictures[0]
            .image_source
            .as_deref()
            .unwrap()
            .starts_with("data:image/png;base64,"));

        assert_eq!(
            log.trail(),
            "UpdateSlideImage:OK, InsertImage:OK, ImageEncoded:OK, ResizeContent:OK, SelectSlide:OK"
        );
        let resize = log
            .entries()
            .into_iter()
            .find(|e| e.operation == Operation::ResizeContent)
            .unwrap();
        assert_eq!(resize.details.unwrap()["originalWidth"], 620.0);
    }

    #[tokio::test]
    async fn test_replacing_twice_leaves_one_picture() {
        let host = MemoryHost::new();
        seeded(&host).await;
        let log = OperationLog::new();
        let config = InsertionConfig::default();
        let updater = ImageAttachmentUpdater::new(Arc::new(StaticFetcher));

        updater.update(&host, &log, &config, 2, "https://img/a.png").await.unwrap();
        let second = updater.update(&host, &log, &config, 2, "https://img/b.png").await.unwrap();

        assert_eq!(second.removed_images, 1);
        assert_eq!(host.slides()[2].pictures().len(), 1);
        assert_eq!(log.count(Operation::DeleteExistingImage), 1);
    }

    #[tokio::test]
    async fn test_unknown_slide() {
        let host = MemoryHost::new();
        seeded(&host).await;
        let log = OperationLog::new();
        let updater = ImageAttachmentUpdater::new(Arc::new(StaticFetcher));

        let err = updater
            .update(&host, &log, &InsertionConfig::default(), 7, "https://img/a.png")
            .await
            .unwrap_err();
        assert!(matches!(err, ImageUpdateError::SlideNotFound { index: 7 }));
        assert_eq!(err.to_string(), "Slide 8 does not exist");
        assert_eq!(log.trail(), "UpdateSlideImage:FAIL");
    }

    #[tokio::test]
    async fn test_title_slide_has_no_content_region() {
        let host = MemoryHost::new();
        seeded(&host).await;
        let log = OperationLog::new();
        let updater = ImageAttachmentUpdater::new(Arc::new(StaticFetcher));

        let err = updater
            .update(&host, &log, &InsertionConfig::default(), 0, "https://img/a.png")
            .await
            .unwrap_err();
        assert!(matches!(err, ImageUpdateError::NoContentRegion));
        assert_eq!(log.trail(), "UpdateSlideImage:FAIL, SelectSlide:OK");
    }

    #[tokio::test]
    async fn test_fetch_failure_keeps_resize() {
        let host = MemoryHost::new();
        seeded(&host).await;
        let log = OperationLog::new();
        let updater = ImageAttachmentUpdater::new(Arc::new(BrokenFetcher));

        let err = updater
            .update(&host, &log, &InsertionConfig::default(), 1, "https://img/missing.png")
            .await
            .unwrap_err();
        assert!(matches!(err, ImageUpdateError::Fetch(FetchError::Status(404))));

        let slide = &host.slides()[1];
        assert!(slide.pictures().is_empty());
        assert!(close(slide.shape_named("Content").unwrap().bounds.left, 308.0));
        assert_eq!(
            log.trail(),
            "UpdateSlideImage:FAIL, ImageProcessing:FAIL, ResizeContent:OK, SelectSlide:OK"
        );
    }

    #[tokio::test]
    async fn test_rejected_insert_is_reported() {
        let host = MemoryHost::new().with_failures(FailurePlan {
            reject_image_insert: true,
            ..FailurePlan::default()
        });
        seeded(&host).await;
        let log = OperationLog::new();
        let updater = ImageAttachmentUpdater::new(Arc::new(StaticFetcher));

        let err = updater
            .update(&host, &log, &InsertionConfig::default(), 1, "https://img/a.png")
            .await
            .unwrap_err();
        assert!(matches!(err, ImageUpdateError::Host(HostError::Rejected(_))));
        assert_eq!(log.count(Operation::InsertImage), 1);
        assert_eq!(log.count(Operation::ImageEncoded), 1);
    }

    #[tokio::test]
    async fn test_failed_delete_is_logged_as_its_own_phase() {
        let host = MemoryHost::new();
        seeded(&host).await;
        let config = InsertionConfig::default();
        let updater = ImageAttachmentUpdater::new(Arc::new(StaticFetcher));
        updater
            .update(&host, &OperationLog::new(), &config, 1, "https://img/a.png")
            .await
            .unwrap();

        // Same document, but edits to existing shapes are now refused.
        let stubborn = host.clone().with_failures(FailurePlan {
            reject_shape_edits: true,
            ..FailurePlan::default()
        });
        let log = OperationLog::new();
        let err = updater
            .update(&stubborn, &log, &config, 1, "https://img/b.png")
            .await
            .unwrap_err();
        assert!(matches!(err, ImageUpdateError::Host(HostError::Rejected(_))));
        assert_eq!(
            log.trail(),
            "UpdateSlideImage:FAIL, DeleteExistingImage:FAIL, SelectSlide:OK"
        );
        assert_eq!(host.slides()[1].pictures().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_resize_is_logged_as_its_own_phase() {
        let host = MemoryHost::new().with_failures(FailurePlan {
            reject_shape_edits: true,
            ..FailurePlan::default()
        });
        seeded(&host).await;
        let log = OperationLog::new();
        let updater = ImageAttachmentUpdater::new(Arc::new(StaticFetcher));

        let err = updater
            .update(&host, &log, &InsertionConfig::default(), 2, "https://img/a.png")
            .await
            .unwrap_err();
        assert!(matches!(err, ImageUpdateError::Host(HostError::Rejected(_))));
        assert_eq!(log.trail(), "UpdateSlideImage:FAIL, ResizeContent:FAIL, SelectSlide:OK");
        assert!(close(host.slides()[2].shape_named("Content").unwrap().bounds.left, 50.0));
    }

    #[tokio::test]
    async fn test_requires_automation() {
        let host = MemoryHost::new().without_automation();
        let log = OperationLog::new();
        let updater = ImageAttachmentUpdater::new(Arc::new(StaticFetcher));

        let err = updater
            .update(&host, &log, &InsertionConfig::default(), 0, "https://img/a.png")
            .await
            .unwrap_err();
        assert!(matches!(err, ImageUpdateError::Host(HostError::AutomationUnavailable)));
    }
}
