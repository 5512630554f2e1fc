use std::sync::Arc;
use tokio::sync::Mutex;

use slide_common::Slide;

use crate::config::InsertionConfig;
use crate::error::{ImageUpdateError, InsertError};
use crate::host::HostSession;
use crate::image_fetch::ImageFetcher;
use crate::image_updater::{ImageAttachmentUpdater, ImageUpdateReport};
use crate::operation_log::OperationLog;
use crate::orchestrator::{InsertionOrchestrator, InsertionReport};

/// One open document: its host, its audit log, and a writer lock so two
/// user-triggered operations never interleave their batches.
pub struct DocumentSession {
    host: Arc<dyn HostSession>,
    log: OperationLog,
    config: InsertionConfig,
    orchestrator: InsertionOrchestrator,
    updater: ImageAttachmentUpdater,
    writer: Mutex<()>,
}

impl DocumentSession {
    pub fn new(host: Arc<dyn HostSession>, config: InsertionConfig, fetcher: Arc<dyn ImageFetcher>) -> Self {
        Self {
            host,
            log: OperationLog::new(),
            config,
            orchestrator: InsertionOrchestrator::default(),
            updater: ImageAttachmentUpdater::new(fetcher),
            writer: Mutex::new(()),
        }
    }

    pub fn with_orchestrator(mut self, orchestrator: InsertionOrchestrator) -> Self {
        self.orchestrator = orchestrator;
        self
    }

    pub fn log(&self) -> &OperationLog {
        &self.log
    }

    pub fn config(&self) -> &InsertionConfig {
        &self.config
    }

    pub async fn insert_deck(&self, deck: &[Slide]) -> Result<InsertionReport, InsertError> {
        let _guard = self.writer.lock().await;
        tracing::info!("Inserting {} slides", deck.len());
        self.orchestrator
            .insert(self.host.as_ref(), &self.log, &self.config, deck)
            .await
    }

    pub async fn update_slide_image(
        &self,
        slide_index: usize,
        image_url: &str,
    ) -> Result<ImageUpdateReport, ImageUpdateError> {
        let _guard = self.writer.lock().await;
        tracing::info!("Replacing image on slide {}", slide_index + 1);
        self.updater
            .update(self.host.as_ref(), &self.log, &self.config, slide_index, image_url)
            .await
    }
}
