use async_trait::async_trait;
use slide_common::Slide;
use std::time::Duration;

use super::{InsertionContext, InsertionStrategy, StrategySuccess};
use crate::config::InsertionConfig;
use crate::error::{HostError, SlideError, StrategyError};
use crate::host::{sync_within, within, AutomationContext, LayoutInfo};
use crate::operation_log::{Operation, OperationLog};
use crate::placeholders::SlotMap;

/// Builds real slides through the host's presentation object model.
pub struct NativeSlideWriter;

/// Layout ids resolved once per run from the configured names.
struct Layouts {
    title: String,
    content: String,
}

impl Layouts {
    fn resolve(available: &[LayoutInfo], config: &InsertionConfig) -> Result<Self, StrategyError> {
        let find = |name: &str| {
            available
                .iter()
                .find(|l| l.name == name)
                .map(|l| l.id.clone())
                .ok_or_else(|| StrategyError::LayoutMissing {
                    name: name.to_string(),
                })
        };
        Ok(Self {
            title: find(&config.title_layout)?,
            content: find(&config.content_layout)?,
        })
    }

    /// The first slide is the title slide; every other slide gets the
    /// content layout.
    fn for_index(&self, index: usize) -> &str {
        if index == 0 {
            &self.title
        } else {
            &self.content
        }
    }
}

fn title_preview(title: &str) -> String {
    let preview: String = title.chars().take(20).collect();
    format!("{preview}...")
}

impl NativeSlideWriter {
    async fn write_slide(
        &self,
        batch: &mut dyn AutomationContext,
        layouts: &Layouts,
        config: &InsertionConfig,
        log: &OperationLog,
        index: usize,
        slide: &Slide,
    ) -> Result<String, SlideError> {
        let timeout = config.host_batch_timeout();

        let slide_id = batch.add_slide(layouts.for_index(index)).await?;
        sync_within(batch, timeout).await?;

        let shapes = within(timeout, batch.shapes(&slide_id)).await?;
        let slots = SlotMap::resolve(&shapes)?;
        for (shape_id, text) in slots.assignments(&slide.title, &slide.content) {
            batch.set_text(&slide_id, shape_id, text).await?;
        }
        sync_within(batch, timeout).await?;

        if let Some(url) = &slide.image_url {
            let details = Some(serde_json::json!({ "imageUrl": url }));
            match attach_image(batch, &slide_id, url, config, timeout).await {
                Ok(()) => log.ok(Operation::AddImage, Some(index), details),
                Err(e) => log.fail(Operation::AddImage, Some(index), e, details),
            }
        }

        Ok(slide_id)
    }
}

async fn attach_image(
    batch: &mut dyn AutomationContext,
    slide_id: &str,
    url: &str,
    config: &InsertionConfig,
    timeout: Duration,
) -> Result<(), HostError> {
    batch.add_image_shape(slide_id, url, config.image_box).await?;
    sync_within(batch, timeout).await
}

#[async_trait]
impl InsertionStrategy for NativeSlideWriter {
    fn name(&self) -> &'static str {
        "PowerPointAPI"
    }

    async fn attempt(
        &self,
        ctx: &InsertionContext<'_>,
        deck: &[Slide],
    ) -> Result<StrategySuccess, StrategyError> {
        if !ctx.capabilities.automation {
            return Err(HostError::AutomationUnavailable.into());
        }

        let timeout = ctx.config.host_batch_timeout();
        let mut batch = within(timeout, ctx.host.run()).await?;
        let layouts = Layouts::resolve(&within(timeout, batch.layouts()).await?, ctx.config)?;

        let mut outcome = StrategySuccess::default();
        for (index, slide) in deck.iter().enumerate() {
            let details = |slide_id: Option<&str>| {
                let mut details = serde_json::json!({ "title": title_preview(&slide.title) });
                if let Some(id) = slide_id {
                    details["slideId"] = serde_json::Value::from(id);
                }
                Some(details)
            };
            match self
                .write_slide(batch.as_mut(), &layouts, ctx.config, ctx.log, index, slide)
                .await
            {
                Ok(slide_id) => {
                    ctx.log.ok(Operation::AddSlide, Some(index), details(Some(&slide_id)));
                    outcome.slides_written += 1;
                }
                Err(e) => {
                    // Whatever this slide left queued must not be committed
                    // by the next slide's sync.
                    batch.discard_pending();
                    ctx.log.fail(Operation::AddSlide, Some(index), e, details(None));
                    outcome.slides_failed += 1;
                }
            }
        }

        if let Err(e) = sync_within(batch.as_mut(), timeout).await {
            ctx.log.fail(Operation::RunSync, None, &e, None);
            return Err(e.into());
        }
        Ok(outcome)
    }
}
