use async_trait::async_trait;
use slide_common::Slide;

use super::{InsertionContext, InsertionStrategy, StrategySuccess};
use crate::error::StrategyError;
use crate::host::{within, SelectionPayload};
use crate::operation_log::Operation;

const HEADER: &str = "\u{26a0}\u{fe0f} INSTRUCTIONS TO CREATE THE PRESENTATION MANUALLY \u{26a0}\u{fe0f}\n\n\
This presentation could not be created automatically.\n\
Please follow these manual steps:\n\
1. For each 'SLIDE X' section below, create a new slide\n\
2. Copy the title and the content into the matching slide\n\n";

pub const SLIDE_SEPARATOR: &str = "-----------------";

/// Plain-text rendition of a deck with manual reproduction instructions.
pub fn render_instructions(deck: &[Slide]) -> String {
    let mut text = String::from(HEADER);
    for (index, slide) in deck.iter().enumerate() {
        text.push_str(&format!("==== SLIDE {} ====\n\n", index + 1));
        text.push_str(&format!("TITLE: {}\n\n", slide.title));
        text.push_str(&format!("CONTENT:\n{}\n\n", slide.content));
        if let Some(url) = &slide.image_url {
            text.push_str(&format!("IMAGE: {url}\n\n"));
        }
        text.push_str(SLIDE_SEPARATOR);
        text.push_str("\n\n");
    }
    text
}

/// Last resort: one text block at the current selection.
pub struct TextFallbackWriter;

#[async_trait]
impl InsertionStrategy for TextFallbackWriter {
    fn name(&self) -> &'static str {
        "TextFormat"
    }

    async fn attempt(
        &self,
        ctx: &InsertionContext<'_>,
        deck: &[Slide],
    ) -> Result<StrategySuccess, StrategyError> {
        let text = render_instructions(deck);
        let insert = ctx.host.set_selected_data(SelectionPayload::Text(text));
        match within(ctx.config.host_batch_timeout(), insert).await {
            Ok(()) => {
                ctx.log.ok(Operation::CreateSlidesAsText, None, None);
                Ok(StrategySuccess {
                    slides_written: deck.len(),
                    slides_failed: 0,
                })
            }
            Err(e) => {
                ctx.log.fail(Operation::CreateSlidesAsText, None, &e, None);
                Err(e.into())
            }
        }
    }
}
