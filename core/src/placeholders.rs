//! Placeholder identification.
//!
//! The host template names its placeholders ("Title 1", "Subtitle 2",
//! "Content Placeholder 2", "Picture 5"). Those names are the only contract
//! available, so they are resolved into explicit slots once per slide and
//! validated before anything is written.

use serde::{Deserialize, Serialize};

use crate::error::SlideError;
use crate::host::ShapeInfo;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlaceholderSlot {
    Title,
    Body,
    Subtitle,
}

impl PlaceholderSlot {
    /// Case-sensitive substring match on the shape name.
    pub fn classify(name: &str) -> Option<Self> {
        if name.contains("Subtitle") {
            Some(PlaceholderSlot::Subtitle)
        } else if name.contains("Title") {
            Some(PlaceholderSlot::Title)
        } else if name.contains("Content") {
            Some(PlaceholderSlot::Body)
        } else {
            None
        }
    }
}

pub fn is_image_shape(name: &str) -> bool {
    name.contains("Picture") || name.contains("Image") || name.contains("img")
}

/// Shape ids per slot for one slide.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlotMap {
    pub title: Vec<String>,
    pub body: Vec<String>,
    pub subtitle: Vec<String>,
}

impl SlotMap {
    /// Fails when the slide has no title slot or no slot for the content.
    pub fn resolve(shapes: &[ShapeInfo]) -> Result<Self, SlideError> {
        let mut map = SlotMap::default();
        for shape in shapes {
            match PlaceholderSlot::classify(&shape.name) {
                Some(PlaceholderSlot::Title) => map.title.push(shape.id.clone()),
                Some(PlaceholderSlot::Body) => map.body.push(shape.id.clone()),
                Some(PlaceholderSlot::Subtitle) => map.subtitle.push(shape.id.clone()),
                None => {}
            }
        }

        let mut missing = Vec::new();
        if map.title.is_empty() {
            missing.push(PlaceholderSlot::Title);
        }
        if map.body.is_empty() && map.subtitle.is_empty() {
            missing.push(PlaceholderSlot::Body);
        }
        if !missing.is_empty() {
            return Err(SlideError::MissingPlaceholders {
                missing,
                found: shapes.iter().map(|s| s.name.clone()).collect(),
            });
        }
        Ok(map)
    }

    /// `(shape id, text)` writes in slot order: title first, then body and
    /// subtitle, which both receive the slide content.
    pub fn assignments<'a>(&'a self, title: &'a str, content: &'a str) -> Vec<(&'a str, &'a str)> {
        let titles = self.title.iter().map(|id| (id.as_str(), title));
        let bodies = self
            .body
            .iter()
            .chain(self.subtitle.iter())
            .map(|id| (id.as_str(), content));
        titles.chain(bodies).collect()
    }
}

/// The content placeholder an image is placed beside, if any.
pub fn content_region(shapes: &[ShapeInfo]) -> Option<&ShapeInfo> {
    shapes.iter().find(|s| s.name.contains("Content"))
}

/// Existing pictures on the slide, excluding the content placeholder.
pub fn image_shapes(shapes: &[ShapeInfo]) -> Vec<&ShapeInfo> {
    shapes
        .iter()
        .filter(|s| !s.name.contains("Content") && is_image_shape(&s.name))
        .collect()
}
