//! In-process presentation host.
//!
//! Mirrors the observable behaviour of a real editor closely enough to drive
//! the insertion pipeline end to end: layouts stamp named placeholders onto
//! new slides, mutations only land on `sync`, the selection primitive targets
//! the selected slide. Failures can be injected per call site.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use super::{AutomationContext, HostIdentity, HostSession, LayoutInfo, SelectionPayload, ShapeInfo};
use crate::error::HostError;
use crate::geometry::ShapeBox;

#[derive(Debug, Clone, PartialEq)]
pub struct MemShape {
    pub id: String,
    pub name: String,
    pub bounds: ShapeBox,
    pub text: Option<String>,
    pub image_source: Option<String>,
}

impl MemShape {
    fn info(&self) -> ShapeInfo {
        ShapeInfo {
            id: self.id.clone(),
            name: self.name.clone(),
            bounds: self.bounds,
            text: self.text.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemSlide {
    pub id: String,
    pub layout: String,
    pub shapes: Vec<MemShape>,
}

impl MemSlide {
    pub fn shape_named(&self, fragment: &str) -> Option<&MemShape> {
        self.shapes.iter().find(|s| s.name.contains(fragment))
    }

    pub fn pictures(&self) -> Vec<&MemShape> {
        self.shapes.iter().filter(|s| s.image_source.is_some()).collect()
    }
}

/// A slide layout and the placeholders it stamps onto new slides.
#[derive(Debug, Clone)]
pub struct MemLayout {
    pub id: String,
    pub name: String,
    pub placeholders: Vec<(String, ShapeBox)>,
}

impl MemLayout {
    pub fn new(id: &str, name: &str, placeholders: &[(&str, ShapeBox)]) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            placeholders: placeholders
                .iter()
                .map(|(n, b)| (n.to_string(), *b))
                .collect(),
        }
    }

    /// The stock "Office Theme" layouts used by a blank presentation.
    pub fn office_theme() -> Vec<Self> {
        vec![
            Self::new(
                "2147483649#1",
                "Title Slide",
                &[
                    ("Title 1", ShapeBox::new(90.0, 88.0, 540.0, 188.0)),
                    ("Subtitle 2", ShapeBox::new(90.0, 284.0, 540.0, 130.0)),
                ],
            ),
            Self::new(
                "2147483650#2",
                "Title and Content",
                &[
                    ("Title 1", ShapeBox::new(50.0, 29.0, 620.0, 104.0)),
                    ("Content Placeholder 2", ShapeBox::new(50.0, 144.0, 620.0, 343.0)),
                ],
            ),
            Self::new("2147483655#7", "Blank", &[]),
        ]
    }
}

/// Where injected failures strike.
#[derive(Debug, Clone, Default)]
pub struct FailurePlan {
    /// Opening a run fails outright.
    pub reject_run: bool,
    /// Zero-based positions of slide creations (counted across the host's
    /// lifetime) that fail when synced.
    pub fail_slide_creations: HashSet<usize>,
    pub fail_image_shapes: bool,
    pub reject_text_insert: bool,
    pub reject_image_insert: bool,
    /// Every `sync` sleeps this long before committing.
    pub sync_delay: Option<Duration>,
    /// Zero-based positions of `sync` calls (counted across the host's
    /// lifetime) that sleep for the given duration before committing.
    pub stalled_syncs: HashMap<usize, Duration>,
    /// Opening a run takes this long.
    pub run_delay: Option<Duration>,
    /// Resizes and deletions of existing shapes fail when synced.
    pub reject_shape_edits: bool,
}

#[derive(Debug, Default)]
struct Document {
    slides: Vec<MemSlide>,
    selected: Option<String>,
    inserted_text: Vec<String>,
    next_id: u64,
    slide_creations: usize,
    syncs: usize,
}

impl Document {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn slide_mut(&mut self, slide_id: &str) -> Result<&mut MemSlide, HostError> {
        self.slides
            .iter_mut()
            .find(|s| s.id == slide_id)
            .ok_or_else(|| HostError::NotFound(format!("slide {slide_id}")))
    }

    fn shape_mut(&mut self, slide_id: &str, shape_id: &str) -> Result<&mut MemShape, HostError> {
        self.slide_mut(slide_id)?
            .shapes
            .iter_mut()
            .find(|s| s.id == shape_id)
            .ok_or_else(|| HostError::NotFound(format!("shape {shape_id}")))
    }
}

#[derive(Debug, Clone)]
pub struct MemoryHost {
    identity: Option<HostIdentity>,
    automation: bool,
    layouts: Vec<MemLayout>,
    failures: FailurePlan,
    doc: Arc<Mutex<Document>>,
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHost {
    pub fn new() -> Self {
        Self {
            identity: Some(HostIdentity {
                name: "PowerPoint".to_string(),
                version: None,
            }),
            automation: true,
            layouts: MemLayout::office_theme(),
            failures: FailurePlan::default(),
            doc: Arc::new(Mutex::new(Document::default())),
        }
    }

    /// No integration layer at all.
    pub fn detached() -> Self {
        Self {
            identity: None,
            automation: false,
            ..Self::new()
        }
    }

    /// Integration layer present but no presentation automation API, as in
    /// hosts that only offer the generic document primitives.
    pub fn without_automation(mut self) -> Self {
        self.automation = false;
        self
    }

    pub fn with_layouts(mut self, layouts: Vec<MemLayout>) -> Self {
        self.layouts = layouts;
        self
    }

    pub fn with_failures(mut self, failures: FailurePlan) -> Self {
        self.failures = failures;
        self
    }

    fn lock(&self) -> MutexGuard<'_, Document> {
        self.doc.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn slides(&self) -> Vec<MemSlide> {
        self.lock().slides.clone()
    }

    pub fn slide_count(&self) -> usize {
        self.lock().slides.len()
    }

    pub fn inserted_text(&self) -> Vec<String> {
        self.lock().inserted_text.clone()
    }

    pub fn selected_slide(&self) -> Option<String> {
        self.lock().selected.clone()
    }
}

#[async_trait]
impl HostSession for MemoryHost {
    fn identity(&self) -> Option<HostIdentity> {
        self.identity.clone()
    }

    fn supports_automation(&self) -> bool {
        self.identity.is_some() && self.automation
    }

    async fn run(&self) -> Result<Box<dyn AutomationContext>, HostError> {
        if self.identity.is_none() {
            return Err(HostError::IntegrationMissing);
        }
        if !self.automation {
            return Err(HostError::AutomationUnavailable);
        }
        if let Some(delay) = self.failures.run_delay {
            tokio::time::sleep(delay).await;
        }
        if self.failures.reject_run {
            return Err(HostError::Rejected("run entry point refused the batch".to_string()));
        }
        Ok(Box::new(MemoryContext {
            doc: Arc::clone(&self.doc),
            layouts: self.layouts.clone(),
            failures: self.failures.clone(),
            pending: Vec::new(),
        }))
    }

    async fn set_selected_data(&self, payload: SelectionPayload) -> Result<(), HostError> {
        if self.identity.is_none() {
            return Err(HostError::IntegrationMissing);
        }
        let mut doc = self.lock();
        match payload {
            SelectionPayload::Text(text) => {
                if self.failures.reject_text_insert {
                    return Err(HostError::Rejected("text coercion not supported here".to_string()));
                }
                doc.inserted_text.push(text);
                Ok(())
            }
            SelectionPayload::Image { image, bounds } => {
                if self.failures.reject_image_insert {
                    return Err(HostError::Rejected("image coercion not supported here".to_string()));
                }
                let selected = doc
                    .selected
                    .clone()
                    .ok_or_else(|| HostError::Rejected("no slide selected".to_string()))?;
                let id = doc.next_id();
                let slide = doc.slide_mut(&selected)?;
                slide.shapes.push(MemShape {
                    id: id.to_string(),
                    name: format!("Picture {id}"),
                    bounds,
                    text: None,
                    image_source: Some(image.data_url()),
                });
                Ok(())
            }
        }
    }
}

#[derive(Debug)]
enum Pending {
    AddSlide { id: String, layout_id: String },
    SetText { slide: String, shape: String, text: String },
    SetBounds { slide: String, shape: String, bounds: ShapeBox },
    Delete { slide: String, shape: String },
    AddImage { slide: String, url: String, bounds: ShapeBox },
    Select { slide: String },
}

struct MemoryContext {
    doc: Arc<Mutex<Document>>,
    layouts: Vec<MemLayout>,
    failures: FailurePlan,
    pending: Vec<Pending>,
}

impl MemoryContext {
    fn lock(&self) -> MutexGuard<'_, Document> {
        self.doc.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn apply(&self, doc: &mut Document, op: Pending) -> Result<(), HostError> {
        match op {
            Pending::AddSlide { id, layout_id } => {
                let position = doc.slide_creations;
                doc.slide_creations += 1;
                if self.failures.fail_slide_creations.contains(&position) {
                    return Err(HostError::Rejected(format!("could not create slide {id}")));
                }
                let layout = self
                    .layouts
                    .iter()
                    .find(|l| l.id == layout_id)
                    .ok_or_else(|| HostError::NotFound(format!("layout {layout_id}")))?;
                let mut shapes = Vec::with_capacity(layout.placeholders.len());
                for (name, bounds) in &layout.placeholders {
                    let shape_id = doc.next_id();
                    shapes.push(MemShape {
                        id: shape_id.to_string(),
                        name: name.clone(),
                        bounds: *bounds,
                        text: None,
                        image_source: None,
                    });
                }
                doc.slides.push(MemSlide {
                    id,
                    layout: layout.name.clone(),
                    shapes,
                });
            }
            Pending::SetText { slide, shape, text } => {
                doc.shape_mut(&slide, &shape)?.text = Some(text);
            }
            Pending::SetBounds { slide, shape, .. } if self.failures.reject_shape_edits => {
                return Err(HostError::Rejected(format!("could not resize shape {shape} on {slide}")));
            }
            Pending::Delete { slide, shape } if self.failures.reject_shape_edits => {
                return Err(HostError::Rejected(format!("could not delete shape {shape} on {slide}")));
            }
            Pending::SetBounds { slide, shape, bounds } => {
                doc.shape_mut(&slide, &shape)?.bounds = bounds;
            }
            Pending::Delete { slide, shape } => {
                let slide = doc.slide_mut(&slide)?;
                let before = slide.shapes.len();
                slide.shapes.retain(|s| s.id != shape);
                if slide.shapes.len() == before {
                    return Err(HostError::NotFound(format!("shape {shape}")));
                }
            }
            Pending::AddImage { slide, url, bounds } => {
                if self.failures.fail_image_shapes {
                    return Err(HostError::Rejected(format!("could not load image {url}")));
                }
                let id = doc.next_id();
                doc.slide_mut(&slide)?.shapes.push(MemShape {
                    id: id.to_string(),
                    name: format!("Picture {id}"),
                    bounds,
                    text: None,
                    image_source: Some(url),
                });
            }
            Pending::Select { slide } => {
                doc.slide_mut(&slide)?;
                doc.selected = Some(slide);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl AutomationContext for MemoryContext {
    async fn layouts(&mut self) -> Result<Vec<LayoutInfo>, HostError> {
        Ok(self
            .layouts
            .iter()
            .map(|l| LayoutInfo {
                id: l.id.clone(),
                name: l.name.clone(),
            })
            .collect())
    }

    async fn slide_ids(&mut self) -> Result<Vec<String>, HostError> {
        Ok(self.lock().slides.iter().map(|s| s.id.clone()).collect())
    }

    async fn add_slide(&mut self, layout_id: &str) -> Result<String, HostError> {
        let id = format!("{}#", self.lock().next_id());
        self.pending.push(Pending::AddSlide {
            id: id.clone(),
            layout_id: layout_id.to_string(),
        });
        Ok(id)
    }

    async fn shapes(&mut self, slide_id: &str) -> Result<Vec<ShapeInfo>, HostError> {
        let doc = self.lock();
        let slide = doc
            .slides
            .iter()
            .find(|s| s.id == slide_id)
            .ok_or_else(|| HostError::NotFound(format!("slide {slide_id}")))?;
        Ok(slide.shapes.iter().map(MemShape::info).collect())
    }

    async fn set_text(&mut self, slide_id: &str, shape_id: &str, text: &str) -> Result<(), HostError> {
        self.pending.push(Pending::SetText {
            slide: slide_id.to_string(),
            shape: shape_id.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn set_bounds(&mut self, slide_id: &str, shape_id: &str, bounds: ShapeBox) -> Result<(), HostError> {
        self.pending.push(Pending::SetBounds {
            slide: slide_id.to_string(),
            shape: shape_id.to_string(),
            bounds,
        });
        Ok(())
    }

    async fn delete_shape(&mut self, slide_id: &str, shape_id: &str) -> Result<(), HostError> {
        self.pending.push(Pending::Delete {
            slide: slide_id.to_string(),
            shape: shape_id.to_string(),
        });
        Ok(())
    }

    async fn add_image_shape(&mut self, slide_id: &str, url: &str, bounds: ShapeBox) -> Result<(), HostError> {
        self.pending.push(Pending::AddImage {
            slide: slide_id.to_string(),
            url: url.to_string(),
            bounds,
        });
        Ok(())
    }

    async fn select_slide(&mut self, slide_id: &str) -> Result<(), HostError> {
        self.pending.push(Pending::Select {
            slide: slide_id.to_string(),
        });
        Ok(())
    }

    async fn sync(&mut self) -> Result<(), HostError> {
        let position = {
            let mut doc = self.lock();
            doc.syncs += 1;
            doc.syncs - 1
        };
        if let Some(delay) = self.failures.sync_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(stall) = self.failures.stalled_syncs.get(&position) {
            tokio::time::sleep(*stall).await;
        }
        let pending = std::mem::take(&mut self.pending);
        let mut doc = self.lock();
        for op in pending {
            // The rest of the batch is discarded once one mutation fails.
            self.apply(&mut doc, op)?;
        }
        Ok(())
    }

    fn discard_pending(&mut self) {
        self.pending.clear();
    }
}
