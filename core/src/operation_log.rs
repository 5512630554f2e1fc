use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, RwLock};

/// Every operation the insertion pipeline audits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    #[serde(rename = "OfficeAPICheck")]
    HostCheck,
    AttemptMethod,
    MethodSuccess,
    MethodFailed,
    AddSlide,
    AddImage,
    #[serde(rename = "PowerPointRunSync")]
    RunSync,
    CreateSlidesAsText,
    SelectSlide,
    DeleteExistingImage,
    ResizeContent,
    ImageEncoded,
    InsertImage,
    ImageProcessing,
    UpdateSlideImage,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::HostCheck => "OfficeAPICheck",
            Operation::AttemptMethod => "AttemptMethod",
            Operation::MethodSuccess => "MethodSuccess",
            Operation::MethodFailed => "MethodFailed",
            Operation::AddSlide => "AddSlide",
            Operation::AddImage => "AddImage",
            Operation::RunSync => "PowerPointRunSync",
            Operation::CreateSlidesAsText => "CreateSlidesAsText",
            Operation::SelectSlide => "SelectSlide",
            Operation::DeleteExistingImage => "DeleteExistingImage",
            Operation::ResizeContent => "ResizeContent",
            Operation::ImageEncoded => "ImageEncoded",
            Operation::InsertImage => "InsertImage",
            Operation::ImageProcessing => "ImageProcessing",
            Operation::UpdateSlideImage => "UpdateSlideImage",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationLogEntry {
    pub operation: Operation,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slide_index: Option<usize>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl OperationLogEntry {
    pub fn status(&self) -> &'static str {
        if self.success {
            "OK"
        } else {
            "FAIL"
        }
    }
}

/// Append-only audit log shared by every component touching one document.
///
/// Entries are exposed newest first. The log is unbounded and lives as long
/// as its last handle; `clear` is the only way to drop entries.
#[derive(Debug, Clone, Default)]
pub struct OperationLog {
    entries: Arc<RwLock<VecDeque<OperationLogEntry>>>,
}

impl OperationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        &self,
        operation: Operation,
        success: bool,
        slide_index: Option<usize>,
        error: Option<String>,
        details: Option<serde_json::Value>,
    ) {
        match (&error, slide_index) {
            (Some(e), Some(i)) => tracing::warn!("{operation} failed on slide {i}: {e}"),
            (Some(e), None) => tracing::warn!("{operation} failed: {e}"),
            (None, Some(i)) => tracing::info!("{operation} {} on slide {i}", status(success)),
            (None, None) => tracing::info!("{operation} {}", status(success)),
        }

        let entry = OperationLogEntry {
            operation,
            timestamp: Utc::now(),
            slide_index,
            success,
            error,
            details,
        };
        let mut guard = self.entries.write().unwrap_or_else(|e| e.into_inner());
        guard.push_front(entry);
    }

    pub fn ok(&self, operation: Operation, slide_index: Option<usize>, details: Option<serde_json::Value>) {
        self.record(operation, true, slide_index, None, details);
    }

    pub fn fail(
        &self,
        operation: Operation,
        slide_index: Option<usize>,
        error: impl ToString,
        details: Option<serde_json::Value>,
    ) {
        self.record(operation, false, slide_index, Some(error.to_string()), details);
    }

    /// Snapshot of all entries, newest first.
    pub fn entries(&self) -> Vec<OperationLogEntry> {
        let guard = self.entries.read().unwrap_or_else(|e| e.into_inner());
        guard.iter().cloned().collect()
    }

    pub fn clear(&self) {
        let mut guard = self.entries.write().unwrap_or_else(|e| e.into_inner());
        guard.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Compact `Name:OK, Name:FAIL` rendering, newest first.
    pub fn trail(&self) -> String {
        let guard = self.entries.read().unwrap_or_else(|e| e.into_inner());
        guard
            .iter()
            .map(|e| format!("{}:{}", e.operation, e.status()))
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn count(&self, operation: Operation) -> usize {
        let guard = self.entries.read().unwrap_or_else(|e| e.into_inner());
        guard.iter().filter(|e| e.operation == operation).count()
    }
}

fn status(success: bool) -> &'static str {
    if success {
        "succeeded"
    } else {
        "failed"
    }
}
