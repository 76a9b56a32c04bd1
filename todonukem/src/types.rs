//! Record types shared by the aggregator and its consumers.
//!
//! All types serialize to camelCase JSON; vocabulary keys serialize as their
//! bracketed tokens (`"[high]"`).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::grammar::MarkerFields;
use crate::vocabulary::{Context, Priority, TaskType};

/// Sort rank given to markers without a priority.
pub const UNCLASSIFIED_RANK: u32 = 999;

/// One marker occurrence found during a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerRecord {
    /// Free-text message after the leading slots.
    pub raw_text: String,

    /// Full remainder after the marker keyword.
    pub text: String,

    #[serde(rename = "priorityKey")]
    pub priority: Option<Priority>,

    #[serde(rename = "typeKey")]
    pub task_type: Option<TaskType>,

    #[serde(rename = "contextKey")]
    pub context: Option<Context>,

    pub assignee: Option<String>,

    pub author: Option<String>,

    /// File the marker was found in.
    pub source_path: PathBuf,

    /// Zero-based line index within the file.
    pub line_number: usize,
}

impl MarkerRecord {
    /// Creates a record from extracted fields and their location.
    #[must_use]
    pub fn new(fields: MarkerFields, source_path: &Path, line_number: usize) -> Self {
        Self {
            raw_text: fields.raw_text,
            text: fields.text,
            priority: fields.priority,
            task_type: fields.task_type,
            context: fields.context,
            assignee: fields.assignee,
            author: fields.author,
            source_path: source_path.to_path_buf(),
            line_number,
        }
    }

    /// Sort rank: 1 for high, 2 medium, 3 low, [`UNCLASSIFIED_RANK`] otherwise.
    #[must_use]
    pub fn priority_rank(&self) -> u32 {
        self.priority.map_or(UNCLASSIFIED_RANK, Priority::rank)
    }

    /// `file.rs:12` style location with a one-based line number.
    #[must_use]
    pub fn location(&self) -> String {
        let file_name = self
            .source_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.source_path.display().to_string());
        format!("{}:{}", file_name, self.line_number + 1)
    }
}
