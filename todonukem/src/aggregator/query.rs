//! Filtering and ordering of aggregated markers.

use crate::types::MarkerRecord;
use crate::vocabulary::{Context, Priority, TaskType};

/// Criteria a marker must satisfy to be listed.
///
/// Every criterion is optional; `None` matches everything. Keys match
/// exactly; assignee and author match as case-insensitive substrings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkerFilter {
    pub priority: Option<Priority>,
    pub task_type: Option<TaskType>,
    pub context: Option<Context>,
    pub assignee: Option<String>,
    pub author: Option<String>,
}

impl MarkerFilter {
    /// A filter that matches every marker.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn priority(mut self, priority: Option<Priority>) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub fn task_type(mut self, task_type: Option<TaskType>) -> Self {
        self.task_type = task_type;
        self
    }

    #[must_use]
    pub fn context(mut self, context: Option<Context>) -> Self {
        self.context = context;
        self
    }

    /// Sets the assignee criterion; an empty name matches everything.
    #[must_use]
    pub fn assignee(mut self, assignee: Option<&str>) -> Self {
        self.assignee = non_empty(assignee);
        self
    }

    /// Sets the author criterion; an empty name matches everything.
    #[must_use]
    pub fn author(mut self, author: Option<&str>) -> Self {
        self.author = non_empty(author);
        self
    }

    #[must_use]
    pub fn is_match_all(&self) -> bool {
        *self == Self::default()
    }

    /// Whether `record` satisfies every set criterion.
    #[must_use]
    pub fn matches(&self, record: &MarkerRecord) -> bool {
        criterion(self.priority, record.priority)
            && criterion(self.task_type, record.task_type)
            && criterion(self.context, record.context)
            && contains(self.assignee.as_deref(), record.assignee.as_deref())
            && contains(self.author.as_deref(), record.author.as_deref())
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn criterion<T: PartialEq>(wanted: Option<T>, actual: Option<T>) -> bool {
    match wanted {
        None => true,
        Some(wanted) => actual == Some(wanted),
    }
}

fn contains(wanted: Option<&str>, actual: Option<&str>) -> bool {
    match (wanted, actual) {
        (None, _) => true,
        (Some(_), None) => false,
        (Some(wanted), Some(actual)) => actual.to_lowercase().contains(&wanted.to_lowercase()),
    }
}

/// Markers matching `filter`, in their original order.
#[must_use]
pub fn filter(records: &[MarkerRecord], filter: &MarkerFilter) -> Vec<MarkerRecord> {
    records
        .iter()
        .filter(|record| filter.matches(record))
        .cloned()
        .collect()
}

/// Orders markers high, medium, low, then unclassified. Ties keep their
/// relative order.
#[must_use]
pub fn sort(mut records: Vec<MarkerRecord>) -> Vec<MarkerRecord> {
    records.sort_by_key(MarkerRecord::priority_rank);
    records
}
