//! Workspace-wide marker aggregation.
//!
//! - [`scan`]: traverses roots and extracts [`MarkerRecord`]s
//! - [`query`]: filters and priority ordering
//! - [`index`]: the refreshable [`TodoIndex`] holding the current snapshot
//!
//! [`MarkerRecord`]: crate::types::MarkerRecord

pub mod index;
pub mod query;
pub mod scan;

pub use index::{list_workspace, IndexError, IndexPhase, TodoIndex};
pub use query::{filter, sort, MarkerFilter};
pub use scan::{
    scan, scan_text, DirEntryInfo, EntryKind, LocalFs, ScanOptions, WorkspaceFs,
    DEFAULT_EXTENSIONS, DEFAULT_IGNORED_DIRS,
};
