//! TODO NUKEM - structured TODO markers.
//!
//! This crate parses structured `TODO` markers embedded in source text,
//! computes the glyph decorations an editor overlays on them, and aggregates
//! them across a workspace into a filterable, priority-ordered list.
//!
//! # Marker format
//!
//! ```text
//! // TODO: [high] [fix] [sec] Sanitize input [assignee: Alice] [ticket: SEC-12]
//! ```
//!
//! Priority, type and context are optional positional slots; meta blocks may
//! appear anywhere after them.
//!
//! # Modules
//!
//! - [`vocabulary`]: the four key categories, glyphs and display modes
//! - [`grammar`]: marker line recognition and field extraction
//! - [`decorations`]: glyph overlay ranges for a document
//! - [`aggregator`]: workspace scan, filtering, sorting and the shared index
//! - [`links`]: `[ticket: ID]` link detection
//! - [`insertion`]: formatting new marker lines
//! - [`config`]: `todonukem.json` and environment overrides
//! - [`types`]: record types
//! - [`error`]: error types

pub mod aggregator;
pub mod config;
pub mod decorations;
pub mod error;
pub mod grammar;
pub mod insertion;
pub mod links;
pub mod types;
pub mod vocabulary;

pub use aggregator::{filter, list_workspace, scan, sort, MarkerFilter, ScanOptions, TodoIndex};
pub use config::{Config, ConfigError, ConfigStore};
pub use decorations::{compute_instructions, DecorationInstruction, DecorationSet, Decorator};
pub use error::{NukemError, Result};
pub use grammar::{is_marker_line, Grammar, MarkerFields};
pub use insertion::{comment_prefix, MarkerLineBuilder};
pub use links::{ticket_links, TicketLink};
pub use types::MarkerRecord;
pub use vocabulary::{
    Category, Context, DisplayMode, DisplayModeError, Meta, Priority, TaskType, VocabKey,
    Vocabulary,
};
