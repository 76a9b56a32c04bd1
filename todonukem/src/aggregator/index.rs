//! Shared marker index with atomic snapshot replacement.
//!
//! The index moves through three phases:
//!
//! ```text
//! Empty --refresh()--> Scanning --scan done--> Ready
//!                          ^                     |
//!                          +-----refresh()-------+
//! ```
//!
//! A scan builds its record list privately and swaps it in as a new
//! [`Arc`] once complete, so readers always see either the previous
//! snapshot or the new one, never a partial list.
//!
//! A refresh that is dropped before it finishes (a timeout, an aborted task)
//! leaves the snapshot untouched and returns the index to the phase it was
//! in before the scan started.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::query::{self, MarkerFilter};
use super::scan::{self, LocalFs, ScanOptions, WorkspaceFs};
use crate::config::Config;
use crate::error::NukemError;
use crate::grammar::Grammar;
use crate::types::MarkerRecord;

/// Errors that can occur while refreshing the index.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    /// `refresh()` was called while another scan was running.
    #[error("a workspace scan is already in progress")]
    ScanInProgress,
}

/// Lifecycle phase of a [`TodoIndex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexPhase {
    /// No scan has completed yet.
    Empty,
    /// A scan is running; queries see the previous snapshot.
    Scanning,
    /// The snapshot reflects the last completed scan.
    Ready,
}

#[derive(Debug)]
struct IndexState {
    /// Whether any scan has completed.
    ready: bool,
    snapshot: Arc<Vec<MarkerRecord>>,
    grammar: Arc<Grammar>,
}

/// Clears the scanning flag when a refresh ends, finished or dropped.
struct ScanGuard<'a> {
    scanning: &'a AtomicBool,
}

impl<'a> ScanGuard<'a> {
    /// Claims the flag; `None` if another scan holds it.
    fn acquire(scanning: &'a AtomicBool) -> Option<Self> {
        scanning
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { scanning })
    }
}

impl Drop for ScanGuard<'_> {
    fn drop(&mut self) {
        self.scanning.store(false, Ordering::Release);
    }
}

/// Workspace-wide marker index.
#[derive(Debug)]
pub struct TodoIndex<F: WorkspaceFs = LocalFs> {
    fs: F,
    options: ScanOptions,
    scanning: AtomicBool,
    state: RwLock<IndexState>,
}

impl TodoIndex<LocalFs> {
    /// Index over the local disk.
    #[must_use]
    pub fn local(grammar: Grammar, options: ScanOptions) -> Self {
        Self::new(LocalFs, grammar, options)
    }

    /// Index over the local disk with the grammar of `config`.
    ///
    /// # Errors
    ///
    /// Returns `NukemError::Grammar` if the configured glyphs do not compile.
    pub fn from_config(config: &Config, options: ScanOptions) -> Result<Self, NukemError> {
        Self::with_config(LocalFs, config, options)
    }
}

impl<F: WorkspaceFs> TodoIndex<F> {
    #[must_use]
    pub fn new(fs: F, grammar: Grammar, options: ScanOptions) -> Self {
        Self {
            fs,
            options,
            scanning: AtomicBool::new(false),
            state: RwLock::new(IndexState {
                ready: false,
                snapshot: Arc::new(Vec::new()),
                grammar: Arc::new(grammar),
            }),
        }
    }

    /// # Errors
    ///
    /// Returns `NukemError::Grammar` if the configured glyphs do not compile.
    pub fn with_config(
        fs: F,
        config: &Config,
        options: ScanOptions,
    ) -> Result<Self, NukemError> {
        let grammar = Grammar::new(&config.vocabulary())?;
        Ok(Self::new(fs, grammar, options))
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    pub async fn phase(&self) -> IndexPhase {
        if self.scanning.load(Ordering::Acquire) {
            return IndexPhase::Scanning;
        }
        if self.state.read().await.ready {
            IndexPhase::Ready
        } else {
            IndexPhase::Empty
        }
    }

    /// Records of the last completed scan, in scan order.
    pub async fn snapshot(&self) -> Arc<Vec<MarkerRecord>> {
        Arc::clone(&self.state.read().await.snapshot)
    }

    /// Replaces the grammar used by subsequent scans, e.g. after glyph
    /// overrides change. The current snapshot is kept until the next refresh.
    pub async fn set_grammar(&self, grammar: Grammar) {
        self.state.write().await.grammar = Arc::new(grammar);
    }

    /// Rescans the workspace and swaps in the new snapshot.
    ///
    /// Returns the number of records found.
    ///
    /// # Errors
    ///
    /// Returns `IndexError::ScanInProgress` if another refresh has not
    /// finished yet.
    pub async fn refresh(&self) -> Result<usize, IndexError> {
        let Some(guard) = ScanGuard::acquire(&self.scanning) else {
            debug!("Refresh rejected, scan already running");
            return Err(IndexError::ScanInProgress);
        };

        let grammar = Arc::clone(&self.state.read().await.grammar);
        let records = scan::scan(&self.fs, &grammar, &self.options).await;
        let count = records.len();

        {
            let mut state = self.state.write().await;
            state.snapshot = Arc::new(records);
            state.ready = true;
        }
        drop(guard);

        info!(records = count, "Marker index refreshed");
        Ok(count)
    }

    /// Filters then sorts the current snapshot.
    pub async fn query(&self, filter: &MarkerFilter) -> Vec<MarkerRecord> {
        let snapshot = self.snapshot().await;
        query::sort(query::filter(&snapshot, filter))
    }
}

/// Scans the local workspace once under `config` and returns the matching
/// records in priority order.
///
/// # Errors
///
/// Returns `NukemError::Grammar` if the configured glyphs do not compile.
pub async fn list_workspace(
    config: &Config,
    options: ScanOptions,
    filter: &MarkerFilter,
) -> Result<Vec<MarkerRecord>, NukemError> {
    let index = TodoIndex::from_config(config, options)?;
    index.refresh().await?;
    Ok(index.query(filter).await)
}
