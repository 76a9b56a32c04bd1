//! Workspace traversal and per-file marker extraction.
//!
//! Traversal is depth-first with an explicit work stack, so deep trees never
//! grow the call stack. Directory entries are visited in name order, which
//! keeps scan order (and therefore tie order after sorting) identical between
//! runs over an unchanged tree.
//!
//! Unreadable directories and files are logged and skipped; a scan never
//! fails as a whole.

use std::collections::HashSet;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::grammar::Grammar;
use crate::types::MarkerRecord;

/// Directories never descended into.
pub const DEFAULT_IGNORED_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    "dist",
    "build",
    "out",
    ".vscode",
    ".history",
    "coverage",
];

/// File name suffixes that are scanned.
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    ".ts", ".tsx", ".js", ".jsx", ".py", ".java", ".cs", ".cpp", ".c", ".h", ".go", ".rs",
    ".swift", ".kt", ".php", ".rb", ".vue", ".svelte", ".html", ".css", ".scss", ".sass",
    ".json", ".md", ".txt",
];

/// Kind of a directory entry, as reported by [`WorkspaceFs::read_dir`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    File,
    /// Symlinks, sockets and anything else; never followed.
    Other,
}

/// One directory entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntryInfo {
    pub name: String,
    pub kind: EntryKind,
}

/// File system operations the scanner needs.
pub trait WorkspaceFs {
    /// Lists the entries of a directory.
    fn read_dir(&self, path: &Path) -> impl Future<Output = io::Result<Vec<DirEntryInfo>>> + Send;

    /// Reads a whole file as text.
    fn read_to_string(&self, path: &Path) -> impl Future<Output = io::Result<String>> + Send;
}

/// [`WorkspaceFs`] backed by the local disk through `tokio::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl WorkspaceFs for LocalFs {
    async fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntryInfo>> {
        let mut reader = tokio::fs::read_dir(path).await?;
        let mut entries = Vec::new();

        while let Some(entry) = reader.next_entry().await? {
            let kind = match entry.file_type().await {
                Ok(file_type) if file_type.is_dir() => EntryKind::Directory,
                Ok(file_type) if file_type.is_file() => EntryKind::File,
                Ok(_) => EntryKind::Other,
                Err(e) => {
                    debug!(path = %entry.path().display(), error = %e, "Failed to stat entry");
                    continue;
                }
            };
            entries.push(DirEntryInfo {
                name: entry.file_name().to_string_lossy().into_owned(),
                kind,
            });
        }

        Ok(entries)
    }

    async fn read_to_string(&self, path: &Path) -> io::Result<String> {
        let bytes = tokio::fs::read(path).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// What to scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    /// Root directories, scanned in order.
    pub roots: Vec<PathBuf>,

    /// Directory names that are skipped wherever they appear.
    pub ignored_dirs: HashSet<String>,

    /// File name suffixes that are scanned.
    pub extensions: Vec<String>,
}

impl ScanOptions {
    /// Options with the default ignore list and extensions.
    #[must_use]
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self {
            roots,
            ignored_dirs: DEFAULT_IGNORED_DIRS.iter().map(|s| s.to_string()).collect(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Adds directory names to skip.
    #[must_use]
    pub fn ignore_dirs<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored_dirs.extend(names.into_iter().map(Into::into));
        self
    }

    /// Replaces the extension allow-list. Entries without a leading dot get
    /// one.
    #[must_use]
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|ext| {
                let trimmed = ext.as_ref().trim();
                if trimmed.starts_with('.') {
                    trimmed.to_string()
                } else {
                    format!(".{trimmed}")
                }
            })
            .filter(|ext| ext.len() > 1)
            .collect();
        self
    }

    #[must_use]
    pub fn is_ignored_dir(&self, name: &str) -> bool {
        self.ignored_dirs.contains(name)
    }

    #[must_use]
    pub fn is_included_file(&self, name: &str) -> bool {
        self.extensions.iter().any(|ext| name.ends_with(ext.as_str()))
    }
}

/// Extracts every marker of one file's text.
#[must_use]
pub fn scan_text(grammar: &Grammar, path: &Path, text: &str) -> Vec<MarkerRecord> {
    text.split('\n')
        .enumerate()
        .filter_map(|(line_number, line)| {
            grammar
                .parse_line(line)
                .map(|fields| MarkerRecord::new(fields, path, line_number))
        })
        .collect()
}

enum Work {
    Dir(PathBuf),
    File(PathBuf),
}

/// Scans every root and returns the markers in traversal order.
pub async fn scan<F: WorkspaceFs>(
    fs: &F,
    grammar: &Grammar,
    options: &ScanOptions,
) -> Vec<MarkerRecord> {
    let mut records = Vec::new();
    let mut files_scanned = 0usize;

    for root in &options.roots {
        let mut stack = vec![Work::Dir(root.clone())];

        while let Some(work) = stack.pop() {
            match work {
                Work::Dir(dir) => {
                    let mut entries = match fs.read_dir(&dir).await {
                        Ok(entries) => entries,
                        Err(e) => {
                            warn!(dir = %dir.display(), error = %e, "Failed to read directory, skipping");
                            continue;
                        }
                    };
                    entries.sort_by(|a, b| a.name.cmp(&b.name));

                    // Reversed so the stack pops entries in name order.
                    for entry in entries.into_iter().rev() {
                        match entry.kind {
                            EntryKind::Directory if options.is_ignored_dir(&entry.name) => {
                                debug!(dir = %dir.join(&entry.name).display(), "Ignoring directory");
                            }
                            EntryKind::Directory => stack.push(Work::Dir(dir.join(&entry.name))),
                            EntryKind::File if options.is_included_file(&entry.name) => {
                                stack.push(Work::File(dir.join(&entry.name)));
                            }
                            EntryKind::File | EntryKind::Other => {}
                        }
                    }
                }
                Work::File(path) => match fs.read_to_string(&path).await {
                    Ok(text) => {
                        files_scanned += 1;
                        records.extend(scan_text(grammar, &path, &text));
                    }
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "Failed to read file, skipping");
                    }
                },
            }
        }
    }

    info!(
        roots = options.roots.len(),
        files = files_scanned,
        markers = records.len(),
        "Workspace scan complete"
    );

    records
}
