//! Marker line formatting for the insertion flow.
//!
//! The interactive flow (priority, type, context, message, then optional meta
//! blocks) lives in the host. This module turns the collected answers into
//! the line that gets inserted:
//!
//! ```text
//! <comment prefix> TODO: <priority> <type> <context> <message> [<meta>: <value>] ...
//! ```
//!
//! Nothing is produced until [`MarkerLineBuilder::build`] is called, so a
//! flow cancelled half-way leaves no trace.

use std::path::Path;
use std::process::Command;

use tracing::debug;

use crate::vocabulary::{Context, Meta, Priority, TaskType};

/// Line comment prefix for a host language id.
#[must_use]
pub fn comment_prefix(language_id: &str) -> &'static str {
    match language_id {
        "python" | "ruby" | "shell" | "bash" | "powershell" | "yaml" | "perl" | "r" => "#",
        "html" | "xml" => "<!--",
        "css" => "/*",
        "sql" | "lua" | "haskell" => "--",
        _ => "//",
    }
}

/// Language id for a file extension, for callers that only have a path.
#[must_use]
pub fn language_for_extension(extension: &str) -> &'static str {
    match extension.trim_start_matches('.').to_ascii_lowercase().as_str() {
        "js" | "jsx" | "mjs" | "cjs" => "javascript",
        "ts" | "tsx" => "typescript",
        "java" => "java",
        "c" | "h" => "c",
        "cpp" | "cc" | "hpp" => "cpp",
        "cs" => "csharp",
        "go" => "go",
        "rs" => "rust",
        "php" => "php",
        "swift" => "swift",
        "kt" => "kotlin",
        "dart" => "dart",
        "py" => "python",
        "rb" => "ruby",
        "sh" => "shell",
        "ps1" => "powershell",
        "yml" | "yaml" => "yaml",
        "pl" => "perl",
        "r" => "r",
        "html" | "htm" | "vue" | "svelte" | "md" => "html",
        "xml" => "xml",
        "css" => "css",
        "scss" => "scss",
        "less" => "less",
        "sql" => "sql",
        "lua" => "lua",
        "hs" => "haskell",
        _ => "plaintext",
    }
}

/// One meta block chosen in the insertion flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaBlock {
    pub meta: Meta,
    pub value: String,
}

impl MetaBlock {
    fn render(&self) -> String {
        if self.meta.takes_value() {
            format!("[{}: {}]", self.meta.slug(), self.value.trim())
        } else {
            self.meta.token().to_string()
        }
    }
}

/// Collects the answers of the insertion flow and renders the marker line.
#[derive(Debug, Clone)]
pub struct MarkerLineBuilder {
    comment_prefix: String,
    priority: Priority,
    task_type: TaskType,
    context: Context,
    message: String,
    metas: Vec<MetaBlock>,
}

impl MarkerLineBuilder {
    #[must_use]
    pub fn new(
        comment_prefix: &str,
        priority: Priority,
        task_type: TaskType,
        context: Context,
        message: &str,
    ) -> Self {
        Self {
            comment_prefix: comment_prefix.to_string(),
            priority,
            task_type,
            context,
            message: message.trim().to_string(),
            metas: Vec::new(),
        }
    }

    /// Appends a meta block; the value is ignored for `[tbd]` and
    /// `[block-commit]`.
    #[must_use]
    pub fn meta(mut self, meta: Meta, value: &str) -> Self {
        self.metas.push(MetaBlock {
            meta,
            value: value.to_string(),
        });
        self
    }

    /// Renders the marker line, blocks in the order they were added.
    ///
    /// Block comment prefixes (`<!--`, `/*`) get no closer; the line ends
    /// with the last meta block or the message.
    #[must_use]
    pub fn build(&self) -> String {
        let mut line = format!(
            "{} TODO: {} {} {} {}",
            self.comment_prefix,
            self.priority.token(),
            self.task_type.token(),
            self.context.token(),
            self.message
        );

        for block in &self.metas {
            line.push(' ');
            line.push_str(&block.render());
        }

        line
    }
}

/// `git config user.name` in `workdir`, used for self-assignment.
#[must_use]
pub fn git_user_name(workdir: &Path) -> Option<String> {
    let output = Command::new("git")
        .args(["config", "user.name"])
        .current_dir(workdir)
        .output()
        .map_err(|e| debug!(error = %e, "Failed to run git"))
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let name = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!name.is_empty()).then_some(name)
}
