//! Marker line grammar and field extraction.
//!
//! A marker line is any line containing the case-insensitive keyword `TODO`,
//! an optional colon, at least one whitespace character and some content:
//!
//! ```text
//! // TODO: [high] [fix] [sec] Sanitize input [assignee: Alice] [ticket: SEC-12]
//!           ^^^^^^ ^^^^^ ^^^^^ ^^^^^^^^^^^^^^ ^^^^^^^^^^^^^^^^^^
//!           prio   type  ctx   message        meta blocks
//! ```
//!
//! The three leading slots are positional: each one is optional, but when
//! present they appear in priority, type, context order at the start of the
//! remainder. When several keys of the same category are written, only the
//! first anchored one classifies the marker; the rest stay in the message.
//!
//! Assignee and author are read from `[assignee: value]` / `[author: value]`
//! blocks anywhere in the remainder. The key may also be written as its glyph
//! (`[👤: Alice]`). Exactly one whitespace character must follow the colon.
//!
//! Extraction never fails. A marker that matches nothing degrades to fields
//! with every classification unset and the message set to the remainder.
//!
//! # Example
//!
//! ```
//! use todonukem::grammar::{is_marker_line, Grammar};
//! use todonukem::vocabulary::{Priority, TaskType, Vocabulary};
//!
//! let grammar = Grammar::new(&Vocabulary::default()).unwrap();
//! let line = "// TODO: [high] [fix] Handle timeouts [assignee: Alice]";
//!
//! assert!(is_marker_line(line));
//! let fields = grammar.parse_line(line).unwrap();
//! assert_eq!(fields.priority, Some(Priority::High));
//! assert_eq!(fields.task_type, Some(TaskType::Fix));
//! assert_eq!(fields.context, None);
//! assert_eq!(fields.assignee.as_deref(), Some("Alice"));
//! assert_eq!(fields.raw_text, "Handle timeouts [assignee: Alice]");
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::vocabulary::{Category, Context, Meta, Priority, TaskType, VocabKey, Vocabulary};

/// Marker keyword followed by the remainder of the line.
pub(crate) static MARKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)TODO:?\s+(.+)").expect("valid marker regex"));

/// Trailing block/markup comment closer.
static CLOSER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\*/|-->)\s*$").expect("valid closer regex"));

/// Errors that can occur while compiling a grammar from a vocabulary.
#[derive(Error, Debug)]
pub enum GrammarError {
    /// A vocabulary-derived pattern failed to compile.
    #[error("failed to compile marker pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Structured fields of one marker line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkerFields {
    /// Trimmed remainder after the keyword, comment closer removed.
    pub text: String,

    /// Free-text message: the remainder after the leading slots.
    pub raw_text: String,

    pub priority: Option<Priority>,
    pub task_type: Option<TaskType>,
    pub context: Option<Context>,
    pub assignee: Option<String>,
    pub author: Option<String>,
}

impl MarkerFields {
    /// Whether any of the leading slots matched.
    #[must_use]
    pub fn is_classified(&self) -> bool {
        self.priority.is_some() || self.task_type.is_some() || self.context.is_some()
    }
}

/// Returns true if the line holds a marker with non-blank content.
#[must_use]
pub fn is_marker_line(line: &str) -> bool {
    MARKER_RE
        .captures(line)
        .and_then(|caps| caps.get(1))
        .is_some_and(|m| !m.as_str().trim().is_empty())
}

/// Returns the text after the first `TODO[:]` keyword, trimmed and with any
/// trailing `*/` or `-->` removed.
///
/// Returns `None` if the line is not a marker line. The result may be empty
/// when the marker holds nothing but a comment closer.
#[must_use]
pub fn marker_remainder(line: &str) -> Option<&str> {
    let remainder = MARKER_RE.captures(line)?.get(1)?.as_str().trim();
    if remainder.is_empty() {
        return None;
    }
    Some(strip_closer(remainder))
}

fn strip_closer(text: &str) -> &str {
    let trimmed = text.trim();
    match CLOSER_RE.find(trimmed) {
        Some(m) => trimmed[..m.start()].trim(),
        None => trimmed,
    }
}

fn alternation<I>(alternatives: I) -> String
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    alternatives
        .into_iter()
        .map(|alt| regex::escape(alt.as_ref()))
        .collect::<Vec<_>>()
        .join("|")
}

/// Builds `\[(?:slug|glyph...):\s([^\]]+)\]` for a value-bearing meta key.
fn meta_value_regex(vocabulary: &Vocabulary, meta: Meta) -> Result<Regex, regex::Error> {
    let key = VocabKey::Meta(meta);
    let mut names = vec![meta.slug(), meta.default_glyph()];
    let configured = vocabulary.glyph(key);
    if configured != meta.default_glyph() {
        names.push(configured);
    }
    Regex::new(&format!(r"\[(?:{}):\s([^\]]+)\]", alternation(names)))
}

/// Field extractor compiled from one vocabulary.
///
/// Compile once per vocabulary and reuse; recompile when glyph overrides
/// change.
#[derive(Debug, Clone)]
pub struct Grammar {
    slots: Regex,
    assignee: Regex,
    author: Regex,
}

impl Grammar {
    /// Compiles the slot and meta patterns for a vocabulary.
    ///
    /// # Errors
    ///
    /// Returns `GrammarError::Pattern` if a derived pattern fails to compile.
    pub fn new(vocabulary: &Vocabulary) -> Result<Self, GrammarError> {
        let tokens = |category: Category| {
            alternation(vocabulary.category(category).map(|entry| entry.key.token()))
        };

        let slots = Regex::new(&format!(
            r"^(?:(?P<priority>{})\s*)?(?:(?P<kind>{})\s*)?(?P<context>{})?",
            tokens(Category::Priority),
            tokens(Category::Type),
            tokens(Category::Context),
        ))?;

        Ok(Self {
            slots,
            assignee: meta_value_regex(vocabulary, Meta::Assignee)?,
            author: meta_value_regex(vocabulary, Meta::Author)?,
        })
    }

    /// Extracts fields from the text following the marker keyword.
    #[must_use]
    pub fn extract_fields(&self, remainder: &str) -> MarkerFields {
        let text = strip_closer(remainder);

        let mut fields = MarkerFields {
            text: text.to_string(),
            raw_text: text.to_string(),
            ..MarkerFields::default()
        };

        if let Some(caps) = self.slots.captures(text) {
            fields.priority = caps
                .name("priority")
                .and_then(|m| Priority::from_token(m.as_str()));
            fields.task_type = caps
                .name("kind")
                .and_then(|m| TaskType::from_token(m.as_str()));
            fields.context = caps
                .name("context")
                .and_then(|m| Context::from_token(m.as_str()));

            let consumed = caps.get(0).map_or(0, |m| m.end());
            fields.raw_text = text[consumed..].trim().to_string();
        }

        fields.assignee = meta_value(&self.assignee, text);
        fields.author = meta_value(&self.author, text);

        fields
    }

    /// Parses a full source line, returning `None` for non-marker lines.
    #[must_use]
    pub fn parse_line(&self, line: &str) -> Option<MarkerFields> {
        marker_remainder(line).map(|remainder| self.extract_fields(remainder))
    }
}

fn meta_value(pattern: &Regex, text: &str) -> Option<String> {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|value| !value.is_empty())
}
