//! Marker vocabulary for TODO NUKEM.
//!
//! The vocabulary is the fixed set of bracketed keys a marker line may carry,
//! grouped into four categories:
//!
//! | Category | Keys |
//! |----------|------|
//! | Priority | `[low]`, `[medium]`, `[high]` |
//! | Type     | `[feature]`, `[fix]` |
//! | Context  | `[design]`, `[doc]`, `[test]`, `[perf]`, `[lang]`, `[sec]`, `[update]`, `[optimize]`, `[review]` |
//! | Meta     | `[tbd]`, `[scope]`, `[ticket]`, `[until]`, `[assignee]`, `[author]`, `[version]`, `[docs]`, `[block-commit]` |
//!
//! Every key has a stable token, a human name and a default glyph. A
//! [`Vocabulary`] is an immutable snapshot of all keys with their effective
//! glyphs; overrides from `todonukem.json` produce a new snapshot rather than
//! mutating an existing one.
//!
//! # Example
//!
//! ```
//! use todonukem::vocabulary::{DisplayMode, Priority, VocabKey, Vocabulary};
//!
//! let vocabulary = Vocabulary::default();
//! let high = VocabKey::Priority(Priority::High);
//!
//! assert_eq!(high.token(), "[high]");
//! assert_eq!(vocabulary.format_display(high, DisplayMode::Text), "High");
//! assert_eq!(vocabulary.format_display(high, DisplayMode::EmojiText), "🔴-high");
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

use crate::config::EmojiOverrides;

/// Static description of a single vocabulary key.
#[derive(Debug)]
struct KeyInfo {
    token: &'static str,
    slug: &'static str,
    name: &'static str,
    glyph: &'static str,
}

const fn info(
    token: &'static str,
    slug: &'static str,
    name: &'static str,
    glyph: &'static str,
) -> KeyInfo {
    KeyInfo {
        token,
        slug,
        name,
        glyph,
    }
}

/// Error returned when a string does not name a known vocabulary key.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {category} key: {value}")]
pub struct UnknownKeyError {
    /// Category that was searched.
    pub category: Category,
    /// The rejected input.
    pub value: String,
}

/// Error returned when a string does not name a [`DisplayMode`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("expected one of emoji, text, emoji-text; got '{value}'")]
pub struct DisplayModeError {
    /// The rejected input, trimmed and lowercased.
    pub value: String,
}

/// Vocabulary category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Priority,
    Type,
    Context,
    Meta,
}

impl Category {
    /// All categories in scan order.
    pub const ALL: [Category; 4] = [
        Category::Priority,
        Category::Type,
        Category::Context,
        Category::Meta,
    ];

    /// Lowercase category name as used in `todonukem.json`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Priority => "priority",
            Category::Type => "type",
            Category::Context => "context",
            Category::Meta => "meta",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Priority slot of a marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    #[serde(rename = "[low]")]
    Low,
    #[serde(rename = "[medium]")]
    Medium,
    #[serde(rename = "[high]")]
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    fn info(self) -> &'static KeyInfo {
        const LOW: KeyInfo = info("[low]", "low", "Low", "🟩");
        const MEDIUM: KeyInfo = info("[medium]", "medium", "Medium", "🔶");
        const HIGH: KeyInfo = info("[high]", "high", "High", "🔴");
        match self {
            Priority::Low => &LOW,
            Priority::Medium => &MEDIUM,
            Priority::High => &HIGH,
        }
    }

    /// Sort rank: high sorts first.
    #[must_use]
    pub fn rank(self) -> u32 {
        match self {
            Priority::High => 1,
            Priority::Medium => 2,
            Priority::Low => 3,
        }
    }
}

/// Type slot of a marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskType {
    #[serde(rename = "[feature]")]
    Feature,
    #[serde(rename = "[fix]")]
    Fix,
}

impl TaskType {
    pub const ALL: [TaskType; 2] = [TaskType::Feature, TaskType::Fix];

    fn info(self) -> &'static KeyInfo {
        const FEATURE: KeyInfo = info("[feature]", "feature", "Feature", "✨");
        const FIX: KeyInfo = info("[fix]", "fix", "Fix", "🐛");
        match self {
            TaskType::Feature => &FEATURE,
            TaskType::Fix => &FIX,
        }
    }
}

/// Context slot of a marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Context {
    #[serde(rename = "[design]")]
    Design,
    #[serde(rename = "[doc]")]
    Doc,
    #[serde(rename = "[test]")]
    Test,
    #[serde(rename = "[perf]")]
    Perf,
    #[serde(rename = "[lang]")]
    Lang,
    #[serde(rename = "[sec]")]
    Sec,
    #[serde(rename = "[update]")]
    Update,
    #[serde(rename = "[optimize]")]
    Optimize,
    #[serde(rename = "[review]")]
    Review,
}

impl Context {
    pub const ALL: [Context; 9] = [
        Context::Design,
        Context::Doc,
        Context::Test,
        Context::Perf,
        Context::Lang,
        Context::Sec,
        Context::Update,
        Context::Optimize,
        Context::Review,
    ];

    fn info(self) -> &'static KeyInfo {
        const DESIGN: KeyInfo = info("[design]", "design", "Design", "🎨");
        const DOC: KeyInfo = info("[doc]", "doc", "Doc", "📚");
        const TEST: KeyInfo = info("[test]", "test", "Test", "🧪");
        const PERF: KeyInfo = info("[perf]", "perf", "Perf", "⚡");
        const LANG: KeyInfo = info("[lang]", "lang", "Lang", "🌐");
        const SEC: KeyInfo = info("[sec]", "sec", "Sec", "🔒");
        const UPDATE: KeyInfo = info("[update]", "update", "Update", "🔄");
        const OPTIMIZE: KeyInfo = info("[optimize]", "optimize", "Optimize", "🛠️");
        const REVIEW: KeyInfo = info("[review]", "review", "Review", "👀");
        match self {
            Context::Design => &DESIGN,
            Context::Doc => &DOC,
            Context::Test => &TEST,
            Context::Perf => &PERF,
            Context::Lang => &LANG,
            Context::Sec => &SEC,
            Context::Update => &UPDATE,
            Context::Optimize => &OPTIMIZE,
            Context::Review => &REVIEW,
        }
    }
}

/// Meta block attached to a marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Meta {
    #[serde(rename = "[tbd]")]
    Tbd,
    #[serde(rename = "[scope]")]
    Scope,
    #[serde(rename = "[ticket]")]
    Ticket,
    #[serde(rename = "[until]")]
    Until,
    #[serde(rename = "[assignee]")]
    Assignee,
    #[serde(rename = "[author]")]
    Author,
    #[serde(rename = "[version]")]
    Version,
    #[serde(rename = "[docs]")]
    Docs,
    #[serde(rename = "[block-commit]")]
    BlockCommit,
}

impl Meta {
    pub const ALL: [Meta; 9] = [
        Meta::Tbd,
        Meta::Scope,
        Meta::Ticket,
        Meta::Until,
        Meta::Assignee,
        Meta::Author,
        Meta::Version,
        Meta::Docs,
        Meta::BlockCommit,
    ];

    fn info(self) -> &'static KeyInfo {
        const TBD: KeyInfo = info("[tbd]", "tbd", "TBD", "💬");
        const SCOPE: KeyInfo = info("[scope]", "scope", "Scope", "🎯");
        const TICKET: KeyInfo = info("[ticket]", "ticket", "Ticket", "🎫");
        const UNTIL: KeyInfo = info("[until]", "until", "Until", "📅");
        const ASSIGNEE: KeyInfo = info("[assignee]", "assignee", "Assignee", "👤");
        const AUTHOR: KeyInfo = info("[author]", "author", "Author", "✍️");
        const VERSION: KeyInfo = info("[version]", "version", "Version", "🔖");
        const DOCS: KeyInfo = info("[docs]", "docs", "Docs", "📚");
        const BLOCK_COMMIT: KeyInfo = info("[block-commit]", "block-commit", "BlockCommit", "⛔");
        match self {
            Meta::Tbd => &TBD,
            Meta::Scope => &SCOPE,
            Meta::Ticket => &TICKET,
            Meta::Until => &UNTIL,
            Meta::Assignee => &ASSIGNEE,
            Meta::Author => &AUTHOR,
            Meta::Version => &VERSION,
            Meta::Docs => &DOCS,
            Meta::BlockCommit => &BLOCK_COMMIT,
        }
    }

    /// Whether the block carries a `: value` part.
    ///
    /// `[tbd]` and `[block-commit]` are bare flags; every other meta block is
    /// written as `[slug: value]`.
    #[must_use]
    pub fn takes_value(self) -> bool {
        !matches!(self, Meta::Tbd | Meta::BlockCommit)
    }
}

macro_rules! impl_key_accessors {
    ($($ty:ty),*) => {
        $(
            impl $ty {
                /// Bracketed token, e.g. `[high]`.
                #[must_use]
                pub fn token(self) -> &'static str {
                    self.info().token
                }

                /// Token without brackets, e.g. `high`.
                #[must_use]
                pub fn slug(self) -> &'static str {
                    self.info().slug
                }

                /// Human-readable name.
                #[must_use]
                pub fn name(self) -> &'static str {
                    self.info().name
                }

                /// Built-in glyph, used when no override is configured.
                #[must_use]
                pub fn default_glyph(self) -> &'static str {
                    self.info().glyph
                }

                /// Looks a key up by its exact bracketed token.
                #[must_use]
                pub fn from_token(token: &str) -> Option<Self> {
                    Self::ALL.into_iter().find(|key| key.token() == token)
                }
            }

            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.token())
                }
            }
        )*
    };
}

impl_key_accessors!(Priority, TaskType, Context, Meta);

/// Parses `high`, `HIGH` or `[high]` style input.
fn parse_key<T: Copy>(
    input: &str,
    category: Category,
    all: &[T],
    slug: fn(T) -> &'static str,
) -> Result<T, UnknownKeyError> {
    let normalized = input.trim().to_ascii_lowercase();
    let bare = normalized
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .unwrap_or(&normalized);

    all.iter()
        .copied()
        .find(|key| slug(*key) == bare)
        .ok_or_else(|| UnknownKeyError {
            category,
            value: input.to_string(),
        })
}

impl FromStr for Priority {
    type Err = UnknownKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_key(s, Category::Priority, &Self::ALL, Self::slug)
    }
}

impl FromStr for TaskType {
    type Err = UnknownKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_key(s, Category::Type, &Self::ALL, Self::slug)
    }
}

impl FromStr for Context {
    type Err = UnknownKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_key(s, Category::Context, &Self::ALL, Self::slug)
    }
}

impl FromStr for Meta {
    type Err = UnknownKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // The insertion flow writes `blockCommit`; accept it next to the slug.
        if s.trim().eq_ignore_ascii_case("blockcommit") {
            return Ok(Meta::BlockCommit);
        }
        parse_key(s, Category::Meta, &Self::ALL, Self::slug)
    }
}

/// Any vocabulary key, tagged with its category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VocabKey {
    Priority(Priority),
    Type(TaskType),
    Context(Context),
    Meta(Meta),
}

impl VocabKey {
    /// Every key in category scan order (priority, type, context, meta) and
    /// declaration order within a category.
    pub const ALL: [VocabKey; 23] = [
        VocabKey::Priority(Priority::Low),
        VocabKey::Priority(Priority::Medium),
        VocabKey::Priority(Priority::High),
        VocabKey::Type(TaskType::Feature),
        VocabKey::Type(TaskType::Fix),
        VocabKey::Context(Context::Design),
        VocabKey::Context(Context::Doc),
        VocabKey::Context(Context::Test),
        VocabKey::Context(Context::Perf),
        VocabKey::Context(Context::Lang),
        VocabKey::Context(Context::Sec),
        VocabKey::Context(Context::Update),
        VocabKey::Context(Context::Optimize),
        VocabKey::Context(Context::Review),
        VocabKey::Meta(Meta::Tbd),
        VocabKey::Meta(Meta::Scope),
        VocabKey::Meta(Meta::Ticket),
        VocabKey::Meta(Meta::Until),
        VocabKey::Meta(Meta::Assignee),
        VocabKey::Meta(Meta::Author),
        VocabKey::Meta(Meta::Version),
        VocabKey::Meta(Meta::Docs),
        VocabKey::Meta(Meta::BlockCommit),
    ];

    fn info(self) -> &'static KeyInfo {
        match self {
            VocabKey::Priority(key) => key.info(),
            VocabKey::Type(key) => key.info(),
            VocabKey::Context(key) => key.info(),
            VocabKey::Meta(key) => key.info(),
        }
    }

    #[must_use]
    pub fn category(self) -> Category {
        match self {
            VocabKey::Priority(_) => Category::Priority,
            VocabKey::Type(_) => Category::Type,
            VocabKey::Context(_) => Category::Context,
            VocabKey::Meta(_) => Category::Meta,
        }
    }

    #[must_use]
    pub fn token(self) -> &'static str {
        self.info().token
    }

    #[must_use]
    pub fn slug(self) -> &'static str {
        self.info().slug
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        self.info().name
    }

    #[must_use]
    pub fn default_glyph(self) -> &'static str {
        self.info().glyph
    }

    /// Position of the key in [`VocabKey::ALL`].
    fn index(self) -> usize {
        match self {
            VocabKey::Priority(key) => key as usize,
            VocabKey::Type(key) => 3 + key as usize,
            VocabKey::Context(key) => 5 + key as usize,
            VocabKey::Meta(key) => 14 + key as usize,
        }
    }
}

impl fmt::Display for VocabKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl Serialize for VocabKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.token())
    }
}

/// How a vocabulary key is rendered in place of its token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisplayMode {
    /// Glyph only.
    #[default]
    Emoji,
    /// Human name only.
    Text,
    /// Glyph, a hyphen and the lowercased name.
    EmojiText,
}

impl DisplayMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DisplayMode::Emoji => "emoji",
            DisplayMode::Text => "text",
            DisplayMode::EmojiText => "emoji-text",
        }
    }
}

impl FromStr for DisplayMode {
    type Err = DisplayModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "emoji" => Ok(DisplayMode::Emoji),
            "text" => Ok(DisplayMode::Text),
            "emoji-text" => Ok(DisplayMode::EmojiText),
            other => Err(DisplayModeError {
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single key with its effective glyph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VocabularyEntry {
    pub key: VocabKey,
    pub category: Category,
    pub name: &'static str,
    pub glyph: String,
}

/// Immutable snapshot of every vocabulary key and its effective glyph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    entries: Vec<VocabularyEntry>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::with_overrides(&EmojiOverrides::default())
    }
}

impl Vocabulary {
    /// Builds a vocabulary whose glyphs are shadowed by any non-blank
    /// overrides.
    #[must_use]
    pub fn with_overrides(overrides: &EmojiOverrides) -> Self {
        let entries = VocabKey::ALL
            .into_iter()
            .map(|key| VocabularyEntry {
                key,
                category: key.category(),
                name: key.name(),
                glyph: overrides
                    .glyph_for(key)
                    .unwrap_or_else(|| key.default_glyph())
                    .to_string(),
            })
            .collect();

        Self { entries }
    }

    /// All entries in category scan order.
    #[must_use]
    pub fn entries(&self) -> &[VocabularyEntry] {
        &self.entries
    }

    /// Entries of a single category.
    pub fn category(&self, category: Category) -> impl Iterator<Item = &VocabularyEntry> {
        self.entries
            .iter()
            .filter(move |entry| entry.category == category)
    }

    #[must_use]
    pub fn entry(&self, key: VocabKey) -> &VocabularyEntry {
        &self.entries[key.index()]
    }

    /// Effective glyph for a key.
    #[must_use]
    pub fn glyph(&self, key: VocabKey) -> &str {
        &self.entry(key).glyph
    }

    /// Renders a key the way the display mode asks for.
    #[must_use]
    pub fn format_display(&self, key: VocabKey, mode: DisplayMode) -> String {
        let entry = self.entry(key);
        match mode {
            DisplayMode::Emoji => entry.glyph.clone(),
            DisplayMode::Text => entry.name.to_string(),
            DisplayMode::EmojiText => format!("{}-{}", entry.glyph, entry.name.to_lowercase()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn all_keys_are_indexed_in_order() {
        for (position, key) in VocabKey::ALL.into_iter().enumerate() {
            assert_eq!(key.index(), position, "{key} has wrong index");
        }
    }

    #[test]
    fn tokens_are_unique_across_categories() {
        let tokens: HashSet<&str> = VocabKey::ALL.iter().map(|key| key.token()).collect();
        assert_eq!(tokens.len(), VocabKey::ALL.len());
    }

    #[test]
    fn token_is_bracketed_slug() {
        for key in VocabKey::ALL {
            assert_eq!(key.token(), format!("[{}]", key.slug()));
        }
    }

    #[test]
    fn from_token_round_trips() {
        assert_eq!(Priority::from_token("[medium]"), Some(Priority::Medium));
        assert_eq!(Context::from_token("[review]"), Some(Context::Review));
        assert_eq!(TaskType::from_token("[feature] "), None);
        assert_eq!(Meta::from_token("[block-commit]"), Some(Meta::BlockCommit));
    }

    #[test]
    fn from_str_accepts_slug_and_token() {
        assert_eq!("HIGH".parse::<Priority>(), Ok(Priority::High));
        assert_eq!("[fix]".parse::<TaskType>(), Ok(TaskType::Fix));
        assert_eq!("blockCommit".parse::<Meta>(), Ok(Meta::BlockCommit));

        let err = "urgent".parse::<Priority>().unwrap_err();
        assert_eq!(err.to_string(), "unknown priority key: urgent");
    }

    #[test]
    fn priority_ranks_high_first() {
        assert!(Priority::High.rank() < Priority::Medium.rank());
        assert!(Priority::Medium.rank() < Priority::Low.rank());
    }

    #[test]
    fn value_less_meta_blocks() {
        let flags: Vec<Meta> = Meta::ALL.into_iter().filter(|m| !m.takes_value()).collect();
        assert_eq!(flags, vec![Meta::Tbd, Meta::BlockCommit]);
    }

    #[test]
    fn format_display_modes() {
        let vocabulary = Vocabulary::default();
        let fix = VocabKey::Type(TaskType::Fix);

        assert_eq!(vocabulary.format_display(fix, DisplayMode::Emoji), "🐛");
        assert_eq!(vocabulary.format_display(fix, DisplayMode::Text), "Fix");
        assert_eq!(vocabulary.format_display(fix, DisplayMode::EmojiText), "🐛-fix");

        let block = VocabKey::Meta(Meta::BlockCommit);
        assert_eq!(
            vocabulary.format_display(block, DisplayMode::EmojiText),
            "⛔-blockcommit"
        );
    }

    #[test]
    fn category_filter() {
        let vocabulary = Vocabulary::default();
        assert_eq!(vocabulary.category(Category::Priority).count(), 3);
        assert_eq!(vocabulary.category(Category::Type).count(), 2);
        assert_eq!(vocabulary.category(Category::Context).count(), 9);
        assert_eq!(vocabulary.category(Category::Meta).count(), 9);
    }

    #[test]
    fn display_mode_parsing() {
        assert_eq!("emoji-text".parse::<DisplayMode>(), Ok(DisplayMode::EmojiText));
        assert_eq!(" TEXT ".parse::<DisplayMode>(), Ok(DisplayMode::Text));
        assert!("glyph".parse::<DisplayMode>().is_err());
    }

    #[test]
    fn display_mode_error_keeps_rejected_value() {
        let err = " Glyph ".parse::<DisplayMode>().unwrap_err();
        assert_eq!(
            err,
            DisplayModeError {
                value: "glyph".to_string()
            }
        );
        assert_eq!(
            err.to_string(),
            "expected one of emoji, text, emoji-text; got 'glyph'"
        );
    }

    #[test]
    fn vocab_key_serializes_as_token() {
        let json = serde_json::to_string(&VocabKey::Meta(Meta::Author)).unwrap();
        assert_eq!(json, "\"[author]\"");
        let json = serde_json::to_string(&Priority::Low).unwrap();
        assert_eq!(json, "\"[low]\"");
    }
}
