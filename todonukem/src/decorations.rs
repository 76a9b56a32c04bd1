//! Decoration mapping: which characters of a document collapse to glyphs.
//!
//! The host renders each instruction by collapsing the covered characters
//! (zero width, zero opacity) and injecting the display text in front of
//! them, so the buffer itself is never edited. This module only decides the
//! exact ranges and the text to show.
//!
//! # Tokens
//!
//! Keys are only matched inside marker remainders (the text after
//! `TODO[:]`), never elsewhere in the document:
//!
//! | Key | Token that collapses | Display text |
//! |-----|----------------------|--------------|
//! | priority, type, context | `[high]` | `🔴` |
//! | `[tbd]`, `[block-commit]` | `[tbd]` | `[💬]` |
//! | other meta | `author:` | `✍️` (brackets and value untouched) |
//!
//! # Offsets
//!
//! Ranges are half-open and counted in characters (Unicode scalar values)
//! from the start of the document. [`TextIndex`] turns them into line and
//! column positions, with columns in characters or in UTF-16 code units.
//!
//! # Example
//!
//! ```
//! use todonukem::decorations::compute_instructions;
//! use todonukem::vocabulary::{DisplayMode, Meta, VocabKey, Vocabulary};
//!
//! let text = "// TODO: [tbd] ask [author: Bob]";
//! let decorations = compute_instructions(text, &Vocabulary::default(), DisplayMode::Emoji);
//!
//! let tbd = decorations.get(VocabKey::Meta(Meta::Tbd));
//! assert_eq!((tbd[0].start, tbd[0].end), (9, 14));
//! assert_eq!(tbd[0].glyph, "[💬]");
//!
//! let author = decorations.get(VocabKey::Meta(Meta::Author));
//! assert_eq!(&text[author[0].start..author[0].end], "author:");
//! ```

use std::ops::Range;

use serde::Serialize;
use tracing::debug;

use crate::config::Config;
use crate::grammar::MARKER_RE;
use crate::vocabulary::{DisplayMode, Meta, VocabKey, Vocabulary};

/// One collapse of a key token into its display text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecorationInstruction {
    #[serde(rename = "vocabularyKey")]
    pub key: VocabKey,

    /// First character covered.
    #[serde(rename = "rangeStart")]
    pub start: usize,

    /// One past the last character covered.
    #[serde(rename = "rangeEnd")]
    pub end: usize,

    /// Text shown in place of the token.
    pub glyph: String,
}

/// The matched token and display text of one key under one display mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecorationRule {
    pub key: VocabKey,
    pub token: String,
    pub display: String,
}

impl DecorationRule {
    fn new(key: VocabKey, vocabulary: &Vocabulary, mode: DisplayMode) -> Self {
        let display = vocabulary.format_display(key, mode);
        match key {
            VocabKey::Meta(meta) if meta.takes_value() => Self {
                key,
                token: format!("{}:", meta.slug()),
                display,
            },
            VocabKey::Meta(Meta::Tbd | Meta::BlockCommit) => Self {
                key,
                token: key.token().to_string(),
                display: format!("[{display}]"),
            },
            _ => Self {
                key,
                token: key.token().to_string(),
                display,
            },
        }
    }
}

/// Instructions for a single key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyDecorations {
    pub key: VocabKey,
    pub display: String,
    pub instructions: Vec<DecorationInstruction>,
}

/// Instructions for every key of a vocabulary, in category scan order.
///
/// Keys that never occur are present with an empty list, which lets the host
/// clear stale overlays for them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Decorations {
    groups: Vec<KeyDecorations>,
}

impl Decorations {
    /// Instructions for one key.
    #[must_use]
    pub fn get(&self, key: VocabKey) -> &[DecorationInstruction] {
        self.groups
            .iter()
            .find(|group| group.key == key)
            .map(|group| group.instructions.as_slice())
            .unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &KeyDecorations> {
        self.groups.iter()
    }

    /// Total number of instructions across all keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.iter().map(|group| group.instructions.len()).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Decoration rules compiled from a vocabulary and a display mode.
///
/// Build once and call [`compute`](Self::compute) on every text change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecorationSet {
    mode: DisplayMode,
    rules: Vec<DecorationRule>,
}

impl DecorationSet {
    #[must_use]
    pub fn new(vocabulary: &Vocabulary, mode: DisplayMode) -> Self {
        let rules = vocabulary
            .entries()
            .iter()
            .map(|entry| DecorationRule::new(entry.key, vocabulary, mode))
            .collect();

        Self { mode, rules }
    }

    #[must_use]
    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    #[must_use]
    pub fn rules(&self) -> &[DecorationRule] {
        &self.rules
    }

    /// Computes the instructions for a whole document.
    #[must_use]
    pub fn compute(&self, text: &str) -> Decorations {
        let spans = marker_spans(text);

        let groups = self
            .rules
            .iter()
            .map(|rule| KeyDecorations {
                key: rule.key,
                display: rule.display.clone(),
                instructions: rule_instructions(rule, text, &spans),
            })
            .collect();

        let decorations = Decorations { groups };
        debug!(
            spans = spans.len(),
            instructions = decorations.len(),
            "Computed decorations"
        );
        decorations
    }

    /// Instructions with every key present and no ranges.
    #[must_use]
    pub fn cleared(&self) -> Decorations {
        Decorations {
            groups: self
                .rules
                .iter()
                .map(|rule| KeyDecorations {
                    key: rule.key,
                    display: rule.display.clone(),
                    instructions: Vec::new(),
                })
                .collect(),
        }
    }
}

/// A marker remainder: its byte range and the character offset it starts at.
struct Span {
    bytes: Range<usize>,
    char_start: usize,
}

fn marker_spans(text: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut counted_bytes = 0;
    let mut counted_chars = 0;

    for caps in MARKER_RE.captures_iter(text) {
        let Some(remainder) = caps.get(1) else {
            continue;
        };
        counted_chars += text[counted_bytes..remainder.start()].chars().count();
        counted_bytes = remainder.start();
        spans.push(Span {
            bytes: remainder.range(),
            char_start: counted_chars,
        });
    }

    spans
}

fn rule_instructions(
    rule: &DecorationRule,
    text: &str,
    spans: &[Span],
) -> Vec<DecorationInstruction> {
    let token_chars = rule.token.chars().count();
    let mut instructions = Vec::new();

    for span in spans {
        let segment = &text[span.bytes.clone()];
        for (offset, _) in segment.match_indices(rule.token.as_str()) {
            let start = span.char_start + segment[..offset].chars().count();
            instructions.push(DecorationInstruction {
                key: rule.key,
                start,
                end: start + token_chars,
                glyph: rule.display.clone(),
            });
        }
    }

    instructions
}

/// Computes decoration instructions for a document.
///
/// Pure over its inputs; prefer a reused [`DecorationSet`] when called on
/// every keystroke.
#[must_use]
pub fn compute_instructions(
    text: &str,
    vocabulary: &Vocabulary,
    mode: DisplayMode,
) -> Decorations {
    DecorationSet::new(vocabulary, mode).compute(text)
}

/// Editor-side decoration state: the compiled rules plus an on/off switch.
#[derive(Debug, Clone)]
pub struct Decorator {
    set: DecorationSet,
    enabled: bool,
}

impl Decorator {
    /// Creates an enabled decorator for a configuration.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            set: DecorationSet::new(&config.vocabulary(), config.display_mode),
            enabled: true,
        }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Flips decorations on or off and returns the new state.
    pub fn toggle(&mut self) -> bool {
        self.enabled = !self.enabled;
        self.enabled
    }

    /// Recompiles the rules after a configuration change.
    pub fn reload(&mut self, config: &Config) {
        self.set = DecorationSet::new(&config.vocabulary(), config.display_mode);
    }

    #[must_use]
    pub fn set(&self) -> &DecorationSet {
        &self.set
    }

    /// Instructions for the current document text; all empty when disabled.
    #[must_use]
    pub fn update(&self, text: &str) -> Decorations {
        if self.enabled {
            self.set.compute(text)
        } else {
            self.set.cleared()
        }
    }
}

/// Zero-based line and column.
///
/// The column is counted in characters by [`TextIndex::position`] and in
/// UTF-16 code units by [`TextIndex::utf16_position`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Position {
    pub line: usize,
    pub character: usize,
}

/// Maps character offsets of one document to line/column positions.
#[derive(Debug, Clone)]
pub struct TextIndex {
    line_starts: Vec<usize>,
    /// UTF-16 code units before each character offset, plus one final entry
    /// for the end of the document.
    utf16_before: Vec<usize>,
}

impl TextIndex {
    #[must_use]
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        let mut utf16_before = Vec::with_capacity(text.len() + 1);
        let mut units = 0;
        for (offset, ch) in text.chars().enumerate() {
            utf16_before.push(units);
            units += ch.len_utf16();
            if ch == '\n' {
                line_starts.push(offset + 1);
            }
        }
        utf16_before.push(units);
        Self {
            line_starts,
            utf16_before,
        }
    }

    /// Document length in characters.
    fn len(&self) -> usize {
        self.utf16_before.len() - 1
    }

    /// Line of a clamped offset and the character offset where it starts.
    fn locate(&self, offset: usize) -> (usize, usize) {
        let line = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);
        (line, self.line_starts[line])
    }

    /// Position of a character offset; offsets past the end clamp to it.
    #[must_use]
    pub fn position(&self, offset: usize) -> Position {
        let offset = offset.min(self.len());
        let (line, start) = self.locate(offset);
        Position {
            line,
            character: offset - start,
        }
    }

    /// Like [`position`](Self::position), but the column counts UTF-16 code
    /// units, as LSP clients and JavaScript hosts expect. Characters outside
    /// the Basic Multilingual Plane count as two.
    #[must_use]
    pub fn utf16_position(&self, offset: usize) -> Position {
        let offset = offset.min(self.len());
        let (line, start) = self.locate(offset);
        Position {
            line,
            character: self.utf16_before[offset] - self.utf16_before[start],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocabulary::{Context, Priority, TaskType};

    fn emoji(text: &str) -> Decorations {
        compute_instructions(text, &Vocabulary::default(), DisplayMode::Emoji)
    }

    #[test]
    fn priority_token_is_collapsed() {
        let text = "// TODO: [high] fix it";
        let decorations = emoji(text);
        let high = decorations.get(VocabKey::Priority(Priority::High));

        assert_eq!(high.len(), 1);
        assert_eq!(&text[high[0].start..high[0].end], "[high]");
        assert_eq!(high[0].glyph, "🔴");
    }

    #[test]
    fn every_key_is_reported() {
        let decorations = emoji("nothing to see");
        assert_eq!(decorations.iter().count(), VocabKey::ALL.len());
        assert!(decorations.is_empty());
    }

    #[test]
    fn keys_outside_markers_are_ignored() {
        let text = "let x = [high]; // TODO: [low] later\n[fix] not a marker";
        let decorations = emoji(text);

        assert!(decorations.get(VocabKey::Priority(Priority::High)).is_empty());
        assert!(decorations.get(VocabKey::Type(TaskType::Fix)).is_empty());
        assert_eq!(decorations.get(VocabKey::Priority(Priority::Low)).len(), 1);
    }

    #[test]
    fn keys_anywhere_in_the_remainder_match() {
        let text = "# TODO: see [doc] and [doc] again";
        let doc = emoji(text);
        let ranges: Vec<_> = doc
            .get(VocabKey::Context(Context::Doc))
            .iter()
            .map(|i| (i.start, i.end))
            .collect();
        assert_eq!(ranges, vec![(12, 17), (22, 27)]);
    }

    #[test]
    fn value_meta_collapses_only_key_and_colon() {
        let text = "// TODO: ping [author: Bob]";
        let decorations = emoji(text);
        let author = decorations.get(VocabKey::Meta(Meta::Author));

        assert_eq!(author.len(), 1);
        assert_eq!(&text[author[0].start..author[0].end], "author:");
        assert_eq!(&text[author[0].end..], " Bob]");
        assert_eq!(author[0].glyph, "✍️");
    }

    #[test]
    fn flag_meta_collapses_whole_token_with_brackets() {
        let text = "// TODO: [block-commit] remove debug";
        let decorations = emoji(text);
        let block = decorations.get(VocabKey::Meta(Meta::BlockCommit));

        assert_eq!(&text[block[0].start..block[0].end], "[block-commit]");
        assert_eq!(block[0].glyph, "[⛔]");
    }

    #[test]
    fn offsets_count_characters_not_bytes() {
        let text = "// ✨ é\n// TODO: [fix] ü [test]";
        let decorations = emoji(text);
        let fix = decorations.get(VocabKey::Type(TaskType::Fix))[0].clone();
        let test = decorations.get(VocabKey::Context(Context::Test))[0].clone();

        let chars: Vec<char> = text.chars().collect();
        let slice = |s: usize, e: usize| chars[s..e].iter().collect::<String>();
        assert_eq!(slice(fix.start, fix.end), "[fix]");
        assert_eq!(slice(test.start, test.end), "[test]");
    }

    #[test]
    fn display_modes() {
        let text = "// TODO: [tbd] [feature] x";
        let vocabulary = Vocabulary::default();

        let text_mode = compute_instructions(text, &vocabulary, DisplayMode::Text);
        assert_eq!(text_mode.get(VocabKey::Type(TaskType::Feature))[0].glyph, "Feature");
        assert_eq!(text_mode.get(VocabKey::Meta(Meta::Tbd))[0].glyph, "[TBD]");

        let both = compute_instructions(text, &vocabulary, DisplayMode::EmojiText);
        assert_eq!(both.get(VocabKey::Type(TaskType::Feature))[0].glyph, "✨-feature");
        assert_eq!(both.get(VocabKey::Meta(Meta::Tbd))[0].glyph, "[💬-tbd]");
    }

    #[test]
    fn compute_is_idempotent() {
        let text = "// TODO: [high] [fix] [sec] a [ticket: AB-1]\n/* todo [low] b [tbd] */";
        assert_eq!(emoji(text), emoji(text));
    }

    #[test]
    fn decorator_toggle_clears() {
        let mut decorator = Decorator::new(&Config::default());
        let text = "// TODO: [high] x";
        assert_eq!(decorator.update(text).len(), 1);

        assert!(!decorator.toggle());
        let cleared = decorator.update(text);
        assert!(cleared.is_empty());
        assert_eq!(cleared.iter().count(), VocabKey::ALL.len());

        assert!(decorator.toggle());
        assert_eq!(decorator.update(text).len(), 1);
    }

    #[test]
    fn decorator_reload_picks_up_mode() {
        let mut decorator = Decorator::new(&Config::default());
        let config = Config {
            display_mode: DisplayMode::Text,
            ..Config::default()
        };
        decorator.reload(&config);

        let decorations = decorator.update("// TODO: [high] x");
        assert_eq!(decorations.get(VocabKey::Priority(Priority::High))[0].glyph, "High");
    }

    #[test]
    fn text_index_positions() {
        let index = TextIndex::new("ab\nçd\n\nx");
        assert_eq!(index.position(0), Position { line: 0, character: 0 });
        assert_eq!(index.position(2), Position { line: 0, character: 2 });
        assert_eq!(index.position(3), Position { line: 1, character: 0 });
        assert_eq!(index.position(5), Position { line: 1, character: 2 });
        assert_eq!(index.position(6), Position { line: 2, character: 0 });
        assert_eq!(index.position(7), Position { line: 3, character: 0 });
        assert_eq!(index.position(100), Position { line: 3, character: 1 });
    }

    #[test]
    fn utf16_columns_count_surrogate_pairs() {
        // 🔴 is one character but two UTF-16 units; ç is one of each.
        let index = TextIndex::new("🔴x\nç🔴y");

        assert_eq!(index.position(1), Position { line: 0, character: 1 });
        assert_eq!(index.utf16_position(1), Position { line: 0, character: 2 });
        assert_eq!(index.utf16_position(2), Position { line: 0, character: 3 });

        assert_eq!(index.utf16_position(3), Position { line: 1, character: 0 });
        assert_eq!(index.utf16_position(5), Position { line: 1, character: 3 });
        assert_eq!(index.position(5), Position { line: 1, character: 2 });
        assert_eq!(index.utf16_position(100), Position { line: 1, character: 4 });
    }

    #[test]
    fn utf16_positions_of_empty_text() {
        let index = TextIndex::new("");
        assert_eq!(index.utf16_position(0), Position { line: 0, character: 0 });
        assert_eq!(index.position(3), Position { line: 0, character: 0 });
    }
}
