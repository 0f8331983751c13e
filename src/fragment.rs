//! Code fragments and the mapping between their plain text and the document.

use std::ops::Range;
use std::sync::OnceLock;

use serde::Serialize;

use crate::annotated::{AnnotatedText, Bound};
use crate::builders;
use crate::error::Error;
use crate::settings::Settings;

/// A contiguous region of a document with its own settings.
///
/// The fragments of one document tile it: their `from_pos..end()` ranges are
/// ascending, gap-free, and non-overlapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeFragment {
    /// Source of the fragment.
    pub code: String,
    /// Byte offset of the fragment in the document.
    pub from_pos: usize,
    /// Grammar used to build the fragment (`latex`, `nop`, …).
    pub language_id: String,
    /// Settings governing the fragment.
    #[serde(skip)]
    pub settings: Settings,
}

impl CodeFragment {
    /// Whether the document range lies within the fragment.
    pub const fn contains(&self, range: &Range<usize>) -> bool {
        return range.start >= self.from_pos && range.end <= self.end();
    }

    /// Byte offset right after the fragment in the document.
    pub const fn end(&self) -> usize {
        return self.from_pos.saturating_add(self.code.len());
    }

    /// Whether the fragment covers no code.
    pub const fn is_empty(&self) -> bool {
        return self.code.is_empty();
    }

    /// Whether the fragment is never sent to the engine.
    pub fn is_nop(&self) -> bool {
        return self.language_id == "nop";
    }

    /// Language the fragment is checked in.
    pub fn language(&self) -> &str {
        return &self.settings.language_short_code;
    }

    /// A fragment of `code` at `from_pos`.
    pub fn new(language_id: &str, code: &str, from_pos: usize, settings: Settings) -> Self {
        return Self {
            language_id: language_id.to_string(),
            code: code.to_string(),
            from_pos,
            settings,
        };
    }

    /// Document range covered by the fragment.
    pub const fn range(&self) -> Range<usize> {
        return self.from_pos..self.end();
    }

    /// The same fragment moved `offset` bytes further into the document.
    #[must_use]
    pub fn shifted(mut self, offset: usize) -> Self {
        self.from_pos = self.from_pos.saturating_add(offset);
        return self;
    }

    /// Sub-fragment over the fragment-relative `range`, with its own grammar
    /// and settings. Out-of-range or split-character bounds are clamped.
    pub fn slice(&self, range: Range<usize>, language_id: &str, settings: Settings) -> Self {
        let end = floor_char_boundary(&self.code, range.end);
        let start = floor_char_boundary(&self.code, range.start).min(end);
        return Self {
            language_id: language_id.to_string(),
            code: self.code.get(start..end).unwrap_or("").to_string(),
            from_pos: self.from_pos.saturating_add(start),
            settings,
        };
    }

    /// Sub-fragment over `range` keeping the grammar and the settings.
    pub fn sub(&self, range: Range<usize>) -> Self {
        return self.slice(range, &self.language_id, self.settings.clone());
    }
}

/// Largest char boundary of `text` not after `pos`.
fn floor_char_boundary(text: &str, pos: usize) -> usize {
    let mut pos = pos.min(text.len());
    while pos > 0 && !text.is_char_boundary(pos) {
        pos = pos.saturating_sub(1);
    }
    return pos;
}

/// A fragment plus its annotated text.
///
/// Maps plain-text ranges reported by the engine to document ranges, and
/// document ranges back to plain text. The inverse annotated text is built
/// on first use and kept for the fragment's lifetime.
#[derive(Debug)]
pub struct AnnotatedTextFragment {
    /// Its annotated text.
    annotated_text: AnnotatedText,
    /// The fragment the text was built from.
    fragment: CodeFragment,
    /// Source and plain roles swapped.
    inverse: OnceLock<AnnotatedText>,
}

impl AnnotatedTextFragment {
    /// The annotated text.
    pub const fn annotated_text(&self) -> &AnnotatedText {
        return &self.annotated_text;
    }

    /// Build the fragment with the builder registered for its language id.
    ///
    /// # Errors
    ///
    /// Returns `Error::ParserStall` if `strict` is set and the builder stalls.
    pub fn build(fragment: CodeFragment, strict: bool) -> Result<Self, Error> {
        let annotated_text = builders::build(&fragment, strict)?;
        return Ok(Self::new(fragment, annotated_text));
    }

    /// Document range of a plain-text range.
    pub fn document_range(&self, plain: Range<usize>) -> Range<usize> {
        let local = self.annotated_text.source_range(plain);
        return local.start.saturating_add(self.fragment.from_pos)..local.end.saturating_add(self.fragment.from_pos);
    }

    /// The fragment.
    pub const fn fragment(&self) -> &CodeFragment {
        return &self.fragment;
    }

    /// Pair an already-built annotated text with its fragment.
    pub const fn new(fragment: CodeFragment, annotated_text: AnnotatedText) -> Self {
        return Self {
            fragment,
            annotated_text,
            inverse: OnceLock::new(),
        };
    }

    /// Plain-text range of a document range; empty at the start if the range
    /// cannot be mapped without inverting.
    pub fn plain_range(&self, document: Range<usize>) -> Range<usize> {
        let inverse = self.inverse.get_or_init(|| return self.annotated_text.invert());
        let from = document.start.saturating_sub(self.fragment.from_pos).min(self.fragment.code.len());
        let to = document.end.saturating_sub(self.fragment.from_pos).min(self.fragment.code.len());
        let plain_from = inverse.source_position(from, Bound::Start);
        let plain_to = inverse.source_position(to, Bound::End);
        if plain_from > plain_to {
            tracing::warn!(
                from = document.start,
                to = document.end,
                plain_from,
                plain_to,
                "could not determine plain text positions"
            );
            return plain_from..plain_from;
        }
        return plain_from..plain_to;
    }

    /// The text sent to the engine.
    pub fn plain_text(&self) -> &str {
        return self.annotated_text.plain_text();
    }

    /// The plain text produced by a document range.
    pub fn substring_of_plain_text(&self, document: Range<usize>) -> &str {
        let range = self.plain_range(document);
        return self.plain_text().get(range).unwrap_or("");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment(code: &str, from_pos: usize) -> CodeFragment {
        return CodeFragment::new("latex", code, from_pos, Settings::default());
    }

    #[test]
    fn slices_keep_absolute_positions() {
        let outer = fragment("abc\\textbf{def}", 10);
        let inner = outer.slice(11..14, "latex", Settings::default().with_language("de-DE"));
        assert_eq!(inner.code, "def");
        assert_eq!(inner.from_pos, 21);
        assert_eq!(inner.language(), "de-DE");
        assert!(outer.contains(&inner.range()));
    }

    #[test]
    fn slices_clamp_to_char_boundaries() {
        let outer = fragment("aéb", 0);
        let inner = outer.sub(2..9);
        assert_eq!(inner.code, "éb");
        assert_eq!(inner.from_pos, 1);
    }

    #[test]
    fn plain_ranges_map_to_document() {
        let fragment = AnnotatedTextFragment::build(fragment("Ein \\textbf{Test}.", 100), true).unwrap();
        assert_eq!(fragment.plain_text(), "Ein Test.");
        assert_eq!(fragment.document_range(4..8), 112..116);
        assert_eq!(fragment.substring_of_plain_text(112..116), "Test");
        assert_eq!(fragment.plain_range(100..103), 0..3);
    }

    #[test]
    fn placeholder_covers_whole_command() {
        let fragment = AnnotatedTextFragment::build(fragment("See \\cite{x}.", 0), true).unwrap();
        assert_eq!(fragment.plain_text(), "See Dummy0.");
        assert_eq!(fragment.document_range(4..10), 4..12);
        assert_eq!(fragment.substring_of_plain_text(4..12), "Dummy0");
    }

    #[test]
    fn ranges_outside_the_fragment_clamp() {
        let fragment = AnnotatedTextFragment::build(fragment("abc", 5), true).unwrap();
        assert_eq!(fragment.plain_range(0..100), 0..3);
    }
}
