//! Annotated text: the ordered Text/Markup parts produced from one fragment.
//!
//! The raw spans of all parts concatenate to the fragment source, and the
//! `text`/`interpretAs` contributions concatenate to the plain text. Offsets
//! are UTF-8 byte offsets on both sides.

use std::ops::Range;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

/// One part of an annotated text.
///
/// Serializes to the `{"text": …}` / `{"markup": …, "interpretAs": …}` shape
/// understood by LanguageTool's `data` parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    /// Source syntax, dropped from the plain text or replaced by `interpret_as`.
    Markup {
        /// The source span.
        markup: String,
        /// What the plain text reads instead; `None` drops the span.
        #[serde(rename = "interpretAs", skip_serializing_if = "Option::is_none", default)]
        interpret_as: Option<String>,
    },
    /// Natural-language text, identical in source and plain text.
    Text {
        /// The text.
        text: String,
    },
}

impl Part {
    /// The contribution of the part to the plain text.
    pub fn plain(&self) -> &str {
        return match self {
            Self::Text { text } => text,
            Self::Markup { interpret_as, .. } => interpret_as.as_deref().unwrap_or(""),
        };
    }

    /// The span of the part in the source.
    pub fn raw(&self) -> &str {
        return match self {
            Self::Text { text } => text,
            Self::Markup { markup, .. } => markup,
        };
    }
}

/// Which end of a range an offset belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    /// The offset ends a range: it resolves to where the previous character ends.
    End,
    /// The offset starts a range: it resolves to where the next character comes from.
    Start,
}

/// Mapping entry for one part: where it sits in the plain text and in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Segment {
    /// Index of the part in `AnnotatedText::parts`.
    part: usize,
    /// Byte range in the plain text.
    plain: Range<usize>,
    /// Byte range in the source.
    source: Range<usize>,
}

/// Ordered parts plus the lazily built plain text and position table.
#[derive(Debug, Default)]
pub struct AnnotatedText {
    /// Parts in source order.
    parts: Vec<Part>,
    /// Concatenated plain text.
    plain_text: OnceLock<String>,
    /// Breakpoint table, one segment per part.
    segments: OnceLock<Vec<Segment>>,
}

impl Clone for AnnotatedText {
    fn clone(&self) -> Self {
        return Self::from_parts(self.parts.clone());
    }
}

impl PartialEq for AnnotatedText {
    fn eq(&self, other: &Self) -> bool {
        return self.parts == other.parts;
    }
}

impl Eq for AnnotatedText {}

impl AnnotatedText {
    /// Wrap already-built parts.
    pub fn from_parts(parts: Vec<Part>) -> Self {
        return Self {
            parts,
            plain_text: OnceLock::new(),
            segments: OnceLock::new(),
        };
    }

    /// Swap the roles of source and plain text.
    ///
    /// Text stays text; a dropped markup span becomes an empty span read as the
    /// markup; a substituted span becomes the substitute read as the markup.
    /// Looking up source positions on the result maps source offsets of
    /// `self` to plain offsets of `self`.
    #[must_use]
    pub fn invert(&self) -> Self {
        let mut builder = AnnotatedTextBuilder::new();
        for part in &self.parts {
            match part {
                Part::Text { text } => builder.add_text(text),
                Part::Markup { markup, interpret_as } => {
                    builder.add_markup_as(interpret_as.as_deref().unwrap_or(""), markup);
                },
            }
        }
        return builder.build();
    }

    /// Whether the segment's part is plain text.
    fn is_text(&self, segment: &Segment) -> bool {
        return matches!(self.parts.get(segment.part), Some(Part::Text { .. }));
    }

    /// The parts in order.
    pub fn parts(&self) -> &[Part] {
        return &self.parts;
    }

    /// The text the grammar engine checks.
    pub fn plain_text(&self) -> &str {
        return self.plain_text.get_or_init(|| return self.parts.iter().map(Part::plain).collect());
    }

    /// Resolve `plain_pos` inside the given producing segment.
    fn position_in_segment(&self, segment: &Segment, plain_pos: usize, bound: Bound) -> usize {
        let offset = plain_pos.saturating_sub(segment.plain.start);
        if self.is_text(segment) {
            return segment.source.start.saturating_add(offset);
        }

        let plain_len = segment.plain.end.saturating_sub(segment.plain.start);
        if offset == 0 {
            return segment.source.start;
        }
        if offset >= plain_len {
            return segment.source.end;
        }

        let raw = self.parts.get(segment.part).map_or("", Part::raw);
        let source_len = raw.len();
        let scaled = offset.saturating_mul(source_len);
        let mut local = scaled.saturating_add(plain_len / 2).checked_div(plain_len).unwrap_or(0);
        local = local.min(source_len);
        match bound {
            Bound::Start => {
                while local > 0 && !raw.is_char_boundary(local) {
                    local = local.saturating_sub(1);
                }
            },
            Bound::End => {
                while local < source_len && !raw.is_char_boundary(local) {
                    local = local.saturating_add(1);
                }
            },
        }
        return segment.source.start.saturating_add(local);
    }

    /// The breakpoint table, built on first use.
    fn segments(&self) -> &[Segment] {
        return self.segments.get_or_init(|| {
            let mut segments = Vec::with_capacity(self.parts.len());
            let mut plain_pos = 0_usize;
            let mut source_pos = 0_usize;
            for (index, part) in self.parts.iter().enumerate() {
                let plain_end = plain_pos.saturating_add(part.plain().len());
                let source_end = source_pos.saturating_add(part.raw().len());
                segments.push(Segment {
                    part: index,
                    plain: plain_pos..plain_end,
                    source: source_pos..source_end,
                });
                plain_pos = plain_end;
                source_pos = source_end;
            }
            return segments;
        });
    }

    /// Length of the source in bytes.
    pub fn source_len(&self) -> usize {
        return self.segments().last().map_or(0, |segment| return segment.source.end);
    }

    /// Map a plain-text offset to a source offset.
    ///
    /// A `Start` offset resolves to the source start of the part producing the
    /// character at that offset; an `End` offset to the source end of the part
    /// producing the character before it. Inside a substituted part the
    /// position is interpolated linearly and snapped to a char boundary.
    pub fn source_position(&self, plain_pos: usize, bound: Bound) -> usize {
        let segments = self.segments();
        let plain_len = segments.last().map_or(0, |segment| return segment.plain.end);
        let plain_pos = plain_pos.min(plain_len);

        match bound {
            Bound::Start => {
                if plain_pos >= plain_len {
                    return self.source_len();
                }
                let index = segments.partition_point(|segment| return segment.plain.end <= plain_pos);
                let Some(segment) = segments.get(index) else {
                    return self.source_len();
                };
                return self.position_in_segment(segment, plain_pos, bound);
            },
            Bound::End => {
                if plain_pos == 0 {
                    return 0;
                }
                let index = segments.partition_point(|segment| return segment.plain.end < plain_pos);
                let Some(segment) = segments.get(index) else {
                    return self.source_len();
                };
                return self.position_in_segment(segment, plain_pos, bound);
            },
        }
    }

    /// Map a plain-text range to a source range that never inverts.
    pub fn source_range(&self, plain: Range<usize>) -> Range<usize> {
        let start = self.source_position(plain.start, Bound::Start);
        let end = self.source_position(plain.end, Bound::End).max(start);
        return start..end;
    }

    /// The source this annotated text was built from.
    pub fn source_text(&self) -> String {
        return self.parts.iter().map(Part::raw).collect();
    }
}

/// Accumulates parts; shared by every grammar builder.
///
/// Adjacent text parts are merged. Empty markup without a substitute is
/// dropped since it contributes to neither side.
#[derive(Debug, Default)]
pub struct AnnotatedTextBuilder {
    /// Parts collected so far.
    parts: Vec<Part>,
}

impl AnnotatedTextBuilder {
    /// Append markup that is dropped from the plain text.
    pub fn add_markup(&mut self, markup: &str) {
        if markup.is_empty() {
            return;
        }
        self.parts.push(Part::Markup {
            markup: markup.to_string(),
            interpret_as: None,
        });
    }

    /// Append markup that reads as `interpret_as` in the plain text.
    ///
    /// An empty substitute is the same as plain markup.
    pub fn add_markup_as(&mut self, markup: &str, interpret_as: &str) {
        if interpret_as.is_empty() {
            self.add_markup(markup);
            return;
        }
        self.parts.push(Part::Markup {
            markup: markup.to_string(),
            interpret_as: Some(interpret_as.to_string()),
        });
    }

    /// Append natural-language text.
    pub fn add_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(Part::Text { text: last }) = self.parts.last_mut() {
            last.push_str(text);
            return;
        }
        self.parts.push(Part::Text { text: text.to_string() });
    }

    /// Finish building.
    pub fn build(self) -> AnnotatedText {
        return AnnotatedText::from_parts(self.parts);
    }

    /// Append every part of another annotated text.
    pub fn extend(&mut self, other: AnnotatedText) {
        for part in other.parts {
            match part {
                Part::Text { text } => self.add_text(&text),
                Part::Markup { markup, interpret_as } => {
                    self.add_markup_as(&markup, interpret_as.as_deref().unwrap_or(""));
                },
            }
        }
    }

    /// An empty builder.
    pub fn new() -> Self {
        return Self { parts: Vec::new() };
    }

    /// The plain text emitted so far.
    pub fn plain_text(&self) -> String {
        return self.parts.iter().map(Part::plain).collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AnnotatedText {
        let mut builder = AnnotatedTextBuilder::new();
        builder.add_text("a ");
        builder.add_markup("\\textbf{");
        builder.add_text("b");
        builder.add_markup("}");
        builder.add_markup_as("$x$", "Dummy0");
        builder.add_text(".");
        return builder.build();
    }

    #[test]
    fn plain_and_source_reconstruct() {
        let text = sample();
        assert_eq!(text.plain_text(), "a bDummy0.");
        assert_eq!(text.source_text(), "a \\textbf{b}$x$.");
        assert_eq!(text.source_len(), 16);
    }

    #[test]
    fn adjacent_text_parts_merge() {
        let mut builder = AnnotatedTextBuilder::new();
        builder.add_text("ab");
        builder.add_text("c");
        builder.add_markup("");
        assert_eq!(builder.build().parts().len(), 1);
    }

    #[test]
    fn start_and_end_bracket_a_word_tightly() {
        let text = sample();
        assert_eq!(text.source_range(2..3), 10..11);
        assert_eq!(text.source_range(0..1), 0..1);
    }

    #[test]
    fn substituted_span_maps_to_whole_markup() {
        let text = sample();
        assert_eq!(text.source_range(3..9), 12..15);
        assert_eq!(text.source_position(9, Bound::Start), 15);
    }

    #[test]
    fn offsets_past_the_end_clamp() {
        let text = sample();
        assert_eq!(text.source_position(100, Bound::Start), 16);
        assert_eq!(text.source_position(100, Bound::End), 16);
    }

    #[test]
    fn empty_range_never_inverts() {
        let text = sample();
        let range = text.source_range(3..3);
        assert!(range.start <= range.end);
    }

    #[test]
    fn mapping_is_monotonic() {
        let text = sample();
        let plain_len = text.plain_text().len();
        let mut last = 0;
        for pos in 0..=plain_len {
            let mapped = text.source_position(pos, Bound::Start);
            assert!(mapped >= last, "{pos} mapped to {mapped} after {last}");
            last = mapped;
        }
    }

    #[test]
    fn inverse_maps_source_back_to_plain() {
        let text = sample();
        let inverse = text.invert();
        assert_eq!(inverse.source_text(), text.plain_text());
        assert_eq!(inverse.plain_text(), text.source_text());
        // "b" sits at source 10..11 and plain 2..3
        assert_eq!(inverse.source_range(10..11), 2..3);
        for pos in [0, 1, 10, 15] {
            let plain = inverse.source_position(pos, Bound::Start);
            assert_eq!(text.source_position(plain, Bound::Start), pos);
        }
    }

    #[test]
    fn serializes_to_annotation_json() {
        let json = serde_json::to_string(sample().parts()).unwrap();
        assert!(json.starts_with(r#"[{"text":"a "},{"markup":"\\textbf{"}"#));
        assert!(json.contains(r#"{"markup":"$x$","interpretAs":"Dummy0"}"#));
    }
}
