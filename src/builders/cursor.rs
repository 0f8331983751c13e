//! The left-to-right cursor shared by every character-driven builder.

use regex::{Captures, Regex};

use crate::annotated::{AnnotatedText, AnnotatedTextBuilder};
use crate::error::Error;

/// Position in one fragment's code plus the parts emitted so far.
///
/// Parts are always emitted as lengths of the code at the cursor, so the raw
/// spans of the result reconstruct the code exactly.
#[derive(Debug)]
pub struct Cursor<'a> {
    /// The fragment code.
    code: &'a str,
    /// Language id, for stall diagnostics.
    language_id: &'a str,
    /// Parts emitted so far.
    out: AnnotatedTextBuilder,
    /// Byte offset of the next unconsumed character.
    pos: usize,
    /// Whether a stall is an error instead of a warning.
    strict: bool,
}

impl<'a> Cursor<'a> {
    /// Whether every byte has been consumed.
    pub const fn at_end(&self) -> bool {
        return self.pos >= self.code.len();
    }

    /// Non-empty captures of an `^`-anchored regex at the cursor.
    pub fn captures_here(&self, regex: &Regex) -> Option<Captures<'a>> {
        return regex.captures(self.rest()).filter(|captures| {
            return captures.get(0).is_some_and(|whole| return whole.start() == 0 && !whole.as_str().is_empty());
        });
    }

    /// The whole code.
    pub const fn code(&self) -> &'a str {
        return self.code;
    }

    /// The character under the cursor.
    pub fn current(&self) -> Option<char> {
        return self.rest().chars().next();
    }

    /// Byte length of the character under the cursor (zero at the end).
    pub fn current_len(&self) -> usize {
        return self.current().map_or(0, char::len_utf8);
    }

    /// Finish, consuming any leftover code as markup.
    pub fn finish(mut self) -> AnnotatedText {
        let rest = self.rest().len();
        self.markup(rest);
        return self.out.build();
    }

    /// Check that a step advanced the cursor past `last`.
    ///
    /// A stalled step is an error in strict mode; otherwise the character under
    /// the cursor is consumed as markup so the loop moves on.
    ///
    /// # Errors
    ///
    /// Returns `Error::ParserStall` in strict mode when the cursor did not move.
    pub fn guard(&mut self, last: usize) -> Result<(), Error> {
        if self.pos > last || self.at_end() {
            return Ok(());
        }
        if self.strict {
            return Err(Error::ParserStall {
                language_id: self.language_id.to_string(),
                position: self.pos,
            });
        }
        tracing::warn!(language_id = self.language_id, position = self.pos, "prevented infinite loop in builder");
        let len = self.current_len();
        self.markup(len);
        return Ok(());
    }

    /// Emit a substitute without consuming code.
    pub fn interpret(&mut self, interpret_as: &str) {
        self.out.add_markup_as("", interpret_as);
    }

    /// Whether the cursor sits at the start of a line.
    pub fn is_start_of_line(&self) -> bool {
        return self.pos == 0 || self.previous() == Some('\n');
    }

    /// Consume `len` bytes as dropped markup.
    pub fn markup(&mut self, len: usize) {
        let span = self.take(len);
        self.out.add_markup(span);
    }

    /// Consume `len` bytes as markup read as `interpret_as`.
    pub fn markup_as(&mut self, len: usize, interpret_as: &str) {
        let span = self.take(len);
        self.out.add_markup_as(span, interpret_as);
    }

    /// Consume everything up to `end` (absolute) as dropped markup.
    pub fn markup_to(&mut self, end: usize) {
        self.markup(end.saturating_sub(self.pos));
    }

    /// Non-empty match of an `^`-anchored regex at the cursor.
    pub fn match_here(&self, regex: &Regex) -> Option<&'a str> {
        return regex
            .find(self.rest())
            .filter(|found| return found.start() == 0 && !found.as_str().is_empty())
            .map(|found| return found.as_str());
    }

    /// A cursor at the start of `code`.
    pub fn new(code: &'a str, language_id: &'a str, strict: bool) -> Self {
        return Self {
            code,
            pos: 0,
            out: AnnotatedTextBuilder::new(),
            language_id,
            strict,
        };
    }

    /// The character `n` characters after the cursor.
    pub fn peek(&self, n: usize) -> Option<char> {
        return self.rest().chars().nth(n);
    }

    /// Plain text emitted so far.
    pub fn plain_text(&self) -> String {
        return self.out.plain_text();
    }

    /// Byte offset of the cursor.
    pub const fn pos(&self) -> usize {
        return self.pos;
    }

    /// The character right before the cursor.
    pub fn previous(&self) -> Option<char> {
        return self.code.get(..self.pos).and_then(|before| return before.chars().next_back());
    }

    /// The unconsumed code.
    pub fn rest(&self) -> &'a str {
        return self.code.get(self.pos..).unwrap_or("");
    }

    /// Advance by `len` bytes, clamped to the code and to a char boundary.
    fn take(&mut self, len: usize) -> &'a str {
        let mut end = self.pos.saturating_add(len).min(self.code.len());
        while end < self.code.len() && !self.code.is_char_boundary(end) {
            end = end.saturating_add(1);
        }
        let span = self.code.get(self.pos..end).unwrap_or("");
        self.pos = end;
        return span;
    }

    /// Consume `len` bytes as text, returning them.
    pub fn text(&mut self, len: usize) -> &'a str {
        let span = self.take(len);
        self.out.add_text(span);
        return span;
    }

    /// Consume everything up to `end` (absolute) as text.
    pub fn text_to(&mut self, end: usize) {
        let len = end.saturating_sub(self.pos);
        self.text(len);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spans_reconstruct_code() {
        let mut cursor = Cursor::new("ab\\x{é}", "test", true);
        cursor.text(2);
        cursor.markup(3);
        cursor.markup_as(1, "·");
        let text = cursor.finish();
        assert_eq!(text.source_text(), "ab\\x{é}");
        assert_eq!(text.plain_text(), "ab·");
    }

    #[test]
    fn match_here_requires_anchor_and_content() {
        let cursor = Cursor::new("  x", "test", true);
        let blanks = Regex::new(r"^ *").unwrap();
        let letters = Regex::new(r"^[a-z]*").unwrap();
        assert_eq!(cursor.match_here(&blanks), Some("  "));
        assert_eq!(cursor.match_here(&letters), None);
    }

    #[test]
    fn strict_guard_reports_stall() {
        let mut cursor = Cursor::new("abc", "latex", true);
        let error = cursor.guard(0).unwrap_err();
        assert!(matches!(error, Error::ParserStall { position: 0, .. }));
    }

    #[test]
    fn lenient_guard_consumes_one_character() {
        let mut cursor = Cursor::new("é!", "latex", false);
        cursor.guard(0).unwrap();
        assert_eq!(cursor.pos(), 2);
    }
}
