//! reStructuredText.
//!
//! Explicit markup blocks (comments, footnotes, directives) and tables are
//! tracked per block; literal blocks and code directives are markup as a
//! whole. Inline literals, interpreted text, targets, and references become
//! placeholders.

use std::sync::LazyLock;

use regex::Regex;

use super::cursor::Cursor;
use crate::annotated::AnnotatedText;
use crate::dummy::DummyGenerator;
use crate::error::Error;
use crate::settings::Settings;

/// Blank lines between blocks.
static BLOCK_SEPARATOR: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(r"^(?:[ \t]*\r?\n)+").expect("valid regex");
});

/// Leading blanks of a line.
static INDENTATION: LazyLock<Regex> = LazyLock::new(|| return Regex::new(r"^[ \t]*").expect("valid regex"));

/// `.. [1]`, `.. [#]`, `.. [*]`, `.. [#label]`.
static FOOTNOTE: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(r"^\.\. \[(?:[0-9]+|[#*]|#[0-9A-Za-z\-_.:+]+)\](?:[ \t\r\n]|$)").expect("valid regex");
});

/// `.. name::` of a directive whose body is code, math, or raw output.
static VERBATIM_DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(r"^\.\. (?:code|code-block|sourcecode|highlight|literalinclude|math|raw)::(?:[ \t\r\n]|$)")
        .expect("valid regex");
});

/// `.. name::`.
static DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(r"^\.\. [0-9A-Za-z\-_.:+]+::(?:[ \t\r\n]|$)").expect("valid regex");
});

/// `..` followed by a blank.
static COMMENT: LazyLock<Regex> = LazyLock::new(|| return Regex::new(r"^\.\.(?:[ \t\r\n]|$)").expect("valid regex"));

/// Top border of a grid table.
static GRID_TABLE_START: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(r"^(?:\+-{3,}){2,}\+\r?\n").expect("valid regex");
});

/// Top border of a simple table.
static SIMPLE_TABLE_START: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(r"^={3,}(?: +={3,})+\r?\n").expect("valid regex");
});

/// Section title over- or underline.
static SECTION_ADORNMENT: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(r#"^(?:={3,}|-{3,}|`{3,}|:{3,}|\.{3,}|'{3,}|"{3,}|~{3,}|\^{3,}|_{3,}|\*{3,}|\+{3,}|#{3,})\r?\n"#).expect("valid regex");
});

/// Line block bar.
static LINE_BLOCK: LazyLock<Regex> = LazyLock::new(|| return Regex::new(r"^\|[ \t]+").expect("valid regex"));

/// Bullet list marker.
static BULLET: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new("^[*+\\-\u{2022}\u{2023}\u{2043}][ \t]+").expect("valid regex");
});

/// Enumerated list marker.
static ENUMERATOR: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(r"^(?:(?:[0-9]+|[A-Za-z#]|[IVXLCDM]+|[ivxlcdm]+)\.|\(?(?:[0-9]+|[A-Za-z#]|[IVXLCDM]+|[ivxlcdm]+)\))[ \t]+").expect("valid regex");
});

/// Strong emphasis delimiter.
static STRONG_EMPHASIS: LazyLock<Regex> = LazyLock::new(|| return Regex::new(r"^\*\*").expect("valid regex"));

/// Emphasis delimiter.
static EMPHASIS: LazyLock<Regex> = LazyLock::new(|| return Regex::new(r"^\*").expect("valid regex"));

/// Inline literal delimiter.
static INLINE_LITERAL: LazyLock<Regex> = LazyLock::new(|| return Regex::new(r"^``").expect("valid regex"));

/// Interpreted text start, with an optional role.
static INTERPRETED_START: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(r"^(?::[0-9A-Za-z\-_.:+]+:)?`").expect("valid regex");
});

/// Interpreted text end, with an optional role.
static INTERPRETED_END: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(r"^`(?::[0-9A-Za-z\-_.:+]+:)?").expect("valid regex");
});

/// Inline internal target start.
static TARGET_START: LazyLock<Regex> = LazyLock::new(|| return Regex::new(r"^_`").expect("valid regex"));

/// Inline internal target end.
static TARGET_END: LazyLock<Regex> = LazyLock::new(|| return Regex::new(r"^`").expect("valid regex"));

/// Footnote or citation reference start.
static FOOTNOTE_REFERENCE_START: LazyLock<Regex> = LazyLock::new(|| return Regex::new(r"^\[").expect("valid regex"));

/// Footnote or citation reference end.
static FOOTNOTE_REFERENCE_END: LazyLock<Regex> = LazyLock::new(|| return Regex::new(r"^\]_").expect("valid regex"));

/// Hyperlink reference start.
static HYPERLINK_REFERENCE_START: LazyLock<Regex> = LazyLock::new(|| return Regex::new(r"^`").expect("valid regex"));

/// Hyperlink reference end, named or anonymous.
static HYPERLINK_REFERENCE_END: LazyLock<Regex> = LazyLock::new(|| return Regex::new(r"^`__?").expect("valid regex"));

/// Kind of the block the cursor is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockType {
    /// `..` comment, also citations, targets, and substitutions.
    Comment,
    /// `.. name::` directive body.
    Directive,
    /// `.. [1]` footnote body.
    Footnote,
    /// `+---+---+` table.
    GridTable,
    /// Indented block after a paragraph ending in `::`.
    Literal,
    /// Ordinary text.
    Paragraph,
    /// `=== ===` table.
    SimpleTable,
}

impl BlockType {
    /// Blocks introduced by `..`.
    const fn is_explicit(self) -> bool {
        return matches!(self, Self::Footnote | Self::Directive | Self::Comment);
    }

    /// Table blocks.
    const fn is_table(self) -> bool {
        return matches!(self, Self::GridTable | Self::SimpleTable);
    }
}

/// Characters that may precede inline markup start.
fn may_precede_start(ch: char) -> bool {
    return matches!(ch, ' ' | '\t' | '\r' | '\n' | '-' | ':' | '/' | '\'' | '"' | '<' | '(' | '[' | '{');
}

/// Characters that may follow inline markup end.
fn may_follow_end(ch: char) -> bool {
    return matches!(
        ch,
        ' ' | '\t' | '\r' | '\n' | '-' | '.' | ',' | ':' | ';' | '!' | '?' | '\\' | '/' | '\'' | '"' | ')' | ']' | '}' | '>'
    );
}

/// reStructuredText transducer state.
struct Builder<'a> {
    /// Current block.
    block_type: BlockType,
    /// Cursor over the code.
    cursor: Cursor<'a>,
    /// Placeholders generated so far.
    dummies: usize,
    /// Inside an inline element whose contents are replaced.
    in_ignored_markup: bool,
    /// Indentation of the current line, if a line has started.
    indentation: Option<usize>,
    /// Natural language, for placeholders.
    language: &'a str,
    /// Indentation of the previous line.
    last_indentation: Option<usize>,
    /// Indentation the current literal block must stay deeper than.
    literal_indentation: usize,
    /// Indentation of the line that ended in `::`, until the next line starts.
    literal_marker: Option<usize>,
}

impl Builder<'_> {
    /// Next placeholder word.
    fn dummy(&mut self) -> String {
        let dummy = DummyGenerator::SINGULAR.generate(self.language, self.dummies, false);
        self.dummies = self.dummies.saturating_add(1);
        return dummy;
    }

    /// Consume an inline element or one character.
    fn inline_element(&mut self) {
        if !self.in_ignored_markup && self.literal_block_marker() {
            return;
        }
        if let Some(len) = self
            .inline_start(&STRONG_EMPHASIS)
            .or_else(|| return self.inline_end(&STRONG_EMPHASIS))
            .or_else(|| return self.inline_start(&EMPHASIS))
            .or_else(|| return self.inline_end(&EMPHASIS))
        {
            self.cursor.markup(len);
            return;
        }

        let pairs: [(&Regex, &Regex); 5] = [
            (&INLINE_LITERAL, &INLINE_LITERAL),
            (&INTERPRETED_START, &INTERPRETED_END),
            (&TARGET_START, &TARGET_END),
            (&FOOTNOTE_REFERENCE_START, &FOOTNOTE_REFERENCE_END),
            (&HYPERLINK_REFERENCE_START, &HYPERLINK_REFERENCE_END),
        ];
        for (start, end) in pairs {
            if let Some(len) = self.inline_start(start) {
                let dummy = self.dummy();
                self.cursor.markup_as(len, &dummy);
                self.in_ignored_markup = true;
                return;
            }
            if let Some(len) = self.inline_end(end) {
                self.cursor.markup(len);
                self.in_ignored_markup = false;
                return;
            }
        }

        let len = self.cursor.current_len();
        if self.in_ignored_markup {
            self.cursor.markup(len);
        } else {
            self.cursor.text(len);
        }
    }

    /// Inline markup end of `regex` at the cursor.
    fn inline_end(&self, regex: &Regex) -> Option<usize> {
        if self.cursor.previous().is_none_or(char::is_whitespace) {
            return None;
        }
        let found = self.cursor.match_here(regex)?;
        let following = self.cursor.rest().get(found.len()..).and_then(|after| return after.chars().next());
        if following.is_some_and(|ch| return !may_follow_end(ch)) {
            return None;
        }
        return Some(found.len());
    }

    /// Inline markup start of `regex` at the cursor.
    fn inline_start(&self, regex: &Regex) -> Option<usize> {
        let previous = self.cursor.previous();
        if previous.is_some_and(|ch| return !may_precede_start(ch)) {
            return None;
        }
        let found = self.cursor.match_here(regex)?;
        let Some(previous) = previous else {
            return Some(found.len());
        };
        if self.cursor.peek(1).is_none() {
            return Some(found.len());
        }
        let following = self.cursor.rest().get(found.len()..).and_then(|after| return after.chars().next());
        if following.is_none_or(char::is_whitespace) {
            return None;
        }
        let forbidden = match previous {
            '\'' => '\'',
            '"' => '"',
            '<' => '>',
            '(' => ')',
            '[' => ']',
            '{' => '}',
            _ => return Some(found.len()),
        };
        if self.cursor.peek(1) == Some(forbidden) {
            return None;
        }
        return Some(found.len());
    }

    /// Whether a block starting here ends the previous explicit block.
    fn is_paragraph(&self) -> bool {
        let dedented = match (self.indentation, self.last_indentation) {
            (Some(0), _) => true,
            (Some(current), Some(last)) => current < last,
            _ => false,
        };
        return (self.block_type.is_explicit() && dedented) || self.block_type.is_table();
    }

    /// `| ` at the start of a line block line, unless the line holds only bars.
    fn line_block_marker(&self) -> Option<usize> {
        let marker = self.cursor.match_here(&LINE_BLOCK)?;
        let rest = self.cursor.rest().get(marker.len()..)?;
        let line = rest.split(['\r', '\n']).next().unwrap_or("");
        if line.is_empty() || line.ends_with('|') {
            return None;
        }
        return Some(marker.len());
    }

    /// `::` at the end of a line, announcing a literal block. Reads as `:`
    /// after a word and as nothing after a blank. Returns `false` if absent.
    fn literal_block_marker(&mut self) -> bool {
        let Some(after) = self.cursor.rest().strip_prefix("::") else {
            return false;
        };
        if !(after.is_empty() || after.starts_with('\n') || after.starts_with("\r\n")) {
            return false;
        }
        if self.cursor.previous().is_some_and(|ch| return !ch.is_whitespace()) {
            self.cursor.text(1);
            self.cursor.markup(1);
        } else {
            self.cursor.markup(2);
        }
        self.literal_marker = Some(self.indentation.unwrap_or(0));
        return true;
    }

    /// Blank lines separating blocks read as one newline.
    fn start_of_block(&mut self) -> bool {
        if let Some(separator) = self.cursor.match_here(&BLOCK_SEPARATOR) {
            self.cursor.markup_as(separator.len(), "\n");
            return true;
        }
        return self.cursor.pos() == 0;
    }

    /// Block-introducing markup at the start of a line.
    fn start_of_line(&mut self) -> bool {
        let block_starts: [(&Regex, BlockType); 6] = [
            (&FOOTNOTE, BlockType::Footnote),
            (&VERBATIM_DIRECTIVE, BlockType::Comment),
            (&DIRECTIVE, BlockType::Directive),
            (&COMMENT, BlockType::Comment),
            (&GRID_TABLE_START, BlockType::GridTable),
            (&SIMPLE_TABLE_START, BlockType::SimpleTable),
        ];
        for (regex, block_type) in block_starts {
            if let Some(found) = self.cursor.match_here(regex) {
                self.block_type = block_type;
                self.cursor.markup(found.len());
                return true;
            }
        }
        if let Some(found) = self.cursor.match_here(&SECTION_ADORNMENT) {
            self.cursor.markup(found.len());
            return true;
        }
        if let Some(found) = self.line_block_marker() {
            self.cursor.markup(found);
            return true;
        }
        for regex in [&*BULLET, &*ENUMERATOR] {
            if let Some(found) = self.cursor.match_here(regex) {
                self.cursor.markup(found.len());
                return true;
            }
        }
        return false;
    }

    /// Consume one step.
    fn step(&mut self) {
        let at_line_start = self.cursor.is_start_of_line();
        let mut is_start_of_block = false;
        if at_line_start {
            is_start_of_block = self.start_of_block();
            let indentation = self.cursor.match_here(&INDENTATION).map_or(0, str::len);
            self.last_indentation = self.indentation;
            self.indentation = Some(indentation);
            self.cursor.markup(indentation);
            if self.cursor.at_end() {
                return;
            }
        }
        if is_start_of_block {
            self.in_ignored_markup = false;
            if self.is_paragraph() {
                self.block_type = BlockType::Paragraph;
            }
        }
        if at_line_start {
            self.update_literal_block(is_start_of_block);
        }

        if at_line_start && self.block_type != BlockType::Literal && self.start_of_line() {
            return;
        }
        if matches!(
            self.block_type,
            BlockType::Comment | BlockType::GridTable | BlockType::SimpleTable | BlockType::Literal
        ) {
            let len = self.cursor.current_len();
            self.cursor.markup(len);
        } else {
            self.inline_element();
        }
    }

    /// Enter a literal block on the first deeper-indented block after a `::`
    /// line, and leave it on the first line back at the original indentation.
    fn update_literal_block(&mut self, is_start_of_block: bool) {
        let indentation = self.indentation.unwrap_or(0);
        if self.block_type == BlockType::Literal && indentation <= self.literal_indentation {
            self.block_type = BlockType::Paragraph;
        }
        if let Some(base) = self.literal_marker.take() {
            if is_start_of_block && indentation > base {
                self.block_type = BlockType::Literal;
                self.literal_indentation = base;
            }
        }
    }
}

/// Build the annotated text of reStructuredText `code`.
///
/// # Errors
///
/// Returns `Error::ParserStall` if `strict` is set and the builder stalls.
pub fn build(code: &str, settings: &Settings, strict: bool) -> Result<AnnotatedText, Error> {
    let mut builder = Builder {
        cursor: Cursor::new(code, "restructuredtext", strict),
        indentation: None,
        last_indentation: None,
        block_type: BlockType::Paragraph,
        in_ignored_markup: false,
        literal_marker: None,
        literal_indentation: 0,
        language: &settings.language_short_code,
        dummies: 0,
    };
    while !builder.cursor.at_end() {
        let last = builder.cursor.pos();
        builder.step();
        builder.cursor.guard(last)?;
    }
    let text = builder.cursor.finish();
    tracing::trace!(parts = ?text.parts(), "built annotated text");
    return Ok(text);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(code: &str) -> String {
        return build(code, &Settings::default(), true).unwrap().plain_text().to_string();
    }

    #[test]
    fn citations_are_comments() {
        let code = concat!(
            "This is a test.\n\n",
            ".. [CIT2002] Citations are text-labeled footnotes. They may be\n",
            "rendered separately and differently from footnotes.\n\n",
            "This is another test.\n",
        );
        assert_eq!(plain(code), "This is a test.\n\n\nThis is another test.\n");
    }

    #[test]
    fn directive_arguments_are_text() {
        let code = concat!(
            "This is a test.\n\n",
            ".. image:: images/title.png\n",
            "   :target: directives_\n\n",
            "This is another test.\n",
        );
        assert_eq!(
            plain(code),
            "This is a test.\n\nimages/title.png\n:target: directives_\n\nThis is another test.\n"
        );
    }

    #[test]
    fn section_adornments_are_markup() {
        let code = "Title\n=====\n\nA paragraph.\n\n----------\nSubtitle\n----------\n";
        assert_eq!(plain(code), "Title\n\nA paragraph.\n\nSubtitle\n");
    }

    #[test]
    fn simple_tables_are_markup() {
        let code = concat!(
            "This is a test.\n\n",
            "=====  =====\n",
            "A      B\n",
            "=====  =====\n",
            "True   False\n",
            "=====  =====\n\n",
            "This is another test.\n",
        );
        assert_eq!(plain(code), "This is a test.\n\n\nThis is another test.\n");
    }

    #[test]
    fn literal_blocks_are_markup() {
        assert_eq!(plain("::\n\n    literal block\n"), "\n\n");
        assert_eq!(plain("Paragraph::\n\n    code\n\n    more code\n\nAfter.\n"), "Paragraph:\n\n\n\nAfter.\n");
        assert_eq!(plain("Paragraph ::\n\n    code\n"), "Paragraph \n\n");
    }

    #[test]
    fn literal_block_needs_blank_line_and_indentation() {
        assert_eq!(plain("Ends with::\nnext line.\n"), "Ends with:\nnext line.\n");
        assert_eq!(plain("Text::\n\nNot literal.\n"), "Text:\n\nNot literal.\n");
    }

    #[test]
    fn code_directives_are_markup() {
        let code = "Text.\n\n.. code-block:: rust\n\n   let x = 1;\n\nAfter.\n";
        assert_eq!(plain(code), "Text.\n\n\n\nAfter.\n");
    }

    #[test]
    fn list_markers_are_markup() {
        assert_eq!(plain("- A bullet list\n  + Nested item.\n"), "A bullet list\nNested item.\n");
        assert_eq!(plain("1. Arabic.\n   a) lower\n"), "Arabic.\nlower\n");
    }

    #[test]
    fn inline_markup() {
        let code = "Some *emphasis*, **strong**, ``literal`` and :PEP:`287` or `Title` ([1]_).\n";
        assert_eq!(plain(code), "Some emphasis, strong, Dummy0 and Dummy1 or Dummy2 (Dummy3).\n");
    }

    #[test]
    fn quoted_star_is_not_emphasis_start() {
        assert_eq!(plain("with a \"*\" label.\n"), "with a \"\" label.\n");
    }

    #[test]
    fn french_placeholders() {
        let text = build("Le ``code`` ici.\n", &Settings::default().with_language("fr"), true).unwrap();
        assert_eq!(text.plain_text(), "Le Jimmy-0 ici.\n");
    }
}
