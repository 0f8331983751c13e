//! AsciiDoc.
//!
//! Line-level syntax (section titles, attribute lists, list markers,
//! includes, block macros, comments) is markup, and so are listing, literal,
//! passthrough, and comment blocks as a whole. Inline formatting marks are tracked on
//! a stack; monospace spans collapse into one placeholder. Typographic
//! replacements and entities read as the characters they produce.

use std::sync::LazyLock;

use regex::Regex;

use super::cursor::Cursor;
use super::html::decode_entity;
use crate::annotated::AnnotatedText;
use crate::dummy::DummyGenerator;
use crate::error::Error;
use crate::settings::Settings;

/// Leading blanks of a line.
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| return Regex::new(r"^[ \t]*").expect("valid regex"));

/// Opening line of a block whose contents are not prose: `----` listing,
/// `....` literal, `++++` passthrough, `////` comment, or a fenced code block.
static VERBATIM_DELIMITER: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(r"(?mR)\A(?:(?P<fence>-{4,}|\.{4,}|\+{4,}|/{4,})[ \t]*|(?P<code>```)[^\r\n]*)$").expect("valid regex");
});

/// Delimiter line of a block whose contents are checked: example, sidebar,
/// quote, or open block.
static COMPOUND_DELIMITER: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r"(?mR)\A(?:={4,}|\*{4,}|_{4,}|--)[ \t]*$").expect("valid regex"));

/// `// comment` with its line break.
static LINE_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r"\A//(?:[^/\r\n][^\r\n]*)?(?:\r?\n|\z)").expect("valid regex"));

/// `[attributes]` on a line of its own.
static ATTRIBUTE_LIST: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r"(?mR)\A\[[^\r\n]*\]$").expect("valid regex"));

/// `<scheme:target>`.
static LINK_ANGLE_BRACKET: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r"^<([A-Za-z]+:[^>]*?)>").expect("valid regex"));

/// `scheme:target[text]`.
static LINK_MACRO: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(
        r#"^(?P<link>(?:http|https|ftp|irc|link|mailto|xref):[^\]]*?)\[(?:(?P<text1>[^,\]]+?)|"(?P<text2>[^"\]]+?)")\^?(?:,[^\]]*)?\]"#,
    )
    .expect("valid regex");
});

/// `<<target,text>>`.
static CROSS_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r"^<<([^\r\n]+?)>>").expect("valid regex"));

/// `[[id]]` or `[#id]`.
static ANCHOR: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(r"^(?:\[\[[A-Z_a-z:][A-Z_a-z:\-.0-9]+?\]\]|\[#[A-Z_a-z:][A-Z_a-z:\-.0-9]+?\])")
        .expect("valid regex");
});

/// `:name:` in the document header.
static DOCUMENT_HEADER_ATTRIBUTE_ENTRY: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r"^:[A-Za-z-]+:[ \t]*").expect("valid regex"));

/// `== Title`.
static SECTION_TITLE: LazyLock<Regex> = LazyLock::new(|| return Regex::new(r"^={1,6}[ \t]+").expect("valid regex"));

/// `include::path[]`.
static INCLUDE: LazyLock<Regex> = LazyLock::new(|| return Regex::new(r"^include::[^\r\n]*").expect("valid regex"));

/// Bullet, checkbox, or number of a list item.
static LIST_ITEM: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(r"^(?:(?:\*+|-|\.+)(?:[ \t]+\[[*x ]\])?|[0-9]+\.)[ \t]+").expect("valid regex");
});

/// `term::` with the blanks after it.
static DESCRIPTION_LIST_ITEM: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(r"^(?P<term>[^\r\n]*?)(?P<separator>::+)(?:(?P<space>[ \t]+)|\r?\n)").expect("valid regex");
});

/// `image::target[]` and `video::target[]`.
static BLOCK_IMAGE_VIDEO: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r"^(?:image|video)::[^\r\n]*").expect("valid regex"));

/// `image:target[]`.
static INLINE_IMAGE: LazyLock<Regex> = LazyLock::new(|| return Regex::new(r"^image:[^\[]+\[[^\]]*\]").expect("valid regex"));

/// `kbd:[keys]`, `btn:[label]`, `menu:name[items]`.
static KEYBOARD_BUTTON_MENU_MACRO: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r"^(?:kbd:|btn:|menu:[A-Za-z]+)\[[^\]]+\]").expect("valid regex"));

/// Constrained mark, with optional attributes, that may open formatting.
static CONSTRAINED_OPENING_MARK: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r"^(?:\[[^\r\n]*?\])?([*_`#])").expect("valid regex"));

/// Constrained mark that may close formatting.
static CONSTRAINED_CLOSING_MARK: LazyLock<Regex> = LazyLock::new(|| return Regex::new(r"^([*_`#])").expect("valid regex"));

/// Unconstrained mark, with optional attributes.
static UNCONSTRAINED_MARK: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r"^(?:\[[^\r\n]*?\])?(\*\*|__|``|##|[~^])").expect("valid regex"));

/// Typographic replacement sequences.
static TEXT_REPLACEMENT: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(r#"^(?:'`|`'|"`|`"|\\?'|\((?:C|R|TM)\)|--| -- |\.\.\.|->|=>|<-|<=)"#).expect("valid regex");
});

/// Character reference.
static ENTITY: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r"^&(?:#[0-9]+|#x[0-9A-Fa-f]+|[0-9A-Za-z]+);").expect("valid regex"));

/// Inline formatting spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Formatting {
    /// `*bold*`.
    ConstrainedBold,
    /// `#highlight#`.
    ConstrainedHighlight,
    /// `_italic_`.
    ConstrainedItalic,
    /// `` `monospace` ``.
    ConstrainedMonospace,
    /// `~subscript~`.
    Subscript,
    /// `^superscript^`.
    Superscript,
    /// `**bold**`.
    UnconstrainedBold,
    /// `##highlight##`.
    UnconstrainedHighlight,
    /// `__italic__`.
    UnconstrainedItalic,
    /// ``` ``monospace`` ```.
    UnconstrainedMonospace,
}

impl Formatting {
    /// The span a mark toggles.
    fn for_mark(mark: &str) -> Option<Self> {
        return match mark {
            "*" => Some(Self::ConstrainedBold),
            "_" => Some(Self::ConstrainedItalic),
            "`" => Some(Self::ConstrainedMonospace),
            "#" => Some(Self::ConstrainedHighlight),
            "**" => Some(Self::UnconstrainedBold),
            "__" => Some(Self::UnconstrainedItalic),
            "``" => Some(Self::UnconstrainedMonospace),
            "##" => Some(Self::UnconstrainedHighlight),
            "~" => Some(Self::Subscript),
            "^" => Some(Self::Superscript),
            _ => None,
        };
    }

    /// Spans hidden behind one placeholder.
    const fn is_monospace(self) -> bool {
        return matches!(self, Self::ConstrainedMonospace | Self::UnconstrainedMonospace);
    }
}

/// Letters and digits that make a replacement apply.
const fn is_word_character(ch: char) -> bool {
    return ch.is_ascii_alphanumeric();
}

/// Blank characters around constrained marks.
const fn is_blank(ch: char) -> bool {
    return matches!(ch, ' ' | '\t' | '\r' | '\n');
}

/// AsciiDoc transducer state.
struct Builder<'a> {
    /// Cursor over the code.
    cursor: Cursor<'a>,
    /// Placeholders generated so far.
    dummies: usize,
    /// Open formatting spans.
    formatting: Vec<Formatting>,
    /// Whether no blank line has been seen yet.
    in_document_header: bool,
    /// Natural language, for placeholders.
    language: &'a str,
}

impl Builder<'_> {
    /// Whether a word character precedes the cursor and follows `len` bytes later.
    fn between_words(&self, len: usize) -> bool {
        let following = self.cursor.rest().get(len..).and_then(|after| return after.chars().next());
        return self.cursor.previous().is_some_and(is_word_character) && following.is_some_and(is_word_character);
    }

    /// Constrained mark after a non-blank, before a blank or punctuation.
    fn constrained_closing(&self) -> Option<regex::Captures<'_>> {
        if self.cursor.previous().is_none_or(is_blank) {
            return None;
        }
        let captures = self.cursor.captures_here(&CONSTRAINED_CLOSING_MARK)?;
        let len = captures.get(0)?.len();
        let following = self.cursor.rest().get(len..).and_then(|after| return after.chars().next());
        let closes = following.is_none_or(|ch| {
            return is_blank(ch) || matches!(ch, '*' | '_' | '`' | '#' | '~' | '^' | ',' | ';' | '"' | '.' | '?' | '!');
        });
        return closes.then_some(captures);
    }

    /// Constrained mark after a blank or another mark, before a non-blank.
    fn constrained_opening(&self) -> Option<regex::Captures<'_>> {
        if self
            .cursor
            .previous()
            .is_some_and(|ch| return !is_blank(ch) && !matches!(ch, '*' | '_' | '`' | '#' | '~' | '^'))
        {
            return None;
        }
        let captures = self.cursor.captures_here(&CONSTRAINED_OPENING_MARK)?;
        let len = captures.get(0)?.len();
        let rest = self.cursor.rest();
        let following = rest.get(len..).and_then(|after| return after.chars().next());
        let is_last = rest.chars().nth(1).is_none();
        if self.cursor.pos() == 0 || is_last || following.is_some_and(|ch| return !is_blank(ch)) {
            return Some(captures);
        }
        return None;
    }

    /// Next placeholder word.
    fn dummy(&mut self) -> String {
        let dummy = DummyGenerator::SINGULAR.generate(self.language, self.dummies, false);
        self.dummies = self.dummies.saturating_add(1);
        return dummy;
    }

    /// Whether `--` directly follows a word and precedes a word or a line break.
    fn em_dash_applies(&self) -> bool {
        return self.between_words(2) || (self.cursor.previous().is_some_and(is_word_character) && self.line_break_at(2));
    }

    /// Consume a known character reference. Returns `false` otherwise.
    fn entity(&mut self) -> bool {
        let Some(reference) = self.cursor.match_here(&ENTITY) else {
            return false;
        };
        let Some(decoded) = decode_entity(reference) else {
            return false;
        };
        self.markup_as(reference.len(), &decoded);
        return true;
    }

    /// Length and mark of a formatting mark at the cursor.
    fn formatting_mark(&self) -> Option<(usize, &'static str)> {
        let captures = self
            .cursor
            .captures_here(&UNCONSTRAINED_MARK)
            .or_else(|| return self.constrained_opening())
            .or_else(|| return self.constrained_closing())?;
        let len = captures.get(0)?.len();
        let mark = captures.get(1)?.as_str();
        return ["*", "_", "`", "#", "**", "__", "``", "##", "~", "^"]
            .into_iter()
            .find(|known| return *known == mark)
            .map(|known| return (len, known));
    }

    /// Whether the cursor is inside a monospace span.
    fn in_monospace(&self) -> bool {
        return self.formatting.iter().any(|span| return span.is_monospace());
    }

    /// Consume one inline element or character.
    fn inline(&mut self) {
        if self.cursor.rest().starts_with(" +") && self.line_break_at(2) {
            self.cursor.markup(2);
            return;
        }
        if let Some(captures) = self.cursor.captures_here(&LINK_ANGLE_BRACKET) {
            let target = captures.get(1).map_or("", |target| return target.as_str());
            self.markup_as(captures.get(0).map_or(0, |whole| return whole.len()), target);
            return;
        }
        if let Some(captures) = self.cursor.captures_here(&LINK_MACRO) {
            let reading = ["text1", "text2", "link"]
                .into_iter()
                .filter_map(|name| return captures.name(name))
                .map(|group| return group.as_str())
                .find(|reading| return !reading.is_empty())
                .unwrap_or("");
            self.markup_as(captures.get(0).map_or(0, |whole| return whole.len()), reading);
            return;
        }
        if let Some(captures) = self.cursor.captures_here(&CROSS_REFERENCE) {
            let contents = captures.get(1).map_or("", |contents| return contents.as_str());
            let reading = match cross_reference_text(contents) {
                Some(text) => text.to_string(),
                None if contents.contains(|ch: char| return ch == ' ' || ch.is_ascii_uppercase()) => contents.to_string(),
                None => self.dummy(),
            };
            self.markup_as(captures.get(0).map_or(0, |whole| return whole.len()), &reading);
            return;
        }
        if let Some(anchor) = self.cursor.match_here(&ANCHOR) {
            self.cursor.markup(anchor.len());
            return;
        }
        if let Some(len) = [&*INLINE_IMAGE, &*KEYBOARD_BUTTON_MENU_MACRO]
            .into_iter()
            .find_map(|regex| return self.cursor.match_here(regex))
            .map(str::len)
        {
            self.placeholder(len);
            return;
        }
        if self.replacement() || self.entity() {
            return;
        }
        if let Some((len, mark)) = self.formatting_mark() {
            if let Some(span) = Formatting::for_mark(mark) {
                let closes_monospace = span.is_monospace() && self.formatting.last() == Some(&span);
                let reading = if closes_monospace { self.dummy() } else { String::new() };
                if self.formatting.last() == Some(&span) {
                    self.formatting.pop();
                } else {
                    self.formatting.push(span);
                }
                self.markup_as(len, &reading);
            } else {
                self.text(len);
            }
            return;
        }
        let len = self.cursor.current_len();
        self.text(len);
    }

    /// Whether `rest` continues with a line break after `offset` bytes.
    fn line_break_at(&self, offset: usize) -> bool {
        return self
            .cursor
            .rest()
            .get(offset..)
            .is_some_and(|after| return after.starts_with('\n') || after.starts_with("\r\n"));
    }

    /// `+` joining the next block to a list item.
    fn list_continuation(&self) -> Option<usize> {
        return (self.cursor.current() == Some('+') && self.line_break_at(1)).then_some(1);
    }

    /// List item marker followed by item text.
    fn list_item(&self) -> Option<usize> {
        let marker = self.cursor.match_here(&LIST_ITEM)?;
        let following = self.cursor.rest().get(marker.len()..).and_then(|after| return after.chars().next());
        return following.is_some_and(|ch| return !is_blank(ch)).then_some(marker.len());
    }

    /// `.` of a `.Title` line.
    fn list_title(&self) -> Option<usize> {
        let mut chars = self.cursor.rest().chars();
        return (chars.next() == Some('.') && chars.next().is_some_and(|ch| return ch.is_ascii_alphabetic())).then_some(1);
    }

    /// Consume `len` bytes as markup read as `interpret_as`, unless inside monospace.
    fn markup_as(&mut self, len: usize, interpret_as: &str) {
        if self.in_monospace() {
            self.cursor.markup(len);
        } else {
            self.cursor.markup_as(len, interpret_as);
        }
    }

    /// Consume `len` bytes as a placeholder.
    fn placeholder(&mut self, len: usize) {
        let dummy = self.dummy();
        self.markup_as(len, &dummy);
    }

    /// Consume a typographic replacement. Returns `false` if there is none.
    fn replacement(&mut self) -> bool {
        let Some(sequence) = self.cursor.match_here(&TEXT_REPLACEMENT) else {
            return false;
        };
        let reading = match sequence {
            "'`" => Some("\u{2018}"),
            "`'" => Some("\u{2019}"),
            "\"`" => Some("\u{201c}"),
            "`\"" => Some("\u{201d}"),
            "'" => self.between_words(1).then_some("\u{2019}"),
            "\\'" => Some("'"),
            "(C)" => Some("\u{a9}"),
            "(R)" => Some("\u{ae}"),
            "(TM)" => Some("\u{2122}"),
            "--" => self.em_dash_applies().then_some("\u{2014}"),
            " -- " => Some("\u{2009}\u{2014}\u{2009}"),
            "..." => Some("\u{2026}"),
            "->" => Some("\u{2192}"),
            "=>" => Some("\u{21d2}"),
            "<-" => Some("\u{2190}"),
            "<=" => Some("\u{21d0}"),
            _ => None,
        };
        let Some(reading) = reading else {
            return false;
        };
        self.markup_as(sequence.len(), reading);
        return true;
    }

    /// Consume line-level markup. Returns `false` if there is none.
    fn start_of_line(&mut self) -> bool {
        let mut line_markup = [&*ANCHOR, &*ATTRIBUTE_LIST].into_iter().find_map(|regex| return self.cursor.match_here(regex));
        if line_markup.is_none() && self.in_document_header {
            line_markup = self.cursor.match_here(&DOCUMENT_HEADER_ATTRIBUTE_ENTRY);
        }
        let line_markup = line_markup
            .or_else(|| return self.cursor.match_here(&SECTION_TITLE))
            .or_else(|| return self.cursor.match_here(&INCLUDE))
            .map(str::len)
            .or_else(|| return self.list_title())
            .or_else(|| return self.list_item())
            .or_else(|| return self.list_continuation());
        if let Some(len) = line_markup {
            self.cursor.markup(len);
            return true;
        }
        if let Some(captures) = self.cursor.captures_here(&DESCRIPTION_LIST_ITEM) {
            self.text(captures.name("term").map_or(0, |term| return term.len()));
            self.markup_as(captures.name("separator").map_or(0, |separator| return separator.len()), ":");
            if let Some(space) = captures.name("space") {
                self.markup_as(space.len(), " ");
            }
            return true;
        }
        if let Some(block) = self.cursor.match_here(&BLOCK_IMAGE_VIDEO) {
            self.cursor.markup(block.len());
            return true;
        }
        return false;
    }

    /// Consume one step.
    fn step(&mut self) {
        let at_line_start = self.cursor.is_start_of_line();
        if at_line_start {
            if self.line_break_at(0) {
                self.in_document_header = false;
            }
            let block = self
                .verbatim_block()
                .or_else(|| return self.cursor.match_here(&LINE_COMMENT).map(str::len))
                .or_else(|| return self.cursor.match_here(&COMPOUND_DELIMITER).map(str::len));
            if let Some(len) = block {
                self.cursor.markup(len);
                return;
            }
            let indentation = self.cursor.match_here(&WHITESPACE).map_or(0, str::len);
            self.cursor.markup(indentation);
            if self.cursor.at_end() {
                return;
            }
        }
        if !(at_line_start && self.start_of_line()) {
            self.inline();
        }
    }

    /// Consume `len` bytes as text, or as markup inside monospace.
    fn text(&mut self, len: usize) {
        if self.in_monospace() {
            self.cursor.markup(len);
        } else {
            self.cursor.text(len);
        }
    }

    /// Length of a verbatim block starting at the cursor, through its closing
    /// delimiter line. An unclosed block runs to the end of the code.
    fn verbatim_block(&self) -> Option<usize> {
        let captures = self.cursor.captures_here(&VERBATIM_DELIMITER)?;
        let opening = captures.get(0)?.len();
        let fence = captures.name("fence").or_else(|| return captures.name("code"))?.as_str();
        let rest = self.cursor.rest();
        let mut line_start = opening;
        while let Some(newline) = rest.get(line_start..).and_then(|after| return after.find('\n')) {
            line_start = line_start.saturating_add(newline).saturating_add(1);
            let line = rest.get(line_start..).unwrap_or("");
            let line = line.split('\n').next().unwrap_or("");
            let line = line.strip_suffix('\r').unwrap_or(line);
            if line.trim_end() == fence {
                return Some(line_start.saturating_add(line.len()));
            }
        }
        return Some(rest.len());
    }
}

/// Text of a `target,text` cross reference.
fn cross_reference_text(contents: &str) -> Option<&str> {
    return contents
        .char_indices()
        .skip(1)
        .filter(|(_, ch)| return *ch == ',')
        .map(|(index, _)| return contents.get(index.saturating_add(1)..).unwrap_or(""))
        .find(|text| return !text.is_empty());
}

/// Build the annotated text of AsciiDoc `code`.
///
/// # Errors
///
/// Returns `Error::ParserStall` if `strict` is set and the transducer stalls.
pub fn build(code: &str, settings: &Settings, strict: bool) -> Result<AnnotatedText, Error> {
    let mut builder = Builder {
        cursor: Cursor::new(code, "asciidoc", strict),
        formatting: Vec::new(),
        in_document_header: true,
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
    fn paragraphs() {
        assert_eq!(
            plain("Paragraph 1, line 1\nParagraph 1, line 2\n\nParagraph 2, line 1\n"),
            "Paragraph 1, line 1\nParagraph 1, line 2\n\nParagraph 2, line 1\n"
        );
        assert_eq!(plain("  Literal paragraph, line 1\n  Literal paragraph, line 2\n"), "Literal paragraph, line 1\nLiteral paragraph, line 2\n");
        assert_eq!(plain("Line 1 +\nLine 2\n"), "Line 1\nLine 2\n");
        assert_eq!(plain("[%hardbreaks]\nLine 1\nLine 2\n"), "\nLine 1\nLine 2\n");
    }

    #[test]
    fn links() {
        assert_eq!(plain("https://bsplines.org, <https://bsplines.org>\n"), "https://bsplines.org, https://bsplines.org\n");
        assert_eq!(plain("https://bsplines.org[abc], https://bsplines.org[abc^,123]\n"), "abc, abc\n");
        assert_eq!(
            plain("abc@example.com, mailto:abc@example.com[test], mailto:abc@example.com[test,123]\n"),
            "abc@example.com, test, test\n"
        );
        assert_eq!(plain("link:index.html[abc]\n"), "abc\n");
    }

    #[test]
    fn cross_references() {
        assert_eq!(plain("<<Test>>, <<test 123>>, <<test>>, <<test,123>>\n"), "Test, test 123, Dummy0, 123\n");
    }

    #[test]
    fn anchors_are_markup() {
        assert_eq!(plain("[[test]], [#test]\n"), ", \n");
    }

    #[test]
    fn document_header_attributes() {
        let code = "= Document Title\nFoo Bar <foobar@example.com>\nv1.0, 2001-02-03\n:toc:\n:homepage: https://bsplines.org\n:description: This is the description.\n\nThis is the body.\n";
        assert_eq!(
            plain(code),
            "Document Title\nFoo Bar <foobar@example.com>\nv1.0, 2001-02-03\n\nhttps://bsplines.org\nThis is the description.\n\nThis is the body.\n"
        );
    }

    #[test]
    fn attribute_entries_after_header_are_text() {
        assert_eq!(plain("Body.\n\n:toc: left\n"), "Body.\n\n:toc: left\n");
    }

    #[test]
    fn listing_blocks_are_markup() {
        assert_eq!(plain("Before.\n\n----\nfn main() {}\n----\n\nAfter.\n"), "Before.\n\n\n\nAfter.\n");
        assert_eq!(plain("----\nfn main() {}\n----"), "");
    }

    #[test]
    fn literal_blocks_are_markup() {
        assert_eq!(plain("Text.\n\n....\nkeep  this\n....\n"), "Text.\n\n\n");
    }

    #[test]
    fn passthrough_blocks_are_markup() {
        assert_eq!(plain("++++\n<b>raw</b>\n++++\nAfter.\n"), "\nAfter.\n");
    }

    #[test]
    fn fenced_code_blocks_are_markup() {
        assert_eq!(plain("```rust\nlet x = 1;\n```\nText.\n"), "\nText.\n");
    }

    #[test]
    fn block_comments_are_markup() {
        assert_eq!(plain("////\nA comment.\n////\nText.\n"), "\nText.\n");
    }

    #[test]
    fn line_comments_are_markup() {
        assert_eq!(plain("// a line comment"), "");
        assert_eq!(plain("Line 1\n// a comment\nLine 2\n"), "Line 1\nLine 2\n");
        assert_eq!(plain("/// not a comment\n"), "/// not a comment\n");
    }

    #[test]
    fn block_closes_only_at_the_same_delimiter() {
        assert_eq!(plain("------\na\n----\nb\n------\nText.\n"), "\nText.\n");
        assert_eq!(plain("Text.\n\n----\nnever closed\n"), "Text.\n\n");
    }

    #[test]
    fn compound_block_delimiters_are_markup() {
        assert_eq!(plain("====\nChecked.\n====\n"), "\nChecked.\n\n");
        assert_eq!(plain("****\nSidebar.\n****\n"), "\nSidebar.\n\n");
    }

    #[test]
    fn section_titles_and_includes() {
        assert_eq!(
            plain("= Section Title 1\n\n== Section Title 2\n\n=== Section Title 3\n"),
            "Section Title 1\n\nSection Title 2\n\nSection Title 3\n"
        );
        assert_eq!(
            plain("This is a test.\n\ninclude::index.html\n\nThis is another test.\n"),
            "This is a test.\n\n\n\nThis is another test.\n"
        );
    }

    #[test]
    fn lists() {
        for code in [
            ".Title\n* Test 1\n** Test 2\n*** Test 3\n",
            ".Title\n- Test 1\n- Test 2\n- Test 3\n",
            ".Title\n. Test 1\n.. Test 2\n... Test 3\n",
            ".Title\n1. Test 1\n2. Test 2\n3. Test 3\n",
        ] {
            assert_eq!(plain(code), "Title\nTest 1\nTest 2\nTest 3\n", "{code}");
        }
    }

    #[test]
    fn description_lists() {
        assert_eq!(plain("Test 1:: Foo\nTest 2::   Bar\n"), "Test 1: Foo\nTest 2: Bar\n");
        assert_eq!(plain("Test 1::\n- Foo\n- Bar\nTest 2::\n* Foobar\n"), "Test 1:\nFoo\nBar\nTest 2:\nFoobar\n");
    }

    #[test]
    fn images_videos_and_macros() {
        assert_eq!(plain("Test 1\n\nimage::https://example.com[foo]\n\nTest 2\n"), "Test 1\n\n\n\nTest 2\n");
        assert_eq!(plain("Test 1\n\nvideo::https://example.com[foo]\n\nTest 2\n"), "Test 1\n\n\n\nTest 2\n");
        assert_eq!(
            plain("This is image:foo.png[] the first sentence.\nThis is image:foo.png[title=\"bar\"] the second sentence.\n"),
            "This is Dummy0 the first sentence.\nThis is Dummy1 the second sentence.\n"
        );
        assert_eq!(plain("kbd:[F42], btn:[OK], menu:File[Open]\n"), "Dummy0, Dummy1, Dummy2\n");
    }

    #[test]
    fn text_formatting() {
        assert_eq!(
            plain("This is *bold*. This is _italic_ text. This is `monospace`.\nThis is a *_combination_*, and another `*_combination_*`.\n"),
            "This is bold. This is italic text. This is Dummy0.\nThis is a combination, and another Dummy1.\n"
        );
        assert_eq!(
            plain("This is **bo**ld. This is __ita__lic text. This is mono``space``.\nThis is a com**__bi__**nation, and other ``**__combination__**``s.\n"),
            "This is bold. This is italic text. This is monoDummy0.\nThis is a combination, and other Dummy1s.\n"
        );
        assert_eq!(
            plain("This is #highlight#, high##light##, and [.abc]#highlight#.\n"),
            "This is highlight, highlight, and highlight.\n"
        );
        assert_eq!(plain("This is ^super^script and sub~script~.\n"), "This is superscript and subscript.\n");
    }

    #[test]
    fn text_replacements() {
        assert_eq!(
            plain("These are '`single`' and \"`double`\" curved quotes. This is LTeX's problem.\nThis is ``list```'s size, a curved`' apostrophe, and a non-curved\\'s apostrophe.\n"),
            "These are \u{2018}single\u{2019} and \u{201c}double\u{201d} curved quotes. This is LTeX\u{2019}s problem.\nThis is Dummy0\u{2019}s size, a curved\u{2019} apostrophe, and a non-curved's apostrophe.\n"
        );
        assert_eq!(
            plain("(C), (R), (TM), abc--def, abc--\ndef, abc -- def, abc-- def, ..., ->, =>, <-, <=.\n"),
            "\u{a9}, \u{ae}, \u{2122}, abc\u{2014}def, abc\u{2014}\ndef, abc\u{2009}\u{2014}\u{2009}def, abc-- def, \u{2026}, \u{2192}, \u{21d2}, \u{2190}, \u{21d0}.\n"
        );
        assert_eq!(plain("&amp;, &auml;, &ldquo;, &#8220;, &#x201c;.\n"), "&, \u{e4}, \u{201c}, \u{201c}, \u{201c}.\n");
    }
}
