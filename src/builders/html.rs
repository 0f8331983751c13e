//! HTML and XHTML.
//!
//! Tags, comments, declarations, and the bodies of `<script>` and `<style>`
//! are markup. Block-level start tags read as a paragraph break, `<br>` and
//! `<li>` as a line break. Whitespace runs collapse to a single space.

use std::sync::LazyLock;

use regex::Regex;

use super::cursor::Cursor;
use crate::annotated::AnnotatedText;
use crate::error::Error;

/// A start or end tag, with quoted attribute values.
static TAG: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(r#"^<(/?)([A-Za-z][A-Za-z0-9:_.-]*)(?:[^>"']|"[^"]*"|'[^']*')*?(/?)>"#).expect("valid regex");
});

/// A named or numeric character reference.
static ENTITY: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r"^&(?:#[0-9]+|#[xX][0-9A-Fa-f]+|[A-Za-z][A-Za-z0-9]*);").expect("valid regex"));

/// A run of spaces and line breaks.
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| return Regex::new(r"^(?: |\r?\n)+").expect("valid regex"));

/// Named character references, beyond the numeric forms.
const NAMED_ENTITIES: &[(&str, &str)] = &[
    ("Auml", "\u{c4}"),
    ("Ouml", "\u{d6}"),
    ("Uuml", "\u{dc}"),
    ("aacute", "\u{e1}"),
    ("agrave", "\u{e0}"),
    ("amp", "&"),
    ("apos", "'"),
    ("auml", "\u{e4}"),
    ("bdquo", "\u{201e}"),
    ("bull", "\u{2022}"),
    ("copy", "\u{a9}"),
    ("ccedil", "\u{e7}"),
    ("deg", "\u{b0}"),
    ("eacute", "\u{e9}"),
    ("ecirc", "\u{ea}"),
    ("egrave", "\u{e8}"),
    ("euro", "\u{20ac}"),
    ("gt", ">"),
    ("hellip", "\u{2026}"),
    ("laquo", "\u{ab}"),
    ("ldquo", "\u{201c}"),
    ("lsquo", "\u{2018}"),
    ("lt", "<"),
    ("mdash", "\u{2014}"),
    ("middot", "\u{b7}"),
    ("nbsp", "\u{a0}"),
    ("ndash", "\u{2013}"),
    ("ouml", "\u{f6}"),
    ("para", "\u{b6}"),
    ("quot", "\""),
    ("raquo", "\u{bb}"),
    ("rdquo", "\u{201d}"),
    ("reg", "\u{ae}"),
    ("rsquo", "\u{2019}"),
    ("sbquo", "\u{201a}"),
    ("sect", "\u{a7}"),
    ("shy", "\u{ad}"),
    ("szlig", "\u{df}"),
    ("thinsp", "\u{2009}"),
    ("times", "\u{d7}"),
    ("trade", "\u{2122}"),
    ("uuml", "\u{fc}"),
];

/// Start tags read as a paragraph break.
const BLOCK_ELEMENTS: &[&str] = &["body", "div", "h1", "h2", "h3", "h4", "h5", "h6", "p", "table", "tr"];

/// Decode a character reference such as `&amp;` or `&#x2013;`.
pub fn decode_entity(reference: &str) -> Option<String> {
    let name = reference.strip_prefix('&')?.strip_suffix(';')?;
    if let Some(number) = name.strip_prefix('#') {
        let code_point = match number.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => number.parse().ok()?,
        };
        return char::from_u32(code_point).map(String::from);
    }
    return NAMED_ENTITIES
        .iter()
        .find(|(entity, _)| return *entity == name)
        .map(|(_, character)| return (*character).to_string());
}

/// What a start tag reads as.
fn start_tag_reading(name: &str) -> &'static str {
    if BLOCK_ELEMENTS.contains(&name) {
        return "\n\n";
    }
    if name == "br" || name == "li" {
        return "\n";
    }
    return "";
}

/// HTML emitter tracking whether the plain text ends in whitespace.
struct Emitter<'a> {
    /// Cursor over the code.
    cursor: Cursor<'a>,
    /// Whether the last emitted text ended with a space or line break.
    last_space: bool,
}

impl Emitter<'_> {
    /// Record the end of emitted plain text.
    fn emitted(&mut self, plain: &str) {
        if let Some(last) = plain.chars().next_back() {
            self.last_space = matches!(last, ' ' | '\n' | '\r');
        }
    }

    /// Consume a character reference, as text when it is unknown.
    fn entity(&mut self, reference: &str) {
        let Some(decoded) = decode_entity(reference) else {
            self.text(reference.len());
            return;
        };
        self.markup_as(reference.len(), &decoded);
    }

    /// Consume `len` bytes as markup read as `interpret_as`.
    fn markup_as(&mut self, len: usize, interpret_as: &str) {
        self.cursor.markup_as(len, interpret_as);
        self.emitted(interpret_as);
    }

    /// Consume up to the end of the first `terminator` (or everything) as markup.
    fn markup_through(&mut self, terminator: &str) {
        let rest = self.cursor.rest();
        let len = rest
            .find(terminator)
            .map_or(rest.len(), |found| return found.saturating_add(terminator.len()));
        self.cursor.markup(len);
    }

    /// Consume a raw-text element body up to and including its end tag.
    fn raw_text_body(&mut self, name: &str) {
        let rest = self.cursor.rest();
        let closing = format!("</{name}");
        let body = rest.to_ascii_lowercase().find(&closing).unwrap_or(rest.len());
        self.cursor.markup(body);
        if let Some(tag) = self.cursor.match_here(&TAG) {
            self.cursor.markup(tag.len());
        }
    }

    /// Consume one token at the cursor.
    fn step(&mut self) {
        let rest = self.cursor.rest();
        if rest.starts_with("<!--") {
            self.markup_through("-->");
        } else if let Some(cdata) = rest.strip_prefix("<![CDATA[") {
            self.cursor.markup("<![CDATA[".len());
            let len = cdata.find("]]>").unwrap_or(cdata.len());
            self.text(len);
            self.markup_through("]]>");
        } else if rest.starts_with("<!") || rest.starts_with("<?") {
            self.markup_through(">");
        } else if let Some(captures) = self.cursor.captures_here(&TAG) {
            let len = captures.get(0).map_or(0, |whole| return whole.len());
            let closing = captures.get(1).is_some_and(|slash| return !slash.is_empty());
            let self_closing = captures.get(3).is_some_and(|slash| return !slash.is_empty());
            let name = captures
                .get(2)
                .map(|name| return name.as_str().to_ascii_lowercase())
                .unwrap_or_default();
            self.tag(len, closing, self_closing, &name);
        } else if let Some(reference) = self.cursor.match_here(&ENTITY) {
            self.entity(reference);
        } else if let Some(blanks) = self.cursor.match_here(&WHITESPACE) {
            let space = if self.last_space { "" } else { " " };
            self.markup_as(blanks.len(), space);
        } else {
            let len = rest
                .char_indices()
                .skip(1)
                .find(|(_, ch)| return matches!(ch, '<' | '&' | ' ' | '\r' | '\n'))
                .map_or(rest.len(), |(index, _)| return index);
            self.text(len);
        }
    }

    /// Handle one tag at the cursor.
    fn tag(&mut self, len: usize, closing: bool, self_closing: bool, name: &str) {
        if closing {
            self.cursor.markup(len);
            return;
        }
        self.markup_as(len, start_tag_reading(name));
        if !self_closing && (name == "script" || name == "style") {
            self.raw_text_body(name);
        }
    }

    /// Consume `len` bytes as text.
    fn text(&mut self, len: usize) {
        let text = self.cursor.text(len);
        self.emitted(text);
    }
}

/// Build the annotated text of HTML `code`.
///
/// # Errors
///
/// Returns `Error::ParserStall` if `strict` is set and the scanner stalls.
pub fn build(code: &str, strict: bool) -> Result<AnnotatedText, Error> {
    let mut emitter = Emitter {
        cursor: Cursor::new(code, "html", strict),
        last_space: false,
    };
    while !emitter.cursor.at_end() {
        let last = emitter.cursor.pos();
        emitter.step();
        emitter.cursor.guard(last)?;
    }
    let text = emitter.cursor.finish();
    tracing::trace!(parts = ?text.parts(), "built annotated text");
    return Ok(text);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(code: &str) -> String {
        return build(code, true).unwrap().plain_text().to_string();
    }

    #[test]
    fn tags_are_markup() {
        let code = "<html><body><p>This is a <b>test</b>.</p></body></html>";
        let text = build(code, true).unwrap();
        assert_eq!(text.source_text(), code);
        assert_eq!(text.plain_text(), "\n\n\n\nThis is a test.");
    }

    #[test]
    fn whitespace_collapses() {
        assert_eq!(plain("<p>One\n   two  three</p>"), "\n\nOne two three");
    }

    #[test]
    fn line_breaks_and_list_items() {
        assert_eq!(plain("<ul><li>A</li><li>B<br/>C</li></ul>"), "\nA\nB\nC");
    }

    #[test]
    fn entities_read_as_characters() {
        assert_eq!(plain("Fish &amp; chips &#8211; &#x263A; &bogus;"), "Fish & chips \u{2013} \u{263a} &bogus;");
    }

    #[test]
    fn scripts_styles_and_comments_are_hidden() {
        let code = "<script type=\"text/javascript\">if (a < b) {}</script><style>p {}</style><!-- note -->Text";
        assert_eq!(plain(code), "Text");
    }

    #[test]
    fn attributes_may_contain_angle_brackets() {
        assert_eq!(plain("<a title=\"a > b\" href='x'>link</a>"), "link");
    }

    #[test]
    fn decode_entity_forms() {
        assert_eq!(decode_entity("&nbsp;").as_deref(), Some("\u{a0}"));
        assert_eq!(decode_entity("&#65;").as_deref(), Some("A"));
        assert_eq!(decode_entity("&#xD800;"), None);
        assert_eq!(decode_entity("amp"), None);
    }
}
