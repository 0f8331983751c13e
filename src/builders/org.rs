//! Org mode.
//!
//! Elements (headlines, blocks, drawers, tables, LaTeX environments) are
//! tracked on a stack at the start of each line; objects (links, timestamps,
//! LaTeX fragments, text markup) are matched character by character. Code,
//! verbatim, and most objects become placeholders.

use std::sync::LazyLock;

use regex::Regex;

use super::cursor::Cursor;
use crate::annotated::AnnotatedText;
use crate::dummy::DummyGenerator;
use crate::error::Error;
use crate::settings::Settings;

/// Path of a regular link.
const REGULAR_LINK_PATH: &str = r"[ \-/0-9A-Z\\a-z]+|[A-Za-z]+:(?://)?[^\r\n\[\]]+|id:[-0-9A-Fa-f]+|#[^\r\n\[\]]+|\([^\r\n\[\]]+\)|[^\r\n\[\]]+";

/// Date, day, optional time, and up to two repeaters or delays.
const TIMESTAMP: &str =
    r"[0-9]{4}-[0-9]{2}-[0-9]{2}[ \t]+[^ \t\r\n+\-0-9>\]]+(?:[ \t]+[0-9]{1,2}:[0-9]{2})?(?:[ \t]+(?:\+|\+\+|\.\+|-|--)[0-9]+[dhmwy]){0,2}";

/// Timestamp with a time range.
const TIMESTAMP_RANGE: &str = r"[0-9]{4}-[0-9]{2}-[0-9]{2}[ \t]+[^ \t\r\n+\-0-9>\]]+[ \t]+[0-9]{1,2}:[0-9]{2}-[0-9]{1,2}:[0-9]{2}(?:[ \t]+(?:\+|\+\+|\.\+|-|--)[0-9]+[dhmwy]){0,2}";

/// Leading blanks of a line.
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| return Regex::new(r"^[ \t]*").expect("valid regex"));

/// Stars, keyword, and priority of a headline.
static HEADLINE: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(r"(?i)\A\*+ (?:[ \t]*(?-i:TODO|DONE))?(?:[ \t]*\[#[A-Za-z]\])?[ \t]*").expect("valid regex");
});

/// A whole commented headline.
static HEADLINE_COMMENT: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(r"(?imR)\A\*+ (?:[ \t]*(?-i:TODO|DONE))?(?:[ \t]*\[#[A-Za-z]\])?[ \t]*COMMENT(?:[ \t][^\r\n]*)?$")
        .expect("valid regex");
});

/// Tags closing a headline.
static HEADLINE_TAGS: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(r"(?mR)\A[ \t]*(?:(?::[#%0-9@A-Z_a-z]+)+:)?[ \t]*$").expect("valid regex");
});

/// `#+CAPTION:`, `#+NAME:`, `#+ATTR_html:`, and friends.
static AFFILIATED_KEYWORDS: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(
        r"(?imR)\A#\+(?:CAPTION|HEADER|NAME|PLOT|RESULTS|(?:CAPTION|RESULTS)\[[^\r\n]*?\]|ATTR_[-0-9A-Z_a-z]+): [^\r\n]*$",
    )
    .expect("valid regex");
});

/// `#+BEGIN_NAME parameters`.
static BLOCK_BEGIN: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(r"(?imR)\A#\+BEGIN_([^ \t\r\n]+)(?:[ \t]+[^\r\n]*?)?[ \t]*$").expect("valid regex");
});

/// `#+END_NAME`.
static BLOCK_END: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r"(?imR)\A#\+END_[^ \t\r\n]+[ \t]*$").expect("valid regex"));

/// `:NAME:`.
static DRAWER_BEGIN: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r"(?mR)\A:([-A-Z_a-z]+):[ \t]*$").expect("valid regex"));

/// `:END:`.
static DRAWER_END: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r"(?imR)\A:END:[ \t]*$").expect("valid regex"));

/// `#+BEGIN: name parameters`.
static DYNAMIC_BLOCK_BEGIN: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(r"(?imR)\A#\+BEGIN: [^ \t\r\n]+[ \t]+[^\r\n]*?[ \t]*$").expect("valid regex");
});

/// `#+END:`.
static DYNAMIC_BLOCK_END: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r"(?imR)\A#\+END:[ \t]*$").expect("valid regex"));

/// `[fn:label]` at the start of a footnote definition.
static FOOTNOTE_DEFINITION: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(r"(?i)\A\[fn:(?:[0-9]+|[-A-Z_a-z]+)\][ \t]*").expect("valid regex");
});

/// Bullet, counter, checkbox, and tag of a list item.
static ITEM: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(
        r"(?mR)\A(?:\*|-|\+|(?:[0-9]+|[A-Za-z])[.)])(?:[ \t]+|$)(?:\[@(?:[0-9]+|[A-Za-z])\][ \t]*)?(?:\[[- \tX]\][ \t]*)?(?:[^\r\n]*?[ \t]+::[ \t]*)?",
    )
    .expect("valid regex");
});

/// Start of a table row.
static TABLE_ROW: LazyLock<Regex> = LazyLock::new(|| return Regex::new(r"\A\|[ \t]*").expect("valid regex"));

/// A horizontal rule inside a table.
static RULE_TABLE_ROW: LazyLock<Regex> = LazyLock::new(|| return Regex::new(r"\A\|-[^\r\n]*").expect("valid regex"));

/// Bar between table cells.
static TABLE_CELL_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r"\A[ \t]*\|[ \t]*").expect("valid regex"));

/// Whole lines that are markup: Babel calls, clocks, diary sexps, plannings,
/// comments, fixed-width lines, horizontal rules, and keywords.
static LINE_MARKUP: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    let patterns = [
        r"(?imR)\A#\+CALL:[ \t]*[^\r\n]+?[ \t]*$".to_string(),
        r"(?imR)\ACLOCK:[ \t]*[^\r\n]+?[ \t]*$".to_string(),
        r"\A%%\([^\r\n]*".to_string(),
        format!(
            r"(?imR)\A(?:DEADLINE|SCHEDULED|CLOSED):[ \t]*(?:<%%\([^\r\n>]+\)>|<{TIMESTAMP}>|\[{TIMESTAMP}\]|<{TIMESTAMP}>--<{TIMESTAMP}>|<{TIMESTAMP_RANGE}>|\[{TIMESTAMP}\]\[{TIMESTAMP}\]|\[{TIMESTAMP_RANGE}\])\]*$"
        ),
        r"\A#(?:[ \t]+[^\r\n]*?)?(?:\r?\n|\z)".to_string(),
        r"(?mR)\A:(?:[ \t]+|$)".to_string(),
        r"(?mR)\A-{5,}[ \t]*$".to_string(),
        r"(?mR)\A#\+[^ \t\r\n]+?:[ \t]*[^\r\n]+?[ \t]*$".to_string(),
    ];
    return patterns.iter().map(|pattern| return Regex::new(pattern).expect("valid regex")).collect();
});

/// `\begin{name}`.
static LATEX_ENVIRONMENT_BEGIN: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r"(?i)\A\\begin\{([*0-9A-Za-z]+)\}[ \t]*").expect("valid regex"));

/// `\end{name}`.
static LATEX_ENVIRONMENT_END: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r"(?i)\A\\end\{([*0-9A-Za-z]+)\}[ \t]*").expect("valid regex"));

/// LaTeX commands, `\(...\)`, `\[...\]`, and `$$...$$`.
static LATEX_FRAGMENTS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    return [
        r"\A\\[A-Za-z]+(?:\[[^\r\n{}\[\]]*\]|\{[^\r\n{}]*\})*",
        r"(?s)\A\\\(.*?\\\)",
        r"(?s)\A\\\[.*?\\\]",
        r"(?s)\A\$\$.*?\$\$",
    ]
    .iter()
    .map(|pattern| return Regex::new(pattern).expect("valid regex"))
    .collect();
});

/// `$x$`.
static MATH_CHARACTER: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r#"\A\$[^ \t\r\n"',.;?]\$"#).expect("valid regex"));

/// `$...$`.
static MATH: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r"\A\$[^ \t\r\n$,.;][^$]*[^ \t\r\n$,.]\$").expect("valid regex"));

/// Export snippets and footnote references.
static HIDDEN_OBJECTS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    return [
        r"\A@@[-0-9A-Za-z]+:[^\r\n]*?@@",
        r"(?i)\A\[fn:[-0-9A-Z_a-z]*\]",
        r"(?i)\A\[fn:[-0-9A-Z_a-z]*:[^\r\n]*?\]",
    ]
    .iter()
    .map(|pattern| return Regex::new(pattern).expect("valid regex"))
    .collect();
});

/// Inline Babel calls and source blocks, macros, statistics cookies, and
/// timestamps.
static PLACEHOLDER_OBJECTS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    let patterns = [
        r"(?i)\Acall_[^ \t\r\n()]+(?:\[[^\r\n]*?\])?\([^\r\n]*?\)(?:\[[^\r\n]*?\])?".to_string(),
        r"(?i)\Asrc_[^ \t\r\n]+(?:\[[^\r\n]*?\])?\{[^\r\n]*?\}".to_string(),
        r"\A\{\{\{[A-Za-z][-0-9A-Z_a-z]*(?:\([^\r\n]*?\))?\}\}\}".to_string(),
        r"\A\[[0-9]*(?:%|/[0-9]*)\]".to_string(),
        r"\A<%%\([^\r\n>]+\)>".to_string(),
        format!(r"\A<{TIMESTAMP}>--<{TIMESTAMP}>"),
        format!(r"\A<{TIMESTAMP_RANGE}>"),
        format!(r"\A\[{TIMESTAMP}\]--\[{TIMESTAMP}\]"),
        format!(r"\A\[{TIMESTAMP_RANGE}\]"),
        format!(r"\A<{TIMESTAMP}>"),
        format!(r"\A\[{TIMESTAMP}\]"),
    ];
    return patterns.iter().map(|pattern| return Regex::new(pattern).expect("valid regex")).collect();
});

/// `<<<radio target>>>`.
static RADIO_TARGET: LazyLock<Regex> = LazyLock::new(|| return Regex::new(r"\A<<<([^\r\n<>]+)>>>").expect("valid regex"));

/// `<<target>>`.
static TARGET: LazyLock<Regex> = LazyLock::new(|| return Regex::new(r"\A<<([^\r\n<>]+)>>").expect("valid regex"));

/// `<scheme:path>`.
static ANGLE_LINK: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r"\A<[A-Za-z]+:[^\r\n<>\]]+>").expect("valid regex"));

/// Longest candidate for a plain `scheme:path` link.
static PLAIN_LINK: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r"\A[A-Za-z]+:[^ \t\r\n()<>]+").expect("valid regex"));

/// `[[path]]`.
static REGULAR_LINK_WITHOUT_DESCRIPTION: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(&format!(r"\A\[\[(?:{REGULAR_LINK_PATH})\]\]")).expect("valid regex");
});

/// `[[path][`, opening a described link.
static REGULAR_LINK_WITH_DESCRIPTION: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(&format!(r"\A\[\[(?:{REGULAR_LINK_PATH})\]\[")).expect("valid regex");
});

/// Description and closing brackets of a described link.
static LINK_DESCRIPTION: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r"\A[^\r\n\[\]]+\]\]").expect("valid regex"));

/// Org elements, innermost last on the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Element {
    /// `#+BEGIN_CENTER`.
    CenterBlock,
    /// `#+BEGIN_COMMENT`.
    CommentBlock,
    /// `:NAME:`.
    Drawer,
    /// `#+BEGIN: name`.
    DynamicBlock,
    /// `#+BEGIN_EXAMPLE`.
    ExampleBlock,
    /// `#+BEGIN_EXPORT`.
    ExportBlock,
    /// `* Title`.
    Headline,
    /// `\begin{name}`.
    LatexEnvironment,
    /// Everything else.
    Paragraph,
    /// `:PROPERTIES:`.
    PropertyDrawer,
    /// `#+BEGIN_QUOTE`.
    QuoteBlock,
    /// `#+BEGIN_SRC`.
    SourceBlock,
    /// Any other `#+BEGIN_NAME`.
    SpecialBlock,
    /// `| cell |`.
    Table,
    /// `#+BEGIN_VERSE`.
    VerseBlock,
}

impl Element {
    /// The element a `#+BEGIN_NAME` line opens.
    fn for_block(name: &str) -> Self {
        return match name.to_ascii_uppercase().as_str() {
            "CENTER" => Self::CenterBlock,
            "QUOTE" => Self::QuoteBlock,
            "COMMENT" => Self::CommentBlock,
            "EXAMPLE" => Self::ExampleBlock,
            "EXPORT" => Self::ExportBlock,
            "SRC" => Self::SourceBlock,
            "VERSE" => Self::VerseBlock,
            _ => Self::SpecialBlock,
        };
    }

    /// Elements whose contents are hidden.
    const fn is_ignored(self) -> bool {
        return self.is_verbatim_block() || matches!(self, Self::PropertyDrawer | Self::LatexEnvironment);
    }

    /// Blocks whose contents are not Org.
    const fn is_verbatim_block(self) -> bool {
        return matches!(self, Self::CommentBlock | Self::ExampleBlock | Self::ExportBlock | Self::SourceBlock);
    }
}

/// Org objects, innermost last on the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Object {
    /// `*bold*`.
    Bold,
    /// `~code~`.
    Code,
    /// `/italic/`.
    Italic,
    /// Description of `[[path][description]]`.
    LinkDescription,
    /// `+strikethrough+`.
    Strikethrough,
    /// `_underline_`.
    Underline,
    /// `=verbatim=`.
    Verbatim,
}

impl Object {
    /// The text markup a marker toggles.
    const fn for_marker(marker: char) -> Option<Self> {
        return match marker {
            '*' => Some(Self::Bold),
            '+' => Some(Self::Strikethrough),
            '/' => Some(Self::Italic),
            '=' => Some(Self::Verbatim),
            '_' => Some(Self::Underline),
            '~' => Some(Self::Code),
            _ => None,
        };
    }
}

/// Blank characters around text markup.
const fn is_blank(ch: char) -> bool {
    return matches!(ch, ' ' | '\t' | '\r' | '\n');
}

/// Org transducer state.
struct Builder<'a> {
    /// Whether the current step started at the start of a line.
    at_line_start: bool,
    /// Whether the end of the current line reads as a paragraph break.
    break_at_end_of_line: bool,
    /// Cursor over the code.
    cursor: Cursor<'a>,
    /// Placeholders generated so far.
    dummies: usize,
    /// Open elements; never empty.
    elements: Vec<Element>,
    /// Indentation of the current line.
    indentation: usize,
    /// Natural language, for placeholders.
    language: &'a str,
    /// Name of the open LaTeX environment.
    latex_environment: Option<String>,
    /// Open objects.
    objects: Vec<Object>,
}

impl Builder<'_> {
    /// Consume a block, drawer, or dynamic block delimiter line. Returns
    /// `false` if there is none.
    fn block_delimiter(&mut self) -> bool {
        if let Some(captures) = self.cursor.captures_here(&BLOCK_BEGIN) {
            let name = captures.get(1).map_or("", |name| return name.as_str());
            self.elements.push(Element::for_block(name));
            self.cursor.markup(captures.get(0).map_or(0, |whole| return whole.len()));
            return true;
        }
        if let Some(end) = self.cursor.match_here(&BLOCK_END) {
            self.pop_element();
            self.cursor.markup(end.len());
            return true;
        }
        if let Some(end) = self.cursor.match_here(&DRAWER_END) {
            self.pop_element();
            self.cursor.markup(end.len());
            return true;
        }
        if let Some(captures) = self.cursor.captures_here(&DRAWER_BEGIN) {
            let is_properties = captures
                .get(1)
                .is_some_and(|name| return name.as_str().eq_ignore_ascii_case("PROPERTIES"));
            self.elements.push(if is_properties { Element::PropertyDrawer } else { Element::Drawer });
            self.cursor.markup(captures.get(0).map_or(0, |whole| return whole.len()));
            return true;
        }
        if let Some(begin) = self.cursor.match_here(&DYNAMIC_BLOCK_BEGIN) {
            self.elements.push(Element::DynamicBlock);
            self.cursor.markup(begin.len());
            return true;
        }
        if let Some(end) = self.cursor.match_here(&DYNAMIC_BLOCK_END) {
            self.pop_element();
            self.cursor.markup(end.len());
            return true;
        }
        return false;
    }

    /// Close the innermost element at `end`, or hide one character.
    fn close_or_skip(&mut self, end: &Regex) {
        let Some(end) = self.cursor.match_here(end) else {
            self.skip_character();
            return;
        };
        self.pop_element();
        self.cursor.markup(end.len());
    }

    /// Length of `[[path][` if a description and `]]` follow on the line.
    fn described_link(&self) -> Option<usize> {
        let opening = self.cursor.match_here(&REGULAR_LINK_WITH_DESCRIPTION)?;
        let after = self.cursor.rest().get(opening.len()..)?;
        return LINK_DESCRIPTION.is_match(after).then_some(opening.len());
    }

    /// Whether `element` is open.
    fn in_element(&self, element: Element) -> bool {
        return self.elements.contains(&element);
    }

    /// Consume a line of a block whose contents are skipped up to its end
    /// line. Returns `false` outside such blocks.
    fn inside_open_block(&mut self) -> bool {
        if self.elements.iter().any(|element| return element.is_verbatim_block()) {
            self.close_or_skip(&BLOCK_END);
            return true;
        }
        if self.in_element(Element::PropertyDrawer) {
            self.close_or_skip(&DRAWER_END);
            return true;
        }
        if self.in_element(Element::LatexEnvironment) {
            let end = self.cursor.captures_here(&LATEX_ENVIRONMENT_END).filter(|captures| {
                return captures.get(1).map(|name| return name.as_str()) == self.latex_environment.as_deref();
            });
            let Some(end) = end.and_then(|captures| return captures.get(0)) else {
                self.skip_character();
                return true;
            };
            self.pop_element();
            self.latex_environment = None;
            self.cursor.markup(end.len());
            return true;
        }
        return false;
    }

    /// Text markup marker that may close markup here.
    fn markup_end(&self) -> Option<char> {
        if self.cursor.previous().is_none_or(is_blank) {
            return None;
        }
        let marker = self.cursor.current().filter(|ch| return Object::for_marker(*ch).is_some())?;
        let closes = self.cursor.peek(1).is_none_or(|ch| {
            return is_blank(ch) || matches!(ch, '!' | '"' | '\'' | ')' | ',' | '-' | '.' | ':' | ';' | '?' | '[' | '}');
        });
        return closes.then_some(marker);
    }

    /// Text markup marker that may open markup here.
    fn markup_start(&self) -> Option<char> {
        if self
            .cursor
            .previous()
            .is_some_and(|ch| return !matches!(ch, ' ' | '\t' | '\r' | '\n' | '"' | '\'' | '(' | '-' | '{'))
        {
            return None;
        }
        let marker = self.cursor.current().filter(|ch| return Object::for_marker(*ch).is_some())?;
        let following = self.cursor.peek(1);
        if self.cursor.pos() == 0 || following.is_none_or(|ch| return !is_blank(ch)) {
            return Some(marker);
        }
        return None;
    }

    /// Length of a `$` math fragment, checking the character after it.
    fn math(&self, regex: &Regex, may_follow: fn(char) -> bool) -> Option<usize> {
        let math = self.cursor.match_here(regex)?;
        let following = self.cursor.rest().get(math.len()..).and_then(|after| return after.chars().next());
        return following.is_none_or(|ch| return matches!(ch, '\r' | '\n') || may_follow(ch)).then_some(math.len());
    }

    /// Whether a link or target may start after the previous character.
    fn may_start_link(&self) -> bool {
        return self.at_line_start
            || self
                .cursor
                .previous()
                .is_some_and(|ch| return !matches!(ch, '\r' | '\n') && !ch.is_ascii_alphanumeric());
    }

    /// Whether `$` math may start here.
    fn may_start_math(&self) -> bool {
        return self.at_line_start || self.cursor.previous() != Some('$');
    }

    /// Consume one object or character of a paragraph.
    fn object(&mut self) {
        let tags = self.in_element(Element::Headline).then(|| return self.cursor.match_here(&HEADLINE_TAGS));
        if let Some(tags) = tags.flatten() {
            self.cursor.markup(tags.len());
            return;
        }
        let separator = self.in_element(Element::Table).then(|| return self.cursor.match_here(&TABLE_CELL_SEPARATOR));
        if let Some(separator) = separator.flatten() {
            self.cursor.markup_as(separator.len(), "\n\n");
            return;
        }
        if self.objects.contains(&Object::LinkDescription) && self.cursor.rest().starts_with("]]") {
            self.objects.pop();
            self.cursor.markup(2);
            return;
        }
        if let Some(fragment) = LATEX_FRAGMENTS.iter().find_map(|regex| return self.cursor.match_here(regex)) {
            self.placeholder(fragment.len());
            return;
        }
        if self.may_start_math() {
            let math = self
                .math(&MATH_CHARACTER, |ch| {
                    return matches!(ch, ' ' | '\t' | '"' | '\'' | '(' | ')' | ',' | '.' | ';' | '<' | '>' | '?' | '[' | ']');
                })
                .or_else(|| {
                    return self.math(&MATH, |ch| {
                        return matches!(
                            ch,
                            ' ' | '\t' | '!' | '"' | '\'' | '(' | ')' | ',' | '.' | ';' | '<' | '>' | '?' | '[' | ']'
                        );
                    });
                });
            if let Some(len) = math {
                self.placeholder(len);
                return;
            }
        }
        if let Some(hidden) = HIDDEN_OBJECTS.iter().find_map(|regex| return self.cursor.match_here(regex)) {
            self.cursor.markup(hidden.len());
            return;
        }
        if let Some(object) = PLACEHOLDER_OBJECTS.iter().find_map(|regex| return self.cursor.match_here(regex)) {
            self.placeholder(object.len());
            return;
        }
        let link = if self.may_start_link() {
            self.target(&RADIO_TARGET).or_else(|| return self.target(&TARGET))
        } else {
            None
        };
        let link = link
            .or_else(|| return self.cursor.match_here(&ANGLE_LINK).map(str::len))
            .or_else(|| return self.may_start_link().then(|| return self.plain_link()).flatten())
            .or_else(|| return self.cursor.match_here(&REGULAR_LINK_WITHOUT_DESCRIPTION).map(str::len));
        if let Some(len) = link {
            self.placeholder(len);
            return;
        }
        if let Some(len) = self.described_link() {
            self.objects.push(Object::LinkDescription);
            self.cursor.markup(len);
            return;
        }
        if let Some(marker) = self.markup_start().or_else(|| return self.markup_end()) {
            if let Some(object) = Object::for_marker(marker) {
                self.toggle_object(object);
            }
            self.cursor.markup(marker.len_utf8());
            return;
        }
        if self.cursor.current() == Some('\n') {
            let reading = if self.break_at_end_of_line { "\n\n" } else { "\n" };
            self.cursor.markup_as(1, reading);
            self.break_at_end_of_line = false;
            if self.in_element(Element::Headline) {
                self.pop_element();
            }
            return;
        }
        let len = self.cursor.current_len();
        self.cursor.text(len);
    }

    /// Consume `len` bytes as a placeholder.
    fn placeholder(&mut self, len: usize) {
        let dummy = DummyGenerator::SINGULAR.generate(self.language, self.dummies, false);
        self.dummies = self.dummies.saturating_add(1);
        self.cursor.markup_as(len, &dummy);
    }

    /// Length of a plain link.
    ///
    /// The link ends with a letter, or with a slash after anything but
    /// punctuation, and is not followed by a letter or digit.
    fn plain_link(&self) -> Option<usize> {
        let candidate = self.cursor.match_here(&PLAIN_LINK)?;
        let path_start = candidate.find(':')?.saturating_add(1);
        let rest = self.cursor.rest();
        let ends_properly = |end: usize| {
            let link = candidate.get(..end).unwrap_or("");
            let mut chars = link.chars().rev();
            let valid_last = match chars.next() {
                Some('/') => chars.next().is_some_and(|ch| return !matches!(ch, ' ' | '\t' | '\r' | '\n' | '!' | ',' | '.' | ';' | '?')),
                Some(ch) => ch.is_ascii_alphabetic(),
                None => false,
            };
            let following = rest.get(end..).and_then(|after| return after.chars().next());
            return valid_last && following.is_none_or(|ch| return !ch.is_ascii_alphanumeric());
        };
        return candidate
            .char_indices()
            .map(|(index, ch)| return index.saturating_add(ch.len_utf8()))
            .filter(|end| return *end > path_start)
            .rev()
            .find(|end| return ends_properly(*end));
    }

    /// Close the innermost element.
    fn pop_element(&mut self) {
        self.elements.pop();
        if self.elements.is_empty() {
            self.elements.push(Element::Paragraph);
        }
    }

    /// Consume the character under the cursor as markup.
    fn skip_character(&mut self) {
        let len = self.cursor.current_len();
        self.cursor.markup(len);
    }

    /// Consume a line-level element. Returns `false` if there is none.
    fn start_of_line(&mut self) -> bool {
        if self.in_element(Element::Table) && self.cursor.match_here(&TABLE_ROW).is_none() {
            self.pop_element();
        }
        if self.inside_open_block() {
            return true;
        }
        if self.indentation == 0 {
            if let Some(comment) = self.cursor.match_here(&HEADLINE_COMMENT) {
                self.cursor.markup_as(comment.len(), "\n");
                return true;
            }
            if let Some(headline) = self.cursor.match_here(&HEADLINE) {
                self.elements.push(Element::Headline);
                self.break_at_end_of_line = true;
                self.cursor.markup_as(headline.len(), "\n");
                return true;
            }
        }
        if let Some(keywords) = self.cursor.match_here(&AFFILIATED_KEYWORDS) {
            self.cursor.markup(keywords.len());
            return true;
        }
        if self.block_delimiter() {
            return true;
        }
        if let Some(label) = self.cursor.match_here(&FOOTNOTE_DEFINITION) {
            self.cursor.markup(label.len());
            return true;
        }
        if let Some(row) = self.cursor.match_here(&RULE_TABLE_ROW).or_else(|| return self.cursor.match_here(&TABLE_ROW)) {
            if !self.in_element(Element::Table) {
                self.elements.push(Element::Table);
            }
            self.break_at_end_of_line = true;
            self.cursor.markup_as(row.len(), "\n");
            return true;
        }
        if let Some(bullet) = self.cursor.match_here(&ITEM) {
            self.break_at_end_of_line = true;
            self.cursor.markup_as(bullet.len(), "\n");
            return true;
        }
        if let Some(line) = LINE_MARKUP.iter().find_map(|regex| return self.cursor.match_here(regex)) {
            self.cursor.markup(line.len());
            return true;
        }
        if let Some(captures) = self.cursor.captures_here(&LATEX_ENVIRONMENT_BEGIN) {
            self.elements.push(Element::LatexEnvironment);
            self.latex_environment = captures.get(1).map(|name| return name.as_str().to_string());
            self.cursor.markup(captures.get(0).map_or(0, |whole| return whole.len()));
            return true;
        }
        return false;
    }

    /// Consume one step.
    fn step(&mut self) {
        self.at_line_start = self.cursor.is_start_of_line();
        if self.at_line_start {
            let indentation = self.cursor.match_here(&WHITESPACE).map_or(0, str::len);
            self.indentation = indentation;
            self.cursor.markup(indentation);
            if self.cursor.at_end() {
                return;
            }
        }
        if self.objects.contains(&Object::Verbatim) {
            self.verbatim_character('=');
        } else if self.objects.contains(&Object::Code) {
            self.verbatim_character('~');
        } else if !(self.at_line_start && self.start_of_line()) {
            if self.elements.iter().any(|element| return element.is_ignored()) {
                self.skip_character();
            } else {
                self.object();
            }
        }
    }

    /// Length of a target whose contents do not start or end with a blank.
    fn target(&self, regex: &Regex) -> Option<usize> {
        let captures = self.cursor.captures_here(regex)?;
        let contents = captures.get(1)?.as_str();
        if contents.starts_with([' ', '\t']) || contents.ends_with([' ', '\t']) {
            return None;
        }
        return captures.get(0).map(|whole| return whole.len());
    }

    /// Open `object`, or close it if it is the innermost one.
    fn toggle_object(&mut self, object: Object) {
        if self.objects.last() == Some(&object) {
            self.objects.pop();
        } else {
            self.objects.push(object);
        }
    }

    /// Consume one character of verbatim or code, closed by `marker`.
    fn verbatim_character(&mut self, marker: char) {
        if self.markup_end() == Some(marker) {
            self.objects.pop();
            self.placeholder(marker.len_utf8());
        } else {
            self.skip_character();
        }
    }
}

/// Build the annotated text of Org `code`.
///
/// # Errors
///
/// Returns `Error::ParserStall` if `strict` is set and the transducer stalls.
pub fn build(code: &str, settings: &Settings, strict: bool) -> Result<AnnotatedText, Error> {
    let mut builder = Builder {
        cursor: Cursor::new(code, "org", strict),
        at_line_start: true,
        indentation: 0,
        break_at_end_of_line: false,
        elements: vec![Element::Paragraph],
        latex_environment: None,
        objects: Vec::new(),
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
