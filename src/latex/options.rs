//! Parser for LaTeX key/value option lists such as `\usepackage[…]` options
//! and BibTeX entry fields.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

/// Blanks, optionally followed by a line comment and the blanks after it.
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(r"^[ \n\r\t]+(?:%[^\r\n]*(?:\r?\n[ \n\r\t]*)?)?").expect("valid regex");
});

/// A line comment and the blanks after it.
static COMMENT: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r"^%[^\r\n]*(?:\r?\n[ \n\r\t]*)?").expect("valid regex"));

/// One side of an option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    /// Text with groups, comments, and surrounding blanks removed.
    pub plain_text: String,
    /// Byte range in the parsed string.
    pub range: Range<usize>,
    /// Source text of the range.
    pub text: String,
}

impl KeyValue {
    /// Slice `range` out of `options` and trim the collected plain text.
    fn new(options: &str, range: Range<usize>, plain: &str) -> Self {
        return Self {
            text: options.get(range.clone()).unwrap_or("").to_string(),
            range,
            plain_text: plain.trim_matches(|ch: char| return ch <= ' ').to_string(),
        };
    }
}

/// One `key` or `key=value` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageOption {
    /// The key.
    pub key: KeyValue,
    /// The value, absent when the entry has no `=`.
    pub value: Option<KeyValue>,
}

/// Option being collected.
#[derive(Debug)]
struct Pending {
    /// Plain text of the key so far.
    key: String,
    /// Start of the key.
    key_from: usize,
    /// End of the key, once `=` was seen.
    key_to: usize,
    /// Plain text of the value so far.
    value: String,
    /// Start of the value, once `=` was seen.
    value_from: Option<usize>,
}

impl Pending {
    /// The plain-text buffer of the side being read.
    fn buffer(&mut self) -> &mut String {
        return if self.value_from.is_some() { &mut self.value } else { &mut self.key };
    }

    /// Close the option at `end` and start the next one after it.
    fn finish(&mut self, options: &str, end: usize) -> PackageOption {
        let pending = std::mem::replace(self, Self::new(end.saturating_add(1)));
        let key_to = if pending.value_from.is_some() { pending.key_to } else { end };
        return PackageOption {
            key: KeyValue::new(options, pending.key_from..key_to, &pending.key),
            value: pending
                .value_from
                .map(|from| return KeyValue::new(options, from..end, &pending.value)),
        };
    }

    /// Fresh option starting at `key_from`.
    const fn new(key_from: usize) -> Self {
        return Self {
            key_from,
            key_to: key_from,
            value_from: None,
            key: String::new(),
            value: String::new(),
        };
    }
}

/// Append one blank unless the buffer already ends in one.
fn append_space(buffer: &mut String) {
    if !buffer.ends_with(' ') {
        buffer.push(' ');
    }
}

/// Split `options` on top-level commas into keys and values.
///
/// Brace groups protect commas and are dropped from the plain text; `\%`,
/// `\,`, `\\`, `\{`, `\}`, and `\ ` are kept verbatim; comments are skipped;
/// runs of blanks collapse to one.
pub fn parse(options: &str) -> Vec<PackageOption> {
    let mut parsed = Vec::new();
    let mut pending = Pending::new(0);
    let mut depth = 0_i64;
    let mut pos = 0_usize;

    while let Some(rest) = options.get(pos..).filter(|rest| return !rest.is_empty()) {
        let mut chars = rest.chars();
        let Some(ch) = chars.next() else {
            break;
        };
        match ch {
            '{' => {
                depth = depth.saturating_add(1);
                pos = pos.saturating_add(1);
            },
            '}' => {
                depth = depth.saturating_sub(1);
                pos = pos.saturating_add(1);
            },
            ' ' | '\n' | '\r' | '\t' => {
                let blanks = WHITESPACE.find(rest).map_or(1, |found| return found.end());
                append_space(pending.buffer());
                pos = pos.saturating_add(blanks);
            },
            '%' => {
                pos = pos.saturating_add(COMMENT.find(rest).map_or(1, |found| return found.end()));
            },
            ',' if depth == 0 => {
                parsed.push(pending.finish(options, pos));
                pos = pos.saturating_add(1);
            },
            '\\' if matches!(chars.next(), Some('%' | ',' | '\\' | '{' | '}' | ' ')) => {
                let escaped = rest.get(..2).unwrap_or(rest);
                pending.buffer().push_str(escaped);
                pos = pos.saturating_add(escaped.len());
            },
            '=' if pending.value_from.is_none() => {
                pending.key_to = pos;
                pending.value_from = Some(pos.saturating_add(1));
                pos = pos.saturating_add(1);
            },
            other => {
                pending.buffer().push(other);
                pos = pos.saturating_add(other.len_utf8());
            },
        }
    }

    if pending.key_from < options.len() {
        parsed.push(pending.finish(options, options.len()));
    }
    return parsed;
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPTIONS: &str = concat!(
        "  option1\\,=value1,\n",
        "option2 = \\value2 ,% option3 = value3,\n",
        "option4 =% value4,\n",
        "{This is\\} a \\textbf{test}, option5 = value5.},\n",
    );

    #[test]
    fn escaped_comma_stays_in_key() {
        let parsed = parse(OPTIONS);
        assert_eq!(parsed.len(), 4);
        let first = &parsed[0];
        assert_eq!(first.key.range, 0..11);
        assert_eq!(first.key.text, "  option1\\,");
        assert_eq!(first.key.plain_text, "option1\\,");
        let value = first.value.as_ref().unwrap();
        assert_eq!(value.range, 12..18);
        assert_eq!(value.plain_text, "value1");
    }

    #[test]
    fn blanks_are_trimmed_from_plain_text() {
        let parsed = parse(OPTIONS);
        let second = &parsed[1];
        assert_eq!(second.key.range, 19..28);
        assert_eq!(second.key.plain_text, "option2");
        let value = second.value.as_ref().unwrap();
        assert_eq!(value.text, " \\value2 ");
        assert_eq!(value.plain_text, "\\value2");
    }

    #[test]
    fn comments_and_groups_are_skipped() {
        let parsed = parse(OPTIONS);
        let third = &parsed[2];
        assert_eq!(third.key.text, "% option3 = value3,\noption4 ");
        assert_eq!(third.key.plain_text, "option4");
        let value = third.value.as_ref().unwrap();
        assert_eq!(value.range, 68..124);
        assert_eq!(value.plain_text, "This is\\} a \\textbftest, option5 = value5.");
    }

    #[test]
    fn trailing_entry_without_value() {
        let parsed = parse(OPTIONS);
        let last = &parsed[3];
        assert_eq!(last.key.range, 125..126);
        assert_eq!(last.key.plain_text, "");
        assert!(last.value.is_none());
    }

    #[test]
    fn babel_style_options() {
        let parsed = parse("ngerman, main=british");
        let keys: Vec<_> = parsed.iter().map(|option| return option.key.plain_text.as_str()).collect();
        assert_eq!(keys, vec!["ngerman", "main"]);
    }
}
