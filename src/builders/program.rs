//! Source code: only comments are checked.
//!
//! Comment blocks (block comments and runs of line comments) are extracted,
//! their common decoration is stripped, and each line's contents go through
//! the Markdown builder (reStructuredText for Python docstrings). Code between
//! comments reads as a paragraph break.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use super::{markdown, rst};
use crate::annotated::{AnnotatedText, AnnotatedTextBuilder};
use crate::error::Error;
use crate::settings::Settings;

/// First non-blank character of a comment line; group 1 if it is decoration.
static FIRST_CHARACTER: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r"^[ \t]*(?:([#$%*+\-/])|(.))").expect("valid regex"));

/// Line separator inside a comment.
static LINE_SEPARATOR: LazyLock<Regex> = LazyLock::new(|| return Regex::new(r"\r?\n").expect("valid regex"));

/// Comment delimiters of a programming language, as regex sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentSyntax {
    /// Block comment start and end.
    pub block: Option<(&'static str, &'static str)>,
    /// Line comment marker.
    pub line: &'static str,
}

/// `/* */` and `//`.
const C_STYLE: CommentSyntax = CommentSyntax {
    block: Some((r"/\*\*?", r"\*\*?/")),
    line: "///?",
};

/// Line comments only, with `#`.
const HASH: CommentSyntax = CommentSyntax { block: None, line: "##?" };

impl CommentSyntax {
    /// Comment syntax of `language_id`, if it is a known programming language.
    pub fn for_language_id(language_id: &str) -> Option<Self> {
        let syntax = match language_id {
            "c" | "cpp" | "csharp" | "dart" | "fsharp" | "go" | "groovy" | "java" | "javascript"
            | "javascriptreact" | "kotlin" | "php" | "rust" | "scala" | "swift" | "typescript"
            | "typescriptreact" | "verilog" => C_STYLE,
            "elixir" | "python" => CommentSyntax {
                block: Some((r#"""""#, r#"""""#)),
                line: "##?",
            },
            "powershell" => CommentSyntax {
                block: Some(("<#", "#>")),
                line: "##?",
            },
            "coffeescript" | "julia" | "perl" | "perl6" | "puppet" | "r" | "ruby" | "shellscript" => HASH,
            "lua" => CommentSyntax {
                block: Some((r"--\[\[", r"\]\]")),
                line: "---?",
            },
            "elm" | "haskell" => CommentSyntax {
                block: Some((r"\{-", r"-\}")),
                line: "---?",
            },
            "sql" => CommentSyntax { block: None, line: "---?" },
            "clojure" | "lisp" => CommentSyntax { block: None, line: ";;?" },
            "matlab" => CommentSyntax {
                block: Some((r"%\{", r"%\}")),
                line: "%%?",
            },
            "erlang" => CommentSyntax { block: None, line: "%%?" },
            "fortran-modern" => CommentSyntax { block: None, line: "c" },
            "vb" => CommentSyntax { block: None, line: "''?" },
            _ => return None,
        };
        return Some(syntax);
    }

    /// Regex matching `ltex:` magic comments in this syntax.
    ///
    /// # Errors
    ///
    /// Returns the regex error if the delimiters do not compile.
    pub fn magic_comment_regex(self) -> Result<Regex, regex::Error> {
        let mut alternatives = Vec::new();
        if let Some((start, end)) = self.block {
            alternatives.push(format!(r"^[ \t]*(?:{start})[ \t]*(?i:ltex):(.*?)[ \t]*(?:{end})[ \t]*$"));
        }
        alternatives.push(format!(r"^[ \t]*(?:{})[ \t]*(?i:ltex):(.*?)[ \t]*$", self.line));
        return Regex::new(&format!("(?mR){}", alternatives.join("|")));
    }
}

/// Compiled comment scanners for one syntax.
#[derive(Debug)]
struct Scanner {
    /// Block comment end marker.
    block_end: Option<Regex>,
    /// Block comment start at a line start, up to where the contents begin.
    block_start: Option<Regex>,
    /// Line comment marker source, for stripping it from each line.
    line: &'static str,
    /// A run of line comments at a line start.
    line_run: Regex,
}

/// A comment found in the code.
#[derive(Debug)]
struct Comment {
    /// Range of the comment contents.
    contents: Range<usize>,
    /// End of the whole comment match.
    end: usize,
    /// Whether the comment is a run of line comments.
    is_line: bool,
}

impl Scanner {
    /// A block comment whose end marker sits after a blank and ends its line.
    fn block_comment_at(&self, code: &str, pos: usize, rest: &str) -> Option<Comment> {
        let start = self.block_start.as_ref()?.find(rest)?;
        let from = pos.saturating_add(start.end());
        let end_marker = self.block_end.as_ref()?.find(code.get(from..)?)?;
        let marker_from = from.saturating_add(end_marker.start());
        let marker_to = from.saturating_add(end_marker.end());

        let before = code.get(..marker_from)?.chars().next_back();
        let to = match before {
            Some(' ' | '\t') if marker_from > from => marker_from.saturating_sub(1),
            Some('\n') => marker_from,
            _ => return None,
        };
        let after = code.get(marker_to..)?;
        let line_end = after.find(['\r', '\n']).unwrap_or(after.len());
        if !after.get(..line_end)?.chars().all(|ch| return ch == ' ' || ch == '\t') {
            return None;
        }
        let end = marker_to.saturating_add(line_end);
        return Some(Comment {
            contents: from..to.max(from),
            end,
            is_line: false,
        });
    }

    /// The comment starting at line start `pos`, if any.
    fn comment_at(&self, code: &str, pos: usize) -> Option<Comment> {
        let rest = code.get(pos..)?;
        if let Some(comment) = self.block_comment_at(code, pos, rest) {
            return Some(comment);
        }
        let run = self.line_run.find(rest)?;
        let end = pos.saturating_add(run.end());
        return Some(Comment {
            contents: pos..end,
            end,
            is_line: true,
        });
    }

    /// Compile the scanners for `syntax`.
    fn new(syntax: CommentSyntax) -> Result<Self, regex::Error> {
        let (block_start, block_end) = match syntax.block {
            Some((start, end)) => (
                Some(Regex::new(&format!(r"(?mR)\A[ \t]*(?:{start})(?:[ \t]|$)"))?),
                Some(Regex::new(&format!("(?:{end})"))?),
            ),
            None => (None, None),
        };
        let line_run = Regex::new(&format!(r"(?mR)\A(?:[ \t]*(?:{})(?:[ \t]|$)[^\r\n]*(?:\r?\n)?)+", syntax.line))?;
        return Ok(Self {
            block_start,
            block_end,
            line_run,
            line: syntax.line,
        });
    }
}

/// Build the comments of a source file.
///
/// # Errors
///
/// Returns `Error::ParserStall` if `strict` is set and the comment builder
/// stalls.
pub fn build(code: &str, language_id: &str, settings: &Settings, strict: bool) -> Result<AnnotatedText, Error> {
    let mut builder = AnnotatedTextBuilder::new();
    let scanner = match CommentSyntax::for_language_id(language_id).map(Scanner::new) {
        Some(Ok(scanner)) => scanner,
        Some(Err(error)) => {
            tracing::warn!(language_id, %error, "could not compile comment patterns, skipping code");
            builder.add_markup(code);
            return Ok(builder.build());
        },
        None => {
            tracing::warn!(language_id, "no comment syntax known, skipping code");
            builder.add_markup(code);
            return Ok(builder.build());
        },
    };
    let inner = if language_id == "python" { Inner::Restructuredtext } else { Inner::Markdown };

    let mut gap = 0;
    let mut pos = 0;
    while pos < code.len() {
        if let Some(comment) = scanner.comment_at(code, pos) {
            builder.add_markup_as(code.get(gap..comment.contents.start).unwrap_or(""), "\n\n");
            let contents = code.get(comment.contents.clone()).unwrap_or("");
            let line = if comment.is_line { scanner.line } else { "" };
            add_comment(&mut builder, contents, line, inner, settings, strict)?;
            gap = comment.contents.end;
            pos = comment.end.max(pos.saturating_add(1));
            if code.get(..pos).is_some_and(|before| return before.ends_with('\n')) {
                continue;
            }
        }
        pos = code
            .get(pos..)
            .and_then(|rest| return rest.find('\n'))
            .map_or(code.len(), |newline| return pos.saturating_add(newline).saturating_add(1));
    }
    builder.add_markup(code.get(gap..).unwrap_or(""));

    let text = builder.build();
    tracing::trace!(language_id, parts = ?text.parts(), "built annotated text");
    return Ok(text);
}

/// Builder for comment contents.
#[derive(Debug, Clone, Copy)]
enum Inner {
    /// Markdown.
    Markdown,
    /// reStructuredText.
    Restructuredtext,
}

/// Strip each line's decoration and build its contents.
fn add_comment(
    builder: &mut AnnotatedTextBuilder,
    comment: &str,
    line_marker: &str,
    inner: Inner,
    settings: &Settings,
    strict: bool,
) -> Result<(), Error> {
    let common = common_first_character(comment);
    let decoration = if common.is_empty() { String::new() } else { format!("(?:{})?", regex::escape(common)) };
    let pattern = format!(r"[ \t]*(?:{line_marker}){decoration}[ \t]*([^\r\n]*?)(?:\r?\n|$)");
    let line_contents = match Regex::new(&pattern) {
        Ok(regex) => regex,
        Err(error) => {
            tracing::warn!(%error, "could not compile comment line pattern");
            builder.add_markup(comment);
            return Ok(());
        },
    };

    let mut pos = 0;
    for captures in line_contents.captures_iter(comment) {
        let Some(contents) = captures.get(1) else {
            continue;
        };
        builder.add_markup_as(comment.get(pos..contents.start()).unwrap_or(""), "\n");
        let text = match inner {
            Inner::Markdown => markdown::build(contents.as_str(), settings, strict)?,
            Inner::Restructuredtext => rst::build(contents.as_str(), settings, strict)?,
        };
        builder.extend(text);
        pos = contents.end();
    }
    builder.add_markup(comment.get(pos..).unwrap_or(""));
    return Ok(());
}

/// The decoration character every non-blank line of `comment` starts with, or
/// an empty string if the lines disagree or one starts with a letter.
fn common_first_character(comment: &str) -> &str {
    let mut common = "";
    for line in LINE_SEPARATOR.split(comment) {
        let Some(captures) = FIRST_CHARACTER.captures(line) else {
            continue;
        };
        let Some(first) = captures.get(1) else {
            return "";
        };
        if common.is_empty() {
            common = first.as_str();
        } else if first.as_str() != common {
            return "";
        }
    }
    return common;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(code: &str, language_id: &str) -> String {
        return build(code, language_id, &Settings::default(), true).unwrap().plain_text().to_string();
    }

    #[test]
    fn line_comments_are_checked() {
        let code = "fn main() {}\n\n// This is a *test*.\n// Second line.\nlet x = 1;\n";
        let text = build(code, "rust", &Settings::default(), true).unwrap();
        assert_eq!(text.source_text(), code);
        assert_eq!(text.plain_text(), "\n\n\nThis is a test.\nSecond line.");
    }

    #[test]
    fn block_comment_decoration_is_stripped() {
        let code = "/**\n * A sentence.\n * @param x the value\n */\nint f(int x);\n";
        let text = build(code, "java", &Settings::default(), true).unwrap();
        assert_eq!(text.source_text(), code);
        assert_eq!(text.plain_text(), "\n\n\n\nA sentence.\n@param x the value");
    }

    #[test]
    fn block_end_must_close_the_line() {
        assert_eq!(plain("x = 1; /* not a block */\n", "c"), "");
        assert_eq!(plain("/* inline */ code\n", "c"), "");
    }

    #[test]
    fn python_uses_restructuredtext() {
        let code = "def f():\n    \"\"\"\n    Return ``x``.\n    \"\"\"\n";
        let text = plain(code, "python");
        assert!(text.contains("Return Dummy0."), "{text:?}");
    }

    #[test]
    fn deeply_nested_markdown_in_comments_is_survived() {
        let code = format!("// {}x\nlet y = 2;\n", "> ".repeat(300));
        let text = build(&code, "rust", &Settings::default(), false).unwrap();
        assert_eq!(text.source_text(), code);
        assert!(text.plain_text().ends_with('x'), "{:?}", text.plain_text());
        assert!(build(&code, "rust", &Settings::default(), true).is_err());
    }

    #[test]
    fn common_character_requires_agreement() {
        assert_eq!(common_first_character(" * a\n * b"), "*");
        assert_eq!(common_first_character(" * a\n # b"), "");
        assert_eq!(common_first_character(" * a\n b"), "");
        assert_eq!(common_first_character("\n * a\n\n"), "*");
    }

    #[test]
    fn magic_comment_regex_covers_both_forms() {
        let regex = CommentSyntax::for_language_id("java").unwrap().magic_comment_regex().unwrap();
        assert!(regex.is_match("/* ltex: language=de-DE */"));
        assert!(regex.is_match("  // LTeX: enabled=false"));
        let lua = CommentSyntax::for_language_id("lua").unwrap().magic_comment_regex().unwrap();
        assert!(lua.is_match("-- ltex: language=fr"));
        assert!(CommentSyntax::for_language_id("markdown").is_none());
    }
}
