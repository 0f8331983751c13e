//! Git commit messages: `#` lines are git's own commentary.

use std::sync::LazyLock;

use regex::Regex;

use super::cursor::Cursor;
use crate::annotated::AnnotatedText;
use crate::error::Error;

/// A comment line including its line break.
static COMMENT: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r"^[ \t]*#[^\r\n]*(?:\r?\n|$)").expect("valid regex"));

/// Build a commit message; comment lines read as a line break.
///
/// # Errors
///
/// Returns `Error::ParserStall` if `strict` is set and the scan stalls.
pub fn build(code: &str, strict: bool) -> Result<AnnotatedText, Error> {
    let mut cursor = Cursor::new(code, "git-commit", strict);
    while !cursor.at_end() {
        let last = cursor.pos();
        let comment = cursor.is_start_of_line().then(|| return cursor.match_here(&COMMENT)).flatten();
        match comment {
            Some(comment) => cursor.markup_as(comment.len(), "\n"),
            None => {
                let line = cursor.rest().find('\n').map_or(cursor.rest().len(), |newline| return newline.saturating_add(1));
                cursor.text(line);
            },
        }
        cursor.guard(last)?;
    }
    return Ok(cursor.finish());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comment_lines_become_line_breaks() {
        let code = "Fix the parser\n\nLonger text.\n# Please enter the commit message\n#\tmodified: a.rs\n";
        let text = build(code, true).unwrap();
        assert_eq!(text.plain_text(), "Fix the parser\n\nLonger text.\n\n\n");
        assert_eq!(text.source_text(), code);
    }

    #[test]
    fn hash_inside_a_line_is_text() {
        let text = build("Closes #12\n", true).unwrap();
        assert_eq!(text.plain_text(), "Closes #12\n");
    }
}
