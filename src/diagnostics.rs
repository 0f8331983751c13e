use std::fmt::Write as _;

use crate::checker::RuleMatch;
use crate::error::Error;

/// Bold on.
const BOLD: &str = "\x1b[1m";
/// Attributes off.
const RESET: &str = "\x1b[0m";
/// Suggestions listed per match.
const MAX_SUGGESTIONS: usize = 3;

/// Render an error as valid markdown with bold headings and print to stderr.
pub fn print_error(e: &Error) {
    let md = render_error(e);
    for line in md.lines() {
        if line.starts_with('#') {
            eprintln!("{BOLD}{line}{RESET}");
        } else {
            eprintln!("{line}");
        }
    }
}

/// Render an error as a structured markdown diagnostic.
///
/// Each variant produces a block with what happened and, where the user can
/// do something about it, how to fix it.
pub fn render_error(e: &Error) -> String {
    return match e {
        Error::EngineStatus { status, uri } => render_engine_status(*status, uri),
        Error::InvalidServerUri { uri } => render_invalid_server_uri(uri),
        Error::InvalidRegex { reason, rule } => render_invalid_regex(rule, reason),
        Error::ParserStall { language_id, position } => render_parser_stall(language_id, *position),
        Error::UnknownLanguageId { language_id } => render_unknown_language_id(language_id),
        _ => render_generic(e),
    };
}

/// Variants that only need the wrapped error's message.
fn render_generic(e: &Error) -> String {
    return match e {
        Error::Http(e) => format!("\
# Error: Grammar Engine Unreachable

{e}

## Fix

Check that the LanguageTool server is running and reachable.
"),

        Error::Io(e) => format!("\
# Error: I/O

{e}
"),

        Error::Json(e) => format!("\
# Error: Invalid JSON

{e}
"),

        Error::ParseFailed { language_id, reason } => format!("\
# Error: Parse Failed

Could not parse {language_id} code: {reason}
"),

        Error::TomlDe(e) => format!("\
# Error: Invalid TOML

{e}

## Fix

Correct `.ltex.toml`. Its keys are the snake_case names of the settings.
"),

        // Already handled in render_error, but need exhaustive match.
        _ => format!("\
# Error

{e}
"),
    };
}

/// The engine answered with an error status.
fn render_engine_status(status: u16, uri: &str) -> String {
    return format!("\
# Error: Grammar Engine Failed

`{uri}` answered with HTTP status {status}.

## Fix

Check the server log. Status 413 means the document is too long for the
server, 429 that its rate limit was hit.
");
}

/// The configured server URI is unusable.
fn render_invalid_server_uri(uri: &str) -> String {
    if uri.is_empty() {
        return "\
# Error: No Grammar Engine

No LanguageTool server is configured.

## Fix

Pass `--server` or set it in `.ltex.toml`:

    language_tool_http_server_uri = \"http://localhost:8081\"
"
        .to_string();
    }
    return format!("\
# Error: Invalid Server URI

`{uri}` is not an `http://` or `https://` URI.
");
}

/// A hidden false positive does not compile.
fn render_invalid_regex(rule: &str, reason: &str) -> String {
    return format!("\
# Error: Invalid Hidden False Positive

The sentence pattern for rule `{rule}` is not a valid regex:

{reason}

## Fix

Correct or remove the entry in `hidden_false_positives`.
");
}

/// A builder stalled in strict mode.
fn render_parser_stall(language_id: &str, position: usize) -> String {
    return format!("\
# Error: Parser Stalled

The {language_id} builder did not advance at byte {position}.

## Fix

Run without `--strict` to skip the offending character.
");
}

/// Nothing handles the requested language id.
fn render_unknown_language_id(language_id: &str) -> String {
    return format!("\
# Error: Unsupported Language

No builder handles `{language_id}`.

## Fix

Pass one of the supported ids with `--language-id`, for example
`latex`, `markdown`, `org`, `restructuredtext`, `asciidoc`, `html`, or a
programming language such as `rust` or `python`.
");
}

/// One-based line and column (in characters) of a byte offset.
pub fn line_column(code: &str, offset: usize) -> (usize, usize) {
    let before = code.get(..offset).unwrap_or(code);
    let line = before.matches('\n').count().saturating_add(1);
    let line_start = before.rfind('\n').map_or(0, |newline| return newline.saturating_add(1));
    let column = before.get(line_start..).map_or(0, |text| return text.chars().count()).saturating_add(1);
    return (line, column);
}

/// Render a match as a `path:line:col: [RULE] message (suggestions)` line.
pub fn render_match(path: &str, code: &str, rule_match: &RuleMatch) -> String {
    let (line, column) = line_column(code, rule_match.range.start);
    let mut out = format!("{path}:{line}:{column}: [{}] {}", rule_match.rule_id, rule_match.message);
    let suggestions: Vec<&str> = rule_match
        .replacements
        .iter()
        .take(MAX_SUGGESTIONS)
        .map(String::as_str)
        .collect();
    if !suggestions.is_empty() {
        let _ = write!(out, " ({})", suggestions.join(", "));
    }
    return out;
}
