//! Markdown, walked over the tree-sitter block and inline grammars.
//!
//! Only text inside inline containers (paragraph lines, headings, emphasis,
//! link texts, table cells) is emitted as text. Everything else becomes markup
//! lazily, when the next text run or node flushes the gap before it; a line
//! break in such a gap reads as a space inside a paragraph and as a newline
//! elsewhere.

use std::ops::Range;

use tree_sitter::{Language, Node, Parser, Tree};

use super::cursor::Cursor;
use super::html;
use crate::annotated::AnnotatedText;
use crate::error::Error;
use crate::latex::signature::Action;
use crate::settings::Settings;

/// Node names and actions applied before the user's `markdownNodes`.
const DEFAULT_NODE_ACTIONS: &[(&str, &str)] = &[
    ("AutoLink", "dummy"),
    ("Code", "dummy"),
    ("CodeBlock", "ignore"),
    ("DisplayMath", "ignore"),
    ("FencedCodeBlock", "ignore"),
    ("IndentedCodeBlock", "ignore"),
    ("InlineMath", "dummy"),
    ("TableSeparator", "ignore"),
    ("YamlFrontMatterBlock", "ignore"),
];

/// Deepest container nesting handed to tree-sitter-md.
///
/// Its external scanner serializes one entry per open block into a fixed
/// 1024-byte buffer and aborts the process when that overflows.
const MAX_CONTAINER_DEPTH: usize = 128;

/// Node name used in `markdownNodes` for a tree-sitter node.
fn node_name(kind: &str, source: &str) -> Option<&'static str> {
    let name = match kind {
        "paragraph" => "Paragraph",
        "atx_heading" | "setext_heading" => "Heading",
        "block_quote" => "BlockQuote",
        "list" => "List",
        "list_item" => "ListItem",
        "fenced_code_block" => "FencedCodeBlock",
        "indented_code_block" => "IndentedCodeBlock",
        "code_fence_content" => "CodeBlock",
        "html_block" => "HtmlBlock",
        "minus_metadata" | "plus_metadata" => "YamlFrontMatterBlock",
        "thematic_break" => "ThematicBreak",
        "link_reference_definition" => "Reference",
        "pipe_table" => "TableBlock",
        "pipe_table_header" => "TableHead",
        "pipe_table_row" => "TableRow",
        "pipe_table_delimiter_row" => "TableSeparator",
        "pipe_table_cell" => "TableCell",
        "emphasis" => "Emphasis",
        "strong_emphasis" => "StrongEmphasis",
        "strikethrough" => "Strikethrough",
        "inline_link" | "full_reference_link" | "collapsed_reference_link" | "shortcut_link" => "Link",
        "image" => "Image",
        "uri_autolink" | "email_autolink" | "www_autolink" => "AutoLink",
        "code_span" => "Code",
        "latex_block" if source.starts_with("$$") => "DisplayMath",
        "latex_block" => "InlineMath",
        "html_tag" => "HtmlInline",
        "hard_line_break" => "HardLineBreak",
        _ => return None,
    };
    return Some(name);
}

/// Whether the gaps between the children of `kind` are text.
fn is_text_container(kind: &str) -> bool {
    return matches!(
        kind,
        "inline"
            | "code_span"
            | "emphasis"
            | "strong_emphasis"
            | "strikethrough"
            | "link_text"
            | "image_description"
            | "code_fence_content"
            | "indented_code_block"
    );
}

/// Length of the list item marker at the start of `line`, including the
/// blank after it.
fn list_marker_len(line: &str) -> Option<usize> {
    let digits = line.bytes().take_while(u8::is_ascii_digit).count();
    let marker = match line.as_bytes().get(digits) {
        Some(b'-' | b'+' | b'*') if digits == 0 => 1,
        Some(b'.' | b')') if (1..=9).contains(&digits) => digits.saturating_add(1),
        _ => return None,
    };
    return matches!(line.as_bytes().get(marker), Some(b' ' | b'\t')).then_some(marker.saturating_add(1));
}

/// Estimated number of containers open at the start of `line`: quote and
/// list markers, plus one per two columns of indentation.
fn line_container_depth(line: &str) -> usize {
    let mut depth = 0_usize;
    let mut columns = 0_usize;
    let mut rest = line;
    loop {
        let blanks = rest.bytes().take_while(|byte| return *byte == b' ' || *byte == b'\t').count();
        columns = rest
            .bytes()
            .take(blanks)
            .fold(columns, |total, byte| return total.saturating_add(if byte == b'\t' { 4 } else { 1 }));
        rest = rest.get(blanks..).unwrap_or("");
        let marker = if rest.starts_with("> ") || rest.starts_with(">\t") {
            Some(2)
        } else if rest.starts_with('>') {
            Some(1)
        } else {
            list_marker_len(rest)
        };
        let Some(marker) = marker else {
            break;
        };
        depth = depth.saturating_add(1);
        rest = rest.get(marker..).unwrap_or("");
    }
    return depth.saturating_add(columns / 2);
}

/// Deepest estimated container nesting over all lines of `code`.
fn container_depth(code: &str) -> usize {
    return code.lines().map(line_container_depth).max().unwrap_or(0);
}

/// Markdown tree walker emitting into a cursor.
struct Walker<'a> {
    /// Node actions, defaults first; the last entry for a name wins.
    actions: Vec<(String, Action)>,
    /// Block continuation markers (`>`, list indentation) inside the current inline node.
    continuations: Vec<Range<usize>>,
    /// Output cursor over the whole fragment.
    cursor: Cursor<'a>,
    /// Placeholders generated so far.
    dummies: usize,
    /// Whether the next table cell is the first of its row.
    first_cell: bool,
    /// Parser for the inline grammar.
    inline_parser: Parser,
    /// Natural language, for placeholders.
    language: &'a str,
    /// Names of the open nodes, outermost first.
    stack: Vec<&'static str>,
    /// Whether a failed inline parse is an error.
    strict: bool,
}

impl Walker<'_> {
    /// Action of the last entry named `name`.
    fn action(&self, name: &str) -> Option<Action> {
        return self
            .actions
            .iter()
            .rev()
            .find(|(entry, _)| return entry == name)
            .map(|(_, action)| return *action);
    }

    /// Flush the gap up to `end` as markup, reading each line break as a
    /// space inside a paragraph and as a newline elsewhere.
    fn gap_to(&mut self, end: usize) {
        let line_break = if self.in_paragraph() { " " } else { "\n" };
        let code = self.cursor.code();
        while self.cursor.pos() < end {
            let pos = self.cursor.pos();
            let Some(newline) = code.get(pos..end).and_then(|gap| return gap.find('\n')) else {
                break;
            };
            self.cursor.markup_to(pos.saturating_add(newline));
            self.cursor.markup_as(1, line_break);
        }
        self.cursor.markup_to(end);
    }

    /// Whether an open node is a paragraph.
    fn in_paragraph(&self) -> bool {
        return self.stack.contains(&"Paragraph");
    }

    /// Whether the innermost open node with a configured action is ignored.
    fn is_in_ignored(&self) -> bool {
        return self
            .stack
            .iter()
            .rev()
            .find_map(|name| return self.action(name))
            .is_some_and(|action| return action == Action::Ignore);
    }

    /// Run the inline parser over `ranges` of the code.
    fn parse_inline(&mut self, ranges: &[tree_sitter::Range]) -> Result<Tree, String> {
        self.inline_parser
            .set_included_ranges(ranges)
            .map_err(|error| return format!("invalid inline ranges: {error:?}"))?;
        return self
            .inline_parser
            .parse(self.cursor.code(), None)
            .ok_or_else(|| return "tree-sitter returned no inline tree".to_string());
    }

    /// Emit `from..to` as text after flushing the gap before it.
    ///
    /// Line breaks (and the indentation after them) and block continuation
    /// markers inside the run stay markup.
    fn text_run(&mut self, from: usize, to: usize) {
        let from = from.max(self.cursor.pos());
        if to <= from {
            return;
        }
        self.gap_to(from);
        let line_break = if self.in_paragraph() { " " } else { "\n" };
        let code = self.cursor.code();
        while self.cursor.pos() < to {
            let pos = self.cursor.pos();
            if let Some(continuation) = self
                .continuations
                .iter()
                .find(|range| return range.start == pos && range.end > pos)
            {
                let end = continuation.end.min(to);
                self.cursor.markup_to(end);
                continue;
            }
            let rest = code.get(pos..to).unwrap_or("");
            let newline = if rest.starts_with("\r\n") {
                2
            } else {
                usize::from(rest.starts_with('\n'))
            };
            if newline > 0 {
                let indentation = rest
                    .get(newline..)
                    .unwrap_or("")
                    .bytes()
                    .take_while(|byte| return *byte == b' ' || *byte == b'\t')
                    .count();
                self.cursor.markup_as(newline.saturating_add(indentation), line_break);
                continue;
            }
            let mut stop = rest
                .char_indices()
                .skip(1)
                .find(|(_, ch)| return *ch == '\n' || *ch == '\r')
                .map_or(to, |(index, _)| return pos.saturating_add(index));
            if let Some(next) = self
                .continuations
                .iter()
                .map(|range| return range.start)
                .filter(|start| return *start > pos)
                .min()
            {
                stop = stop.min(next);
            }
            self.cursor.text_to(stop);
        }
    }

    /// Visit a node of the block tree (`inline_tree` false) or of an inline tree.
    fn visit(&mut self, node: Node<'_>, inline_tree: bool) -> Result<(), Error> {
        let code = self.cursor.code();
        let (start, end) = (node.start_byte(), node.end_byte());
        if end <= self.cursor.pos() && end > start {
            return Ok(());
        }
        let source = code.get(start..end).unwrap_or("");
        let kind = node.kind();
        let name = node_name(kind, source);

        if matches!(name, Some("TableRow" | "TableHead")) {
            self.first_cell = true;
        } else if name == Some("TableCell") {
            if self.first_cell {
                self.first_cell = false;
            } else {
                self.cursor.interpret(" ");
            }
        }

        if self.is_in_ignored() {
            self.gap_to(end);
            return Ok(());
        }
        if let Some(Action::Dummy(generator)) = name.and_then(|name| return self.action(name)) {
            self.gap_to(start);
            let dummy = generator.generate(self.language, self.dummies, false);
            self.dummies = self.dummies.saturating_add(1);
            self.cursor.markup_as(end.saturating_sub(self.cursor.pos()), &dummy);
            return Ok(());
        }

        match kind {
            "backslash_escape" => {
                self.gap_to(start);
                self.cursor.markup_as(end.saturating_sub(start), source.get(1..).unwrap_or(""));
                return Ok(());
            },
            "entity_reference" | "numeric_character_reference" => {
                self.gap_to(start);
                let decoded = html::decode_entity(source).unwrap_or_else(|| return source.to_string());
                self.cursor.markup_as(end.saturating_sub(start), &decoded);
                return Ok(());
            },
            _ => {},
        }

        if name == Some("Paragraph") {
            self.gap_to(start);
        }
        if let Some(name) = name {
            self.stack.push(name);
        }
        let result = if self.is_in_ignored() {
            self.gap_to(end);
            Ok(())
        } else if !inline_tree && matches!(kind, "inline" | "pipe_table_cell") {
            self.visit_inline(node)
        } else if is_text_container(kind) {
            self.visit_text_container(node, start, end, inline_tree)
        } else {
            self.visit_children(node, inline_tree)
        };
        if name.is_some() {
            self.stack.pop();
        }
        return result;
    }

    /// Visit every child of `node`.
    fn visit_children(&mut self, node: Node<'_>, inline_tree: bool) -> Result<(), Error> {
        let mut walk = node.walk();
        for child in node.children(&mut walk) {
            self.visit(child, inline_tree)?;
        }
        return Ok(());
    }

    /// Parse an inline node of the block tree with the inline grammar and
    /// visit the result.
    ///
    /// Block continuation children are left out of the parsed ranges.
    fn visit_inline(&mut self, node: Node<'_>) -> Result<(), Error> {
        let code = self.cursor.code();
        let (start, end) = (node.start_byte(), node.end_byte());
        let source = code.get(start..end).unwrap_or("");
        let from = end.saturating_sub(source.trim_start().len());
        let to = start.saturating_add(source.trim_end().len());

        let mut ranges = Vec::new();
        let mut continuations = Vec::new();
        let mut range = node.range();
        let mut walk = node.walk();
        for child in node.children(&mut walk) {
            if !child.is_named() {
                continue;
            }
            let child_range = child.range();
            if child_range.start_byte > range.start_byte {
                ranges.push(tree_sitter::Range {
                    start_byte: range.start_byte,
                    end_byte: child_range.start_byte,
                    start_point: range.start_point,
                    end_point: child_range.start_point,
                });
            }
            continuations.push(child_range.start_byte..child_range.end_byte);
            range.start_byte = child_range.end_byte;
            range.start_point = child_range.end_point;
        }
        if range.end_byte > range.start_byte {
            ranges.push(range);
        }
        self.continuations = continuations;

        let tree = match self.parse_inline(&ranges) {
            Ok(tree) => tree,
            Err(reason) => {
                if self.strict {
                    return Err(Error::ParseFailed {
                        language_id: "markdown".to_string(),
                        reason,
                    });
                }
                tracing::warn!(%reason, position = start, "could not parse inline markdown, checking it as text");
                self.text_run(from, to);
                return Ok(());
            },
        };
        let root = tree.root_node();
        let result = self.visit_text_container(root, from, to.max(from), true);
        self.continuations.clear();
        return result;
    }

    /// Emit the gaps between the named children of `node` as text, within
    /// `from..to`.
    fn visit_text_container(&mut self, node: Node<'_>, from: usize, to: usize, inline_tree: bool) -> Result<(), Error> {
        let code = self.cursor.code();
        let mut from = from;
        let mut to = to;
        if matches!(node.kind(), "link_text" | "image_description") {
            let source = code.get(from..to).unwrap_or("");
            if source.starts_with('[') || source.starts_with("![") {
                from = from.saturating_add(source.find('[').unwrap_or(0)).saturating_add(1);
            }
            if source.ends_with(']') && to > from {
                to = to.saturating_sub(1);
            }
        }

        let mut text_from = from;
        let mut walk = node.walk();
        for child in node.children(&mut walk) {
            if !child.is_named() || child.kind() == "block_continuation" {
                continue;
            }
            self.text_run(text_from, child.start_byte().min(to));
            self.visit(child, inline_tree)?;
            text_from = child.end_byte();
        }
        self.text_run(text_from, to);
        return Ok(());
    }
}

/// A parser for `language`.
fn parser(language: &Language) -> Result<Parser, String> {
    let mut parser = Parser::new();
    parser.set_language(language).map_err(|error| return error.to_string())?;
    return Ok(parser);
}

/// Node actions in force under `settings`, defaults first.
fn node_actions(settings: &Settings) -> Vec<(String, Action)> {
    let defaults = DEFAULT_NODE_ACTIONS
        .iter()
        .map(|(name, action)| return ((*name).to_string(), (*action).to_string()));
    let user = settings
        .markdown_nodes
        .iter()
        .map(|(name, action)| return (name.clone(), action.clone()));
    return defaults
        .chain(user)
        .filter_map(|(name, action_string)| match Action::parse(&action_string) {
            Some(action) => return Some((name, action)),
            None => {
                tracing::warn!(node = name, action = action_string, "ignoring unknown markdown node action");
                return None;
            },
        })
        .collect();
}

/// Build the annotated text of Markdown `code`.
///
/// # Errors
///
/// Returns `Error::ParseFailed` if `strict` is set and tree-sitter returns no
/// tree, or the containers are nested too deeply to parse.
pub fn build(code: &str, settings: &Settings, strict: bool) -> Result<AnnotatedText, Error> {
    let depth = container_depth(code);
    if depth > MAX_CONTAINER_DEPTH {
        if strict {
            return Err(Error::ParseFailed {
                language_id: "markdown".to_string(),
                reason: format!("containers nested {depth} deep, at most {MAX_CONTAINER_DEPTH} are supported"),
            });
        }
        tracing::warn!(depth, "markdown containers nested too deeply, checking it as plain text");
        return Ok(super::plain::plaintext(code));
    }

    let block_language: Language = tree_sitter_md::LANGUAGE.into();
    let inline_language: Language = tree_sitter_md::INLINE_LANGUAGE.into();
    let parsers = parser(&block_language).and_then(|block| return Ok((block, parser(&inline_language)?)));
    let tree = parsers.and_then(|(mut block, inline)| {
        let tree = block
            .parse(code, None)
            .ok_or_else(|| return "tree-sitter returned no block tree".to_string())?;
        return Ok((tree, inline));
    });
    let (tree, inline_parser) = match tree {
        Ok(parsed) => parsed,
        Err(reason) if strict => {
            return Err(Error::ParseFailed {
                language_id: "markdown".to_string(),
                reason,
            });
        },
        Err(reason) => {
            tracing::warn!(%reason, "could not parse markdown, checking it as plain text");
            return Ok(super::plain::plaintext(code));
        },
    };

    let mut walker = Walker {
        cursor: Cursor::new(code, "markdown", strict),
        actions: node_actions(settings),
        stack: Vec::new(),
        language: &settings.language_short_code,
        dummies: 0,
        first_cell: false,
        inline_parser,
        continuations: Vec::new(),
        strict,
    };
    walker.visit_children(tree.root_node(), false)?;
    walker.gap_to(code.len());
    let text = walker.cursor.finish();
    tracing::trace!(parts = ?text.parts(), "built annotated text");
    return Ok(text);
}
