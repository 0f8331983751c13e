//! The LaTeX annotated-text builder.
//!
//! A single left-to-right pass over one fragment driven by a mode stack. Also
//! serves BibTeX field values and Rnw documents (`rsweave`), whose
//! `<<…>>=` … `@` code chunks are skipped.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization as _;

use super::defaults::{self, MATH_ENVIRONMENTS};
use super::signature::{Action, ArgumentType, CommandSignature, EnvironmentSignature, match_argument};
use crate::annotated::AnnotatedText;
use crate::builders::cursor::Cursor;
use crate::dummy::DummyGenerator;
use crate::error::Error;
use crate::settings::Settings;

/// A command token: backslash plus one non-letter or a run of letters.
static COMMAND: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r"^\\(?:[^A-Za-z@]|[A-Za-z@]+)\*?").expect("valid regex"));

/// A simple braced argument without nested groups.
static ARGUMENT: LazyLock<Regex> = LazyLock::new(|| return Regex::new(r"^\{[^}]*\}").expect("valid regex"));

/// A line comment plus the blank lines after it.
static COMMENT: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r"^%[^\r\n]*(?:\r?\n[ \n\r\t]*)?").expect("valid regex"));

/// Blanks, optionally running into a comment.
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(r"^[ \n\r\t]+(?:%[^\r\n]*(?:\r?\n[ \n\r\t]*)?)?").expect("valid regex");
});

/// A TeX length in braces.
static LENGTH_IN_BRACE: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(r"^\{-?[0-9]*(?:\.[0-9]+)?(?:pt|mm|cm|ex|em|bp|dd|pc|in)\}").expect("valid regex");
});

/// A TeX length in brackets.
static LENGTH_IN_BRACKET: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(r"^\[-?[0-9]*(?:\.[0-9]+)?(?:pt|mm|cm|ex|em|bp|dd|pc|in)\]").expect("valid regex");
});

/// An accent command with its letter.
static ACCENT: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(
        r#"^(?P<accent>\\[`'^~"=.Hbcdkruv])(?: *(?P<letter1>[A-Za-z]|\\i|\\j)|\{(?P<letter2>[A-Za-z]|\\i|\\j)\})"#,
    )
    .expect("valid regex");
});

/// An accent command with its letter, wrapped in braces.
static ACCENT_IN_BRACE: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(
        r#"^\{(?P<accent>\\[`'^~"=.Hbcdkruv])(?: *(?P<letter1>[A-Za-z]|\\i|\\j)|\{(?P<letter2>[A-Za-z]|\\i|\\j)\})\}"#,
    )
    .expect("valid regex");
});

/// Start of an Rnw code chunk.
static RSWEAVE_BEGIN: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r"^<<[^\r\n]*?>>=").expect("valid regex"));

/// Builder mode, kept on a stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// `$$…$$`, `\[…\]`, math environments.
    DisplayMath,
    /// Sectioning command argument.
    Heading,
    /// Body of an ignored environment.
    IgnoreEnvironment,
    /// `$…$`, `\(…\)`.
    InlineMath,
    /// `\text{…}` inside math.
    InlineText,
    /// Running text.
    ParagraphText,
    /// Rnw code chunk.
    Rsweave,
}

impl Mode {
    /// Math modes.
    const fn is_math(self) -> bool {
        return matches!(self, Self::InlineMath | Self::DisplayMath);
    }

    /// Modes whose characters are checked.
    const fn is_text(self) -> bool {
        return !self.is_math() && !matches!(self, Self::IgnoreEnvironment);
    }
}

/// Whether the first real token of a math group reads with a vowel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MathVowel {
    /// Reads with a consonant.
    Consonant,
    /// No token seen yet.
    Undecided,
    /// Reads with a vowel (`$x$`, `\alpha`).
    Vowel,
}

/// How the end of an ignored environment is recognised.
#[derive(Debug, Clone)]
struct EnvironmentEnd {
    /// The marker must not be followed by a letter (`\stop` form).
    letter_boundary: bool,
    /// `\end{name}` or `\stopname`.
    marker: String,
}

impl EnvironmentEnd {
    /// Length of the end marker at the start of `rest`, if present.
    fn match_len(&self, rest: &str) -> Option<usize> {
        let after = rest.strip_prefix(self.marker.as_str())?;
        if self.letter_boundary && after.chars().next().is_some_and(|ch| return ch.is_ascii_alphabetic()) {
            return None;
        }
        return Some(self.marker.len());
    }
}

/// Effective command and environment signatures for one settings value,
/// grouped by literal prefix in declaration order.
#[derive(Debug, Clone, Default)]
pub struct SignatureTables {
    /// Command candidates by prefix.
    commands: HashMap<String, Vec<CommandSignature>>,
    /// Environment candidates by `\begin{name}` prefix.
    environments: HashMap<String, Vec<EnvironmentSignature>>,
}

impl SignatureTables {
    /// Longest command match for the prefix `command` at `pos`; the earliest
    /// declaration wins a tie.
    fn match_command(&self, command: &str, code: &str, pos: usize) -> Option<(usize, Action)> {
        let mut best: Option<(usize, Action)> = None;
        for signature in self.commands.get(command).into_iter().flatten() {
            let Some(len) = signature.match_len(code, pos) else {
                continue;
            };
            if best.is_none_or(|(best_len, _)| return len > best_len) {
                best = Some((len, signature.action()));
            }
        }
        return best;
    }

    /// Longest environment match for the prefix `begin` at `pos`.
    fn match_environment(&self, begin: &str, code: &str, pos: usize) -> Option<(usize, &EnvironmentSignature)> {
        let mut best: Option<(usize, &EnvironmentSignature)> = None;
        for signature in self.environments.get(begin).into_iter().flatten() {
            let Some(len) = signature.command().match_len(code, pos) else {
                continue;
            };
            if signature.ignore_all_arguments() || best.is_none_or(|(best_len, _)| return len > best_len) {
                best = Some((len, signature));
            }
        }
        return best;
    }

    /// Built-in tables plus the user entries of `settings`.
    ///
    /// A user entry whose prototype is already declared replaces that entry's
    /// action in place; other entries are appended.
    pub fn new(settings: &Settings) -> Self {
        let mut commands: Vec<CommandSignature> = defaults::command_signatures().to_vec();
        for (prototype, action_name) in &settings.latex_commands {
            let Some(action) = Action::parse(action_name) else {
                tracing::warn!(prototype, action = action_name.as_str(), "unknown LaTeX command action");
                continue;
            };
            let signature = CommandSignature::new(prototype, action);
            match commands.iter_mut().find(|existing| return existing.prototype() == prototype.as_str()) {
                Some(existing) => *existing = signature,
                None => commands.push(signature),
            }
        }

        let mut environments: Vec<EnvironmentSignature> = defaults::environment_signatures().to_vec();
        for (prototype, action_name) in &settings.latex_environments {
            let action = match Action::parse(action_name) {
                Some(action @ (Action::Default | Action::Ignore)) => action,
                _ => {
                    tracing::warn!(prototype, action = action_name.as_str(), "unknown LaTeX environment action");
                    continue;
                },
            };
            let signature = EnvironmentSignature::new(prototype, action);
            let same = |existing: &&mut EnvironmentSignature| {
                return existing.command().prototype() == signature.command().prototype()
                    && existing.ignore_all_arguments() == signature.ignore_all_arguments();
            };
            match environments.iter_mut().find(same) {
                Some(existing) => *existing = signature,
                None => environments.push(signature),
            }
        }

        let mut tables = Self::default();
        for signature in commands {
            tables.commands.entry(signature.prefix().to_string()).or_default().push(signature);
        }
        for signature in environments {
            tables
                .environments
                .entry(signature.command().prefix().to_string())
                .or_default()
                .push(signature);
        }
        return tables;
    }
}

/// Build the annotated text of one LaTeX-family fragment.
///
/// # Errors
///
/// Returns `Error::ParserStall` in strict mode if the cursor stops advancing.
pub fn build(code: &str, language_id: &str, settings: &Settings, strict: bool) -> Result<AnnotatedText, Error> {
    let tables = SignatureTables::new(settings);
    let mut builder = LatexBuilder::new(code, language_id, settings, &tables, strict);
    while !builder.cursor.at_end() {
        let last = builder.cursor.pos();
        builder.step();
        builder.cursor.guard(last)?;
    }
    let text = builder.cursor.finish();
    tracing::trace!(language_id, parts = ?text.parts(), "built annotated text");
    return Ok(text);
}

/// State of one LaTeX build.
#[derive(Debug)]
#[allow(clippy::struct_excessive_bools, reason = "independent mode flags toggled by separate commands")]
struct LatexBuilder<'a> {
    /// A blank may be inserted before the next math placeholder.
    can_insert_space_before_dummy: bool,
    /// Code position and emitted parts.
    cursor: Cursor<'a>,
    /// Placeholders generated so far.
    dummy_counter: usize,
    /// Punctuation deferred into the next math placeholder.
    dummy_last_punctuation: Option<char>,
    /// A blank deferred into the next math placeholder.
    dummy_last_space: bool,
    /// Exit test of the current ignored environment.
    ignore_environment_end: Option<EnvironmentEnd>,
    /// The current character does not end an empty math group.
    is_math_char_trivial: bool,
    /// No real token in the current math group yet.
    is_math_empty: bool,
    /// Natural language for placeholders.
    language: &'a str,
    /// The last checked character was punctuation.
    last_punctuation: bool,
    /// The last checked character was a blank.
    last_space: bool,
    /// Vowel decision of the current math group.
    math_vowel: MathVowel,
    /// Mode at the start of the current step.
    mode: Mode,
    /// Mode stack; never empty.
    modes: Vec<Mode>,
    /// Keep the deferred blank and punctuation across the next markup.
    preserve_dummy_last: bool,
    /// Whether Rnw code chunks are recognised.
    rsweave: bool,
    /// Effective signatures.
    tables: &'a SignatureTables,
}

impl<'a> LatexBuilder<'a> {
    /// Accent at the cursor as `(length, composed letter)`.
    fn accent(&self, regex: &Regex) -> Option<(usize, String)> {
        let captures = self.cursor.captures_here(regex)?;
        let len = captures.get(0)?.len();
        let accent = captures.name("accent").map_or("", |found| return found.as_str());
        let letter = captures
            .name("letter1")
            .or_else(|| return captures.name("letter2"))
            .map_or("", |found| return found.as_str());
        return Some((len, compose_accent(accent, letter)));
    }

    /// Dispatch on a backslash command.
    fn backslash(&mut self) {
        let command = self.command();
        let math = self.mode.is_math();

        if command == "\\begin" || command == "\\end" || command.starts_with("\\start") || command.starts_with("\\stop")
        {
            self.environment(command);
            return;
        }

        match command {
            "\\$" | "\\%" | "\\&" => self.markup_as(2, command.get(1..).unwrap_or("")),
            "\\[" => {
                self.enter_display_math();
                self.markup(2);
            },
            "\\(" => {
                self.enter_inline_math();
                self.markup(2);
            },
            "\\]" | "\\)" => {
                self.pop_mode();
                let dummy = self.generate_dummy();
                self.markup_as(2, &dummy);
            },
            "\\AA" | "\\L" | "\\O" | "\\SS" | "\\aa" | "\\i" | "\\j" | "\\l" | "\\o" | "\\ss" => {
                let letter = if math { "" } else { special_letter(command) };
                self.markup_as(command.len(), letter);
            },
            "\\`" | "\\'" | "\\^" | "\\~" | "\\\"" | "\\=" | "\\." | "\\H" | "\\b" | "\\c" | "\\d" | "\\k" | "\\r"
            | "\\u" | "\\v" => {
                if math {
                    self.markup(command.len());
                } else if let Some((len, letter)) = self.accent(&ACCENT) {
                    self.markup_as(len, &letter);
                } else {
                    self.markup(command.len());
                }
            },
            "\\-" => self.markup(command.len()),
            "\\ " | "\\," | "\\;" | "\\\\" | "\\hfill" | "\\hspace" | "\\hspace*" | "\\quad" | "\\qquad"
            | "\\newline" => self.spacing(command),
            "\\dots" | "\\eg" | "\\egc" | "\\euro" | "\\ie" | "\\iec" => {
                let reading = if math { "" } else { abbreviation(command) };
                self.markup_as(command.len(), reading);
            },
            "\\notag" | "\\qed" => {
                self.preserve_dummy_last = true;
                self.markup(command.len());
            },
            "\\part" | "\\chapter" | "\\section" | "\\subsection" | "\\subsubsection" | "\\paragraph"
            | "\\subparagraph" | "\\part*" | "\\chapter*" | "\\section*" | "\\subsection*" | "\\subsubsection*"
            | "\\paragraph*" | "\\subparagraph*" => {
                self.markup(command.len());
                let pos = self.cursor.pos();
                if let Some(end) = match_argument(self.cursor.code(), pos, ArgumentType::Bracket) {
                    self.markup(end.saturating_sub(pos));
                }
                self.modes.push(Mode::Heading);
                self.markup(1);
            },
            "\\text" | "\\intertext" => {
                self.modes.push(Mode::InlineText);
                let dummy = if math { self.generate_dummy() } else { String::new() };
                self.markup_as(command.len().saturating_add(1), &dummy);
            },
            "\\verb" => self.verb(),
            _ => self.generic_command(command),
        }
    }

    /// `}`: close a group, ending a heading with a period if it has none.
    fn closing_brace(&mut self) {
        let interpret_as = if self.mode == Mode::Heading && !self.last_punctuation {
            "."
        } else if self.mode.is_text() && self.cursor.peek(1) == Some('{') {
            " "
        } else {
            ""
        };

        self.pop_mode();
        self.markup_as(1, interpret_as);
        self.can_insert_space_before_dummy = true;
        if self.mode.is_text() && self.top_mode().is_math() {
            self.is_math_empty = true;
        }
        self.is_math_char_trivial = true;
    }

    /// The command token at the cursor, or `\` alone.
    fn command(&self) -> &'a str {
        return self.cursor.match_here(&COMMAND).unwrap_or("\\");
    }

    /// Dashes, bracketed lengths, Rnw chunks, and plain characters.
    fn default_character(&mut self) {
        let Some(ch) = self.cursor.current() else {
            return;
        };
        match ch {
            '-' if self.mode.is_text() => {
                let rest = self.cursor.rest();
                if rest.starts_with("---") {
                    self.markup_as(3, "\u{2014}");
                    return;
                }
                if rest.starts_with("--") {
                    self.markup_as(2, "\u{2013}");
                    return;
                }
            },
            '[' => {
                if let Some(length) = self.cursor.match_here(&LENGTH_IN_BRACKET) {
                    self.is_math_char_trivial = true;
                    self.preserve_dummy_last = true;
                    self.markup(length.len());
                    return;
                }
            },
            '<' if self.rsweave => {
                if let Some(begin) = self.cursor.match_here(&RSWEAVE_BEGIN) {
                    self.modes.push(Mode::Rsweave);
                    self.markup(begin.len());
                    return;
                }
            },
            _ => {},
        }

        let len = ch.len_utf8();
        if self.mode.is_text() {
            self.text(len);
            if is_punctuation(ch) {
                self.last_punctuation = true;
            }
        } else {
            self.markup(len);
            if is_punctuation(ch) {
                self.dummy_last_punctuation = Some(ch);
            }
            if self.math_vowel == MathVowel::Undecided {
                self.math_vowel = if is_vowel(ch) { MathVowel::Vowel } else { MathVowel::Consonant };
            }
        }
    }

    /// Deferred punctuation as a string.
    fn deferred_punctuation(&self) -> String {
        return self.dummy_last_punctuation.map(String::from).unwrap_or_default();
    }

    /// `$` and `$$` toggle math.
    fn dollar(&mut self) {
        if self.cursor.rest().starts_with("$$") {
            if self.mode == Mode::DisplayMath {
                self.pop_mode();
                let dummy = self.generate_dummy();
                self.markup_as(2, &dummy);
            } else {
                self.enter_display_math();
                self.markup(2);
            }
        } else if self.mode == Mode::InlineMath {
            self.pop_mode();
            let dummy = self.generate_dummy();
            self.markup_as(1, &dummy);
        } else {
            self.enter_inline_math();
            self.markup(1);
        }
    }

    /// Push display math.
    fn enter_display_math(&mut self) {
        self.modes.push(Mode::DisplayMath);
        self.is_math_empty = true;
        self.math_vowel = MathVowel::Undecided;
        self.can_insert_space_before_dummy = true;
    }

    /// Push inline math.
    fn enter_inline_math(&mut self) {
        self.modes.push(Mode::InlineMath);
        self.is_math_empty = true;
        self.math_vowel = MathVowel::Undecided;
        self.can_insert_space_before_dummy = true;
        self.is_math_char_trivial = true;
    }

    /// `\begin`, `\end`, `\start…`, `\stop…`.
    fn environment(&mut self, command: &'a str) {
        self.preserve_dummy_last = true;
        let is_begin = command == "\\begin" || command.starts_with("\\start");
        let pos = self.cursor.pos();
        let code = self.cursor.code();

        let (argument, name) = if command == "\\begin" || command == "\\end" {
            let argument = code
                .get(pos.saturating_add(command.len())..)
                .and_then(|rest| return ARGUMENT.find(rest))
                .map_or("", |found| return found.as_str());
            let name = argument.get(1..argument.len().saturating_sub(1)).unwrap_or("");
            (argument, name)
        } else {
            let prefix = if is_begin { "\\start" } else { "\\stop" };
            ("", command.get(prefix.len()..).unwrap_or(""))
        };

        let mut arguments_processed = false;
        let mut interpret_as = String::new();

        if MATH_ENVIRONMENTS.contains(&name) {
            self.markup(command.len());
            if is_begin {
                if name == "math" {
                    self.enter_inline_math();
                } else {
                    self.enter_display_math();
                }
            } else {
                self.pop_mode();
                interpret_as = self.generate_dummy();
            }
        } else if is_begin {
            let begin = format!("{command}{argument}");
            match self.tables.match_environment(&begin, code, pos) {
                Some((len, signature)) => {
                    if signature.command().action() == Action::Ignore {
                        self.modes.push(Mode::IgnoreEnvironment);
                        self.ignore_environment_end = Some(if command == "\\begin" {
                            EnvironmentEnd {
                                marker: format!("\\end{{{name}}}"),
                                letter_boundary: false,
                            }
                        } else {
                            EnvironmentEnd {
                                marker: format!("\\stop{name}"),
                                letter_boundary: true,
                            }
                        });
                    } else {
                        self.modes.push(self.mode);
                    }
                    if signature.ignore_all_arguments() {
                        self.markup(command.len());
                    } else {
                        self.markup(len);
                        arguments_processed = true;
                    }
                },
                None => {
                    self.markup(command.len());
                    self.modes.push(self.mode);
                },
            }
        } else {
            self.markup(command.len());
            self.pop_mode();
        }

        if self.top_mode() != Mode::IgnoreEnvironment {
            self.is_math_char_trivial = true;
            self.preserve_dummy_last = true;
            if !arguments_processed {
                self.markup_as(argument.len(), &interpret_as);
                if is_begin {
                    self.environment_arguments();
                }
            }
        }
    }

    /// Drop any run of arguments after `\begin{name}`.
    fn environment_arguments(&mut self) {
        loop {
            let pos = self.cursor.pos();
            let code = self.cursor.code();
            let end = [ArgumentType::Brace, ArgumentType::Bracket, ArgumentType::Parenthesis]
                .into_iter()
                .find_map(|kind| return match_argument(code, pos, kind));
            let Some(end) = end else {
                break;
            };
            self.markup(end.saturating_sub(pos));
        }
    }

    /// Placeholder from the default generator.
    fn generate_dummy(&mut self) -> String {
        return self.generate_dummy_with(DummyGenerator::default());
    }

    /// Placeholder for the unit just closed, shaped by the current mode.
    fn generate_dummy_with(&mut self, generator: DummyGenerator) -> String {
        let starts_with_vowel = self.math_vowel == MathVowel::Vowel;
        let dummy = if self.mode.is_text() {
            generator.generate(self.language, self.next_dummy_number(), starts_with_vowel)
        } else if self.is_math_empty {
            if self.mode == Mode::DisplayMath && !self.last_space {
                " ".to_string()
            } else {
                String::new()
            }
        } else if self.mode == Mode::DisplayMath {
            let lead = if self.last_space { "" } else { " " };
            let word = generator.generate(self.language, self.next_dummy_number(), false);
            let trail = if self.top_mode() == Mode::InlineText {
                if self.dummy_last_space { " " } else { "" }
            } else {
                " "
            };
            format!("{lead}{word}{}{trail}", self.deferred_punctuation())
        } else {
            let word = generator.generate(self.language, self.next_dummy_number(), starts_with_vowel);
            let trail = if self.dummy_last_space { " " } else { "" };
            format!("{word}{}{trail}", self.deferred_punctuation())
        };

        self.dummy_last_space = false;
        self.dummy_last_punctuation = None;
        self.math_vowel = MathVowel::Undecided;
        return dummy;
    }

    /// Commands looked up in the signature tables, else dropped as a token.
    fn generic_command(&mut self, command: &str) {
        if command == "\\" {
            self.markup(1);
            return;
        }
        let code = self.cursor.code();
        let pos = self.cursor.pos();
        match self.tables.match_command(command, code, pos) {
            Some((len, Action::Ignore)) => self.markup(len),
            Some((len, Action::Dummy(generator))) => {
                let dummy = self.generate_dummy_with(generator);
                self.markup_as(len, &dummy);
            },
            Some((_, Action::Default)) | None => {
                if self.mode.is_math() && self.math_vowel == MathVowel::Undecided {
                    self.math_vowel = math_command_vowel(command).unwrap_or(self.math_vowel);
                }
                self.markup(command.len());
            },
        }
    }

    /// Inside an ignored environment: look for its end, drop everything else.
    fn ignored_environment_contents(&mut self) {
        let Some(end) = self.ignore_environment_end.as_ref() else {
            tracing::warn!("ignored environment without an end marker");
            self.pop_mode();
            return;
        };
        match end.match_len(self.cursor.rest()) {
            Some(len) => {
                self.pop_mode();
                self.markup(len);
            },
            None => {
                let len = self.cursor.current_len();
                self.markup(len);
            },
        }
    }

    /// Consume `len` bytes as dropped markup.
    fn markup(&mut self, len: usize) {
        let before = self.cursor.pos();
        self.cursor.markup(len);
        if self.cursor.pos() == before {
            return;
        }
        if self.preserve_dummy_last {
            self.preserve_dummy_last = false;
        } else {
            self.dummy_last_space = false;
            self.dummy_last_punctuation = None;
        }
    }

    /// Consume `len` bytes as markup read as `interpret_as`.
    fn markup_as(&mut self, len: usize, interpret_as: &str) {
        if interpret_as.is_empty() {
            self.markup(len);
            return;
        }
        self.cursor.markup_as(len, interpret_as);
        self.preserve_dummy_last = false;
        self.text_added(interpret_as);
    }

    /// A builder at the start of `code`.
    fn new(code: &'a str, language_id: &'a str, settings: &'a Settings, tables: &'a SignatureTables, strict: bool) -> Self {
        return Self {
            cursor: Cursor::new(code, language_id, strict),
            tables,
            language: &settings.language_short_code,
            rsweave: language_id == "rsweave",
            dummy_counter: 0,
            last_space: false,
            last_punctuation: false,
            dummy_last_space: false,
            dummy_last_punctuation: None,
            is_math_empty: false,
            math_vowel: MathVowel::Undecided,
            preserve_dummy_last: false,
            can_insert_space_before_dummy: false,
            is_math_char_trivial: false,
            ignore_environment_end: None,
            modes: vec![Mode::ParagraphText],
            mode: Mode::ParagraphText,
        };
    }

    /// Take the next placeholder number.
    fn next_dummy_number(&mut self) -> usize {
        let number = self.dummy_counter;
        self.dummy_counter = self.dummy_counter.saturating_add(1);
        return number;
    }

    /// `{`: a length, a braced accent, or a group.
    fn opening_brace(&mut self) {
        if let Some(length) = self.cursor.match_here(&LENGTH_IN_BRACE) {
            self.markup(length.len());
        } else if let Some((len, letter)) = self.accent(&ACCENT_IN_BRACE) {
            self.markup_as(len, &letter);
        } else {
            self.modes.push(self.mode);
            self.markup(1);
        }
    }

    /// `%` comment; a blank line after it is a paragraph break.
    fn percentage(&mut self) {
        let comment = self.cursor.match_here(&COMMENT).unwrap_or("%");
        self.preserve_dummy_last = true;
        self.is_math_char_trivial = true;
        let reading = if contains_two_line_ends(comment) { "\n\n" } else { "" };
        self.markup_as(comment.len(), reading);
    }

    /// Pop a mode, keeping at least one on the stack.
    fn pop_mode(&mut self) {
        self.modes.pop();
        if self.modes.is_empty() {
            self.modes.push(Mode::ParagraphText);
        }
    }

    /// Babel and TeX quote ligatures.
    fn quotation_mark(&mut self) {
        if !self.mode.is_text() {
            self.markup(1);
            return;
        }
        let pair = (self.cursor.current(), self.cursor.peek(1));
        let smart_quote = match pair {
            (Some('`'), Some('`')) | (Some('"'), Some('\'')) => Some("\u{201c}"),
            (Some('\''), Some('\'')) => Some("\u{201d}"),
            (Some('"'), Some('`')) => Some("\u{201e}"),
            (Some('"'), Some('-' | '"' | '|')) => Some(""),
            (Some('"'), Some('=' | '~')) => Some("-"),
            _ => None,
        };
        match smart_quote {
            Some(quote) => self.markup_as(2, quote),
            None => self.text(1),
        }
    }

    /// Spacing commands: one blank in text, a deferred blank in math.
    fn spacing(&mut self, command: &str) {
        let mut len = command.len();
        if command == "\\hspace" || command == "\\hspace*" {
            let after = self.cursor.pos().saturating_add(len);
            let argument = self
                .cursor
                .code()
                .get(after..)
                .and_then(|rest| return ARGUMENT.find(rest))
                .map_or(0, |found| return found.end());
            len = len.saturating_add(argument);
        }

        if self.mode.is_math() && !self.last_space && self.can_insert_space_before_dummy {
            self.markup_as(len, " ");
            return;
        }
        self.preserve_dummy_last = true;
        if self.mode.is_math() {
            self.markup(len);
            self.dummy_last_space = true;
        } else {
            let space = if self.last_space {
                ""
            } else if command == "\\," {
                "\u{202f}"
            } else {
                " "
            };
            self.markup_as(len, space);
        }
    }

    /// Process the character under the cursor.
    fn step(&mut self) {
        self.mode = self.top_mode();
        self.is_math_char_trivial = false;

        if self.mode == Mode::IgnoreEnvironment {
            self.ignored_environment_contents();
        } else if self.rsweave && self.mode == Mode::Rsweave {
            if self.cursor.rest().starts_with('@') {
                self.pop_mode();
                self.markup(1);
            } else {
                let len = self.cursor.current_len();
                self.markup(len);
            }
        } else {
            match self.cursor.current() {
                Some('\\') => self.backslash(),
                Some('{') => self.opening_brace(),
                Some('}') => self.closing_brace(),
                Some('$') => self.dollar(),
                Some('%') => self.percentage(),
                Some(' ' | '&' | '~' | '\n' | '\r' | '\t') => self.whitespace(),
                Some('`' | '\'' | '"') => self.quotation_mark(),
                Some(_) => self.default_character(),
                None => {},
            }
        }

        if !self.is_math_char_trivial {
            self.can_insert_space_before_dummy = false;
            self.is_math_empty = false;
        }
    }

    /// Consume `len` bytes as checked text.
    fn text(&mut self, len: usize) {
        let text = self.cursor.text(len);
        self.text_added(text);
    }

    /// Track the tail of checked text.
    fn text_added(&mut self, text: &str) {
        let Some(last) = text.chars().next_back() else {
            return;
        };
        self.last_space = matches!(last, ' ' | '\n' | '\r');
        self.last_punctuation = is_punctuation(last);
    }

    /// Top of the mode stack.
    fn top_mode(&self) -> Mode {
        return self.modes.last().copied().unwrap_or(Mode::ParagraphText);
    }

    /// `\verb|…|` reads as one placeholder.
    fn verb(&mut self) {
        let rest = self.cursor.rest();
        let after = rest.strip_prefix("\\verb").unwrap_or("");
        let starred = after.strip_prefix('*');
        let body = starred.unwrap_or(after);
        let mut chars = body.chars();
        let closed = chars.next().filter(|delimiter| return *delimiter != '\n').and_then(|delimiter| {
            let contents = chars.as_str();
            return contents
                .find(delimiter)
                .filter(|&end| return !contents.get(..end).unwrap_or("").contains('\n'))
                .map(|end| {
                    return rest
                        .len()
                        .saturating_sub(contents.len())
                        .saturating_add(end)
                        .saturating_add(delimiter.len_utf8());
                });
        });
        match closed {
            Some(len) => {
                let dummy = self.generate_dummy();
                self.markup_as(len, &dummy);
            },
            None => self.markup("\\verb".len()),
        }
    }

    /// Blanks, `~`, and `&` collapse to at most one space.
    fn whitespace(&mut self) {
        let current = self.cursor.current();
        let tie_or_tab = matches!(current, Some('~' | '&'));
        let whitespace = if tie_or_tab {
            self.cursor.rest().get(..1).unwrap_or("")
        } else {
            self.cursor.match_here(&WHITESPACE).unwrap_or(" ")
        };
        self.preserve_dummy_last = true;
        self.is_math_char_trivial = true;

        if self.mode.is_text() {
            if contains_two_line_ends(whitespace) {
                self.markup_as(whitespace.len(), "\n\n");
            } else if current == Some('~') {
                self.markup_as(whitespace.len(), if self.last_space { "" } else { "\u{a0}" });
            } else {
                self.markup_as(whitespace.len(), if self.last_space { "" } else { " " });
            }
        } else {
            self.markup(whitespace.len());
        }

        if tie_or_tab {
            self.dummy_last_space = true;
        }
    }
}

/// Letters produced by the special-letter commands.
fn special_letter(command: &str) -> &'static str {
    return match command {
        "\\AA" => "\u{c5}",
        "\\L" => "\u{141}",
        "\\O" => "\u{d8}",
        "\\SS" => "\u{1e9e}",
        "\\aa" => "\u{e5}",
        "\\i" => "\u{131}",
        "\\j" => "\u{237}",
        "\\l" => "\u{142}",
        "\\o" => "\u{f8}",
        "\\ss" => "\u{df}",
        _ => "",
    };
}

/// Readings of abbreviation commands.
fn abbreviation(command: &str) -> &'static str {
    return match command {
        "\\dots" => "\u{2026}",
        "\\eg" => "e.g.",
        "\\egc" => "e.g.,",
        "\\euro" => "\u{20ac}",
        "\\ie" => "i.e.",
        "\\iec" => "i.e.,",
        _ => "",
    };
}

/// Vowel decision for a math command; `None` leaves it undecided.
fn math_command_vowel(command: &str) -> Option<MathVowel> {
    return match command {
        "\\bm" | "\\boldsymbol" | "\\hat" | "\\mathbb" | "\\mathbf" | "\\mathcal" | "\\mathfrak" | "\\mathit"
        | "\\mathnormal" | "\\mathsf" | "\\mathtt" | "\\mathop" | "\\operatorname" | "\\overbrace"
        | "\\overleftarrow" | "\\overleftrightarrow" | "\\overline" | "\\overrightarrow" | "\\tilde"
        | "\\underbrace" | "\\underline" | "\\vec" | "\\widetilde" | "\\widehat" => None,
        "\\alpha" | "\\ell" | "\\epsilon" | "\\eta" | "\\iota" | "\\Omega" | "\\omega" | "\\varepsilon" => {
            Some(MathVowel::Vowel)
        },
        _ => Some(MathVowel::Consonant),
    };
}

/// Compose an accent command with its letter and normalize to NFC.
fn compose_accent(accent: &str, letter: &str) -> String {
    let base = match letter {
        "\\i" => "\u{131}",
        "\\j" => "\u{237}",
        other => other,
    };
    let mark = match accent.chars().nth(1) {
        Some('`') => "\u{300}",
        Some('\'') => "\u{301}",
        Some('^') => "\u{302}",
        Some('~') => "\u{303}",
        Some('"') => "\u{308}",
        Some('=') => "\u{304}",
        Some('.') => "\u{307}",
        Some('H') => "\u{30b}",
        Some('b') => "\u{331}",
        Some('c') => "\u{327}",
        Some('d') => "\u{323}",
        Some('k') => "\u{328}",
        Some('r') => "\u{30a}",
        Some('u') => "\u{306}",
        Some('v') => "\u{30c}",
        _ => "",
    };
    return format!("{base}{mark}").nfc().collect();
}

/// Sentence punctuation that suppresses a synthesized heading period.
const fn is_punctuation(ch: char) -> bool {
    return matches!(ch, '.' | ',' | ':' | ';' | '\u{2026}');
}

/// Letters whose spoken name starts with a vowel.
const fn is_vowel(ch: char) -> bool {
    return matches!(
        ch.to_ascii_lowercase(),
        'a' | 'e' | 'f' | 'h' | 'i' | 'l' | 'm' | 'n' | 'o' | 'r' | 's' | 'x'
    );
}

/// Whether `text` holds a blank line.
fn contains_two_line_ends(text: &str) -> bool {
    return text.contains("\n\n") || text.contains("\r\n\r\n");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(code: &str) -> String {
        return plain_with(code, &Settings::default());
    }

    fn plain_with(code: &str, settings: &Settings) -> String {
        let text = build(code, "latex", settings, true).unwrap();
        assert_eq!(text.source_text(), code);
        return text.plain_text().to_string();
    }

    fn settings_with_command(prototype: &str, action: &str) -> Settings {
        let mut settings = Settings::default();
        settings.latex_commands.insert(prototype.to_string(), action.to_string());
        return settings;
    }

    #[test]
    fn deeply_nested_groups_are_markup() {
        let code = format!("{}x{}", "{".repeat(2000), "}".repeat(2000));
        assert_eq!(plain(&code).trim(), "x");
        let code = format!("{}x{}", "\\emph{".repeat(500), "}".repeat(500));
        assert_eq!(plain(&code).trim(), "x");
    }

    #[test]
    fn inline_math_becomes_one_placeholder() {
        assert_eq!(plain("This equals $a^{b}$.\n"), "This equals Ina0. ");
    }

    #[test]
    fn citations_become_placeholders() {
        assert_eq!(
            plain("This is a test: \\cite{test1}, \\cite[a]{test2}, \\cite[a][b]{test3}.\n"),
            "This is a test: Dummy0, Dummy1, Dummy2. "
        );
        assert_eq!(plain("\\cites{test}"), "Dummies");
    }

    #[test]
    fn abbreviations_and_colors() {
        assert_eq!(plain("This is good\\dots No, it isn't.\n"), "This is good\u{2026} No, it isn't. ");
        assert_eq!(plain("This is a \\textcolor{mittelblau}{test}.\n"), "This is a test. ");
        assert_eq!(plain("This is a &test.\n"), "This is a test. ");
    }

    #[test]
    fn headings_end_with_a_period() {
        assert_eq!(
            plain(
                "\\section{Heading}\nThis is a test.\n\\subsection[abc]{This is another heading.}\nThis is another test.\n"
            ),
            "Heading. This is a test. This is another heading. This is another test. "
        );
    }

    #[test]
    fn quotes_and_dashes() {
        assert_eq!(plain("This ``is'' a \"`test.\"'\n"), "This \u{201c}is\u{201d} a \u{201e}test.\u{201c} ");
        assert_eq!(
            plain("This is a test -- this is another test --- this is the final test.\n"),
            "This is a test \u{2013} this is another test \u{2014} this is the final test. "
        );
    }

    #[test]
    fn special_letters_and_spacing() {
        assert_eq!(
            plain("Ich hei\\ss{}e anders. Das Wasser ist hei\\ss.\n"),
            "Ich hei\u{df}e anders. Das Wasser ist hei\u{df}. "
        );
        assert_eq!(
            plain("Das macht dann 10 \\euro. Oder z.\\,B. vielleicht doch 12~\\euro{}?\n"),
            "Das macht dann 10 \u{20ac}. Oder z.\u{202f}B. vielleicht doch 12\u{a0}\u{20ac}? "
        );
        assert_eq!(plain("\\AA\\L\\O\\SS"), "\u{c5}\u{141}\u{d8}\u{1e9e}");
        assert_eq!(plain("\\aa\\i\\j\\l\\o\\ss"), "\u{e5}\u{131}\u{237}\u{142}\u{f8}\u{df}");
    }

    #[test]
    fn accents_compose() {
        assert_eq!(
            plain("\\`a\\'a\\^a\\~a\\\"a\\=a\\.a\\H{o}\\b{b}\\c{c}\\d{a}\\k{a}\\r{a}\\u{a}\\v{c}"),
            "\u{e0}\u{e1}\u{e2}\u{e3}\u{e4}\u{101}\u{227}\u{151}\u{1e07}\u{e7}\u{1ea1}\u{105}\u{e5}\u{103}\u{10d}"
        );
    }

    #[test]
    fn user_command_actions() {
        let code = "This is a test: \\foobar{abc}{def}.\n";
        assert_eq!(plain(code), "This is a test: abc def. ");
        assert_eq!(plain_with(code, &settings_with_command("\\foobar{}{}", "ignore")), "This is a test: . ");
        assert_eq!(plain_with(code, &settings_with_command("\\foobar{}{}", "dummy")), "This is a test: Dummy0. ");
        assert_eq!(
            plain_with(code, &settings_with_command("\\foobar{}{}", "pluralDummy")),
            "This is a test: Dummies. "
        );
        assert_eq!(
            plain_with(code, &settings_with_command("\\foobar{}{}", "vowelDummy")),
            "This is a test: Ina0. "
        );
    }

    #[test]
    fn user_override_replaces_default() {
        let code = "This is a test: \\colorbox{abc}{def}.\n";
        assert_eq!(
            plain_with(code, &settings_with_command("\\colorbox{}", "dummy")),
            "This is a test: Dummy0def. "
        );
    }

    #[test]
    fn environments() {
        let code = "This is a test: \\begin{foobar}{abc}def\\end{foobar}.\n";
        assert_eq!(plain(code), "This is a test: def. ");

        let mut settings = Settings::default();
        settings
            .latex_environments
            .insert("\\begin{foobar}".to_string(), "default".to_string());
        assert_eq!(plain_with(code, &settings), "This is a test: abcdef. ");

        let mut settings = Settings::default();
        settings.latex_environments.insert("foobar".to_string(), "ignore".to_string());
        assert_eq!(plain_with(code, &settings), "This is a test: . ");
    }

    #[test]
    fn ignored_environment_swallows_unbalanced_markup() {
        let code = "A \\begin{verbatim}anything{}%odd\\end{verbatim} B";
        assert_eq!(plain(code), "A B");
        let tikz = concat!(
            "This is a test.\n",
            "\\begin{tikzpicture}\n",
            "  \\node[color=mittelblau] at (42mm,0mm) {qwerty};\n",
            "\\end{tikzpicture}\n",
            "This is another sentence.\n",
        );
        assert_eq!(plain(tikz), "This is a test. This is another sentence. ");
    }

    #[test]
    fn display_math_reads_as_a_clause() {
        let code = concat!(
            "Recall that\n",
            "\\begin{equation*}\n",
            "  \\begin{cases}\n",
            "    a&\\text{if $b$,}\\\\\n",
            "    c&\\text{otherwise.}\n",
            "  \\end{cases}\n",
            "\\end{equation*}\n",
            "Now we argue.\n",
        );
        assert_eq!(plain(code), "Recall that Dummy0 if Dummy1, Dummy2 otherwise. Now we argue. ");
    }

    #[test]
    fn bracket_math_delimiters() {
        assert_eq!(
            plain("This is a test: \\[ E = mc^2. \\] And this is another one: \\(c^2\\).\n"),
            "This is a test: Dummy0. And this is another one: Dummy1. "
        );
    }

    #[test]
    fn french_placeholders() {
        let settings = Settings::default().with_language("fr");
        assert_eq!(plain_with("C'est un test: $E = mc^2$.\n", &settings), "C'est un test: Jimmy-0. ");
    }

    #[test]
    fn vowel_decisions_follow_the_first_token() {
        for vowel in ["$A$", "$e$", "$F$", "$h$", "$I$", "$l$", "$M$", "$n$", "$O$", "$r$", "$S$", "$X$", "$\\ell$", "$\\mathcal{r}$"] {
            assert_eq!(plain(vowel), "Ina0", "{vowel}");
        }
        for consonant in ["$b$", "$C$", "$\\ella$", "$\\test a$", "$\\mathcal{b}$"] {
            assert_eq!(plain(consonant), "Dummy0", "{consonant}");
        }
    }

    #[test]
    fn verb_reads_as_a_placeholder() {
        assert_eq!(plain("Use \\verb|x{y| here."), "Use Dummy0 here.");
        assert_eq!(plain("Use \\verb*+z+ here."), "Use Dummy0 here.");
    }

    #[test]
    fn rsweave_chunks_are_skipped() {
        let code = "<<import-packages>>=\nlibrary(tidyverse)\n@\n";
        let rsweave = build(code, "rsweave", &Settings::default(), true).unwrap();
        assert_eq!(rsweave.plain_text(), " ");
        assert_eq!(plain(code), "<<import-packages>>= library(tidyverse) @ ");
    }

    #[test]
    fn comments_keep_paragraph_breaks() {
        assert_eq!(plain("A% comment\n\nB"), "A\n\nB");
        assert_eq!(plain("A % comment\nB"), "A B");
    }

    #[test]
    fn builds_are_deterministic() {
        let code = "Math $x$ and $y$ and \\cite{z}.";
        let first = build(code, "latex", &Settings::default(), true).unwrap();
        let second = build(code, "latex", &Settings::default(), true).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn environment_arguments_are_dropped() {
        let code = concat!(
            "We can do\n",
            "\\begin{itemize}[first-{test}]{[second]-test}\n",
            "  \\item this or\n",
            "  \\item that.\n",
            "\\end{itemize}\n",
        );
        assert_eq!(plain(code), "We can do this or that. ");
        let textblock = concat!(
            "This is a test.\n",
            "\\begin{textblock*}{1mm}[2mm,3mm](4mm,5mm)\n",
            "  abc\\end{textblock*}\n",
            "This is another test.\n",
        );
        assert_eq!(plain(textblock), "This is a test. abc This is another test. ");
    }

    #[test]
    fn hyphenation_and_babel_shorthands() {
        assert_eq!(
            plain("This is a te\\-st. Another te\"-st. Donau\"=Dampf\"\"schiff\"~Fahrt.\n"),
            "This is a test. Another test. Donau-Dampfschiff-Fahrt. "
        );
        assert_eq!(plain("This is a test of\\\\line breaks.\n"), "This is a test of line breaks. ");
        assert_eq!(
            plain("You can see this in \\hyperref[alg:abc]{Sec.\\ \\ref*{alg:abc}}.\n"),
            "You can see this in Sec. Dummy0. "
        );
    }

    #[test]
    fn trailing_math_punctuation_is_kept() {
        let proof = concat!(
            "This is the proof:\n",
            "\\begin{equation}\n",
            "    a^2 + b^2 = c^2\\hspace*{10mm}.\\quad\\qed\n",
            "\\end{equation}\n",
        );
        assert_eq!(plain(proof), "This is the proof: Dummy0. ");
        let footnote = concat!(
            "This is a test: $a = b \\footnote{This is another test: $c$.}$.\n",
            "This is the next sentence: $E = mc^2$.\n",
        );
        assert_eq!(plain(footnote), "This is a test: Ina0. This is the next sentence: Ina1. ");
        assert_eq!(
            plain("This is a test: $a, b, \\dots, c$.\nSecond sentence: a, b, $\\dots$, c.\n"),
            "This is a test: Ina0. Second sentence: a, b, Dummy1, c. "
        );
    }

    #[test]
    fn accent_positions_map_back() {
        let text = build("\\v{S}ekki\n", "latex", &Settings::default(), true).unwrap();
        let starts: Vec<usize> = [0, 2, 3, 4, 5]
            .into_iter()
            .map(|plain_pos| return text.source_position(plain_pos, crate::annotated::Bound::Start))
            .collect();
        assert_eq!(starts, vec![0, 5, 6, 7, 8]);
    }

    #[test]
    fn trailing_backslash_does_not_stall() {
        assert_eq!(plain("End\\"), "End");
    }
}
