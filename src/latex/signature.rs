//! Command and environment signatures parsed from prototype strings.
//!
//! A prototype is a command prefix followed by argument placeholders, e.g.
//! `\cite[]{}` is the prefix `\cite` with one bracket and one brace argument.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use crate::dummy::DummyGenerator;

/// Splits a prototype into its prefix and trailing placeholders.
static PROTOTYPE: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r"^(.+?)(?:\{\}|\[\]|\(\))*$").expect("valid regex"));

/// One argument placeholder at the start of the remaining prototype.
static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r"^(?:(\{\})|(\[\])|(\(\)))").expect("valid regex"));

/// A line comment between a command and its next argument.
static COMMENT: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r"^%[^\r\n]*(?:\r?\n[ \n\r\t]*)?").expect("valid regex"));

/// Environment prototypes spelled out as `\begin{name}…`.
static BEGIN_PROTOTYPE: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r"^\\begin\{([^}]+)\}").expect("valid regex"));

/// Delimiter kind of one argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgumentType {
    /// `{…}`
    Brace,
    /// `[…]`
    Bracket,
    /// `(…)`
    Parenthesis,
}

impl ArgumentType {
    /// The opening delimiter.
    pub const fn opening(self) -> char {
        return match self {
            Self::Brace => '{',
            Self::Bracket => '[',
            Self::Parenthesis => '(',
        };
    }
}

/// What a builder does with a matched command or environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Treat the command token as markup and keep parsing its arguments.
    Default,
    /// Replace the whole match with one placeholder word.
    Dummy(DummyGenerator),
    /// Drop the whole match as markup.
    Ignore,
}

impl Action {
    /// Parse a settings action string (`default`, `ignore`, `dummy`,
    /// `pluralDummy`, `vowelDummy`).
    pub fn parse(action: &str) -> Option<Self> {
        return match action {
            "default" => Some(Self::Default),
            "ignore" => Some(Self::Ignore),
            other => DummyGenerator::for_action(other).map(Self::Dummy),
        };
    }
}

/// How the prefix of a signature is recognised.
#[derive(Debug, Clone)]
enum Prefix {
    /// The prototype could not be parsed; matches nothing.
    Invalid,
    /// The prefix text itself.
    Literal,
    /// The prefix text is a regex (used for BibTeX entry types).
    Pattern(Regex),
}

/// A parsed command prototype plus its action.
#[derive(Debug, Clone)]
pub struct CommandSignature {
    /// Action applied on a match.
    action: Action,
    /// Argument kinds in order.
    arguments: Vec<ArgumentType>,
    /// Text before the first argument placeholder.
    prefix: String,
    /// The prototype as written.
    prototype: String,
    /// Prefix recogniser.
    recogniser: Prefix,
}

impl CommandSignature {
    /// The action applied on a match.
    pub const fn action(&self) -> Action {
        return self.action;
    }

    /// Argument kinds in order.
    pub fn arguments(&self) -> &[ArgumentType] {
        return &self.arguments;
    }

    /// Match the prefix and every argument at byte `from` of `code`.
    ///
    /// A line comment may sit before each argument. Any failing step fails the
    /// whole match.
    pub fn match_at<'a>(&'a self, code: &'a str, from: usize) -> Option<SignatureMatch<'a>> {
        let rest = code.get(from..)?;
        let prefix_len = match &self.recogniser {
            Prefix::Literal => rest.starts_with(self.prefix.as_str()).then_some(self.prefix.len())?,
            Prefix::Pattern(regex) => regex.find(rest).map(|found| return found.end())?,
            Prefix::Invalid => return None,
        };
        if prefix_len == 0 {
            return None;
        }

        let mut pos = from.saturating_add(prefix_len);
        let mut arguments = Vec::with_capacity(self.arguments.len());
        for &kind in &self.arguments {
            pos = pos.saturating_add(comment_len(code, pos));
            let end = match_argument(code, pos, kind)?;
            arguments.push(pos..end);
            pos = end;
        }

        return Some(SignatureMatch {
            signature: self,
            code,
            from,
            to: pos,
            arguments,
        });
    }

    /// Byte length of a match at `from`, if any.
    pub fn match_len(&self, code: &str, from: usize) -> Option<usize> {
        return self.match_at(code, from).map(|found| return found.to.saturating_sub(found.from));
    }

    /// Parse a prototype whose prefix is matched literally.
    pub fn new(prototype: &str, action: Action) -> Self {
        return Self::parse(prototype, action, false);
    }

    /// Parse `prototype`; an unparsable one is logged and never matches.
    fn parse(prototype: &str, action: Action, pattern: bool) -> Self {
        let Some(prefix) = PROTOTYPE.captures(prototype).and_then(|captures| return captures.get(1)) else {
            tracing::warn!(prototype, "invalid command prototype, ignoring it");
            return Self {
                prototype: prototype.to_string(),
                prefix: String::new(),
                arguments: Vec::new(),
                recogniser: Prefix::Invalid,
                action,
            };
        };

        let mut arguments = Vec::new();
        let mut rest = prototype.get(prefix.end()..).unwrap_or("");
        while let Some(placeholder) = PLACEHOLDER.captures(rest) {
            let kind = if placeholder.get(1).is_some() {
                ArgumentType::Brace
            } else if placeholder.get(2).is_some() {
                ArgumentType::Bracket
            } else {
                ArgumentType::Parenthesis
            };
            arguments.push(kind);
            rest = rest.get(2..).unwrap_or("");
        }

        let recogniser = if pattern {
            match Regex::new(&format!("^(?:{})", prefix.as_str())) {
                Ok(regex) => Prefix::Pattern(regex),
                Err(error) => {
                    tracing::warn!(prototype, %error, "invalid command prefix pattern, ignoring it");
                    Prefix::Invalid
                },
            }
        } else {
            Prefix::Literal
        };

        return Self {
            prototype: prototype.to_string(),
            prefix: prefix.as_str().to_string(),
            arguments,
            recogniser,
            action,
        };
    }

    /// The literal (or pattern) text before the arguments.
    pub fn prefix(&self) -> &str {
        return &self.prefix;
    }

    /// Regex source recognising the prefix, for building alternations.
    pub fn prefix_pattern(&self) -> Option<String> {
        return match &self.recogniser {
            Prefix::Literal => Some(regex::escape(&self.prefix)),
            Prefix::Pattern(_) => Some(format!("(?:{})", self.prefix)),
            Prefix::Invalid => None,
        };
    }

    /// The prototype as written.
    pub fn prototype(&self) -> &str {
        return &self.prototype;
    }

    /// Parse a prototype whose prefix is itself a regex.
    pub fn with_pattern_prefix(prototype: &str, action: Action) -> Self {
        return Self::parse(prototype, action, true);
    }
}

/// Length of a line comment starting at `pos`, or zero.
fn comment_len(code: &str, pos: usize) -> usize {
    return code
        .get(pos..)
        .and_then(|rest| return COMMENT.find(rest))
        .map_or(0, |found| return found.end());
}

/// Match one balanced argument of kind `kind` starting at byte `from`.
///
/// Returns the exclusive end of the argument including its closing delimiter.
/// Braces and brackets nest and must close in order; a backslash escapes the
/// next character; parentheses do not nest.
pub fn match_argument(code: &str, from: usize, kind: ArgumentType) -> Option<usize> {
    let rest = code.get(from..)?;
    let mut chars = rest.char_indices();
    let (_, first) = chars.next()?;
    if first != kind.opening() {
        return None;
    }

    let mut stack = vec![kind];
    while let Some((offset, ch)) = chars.next() {
        match ch {
            '\\' => {
                chars.next();
            },
            '{' => stack.push(ArgumentType::Brace),
            '[' => stack.push(ArgumentType::Bracket),
            '}' | ']' => {
                let closing = if ch == '}' { ArgumentType::Brace } else { ArgumentType::Bracket };
                if stack.last() != Some(&closing) {
                    return None;
                }
                if stack.len() == 1 {
                    return Some(from.saturating_add(offset).saturating_add(1));
                }
                stack.pop();
            },
            ')' => {
                if stack.len() == 1 && stack.last() == Some(&ArgumentType::Parenthesis) {
                    return Some(from.saturating_add(offset).saturating_add(1));
                }
            },
            _ => {},
        }
    }
    return None;
}

/// A successful signature match.
#[derive(Debug, Clone)]
pub struct SignatureMatch<'a> {
    /// Argument spans including delimiters.
    arguments: Vec<Range<usize>>,
    /// The code the match was found in.
    code: &'a str,
    /// Byte offset of the prefix.
    from: usize,
    /// The signature that matched.
    signature: &'a CommandSignature,
    /// Exclusive end of the last argument (or of the prefix).
    to: usize,
}

impl<'a> SignatureMatch<'a> {
    /// Span of argument `index` including its delimiters.
    pub fn argument(&self, index: usize) -> Option<Range<usize>> {
        return self.arguments.get(index).cloned();
    }

    /// Contents of argument `index` without its delimiters.
    pub fn argument_contents(&self, index: usize) -> &'a str {
        return self
            .argument_contents_range(index)
            .and_then(|range| return self.code.get(range))
            .unwrap_or("");
    }

    /// Byte offset where the contents of argument `index` start.
    pub fn argument_contents_from(&self, index: usize) -> usize {
        return self.argument_contents_range(index).map_or(self.to, |range| return range.start);
    }

    /// Contents range of argument `index`; delimiters are one ASCII byte each.
    fn argument_contents_range(&self, index: usize) -> Option<Range<usize>> {
        let span = self.arguments.get(index)?;
        return Some(span.start.saturating_add(1)..span.end.saturating_sub(1));
    }

    /// Number of matched arguments.
    pub fn argument_count(&self) -> usize {
        return self.arguments.len();
    }

    /// The matched source text.
    pub fn as_str(&self) -> &'a str {
        return self.code.get(self.from..self.to).unwrap_or("");
    }

    /// Byte offset where the match starts.
    pub const fn from(&self) -> usize {
        return self.from;
    }

    /// The signature that matched.
    pub const fn signature(&self) -> &'a CommandSignature {
        return self.signature;
    }

    /// Exclusive byte offset where the match ends.
    pub const fn to(&self) -> usize {
        return self.to;
    }
}

/// An environment prototype: `\begin{name}` plus optional argument placeholders.
///
/// A bare environment name stands for `\begin{name}` with any arguments
/// following it consumed generically.
#[derive(Debug, Clone)]
pub struct EnvironmentSignature {
    /// The `\begin{…}` command signature.
    command: CommandSignature,
    /// Whether the prototype was a bare name.
    ignore_all_arguments: bool,
    /// Environment name.
    name: String,
}

impl EnvironmentSignature {
    /// The `\begin` command signature.
    pub const fn command(&self) -> &CommandSignature {
        return &self.command;
    }

    /// Whether arguments after `\begin{name}` are left to generic handling.
    pub const fn ignore_all_arguments(&self) -> bool {
        return self.ignore_all_arguments;
    }

    /// Environment name.
    pub fn name(&self) -> &str {
        return &self.name;
    }

    /// Parse a bare environment name or a `\begin{name}…` prototype.
    pub fn new(prototype: &str, action: Action) -> Self {
        if let Some(name) = BEGIN_PROTOTYPE.captures(prototype).and_then(|captures| return captures.get(1)) {
            return Self {
                command: CommandSignature::new(prototype, action),
                name: name.as_str().to_string(),
                ignore_all_arguments: false,
            };
        }
        return Self {
            command: CommandSignature::new(&format!("\\begin{{{prototype}}}"), action),
            name: prototype.to_string(),
            ignore_all_arguments: true,
        };
    }
}
