//! Checking whole documents against a grammar engine.
//!
//! The checker fragmentizes a document, builds one annotated text per
//! fragment, sends every enabled fragment to the engine, and maps the
//! returned plain-text matches back onto the document.

use std::collections::BTreeSet;
use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::builders::{CodeBuilder, plain};
use crate::error::Error;
use crate::fragment::{AnnotatedTextFragment, CodeFragment};
use crate::fragmentizer;
use crate::settings::{HiddenFalsePositive, Settings};

/// Longest plain text logged per fragment at debug level, in characters.
const MAX_LOG_TEXT_LENGTH: usize = 100;

/// Runs of spaces and line breaks in engine messages.
static TWO_OR_MORE_SPACES: LazyLock<Regex> = LazyLock::new(|| return Regex::new(r"[ \n]{2,}").expect("valid regex"));

/// What the engine is asked to check for one fragment.
#[derive(Debug)]
pub struct CheckRequest<'a> {
    /// Words that are never unknown.
    pub dictionary: BTreeSet<String>,
    /// Rule ids to switch off.
    pub disabled_rules: BTreeSet<String>,
    /// Rule ids to switch on.
    pub enabled_rules: BTreeSet<String>,
    /// The fragment and its annotated text.
    pub fragment: &'a AnnotatedTextFragment,
    /// Natural language tag, possibly `auto`.
    pub language: &'a str,
    /// Mother tongue tag for false-friend rules.
    pub mother_tongue: Option<&'a str>,
    /// Whether picky rules are requested.
    pub picky: bool,
}

/// A match as reported by the engine, in plain-text coordinates of one fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineMatch {
    /// Message as the engine wrote it.
    pub message: String,
    /// Byte range in the fragment's plain text.
    pub plain_range: Range<usize>,
    /// Suggested replacements, best first.
    pub replacements: Vec<String>,
    /// Id of the rule that matched.
    pub rule_id: String,
    /// Sentence the match was found in.
    pub sentence: String,
}

/// Something that finds grammar and spelling mistakes in annotated text.
pub trait GrammarEngine {
    /// Check one fragment.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine could not be reached or answered with
    /// something unusable. The checker logs it and skips the fragment.
    fn check(&self, request: &CheckRequest<'_>) -> Result<Vec<EngineMatch>, Error>;
}

/// A match in document coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleMatch {
    /// Language the fragment was checked in.
    pub language: String,
    /// Message, with the unknown word prepended for spelling rules.
    pub message: String,
    /// Byte range in the document.
    pub range: Range<usize>,
    /// Suggested replacements, best first.
    pub replacements: Vec<String>,
    /// Id of the rule that matched.
    pub rule_id: String,
    /// Sentence the match was found in.
    pub sentence: String,
}

impl RuleMatch {
    /// Whether the match reports an unknown word.
    pub fn is_unknown_word_rule(&self) -> bool {
        return is_unknown_word_rule(&self.rule_id);
    }
}

/// Whether `rule_id` belongs to a spelling rule.
pub fn is_unknown_word_rule(rule_id: &str) -> bool {
    return rule_id.starts_with("MORFOLOGIK_")
        || rule_id.starts_with("HUNSPELL_")
        || rule_id.ends_with("_SPELLER_RULE")
        || rule_id.ends_with("_SPELLING_RULE")
        || matches!(rule_id, "MUZSKY_ROD_NEZIV_A" | "ZENSKY_ROD_A" | "STREDNY_ROD_A");
}

/// Matches of a whole document plus the fragments they were found in.
#[derive(Debug)]
pub struct CheckResult {
    /// Every fragment of the checked document or range.
    pub fragments: Vec<AnnotatedTextFragment>,
    /// Matches in document order.
    pub matches: Vec<RuleMatch>,
}

/// Checks documents with a grammar engine.
#[derive(Debug)]
pub struct DocumentChecker<E> {
    /// The engine fragments are sent to.
    engine: E,
    /// Abort on builder stalls instead of skipping a character.
    strict: bool,
}

impl<E: GrammarEngine> DocumentChecker<E> {
    /// Build a fragment of a range check.
    fn build_in_range(&self, fragment: CodeFragment) -> Result<AnnotatedTextFragment, Error> {
        if CodeBuilder::for_language_id(&fragment.language_id) == Some(CodeBuilder::Program) {
            let text = plain::plaintext(&fragment.code);
            return Ok(AnnotatedTextFragment::new(fragment, text));
        }
        return AnnotatedTextFragment::build(fragment, self.strict);
    }

    /// Check a whole document.
    ///
    /// # Errors
    ///
    /// Returns `Error::ParserStall` or `Error::ParseFailed` from a strict
    /// build, or `Error::InvalidRegex` for a hidden false positive whose
    /// sentence pattern does not compile.
    pub fn check(&self, code: &str, language_id: &str, settings: &Settings) -> Result<CheckResult, Error> {
        let fragments = fragmentizer::fragmentize(code, language_id, settings);
        let fragments = fragments
            .into_iter()
            .map(|fragment| return AnnotatedTextFragment::build(fragment, self.strict))
            .collect::<Result<Vec<_>, _>>()?;
        return self.check_fragments(fragments, false);
    }

    /// Check one fragment, unless its language id is switched off.
    fn check_fragment(&self, fragment: &AnnotatedTextFragment, in_range: bool) -> Result<Vec<RuleMatch>, Error> {
        let code_fragment = fragment.fragment();
        let settings = &code_fragment.settings;
        if should_skip(&code_fragment.language_id, settings, in_range) {
            tracing::debug!(language_id = %code_fragment.language_id, "skipping fragment, checking is disabled");
            return Ok(Vec::new());
        }
        if fragment.plain_text().trim().is_empty() {
            return Ok(Vec::new());
        }
        log_text_to_be_checked(fragment);

        let hidden = compile_hidden_false_positives(settings.hidden_false_positives_for_language())?;
        let request = CheckRequest {
            fragment,
            language: code_fragment.language(),
            mother_tongue: settings.mother_tongue.as_deref(),
            picky: settings.enable_picky_rules,
            enabled_rules: settings.enabled_rule_ids(),
            disabled_rules: settings.disabled_rule_ids(),
            dictionary: settings.dictionary_words(),
        };
        let engine_matches = self.engine.check(&request).unwrap_or_else(|error| {
            tracing::error!(%error, "grammar engine failed, skipping fragment");
            return Vec::new();
        });
        tracing::debug!(count = engine_matches.len(), "obtained rule matches");

        let mut hidden_count = 0_usize;
        let mut matches = Vec::new();
        for engine_match in engine_matches {
            let sentence = engine_match.sentence.trim();
            if is_hidden(&hidden, &engine_match.rule_id, sentence) {
                tracing::debug!(rule = %engine_match.rule_id, sentence, "hiding false positive");
                hidden_count = hidden_count.saturating_add(1);
                continue;
            }
            let word = fragment.plain_text().get(engine_match.plain_range.clone()).unwrap_or("");
            if is_unknown_word_rule(&engine_match.rule_id) && request.dictionary.contains(word) {
                continue;
            }
            matches.push(to_rule_match(fragment, engine_match, word));
        }
        if hidden_count > 0 {
            tracing::debug!(count = hidden_count, "hid false positives");
        }
        return Ok(matches);
    }

    /// Check built fragments in order and collect their matches.
    fn check_fragments(&self, fragments: Vec<AnnotatedTextFragment>, in_range: bool) -> Result<CheckResult, Error> {
        let mut matches = Vec::new();
        for fragment in &fragments {
            matches.extend(self.check_fragment(fragment, in_range)?);
        }
        return Ok(CheckResult { matches, fragments });
    }

    /// Check only the byte `range` of a document.
    ///
    /// The range is fragmentized on its own. Fragments are checked even if
    /// their language id is not enabled, and program code is read as plain
    /// text since the range usually lies inside a comment.
    ///
    /// # Errors
    ///
    /// See [`DocumentChecker::check`].
    pub fn check_range(
        &self,
        code: &str,
        language_id: &str,
        settings: &Settings,
        range: Range<usize>,
    ) -> Result<CheckResult, Error> {
        let end = floor_char_boundary(code, range.end);
        let start = floor_char_boundary(code, range.start).min(end);
        let part = code.get(start..end).unwrap_or("");
        let fragments = fragmentizer::fragmentize(part, language_id, settings)
            .into_iter()
            .map(|fragment| return self.build_in_range(fragment.shifted(start)))
            .collect::<Result<Vec<_>, _>>()?;
        return self.check_fragments(fragments, true);
    }

    /// The engine.
    pub const fn engine(&self) -> &E {
        return &self.engine;
    }

    /// A lenient checker using `engine`.
    pub const fn new(engine: E) -> Self {
        return Self { engine, strict: false };
    }

    /// The same checker, failing on builder stalls when `strict` is set.
    #[must_use]
    pub const fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        return self;
    }
}

/// Whether a fragment is left out of checking.
fn should_skip(language_id: &str, settings: &Settings, in_range: bool) -> bool {
    if language_id == "nop" {
        return true;
    }
    return !in_range && language_id != "plaintext" && !settings.is_enabled(language_id);
}

/// Compiled hidden false positives: rule id and sentence regex.
fn compile_hidden_false_positives(entries: &[HiddenFalsePositive]) -> Result<Vec<(&str, Regex)>, Error> {
    return entries
        .iter()
        .map(|entry| {
            let regex = Regex::new(&entry.sentence).map_err(|error| {
                return Error::InvalidRegex {
                    reason: error.to_string(),
                    rule: entry.rule.clone(),
                };
            })?;
            return Ok((entry.rule.as_str(), regex));
        })
        .collect();
}

/// Whether a match of `rule_id` in `sentence` is a hidden false positive.
fn is_hidden(hidden: &[(&str, Regex)], rule_id: &str, sentence: &str) -> bool {
    return hidden
        .iter()
        .any(|(rule, regex)| return *rule == rule_id && regex.is_match(sentence));
}

/// Move an engine match into document coordinates and clean up its message.
fn to_rule_match(fragment: &AnnotatedTextFragment, engine_match: EngineMatch, word: &str) -> RuleMatch {
    let message = if is_unknown_word_rule(&engine_match.rule_id) {
        format!("'{word}': {}", engine_match.message)
    } else {
        engine_match.message
    };
    return RuleMatch {
        range: fragment.document_range(engine_match.plain_range),
        message: TWO_OR_MORE_SPACES.replace_all(&message, " ").trim().to_string(),
        rule_id: engine_match.rule_id,
        sentence: engine_match.sentence,
        replacements: engine_match.replacements,
        language: fragment.fragment().language().to_string(),
    };
}

/// Log the plain text about to be checked.
fn log_text_to_be_checked(fragment: &AnnotatedTextFragment) {
    let language = fragment.fragment().language();
    let plain_text = fragment.plain_text();
    tracing::trace!(parts = ?fragment.annotated_text().parts(), "annotated text parts");
    let Some((cut, _)) = plain_text.char_indices().nth(MAX_LOG_TEXT_LENGTH) else {
        tracing::debug!(language, "checking text {plain_text:?}");
        return;
    };
    let text = plain_text.get(..cut).unwrap_or(plain_text);
    tracing::debug!(language, "checking text {text:?} (truncated to {MAX_LOG_TEXT_LENGTH} characters)");
}

/// Largest char boundary of `text` not after `pos`.
fn floor_char_boundary(text: &str, pos: usize) -> usize {
    let mut pos = pos.min(text.len());
    while pos > 0 && !text.is_char_boundary(pos) {
        pos = pos.saturating_sub(1);
    }
    return pos;
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    /// Reports every occurrence of a word, like a spell checker that knows nothing.
    struct FakeEngine {
        rule_id: &'static str,
        word: &'static str,
        requests: RefCell<Vec<(String, String)>>,
    }

    impl FakeEngine {
        fn new(rule_id: &'static str, word: &'static str) -> Self {
            return Self {
                rule_id,
                word,
                requests: RefCell::new(Vec::new()),
            };
        }
    }

    impl GrammarEngine for FakeEngine {
        fn check(&self, request: &CheckRequest<'_>) -> Result<Vec<EngineMatch>, Error> {
            let plain_text = request.fragment.plain_text();
            self.requests
                .borrow_mut()
                .push((request.language.to_string(), plain_text.to_string()));
            return Ok(plain_text
                .match_indices(self.word)
                .map(|(start, word)| {
                    return EngineMatch {
                        rule_id: self.rule_id.to_string(),
                        sentence: format!("  {plain_text}\n"),
                        plain_range: start..start + word.len(),
                        message: "Possible  spelling\n\nmistake.".to_string(),
                        replacements: vec!["test".to_string()],
                    };
                })
                .collect());
        }
    }

    struct FailingEngine;

    impl GrammarEngine for FailingEngine {
        fn check(&self, _request: &CheckRequest<'_>) -> Result<Vec<EngineMatch>, Error> {
            return Err(Error::EngineStatus {
                status: 500,
                uri: "http://localhost/v2/check".to_string(),
            });
        }
    }

    #[test]
    fn matches_map_back_to_the_document() {
        let checker = DocumentChecker::new(FakeEngine::new("MORFOLOGIK_RULE_EN_US", "tset")).strict(true);
        let code = "This is a \\textbf{tset}.\n";
        let result = checker.check(code, "latex", &Settings::default()).unwrap();
        assert_eq!(result.matches.len(), 1);
        let rule_match = &result.matches[0];
        assert_eq!(&code[rule_match.range.clone()], "tset");
        assert_eq!(rule_match.message, "'tset': Possible spelling mistake.");
        assert_eq!(rule_match.language, "en-US");
        assert!(rule_match.is_unknown_word_rule());
    }

    #[test]
    fn fragments_keep_their_language() {
        let checker = DocumentChecker::new(FakeEngine::new("GERMAN_SPELLER_RULE", "Fehlr")).strict(true);
        let code = "Good.\n% ltex: language=de-DE\nEin Fehlr.\n";
        let result = checker.check(code, "latex", &Settings::default()).unwrap();
        assert_eq!(result.matches.len(), 1);
        assert_eq!(result.matches[0].language, "de-DE");
        assert_eq!(&code[result.matches[0].range.clone()], "Fehlr");
        let requests = checker.engine().requests.borrow();
        assert!(requests.iter().any(|(language, _)| language == "de-DE"));
    }

    #[test]
    fn dictionary_words_are_not_unknown() {
        let checker = DocumentChecker::new(FakeEngine::new("MORFOLOGIK_RULE_EN_US", "tset")).strict(true);
        let settings = Settings::default().with_dictionary_words(["tset"]);
        let result = checker.check("A tset.", "markdown", &settings).unwrap();
        assert!(result.matches.is_empty());
    }

    #[test]
    fn hidden_false_positives_are_dropped() {
        let checker = DocumentChecker::new(FakeEngine::new("SOME_RULE", "tset")).strict(true);
        let mut settings = Settings::default();
        settings.hidden_false_positives.insert(
            "en-US".to_string(),
            vec![HiddenFalsePositive {
                rule: "SOME_RULE".to_string(),
                sentence: "^A tset\\.$".to_string(),
            }],
        );
        let result = checker.check("A tset.", "markdown", &settings).unwrap();
        assert!(result.matches.is_empty());
        let result = checker.check("B tset.", "markdown", &settings).unwrap();
        assert_eq!(result.matches.len(), 1);
        assert_eq!(result.matches[0].message, "Possible spelling mistake.");
    }

    #[test]
    fn invalid_hidden_false_positive_is_an_error() {
        let checker = DocumentChecker::new(FakeEngine::new("SOME_RULE", "tset"));
        let mut settings = Settings::default();
        settings.hidden_false_positives.insert(
            "en-US".to_string(),
            vec![HiddenFalsePositive {
                rule: "SOME_RULE".to_string(),
                sentence: "(".to_string(),
            }],
        );
        let result = checker.check("A tset.", "markdown", &settings);
        assert!(matches!(result, Err(Error::InvalidRegex { .. })));
    }

    #[test]
    fn disabled_languages_and_nop_are_skipped() {
        let checker = DocumentChecker::new(FakeEngine::new("SOME_RULE", "tset")).strict(true);
        let result = checker.check("// A tset.\n", "rust", &Settings::default()).unwrap();
        assert!(result.matches.is_empty());
        assert!(checker.engine().requests.borrow().is_empty());
        assert_eq!(result.fragments.len(), 1);
    }

    #[test]
    fn plaintext_is_always_checked() {
        let checker = DocumentChecker::new(FakeEngine::new("SOME_RULE", "tset")).strict(true);
        let settings = Settings::default().with_enabled(BTreeSet::new());
        let result = checker.check("A tset.", "plaintext", &settings).unwrap();
        assert_eq!(result.matches.len(), 1);
    }

    #[test]
    fn range_checks_shift_offsets() {
        let checker = DocumentChecker::new(FakeEngine::new("SOME_RULE", "tset")).strict(true);
        let code = "fn main() {} // A tset here.\n";
        let start = code.find("A tset").unwrap();
        let result = checker
            .check_range(code, "rust", &Settings::default(), start..code.len())
            .unwrap();
        assert_eq!(result.matches.len(), 1);
        assert_eq!(&code[result.matches[0].range.clone()], "tset");
    }

    #[test]
    fn engine_failures_yield_no_matches() {
        let checker = DocumentChecker::new(FailingEngine);
        let result = checker.check("A tset.", "markdown", &Settings::default()).unwrap();
        assert!(result.matches.is_empty());
        assert_eq!(result.fragments.len(), 1);
    }
}
