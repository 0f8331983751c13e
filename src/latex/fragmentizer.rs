//! Splits LaTeX documents into fragments wherever the language changes.
//!
//! Six passes run in order, each refining the fragments of the previous one:
//! `% ltex:` comment directives, `\usepackage[…]{babel}`, `\selectlanguage`,
//! inline babel commands, babel environments, and commands whose contents
//! form a sentence of their own (footnotes, todo notes). The output tiles the
//! document: delimiters of inline commands and environments become `nop`
//! fragments, their contents fragments of the original grammar.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use super::defaults::{self, BABEL_LANGUAGES};
use super::matcher::SignatureMatcher;
use super::options;
use super::signature::{Action, CommandSignature, SignatureMatch};
use crate::fragment::CodeFragment;
use crate::fragmentizer::{directive, refine};
use crate::settings::Settings;

/// `% ltex: key=value …` on a line of its own.
static COMMENT_DIRECTIVE: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r"(?mR)^[ \t]*%[ \t]*(?i:ltex):(.*?)$").expect("valid regex"));

/// A set of trigger commands plus the language each one switches to.
///
/// A trigger without a fixed language reads it from its arguments.
#[derive(Debug)]
struct Triggers {
    /// Prototype to fixed language tag.
    languages: HashMap<String, &'static str>,
    /// Matcher over every trigger prototype.
    matcher: SignatureMatcher,
}

impl Triggers {
    /// The fixed language of the trigger that produced `found`, if any.
    fn fixed_language(&self, found: &SignatureMatch<'_>) -> Option<&'static str> {
        return self.languages.get(found.signature().prototype()).copied();
    }

    /// Triggers reading their language from an argument.
    fn new(prototypes: &[&str]) -> Self {
        return Self::with_languages(
            prototypes.iter().map(|prototype| return ((*prototype).to_string(), None)).collect(),
        );
    }

    /// Triggers with optional fixed languages, in declaration order.
    fn with_languages(entries: Vec<(String, Option<&'static str>)>) -> Self {
        let mut languages = HashMap::new();
        let mut signatures = Vec::with_capacity(entries.len());
        for (prototype, language) in entries {
            if let Some(language) = language {
                languages.insert(prototype.clone(), language);
            }
            signatures.push(CommandSignature::new(&prototype, Action::Ignore));
        }
        return Self {
            matcher: SignatureMatcher::new(signatures),
            languages,
        };
    }
}

/// `\usepackage[…]{…}`.
static USE_PACKAGE: LazyLock<Triggers> = LazyLock::new(|| return Triggers::new(&["\\usepackage[]{}"]));

/// `\selectlanguage{…}`.
static SELECT_LANGUAGE: LazyLock<Triggers> = LazyLock::new(|| return Triggers::new(&["\\selectlanguage{}"]));

/// `\foreignlanguage` and `\text<tag>`.
static INLINE: LazyLock<Triggers> = LazyLock::new(|| {
    let mut entries = vec![
        ("\\foreignlanguage{}{}".to_string(), None),
        ("\\foreignlanguage[]{}{}".to_string(), None),
    ];
    for (name, tag) in BABEL_LANGUAGES {
        entries.push((format!("\\text{}{{}}", defaults::babel_tag(name)), Some(*tag)));
    }
    return Triggers::with_languages(entries);
});

/// `\begin`/`\end` of `otherlanguage` and of environments named after a language.
static ENVIRONMENTS: LazyLock<Triggers> = LazyLock::new(|| {
    let mut entries = vec![
        ("\\begin{otherlanguage}{}".to_string(), None),
        ("\\begin{otherlanguage*}{}".to_string(), None),
        ("\\begin{otherlanguage*}[]{}".to_string(), None),
        ("\\end{otherlanguage}".to_string(), None),
        ("\\end{otherlanguage*}".to_string(), None),
    ];
    for (name, tag) in BABEL_LANGUAGES {
        let letters = defaults::babel_tag(name);
        let names = if letters.len() == name.len() { vec![(*name).to_string()] } else { vec![(*name).to_string(), letters] };
        for environment in names {
            entries.push((format!("\\begin{{{environment}}}"), Some(*tag)));
            entries.push((format!("\\begin{{{environment}}}[]"), Some(*tag)));
            entries.push((format!("\\end{{{environment}}}"), Some(*tag)));
        }
    }
    return Triggers::with_languages(entries);
});

/// Commands whose last argument is checked as a separate sentence.
static EXTRA: LazyLock<Triggers> =
    LazyLock::new(|| return Triggers::new(&["\\footnote{}", "\\footnote[]{}", "\\todo{}", "\\todo[]{}"]));

/// Fragment a LaTeX-family document.
pub fn fragmentize(code: &str, language_id: &str, settings: &Settings) -> Vec<CodeFragment> {
    let document = CodeFragment::new(language_id, code, 0, settings.clone());
    let mut fragments = directive::split_by_directives(vec![document], &COMMENT_DIRECTIVE);
    fragments = refine(fragments, |fragment| return split_at_switches(fragment, &USE_PACKAGE, babel_package_language));
    fragments = refine(fragments, |fragment| return split_at_switches(fragment, &SELECT_LANGUAGE, argument_language));
    fragments = refine(fragments, |fragment| return split_inline(fragment, &INLINE, true));
    fragments = refine(fragments, split_environments);
    fragments = refine(fragments, |fragment| return split_inline(fragment, &EXTRA, false));
    return fragments;
}

/// Language selected by a `\usepackage[…]{babel}` match.
///
/// An explicit `main=<language>` option wins; otherwise the last option
/// naming a known language does.
fn babel_package_language(found: &SignatureMatch<'_>) -> Option<&'static str> {
    if found.argument_contents(1).trim() != "babel" {
        return None;
    }
    let options = options::parse(found.argument_contents(0));
    let main = options.iter().find_map(|option| {
        if option.key.plain_text != "main" {
            return None;
        }
        return option
            .value
            .as_ref()
            .and_then(|value| return defaults::babel_language(&value.plain_text));
    });
    return main.or_else(|| {
        return options
            .iter()
            .filter_map(|option| return defaults::babel_language(&option.key.plain_text))
            .next_back();
    });
}

/// Language named by the first argument of a switch command.
fn argument_language(found: &SignatureMatch<'_>) -> Option<&'static str> {
    let name = found.argument_contents(0).trim();
    let language = defaults::babel_language(name);
    if language.is_none() {
        tracing::warn!(babel_language = name, "unknown babel language, ignoring switch");
    }
    return language;
}

/// Split where a switch command starts; the command and everything after it
/// get the switched language.
fn split_at_switches(
    fragment: &CodeFragment,
    triggers: &Triggers,
    language: fn(&SignatureMatch<'_>) -> Option<&'static str>,
) -> Vec<CodeFragment> {
    let ignored = fragment.settings.ignored_latex_command_prototypes();
    let mut fragments = Vec::new();
    let mut settings = fragment.settings.clone();
    let mut from = 0;
    for found in triggers.matcher.find_iter(&fragment.code, &ignored) {
        let Some(tag) = language(&found) else {
            continue;
        };
        fragments.push(fragment.slice(from..found.from(), &fragment.language_id, settings.clone()));
        settings = settings.with_language(tag);
        from = found.from();
    }
    fragments.push(fragment.slice(from..fragment.code.len(), &fragment.language_id, settings));
    return fragments;
}

/// Split out the last argument of every trigger as its own fragment.
///
/// With `switches_language`, the contents get the trigger's language (fixed or
/// read from the second-to-last argument); otherwise they keep the settings.
/// Triggers nested in the contents are split recursively.
fn split_inline(fragment: &CodeFragment, triggers: &Triggers, switches_language: bool) -> Vec<CodeFragment> {
    let ignored = fragment.settings.ignored_latex_command_prototypes();
    let mut fragments = Vec::new();
    let mut from = 0;
    for found in triggers.matcher.find_iter(&fragment.code, &ignored) {
        if found.from() < from {
            continue;
        }
        let last = found.argument_count().saturating_sub(1);
        let Some(argument) = found.argument(last) else {
            continue;
        };
        let contents = argument.start.saturating_add(1)..argument.end.saturating_sub(1);

        let mut settings = fragment.settings.clone();
        if switches_language {
            let language = triggers.fixed_language(&found).or_else(|| {
                let name = found.argument_contents(last.saturating_sub(1)).trim();
                let language = defaults::babel_language(name);
                if language.is_none() {
                    tracing::warn!(babel_language = name, "unknown babel language, keeping current language");
                }
                return language;
            });
            if let Some(language) = language {
                settings = settings.with_language(language);
            }
        }

        fragments.push(fragment.sub(from..found.from()));
        fragments.push(fragment.slice(found.from()..contents.start, "nop", fragment.settings.clone()));
        let inner = fragment.slice(contents.clone(), &fragment.language_id, settings);
        fragments.extend(split_inline(&inner, triggers, switches_language));
        fragments.push(fragment.slice(contents.end..found.to(), "nop", fragment.settings.clone()));
        from = found.to();
    }
    fragments.push(fragment.sub(from..fragment.code.len()));
    return fragments;
}

/// Split babel environments, nesting scopes with a settings stack.
///
/// An `\end` without an open scope is left in the text; scopes still open at
/// the end of the fragment run to its end.
fn split_environments(fragment: &CodeFragment) -> Vec<CodeFragment> {
    let ignored = fragment.settings.ignored_latex_command_prototypes();
    let mut fragments = Vec::new();
    let mut stack: Vec<Settings> = vec![fragment.settings.clone()];
    let mut from = 0;
    for found in ENVIRONMENTS.matcher.find_iter(&fragment.code, &ignored) {
        let Some(current) = stack.last().cloned() else {
            break;
        };
        if found.signature().prototype().starts_with("\\begin") {
            let language = ENVIRONMENTS.fixed_language(&found).or_else(|| {
                let name = found.argument_contents(found.argument_count().saturating_sub(1)).trim();
                let language = defaults::babel_language(name);
                if language.is_none() {
                    tracing::warn!(babel_language = name, "unknown babel language, keeping current language");
                }
                return language;
            });
            let settings = language.map_or_else(|| return current.clone(), |language| return current.with_language(language));
            fragments.push(fragment.slice(from..found.from(), &fragment.language_id, current.clone()));
            fragments.push(fragment.slice(found.from()..found.to(), "nop", current));
            stack.push(settings);
            from = found.to();
        } else if stack.len() > 1 {
            fragments.push(fragment.slice(from..found.from(), &fragment.language_id, current));
            stack.pop();
            let outer = stack.last().cloned().unwrap_or_else(|| return fragment.settings.clone());
            fragments.push(fragment.slice(found.from()..found.to(), "nop", outer));
            from = found.to();
        } else {
            tracing::warn!(
                command = found.as_str(),
                position = fragment.from_pos.saturating_add(found.from()),
                "unmatched babel environment end, ignoring it"
            );
        }
    }
    if stack.len() > 1 {
        tracing::warn!(
            open = stack.len().saturating_sub(1),
            "unterminated babel environment, applying it to the end of the fragment"
        );
    }
    let settings = stack.pop().unwrap_or_else(|| return fragment.settings.clone());
    fragments.push(fragment.slice(from..fragment.code.len(), &fragment.language_id, settings));
    return fragments;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checked(fragments: &[CodeFragment]) -> Vec<(&str, usize, &str)> {
        return fragments
            .iter()
            .filter(|fragment| return !fragment.is_nop() && !fragment.code.trim().is_empty())
            .map(|fragment| return (fragment.code.as_str(), fragment.from_pos, fragment.language()))
            .collect();
    }

    fn assert_tiles(code: &str, fragments: &[CodeFragment]) {
        let mut pos = 0;
        for fragment in fragments {
            assert_eq!(fragment.from_pos, pos, "gap before {fragment:?}");
            pos = fragment.end();
        }
        assert_eq!(pos, code.len());
        let joined: String = fragments.iter().map(|fragment| return fragment.code.as_str()).collect();
        assert_eq!(joined, code);
    }

    #[test]
    fn comment_directives_and_extra_commands() {
        let code = concat!(
            "Sentence\\footnote[abc]{Footnote} 1\n",
            "\t\t  %\t ltex: language=de-DE\n",
            "Sentence 2\\todo{Todo note}\n",
            "%ltex:\tlanguage=en-US\n",
            "\n",
            "Sentence 3\n",
        );
        let fragments = fragmentize(code, "latex", &Settings::default());
        assert_tiles(code, &fragments);
        assert_eq!(
            checked(&fragments),
            vec![
                ("Sentence", 0, "en-US"),
                ("Footnote", 23, "en-US"),
                (" 1\n", 32, "en-US"),
                ("\nSentence 2", 62, "de-DE"),
                ("Todo note", 79, "de-DE"),
                ("\n\nSentence 3\n", 111, "en-US"),
            ]
        );
        let directive = fragments.iter().find(|fragment| return fragment.from_pos == 35).unwrap();
        assert!(directive.is_nop());
        assert_eq!(directive.code, "\t\t  %\t ltex: language=de-DE");
        assert_eq!(directive.language(), "de-DE");
    }

    #[test]
    fn ignored_extra_command_stays_inline() {
        let mut settings = Settings::default();
        settings.latex_commands.insert("\\todo{}".to_string(), "ignore".to_string());
        let code = "Sentence 2\\todo{Todo note}\n";
        let fragments = fragmentize(code, "latex", &settings);
        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].code, code);
    }

    #[test]
    fn babel_switches_nest_and_restore() {
        let code = concat!(
            "This is a \\foreignlanguage{ngerman}{Beispiel}.\n",
            "\\selectlanguage{french}\n",
            "C'est un autre \\textenUS{example}.\n",
            "\\selectlanguage{german}\n",
            "Dies ist weiterer \\begin{otherlanguage*}{UKenglish}test\\end{otherlanguage*}.\n",
            "Und schließlich ein abschließender \\begin{american}[abc]\n",
            "  sentence\n",
            "  \\begin{french}[abc]\n",
            "    phrase\n",
            "  \\end{french}\n",
            "\\end{american}.\n",
        );
        let fragments = fragmentize(code, "latex", &Settings::default());
        assert_tiles(code, &fragments);
        let checked = checked(&fragments);
        assert_eq!(checked[0], ("This is a ", 0, "en-US"));
        assert_eq!(checked[1], ("Beispiel", 36, "de-DE"));
        assert_eq!(checked[2], (".\n", 45, "en-US"));
        assert_eq!(checked[3], ("\\selectlanguage{french}\nC'est un autre ", 47, "fr"));
        assert_eq!(checked[4], ("example", 96, "en-US"));
        assert!(checked.contains(&("test", 181, "en-GB")));
        assert!(checked.contains(&("\n    phrase\n  ", 298, "fr")));
        assert!(checked.contains(&("\n  sentence\n  ", 265, "en-US")));
        assert_eq!(checked.last().unwrap(), &(".\n", code.len() - 2, "de-DE"));
    }

    #[test]
    fn nested_otherlanguage_restores_each_level() {
        let code = concat!(
            "\\begin{otherlanguage}{de-DE}Eins ",
            "\\begin{otherlanguage}{fr}deux\\end{otherlanguage}",
            " drei\\end{otherlanguage} four",
        );
        let fragments = fragmentize(code, "latex", &Settings::default());
        assert_tiles(code, &fragments);
        let language_of = |word: &str| {
            let pos = code.find(word).unwrap();
            return fragments
                .iter()
                .find(|fragment| return !fragment.is_nop() && fragment.range().contains(&pos))
                .map(|fragment| return fragment.language().to_string())
                .unwrap();
        };
        assert_eq!(language_of("Eins"), "de-DE");
        assert_eq!(language_of("deux"), "fr");
        assert_eq!(language_of("drei"), "de-DE");
        assert_eq!(language_of("four"), "en-US");
    }

    #[test]
    fn deeply_nested_groups_keep_tiling() {
        let code = format!("{}x{}", "\\foreignlanguage{ngerman}{".repeat(100), "}".repeat(100));
        let fragments = fragmentize(&code, "latex", &Settings::default());
        assert_tiles(&code, &fragments);
        assert!(checked(&fragments).contains(&("x", code.find('x').unwrap(), "de-DE")));
    }

    #[test]
    fn use_package_switches_from_the_command() {
        let code = concat!(
            "This is a test.\n",
            "\\usepackage[\n",
            "  american,  % American English\n",
            "  ngerman,   % German\n",
            "  dummy={abc,def}\n",
            "]{babel}\n",
            "Dies ist ein Test.\n",
        );
        let fragments = fragmentize(code, "latex", &Settings::default());
        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[0].code.len(), 16);
        assert_eq!(fragments[0].language(), "en-US");
        assert_eq!(fragments[1].language(), "de-DE");
    }

    #[test]
    fn use_package_main_option_wins() {
        let code = concat!(
            "This is a test.\n",
            "\\usepackage[\n",
            "  main=ngerman,  % German\n",
            "  american,      % American English\n",
            "]{babel}\n",
            "Dies ist ein Test.\n",
        );
        let fragments = fragmentize(code, "latex", &Settings::default());
        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[1].language(), "de-DE");
    }

    #[test]
    fn commented_use_package_is_ignored() {
        let code = "This is a test.\n  % \\usepackage[ngerman]{babel}\nThis is another test.";
        assert_eq!(fragmentize(code, "latex", &Settings::default()).len(), 1);
    }

    #[test]
    fn unmatched_environment_scopes() {
        let code = "This is a \\begin{de-DE}Beispiel.\n";
        let fragments = fragmentize(code, "latex", &Settings::default());
        assert_tiles(code, &fragments);
        assert_eq!(
            checked(&fragments),
            vec![("This is a ", 0, "en-US"), ("Beispiel.\n", 23, "de-DE")]
        );

        let code = "This is a Beispiel\\end{de-DE}.\n";
        let fragments = fragmentize(code, "latex", &Settings::default());
        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].code.len(), 31);
    }

    #[test]
    fn unknown_foreign_language_keeps_settings() {
        let code = "a \\foreignlanguage{klingon}{b} c";
        let fragments = fragmentize(code, "latex", &Settings::default());
        assert_tiles(code, &fragments);
        assert!(checked(&fragments).contains(&("b", 28, "en-US")));
    }

    #[test]
    fn directive_can_disable_checking() {
        let code = "a\n% LTeX: enabled=false\nb\n% ltex: enabled=true\nc";
        let fragments = fragmentize(code, "latex", &Settings::default());
        let enabled: Vec<_> = fragments
            .iter()
            .filter(|fragment| return !fragment.is_nop())
            .map(|fragment| return fragment.settings.is_enabled("latex"))
            .collect();
        assert_eq!(enabled, vec![true, false, true]);
    }
}
