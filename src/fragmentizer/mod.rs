//! Splitting documents into fragments with their own settings.

pub mod bibtex;
pub mod directive;

use crate::builders::program::CommentSyntax;
use crate::fragment::CodeFragment;
use crate::latex::fragmentizer as latex;
use crate::settings::Settings;

/// Words every program comment may use.
///
/// Doc tags appear as `@param` and `@return`, and Doxygen's `\param` reads as
/// bare `param` once the backslash is dropped. Bare `return` is an English
/// word already, so only `param` needs an entry of its own.
const PROGRAM_DICTIONARY: &[&str] = &["@param", "@return", "param"];

/// Rules that misfire on comments, unless the user enabled them.
const PROGRAM_DISABLED_RULES: &[&str] = &[
    "COPYRIGHT",
    "DASH_RULE",
    "R_SYMBOL",
    "UPPERCASE_SENTENCE_START",
    "WHITESPACE_RULE",
];

/// Fragmentizer selected by code language id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeFragmentizer {
    /// `// ltex:` lines.
    Asciidoc,
    /// BibTeX databases.
    Bibtex,
    /// `# ltex:` lines (Org, git commit messages).
    Hash,
    /// `<!-- ltex: -->` lines.
    Html,
    /// LaTeX family, with babel switches.
    Latex,
    /// Markdown, with front matter and comment directives.
    Markdown,
    /// Magic comments in a programming language's comment syntax.
    Program(CommentSyntax),
    /// `.. ltex:` lines.
    Restructuredtext,
    /// The whole document as one fragment.
    Whole,
}

impl CodeFragmentizer {
    /// The fragmentizer for `language_id`, if it is supported.
    pub fn for_language_id(language_id: &str) -> Option<Self> {
        return match language_id {
            "bib" | "bibtex" => Some(Self::Bibtex),
            "context" | "context.tex" | "latex" | "plaintex" | "rsweave" | "tex" => Some(Self::Latex),
            "markdown" | "rmd" => Some(Self::Markdown),
            "org" | "git-commit" | "gitcommit" => Some(Self::Hash),
            "restructuredtext" => Some(Self::Restructuredtext),
            "html" | "xhtml" => Some(Self::Html),
            "asciidoc" => Some(Self::Asciidoc),
            "nop" | "plaintext" => Some(Self::Whole),
            other => CommentSyntax::for_language_id(other).map(Self::Program),
        };
    }

    /// Split `code` into fragments tiling it.
    pub fn fragmentize(self, code: &str, language_id: &str, settings: &Settings) -> Vec<CodeFragment> {
        let document = || return vec![CodeFragment::new(language_id, code, 0, settings.clone())];
        return match self {
            Self::Bibtex => bibtex::fragmentize(code, language_id, settings),
            Self::Latex => latex::fragmentize(code, language_id, settings),
            Self::Markdown => {
                let settings = directive::front_matter_language(code)
                    .map_or_else(|| return settings.clone(), |language| return settings.with_language(language));
                let document = CodeFragment::new(language_id, code, 0, settings);
                directive::split_by_directives(vec![document], &directive::MARKDOWN)
            },
            Self::Hash => directive::split_by_directives(document(), &directive::HASH),
            Self::Restructuredtext => directive::split_by_directives(document(), &directive::RST),
            Self::Html => directive::split_by_directives(document(), &directive::HTML_COMMENT),
            Self::Asciidoc => directive::split_by_directives(document(), &directive::SLASH),
            Self::Program(syntax) => match syntax.magic_comment_regex() {
                Ok(regex) => directive::split_by_directives(document(), &regex)
                    .into_iter()
                    .map(with_program_defaults)
                    .collect(),
                Err(error) => {
                    tracing::warn!(language_id, %error, "could not compile magic comment pattern");
                    document().into_iter().map(with_program_defaults).collect()
                },
            },
            Self::Whole => document(),
        };
    }
}

/// Add the comment dictionary and disable the comment-hostile rules.
fn with_program_defaults(mut fragment: CodeFragment) -> CodeFragment {
    let enabled = fragment.settings.enabled_rule_ids();
    let disabled: Vec<&str> = PROGRAM_DISABLED_RULES
        .iter()
        .copied()
        .filter(|rule| return !enabled.contains(*rule))
        .collect();
    fragment.settings = fragment
        .settings
        .with_dictionary_words(PROGRAM_DICTIONARY.iter().copied())
        .with_disabled_rules(disabled);
    return fragment;
}

/// Split a document into fragments.
///
/// Unknown language ids are checked as plain text. Empty fragments are
/// dropped, but an empty document still yields one fragment.
pub fn fragmentize(code: &str, language_id: &str, settings: &Settings) -> Vec<CodeFragment> {
    let (fragmentizer, language_id) = match CodeFragmentizer::for_language_id(language_id) {
        Some(fragmentizer) => (fragmentizer, language_id),
        None => {
            tracing::warn!(language_id, "unsupported code language id, checking as plain text");
            (CodeFragmentizer::Whole, "plaintext")
        },
    };
    let mut fragments = fragmentizer.fragmentize(code, language_id, settings);
    fragments.retain(|fragment| return !fragment.is_empty());
    if fragments.is_empty() {
        fragments.push(CodeFragment::new(language_id, code, 0, settings.clone()));
    }
    return fragments;
}

/// Replace every checkable fragment by the fragments `split` cuts it into.
///
/// `nop` fragments pass through untouched.
pub fn refine<F>(fragments: Vec<CodeFragment>, mut split: F) -> Vec<CodeFragment>
where
    F: FnMut(&CodeFragment) -> Vec<CodeFragment>,
{
    let mut refined = Vec::with_capacity(fragments.len());
    for fragment in fragments {
        if fragment.is_nop() {
            refined.push(fragment);
        } else {
            refined.extend(split(&fragment));
        }
    }
    return refined;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_one_fragment() {
        let fragments = fragmentize("", "latex", &Settings::default());
        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].code, "");
        assert_eq!(fragments[0].language_id, "latex");
    }

    #[test]
    fn empty_fragments_are_dropped() {
        let fragments = fragmentize("\\footnote{x}", "latex", &Settings::default());
        assert!(fragments.iter().all(|fragment| return !fragment.code.is_empty()));
        assert_eq!(fragments.len(), 3);
    }

    #[test]
    fn unknown_language_id_falls_back_to_plaintext() {
        let fragments = fragmentize("Some text.", "klingon-script", &Settings::default());
        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].language_id, "plaintext");
    }

    #[test]
    fn markdown_front_matter_sets_document_language() {
        let code = "---\nlang: de-DE\n---\nText.\n<!-- ltex: language=fr -->\nTexte.\n";
        let fragments = fragmentize(code, "markdown", &Settings::default());
        assert_eq!(fragments.len(), 3);
        assert_eq!(fragments[0].language(), "de-DE");
        assert_eq!(fragments[2].language(), "fr");
    }

    #[test]
    fn program_fragments_get_comment_defaults() {
        let mut settings = Settings::default();
        settings
            .enabled_rules
            .insert("en-US".to_string(), ["DASH_RULE".to_string()].into_iter().collect());
        let code = "// Text.\n// ltex: language=de-DE\n// Mehr.\n";
        let fragments = fragmentize(code, "rust", &settings);
        assert_eq!(fragments.len(), 3);
        let first = &fragments[0].settings;
        assert!(first.dictionary_words().contains("@param"));
        assert!(first.dictionary_words().contains("@return"));
        assert!(!first.dictionary_words().contains("return"));
        assert!(first.disabled_rule_ids().contains("WHITESPACE_RULE"));
        assert!(!first.disabled_rule_ids().contains("DASH_RULE"));
        assert_eq!(fragments[2].language(), "de-DE");
        assert!(fragments[2].settings.dictionary_words().contains("param"));
    }

    #[test]
    fn fragments_tile_every_grammar() {
        let documents = [
            ("latex", "A \\foreignlanguage{french}{b} c\\footnote{d}.\n% ltex: language=de-DE\ne"),
            ("org", "* Head\n# ltex: language=fr\ntext"),
            ("restructuredtext", "Title\n=====\n\n.. ltex: language=fr\n\ntext"),
            ("asciidoc", "= Title\n// ltex: language=fr\ntext"),
            ("python", "# a\n# ltex: language=fr\nx = 1"),
        ];
        for (language_id, code) in documents {
            let fragments = fragmentize(code, language_id, &Settings::default());
            let joined: String = fragments.iter().map(|fragment| return fragment.code.as_str()).collect();
            assert_eq!(joined, code, "{language_id}");
            let mut pos = 0;
            for fragment in &fragments {
                assert_eq!(fragment.from_pos, pos, "{language_id}");
                pos = fragment.end();
            }
        }
    }
}
