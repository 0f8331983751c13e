//! Annotated text builders, one per markup grammar.
//!
//! Every builder is a single pass over the fragment's code that emits text
//! and markup parts tiling the code. The registry below picks one by code
//! language id.

pub mod asciidoc;
pub mod cursor;
pub mod gitcommit;
pub mod html;
pub mod markdown;
pub mod org;
pub mod plain;
pub mod program;
pub mod rst;

use crate::annotated::AnnotatedText;
use crate::error::Error;
use crate::fragment::CodeFragment;
use crate::latex;
use program::CommentSyntax;

/// Builder selected by code language id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeBuilder {
    /// AsciiDoc.
    Asciidoc,
    /// Git commit messages.
    GitCommit,
    /// HTML and XHTML.
    Html,
    /// LaTeX family, including BibTeX field values and Rsweave.
    Latex,
    /// Markdown and R Markdown.
    Markdown,
    /// Everything is markup.
    Nop,
    /// Org mode.
    Org,
    /// Everything is text.
    Plaintext,
    /// Comments of a programming language.
    Program,
    /// reStructuredText.
    Restructuredtext,
}

impl CodeBuilder {
    /// Build the annotated text of `fragment`.
    ///
    /// # Errors
    ///
    /// Returns `Error::ParserStall` if `strict` is set and the builder stalls,
    /// or `Error::ParseFailed` if the Markdown parser gives up in strict mode.
    pub fn build(self, fragment: &CodeFragment, strict: bool) -> Result<AnnotatedText, Error> {
        let code = fragment.code.as_str();
        let language_id = fragment.language_id.as_str();
        let settings = &fragment.settings;
        return match self {
            Self::Latex => latex::builder::build(code, language_id, settings, strict),
            Self::Html => html::build(code, strict),
            Self::Markdown => markdown::build(code, settings, strict),
            Self::Org => org::build(code, settings, strict),
            Self::Restructuredtext => rst::build(code, settings, strict),
            Self::Asciidoc => asciidoc::build(code, settings, strict),
            Self::GitCommit => gitcommit::build(code, strict),
            Self::Program => program::build(code, language_id, settings, strict),
            Self::Plaintext => Ok(plain::plaintext(code)),
            Self::Nop => Ok(plain::nop(code)),
        };
    }

    /// The builder for `language_id`, if one is registered.
    pub fn for_language_id(language_id: &str) -> Option<Self> {
        return match language_id {
            "bib" | "bibtex" | "context" | "context.tex" | "latex" | "plaintex" | "rsweave" | "tex" => {
                Some(Self::Latex)
            },
            "html" | "xhtml" => Some(Self::Html),
            "markdown" | "rmd" => Some(Self::Markdown),
            "org" => Some(Self::Org),
            "restructuredtext" => Some(Self::Restructuredtext),
            "asciidoc" => Some(Self::Asciidoc),
            "git-commit" | "gitcommit" => Some(Self::GitCommit),
            "plaintext" => Some(Self::Plaintext),
            "nop" => Some(Self::Nop),
            other => CommentSyntax::for_language_id(other).map(|_| return Self::Program),
        };
    }

    /// Whether any builder handles `language_id`.
    pub fn is_supported(language_id: &str) -> bool {
        return Self::for_language_id(language_id).is_some();
    }
}

/// Build `fragment` with the builder registered for its language id, falling
/// back to plain text for unknown ids.
///
/// # Errors
///
/// See [`CodeBuilder::build`].
pub fn build(fragment: &CodeFragment, strict: bool) -> Result<AnnotatedText, Error> {
    let Some(builder) = CodeBuilder::for_language_id(&fragment.language_id) else {
        tracing::warn!(language_id = %fragment.language_id, "unsupported code language id, treating as plaintext");
        return Ok(plain::plaintext(&fragment.code));
    };
    return builder.build(fragment, strict);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;

    fn plain(language_id: &str, code: &str) -> String {
        let fragment = CodeFragment::new(language_id, code, 0, Settings::default());
        return build(&fragment, true).unwrap().plain_text().to_string();
    }

    #[test]
    fn registry_covers_markup_and_program_ids() {
        assert_eq!(CodeBuilder::for_language_id("tex"), Some(CodeBuilder::Latex));
        assert_eq!(CodeBuilder::for_language_id("rmd"), Some(CodeBuilder::Markdown));
        assert_eq!(CodeBuilder::for_language_id("gitcommit"), Some(CodeBuilder::GitCommit));
        assert_eq!(CodeBuilder::for_language_id("rust"), Some(CodeBuilder::Program));
        assert!(CodeBuilder::is_supported("python"));
        assert!(!CodeBuilder::is_supported("brainfuck"));
    }

    #[test]
    fn unknown_ids_read_as_plaintext() {
        assert_eq!(plain("brainfuck", "a \\b c"), "a \\b c");
    }

    #[test]
    fn nop_hides_everything() {
        assert_eq!(plain("nop", "\\begin{foo}"), "");
    }

    #[test]
    fn every_builder_keeps_the_source() {
        let code = "A *b* \\c{d} <e> `f` #g\n";
        for language_id in ["latex", "html", "markdown", "org", "restructuredtext", "asciidoc", "git-commit", "plaintext"] {
            let fragment = CodeFragment::new(language_id, code, 0, Settings::default());
            let text = build(&fragment, true).unwrap();
            assert_eq!(text.source_text(), code, "{language_id}");
        }
    }
}
