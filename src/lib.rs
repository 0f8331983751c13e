//! Markup-aware plain-text extraction for grammar checking.
//!
//! A document is split into [`fragment::CodeFragment`]s with their own
//! settings, each fragment is turned into an [`annotated::AnnotatedText`] by
//! the builder for its grammar, and matches a grammar engine finds in the
//! plain text are mapped back onto the document.
//!
//! ```
//! use ltex_core::settings::Settings;
//!
//! let fragments = ltex_core::annotate("See \\cite{knuth}.", "latex", &Settings::default(), true).unwrap();
//! assert_eq!(fragments[0].plain_text(), "See Dummy0.");
//! ```

pub mod annotated;
pub mod builders;
pub mod checker;
pub mod config;
pub mod diagnostics;
pub mod dummy;
pub mod engine;
pub mod error;
pub mod fragment;
pub mod fragmentizer;
pub mod language;
pub mod latex;
pub mod settings;

pub use error::Error;

use fragment::AnnotatedTextFragment;
use settings::Settings;

/// Fragmentize `code` and build the annotated text of every fragment.
///
/// # Errors
///
/// Returns `Error::ParserStall` or `Error::ParseFailed` if `strict` is set
/// and a builder gives up.
pub fn annotate(
    code: &str,
    language_id: &str,
    settings: &Settings,
    strict: bool,
) -> Result<Vec<AnnotatedTextFragment>, Error> {
    return fragmentizer::fragmentize(code, language_id, settings)
        .into_iter()
        .map(|fragment| return AnnotatedTextFragment::build(fragment, strict))
        .collect();
}
