//! BibTeX: only the values of prose fields are checked, as LaTeX.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use super::refine;
use crate::fragment::CodeFragment;
use crate::latex::fragmentizer as latex;
use crate::latex::matcher::SignatureMatcher;
use crate::latex::options;
use crate::latex::signature::{Action, CommandSignature};
use crate::settings::Settings;

/// Fields whose values are not prose.
pub const UNCHECKED_FIELDS: &[&str] = &[
    "author",
    "category",
    "date",
    "doi",
    "edition",
    "editor",
    "eid",
    "file",
    "isbn",
    "keywords",
    "month",
    "note",
    "number",
    "options",
    "origlanguage",
    "owner",
    "pages",
    "parent",
    "publisher",
    "pubstate",
    "see",
    "seealso",
    "shorthand",
    "timestamp",
    "translator",
    "url",
    "version",
    "volume",
    "year",
];

/// `@type{…}` entries.
static ENTRY: LazyLock<SignatureMatcher> = LazyLock::new(|| {
    return SignatureMatcher::new(vec![CommandSignature::with_pattern_prefix("@[A-Za-z]+{}", Action::Ignore)]);
});

/// Fragment a BibTeX database.
///
/// Field values become `latex` fragments with `UPPERCASE_SENTENCE_START`
/// disabled; entry syntax, keys, and unchecked fields become `nop`.
pub fn fragmentize(code: &str, language_id: &str, settings: &Settings) -> Vec<CodeFragment> {
    let fragments = latex::fragmentize(code, language_id, settings);
    return refine(fragments, split_fields);
}

/// Whether the value of `field` is checked under `settings`.
fn is_checked(field: &str, settings: &Settings) -> bool {
    let field = field.to_lowercase();
    return settings
        .bibtex_fields
        .get(&field)
        .copied()
        .unwrap_or_else(|| return !UNCHECKED_FIELDS.contains(&field.as_str()));
}

/// Tile one fragment into field values and `nop` syntax.
fn split_fields(fragment: &CodeFragment) -> Vec<CodeFragment> {
    let value_settings = fragment.settings.with_disabled_rules(["UPPERCASE_SENTENCE_START"]);
    let mut fragments = Vec::new();
    let mut from = 0;
    for entry in ENTRY.find_iter(&fragment.code, &BTreeSet::new()) {
        let contents_from = entry.argument_contents_from(0);
        for option in options::parse(entry.argument_contents(0)) {
            let Some(value) = option.value else {
                continue;
            };
            if !is_checked(&option.key.plain_text, &fragment.settings) {
                continue;
            }
            let start = contents_from.saturating_add(value.range.start);
            let end = contents_from.saturating_add(value.range.end);
            fragments.push(fragment.slice(from..start, "nop", fragment.settings.clone()));
            fragments.push(fragment.slice(start..end, "latex", value_settings.clone()));
            from = end;
        }
    }
    fragments.push(fragment.slice(from..fragment.code.len(), "nop", fragment.settings.clone()));
    return fragments;
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATABASE: &str = concat!(
        "@article{key,\n",
        "  author = {Ann Author},\n",
        "  title = {A \\emph{good} title},\n",
        "  journal = \"Journal\",\n",
        "  year = 2020,\n",
        "}\n",
    );

    fn values(fragments: &[CodeFragment]) -> Vec<&str> {
        return fragments
            .iter()
            .filter(|fragment| return !fragment.is_nop())
            .map(|fragment| return fragment.code.as_str())
            .collect();
    }

    #[test]
    fn prose_fields_are_checked() {
        let fragments = fragmentize(DATABASE, "bibtex", &Settings::default());
        assert_eq!(values(&fragments), vec![" {A \\emph{good} title}", " \"Journal\""]);
        let title = fragments.iter().find(|fragment| return !fragment.is_nop()).unwrap();
        assert_eq!(title.language_id, "latex");
        assert_eq!(&DATABASE[title.range()], title.code);
        assert!(title.settings.disabled_rule_ids().contains("UPPERCASE_SENTENCE_START"));
    }

    #[test]
    fn fragments_tile_the_database() {
        let fragments = fragmentize(DATABASE, "bibtex", &Settings::default());
        let joined: String = fragments.iter().map(|fragment| return fragment.code.as_str()).collect();
        assert_eq!(joined, DATABASE);
    }

    #[test]
    fn user_fields_override_defaults() {
        let mut settings = Settings::default();
        settings.bibtex_fields.insert("title".to_string(), false);
        settings.bibtex_fields.insert("note".to_string(), true);
        let fragments = fragmentize("@misc{k, title={T}, note={N}}", "bibtex", &settings);
        assert_eq!(values(&fragments), vec!["{N}"]);
    }

    #[test]
    fn text_outside_entries_is_not_checked() {
        let fragments = fragmentize("Just a comment line.\n", "bibtex", &Settings::default());
        assert!(values(&fragments).is_empty());
    }
}
