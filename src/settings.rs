//! The settings value object threaded through fragmentizers, builders, and the checker.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Code language ids checked when the user has not said otherwise.
pub const DEFAULT_ENABLED: &[&str] = &[
    "asciidoc",
    "bibtex",
    "html",
    "latex",
    "markdown",
    "org",
    "restructuredtext",
    "rsweave",
];

/// Language used when none is configured.
pub const DEFAULT_LANGUAGE: &str = "en-US";

/// A rule match the user marked as a false positive.
///
/// Matches of `rule` whose trimmed sentence contains a match of the `sentence`
/// regex are dropped by the checker.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HiddenFalsePositive {
    /// Rule id the entry applies to.
    pub rule: String,
    /// Regex searched in the sentence of the match.
    pub sentence: String,
}

/// Settings for one checked unit.
///
/// Values are never mutated once handed to a fragmentizer or builder; the
/// `with_*` helpers return modified copies for sub-ranges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// BibTeX field name to whether its value is checked.
    pub bibtex_fields: BTreeMap<String, bool>,
    /// Per-language words that are never reported as unknown.
    pub dictionary: BTreeMap<String, BTreeSet<String>>,
    /// Per-language rule ids switched off.
    pub disabled_rules: BTreeMap<String, BTreeSet<String>>,
    /// Ask the engine for its picky rule level.
    pub enable_picky_rules: bool,
    /// Code language ids that are checked at all.
    pub enabled: BTreeSet<String>,
    /// Per-language rule ids switched on.
    pub enabled_rules: BTreeMap<String, BTreeSet<String>>,
    /// Per-language matches to hide.
    pub hidden_false_positives: BTreeMap<String, Vec<HiddenFalsePositive>>,
    /// Natural language tag such as `en-US`, or `auto`.
    #[serde(rename = "language")]
    pub language_short_code: String,
    /// Base URI of a LanguageTool-compatible HTTP server.
    pub language_tool_http_server_uri: Option<String>,
    /// API key for languagetool.org premium access.
    pub language_tool_org_api_key: Option<String>,
    /// Username for languagetool.org premium access.
    pub language_tool_org_username: Option<String>,
    /// LaTeX command prototype to action string.
    pub latex_commands: BTreeMap<String, String>,
    /// LaTeX environment prototype to action string.
    pub latex_environments: BTreeMap<String, String>,
    /// Markdown node name to action string.
    pub markdown_nodes: BTreeMap<String, String>,
    /// Mother tongue tag, used for false-friend rules.
    pub mother_tongue: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        return Self {
            language_short_code: DEFAULT_LANGUAGE.to_string(),
            enabled: default_enabled(),
            dictionary: BTreeMap::new(),
            disabled_rules: BTreeMap::new(),
            enabled_rules: BTreeMap::new(),
            hidden_false_positives: BTreeMap::new(),
            latex_commands: BTreeMap::new(),
            latex_environments: BTreeMap::new(),
            markdown_nodes: BTreeMap::new(),
            bibtex_fields: BTreeMap::new(),
            mother_tongue: None,
            enable_picky_rules: false,
            language_tool_http_server_uri: None,
            language_tool_org_username: None,
            language_tool_org_api_key: None,
        };
    }
}

/// The default enabled set as owned strings.
pub fn default_enabled() -> BTreeSet<String> {
    return DEFAULT_ENABLED.iter().map(|id| return (*id).to_string()).collect();
}

impl Settings {
    /// Dictionary words of the current language.
    pub fn dictionary_words(&self) -> BTreeSet<String> {
        return self.per_language(&self.dictionary);
    }

    /// Disabled rule ids of the current language.
    pub fn disabled_rule_ids(&self) -> BTreeSet<String> {
        return self.per_language(&self.disabled_rules);
    }

    /// Enabled rule ids of the current language.
    pub fn enabled_rule_ids(&self) -> BTreeSet<String> {
        return self.per_language(&self.enabled_rules);
    }

    /// Hidden false positives of the current language.
    pub fn hidden_false_positives_for_language(&self) -> &[HiddenFalsePositive] {
        return self
            .hidden_false_positives
            .get(&self.language_short_code)
            .map_or(&[], Vec::as_slice);
    }

    /// LaTeX command prototypes whose action is `ignore`.
    ///
    /// The fragmentizer skips its own triggers for these, so a user can turn
    /// off a babel command by ignoring it.
    pub fn ignored_latex_command_prototypes(&self) -> BTreeSet<String> {
        return self
            .latex_commands
            .iter()
            .filter(|(_, action)| return action.as_str() == "ignore")
            .map(|(prototype, _)| return prototype.clone())
            .collect();
    }

    /// Whether fragments of `code_language_id` should be checked.
    pub fn is_enabled(&self, code_language_id: &str) -> bool {
        return self.enabled.contains(code_language_id);
    }

    /// Look up the set stored for the current language.
    fn per_language(&self, map: &BTreeMap<String, BTreeSet<String>>) -> BTreeSet<String> {
        return map.get(&self.language_short_code).cloned().unwrap_or_default();
    }

    /// Copy whose current-language dictionary also contains `words`.
    #[must_use]
    pub fn with_dictionary_words<'a, I>(&self, words: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut settings = self.clone();
        let entry = settings.dictionary.entry(self.language_short_code.clone()).or_default();
        entry.extend(words.into_iter().map(str::to_string));
        return settings;
    }

    /// Copy whose current-language disabled rules also contain `rule_ids`.
    #[must_use]
    pub fn with_disabled_rules<'a, I>(&self, rule_ids: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut settings = self.clone();
        let entry = settings.disabled_rules.entry(self.language_short_code.clone()).or_default();
        entry.extend(rule_ids.into_iter().map(str::to_string));
        return settings;
    }

    /// Copy with a different enabled set.
    #[must_use]
    pub fn with_enabled(&self, enabled: BTreeSet<String>) -> Self {
        let mut settings = self.clone();
        settings.enabled = enabled;
        return settings;
    }

    /// Copy with a different natural language.
    #[must_use]
    pub fn with_language(&self, language_short_code: &str) -> Self {
        let mut settings = self.clone();
        settings.language_short_code = language_short_code.to_string();
        return settings;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_enable_markup_languages() {
        let settings = Settings::default();
        assert_eq!(settings.language_short_code, "en-US");
        assert!(settings.is_enabled("latex"));
        assert!(settings.is_enabled("markdown"));
        assert!(!settings.is_enabled("python"));
    }

    #[test]
    fn with_language_leaves_original_untouched() {
        let settings = Settings::default();
        let german = settings.with_language("de-DE");
        assert_eq!(settings.language_short_code, "en-US");
        assert_eq!(german.language_short_code, "de-DE");
    }

    #[test]
    fn dictionary_is_scoped_by_language() {
        let settings = Settings::default().with_dictionary_words(["LTeX"]);
        assert!(settings.dictionary_words().contains("LTeX"));
        assert!(settings.with_language("fr").dictionary_words().is_empty());
    }

    #[test]
    fn deserializes_camel_case_json() {
        let json = r#"{"language":"de-DE","latexCommands":{"\\foo{}":"ignore"},"enablePickyRules":true}"#;
        let settings: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.language_short_code, "de-DE");
        assert!(settings.enable_picky_rules);
        assert!(settings.ignored_latex_command_prototypes().contains("\\foo{}"));
        assert!(settings.is_enabled("latex"));
    }
}
