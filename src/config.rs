use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::error::Error;
use crate::settings::{HiddenFalsePositive, Settings};

/// Name of the project configuration file.
pub const CONFIG_FILE_NAME: &str = ".ltex.toml";

/// Project configuration loaded from `.ltex.toml`.
///
/// Holds the settings every document starts from, plus include/exclude path
/// prefixes applied when a directory is walked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// Path prefixes never walked.
    exclude: Vec<String>,
    /// Path prefixes to walk; empty means everything.
    include: Vec<String>,
    /// Settings every document starts from.
    pub settings: Settings,
}

/// Raw TOML structure for `.ltex.toml`.
///
/// Keys are the snake_case twins of the settings keys. Absent keys keep the
/// defaults.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
struct LtexTomlConfig {
    /// BibTeX field name to whether it is checked.
    bibtex_fields: BTreeMap<String, bool>,
    /// Per-language dictionary words.
    dictionary: BTreeMap<String, BTreeSet<String>>,
    /// Per-language disabled rule ids.
    disabled_rules: BTreeMap<String, BTreeSet<String>>,
    /// Ask for picky rules.
    enable_picky_rules: bool,
    /// Code language ids to check.
    enabled: Option<BTreeSet<String>>,
    /// Per-language enabled rule ids.
    enabled_rules: BTreeMap<String, BTreeSet<String>>,
    /// Path prefixes to skip.
    exclude: Vec<String>,
    /// Per-language hidden false positives.
    hidden_false_positives: BTreeMap<String, Vec<HiddenFalsePositive>>,
    /// Path prefixes to walk.
    include: Vec<String>,
    /// Natural language tag, or `auto`.
    language: Option<String>,
    /// LanguageTool HTTP server.
    language_tool_http_server_uri: Option<String>,
    /// languagetool.org API key.
    language_tool_org_api_key: Option<String>,
    /// languagetool.org username.
    language_tool_org_username: Option<String>,
    /// LaTeX command prototype to action.
    latex_commands: BTreeMap<String, String>,
    /// LaTeX environment prototype to action.
    latex_environments: BTreeMap<String, String>,
    /// Markdown node name to action.
    markdown_nodes: BTreeMap<String, String>,
    /// Mother tongue tag.
    mother_tongue: Option<String>,
}

impl LtexTomlConfig {
    /// Layer the file's values over the default settings.
    fn into_config(self) -> Config {
        let defaults = Settings::default();
        let settings = Settings {
            language_short_code: self.language.unwrap_or(defaults.language_short_code),
            enabled: self.enabled.unwrap_or(defaults.enabled),
            dictionary: self.dictionary,
            disabled_rules: self.disabled_rules,
            enabled_rules: self.enabled_rules,
            hidden_false_positives: self.hidden_false_positives,
            latex_commands: self.latex_commands,
            latex_environments: self.latex_environments,
            markdown_nodes: self.markdown_nodes,
            bibtex_fields: self.bibtex_fields,
            mother_tongue: self.mother_tongue,
            enable_picky_rules: self.enable_picky_rules,
            language_tool_http_server_uri: self.language_tool_http_server_uri,
            language_tool_org_username: self.language_tool_org_username,
            language_tool_org_api_key: self.language_tool_org_api_key,
        };
        return Config {
            settings,
            include: self.include,
            exclude: self.exclude,
        };
    }
}

impl Config {
    /// Load config from `.ltex.toml` in the given root directory.
    /// Returns the defaults if the file doesn't exist.
    /// Returns an error if the file exists but is malformed; a config file
    /// the user wrote is never silently replaced by defaults.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if reading fails (other than not-found),
    /// or `Error::TomlDe` if the TOML is malformed.
    pub fn load(root: &Path) -> Result<Self, Error> {
        let path = root.join(CONFIG_FILE_NAME);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(Error::Io(e)),
        };
        return Self::parse(&content);
    }

    /// Parse the contents of a config file.
    ///
    /// # Errors
    ///
    /// Returns `Error::TomlDe` if the TOML is malformed or has unknown keys.
    pub fn parse(content: &str) -> Result<Self, Error> {
        let raw: LtexTomlConfig = toml::from_str(content)?;
        return Ok(raw.into_config());
    }

    /// Check whether a file path should be walked.
    ///
    /// A path is included if no include patterns are set (walk everything),
    /// or if the path starts with at least one include pattern.
    /// An included path is then excluded if it starts with any exclude pattern.
    pub fn should_check(&self, relative_path: &str) -> bool {
        let included = self.include.is_empty()
            || self.include.iter().any(|p| return relative_path.starts_with(p.as_str()));

        if !included {
            return false;
        }

        return !self.exclude.iter().any(|p| return relative_path.starts_with(p.as_str()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.settings, Settings::default());
        assert!(config.should_check("anything.tex"));
    }

    #[test]
    fn values_override_defaults() {
        let config = Config::parse(
            r#"
language = "de-DE"
enabled = ["latex"]
enable_picky_rules = true
language_tool_http_server_uri = "http://localhost:8081"

[dictionary]
de-DE = ["Fehlr"]

[latex_commands]
'\mycite{}' = "dummy"

[[hidden_false_positives.de-DE]]
rule = "SOME_RULE"
sentence = "^Ein"
"#,
        )
        .unwrap();
        let settings = &config.settings;
        assert_eq!(settings.language_short_code, "de-DE");
        assert!(settings.is_enabled("latex"));
        assert!(!settings.is_enabled("markdown"));
        assert!(settings.enable_picky_rules);
        assert!(settings.dictionary_words().contains("Fehlr"));
        assert_eq!(settings.latex_commands.get("\\mycite{}").map(String::as_str), Some("dummy"));
        assert_eq!(settings.hidden_false_positives_for_language().len(), 1);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "language = [").unwrap();
        assert!(matches!(Config::load(dir.path()), Err(Error::TomlDe(_))));
        assert!(matches!(Config::parse("languag = \"de\""), Err(Error::TomlDe(_))));
    }

    #[test]
    fn include_and_exclude_prefixes() {
        let config = Config::parse("include = [\"docs/\"]\nexclude = [\"docs/drafts/\"]\n").unwrap();
        assert!(config.should_check("docs/intro.md"));
        assert!(!config.should_check("docs/drafts/wip.md"));
        assert!(!config.should_check("src/main.rs"));
    }
}
