//! Inline `ltex:` directives that change settings from their line onwards.

use std::sync::LazyLock;

use regex::Regex;

use super::refine;
use crate::fragment::CodeFragment;
use crate::settings::{self, Settings};

/// `# ltex: …` (Org and git commit messages).
pub static HASH: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r"(?mR)^[ \t]*#[ \t]+(?i:ltex):(.*?)[ \t]*$").expect("valid regex"));

/// `.. ltex: …` (reStructuredText comments).
pub static RST: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r"(?mR)^[ \t]*\.\.[ \t]*(?i:ltex):(.*?)[ \t]*$").expect("valid regex"));

/// `<!-- ltex: … -->` on a line of its own.
pub static HTML_COMMENT: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(r"(?mR)^[ \t]*<!--[ \t]*(?i:ltex):(.*?)[ \t]*-->[ \t]*$").expect("valid regex");
});

/// `// ltex: …` (AsciiDoc line comments).
pub static SLASH: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r"(?mR)^[ \t]*//[ \t]*(?i:ltex):(.*?)[ \t]*$").expect("valid regex"));

/// Markdown link-reference comments `[x]: <> "ltex: …"` and HTML comments.
pub static MARKDOWN: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(concat!(
        r#"(?mR)^[ \t]*\[[^\]]+\]:[ \t]*<>[ \t]*"[ \t]*(?i:ltex):(.*?)"[ \t]*$"#,
        r"|^[ \t]*<!--[ \t]*(?i:ltex):(.*?)[ \t]*-->[ \t]*$",
    ))
    .expect("valid regex");
});

/// YAML front matter carrying a `lang:` key.
static FRONT_MATTER: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(r#"(?msR)\A---[ \t]*$.*?^lang:[ \t]+(?:"([^"\r\n]+)"|'([^'\r\n]+)'|([^\r\n]+?))[ \t]*$.*?^---[ \t]*$"#)
        .expect("valid regex");
});

/// Blanks between `key=value` pairs.
static SEPARATOR: LazyLock<Regex> = LazyLock::new(|| return Regex::new(r"[ \t]+").expect("valid regex"));

/// Split every checkable fragment at the directives matched by `regex`.
///
/// The text before a directive keeps the settings in force; the directive
/// itself becomes a `nop` fragment carrying the new settings, which then apply
/// up to the next directive.
pub fn split_by_directives(fragments: Vec<CodeFragment>, regex: &Regex) -> Vec<CodeFragment> {
    return refine(fragments, |fragment| {
        let mut split = Vec::new();
        let mut settings = fragment.settings.clone();
        let mut from = 0;
        for captures in regex.captures_iter(&fragment.code) {
            let Some(whole) = captures.get(0) else {
                continue;
            };
            split.push(fragment.slice(from..whole.start(), &fragment.language_id, settings.clone()));
            match captures.iter().skip(1).flatten().next() {
                Some(line) => settings = apply(&settings, line.as_str()),
                None => tracing::warn!(directive = whole.as_str(), "could not find settings in directive"),
            }
            split.push(fragment.slice(whole.range(), "nop", settings.clone()));
            from = whole.end();
        }
        split.push(fragment.slice(from..fragment.code.len(), &fragment.language_id, settings));
        return split;
    });
}

/// Apply a directive's `key=value` pairs to `settings`.
///
/// Keys are case-insensitive. `enabled=true` restores the default enabled
/// code languages and any other value disables checking; `language` sets the
/// natural language.
pub fn apply(settings: &Settings, line: &str) -> Settings {
    let mut settings = settings.clone();
    let line = line.trim();
    if line.is_empty() {
        return settings;
    }
    for pair in SEPARATOR.split(line) {
        let Some((key, value)) = pair.split_once('=') else {
            tracing::warn!(setting = pair, "ignoring malformed inline setting");
            continue;
        };
        let (key, value) = (key.trim(), value.trim());
        if key.eq_ignore_ascii_case("enabled") {
            settings.enabled = if value == "true" { settings::default_enabled() } else { Default::default() };
        } else if key.eq_ignore_ascii_case("language") {
            settings.language_short_code = value.to_string();
        } else {
            tracing::warn!(key, value, "ignoring unknown inline setting");
        }
    }
    return settings;
}

/// Language set by a leading YAML front matter block, if any.
pub fn front_matter_language(code: &str) -> Option<&str> {
    let captures = FRONT_MATTER.captures(code)?;
    return captures
        .iter()
        .skip(1)
        .flatten()
        .map(|group| return group.as_str())
        .find(|language| return !language.is_empty());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(code: &str, regex: &Regex) -> Vec<CodeFragment> {
        return split_by_directives(vec![CodeFragment::new("org", code, 0, Settings::default())], regex);
    }

    #[test]
    fn directive_switches_following_text() {
        let code = "Text one.\n  # LTeX: language=de-DE\nText zwei.\n";
        let fragments = split(code, &HASH);
        assert_eq!(fragments.len(), 3);
        assert_eq!(fragments[0].code, "Text one.\n");
        assert_eq!(fragments[0].language(), "en-US");
        assert!(fragments[1].is_nop());
        assert_eq!(fragments[1].from_pos, 10);
        assert_eq!(fragments[2].code, "\nText zwei.\n");
        assert_eq!(fragments[2].language(), "de-DE");
    }

    #[test]
    fn hash_directive_needs_a_blank() {
        assert_eq!(split("#ltex: language=de-DE\n", &HASH).len(), 1);
    }

    #[test]
    fn crlf_lines_keep_carriage_return_out_of_settings() {
        let fragments = split(".. ltex: language=fr\r\nTexte.\r\n", &RST);
        assert_eq!(fragments[1].code, ".. ltex: language=fr");
        assert_eq!(fragments[2].language(), "fr");
    }

    #[test]
    fn markdown_comment_forms() {
        let code = "a\n[comment]: <> \"LTeX: language=de-DE\"\nb\n<!-- ltex: language=fr -->\nc";
        let fragments = split(code, &MARKDOWN);
        let languages: Vec<_> = fragments
            .iter()
            .filter(|fragment| return !fragment.is_nop())
            .map(CodeFragment::language)
            .collect();
        assert_eq!(languages, vec!["en-US", "de-DE", "fr"]);
    }

    #[test]
    fn settings_line_semantics() {
        let settings = Settings::default();
        let changed = apply(&settings, "  Language=de-CH \t enabled=false bogus key=value ");
        assert_eq!(changed.language_short_code, "de-CH");
        assert!(changed.enabled.is_empty());
        let restored = apply(&changed, "enabled=true");
        assert_eq!(restored.enabled, settings::default_enabled());
    }

    #[test]
    fn front_matter_language_forms() {
        assert_eq!(front_matter_language("---\ntitle: x\nlang: de-DE\n---\nText"), Some("de-DE"));
        assert_eq!(front_matter_language("---\nlang: \"fr\"\n---\n"), Some("fr"));
        assert_eq!(front_matter_language("---\nlang: 'nl'\n---\n"), Some("nl"));
        assert_eq!(front_matter_language("Text\n---\nlang: de\n---\n"), None);
        assert_eq!(front_matter_language("---\ntitle: x\n---\n"), None);
    }
}
