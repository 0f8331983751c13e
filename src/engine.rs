//! LanguageTool-compatible HTTP engine.
//!
//! Sends the annotated text of a fragment to `<server>/v2/check` as a form
//! and reads the matches back. The server reports offsets in UTF-16 code
//! units of the fragment source; they are converted to byte offsets and
//! then to plain-text offsets before the checker sees them.

use std::collections::BTreeSet;
use std::time::Duration;

use serde::Deserialize;
use serde_json::json;

use crate::checker::{CheckRequest, EngineMatch, GrammarEngine};
use crate::error::Error;
use crate::settings::Settings;

/// Per-request timeout.
const TIMEOUT: Duration = Duration::from_secs(60);

/// Body of a `/v2/check` answer.
#[derive(Debug, Deserialize)]
struct CheckResponse {
    /// Matches in the order the server found them.
    #[serde(default)]
    matches: Vec<ResponseMatch>,
}

/// One match of a `/v2/check` answer.
#[derive(Debug, Deserialize)]
struct ResponseMatch {
    /// Length in UTF-16 code units.
    length: usize,
    /// Explanation for the user.
    message: String,
    /// Start in UTF-16 code units of the source.
    offset: usize,
    /// Suggested replacements.
    #[serde(default)]
    replacements: Vec<ResponseReplacement>,
    /// The rule that fired.
    rule: ResponseRule,
    /// Sentence the match lies in.
    #[serde(default)]
    sentence: String,
}

/// Rule part of a match.
#[derive(Debug, Deserialize)]
struct ResponseRule {
    /// Rule id such as `MORFOLOGIK_RULE_EN_US`.
    id: String,
}

/// Replacement part of a match.
#[derive(Debug, Deserialize)]
struct ResponseReplacement {
    /// Replacement text.
    value: String,
}

/// Client of a LanguageTool HTTP server.
#[derive(Debug)]
pub struct HttpEngine {
    /// HTTP agent reused across requests.
    agent: ureq::Agent,
    /// languagetool.org API key.
    api_key: Option<String>,
    /// Full URI of the check endpoint.
    check_uri: String,
    /// languagetool.org username.
    username: Option<String>,
}

impl HttpEngine {
    /// The endpoint requests go to.
    pub fn check_uri(&self) -> &str {
        return &self.check_uri;
    }

    /// Form fields of one request.
    ///
    /// # Errors
    ///
    /// Returns `Error::Json` if the annotation cannot be serialized.
    fn form(&self, request: &CheckRequest<'_>) -> Result<Vec<(&'static str, String)>, Error> {
        let data = json!({ "annotation": request.fragment.annotated_text().parts() });
        let mut form = vec![
            ("language", request.language.to_string()),
            ("data", serde_json::to_string(&data)?),
        ];
        if let Some(username) = &self.username {
            form.push(("username", username.clone()));
        }
        if let Some(api_key) = &self.api_key {
            form.push(("apiKey", api_key.clone()));
        }
        if request.picky {
            form.push(("level", "picky".to_string()));
        }
        if let Some(mother_tongue) = request.mother_tongue.filter(|tag| return !tag.is_empty()) {
            form.push(("motherTongue", mother_tongue.to_string()));
        }
        if !request.enabled_rules.is_empty() {
            form.push(("enabledRules", join(&request.enabled_rules)));
        }
        if !request.disabled_rules.is_empty() {
            form.push(("disabledRules", join(&request.disabled_rules)));
        }
        return Ok(form);
    }

    /// Engine for the server and credentials configured in `settings`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidServerUri` if no server is configured or the
    /// configured URI is unusable.
    pub fn from_settings(settings: &Settings) -> Result<Self, Error> {
        let Some(uri) = settings.language_tool_http_server_uri.as_deref() else {
            return Err(Error::InvalidServerUri { uri: String::new() });
        };
        let mut engine = Self::new(uri)?;
        engine.username = settings.language_tool_org_username.clone().filter(|name| return !name.is_empty());
        engine.api_key = settings.language_tool_org_api_key.clone().filter(|key| return !key.is_empty());
        return Ok(engine);
    }

    /// Engine talking to the server at `server_uri`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidServerUri` unless the URI is an `http` or
    /// `https` URI with a host.
    pub fn new(server_uri: &str) -> Result<Self, Error> {
        let trimmed = server_uri.trim().trim_end_matches('/');
        let has_host = trimmed
            .strip_prefix("http://")
            .or_else(|| return trimmed.strip_prefix("https://"))
            .is_some_and(|rest| return !rest.is_empty() && !rest.starts_with('/'));
        if !has_host {
            return Err(Error::InvalidServerUri {
                uri: server_uri.to_string(),
            });
        }
        return Ok(Self {
            agent: ureq::AgentBuilder::new().timeout(TIMEOUT).build(),
            check_uri: format!("{trimmed}/v2/check"),
            username: None,
            api_key: None,
        });
    }
}

impl GrammarEngine for HttpEngine {
    fn check(&self, request: &CheckRequest<'_>) -> Result<Vec<EngineMatch>, Error> {
        let form = self.form(request)?;
        let fields: Vec<(&str, &str)> = form.iter().map(|(key, value)| return (*key, value.as_str())).collect();
        let response = match self.agent.post(&self.check_uri).send_form(&fields) {
            Ok(response) => response,
            Err(ureq::Error::Status(status, _)) => {
                return Err(Error::EngineStatus {
                    status,
                    uri: self.check_uri.clone(),
                });
            },
            Err(error) => return Err(error.into()),
        };
        let body: CheckResponse = serde_json::from_reader(response.into_reader())?;

        let fragment = request.fragment;
        let code = &fragment.fragment().code;
        let from_pos = fragment.fragment().from_pos;
        return Ok(body
            .matches
            .into_iter()
            .map(|response_match| {
                let start = utf16_to_byte_offset(code, response_match.offset);
                let end = utf16_to_byte_offset(code, response_match.offset.saturating_add(response_match.length));
                let plain_range =
                    fragment.plain_range(from_pos.saturating_add(start)..from_pos.saturating_add(end));
                return EngineMatch {
                    rule_id: response_match.rule.id,
                    sentence: response_match.sentence,
                    plain_range,
                    message: response_match.message,
                    replacements: response_match
                        .replacements
                        .into_iter()
                        .map(|replacement| return replacement.value)
                        .collect(),
                };
            })
            .collect());
    }
}

/// Comma-separated rule ids.
fn join(rule_ids: &BTreeSet<String>) -> String {
    return rule_ids.iter().map(String::as_str).collect::<Vec<_>>().join(",");
}

/// Byte offset in `text` of the UTF-16 offset `utf16`, clamped to the end.
///
/// An offset inside a surrogate pair resolves to the start of its character.
pub fn utf16_to_byte_offset(text: &str, utf16: usize) -> usize {
    let mut units = 0_usize;
    for (index, ch) in text.char_indices() {
        units = units.saturating_add(ch.len_utf16());
        if units > utf16 {
            return index;
        }
    }
    return text.len();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotated::{AnnotatedText, Part};
    use crate::fragment::{AnnotatedTextFragment, CodeFragment};

    #[test]
    fn server_uri_must_be_http() {
        assert_eq!(HttpEngine::new("http://localhost:8081/").unwrap().check_uri(), "http://localhost:8081/v2/check");
        assert_eq!(HttpEngine::new("https://api.languagetool.org").unwrap().check_uri(), "https://api.languagetool.org/v2/check");
        assert!(matches!(HttpEngine::new("localhost:8081"), Err(Error::InvalidServerUri { .. })));
        assert!(matches!(HttpEngine::new("http://"), Err(Error::InvalidServerUri { .. })));
    }

    #[test]
    fn missing_server_is_an_error() {
        assert!(matches!(HttpEngine::from_settings(&Settings::default()), Err(Error::InvalidServerUri { .. })));
    }

    #[test]
    fn utf16_offsets_become_byte_offsets() {
        let text = "a\u{e9}\u{1f600}b";
        assert_eq!(utf16_to_byte_offset(text, 0), 0);
        assert_eq!(utf16_to_byte_offset(text, 1), 1);
        assert_eq!(utf16_to_byte_offset(text, 2), 3);
        assert_eq!(utf16_to_byte_offset(text, 3), 3);
        assert_eq!(utf16_to_byte_offset(text, 4), 7);
        assert_eq!(utf16_to_byte_offset(text, 99), 8);
    }

    #[test]
    fn form_carries_annotation_and_options() {
        let mut settings = Settings::default();
        settings.language_tool_http_server_uri = Some("http://localhost:8081".to_string());
        settings.language_tool_org_username = Some("user".to_string());
        settings.language_tool_org_api_key = Some(String::new());
        let engine = HttpEngine::from_settings(&settings).unwrap();
        let fragment = CodeFragment::new("latex", "A \\emph{b}.", 0, settings);
        let fragment = AnnotatedTextFragment::build(fragment, true).unwrap();
        let request = CheckRequest {
            fragment: &fragment,
            language: "en-US",
            mother_tongue: Some("de-DE"),
            picky: true,
            enabled_rules: BTreeSet::new(),
            disabled_rules: ["A", "B"].into_iter().map(String::from).collect(),
            dictionary: BTreeSet::new(),
        };
        let form = engine.form(&request).unwrap();
        let field = |key: &str| return form.iter().find(|(name, _)| *name == key).map(|(_, value)| value.as_str());
        assert_eq!(field("language"), Some("en-US"));
        assert_eq!(field("username"), Some("user"));
        assert_eq!(field("apiKey"), None);
        assert_eq!(field("level"), Some("picky"));
        assert_eq!(field("motherTongue"), Some("de-DE"));
        assert_eq!(field("disabledRules"), Some("A,B"));
        assert_eq!(field("enabledRules"), None);
        let data: serde_json::Value = serde_json::from_str(field("data").unwrap()).unwrap();
        let parts: Vec<Part> = serde_json::from_value(data["annotation"].clone()).unwrap();
        assert_eq!(AnnotatedText::from_parts(parts), *fragment.annotated_text());
    }
}
