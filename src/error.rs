//! Crate-level error types.

/// Errors surfaced by the core and the command line.
///
/// Malformed markup is never an error: builders and fragmentizers log and keep
/// going. What remains here are I/O, configuration, engine transport, and the
/// strict-mode parser stall.
#[allow(clippy::error_impl_error, reason = "crate-wide error type re-exported as ltex_core::Error")]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The grammar engine answered with a non-success HTTP status.
    #[error("grammar engine at {uri} failed with status {status}")]
    EngineStatus {
        /// HTTP status code returned by the engine.
        status: u16,
        /// Endpoint that was called.
        uri: String,
    },

    /// Transport-level failure talking to the grammar engine.
    #[error("http: {0}")]
    Http(
        /// The wrapped HTTP client error.
        #[from]
        Box<ureq::Error>,
    ),

    /// A hidden false positive carries a sentence pattern that is not a valid regex.
    #[error("invalid sentence regex for rule `{rule}`: {reason}")]
    InvalidRegex {
        /// Description of the regex syntax error.
        reason: String,
        /// Rule id the pattern belongs to.
        rule: String,
    },

    /// The configured server URI cannot be used as an HTTP endpoint.
    #[error("invalid server uri: `{uri}`")]
    InvalidServerUri {
        /// The URI as configured.
        uri: String,
    },

    /// Underlying I/O error from the filesystem.
    #[error("io: {0}")]
    Io(
        /// The wrapped I/O error.
        #[from]
        std::io::Error,
    ),

    /// JSON (de)serialization failed.
    #[error("json: {0}")]
    Json(
        /// The wrapped JSON error.
        #[from]
        serde_json::Error,
    ),

    /// A grammar parser gave up on a fragment while running in strict mode.
    #[error("could not parse {language_id} code: {reason}")]
    ParseFailed {
        /// Code language id of the fragment.
        language_id: String,
        /// What the parser reported.
        reason: String,
    },

    /// A builder did not advance its cursor while running in strict mode.
    #[error("{language_id} builder stalled at byte {position}")]
    ParserStall {
        /// Code language id of the stalled builder.
        language_id: String,
        /// Byte offset where the cursor stopped advancing.
        position: usize,
    },

    /// TOML deserialization failed.
    #[error("toml deserialize: {0}")]
    TomlDe(
        /// The wrapped TOML deserialization error.
        #[from]
        toml::de::Error,
    ),

    /// No builder is registered for a code language id and strict handling was requested.
    #[error("unsupported code language id: `{language_id}`")]
    UnknownLanguageId {
        /// The language id that was requested.
        language_id: String,
    },
}

impl From<ureq::Error> for Error {
    fn from(error: ureq::Error) -> Self {
        return Self::Http(Box::new(error));
    }
}
