//! CLI commands: plain, annotate, fragments, check.

use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use walkdir::WalkDir;

use ltex_core::builders::CodeBuilder;
use ltex_core::checker::DocumentChecker;
use ltex_core::config::Config;
use ltex_core::diagnostics;
use ltex_core::engine::HttpEngine;
use ltex_core::error::Error;
use ltex_core::fragment::AnnotatedTextFragment;
use ltex_core::language::language_id_for_path;
use ltex_core::settings::Settings;

/// Options shared by every command.
#[derive(Debug, Clone, Default)]
pub struct DocumentOptions {
    /// Natural language forced by the user.
    pub language: Option<String>,
    /// Code language id forced by the user.
    pub language_id: Option<String>,
    /// Fail on builder stalls and unknown language ids.
    pub strict: bool,
}

impl DocumentOptions {
    /// Code language id for `path`: the forced one, else by extension, else plaintext.
    fn language_id_for(&self, path: &Path) -> String {
        return self
            .language_id
            .clone()
            .unwrap_or_else(|| return language_id_for_path(path).unwrap_or("plaintext").to_string());
    }

    /// Project settings with the forced language applied.
    fn settings(&self, config: &Config) -> Settings {
        return self
            .language
            .as_deref()
            .map_or_else(|| return config.settings.clone(), |language| return config.settings.with_language(language));
    }

    /// Reject a forced code language id nothing supports, in strict mode.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownLanguageId` for an unsupported forced id.
    fn validate(&self) -> Result<(), Error> {
        let Some(language_id) = &self.language_id else {
            return Ok(());
        };
        if self.strict && !CodeBuilder::is_supported(language_id) {
            return Err(Error::UnknownLanguageId {
                language_id: language_id.clone(),
            });
        }
        return Ok(());
    }
}

/// Read a document, `-` meaning stdin.
///
/// # Errors
///
/// Returns `Error::Io` if the document cannot be read.
fn read_document(path: &Path) -> Result<String, Error> {
    if path == Path::new("-") {
        return Ok(std::io::read_to_string(std::io::stdin())?);
    }
    return Ok(std::fs::read_to_string(path)?);
}

/// Fragmentize and build one document.
///
/// # Errors
///
/// Returns errors from reading, config loading, or a strict build.
fn annotate_file(path: &Path, options: &DocumentOptions) -> Result<Vec<AnnotatedTextFragment>, Error> {
    options.validate()?;
    let config = Config::load(Path::new("."))?;
    let code = read_document(path)?;
    let language_id = options.language_id_for(path);
    return ltex_core::annotate(&code, &language_id, &options.settings(&config), options.strict);
}

/// Print the plain text of every fragment.
///
/// # Errors
///
/// Returns errors from reading or building the document.
pub fn plain(path: &Path, options: &DocumentOptions) -> Result<(), Error> {
    let fragments = annotate_file(path, options)?;
    let mut stdout = std::io::stdout().lock();
    for fragment in &fragments {
        stdout.write_all(fragment.plain_text().as_bytes())?;
    }
    stdout.flush()?;
    return Ok(());
}

/// Print every annotated-text part as a JSON line.
///
/// # Errors
///
/// Returns errors from reading or building the document, or `Error::Json`.
pub fn annotate(path: &Path, options: &DocumentOptions) -> Result<(), Error> {
    let fragments = annotate_file(path, options)?;
    let mut stdout = std::io::stdout().lock();
    for fragment in &fragments {
        for part in fragment.annotated_text().parts() {
            serde_json::to_writer(&mut stdout, part)?;
            writeln!(stdout)?;
        }
    }
    return Ok(());
}

/// Print one line per fragment: byte range, code language id, language.
///
/// # Errors
///
/// Returns errors from reading or building the document.
pub fn fragments(path: &Path, options: &DocumentOptions) -> Result<(), Error> {
    let fragments = annotate_file(path, options)?;
    let mut stdout = std::io::stdout().lock();
    for fragment in &fragments {
        let code_fragment = fragment.fragment();
        writeln!(
            stdout,
            "{}..{}\t{}\t{}",
            code_fragment.from_pos,
            code_fragment.end(),
            code_fragment.language_id,
            code_fragment.language()
        )?;
    }
    return Ok(());
}

/// Files to check below `paths`, with their code language ids.
///
/// Explicitly named files are always checked; directories are walked and
/// filtered by known extensions and the config's include/exclude prefixes.
fn collect_files(paths: &[PathBuf], config: &Config, options: &DocumentOptions) -> Vec<(PathBuf, String)> {
    let mut files = Vec::new();
    for path in paths {
        if !path.is_dir() {
            files.push((path.clone(), options.language_id_for(path)));
            continue;
        }
        for entry in WalkDir::new(path)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| return e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'))
            .filter_map(Result::ok)
            .filter(|e| return !e.file_type().is_dir())
        {
            let file = entry.path();
            let relative = file.strip_prefix(path).unwrap_or(file).to_string_lossy().into_owned();
            if !config.should_check(&relative) {
                continue;
            }
            let language_id = options
                .language_id
                .as_deref()
                .or_else(|| return language_id_for_path(file));
            if let Some(language_id) = language_id {
                files.push((file.to_path_buf(), language_id.to_string()));
            }
        }
    }
    return files;
}

/// Check files and directories against a LanguageTool server.
///
/// Prints one `path:line:col: [RULE] message (suggestions)` line per match.
/// Exits with 1 if anything was found. Files that are not valid UTF-8 are
/// skipped with a warning.
///
/// # Errors
///
/// Returns `Error::InvalidServerUri` if no usable server is configured,
/// `Error::UnknownLanguageId` for an unsupported forced id in strict mode,
/// and errors from reading files or strict builds.
pub fn check(paths: &[PathBuf], server: Option<&str>, options: &DocumentOptions) -> Result<ExitCode, Error> {
    options.validate()?;
    let config = Config::load(Path::new("."))?;
    let mut settings = options.settings(&config);
    if let Some(server) = server {
        settings.language_tool_http_server_uri = Some(server.to_string());
    }
    let checker = DocumentChecker::new(HttpEngine::from_settings(&settings)?).strict(options.strict);

    let mut match_count = 0_usize;
    let mut file_count = 0_usize;
    let mut stdout = std::io::stdout().lock();
    for (path, language_id) in collect_files(paths, &config, options) {
        let code = match read_document(&path) {
            Ok(code) => code,
            Err(Error::Io(error)) if error.kind() == std::io::ErrorKind::InvalidData => {
                tracing::warn!(path = %path.display(), "skipping file that is not valid UTF-8");
                continue;
            },
            Err(error) => return Err(error),
        };
        let result = checker.check(&code, &language_id, &settings)?;
        file_count = file_count.saturating_add(1);
        let display = path.display().to_string();
        for rule_match in &result.matches {
            writeln!(stdout, "{}", diagnostics::render_match(&display, &code, rule_match))?;
        }
        match_count = match_count.saturating_add(result.matches.len());
    }

    if match_count > 0 {
        eprintln!("{match_count} problems in {file_count} files");
        return Ok(ExitCode::from(1));
    }
    eprintln!("No problems in {file_count} files");
    return Ok(ExitCode::SUCCESS);
}
