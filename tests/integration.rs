use std::path::Path;
use std::process::Command;

use ltex_core::annotated::Part;
use ltex_core::checker::{CheckRequest, DocumentChecker, EngineMatch, GrammarEngine};
use ltex_core::error::Error;
use ltex_core::settings::Settings;

fn ltex_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_ltex-core"));
    cmd.current_dir(dir);
    cmd.env_remove("RUST_LOG");
    return cmd;
}

fn write(dir: &Path, name: &str, content: &str) {
    std::fs::write(dir.join(name), content).unwrap();
}

/// Reports every word in the engine's list as a spelling mistake.
struct ListEngine(&'static [&'static str]);

impl GrammarEngine for ListEngine {
    fn check(&self, request: &CheckRequest<'_>) -> Result<Vec<EngineMatch>, Error> {
        let plain_text = request.fragment.plain_text();
        let mut matches = Vec::new();
        for word in self.0 {
            for (start, found) in plain_text.match_indices(word) {
                matches.push(EngineMatch {
                    rule_id: "MORFOLOGIK_RULE_EN_US".to_string(),
                    sentence: plain_text.to_string(),
                    plain_range: start..start + found.len(),
                    message: "Possible spelling mistake found.".to_string(),
                    replacements: Vec::new(),
                });
            }
        }
        return Ok(matches);
    }
}

#[test]
fn fragments_tile_every_format() {
    let documents = [
        ("latex", "Intro \\foreignlanguage{ngerman}{Text} $x$.\n% ltex: language=fr\nFin.\n"),
        ("markdown", "---\nlang: de-DE\n---\n# Titel\n\n<!-- ltex: language=en-US -->\nSome *text*.\n"),
        ("org", "* Heading\n# ltex: language=de-DE\nText =code=.\n"),
        ("restructuredtext", "Title\n=====\n\n.. ltex: language=de-DE\n\nText.\n"),
        ("asciidoc", "= Title\n\n// ltex: language=de-DE\nText _here_.\n"),
        ("bibtex", "@article{key,\n  title = {A Title},\n  author = {Someone},\n}\n"),
        ("rust", "/// Adds numbers.\n// ltex: language=de-DE\nfn add() {}\n"),
        ("html", "<p>Hello <!-- ltex: language=de-DE --> Welt</p>"),
    ];
    for (language_id, code) in documents {
        let fragments = ltex_core::annotate(code, language_id, &Settings::default(), true).unwrap();
        let mut pos = 0;
        for fragment in &fragments {
            assert_eq!(fragment.fragment().from_pos, pos, "{language_id}");
            assert_eq!(fragment.annotated_text().source_text(), fragment.fragment().code, "{language_id}");
            pos = fragment.fragment().end();
        }
        assert_eq!(pos, code.len(), "{language_id}");
    }
}

#[test]
fn babel_blocks_restore_the_enclosing_language() {
    let code = concat!(
        "\\begin{otherlanguage}{ngerman}Eins ",
        "\\begin{otherlanguage}{french}deux\\end{otherlanguage}",
        " drei\\end{otherlanguage} four",
    );
    let fragments = ltex_core::annotate(code, "latex", &Settings::default(), true).unwrap();
    let language_of = |word: &str| {
        let pos = code.find(word).unwrap();
        return fragments
            .iter()
            .find(|fragment| return !fragment.fragment().is_nop() && fragment.fragment().range().contains(&pos))
            .map(|fragment| return fragment.fragment().language().to_string())
            .unwrap();
    };
    assert_eq!(language_of("Eins"), "de-DE");
    assert_eq!(language_of("deux"), "fr");
    assert_eq!(language_of("drei"), "de-DE");
    assert_eq!(language_of("four"), "en-US");
}

#[test]
fn builds_are_deterministic() {
    let code = "A \\cite{a} and $b$ and \\ref{c}.\n";
    let first = ltex_core::annotate(code, "latex", &Settings::default(), true).unwrap();
    let second = ltex_core::annotate(code, "latex", &Settings::default(), true).unwrap();
    assert_eq!(first[0].annotated_text(), second[0].annotated_text());
}

#[test]
fn checker_maps_matches_through_placeholders() {
    let checker = DocumentChecker::new(ListEngine(&["wrods", "Dummy0"])).strict(true);
    let code = "Some wrods in \\emph{text}, see \\cite{key}.\n";
    let result = checker.check(code, "latex", &Settings::default()).unwrap();
    let found: Vec<&str> = result.matches.iter().map(|m| return &code[m.range.clone()]).collect();
    assert_eq!(found, vec!["wrods", "\\cite{key}"]);
    assert_eq!(result.matches[0].message, "'wrods': Possible spelling mistake found.");
}

#[test]
fn checker_follows_markdown_into_code_comments() {
    let mut settings = Settings::default();
    settings.enabled.insert("python".to_string());
    let checker = DocumentChecker::new(ListEngine(&["mistaek"])).strict(true);
    let code = "def f():\n    # A mistaek in a *comment*.\n    return 1\n";
    let result = checker.check(code, "python", &settings).unwrap();
    assert_eq!(result.matches.len(), 1);
    assert_eq!(&code[result.matches[0].range.clone()], "mistaek");
}

#[test]
fn cli_prints_plain_text() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "doc.tex", "This equals $a^{b}$.\n");
    let output = ltex_cmd(dir.path()).args(["plain", "doc.tex", "--strict"]).output().unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "This equals Ina0. ");
}

#[test]
fn cli_annotate_round_trips_the_source() {
    let dir = tempfile::tempdir().unwrap();
    let code = "# Title\n\nSome `code` and [a link](https://example.com).\n";
    write(dir.path(), "doc.md", code);
    let output = ltex_cmd(dir.path()).args(["annotate", "doc.md"]).output().unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8(output.stdout).unwrap();
    let source: String = stdout
        .lines()
        .map(|line| return serde_json::from_str::<Part>(line).unwrap().raw().to_string())
        .collect();
    assert_eq!(source, code);
}

#[test]
fn cli_lists_fragments() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "doc.tex", "a\n% ltex: language=de-DE\nb\n");
    let output = ltex_cmd(dir.path()).args(["fragments", "doc.tex"]).output().unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.first(), Some(&"0..2\tlatex\ten-US"));
    assert!(lines.contains(&"2..24\tnop\tde-DE"));
    assert_eq!(lines.last(), Some(&"24..27\tlatex\tde-DE"));
}

#[test]
fn cli_reads_project_config() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), ".ltex.toml", "[latex_commands]\n'\\secret{}' = \"dummy\"\n");
    write(dir.path(), "doc.tex", "Keep \\secret{hidden} this.");
    let output = ltex_cmd(dir.path()).args(["plain", "doc.tex"]).output().unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "Keep Dummy0 this.");
}

#[test]
fn cli_rejects_malformed_config() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), ".ltex.toml", "language = [\n");
    write(dir.path(), "doc.md", "Text.\n");
    let output = ltex_cmd(dir.path()).args(["plain", "doc.md"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid TOML"));
}

#[test]
fn cli_strict_rejects_unknown_language_ids() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "doc.txt", "Text.\n");
    let output = ltex_cmd(dir.path())
        .args(["plain", "doc.txt", "--language-id", "cobol", "--strict"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unsupported Language"));

    let output = ltex_cmd(dir.path()).args(["plain", "doc.txt", "--language-id", "cobol"]).output().unwrap();
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "Text.\n");
}

#[test]
fn cli_check_needs_a_server() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "doc.md", "Text.\n");
    let output = ltex_cmd(dir.path()).args(["check", "doc.md"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("No Grammar Engine"));
}

#[test]
fn cli_check_skips_files_that_are_not_utf8() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("docs")).unwrap();
    std::fs::write(dir.path().join("docs/latin1.md"), b"Caf\xe9 au lait.\n").unwrap();
    let output = ltex_cmd(dir.path())
        .args(["check", "docs", "--server", "http://127.0.0.1:9"])
        .output()
        .unwrap();
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "{stderr}");
    assert!(stderr.contains("not valid UTF-8"), "{stderr}");
    assert!(stderr.contains("No problems in 0 files"), "{stderr}");
}
