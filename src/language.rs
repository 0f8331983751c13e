//! Code language ids by file path.
use std::path::Path;

/// Map a file path to the code language id of its contents.
///
/// Git commit message files are recognized by name, everything else by
/// extension. Returns `None` for files no builder is meant for.
pub fn language_id_for_path(path: &Path) -> Option<&'static str> {
    let name = path.file_name().and_then(|name| return name.to_str()).unwrap_or("");
    if name == "COMMIT_EDITMSG" || name == "MERGE_MSG" {
        return Some("git-commit");
    }
    let ext = path.extension().and_then(|e| return e.to_str()).unwrap_or("");

    return match ext.to_ascii_lowercase().as_str() {
        "adoc" | "asciidoc" => Some("asciidoc"),
        "bib" => Some("bibtex"),
        "c" | "h" => Some("c"),
        "clj" | "cljs" => Some("clojure"),
        "coffee" => Some("coffeescript"),
        "cpp" | "cc" | "cxx" | "hpp" => Some("cpp"),
        "cs" => Some("csharp"),
        "dart" => Some("dart"),
        "el" | "lisp" => Some("lisp"),
        "elm" => Some("elm"),
        "erl" => Some("erlang"),
        "ex" | "exs" => Some("elixir"),
        "f90" | "f95" | "f03" => Some("fortran-modern"),
        "fs" => Some("fsharp"),
        "go" => Some("go"),
        "groovy" => Some("groovy"),
        "hs" => Some("haskell"),
        "htm" | "html" => Some("html"),
        "java" => Some("java"),
        "jl" => Some("julia"),
        "js" | "mjs" => Some("javascript"),
        "jsx" => Some("javascriptreact"),
        "kt" | "kts" => Some("kotlin"),
        "lua" => Some("lua"),
        "m" => Some("matlab"),
        "md" | "markdown" => Some("markdown"),
        "mkiv" => Some("context"),
        "org" => Some("org"),
        "php" => Some("php"),
        "pl" | "pm" => Some("perl"),
        "pp" => Some("puppet"),
        "ps1" => Some("powershell"),
        "py" => Some("python"),
        "r" => Some("r"),
        "rb" => Some("ruby"),
        "rmd" => Some("rmd"),
        "rnw" => Some("rsweave"),
        "rs" => Some("rust"),
        "rst" => Some("restructuredtext"),
        "scala" => Some("scala"),
        "sh" | "bash" => Some("shellscript"),
        "sql" => Some("sql"),
        "swift" => Some("swift"),
        "cls" | "latex" | "sty" | "tex" => Some("latex"),
        "ts" => Some("typescript"),
        "tsx" => Some("typescriptreact"),
        "txt" => Some("plaintext"),
        "v" => Some("verilog"),
        "vb" => Some("vb"),
        "xhtml" => Some("xhtml"),
        _ => None,
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::CodeBuilder;

    #[test]
    fn extensions_map_to_supported_ids() {
        for file in ["a.tex", "a.bib", "a.md", "a.Rmd", "a.org", "a.rst", "a.adoc", "a.html", "a.rs", "a.py", "a.txt"] {
            let language_id = language_id_for_path(Path::new(file)).unwrap();
            assert!(CodeBuilder::is_supported(language_id), "{file} -> {language_id}");
        }
    }

    #[test]
    fn commit_messages_by_name() {
        assert_eq!(language_id_for_path(Path::new(".git/COMMIT_EDITMSG")), Some("git-commit"));
    }

    #[test]
    fn unknown_extensions() {
        assert_eq!(language_id_for_path(Path::new("image.png")), None);
        assert_eq!(language_id_for_path(Path::new("Makefile")), None);
    }
}
