//! Scans a document for any of a set of command signatures.

use std::collections::BTreeSet;

use regex::Regex;

use super::signature::{CommandSignature, SignatureMatch};

/// A fixed set of signatures plus one alternation regex over their prefixes.
#[derive(Debug, Clone)]
pub struct SignatureMatcher {
    /// Alternation of every prefix; `None` when no signature can match.
    prefixes: Option<Regex>,
    /// Candidate signatures in declaration order.
    signatures: Vec<CommandSignature>,
}

impl SignatureMatcher {
    /// Longest match among all candidates at `from`; the earliest declared
    /// signature wins a tie.
    fn best_match<'a>(&'a self, code: &'a str, from: usize, ignored: &BTreeSet<String>) -> Option<SignatureMatch<'a>> {
        let mut best: Option<SignatureMatch<'a>> = None;
        for signature in &self.signatures {
            if ignored.contains(signature.prototype()) {
                continue;
            }
            let Some(found) = signature.match_at(code, from) else {
                continue;
            };
            if best.as_ref().is_none_or(|current| return found.to() > current.to()) {
                best = Some(found);
            }
        }
        return best;
    }

    /// Iterate over matches in `code`, skipping hits inside line comments and
    /// signatures whose prototype is in `ignored`.
    pub fn find_iter<'a>(&'a self, code: &'a str, ignored: &'a BTreeSet<String>) -> Matches<'a> {
        return Matches {
            matcher: self,
            code,
            ignored,
            hits: self.prefixes.as_ref().map(|regex| return regex.find_iter(code)),
        };
    }

    /// Compile a matcher for `signatures`.
    pub fn new(signatures: Vec<CommandSignature>) -> Self {
        let alternatives: Vec<String> = signatures.iter().filter_map(CommandSignature::prefix_pattern).collect();
        let prefixes = if alternatives.is_empty() {
            None
        } else {
            match Regex::new(&alternatives.join("|")) {
                Ok(regex) => Some(regex),
                Err(error) => {
                    tracing::warn!(%error, "could not compile signature prefixes, matcher disabled");
                    None
                },
            }
        };
        return Self { signatures, prefixes };
    }

    /// Candidate signatures in declaration order.
    pub fn signatures(&self) -> &[CommandSignature] {
        return &self.signatures;
    }
}

/// Iterator over signature matches, in source order.
#[derive(Debug)]
pub struct Matches<'a> {
    /// Code being scanned.
    code: &'a str,
    /// Remaining prefix hits.
    hits: Option<regex::Matches<'a, 'a>>,
    /// Prototypes to skip.
    ignored: &'a BTreeSet<String>,
    /// The matcher being run.
    matcher: &'a SignatureMatcher,
}

impl<'a> Iterator for Matches<'a> {
    type Item = SignatureMatch<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let matcher = self.matcher;
        let code = self.code;
        let ignored = self.ignored;
        let hits = self.hits.as_mut()?;
        for hit in hits.by_ref() {
            let from = hit.start();
            let line_start = code.get(..from).and_then(|before| return before.rfind('\n')).map_or(0, |newline| {
                return newline.saturating_add(1);
            });
            let before_on_line = code.get(line_start..from).unwrap_or("");
            if has_unescaped_comment(before_on_line) {
                continue;
            }
            if let Some(found) = matcher.best_match(code, from, ignored) {
                return Some(found);
            }
        }
        return None;
    }
}

/// Whether `line` contains a `%` not escaped by an odd run of backslashes.
pub fn has_unescaped_comment(line: &str) -> bool {
    let mut backslashes = 0_usize;
    for ch in line.chars() {
        match ch {
            '\\' => backslashes = backslashes.saturating_add(1),
            '%' if backslashes % 2 == 0 => return true,
            _ => backslashes = 0,
        }
    }
    return false;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::latex::signature::Action;

    fn matcher(prototypes: &[&str]) -> SignatureMatcher {
        return SignatureMatcher::new(
            prototypes
                .iter()
                .map(|prototype| return CommandSignature::new(prototype, Action::Ignore))
                .collect(),
        );
    }

    #[test]
    fn longest_candidate_wins() {
        let matcher = matcher(&["\\foo{}", "\\foo{}{}"]);
        let ignored = BTreeSet::new();
        let found: Vec<_> = matcher.find_iter("x \\foo{a}{b} y", &ignored).collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].signature().prototype(), "\\foo{}{}");
        assert_eq!(found[0].as_str(), "\\foo{a}{b}");
    }

    #[test]
    fn equal_length_keeps_first_declared() {
        let matcher = SignatureMatcher::new(vec![
            CommandSignature::new("\\foo{}", Action::Ignore),
            CommandSignature::new("\\foo{}", Action::Default),
        ]);
        let ignored = BTreeSet::new();
        let found = matcher.find_iter("\\foo{a}", &ignored).next().unwrap();
        assert_eq!(found.signature().action(), Action::Ignore);
    }

    #[test]
    fn hits_inside_comments_are_skipped() {
        let matcher = matcher(&["\\foo{}"]);
        let ignored = BTreeSet::new();
        let code = "% \\foo{a}\n\\% \\foo{b}\n\\\\% \\foo{c}";
        let found: Vec<_> = matcher
            .find_iter(code, &ignored)
            .map(|found| return found.argument_contents(0))
            .collect();
        assert_eq!(found, vec!["b"]);
    }

    #[test]
    fn ignored_prototypes_are_skipped() {
        let matcher = matcher(&["\\foo{}"]);
        let ignored = BTreeSet::from(["\\foo{}".to_string()]);
        assert_eq!(matcher.find_iter("\\foo{a}", &ignored).count(), 0);
    }

    #[test]
    fn prefix_without_arguments_is_not_a_match() {
        let matcher = matcher(&["\\foo{}"]);
        let ignored = BTreeSet::new();
        assert_eq!(matcher.find_iter("\\foo bar", &ignored).count(), 0);
    }
}
