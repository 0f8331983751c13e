//! Placeholder words standing in for elided markup.

/// Generates deterministic placeholder words.
///
/// The generator itself holds no counter; callers pass the running number, so
/// two builders fed the same input produce the same words.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DummyGenerator {
    /// Produce a plural form.
    pub plural: bool,
    /// Produce a word starting with a vowel sound.
    pub vowel: bool,
}

impl DummyGenerator {
    /// Plural placeholder.
    pub const PLURAL: Self = Self { plural: true, vowel: false };

    /// Singular placeholder.
    pub const SINGULAR: Self = Self { plural: false, vowel: false };

    /// Singular placeholder starting with a vowel.
    pub const VOWEL: Self = Self { plural: false, vowel: true };

    /// Generator for an action string, if it names a placeholder flavour.
    pub fn for_action(action: &str) -> Option<Self> {
        return match action {
            "dummy" => Some(Self::SINGULAR),
            "pluralDummy" => Some(Self::PLURAL),
            "vowelDummy" => Some(Self::VOWEL),
            _ => None,
        };
    }

    /// Placeholder number `number` for `language`.
    ///
    /// `starts_with_vowel` requests a vowel-initial word even when the
    /// generator is not a vowel generator (used for math whose first token
    /// reads with a vowel).
    pub fn generate(self, language: &str, number: usize, starts_with_vowel: bool) -> String {
        if language.eq_ignore_ascii_case("fr") {
            return format!("Jimmy-{number}");
        }
        if self.plural {
            return "Dummies".to_string();
        }
        if self.vowel || starts_with_vowel {
            return format!("Ina{number}");
        }
        return format!("Dummy{number}");
    }
}
