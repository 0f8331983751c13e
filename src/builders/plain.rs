//! Builders that do not interpret their input.

use crate::annotated::{AnnotatedText, AnnotatedTextBuilder};

/// Everything is text.
pub fn plaintext(code: &str) -> AnnotatedText {
    let mut builder = AnnotatedTextBuilder::new();
    builder.add_text(code);
    return builder.build();
}

/// Everything is markup.
pub fn nop(code: &str) -> AnnotatedText {
    let mut builder = AnnotatedTextBuilder::new();
    builder.add_markup(code);
    return builder.build();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plaintext_is_identity() {
        let text = plaintext("Some *text*.\n");
        assert_eq!(text.plain_text(), "Some *text*.\n");
        assert_eq!(text.parts().len(), 1);
    }

    #[test]
    fn nop_drops_everything() {
        let text = nop("Some *text*.\n");
        assert_eq!(text.plain_text(), "");
        assert_eq!(text.source_text(), "Some *text*.\n");
    }
}
