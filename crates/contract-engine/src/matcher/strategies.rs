//! The three placeholder location strategies
//!
//! Each strategy takes `(placeholder, document, value)` and returns the
//! rewritten document plus the number of occurrences replaced, or `None`
//! when it cannot locate the placeholder.

use std::borrow::Cow;

use lazy_static::lazy_static;
use regex::{Captures, Regex, RegexBuilder};
use tracing::warn;

use super::placeholder::{Placeholder, TokenKind};

/// Upper bound on the compiled size of a flexible pattern.
const PATTERN_SIZE_LIMIT: usize = 1 << 20;

/// A run of blank characters, possibly with whitespace inside, that starts and
/// ends on a blank character so it never matches bare whitespace.
const FLEXIBLE_FILL: &str = r"[._…\-](?:[._…\-\s]*[._…\-])?";

lazy_static! {
    static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").unwrap();
}

/// Strategy 1: the placeholder occurs verbatim.
pub(crate) fn exact(placeholder: &str, document: &str, value: &str) -> Option<(String, usize)> {
    let replacements = document.matches(placeholder).count();
    if replacements == 0 {
        return None;
    }

    let filled = Placeholder::parse(placeholder).filled(value);
    Some((document.replace(placeholder, &filled), replacements))
}

/// Collapse every whitespace run to a single space.
pub(crate) fn collapse_whitespace(text: &str) -> Cow<'_, str> {
    WHITESPACE_RUN.replace_all(text, " ")
}

/// Strategy 2: the placeholder occurs once whitespace runs are collapsed.
///
/// When it triggers, the returned document is the normalized one, so the
/// whole document loses its original whitespace layout.
pub(crate) fn whitespace_normalized(
    placeholder: &str,
    document: &str,
    value: &str,
) -> Option<(String, usize)> {
    let placeholder = collapse_whitespace(placeholder);
    let document = collapse_whitespace(document);

    let replacements = document.matches(placeholder.as_ref()).count();
    if replacements == 0 {
        return None;
    }

    let filled = Placeholder::parse(&placeholder).filled(value);
    Some((document.replace(placeholder.as_ref(), &filled), replacements))
}

/// Build the relaxed search pattern for a placeholder.
///
/// Literal runs and single fill characters are escaped, whitespace runs become
/// `\s*` and blank fill runs become [`FLEXIBLE_FILL`]. The blank span is
/// wrapped in a `blank` capture group so the label text around it can be kept
/// as it appears in the document.
pub(crate) fn flexible_pattern(placeholder: &Placeholder<'_>) -> String {
    let mut pattern = String::new();

    for (index, token) in placeholder.tokens.iter().enumerate() {
        if placeholder.blank_tokens.map(|(first, _)| first) == Some(index) {
            pattern.push_str("(?P<blank>");
        }

        match token.kind {
            TokenKind::Space => pattern.push_str(r"\s*"),
            TokenKind::Fill if token.is_blank() => pattern.push_str(FLEXIBLE_FILL),
            // Short fill runs are punctuation ("Sr.", "D.N.I.") and must match as written.
            TokenKind::Literal | TokenKind::Fill => pattern.push_str(&regex::escape(token.text)),
        }

        if placeholder.blank_tokens.map(|(_, last)| last) == Some(index) {
            pattern.push(')');
        }
    }

    pattern
}

pub(crate) fn compile_pattern(pattern: &str, size_limit: usize) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).size_limit(size_limit).build()
}

/// Strategy 3: search with the relaxed pattern and replace every match.
pub(crate) fn flexible(placeholder: &str, document: &str, value: &str) -> Option<(String, usize)> {
    flexible_with_limit(placeholder, document, value, PATTERN_SIZE_LIMIT)
}

pub(crate) fn flexible_with_limit(
    placeholder: &str,
    document: &str,
    value: &str,
    size_limit: usize,
) -> Option<(String, usize)> {
    let parsed = Placeholder::parse(placeholder);
    let pattern = flexible_pattern(&parsed);

    let regex = match compile_pattern(&pattern, size_limit) {
        Ok(regex) => regex,
        Err(err) => {
            warn!("Placeholder {:?} did not compile as a pattern: {}", placeholder, err);
            return None;
        }
    };

    let replacements = regex.find_iter(document).count();
    if replacements == 0 {
        return None;
    }

    let rewritten = regex.replace_all(document, |caps: &Captures<'_>| {
        match (caps.get(0), caps.name("blank")) {
            (Some(whole), Some(blank)) => format!(
                "{}{}{}",
                &document[whole.start()..blank.start()],
                value,
                &document[blank.end()..whole.end()]
            ),
            _ => value.to_string(),
        }
    });

    Some((rewritten.into_owned(), replacements))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_exact_replaces_every_occurrence() {
        let (doc, count) = exact("..........", "A: .......... B: ..........", "X").unwrap();
        assert_eq!(doc, "A: X B: X");
        assert_eq!(count, 2);
    }

    #[test]
    fn test_exact_keeps_label() {
        let (doc, _) = exact("DNI N° .....", "El DNI N° ..... del locador", "123").unwrap();
        assert_eq!(doc, "El DNI N° 123 del locador");
    }

    #[test]
    fn test_exact_misses_reformatted_placeholder() {
        assert_eq!(exact("DNI N° .....", "DNI N°\n.....", "123"), None);
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("a \t\n b\n\nc"), "a b c");
    }

    #[test]
    fn test_whitespace_normalized_rewrites_whole_document() {
        let (doc, count) =
            whitespace_normalized("DNI N° .....", "Titulo\n\nDNI N°\n\t.....  fin", "12345678")
                .unwrap();
        assert_eq!(doc, "Titulo DNI N° 12345678 fin");
        assert_eq!(count, 1);
    }

    #[test]
    fn test_whitespace_normalized_misses_other_blanks() {
        assert_eq!(whitespace_normalized("Monto: .....", "Monto: ___-___", "1"), None);
    }

    #[test]
    fn test_flexible_pattern_shape() {
        let placeholder = Placeholder::parse("N° (.....)");
        assert_eq!(
            flexible_pattern(&placeholder),
            format!(r"N°\s*\((?P<blank>{})\)", FLEXIBLE_FILL)
        );
    }

    #[test]
    fn test_flexible_pattern_keeps_abbreviation_dots_literal() {
        let placeholder = Placeholder::parse("D.N.I. ....");
        assert_eq!(
            flexible_pattern(&placeholder),
            format!(r"D\.N\.I\.\s*(?P<blank>{})", FLEXIBLE_FILL)
        );
    }

    #[test]
    fn test_flexible_abbreviated_label_fills_whole_blank() {
        let (doc, count) = flexible("D.N.I. ....", "D.N.I. ________", "30111222").unwrap();
        assert_eq!(doc, "D.N.I. 30111222");
        assert_eq!(count, 1);

        let (doc, _) = flexible("Sr. ....", "Sr. ____ firma", "Ana").unwrap();
        assert_eq!(doc, "Sr. Ana firma");
    }

    #[test]
    fn test_flexible_abbreviation_does_not_match_other_punctuation() {
        assert_eq!(flexible("Sr. ....", "Sr_ ____", "Ana"), None);
    }

    #[test]
    fn test_flexible_matches_underscore_and_dash_blank() {
        let (doc, count) = flexible("Monto: .....", "Monto: ___-___", "50000").unwrap();
        assert_eq!(doc, "Monto: 50000");
        assert_eq!(count, 1);
    }

    #[test]
    fn test_flexible_tolerates_spacing_inside_and_around_blank() {
        let (doc, _) = flexible(
            "Domicilio: ..........",
            "Domicilio:_ _ _ _ _ _ y sigue",
            "Calle 123",
        )
        .unwrap();
        assert_eq!(doc, "Domicilio:Calle 123 y sigue");
    }

    #[test]
    fn test_flexible_replaces_all_matches() {
        let (doc, count) = flexible("Fecha: ....", "Fecha: ___ y Fecha:....", "1/1").unwrap();
        assert_eq!(doc, "Fecha: 1/1 y Fecha:1/1");
        assert_eq!(count, 2);
    }

    #[test]
    fn test_flexible_inserts_value_literally() {
        let (doc, _) = flexible("Monto: ....", "Monto: ___", "$1 y $2").unwrap();
        assert_eq!(doc, "Monto: $1 y $2");
    }

    #[test]
    fn test_flexible_never_matches_bare_whitespace() {
        assert_eq!(flexible("..........", "Nombre Juan Pérez", "X"), None);
    }

    #[test]
    fn test_flexible_without_blank_replaces_whole_match() {
        let (doc, _) = flexible("{{ NOMBRE }}", "Sr. {{NOMBRE}} y {{ NOMBRE}}", "Ana").unwrap();
        assert_eq!(doc, "Sr. Ana y Ana");
    }

    #[test]
    fn test_compile_failure_is_an_error_value() {
        assert!(compile_pattern("(unclosed", PATTERN_SIZE_LIMIT).is_err());
    }

    #[test]
    fn test_oversized_pattern_downgrades_to_no_match() {
        assert_eq!(
            flexible_with_limit("Monto: .....", "Monto: ___", "1", 10),
            None
        );
    }
}
