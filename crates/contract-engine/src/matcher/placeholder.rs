//! Placeholder tokenization
//!
//! A placeholder is split into literal runs, whitespace runs and fill runs
//! (dots, underscores, ellipses, dash runs). The blank span is the part of the
//! placeholder that stands for the value: it starts at the first fill run of
//! two or more characters and ends at the last one. Text outside it is a label
//! such as `DNI N° ` and survives substitution.

use std::ops::Range;

const FILL_CHARS: [char; 4] = ['.', '_', '-', '…'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenKind {
    Literal,
    Space,
    Fill,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub range: Range<usize>,
}

impl Token<'_> {
    /// A fill run long enough to be a blank rather than punctuation.
    pub fn is_blank(&self) -> bool {
        self.kind == TokenKind::Fill && (self.text.chars().count() >= 2 || self.text.contains('…'))
    }
}

fn classify(c: char) -> TokenKind {
    if c.is_whitespace() {
        TokenKind::Space
    } else if FILL_CHARS.contains(&c) {
        TokenKind::Fill
    } else {
        TokenKind::Literal
    }
}

pub(crate) fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens: Vec<Token<'_>> = Vec::new();

    for (start, c) in text.char_indices() {
        let kind = classify(c);
        let end = start + c.len_utf8();
        if let Some(last) = tokens.last_mut().filter(|last| last.kind == kind) {
            last.range.end = end;
            last.text = &text[last.range.clone()];
            continue;
        }
        tokens.push(Token {
            kind,
            text: &text[start..end],
            range: start..end,
        });
    }

    // A lone hyphen is punctuation ("N°-3"), not a blank to be relaxed.
    for token in &mut tokens {
        if token.kind == TokenKind::Fill && token.text == "-" {
            token.kind = TokenKind::Literal;
        }
    }

    tokens
}

/// A tokenized placeholder with its blank span resolved.
#[derive(Debug, Clone)]
pub(crate) struct Placeholder<'a> {
    pub text: &'a str,
    pub tokens: Vec<Token<'a>>,
    /// Token indices of the first and last blank runs.
    pub blank_tokens: Option<(usize, usize)>,
}

impl<'a> Placeholder<'a> {
    pub fn parse(text: &'a str) -> Self {
        let tokens = tokenize(text);
        let first = tokens.iter().position(|t| t.is_blank());
        let last = tokens.iter().rposition(|t| t.is_blank());
        let blank_tokens = first.zip(last);

        Self {
            text,
            tokens,
            blank_tokens,
        }
    }

    /// Byte range of the blank span inside `text`.
    pub fn blank_span(&self) -> Option<Range<usize>> {
        self.blank_tokens
            .map(|(first, last)| self.tokens[first].range.start..self.tokens[last].range.end)
    }

    /// The placeholder with its blank span replaced by `value`.
    ///
    /// Without a blank span the whole placeholder stands for the value.
    pub fn filled(&self, value: &str) -> String {
        match self.blank_span() {
            Some(span) => format!("{}{}{}", &self.text[..span.start], value, &self.text[span.end..]),
            None => value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<(TokenKind, &str)> {
        tokenize(text).into_iter().map(|t| (t.kind, t.text)).collect()
    }

    #[test]
    fn test_tokenize_label_and_blank() {
        assert_eq!(
            kinds("DNI N° ....."),
            vec![
                (TokenKind::Literal, "DNI"),
                (TokenKind::Space, " "),
                (TokenKind::Literal, "N°"),
                (TokenKind::Space, " "),
                (TokenKind::Fill, "....."),
            ]
        );
    }

    #[test]
    fn test_mixed_fill_run_is_one_token() {
        assert_eq!(kinds("___-___"), vec![(TokenKind::Fill, "___-___")]);
    }

    #[test]
    fn test_lone_hyphen_is_literal() {
        assert_eq!(
            kinds("a-b"),
            vec![
                (TokenKind::Literal, "a"),
                (TokenKind::Literal, "-"),
                (TokenKind::Literal, "b"),
            ]
        );
    }

    #[test]
    fn test_abbreviation_dots_are_not_blank() {
        let placeholder = Placeholder::parse("D.N.I. ....");
        assert_eq!(placeholder.blank_span(), Some(7..11));
        assert_eq!(placeholder.filled("30111222"), "D.N.I. 30111222");
    }

    #[test]
    fn test_blank_span_covers_first_to_last_blank() {
        let placeholder = Placeholder::parse("..... de ........ de 20..");
        assert_eq!(placeholder.filled("15 de marzo de 2025"), "15 de marzo de 2025");
    }

    #[test]
    fn test_no_blank_replaces_whole_placeholder() {
        let placeholder = Placeholder::parse("{{NOMBRE_LOCADOR}}");
        assert_eq!(placeholder.blank_span(), None);
        assert_eq!(placeholder.filled("Ana"), "Ana");
    }

    #[test]
    fn test_ellipsis_counts_as_blank() {
        let placeholder = Placeholder::parse("Sr. …");
        assert_eq!(placeholder.filled("Gómez"), "Sr. Gómez");
    }
}
