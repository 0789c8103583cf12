//! Typst markup rendering of a [`DocumentLayout`]

use super::layout::{Alignment, DocumentLayout, Paragraph, ParagraphKind};

/// Page and text setup shared by every exported contract.
const PREAMBLE: &str = r#"#set page(paper: "a4", margin: (top: 1in, bottom: 1in, left: 1.2in, right: 1.2in))
#set text(font: "Times New Roman", size: 11pt, lang: "es")
#set par(spacing: 6pt)
"#;

/// Characters with markup meaning anywhere in a line.
const MARKUP_CHARS: &[char] = &[
    '\\', '#', '*', '_', '`', '$', '[', ']', '<', '>', '@', '~', '/', '=', '-', '+', '"', '\'',
];

/// Escape text so Typst renders it literally inside a content block.
pub fn escape_markup(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + 8);

    // "12. " at the start of a line would otherwise become a numbered list.
    let leading_digits = text.chars().take_while(char::is_ascii_digit).count();
    let enum_dot = (leading_digits > 0 && text[leading_digits..].starts_with('.'))
        .then_some(leading_digits);

    for (index, c) in text.char_indices() {
        if MARKUP_CHARS.contains(&c) || Some(index) == enum_dot {
            escaped.push('\\');
        }
        escaped.push(c);
    }

    escaped
}

fn render_paragraph(paragraph: &Paragraph) -> String {
    let text = escape_markup(&paragraph.text);
    let text = if paragraph.bold {
        format!("#strong[{}]", text)
    } else {
        text
    };

    match (paragraph.kind, paragraph.alignment) {
        (ParagraphKind::Blank, _) => "#v(1em)".to_string(),
        (_, Alignment::Center) => format!("#align(center)[{}]", text),
        (_, Alignment::Left) => format!("#align(left)[{}]", text),
        (_, Alignment::Justify) => {
            let indent = if paragraph.first_line_indent {
                "0.3in"
            } else {
                "0pt"
            };
            format!(
                "#par(justify: true, first-line-indent: {})[{}]",
                indent, text
            )
        }
    }
}

/// Render a layout as a standalone Typst document.
pub fn to_typst(layout: &DocumentLayout) -> String {
    let mut source = String::from(PREAMBLE);

    for paragraph in &layout.paragraphs {
        source.push('\n');
        source.push_str(&render_paragraph(paragraph));
        source.push('\n');
    }

    source
}
