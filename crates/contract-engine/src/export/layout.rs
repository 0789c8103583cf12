use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Lines at least this long are never treated as `Label:` titles.
const MAX_LABEL_TITLE_CHARS: usize = 80;

lazy_static! {
    static ref HEADING: Regex =
        Regex::new(r"^(CLÁUSULA|ARTÍCULO|Cláusula|Artículo|TÍTULO|Título)\s+\w+").unwrap();
    static ref NUMBERED_HEADING: Regex = Regex::new(r"^\d+[.\-]\s+[A-Z]").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParagraphKind {
    Title,
    Body,
    Blank,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    Left,
    Center,
    Justify,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paragraph {
    pub kind: ParagraphKind,
    pub text: String,
    pub alignment: Alignment,
    pub bold: bool,
    pub first_line_indent: bool,
}

impl Paragraph {
    fn blank() -> Self {
        Self {
            kind: ParagraphKind::Blank,
            text: String::new(),
            alignment: Alignment::Left,
            bold: false,
            first_line_indent: false,
        }
    }

    fn title(text: &str) -> Self {
        let alignment = if is_upper(text) {
            Alignment::Center
        } else {
            Alignment::Left
        };
        Self {
            kind: ParagraphKind::Title,
            text: text.to_string(),
            alignment,
            bold: true,
            first_line_indent: false,
        }
    }

    fn body(text: &str) -> Self {
        Self {
            kind: ParagraphKind::Body,
            text: text.to_string(),
            alignment: Alignment::Justify,
            bold: false,
            first_line_indent: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentLayout {
    pub paragraphs: Vec<Paragraph>,
}

impl DocumentLayout {
    pub fn titles(&self) -> impl Iterator<Item = &Paragraph> {
        self.paragraphs
            .iter()
            .filter(|p| p.kind == ParagraphKind::Title)
    }
}

/// True when the line has cased letters and none of them is lower case.
fn is_upper(line: &str) -> bool {
    let mut has_cased = false;
    for c in line.chars() {
        if c.is_lowercase() {
            return false;
        }
        if c.is_uppercase() {
            has_cased = true;
        }
    }
    has_cased
}

pub fn is_title(line: &str) -> bool {
    is_upper(line)
        || HEADING.is_match(line)
        || NUMBERED_HEADING.is_match(line)
        || (line.chars().count() < MAX_LABEL_TITLE_CHARS && line.ends_with(':'))
}

/// Split contract text into styled paragraphs, one per input line.
pub fn layout(text: &str) -> DocumentLayout {
    let paragraphs = text
        .split('\n')
        .map(str::trim)
        .map(|line| {
            if line.is_empty() {
                Paragraph::blank()
            } else if is_title(line) {
                Paragraph::title(line)
            } else {
                Paragraph::body(line)
            }
        })
        .collect();

    DocumentLayout { paragraphs }
}
