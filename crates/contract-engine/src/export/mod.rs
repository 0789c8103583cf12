//! Export layout for substituted contracts
//!
//! The substituted text is split into paragraphs, each classified as a title
//! or body paragraph by simple heuristics, then rendered as Typst markup.

pub mod layout;
pub mod typst;

pub use layout::{layout, Alignment, DocumentLayout, Paragraph, ParagraphKind};
pub use typst::{escape_markup, to_typst};
