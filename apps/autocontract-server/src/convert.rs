//! Template conversion
//!
//! Turns a filled contract (PDF, DOCX or plain text) into a reusable template
//! by asking the LLM to replace every concrete datum with a `{{MARKER}}`.
//! Long contracts are sent in fixed-size chunks and the marked pieces are
//! joined back in order.

use std::collections::BTreeSet;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, ValueEnum};
use lazy_static::lazy_static;
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::llm::{ChatMessage, CompletionRequest, LlmClient};
use crate::prompts;

/// Contracts longer than this many characters are marked chunk by chunk.
pub const MAX_CHUNK_CHARS: usize = 14_000;

/// Suffix appended to the input file stem for the default output path.
pub const TEMPLATE_SUFFIX: &str = "_PLANTILLA.txt";

/// PDFs yielding less text than this are treated as scanned images.
const MIN_PDF_TEXT_CHARS: usize = 50;

const DOCX_BODY: &str = "word/document.xml";

lazy_static! {
    static ref MARKER: Regex = Regex::new(r"\{\{([A-Z_]+)\}\}").unwrap();
}

/// Kind of rental contract, used to frame the marking prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ContractKind {
    /// Residential lease
    Vivienda,
    /// Commercial premises lease
    Comercial,
    /// Let the model work it out
    Auto,
}

impl ContractKind {
    pub fn context(self) -> &'static str {
        match self {
            ContractKind::Vivienda => "contrato de alquiler de vivienda residencial",
            ContractKind::Comercial => "contrato de alquiler de local comercial",
            ContractKind::Auto => "contrato de alquiler",
        }
    }
}

/// Arguments for the `convert` subcommand
#[derive(Args, Debug, Clone)]
pub struct ConvertArgs {
    /// Contract to convert (.pdf, .docx or .txt)
    pub file: PathBuf,

    /// Kind of contract
    #[arg(long, alias = "tipo", value_enum, default_value = "auto")]
    pub kind: ContractKind,

    /// Output file (defaults to <name>_PLANTILLA.txt in the current directory)
    #[arg(long, alias = "salida")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported file type: {0} (use .pdf, .docx or .txt)")]
    UnsupportedFormat(String),

    #[error("PDF text extraction failed: {0}")]
    Pdf(String),

    #[error("the PDF has no extractable text; it is probably scanned and needs OCR")]
    ScannedPdf,

    #[error("DOCX read failed: {0}")]
    Docx(String),

    #[error("no text found in {0}")]
    EmptyDocument(PathBuf),

    #[error("LLM call timed out after {0}ms")]
    Timeout(u64),

    #[error("LLM call failed on part {part}: {source}")]
    Upstream {
        part: usize,
        #[source]
        source: anyhow::Error,
    },
}

/// What a finished conversion produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertSummary {
    pub output: PathBuf,
    pub markers: Vec<String>,
    pub chars: usize,
}

/// Split `text` into pieces of at most `max_chars` characters.
///
/// Splits fall on character boundaries, so multibyte text is never cut in
/// the middle of a code point. A text that fits returns a single piece.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<&str> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut count = 0;

    for (index, _) in text.char_indices() {
        if count == max_chars {
            chunks.push(&text[start..index]);
            start = index;
            count = 0;
        }
        count += 1;
    }
    chunks.push(&text[start..]);

    chunks
}

/// Distinct `{{MARKER}}` names in `text`, sorted.
pub fn extract_markers(text: &str) -> Vec<String> {
    MARKER
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// `<stem>_PLANTILLA.txt`, relative to the current directory.
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "contrato".to_string());
    PathBuf::from(format!("{}{}", stem, TEMPLATE_SUFFIX))
}

/// Read the contract text according to its extension.
pub fn read_contract(path: &Path) -> Result<String, ConvertError> {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    if !matches!(extension.as_str(), "txt" | "pdf" | "docx") {
        return Err(ConvertError::UnsupportedFormat(path.display().to_string()));
    }

    let bytes = std::fs::read(path).map_err(|source| ConvertError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("Read {} bytes from {}", bytes.len(), path.display());

    let text = match extension.as_str() {
        "pdf" => pdf_text(&bytes)?,
        "docx" => docx_text(&bytes)?,
        _ => String::from_utf8_lossy(&bytes).into_owned(),
    };

    if text.trim().is_empty() {
        return Err(ConvertError::EmptyDocument(path.to_path_buf()));
    }
    Ok(text)
}

/// Extract text from PDF bytes.
pub fn pdf_text(bytes: &[u8]) -> Result<String, ConvertError> {
    let text = pdf_extract::extract_text_from_mem(bytes).map_err(|e| {
        let message = e.to_string();
        let lowered = message.to_lowercase();
        if lowered.contains("encrypt") || lowered.contains("password") {
            ConvertError::Pdf(format!("the PDF is encrypted: {}", message))
        } else {
            ConvertError::Pdf(message)
        }
    })?;

    if text.trim().chars().count() < MIN_PDF_TEXT_CHARS {
        return Err(ConvertError::ScannedPdf);
    }
    Ok(text)
}

/// Extract paragraph text from DOCX bytes, one paragraph per line.
///
/// Table cells are paragraphs too, so they come out in document order.
pub fn docx_text(bytes: &[u8]) -> Result<String, ConvertError> {
    let mut archive =
        zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| ConvertError::Docx(e.to_string()))?;
    let mut xml = String::new();
    archive
        .by_name(DOCX_BODY)
        .map_err(|e| ConvertError::Docx(format!("{}: {}", DOCX_BODY, e)))?
        .read_to_string(&mut xml)
        .map_err(|e| ConvertError::Docx(e.to_string()))?;

    let mut reader = Reader::from_str(&xml);
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut in_text = false;

    loop {
        match reader
            .read_event()
            .map_err(|e| ConvertError::Docx(e.to_string()))?
        {
            Event::Start(e) if e.name().as_ref() == b"w:t" => in_text = true,
            Event::Text(t) if in_text => {
                let text = t.unescape().map_err(|e| ConvertError::Docx(e.to_string()))?;
                current.push_str(&text);
            }
            Event::Empty(e) => match e.name().as_ref() {
                b"w:tab" => current.push('\t'),
                b"w:br" => current.push('\n'),
                _ => {}
            },
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => {
                    if !current.trim().is_empty() {
                        paragraphs.push(std::mem::take(&mut current));
                    }
                    current.clear();
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs.join("\n"))
}

/// Ask the model to mark every datum, chunk by chunk, and join the results.
pub async fn mark_variables(
    llm: &dyn LlmClient,
    text: &str,
    kind: ContractKind,
    timeout_ms: u64,
) -> Result<String, ConvertError> {
    let chunks = chunk_text(text, MAX_CHUNK_CHARS);
    let total = chunks.len();
    let system_prompt = prompts::convert_system_prompt(kind.context());
    let limit = Duration::from_millis(timeout_ms);

    if total > 1 {
        info!("Contract has {} chars, sending {} parts", text.chars().count(), total);
    }

    let mut marked = Vec::with_capacity(total);
    for (index, chunk) in chunks.into_iter().enumerate() {
        let part = index + 1;
        let request = CompletionRequest {
            system_prompt: system_prompt.clone(),
            messages: vec![ChatMessage::user(prompts::convert_user_message(
                chunk, part, total,
            ))],
            json_mode: false,
            temperature: prompts::CONVERT_TEMPERATURE,
        };

        let reply = tokio::time::timeout(limit, llm.complete(request))
            .await
            .map_err(|_| ConvertError::Timeout(timeout_ms))?
            .map_err(|source| ConvertError::Upstream { part, source })?;
        debug!("Part {}/{} marked: {} chars", part, total, reply.len());
        marked.push(reply);
    }

    Ok(marked.join("\n"))
}

/// Run the `convert` subcommand end to end.
pub async fn run(
    args: &ConvertArgs,
    llm: &dyn LlmClient,
    timeout_ms: u64,
) -> anyhow::Result<ConvertSummary> {
    info!(
        "Converting {} with {} ({})",
        args.file.display(),
        llm.provider_name(),
        llm.model_name()
    );

    let text = read_contract(&args.file)?;
    info!("Extracted {} chars", text.chars().count());

    let template = mark_variables(llm, &text, args.kind, timeout_ms).await?;
    let markers = extract_markers(&template);
    if markers.is_empty() {
        warn!("The model returned no markers");
    }

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&args.file));
    std::fs::write(&output, &template).map_err(|source| ConvertError::Io {
        path: output.clone(),
        source,
    })?;

    info!("Template written to {}", output.display());
    info!("{} markers: {}", markers.len(), markers.join(", "));

    Ok(ConvertSummary {
        output,
        markers,
        chars: template.chars().count(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn docx_with_body(xml: &str) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file(DOCX_BODY, zip::write::FileOptions::default())
            .unwrap();
        writer.write_all(xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_short_text_is_one_chunk() {
        assert_eq!(chunk_text("contrato", MAX_CHUNK_CHARS), vec!["contrato"]);
        assert_eq!(chunk_text("", MAX_CHUNK_CHARS), vec![""]);
    }

    #[test]
    fn test_chunk_boundary_is_inclusive() {
        let exact = "a".repeat(MAX_CHUNK_CHARS);
        assert_eq!(chunk_text(&exact, MAX_CHUNK_CHARS).len(), 1);

        let over = "a".repeat(MAX_CHUNK_CHARS + 1);
        let chunks = chunk_text(&over, MAX_CHUNK_CHARS);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].len(), MAX_CHUNK_CHARS);
        assert_eq!(chunks[1], "a");
    }

    #[test]
    fn test_chunks_count_characters_not_bytes() {
        let chunks = chunk_text("ñáéíóú", 4);
        assert_eq!(chunks, vec!["ñáéí", "óú"]);
    }

    #[test]
    fn test_zero_chunk_size_still_makes_progress() {
        assert_eq!(chunk_text("abc", 0), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_markers_sorted_and_deduplicated() {
        let text = "{{NOMBRE_LOCATARIO}} paga a {{NOMBRE_LOCADOR}}. Firma {{NOMBRE_LOCATARIO}}.";
        assert_eq!(
            extract_markers(text),
            vec!["NOMBRE_LOCADOR".to_string(), "NOMBRE_LOCATARIO".to_string()]
        );
    }

    #[test]
    fn test_markers_ignore_other_braces() {
        let text = "{{nombre}} {{ DNI }} {{DNI-2}} {MONTO} {{CIUDAD}}";
        assert_eq!(extract_markers(text), vec!["CIUDAD".to_string()]);
    }

    #[test]
    fn test_default_output_path_uses_stem() {
        assert_eq!(
            default_output_path(Path::new("/tmp/contratos/alquiler_2024.pdf")),
            PathBuf::from("alquiler_2024_PLANTILLA.txt")
        );
    }

    #[test]
    fn test_read_txt_contract() {
        let path = std::env::temp_dir().join("autocontract_convert_read.txt");
        std::fs::write(&path, "CONTRATO DE LOCACIÓN\nEntre Juan Pérez").unwrap();

        let text = read_contract(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(text, "CONTRATO DE LOCACIÓN\nEntre Juan Pérez");
    }

    #[test]
    fn test_unsupported_extension_is_rejected_before_reading() {
        let err = read_contract(Path::new("no_existe.odt")).unwrap_err();
        assert!(matches!(err, ConvertError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_blank_txt_is_an_empty_document() {
        let path = std::env::temp_dir().join("autocontract_convert_blank.txt");
        std::fs::write(&path, " \n\t ").unwrap();

        let err = read_contract(&path).unwrap_err();
        std::fs::remove_file(&path).ok();

        assert!(matches!(err, ConvertError::EmptyDocument(_)));
    }

    #[test]
    fn test_invalid_pdf_bytes_are_an_error() {
        assert!(pdf_text(b"not a pdf").is_err());
    }

    #[test]
    fn test_docx_paragraphs_and_table_cells() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    <w:p><w:r><w:t>CONTRATO DE </w:t></w:r><w:r><w:t xml:space="preserve">LOCACIÓN</w:t></w:r></w:p>
    <w:p></w:p>
    <w:p><w:r><w:t>Locador:</w:t><w:tab/><w:t>Juan &amp; Cía</w:t></w:r></w:p>
    <w:tbl><w:tr><w:tc><w:p><w:r><w:t>DNI 12345678</w:t></w:r></w:p></w:tc></w:tr></w:tbl>
  </w:body>
</w:document>"#;

        let text = docx_text(&docx_with_body(xml)).unwrap();
        assert_eq!(
            text,
            "CONTRATO DE LOCACIÓN\nLocador:\tJuan & Cía\nDNI 12345678"
        );
    }

    #[test]
    fn test_docx_without_body_is_an_error() {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("other.xml", zip::write::FileOptions::default())
            .unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        assert!(matches!(docx_text(&bytes), Err(ConvertError::Docx(_))));
    }

    #[test]
    fn test_contract_kind_context() {
        assert_eq!(ContractKind::Auto.context(), "contrato de alquiler");
        assert!(ContractKind::Comercial.context().ends_with("local comercial"));
    }
}
