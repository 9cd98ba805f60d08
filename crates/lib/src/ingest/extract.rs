//! # Text Extraction
//!
//! Turns an uploaded file into plain text. The format is resolved from the
//! filename extension first and the declared content type second.

use crate::types::UploadedFile;
use pdf::file::FileOptions;
use std::io::Read;
use thiserror::Error;
use tracing::{debug, warn};

const MIME_PDF: &str = "application/pdf";
const MIME_DOCX: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Upper bound on the decompressed size of `word/document.xml`.
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
    #[error("DOCX extraction failed: {0}")]
    Docx(String),
}

/// The document formats that can be turned into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    PlainText,
    Pdf,
    Docx,
}

impl DocumentFormat {
    /// Resolves the format of a file, or reports what was not understood.
    pub fn detect(filename: &str, content_type: &str) -> Result<Self, ExtractError> {
        let extension = filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "txt" | "md" | "markdown" | "csv" | "json" | "html" | "htm" => {
                return Ok(DocumentFormat::PlainText)
            }
            "pdf" => return Ok(DocumentFormat::Pdf),
            "docx" => return Ok(DocumentFormat::Docx),
            _ => {}
        }

        let mime = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match mime.as_str() {
            MIME_PDF => Ok(DocumentFormat::Pdf),
            MIME_DOCX => Ok(DocumentFormat::Docx),
            m if m.starts_with("text/") => Ok(DocumentFormat::PlainText),
            _ if !extension.is_empty() => Err(ExtractError::UnsupportedFormat(extension)),
            _ if !mime.is_empty() => Err(ExtractError::UnsupportedFormat(mime)),
            _ => Err(ExtractError::UnsupportedFormat(filename.to_string())),
        }
    }
}

/// Extracts the plain text of an uploaded file.
///
/// PDF parsing is CPU bound; async callers should run this on a blocking thread.
pub fn extract_text(file: &UploadedFile) -> Result<String, ExtractError> {
    let format = DocumentFormat::detect(&file.filename, &file.content_type)?;
    debug!(filename = %file.filename, ?format, bytes = file.bytes.len(), "Extracting text");
    match format {
        DocumentFormat::PlainText => Ok(String::from_utf8_lossy(&file.bytes).into_owned()),
        DocumentFormat::Pdf => extract_pdf(&file.bytes),
        DocumentFormat::Docx => extract_docx(&file.bytes),
    }
}

fn extract_pdf(data: &[u8]) -> Result<String, ExtractError> {
    let file = FileOptions::cached()
        .load(data)
        .map_err(|e| ExtractError::Pdf(e.to_string()))?;
    let resolver = file.resolver();
    let mut full_text = String::new();

    for page_num in 0..file.num_pages() {
        let page = file
            .get_page(page_num)
            .map_err(|e| ExtractError::Pdf(e.to_string()))?;
        let Some(content) = &page.contents else {
            warn!("Page {} has no content stream.", page_num);
            continue;
        };
        let operations = content
            .operations(&resolver)
            .map_err(|e| ExtractError::Pdf(e.to_string()))?;
        for op in operations.iter() {
            match op {
                pdf::content::Op::TextDraw { text } => {
                    full_text.push_str(&text.to_string_lossy());
                }
                pdf::content::Op::TextDrawAdjusted { array } => {
                    for item in array.iter() {
                        if let pdf::content::TextDrawAdjusted::Text(text) = item {
                            full_text.push_str(&text.to_string_lossy());
                        }
                    }
                }
                _ => {}
            }
        }
        full_text.push_str("\n\n");
    }

    Ok(full_text)
}

fn extract_docx(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))
        .map_err(|e| ExtractError::Docx(e.to_string()))?;
    let entry = archive
        .by_name("word/document.xml")
        .map_err(|e| ExtractError::Docx(e.to_string()))?;
    let mut doc_xml = Vec::new();
    entry
        .take(MAX_XML_ENTRY_BYTES)
        .read_to_end(&mut doc_xml)
        .map_err(|e| ExtractError::Docx(e.to_string()))?;
    if doc_xml.len() as u64 >= MAX_XML_ENTRY_BYTES {
        return Err(ExtractError::Docx(
            "word/document.xml exceeds size limit".to_string(),
        ));
    }
    extract_paragraph_text(&doc_xml)
}

/// Collects `<w:t>` runs, one line per `<w:p>` paragraph.
fn extract_paragraph_text(xml: &[u8]) -> Result<String, ExtractError> {
    use quick_xml::events::Event;

    let mut out = String::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut in_text_run = false;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"t" => in_text_run = true,
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text_run = false,
                b"p" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Text(text)) if in_text_run => {
                let unescaped = text
                    .unescape()
                    .map_err(|e| ExtractError::Docx(e.to_string()))?;
                out.push_str(&unescaped);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ExtractError::Docx(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(out.trim_end().to_string())
}
