//! PDF text extraction wrapper
//!
//! Wraps pdf-extract with error handling for:
//! - Encrypted PDFs
//! - Scanned/image-only PDFs (no text, not an error)
//! - Corrupted PDFs

use crate::error::{Error, Result};
use sha2::{Digest, Sha256};
use std::path::Path;

/// PDF magic bytes
const PDF_MAGIC: &[u8] = b"%PDF";
/// Maximum PDF file size (100 MB)
const MAX_PDF_SIZE: u64 = 100 * 1024 * 1024;

/// A PDF reduced to its text
#[derive(Debug, Clone)]
pub struct Document {
    /// File name, kept so answers can be traced back to a document
    pub source: String,
    pub text: String,
    /// sha256 of the file bytes
    pub fingerprint: String,
}

pub fn validate_pdf(bytes: &[u8]) -> Result<()> {
    if bytes.len() < 8 {
        return Err(Error::InvalidPdf("file too small to be a PDF".to_string()));
    }

    check_size(bytes.len() as u64)?;

    if !bytes.starts_with(PDF_MAGIC) {
        return Err(Error::InvalidPdf("missing %PDF header".to_string()));
    }

    Ok(())
}

fn check_size(len: u64) -> Result<()> {
    if len > MAX_PDF_SIZE {
        return Err(Error::InvalidPdf(format!(
            "file too large ({} MB, maximum {} MB)",
            len / (1024 * 1024),
            MAX_PDF_SIZE / (1024 * 1024)
        )));
    }
    Ok(())
}

/// Extract full text from PDF bytes.
///
/// Image-only PDFs yield an empty string.
pub fn extract_text(source: &str, bytes: &[u8]) -> Result<String> {
    validate_pdf(bytes)?;

    // pdf-extract panics on some malformed inputs
    let extracted = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes));

    match extracted {
        Ok(Ok(text)) => Ok(clean_text(&text)),
        Ok(Err(e)) => Err(Error::Pdf { source_name: source.to_string(), reason: e.to_string() }),
        Err(_) => Err(Error::Pdf {
            source_name: source.to_string(),
            reason: "extractor panicked on malformed input".to_string(),
        }),
    }
}

/// Read a PDF from disk and extract its text
pub fn load_document(path: &Path) -> Result<Document> {
    let source = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string());

    // Oversized files are rejected before being read into memory
    check_size(std::fs::metadata(path)?.len())?;

    let bytes = std::fs::read(path)?;
    let fingerprint = hex::encode(Sha256::digest(&bytes));
    let text = extract_text(&source, &bytes)?;

    tracing::debug!("[PDF] {}: {} chars extracted", source, text.chars().count());
    Ok(Document { source, text, fingerprint })
}

/// Drop form feeds and trailing whitespace pdf-extract leaves between pages
fn clean_text(raw: &str) -> String {
    raw.replace('\u{c}', "\n")
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
