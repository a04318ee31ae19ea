//! Error type shared by the library
//!
//! Tauri commands and the CLI turn these into strings at the edge.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// pdf-extract could not read the document (encrypted, corrupted, ...)
    #[error("PDF extraction failed for {source_name}: {reason}")]
    Pdf { source_name: String, reason: String },

    /// Input rejected before extraction was attempted
    #[error("Invalid PDF: {0}")]
    InvalidPdf(String),

    #[error("Could not extract any text from the PDF(s). Please check the documents.")]
    NoText,

    #[error("GOOGLE_API_KEY not set")]
    MissingApiKey,

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    /// Vector index could not be read, written or decoded
    #[error("Index error: {0}")]
    Index(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Lock error: {0}")]
    Lock(String),
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn index(msg: impl Into<String>) -> Self {
        Self::Index(msg.into())
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Self::Index(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
