//! Document ingestion pipeline
//!
//! PDF files -> text -> chunks -> embeddings -> vector store.
//! Files that cannot be read are skipped and reported; only a run that
//! yields no text at all fails.

use crate::chunking::TextSplitter;
use crate::error::{Error, Result};
use crate::gemini::Embedder;
use crate::pdf::{self, Document};
use crate::vector_store::{Chunk, SourceInfo, VectorStore};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;

pub const PROCESSING_COMPLETE_MESSAGE: &str = "Processing complete! You can now ask questions.";
pub const PROCESSING_FAILED_MESSAGE: &str = "Failed to process documents.";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentReport {
    pub name: String,
    pub characters: usize,
    pub chunks: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedDocument {
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    pub documents: Vec<DocumentReport>,
    pub skipped: Vec<SkippedDocument>,
    pub total_chunks: usize,
    pub elapsed_ms: u64,
}

impl IngestReport {
    /// One line per document for terminal output
    pub fn summary(&self) -> String {
        let mut lines: Vec<String> = self
            .documents
            .iter()
            .map(|d| format!("  {:40} {:>8} chars  {:>4} chunks", d.name, d.characters, d.chunks))
            .collect();
        lines.extend(
            self.skipped
                .iter()
                .map(|s| format!("  {:40} skipped: {}", s.name, s.reason)),
        );
        lines.push(format!(
            "Total: {} chunks from {} document(s) in {:.1}s",
            self.total_chunks,
            self.documents.len(),
            self.elapsed_ms as f64 / 1000.0
        ));
        lines.join("\n")
    }
}

/// Extract text from every path, off the async runtime
pub async fn load_documents(paths: &[PathBuf]) -> (Vec<Document>, Vec<SkippedDocument>) {
    let mut documents = Vec::new();
    let mut skipped = Vec::new();

    for path in paths {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());

        let owned = path.clone();
        let loaded = tokio::task::spawn_blocking(move || pdf::load_document(&owned))
            .await
            .map_err(|e| Error::Pdf { source_name: name.clone(), reason: e.to_string() })
            .and_then(|r| r);

        match loaded {
            Ok(doc) => documents.push(doc),
            Err(e) => {
                tracing::warn!("[Ingest] Skipping {}: {}", name, e);
                skipped.push(SkippedDocument { name, reason: e.to_string() });
            }
        }
    }

    (documents, skipped)
}

/// Split each document separately so every chunk keeps its source
pub fn chunk_documents(documents: &[Document], splitter: &TextSplitter) -> (Vec<Chunk>, Vec<DocumentReport>) {
    let mut chunks = Vec::new();
    let mut reports = Vec::new();

    for doc in documents {
        let pieces = splitter.split_text(&doc.text);
        reports.push(DocumentReport {
            name: doc.source.clone(),
            characters: doc.text.chars().count(),
            chunks: pieces.len(),
        });
        chunks.extend(pieces.into_iter().map(|text| Chunk { source: doc.source.clone(), text }));
    }

    (chunks, reports)
}

/// Build a vector store from already extracted documents
pub async fn ingest_documents<E: Embedder>(
    documents: Vec<Document>,
    skipped: Vec<SkippedDocument>,
    splitter: &TextSplitter,
    embedder: &E,
) -> Result<(VectorStore, IngestReport)> {
    let start = Instant::now();
    let (chunks, reports) = chunk_documents(&documents, splitter);

    for report in reports.iter().filter(|r| r.chunks == 0) {
        tracing::warn!("[Ingest] {} contains no extractable text", report.name);
    }

    let sources = documents
        .iter()
        .zip(&reports)
        .filter(|(_, r)| r.chunks > 0)
        .map(|(doc, r)| SourceInfo {
            name: doc.source.clone(),
            fingerprint: doc.fingerprint.clone(),
            chunk_count: r.chunks,
        })
        .collect();

    let total_chunks = chunks.len();
    let store = VectorStore::from_chunks(chunks, sources, embedder).await?;

    let report = IngestReport {
        documents: reports,
        skipped,
        total_chunks,
        elapsed_ms: start.elapsed().as_millis() as u64,
    };
    tracing::info!(
        "[Ingest] {} chunks from {} documents ({} skipped)",
        report.total_chunks,
        report.documents.len(),
        report.skipped.len()
    );
    Ok((store, report))
}

/// Full pipeline from file paths
pub async fn ingest_paths<E: Embedder>(
    paths: &[PathBuf],
    splitter: &TextSplitter,
    embedder: &E,
) -> Result<(VectorStore, IngestReport)> {
    tracing::info!("[Ingest] Processing {} file(s)", paths.len());
    let (documents, skipped) = load_documents(paths).await;
    ingest_documents(documents, skipped, splitter, embedder).await
}
