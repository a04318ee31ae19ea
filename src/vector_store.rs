//! In-memory vector store over document chunks
//!
//! Brute-force cosine search; a few thousand chunks per session is the
//! expected size. Can be serialized to disk so the CLI can ask questions in
//! a later run without re-embedding.

use crate::error::{Error, Result};
use crate::gemini::Embedder;
use crate::similarity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;

/// Bumped whenever the on-disk layout changes
const INDEX_FORMAT_VERSION: u32 = 1;

/// A chunk of a document before embedding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub source: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredChunk {
    /// "<source>#<n>"
    pub id: String,
    pub source: String,
    pub text: String,
    pub embedding: Vec<f32>,
}

/// A retrieved chunk with its score
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredChunk {
    pub id: String,
    pub source: String,
    pub text: String,
    pub score: f32,
}

/// Per-document bookkeeping
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SourceInfo {
    pub name: String,
    pub fingerprint: String,
    pub chunk_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorStore {
    version: u32,
    created_at: DateTime<Utc>,
    sources: Vec<SourceInfo>,
    chunks: Vec<StoredChunk>,
}

impl VectorStore {
    /// Embed `chunks` and build a store. Empty input is an error.
    pub async fn from_chunks<E: Embedder>(
        chunks: Vec<Chunk>,
        sources: Vec<SourceInfo>,
        embedder: &E,
    ) -> Result<Self> {
        if chunks.is_empty() {
            return Err(Error::NoText);
        }

        let start = Instant::now();
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = embedder.embed_documents(&texts).await?;

        if embeddings.len() != chunks.len() {
            return Err(Error::index(format!(
                "embedder returned {} vectors for {} chunks",
                embeddings.len(),
                chunks.len()
            )));
        }

        let mut per_source: std::collections::HashMap<String, usize> = std::collections::HashMap::new();
        let stored = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| {
                let n = per_source.entry(chunk.source.clone()).or_insert(0);
                let id = format!("{}#{}", chunk.source, n);
                *n += 1;
                StoredChunk { id, source: chunk.source, text: chunk.text, embedding }
            })
            .collect::<Vec<_>>();

        tracing::info!(
            "[Index] Embedded {} chunks from {} documents in {}ms",
            stored.len(),
            sources.len(),
            start.elapsed().as_millis()
        );

        Ok(Self {
            version: INDEX_FORMAT_VERSION,
            created_at: Utc::now(),
            sources,
            chunks: stored,
        })
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn sources(&self) -> &[SourceInfo] {
        &self.sources
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Up to `k` chunks, most similar first
    pub fn similarity_search(&self, query_embedding: &[f32], k: usize) -> Vec<ScoredChunk> {
        similarity::top_k(
            query_embedding,
            self.chunks.iter().map(|c| c.embedding.as_slice()),
            k,
        )
        .into_iter()
        .map(|(i, score)| {
            let chunk = &self.chunks[i];
            ScoredChunk {
                id: chunk.id.clone(),
                source: chunk.source.clone(),
                text: chunk.text.clone(),
                score,
            }
        })
        .collect()
    }

    /// Save index to disk
    pub fn save(&self, path: &Path) -> Result<()> {
        let start = Instant::now();
        let bytes = bincode::serialize(self)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, &bytes)?;

        tracing::info!(
            "[Index] Saved {} chunks ({} bytes) to {:?} in {}ms",
            self.len(),
            bytes.len(),
            path,
            start.elapsed().as_millis()
        );
        Ok(())
    }

    /// Load a saved index. `Ok(None)` when no index exists yet.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let bytes = std::fs::read(path)?;
        let store: VectorStore = bincode::deserialize(&bytes)
            .map_err(|e| Error::index(format!("Failed to decode {:?}: {}", path, e)))?;

        if store.version != INDEX_FORMAT_VERSION {
            return Err(Error::index(format!(
                "{:?} has format version {}, expected {}; process the documents again",
                path, store.version, INDEX_FORMAT_VERSION
            )));
        }

        tracing::debug!("[Index] Loaded {} chunks from {:?}", store.len(), path);
        Ok(Some(store))
    }

    /// Delete the index file if it exists
    pub fn delete(path: &Path) -> Result<()> {
        if path.exists() {
            std::fs::remove_file(path)?;
            tracing::info!("[Index] Deleted {:?}", path);
        }
        Ok(())
    }
}
