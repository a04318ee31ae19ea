use crate::chunking::TextSplitter;
use crate::error::{Error, Result};
use crate::gemini::{Embedder, Generator};
use crate::ingest::{self, IngestReport};
use crate::session::{self, ChatReply, ChatSession};
use crate::settings;
use crate::ui::Bindings;
use crate::vector_store::VectorStore;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

pub struct AppState {
    /// Page element -> trigger table, filled at startup
    pub bindings: Bindings,
    pub session: RwLock<ChatSession>,
    pub index_path: PathBuf,
    processing: AtomicBool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStatus {
    pub ready: bool,
    pub chunk_count: usize,
    pub documents: Vec<String>,
    pub created_at: Option<String>,
    pub processing: bool,
}

/// Clears the processing flag however `process` exits
struct ProcessingGuard<'a>(&'a AtomicBool);

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl AppState {
    pub fn new(index_path: PathBuf) -> Self {
        Self {
            bindings: Bindings::standard(),
            session: RwLock::new(ChatSession::new()),
            index_path,
            processing: AtomicBool::new(false),
        }
    }

    /// State with the saved index (if any) already installed
    pub fn restore(index_path: PathBuf) -> Self {
        let state = Self::new(index_path);
        match VectorStore::load(&state.index_path) {
            Ok(Some(store)) => {
                tracing::info!("[Index] Restored {} chunks from previous session", store.len());
                if let Ok(mut session) = state.session.write() {
                    session.install_store(store);
                }
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("[Index] Ignoring saved index: {}", e),
        }
        state
    }

    pub fn is_processing(&self) -> bool {
        self.processing.load(Ordering::SeqCst)
    }

    /// Ingest `paths`, persist the index and make it the active store.
    /// Only one run at a time.
    pub async fn process<E: Embedder>(&self, paths: &[PathBuf], embedder: &E) -> Result<IngestReport> {
        if self.processing.swap(true, Ordering::SeqCst) {
            return Err(Error::config("Documents are already being processed"));
        }
        let _guard = ProcessingGuard(&self.processing);

        let settings = settings::get();
        let splitter = TextSplitter::new(settings.chunk_size, settings.chunk_overlap)?;
        let (store, report) = ingest::ingest_paths(paths, &splitter, embedder).await?;

        store.save(&self.index_path)?;
        self.session
            .write()
            .map_err(|_| Error::Lock("Failed to acquire session lock".to_string()))?
            .install_store(store);

        Ok(report)
    }

    pub async fn ask<E: Embedder, G: Generator>(&self, question: &str, embedder: &E, generator: &G) -> Result<ChatReply> {
        session::ask(&self.session, question, settings::get().top_k, embedder, generator).await
    }

    /// Ask, building the client only once a question actually needs one.
    ///
    /// Without processed documents the not-ready reply comes back without
    /// calling `connect`; a failed `connect` becomes an error reply and is
    /// retried on the next question.
    pub async fn ask_connecting<C, F>(&self, question: &str, client: &mut Option<C>, connect: F) -> Result<ChatReply>
    where
        C: Embedder + Generator,
        F: FnOnce() -> Result<C>,
    {
        if !self.index_status().ready {
            return session::reply_directly(&self.session, question, ChatReply::not_ready());
        }

        if client.is_none() {
            match connect() {
                Ok(c) => *client = Some(c),
                Err(e) => {
                    tracing::warn!("[Chat] Could not create client: {}", e);
                    return session::reply_directly(&self.session, question, ChatReply::error(&e));
                }
            }
        }
        let Some(client) = client.as_ref() else {
            return session::reply_directly(&self.session, question, ChatReply::not_ready());
        };

        self.ask(question, client, client).await
    }

    pub fn index_status(&self) -> IndexStatus {
        let store = self.session.read().ok().and_then(|s| s.store());
        IndexStatus {
            ready: store.is_some(),
            chunk_count: store.as_ref().map(|s| s.len()).unwrap_or(0),
            documents: store
                .as_ref()
                .map(|s| s.sources().iter().map(|src| src.name.clone()).collect())
                .unwrap_or_default(),
            created_at: store.as_ref().map(|s| s.created_at().to_rfc3339()),
            processing: self.is_processing(),
        }
    }
}
