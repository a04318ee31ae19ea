//! Chat session: history plus the active vector store
//!
//! Shared by the GUI (one session per window) and the CLI `chat` loop.

use crate::error::{Error, Result};
use crate::gemini::{Embedder, Generator};
use crate::qa;
use crate::vector_store::VectorStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};

pub const NOT_READY_MESSAGE: &str = "Please upload and process your PDF documents first.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ReplyKind {
    Answer,
    NotReady,
    Error,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub kind: ReplyKind,
    pub content: String,
    /// Chunk ids the answer was grounded on
    pub sources: Vec<String>,
}

#[derive(Debug, Default)]
pub struct ChatSession {
    history: Vec<ChatMessage>,
    store: Option<Arc<VectorStore>>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_store(store: VectorStore) -> Self {
        Self { history: Vec::new(), store: Some(Arc::new(store)) }
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn store(&self) -> Option<Arc<VectorStore>> {
        self.store.clone()
    }

    /// Replace the active documents; the old conversation no longer applies
    pub fn install_store(&mut self, store: VectorStore) {
        self.store = Some(Arc::new(store));
        self.history.clear();
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn push(&mut self, role: Role, content: impl Into<String>) {
        self.history.push(ChatMessage { role, content: content.into(), created_at: Utc::now() });
    }
}

fn lock_err<T>(_: T) -> Error {
    Error::Lock("Failed to acquire session lock".to_string())
}

impl ChatReply {
    pub fn not_ready() -> Self {
        Self { kind: ReplyKind::NotReady, content: NOT_READY_MESSAGE.to_string(), sources: vec![] }
    }

    pub fn error(err: &Error) -> Self {
        Self { kind: ReplyKind::Error, content: format!("An error occurred: {}", err), sources: vec![] }
    }
}

/// Record `question` and return the active store
fn begin(session: &RwLock<ChatSession>, question: &str) -> Result<Option<Arc<VectorStore>>> {
    let mut guard = session.write().map_err(lock_err)?;
    guard.push(Role::User, question);
    Ok(guard.store())
}

fn finish(session: &RwLock<ChatSession>, reply: ChatReply) -> Result<ChatReply> {
    session.write().map_err(lock_err)?.push(Role::Assistant, reply.content.clone());
    Ok(reply)
}

/// Record a question that is answered without asking the model
pub fn reply_directly(session: &RwLock<ChatSession>, question: &str, reply: ChatReply) -> Result<ChatReply> {
    begin(session, question)?;
    finish(session, reply)
}

/// Ask a question in `session`. Always records a reply, even on failure.
///
/// The lock is only held while touching history, never across the network calls.
pub async fn ask<E, G>(
    session: &RwLock<ChatSession>,
    question: &str,
    top_k: usize,
    embedder: &E,
    generator: &G,
) -> Result<ChatReply>
where
    E: Embedder,
    G: Generator,
{
    let reply = match begin(session, question)? {
        None => ChatReply::not_ready(),
        Some(store) => match qa::answer(&store, question, top_k, embedder, generator).await {
            Ok(answer) => ChatReply {
                kind: ReplyKind::Answer,
                content: answer.text,
                sources: answer.sources.into_iter().map(|s| s.id).collect(),
            },
            Err(e) => {
                tracing::error!("[Chat] Answering failed: {}", e);
                ChatReply::error(&e)
            }
        },
    };

    finish(session, reply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_store::test_support::*;

    async fn ready_session() -> RwLock<ChatSession> {
        let embedder = KeywordEmbedder::new(vec!["rust"]);
        let store = VectorStore::from_chunks(vec![chunk("a.pdf", "rust is fast")], vec![], &embedder)
            .await
            .unwrap();
        RwLock::new(ChatSession::with_store(store))
    }

    #[tokio::test]
    async fn test_ask_without_documents() {
        let session = RwLock::new(ChatSession::new());
        let embedder = KeywordEmbedder::new(vec!["rust"]);
        let reply = ask(&session, "anything?", 4, &embedder, &EchoGenerator).await.unwrap();

        assert_eq!(reply.kind, ReplyKind::NotReady);
        assert_eq!(reply.content, "Please upload and process your PDF documents first.");
        assert_eq!(embedder.calls.load(std::sync::atomic::Ordering::SeqCst), 0);

        let guard = session.read().unwrap();
        let roles: Vec<Role> = guard.history().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant]);
    }

    #[tokio::test]
    async fn test_ask_answers_and_records() {
        let session = ready_session().await;
        let embedder = KeywordEmbedder::new(vec!["rust"]);
        let reply = ask(&session, "is rust fast?", 4, &embedder, &EchoGenerator).await.unwrap();

        assert_eq!(reply.kind, ReplyKind::Answer);
        assert_eq!(reply.content, "answered from: rust is fast");
        assert_eq!(reply.sources, vec!["a.pdf#0"]);

        let guard = session.read().unwrap();
        assert_eq!(guard.history().len(), 2);
        assert_eq!(guard.history()[0].content, "is rust fast?");
        assert_eq!(guard.history()[1].content, "answered from: rust is fast");
    }

    #[tokio::test]
    async fn test_ask_error_becomes_reply() {
        let session = ready_session().await;
        let reply = ask(&session, "is rust fast?", 4, &FailingEmbedder, &EchoGenerator).await.unwrap();

        assert_eq!(reply.kind, ReplyKind::Error);
        assert_eq!(reply.content, "An error occurred: API error 500: embedding backend down");
        assert_eq!(session.read().unwrap().history().len(), 2);
    }

    #[tokio::test]
    async fn test_install_store_clears_history() {
        let session = ready_session().await;
        let embedder = KeywordEmbedder::new(vec!["rust"]);
        ask(&session, "q", 4, &embedder, &EchoGenerator).await.unwrap();

        let store = VectorStore::from_chunks(vec![chunk("b.pdf", "rust again")], vec![], &embedder)
            .await
            .unwrap();
        session.write().unwrap().install_store(store);

        let guard = session.read().unwrap();
        assert!(guard.history().is_empty());
        assert_eq!(guard.store().map(|s| s.len()), Some(1));
    }
}
