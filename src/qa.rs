//! Question answering over retrieved chunks
//!
//! All retrieved chunks are stuffed into a single prompt.

use crate::error::Result;
use crate::gemini::{Embedder, Generator};
use crate::vector_store::{ScoredChunk, VectorStore};

pub const NO_CONTEXT_MESSAGE: &str =
    "I couldn't find any relevant information in the documents to answer your question.";

/// Answer plus the chunks it was grounded on
#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    pub sources: Vec<ScoredChunk>,
}

pub fn build_prompt(question: &str, chunks: &[ScoredChunk]) -> String {
    let context = chunks
        .iter()
        .map(|c| c.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        r#"Answer the question as detailed as possible from the provided context.
Make sure to provide all the details. If the answer is not in the provided context,
just say, "The answer is not available in the context." Do not provide a wrong answer.

Context:
{context}

Question:
{question}

Answer:
"#
    )
}

pub async fn answer<E, G>(
    store: &VectorStore,
    question: &str,
    top_k: usize,
    embedder: &E,
    generator: &G,
) -> Result<Answer>
where
    E: Embedder,
    G: Generator,
{
    let query_embedding = embedder.embed_query(question).await?;
    let sources = store.similarity_search(&query_embedding, top_k);

    if sources.is_empty() {
        return Ok(Answer { text: NO_CONTEXT_MESSAGE.to_string(), sources });
    }

    tracing::debug!(
        "[QA] {} chunks retrieved, best score {:.3}",
        sources.len(),
        sources[0].score
    );

    let prompt = build_prompt(question, &sources);
    let text = generator.generate(&prompt).await?.trim().to_string();
    Ok(Answer { text, sources })
}
