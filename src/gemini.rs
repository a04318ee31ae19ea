//! Google Generative Language API client
//!
//! Embeds chunks and questions, and generates answers.

use crate::error::{Error, Result};
use crate::settings::{self, Settings};
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
/// batchEmbedContents accepts at most 100 requests
const EMBED_BATCH_SIZE: usize = 100;
/// Batches in flight at once
const EMBED_CONCURRENCY: usize = 4;

/// Turns text into vectors
pub trait Embedder {
    fn embed_documents(&self, texts: &[String]) -> impl Future<Output = Result<Vec<Vec<f32>>>> + Send;
    fn embed_query(&self, text: &str) -> impl Future<Output = Result<Vec<f32>>> + Send;
}

/// Turns a prompt into an answer
pub trait Generator {
    fn generate(&self, prompt: &str) -> impl Future<Output = Result<String>> + Send;
}

#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    chat_model: String,
    embedding_model: String,
    temperature: f32,
}

// ==================== Wire format ====================

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedRequest<'a> {
    model: &'a str,
    content: Content<'a>,
    task_type: &'a str,
}

#[derive(Debug, Serialize)]
struct BatchEmbedRequest<'a> {
    requests: Vec<EmbedRequest<'a>>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: EmbeddingValues,
}

#[derive(Debug, Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<EmbeddingValues>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

// ==================== Client ====================

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, settings: &Settings) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(Error::MissingApiKey);
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;

        Ok(Self {
            client,
            api_key,
            base_url: API_BASE.to_string(),
            chat_model: model_path(&settings.chat_model),
            embedding_model: model_path(&settings.embedding_model),
            temperature: settings.temperature,
        })
    }

    /// Build from the stored settings (env var key takes precedence)
    pub fn from_settings() -> Result<Self> {
        let api_key = settings::get_api_key().ok_or(Error::MissingApiKey)?;
        Self::new(api_key, &settings::get())
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn post<B: Serialize, R: for<'de> Deserialize<'de>>(&self, url: String, body: &B) -> Result<R> {
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("[Gemini] {} returned {}", url, status);
            return Err(Error::Api { status, body });
        }

        Ok(response.json().await?)
    }

    async fn embed_batch(&self, batch: &[String]) -> Result<Vec<Vec<f32>>> {
        let request = BatchEmbedRequest {
            requests: batch
                .iter()
                .map(|text| EmbedRequest {
                    model: &self.embedding_model,
                    content: Content { role: None, parts: vec![Part { text: text.as_str() }] },
                    task_type: "RETRIEVAL_DOCUMENT",
                })
                .collect(),
        };

        let url = format!("{}/{}:batchEmbedContents", self.base_url, self.embedding_model);
        let response: BatchEmbedResponse = self.post(url, &request).await?;

        if response.embeddings.len() != batch.len() {
            return Err(Error::Api {
                status: 200,
                body: format!(
                    "expected {} embeddings, got {}",
                    batch.len(),
                    response.embeddings.len()
                ),
            });
        }
        Ok(response.embeddings.into_iter().map(|e| e.values).collect())
    }
}

impl Embedder for GeminiClient {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let batches: Vec<&[String]> = texts.chunks(EMBED_BATCH_SIZE).collect();
        tracing::debug!("[Gemini] Embedding {} texts in {} batches", texts.len(), batches.len());

        let mut embeddings = Vec::with_capacity(texts.len());
        for group in batches.chunks(EMBED_CONCURRENCY) {
            let results = try_join_all(group.iter().map(|batch| self.embed_batch(batch))).await?;
            embeddings.extend(results.into_iter().flatten());
        }
        Ok(embeddings)
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let request = EmbedRequest {
            model: &self.embedding_model,
            content: Content { role: None, parts: vec![Part { text }] },
            task_type: "RETRIEVAL_QUERY",
        };
        let url = format!("{}/{}:embedContent", self.base_url, self.embedding_model);
        let response: EmbedResponse = self.post(url, &request).await?;
        Ok(response.embedding.values)
    }
}

impl Generator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            contents: vec![Content { role: Some("user"), parts: vec![Part { text: prompt }] }],
            generation_config: GenerationConfig { temperature: self.temperature },
        };
        let url = format!("{}/{}:generateContent", self.base_url, self.chat_model);
        let response: GenerateResponse = self.post(url, &request).await?;
        extract_text(response)
    }
}

/// "gemini-pro" -> "models/gemini-pro"
fn model_path(model: &str) -> String {
    if model.starts_with("models/") {
        model.to_string()
    } else {
        format!("models/{}", model)
    }
}

fn extract_text(response: GenerateResponse) -> Result<String> {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| content.parts.into_iter().map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(Error::Api { status: 200, body: "response contained no text".to_string() });
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    #[test]
    fn test_model_path() {
        assert_eq!(model_path("gemini-pro"), "models/gemini-pro");
        assert_eq!(model_path("models/embedding-001"), "models/embedding-001");
    }

    #[test]
    fn test_missing_key_rejected() {
        let err = GeminiClient::new("", &Settings::default()).unwrap_err();
        assert!(matches!(err, Error::MissingApiKey));
    }

    #[test]
    fn test_embed_request_shape() {
        let request = EmbedRequest {
            model: "models/embedding-001",
            content: Content { role: None, parts: vec![Part { text: "hello" }] },
            task_type: "RETRIEVAL_QUERY",
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "model": "models/embedding-001",
                "content": {"parts": [{"text": "hello"}]},
                "taskType": "RETRIEVAL_QUERY"
            })
        );
    }

    #[test]
    fn test_generate_request_shape() {
        let request = GenerateRequest {
            contents: vec![Content { role: Some("user"), parts: vec![Part { text: "hi" }] }],
            generation_config: GenerationConfig { temperature: 0.3 },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hi");
        assert!(json["generationConfig"]["temperature"].as_f64().unwrap() > 0.29);
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let response: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"Hello "},{"text":"world"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(extract_text(response).unwrap(), "Hello world");
    }

    #[test]
    fn test_extract_text_blocked_response() {
        let response: GenerateResponse =
            serde_json::from_str(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).unwrap();
        assert!(extract_text(response).is_err());
    }

    #[test]
    fn test_batch_response_parses() {
        let response: BatchEmbedResponse =
            serde_json::from_str(r#"{"embeddings":[{"values":[0.1,0.2]},{"values":[0.3,0.4]}]}"#).unwrap();
        assert_eq!(response.embeddings.len(), 2);
        assert_eq!(response.embeddings[1].values, vec![0.3, 0.4]);
    }

    // ==================== Against a local HTTP server ====================

    type Requests = Arc<Mutex<Vec<(String, Value)>>>;

    /// Serve one request per connection with `respond(path, body) -> (status, body)`.
    /// Returns the base url and the requests seen so far.
    async fn serve<F>(respond: F) -> (String, Requests)
    where
        F: Fn(&str, &Value) -> (u16, String) + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let seen: Requests = Arc::new(Mutex::new(Vec::new()));
        let respond = Arc::new(respond);

        let log = seen.clone();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let respond = respond.clone();
                let log = log.clone();
                tokio::spawn(async move {
                    let (path, body) = read_request(&mut socket).await;
                    let (status, reply) = respond(&path, &body);
                    log.lock().unwrap().push((path, body));
                    let response = format!(
                        "HTTP/1.1 {} Stub\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                        status,
                        reply.len(),
                        reply
                    );
                    socket.write_all(response.as_bytes()).await.unwrap();
                    socket.shutdown().await.ok();
                });
            }
        });

        (format!("http://{}", addr), seen)
    }

    async fn read_request(socket: &mut TcpStream) -> (String, Value) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 8192];
        let header_end = loop {
            let n = socket.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed before headers ended");
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
        let path = head.split_whitespace().nth(1).unwrap().to_string();
        let length: usize = head
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
            .map(|(_, value)| value.trim().parse().unwrap())
            .unwrap_or(0);

        while buf.len() < header_end + length {
            let n = socket.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed before body ended");
            buf.extend_from_slice(&chunk[..n]);
        }
        let body = serde_json::from_slice(&buf[header_end..header_end + length]).unwrap_or(Value::Null);
        (path, body)
    }

    fn client(base_url: &str) -> GeminiClient {
        GeminiClient::new("test-key", &Settings::default()).unwrap().with_base_url(base_url)
    }

    /// Embeds "t<n>" as [n] so ordering is visible in the results
    fn embed_by_number(_path: &str, body: &Value) -> (u16, String) {
        let embeddings: Vec<Value> = body["requests"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| {
                let text = r["content"]["parts"][0]["text"].as_str().unwrap();
                let n: f32 = text.trim_start_matches('t').parse().unwrap();
                json!({ "values": [n] })
            })
            .collect();
        (200, json!({ "embeddings": embeddings }).to_string())
    }

    #[tokio::test]
    async fn test_error_status_becomes_api_error() {
        let (url, _) = serve(|_, _| (403, r#"{"error":{"status":"PERMISSION_DENIED"}}"#.to_string())).await;

        let err = client(&url).embed_query("hello").await.unwrap_err();
        match err {
            Error::Api { status, body } => {
                assert_eq!(status, 403);
                assert!(body.contains("PERMISSION_DENIED"));
            }
            other => panic!("expected API error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_short_embeddings_response_rejected() {
        let (url, _) = serve(|_, _| (200, json!({ "embeddings": [{ "values": [1.0] }] }).to_string())).await;

        let texts = vec!["t0".to_string(), "t1".to_string()];
        let err = client(&url).embed_documents(&texts).await.unwrap_err();
        match err {
            Error::Api { status, body } => {
                assert_eq!(status, 200);
                assert_eq!(body, "expected 2 embeddings, got 1");
            }
            other => panic!("expected API error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_embed_documents_batches_and_keeps_order() {
        let (url, seen) = serve(embed_by_number).await;

        let texts: Vec<String> = (0..150).map(|i| format!("t{}", i)).collect();
        let embeddings = client(&url).embed_documents(&texts).await.unwrap();

        let expected: Vec<Vec<f32>> = (0..150).map(|i| vec![i as f32]).collect();
        assert_eq!(embeddings, expected);

        let seen = seen.lock().unwrap();
        let mut sizes: Vec<usize> = seen.iter().map(|(_, b)| b["requests"].as_array().unwrap().len()).collect();
        sizes.sort_unstable();
        assert_eq!(sizes, vec![50, 100]);
        for (path, body) in seen.iter() {
            assert_eq!(path, "/models/embedding-001:batchEmbedContents");
            assert_eq!(body["requests"][0]["taskType"], "RETRIEVAL_DOCUMENT");
            assert_eq!(body["requests"][0]["model"], "models/embedding-001");
        }
    }

    #[tokio::test]
    async fn test_embed_query_request() {
        let (url, seen) = serve(|_, _| (200, json!({ "embedding": { "values": [0.5, 0.25] } }).to_string())).await;

        let embedding = client(&url).embed_query("what is rust?").await.unwrap();
        assert_eq!(embedding, vec![0.5, 0.25]);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, "/models/embedding-001:embedContent");
        assert_eq!(seen[0].1["taskType"], "RETRIEVAL_QUERY");
        assert_eq!(seen[0].1["content"]["parts"][0]["text"], "what is rust?");
    }

    #[tokio::test]
    async fn test_generate_request() {
        let (url, seen) = serve(|_, _| {
            (200, json!({ "candidates": [{ "content": { "parts": [{ "text": "Rust is fast." }] } }] }).to_string())
        })
        .await;

        let text = client(&url).generate("prompt text").await.unwrap();
        assert_eq!(text, "Rust is fast.");

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].0, "/models/gemini-pro:generateContent");
        assert_eq!(seen[0].1["contents"][0]["parts"][0]["text"], "prompt text");
        let temperature = seen[0].1["generationConfig"]["temperature"].as_f64().unwrap();
        assert!((temperature - 0.3).abs() < 1e-6);
    }
}
