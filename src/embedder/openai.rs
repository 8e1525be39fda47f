/// Embedder backed by an OpenAI-compatible `/embeddings` endpoint.
///
/// Calls `POST {base_url}/embeddings` with `{ "model", "input" }` and maps
/// the `data[].embedding` arrays back to input order by their `index`.
/// Failures are returned as-is; there is no retry at this layer.
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Embedder, EmbedderError, truncate_chars};
use crate::config::EmbeddingConfig;

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: EmbeddingInput<'a>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum EmbeddingInput<'a> {
    One(&'a str),
    Many(Vec<&'a str>),
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f64>,
    #[serde(default)]
    index: usize,
}

pub struct OpenAiEmbedder {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    max_input_chars: usize,
}

impl OpenAiEmbedder {
    /// Create an embedder from configuration, reading the API key from the
    /// environment variable named by `api_key_env`.
    pub fn from_config(
        config: &EmbeddingConfig,
        max_input_chars: usize,
    ) -> Result<Self, EmbedderError> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            EmbedderError::Config(format!("{} environment variable not set", config.api_key_env))
        })?;

        Self::new(
            &config.base_url,
            Some(api_key),
            Duration::from_secs(config.timeout_secs),
            max_input_chars,
        )
    }

    /// Create an embedder for an explicit endpoint.
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        timeout: Duration,
        max_input_chars: usize,
    ) -> Result<Self, EmbedderError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            max_input_chars,
        })
    }

    async fn request(
        &self,
        model: &str,
        input: EmbeddingInput<'_>,
    ) -> Result<Vec<Vec<f64>>, EmbedderError> {
        let url = format!("{}/embeddings", self.base_url);
        let mut req = self
            .client
            .post(&url)
            .json(&EmbeddingRequest { model, input });
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(EmbedderError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: EmbeddingResponse = resp
            .json()
            .await
            .map_err(|e| EmbedderError::InvalidResponse(e.to_string()))?;

        Ok(order_by_index(parsed.data))
    }
}

fn order_by_index(mut data: Vec<EmbeddingData>) -> Vec<Vec<f64>> {
    data.sort_by_key(|d| d.index);
    data.into_iter().map(|d| d.embedding).collect()
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed_batch(
        &self,
        texts: &[String],
        model: &str,
    ) -> Result<Vec<Vec<f64>>, EmbedderError> {
        let inputs: Vec<&str> = texts
            .iter()
            .map(|t| truncate_chars(t, self.max_input_chars))
            .collect();

        debug!("Requesting {} embeddings from {}", inputs.len(), self.base_url);
        let vectors = self.request(model, EmbeddingInput::Many(inputs)).await?;

        if vectors.len() != texts.len() {
            return Err(EmbedderError::InvalidResponse(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                vectors.len()
            )));
        }

        Ok(vectors)
    }

    async fn embed_one(&self, text: &str, model: &str) -> Result<Vec<f64>, EmbedderError> {
        self.request(model, EmbeddingInput::One(text))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| EmbedderError::InvalidResponse("empty embedding response".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, http::StatusCode, routing::post};
    use serde_json::{Value, json};

    /// Fake provider: returns `[char_count, 1.0]` per input, listed in
    /// reverse so callers must reorder by `index`.
    async fn fake_embeddings(Json(body): Json<Value>) -> Json<Value> {
        let inputs: Vec<String> = match &body["input"] {
            Value::String(s) => vec![s.clone()],
            Value::Array(items) => items
                .iter()
                .map(|v| v.as_str().unwrap_or_default().to_string())
                .collect(),
            _ => Vec::new(),
        };
        let mut data: Vec<Value> = inputs
            .iter()
            .enumerate()
            .map(|(i, s)| {
                json!({ "index": i, "embedding": [s.chars().count() as f64, 1.0] })
            })
            .collect();
        data.reverse();
        Json(json!({ "data": data, "model": body["model"] }))
    }

    async fn rejecting() -> (StatusCode, &'static str) {
        (StatusCode::TOO_MANY_REQUESTS, "rate limited")
    }

    async fn short_response() -> Json<Value> {
        Json(json!({ "data": [{ "index": 0, "embedding": [1.0] }] }))
    }

    async fn spawn(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/v1")
    }

    fn embedder(base_url: &str, max_chars: usize) -> OpenAiEmbedder {
        OpenAiEmbedder::new(
            base_url,
            Some("test-key".into()),
            Duration::from_secs(5),
            max_chars,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_batch_preserves_input_order() {
        let url = spawn(Router::new().route("/v1/embeddings", post(fake_embeddings))).await;
        let e = embedder(&url, 2000);
        let texts = vec!["a".to_string(), "bbb".to_string(), "cc".to_string()];
        let vectors = e.embed_batch(&texts, "text-embedding-3-small").await.unwrap();
        let lengths: Vec<f64> = vectors.iter().map(|v| v[0]).collect();
        assert_eq!(lengths, vec![1.0, 3.0, 2.0]);
    }

    #[tokio::test]
    async fn test_batch_truncates_inputs() {
        let url = spawn(Router::new().route("/v1/embeddings", post(fake_embeddings))).await;
        let e = embedder(&url, 5);
        let texts = vec!["x".repeat(50), "short".to_string()];
        let vectors = e.embed_batch(&texts, "m").await.unwrap();
        assert_eq!(vectors[0][0], 5.0);
        assert_eq!(vectors[1][0], 5.0);
    }

    #[tokio::test]
    async fn test_query_is_not_truncated() {
        let url = spawn(Router::new().route("/v1/embeddings", post(fake_embeddings))).await;
        let e = embedder(&url, 5);
        let vector = e.embed_one(&"q".repeat(40), "m").await.unwrap();
        assert_eq!(vector[0], 40.0);
    }

    #[tokio::test]
    async fn test_error_status_is_surfaced() {
        let url = spawn(Router::new().route("/v1/embeddings", post(rejecting))).await;
        let e = embedder(&url, 2000);
        let err = e.embed_one("q", "m").await.unwrap_err();
        match err {
            EmbedderError::Api { status, body } => {
                assert_eq!(status, 429);
                assert_eq!(body, "rate limited");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_count_mismatch_rejected() {
        let url = spawn(Router::new().route("/v1/embeddings", post(short_response))).await;
        let e = embedder(&url, 2000);
        let texts = vec!["a".to_string(), "b".to_string()];
        let err = e.embed_batch(&texts, "m").await.unwrap_err();
        assert!(matches!(err, EmbedderError::InvalidResponse(_)));
    }

    #[test]
    fn test_order_by_index() {
        let data = vec![
            EmbeddingData {
                embedding: vec![2.0],
                index: 1,
            },
            EmbeddingData {
                embedding: vec![1.0],
                index: 0,
            },
        ];
        assert_eq!(order_by_index(data), vec![vec![1.0], vec![2.0]]);
    }

    #[test]
    fn test_from_config_requires_api_key() {
        let config = EmbeddingConfig {
            api_key_env: "RAGINDEX_TEST_KEY_THAT_IS_NEVER_SET".into(),
            ..Default::default()
        };
        let err = OpenAiEmbedder::from_config(&config, 2000).err().unwrap();
        assert!(matches!(err, EmbedderError::Config(_)));
    }
}
