//! Nearest-neighbor search over place descriptions, served by a Chroma
//! collection. Documents read "<name> is <description>" so callers can
//! recover the place name from the leading token.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::ExternalError;

#[async_trait]
pub trait VectorSearch: Send + Sync {
    /// Return up to `top_k` descriptive documents nearest to `text`.
    async fn query(&self, text: &str, top_k: usize) -> Result<Vec<String>, ExternalError>;
}

pub struct ChromaVectorSearch {
    client: reqwest::Client,
    endpoint: String,
    collection: String,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    /// One inner list per query text; we always send exactly one.
    documents: Vec<Vec<String>>,
}

impl ChromaVectorSearch {
    pub fn new(endpoint: &str, collection: &str, timeout_secs: u64) -> anyhow::Result<Self> {
        Ok(Self {
            client: super::http_client(timeout_secs)?,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            collection: collection.to_string(),
        })
    }

    fn query_url(&self) -> String {
        format!(
            "{}/api/v1/collections/{}/query",
            self.endpoint, self.collection
        )
    }
}

#[async_trait]
impl VectorSearch for ChromaVectorSearch {
    async fn query(&self, text: &str, top_k: usize) -> Result<Vec<String>, ExternalError> {
        let url = self.query_url();
        let response = self
            .client
            .post(&url)
            .json(&json!({
                "query_texts": [text],
                "n_results": top_k,
            }))
            .send()
            .await
            .map_err(|source| ExternalError::Request {
                endpoint: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExternalError::Status {
                endpoint: url,
                status: status.as_u16(),
            });
        }

        let parsed: QueryResponse =
            response
                .json()
                .await
                .map_err(|e| ExternalError::Payload {
                    endpoint: url.clone(),
                    detail: e.to_string(),
                })?;

        Ok(parsed.documents.into_iter().next().unwrap_or_default())
    }
}
