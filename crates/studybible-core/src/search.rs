use futures_util::future::BoxFuture;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// The verse a related-passages request is about. Serialized as-is for the
/// request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub book: String,
    pub chapter: u32,
    pub verse: u32,
}

impl std::fmt::Display for Citation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}:{}", self.book, self.chapter, self.verse)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedVerse {
    pub reference: String,
    pub text: String,
}

/// Why a similarity request produced no results. The coordinator treats all
/// of these the same; they exist so the logs can tell them apart.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    #[error("Could not reach the similarity service: {0}")]
    Transport(String),

    #[error("Failed to fetch related verses: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed response from the similarity service: {0}")]
    Malformed(String),

    #[error("Similarity service did not respond within {}s", .0.as_secs_f32())]
    Timeout(Duration),
}

impl SearchError {
    pub fn kind(&self) -> &'static str {
        match self {
            SearchError::Transport(_) => "transport",
            SearchError::Status { .. } => "status",
            SearchError::Malformed(_) => "malformed",
            SearchError::Timeout(_) => "timeout",
        }
    }

    pub(crate) fn log(&self, citation: &Citation) {
        match self {
            SearchError::Status { status, body } => warn!(
                kind = self.kind(),
                %citation,
                status,
                body = %body,
                "similarity service rejected request"
            ),
            _ => warn!(kind = self.kind(), %citation, error = %self, "similarity request failed"),
        }
    }
}

/// The seam between the coordinator and whatever answers similarity
/// queries. Futures are `'static` so they can be spawned.
pub trait SimilaritySearch: Send + Sync {
    fn fetch_related(
        &self,
        citation: Citation,
    ) -> BoxFuture<'static, Result<Vec<RelatedVerse>, SearchError>>;
}

#[derive(Clone)]
pub struct SimilarityClient {
    client: Client,
    base_url: String,
}

impl SimilarityClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/api/similar_verses", self.base_url)
    }

    pub async fn similar_verses(&self, citation: &Citation) -> Result<Vec<RelatedVerse>, SearchError> {
        let result = self.request(citation).await;
        if let Err(err) = &result {
            err.log(citation);
        }
        result
    }

    async fn request(&self, citation: &Citation) -> Result<Vec<RelatedVerse>, SearchError> {
        let response = self
            .client
            .post(self.endpoint())
            .json(citation)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let body = if text.trim().is_empty() {
                status.to_string()
            } else {
                text
            };
            return Err(SearchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await.map_err(transport_error)?;
        let related: Vec<RelatedVerse> =
            serde_json::from_slice(&bytes).map_err(|e| SearchError::Malformed(e.to_string()))?;

        tracing::debug!(%citation, results = related.len(), "similarity request complete");
        Ok(related)
    }
}

fn transport_error(err: reqwest::Error) -> SearchError {
    SearchError::Transport(err.to_string())
}

impl SimilaritySearch for SimilarityClient {
    fn fetch_related(
        &self,
        citation: Citation,
    ) -> BoxFuture<'static, Result<Vec<RelatedVerse>, SearchError>> {
        let client = self.clone();
        Box::pin(async move { client.similar_verses(&citation).await })
    }
}
