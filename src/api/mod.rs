mod http;

#[cfg(test)]
pub mod testing;

use crate::core::models::{QuestionsResponse, RunRequest, RunResult, TopicKey, VideoResults};
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub use http::HttpApi;

const NO_LANGUAGE: &str = "select";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{0}")]
    Validation(String),
}

/// Remote operations of the learning-roadmap server.
#[async_trait]
pub trait RoadmapApi: Send + Sync {
    /// Topic names of the language's roadmap. A malformed roadmap yields an
    /// empty list.
    async fn fetch_roadmap(&self, language: &str) -> Result<Vec<String>, ApiError>;

    async fn generate_roadmap(&self, language: &str) -> Result<(), ApiError>;

    async fn topic_definition(&self, key: &TopicKey) -> Result<Option<String>, ApiError>;

    /// Asks the server to start (or continue) curating videos for `key`.
    /// The acknowledgement is opaque.
    async fn trigger_fetch(&self, key: &TopicKey) -> Result<Value, ApiError>;

    async fn fetch_videos(&self, key: &TopicKey) -> Result<VideoResults, ApiError>;

    async fn fetch_questions(&self, video_id: &str) -> Result<QuestionsResponse, ApiError>;

    async fn run_code(&self, request: &RunRequest) -> Result<RunResult, ApiError>;
}

/// Rejects an empty or placeholder language before any request is sent.
pub fn validate_language(language: &str) -> Result<&str, ApiError> {
    let language = language.trim();
    if language.is_empty() || language.eq_ignore_ascii_case(NO_LANGUAGE) {
        return Err(ApiError::Validation(
            "Please select a language first!".to_string(),
        ));
    }
    Ok(language)
}
