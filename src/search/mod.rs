//! Search - third-party retrieval clients and LLM query refinement
//!
//! Every provider client shares one `reqwest::Client` and answers with the
//! models in `models`. `Retriever` wires the clients to the optional query
//! generator and is what the HTTP layer talks to.

pub mod arxiv;
pub mod github;
pub mod llm;
pub mod models;
pub mod open_library;
pub mod refine;
pub mod retriever;
pub mod udemy;
pub mod wikipedia;
pub mod youtube;

pub use llm::{OpenAiQueryGenerator, QueryGenerator};
pub use models::*;
pub use retriever::Retriever;

use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use std::fmt;
use tracing::warn;

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("request failed: {0}")]
    Http(reqwest::Error),

    #[error("provider answered {status}: {body}")]
    Status { status: u16, body: String },

    #[error("could not decode provider response: {0}")]
    Decode(String),

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("missing configuration: {0}")]
    Config(&'static str),

    #[error("no result found")]
    NotFound,
}

impl From<reqwest::Error> for SearchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SearchError::Timeout(err.to_string())
        } else if err.is_decode() {
            SearchError::Decode(err.to_string())
        } else {
            SearchError::Http(err)
        }
    }
}

/// The upstream services a query can be generated for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchProvider {
    Arxiv,
    Wikipedia,
    Github,
    Youtube,
    OpenLibrary,
    Udemy,
}

impl SearchProvider {
    pub fn name(&self) -> &'static str {
        match self {
            SearchProvider::Arxiv => "arXiv",
            SearchProvider::Wikipedia => "Wikipedia",
            SearchProvider::Github => "GitHub",
            SearchProvider::Youtube => "YouTube",
            SearchProvider::OpenLibrary => "Open Library",
            SearchProvider::Udemy => "Udemy",
        }
    }
}

impl fmt::Display for SearchProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Sends the request and returns the body, turning non-2xx answers into `SearchError::Status`
pub(crate) async fn send_text(request: RequestBuilder) -> Result<String, SearchError> {
    let response = request.send().await?;
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        warn!(status = status.as_u16(), "Search provider returned an error");
        return Err(SearchError::Status {
            status: status.as_u16(),
            body,
        });
    }

    Ok(body)
}

pub(crate) async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, SearchError> {
    let body = send_text(request).await?;
    serde_json::from_str(&body).map_err(|e| SearchError::Decode(e.to_string()))
}
