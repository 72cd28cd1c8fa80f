//! Search DTOs - request body and envelope of the retrieval endpoints

use serde::{Deserialize, Serialize};

/// Body of every `/search/*` endpoint
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct RetrieveDTO {
    pub query: String,
    /// Number of LLM refinement hops, defaults to the configured value
    #[serde(default)]
    pub max_hops: Option<usize>,
    #[serde(default)]
    pub max_results: Option<usize>,
}

/// Every search answer is wrapped as `{"response": ...}`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SearchEnvelope<T> {
    pub response: T,
}

impl<T> SearchEnvelope<T> {
    pub fn new(response: T) -> Self {
        Self { response }
    }
}
