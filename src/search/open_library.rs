//! Open Library search, answering with the best matching work

use super::{OpenLibraryAuthor, OpenLibraryResponse, SearchError, send_json};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::instrument;

const PUBLIC_URL: &str = "https://openlibrary.org";

#[derive(Deserialize)]
struct SearchResults {
    #[serde(default)]
    docs: Vec<Doc>,
}

#[derive(Deserialize)]
struct Doc {
    key: String,
    title: String,
    subtitle: Option<String>,
    #[serde(default)]
    author_name: Vec<String>,
    #[serde(default)]
    author_key: Vec<String>,
    first_publish_year: Option<i32>,
    #[serde(default)]
    publisher: Vec<String>,
}

impl From<Doc> for OpenLibraryResponse {
    fn from(doc: Doc) -> Self {
        let authors = doc
            .author_name
            .into_iter()
            .zip(doc.author_key)
            .map(|(name, olid)| OpenLibraryAuthor { name, olid })
            .collect();

        OpenLibraryResponse {
            authors,
            olid: doc.key.trim_start_matches("/works/").to_string(),
            publish_year: doc.first_publish_year,
            publisher: doc.publisher.into_iter().next(),
            subtitle: doc.subtitle,
            title: doc.title,
            url: format!("{PUBLIC_URL}{}", doc.key),
        }
    }
}

pub struct OpenLibraryClient {
    http: Client,
    base_url: String,
    timeout: Duration,
}

impl OpenLibraryClient {
    pub fn new(http: Client, base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            timeout,
        }
    }

    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Result<OpenLibraryResponse, SearchError> {
        let request = self
            .http
            .get(format!("{}/search.json", self.base_url))
            .timeout(self.timeout)
            .query(&[("q", query), ("limit", "1")]);

        let results: SearchResults = send_json(request).await?;
        results
            .docs
            .into_iter()
            .next()
            .map(OpenLibraryResponse::from)
            .ok_or(SearchError::NotFound)
    }
}
