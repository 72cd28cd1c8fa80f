//! GitHub repository search

use super::{GitHubResponse, SearchError, send_json};
use chrono::{DateTime, Utc};
use reqwest::{Client, header};
use serde::Deserialize;
use std::time::Duration;
use tracing::instrument;

const USER_AGENT: &str = concat!("dilemma-server/", env!("CARGO_PKG_VERSION"));

#[derive(Deserialize)]
struct SearchPage {
    #[serde(default)]
    items: Vec<Repository>,
}

#[derive(Deserialize)]
struct Repository {
    created_at: DateTime<Utc>,
    description: Option<String>,
    forks_count: i64,
    full_name: String,
    language: Option<String>,
    open_issues_count: i64,
    pushed_at: DateTime<Utc>,
    stargazers_count: i64,
    /// Search results only carry `watchers_count`
    #[serde(alias = "watchers_count", default)]
    subscribers_count: i64,
    #[serde(default)]
    topics: Option<Vec<String>>,
    updated_at: DateTime<Utc>,
    html_url: String,
}

impl From<Repository> for GitHubResponse {
    fn from(repo: Repository) -> Self {
        GitHubResponse {
            created_at: repo.created_at,
            description: repo.description,
            forks_count: repo.forks_count,
            full_name: repo.full_name,
            language: repo.language,
            open_issues_count: repo.open_issues_count,
            pushed_at: repo.pushed_at,
            stargazers_count: repo.stargazers_count,
            subscribers_count: repo.subscribers_count,
            topics: repo.topics,
            updated_at: repo.updated_at,
            url: repo.html_url,
        }
    }
}

pub struct GitHubClient {
    http: Client,
    base_url: String,
    token: Option<String>,
    timeout: Duration,
}

impl GitHubClient {
    /// An empty token searches anonymously (lower rate limit)
    pub fn new(http: Client, base_url: impl Into<String>, token: &str, timeout: Duration) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            token: (!token.is_empty()).then(|| token.to_string()),
            timeout,
        }
    }

    #[instrument(skip(self))]
    pub async fn search(&self, query: &str, max_results: usize) -> Result<Vec<GitHubResponse>, SearchError> {
        let per_page = max_results.clamp(1, 100).to_string();
        let mut request = self
            .http
            .get(format!("{}/search/repositories", self.base_url))
            .timeout(self.timeout)
            .header(header::USER_AGENT, USER_AGENT)
            .header(header::ACCEPT, "application/vnd.github+json")
            .query(&[("q", query), ("per_page", per_page.as_str())]);

        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let page: SearchPage = send_json(request).await?;
        Ok(page.items.into_iter().map(GitHubResponse::from).collect())
    }
}
