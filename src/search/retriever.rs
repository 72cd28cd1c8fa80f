//! Retriever - the provider clients plus the optional query generator

use super::arxiv::ArxivClient;
use super::github::GitHubClient;
use super::open_library::OpenLibraryClient;
use super::refine::refine;
use super::udemy::UdemyClient;
use super::wikipedia::WikipediaClient;
use super::youtube::YouTubeClient;
use super::*;
use crate::core::config::SearchConfig;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{instrument, warn};

/// Per-request knobs; `None` falls back to the configured defaults
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchOptions {
    pub max_hops: Option<usize>,
    pub max_results: Option<usize>,
}

pub struct Retriever {
    arxiv: ArxivClient,
    wikipedia: WikipediaClient,
    github: GitHubClient,
    youtube: YouTubeClient,
    open_library: OpenLibraryClient,
    udemy: UdemyClient,
    generator: Option<Arc<dyn QueryGenerator>>,
    llm_timeout: Duration,
    max_hops: usize,
    max_results: usize,
    hop_limit: usize,
    result_limit: usize,
}

impl Retriever {
    /// Builds every client on the shared HTTP client. Query generation is
    /// enabled only when an OpenAI key is configured.
    pub fn new(http: Client, config: &SearchConfig) -> Self {
        let generator: Option<Arc<dyn QueryGenerator>> = if config.openai_api_key.is_empty() {
            None
        } else {
            Some(Arc::new(OpenAiQueryGenerator::new(
                http.clone(),
                &config.openai_base_url,
                &config.openai_model,
                &config.openai_api_key,
                Duration::from_secs(config.llm_timeout_secs),
            )))
        };

        Self::with_generator(http, config, generator)
    }

    pub fn with_generator(
        http: Client,
        config: &SearchConfig,
        generator: Option<Arc<dyn QueryGenerator>>,
    ) -> Self {
        let timeout = Duration::from_secs(config.request_timeout_secs);

        Self {
            arxiv: ArxivClient::new(http.clone(), &config.arxiv_base_url, timeout),
            wikipedia: WikipediaClient::new(http.clone(), &config.wikipedia_base_url, timeout),
            github: GitHubClient::new(http.clone(), &config.github_base_url, &config.github_token, timeout),
            youtube: YouTubeClient::new(http.clone(), &config.youtube_base_url, &config.youtube_api_key, timeout),
            open_library: OpenLibraryClient::new(http.clone(), &config.open_library_base_url, timeout),
            udemy: UdemyClient::new(
                http,
                &config.udemy_base_url,
                &config.udemy_client_id,
                &config.udemy_client_secret,
                timeout,
            ),
            generator,
            llm_timeout: Duration::from_secs(config.llm_timeout_secs),
            max_hops: config.max_hops,
            max_results: config.max_results,
            hop_limit: config.hop_limit.max(1),
            result_limit: config.result_limit.max(1),
        }
    }

    /// Requested hops, within `1..=hop_limit`
    fn hops(&self, options: SearchOptions) -> usize {
        options.max_hops.unwrap_or(self.max_hops).clamp(1, self.hop_limit)
    }

    /// Requested results per provider, within `1..=result_limit`
    fn results(&self, options: SearchOptions) -> usize {
        options.max_results.unwrap_or(self.max_results).clamp(1, self.result_limit)
    }

    fn generator(&self) -> Option<&dyn QueryGenerator> {
        self.generator.as_deref()
    }

    #[instrument(skip(self))]
    pub async fn arxiv(&self, topic: &str, options: SearchOptions) -> Result<Vec<ArXivResponse>, SearchError> {
        let max_results = self.results(options);
        refine(
            topic,
            self.hops(options),
            self.generator(),
            SearchProvider::Arxiv,
            |query| async move { self.arxiv.search(&query, max_results).await },
            self.llm_timeout,
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn wikipedia(&self, topic: &str, options: SearchOptions) -> Result<WikipediaResponse, SearchError> {
        let pages = refine(
            topic,
            self.hops(options),
            self.generator(),
            SearchProvider::Wikipedia,
            |query| async move { self.wikipedia.search(&query).await.map(|page| vec![page]) },
            self.llm_timeout,
        )
        .await?;
        pages.into_iter().next().ok_or(SearchError::NotFound)
    }

    #[instrument(skip(self))]
    pub async fn github(&self, topic: &str, options: SearchOptions) -> Result<Vec<GitHubResponse>, SearchError> {
        let max_results = self.results(options);
        refine(
            topic,
            self.hops(options),
            self.generator(),
            SearchProvider::Github,
            |query| async move { self.github.search(&query, max_results).await },
            self.llm_timeout,
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn youtube(&self, topic: &str, options: SearchOptions) -> Result<Vec<YouTubeResponse>, SearchError> {
        let max_results = self.results(options);
        refine(
            topic,
            self.hops(options),
            self.generator(),
            SearchProvider::Youtube,
            |query| async move { self.youtube.search(&query, max_results).await },
            self.llm_timeout,
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn open_library(
        &self,
        topic: &str,
        options: SearchOptions,
    ) -> Result<OpenLibraryResponse, SearchError> {
        let books = refine(
            topic,
            self.hops(options),
            self.generator(),
            SearchProvider::OpenLibrary,
            |query| async move { self.open_library.search(&query).await.map(|book| vec![book]) },
            self.llm_timeout,
        )
        .await?;
        books.into_iter().next().ok_or(SearchError::NotFound)
    }

    #[instrument(skip(self))]
    pub async fn udemy(&self, topic: &str, options: SearchOptions) -> Result<Vec<UdemyResponse>, SearchError> {
        let max_results = self.results(options);
        refine(
            topic,
            self.hops(options),
            self.generator(),
            SearchProvider::Udemy,
            |query| async move { self.udemy.search(&query, max_results).await },
            self.llm_timeout,
        )
        .await
    }

    /// Every provider at once; a failing provider is reported and left empty
    #[instrument(skip(self))]
    pub async fn all(&self, topic: &str, options: SearchOptions) -> AggregateResponse {
        let (arxiv, github, open_library, udemy, wikipedia, youtube) = futures::join!(
            self.arxiv(topic, options),
            self.github(topic, options),
            self.open_library(topic, options),
            self.udemy(topic, options),
            self.wikipedia(topic, options),
            self.youtube(topic, options),
        );

        AggregateResponse {
            arxiv: or_log(SearchProvider::Arxiv, arxiv).unwrap_or_default(),
            github: or_log(SearchProvider::Github, github).unwrap_or_default(),
            open_library: or_log(SearchProvider::OpenLibrary, open_library),
            udemy: or_log(SearchProvider::Udemy, udemy).unwrap_or_default(),
            wikipedia: or_log(SearchProvider::Wikipedia, wikipedia),
            youtube: or_log(SearchProvider::Youtube, youtube).unwrap_or_default(),
        }
    }
}

fn or_log<T>(provider: SearchProvider, outcome: Result<T, SearchError>) -> Option<T> {
    match outcome {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(%provider, "Provider failed in aggregate search: {}", e);
            None
        }
    }
}
