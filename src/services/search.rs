//! Search services - retrieval endpoints over the third-party providers

use crate::core::{AppError, AppState};
use crate::dtos::{RetrieveDTO, SearchEnvelope};
use crate::search::retriever::SearchOptions;
use crate::search::{
    AggregateResponse, ArXivResponse, GitHubResponse, OpenLibraryResponse, UdemyResponse,
    WikipediaResponse, YouTubeResponse,
};
use axum::extract::{Json, State};
use std::sync::Arc;
use tracing::{info, instrument};

type SearchResult<T> = Result<Json<SearchEnvelope<T>>, AppError>;

fn parse(body: &RetrieveDTO) -> Result<(&str, SearchOptions), AppError> {
    let query = body.query.trim();
    if query.is_empty() {
        return Err(AppError::bad_request("Query is required"));
    }
    Ok((
        query,
        SearchOptions {
            max_hops: body.max_hops,
            max_results: body.max_results,
        },
    ))
}

#[instrument(skip(state), fields(query = %body.query))]
pub async fn search_all(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RetrieveDTO>,
) -> SearchResult<AggregateResponse> {
    let (query, options) = parse(&body)?;
    let response = state.retriever.all(query, options).await;
    info!("Aggregate search done");
    Ok(Json(SearchEnvelope::new(response)))
}

#[instrument(skip(state), fields(query = %body.query))]
pub async fn search_arxiv(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RetrieveDTO>,
) -> SearchResult<Vec<ArXivResponse>> {
    let (query, options) = parse(&body)?;
    let results = state.retriever.arxiv(query, options).await?;
    info!("arXiv returned {} results", results.len());
    Ok(Json(SearchEnvelope::new(results)))
}

#[instrument(skip(state), fields(query = %body.query))]
pub async fn search_wikipedia(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RetrieveDTO>,
) -> SearchResult<WikipediaResponse> {
    let (query, options) = parse(&body)?;
    let page = state.retriever.wikipedia(query, options).await?;
    Ok(Json(SearchEnvelope::new(page)))
}

#[instrument(skip(state), fields(query = %body.query))]
pub async fn search_github(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RetrieveDTO>,
) -> SearchResult<Vec<GitHubResponse>> {
    let (query, options) = parse(&body)?;
    let results = state.retriever.github(query, options).await?;
    info!("GitHub returned {} results", results.len());
    Ok(Json(SearchEnvelope::new(results)))
}

#[instrument(skip(state), fields(query = %body.query))]
pub async fn search_youtube(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RetrieveDTO>,
) -> SearchResult<Vec<YouTubeResponse>> {
    let (query, options) = parse(&body)?;
    let results = state.retriever.youtube(query, options).await?;
    info!("YouTube returned {} results", results.len());
    Ok(Json(SearchEnvelope::new(results)))
}

#[instrument(skip(state), fields(query = %body.query))]
pub async fn search_open_library(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RetrieveDTO>,
) -> SearchResult<OpenLibraryResponse> {
    let (query, options) = parse(&body)?;
    let book = state.retriever.open_library(query, options).await?;
    Ok(Json(SearchEnvelope::new(book)))
}

#[instrument(skip(state), fields(query = %body.query))]
pub async fn search_udemy(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RetrieveDTO>,
) -> SearchResult<Vec<UdemyResponse>> {
    let (query, options) = parse(&body)?;
    let results = state.retriever.udemy(query, options).await?;
    info!("Udemy returned {} results", results.len());
    Ok(Json(SearchEnvelope::new(results)))
}
