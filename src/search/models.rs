//! Response models returned by the retrieval endpoints

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Flattens a result into one line of text fed back to the query generator
pub trait Passage {
    fn passage(&self) -> String;
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ArXivResponse {
    pub entry_id: String,
    pub updated: DateTime<Utc>,
    pub published: DateTime<Utc>,
    pub title: String,
    pub authors: Vec<String>,
    pub summary: String,
    pub comment: Option<String>,
    pub journal_ref: Option<String>,
    pub primary_category: String,
    pub categories: Vec<String>,
}

impl Passage for ArXivResponse {
    fn passage(&self) -> String {
        format!(
            "{} {} {} {} {} {} {} {} {} {}",
            self.entry_id,
            self.updated,
            self.published,
            self.title,
            self.authors.join(", "),
            self.summary,
            self.comment.as_deref().unwrap_or("None"),
            self.journal_ref.as_deref().unwrap_or("None"),
            self.primary_category,
            self.categories.join(", ")
        )
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct WikipediaResponse {
    pub categories: Vec<String>,
    pub images: Vec<String>,
    pub links: Vec<String>,
    pub references: Vec<String>,
    pub summary: String,
    pub title: String,
    pub url: String,
}

impl Passage for WikipediaResponse {
    fn passage(&self) -> String {
        format!("{} {} {}", self.title, self.summary, self.categories.join(", "))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GitHubResponse {
    pub created_at: DateTime<Utc>,
    pub description: Option<String>,
    pub forks_count: i64,
    pub full_name: String,
    pub language: Option<String>,
    pub open_issues_count: i64,
    pub pushed_at: DateTime<Utc>,
    pub stargazers_count: i64,
    pub subscribers_count: i64,
    pub topics: Option<Vec<String>>,
    pub updated_at: DateTime<Utc>,
    pub url: String,
}

impl Passage for GitHubResponse {
    fn passage(&self) -> String {
        format!(
            "{} {} {} {}",
            self.full_name,
            self.description.as_deref().unwrap_or(""),
            self.language.as_deref().unwrap_or(""),
            self.topics.as_deref().unwrap_or_default().join(", ")
        )
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct YouTubeResponse {
    pub kind: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "publishedAt")]
    pub published_at: DateTime<Utc>,
    pub url: String,
}

impl Passage for YouTubeResponse {
    fn passage(&self) -> String {
        format!("{} {} {}", self.kind, self.title, self.description)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct OpenLibraryAuthor {
    pub name: String,
    pub olid: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct OpenLibraryResponse {
    pub authors: Vec<OpenLibraryAuthor>,
    pub olid: String,
    pub publish_year: Option<i32>,
    pub publisher: Option<String>,
    pub subtitle: Option<String>,
    pub title: String,
    pub url: String,
}

impl Passage for OpenLibraryResponse {
    fn passage(&self) -> String {
        let authors: Vec<&str> = self.authors.iter().map(|a| a.name.as_str()).collect();
        format!(
            "{} {} {}",
            self.title,
            self.subtitle.as_deref().unwrap_or(""),
            authors.join(", ")
        )
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UdemyInstructor {
    pub display_name: String,
    pub job_title: String,
    pub url: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UdemyResponse {
    pub title: String,
    pub url: String,
    pub is_paid: bool,
    pub price: String,
    pub visible_instructors: Vec<UdemyInstructor>,
    pub headline: String,
}

impl Passage for UdemyResponse {
    fn passage(&self) -> String {
        format!("{} {}", self.title, self.headline)
    }
}

/// Answer of the aggregate `/search/` endpoint; a failed provider is empty or null
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct AggregateResponse {
    pub arxiv: Vec<ArXivResponse>,
    pub github: Vec<GitHubResponse>,
    pub open_library: Option<OpenLibraryResponse>,
    pub udemy: Vec<UdemyResponse>,
    pub wikipedia: Option<WikipediaResponse>,
    pub youtube: Vec<YouTubeResponse>,
}
