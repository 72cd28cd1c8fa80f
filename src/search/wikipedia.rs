//! Wikipedia client over the MediaWiki action API

use super::{SearchError, WikipediaResponse, send_json};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::instrument;

#[derive(Deserialize)]
struct ApiResponse {
    #[serde(default)]
    query: Option<Query>,
}

#[derive(Deserialize)]
struct Query {
    #[serde(default)]
    pages: Vec<Page>,
}

#[derive(Deserialize)]
struct Page {
    title: String,
    #[serde(default)]
    missing: bool,
    #[serde(default)]
    index: Option<i64>,
    #[serde(default)]
    extract: String,
    #[serde(default)]
    fullurl: String,
    #[serde(default)]
    categories: Vec<Titled>,
    #[serde(default)]
    images: Vec<Titled>,
    #[serde(default)]
    links: Vec<Titled>,
    #[serde(default)]
    extlinks: Vec<ExtLink>,
}

#[derive(Deserialize)]
struct Titled {
    title: String,
}

#[derive(Deserialize)]
struct ExtLink {
    url: String,
}

impl From<Page> for WikipediaResponse {
    fn from(page: Page) -> Self {
        WikipediaResponse {
            categories: page
                .categories
                .into_iter()
                .map(|c| strip_namespace(c.title, "Category:"))
                .collect(),
            images: page
                .images
                .into_iter()
                .map(|i| strip_namespace(i.title, "File:"))
                .collect(),
            links: page.links.into_iter().map(|l| l.title).collect(),
            references: page.extlinks.into_iter().map(|e| e.url).collect(),
            summary: page.extract.trim().to_string(),
            title: page.title,
            url: page.fullurl,
        }
    }
}

fn strip_namespace(title: String, namespace: &str) -> String {
    match title.strip_prefix(namespace) {
        Some(rest) => rest.to_string(),
        None => title,
    }
}

pub struct WikipediaClient {
    http: Client,
    base_url: String,
    timeout: Duration,
}

impl WikipediaClient {
    pub fn new(http: Client, base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            timeout,
        }
    }

    /// Best matching page for the query; `NotFound` when the search is empty
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Result<WikipediaResponse, SearchError> {
        let request = self
            .http
            .get(format!("{}/w/api.php", self.base_url))
            .timeout(self.timeout)
            .query(&[
                ("action", "query"),
                ("format", "json"),
                ("formatversion", "2"),
                ("redirects", "1"),
                ("generator", "search"),
                ("gsrsearch", query),
                ("gsrlimit", "1"),
                ("prop", "extracts|categories|images|links|extlinks|info"),
                ("inprop", "url"),
                ("exintro", "1"),
                ("explaintext", "1"),
                ("cllimit", "max"),
                ("imlimit", "max"),
                ("pllimit", "max"),
                ("ellimit", "max"),
            ]);

        let response: ApiResponse = send_json(request).await?;
        let mut pages: Vec<Page> = response
            .query
            .map(|q| q.pages)
            .unwrap_or_default()
            .into_iter()
            .filter(|p| !p.missing)
            .collect();
        // generator results are keyed by rank, not returned in order
        pages.sort_by_key(|p| p.index.unwrap_or(i64::MAX));

        pages
            .into_iter()
            .next()
            .map(WikipediaResponse::from)
            .ok_or(SearchError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client(server: &MockServer) -> WikipediaClient {
        WikipediaClient::new(Client::new(), server.base_url(), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn maps_the_best_ranked_page() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/w/api.php")
                .query_param("gsrsearch", "rust language")
                .query_param("inprop", "url");
            then.status(200).json_body(json!({
                "batchcomplete": true,
                "query": {"pages": [
                    {"pageid": 2, "title": "Rust (fungus)", "index": 2, "extract": "A fungus."},
                    {
                        "pageid": 1,
                        "title": "Rust (programming language)",
                        "index": 1,
                        "extract": "Rust is a language.\n",
                        "fullurl": "https://en.wikipedia.org/wiki/Rust_(programming_language)",
                        "categories": [{"ns": 14, "title": "Category:Programming languages"}],
                        "images": [{"ns": 6, "title": "File:Rust logo.svg"}],
                        "links": [{"ns": 0, "title": "Mozilla"}],
                        "extlinks": [{"url": "https://www.rust-lang.org"}]
                    }
                ]}
            }));
        });

        let page = client(&server).search("rust language").await.unwrap();
        mock.assert();
        assert_eq!(page.title, "Rust (programming language)");
        assert_eq!(page.summary, "Rust is a language.");
        assert_eq!(page.categories, vec!["Programming languages"]);
        assert_eq!(page.images, vec!["Rust logo.svg"]);
        assert_eq!(page.links, vec!["Mozilla"]);
        assert_eq!(page.references, vec!["https://www.rust-lang.org"]);
    }

    #[tokio::test]
    async fn no_page_is_not_found() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/w/api.php");
            then.status(200).json_body(json!({"batchcomplete": true}));
        });

        let err = client(&server).search("zzzzqqq").await.unwrap_err();
        assert!(matches!(err, SearchError::NotFound));
    }
}
