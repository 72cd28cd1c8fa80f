//! YouTube Data API v3 search

use super::{SearchError, YouTubeResponse, send_json};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::instrument;

#[derive(Deserialize)]
struct SearchList {
    #[serde(default)]
    items: Vec<SearchResult>,
}

#[derive(Deserialize)]
struct SearchResult {
    id: ResourceId,
    snippet: Snippet,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceId {
    kind: String,
    video_id: Option<String>,
    channel_id: Option<String>,
    playlist_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    title: String,
    #[serde(default)]
    description: String,
    published_at: DateTime<Utc>,
}

impl SearchResult {
    /// `None` for resource kinds without a public page
    fn into_response(self) -> Option<YouTubeResponse> {
        let kind = self.id.kind.trim_start_matches("youtube#").to_string();
        let url = match kind.as_str() {
            "video" => format!("https://www.youtube.com/watch?v={}", self.id.video_id?),
            "channel" => format!("https://www.youtube.com/channel/{}", self.id.channel_id?),
            "playlist" => format!("https://www.youtube.com/playlist?list={}", self.id.playlist_id?),
            _ => return None,
        };

        Some(YouTubeResponse {
            kind,
            title: self.snippet.title,
            description: self.snippet.description,
            published_at: self.snippet.published_at,
            url,
        })
    }
}

pub struct YouTubeClient {
    http: Client,
    base_url: String,
    api_key: String,
    timeout: Duration,
}

impl YouTubeClient {
    pub fn new(http: Client, base_url: impl Into<String>, api_key: impl Into<String>, timeout: Duration) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
            timeout,
        }
    }

    #[instrument(skip(self))]
    pub async fn search(&self, query: &str, max_results: usize) -> Result<Vec<YouTubeResponse>, SearchError> {
        if self.api_key.is_empty() {
            return Err(SearchError::Config("YOUTUBE_API_KEY"));
        }

        let max_results = max_results.clamp(1, 50).to_string();
        let request = self
            .http
            .get(format!("{}/youtube/v3/search", self.base_url))
            .timeout(self.timeout)
            .query(&[
                ("part", "snippet"),
                ("q", query),
                ("maxResults", max_results.as_str()),
                ("key", self.api_key.as_str()),
            ]);

        let list: SearchList = send_json(request).await?;
        Ok(list
            .items
            .into_iter()
            .filter_map(SearchResult::into_response)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn builds_urls_by_kind() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET)
                .path("/youtube/v3/search")
                .query_param("q", "borrow checker")
                .query_param("key", "yt-key");
            then.status(200).json_body(json!({
                "items": [
                    {
                        "id": {"kind": "youtube#video", "videoId": "abc123"},
                        "snippet": {"title": "Borrowing", "description": "A talk", "publishedAt": "2023-03-01T12:00:00Z"}
                    },
                    {
                        "id": {"kind": "youtube#channel", "channelId": "UC42"},
                        "snippet": {"title": "Rust Channel", "description": "", "publishedAt": "2020-01-01T00:00:00Z"}
                    },
                    {
                        "id": {"kind": "youtube#playlist", "playlistId": "PL7"},
                        "snippet": {"title": "Course", "publishedAt": "2021-01-01T00:00:00Z"}
                    }
                ]
            }));
        });

        let client = YouTubeClient::new(Client::new(), server.base_url(), "yt-key", Duration::from_secs(5));
        let videos = client.search("borrow checker", 10).await.unwrap();

        assert_eq!(videos.len(), 3);
        assert_eq!(videos[0].kind, "video");
        assert_eq!(videos[0].url, "https://www.youtube.com/watch?v=abc123");
        assert_eq!(videos[1].url, "https://www.youtube.com/channel/UC42");
        assert_eq!(videos[2].url, "https://www.youtube.com/playlist?list=PL7");
    }

    #[tokio::test]
    async fn missing_key_is_a_config_error() {
        let client = YouTubeClient::new(Client::new(), "http://127.0.0.1:1", "", Duration::from_secs(1));
        let err = client.search("anything", 10).await.unwrap_err();
        assert!(matches!(err, SearchError::Config("YOUTUBE_API_KEY")));
    }
}
