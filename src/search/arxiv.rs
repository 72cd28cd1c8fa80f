//! arXiv export API client. The API answers with an Atom feed.

use super::{ArXivResponse, SearchError, send_text};
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, instrument};

lazy_static! {
    static ref ENTRY: Regex = Regex::new(r"(?s)<entry>(.*?)</entry>").unwrap();
    static ref AUTHOR: Regex = Regex::new(r"(?s)<author>\s*<name>(.*?)</name>").unwrap();
    static ref CATEGORY: Regex = Regex::new(r#"<category[^>]*term="([^"]+)""#).unwrap();
    static ref PRIMARY_CATEGORY: Regex =
        Regex::new(r#"<arxiv:primary_category[^>]*term="([^"]+)""#).unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
    static ref ENTITY: Regex =
        Regex::new(r"&(?:#[xX]([0-9a-fA-F]+)|#([0-9]+)|(lt|gt|quot|apos|amp));").unwrap();
}

pub struct ArxivClient {
    http: Client,
    base_url: String,
    timeout: Duration,
}

impl ArxivClient {
    pub fn new(http: Client, base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            timeout,
        }
    }

    /// Newest submissions first
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str, max_results: usize) -> Result<Vec<ArXivResponse>, SearchError> {
        let max_results = max_results.to_string();
        let request = self
            .http
            .get(format!("{}/api/query", self.base_url))
            .timeout(self.timeout)
            .query(&[
                ("search_query", query),
                ("start", "0"),
                ("max_results", max_results.as_str()),
                ("sortBy", "submittedDate"),
                ("sortOrder", "descending"),
            ]);

        let feed = send_text(request).await?;
        let entries = parse_feed(&feed)?;
        debug!("arXiv returned {} entries", entries.len());
        Ok(entries)
    }
}

pub(crate) fn parse_feed(feed: &str) -> Result<Vec<ArXivResponse>, SearchError> {
    ENTRY
        .captures_iter(feed)
        .map(|captures| parse_entry(&captures[1]))
        .collect()
}

fn parse_entry(entry: &str) -> Result<ArXivResponse, SearchError> {
    let entry_id = tag(entry, "id").ok_or_else(|| missing("id"))?;
    let categories: Vec<String> = CATEGORY
        .captures_iter(entry)
        .map(|c| unescape(&c[1]))
        .collect();
    let primary_category = PRIMARY_CATEGORY
        .captures(entry)
        .map(|c| unescape(&c[1]))
        .or_else(|| categories.first().cloned())
        .unwrap_or_default();

    Ok(ArXivResponse {
        entry_id,
        updated: date(entry, "updated")?,
        published: date(entry, "published")?,
        title: tag(entry, "title").ok_or_else(|| missing("title"))?,
        authors: AUTHOR
            .captures_iter(entry)
            .map(|c| collapse(&unescape(&c[1])))
            .collect(),
        summary: tag(entry, "summary").unwrap_or_default(),
        comment: tag(entry, "arxiv:comment"),
        journal_ref: tag(entry, "arxiv:journal_ref"),
        primary_category,
        categories,
    })
}

/// Text of the first `<name ...>text</name>` element, whitespace collapsed
fn tag(entry: &str, name: &str) -> Option<String> {
    let open = format!("<{name}");
    let close = format!("</{name}>");

    let mut search_from = 0;
    while let Some(offset) = entry[search_from..].find(&open) {
        let start = search_from + offset;
        let after_name = start + open.len();
        // `<id` must not match `<idx`
        match entry[after_name..].chars().next() {
            Some('>') | Some(' ') | Some('\n') | Some('\t') => {}
            _ => {
                search_from = after_name;
                continue;
            }
        }
        let content_start = after_name + entry[after_name..].find('>')? + 1;
        let content_end = content_start + entry[content_start..].find(&close)?;
        return Some(collapse(&unescape(&entry[content_start..content_end])));
    }
    None
}

fn date(entry: &str, name: &'static str) -> Result<DateTime<Utc>, SearchError> {
    let raw = tag(entry, name).ok_or_else(|| missing(name))?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| SearchError::Decode(format!("invalid {name} date {raw}: {e}")))
}

fn missing(name: &str) -> SearchError {
    SearchError::Decode(format!("arXiv entry without <{name}>"))
}

fn collapse(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

/// Decodes the five XML entities and numeric character references in one pass.
/// A reference to an invalid code point is left untouched.
fn unescape(text: &str) -> String {
    ENTITY
        .replace_all(text, |caps: &regex::Captures| {
            let code_point = if let Some(hex) = caps.get(1) {
                u32::from_str_radix(hex.as_str(), 16).ok()
            } else if let Some(dec) = caps.get(2) {
                dec.as_str().parse::<u32>().ok()
            } else {
                return match &caps[3] {
                    "lt" => "<",
                    "gt" => ">",
                    "quot" => "\"",
                    "apos" => "'",
                    _ => "&",
                }
                .to_string();
            };
            code_point
                .and_then(char::from_u32)
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:arxiv="http://arxiv.org/schemas/atom">
  <title type="html">ArXiv Query: search_query=all:checkerboard</title>
  <id>http://arxiv.org/api/cHxbiOdZaP56ODnBPIenZhzg5f8</id>
  <updated>2024-02-01T00:00:00-05:00</updated>
  <entry>
    <id>http://arxiv.org/abs/2401.00001v1</id>
    <updated>2024-01-02T10:00:00Z</updated>
    <published>2024-01-01T09:30:00Z</published>
    <title>Checkerboard   patterns
      in &amp; out of equilibrium</title>
    <summary>  We study checkerboards.
    </summary>
    <author>
      <name>Ada Lovelace</name>
    </author>
    <author>
      <name>Adrian Del Maestro</name>
    </author>
    <arxiv:comment xmlns:arxiv="http://arxiv.org/schemas/atom">12 pages</arxiv:comment>
    <link href="http://arxiv.org/abs/2401.00001v1" rel="alternate" type="text/html"/>
    <arxiv:primary_category xmlns:arxiv="http://arxiv.org/schemas/atom" term="cond-mat.stat-mech" scheme="http://arxiv.org/schemas/atom"/>
    <category term="cond-mat.stat-mech" scheme="http://arxiv.org/schemas/atom"/>
    <category term="quant-ph" scheme="http://arxiv.org/schemas/atom"/>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/2401.00002v2</id>
    <updated>2024-01-03T10:00:00Z</updated>
    <published>2024-01-03T10:00:00Z</published>
    <title>Second</title>
    <summary>Short.</summary>
    <author><name>Grace Hopper</name></author>
    <arxiv:journal_ref xmlns:arxiv="http://arxiv.org/schemas/atom">Phys. Rev. B 1 (2024)</arxiv:journal_ref>
    <category term="cs.AI" scheme="http://arxiv.org/schemas/atom"/>
  </entry>
</feed>"#;

    #[test]
    fn parses_entries_from_the_atom_feed() {
        let entries = parse_feed(FEED).unwrap();
        assert_eq!(entries.len(), 2);

        let first = &entries[0];
        assert_eq!(first.entry_id, "http://arxiv.org/abs/2401.00001v1");
        assert_eq!(first.title, "Checkerboard patterns in & out of equilibrium");
        assert_eq!(first.summary, "We study checkerboards.");
        assert_eq!(first.authors, vec!["Ada Lovelace", "Adrian Del Maestro"]);
        assert_eq!(first.comment.as_deref(), Some("12 pages"));
        assert_eq!(first.journal_ref, None);
        assert_eq!(first.primary_category, "cond-mat.stat-mech");
        assert_eq!(first.categories, vec!["cond-mat.stat-mech", "quant-ph"]);
        assert_eq!(first.published.to_rfc3339(), "2024-01-01T09:30:00+00:00");

        let second = &entries[1];
        assert_eq!(second.journal_ref.as_deref(), Some("Phys. Rev. B 1 (2024)"));
        // falls back to the first category without a primary one
        assert_eq!(second.primary_category, "cs.AI");
    }

    #[test]
    fn unescape_decodes_numeric_references() {
        assert_eq!(unescape("Rock &amp; Roll &#39;n&#x27; &lt;b&gt;"), "Rock & Roll 'n' <b>");
        assert_eq!(unescape("A &#x2014; B &#8212; C"), "A \u{2014} B \u{2014} C");
        // decoded once, not twice
        assert_eq!(unescape("&amp;lt;"), "&lt;");
        assert_eq!(unescape("bad &#xD800; ref"), "bad &#xD800; ref");
    }

    #[test]
    fn empty_feed_has_no_entries() {
        let feed = r#"<feed xmlns="http://www.w3.org/2005/Atom"><title>empty</title></feed>"#;
        assert!(parse_feed(feed).unwrap().is_empty());
    }

    #[tokio::test]
    async fn search_queries_newest_first() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/query")
                .query_param("search_query", "au:del_maestro AND ti:checkerboard")
                .query_param("max_results", "5")
                .query_param("sortBy", "submittedDate")
                .query_param("sortOrder", "descending");
            then.status(200).body(FEED);
        });

        let client = ArxivClient::new(Client::new(), server.base_url(), Duration::from_secs(5));
        let entries = client
            .search("au:del_maestro AND ti:checkerboard", 5)
            .await
            .unwrap();

        mock.assert();
        assert_eq!(entries.len(), 2);
    }

    #[tokio::test]
    async fn upstream_failure_is_a_status_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/query");
            then.status(503).body("busy");
        });

        let client = ArxivClient::new(Client::new(), server.base_url(), Duration::from_secs(5));
        let err = client.search("anything", 5).await.unwrap_err();
        assert!(matches!(err, SearchError::Status { status: 503, .. }));
    }
}
