//! LLM query generation through an OpenAI-compatible chat-completions API

use super::{SearchError, SearchProvider, send_json};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

/// Turns a topic (plus what earlier hops found) into a provider query
#[async_trait]
pub trait QueryGenerator: Send + Sync {
    async fn generate(
        &self,
        provider: SearchProvider,
        topic: &str,
        context: &[String],
    ) -> Result<String, SearchError>;
}

const ARXIV_SYNTAX: &str = "\
The following field prefixes can be searched:
    ti      Title
    au      Author
    abs     Abstract
    co      Comment
    jr      Journal Reference
    cat     Subject Category
    rn      Report Number
    id_list Id
    all     All of the above
Boolean operators: AND, OR, ANDNOT.
Group Boolean expressions with ( ) and phrases with double quotes.
e.g. articles with \"checkerboard\" in the title and \"del_maestro\" as an author:
    au:del_maestro AND ti:checkerboard";

const GITHUB_SYNTAX: &str = "\
Use GitHub repository search qualifiers when useful, e.g. language:rust,
topic:web, stars:>100, in:name,description.
e.g. async web framework language:rust stars:>1000";

const PLAIN_SYNTAX: &str = "Use a few precise keywords; no operators are needed.";

fn query_syntax(provider: SearchProvider) -> &'static str {
    match provider {
        SearchProvider::Arxiv => ARXIV_SYNTAX,
        SearchProvider::Github => GITHUB_SYNTAX,
        SearchProvider::Wikipedia
        | SearchProvider::Youtube
        | SearchProvider::OpenLibrary
        | SearchProvider::Udemy => PLAIN_SYNTAX,
    }
}

pub(crate) fn system_prompt(provider: SearchProvider) -> String {
    format!(
        "Given a topic, generate a search query for {}.\n\n{}\n\n\
         The context may contain relevant results from earlier searches.\n\
         Respond with the query only, no explanation.",
        provider.name(),
        query_syntax(provider)
    )
}

fn user_prompt(topic: &str, context: &[String]) -> String {
    let mut prompt = String::from("Context:\n");
    if context.is_empty() {
        prompt.push_str("N/A\n");
    }
    for (i, passage) in context.iter().enumerate() {
        prompt.push_str(&format!("[{}] {}\n", i + 1, passage));
    }
    prompt.push_str(&format!("\nTopic: {topic}\n\nQuery:"));
    prompt
}

/// Strips code fences, a leading `Query:` label and wrapping quotes
pub(crate) fn clean_query(raw: &str) -> Option<String> {
    let mut query = raw.trim();
    if let Some(rest) = query.strip_prefix("```") {
        // drop an optional language tag on the opening fence
        query = rest.split_once('\n').map(|(_, body)| body).unwrap_or(rest);
        query = query.trim_end().trim_end_matches("```");
    }
    query = query.trim();
    if let Some(rest) = query.strip_prefix("Query:") {
        query = rest.trim();
    }
    if query.len() >= 2
        && ((query.starts_with('"') && query.ends_with('"'))
            || (query.starts_with('\'') && query.ends_with('\'')))
    {
        query = &query[1..query.len() - 1];
    }

    let query = query.trim();
    (!query.is_empty()).then(|| query.to_string())
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
}

pub struct OpenAiQueryGenerator {
    http: Client,
    base_url: String,
    model: String,
    api_key: String,
    timeout: Duration,
}

impl OpenAiQueryGenerator {
    pub fn new(
        http: Client,
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            model: model.into(),
            api_key: api_key.into(),
            timeout,
        }
    }
}

#[async_trait]
impl QueryGenerator for OpenAiQueryGenerator {
    #[instrument(skip(self, context), fields(model = %self.model, context_len = context.len()))]
    async fn generate(
        &self,
        provider: SearchProvider,
        topic: &str,
        context: &[String],
    ) -> Result<String, SearchError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system_prompt(provider),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user_prompt(topic, context),
                },
            ],
            temperature: 0.0,
        };

        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        debug!("Calling chat completions: {}", url);

        let response: ChatResponse = send_json(
            self.http
                .post(&url)
                .timeout(self.timeout)
                .bearer_auth(&self.api_key)
                .json(&request),
        )
        .await?;

        let content = response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| SearchError::Decode("no choices in completion".to_string()))?;

        let query = clean_query(&content)
            .ok_or_else(|| SearchError::Decode("empty query from completion".to_string()))?;
        debug!(%query, "Generated query");
        Ok(query)
    }
}
