//! Udemy affiliate API course search

use super::{SearchError, UdemyInstructor, UdemyResponse, send_json};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::instrument;

const PUBLIC_URL: &str = "https://www.udemy.com";

#[derive(Deserialize)]
struct CourseList {
    #[serde(default)]
    results: Vec<Course>,
}

#[derive(Deserialize)]
struct Course {
    title: String,
    url: String,
    #[serde(default)]
    is_paid: bool,
    #[serde(default)]
    price: String,
    #[serde(default)]
    visible_instructors: Vec<Instructor>,
    #[serde(default)]
    headline: String,
}

#[derive(Deserialize)]
struct Instructor {
    display_name: String,
    #[serde(default)]
    job_title: String,
    url: String,
}

/// Udemy answers with site-relative paths
fn absolute(path: &str) -> String {
    if path.starts_with("http") {
        path.to_string()
    } else {
        format!("{PUBLIC_URL}{path}")
    }
}

impl From<Course> for UdemyResponse {
    fn from(course: Course) -> Self {
        UdemyResponse {
            title: course.title,
            url: absolute(&course.url),
            is_paid: course.is_paid,
            price: course.price,
            visible_instructors: course
                .visible_instructors
                .into_iter()
                .map(|i| UdemyInstructor {
                    display_name: i.display_name,
                    job_title: i.job_title,
                    url: absolute(&i.url),
                })
                .collect(),
            headline: course.headline,
        }
    }
}

pub struct UdemyClient {
    http: Client,
    base_url: String,
    client_id: String,
    client_secret: String,
    timeout: Duration,
}

impl UdemyClient {
    pub fn new(
        http: Client,
        base_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            timeout,
        }
    }

    #[instrument(skip(self))]
    pub async fn search(&self, query: &str, max_results: usize) -> Result<Vec<UdemyResponse>, SearchError> {
        if self.client_id.is_empty() || self.client_secret.is_empty() {
            return Err(SearchError::Config("UDEMY_CLIENT_ID / UDEMY_CLIENT_SECRET"));
        }

        let page_size = max_results.clamp(1, 100).to_string();
        let request = self
            .http
            .get(format!("{}/api-2.0/courses/", self.base_url))
            .timeout(self.timeout)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .query(&[("search", query), ("page_size", page_size.as_str())]);

        let list: CourseList = send_json(request).await?;
        Ok(list.results.into_iter().map(UdemyResponse::from).collect())
    }
}
