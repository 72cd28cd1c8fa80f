//! Google OAuth2 authorization-code client

use super::IntegrationError;
use crate::core::config::GoogleConfig;
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GoogleTokens {
    pub access_token: String,
    /// Only sent when consent was prompted with `access_type=offline`
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct GoogleUserInfo {
    pub email: String,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub family_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl GoogleUserInfo {
    pub fn full_name(&self) -> Option<String> {
        if let Some(name) = &self.name {
            return Some(name.clone());
        }
        match (&self.given_name, &self.family_name) {
            (Some(given), Some(family)) => Some(format!("{given} {family}")),
            (Some(given), None) => Some(given.clone()),
            (None, Some(family)) => Some(family.clone()),
            (None, None) => None,
        }
    }
}

#[async_trait]
pub trait GoogleOAuth: Send + Sync {
    /// Consent page URL carrying `state` back to the frontend
    fn authorization_url(&self, state: &str) -> Result<String, IntegrationError>;

    async fn exchange_code(&self, code: &str) -> Result<GoogleTokens, IntegrationError>;

    async fn user_info(&self, access_token: &str) -> Result<GoogleUserInfo, IntegrationError>;

    async fn refresh_access_token(&self, refresh_token: &str) -> Result<String, IntegrationError>;
}

pub struct GoogleClient {
    http: Client,
    config: GoogleConfig,
}

impl GoogleClient {
    pub fn new(http: Client, config: GoogleConfig) -> Self {
        Self { http, config }
    }

    async fn post_token_form(&self, form: &[(&str, &str)]) -> Result<GoogleTokens, IntegrationError> {
        let response = self.http.post(&self.config.token_url).form(form).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("Google token endpoint returned {}", status);
            return Err(IntegrationError::Status { status, body });
        }

        Ok(response.json::<GoogleTokens>().await?)
    }
}

#[async_trait]
impl GoogleOAuth for GoogleClient {
    fn authorization_url(&self, state: &str) -> Result<String, IntegrationError> {
        let url = Url::parse_with_params(
            &self.config.auth_url,
            &[
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", "openid email profile"),
                ("access_type", "offline"),
                ("prompt", "consent"),
                ("state", state),
            ],
        )
        .map_err(|e| IntegrationError::Config(e.to_string()))?;

        Ok(url.to_string())
    }

    #[instrument(skip(self, code))]
    async fn exchange_code(&self, code: &str) -> Result<GoogleTokens, IntegrationError> {
        debug!("Exchanging Google authorization code");
        self.post_token_form(&[
            ("code", code),
            ("client_id", &self.config.client_id),
            ("client_secret", &self.config.client_secret),
            ("redirect_uri", &self.config.redirect_uri),
            ("grant_type", "authorization_code"),
        ])
        .await
    }

    #[instrument(skip(self, access_token))]
    async fn user_info(&self, access_token: &str) -> Result<GoogleUserInfo, IntegrationError> {
        let response = self
            .http
            .get(&self.config.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(IntegrationError::Status { status, body });
        }

        Ok(response.json::<GoogleUserInfo>().await?)
    }

    #[instrument(skip(self, refresh_token))]
    async fn refresh_access_token(&self, refresh_token: &str) -> Result<String, IntegrationError> {
        debug!("Refreshing Google access token");
        let tokens = self
            .post_token_form(&[
                ("refresh_token", refresh_token),
                ("client_id", &self.config.client_id),
                ("client_secret", &self.config.client_secret),
                ("grant_type", "refresh_token"),
            ])
            .await?;

        Ok(tokens.access_token)
    }
}
