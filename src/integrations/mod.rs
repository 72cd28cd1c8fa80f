//! Integrations - thin clients for third-party services used by the auth flows
//!
//! Both integrations sit behind a trait so the server can run (and be tested)
//! with a stand-in implementation.

pub mod google;
pub mod mailer;

pub use google::{GoogleClient, GoogleOAuth, GoogleTokens, GoogleUserInfo};
pub use mailer::{LogMailer, Mailer};

#[derive(Debug, thiserror::Error)]
pub enum IntegrationError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("mail delivery failed: {0}")]
    Mail(String),
}
