//! Application State - shared by every route and middleware

use crate::core::config::Config;
use crate::integrations::{GoogleClient, GoogleOAuth, LogMailer, Mailer};
use crate::repositories::{
    AuthCodeRepository, FriendRepository, FriendRequestRepository, UserRepository,
};
use crate::search::Retriever;
use reqwest::Client;
use sqlx::SqlitePool;
use std::sync::Arc;

pub struct AppState {
    pub user: UserRepository,
    pub auth_code: AuthCodeRepository,
    pub friend: FriendRepository,
    pub friend_request: FriendRequestRepository,

    pub config: Config,

    /// Outgoing verification and recovery mails
    pub mailer: Arc<dyn Mailer>,

    /// Google OAuth2 code exchange and token checks
    pub google: Arc<dyn GoogleOAuth>,

    /// Third-party search providers
    pub retriever: Retriever,
}

impl AppState {
    /// Wires the production integrations on one shared HTTP client
    pub fn new(pool: SqlitePool, config: Config) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .user_agent(concat!("dilemma-server/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let mailer: Arc<dyn Mailer> = Arc::new(LogMailer::new(&config.smtp_sender));
        let google: Arc<dyn GoogleOAuth> =
            Arc::new(GoogleClient::new(http.clone(), config.google.clone()));
        let retriever = Retriever::new(http, &config.search);

        Ok(Self::with_integrations(pool, config, mailer, google, retriever))
    }

    pub fn with_integrations(
        pool: SqlitePool,
        config: Config,
        mailer: Arc<dyn Mailer>,
        google: Arc<dyn GoogleOAuth>,
        retriever: Retriever,
    ) -> Self {
        Self {
            user: UserRepository::new(pool.clone()),
            auth_code: AuthCodeRepository::new(pool.clone()),
            friend: FriendRepository::new(pool.clone()),
            friend_request: FriendRequestRepository::new(pool),
            config,
            mailer,
            google,
            retriever,
        }
    }
}
