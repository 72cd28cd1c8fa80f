#![allow(dead_code)]

use async_trait::async_trait;
use axum::http::{HeaderName, HeaderValue, header};
use axum_test::TestServer;
use dilemma_server::config::{Config, SearchConfig};
use dilemma_server::core::{AppState, TokenKind, encode_token};
use dilemma_server::dtos::CreateUserDTO;
use dilemma_server::entities::{Provider, User};
use dilemma_server::integrations::{
    GoogleOAuth, GoogleTokens, GoogleUserInfo, IntegrationError, LogMailer, Mailer,
};
use dilemma_server::repositories::Create;
use dilemma_server::search::Retriever;
use sqlx::SqlitePool;
use std::sync::Arc;

pub const PASSWORD: &str = "Password123";

/// Codici OAuth accettati dal FakeGoogle
pub const GOOGLE_CODE: &str = "google-code";
pub const GOOGLE_CODE_NO_OFFLINE: &str = "google-code-no-offline";
pub const GOOGLE_ACCESS: &str = "google-access";
pub const GOOGLE_REFRESH: &str = "google-refresh";
pub const GOOGLE_REFRESHED_ACCESS: &str = "google-access-refreshed";

fn rejected(body: &str) -> IntegrationError {
    IntegrationError::Status {
        status: reqwest::StatusCode::UNAUTHORIZED,
        body: body.to_string(),
    }
}

/// Google finto: riconosce solo i codici e i token qui sopra e risponde sempre
/// con l'utente `email`
pub struct FakeGoogle {
    pub email: String,
}

#[async_trait]
impl GoogleOAuth for FakeGoogle {
    fn authorization_url(&self, state: &str) -> Result<String, IntegrationError> {
        Ok(format!("https://accounts.example.com/auth?state={state}"))
    }

    async fn exchange_code(
        &self,
        code: &str,
    ) -> Result<GoogleTokens, IntegrationError> {
        match code {
            GOOGLE_CODE => Ok(GoogleTokens {
                access_token: GOOGLE_ACCESS.to_string(),
                refresh_token: Some(GOOGLE_REFRESH.to_string()),
            }),
            GOOGLE_CODE_NO_OFFLINE => Ok(GoogleTokens {
                access_token: GOOGLE_ACCESS.to_string(),
                refresh_token: None,
            }),
            _ => Err(rejected("invalid_grant")),
        }
    }

    async fn user_info(
        &self,
        access_token: &str,
    ) -> Result<GoogleUserInfo, IntegrationError> {
        if access_token != GOOGLE_ACCESS && access_token != GOOGLE_REFRESHED_ACCESS {
            return Err(rejected("invalid_token"));
        }
        Ok(GoogleUserInfo {
            email: self.email.clone(),
            picture: Some("https://example.com/avatar.png".to_string()),
            given_name: Some("Gina".to_string()),
            family_name: Some("Google".to_string()),
            name: None,
        })
    }

    async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<String, IntegrationError> {
        if refresh_token == GOOGLE_REFRESH {
            Ok(GOOGLE_REFRESHED_ACCESS.to_string())
        } else {
            Err(rejected("invalid_grant"))
        }
    }
}

/// Config dei provider di ricerca che punta a `base_url` (un MockServer) per tutti
pub fn search_config(base_url: &str) -> SearchConfig {
    SearchConfig {
        request_timeout_secs: 5,
        llm_timeout_secs: 1,
        youtube_api_key: "yt-key".to_string(),
        udemy_client_id: "udemy-id".to_string(),
        udemy_client_secret: "udemy-secret".to_string(),
        arxiv_base_url: base_url.to_string(),
        wikipedia_base_url: base_url.to_string(),
        github_base_url: base_url.to_string(),
        youtube_base_url: base_url.to_string(),
        open_library_base_url: base_url.to_string(),
        udemy_base_url: base_url.to_string(),
        ..SearchConfig::default()
    }
}

/// Crea un AppState per i test
///
/// # Arguments
/// * `pool` - Connection pool SQLite (creato da `#[sqlx::test]`)
///
/// # Returns
/// Arc<AppState> con mailer di log, Google finto e provider di ricerca irraggiungibili
pub fn create_test_state(pool: SqlitePool) -> Arc<AppState> {
    let config = Config::for_tests("sqlite::memory:");
    create_state_with(pool, config, &search_config("http://127.0.0.1:9"))
}

/// Come `create_test_state` ma con config e provider di ricerca scelti dal test
pub fn create_state_with(pool: SqlitePool, config: Config, search: &SearchConfig) -> Arc<AppState> {
    let mailer: Arc<dyn Mailer> = Arc::new(LogMailer::new(&config.smtp_sender));
    let google: Arc<dyn GoogleOAuth> = Arc::new(FakeGoogle {
        email: "gina@gmail.com".to_string(),
    });
    let retriever = Retriever::with_generator(reqwest::Client::new(), search, None);

    Arc::new(AppState::with_integrations(pool, config, mailer, google, retriever))
}

/// Crea un TestServer per i test
///
/// # Arguments
/// * `state` - AppState da utilizzare per il server
///
/// # Returns
/// TestServer configurato e pronto per eseguire richieste
pub fn create_test_server(state: Arc<AppState>) -> TestServer {
    let app = dilemma_server::create_router(state);
    TestServer::new(app).expect("Failed to create test server")
}

/// Registra un utente "dilemma" con password `PASSWORD`
pub async fn seed_user(state: &AppState, email: &str, username: &str) -> User {
    let hashed_password = User::hash_password(PASSWORD, 4).expect("hashing failed");
    state
        .user
        .create(&CreateUserDTO {
            provider: Provider::Dilemma,
            email: Some(email.to_string()),
            username: Some(username.to_string()),
            fullname: None,
            profile_picture: None,
            hashed_password: Some(hashed_password),
            refresh_token: None,
        })
        .await
        .expect("Failed to seed user")
}

/// Access token JWT valido per `email`
pub fn access_token(state: &AppState, email: &str) -> String {
    encode_token(email, TokenKind::Access, TokenKind::Access.ttl(), &state.config.jwt_secret)
        .expect("Failed to create JWT token")
}

/// Refresh token JWT valido per `subject`
pub fn refresh_token(state: &AppState, subject: &str) -> String {
    encode_token(subject, TokenKind::Refresh, TokenKind::Refresh.ttl(), &state.config.jwt_secret)
        .expect("Failed to create JWT token")
}

/// Header `Cookie` con le coppie nome=valore date
pub fn cookies(pairs: &[(&str, &str)]) -> (HeaderName, HeaderValue) {
    let value = pairs
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join("; ");
    (header::COOKIE, HeaderValue::from_str(&value).expect("invalid cookie"))
}

/// Cookie di sessione per un utente "dilemma"
pub fn session_for(state: &AppState, email: &str) -> (HeaderName, HeaderValue) {
    let token = access_token(state, email);
    cookies(&[("access_token", &token), ("provider", "dilemma")])
}

/// Ultimo codice mandato per email a `email`
pub async fn latest_code(pool: &SqlitePool, email: &str) -> String {
    sqlx::query_scalar("SELECT code FROM auth_codes WHERE email = ? ORDER BY id DESC LIMIT 1")
        .bind(email)
        .fetch_one(pool)
        .await
        .expect("No code issued")
}

/// Valori degli header Set-Cookie di una risposta
pub fn set_cookies(response: &axum_test::TestResponse) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .map(str::to_string)
        .collect()
}

/// Valore del cookie `name` tra i Set-Cookie di una risposta
pub fn cookie_value(response: &axum_test::TestResponse, name: &str) -> Option<String> {
    set_cookies(response).into_iter().find_map(|cookie| {
        let (pair, _) = cookie.split_once(';')?;
        let (key, value) = pair.split_once('=')?;
        (key == name).then(|| value.to_string())
    })
}
