//! Config - server configuration loaded from the environment

use dotenv::dotenv;
use std::env;
use std::str::FromStr;
use tracing::{info, warn};

const DEFAULT_JWT_SECRET: &str = "a less beautiful secret";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_host: String,
    pub server_port: u16,
    pub max_connections: u32,
    pub app_env: String,
    /// Shared secret expected in the `X-API-Key` header; empty disables the check
    pub api_key: String,
    pub frontend_url: String,
    pub www_frontend_url: String,
    pub bcrypt_cost: u32,
    pub smtp_sender: String,
    pub google: GoogleConfig,
    pub search: SearchConfig,
}

#[derive(Debug, Clone, Default)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub auth_url: String,
    pub token_url: String,
    pub userinfo_url: String,
}

#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub openai_model: String,
    pub llm_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub max_hops: usize,
    pub max_results: usize,
    /// Upper bounds for the per-request `max_hops` and `max_results`
    pub hop_limit: usize,
    pub result_limit: usize,
    pub github_token: String,
    pub youtube_api_key: String,
    pub udemy_client_id: String,
    pub udemy_client_secret: String,
    pub arxiv_base_url: String,
    pub wikipedia_base_url: String,
    pub github_base_url: String,
    pub youtube_base_url: String,
    pub open_library_base_url: String,
    pub udemy_base_url: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            openai_api_key: String::new(),
            openai_base_url: "https://api.openai.com/v1".to_string(),
            openai_model: "gpt-3.5-turbo".to_string(),
            llm_timeout_secs: 10,
            request_timeout_secs: 15,
            max_hops: 1,
            max_results: 10,
            hop_limit: 3,
            result_limit: 50,
            github_token: String::new(),
            youtube_api_key: String::new(),
            udemy_client_id: String::new(),
            udemy_client_secret: String::new(),
            arxiv_base_url: "https://export.arxiv.org".to_string(),
            wikipedia_base_url: "https://en.wikipedia.org".to_string(),
            github_base_url: "https://api.github.com".to_string(),
            youtube_base_url: "https://www.googleapis.com".to_string(),
            open_library_base_url: "https://openlibrary.org".to_string(),
            udemy_base_url: "https://www.udemy.com".to_string(),
        }
    }
}

impl Config {
    /// Loads the configuration from environment variables.
    /// Calls dotenv() first so a local `.env` file is honoured.
    pub fn from_env() -> Result<Self, String> {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| "DATABASE_URL must be set in .env file".to_string())?;

        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            warn!("JWT_SECRET not set, using default (not secure for production!)");
            DEFAULT_JWT_SECRET.to_string()
        });

        let defaults = SearchConfig::default();
        let search = SearchConfig {
            openai_api_key: var_or("OPENAI_API_KEY", ""),
            openai_base_url: var_or("OPENAI_BASE_URL", &defaults.openai_base_url),
            openai_model: var_or("OPENAI_MODEL", &defaults.openai_model),
            llm_timeout_secs: parse_var("LLM_TIMEOUT_SECS", defaults.llm_timeout_secs)?,
            request_timeout_secs: parse_var("SEARCH_TIMEOUT_SECS", defaults.request_timeout_secs)?,
            max_hops: parse_var("SEARCH_MAX_HOPS", defaults.max_hops)?,
            max_results: parse_var("SEARCH_MAX_RESULTS", defaults.max_results)?,
            hop_limit: parse_var("SEARCH_HOP_LIMIT", defaults.hop_limit)?,
            result_limit: parse_var("SEARCH_RESULT_LIMIT", defaults.result_limit)?,
            github_token: var_or("GITHUB_TOKEN", ""),
            youtube_api_key: var_or("YOUTUBE_API_KEY", ""),
            udemy_client_id: var_or("UDEMY_CLIENT_ID", ""),
            udemy_client_secret: var_or("UDEMY_CLIENT_SECRET", ""),
            arxiv_base_url: var_or("ARXIV_BASE_URL", &defaults.arxiv_base_url),
            wikipedia_base_url: var_or("WIKIPEDIA_BASE_URL", &defaults.wikipedia_base_url),
            github_base_url: var_or("GITHUB_BASE_URL", &defaults.github_base_url),
            youtube_base_url: var_or("YOUTUBE_BASE_URL", &defaults.youtube_base_url),
            open_library_base_url: var_or("OPEN_LIBRARY_BASE_URL", &defaults.open_library_base_url),
            udemy_base_url: var_or("UDEMY_BASE_URL", &defaults.udemy_base_url),
        };

        let google = GoogleConfig {
            client_id: var_or("GOOGLE_CLIENT_ID", ""),
            client_secret: var_or("GOOGLE_CLIENT_SECRET", ""),
            redirect_uri: var_or("GOOGLE_REDIRECT_URI", ""),
            ..GoogleConfig::production_endpoints()
        };

        Ok(Config {
            database_url,
            jwt_secret,
            server_host: var_or("SERVER_HOST", "127.0.0.1"),
            server_port: parse_var("SERVER_PORT", 8000)
                .map_err(|_| "Invalid SERVER_PORT: must be a number between 0-65535".to_string())?,
            max_connections: parse_var("MAX_DB_CONNECTIONS", 10)?,
            app_env: var_or("APP_ENV", "development"),
            api_key: var_or("API_KEY", ""),
            frontend_url: var_or("FRONTEND_URL", "http://localhost:3000"),
            www_frontend_url: var_or("WWW_FRONTEND_URL", ""),
            bcrypt_cost: parse_var("BCRYPT_COST", bcrypt::DEFAULT_COST)?,
            smtp_sender: var_or("SMTP_SENDER", ""),
            google,
            search,
        })
    }

    /// Configuration used by tests: in-memory secrets, cheap hashing, no API key
    pub fn for_tests(database_url: &str) -> Self {
        Config {
            database_url: database_url.to_string(),
            jwt_secret: "test-secret-that-must-change".to_string(),
            server_host: "127.0.0.1".to_string(),
            server_port: 0,
            max_connections: 5,
            app_env: "test".to_string(),
            api_key: String::new(),
            frontend_url: "http://localhost:3000".to_string(),
            www_frontend_url: String::new(),
            bcrypt_cost: 4,
            smtp_sender: "noreply@example.com".to_string(),
            google: GoogleConfig::production_endpoints(),
            search: SearchConfig::default(),
        }
    }

    /// Logs the configuration (hiding secrets)
    pub fn print_info(&self) {
        info!("Server configuration:");
        info!("   Environment: {}", self.app_env);
        info!("   Server Address: {}:{}", self.server_host, self.server_port);
        info!("   Database: {}", Self::mask_url(&self.database_url));
        info!("   Max DB Connections: {}", self.max_connections);
        info!("   Frontend: {}", self.frontend_url);
        info!(
            "   JWT Secret: {}",
            if self.jwt_secret == DEFAULT_JWT_SECRET {
                "USING DEFAULT (INSECURE!)"
            } else {
                "custom secret configured"
            }
        );
        info!(
            "   API key check: {}",
            if self.api_key.is_empty() { "disabled" } else { "enabled" }
        );
        info!(
            "   LLM query generation: {}",
            if self.search.openai_api_key.is_empty() { "disabled" } else { "enabled" }
        );
    }

    /// Origins allowed by CORS, skipping the empty ones
    pub fn allowed_origins(&self) -> Vec<String> {
        [&self.frontend_url, &self.www_frontend_url]
            .into_iter()
            .filter(|origin| !origin.is_empty())
            .cloned()
            .collect()
    }

    /// Masks the database credentials for logging
    fn mask_url(url: &str) -> String {
        if let Some(at_pos) = url.find('@') {
            if let Some(scheme_end) = url.find("://") {
                let scheme = &url[..scheme_end + 3];
                let after_at = &url[at_pos..];
                return format!("{}***{}", scheme, after_at);
            }
        }
        if url.starts_with("sqlite:") {
            return url.to_string();
        }
        "***".to_string()
    }
}

impl GoogleConfig {
    fn production_endpoints() -> Self {
        Self {
            auth_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            userinfo_url: "https://www.googleapis.com/oauth2/v3/userinfo".to_string(),
            ..Default::default()
        }
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T: FromStr>(key: &str, default: T) -> Result<T, String> {
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|_| format!("Invalid {}: could not parse '{}'", key, raw)),
        Err(_) => Ok(default),
    }
}
