//! Core Module - infrastructure shared by every feature
//!
//! - Authentication (JWT, cookies, middleware)
//! - Configuration
//! - Error handling
//! - Application state

pub mod auth;
pub mod config;
pub mod error;
pub mod state;

pub use auth::{
    Claims, TokenKind, api_key_middleware, authentication_middleware, decode_token, encode_token,
};
pub use config::Config;
pub use error::AppError;
pub use state::AppState;
