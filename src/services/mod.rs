//! Services module - HTTP handlers grouped by feature
//!
//! Each sub-module handles the endpoints of one router in `lib.rs`.

pub mod account;
pub mod auth;
pub mod friend;
pub mod search;
pub mod user;

pub use account::{check_code, forgot_password, reset_password, update_email, verify_email_update};
pub use auth::{google_auth, google_verify_email, login, logout, refresh_token, signup, verify_email};
pub use friend::{
    accept_request, decline_request, delete_friend, incoming_requests, list_friends,
    revert_request, send_request, sent_requests,
};
pub use search::{
    search_all, search_arxiv, search_github, search_open_library, search_udemy, search_wikipedia,
    search_youtube,
};
pub use user::{delete_profile, get_profile, search_users, update_profile};

use crate::dtos::MessageDTO;
use axum::Json;

/// Root endpoint - health check
pub async fn root() -> Json<MessageDTO> {
    Json(MessageDTO::new("API"))
}
