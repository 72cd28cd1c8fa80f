//! Server library - exposes the main modules to the binary and the tests

pub mod core;
pub mod dtos;
pub mod entities;
pub mod integrations;
pub mod repositories;
pub mod search;
pub mod services;

// Re-export of the main types for easier imports
pub use core::{AppError, AppState, auth, config};
pub use services::root;

use axum::{
    Router,
    http::{HeaderName, HeaderValue, Method, header},
    middleware,
    routing::{delete, get, patch, post},
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Builds the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    use core::{api_key_middleware, authentication_middleware};
    use services::*;

    // `nest` does not match the trailing-slash form of a nested root
    let slash_routes = Router::new()
        .route(
            "/friends/",
            get(list_friends).layer(middleware::from_fn_with_state(
                state.clone(),
                authentication_middleware,
            )),
        )
        .route("/search/", post(search_all))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api_key_middleware,
        ));

    Router::new()
        .route("/", get(root))
        .nest("/auth", configure_auth_routes(state.clone()))
        .nest("/account", configure_account_routes(state.clone()))
        .nest("/user", configure_user_routes(state.clone()))
        .nest("/friends", configure_friend_routes(state.clone()))
        .nest("/search", configure_search_routes(state.clone()))
        .merge(slash_routes)
        .layer(cors_layer(&state))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Allows the configured frontends, with cookies
fn cors_layer(state: &AppState) -> CorsLayer {
    let origins: Vec<HeaderValue> = state
        .config
        .allowed_origins()
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static(auth::API_KEY_HEADER),
        ])
}

/// Signup, login, Google OAuth and session tokens
fn configure_auth_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use core::api_key_middleware;
    use services::*;

    Router::new()
        .route("/verify-email", post(verify_email))
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/google/verify-email", post(google_verify_email))
        .route("/google", post(google_auth))
        .route("/token/refresh", post(refresh_token))
        .route("/logout", post(logout))
        .layer(middleware::from_fn_with_state(state, api_key_middleware))
}

/// Password recovery (public) and email change (authenticated)
fn configure_account_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use core::{api_key_middleware, authentication_middleware};
    use services::*;

    let public_routes = Router::new()
        .route("/password/forgot", post(forgot_password))
        .route("/code/verify", post(check_code))
        .route("/password/reset", post(reset_password));

    let user_routes = Router::new()
        .route("/email/verify-update", post(verify_email_update))
        .route("/email/update", post(update_email))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            authentication_middleware,
        ));

    public_routes
        .merge(user_routes)
        .layer(middleware::from_fn_with_state(state, api_key_middleware))
}

/// Profile of the current user and user search
fn configure_user_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use core::{api_key_middleware, authentication_middleware};
    use services::*;

    Router::new()
        .route("/profile", get(get_profile))
        .route("/profile/update", patch(update_profile))
        .route("/profile/delete", delete(delete_profile))
        .route("/search", get(search_users))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            authentication_middleware,
        ))
        .layer(middleware::from_fn_with_state(state, api_key_middleware))
}

/// Friend requests and friendships
fn configure_friend_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use core::{api_key_middleware, authentication_middleware};
    use services::*;

    Router::new()
        .route("/", get(list_friends))
        .route("/send-request", post(send_request))
        .route("/revert-request", post(revert_request))
        .route("/accept-request", post(accept_request))
        .route("/decline-request", post(decline_request))
        .route("/delete", post(delete_friend))
        .route("/requests/sent", get(sent_requests))
        .route("/requests/incoming", get(incoming_requests))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            authentication_middleware,
        ))
        .layer(middleware::from_fn_with_state(state, api_key_middleware))
}

/// Retrieval endpoints, one per provider plus the aggregate at `/search/`
fn configure_search_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use core::api_key_middleware;
    use services::*;

    Router::new()
        .route("/", post(search_all))
        .route("/arxiv", post(search_arxiv))
        .route("/wikipedia", post(search_wikipedia))
        .route("/github", post(search_github))
        .route("/youtube", post(search_youtube))
        .route("/open-library", post(search_open_library))
        .route("/udemy", post(search_udemy))
        .layer(middleware::from_fn_with_state(state, api_key_middleware))
}
