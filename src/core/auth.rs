use crate::core::{AppError, AppState};
use crate::entities::{Provider, User};
use axum::extract::State;
use axum::{
    body::Body,
    extract::Request,
    http::{HeaderMap, HeaderValue, Response, header},
    middleware::Next,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";
pub const PROVIDER_COOKIE: &str = "provider";
pub const API_KEY_HEADER: &str = "x-api-key";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn ttl(&self) -> Duration {
        match self {
            TokenKind::Access => Duration::minutes(30),
            TokenKind::Refresh => Duration::days(30),
        }
    }
}

// JWT payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // email, or the wrapped Google refresh token
    pub kind: TokenKind,
    pub iat: usize,
    pub exp: usize,
}

#[instrument(skip(subject, ttl, secret))]
pub fn encode_token(
    subject: &str,
    kind: TokenKind,
    ttl: Duration,
    secret: &str,
) -> Result<String, AppError> {
    debug!("Encoding JWT token");
    let now = Utc::now();
    let claims = Claims {
        sub: subject.to_string(),
        kind,
        iat: now.timestamp() as usize,
        exp: (now + ttl).timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| {
        warn!("Failed to encode JWT token: {:?}", e);
        AppError::internal_server_error("Error in encoding jwt token")
    })
}

#[instrument(skip(token, secret))]
pub fn decode_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}

fn cookie(name: &str, value: &str, max_age: i64) -> Result<HeaderValue, AppError> {
    // Max-Age must stay the third field, clients read it by position
    HeaderValue::from_str(&format!(
        "{name}={value}; HttpOnly; Max-Age={max_age}; Path=/; SameSite=none; Secure"
    ))
    .map_err(|_| AppError::internal_server_error("Invalid cookie value"))
}

/// Only the access token, e.g. after the email (and so the token subject) changed
pub fn set_access_cookie(headers: &mut HeaderMap, access_token: &str) -> Result<(), AppError> {
    headers.append(
        header::SET_COOKIE,
        cookie(
            ACCESS_TOKEN_COOKIE,
            access_token,
            TokenKind::Access.ttl().num_seconds(),
        )?,
    );
    Ok(())
}

pub fn set_auth_cookies(
    headers: &mut HeaderMap,
    access_token: &str,
    refresh_token: &str,
    provider: Provider,
) -> Result<(), AppError> {
    let refresh_max_age = TokenKind::Refresh.ttl().num_seconds();
    set_access_cookie(headers, access_token)?;
    headers.append(
        header::SET_COOKIE,
        cookie(REFRESH_TOKEN_COOKIE, refresh_token, refresh_max_age)?,
    );
    headers.append(
        header::SET_COOKIE,
        cookie(PROVIDER_COOKIE, provider.as_str(), refresh_max_age)?,
    );
    Ok(())
}

pub fn delete_auth_cookies(headers: &mut HeaderMap) -> Result<(), AppError> {
    for name in [ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE, PROVIDER_COOKIE] {
        headers.append(header::SET_COOKIE, cookie(name, "", 0)?);
    }
    Ok(())
}

/// Value of the cookie `name` from the request `Cookie` headers
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// Provider of the session, `dilemma` when the cookie is missing or unknown
pub fn read_provider(headers: &HeaderMap) -> Provider {
    read_cookie(headers, PROVIDER_COOKIE)
        .and_then(|value| Provider::parse(&value))
        .unwrap_or(Provider::Dilemma)
}

/// Access token from the cookie, falling back to `Authorization: Bearer`
fn read_access_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = read_cookie(headers, ACCESS_TOKEN_COOKIE) {
        return Some(token);
    }

    let auth_header = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let mut parts = auth_header.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some(scheme), Some(token)) if scheme.eq_ignore_ascii_case("bearer") => {
            Some(token.to_string())
        }
        _ => None,
    }
}

/// Resolves an access token to its user. Local tokens are decoded with our
/// secret, Google tokens are checked against Google's userinfo endpoint.
#[instrument(skip(state, token))]
pub async fn resolve_user(
    state: &AppState,
    provider: Provider,
    token: &str,
) -> Result<User, AppError> {
    let email = match provider {
        Provider::Dilemma => {
            let claims = decode_token(token, &state.config.jwt_secret)?;
            if claims.kind != TokenKind::Access {
                warn!("Refresh token used as access token");
                return Err(AppError::credentials());
            }
            claims.sub
        }
        Provider::Google => {
            let info = state.google.user_info(token).await.map_err(|e| {
                warn!("Google rejected the access token: {}", e);
                AppError::credentials()
            })?;
            info.email
        }
    };

    state
        .user
        .find_by_email(&email)
        .await?
        .ok_or_else(AppError::credentials)
}

#[instrument(skip(state, req, next))]
pub async fn authentication_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response<Body>, AppError> {
    debug!("Running authentication middleware");
    let token = read_access_token(req.headers()).ok_or_else(|| {
        warn!("Missing access token");
        AppError::unauthorized("Not authenticated")
    })?;
    let provider = read_provider(req.headers());

    let current_user = resolve_user(&state, provider, &token).await?;
    if current_user.disabled {
        warn!("Disabled user tried to authenticate: {}", current_user.uid);
        return Err(AppError::bad_request("Inactive user"));
    }

    info!("User authenticated: {}", current_user.uid);
    req.extensions_mut().insert(current_user);
    Ok(next.run(req).await)
}

/// Rejects requests without the configured `X-API-Key`; a no-op when no key is configured
#[instrument(skip(state, req, next))]
pub async fn api_key_middleware(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response<Body>, AppError> {
    let expected = &state.config.api_key;
    if !expected.is_empty() {
        let provided = req
            .headers()
            .get(API_KEY_HEADER)
            .and_then(|value| value.to_str().ok());
        if provided != Some(expected.as_str()) {
            warn!("Request rejected: invalid or missing API key");
            return Err(AppError::forbidden("Could not validate API key"));
        }
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "unit-test-secret";

    #[test]
    fn token_round_trip_keeps_subject_and_kind() {
        let token = encode_token("alice@example.com", TokenKind::Refresh, TokenKind::Refresh.ttl(), SECRET).unwrap();
        let claims = decode_token(&token, SECRET).unwrap();
        assert_eq!(claims.sub, "alice@example.com");
        assert_eq!(claims.kind, TokenKind::Refresh);
        assert_eq!(claims.exp - claims.iat, 30 * 24 * 60 * 60);
    }

    #[test]
    fn tokens_from_another_secret_or_expired_are_rejected() {
        let token = encode_token("a@b.c", TokenKind::Access, TokenKind::Access.ttl(), SECRET).unwrap();
        assert!(decode_token(&token, "other-secret").is_err());

        let expired = encode_token("a@b.c", TokenKind::Access, Duration::minutes(-10), SECRET).unwrap();
        let err = decode_token(&expired, SECRET).unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn cookies_keep_max_age_in_third_position() {
        let mut headers = HeaderMap::new();
        set_auth_cookies(&mut headers, "acc", "ref", Provider::Google).unwrap();

        let cookies: Vec<&str> = headers
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap())
            .collect();
        assert_eq!(cookies.len(), 3);
        assert_eq!(
            cookies[0],
            "access_token=acc; HttpOnly; Max-Age=1800; Path=/; SameSite=none; Secure"
        );
        assert_eq!(cookies[1].split(';').nth(2), Some(" Max-Age=2592000"));
        assert!(cookies[2].starts_with("provider=google;"));
    }

    #[test]
    fn deleted_cookies_are_empty_and_expired() {
        let mut headers = HeaderMap::new();
        delete_auth_cookies(&mut headers).unwrap();
        for value in headers.get_all(header::SET_COOKIE) {
            let value = value.to_str().unwrap();
            assert!(value.contains("=; HttpOnly; Max-Age=0;"));
        }
    }

    #[test]
    fn reads_cookies_and_bearer_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark; provider=google"));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));

        assert_eq!(read_provider(&headers), Provider::Google);
        assert_eq!(read_access_token(&headers).as_deref(), Some("abc.def"));

        headers.insert(header::COOKIE, HeaderValue::from_static("access_token=from-cookie"));
        assert_eq!(read_access_token(&headers).as_deref(), Some("from-cookie"));
        assert_eq!(read_provider(&headers), Provider::Dilemma);
    }
}
