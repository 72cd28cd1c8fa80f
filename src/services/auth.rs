//! Auth services - signup, login, Google OAuth and session tokens

use crate::core::auth::{
    ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE, delete_auth_cookies, read_cookie, read_provider,
    resolve_user, set_auth_cookies,
};
use crate::core::{AppError, AppState, TokenKind, decode_token, encode_token};
use crate::dtos::{
    CreateAuthCodeDTO, CreateUserDTO, GoogleAuthDTO, LoginDTO, MessageDTO, SignupDTO, UserRead,
};
use crate::entities::{AuthCode, AuthCodeKind, AuthCodeStatus, Provider, User};
use crate::integrations::mailer;
use crate::repositories::Create;
use axum::{
    extract::{Json, State},
    http::HeaderMap,
    response::Redirect,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

pub(crate) const GENERIC_EMAIL_MESSAGE: &str =
    "If the email exists, you will receive a verification email shortly.";

/// Trimmed value of a required body field, 400 with `message` when missing or blank
pub(crate) fn required<'a>(
    value: &'a Option<String>,
    message: &'static str,
) -> Result<&'a str, AppError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AppError::bad_request(message)),
    }
}

/// Signs an access or refresh token for `subject` with the configured secret
pub(crate) fn token_for(state: &AppState, subject: &str, kind: TokenKind) -> Result<String, AppError> {
    encode_token(subject, kind, kind.ttl(), &state.config.jwt_secret)
}

/// Issues a new code for `email` and mails it. Mail failures are only logged,
/// the caller always answers with the generic message.
#[instrument(skip(state, body))]
pub(crate) async fn send_code(
    state: &AppState,
    email: &str,
    kind: AuthCodeKind,
    subject: &str,
    body: fn(&str) -> String,
) -> Result<(), AppError> {
    let auth_code = state
        .auth_code
        .create(&CreateAuthCodeDTO {
            email: email.to_string(),
            request_type: kind,
        })
        .await?;

    if let Err(e) = state.mailer.send(email, subject, &body(&auth_code.code)).await {
        warn!("Could not send {:?} code: {}", kind, e);
    }
    Ok(())
}

/// Newest pending code of `kind` for `email`, left pending.
/// An expired code is marked as such and rejected.
#[instrument(skip(state, code))]
pub(crate) async fn pending_code(
    state: &AppState,
    email: &str,
    code: &str,
    kind: AuthCodeKind,
) -> Result<AuthCode, AppError> {
    let auth_code = state
        .auth_code
        .find_latest(email, code, kind, AuthCodeStatus::Pending)
        .await?
        .ok_or_else(|| {
            warn!("No pending code matches");
            AppError::bad_request("Invalid code")
        })?;

    if auth_code.is_expired(Utc::now()) {
        state
            .auth_code
            .set_status(&auth_code.id, AuthCodeStatus::Expired, None)
            .await?;
        warn!("Code expired");
        return Err(AppError::bad_request("Code expired"));
    }

    Ok(auth_code)
}

/// Marks a code returned by [`pending_code`] as used. Fails when a
/// concurrent request consumed it first.
pub(crate) async fn consume_code(state: &AppState, auth_code: &AuthCode) -> Result<(), AppError> {
    if !state.auth_code.consume(&auth_code.id, Utc::now()).await? {
        warn!("Code consumed by another request");
        return Err(AppError::bad_request("Invalid code"));
    }
    debug!("Code consumed");
    Ok(())
}

#[instrument(skip(state, body))]
pub async fn verify_email(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SignupDTO>,
) -> Result<Json<MessageDTO>, AppError> {
    // 1. email, password e confirm_password sono obbligatori e devono coincidere
    // 2. validare il formato di email e password
    // 3. mandare il codice solo se l'email non è già registrata
    // 4. rispondere sempre con lo stesso messaggio
    let email = required(&body.email, "Email is required")?;
    let password = required(&body.password, "Password is required")?;
    let confirm_password = required(&body.confirm_password, "Confirm password is required")?;
    if password != confirm_password {
        return Err(AppError::bad_request("Passwords do not match"));
    }
    body.validate()?;

    if state.user.find_by_email(email).await?.is_none() {
        send_code(
            &state,
            email,
            AuthCodeKind::Verify,
            "Verify your email",
            mailer::verification_body,
        )
        .await?;
        info!("Verification code sent");
    } else {
        debug!("Email already registered, no code sent");
    }

    Ok(Json(MessageDTO::new(GENERIC_EMAIL_MESSAGE)))
}

#[instrument(skip(state, body))]
pub async fn signup(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SignupDTO>,
) -> Result<(HeaderMap, Json<UserRead>), AppError> {
    let email = required(&body.email, "Email is required")?;
    let password = required(&body.password, "Password is required")?;
    let code = required(&body.code, "Code is required")?;
    if let Some(confirm_password) = body.confirm_password.as_deref() {
        if confirm_password != password {
            return Err(AppError::bad_request("Passwords do not match"));
        }
    }
    body.validate()?;

    // il codice resta valido finché la registrazione non può davvero avvenire
    let auth_code = pending_code(&state, email, code, AuthCodeKind::Verify).await?;

    if state.user.find_by_email(email).await?.is_some() {
        return Err(AppError::conflict("Email already registered"));
    }
    if let Some(username) = body.username.as_deref() {
        if state.user.find_by_username(username).await?.is_some() {
            return Err(AppError::conflict("Username already taken"));
        }
    }

    let hashed_password = User::hash_password(password, state.config.bcrypt_cost)?;
    let refresh_token = token_for(&state, email, TokenKind::Refresh)?;

    consume_code(&state, &auth_code).await?;

    let user = state
        .user
        .create(&CreateUserDTO {
            provider: Provider::Dilemma,
            email: Some(email.to_string()),
            username: body.username.clone(),
            fullname: body.fullname.clone(),
            profile_picture: body.profile_picture.clone(),
            hashed_password: Some(hashed_password),
            refresh_token: Some(refresh_token.clone()),
        })
        .await?;
    info!("User signed up: {}", user.uid);

    let access_token = token_for(&state, email, TokenKind::Access)?;
    let mut headers = HeaderMap::new();
    set_auth_cookies(&mut headers, &access_token, &refresh_token, Provider::Dilemma)?;

    Ok((headers, Json(UserRead::from(user))))
}

#[instrument(skip(state, body))]
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginDTO>,
) -> Result<(HeaderMap, Json<UserRead>), AppError> {
    // 1. email e password obbligatori (fail-fast prima della query DB)
    // 2. solo utenti "dilemma" abilitati possono fare login con password
    // 3. verificare la password contro l'hash salvato
    // 4. ruotare il refresh token e impostare i cookie
    let email = required(&body.email, "Email is required")?;
    let password = required(&body.password, "Password is required")?;

    let user = state
        .user
        .find_by_email(email)
        .await?
        .filter(|u| u.provider == Provider::Dilemma && !u.disabled)
        .ok_or_else(|| {
            warn!("Login for unknown or disabled account");
            AppError::unauthorized("Incorrect email or password")
        })?;

    if !user.verify_password(password) {
        warn!("Wrong password for {}", user.uid);
        return Err(AppError::unauthorized("Incorrect email or password"));
    }

    let refresh_token = token_for(&state, email, TokenKind::Refresh)?;
    state
        .user
        .set_refresh_token(&user.id, Some(&refresh_token))
        .await?;
    let access_token = token_for(&state, email, TokenKind::Access)?;

    let mut headers = HeaderMap::new();
    set_auth_cookies(&mut headers, &access_token, &refresh_token, Provider::Dilemma)?;
    info!("User logged in: {}", user.uid);

    Ok((headers, Json(UserRead::from(user))))
}

#[instrument(skip(state, body))]
pub async fn google_verify_email(
    State(state): State<Arc<AppState>>,
    Json(body): Json<GoogleAuthDTO>,
) -> Result<Redirect, AppError> {
    let oauth_state = required(&body.state, "State is required")?;
    let url = state.google.authorization_url(oauth_state).map_err(|e| {
        warn!("Cannot build Google authorization URL: {}", e);
        AppError::internal_server_error("Google sign-in is not configured")
    })?;

    Ok(Redirect::temporary(&url))
}

#[instrument(skip(state, body))]
pub async fn google_auth(
    State(state): State<Arc<AppState>>,
    Json(body): Json<GoogleAuthDTO>,
) -> Result<(HeaderMap, Json<UserRead>), AppError> {
    let code = required(&body.code, "Code is required")?;
    let oauth_state = required(&body.state, "State is required")?;

    let tokens = state.google.exchange_code(code).await.map_err(|e| {
        warn!("Google code exchange failed: {}", e);
        AppError::credentials()
    })?;
    let info = state.google.user_info(&tokens.access_token).await.map_err(|e| {
        warn!("Google userinfo failed: {}", e);
        AppError::credentials()
    })?;
    let google_refresh = tokens.refresh_token.as_deref().ok_or_else(|| {
        warn!("Google answered without a refresh token");
        AppError::bad_request("Google did not grant offline access")
    })?;
    // the Google refresh token only ever leaves the server signed with our secret
    let refresh_token = token_for(&state, google_refresh, TokenKind::Refresh)?;

    let existing = state.user.find_by_email(&info.email).await?;
    let user = match oauth_state {
        "signup" => {
            if existing.is_some() {
                return Err(AppError::bad_request("Account already exists"));
            }
            let user = state
                .user
                .create(&CreateUserDTO {
                    provider: Provider::Google,
                    email: Some(info.email.clone()),
                    username: None,
                    fullname: info.full_name(),
                    profile_picture: info.picture.clone(),
                    hashed_password: None,
                    refresh_token: Some(refresh_token.clone()),
                })
                .await?;
            info!("Google user signed up: {}", user.uid);
            user
        }
        "login" => {
            let user = existing.ok_or_else(|| AppError::bad_request("Account does not exist"))?;
            if user.disabled {
                return Err(AppError::bad_request("Inactive user"));
            }
            state
                .user
                .set_refresh_token(&user.id, Some(&refresh_token))
                .await?;
            info!("Google user logged in: {}", user.uid);
            user
        }
        other => {
            warn!("Unknown OAuth state: {}", other);
            return Err(AppError::unauthorized("Invalid state"));
        }
    };

    let mut headers = HeaderMap::new();
    set_auth_cookies(&mut headers, &tokens.access_token, &refresh_token, Provider::Google)?;

    Ok((headers, Json(UserRead::from(user))))
}

/// Resolves the refresh cookie to its user and a fresh access token.
/// The cookie must be the exact token stored for that user.
async fn refresh_session(
    state: &AppState,
    provider: Provider,
    refresh_token: &str,
) -> Result<(User, String), AppError> {
    let claims = decode_token(refresh_token, &state.config.jwt_secret)?;
    if claims.kind != TokenKind::Refresh {
        return Err(AppError::credentials());
    }

    let (email, access_token) = match provider {
        Provider::Dilemma => {
            let access_token = token_for(state, &claims.sub, TokenKind::Access)?;
            (claims.sub, access_token)
        }
        Provider::Google => {
            let access_token = state
                .google
                .refresh_access_token(&claims.sub)
                .await
                .map_err(|e| {
                    warn!("Google token refresh failed: {}", e);
                    AppError::credentials()
                })?;
            let info = state
                .google
                .user_info(&access_token)
                .await
                .map_err(|_| AppError::credentials())?;
            (info.email, access_token)
        }
    };

    let user = state
        .user
        .find_by_email(&email)
        .await?
        .ok_or_else(AppError::credentials)?;
    if user.disabled || user.refresh_token.as_deref() != Some(refresh_token) {
        warn!("Refresh token does not match the stored one");
        return Err(AppError::credentials());
    }

    Ok((user, access_token))
}

#[instrument(skip(state, headers))]
pub async fn refresh_token(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<(HeaderMap, Json<UserRead>), AppError> {
    let provider = read_provider(&headers);

    if let Some(access_token) = read_cookie(&headers, ACCESS_TOKEN_COOKIE) {
        if let Ok(user) = resolve_user(&state, provider, &access_token).await {
            debug!("Access token still valid");
            return Ok((HeaderMap::new(), Json(UserRead::from(user))));
        }
    }

    let refresh_token = read_cookie(&headers, REFRESH_TOKEN_COOKIE).ok_or_else(|| {
        warn!("No refresh token cookie");
        AppError::credentials()
    })?;

    let (user, access_token) = refresh_session(&state, provider, &refresh_token).await?;

    let mut response_headers = HeaderMap::new();
    set_auth_cookies(&mut response_headers, &access_token, &refresh_token, provider)?;
    info!("Session refreshed for {}", user.uid);

    Ok((response_headers, Json(UserRead::from(user))))
}

#[instrument(skip(state, headers))]
pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<(HeaderMap, Json<MessageDTO>), AppError> {
    let provider = read_provider(&headers);

    let mut user = None;
    if let Some(access_token) = read_cookie(&headers, ACCESS_TOKEN_COOKIE) {
        user = resolve_user(&state, provider, &access_token).await.ok();
    }
    if user.is_none() {
        if let Some(refresh_token) = read_cookie(&headers, REFRESH_TOKEN_COOKIE) {
            user = state.user.find_by_refresh_token(&refresh_token).await?;
        }
    }

    match user {
        Some(user) => {
            state.user.set_refresh_token(&user.id, None).await?;
            info!("User logged out: {}", user.uid);
        }
        None => debug!("Logout without a resolvable session"),
    }

    let mut response_headers = HeaderMap::new();
    delete_auth_cookies(&mut response_headers)?;
    Ok((response_headers, Json(MessageDTO::new("Logout successful"))))
}
