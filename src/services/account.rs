//! Account services - password recovery and email change

use super::auth::{
    GENERIC_EMAIL_MESSAGE, consume_code, pending_code, required, send_code, token_for,
};
use crate::core::auth::set_auth_cookies;
use crate::core::{AppError, AppState, TokenKind};
use crate::dtos::{EmailCodeDTO, EmailDTO, MessageDTO, PasswordResetDTO, UpdateUserDTO, UserRead};
use crate::entities::{AuthCodeKind, AuthCodeStatus, Provider, User};
use crate::integrations::mailer;
use crate::repositories::Update;
use axum::{
    Extension,
    extract::{Json, State},
    http::HeaderMap,
    response::Redirect,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

const RECOVERY_EMAIL_MESSAGE: &str =
    "If the email exists, you will receive a recovery email shortly.";

/// Only enabled password accounts can recover their password
async fn recoverable(state: &AppState, email: &str) -> Result<bool, AppError> {
    Ok(state
        .user
        .find_by_email(email)
        .await?
        .is_some_and(|u| u.provider == Provider::Dilemma && !u.disabled))
}

#[instrument(skip(state, body))]
pub async fn forgot_password(
    State(state): State<Arc<AppState>>,
    Json(body): Json<EmailDTO>,
) -> Result<Json<MessageDTO>, AppError> {
    let email = required(&body.email, "Email is required")?;

    if recoverable(&state, email).await? {
        send_code(
            &state,
            email,
            AuthCodeKind::Recovery,
            "Reset your password",
            mailer::recovery_body,
        )
        .await?;
        info!("Recovery code sent");
    }

    Ok(Json(MessageDTO::new(RECOVERY_EMAIL_MESSAGE)))
}

/// Checks a recovery code and keeps it aside for the password reset
#[instrument(skip(state, body))]
pub async fn check_code(
    State(state): State<Arc<AppState>>,
    Json(body): Json<EmailCodeDTO>,
) -> Result<Json<MessageDTO>, AppError> {
    let email = required(&body.email, "Email is required")?;
    let code = required(&body.code, "Code is required")?;
    if !recoverable(&state, email).await? {
        warn!("Code check for an account that can not recover its password");
        return Err(AppError::bad_request("Invalid code"));
    }

    let auth_code = state
        .auth_code
        .find_latest(email, code, AuthCodeKind::Recovery, AuthCodeStatus::Pending)
        .await?
        .ok_or_else(|| AppError::bad_request("Invalid code"))?;

    if auth_code.is_expired(Utc::now()) {
        state
            .auth_code
            .set_status(&auth_code.id, AuthCodeStatus::Expired, None)
            .await?;
        return Err(AppError::bad_request("Code expired"));
    }

    state
        .auth_code
        .set_status(&auth_code.id, AuthCodeStatus::Verified, None)
        .await?;
    Ok(Json(MessageDTO::new("Code is valid")))
}

#[instrument(skip(state, body))]
pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    Json(body): Json<PasswordResetDTO>,
) -> Result<Redirect, AppError> {
    // 1. email, password e confirm_password obbligatori e uguali
    // 2. serve un codice di recupero già verificato e non scaduto
    // 3. salvare il nuovo hash e consumare il codice
    // 4. redirect alla pagina di login del frontend
    let email = required(&body.email, "Email is required")?;
    let password = required(&body.password, "Password is required")?;
    let confirm_password = required(&body.confirm_password, "Confirm password is required")?;
    if password != confirm_password {
        return Err(AppError::bad_request("Passwords do not match"));
    }
    if password.len() < 6 {
        return Err(AppError::bad_request("Password must be at least 6 characters"));
    }

    let auth_code = state
        .auth_code
        .find_latest_for_email(email, AuthCodeKind::Recovery, AuthCodeStatus::Verified)
        .await?
        .ok_or_else(|| {
            warn!("Password reset without a verified code");
            AppError::bad_request("Invalid code")
        })?;
    let now = Utc::now();
    if auth_code.is_expired(now) {
        state
            .auth_code
            .set_status(&auth_code.id, AuthCodeStatus::Expired, None)
            .await?;
        return Err(AppError::bad_request("Code expired"));
    }

    let user = state
        .user
        .find_by_email(email)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    let hashed_password = User::hash_password(password, state.config.bcrypt_cost)?;
    state
        .user
        .update(
            &user.id,
            &UpdateUserDTO {
                hashed_password: Some(hashed_password),
                ..Default::default()
            },
        )
        .await?;
    state
        .auth_code
        .set_status(&auth_code.id, AuthCodeStatus::Used, Some(now))
        .await?;
    info!("Password reset for {}", user.uid);

    Ok(Redirect::temporary(&format!(
        "{}/login",
        state.config.frontend_url.trim_end_matches('/')
    )))
}

#[instrument(skip(state, current_user, body), fields(uid = %current_user.uid))]
pub async fn verify_email_update(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<EmailDTO>,
) -> Result<Json<MessageDTO>, AppError> {
    if current_user.provider != Provider::Dilemma {
        return Err(AppError::bad_request("Email can only be changed on password accounts"));
    }
    let email = required(&body.email, "Email is required")?;
    if current_user.email.as_deref() == Some(email) {
        return Err(AppError::bad_request("New email must be different"));
    }

    if state.user.find_by_email(email).await?.is_none() {
        send_code(
            &state,
            email,
            AuthCodeKind::Verify,
            "Confirm your new email",
            mailer::email_update_body,
        )
        .await?;
        info!("Email update code sent");
    } else {
        debug!("Requested email already in use");
    }

    Ok(Json(MessageDTO::new(GENERIC_EMAIL_MESSAGE)))
}

#[instrument(skip(state, current_user, body), fields(uid = %current_user.uid))]
pub async fn update_email(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<EmailCodeDTO>,
) -> Result<(HeaderMap, Json<UserRead>), AppError> {
    if current_user.provider != Provider::Dilemma {
        return Err(AppError::bad_request("Email can only be changed on password accounts"));
    }
    let email = required(&body.email, "Email is required")?;
    let code = required(&body.code, "Code is required")?;

    let auth_code = pending_code(&state, email, code, AuthCodeKind::Verify).await?;
    if state.user.find_by_email(email).await?.is_some() {
        return Err(AppError::conflict("Email already registered"));
    }
    consume_code(&state, &auth_code).await?;

    let user = state.user.set_email(&current_user.id, email).await?;
    info!("Email updated");

    // the subject of both tokens is the email, the old ones no longer resolve
    let access_token = token_for(&state, email, TokenKind::Access)?;
    let refresh_token = token_for(&state, email, TokenKind::Refresh)?;
    state
        .user
        .set_refresh_token(&user.id, Some(&refresh_token))
        .await?;

    let mut headers = HeaderMap::new();
    set_auth_cookies(&mut headers, &access_token, &refresh_token, Provider::Dilemma)?;

    Ok((headers, Json(UserRead::from(user))))
}
