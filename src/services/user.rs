//! User services - profile of the current user and user search

use crate::core::auth::delete_auth_cookies;
use crate::core::{AppError, AppState};
use crate::dtos::{UpdateProfileDTO, UpdateUserDTO, UserRead, UserSearchQuery};
use crate::entities::User;
use crate::repositories::{Delete, Update};
use axum::{
    Extension,
    extract::{Json, Query, State},
    http::HeaderMap,
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

#[instrument(skip(current_user), fields(uid = %current_user.uid))]
pub async fn get_profile(Extension(current_user): Extension<User>) -> Json<UserRead> {
    Json(UserRead::from(current_user))
}

#[instrument(skip(state, current_user, body), fields(uid = %current_user.uid))]
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<UpdateProfileDTO>,
) -> Result<Json<UserRead>, AppError> {
    // 1. l'email si cambia solo tramite /account/email
    // 2. validare username e password
    // 3. la password deve coincidere con confirm_password e viene salvata hashata
    // 4. lo username deve restare unico
    if body.email.is_some() {
        return Err(AppError::bad_request("Email can not be updated here"));
    }
    body.validate()?;

    let hashed_password = match body.password.as_deref() {
        Some(password) => {
            if body.confirm_password.as_deref() != Some(password) {
                return Err(AppError::bad_request("Passwords do not match"));
            }
            Some(User::hash_password(password, state.config.bcrypt_cost)?)
        }
        None => None,
    };

    if let Some(username) = body.username.as_deref() {
        if let Some(other) = state.user.find_by_username(username).await? {
            if other.id != current_user.id {
                warn!("Username already taken: {}", username);
                return Err(AppError::conflict("Username already taken"));
            }
        }
    }

    let user = state
        .user
        .update(
            &current_user.id,
            &UpdateUserDTO {
                username: body.username,
                fullname: body.fullname,
                profile_picture: body.profile_picture,
                account_view: body.account_view,
                is_sidebar_open: body.is_sidebar_open,
                hashed_password,
            },
        )
        .await?;
    info!("Profile updated");

    Ok(Json(UserRead::from(user)))
}

#[instrument(skip(state, current_user), fields(uid = %current_user.uid))]
pub async fn delete_profile(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
) -> Result<(HeaderMap, Json<UserRead>), AppError> {
    info!("User account deletion initiated");
    state.user.delete(&current_user.id).await?;

    let mut headers = HeaderMap::new();
    delete_auth_cookies(&mut headers)?;
    info!("User account deleted");

    Ok((headers, Json(UserRead::from(current_user))))
}

#[instrument(skip(state, current_user), fields(search = %params.search))]
pub async fn search_users(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Query(params): Query<UserSearchQuery>, // /user/search?search=prefix
) -> Result<Json<Vec<UserRead>>, AppError> {
    debug!("Searching users by username prefix");
    let search = params.search.trim();
    if search.is_empty() {
        return Ok(Json(Vec::new()));
    }

    let users = state
        .user
        .search_by_username_prefix(search, &current_user.uid)
        .await?;
    info!("Found {} users matching search criteria", users.len());

    Ok(Json(users.into_iter().map(UserRead::from).collect()))
}
