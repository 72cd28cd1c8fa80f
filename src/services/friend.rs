//! Friend services - friend requests and friendships
//!
//! Every action names the other user by username; requests and friendships
//! reference users by uid.

use crate::core::{AppError, AppState};
use crate::dtos::{FriendRead, FriendRequestRead, FriendUsernameDTO};
use crate::entities::{FriendRequest, FriendRequestStatus, User};
use crate::repositories::{Create, CreateFriendRequestDTO, Delete};
use axum::{
    Extension,
    extract::{Json, State},
};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// The user named in the body; 400 when it is the caller or missing, 404 when unknown
async fn other_user(
    state: &AppState,
    current_user: &User,
    body: &FriendUsernameDTO,
) -> Result<User, AppError> {
    let username = body
        .username
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| AppError::bad_request("Username is required"))?;

    if current_user.username.as_deref() == Some(username) {
        return Err(AppError::bad_request("You can not befriend yourself"));
    }

    state
        .user
        .find_by_username(username)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))
}

fn request_read(other: &User, request: FriendRequest) -> FriendRequestRead {
    FriendRequestRead {
        uid: other.uid.clone(),
        username: other.username.clone(),
        profile_picture: other.profile_picture.clone(),
        join_date: other.join_date,
        request_date: request.request_date,
        status: request.status,
    }
}

#[instrument(skip(state, current_user, body), fields(uid = %current_user.uid))]
pub async fn send_request(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<FriendUsernameDTO>,
) -> Result<Json<FriendRequestRead>, AppError> {
    // 1. trovare l'altro utente (400 se sé stesso, 404 se non esiste)
    // 2. 409 se già amici o se esiste una richiesta pendente in una delle due direzioni
    // 3. creare la richiesta pendente
    let other = other_user(&state, &current_user, &body).await?;

    if state.friend.find_between(&current_user.uid, &other.uid).await?.is_some() {
        return Err(AppError::conflict("Already friends"));
    }
    if state
        .friend_request
        .find_pending(&current_user.uid, &other.uid)
        .await?
        .is_some()
        || state
            .friend_request
            .find_pending(&other.uid, &current_user.uid)
            .await?
            .is_some()
    {
        warn!("Pending request already exists with {}", other.uid);
        return Err(AppError::conflict("Friend request already pending"));
    }

    // a concurrent request for the same pair trips the unique index
    let request = state
        .friend_request
        .create(&CreateFriendRequestDTO {
            sender_uid: current_user.uid.clone(),
            receiver_uid: other.uid.clone(),
        })
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::conflict("Friend request already pending")
            }
            other => AppError::from(other),
        })?;
    info!("Friend request sent to {}", other.uid);

    Ok(Json(request_read(&other, request)))
}

#[instrument(skip(state, current_user, body), fields(uid = %current_user.uid))]
pub async fn revert_request(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<FriendUsernameDTO>,
) -> Result<Json<FriendRequestRead>, AppError> {
    let other = other_user(&state, &current_user, &body).await?;

    let pending = state
        .friend_request
        .find_pending(&current_user.uid, &other.uid)
        .await?
        .ok_or_else(|| AppError::not_found("Friend request not found"))?;
    let request = state
        .friend_request
        .update_status(&pending.id, FriendRequestStatus::Reverted)
        .await?;
    info!("Friend request to {} reverted", other.uid);

    Ok(Json(request_read(&other, request)))
}

#[instrument(skip(state, current_user, body), fields(uid = %current_user.uid))]
pub async fn accept_request(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<FriendUsernameDTO>,
) -> Result<Json<FriendRead>, AppError> {
    let other = other_user(&state, &current_user, &body).await?;

    let pending = state
        .friend_request
        .find_pending(&other.uid, &current_user.uid)
        .await?
        .ok_or_else(|| AppError::not_found("Friend request not found"))?;
    let friend = state.friend_request.accept(&pending).await.map_err(|e| match e {
        sqlx::Error::RowNotFound => AppError::not_found("Friend request not found"),
        other => AppError::from(other),
    })?;
    info!("Friend request from {} accepted", other.uid);

    Ok(Json(FriendRead {
        uid: other.uid,
        username: other.username,
        profile_picture: other.profile_picture,
        join_date: other.join_date,
        friendship_date: friend.friendship_date,
        status: friend.status,
    }))
}

#[instrument(skip(state, current_user, body), fields(uid = %current_user.uid))]
pub async fn decline_request(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<FriendUsernameDTO>,
) -> Result<Json<FriendRequestRead>, AppError> {
    let other = other_user(&state, &current_user, &body).await?;

    let pending = state
        .friend_request
        .find_pending(&other.uid, &current_user.uid)
        .await?
        .ok_or_else(|| AppError::not_found("Friend request not found"))?;
    let request = state
        .friend_request
        .update_status(&pending.id, FriendRequestStatus::Declined)
        .await?;
    info!("Friend request from {} declined", other.uid);

    Ok(Json(request_read(&other, request)))
}

#[instrument(skip(state, current_user, body), fields(uid = %current_user.uid))]
pub async fn delete_friend(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<FriendUsernameDTO>,
) -> Result<Json<FriendRead>, AppError> {
    let other = other_user(&state, &current_user, &body).await?;

    let friend = state
        .friend
        .find_between(&current_user.uid, &other.uid)
        .await?
        .ok_or_else(|| AppError::not_found("Friend not found"))?;
    state.friend.delete(&friend.id).await?;
    info!("Friendship with {} removed", other.uid);

    Ok(Json(FriendRead {
        uid: other.uid,
        username: other.username,
        profile_picture: other.profile_picture,
        join_date: other.join_date,
        friendship_date: friend.friendship_date,
        status: friend.status,
    }))
}

#[instrument(skip(state, current_user), fields(uid = %current_user.uid))]
pub async fn sent_requests(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
) -> Result<Json<Vec<FriendRequestRead>>, AppError> {
    Ok(Json(state.friend_request.list_sent(&current_user.uid).await?))
}

#[instrument(skip(state, current_user), fields(uid = %current_user.uid))]
pub async fn incoming_requests(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
) -> Result<Json<Vec<FriendRequestRead>>, AppError> {
    Ok(Json(state.friend_request.list_incoming(&current_user.uid).await?))
}

#[instrument(skip(state, current_user), fields(uid = %current_user.uid))]
pub async fn list_friends(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
) -> Result<Json<Vec<FriendRead>>, AppError> {
    Ok(Json(state.friend.list_for(&current_user.uid).await?))
}
