//! Friend DTOs - Data Transfer Objects for friends and friend requests

use crate::entities::{FriendRequestStatus, FriendStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of every friend action: the other user, by username
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct FriendUsernameDTO {
    #[serde(default)]
    pub username: Option<String>,
}

/// A friend request seen from the caller: `uid`/`username` are the other user
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct FriendRequestRead {
    pub uid: String,
    pub username: Option<String>,
    pub profile_picture: Option<String>,
    pub join_date: DateTime<Utc>,
    pub request_date: DateTime<Utc>,
    pub status: FriendRequestStatus,
}

/// A friendship seen from the caller: `uid`/`username` are the friend
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct FriendRead {
    pub uid: String,
    pub username: Option<String>,
    pub profile_picture: Option<String>,
    pub join_date: DateTime<Utc>,
    pub friendship_date: DateTime<Utc>,
    pub status: FriendStatus,
}
