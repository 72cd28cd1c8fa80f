//! Friend and FriendRequest entities - links between two users by uid

use super::enums::{FriendRequestStatus, FriendStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct FriendRequest {
    pub id: i64,
    pub user_uid: String,   // sender
    pub friend_uid: String, // receiver
    pub request_date: DateTime<Utc>,
    pub status: FriendRequestStatus,
}

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Friend {
    pub id: i64,
    pub user_uid: String,
    pub friend_uid: String,
    pub friendship_date: DateTime<Utc>,
    pub status: FriendStatus,
}

