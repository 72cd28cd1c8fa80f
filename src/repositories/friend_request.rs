//! FriendRequestRepository - pending and answered friend requests

use super::{Create, Read};
use crate::dtos::FriendRequestRead;
use crate::entities::{Friend, FriendRequest, FriendRequestStatus, FriendStatus};
use chrono::Utc;
use sqlx::{Error, SqlitePool};

const FRIEND_REQUEST_COLUMNS: &str = "id, user_uid, friend_uid, request_date, status";

/// DTO to create a new request; it always starts as pending
#[derive(Debug, Clone)]
pub struct CreateFriendRequestDTO {
    pub sender_uid: String,
    pub receiver_uid: String,
}

pub struct FriendRequestRepository {
    connection_pool: SqlitePool,
}

impl FriendRequestRepository {
    pub fn new(connection_pool: SqlitePool) -> Self {
        Self { connection_pool }
    }

    /// Pending request sent by `sender_uid` to `receiver_uid` (one direction only)
    pub async fn find_pending(
        &self,
        sender_uid: &str,
        receiver_uid: &str,
    ) -> Result<Option<FriendRequest>, Error> {
        let request = sqlx::query_as::<_, FriendRequest>(&format!(
            "SELECT {FRIEND_REQUEST_COLUMNS} FROM friend_requests \
             WHERE user_uid = ? AND friend_uid = ? AND status = 'pending' \
             ORDER BY id DESC LIMIT 1"
        ))
        .bind(sender_uid)
        .bind(receiver_uid)
        .fetch_optional(&self.connection_pool)
        .await?;

        Ok(request)
    }

    pub async fn update_status(
        &self,
        id: &i64,
        status: FriendRequestStatus,
    ) -> Result<FriendRequest, Error> {
        sqlx::query("UPDATE friend_requests SET status = ? WHERE id = ?")
            .bind(status)
            .bind(id)
            .execute(&self.connection_pool)
            .await?;

        self.read(id).await?.ok_or(Error::RowNotFound)
    }

    /// Marks a pending request accepted and records the friendship, in one
    /// transaction. `RowNotFound` when the request is no longer pending.
    pub async fn accept(&self, request: &FriendRequest) -> Result<Friend, Error> {
        let mut tx = self.connection_pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE friend_requests SET status = ? WHERE id = ? AND status = ?",
        )
        .bind(FriendRequestStatus::Accepted)
        .bind(request.id)
        .bind(FriendRequestStatus::Pending)
        .execute(&mut *tx)
        .await?;
        if updated.rows_affected() == 0 {
            return Err(Error::RowNotFound);
        }

        let friend = sqlx::query_as::<_, Friend>(
            "INSERT INTO friends (user_uid, friend_uid, friendship_date, status) \
             VALUES (?, ?, ?, ?) \
             RETURNING id, user_uid, friend_uid, friendship_date, status",
        )
        .bind(&request.user_uid)
        .bind(&request.friend_uid)
        .bind(Utc::now())
        .bind(FriendStatus::Confirmed)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(friend)
    }

    /// Pending requests sent by `uid`, each described by its receiver
    pub async fn list_sent(&self, uid: &str) -> Result<Vec<FriendRequestRead>, Error> {
        let requests = sqlx::query_as::<_, FriendRequestRead>(
            "SELECT u.uid, u.username, u.profile_picture, u.join_date, r.request_date, r.status \
             FROM friend_requests r JOIN users u ON u.uid = r.friend_uid \
             WHERE r.user_uid = ? AND r.status = 'pending' \
             ORDER BY r.request_date DESC",
        )
        .bind(uid)
        .fetch_all(&self.connection_pool)
        .await?;

        Ok(requests)
    }

    /// Pending requests received by `uid`, each described by its sender
    pub async fn list_incoming(&self, uid: &str) -> Result<Vec<FriendRequestRead>, Error> {
        let requests = sqlx::query_as::<_, FriendRequestRead>(
            "SELECT u.uid, u.username, u.profile_picture, u.join_date, r.request_date, r.status \
             FROM friend_requests r JOIN users u ON u.uid = r.user_uid \
             WHERE r.friend_uid = ? AND r.status = 'pending' \
             ORDER BY r.request_date DESC",
        )
        .bind(uid)
        .fetch_all(&self.connection_pool)
        .await?;

        Ok(requests)
    }
}

impl Create<FriendRequest, CreateFriendRequestDTO> for FriendRequestRepository {
    async fn create(&self, data: &CreateFriendRequestDTO) -> Result<FriendRequest, Error> {
        let request = sqlx::query_as::<_, FriendRequest>(&format!(
            "INSERT INTO friend_requests (user_uid, friend_uid, request_date, status) \
             VALUES (?, ?, ?, ?) RETURNING {FRIEND_REQUEST_COLUMNS}"
        ))
        .bind(&data.sender_uid)
        .bind(&data.receiver_uid)
        .bind(Utc::now())
        .bind(FriendRequestStatus::Pending)
        .fetch_one(&self.connection_pool)
        .await?;

        Ok(request)
    }
}

impl Read<FriendRequest, i64> for FriendRequestRepository {
    async fn read(&self, id: &i64) -> Result<Option<FriendRequest>, Error> {
        let request = sqlx::query_as::<_, FriendRequest>(&format!(
            "SELECT {FRIEND_REQUEST_COLUMNS} FROM friend_requests WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await?;

        Ok(request)
    }
}
