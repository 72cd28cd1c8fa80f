//! FriendRepository - confirmed friendships, one row per unordered pair

use super::Delete;
use crate::dtos::FriendRead;
use crate::entities::Friend;
use sqlx::{Error, SqlitePool};

const FRIEND_COLUMNS: &str = "id, user_uid, friend_uid, friendship_date, status";

pub struct FriendRepository {
    connection_pool: SqlitePool,
}

impl FriendRepository {
    pub fn new(connection_pool: SqlitePool) -> Self {
        Self { connection_pool }
    }

    /// Friendship between the two users, whichever of them is stored first
    pub async fn find_between(&self, uid_a: &str, uid_b: &str) -> Result<Option<Friend>, Error> {
        let friend = sqlx::query_as::<_, Friend>(&format!(
            "SELECT {FRIEND_COLUMNS} FROM friends \
             WHERE (user_uid = ? AND friend_uid = ?) OR (user_uid = ? AND friend_uid = ?) \
             LIMIT 1"
        ))
        .bind(uid_a)
        .bind(uid_b)
        .bind(uid_b)
        .bind(uid_a)
        .fetch_optional(&self.connection_pool)
        .await?;

        Ok(friend)
    }

    /// Friends of `uid`, each described by the other side of the link
    pub async fn list_for(&self, uid: &str) -> Result<Vec<FriendRead>, Error> {
        let friends = sqlx::query_as::<_, FriendRead>(
            "SELECT u.uid, u.username, u.profile_picture, u.join_date, f.friendship_date, f.status \
             FROM friends f \
             JOIN users u ON u.uid = CASE WHEN f.user_uid = ?1 THEN f.friend_uid ELSE f.user_uid END \
             WHERE f.user_uid = ?1 OR f.friend_uid = ?1 \
             ORDER BY f.friendship_date DESC",
        )
        .bind(uid)
        .fetch_all(&self.connection_pool)
        .await?;

        Ok(friends)
    }
}

impl Delete<i64> for FriendRepository {
    async fn delete(&self, id: &i64) -> Result<(), Error> {
        sqlx::query("DELETE FROM friends WHERE id = ?")
            .bind(id)
            .execute(&self.connection_pool)
            .await?;

        Ok(())
    }
}
