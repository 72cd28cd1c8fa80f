//! UserRepository - persistence of users

use super::{Create, Delete, Read, Update};
use crate::dtos::{CreateUserDTO, UpdateUserDTO};
use crate::entities::User;
use chrono::Utc;
use sqlx::{Error, QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

const USER_COLUMNS: &str = "id, uid, join_date, provider, profile_picture, email, username, \
     fullname, disabled, account_view, is_sidebar_open, hashed_password, refresh_token";

pub struct UserRepository {
    connection_pool: SqlitePool,
}

impl UserRepository {
    pub fn new(connection_pool: SqlitePool) -> UserRepository {
        Self { connection_pool }
    }

    /// Email and username are unique, so both lookups return at most one user
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ?"
        ))
        .bind(email)
        .fetch_optional(&self.connection_pool)
        .await?;

        Ok(user)
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = ?"
        ))
        .bind(username)
        .fetch_optional(&self.connection_pool)
        .await?;

        Ok(user)
    }

    /// Search users whose username starts with `prefix`, skipping `exclude_uid`.
    /// LIKE wildcards in the prefix are matched literally.
    pub async fn search_by_username_prefix(
        &self,
        prefix: &str,
        exclude_uid: &str,
    ) -> Result<Vec<User>, Error> {
        let escaped = prefix
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        let pattern = format!("{}%", escaped);
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE username LIKE ? ESCAPE '\\' AND uid <> ? AND disabled = 0 \
             ORDER BY username LIMIT 10"
        ))
        .bind(pattern)
        .bind(exclude_uid)
        .fetch_all(&self.connection_pool)
        .await?;

        Ok(users)
    }

    pub async fn find_by_refresh_token(&self, token: &str) -> Result<Option<User>, Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE refresh_token = ?"
        ))
        .bind(token)
        .fetch_optional(&self.connection_pool)
        .await?;

        Ok(user)
    }

    /// Stores (or clears with `None`) the refresh token of a user
    pub async fn set_refresh_token(&self, id: &i64, token: Option<&str>) -> Result<(), Error> {
        sqlx::query("UPDATE users SET refresh_token = ? WHERE id = ?")
            .bind(token)
            .bind(id)
            .execute(&self.connection_pool)
            .await?;

        Ok(())
    }

    pub async fn set_email(&self, id: &i64, email: &str) -> Result<User, Error> {
        sqlx::query("UPDATE users SET email = ? WHERE id = ?")
            .bind(email)
            .bind(id)
            .execute(&self.connection_pool)
            .await?;

        self.read(id).await?.ok_or(Error::RowNotFound)
    }
}

impl Create<User, CreateUserDTO> for UserRepository {
    async fn create(&self, data: &CreateUserDTO) -> Result<User, Error> {
        let uid = Uuid::new_v4().to_string();
        let now = Utc::now();

        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (uid, join_date, provider, profile_picture, email, username, \
             fullname, hashed_password, refresh_token) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING {USER_COLUMNS}"
        ))
        .bind(&uid)
        .bind(now)
        .bind(data.provider)
        .bind(&data.profile_picture)
        .bind(&data.email)
        .bind(&data.username)
        .bind(&data.fullname)
        .bind(&data.hashed_password)
        .bind(&data.refresh_token)
        .fetch_one(&self.connection_pool)
        .await?;

        Ok(user)
    }
}

impl Read<User, i64> for UserRepository {
    async fn read(&self, id: &i64) -> Result<Option<User>, Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await?;

        Ok(user)
    }
}

impl Update<User, UpdateUserDTO, i64> for UserRepository {
    async fn update(&self, id: &i64, data: &UpdateUserDTO) -> Result<User, Error> {
        // First, get the current user to ensure it exists
        let current_user = self.read(id).await?.ok_or(Error::RowNotFound)?;

        if data.is_empty() {
            return Ok(current_user);
        }

        let mut query_builder = QueryBuilder::<Sqlite>::new("UPDATE users SET ");
        let mut separated = query_builder.separated(", ");
        if let Some(ref username) = data.username {
            separated.push("username = ");
            separated.push_bind_unseparated(username);
        }
        if let Some(ref fullname) = data.fullname {
            separated.push("fullname = ");
            separated.push_bind_unseparated(fullname);
        }
        if let Some(ref profile_picture) = data.profile_picture {
            separated.push("profile_picture = ");
            separated.push_bind_unseparated(profile_picture);
        }
        if let Some(ref account_view) = data.account_view {
            separated.push("account_view = ");
            separated.push_bind_unseparated(account_view);
        }
        if let Some(is_sidebar_open) = data.is_sidebar_open {
            separated.push("is_sidebar_open = ");
            separated.push_bind_unseparated(is_sidebar_open);
        }
        if let Some(ref hashed_password) = data.hashed_password {
            separated.push("hashed_password = ");
            separated.push_bind_unseparated(hashed_password);
        }

        query_builder.push(" WHERE id = ");
        query_builder.push_bind(id);

        query_builder.build().execute(&self.connection_pool).await?;

        self.read(id).await?.ok_or(Error::RowNotFound)
    }
}

impl Delete<i64> for UserRepository {
    /// Hard delete; friend rows and friend requests go with it (ON DELETE CASCADE)
    async fn delete(&self, id: &i64) -> Result<(), Error> {
        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.connection_pool)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Provider;

    fn new_user(email: &str, username: &str) -> CreateUserDTO {
        CreateUserDTO {
            provider: Provider::Dilemma,
            email: Some(email.to_string()),
            username: Some(username.to_string()),
            fullname: None,
            profile_picture: None,
            hashed_password: None,
            refresh_token: None,
        }
    }

    #[sqlx::test]
    async fn create_then_find_by_email(pool: SqlitePool) -> sqlx::Result<()> {
        let repo = UserRepository::new(pool);
        let created = repo.create(&new_user("alice@example.com", "alice")).await?;

        let found = repo.find_by_email("alice@example.com").await?.unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.uid, created.uid);
        assert_eq!(found.account_view.as_deref(), Some("profile"));
        assert_eq!(found.is_sidebar_open, Some(true));
        assert!(!found.disabled);
        Ok(())
    }

    #[sqlx::test]
    async fn duplicate_email_is_rejected(pool: SqlitePool) -> sqlx::Result<()> {
        let repo = UserRepository::new(pool);
        repo.create(&new_user("alice@example.com", "alice")).await?;

        let err = repo
            .create(&new_user("alice@example.com", "alice2"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Database(ref db) if db.is_unique_violation()));
        Ok(())
    }

    #[sqlx::test]
    async fn prefix_search_escapes_wildcards(pool: SqlitePool) -> sqlx::Result<()> {
        let repo = UserRepository::new(pool);
        let me = repo.create(&new_user("me@example.com", "me")).await?;
        repo.create(&new_user("a@example.com", "ann")).await?;
        repo.create(&new_user("b@example.com", "anna")).await?;
        repo.create(&new_user("c@example.com", "bob")).await?;

        let found = repo.search_by_username_prefix("ann", &me.uid).await?;
        let names: Vec<_> = found.iter().filter_map(|u| u.username.clone()).collect();
        assert_eq!(names, vec!["ann".to_string(), "anna".to_string()]);

        assert!(repo.search_by_username_prefix("%", &me.uid).await?.is_empty());
        Ok(())
    }

    #[sqlx::test]
    async fn partial_update_keeps_other_columns(pool: SqlitePool) -> sqlx::Result<()> {
        let repo = UserRepository::new(pool);
        let created = repo.create(&new_user("alice@example.com", "alice")).await?;

        let updated = repo
            .update(
                &created.id,
                &UpdateUserDTO {
                    fullname: Some("Alice Liddell".to_string()),
                    is_sidebar_open: Some(false),
                    ..Default::default()
                },
            )
            .await?;

        assert_eq!(updated.fullname.as_deref(), Some("Alice Liddell"));
        assert_eq!(updated.is_sidebar_open, Some(false));
        assert_eq!(updated.username.as_deref(), Some("alice"));
        Ok(())
    }
}
