//! User entity with password helpers

use super::enums::Provider;
use bcrypt::{hash, verify};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    /// Public identifier, never the numeric id
    pub uid: String,
    pub join_date: DateTime<Utc>,
    pub provider: Provider,
    pub profile_picture: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
    pub fullname: Option<String>,
    pub disabled: bool,
    pub account_view: Option<String>,
    pub is_sidebar_open: Option<bool>,
    pub hashed_password: Option<String>,
    pub refresh_token: Option<String>,
}

impl User {
    /// Verify if target_password matches the stored hashed password.
    /// Accounts without a password (Google) never match.
    pub fn verify_password(&self, target_password: &str) -> bool {
        match &self.hashed_password {
            Some(hashed) => verify(target_password, hashed).unwrap_or(false),
            None => false,
        }
    }

    /// Hash a password using bcrypt with the given cost
    pub fn hash_password(password: &str, cost: u32) -> Result<String, bcrypt::BcryptError> {
        let hash = hash(password, cost)?;
        Ok(hash)
    }
}
