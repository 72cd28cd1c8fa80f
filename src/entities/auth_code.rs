//! AuthCode entity - one-time codes mailed for email verification and recovery

use super::enums::{AuthCodeKind, AuthCodeStatus};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct AuthCode {
    pub id: i64,
    pub email: String,
    pub code: String,
    pub status: AuthCodeStatus,
    pub request_type: AuthCodeKind,
    pub request_date: DateTime<Utc>,
    pub expire_date: DateTime<Utc>,
    pub usage_date: Option<DateTime<Utc>>,
}

impl AuthCode {
    /// Six lowercase hex characters taken from a fresh v4 UUID
    pub fn generate_code() -> String {
        Uuid::new_v4().simple().to_string()[..6].to_string()
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expire_date
    }
}

impl AuthCodeKind {
    /// How long a freshly issued code of this kind stays valid
    pub fn lifetime(&self) -> Duration {
        match self {
            AuthCodeKind::Verify => Duration::minutes(10),
            AuthCodeKind::Recovery => Duration::minutes(10),
        }
    }
}
