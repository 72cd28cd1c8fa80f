//! AuthCodeRepository - one-time codes for verification and recovery

use super::{Create, Read};
use crate::dtos::CreateAuthCodeDTO;
use crate::entities::{AuthCode, AuthCodeKind, AuthCodeStatus};
use chrono::{DateTime, Utc};
use sqlx::{Error, SqlitePool};

const AUTH_CODE_COLUMNS: &str =
    "id, email, code, status, request_type, request_date, expire_date, usage_date";

pub struct AuthCodeRepository {
    connection_pool: SqlitePool,
}

impl AuthCodeRepository {
    pub fn new(connection_pool: SqlitePool) -> Self {
        Self { connection_pool }
    }

    /// Most recent code of the given kind and status issued to `email` with value `code`
    pub async fn find_latest(
        &self,
        email: &str,
        code: &str,
        kind: AuthCodeKind,
        status: AuthCodeStatus,
    ) -> Result<Option<AuthCode>, Error> {
        let auth_code = sqlx::query_as::<_, AuthCode>(&format!(
            "SELECT {AUTH_CODE_COLUMNS} FROM auth_codes \
             WHERE email = ? AND code = ? AND request_type = ? AND status = ? \
             ORDER BY id DESC LIMIT 1"
        ))
        .bind(email)
        .bind(code)
        .bind(kind)
        .bind(status)
        .fetch_optional(&self.connection_pool)
        .await?;

        Ok(auth_code)
    }

    /// Most recent code of the given kind and status for `email`, whatever its value
    pub async fn find_latest_for_email(
        &self,
        email: &str,
        kind: AuthCodeKind,
        status: AuthCodeStatus,
    ) -> Result<Option<AuthCode>, Error> {
        let auth_code = sqlx::query_as::<_, AuthCode>(&format!(
            "SELECT {AUTH_CODE_COLUMNS} FROM auth_codes \
             WHERE email = ? AND request_type = ? AND status = ? \
             ORDER BY id DESC LIMIT 1"
        ))
        .bind(email)
        .bind(kind)
        .bind(status)
        .fetch_optional(&self.connection_pool)
        .await?;

        Ok(auth_code)
    }

    pub async fn set_status(
        &self,
        id: &i64,
        status: AuthCodeStatus,
        usage_date: Option<DateTime<Utc>>,
    ) -> Result<(), Error> {
        sqlx::query("UPDATE auth_codes SET status = ?, usage_date = ? WHERE id = ?")
            .bind(status)
            .bind(usage_date)
            .bind(id)
            .execute(&self.connection_pool)
            .await?;

        Ok(())
    }

    /// Pending -> used. Returns `false` when the code was no longer pending.
    pub async fn consume(&self, id: &i64, usage_date: DateTime<Utc>) -> Result<bool, Error> {
        let result = sqlx::query(
            "UPDATE auth_codes SET status = ?, usage_date = ? WHERE id = ? AND status = ?",
        )
        .bind(AuthCodeStatus::Used)
        .bind(usage_date)
        .bind(id)
        .bind(AuthCodeStatus::Pending)
        .execute(&self.connection_pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

impl Create<AuthCode, CreateAuthCodeDTO> for AuthCodeRepository {
    async fn create(&self, data: &CreateAuthCodeDTO) -> Result<AuthCode, Error> {
        let now = Utc::now();
        let expire_date = now + data.request_type.lifetime();

        let auth_code = sqlx::query_as::<_, AuthCode>(&format!(
            "INSERT INTO auth_codes (email, code, status, request_type, request_date, expire_date) \
             VALUES (?, ?, ?, ?, ?, ?) RETURNING {AUTH_CODE_COLUMNS}"
        ))
        .bind(&data.email)
        .bind(AuthCode::generate_code())
        .bind(AuthCodeStatus::Pending)
        .bind(data.request_type)
        .bind(now)
        .bind(expire_date)
        .fetch_one(&self.connection_pool)
        .await?;

        Ok(auth_code)
    }
}

impl Read<AuthCode, i64> for AuthCodeRepository {
    async fn read(&self, id: &i64) -> Result<Option<AuthCode>, Error> {
        let auth_code = sqlx::query_as::<_, AuthCode>(&format!(
            "SELECT {AUTH_CODE_COLUMNS} FROM auth_codes WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await?;

        Ok(auth_code)
    }
}
