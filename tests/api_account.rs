//! Integration tests per gli endpoints dell'account
//!
//! Test per:
//! - POST /account/password/forgot
//! - POST /account/code/verify
//! - POST /account/password/reset
//! - POST /account/email/verify-update
//! - POST /account/email/update

mod common;

#[cfg(test)]
mod account_tests {
    use super::common::*;
    use axum::http::StatusCode;
    use serde_json::{Value, json};
    use sqlx::SqlitePool;

    async fn code_count(pool: &SqlitePool, email: &str) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM auth_codes WHERE email = ?")
            .bind(email)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    // ============================================================
    // Recupero password
    // ============================================================

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_forgot_password_only_for_password_accounts(
        pool: SqlitePool,
    ) -> sqlx::Result<()> {
        let state = create_test_state(pool.clone());
        let server = create_test_server(state);

        // erin: dilemma attivo, carol: google, dave: disabilitato
        for email in ["erin@example.com", "carol@gmail.com", "dave@example.com", "ghost@example.com"] {
            let response = server
                .post("/account/password/forgot")
                .json(&json!({ "email": email }))
                .await;
            response.assert_status_ok();
            response.assert_json(&json!({
                "message": "If the email exists, you will receive a recovery email shortly."
            }));
        }

        assert_eq!(code_count(&pool, "erin@example.com").await, 1);
        assert_eq!(code_count(&pool, "carol@gmail.com").await, 0);
        assert_eq!(code_count(&pool, "dave@example.com").await, 0);
        assert_eq!(code_count(&pool, "ghost@example.com").await, 0);
        Ok(())
    }

    #[sqlx::test]
    async fn test_password_recovery_flow(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool.clone());
        seed_user(&state, "alice@example.com", "alice").await;
        let server = create_test_server(state);

        server
            .post("/account/password/forgot")
            .json(&json!({ "email": "alice@example.com" }))
            .await
            .assert_status_ok();
        let code = latest_code(&pool, "alice@example.com").await;

        let checked = server
            .post("/account/code/verify")
            .json(&json!({ "email": "alice@example.com", "code": code }))
            .await;
        checked.assert_status_ok();
        checked.assert_json(&json!({ "message": "Code is valid" }));

        let reset = server
            .post("/account/password/reset")
            .json(&json!({
                "email": "alice@example.com",
                "password": "brand-new",
                "confirm_password": "brand-new"
            }))
            .await;
        reset.assert_status(StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(reset.header("location"), "http://localhost:3000/login");

        // la vecchia password non vale più, la nuova sì
        server
            .post("/auth/login")
            .json(&json!({ "email": "alice@example.com", "password": PASSWORD }))
            .await
            .assert_status_unauthorized();
        server
            .post("/auth/login")
            .json(&json!({ "email": "alice@example.com", "password": "brand-new" }))
            .await
            .assert_status_ok();

        // il codice è stato consumato
        server
            .post("/account/password/reset")
            .json(&json!({
                "email": "alice@example.com",
                "password": "another-one",
                "confirm_password": "another-one"
            }))
            .await
            .assert_status_bad_request();
        Ok(())
    }

    #[sqlx::test]
    async fn test_reset_requires_a_verified_code(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool.clone());
        seed_user(&state, "alice@example.com", "alice").await;
        let server = create_test_server(state);

        // codice emesso ma mai verificato
        server
            .post("/account/password/forgot")
            .json(&json!({ "email": "alice@example.com" }))
            .await
            .assert_status_ok();

        let response = server
            .post("/account/password/reset")
            .json(&json!({
                "email": "alice@example.com",
                "password": "brand-new",
                "confirm_password": "brand-new"
            }))
            .await;

        response.assert_status_bad_request();
        assert_eq!(response.json::<Value>()["detail"], "Invalid code");
        Ok(())
    }

    #[sqlx::test]
    async fn test_reset_validates_passwords(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);

        let mismatch = server
            .post("/account/password/reset")
            .json(&json!({
                "email": "alice@example.com",
                "password": "brand-new",
                "confirm_password": "brand-old"
            }))
            .await;
        mismatch.assert_status_bad_request();
        assert_eq!(mismatch.json::<Value>()["detail"], "Passwords do not match");

        let short = server
            .post("/account/password/reset")
            .json(&json!({
                "email": "alice@example.com",
                "password": "abc",
                "confirm_password": "abc"
            }))
            .await;
        short.assert_status_bad_request();
        Ok(())
    }

    #[sqlx::test]
    async fn test_check_code_rejects_unknown_code(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);

        let response = server
            .post("/account/code/verify")
            .json(&json!({ "email": "alice@example.com", "code": "123456" }))
            .await;

        response.assert_status_bad_request();
        assert_eq!(response.json::<Value>()["detail"], "Invalid code");
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_check_code_only_for_password_accounts(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool.clone());
        let server = create_test_server(state);

        // codice di recupero valido, ma l'account è stato disabilitato
        sqlx::query(
            "INSERT INTO auth_codes (email, code, status, request_type, request_date, expire_date) \
             VALUES ('dave@example.com', 'abc123', 'pending', 'recovery', '2024-01-01T10:00:00Z', '2999-01-01T00:00:00Z')",
        )
        .execute(&pool)
        .await?;

        let response = server
            .post("/account/code/verify")
            .json(&json!({ "email": "dave@example.com", "code": "abc123" }))
            .await;

        response.assert_status_bad_request();
        assert_eq!(response.json::<Value>()["detail"], "Invalid code");
        let status: String = sqlx::query_scalar("SELECT status FROM auth_codes WHERE code = 'abc123'")
            .fetch_one(&pool)
            .await?;
        assert_eq!(status, "pending");
        Ok(())
    }

    // ============================================================
    // Cambio email
    // ============================================================

    #[sqlx::test]
    async fn test_email_update_requires_authentication(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);

        let response = server
            .post("/account/email/verify-update")
            .json(&json!({ "email": "new@example.com" }))
            .await;

        response.assert_status_unauthorized();
        assert_eq!(response.json::<Value>()["detail"], "Not authenticated");
        Ok(())
    }

    #[sqlx::test]
    async fn test_email_update_flow(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool.clone());
        seed_user(&state, "alice@example.com", "alice").await;
        let server = create_test_server(state.clone());
        let (name, value) = session_for(&state, "alice@example.com");

        // stessa email: rifiutata
        server
            .post("/account/email/verify-update")
            .add_header(name.clone(), value.clone())
            .json(&json!({ "email": "alice@example.com" }))
            .await
            .assert_status_bad_request();

        server
            .post("/account/email/verify-update")
            .add_header(name.clone(), value.clone())
            .json(&json!({ "email": "alice@new.example.com" }))
            .await
            .assert_status_ok();
        let code = latest_code(&pool, "alice@new.example.com").await;

        let response = server
            .post("/account/email/update")
            .add_header(name.clone(), value.clone())
            .json(&json!({ "email": "alice@new.example.com", "code": code }))
            .await;

        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["email"], "alice@new.example.com");
        let access = cookie_value(&response, "access_token").expect("new access cookie");
        let refresh = cookie_value(&response, "refresh_token").expect("new refresh cookie");

        let stored = state.user.find_by_email("alice@new.example.com").await?.unwrap();
        assert_eq!(stored.refresh_token.as_deref(), Some(refresh.as_str()));

        // il vecchio token punta ancora alla vecchia email
        server
            .get("/user/profile")
            .add_header(name, value)
            .await
            .assert_status_unauthorized();

        let (name, value) = cookies(&[("access_token", &access)]);
        server
            .get("/user/profile")
            .add_header(name, value)
            .await
            .assert_status_ok();
        Ok(())
    }

    #[sqlx::test]
    async fn test_email_update_conflict(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool.clone());
        seed_user(&state, "alice@example.com", "alice").await;
        let server = create_test_server(state.clone());
        let (name, value) = session_for(&state, "alice@example.com");

        server
            .post("/account/email/verify-update")
            .add_header(name.clone(), value.clone())
            .json(&json!({ "email": "bob@example.com" }))
            .await
            .assert_status_ok();
        let code = latest_code(&pool, "bob@example.com").await;

        // bob si registra prima che alice confermi
        seed_user(&state, "bob@example.com", "bob").await;

        let response = server
            .post("/account/email/update")
            .add_header(name, value)
            .json(&json!({ "email": "bob@example.com", "code": code }))
            .await;

        response.assert_status(StatusCode::CONFLICT);

        // il codice non è stato consumato dal tentativo fallito
        let pending: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM auth_codes WHERE email = ? AND code = ? AND status = 'pending'",
        )
        .bind("bob@example.com")
        .bind(&code)
        .fetch_one(&pool)
        .await?;
        assert_eq!(pending, 1);
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_email_update_not_for_google_accounts(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state.clone());
        let (name, value) = session_for(&state, "carol@gmail.com");

        let response = server
            .post("/account/email/verify-update")
            .add_header(name, value)
            .json(&json!({ "email": "carol@example.com" }))
            .await;

        response.assert_status_bad_request();
        Ok(())
    }
}
