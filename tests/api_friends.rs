//! Integration tests per gli endpoints delle amicizie
//!
//! Test per:
//! - POST /friends/send-request, /revert-request, /accept-request, /decline-request, /delete
//! - GET /friends/requests/sent, /friends/requests/incoming
//! - GET /friends/

mod common;

#[cfg(test)]
mod friend_tests {
    use super::common::*;
    use axum::http::{HeaderName, HeaderValue, StatusCode};
    use axum_test::TestServer;
    use serde_json::{Value, json};
    use sqlx::SqlitePool;

    const ERIN_UID: &str = "0b6f6a4e-1d2c-4c3b-9a8e-000000000005";
    const FRANK_UID: &str = "0b6f6a4e-1d2c-4c3b-9a8e-000000000006";

    type Session = (HeaderName, HeaderValue);

    async fn post_as(server: &TestServer, session: &Session, path: &str, username: &str) -> axum_test::TestResponse {
        server
            .post(path)
            .add_header(session.0.clone(), session.1.clone())
            .json(&json!({ "username": username }))
            .await
    }

    async fn get_as(server: &TestServer, session: &Session, path: &str) -> Vec<Value> {
        let response = server
            .get(path)
            .add_header(session.0.clone(), session.1.clone())
            .await;
        response.assert_status_ok();
        response.json()
    }

    // ============================================================
    // Flusso completo richiesta -> amicizia -> rimozione
    // ============================================================

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_friendship_lifecycle(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state.clone());
        let erin = session_for(&state, "erin@example.com");
        let frank = session_for(&state, "frank@example.com");

        let sent = post_as(&server, &erin, "/friends/send-request", "frank").await;
        sent.assert_status_ok();
        let body: Value = sent.json();
        assert_eq!(body["uid"], FRANK_UID);
        assert_eq!(body["status"], "pending");

        let outgoing = get_as(&server, &erin, "/friends/requests/sent").await;
        assert_eq!(outgoing.len(), 1);
        assert_eq!(outgoing[0]["username"], "frank");
        let incoming = get_as(&server, &frank, "/friends/requests/incoming").await;
        assert_eq!(incoming.len(), 1);
        assert_eq!(incoming[0]["uid"], ERIN_UID);

        let accepted = post_as(&server, &frank, "/friends/accept-request", "erin").await;
        accepted.assert_status_ok();
        let body: Value = accepted.json();
        assert_eq!(body["uid"], ERIN_UID);
        assert_eq!(body["status"], "confirmed");

        // la richiesta non è più pendente
        assert!(get_as(&server, &frank, "/friends/requests/incoming").await.is_empty());

        // l'amicizia è visibile da entrambi i lati, con e senza slash finale
        let erin_friends = get_as(&server, &erin, "/friends/").await;
        assert_eq!(erin_friends.len(), 1);
        assert_eq!(erin_friends[0]["username"], "frank");
        let frank_friends = get_as(&server, &frank, "/friends").await;
        assert_eq!(frank_friends.len(), 1);
        assert_eq!(frank_friends[0]["username"], "erin");

        let again = post_as(&server, &erin, "/friends/send-request", "frank").await;
        again.assert_status(StatusCode::CONFLICT);
        assert_eq!(again.json::<Value>()["detail"], "Already friends");

        let removed = post_as(&server, &erin, "/friends/delete", "frank").await;
        removed.assert_status_ok();
        assert_eq!(removed.json::<Value>()["uid"], FRANK_UID);
        assert!(get_as(&server, &frank, "/friends/").await.is_empty());

        post_as(&server, &erin, "/friends/delete", "frank")
            .await
            .assert_status_not_found();
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_pending_request_blocks_both_directions(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state.clone());
        let erin = session_for(&state, "erin@example.com");
        let frank = session_for(&state, "frank@example.com");

        post_as(&server, &erin, "/friends/send-request", "frank")
            .await
            .assert_status_ok();

        let duplicate = post_as(&server, &erin, "/friends/send-request", "frank").await;
        duplicate.assert_status(StatusCode::CONFLICT);
        assert_eq!(duplicate.json::<Value>()["detail"], "Friend request already pending");

        post_as(&server, &frank, "/friends/send-request", "erin")
            .await
            .assert_status(StatusCode::CONFLICT);
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_revert_request(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state.clone());
        let erin = session_for(&state, "erin@example.com");
        let frank = session_for(&state, "frank@example.com");

        post_as(&server, &erin, "/friends/send-request", "frank")
            .await
            .assert_status_ok();

        // solo chi ha mandato la richiesta può ritirarla
        post_as(&server, &frank, "/friends/revert-request", "erin")
            .await
            .assert_status_not_found();

        let reverted = post_as(&server, &erin, "/friends/revert-request", "frank").await;
        reverted.assert_status_ok();
        assert_eq!(reverted.json::<Value>()["status"], "reverted");

        assert!(get_as(&server, &frank, "/friends/requests/incoming").await.is_empty());
        assert!(get_as(&server, &erin, "/friends/requests/sent").await.is_empty());
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_decline_request_then_send_again(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state.clone());
        let erin = session_for(&state, "erin@example.com");
        let frank = session_for(&state, "frank@example.com");

        post_as(&server, &erin, "/friends/send-request", "frank")
            .await
            .assert_status_ok();

        // chi ha mandato la richiesta non può accettarla
        post_as(&server, &erin, "/friends/accept-request", "frank")
            .await
            .assert_status_not_found();

        let declined = post_as(&server, &frank, "/friends/decline-request", "erin").await;
        declined.assert_status_ok();
        assert_eq!(declined.json::<Value>()["status"], "declined");
        assert!(get_as(&server, &erin, "/friends/").await.is_empty());

        post_as(&server, &erin, "/friends/send-request", "frank")
            .await
            .assert_status_ok();
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_invalid_targets(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state.clone());
        let erin = session_for(&state, "erin@example.com");

        let myself = post_as(&server, &erin, "/friends/send-request", "erin").await;
        myself.assert_status_bad_request();

        post_as(&server, &erin, "/friends/send-request", "nobody")
            .await
            .assert_status_not_found();

        let missing = server
            .post("/friends/send-request")
            .add_header(erin.0.clone(), erin.1.clone())
            .json(&json!({}))
            .await;
        missing.assert_status_bad_request();
        assert_eq!(missing.json::<Value>()["detail"], "Username is required");
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_friends_require_authentication(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);

        server.get("/friends/").await.assert_status_unauthorized();
        server
            .post("/friends/send-request")
            .json(&json!({ "username": "frank" }))
            .await
            .assert_status_unauthorized();
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_deleted_user_takes_friendships_along(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state.clone());
        let erin = session_for(&state, "erin@example.com");
        let frank = session_for(&state, "frank@example.com");

        post_as(&server, &erin, "/friends/send-request", "frank")
            .await
            .assert_status_ok();
        post_as(&server, &frank, "/friends/accept-request", "erin")
            .await
            .assert_status_ok();

        server
            .delete("/user/profile/delete")
            .add_header(frank.0.clone(), frank.1.clone())
            .await
            .assert_status_ok();

        assert!(get_as(&server, &erin, "/friends/").await.is_empty());
        Ok(())
    }
}
