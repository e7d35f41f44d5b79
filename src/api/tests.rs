//! Client Endpoint Tests
//!
//! Covers the token scheme, the closed action set and the three request
//! handlers, using the reference credential fixtures (user1/pass1 and the
//! shared secret) so token values can be asserted literally.

#[cfg(test)]
mod tests {
    use crate::api::auth;
    use crate::api::protocol::*;
    use crate::api::service::ClientApi;
    use crate::clock::LamportClock;
    use crate::config::Config;
    use crate::state::{StateStore, Task, TaskStatus};
    use std::sync::Arc;

    /// sha256("user1" || "sua-chave-super-secreta")
    const USER1_TOKEN: &str = "90b93571e1225fe9a3b1dc204aea8b2ff49b415e7feb1e7b96064ac45dc38ce9";

    async fn api() -> (Arc<ClientApi>, Arc<StateStore>, Arc<LamportClock>) {
        let config = Config {
            host: "127.0.0.1".to_string(),
            client_port: 0,
            ..Config::default()
        };
        let state = Arc::new(StateStore::new(config.worker_timeout));
        let clock = Arc::new(LamportClock::new());
        let api = ClientApi::bind(Arc::new(config), state.clone(), clock.clone())
            .await
            .expect("bind on an ephemeral port");
        (api, state, clock)
    }

    fn request(api: &ClientApi, body: serde_json::Value) -> serde_json::Value {
        let raw = serde_json::to_vec(&body).unwrap();
        let response = api.process_request(&raw).expect("a reply is produced");
        serde_json::from_slice(&response).unwrap()
    }

    // ============================================================
    // TOKENS
    // ============================================================

    #[test]
    fn test_token_is_deterministic_sha256() {
        assert_eq!(auth::token_for("user1", "sua-chave-super-secreta"), USER1_TOKEN);
    }

    #[test]
    fn test_resolve_token_finds_owner() {
        let users = Config::default().users;

        assert_eq!(
            auth::resolve_token(USER1_TOKEN, &users, "sua-chave-super-secreta"),
            Some("user1")
        );
        assert_eq!(
            auth::resolve_token("deadbeef", &users, "sua-chave-super-secreta"),
            None
        );
    }

    // ============================================================
    // LOGIN
    // ============================================================

    #[tokio::test]
    async fn test_login_returns_token() {
        let (api, _, _) = api().await;

        let reply = request(
            &api,
            serde_json::json!({"action": "login", "username": "user1", "password": "pass1"}),
        );

        assert_eq!(reply["token"], USER1_TOKEN);
    }

    #[tokio::test]
    async fn test_login_with_wrong_password() {
        let (api, _, _) = api().await;

        let reply = request(
            &api,
            serde_json::json!({"action": "login", "username": "user1", "password": "wrong"}),
        );

        assert_eq!(reply["error"], ERR_BAD_CREDENTIALS);
    }

    #[tokio::test]
    async fn test_login_with_missing_password() {
        let (api, _, _) = api().await;

        // A well-formed login missing a field degrades to the credentials
        // error, never to a silent drop.
        let reply = request(
            &api,
            serde_json::json!({"action": "login", "username": "user1"}),
        );

        assert_eq!(reply["error"], ERR_BAD_CREDENTIALS);
    }

    // ============================================================
    // AUTHENTICATION GATE
    // ============================================================

    #[tokio::test]
    async fn test_submit_without_token_is_rejected() {
        let (api, state, _) = api().await;

        let reply = request(
            &api,
            serde_json::json!({"action": "submit_task", "data": {"duration": 1}}),
        );

        assert_eq!(reply["error"], ERR_AUTH_REQUIRED);
        assert_eq!(state.counts(), (0, 0, 0));
    }

    #[tokio::test]
    async fn test_forged_token_is_rejected() {
        let (api, _, _) = api().await;

        let reply = request(
            &api,
            serde_json::json!({"action": "task_status", "token": "f".repeat(64), "task_id": "x"}),
        );

        assert_eq!(reply["error"], ERR_BAD_TOKEN);
    }

    #[tokio::test]
    async fn test_unknown_action_without_token_needs_auth() {
        let (api, _, _) = api().await;

        // The token gate runs before the action is recognized, so even an
        // action this endpoint never served is answered, not dropped.
        let reply = request(&api, serde_json::json!({"action": "drop_tables"}));

        assert_eq!(reply["error"], ERR_AUTH_REQUIRED);
    }

    #[tokio::test]
    async fn test_unknown_action_with_valid_token_gets_no_reply() {
        let (api, _, _) = api().await;

        let raw = serde_json::to_vec(
            &serde_json::json!({"action": "drop_tables", "token": USER1_TOKEN}),
        )
        .unwrap();

        assert!(api.process_request(&raw).is_none());
    }

    #[tokio::test]
    async fn test_garbage_frame_gets_no_reply() {
        let (api, _, _) = api().await;
        assert!(api.process_request(b"{{{ not json").is_none());
    }

    // ============================================================
    // SUBMISSION
    // ============================================================

    #[tokio::test]
    async fn test_submit_task_enqueues_and_stamps() {
        let (api, state, clock) = api().await;

        let reply = request(
            &api,
            serde_json::json!({
                "action": "submit_task",
                "token": USER1_TOKEN,
                "data": {"description": "x", "duration": 1},
            }),
        );

        assert_eq!(reply["status"], MSG_TASK_ACCEPTED);
        let task_id = reply["task_id"].as_str().unwrap();

        let task = state.get_task_status(task_id).expect("task is stored");
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.client_id, "user1");
        assert_eq!(task.lamport_ts, 1);
        assert_eq!(task.data["duration"], 1);
        assert_eq!(state.pending_ids(), vec![task_id.to_string()]);
        assert_eq!(clock.get_time(), 1);
    }

    #[tokio::test]
    async fn test_submissions_get_increasing_timestamps() {
        let (api, state, _) = api().await;

        let mut stamps = Vec::new();
        for _ in 0..5 {
            let reply = request(
                &api,
                serde_json::json!({"action": "submit_task", "token": USER1_TOKEN, "data": {}}),
            );
            let task = state
                .get_task_status(reply["task_id"].as_str().unwrap())
                .unwrap();
            stamps.push(task.lamport_ts);
        }

        for pair in stamps.windows(2) {
            assert!(pair[0] < pair[1], "lamport stamps must strictly increase");
        }
    }

    // ============================================================
    // STATUS QUERIES
    // ============================================================

    #[tokio::test]
    async fn test_task_status_reports_full_record() {
        let (api, state, _) = api().await;

        let task = Task::new("user2".to_string(), serde_json::json!({"duration": 3}), 9);
        let task_id = task.id.clone();
        state.add_task(task);
        state.get_next_task().unwrap();
        state.update_task_status(
            &task_id,
            TaskStatus::Completed,
            Some(serde_json::json!({"message": "done"})),
        );

        let reply = request(
            &api,
            serde_json::json!({"action": "task_status", "token": USER1_TOKEN, "task_id": task_id}),
        );

        assert_eq!(reply["id"], task_id);
        assert_eq!(reply["client_id"], "user2");
        assert_eq!(reply["status"], "COMPLETED");
        assert_eq!(reply["lamport_ts"], 9);
        assert_eq!(reply["result"]["message"], "done");
    }

    #[tokio::test]
    async fn test_one_shot_framing_over_the_wire() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let (api, _, _) = api().await;
        let target = api.local_addr().unwrap();
        tokio::spawn(api.serve());

        let mut stream = tokio::net::TcpStream::connect(target).await.unwrap();
        stream
            .write_all(br#"{"action": "login", "username": "user1", "password": "pass1"}"#)
            .await
            .unwrap();

        let mut buf = vec![0u8; 4096];
        let len = stream.read(&mut buf).await.unwrap();
        let reply: serde_json::Value = serde_json::from_slice(&buf[..len]).unwrap();
        assert_eq!(reply["token"], USER1_TOKEN);

        // The server closes after one response.
        assert_eq!(stream.read(&mut buf).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_task_status_for_unknown_id() {
        let (api, _, _) = api().await;

        let reply = request(
            &api,
            serde_json::json!({"action": "task_status", "token": USER1_TOKEN, "task_id": "missing"}),
        );

        assert_eq!(reply["error"], ERR_UNKNOWN_TASK);
    }

    #[tokio::test]
    async fn test_task_status_with_missing_id() {
        let (api, _, _) = api().await;

        let reply = request(
            &api,
            serde_json::json!({"action": "task_status", "token": USER1_TOKEN}),
        );

        assert_eq!(reply["error"], ERR_UNKNOWN_TASK);
    }
}
