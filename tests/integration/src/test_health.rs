//! Health check and authentication integration tests.

#[cfg(test)]
mod tests {
    use crate::{LfsClient, TestUser, alice, endpoint_url, test_repo};

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_answer_health_without_credentials() {
        let resp = reqwest::get(format!("{}/health", endpoint_url())).await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);

        let json: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(json["status"], "running");
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_challenge_anonymous_requests() {
        let repo = test_repo("anon");
        let resp = reqwest::Client::new()
            .post(format!("{}{repo}/objects/batch", endpoint_url()))
            .body(r#"{"operation":"download","objects":[]}"#)
            .send()
            .await
            .unwrap();

        assert_eq!(resp.status(), reqwest::StatusCode::UNAUTHORIZED);
        let challenge = resp.headers().get("www-authenticate").unwrap();
        assert!(challenge.to_str().unwrap().starts_with("Basic"));
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_wrong_password() {
        let client = LfsClient::new(TestUser {
            name: alice().name,
            password: "definitely-wrong".to_owned(),
        });
        let resp = client
            .post(
                &format!("{}/objects/batch", test_repo("badpw")),
                &serde_json::json!({"operation": "download", "objects": []}),
            )
            .await;
        assert_eq!(resp.status(), reqwest::StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_return_404_for_unknown_route() {
        let client = LfsClient::new(alice());
        let resp = client.get("/lfs/it/unknown/objects/nothing").await;
        assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);

        let json: serde_json::Value = resp.json().await.unwrap();
        assert!(json["request_id"].is_string());
    }
}
