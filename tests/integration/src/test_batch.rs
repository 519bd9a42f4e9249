//! Batch and verify integration tests.

#[cfg(test)]
mod tests {
    use lfsproxy_model::BatchResponse;

    use crate::{LfsClient, alice, random_object, test_repo};

    async fn batch(client: &LfsClient, repo: &str, operation: &str, oid: &str, size: usize) -> BatchResponse {
        let resp = client
            .post(
                &format!("{repo}/objects/batch"),
                &serde_json::json!({
                    "operation": operation,
                    "transfers": ["basic"],
                    "objects": [{"oid": oid, "size": size}],
                }),
            )
            .await;
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        resp.json().await.unwrap()
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_report_missing_object_on_download() {
        let client = LfsClient::new(alice());
        let repo = test_repo("missing");
        let (_, oid) = random_object(64);

        let response = batch(&client, &repo, "download", &oid, 64).await;
        assert_eq!(response.transfer, "basic");
        let object = &response.objects[0];
        assert_eq!(object.oid, oid);
        assert!(object.actions.is_empty());
        assert_eq!(object.error.as_ref().unwrap().code, 404);
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_upload_verify_and_download_object() {
        let client = LfsClient::new(alice());
        let repo = test_repo("roundtrip");
        let (data, oid) = random_object(1024);

        // Upload: absent objects get upload and verify actions.
        let response = batch(&client, &repo, "upload", &oid, data.len()).await;
        let actions = &response.objects[0].actions;
        let upload = actions.get("upload").expect("upload action");
        let verify = actions.get("verify").expect("verify action");
        assert_eq!(upload.expires_in, verify.expires_in);

        let put = client.http().put(&upload.href).body(data.clone()).send().await.unwrap();
        assert!(put.status().is_success(), "presigned PUT failed: {}", put.status());

        let resp = client
            .post(
                &format!("{repo}/objects/verify"),
                &serde_json::json!({"oid": oid, "size": data.len()}),
            )
            .await;
        assert_eq!(resp.status(), reqwest::StatusCode::OK);

        let resp = client
            .post(
                &format!("{repo}/objects/verify"),
                &serde_json::json!({"oid": oid, "size": data.len() + 1}),
            )
            .await;
        assert_eq!(resp.status(), reqwest::StatusCode::UNPROCESSABLE_ENTITY);

        // A second upload batch needs no transfer.
        let response = batch(&client, &repo, "upload", &oid, data.len()).await;
        assert!(response.objects[0].actions.is_empty());
        assert!(response.objects[0].error.is_none());

        // Download hands out a working presigned GET.
        let response = batch(&client, &repo, "download", &oid, data.len()).await;
        let download = response.objects[0].actions.get("download").expect("download action");
        let body = client.http().get(&download.href).send().await.unwrap().bytes().await.unwrap();
        assert_eq!(body.as_ref(), data.as_slice());
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_unknown_operation() {
        let client = LfsClient::new(alice());
        let resp = client
            .post(
                &format!("{}/objects/batch", test_repo("op")),
                &serde_json::json!({"operation": "delete", "objects": []}),
            )
            .await;
        assert_eq!(resp.status(), reqwest::StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_invalid_object_per_object() {
        let client = LfsClient::new(alice());
        let repo = test_repo("invalid");
        let (_, oid) = random_object(8);

        let resp = client
            .post(
                &format!("{repo}/objects/batch"),
                &serde_json::json!({
                    "operation": "upload",
                    "objects": [{"oid": "../../x", "size": 1}, {"oid": oid, "size": 8}],
                }),
            )
            .await;
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        let response: BatchResponse = resp.json().await.unwrap();
        assert_eq!(response.objects[0].error.as_ref().unwrap().code, 422);
        assert!(response.objects[1].actions.get("upload").is_some());
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_malformed_body() {
        let client = LfsClient::new(alice());
        let resp = client
            .post(&format!("{}/objects/batch", test_repo("malformed")), "not a batch")
            .await;
        assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);
    }
}
