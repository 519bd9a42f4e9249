//! Locking API integration tests.

#[cfg(test)]
mod tests {
    use lfsproxy_model::{ListLocksResponse, LockResponse, VerifyLocksResponse};

    use crate::{LfsClient, alice, bob, test_repo};

    async fn create(client: &LfsClient, repo: &str, path: &str) -> reqwest::Response {
        client
            .post(&format!("{repo}/locks"), &serde_json::json!({"path": path}))
            .await
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_run_lock_lifecycle() {
        let alice = LfsClient::new(alice());
        let bob = LfsClient::new(bob());
        let repo = test_repo("locks");

        let resp = create(&alice, &repo, "art/hero.psd").await;
        assert_eq!(resp.status(), reqwest::StatusCode::CREATED);
        let created: LockResponse = resp.json().await.unwrap();
        let id = created.lock.id.clone();

        // Conflict carries the existing lock.
        let resp = create(&bob, &repo, "art/hero.psd").await;
        assert_eq!(resp.status(), reqwest::StatusCode::CONFLICT);
        let json: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(json["lock"]["id"], id.as_str());

        // Filters.
        let listed: ListLocksResponse = bob
            .get(&format!("{repo}/locks?path=art%2Fhero.psd"))
            .await
            .json()
            .await
            .unwrap();
        assert_eq!(listed.locks, vec![created.lock.clone()]);
        let listed: ListLocksResponse = bob
            .get(&format!("{repo}/locks?id=nope"))
            .await
            .json()
            .await
            .unwrap();
        assert!(listed.locks.is_empty());

        // Partition.
        let verified: VerifyLocksResponse = bob
            .post(&format!("{repo}/locks/verify"), &serde_json::json!({}))
            .await
            .json()
            .await
            .unwrap();
        assert!(verified.ours.is_empty());
        assert_eq!(verified.theirs.len(), 1);

        // Only the owner may unlock, even with force.
        let resp = bob
            .post(
                &format!("{repo}/locks/{id}/unlock"),
                &serde_json::json!({"force": true}),
            )
            .await;
        assert_eq!(resp.status(), reqwest::StatusCode::FORBIDDEN);

        let resp = alice
            .post(&format!("{repo}/locks/{id}/unlock"), &serde_json::json!({}))
            .await;
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        let released: LockResponse = resp.json().await.unwrap();
        assert_eq!(released.lock.id, id);

        let resp = alice
            .post(&format!("{repo}/locks/{id}/unlock"), &serde_json::json!({}))
            .await;
        assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_let_one_of_concurrent_creates_win() {
        let repo = test_repo("race");
        let clients = [LfsClient::new(alice()), LfsClient::new(bob())];

        let (a, b) = tokio::join!(
            create(&clients[0], &repo, "same.bin"),
            create(&clients[1], &repo, "same.bin"),
        );
        let mut statuses = [a.status(), b.status()];
        statuses.sort();
        assert_eq!(
            statuses,
            [reqwest::StatusCode::CREATED, reqwest::StatusCode::CONFLICT]
        );
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_invalid_repository() {
        let client = LfsClient::new(alice());
        let resp = client.get("/lfs/it/bad.name/locks").await;
        assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);
    }
}
