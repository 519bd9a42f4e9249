//! Locking API request and response types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::batch::GitRef;

/// Owner block of a lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockOwner {
    /// Display name of the lock holder.
    pub name: String,
}

/// A lock as shown to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockView {
    /// Lock id.
    pub id: String,
    /// Locked path, relative to the repository root.
    pub path: String,
    /// Creation time (RFC 3339).
    pub locked_at: DateTime<Utc>,
    /// Holder of the lock.
    pub owner: LockOwner,
}

/// Body of `POST .../locks`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateLockRequest {
    /// Path to lock.
    pub path: String,
    /// Ref the lock applies to (accepted, not used).
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub git_ref: Option<GitRef>,
}

/// `{"lock": …}` body of create and unlock responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockResponse {
    /// The created or released lock.
    pub lock: LockView,
}

/// Body of `GET .../locks`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListLocksResponse {
    /// Matching locks.
    pub locks: Vec<LockView>,
}

/// Body of `POST .../locks/verify`. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyLocksRequest {
    /// Ref being pushed (accepted, not used).
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub git_ref: Option<GitRef>,
    /// Pagination cursor (accepted, the full set is always returned).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
    /// Page size (accepted, the full set is always returned).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

/// Locks partitioned by holder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyLocksResponse {
    /// Locks held by the caller.
    pub ours: Vec<LockView>,
    /// Locks held by anybody else.
    pub theirs: Vec<LockView>,
}

/// Body of `POST .../locks/{id}/unlock`. May be absent entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockRequest {
    /// Request to break somebody else's lock. Parsed but never honoured.
    #[serde(default)]
    pub force: bool,
    /// Ref the lock applies to (accepted, not used).
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub git_ref: Option<GitRef>,
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_should_serialize_lock_view_in_lfs_shape() {
        let view = LockView {
            id: "l-1".into(),
            path: "assets/logo.psd".into(),
            locked_at: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
            owner: LockOwner {
                name: "alice".into(),
            },
        };
        let value = serde_json::to_value(LockResponse { lock: view }).unwrap();
        assert_eq!(
            value,
            json!({"lock": {
                "id": "l-1",
                "path": "assets/logo.psd",
                "locked_at": "2024-01-02T03:04:05Z",
                "owner": {"name": "alice"}
            }})
        );
    }

    #[test]
    fn test_should_accept_empty_verify_and_unlock_bodies() {
        let verify: VerifyLocksRequest = serde_json::from_str("{}").unwrap();
        assert!(verify.cursor.is_none());

        let unlock: UnlockRequest = serde_json::from_str(r#"{"force": true}"#).unwrap();
        assert!(unlock.force);
        let unlock: UnlockRequest = serde_json::from_str("{}").unwrap();
        assert!(!unlock.force);
    }

    #[test]
    fn test_should_parse_create_lock_request_with_ref() {
        let request: CreateLockRequest =
            serde_json::from_str(r#"{"path":"a.bin","ref":{"name":"refs/heads/main"}}"#).unwrap();
        assert_eq!(request.path, "a.bin");
        assert!(request.git_ref.is_some());
    }
}
