//! Verify callback body.

use serde::{Deserialize, Serialize};

/// Body of `POST .../objects/verify`, sent by the client after an upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyRequest {
    /// Object id (hex SHA-256).
    pub oid: String,
    /// Size the client uploaded.
    pub size: i64,
}
