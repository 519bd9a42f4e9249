//! Batch API request and response types.
//!
//! ```json
//! {"transfer":"basic","objects":[
//!   {"oid":"1111…","size":123,"actions":{"upload":{"href":"…","expires_in":3600}}},
//!   {"oid":"2222…","size":9,"error":{"code":404,"message":"Object not found"}}
//! ]}
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The only transfer adapter the server speaks.
pub const BASIC_TRANSFER: &str = "basic";

/// Direction of a batch request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// The client wants to push objects.
    Upload,
    /// The client wants to fetch objects.
    Download,
}

impl Operation {
    /// Parse the `operation` field, ignoring ASCII case.
    ///
    /// ```
    /// use lfsproxy_model::Operation;
    ///
    /// assert_eq!(Operation::from_name("Upload"), Some(Operation::Upload));
    /// assert_eq!(Operation::from_name("delete"), None);
    /// ```
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case("upload") {
            Some(Self::Upload)
        } else if name.eq_ignore_ascii_case("download") {
            Some(Self::Download)
        } else {
            None
        }
    }

    /// Lowercase wire name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upload => "upload",
            Self::Download => "download",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Git ref a request is made for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitRef {
    /// Fully qualified ref name, e.g. `refs/heads/main`.
    pub name: String,
}

/// One object named in a batch request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectSpec {
    /// Object id (hex SHA-256).
    pub oid: String,
    /// Object size in bytes.
    pub size: i64,
}

/// Body of `POST .../objects/batch`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRequest {
    /// `upload` or `download`, in any case.
    pub operation: String,
    /// Transfer adapters the client supports.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transfers: Vec<String>,
    /// Ref the objects belong to.
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub git_ref: Option<GitRef>,
    /// Objects to resolve.
    pub objects: Vec<ObjectSpec>,
    /// Hash algorithm of the object ids.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash_algo: Option<String>,
}

/// A time-limited URL the client calls to perform an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionLink {
    /// Target URL.
    pub href: String,
    /// Lifetime of `href` in seconds.
    pub expires_in: u64,
}

/// Actions the server can hand out for one object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferAction {
    /// Presigned PUT to the object store.
    Upload(ActionLink),
    /// Presigned GET from the object store.
    Download(ActionLink),
    /// Callback to the verify endpoint after the upload.
    Verify(ActionLink),
}

impl TransferAction {
    /// Key of the action in the `actions` map.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Upload(_) => "upload",
            Self::Download(_) => "download",
            Self::Verify(_) => "verify",
        }
    }

    /// The link carried by the action.
    #[must_use]
    pub fn link(&self) -> &ActionLink {
        match self {
            Self::Upload(link) | Self::Download(link) | Self::Verify(link) => link,
        }
    }

    fn from_name(name: &str, link: ActionLink) -> Option<Self> {
        match name {
            "upload" => Some(Self::Upload(link)),
            "download" => Some(Self::Download(link)),
            "verify" => Some(Self::Verify(link)),
            _ => None,
        }
    }
}

/// The `actions` map of an object result, serialized as
/// `{"<name>": {"href": …, "expires_in": …}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectActions(Vec<TransferAction>);

impl ObjectActions {
    /// Create an empty action set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an action, replacing one with the same name.
    pub fn push(&mut self, action: TransferAction) {
        self.0.retain(|a| a.name() != action.name());
        self.0.push(action);
    }

    /// Look up an action by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ActionLink> {
        self.0
            .iter()
            .find(|a| a.name() == name)
            .map(TransferAction::link)
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &TransferAction> {
        self.0.iter()
    }

    /// Number of actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there is no action.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<TransferAction> for ObjectActions {
    fn from_iter<I: IntoIterator<Item = TransferAction>>(iter: I) -> Self {
        let mut actions = Self::new();
        for action in iter {
            actions.push(action);
        }
        actions
    }
}

impl Serialize for ObjectActions {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for action in &self.0 {
            map.serialize_entry(action.name(), action.link())?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ObjectActions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, ActionLink>::deserialize(deserializer)?;
        raw.into_iter()
            .map(|(name, link)| {
                TransferAction::from_name(&name, link)
                    .ok_or_else(|| D::Error::custom(format!("unknown action {name}")))
            })
            .collect()
    }
}

/// Per-object failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectError {
    /// HTTP-like status code (404, 422, 500).
    pub code: u16,
    /// Human readable reason.
    pub message: String,
}

impl ObjectError {
    /// Create a per-object error.
    #[must_use]
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Result for one requested object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectResult {
    /// Object id, echoed from the request.
    pub oid: String,
    /// Object size, echoed from the request.
    pub size: i64,
    /// Actions the client must perform, omitted when empty.
    #[serde(default, skip_serializing_if = "ObjectActions::is_empty")]
    pub actions: ObjectActions,
    /// Why the object cannot be transferred.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ObjectError>,
}

impl ObjectResult {
    /// A result with actions (possibly none).
    #[must_use]
    pub fn with_actions(oid: impl Into<String>, size: i64, actions: ObjectActions) -> Self {
        Self {
            oid: oid.into(),
            size,
            actions,
            error: None,
        }
    }

    /// A result carrying only an error.
    #[must_use]
    pub fn with_error(oid: impl Into<String>, size: i64, error: ObjectError) -> Self {
        Self {
            oid: oid.into(),
            size,
            actions: ObjectActions::new(),
            error: Some(error),
        }
    }
}

/// Body of a successful batch response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResponse {
    /// Chosen transfer adapter, always `basic`.
    pub transfer: String,
    /// Results in request order.
    pub objects: Vec<ObjectResult>,
}

impl BatchResponse {
    /// Wrap results for the `basic` transfer adapter.
    #[must_use]
    pub fn basic(objects: Vec<ObjectResult>) -> Self {
        Self {
            transfer: BASIC_TRANSFER.to_owned(),
            objects,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn link(href: &str) -> ActionLink {
        ActionLink {
            href: href.to_owned(),
            expires_in: 3600,
        }
    }

    #[test]
    fn test_should_parse_operation_case_insensitively() {
        assert_eq!(Operation::from_name("UPLOAD"), Some(Operation::Upload));
        assert_eq!(Operation::from_name("download"), Some(Operation::Download));
        assert_eq!(Operation::from_name(""), None);
    }

    #[test]
    fn test_should_deserialize_batch_request_with_optional_fields() {
        let request: BatchRequest = serde_json::from_value(json!({
            "operation": "download",
            "transfers": ["basic"],
            "ref": {"name": "refs/heads/main"},
            "objects": [{"oid": "abcd", "size": 12}],
            "hash_algo": "sha256"
        }))
        .unwrap();
        assert_eq!(request.operation, "download");
        assert_eq!(request.git_ref.unwrap().name, "refs/heads/main");
        assert_eq!(request.objects[0].size, 12);

        let minimal: BatchRequest =
            serde_json::from_value(json!({"operation": "upload", "objects": []})).unwrap();
        assert!(minimal.transfers.is_empty());
    }

    #[test]
    fn test_should_serialize_actions_as_named_map() {
        let actions: ObjectActions = [
            TransferAction::Upload(link("https://s3/put")),
            TransferAction::Verify(link("https://lfs/verify")),
        ]
        .into_iter()
        .collect();
        let result = ObjectResult::with_actions("abcd", 5, actions);

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(
            value,
            json!({
                "oid": "abcd",
                "size": 5,
                "actions": {
                    "upload": {"href": "https://s3/put", "expires_in": 3600},
                    "verify": {"href": "https://lfs/verify", "expires_in": 3600}
                }
            })
        );
    }

    #[test]
    fn test_should_omit_empty_actions_and_missing_error() {
        let value =
            serde_json::to_value(ObjectResult::with_actions("abcd", 5, ObjectActions::new()))
                .unwrap();
        assert_eq!(value, json!({"oid": "abcd", "size": 5}));

        let value = serde_json::to_value(ObjectResult::with_error(
            "abcd",
            5,
            ObjectError::new(404, "Object not found"),
        ))
        .unwrap();
        assert_eq!(
            value,
            json!({"oid": "abcd", "size": 5, "error": {"code": 404, "message": "Object not found"}})
        );
    }

    #[test]
    fn test_should_replace_action_with_same_name() {
        let mut actions = ObjectActions::new();
        actions.push(TransferAction::Download(link("a")));
        actions.push(TransferAction::Download(link("b")));
        assert_eq!(actions.len(), 1);
        assert_eq!(actions.get("download").unwrap().href, "b");
    }

    #[test]
    fn test_should_read_back_response_actions() {
        let response: BatchResponse = serde_json::from_value(json!({
            "transfer": "basic",
            "objects": [{"oid": "abcd", "size": 1, "actions": {"download": {"href": "x", "expires_in": 60}}}]
        }))
        .unwrap();
        let download = response.objects[0].actions.get("download").unwrap();
        assert_eq!(download.expires_in, 60);
        assert!(response.objects[0].error.is_none());

        let unknown = serde_json::from_value::<ObjectActions>(json!({"delete": {"href": "x", "expires_in": 1}}));
        assert!(unknown.is_err());
    }
}
