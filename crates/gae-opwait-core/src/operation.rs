//! App Engine operation resource
//!
//! Mirrors the `Operation` and `Status` messages returned by the App Engine
//! Admin API (`apps.operations.get`). An operation is fetched fresh on every
//! poll and never cached.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// State label reported while an operation is still running
pub const STATE_PENDING: &str = "false";

/// State label reported once an operation is done
pub const STATE_DONE: &str = "true";

/// A long-running operation as reported by the API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    /// Resource name, e.g. `apps/my-app/operations/1234-abcd`
    pub name: String,

    /// True once the operation has finished, successfully or not
    #[serde(default)]
    pub done: bool,

    /// Terminal failure, only present when `done` is true
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Status>,

    /// Service-specific progress metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,

    /// Service-specific result on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
}

impl Operation {
    /// Create a handle for an operation known only by name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// State label used by the wait loop
    pub fn state(&self) -> &'static str {
        if self.done { STATE_DONE } else { STATE_PENDING }
    }

    /// The terminal error payload, if it carries any information
    pub fn failure(&self) -> Option<&Status> {
        self.error.as_ref().filter(|status| !status.is_empty())
    }

    /// The operation id: the segment after `operations/`, or the whole name
    pub fn id(&self) -> &str {
        operation_id(&self.name)
    }
}

/// Extract the operation id from either a bare id or a full resource name
pub fn operation_id(name: &str) -> &str {
    match name.rsplit_once("operations/") {
        Some((_, id)) => id.trim_matches('/'),
        None => name.trim_matches('/'),
    }
}

/// Error payload of a failed operation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Status {
    /// Status code, a `google.rpc.Code` value
    #[serde(default)]
    pub code: i32,

    /// Developer-facing error message
    #[serde(default)]
    pub message: String,

    /// Additional error details
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<Value>,
}

impl Status {
    /// True when the payload carries no code, message or details
    pub fn is_empty(&self) -> bool {
        self.code == 0 && self.message.is_empty() && self.details.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_pending_operation() {
        let op: Operation = serde_json::from_value(json!({
            "name": "apps/my-app/operations/1234-abcd",
            "metadata": {
                "@type": "type.googleapis.com/google.appengine.v1.OperationMetadataV1",
                "method": "google.appengine.v1.Applications.CreateApplication"
            }
        }))
        .unwrap();

        assert!(!op.done);
        assert_eq!(op.state(), STATE_PENDING);
        assert!(op.failure().is_none());
        assert!(op.metadata.is_some());
        assert_eq!(op.id(), "1234-abcd");
    }

    #[test]
    fn test_deserialize_failed_operation() {
        let op: Operation = serde_json::from_value(json!({
            "name": "apps/my-app/operations/1234-abcd",
            "done": true,
            "error": {"code": 9, "message": "Application already exists"}
        }))
        .unwrap();

        assert_eq!(op.state(), STATE_DONE);
        let failure = op.failure().expect("failure payload");
        assert_eq!(failure.code, 9);
        assert_eq!(failure.message, "Application already exists");
    }

    #[test]
    fn test_body_without_name_is_rejected() {
        let err = serde_json::from_value::<Operation>(json!({
            "operations": [],
            "nextPageToken": ""
        }))
        .unwrap_err();
        assert!(err.to_string().contains("missing field `name`"));
    }

    #[test]
    fn test_empty_error_payload_is_not_a_failure() {
        let op: Operation = serde_json::from_value(json!({
            "name": "apps/my-app/operations/1",
            "done": true,
            "error": {}
        }))
        .unwrap();

        assert!(op.error.is_some());
        assert!(op.failure().is_none());
    }

    #[test]
    fn test_operation_id_forms() {
        assert_eq!(operation_id("1234-abcd"), "1234-abcd");
        assert_eq!(operation_id("apps/my-app/operations/1234-abcd"), "1234-abcd");
        assert_eq!(operation_id("operations/42/"), "42");
    }
}
