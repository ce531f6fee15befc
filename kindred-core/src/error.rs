use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An error response from the API.
#[derive(Error, Deserialize, Serialize, Debug, Clone, Eq, PartialEq)]
#[error("{message}: {reason}")]
pub struct ErrorResponse {
    /// The status
    pub status: String,
    /// A message about the error
    #[serde(default)]
    pub message: String,
    /// The reason for the error
    #[serde(default)]
    pub reason: String,
    /// The error code
    pub code: u16,
    /// Extended data associated with the reason.
    /// Each reason may define its own extended details.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<StatusDetails>,
}

impl ErrorResponse {
    /// Whether this response describes a missing object.
    pub fn is_not_found(&self) -> bool {
        self.reason == "NotFound" || self.code == 404
    }

    /// Synthesize the NotFound response apimachinery's `NewNotFound`
    /// produces, carrying the group and plural resource identity so
    /// callers can tell which registration missed.
    pub fn not_found(group: &str, resource: &str, name: &str) -> Self {
        let qualified = if group.is_empty() {
            resource.to_string()
        } else {
            format!("{resource}.{group}")
        };
        Self {
            status: "Failure".into(),
            message: format!("{qualified} \"{name}\" not found"),
            reason: "NotFound".into(),
            code: 404,
            details: Some(StatusDetails {
                group: Some(group.to_string()),
                kind: Some(resource.to_string()),
                name: Some(name.to_string()),
                ..Default::default()
            }),
        }
    }

    /// Synthesize the AlreadyExists response for create conflicts.
    pub fn already_exists(group: &str, resource: &str, name: &str) -> Self {
        let qualified = if group.is_empty() {
            resource.to_string()
        } else {
            format!("{resource}.{group}")
        };
        Self {
            status: "Failure".into(),
            message: format!("{qualified} \"{name}\" already exists"),
            reason: "AlreadyExists".into(),
            code: 409,
            details: Some(StatusDetails {
                group: Some(group.to_string()),
                kind: Some(resource.to_string()),
                name: Some(name.to_string()),
                ..Default::default()
            }),
        }
    }
}

/// StatusDetails is a set of additional properties that MAY be set by the
/// server to provide additional information about a response.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusDetails {
    /// The Causes array includes more details associated with the failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub causes: Option<Vec<StatusCause>>,

    /// The group attribute of the resource associated with the status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,

    /// The kind attribute of the resource associated with the status.
    /// On some operations may differ from the requested resource Kind.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// The name attribute of the resource associated with the status
    /// (when there is a single name which can be described).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// If specified, the time in seconds before the operation should be
    /// retried.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_after_seconds: Option<i32>,

    /// UID of the resource (when there is a single resource which can be
    /// described).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
}

/// StatusCause provides more information about a failure, including cases
/// when multiple errors are encountered.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCause {
    /// The field of the resource that has caused this error, as named by
    /// its JSON serialization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,

    /// A human-readable description of the cause of the error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// A machine-readable description of the cause of the error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}
