//! Payload shapes of the built-in dispatch kinds.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Payload of `text` entries. `text` is sent as `null` when absent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextPayload {
    pub text: Option<String>,
}

/// Payload of `api_call` entries: the action taken against an outside service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiCallPayload {
    pub service: String,
    pub operation: String,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl ApiCallPayload {
    /// Detail keys named `service` or `operation` are dropped in favour of the explicit values.
    pub fn new<S: Into<String>, O: Into<String>>(
        service: S,
        operation: O,
        mut details: Map<String, Value>,
    ) -> Self {
        details.remove("service");
        details.remove("operation");
        ApiCallPayload { service: service.into(), operation: operation.into(), details }
    }
}

/// Payload of `external_ref` entries: a pointer to something outside the run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExternalRefPayload {
    pub provider: String,
    pub ref_type: String,
    pub ref_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Payload of `db` entries. Carries counts, never raw rows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DbPayload {
    pub operation: String,
    pub table: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

/// Payload of `model` entries: a structured value shown as an intermediate step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelPayload {
    pub model_name: String,
    pub data: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_summary: Option<String>,
}

/// `my_crate::profile::UserProfile<T>` becomes `UserProfile`.
pub(crate) fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
