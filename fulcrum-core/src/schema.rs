use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// Classification of a dispatch entry.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum DispatchKind {
    Text,
    Json,
    ApiCall,
    ExternalRef,
    Db,
    Model,
    /// Any other kind the server understands.
    Custom(String),
}

impl DispatchKind {
    pub fn as_str(&self) -> &str {
        match self {
            DispatchKind::Text => "text",
            DispatchKind::Json => "json",
            DispatchKind::ApiCall => "api_call",
            DispatchKind::ExternalRef => "external_ref",
            DispatchKind::Db => "db",
            DispatchKind::Model => "model",
            DispatchKind::Custom(kind) => kind,
        }
    }
}

impl From<&str> for DispatchKind {
    fn from(kind: &str) -> Self {
        match kind {
            "text" => DispatchKind::Text,
            "json" => DispatchKind::Json,
            "api_call" => DispatchKind::ApiCall,
            "external_ref" => DispatchKind::ExternalRef,
            "db" => DispatchKind::Db,
            "model" => DispatchKind::Model,
            other => DispatchKind::Custom(other.to_string()),
        }
    }
}

impl fmt::Display for DispatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for DispatchKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DispatchKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let kind = String::deserialize(deserializer)?;
        Ok(DispatchKind::from(kind.as_str()))
    }
}

/// Represents the request body posted to the dispatch endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DispatchEntry {
    pub ticket_uuid: String,
    pub run_uuid: String,
    pub kind: DispatchKind,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_uuid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_uuid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    pub source: String,
    pub schema_version: u32,
    pub client_ts: DateTime<Utc>,
}

/// Placeholder that replaces a payload whose serialized form is too large.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TruncationMarker {
    #[serde(rename = "_truncated")]
    pub truncated: bool,
    #[serde(rename = "_original_size")]
    pub original_size: usize,
    #[serde(rename = "_max_size")]
    pub max_size: usize,
    #[serde(rename = "_note")]
    pub note: String,
}
