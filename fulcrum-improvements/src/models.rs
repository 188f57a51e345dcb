//! Records and request bodies of the improvements endpoint.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use fulcrum_core::constants::limits::{ACTION_MAX_CHARS, DEDUPE_KEY_MAX_CHARS, TITLE_MAX_CHARS};
use fulcrum_core::payload::validate_length;
use fulcrum_core::{FulcrumError, Result};

/// Lifecycle state of an improvement.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ImprovementStatus {
    #[default]
    Open,
    InProgress,
    Resolved,
    Dismissed,
    Closed,
}

impl fmt::Display for ImprovementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ImprovementStatus::Open => "open",
            ImprovementStatus::InProgress => "in_progress",
            ImprovementStatus::Resolved => "resolved",
            ImprovementStatus::Dismissed => "dismissed",
            ImprovementStatus::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Improvement record as returned by the server. The SDK never owns it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Improvement {
    pub uuid: String,
    pub project_uuid: String,
    #[serde(default)]
    pub ticket_uuid: Option<String>,
    #[serde(default)]
    pub run_uuid: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: ImprovementStatus,
    #[serde(default)]
    pub dedupe_key: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// The list endpoint answers either with a bare array or wrapped in an object.
#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum ListResponse {
    Bare(Vec<Improvement>),
    Wrapped { improvements: Vec<Improvement> },
}

impl ListResponse {
    pub(crate) fn into_improvements(self) -> Vec<Improvement> {
        match self {
            ListResponse::Bare(improvements) | ListResponse::Wrapped { improvements } => {
                improvements
            }
        }
    }
}

/// Fields of a new improvement.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewImprovement {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dedupe_key: Option<String>,
    pub status: ImprovementStatus,
}

impl NewImprovement {
    pub fn new<T: Into<String>>(title: T) -> Self {
        NewImprovement {
            title: title.into(),
            description: None,
            dedupe_key: None,
            status: ImprovementStatus::Open,
        }
    }

    pub fn description<T: Into<String>>(mut self, description: T) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Key the server uses to collapse repeated reports of the same improvement.
    pub fn dedupe_key<T: Into<String>>(mut self, dedupe_key: T) -> Self {
        self.dedupe_key = Some(dedupe_key.into());
        self
    }

    pub fn status(mut self, status: ImprovementStatus) -> Self {
        self.status = status;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        validate_length("title", &self.title, TITLE_MAX_CHARS)?;
        if let Some(dedupe_key) = &self.dedupe_key {
            validate_length("dedupe_key", dedupe_key, DEDUPE_KEY_MAX_CHARS)?;
        }
        Ok(())
    }
}

/// Partial update of an improvement. Unset fields are not sent.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ImprovementUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ImprovementStatus>,
}

impl ImprovementUpdate {
    pub fn title<T: Into<String>>(mut self, title: T) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description<T: Into<String>>(mut self, description: T) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn status(mut self, status: ImprovementStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.status.is_none()
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(FulcrumError::Validation("No fields to update".to_string()));
        }
        if let Some(title) = &self.title {
            validate_length("title", title, TITLE_MAX_CHARS)?;
        }
        Ok(())
    }
}

/// Body of `POST <url>/<uuid>/events`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub(crate) struct ImprovementEvent<'a> {
    pub run_uuid: &'a str,
    pub improvement_uuid: &'a str,
    pub action: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl ImprovementEvent<'_> {
    pub(crate) fn validate(&self) -> Result<()> {
        validate_length("action", self.action, ACTION_MAX_CHARS)
    }
}
