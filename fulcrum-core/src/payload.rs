use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::config::ClientConfig;
use crate::constants::limits::{KIND_MAX_CHARS, SOURCE_MAX_CHARS, SUMMARY_MAX_CHARS};
use crate::constants::redaction::TRUNCATION_NOTE;
use crate::constants::{DEFAULT_SOURCE, SCHEMA_VERSION};
use crate::error::{FulcrumError, Result};
use crate::redaction::RedactionPolicy;
use crate::schema::{DispatchEntry, DispatchKind, TruncationMarker};

/// Assembles the dispatch envelope for one call.
///
/// Identifiers are copied from the client configuration. The payload is
/// redacted first, then measured; an oversized payload is swapped for a
/// [`TruncationMarker`] so the entry is still sent.
pub struct EnvelopeBuilder {
    ticket_uuid: Option<String>,
    run_uuid: String,
    message_uuid: Option<String>,
    project_uuid: Option<String>,
    max_bytes: usize,
    kind: DispatchKind,
    summary: String,
    payload: Option<Value>,
    source: String,
    client_ts: Option<DateTime<Utc>>,
    skip_redaction: bool,
}

impl EnvelopeBuilder {
    pub fn new<S: Into<String>>(config: &ClientConfig, kind: DispatchKind, summary: S) -> Self {
        EnvelopeBuilder {
            ticket_uuid: config.ticket_uuid.clone(),
            run_uuid: config.run_uuid.clone(),
            message_uuid: config.message_uuid.clone(),
            project_uuid: config.project_uuid.clone(),
            max_bytes: config.max_bytes,
            kind,
            summary: summary.into(),
            payload: None,
            source: DEFAULT_SOURCE.to_string(),
            client_ts: None,
            skip_redaction: false,
        }
    }

    pub fn payload(mut self, payload: Option<Value>) -> Self {
        self.payload = payload;
        self
    }

    pub fn source<S: Into<String>>(mut self, source: S) -> Self {
        self.source = source.into();
        self
    }

    pub fn client_ts(mut self, client_ts: Option<DateTime<Utc>>) -> Self {
        self.client_ts = client_ts;
        self
    }

    pub fn skip_redaction(mut self, skip: bool) -> Self {
        self.skip_redaction = skip;
        self
    }

    pub fn build(self, policy: &RedactionPolicy) -> Result<DispatchEntry> {
        let ticket_uuid = self
            .ticket_uuid
            .ok_or_else(|| FulcrumError::Validation("ticket_uuid is required".to_string()))?;
        validate_length("kind", self.kind.as_str(), KIND_MAX_CHARS)?;
        validate_length("source", &self.source, SOURCE_MAX_CHARS)?;

        let payload = self
            .payload
            .map(|p| sanitize_payload(&p, policy, self.skip_redaction, self.max_bytes))
            .transpose()?;

        Ok(DispatchEntry {
            ticket_uuid,
            run_uuid: self.run_uuid,
            kind: self.kind,
            summary: normalize_summary(&self.summary),
            message_uuid: self.message_uuid,
            project_uuid: self.project_uuid,
            payload,
            source: self.source,
            schema_version: SCHEMA_VERSION,
            client_ts: self.client_ts.unwrap_or_else(Utc::now),
        })
    }
}

/// Redact `payload` (unless skipped) and then bound its serialized size.
pub fn sanitize_payload(
    payload: &Value,
    policy: &RedactionPolicy,
    skip_redaction: bool,
    max_bytes: usize,
) -> Result<Value> {
    let redacted = if skip_redaction {
        payload.clone()
    } else {
        policy.redact(payload)
    };
    enforce_max_bytes(redacted, max_bytes)
}

/// Replace `payload` with a truncation marker when its JSON encoding exceeds `max_bytes`.
pub fn enforce_max_bytes(payload: Value, max_bytes: usize) -> Result<Value> {
    let size = serde_json::to_vec(&payload)?.len();
    if size <= max_bytes {
        return Ok(payload);
    }

    let marker = TruncationMarker {
        truncated: true,
        original_size: size,
        max_size: max_bytes,
        note: TRUNCATION_NOTE.to_string(),
    };
    Ok(serde_json::to_value(marker)?)
}

/// Collapse the summary onto one line and cap its length.
pub fn normalize_summary(summary: &str) -> String {
    let single_line: String = summary
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect();

    if single_line.chars().count() <= SUMMARY_MAX_CHARS {
        return single_line;
    }

    let mut truncated: String = single_line.chars().take(SUMMARY_MAX_CHARS - 3).collect();
    truncated.push_str("...");
    truncated
}

/// Reject empty values and values longer than `max_chars` characters.
pub fn validate_length(field: &str, value: &str, max_chars: usize) -> Result<()> {
    if value.is_empty() {
        return Err(FulcrumError::Validation(format!("{field} must not be empty")));
    }
    let len = value.chars().count();
    if len > max_chars {
        return Err(FulcrumError::Validation(format!(
            "{field} is {len} characters, at most {max_chars} allowed"
        )));
    }
    Ok(())
}
