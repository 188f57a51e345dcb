//! Key-based redaction of sensitive values in JSON payloads.

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;

use crate::constants::redaction::{DEFAULT_SENSITIVE_FRAGMENTS, REDACTED_VALUE};
use crate::error::{FulcrumError, Result};

/// A set of key-name fragments whose values never leave the process.
///
/// A mapping key is sensitive when it contains any fragment, compared
/// case-insensitively. The value under such a key is replaced by
/// [`REDACTED_VALUE`] whatever its type, nested objects and arrays included.
#[derive(Clone, Debug)]
pub struct RedactionPolicy {
    fragments: Vec<String>,
    pattern: Regex,
}

impl Default for RedactionPolicy {
    fn default() -> Self {
        default_policy().clone()
    }
}

impl RedactionPolicy {
    /// Build a policy from an explicit list of fragments (replaces the defaults).
    pub fn new<I, S>(fragments: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fragments: Vec<String> = fragments
            .into_iter()
            .map(Into::into)
            .filter(|f| !f.is_empty())
            .collect();

        if fragments.is_empty() {
            return Err(FulcrumError::Config(
                "At least one redaction fragment is required".to_string(),
            ));
        }

        let alternation =
            fragments.iter().map(|f| regex::escape(f)).collect::<Vec<_>>().join("|");
        let pattern = Regex::new(&format!("(?i)({alternation})"))
            .map_err(|e| FulcrumError::Config(format!("Invalid redaction fragment: {e}")))?;

        Ok(RedactionPolicy { fragments, pattern })
    }

    /// Extend the policy with additional fragments (keeps the current ones).
    pub fn with_fragments<I, S>(&self, extra: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut fragments = self.fragments.clone();
        fragments.extend(extra.into_iter().map(Into::into));
        Self::new(fragments)
    }

    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    pub fn is_sensitive(&self, key: &str) -> bool {
        self.pattern.is_match(key)
    }

    /// Return a redacted copy of `value`. The input is left untouched.
    pub fn redact(&self, value: &Value) -> Value {
        match value {
            Value::Object(map) => {
                let mut new_map = Map::with_capacity(map.len());
                for (key, value) in map {
                    if self.is_sensitive(key) {
                        new_map.insert(key.clone(), Value::String(REDACTED_VALUE.to_string()));
                    } else {
                        new_map.insert(key.clone(), self.redact(value));
                    }
                }
                Value::Object(new_map)
            }
            Value::Array(arr) => Value::Array(arr.iter().map(|v| self.redact(v)).collect()),
            _ => value.clone(),
        }
    }
}

fn default_policy() -> &'static RedactionPolicy {
    static DEFAULT: OnceLock<RedactionPolicy> = OnceLock::new();
    DEFAULT.get_or_init(|| {
        RedactionPolicy::new(DEFAULT_SENSITIVE_FRAGMENTS)
            .expect("Invalid default redaction fragments")
    })
}

/// Redact `value` with the default policy.
pub fn redact(value: &Value) -> Value {
    default_policy().redact(value)
}
