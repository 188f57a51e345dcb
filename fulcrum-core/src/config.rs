use std::collections::HashMap;
use std::fmt;
use std::hash::BuildHasher;
use std::time::Duration;

use tracing::warn;

use crate::constants::{env, DEFAULT_MAX_BYTES, DEFAULT_TIMEOUT_MS};
use crate::error::{FulcrumError, Result};
use crate::log_debug;

/// Source of environment variables.
pub trait EnvSource {
    fn var(&self, key: &str) -> Option<String>;
}

/// The process environment.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Adapts a lookup closure, e.g. one backed by a secrets store.
#[derive(Clone, Copy, Debug)]
pub struct FnEnv<F>(pub F);

impl<F: Fn(&str) -> Option<String>> EnvSource for FnEnv<F> {
    fn var(&self, key: &str) -> Option<String> {
        (self.0)(key)
    }
}

impl<S: BuildHasher> EnvSource for HashMap<String, String, S> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl<S: BuildHasher> EnvSource for HashMap<&str, &str, S> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).map(|v| (*v).to_string())
    }
}

/// Which client a configuration is resolved for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClientKind {
    Dispatch,
    Improvements,
}

impl ClientKind {
    pub fn url_var(self) -> &'static str {
        match self {
            ClientKind::Dispatch => env::DISPATCH_URL,
            ClientKind::Improvements => env::IMPROVEMENTS_URL,
        }
    }

    pub fn debug_var(self) -> &'static str {
        match self {
            ClientKind::Dispatch => env::DISPATCH_DEBUG,
            ClientKind::Improvements => env::IMPROVEMENTS_DEBUG,
        }
    }

    pub fn timeout_var(self) -> &'static str {
        match self {
            ClientKind::Dispatch => env::DISPATCH_TIMEOUT_MS,
            ClientKind::Improvements => env::IMPROVEMENTS_TIMEOUT_MS,
        }
    }

    pub fn max_bytes_var(self) -> &'static str {
        match self {
            ClientKind::Dispatch => env::DISPATCH_MAX_BYTES,
            ClientKind::Improvements => env::IMPROVEMENTS_MAX_BYTES,
        }
    }

    /// Dispatch entries are always attached to a ticket.
    pub fn requires_ticket(self) -> bool {
        matches!(self, ClientKind::Dispatch)
    }
}

impl fmt::Display for ClientKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientKind::Dispatch => f.write_str("dispatch"),
            ClientKind::Improvements => f.write_str("improvements"),
        }
    }
}

/// Immutable settings of a configured client.
#[derive(Clone)]
pub struct ClientConfig {
    pub kind: ClientKind,
    pub endpoint: String,
    pub token: String,
    pub run_uuid: String,
    pub ticket_uuid: Option<String>,
    pub project_uuid: Option<String>,
    pub message_uuid: Option<String>,
    pub timeout: Duration,
    pub max_bytes: usize,
    pub debug: bool,
}

// The token is deliberately left out of debug output
impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("kind", &self.kind)
            .field("endpoint", &self.endpoint)
            .field("token", &"*****")
            .field("run_uuid", &self.run_uuid)
            .field("ticket_uuid", &self.ticket_uuid)
            .field("project_uuid", &self.project_uuid)
            .field("message_uuid", &self.message_uuid)
            .field("timeout", &self.timeout)
            .field("max_bytes", &self.max_bytes)
            .field("debug", &self.debug)
            .finish()
    }
}

impl ClientConfig {
    pub fn builder(kind: ClientKind) -> ClientConfigBuilder {
        ClientConfigBuilder::new(kind)
    }

    /// Resolve the configuration of `kind` from the process environment.
    pub fn from_env(kind: ClientKind) -> Result<Self> {
        Self::from_env_source(kind, &ProcessEnv)
    }

    /// Resolve the configuration of `kind` from an arbitrary variable source.
    ///
    /// Missing or empty required variables yield `FulcrumError::Config`.
    /// Unparsable numeric options fall back to their defaults.
    pub fn from_env_source<E: EnvSource + ?Sized>(kind: ClientKind, source: &E) -> Result<Self> {
        let debug = debug_enabled(kind, source);

        let mut builder = ClientConfigBuilder::new(kind)
            .debug(debug)
            .timeout_ms(parse_or_default(source, kind.timeout_var(), DEFAULT_TIMEOUT_MS, debug))
            .max_bytes(parse_or_default(source, kind.max_bytes_var(), DEFAULT_MAX_BYTES, debug));

        if let Some(endpoint) = non_empty(source, kind.url_var()) {
            builder = builder.endpoint(endpoint);
        }
        if let Some(token) = resolve_token(source) {
            builder = builder.token(token);
        }
        if let Some(run_uuid) = non_empty(source, env::RUN_UUID) {
            builder = builder.run_uuid(run_uuid);
        }
        if let Some(ticket_uuid) = non_empty(source, env::TICKET_UUID) {
            builder = builder.ticket_uuid(ticket_uuid);
        }
        if let Some(project_uuid) = non_empty(source, env::PROJECT_UUID) {
            builder = builder.project_uuid(project_uuid);
        }
        if kind == ClientKind::Dispatch {
            if let Some(message_uuid) = non_empty(source, env::MESSAGE_UUID) {
                builder = builder.message_uuid(message_uuid);
            }
        }

        builder.build()
    }
}

/// Builder for [`ClientConfig`]; `build` enforces the per-kind required fields.
#[derive(Clone, Debug)]
pub struct ClientConfigBuilder {
    kind: ClientKind,
    endpoint: Option<String>,
    token: Option<String>,
    run_uuid: Option<String>,
    ticket_uuid: Option<String>,
    project_uuid: Option<String>,
    message_uuid: Option<String>,
    timeout_ms: u64,
    max_bytes: usize,
    debug: bool,
}

impl ClientConfigBuilder {
    pub fn new(kind: ClientKind) -> Self {
        ClientConfigBuilder {
            kind,
            endpoint: None,
            token: None,
            run_uuid: None,
            ticket_uuid: None,
            project_uuid: None,
            message_uuid: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            max_bytes: DEFAULT_MAX_BYTES,
            debug: false,
        }
    }

    pub fn endpoint<T: Into<String>>(mut self, endpoint: T) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn token<T: Into<String>>(mut self, token: T) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn run_uuid<T: Into<String>>(mut self, run_uuid: T) -> Self {
        self.run_uuid = Some(run_uuid.into());
        self
    }

    pub fn ticket_uuid<T: Into<String>>(mut self, ticket_uuid: T) -> Self {
        self.ticket_uuid = Some(ticket_uuid.into());
        self
    }

    pub fn project_uuid<T: Into<String>>(mut self, project_uuid: T) -> Self {
        self.project_uuid = Some(project_uuid.into());
        self
    }

    pub fn message_uuid<T: Into<String>>(mut self, message_uuid: T) -> Self {
        self.message_uuid = Some(message_uuid.into());
        self
    }

    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn build(self) -> Result<ClientConfig> {
        let kind = self.kind;

        let endpoint = require(self.endpoint, kind.url_var())?;
        let token = require(self.token, env::RUN_TOKEN)?;
        let run_uuid = require(self.run_uuid, env::RUN_UUID)?;
        let ticket_uuid = self.ticket_uuid.filter(|v| !v.is_empty());
        if kind.requires_ticket() && ticket_uuid.is_none() {
            return Err(missing(env::TICKET_UUID));
        }

        if self.timeout_ms == 0 {
            return Err(FulcrumError::Config("Timeout must be greater than zero".to_string()));
        }
        if self.max_bytes == 0 {
            return Err(FulcrumError::Config("Max bytes must be greater than zero".to_string()));
        }

        Ok(ClientConfig {
            kind,
            endpoint,
            token,
            run_uuid,
            ticket_uuid,
            project_uuid: self.project_uuid.filter(|v| !v.is_empty()),
            message_uuid: self.message_uuid.filter(|v| !v.is_empty()),
            timeout: Duration::from_millis(self.timeout_ms),
            max_bytes: self.max_bytes,
            debug: self.debug,
        })
    }
}

/// Whether the `*_DEBUG` variable of `kind` is switched on (`1` or `true`).
pub fn debug_enabled<E: EnvSource + ?Sized>(kind: ClientKind, source: &E) -> bool {
    source
        .var(kind.debug_var())
        .is_some_and(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true"))
}

fn non_empty<E: EnvSource + ?Sized>(source: &E, key: &str) -> Option<String> {
    source.var(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// `FULCRUM_RUN_TOKEN` wins; `FULCRUM_DISPATCH_TOKEN` is still honoured with a warning.
fn resolve_token<E: EnvSource + ?Sized>(source: &E) -> Option<String> {
    if let Some(token) = non_empty(source, env::RUN_TOKEN) {
        return Some(token);
    }

    let token = non_empty(source, env::DEPRECATED_DISPATCH_TOKEN)?;
    warn!(
        "{} is deprecated, set {} instead",
        env::DEPRECATED_DISPATCH_TOKEN,
        env::RUN_TOKEN
    );
    Some(token)
}

fn parse_or_default<E, T>(source: &E, key: &str, default: T, debug: bool) -> T
where
    E: EnvSource + ?Sized,
    T: std::str::FromStr + PartialEq + Default + fmt::Display + Copy,
{
    let Some(raw) = non_empty(source, key) else {
        return default;
    };

    match raw.parse::<T>() {
        Ok(value) if value != T::default() => value,
        _ => {
            log_debug!(debug, "Ignoring invalid {key}={raw:?}, using {default}");
            default
        }
    }
}

fn require(value: Option<String>, var: &str) -> Result<String> {
    value.filter(|v| !v.is_empty()).ok_or_else(|| missing(var))
}

fn missing(var: &str) -> FulcrumError {
    FulcrumError::Config(format!("{var} is not set"))
}
