use chrono::{DateTime, Utc};
use fulcrum_core::config::{debug_enabled, ClientConfig, ClientKind, EnvSource, ProcessEnv};
use fulcrum_core::{
    log_debug, DispatchKind, EnvelopeBuilder, FulcrumHttpClient, RedactionPolicy, Result,
};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::models::{
    short_type_name, ApiCallPayload, DbPayload, ExternalRefPayload, ModelPayload, TextPayload,
};

/// Per-call options of [`DispatchClient::dispatch_with`].
#[derive(Clone, Debug, Default)]
pub struct DispatchOptions {
    source: Option<String>,
    client_ts: Option<DateTime<Utc>>,
    skip_redaction: bool,
}

impl DispatchOptions {
    /// Origin of the entry, `"sdk"` when unset.
    pub fn source<S: Into<String>>(mut self, source: S) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Client-side timestamp, the current time when unset.
    pub fn client_ts(mut self, client_ts: DateTime<Utc>) -> Self {
        self.client_ts = Some(client_ts);
        self
    }

    /// Send the payload without redaction. Only for payloads that are already sanitized.
    pub fn skip_redaction(mut self, skip: bool) -> Self {
        self.skip_redaction = skip;
        self
    }
}

struct Configured {
    config: ClientConfig,
    http: FulcrumHttpClient,
    policy: RedactionPolicy,
}

enum Mode {
    Configured(Configured),
    NoOp { debug: bool },
}

/// Best-effort dispatch client for the Fulcrum runtime.
///
/// Every method reports success as a `bool` and never returns an error:
/// configuration, serialization, transport and status failures all end up
/// as `false`. A client built from an incomplete environment is a no-op
/// that answers `false` without touching the network.
#[derive(Clone)]
pub struct DispatchClient {
    mode: Arc<Mode>,
}

impl DispatchClient {
    /// Build a configured client. Falls back to a no-op client if the HTTP
    /// transport cannot be created.
    pub fn new(config: ClientConfig) -> Self {
        Self::with_policy(config, RedactionPolicy::default())
    }

    /// Like [`DispatchClient::new`] with a custom redaction policy.
    pub fn with_policy(config: ClientConfig, policy: RedactionPolicy) -> Self {
        match FulcrumHttpClient::new(&config) {
            Ok(http) => DispatchClient {
                mode: Arc::new(Mode::Configured(Configured { config, http, policy })),
            },
            Err(e) => {
                log_debug!(config.debug, "Failed to create HTTP client, dispatch disabled: {e}");
                Self::noop_with_debug(config.debug)
            }
        }
    }

    /// A client that never sends anything.
    pub fn noop() -> Self {
        Self::noop_with_debug(false)
    }

    fn noop_with_debug(debug: bool) -> Self {
        DispatchClient { mode: Arc::new(Mode::NoOp { debug }) }
    }

    /// Create a client from the `FULCRUM_*` process environment.
    pub fn from_env() -> Self {
        Self::from_env_source(&ProcessEnv)
    }

    /// Create a client from an arbitrary variable source. Missing required
    /// variables produce a no-op client.
    pub fn from_env_source<E: EnvSource + ?Sized>(source: &E) -> Self {
        match ClientConfig::from_env_source(ClientKind::Dispatch, source) {
            Ok(config) => Self::new(config),
            Err(e) => {
                let debug = debug_enabled(ClientKind::Dispatch, source);
                log_debug!(debug, "Dispatch client is a no-op: {e}");
                Self::noop_with_debug(debug)
            }
        }
    }

    /// Whether the client is configured to send.
    pub fn enabled(&self) -> bool {
        matches!(*self.mode, Mode::Configured(_))
    }

    /// The resolved configuration, `None` for a no-op client.
    pub fn config(&self) -> Option<&ClientConfig> {
        match &*self.mode {
            Mode::Configured(configured) => Some(&configured.config),
            Mode::NoOp { .. } => None,
        }
    }

    /// Send one entry with default options.
    pub async fn dispatch<K: Into<DispatchKind>>(
        &self,
        kind: K,
        summary: &str,
        payload: Option<Value>,
    ) -> bool {
        self.dispatch_with(kind, summary, payload, DispatchOptions::default()).await
    }

    /// Send one entry. Returns `true` only on a 2xx answer.
    pub async fn dispatch_with<K: Into<DispatchKind>>(
        &self,
        kind: K,
        summary: &str,
        payload: Option<Value>,
        options: DispatchOptions,
    ) -> bool {
        self.send(kind.into(), summary, Ok(payload), options).await
    }

    /// Dispatch a text milestone.
    pub async fn dispatch_text(&self, summary: &str, text: Option<&str>) -> bool {
        let payload = to_payload(&TextPayload { text: text.map(str::to_string) });
        self.send(DispatchKind::Text, summary, payload, DispatchOptions::default()).await
    }

    /// Dispatch a JSON data event; the value is redacted like any other payload.
    pub async fn dispatch_json(&self, summary: &str, payload: Value) -> bool {
        self.send(DispatchKind::Json, summary, Ok(Some(payload)), DispatchOptions::default())
            .await
    }

    /// Dispatch an API call event. `details` are merged next to `service` and `operation`.
    pub async fn dispatch_api_call(
        &self,
        summary: &str,
        service: &str,
        operation: &str,
        details: Map<String, Value>,
    ) -> bool {
        let payload = to_payload(&ApiCallPayload::new(service, operation, details));
        self.send(DispatchKind::ApiCall, summary, payload, DispatchOptions::default()).await
    }

    /// Dispatch a pointer to an external resource.
    pub async fn dispatch_external_ref(
        &self,
        summary: &str,
        provider: &str,
        ref_type: &str,
        ref_id: &str,
        url: Option<&str>,
    ) -> bool {
        let payload = to_payload(&ExternalRefPayload {
            provider: provider.to_string(),
            ref_type: ref_type.to_string(),
            ref_id: ref_id.to_string(),
            url: url.map(str::to_string),
        });
        self.send(DispatchKind::ExternalRef, summary, payload, DispatchOptions::default()).await
    }

    /// Dispatch a database operation. `rows` is sent as `count`.
    pub async fn dispatch_db(
        &self,
        summary: &str,
        operation: &str,
        table: &str,
        rows: Option<u64>,
        query: Option<&str>,
    ) -> bool {
        let payload = to_payload(&DbPayload {
            operation: operation.to_string(),
            table: table.to_string(),
            count: rows,
            query: query.map(str::to_string),
        });
        self.send(DispatchKind::Db, summary, payload, DispatchOptions::default()).await
    }

    /// Dispatch a snapshot of any serializable model.
    pub async fn dispatch_model<M: Serialize + ?Sized>(
        &self,
        summary: &str,
        model: &M,
        input_summary: Option<&str>,
    ) -> bool {
        let payload = serde_json::to_value(model).map_err(Into::into).and_then(|data| {
            to_payload(&ModelPayload {
                model_name: short_type_name::<M>().to_string(),
                data,
                input_summary: input_summary.map(str::to_string),
            })
        });
        self.send(DispatchKind::Model, summary, payload, DispatchOptions::default()).await
    }

    async fn send(
        &self,
        kind: DispatchKind,
        summary: &str,
        payload: Result<Option<Value>>,
        options: DispatchOptions,
    ) -> bool {
        let configured = match &*self.mode {
            Mode::Configured(configured) => configured,
            Mode::NoOp { debug } => {
                log_debug!(*debug, "Client not enabled, skipping dispatch");
                return false;
            }
        };
        let debug = configured.config.debug;

        match Self::try_send(configured, kind, summary, payload, options).await {
            Ok(()) => {
                log_debug!(debug, "Dispatch succeeded");
                true
            }
            Err(e) => {
                log_debug!(debug, "Dispatch failed: {e}");
                false
            }
        }
    }

    async fn try_send(
        configured: &Configured,
        kind: DispatchKind,
        summary: &str,
        payload: Result<Option<Value>>,
        options: DispatchOptions,
    ) -> Result<()> {
        let mut builder = EnvelopeBuilder::new(&configured.config, kind, summary)
            .payload(payload?)
            .client_ts(options.client_ts)
            .skip_redaction(options.skip_redaction);
        if let Some(source) = options.source {
            builder = builder.source(source);
        }
        let entry = builder.build(&configured.policy)?;

        log_debug!(
            configured.config.debug,
            "Sending dispatch: {} - {}",
            entry.kind,
            entry.summary.chars().take(50).collect::<String>()
        );
        configured.http.post_json(&configured.config.endpoint, &entry).await
    }
}

/// Equivalent to [`DispatchClient::from_env`].
pub fn dispatch_client() -> DispatchClient {
    DispatchClient::from_env()
}

fn to_payload<T: Serialize>(payload: &T) -> Result<Option<Value>> {
    Ok(Some(serde_json::to_value(payload)?))
}
