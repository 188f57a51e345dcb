use fulcrum_core::config::{debug_enabled, ClientConfig, ClientKind, EnvSource, ProcessEnv};
use fulcrum_core::http_client::join_url;
use fulcrum_core::payload::sanitize_payload;
use fulcrum_core::{log_debug, FulcrumHttpClient, RedactionPolicy, Result};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::models::{Improvement, ImprovementEvent, ImprovementUpdate, ListResponse, NewImprovement};

#[derive(Serialize)]
struct CreateRequest<'a> {
    run_uuid: &'a str,
    #[serde(flatten)]
    improvement: &'a NewImprovement,
    #[serde(skip_serializing_if = "Option::is_none")]
    project_uuid: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ticket_uuid: Option<&'a str>,
}

#[derive(Serialize)]
struct UpdateRequest<'a> {
    run_uuid: &'a str,
    #[serde(flatten)]
    fields: &'a ImprovementUpdate,
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

/// Best-effort client for the improvements endpoint.
///
/// Writes report success as `bool`, reads return an empty list on any
/// failure. Nothing is ever returned as an error, and a client built from an
/// incomplete environment never touches the network.
#[derive(Clone)]
pub struct ImprovementsClient {
    mode: Arc<Mode>,
}

impl ImprovementsClient {
    pub fn new(config: ClientConfig) -> Self {
        Self::with_policy(config, RedactionPolicy::default())
    }

    /// Like [`ImprovementsClient::new`] with a custom redaction policy for event payloads.
    pub fn with_policy(config: ClientConfig, policy: RedactionPolicy) -> Self {
        match FulcrumHttpClient::new(&config) {
            Ok(http) => ImprovementsClient {
                mode: Arc::new(Mode::Configured(Configured { config, http, policy })),
            },
            Err(e) => {
                log_debug!(
                    config.debug,
                    "Failed to create HTTP client, improvements disabled: {e}"
                );
                Self::noop_with_debug(config.debug)
            }
        }
    }

    pub fn noop() -> Self {
        Self::noop_with_debug(false)
    }

    fn noop_with_debug(debug: bool) -> Self {
        ImprovementsClient { mode: Arc::new(Mode::NoOp { debug }) }
    }

    /// Create a client from the `FULCRUM_*` process environment.
    pub fn from_env() -> Self {
        Self::from_env_source(&ProcessEnv)
    }

    pub fn from_env_source<E: EnvSource + ?Sized>(source: &E) -> Self {
        match ClientConfig::from_env_source(ClientKind::Improvements, source) {
            Ok(config) => Self::new(config),
            Err(e) => {
                let debug = debug_enabled(ClientKind::Improvements, source);
                log_debug!(debug, "Improvements client is a no-op: {e}");
                Self::noop_with_debug(debug)
            }
        }
    }

    pub fn enabled(&self) -> bool {
        matches!(*self.mode, Mode::Configured(_))
    }

    pub fn config(&self) -> Option<&ClientConfig> {
        match &*self.mode {
            Mode::Configured(configured) => Some(&configured.config),
            Mode::NoOp { .. } => None,
        }
    }

    /// List improvements of the current run, filtered by `project_uuid` or
    /// else the configured project. All or nothing: any failure yields `[]`.
    pub async fn list_improvements(&self, project_uuid: Option<&str>) -> Vec<Improvement> {
        let Some(configured) = self.configured("list") else {
            return Vec::new();
        };

        match Self::try_list(configured, project_uuid).await {
            Ok(improvements) => {
                log_debug!(configured.config.debug, "Listed {} improvements", improvements.len());
                improvements
            }
            Err(e) => {
                log_debug!(configured.config.debug, "List failed: {e}");
                Vec::new()
            }
        }
    }

    pub async fn create_improvement(&self, improvement: &NewImprovement) -> bool {
        let Some(configured) = self.configured("create") else {
            return false;
        };
        let result = Self::try_create(configured, improvement).await;
        Self::report(configured, "Create", result)
    }

    /// Partially update an improvement; only the fields set in `fields` are sent.
    /// An update without any field set returns `false` without a request.
    pub async fn update_improvement(&self, uuid: &str, fields: &ImprovementUpdate) -> bool {
        let Some(configured) = self.configured("update") else {
            return false;
        };
        let result = Self::try_update(configured, uuid, fields).await;
        Self::report(configured, "Update", result)
    }

    pub async fn delete_improvement(&self, uuid: &str) -> bool {
        let Some(configured) = self.configured("delete") else {
            return false;
        };
        let result = Self::try_delete(configured, uuid).await;
        Self::report(configured, "Delete", result)
    }

    /// Record an action taken on an improvement. The payload is redacted and
    /// size-bounded exactly like a dispatch payload.
    pub async fn emit_improvement_event(
        &self,
        improvement_uuid: &str,
        action: &str,
        payload: Option<Value>,
    ) -> bool {
        let Some(configured) = self.configured("event") else {
            return false;
        };
        let result = Self::try_emit(configured, improvement_uuid, action, payload).await;
        Self::report(configured, "Event", result)
    }

    fn configured(&self, operation: &str) -> Option<&Configured> {
        match &*self.mode {
            Mode::Configured(configured) => Some(configured),
            Mode::NoOp { debug } => {
                log_debug!(*debug, "Client not enabled, skipping {operation}");
                None
            }
        }
    }

    fn report(configured: &Configured, operation: &str, result: Result<()>) -> bool {
        match result {
            Ok(()) => {
                log_debug!(configured.config.debug, "{operation} succeeded");
                true
            }
            Err(e) => {
                log_debug!(configured.config.debug, "{operation} failed: {e}");
                false
            }
        }
    }

    async fn try_list(
        configured: &Configured,
        project_uuid: Option<&str>,
    ) -> Result<Vec<Improvement>> {
        let config = &configured.config;
        let mut query = vec![("run_uuid", config.run_uuid.as_str())];
        if let Some(project_uuid) = project_uuid.or(config.project_uuid.as_deref()) {
            query.push(("project_uuid", project_uuid));
        }

        let response: ListResponse = configured.http.get_json(&config.endpoint, &query).await?;
        Ok(response.into_improvements())
    }

    async fn try_create(configured: &Configured, improvement: &NewImprovement) -> Result<()> {
        improvement.validate()?;
        let config = &configured.config;
        let body = CreateRequest {
            run_uuid: &config.run_uuid,
            improvement,
            project_uuid: config.project_uuid.as_deref(),
            ticket_uuid: config.ticket_uuid.as_deref(),
        };

        log_debug!(
            config.debug,
            "Creating improvement: {}",
            improvement.title.chars().take(50).collect::<String>()
        );
        configured.http.post_json(&config.endpoint, &body).await
    }

    async fn try_update(
        configured: &Configured,
        uuid: &str,
        fields: &ImprovementUpdate,
    ) -> Result<()> {
        fields.validate()?;
        let config = &configured.config;
        let url = join_url(&config.endpoint, &[uuid])?;
        let body = UpdateRequest { run_uuid: &config.run_uuid, fields };

        log_debug!(config.debug, "Updating improvement: {uuid}");
        configured.http.patch_json(&url, &body).await
    }

    async fn try_delete(configured: &Configured, uuid: &str) -> Result<()> {
        let config = &configured.config;
        let url = join_url(&config.endpoint, &[uuid])?;

        log_debug!(config.debug, "Deleting improvement: {uuid}");
        configured.http.delete(&url, &[("run_uuid", config.run_uuid.as_str())]).await
    }

    async fn try_emit(
        configured: &Configured,
        improvement_uuid: &str,
        action: &str,
        payload: Option<Value>,
    ) -> Result<()> {
        let config = &configured.config;
        let payload = payload
            .map(|p| sanitize_payload(&p, &configured.policy, false, config.max_bytes))
            .transpose()?;
        let event = ImprovementEvent {
            run_uuid: &config.run_uuid,
            improvement_uuid,
            action,
            payload,
        };
        event.validate()?;
        let url = join_url(&config.endpoint, &[improvement_uuid, "events"])?;

        log_debug!(config.debug, "Emitting event: {action} for {improvement_uuid}");
        configured.http.post_json(&url, &event).await
    }
}

/// Equivalent to [`ImprovementsClient::from_env`].
pub fn improvements_client() -> ImprovementsClient {
    ImprovementsClient::from_env()
}
