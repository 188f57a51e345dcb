//! Core functionality for the Fulcrum runtime clients.
//!
//! This crate provides the pieces shared by the dispatch and improvements
//! clients: environment-derived configuration, payload redaction, envelope
//! assembly with size enforcement, and the authenticated HTTP transport.

mod macros;

pub mod config;
pub mod constants;
pub mod error;
pub mod http_client;
pub mod payload;
pub mod redaction;
pub mod schema;

pub use config::{ClientConfig, ClientConfigBuilder, ClientKind, EnvSource, FnEnv, ProcessEnv};
pub use error::{FulcrumError, Result};
pub use http_client::FulcrumHttpClient;
pub use payload::EnvelopeBuilder;
pub use redaction::{redact, RedactionPolicy};
pub use schema::{DispatchEntry, DispatchKind, TruncationMarker};

#[doc(hidden)]
pub use tracing as __tracing;

/// The version of the Fulcrum SDK.
pub const FULCRUM_SDK_VERSION: &str = env!("CARGO_PKG_VERSION");
