//! Best-effort dispatch client for the Fulcrum runtime.
//!
//! Reports milestones, API calls, database operations and model snapshots of
//! a run to the dispatch endpoint without ever failing the caller:
//!
//! ```no_run
//! # async fn run() {
//! let client = fulcrum_dispatch::DispatchClient::from_env();
//! client.dispatch_text("Fetched invoices", Some("42 invoices found")).await;
//! # }
//! ```

mod client;
pub mod models;

pub use client::{dispatch_client, DispatchClient, DispatchOptions};
pub use fulcrum_core::{ClientConfig, ClientKind, DispatchKind, RedactionPolicy};
pub use models::{ApiCallPayload, DbPayload, ExternalRefPayload, ModelPayload, TextPayload};
