//! Best-effort improvements client for the Fulcrum runtime.
//!
//! Improvements are suggestion or defect records kept by the Fulcrum
//! service. This crate lists, creates, updates and deletes them and records
//! events against them, with the same no-op and never-fail behaviour as the
//! dispatch client.

mod client;
pub mod models;

pub use client::{improvements_client, ImprovementsClient};
pub use fulcrum_core::{ClientConfig, ClientKind, RedactionPolicy};
pub use models::{Improvement, ImprovementStatus, ImprovementUpdate, NewImprovement};
