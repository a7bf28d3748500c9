//! dogear-core - Core library for Dogear
//!
//! This crate contains the annotation data model, the sandbox/host message
//! protocol, the local-first highlight store, and the reconciliation engine
//! shared by the reading clients. The sandbox-side document runtime lives in
//! the companion `dogear-surface` crate.

pub mod auth;
pub mod config;
pub mod controller;
pub mod error;
pub mod models;
pub mod protocol;
pub mod store;
pub mod sync;
pub mod util;

pub use error::{Error, Result};
pub use models::{Highlight, HighlightColor, HighlightId, SyncStatus};
