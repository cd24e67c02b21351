//! # upsync-core
//!
//! Core library for upsync: input validation, credential resolution, the
//! sync orchestrator and its audit log.
//!
//! Control flows validator → resolver → orchestrator, with every step
//! recorded in an [`AuditLog`] that the caller constructs and passes in.
//!
//! # Security
//!
//! Tokens are held as `SecretString` and only exposed when the remote
//! address is handed to git. Anything written to the audit log is redacted.

pub mod audit;
pub mod auth;
pub mod branch_name;
pub mod config;
mod error;
pub mod request;
pub mod service;
pub mod sync;
pub mod validate;

#[cfg(test)]
mod test_mocks;

pub use audit::{AuditLog, Level, MemoryLog, default_log_path};
pub use auth::{RemoteEndpoint, resolve_endpoint};
pub use branch_name::BranchName;
pub use config::Config;
pub use error::{Error, Result};
pub use request::{AuthMode, SyncRequest};
pub use service::{SyncContext, sync_repository, try_sync_repository};
pub use sync::{Orchestrator, Stage, SyncOutcome};
pub use validate::{ValidationError, validate_inputs};
