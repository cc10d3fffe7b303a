//! Aegis Config - configuration schema, loading, and validation.
//!
//! Every ambient setting of an Aegis deployment lives in one TOML file:
//! field-encryption key provenance, audit flush policy, and the per-model
//! tenant-scope classifications the guard's registry is built from.
//! Defaults are development-safe; production settings (a secret-manager
//! key, a full model map) must be declared explicitly and are validated at
//! load time so misconfiguration fails startup rather than a request.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

mod config;
mod error;

pub use config::{AuditConfig, Config, EncryptionConfig, KeySource, ModelSection, ScopeConfig};
pub use error::{ConfigError, ConfigResult};
