//! Convenient single import for config consumers.

pub use crate::config::{
    AuditConfig, Config, EncryptionConfig, KeySource, ModelSection, ScopeConfig,
};
pub use crate::error::{ConfigError, ConfigResult};
