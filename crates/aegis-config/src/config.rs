//! The configuration schema.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

use crate::error::{ConfigError, ConfigResult};

/// Top-level service configuration.
///
/// The encryption and audit sections have development-safe defaults. Model
/// classifications have no default: a deployment must declare every entity
/// type it exposes, and validation rejects an empty model map.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Field encryption settings.
    #[serde(default)]
    pub encryption: EncryptionConfig,
    /// Audit logger settings.
    #[serde(default)]
    pub audit: AuditConfig,
    /// Tenant-scope classification per model, keyed by entity type name.
    #[serde(default)]
    pub models: BTreeMap<String, ModelSection>,
}

/// Field encryption settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EncryptionConfig {
    /// Where the data key comes from.
    #[serde(default)]
    pub key_source: KeySource,
    /// Secret name to resolve when `key_source` is `secret_manager`.
    #[serde(default)]
    pub secret_name: Option<String>,
}

impl Default for EncryptionConfig {
    fn default() -> Self {
        Self {
            key_source: KeySource::LocalDev,
            secret_name: None,
        }
    }
}

/// Data key provenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeySource {
    /// Deterministic development key. Never for production data.
    #[default]
    LocalDev,
    /// Resolve the key from the deployment's secret manager.
    SecretManager,
}

/// Audit logger settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditConfig {
    /// Seconds between timer-driven flushes.
    #[serde(default = "default_flush_interval_secs")]
    pub flush_interval_secs: u64,
    /// Maximum buffered events before low-risk eviction.
    #[serde(default = "default_buffer_cap")]
    pub buffer_cap: usize,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            flush_interval_secs: default_flush_interval_secs(),
            buffer_cap: default_buffer_cap(),
        }
    }
}

fn default_flush_interval_secs() -> u64 {
    30
}

fn default_buffer_cap() -> usize {
    1000
}

/// Classification of one model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelSection {
    /// Tenant scope of the model.
    pub scope: ScopeConfig,
    /// Field names encrypted at rest. Only meaningful for tenant-scoped
    /// models.
    #[serde(default)]
    pub encrypted_fields: Vec<String>,
}

/// Declared tenant scope of a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeConfig {
    /// Rows are partitioned by tenant.
    TenantScoped,
    /// Not partitioned; passes through the guard untouched.
    SystemScoped,
}

impl Config {
    /// Load and validate a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] or [`ConfigError::Parse`] when the file
    /// cannot be read or parsed, and [`ConfigError::Invalid`] when the
    /// parsed configuration fails [`validate`](Self::validate).
    pub fn load_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        config.validate()?;
        debug!(
            models = config.models.len(),
            path = %path.display(),
            "configuration loaded"
        );
        Ok(config)
    }

    /// Check internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when:
    /// - no models are declared (an unclassified deployment cannot be
    ///   tenant-safe)
    /// - the key source is `secret_manager` but no secret name is set
    /// - a system-scoped model declares encrypted fields
    /// - the audit buffer cap is zero
    pub fn validate(&self) -> ConfigResult<()> {
        if self.models.is_empty() {
            return Err(ConfigError::Invalid {
                reason: "at least one [models.*] section must be declared".into(),
            });
        }

        if self.encryption.key_source == KeySource::SecretManager
            && self.encryption.secret_name.as_deref().unwrap_or("").is_empty()
        {
            return Err(ConfigError::Invalid {
                reason: "encryption.key_source = secret_manager requires encryption.secret_name"
                    .into(),
            });
        }

        for (model, section) in &self.models {
            if section.scope == ScopeConfig::SystemScoped && !section.encrypted_fields.is_empty() {
                return Err(ConfigError::Invalid {
                    reason: format!(
                        "model {model} is system_scoped but declares encrypted_fields"
                    ),
                });
            }
        }

        if self.audit.buffer_cap == 0 {
            return Err(ConfigError::Invalid {
                reason: "audit.buffer_cap must be at least 1".into(),
            });
        }

        Ok(())
    }
}
