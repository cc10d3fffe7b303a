//! The model classification registry.
//!
//! A static, exhaustive mapping from entity type to tenant scope, built
//! once at startup and validated for completeness against the real set of
//! entity types the data-access layer exposes. An unclassified
//! tenant-bearing type is a latent vulnerability; validation failing
//! startup is the intended behavior.

use aegis_core::{SecurityError, SecurityResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Whether a model's rows are partitioned by tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelScope {
    /// Every row belongs to exactly one tenant; all operations are
    /// confined to the caller's tenant.
    TenantScoped,
    /// Not partitioned by tenant (e.g. the tenant registry itself);
    /// operations pass through untouched.
    SystemScoped,
}

/// Registration record for one entity type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelEntry {
    /// Tenant scope classification.
    pub scope: ModelScope,
    /// Field names whose values are encrypted at rest.
    pub encrypted_fields: Vec<String>,
}

/// Static registry of every entity type the data-access layer exposes.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: BTreeMap<String, ModelEntry>,
}

impl ModelRegistry {
    /// Start building a registry.
    #[must_use]
    pub fn builder() -> ModelRegistryBuilder {
        ModelRegistryBuilder::default()
    }

    /// Build a registry from the configuration surface.
    #[must_use]
    pub fn from_config(config: &aegis_config::Config) -> Self {
        let mut builder = Self::builder();
        for (model, section) in &config.models {
            builder = match section.scope {
                aegis_config::ScopeConfig::TenantScoped => builder.tenant_scoped_encrypted(
                    model.clone(),
                    section.encrypted_fields.clone(),
                ),
                aegis_config::ScopeConfig::SystemScoped => builder.system_scoped(model.clone()),
            };
        }
        builder.build()
    }

    /// Classification of a model, or `None` when unregistered.
    #[must_use]
    pub fn scope_of(&self, model: &str) -> Option<ModelScope> {
        self.models.get(model).map(|entry| entry.scope)
    }

    /// Encrypted field names registered for a model.
    #[must_use]
    pub fn encrypted_fields(&self, model: &str) -> &[String] {
        self.models
            .get(model)
            .map_or(&[], |entry| entry.encrypted_fields.as_slice())
    }

    /// Validate that every known entity type is classified.
    ///
    /// Call this at startup with the full set of entity types the
    /// data-access layer exposes.
    ///
    /// # Errors
    ///
    /// Returns [`SecurityError::UnclassifiedModel`] naming every gap.
    pub fn validate_complete<'a>(
        &self,
        known_models: impl IntoIterator<Item = &'a str>,
    ) -> SecurityResult<()> {
        let missing: Vec<&str> = known_models
            .into_iter()
            .filter(|model| !self.models.contains_key(*model))
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(SecurityError::UnclassifiedModel {
                model: missing.join(", "),
            })
        }
    }

    /// Number of registered models.
    #[must_use]
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

/// Builder for [`ModelRegistry`].
#[derive(Debug, Default)]
pub struct ModelRegistryBuilder {
    models: BTreeMap<String, ModelEntry>,
}

impl ModelRegistryBuilder {
    /// Register a tenant-scoped model with no encrypted fields.
    #[must_use]
    pub fn tenant_scoped(self, model: impl Into<String>) -> Self {
        self.tenant_scoped_encrypted(model, Vec::new())
    }

    /// Register a tenant-scoped model with encrypted field names.
    #[must_use]
    pub fn tenant_scoped_encrypted(
        mut self,
        model: impl Into<String>,
        encrypted_fields: Vec<String>,
    ) -> Self {
        self.models.insert(
            model.into(),
            ModelEntry {
                scope: ModelScope::TenantScoped,
                encrypted_fields,
            },
        );
        self
    }

    /// Register a system-scoped model.
    #[must_use]
    pub fn system_scoped(mut self, model: impl Into<String>) -> Self {
        self.models.insert(
            model.into(),
            ModelEntry {
                scope: ModelScope::SystemScoped,
                encrypted_fields: Vec::new(),
            },
        );
        self
    }

    /// Finish building.
    #[must_use]
    pub fn build(self) -> ModelRegistry {
        ModelRegistry {
            models: self.models,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ModelRegistry {
        ModelRegistry::builder()
            .tenant_scoped("Client")
            .tenant_scoped_encrypted("Document", vec!["ssn".into(), "account_number".into()])
            .system_scoped("Organization")
            .build()
    }

    #[test]
    fn classifies_models() {
        let registry = registry();
        assert_eq!(registry.scope_of("Client"), Some(ModelScope::TenantScoped));
        assert_eq!(
            registry.scope_of("Organization"),
            Some(ModelScope::SystemScoped)
        );
        assert_eq!(registry.scope_of("Invoice"), None);
    }

    #[test]
    fn exposes_encrypted_fields() {
        let registry = registry();
        assert_eq!(registry.encrypted_fields("Document"), ["ssn", "account_number"]);
        assert!(registry.encrypted_fields("Client").is_empty());
        assert!(registry.encrypted_fields("Unknown").is_empty());
    }

    #[test]
    fn from_config_maps_scopes_and_encrypted_fields() {
        let mut models = BTreeMap::new();
        models.insert(
            "Client".to_owned(),
            aegis_config::ModelSection {
                scope: aegis_config::ScopeConfig::TenantScoped,
                encrypted_fields: Vec::new(),
            },
        );
        models.insert(
            "Document".to_owned(),
            aegis_config::ModelSection {
                scope: aegis_config::ScopeConfig::TenantScoped,
                encrypted_fields: vec!["ssn".into()],
            },
        );
        models.insert(
            "Organization".to_owned(),
            aegis_config::ModelSection {
                scope: aegis_config::ScopeConfig::SystemScoped,
                encrypted_fields: Vec::new(),
            },
        );
        let config = aegis_config::Config {
            models,
            ..Default::default()
        };

        let registry = ModelRegistry::from_config(&config);
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.scope_of("Client"), Some(ModelScope::TenantScoped));
        assert_eq!(
            registry.scope_of("Organization"),
            Some(ModelScope::SystemScoped)
        );
        assert_eq!(registry.encrypted_fields("Document"), ["ssn"]);
    }

    #[test]
    fn completeness_validation_names_every_gap() {
        let registry = registry();
        registry
            .validate_complete(["Client", "Document", "Organization"])
            .unwrap();

        let err = registry
            .validate_complete(["Client", "Invoice", "Engagement"])
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Invoice"));
        assert!(msg.contains("Engagement"));
        assert!(!msg.contains("Client,"));
    }
}
