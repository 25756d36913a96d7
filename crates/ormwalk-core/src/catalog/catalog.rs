//! Catalog manager holding the current schema snapshot.

use super::{EntityDef, SchemaBundle};
use crate::error::Result;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// The catalog manager for entity metadata.
///
/// Planning passes never read the catalog directly; they take an immutable
/// [`SchemaBundle`] snapshot so a concurrent schema swap cannot change the
/// metadata halfway through a walk.
pub struct Catalog {
    /// Current schema version (cached).
    current_version: AtomicU64,
    /// Current schema.
    current_schema: RwLock<Arc<SchemaBundle>>,
}

impl Catalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self {
            current_version: AtomicU64::new(0),
            current_schema: RwLock::new(Arc::new(SchemaBundle::default())),
        }
    }

    /// Create a catalog and apply `bundle` as its first schema.
    pub fn with_schema(bundle: SchemaBundle) -> Result<Self> {
        let catalog = Self::new();
        catalog.apply_schema(bundle)?;
        Ok(catalog)
    }

    /// Get the current schema version.
    pub fn current_version(&self) -> u64 {
        self.current_version.load(Ordering::SeqCst)
    }

    /// Apply a new schema bundle.
    ///
    /// The bundle is validated first; a malformed bundle leaves the current
    /// schema untouched. Returns the new version number.
    pub fn apply_schema(&self, mut bundle: SchemaBundle) -> Result<u64> {
        bundle.validate()?;

        let mut guard = self.current_schema.write();
        let new_version = self.current_version() + 1;
        bundle.version = new_version;
        *guard = Arc::new(bundle);
        self.current_version.store(new_version, Ordering::SeqCst);

        tracing::info!(version = new_version, "schema applied");
        Ok(new_version)
    }

    /// Immutable snapshot of the current schema.
    pub fn snapshot(&self) -> Arc<SchemaBundle> {
        self.current_schema.read().clone()
    }

    /// Get an entity definition by name from the current schema.
    pub fn get_entity(&self, name: &str) -> Option<EntityDef> {
        self.current_schema.read().get_entity(name).cloned()
    }

    /// List all entity names in the current schema.
    pub fn list_entities(&self) -> Vec<String> {
        self.current_schema
            .read()
            .entity_names()
            .into_iter()
            .map(String::from)
            .collect()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ComponentDef, IdentifierDef, ScalarType};
    use crate::error::Error;

    fn sample_schema() -> SchemaBundle {
        SchemaBundle::new(0).with_entity(EntityDef::new(
            "Customer",
            "customers",
            IdentifierDef::simple("id", "id", ScalarType::Int64),
        ))
    }

    #[test]
    fn test_apply_schema_bumps_version() {
        let catalog = Catalog::new();
        assert_eq!(catalog.current_version(), 0);

        assert_eq!(catalog.apply_schema(sample_schema()).unwrap(), 1);
        assert_eq!(catalog.apply_schema(sample_schema()).unwrap(), 2);
        assert_eq!(catalog.snapshot().version, 2);
        assert_eq!(catalog.list_entities(), vec!["Customer"]);
        assert!(catalog.get_entity("Customer").is_some());
    }

    #[test]
    fn test_invalid_schema_keeps_previous() {
        let catalog = Catalog::with_schema(sample_schema()).unwrap();
        let broken = SchemaBundle::new(0).with_entity(EntityDef::new(
            "Broken",
            "broken",
            IdentifierDef::composite("id", ComponentDef::new("Empty")),
        ));

        assert!(matches!(
            catalog.apply_schema(broken),
            Err(Error::Configuration(_))
        ));
        assert_eq!(catalog.current_version(), 1);
        assert!(catalog.get_entity("Broken").is_none());
    }

    #[test]
    fn test_snapshot_survives_schema_swap() {
        let catalog = Catalog::with_schema(sample_schema()).unwrap();
        let before = catalog.snapshot();
        catalog.apply_schema(SchemaBundle::new(0)).unwrap();

        assert!(before.get_entity("Customer").is_some());
        assert!(catalog.snapshot().get_entity("Customer").is_none());
    }
}
