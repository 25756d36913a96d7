//! Schema bundle - versioned snapshot of the entity metadata.

use super::association::{AssociationDef, AssociationKind, ElementKind};
use super::property::{ComponentDef, PropertyDef, PropertyKind};
use super::{EntityDef, FilterDef};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A versioned snapshot of the entity metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaBundle {
    /// Schema version (monotonically increasing once applied to a catalog).
    #[serde(default)]
    pub version: u64,
    /// Entity definitions keyed by name.
    #[serde(with = "entity_list")]
    pub entities: BTreeMap<String, EntityDef>,
    /// Declared row filters.
    #[serde(default)]
    pub filters: Vec<FilterDef>,
}

impl SchemaBundle {
    /// Create an empty schema bundle.
    pub fn new(version: u64) -> Self {
        Self {
            version,
            entities: BTreeMap::new(),
            filters: Vec::new(),
        }
    }

    /// Add an entity to the schema.
    pub fn with_entity(mut self, entity: EntityDef) -> Self {
        self.entities.insert(entity.name.clone(), entity);
        self
    }

    /// Declare a filter.
    pub fn with_filter(mut self, filter: FilterDef) -> Self {
        self.filters.push(filter);
        self
    }

    /// Get an entity by name.
    pub fn get_entity(&self, name: &str) -> Option<&EntityDef> {
        self.entities.get(name)
    }

    /// Get an entity by name or fail with [`Error::UnknownEntity`].
    pub fn entity(&self, name: &str) -> Result<&EntityDef> {
        self.get_entity(name)
            .ok_or_else(|| Error::UnknownEntity(name.to_string()))
    }

    /// Get a filter definition by name.
    pub fn get_filter(&self, name: &str) -> Option<&FilterDef> {
        self.filters.iter().find(|f| f.name == name)
    }

    /// List all entity names.
    pub fn entity_names(&self) -> Vec<&str> {
        self.entities.keys().map(|s| s.as_str()).collect()
    }

    /// Parse a schema bundle from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the schema bundle to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check the bundle for malformed identifiers and associations.
    pub fn validate(&self) -> Result<()> {
        for entity in self.entities.values() {
            entity.identifier.validate(&entity.name)?;
            if let Some(component) = entity.identifier.component() {
                self.validate_component(&entity.name, component)?;
            }
            for property in &entity.properties {
                self.validate_property(&entity.name, property)?;
            }
            if let Some(discriminator) = &entity.discriminator {
                if discriminator.values.is_empty() {
                    return Err(Error::configuration(format!(
                        "discriminator of entity '{}' declares no values",
                        entity.name
                    )));
                }
            }
            for filter in &entity.filters {
                if self.get_filter(&filter.name).is_none() {
                    return Err(Error::configuration(format!(
                        "entity '{}' references undeclared filter '{}'",
                        entity.name, filter.name
                    )));
                }
            }
        }
        Ok(())
    }

    fn validate_component(&self, owner: &str, component: &ComponentDef) -> Result<()> {
        let owner = format!("{}.{}", owner, component.name);
        for property in &component.properties {
            self.validate_property(&owner, property)?;
        }
        Ok(())
    }

    fn validate_property(&self, owner: &str, property: &PropertyDef) -> Result<()> {
        match &property.kind {
            PropertyKind::Scalar { .. } => Ok(()),
            PropertyKind::Component(component) => self.validate_component(owner, component),
            PropertyKind::Association(association) => {
                self.validate_association(owner, &property.name, association)
            }
        }
    }

    fn validate_association(
        &self,
        owner: &str,
        name: &str,
        association: &AssociationDef,
    ) -> Result<()> {
        let malformed = |what: &str| {
            Err(Error::configuration(format!(
                "association '{}.{}' {}",
                owner, name, what
            )))
        };

        if let Some(target) = association.target_entity() {
            if self.get_entity(target).is_none() {
                return malformed(&format!("targets unknown entity '{}'", target));
            }
        }

        match &association.kind {
            AssociationKind::Entity(entity) if entity.columns.is_empty() => {
                malformed("declares no join columns")
            }
            AssociationKind::Entity(_) => Ok(()),
            AssociationKind::Collection(collection) => {
                if collection.key_columns.is_empty() {
                    return malformed("declares no key columns");
                }
                match &collection.element {
                    ElementKind::OneToMany { .. } => Ok(()),
                    _ if collection.table.is_none() => malformed("declares no collection table"),
                    ElementKind::ManyToMany { columns, .. } if columns.is_empty() => {
                        malformed("declares no element columns")
                    }
                    ElementKind::Component(component) => self.validate_component(owner, component),
                    _ => Ok(()),
                }
            }
            AssociationKind::Component(component) => self.validate_component(owner, component),
        }
    }
}

impl Default for SchemaBundle {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Entities travel as a list in JSON; the name inside each entry is the key.
mod entity_list {
    use super::EntityDef;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S>(entities: &BTreeMap<String, EntityDef>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let list: Vec<&EntityDef> = entities.values().collect();
        list.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BTreeMap<String, EntityDef>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let list = Vec::<EntityDef>::deserialize(deserializer)?;
        Ok(list.into_iter().map(|e| (e.name.clone(), e)).collect())
    }
}
