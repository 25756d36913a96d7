//! Entity definitions.

use super::association::AssociationDef;
use super::filter::{Discriminator, EntityFilter};
use super::identifier::{IdentifierDef, IdentifierShape};
use super::property::PropertyDef;
use serde::{Deserialize, Serialize};

/// A persistent entity type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDef {
    /// Entity name (unique within schema).
    pub name: String,
    /// Mapped table.
    pub table: String,
    /// Identifier mapping.
    pub identifier: IdentifierDef,
    /// Non-identifier properties, in declaration order.
    #[serde(default)]
    pub properties: Vec<PropertyDef>,
    /// Discriminator restriction for types sharing a table.
    #[serde(default)]
    pub discriminator: Option<Discriminator>,
    /// Filter conditions applicable to this entity.
    #[serde(default)]
    pub filters: Vec<EntityFilter>,
}

impl EntityDef {
    /// Create a new entity definition.
    pub fn new(name: impl Into<String>, table: impl Into<String>, identifier: IdentifierDef) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            identifier,
            properties: Vec::new(),
            discriminator: None,
            filters: Vec::new(),
        }
    }

    /// Add a property.
    pub fn with_property(mut self, property: PropertyDef) -> Self {
        self.properties.push(property);
        self
    }

    /// Add an association property.
    pub fn with_association(self, name: impl Into<String>, association: AssociationDef) -> Self {
        self.with_property(PropertyDef::association(name, association))
    }

    /// Set the discriminator restriction.
    pub fn with_discriminator(mut self, discriminator: Discriminator) -> Self {
        self.discriminator = Some(discriminator);
        self
    }

    /// Attach a filter condition.
    pub fn with_filter(mut self, filter: EntityFilter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Get a property by name, including the identifier property of a
    /// composite key.
    pub fn get_property(&self, name: &str) -> Option<&PropertyDef> {
        self.properties.iter().find(|p| p.name == name).or_else(|| {
            self.identifier
                .component()
                .and_then(|component| component.get_property(name))
        })
    }

    /// Identifier shape.
    pub fn identifier_shape(&self) -> IdentifierShape {
        self.identifier.shape()
    }

    /// Identifier columns.
    pub fn identifier_columns(&self) -> Vec<String> {
        self.identifier.columns()
    }

    /// Iterate over association properties.
    pub fn associations(&self) -> impl Iterator<Item = (&str, &AssociationDef)> {
        self.properties
            .iter()
            .filter_map(|p| p.as_association().map(|a| (p.name.as_str(), a)))
    }
}
