//! Property and component definitions.

use super::association::{AssociationDef, AssociationKind, ForeignKeyDirection};
use super::types::ScalarType;
use serde::{Deserialize, Serialize};

/// A property of an entity or component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDef {
    /// Property name (one path segment).
    pub name: String,
    /// What the property maps to.
    pub kind: PropertyKind,
}

/// The mapping shape of a property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyKind {
    /// A plain column.
    Scalar {
        /// Column name.
        column: String,
        /// Column type.
        scalar: ScalarType,
        /// Whether the column is nullable.
        nullable: bool,
    },
    /// A value-typed component stored in the owner's table.
    Component(ComponentDef),
    /// A reference to another entity or a collection.
    Association(AssociationDef),
}

/// A value-typed component (group of properties without identity).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentDef {
    /// Component type name.
    pub name: String,
    /// Component properties, in declaration order.
    pub properties: Vec<PropertyDef>,
}

impl PropertyDef {
    /// Create a non-nullable scalar property.
    pub fn scalar(name: impl Into<String>, column: impl Into<String>, scalar: ScalarType) -> Self {
        Self {
            name: name.into(),
            kind: PropertyKind::Scalar {
                column: column.into(),
                scalar,
                nullable: false,
            },
        }
    }

    /// Create a nullable scalar property.
    pub fn optional_scalar(
        name: impl Into<String>,
        column: impl Into<String>,
        scalar: ScalarType,
    ) -> Self {
        Self {
            name: name.into(),
            kind: PropertyKind::Scalar {
                column: column.into(),
                scalar,
                nullable: true,
            },
        }
    }

    /// Create a component property.
    pub fn component(name: impl Into<String>, component: ComponentDef) -> Self {
        Self {
            name: name.into(),
            kind: PropertyKind::Component(component),
        }
    }

    /// Create an association property.
    pub fn association(name: impl Into<String>, association: AssociationDef) -> Self {
        Self {
            name: name.into(),
            kind: PropertyKind::Association(association),
        }
    }

    /// Get the association if this property is one.
    pub fn as_association(&self) -> Option<&AssociationDef> {
        match &self.kind {
            PropertyKind::Association(association) => Some(association),
            _ => None,
        }
    }

    /// Columns this property occupies in its owner's table.
    ///
    /// Collections and inverse references live in other tables and
    /// contribute nothing.
    pub fn owner_columns(&self) -> Vec<String> {
        match &self.kind {
            PropertyKind::Scalar { column, .. } => vec![column.clone()],
            PropertyKind::Component(component) => component.columns(),
            PropertyKind::Association(association) => match &association.kind {
                AssociationKind::Entity(entity)
                    if entity.foreign_key == ForeignKeyDirection::FromParent =>
                {
                    entity.columns.clone()
                }
                AssociationKind::Component(component) => component.columns(),
                _ => Vec::new(),
            },
        }
    }
}

impl ComponentDef {
    /// Create an empty component.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Vec::new(),
        }
    }

    /// Add a property to the component.
    pub fn with_property(mut self, property: PropertyDef) -> Self {
        self.properties.push(property);
        self
    }

    /// Get a property by name.
    pub fn get_property(&self, name: &str) -> Option<&PropertyDef> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// All owner-table columns of the component, flattened in order.
    pub fn columns(&self) -> Vec<String> {
        self.properties
            .iter()
            .flat_map(PropertyDef::owner_columns)
            .collect()
    }

    /// Check if any property (at any nesting level) is an association.
    pub fn has_associations(&self) -> bool {
        self.properties.iter().any(|p| match &p.kind {
            PropertyKind::Association(_) => true,
            PropertyKind::Component(nested) => nested.has_associations(),
            PropertyKind::Scalar { .. } => false,
        })
    }
}
