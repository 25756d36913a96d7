//! Identifier (primary key) definitions.

use super::property::ComponentDef;
use super::types::ScalarType;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// How an entity's primary key is mapped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IdentifierDef {
    /// Single-column key.
    Simple {
        /// Identifier property name.
        property: String,
        /// Key column.
        column: String,
        /// Key type.
        scalar: ScalarType,
    },
    /// Multi-column key whose parts are properties of the entity itself.
    Embedded {
        /// Key parts.
        component: ComponentDef,
    },
    /// Multi-column key held by a separate identifier component.
    Composite {
        /// Identifier property name.
        property: String,
        /// Identifier component.
        component: ComponentDef,
    },
}

/// Classification of an identifier, derived once per type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdentifierShape {
    /// Single column.
    Simple,
    /// Composite, no further walking needed.
    EmbeddedComposite,
    /// Composite, walked like an association.
    NonEmbeddedComposite,
}

impl IdentifierDef {
    /// Create a simple identifier.
    pub fn simple(property: impl Into<String>, column: impl Into<String>, scalar: ScalarType) -> Self {
        IdentifierDef::Simple {
            property: property.into(),
            column: column.into(),
            scalar,
        }
    }

    /// Create an embedded composite identifier.
    pub fn embedded(component: ComponentDef) -> Self {
        IdentifierDef::Embedded { component }
    }

    /// Create a non-embedded composite identifier.
    pub fn composite(property: impl Into<String>, component: ComponentDef) -> Self {
        IdentifierDef::Composite {
            property: property.into(),
            component,
        }
    }

    /// Identifier shape.
    pub fn shape(&self) -> IdentifierShape {
        match self {
            IdentifierDef::Simple { .. } => IdentifierShape::Simple,
            IdentifierDef::Embedded { .. } => IdentifierShape::EmbeddedComposite,
            IdentifierDef::Composite { .. } => IdentifierShape::NonEmbeddedComposite,
        }
    }

    /// Identifier property name, if the key has one.
    pub fn property_name(&self) -> Option<&str> {
        match self {
            IdentifierDef::Simple { property, .. } | IdentifierDef::Composite { property, .. } => {
                Some(property)
            }
            IdentifierDef::Embedded { .. } => None,
        }
    }

    /// Identifier component for composite keys.
    pub fn component(&self) -> Option<&ComponentDef> {
        match self {
            IdentifierDef::Simple { .. } => None,
            IdentifierDef::Embedded { component } | IdentifierDef::Composite { component, .. } => {
                Some(component)
            }
        }
    }

    /// Key columns in declaration order.
    pub fn columns(&self) -> Vec<String> {
        match self {
            IdentifierDef::Simple { column, .. } => vec![column.clone()],
            IdentifierDef::Embedded { component } | IdentifierDef::Composite { component, .. } => {
                component.columns()
            }
        }
    }

    /// Validate the identifier of `entity`.
    pub fn validate(&self, entity: &str) -> Result<()> {
        match self {
            IdentifierDef::Simple { column, .. } if column.is_empty() => Err(Error::configuration(
                format!("entity '{}' declares an identifier without a column", entity),
            )),
            IdentifierDef::Simple { .. } => Ok(()),
            IdentifierDef::Embedded { component } | IdentifierDef::Composite { component, .. } => {
                if component.columns().is_empty() {
                    Err(Error::configuration(format!(
                        "composite identifier '{}' of entity '{}' declares zero columns",
                        component.name, entity
                    )))
                } else {
                    Ok(())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{AssociationDef, PropertyDef};

    fn order_key() -> ComponentDef {
        ComponentDef::new("OrderLineKey")
            .with_property(PropertyDef::association(
                "order",
                AssociationDef::many_to_one("Order", ["order_id"]),
            ))
            .with_property(PropertyDef::scalar("line", "line_no", ScalarType::Int32))
    }

    #[test]
    fn test_identifier_shapes() {
        assert_eq!(
            IdentifierDef::simple("id", "id", ScalarType::Int64).shape(),
            IdentifierShape::Simple
        );
        assert_eq!(
            IdentifierDef::embedded(order_key()).shape(),
            IdentifierShape::EmbeddedComposite
        );
        assert_eq!(
            IdentifierDef::composite("id", order_key()).shape(),
            IdentifierShape::NonEmbeddedComposite
        );
    }

    #[test]
    fn test_composite_columns_include_key_references() {
        let id = IdentifierDef::composite("id", order_key());
        assert_eq!(id.columns(), vec!["order_id", "line_no"]);
        assert_eq!(id.property_name(), Some("id"));
        assert!(id.validate("OrderLine").is_ok());
    }

    #[test]
    fn test_empty_composite_is_configuration_error() {
        let id = IdentifierDef::composite("id", ComponentDef::new("EmptyKey"));
        let err = id.validate("Broken").unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }
}
