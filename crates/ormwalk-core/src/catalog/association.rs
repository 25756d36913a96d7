//! Association definitions between persistent types.

use super::property::ComponentDef;
use super::types::{CascadeStyle, FetchMode, ScalarType};
use serde::{Deserialize, Serialize};

/// Which side of an association holds the foreign key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForeignKeyDirection {
    /// The owner's table references the target (many-to-one).
    FromParent,
    /// The target's table references the owner (one-to-one inverse, collections).
    ToParent,
}

/// Reference to a single entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityAssociation {
    /// Target entity name.
    pub target: String,
    /// Foreign key columns (owner table for `FromParent`, target table otherwise).
    pub columns: Vec<String>,
    /// Which side holds the foreign key.
    pub foreign_key: ForeignKeyDirection,
}

/// A collection of elements keyed back to the owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionAssociation {
    /// Collection table; `None` for one-to-many, where elements live in the target table.
    pub table: Option<String>,
    /// Columns in the collection (or target) table referencing the owner identifier.
    pub key_columns: Vec<String>,
    /// Element shape.
    pub element: ElementKind,
}

/// Element shape of a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ElementKind {
    /// Plain scalar values.
    Value {
        /// Element column.
        column: String,
        /// Element type.
        scalar: ScalarType,
    },
    /// Value-typed components.
    Component(ComponentDef),
    /// Entities whose table carries the key columns.
    OneToMany {
        /// Element entity.
        target: String,
    },
    /// Entities reached through a bridge table.
    ManyToMany {
        /// Element entity.
        target: String,
        /// Bridge columns referencing the element identifier.
        columns: Vec<String>,
    },
}

/// Association shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AssociationKind {
    /// Single entity reference.
    Entity(EntityAssociation),
    /// Collection.
    Collection(CollectionAssociation),
    /// Component walked as if it were an association (identifier components).
    Component(ComponentDef),
}

/// An outgoing association edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssociationDef {
    /// Edge shape.
    pub kind: AssociationKind,
    /// Whether the reference may be absent.
    pub nullable: bool,
    /// Cascade style.
    #[serde(default)]
    pub cascade: CascadeStyle,
    /// Mapping-level fetch strategy.
    #[serde(default)]
    pub fetch: FetchMode,
}

fn strings<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    items.into_iter().map(Into::into).collect()
}

impl AssociationDef {
    fn new(kind: AssociationKind, nullable: bool) -> Self {
        Self {
            kind,
            nullable,
            cascade: CascadeStyle::None,
            fetch: FetchMode::Select,
        }
    }

    /// Many-to-one reference through foreign key columns on the owner table.
    pub fn many_to_one<I, S>(target: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            AssociationKind::Entity(EntityAssociation {
                target: target.into(),
                columns: strings(columns),
                foreign_key: ForeignKeyDirection::FromParent,
            }),
            false,
        )
    }

    /// One-to-one reference whose foreign key lives on the target table.
    pub fn one_to_one<I, S>(target: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            AssociationKind::Entity(EntityAssociation {
                target: target.into(),
                columns: strings(columns),
                foreign_key: ForeignKeyDirection::ToParent,
            }),
            true,
        )
    }

    /// One-to-many collection keyed by columns on the target table.
    pub fn one_to_many<I, S>(target: impl Into<String>, key_columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            AssociationKind::Collection(CollectionAssociation {
                table: None,
                key_columns: strings(key_columns),
                element: ElementKind::OneToMany {
                    target: target.into(),
                },
            }),
            true,
        )
    }

    /// Many-to-many collection through a bridge table.
    pub fn many_to_many<I, S, J, T>(
        bridge_table: impl Into<String>,
        key_columns: I,
        target: impl Into<String>,
        element_columns: J,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        J: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self::new(
            AssociationKind::Collection(CollectionAssociation {
                table: Some(bridge_table.into()),
                key_columns: strings(key_columns),
                element: ElementKind::ManyToMany {
                    target: target.into(),
                    columns: strings(element_columns),
                },
            }),
            true,
        )
    }

    /// Collection of scalar values in its own table.
    pub fn value_collection<I, S>(
        table: impl Into<String>,
        key_columns: I,
        column: impl Into<String>,
        scalar: ScalarType,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            AssociationKind::Collection(CollectionAssociation {
                table: Some(table.into()),
                key_columns: strings(key_columns),
                element: ElementKind::Value {
                    column: column.into(),
                    scalar,
                },
            }),
            true,
        )
    }

    /// Collection of components in its own table.
    pub fn component_collection<I, S>(
        table: impl Into<String>,
        key_columns: I,
        component: ComponentDef,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            AssociationKind::Collection(CollectionAssociation {
                table: Some(table.into()),
                key_columns: strings(key_columns),
                element: ElementKind::Component(component),
            }),
            true,
        )
    }

    /// Pseudo-association over a component.
    pub fn component(component: ComponentDef) -> Self {
        Self::new(AssociationKind::Component(component), false)
    }

    /// Set nullability.
    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Mark the reference as optional.
    pub fn optional(self) -> Self {
        self.with_nullable(true)
    }

    /// Set the cascade style.
    pub fn with_cascade(mut self, cascade: CascadeStyle) -> Self {
        self.cascade = cascade;
        self
    }

    /// Set the mapping-level fetch strategy.
    pub fn with_fetch(mut self, fetch: FetchMode) -> Self {
        self.fetch = fetch;
        self
    }

    /// Map the association as eagerly joined.
    pub fn fetch_join(self) -> Self {
        self.with_fetch(FetchMode::Join)
    }

    /// Check if this edge is a collection.
    pub fn is_collection(&self) -> bool {
        matches!(self.kind, AssociationKind::Collection(_))
    }

    /// Whether the joined target is addressable by the caller under a user alias.
    pub fn consumes_user_alias(&self) -> bool {
        match &self.kind {
            AssociationKind::Entity(_) => true,
            AssociationKind::Collection(collection) => match &collection.element {
                ElementKind::OneToMany { .. } => true,
                ElementKind::ManyToMany { .. } => true,
                ElementKind::Component(_) => true,
                ElementKind::Value { .. } => false,
            },
            AssociationKind::Component(_) => false,
        }
    }

    /// Target entity, if the edge leads to one.
    pub fn target_entity(&self) -> Option<&str> {
        match &self.kind {
            AssociationKind::Entity(entity) => Some(&entity.target),
            AssociationKind::Collection(collection) => match &collection.element {
                ElementKind::OneToMany { target } | ElementKind::ManyToMany { target, .. } => {
                    Some(target)
                }
                ElementKind::Value { .. } | ElementKind::Component(_) => None,
            },
            AssociationKind::Component(_) => None,
        }
    }

    /// Which side of the edge holds the foreign key.
    pub fn foreign_key_direction(&self) -> ForeignKeyDirection {
        match &self.kind {
            AssociationKind::Entity(entity) => entity.foreign_key,
            AssociationKind::Collection(_) => ForeignKeyDirection::ToParent,
            AssociationKind::Component(_) => ForeignKeyDirection::FromParent,
        }
    }

    /// Short type label used in plan output.
    pub fn label(&self) -> &'static str {
        match &self.kind {
            AssociationKind::Entity(entity) => match entity.foreign_key {
                ForeignKeyDirection::FromParent => "many-to-one",
                ForeignKeyDirection::ToParent => "one-to-one",
            },
            AssociationKind::Collection(collection) => match &collection.element {
                ElementKind::OneToMany { .. } => "one-to-many",
                ElementKind::ManyToMany { .. } => "many-to-many",
                ElementKind::Component(_) => "component-collection",
                ElementKind::Value { .. } => "value-collection",
            },
            AssociationKind::Component(_) => "component",
        }
    }
}
