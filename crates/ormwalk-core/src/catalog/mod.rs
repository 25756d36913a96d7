//! Entity metadata catalog.
//!
//! The catalog describes persistent types: their tables, identifiers,
//! properties, associations, discriminators and filter conditions. Planning
//! treats it as read-only.

mod association;
mod catalog;
mod entity;
mod filter;
mod identifier;
mod property;
mod schema;
mod types;

pub use association::{
    AssociationDef, AssociationKind, CollectionAssociation, ElementKind, EntityAssociation,
    ForeignKeyDirection,
};
pub use catalog::Catalog;
pub use entity::EntityDef;
pub use filter::{Discriminator, EntityFilter, FilterDef};
pub use identifier::{IdentifierDef, IdentifierShape};
pub use property::{ComponentDef, PropertyDef, PropertyKind};
pub use schema::SchemaBundle;
pub use types::{CascadeStyle, FetchMode, ScalarType};
