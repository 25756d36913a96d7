//! ormwalk core - association-graph join planning.
//!
//! Given entity mapping metadata and a criteria query, this crate decides
//! which associations become SQL joins, allocates unique table aliases,
//! suppresses duplicate joins and produces the statement fragments a SQL
//! generator needs.

pub mod cache;
pub mod catalog;
pub mod config;
pub mod criteria;
pub mod error;
pub mod filter;
pub mod plan;
pub mod planner;
pub mod walker;

#[cfg(test)]
mod test_schema;

pub use cache::{CacheStats, PlanCache, PlanFingerprint};
pub use catalog::{
    AssociationDef, AssociationKind, Catalog, CollectionAssociation, ComponentDef, Discriminator,
    ElementKind, EntityAssociation, EntityDef, EntityFilter, FetchMode, FilterDef,
    ForeignKeyDirection, IdentifierDef, PropertyDef, ScalarType, SchemaBundle,
};
pub use config::PlannerConfig;
pub use criteria::{CriteriaQuery, CriteriaTranslator, OrderSpec, Projection, SubCriteria};
pub use error::{Error, Result};
pub use filter::{EnabledFilters, FilterSource, SchemaFilterSource};
pub use plan::{JoinKind, JoinNode, LockMode, LogicalAlias, PlanResult, ResultType};
pub use planner::Planner;
pub use walker::{CriteriaPolicy, EntityLoadPolicy, GraphWalker, JoinPolicy};
