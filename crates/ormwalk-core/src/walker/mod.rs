//! Association graph walking.
//!
//! The [`GraphWalker`] turns a root entity into a join plan. What gets joined
//! is decided by a [`JoinPolicy`]; aliases come from the [`AliasAllocator`],
//! and the [`DuplicateJoinDetector`] keeps two edges over the same foreign
//! key from producing the same rows twice.

mod alias;
mod composite_id;
mod duplicate;
mod graph_walker;
mod join_helper;
mod policy;

pub use alias::{generate_alias, AliasAllocation, AliasAllocator, ROOT_SQL_ALIAS};
pub use composite_id::{CompositeIdWalker, IdentifierEdge};
pub use duplicate::{AssociationKey, DuplicateJoinDetector};
pub use graph_walker::GraphWalker;
pub use join_helper::{BridgeTarget, EdgeTarget, LhsSqlInfo};
pub use policy::{CriteriaPolicy, EdgeContext, EntityLoadPolicy, JoinPolicy, StatementFragments};
