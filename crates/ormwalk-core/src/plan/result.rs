//! Planner output.

use super::join::JoinNode;
use crate::catalog::ScalarType;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Type of one output column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResultType {
    /// A scalar value.
    Scalar(ScalarType),
    /// A reference to an entity, hydrated as a whole object.
    Entity(String),
}

/// Row shape handed to the hydration layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultTypeDescriptor(pub Vec<ResultType>);

impl ResultTypeDescriptor {
    /// Single reference to `entity`.
    pub fn entity(entity: impl Into<String>) -> Self {
        Self(vec![ResultType::Entity(entity.into())])
    }

    /// Projected tuple in requested order.
    pub fn projection(types: Vec<ResultType>) -> Self {
        Self(types)
    }

    /// Column types.
    pub fn types(&self) -> &[ResultType] {
        &self.0
    }

    /// Check if rows hydrate to the root entity.
    pub fn is_entity_reference(&self) -> bool {
        matches!(self.0.as_slice(), [ResultType::Entity(_)])
    }
}

/// Caller-visible aliases, one per alias-consuming join, root last.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserAliasList(pub Vec<Option<String>>);

impl UserAliasList {
    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Root alias (the last entry).
    pub fn root(&self) -> Option<&str> {
        self.0.last().and_then(|a| a.as_deref())
    }

    /// Entries in order.
    pub fn as_slice(&self) -> &[Option<String>] {
        &self.0
    }
}

/// Row lock requested for the statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LockMode {
    /// No lock.
    #[default]
    None,
    /// Shared read lock.
    Read,
    /// Lock for update.
    Upgrade,
    /// Lock for update without waiting.
    UpgradeNoWait,
    /// Write lock.
    Write,
}

/// The join plan for one criteria query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanResult {
    /// Root entity name.
    pub root_entity: String,
    /// Root table.
    pub root_table: String,
    /// Physical alias of the root table.
    pub root_alias: String,
    /// Planned joins in traversal order.
    pub joins: Vec<JoinNode>,
    /// Row shape.
    pub result_types: ResultTypeDescriptor,
    /// Caller-visible aliases, root last.
    pub user_aliases: UserAliasList,
    /// Projected select list, when a projection was requested.
    pub select: Option<String>,
    /// Final where clause, filters included.
    pub where_clause: String,
    /// Order-by fragment.
    pub order_by: String,
    /// Group-by fragment.
    pub group_by: Option<String>,
    /// Having fragment.
    pub having: Option<String>,
    /// Lock mode.
    pub lock_mode: LockMode,
    /// Tables touched by the statement.
    pub query_spaces: BTreeSet<String>,
    /// Paths collapsed onto an earlier join, mapped to that join's alias.
    pub collapsed_paths: BTreeMap<String, String>,
    /// Statement comment.
    pub comment: String,
}

impl PlanResult {
    /// The join planned at `path`.
    pub fn join_for(&self, path: &str) -> Option<&JoinNode> {
        self.joins.iter().find(|j| j.path == path)
    }

    /// Physical alias serving `path`: the root alias for the empty path, the
    /// join alias for joined paths, the surviving alias for collapsed paths.
    pub fn alias_for(&self, path: &str) -> Option<&str> {
        if path.is_empty() {
            return Some(&self.root_alias);
        }
        self.join_for(path)
            .map(|j| j.alias.as_str())
            .or_else(|| self.collapsed_paths.get(path).map(String::as_str))
    }

    /// Number of joins whose caller-facing slot is present.
    pub fn alias_consuming_joins(&self) -> usize {
        self.joins
            .iter()
            .filter(|j| j.logical_alias.is_some())
            .count()
    }

    /// All physical aliases in the plan, root first.
    pub fn physical_aliases(&self) -> Vec<&str> {
        std::iter::once(self.root_alias.as_str())
            .chain(self.joins.iter().flat_map(JoinNode::aliases))
            .collect()
    }
}
