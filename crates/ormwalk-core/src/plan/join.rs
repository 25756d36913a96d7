//! Planned joins.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How an association is joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum JoinKind {
    /// Not joined.
    #[default]
    None,
    /// Inner join.
    Inner,
    /// Left outer join.
    Outer,
}

impl JoinKind {
    /// Check if this kind produces a join.
    pub fn is_joined(self) -> bool {
        self != JoinKind::None
    }

    /// SQL keyword for this join kind.
    pub fn keyword(self) -> &'static str {
        match self {
            JoinKind::None => "",
            JoinKind::Inner => "inner join",
            JoinKind::Outer => "left outer join",
        }
    }

    /// Join kind for an eager fetch: inner only for a mandatory edge hanging
    /// directly off the root, since deeper edges may sit behind outer joins.
    pub fn for_fetch(nullable: bool, depth: usize) -> Self {
        if !nullable && depth == 0 {
            JoinKind::Inner
        } else {
            JoinKind::Outer
        }
    }
}

/// A column qualified by a table alias.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRef {
    /// Table alias.
    pub alias: String,
    /// Column name.
    pub column: String,
}

impl ColumnRef {
    /// Create a column reference.
    pub fn new(alias: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            column: column.into(),
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.alias, self.column)
    }
}

/// Equi-join condition between two aliased tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinCondition {
    /// Column pairs compared for equality.
    pub pairs: Vec<(ColumnRef, ColumnRef)>,
}

impl JoinCondition {
    /// Pair up `lhs_columns` with `rhs_columns` position by position.
    pub fn equi(
        lhs_alias: &str,
        lhs_columns: &[String],
        rhs_alias: &str,
        rhs_columns: &[String],
    ) -> Result<Self> {
        if lhs_columns.len() != rhs_columns.len() || lhs_columns.is_empty() {
            return Err(Error::configuration(format!(
                "join column arity mismatch: [{}] vs [{}]",
                lhs_columns.join(", "),
                rhs_columns.join(", ")
            )));
        }

        Ok(Self {
            pairs: lhs_columns
                .iter()
                .zip(rhs_columns)
                .map(|(l, r)| (ColumnRef::new(lhs_alias, l), ColumnRef::new(rhs_alias, r)))
                .collect(),
        })
    }
}

impl fmt::Display for JoinCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (lhs, rhs)) in self.pairs.iter().enumerate() {
            if i > 0 {
                f.write_str(" and ")?;
            }
            write!(f, "{} = {}", lhs, rhs)?;
        }
        Ok(())
    }
}

/// Caller-facing alias slot of a join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogicalAlias {
    /// Addressable under a caller-chosen alias.
    Named(String),
    /// Addressable, but the caller gave it no alias.
    Anonymous,
}

impl LogicalAlias {
    /// The caller alias, if any.
    pub fn name(&self) -> Option<&str> {
        match self {
            LogicalAlias::Named(name) => Some(name),
            LogicalAlias::Anonymous => None,
        }
    }
}

/// Bridge hop of a many-to-many join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeJoin {
    /// Bridge table.
    pub table: String,
    /// Physical alias of the bridge table.
    pub alias: String,
    /// Condition from the owner to the bridge.
    pub condition: JoinCondition,
}

/// One planned join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinNode {
    /// Association path from the root.
    pub path: String,
    /// Physical alias, unique within the plan.
    pub alias: String,
    /// Caller-facing alias slot; `None` for structural joins.
    pub logical_alias: Option<LogicalAlias>,
    /// Join kind (never `None` for a planned node).
    pub kind: JoinKind,
    /// Association shape label.
    pub association: String,
    /// Joined table.
    pub table: String,
    /// Entity stored in the joined table, if any.
    pub entity: Option<String>,
    /// Alias of the table joined from.
    pub lhs_alias: String,
    /// Table joined from.
    pub lhs_table: String,
    /// Join condition (from the bridge, for many-to-many).
    pub condition: JoinCondition,
    /// Bridge hop for many-to-many collections.
    pub bridge: Option<BridgeJoin>,
    /// Extra ON-clause restriction supplied by the caller.
    pub with_clause: Option<String>,
    /// Walk depth (0 for edges leaving the root).
    pub depth: usize,
    /// Whether the edge is a collection.
    pub collection: bool,
}

impl JoinNode {
    /// All physical aliases introduced by this node.
    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.bridge
            .iter()
            .map(|b| b.alias.as_str())
            .chain(std::iter::once(self.alias.as_str()))
    }

    /// Full ON clause: join condition plus any with-clause.
    pub fn on_clause(&self) -> String {
        match &self.with_clause {
            Some(with) => format!("{} and ({})", self.condition, with),
            None => self.condition.to_string(),
        }
    }
}
