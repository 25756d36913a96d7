//! Duplicate join detection.
//!
//! Two edges are duplicates when they traverse the same physical foreign key:
//! the same table and columns on the side that holds the key. The detector
//! remembers the first join planned for each key, which also stops the walk
//! from following a bidirectional association back to where it came from.

use crate::catalog::{AssociationDef, AssociationKind, EntityAssociation, ForeignKeyDirection};
use std::collections::HashMap;

/// Foreign-key side of an association edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssociationKey {
    /// Table holding the foreign key.
    pub table: String,
    /// Foreign key columns.
    pub columns: Vec<String>,
}

impl AssociationKey {
    /// Create a key.
    pub fn new(table: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            table: table.into(),
            columns,
        }
    }

    /// Key of `edge` joined from `lhs_table` on `lhs_columns` to `rhs_table`.
    pub fn for_edge(
        lhs_table: &str,
        lhs_columns: &[String],
        edge: &AssociationDef,
        rhs_table: &str,
    ) -> Self {
        match (&edge.kind, edge.foreign_key_direction()) {
            (_, ForeignKeyDirection::FromParent) => Self::new(lhs_table, lhs_columns.to_vec()),
            (AssociationKind::Entity(EntityAssociation { columns, .. }), _) => {
                Self::new(rhs_table, columns.clone())
            }
            (AssociationKind::Collection(collection), _) => Self::new(
                collection.table.as_deref().unwrap_or(rhs_table),
                collection.key_columns.clone(),
            ),
            (AssociationKind::Component(_), _) => Self::new(lhs_table, lhs_columns.to_vec()),
        }
    }
}

#[derive(Debug, Clone)]
struct PlannedJoin {
    lhs_alias: String,
    table: String,
    alias: String,
}

/// Tracks foreign keys already traversed in one planning pass.
#[derive(Debug, Default)]
pub struct DuplicateJoinDetector {
    visited: HashMap<AssociationKey, PlannedJoin>,
}

impl DuplicateJoinDetector {
    /// Create an empty detector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a join over `key` has already been planned.
    pub fn is_duplicate(&self, key: &AssociationKey) -> bool {
        self.visited.contains_key(key)
    }

    /// Alias of an already planned join that produces exactly the same rows:
    /// same key, same source alias and same joined table.
    pub fn equivalent_alias(&self, key: &AssociationKey, lhs_alias: &str, table: &str) -> Option<&str> {
        self.visited
            .get(key)
            .filter(|planned| planned.lhs_alias == lhs_alias && planned.table == table)
            .map(|planned| planned.alias.as_str())
    }

    /// Record a planned join. The first join over a key keeps it.
    pub fn bind(&mut self, key: AssociationKey, lhs_alias: &str, table: &str, alias: &str) {
        self.visited.entry(key).or_insert_with(|| PlannedJoin {
            lhs_alias: lhs_alias.to_string(),
            table: table.to_string(),
            alias: alias.to_string(),
        });
    }

    /// Number of distinct keys seen.
    #[cfg(test)]
    fn len(&self) -> usize {
        self.visited.len()
    }

    /// Check if nothing has been planned yet.
    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.visited.is_empty()
    }
}
