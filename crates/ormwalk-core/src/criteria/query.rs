//! Criteria request model.
//!
//! A [`CriteriaQuery`] is what the query builder hands the planner: the root
//! entity, aliased sub-criteria (explicit join requests), fetch-mode
//! overrides, an optional projection and opaque SQL fragments. Fragments may
//! reference table aliases with `{name}` placeholders, where `name` is the
//! root alias, a sub-criteria alias, or the literal `alias` (the root table,
//! or the joined table inside a with-clause).

use crate::catalog::FetchMode;
use crate::plan::{JoinKind, LockMode, ResultType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default caller alias of the root entity.
pub const DEFAULT_ROOT_ALIAS: &str = "this";

/// An aliased association path joined at the caller's request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubCriteria {
    /// Association path, either from the root or prefixed with an earlier alias.
    pub path: String,
    /// Caller alias.
    pub alias: String,
    /// Requested join kind.
    pub join_kind: JoinKind,
    /// Extra ON-clause restriction template.
    #[serde(default)]
    pub with_clause: Option<String>,
}

/// One projected output column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectedColumn {
    /// SQL expression template.
    pub expression: String,
    /// Output type.
    pub result_type: ResultType,
    /// Column alias in the select list.
    #[serde(default)]
    pub column_alias: Option<String>,
}

/// Requested projection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Projection {
    /// Output columns in order.
    pub columns: Vec<ProjectedColumn>,
    /// Group-by expression templates.
    #[serde(default)]
    pub group_by: Vec<String>,
}

/// Ordering entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderSpec {
    /// Expression template.
    pub expression: String,
    /// Ascending when true.
    #[serde(default = "ascending")]
    pub ascending: bool,
}

fn ascending() -> bool {
    true
}

fn default_root_alias() -> String {
    DEFAULT_ROOT_ALIAS.to_string()
}

/// A criteria query over an entity graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriteriaQuery {
    /// Root entity name.
    pub root_entity: String,
    /// Caller alias of the root.
    #[serde(default = "default_root_alias")]
    pub alias: String,
    /// Explicit join requests, in creation order.
    #[serde(default)]
    pub subcriteria: Vec<SubCriteria>,
    /// Per-path fetch-mode overrides.
    #[serde(default)]
    pub fetch_modes: BTreeMap<String, FetchMode>,
    /// Requested projection.
    #[serde(default)]
    pub projection: Option<Projection>,
    /// Restriction templates, and-ed together.
    #[serde(default)]
    pub restrictions: Vec<String>,
    /// Ordering.
    #[serde(default)]
    pub orders: Vec<OrderSpec>,
    /// Having templates, and-ed together.
    #[serde(default)]
    pub having: Vec<String>,
    /// Lock mode.
    #[serde(default)]
    pub lock_mode: LockMode,
    /// Aliases already consumed elsewhere in the statement.
    #[serde(default)]
    pub alias_offset: usize,
}

impl CriteriaQuery {
    /// Create a query rooted at `root_entity`.
    pub fn new(root_entity: impl Into<String>) -> Self {
        Self {
            root_entity: root_entity.into(),
            alias: default_root_alias(),
            subcriteria: Vec::new(),
            fetch_modes: BTreeMap::new(),
            projection: None,
            restrictions: Vec::new(),
            orders: Vec::new(),
            having: Vec::new(),
            lock_mode: LockMode::None,
            alias_offset: 0,
        }
    }

    /// Set the caller alias of the root.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = alias.into();
        self
    }

    /// Join `path` under `alias` with the given kind.
    pub fn create_alias(
        mut self,
        path: impl Into<String>,
        alias: impl Into<String>,
        join_kind: JoinKind,
    ) -> Self {
        self.subcriteria.push(SubCriteria {
            path: path.into(),
            alias: alias.into(),
            join_kind,
            with_clause: None,
        });
        self
    }

    /// Join `path` under `alias` with an extra ON-clause restriction.
    pub fn create_alias_with_clause(
        mut self,
        path: impl Into<String>,
        alias: impl Into<String>,
        join_kind: JoinKind,
        with_clause: impl Into<String>,
    ) -> Self {
        self.subcriteria.push(SubCriteria {
            path: path.into(),
            alias: alias.into(),
            join_kind,
            with_clause: Some(with_clause.into()),
        });
        self
    }

    /// Override the fetch mode of `path`.
    pub fn set_fetch_mode(mut self, path: impl Into<String>, mode: FetchMode) -> Self {
        self.fetch_modes.insert(path.into(), mode);
        self
    }

    /// Request a projection instead of whole-entity results.
    pub fn set_projection(mut self, projection: Projection) -> Self {
        self.projection = Some(projection);
        self
    }

    /// Add a restriction template.
    pub fn add_restriction(mut self, restriction: impl Into<String>) -> Self {
        self.restrictions.push(restriction.into());
        self
    }

    /// Add an ordering entry.
    pub fn add_order(mut self, order: OrderSpec) -> Self {
        self.orders.push(order);
        self
    }

    /// Add a having template.
    pub fn add_having(mut self, having: impl Into<String>) -> Self {
        self.having.push(having.into());
        self
    }

    /// Set the lock mode.
    pub fn set_lock_mode(mut self, lock_mode: LockMode) -> Self {
        self.lock_mode = lock_mode;
        self
    }

    /// Skip `offset` alias ordinals already used by the enclosing statement.
    pub fn with_alias_offset(mut self, offset: usize) -> Self {
        self.alias_offset = offset;
        self
    }

    /// Parse a query from JSON.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Projection {
    /// Create an empty projection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an output column.
    pub fn with_column(mut self, expression: impl Into<String>, result_type: ResultType) -> Self {
        self.columns.push(ProjectedColumn {
            expression: expression.into(),
            result_type,
            column_alias: None,
        });
        self
    }

    /// Add an output column with a select-list alias.
    pub fn with_aliased_column(
        mut self,
        expression: impl Into<String>,
        result_type: ResultType,
        column_alias: impl Into<String>,
    ) -> Self {
        self.columns.push(ProjectedColumn {
            expression: expression.into(),
            result_type,
            column_alias: Some(column_alias.into()),
        });
        self
    }

    /// Add a group-by expression.
    pub fn with_group_by(mut self, expression: impl Into<String>) -> Self {
        self.group_by.push(expression.into());
        self
    }
}

impl OrderSpec {
    /// Ascending order on `expression`.
    pub fn asc(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            ascending: true,
        }
    }

    /// Descending order on `expression`.
    pub fn desc(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            ascending: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ScalarType;

    #[test]
    fn test_query_builder() {
        let query = CriteriaQuery::new("Order")
            .create_alias("customer", "c", JoinKind::Inner)
            .set_fetch_mode("items", FetchMode::Join)
            .add_restriction("{c}.name like ?")
            .add_order(OrderSpec::desc("{alias}.placed_at"));

        assert_eq!(query.alias, "this");
        assert_eq!(query.subcriteria.len(), 1);
        assert_eq!(query.fetch_modes.get("items"), Some(&FetchMode::Join));
        assert!(query.projection.is_none());
        assert!(!query.orders[0].ascending);
    }

    #[test]
    fn test_query_from_minimal_json() {
        let query = CriteriaQuery::from_json(
            r#"{
                "root_entity": "Order",
                "subcriteria": [{ "path": "customer", "alias": "c", "join_kind": "Inner" }],
                "fetch_modes": { "items": "Lazy" },
                "orders": [{ "expression": "{alias}.id" }]
            }"#,
        )
        .unwrap();

        assert_eq!(query.alias, DEFAULT_ROOT_ALIAS);
        assert_eq!(query.fetch_modes.get("items"), Some(&FetchMode::Select));
        assert!(query.orders[0].ascending);
        assert_eq!(query.lock_mode, LockMode::None);
    }

    #[test]
    fn test_projection_builder() {
        let projection = Projection::new()
            .with_column("{alias}.id", ResultType::Scalar(ScalarType::Int64))
            .with_aliased_column("count(*)", ResultType::Scalar(ScalarType::Int64), "n")
            .with_group_by("{alias}.id");

        assert_eq!(projection.columns.len(), 2);
        assert_eq!(projection.columns[1].column_alias.as_deref(), Some("n"));
        assert_eq!(projection.group_by, vec!["{alias}.id"]);
    }
}
