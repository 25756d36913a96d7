//! Criteria translation.
//!
//! The translator validates a [`CriteriaQuery`] against the schema, resolves
//! alias-prefixed paths to full association paths, assigns SQL aliases to
//! sub-criteria and renders the statement fragments the planner passes
//! through to the renderer.

use super::query::{CriteriaQuery, SubCriteria};
use super::template;
use crate::catalog::{
    AssociationDef, AssociationKind, ComponentDef, ElementKind, EntityDef, FetchMode,
    IdentifierDef, PropertyKind, SchemaBundle,
};
use crate::error::{Error, Result};
use crate::plan::{JoinKind, LockMode, ResultType};
use crate::walker::{generate_alias, ROOT_SQL_ALIAS};
use std::collections::{BTreeMap, HashMap};

/// A validated sub-criteria.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCriteria {
    /// Full association path from the root.
    pub path: String,
    /// Caller alias.
    pub alias: String,
    /// SQL alias assigned to the joined table.
    pub sql_alias: String,
    /// Requested join kind.
    pub join_kind: JoinKind,
    /// Unrendered with-clause template.
    pub with_clause: Option<String>,
}

/// Owner of the next path segment during resolution.
#[derive(Clone, Copy)]
enum Owner<'s> {
    Entity(&'s EntityDef),
    Component(&'s ComponentDef),
}

/// Resolved view of a criteria query.
#[derive(Debug)]
pub struct CriteriaTranslator<'a> {
    query: &'a CriteriaQuery,
    root: &'a EntityDef,
    criteria: Vec<ResolvedCriteria>,
    by_path: HashMap<String, usize>,
    by_alias: HashMap<String, usize>,
    fetch_modes: BTreeMap<String, FetchMode>,
}

impl<'a> CriteriaTranslator<'a> {
    /// Validate `query` against `schema`.
    pub fn new(query: &'a CriteriaQuery, schema: &'a SchemaBundle) -> Result<Self> {
        let root = schema.entity(&query.root_entity)?;

        let mut translator = Self {
            query,
            root,
            criteria: Vec::with_capacity(query.subcriteria.len()),
            by_path: HashMap::new(),
            by_alias: HashMap::new(),
            fetch_modes: BTreeMap::new(),
        };

        for (i, sub) in query.subcriteria.iter().enumerate() {
            translator.register(schema, i, sub)?;
        }

        for (raw, mode) in &query.fetch_modes {
            let path = translator.resolve_path(raw);
            resolve_association(schema, root, &path)?;
            translator.fetch_modes.insert(path, *mode);
        }

        Ok(translator)
    }

    fn register(&mut self, schema: &SchemaBundle, index: usize, sub: &SubCriteria) -> Result<()> {
        let path = self.resolve_path(&sub.path);

        if sub.alias == self.query.alias {
            return Err(Error::AmbiguousAlias {
                alias: sub.alias.clone(),
                first: "<root>".to_string(),
                second: path,
            });
        }
        if let Some(&existing) = self.by_alias.get(&sub.alias) {
            return Err(Error::AmbiguousAlias {
                alias: sub.alias.clone(),
                first: self.criteria[existing].path.clone(),
                second: path,
            });
        }
        if let Some(&existing) = self.by_path.get(&path) {
            return Err(Error::AmbiguousAlias {
                alias: path,
                first: self.criteria[existing].alias.clone(),
                second: sub.alias.clone(),
            });
        }
        if !sub.join_kind.is_joined() {
            return Err(Error::unsupported_fetch(
                path,
                "explicit join requested with join kind None",
            ));
        }

        let association = resolve_association(schema, self.root, &path)?;
        if !association.consumes_user_alias() {
            return Err(Error::unsupported_fetch(
                path,
                format!(
                    "alias '{}' requested for a collection of plain values",
                    sub.alias
                ),
            ));
        }

        let resolved = ResolvedCriteria {
            sql_alias: generate_alias(&sub.alias, self.query.alias_offset + index),
            path: path.clone(),
            alias: sub.alias.clone(),
            join_kind: sub.join_kind,
            with_clause: sub.with_clause.clone(),
        };

        self.by_path.insert(path, self.criteria.len());
        self.by_alias.insert(sub.alias.clone(), self.criteria.len());
        self.criteria.push(resolved);
        Ok(())
    }

    /// Expand an alias-prefixed path (`i.product`) to a full path from the
    /// root (`items.product`).
    pub fn resolve_path(&self, raw: &str) -> String {
        match raw.split_once('.') {
            Some((head, rest)) if head == self.query.alias => rest.to_string(),
            Some((head, rest)) => match self.by_alias.get(head) {
                Some(&i) => format!("{}.{}", self.criteria[i].path, rest),
                None => raw.to_string(),
            },
            None => raw.to_string(),
        }
    }

    /// Root entity.
    pub fn root(&self) -> &'a EntityDef {
        self.root
    }

    /// Caller alias of the root.
    pub fn root_alias(&self) -> &str {
        &self.query.alias
    }

    /// SQL alias of the root table.
    pub fn root_sql_alias(&self) -> &'static str {
        ROOT_SQL_ALIAS
    }

    /// Check if the caller explicitly requested a join at `path`.
    pub fn is_join(&self, path: &str) -> bool {
        self.by_path.contains_key(path)
    }

    /// Join kind the caller requested at `path`.
    pub fn join_kind(&self, path: &str) -> Option<JoinKind> {
        self.criteria_for(path).map(|c| c.join_kind)
    }

    /// Sub-criteria registered for `path`.
    pub fn criteria_for(&self, path: &str) -> Option<&ResolvedCriteria> {
        self.by_path.get(path).map(|&i| &self.criteria[i])
    }

    /// All sub-criteria in creation order.
    pub fn criteria(&self) -> &[ResolvedCriteria] {
        &self.criteria
    }

    /// Fetch-mode override at `path`, `Default` when none was set.
    pub fn fetch_mode(&self, path: &str) -> FetchMode {
        self.fetch_modes
            .get(path)
            .copied()
            .unwrap_or(FetchMode::Default)
    }

    /// Alias ordinals already handed out in the statement, including the
    /// sub-criteria aliases of this query.
    pub fn sql_alias_count(&self) -> usize {
        self.query.alias_offset + self.criteria.len()
    }

    /// Rendered with-clause of the join at `path`, where `{alias}` is the
    /// joined table.
    pub fn with_clause(&self, path: &str, alias: &str) -> Result<Option<String>> {
        match self.criteria_for(path).and_then(|c| c.with_clause.as_deref()) {
            Some(with) => template::render(with, |name| {
                if name == "alias" {
                    Some(alias.to_string())
                } else {
                    self.sql_alias(name)
                }
            })
            .map(Some),
            None => Ok(None),
        }
    }

    /// SQL alias for a caller alias (the root or a sub-criteria).
    pub fn sql_alias(&self, alias: &str) -> Option<String> {
        if alias == self.query.alias {
            Some(ROOT_SQL_ALIAS.to_string())
        } else {
            self.by_alias
                .get(alias)
                .map(|&i| self.criteria[i].sql_alias.clone())
        }
    }

    fn render(&self, fragment: &str) -> Result<String> {
        template::render(fragment, |name| {
            if name == "alias" {
                Some(ROOT_SQL_ALIAS.to_string())
            } else {
                self.sql_alias(name)
            }
        })
    }

    fn render_all(&self, fragments: &[String]) -> Result<Vec<String>> {
        fragments.iter().map(|f| self.render(f)).collect()
    }

    /// Restrictions and-ed together; empty when there are none.
    pub fn where_condition(&self) -> Result<String> {
        let rendered = self.render_all(&self.query.restrictions)?;
        Ok(conjunction(rendered))
    }

    /// Order-by list; empty when unordered.
    pub fn order_by(&self) -> Result<String> {
        let orders = self
            .query
            .orders
            .iter()
            .map(|order| {
                let direction = if order.ascending { "asc" } else { "desc" };
                Ok(format!("{} {}", self.render(&order.expression)?, direction))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(orders.join(", "))
    }

    /// Group-by list of the projection.
    pub fn group_by(&self) -> Result<Option<String>> {
        match &self.query.projection {
            Some(projection) if !projection.group_by.is_empty() => {
                Ok(Some(self.render_all(&projection.group_by)?.join(", ")))
            }
            _ => Ok(None),
        }
    }

    /// Having conditions and-ed together.
    pub fn having(&self) -> Result<Option<String>> {
        if self.query.having.is_empty() {
            return Ok(None);
        }
        let rendered = self.render_all(&self.query.having)?;
        Ok(Some(conjunction(rendered)))
    }

    /// Check if the caller requested a projection.
    pub fn has_projection(&self) -> bool {
        self.query.projection.is_some()
    }

    /// Projected column types in requested order.
    pub fn projected_types(&self) -> Vec<ResultType> {
        self.query
            .projection
            .iter()
            .flat_map(|p| p.columns.iter().map(|c| c.result_type.clone()))
            .collect()
    }

    /// Rendered select list of the projection.
    pub fn select_fragment(&self) -> Result<Option<String>> {
        let Some(projection) = &self.query.projection else {
            return Ok(None);
        };
        let columns = projection
            .columns
            .iter()
            .map(|column| {
                let expression = self.render(&column.expression)?;
                Ok(match &column.column_alias {
                    Some(alias) => format!("{} as {}", expression, alias),
                    None => expression,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Some(columns.join(", ")))
    }

    /// Requested lock mode.
    pub fn lock_mode(&self) -> LockMode {
        self.query.lock_mode
    }

    /// Paths the caller explicitly asked to join, in creation order.
    pub fn explicit_paths(&self) -> impl Iterator<Item = &str> {
        self.criteria.iter().map(|c| c.path.as_str())
    }
}

/// And-join `parts`, parenthesizing each one when there is more than one.
pub(crate) fn conjunction(mut parts: Vec<String>) -> String {
    match parts.len() {
        0 => String::new(),
        1 => parts.remove(0),
        _ => parts
            .iter()
            .map(|p| format!("({})", p))
            .collect::<Vec<_>>()
            .join(" and "),
    }
}

/// Resolve a full path from `root` to the association it ends on.
pub(crate) fn resolve_association<'s>(
    schema: &'s SchemaBundle,
    root: &'s EntityDef,
    path: &str,
) -> Result<&'s AssociationDef> {
    let segments: Vec<&str> = path.split('.').collect();
    let mut owner = Owner::Entity(root);

    for (i, segment) in segments.iter().enumerate() {
        let last = i + 1 == segments.len();

        if let Owner::Entity(entity) = owner {
            if let IdentifierDef::Composite {
                property,
                component,
            } = &entity.identifier
            {
                if property == segment {
                    if last {
                        return Err(Error::unsupported_fetch(
                            path,
                            "an identifier component cannot be joined",
                        ));
                    }
                    owner = Owner::Component(component);
                    continue;
                }
            }
        }

        let property = match owner {
            Owner::Entity(entity) => entity.get_property(segment).ok_or_else(|| {
                Error::UnknownProperty {
                    owner: entity.name.clone(),
                    property: segment.to_string(),
                }
            })?,
            Owner::Component(component) => component.get_property(segment).ok_or_else(|| {
                Error::UnknownProperty {
                    owner: component.name.clone(),
                    property: segment.to_string(),
                }
            })?,
        };

        owner = match &property.kind {
            PropertyKind::Scalar { .. } => {
                return Err(Error::unsupported_fetch(
                    path,
                    format!("'{}' is a scalar property", segment),
                ))
            }
            PropertyKind::Component(_) if last => {
                return Err(Error::unsupported_fetch(
                    path,
                    format!("component '{}' is stored inline and cannot be joined", segment),
                ))
            }
            PropertyKind::Component(component) => Owner::Component(component),
            PropertyKind::Association(association) if last => return Ok(association),
            PropertyKind::Association(association) => match &association.kind {
                AssociationKind::Entity(entity) => Owner::Entity(schema.entity(&entity.target)?),
                AssociationKind::Component(component) => Owner::Component(component),
                AssociationKind::Collection(collection) => match &collection.element {
                    ElementKind::OneToMany { target } | ElementKind::ManyToMany { target, .. } => {
                        Owner::Entity(schema.entity(target)?)
                    }
                    ElementKind::Component(component) => Owner::Component(component),
                    ElementKind::Value { .. } => {
                        return Err(Error::unsupported_fetch(
                            path,
                            format!("'{}' holds plain values", segment),
                        ))
                    }
                },
            },
        };
    }

    Err(Error::UnknownProperty {
        owner: root.name.clone(),
        property: path.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ScalarType;
    use crate::criteria::{OrderSpec, Projection};
    use crate::test_schema::sales_schema;

    #[test]
    fn test_subcriteria_aliases() {
        let schema = sales_schema();
        let query = CriteriaQuery::new("Order")
            .create_alias("customer", "c", JoinKind::Inner)
            .create_alias("items", "i", JoinKind::Outer)
            .create_alias("i.product", "p", JoinKind::Outer);
        let translator = CriteriaTranslator::new(&query, &schema).unwrap();

        assert!(translator.is_join("items.product"));
        assert!(!translator.is_join("i.product"));
        assert_eq!(translator.join_kind("customer"), Some(JoinKind::Inner));
        assert_eq!(translator.criteria_for("customer").unwrap().sql_alias, "c0_");
        assert_eq!(translator.criteria_for("items.product").unwrap().sql_alias, "p2_");
        assert_eq!(translator.sql_alias_count(), 3);
        assert_eq!(translator.sql_alias("this").as_deref(), Some("this_"));
        assert_eq!(
            translator.explicit_paths().collect::<Vec<_>>(),
            vec!["customer", "items", "items.product"]
        );
    }

    #[test]
    fn test_alias_offset_shifts_ordinals() {
        let schema = sales_schema();
        let query = CriteriaQuery::new("Order")
            .with_alias_offset(4)
            .create_alias("customer", "c", JoinKind::Inner);
        let translator = CriteriaTranslator::new(&query, &schema).unwrap();

        assert_eq!(translator.criteria_for("customer").unwrap().sql_alias, "c4_");
        assert_eq!(translator.sql_alias_count(), 5);
    }

    #[test]
    fn test_reused_alias_is_ambiguous() {
        let schema = sales_schema();
        let query = CriteriaQuery::new("Order")
            .create_alias("customer", "c", JoinKind::Inner)
            .create_alias("buyer", "c", JoinKind::Inner);

        let err = CriteriaTranslator::new(&query, &schema).unwrap_err();
        assert!(matches!(err, Error::AmbiguousAlias { ref alias, .. } if alias == "c"));
    }

    #[test]
    fn test_root_alias_collision_is_ambiguous() {
        let schema = sales_schema();
        let query = CriteriaQuery::new("Order").create_alias("customer", "this", JoinKind::Inner);

        assert!(matches!(
            CriteriaTranslator::new(&query, &schema),
            Err(Error::AmbiguousAlias { .. })
        ));
    }

    #[test]
    fn test_two_aliases_for_one_path_is_ambiguous() {
        let schema = sales_schema();
        let query = CriteriaQuery::new("Order")
            .create_alias("customer", "c", JoinKind::Inner)
            .create_alias("customer", "d", JoinKind::Outer);

        assert!(matches!(
            CriteriaTranslator::new(&query, &schema),
            Err(Error::AmbiguousAlias { .. })
        ));
    }

    #[test]
    fn test_unknown_paths() {
        let schema = sales_schema();

        let query = CriteriaQuery::new("Invoice");
        assert!(matches!(
            CriteriaTranslator::new(&query, &schema),
            Err(Error::UnknownEntity(_))
        ));

        let query = CriteriaQuery::new("Order").create_alias("supplier", "s", JoinKind::Inner);
        assert!(matches!(
            CriteriaTranslator::new(&query, &schema),
            Err(Error::UnknownProperty { ref property, .. }) if property == "supplier"
        ));

        let query = CriteriaQuery::new("Order").create_alias("total", "t", JoinKind::Inner);
        assert!(matches!(
            CriteriaTranslator::new(&query, &schema),
            Err(Error::UnsupportedFetch { .. })
        ));
    }

    #[test]
    fn test_aliasing_value_collection_is_unsupported() {
        let schema = sales_schema();
        let query = CriteriaQuery::new("Order").create_alias("notes", "n", JoinKind::Outer);

        assert!(matches!(
            CriteriaTranslator::new(&query, &schema),
            Err(Error::UnsupportedFetch { ref path, .. }) if path == "notes"
        ));
    }

    #[test]
    fn test_paths_through_components_and_identifiers() {
        let schema = sales_schema();
        let customer = schema.entity("Customer").unwrap();
        let line = schema.entity("OrderLine").unwrap();

        assert!(resolve_association(&schema, customer, "address.country").is_ok());
        assert!(resolve_association(&schema, line, "id.order.customer").is_ok());
        assert!(matches!(
            resolve_association(&schema, line, "id"),
            Err(Error::UnsupportedFetch { .. })
        ));
        assert!(matches!(
            resolve_association(&schema, customer, "address"),
            Err(Error::UnsupportedFetch { .. })
        ));
    }

    #[test]
    fn test_fetch_modes_resolve_alias_prefixes() {
        let schema = sales_schema();
        let query = CriteriaQuery::new("Order")
            .create_alias("items", "i", JoinKind::Outer)
            .set_fetch_mode("i.product", FetchMode::Join);
        let translator = CriteriaTranslator::new(&query, &schema).unwrap();

        assert_eq!(translator.fetch_mode("items.product"), FetchMode::Join);
        assert_eq!(translator.fetch_mode("customer"), FetchMode::Default);
    }

    #[test]
    fn test_statement_fragments() {
        let schema = sales_schema();
        let query = CriteriaQuery::new("Order")
            .create_alias_with_clause("customer", "c", JoinKind::Inner, "{alias}.name <> ''")
            .add_restriction("{alias}.total > ?")
            .add_restriction("{c}.name like ?")
            .add_order(OrderSpec::desc("{this}.total"))
            .add_order(OrderSpec::asc("{c}.name"))
            .set_projection(
                Projection::new()
                    .with_column("{c}.name", ResultType::Scalar(ScalarType::String))
                    .with_aliased_column(
                        "sum({alias}.total)",
                        ResultType::Scalar(ScalarType::Float64),
                        "spent",
                    )
                    .with_group_by("{c}.name"),
            )
            .add_having("sum({alias}.total) > 100");
        let translator = CriteriaTranslator::new(&query, &schema).unwrap();

        assert_eq!(
            translator.where_condition().unwrap(),
            "(this_.total > ?) and (c0_.name like ?)"
        );
        assert_eq!(translator.order_by().unwrap(), "this_.total desc, c0_.name asc");
        assert_eq!(translator.group_by().unwrap().as_deref(), Some("c0_.name"));
        assert_eq!(
            translator.having().unwrap().as_deref(),
            Some("sum(this_.total) > 100")
        );
        assert_eq!(
            translator.select_fragment().unwrap().as_deref(),
            Some("c0_.name, sum(this_.total) as spent")
        );
        assert_eq!(
            translator.with_clause("customer", "c0_").unwrap().as_deref(),
            Some("c0_.name <> ''")
        );
        assert!(translator.has_projection());
        assert_eq!(translator.projected_types().len(), 2);
    }

    #[test]
    fn test_unknown_alias_in_restriction() {
        let schema = sales_schema();
        let query = CriteriaQuery::new("Order").add_restriction("{x}.total > 0");
        let translator = CriteriaTranslator::new(&query, &schema).unwrap();

        assert!(matches!(
            translator.where_condition(),
            Err(Error::UnknownAlias(name)) if name == "x"
        ));
    }
}
