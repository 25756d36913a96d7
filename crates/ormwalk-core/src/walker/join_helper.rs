//! Left- and right-hand side join columns of association edges.

use crate::catalog::{
    AssociationDef, AssociationKind, ElementKind, EntityDef, ForeignKeyDirection, SchemaBundle,
};
use crate::error::{Error, Result};
use crate::plan::JoinCondition;

/// The table an edge is joined from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LhsSqlInfo {
    /// Physical alias of the table.
    pub alias: String,
    /// Table name.
    pub table: String,
    /// Identifier columns of the rows in the table; empty for component
    /// elements, which have no identity.
    pub identifier_columns: Vec<String>,
}

impl LhsSqlInfo {
    /// Rows of `entity` under `alias`.
    pub fn for_entity(alias: impl Into<String>, entity: &EntityDef) -> Self {
        Self {
            alias: alias.into(),
            table: entity.table.clone(),
            identifier_columns: entity.identifier_columns(),
        }
    }

    /// Component elements of a collection table under `alias`.
    pub fn for_elements(alias: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            table: table.into(),
            identifier_columns: Vec::new(),
        }
    }
}

/// Bridge hop of a many-to-many edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeTarget {
    /// Bridge table.
    pub table: String,
    /// Owner columns referenced by the bridge.
    pub lhs_columns: Vec<String>,
    /// Bridge columns referencing the owner.
    pub rhs_columns: Vec<String>,
}

/// Where an edge leads and how it is joined.
#[derive(Debug, Clone)]
pub struct EdgeTarget<'s> {
    /// Joined table.
    pub table: String,
    /// Entity stored in the joined table.
    pub entity: Option<&'s EntityDef>,
    /// Columns joined from: the owner table, or the bridge for many-to-many.
    pub lhs_columns: Vec<String>,
    /// Columns joined to in the joined table.
    pub rhs_columns: Vec<String>,
    /// Bridge hop for many-to-many edges.
    pub bridge: Option<BridgeTarget>,
}

impl<'s> EdgeTarget<'s> {
    /// Resolve the target of `edge` leaving `lhs`. Pseudo-associations over
    /// components have no target table and resolve to `None`.
    pub fn resolve(
        schema: &'s SchemaBundle,
        edge: &AssociationDef,
        lhs: &LhsSqlInfo,
    ) -> Result<Option<Self>> {
        let target = match &edge.kind {
            AssociationKind::Component(_) => return Ok(None),
            AssociationKind::Entity(association) => {
                let entity = schema.entity(&association.target)?;
                let (lhs_columns, rhs_columns) = match association.foreign_key {
                    ForeignKeyDirection::FromParent => {
                        (association.columns.clone(), entity.identifier_columns())
                    }
                    ForeignKeyDirection::ToParent => {
                        (lhs.identifier_columns.clone(), association.columns.clone())
                    }
                };
                Self {
                    table: entity.table.clone(),
                    entity: Some(entity),
                    lhs_columns,
                    rhs_columns,
                    bridge: None,
                }
            }
            AssociationKind::Collection(collection) => match &collection.element {
                ElementKind::OneToMany { target } => {
                    let entity = schema.entity(target)?;
                    Self {
                        table: entity.table.clone(),
                        entity: Some(entity),
                        lhs_columns: lhs.identifier_columns.clone(),
                        rhs_columns: collection.key_columns.clone(),
                        bridge: None,
                    }
                }
                ElementKind::ManyToMany { target, columns } => {
                    let entity = schema.entity(target)?;
                    Self {
                        table: entity.table.clone(),
                        entity: Some(entity),
                        lhs_columns: columns.clone(),
                        rhs_columns: entity.identifier_columns(),
                        bridge: Some(BridgeTarget {
                            table: collection_table(collection.table.as_deref(), lhs)?,
                            lhs_columns: lhs.identifier_columns.clone(),
                            rhs_columns: collection.key_columns.clone(),
                        }),
                    }
                }
                ElementKind::Value { .. } | ElementKind::Component(_) => Self {
                    table: collection_table(collection.table.as_deref(), lhs)?,
                    entity: None,
                    lhs_columns: lhs.identifier_columns.clone(),
                    rhs_columns: collection.key_columns.clone(),
                    bridge: None,
                },
            },
        };
        Ok(Some(target))
    }

    /// Columns of the owner table the edge starts from.
    pub fn owner_columns(&self) -> &[String] {
        match &self.bridge {
            Some(bridge) => &bridge.lhs_columns,
            None => &self.lhs_columns,
        }
    }

    /// Condition joining the owner (or bridge) alias to `alias`.
    pub fn condition(&self, lhs_alias: &str, alias: &str) -> Result<JoinCondition> {
        JoinCondition::equi(lhs_alias, &self.lhs_columns, alias, &self.rhs_columns)
    }
}

impl BridgeTarget {
    /// Condition joining the owner alias to the bridge alias.
    pub fn condition(&self, lhs_alias: &str, alias: &str) -> Result<JoinCondition> {
        JoinCondition::equi(lhs_alias, &self.lhs_columns, alias, &self.rhs_columns)
    }
}

fn collection_table(table: Option<&str>, lhs: &LhsSqlInfo) -> Result<String> {
    table.map(str::to_string).ok_or_else(|| {
        Error::configuration(format!(
            "collection joined from '{}' declares no collection table",
            lhs.table
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_schema::sales_schema;

    fn order_lhs(schema: &SchemaBundle) -> LhsSqlInfo {
        LhsSqlInfo::for_entity("this_", schema.entity("Order").unwrap())
    }

    fn edge<'s>(schema: &'s SchemaBundle, entity: &str, name: &str) -> &'s AssociationDef {
        schema
            .entity(entity)
            .unwrap()
            .get_property(name)
            .and_then(|p| p.as_association())
            .unwrap()
    }

    #[test]
    fn test_many_to_one_target() {
        let schema = sales_schema();
        let lhs = order_lhs(&schema);
        let target = EdgeTarget::resolve(&schema, edge(&schema, "Order", "customer"), &lhs)
            .unwrap()
            .unwrap();

        assert_eq!(target.table, "customers");
        assert_eq!(target.owner_columns(), ["customer_id".to_string()]);
        assert_eq!(
            target.condition("this_", "customer1_").unwrap().to_string(),
            "this_.customer_id = customer1_.id"
        );
    }

    #[test]
    fn test_one_to_many_target() {
        let schema = sales_schema();
        let lhs = order_lhs(&schema);
        let target = EdgeTarget::resolve(&schema, edge(&schema, "Order", "items"), &lhs)
            .unwrap()
            .unwrap();

        assert_eq!(target.entity.map(|e| e.name.as_str()), Some("LineItem"));
        assert_eq!(
            target.condition("this_", "items1_").unwrap().to_string(),
            "this_.id = items1_.order_id"
        );
    }

    #[test]
    fn test_many_to_many_target() {
        let schema = sales_schema();
        let lhs = order_lhs(&schema);
        let target = EdgeTarget::resolve(&schema, edge(&schema, "Order", "tags"), &lhs)
            .unwrap()
            .unwrap();
        let bridge = target.bridge.as_ref().unwrap();

        assert_eq!(bridge.table, "order_tags");
        assert_eq!(target.owner_columns(), ["id".to_string()]);
        assert_eq!(
            bridge.condition("this_", "order_tags1_").unwrap().to_string(),
            "this_.id = order_tags1_.order_id"
        );
        assert_eq!(
            target.condition("order_tags1_", "tags2_").unwrap().to_string(),
            "order_tags1_.tag_id = tags2_.id"
        );
    }

    #[test]
    fn test_value_collection_target() {
        let schema = sales_schema();
        let lhs = order_lhs(&schema);
        let target = EdgeTarget::resolve(&schema, edge(&schema, "Order", "notes"), &lhs)
            .unwrap()
            .unwrap();

        assert_eq!(target.table, "order_notes");
        assert!(target.entity.is_none());
    }

    #[test]
    fn test_component_pseudo_edge_has_no_target() {
        let schema = sales_schema();
        let line = schema.entity("OrderLine").unwrap();
        let pseudo = AssociationDef::component(line.identifier.component().unwrap().clone());
        let lhs = LhsSqlInfo::for_entity("this_", line);

        assert!(EdgeTarget::resolve(&schema, &pseudo, &lhs).unwrap().is_none());
    }
}
