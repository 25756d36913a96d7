//! Composite identifier walking.
//!
//! A non-embedded composite identifier is a component of its own. Entity
//! references inside it (key many-to-one) are reachable only through that
//! component, so the root's identifier is walked like an association.

use super::graph_walker::{GraphWalker, WalkState};
use super::join_helper::LhsSqlInfo;
use super::policy::JoinPolicy;
use crate::catalog::{AssociationDef, ComponentDef, EntityDef, IdentifierDef};
use crate::error::{Error, Result};
use tracing::trace;

/// Pseudo-association over a composite identifier.
#[derive(Debug, Clone)]
pub struct IdentifierEdge<'r> {
    /// Identifier property name, which is also the walk path.
    pub path: &'r str,
    /// Identifier component.
    pub component: &'r ComponentDef,
    /// Synthesized association over the component.
    pub association: AssociationDef,
    /// Identifier columns in the owner table.
    pub lhs_columns: Vec<String>,
}

/// Derives the identifier edge of an entity.
pub struct CompositeIdWalker;

impl CompositeIdWalker {
    /// The identifier edge of `root`, when its identifier must be walked.
    pub fn identifier_edge(root: &EntityDef) -> Result<Option<IdentifierEdge<'_>>> {
        let IdentifierDef::Composite {
            property,
            component,
        } = &root.identifier
        else {
            return Ok(None);
        };

        let lhs_columns = component.columns();
        if lhs_columns.is_empty() {
            return Err(Error::configuration(format!(
                "composite identifier '{}' of entity '{}' declares zero columns",
                component.name, root.name
            )));
        }

        Ok(Some(IdentifierEdge {
            path: property,
            component,
            association: AssociationDef::component(component.clone()),
            lhs_columns,
        }))
    }
}

impl<P: JoinPolicy> GraphWalker<'_, P> {
    /// Walk the identifier component of `root` from the root table.
    pub(super) fn walk_composite_id_tree(
        &self,
        state: &mut WalkState,
        root: &EntityDef,
        lhs: &LhsSqlInfo,
    ) -> Result<()> {
        let Some(id) = CompositeIdWalker::identifier_edge(root)? else {
            return Ok(());
        };
        if state.composite_id_walked {
            return Ok(());
        }
        state.composite_id_walked = true;

        trace!(path = id.path, columns = ?id.lhs_columns, "walking composite identifier");
        self.walk_association(state, id.path, &id.association, lhs, id.path, 0)
    }
}
