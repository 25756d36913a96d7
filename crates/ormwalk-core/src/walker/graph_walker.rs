//! Association graph walker.
//!
//! The walker starts at the root entity and visits its associations depth
//! first in declaration order. Each edge is handed to the [`JoinPolicy`]; an
//! edge that is not joined ends the walk along that branch. Joined edges get
//! aliases, a [`JoinNode`], and their target's associations walked one level
//! deeper. Components are walked in place without a join of their own.

use super::alias::AliasAllocator;
use super::duplicate::{AssociationKey, DuplicateJoinDetector};
use super::join_helper::{EdgeTarget, LhsSqlInfo};
use super::policy::{EdgeContext, JoinPolicy};
use crate::catalog::{
    AssociationDef, AssociationKind, CollectionAssociation, ComponentDef, ElementKind, EntityDef,
    PropertyKind, SchemaBundle,
};
use crate::config::PlannerConfig;
use crate::error::Result;
use crate::filter::{EnabledFilters, FilterFragmentComposer, FilterSource, SchemaFilterSource};
use crate::plan::{BridgeJoin, JoinNode, PlanResult, UserAliasList};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, instrument, trace};

/// Mutable state of one planning pass.
#[derive(Debug)]
pub(super) struct WalkState {
    pub(super) allocator: AliasAllocator,
    pub(super) detector: DuplicateJoinDetector,
    pub(super) joins: Vec<JoinNode>,
    pub(super) user_aliases: Vec<Option<String>>,
    pub(super) collapsed: BTreeMap<String, String>,
    pub(super) query_spaces: BTreeSet<String>,
    pub(super) collection_joins: usize,
    pub(super) composite_id_walked: bool,
}

impl WalkState {
    fn new(alias_seed: usize) -> Self {
        Self {
            allocator: AliasAllocator::new(alias_seed),
            detector: DuplicateJoinDetector::new(),
            joins: Vec::new(),
            user_aliases: Vec::new(),
            collapsed: BTreeMap::new(),
            query_spaces: BTreeSet::new(),
            collection_joins: 0,
            composite_id_walked: false,
        }
    }
}

/// Plans the joins of a statement rooted at one entity.
///
/// The walker holds no state between calls; every [`plan`](Self::plan) call
/// builds its own alias allocator and duplicate detector.
pub struct GraphWalker<'s, P> {
    schema: &'s SchemaBundle,
    policy: P,
    config: PlannerConfig,
    filters: Box<dyn FilterSource + 's>,
}

impl<'s, P: JoinPolicy> GraphWalker<'s, P> {
    /// Create a walker over `schema` using the schema's own filters.
    pub fn new(schema: &'s SchemaBundle, policy: P, config: &PlannerConfig) -> Self {
        Self {
            schema,
            policy,
            config: config.clone(),
            filters: Box::new(SchemaFilterSource::new(schema)),
        }
    }

    /// Render row filters with `source` instead of the schema.
    pub fn with_filter_source(mut self, source: impl FilterSource + 's) -> Self {
        self.filters = Box::new(source);
        self
    }

    /// The policy in use.
    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Plan the statement rooted at `root`.
    #[instrument(skip_all, fields(root = %root.name))]
    pub fn plan(&self, root: &EntityDef, enabled: &EnabledFilters) -> Result<PlanResult> {
        let root_alias = self.policy.root_alias(root);
        let mut state = WalkState::new(self.policy.alias_seed());
        state.allocator.claim(&root_alias, "")?;
        state.query_spaces.insert(root.table.clone());

        let lhs = LhsSqlInfo::for_entity(&root_alias, root);
        self.walk_entity_tree(&mut state, root, &lhs, "", 0)?;
        self.walk_composite_id_tree(&mut state, root, &lhs)?;
        self.policy.check_joins(&state.joins)?;

        let statement = self.policy.statement(root)?;
        let where_clause = FilterFragmentComposer::new(self.filters.as_ref()).compose(
            &statement.where_clause,
            &root_alias,
            root,
            enabled,
        )?;

        let mut user_aliases = state.user_aliases;
        user_aliases.push(self.policy.root_user_alias());

        debug!(
            joins = state.joins.len(),
            collapsed = state.collapsed.len(),
            "plan complete"
        );

        Ok(PlanResult {
            root_entity: root.name.clone(),
            root_table: root.table.clone(),
            root_alias,
            joins: state.joins,
            result_types: statement.result_types,
            user_aliases: UserAliasList(user_aliases),
            select: statement.select,
            where_clause,
            order_by: statement.order_by,
            group_by: statement.group_by,
            having: statement.having,
            lock_mode: statement.lock_mode,
            query_spaces: state.query_spaces,
            collapsed_paths: state.collapsed,
            comment: self.policy.comment(root),
        })
    }

    fn walk_entity_tree(
        &self,
        state: &mut WalkState,
        entity: &EntityDef,
        lhs: &LhsSqlInfo,
        path: &str,
        depth: usize,
    ) -> Result<()> {
        if depth >= self.config.max_walk_depth {
            debug!(path, depth, "walk depth limit reached");
            return Ok(());
        }

        for property in &entity.properties {
            let sub_path = qualify(path, &property.name);
            match &property.kind {
                PropertyKind::Association(association) => {
                    self.walk_association(state, &property.name, association, lhs, &sub_path, depth)?
                }
                PropertyKind::Component(component) => {
                    self.walk_component_tree(state, component, lhs, &sub_path, depth)?
                }
                PropertyKind::Scalar { .. } => {}
            }
        }
        Ok(())
    }

    pub(super) fn walk_component_tree(
        &self,
        state: &mut WalkState,
        component: &ComponentDef,
        lhs: &LhsSqlInfo,
        path: &str,
        depth: usize,
    ) -> Result<()> {
        for property in &component.properties {
            let sub_path = qualify(path, &property.name);
            match &property.kind {
                PropertyKind::Association(association) => {
                    self.walk_association(state, &property.name, association, lhs, &sub_path, depth)?
                }
                PropertyKind::Component(nested) => {
                    self.walk_component_tree(state, nested, lhs, &sub_path, depth)?
                }
                PropertyKind::Scalar { .. } => {}
            }
        }
        Ok(())
    }

    pub(super) fn walk_association(
        &self,
        state: &mut WalkState,
        name: &str,
        association: &AssociationDef,
        lhs: &LhsSqlInfo,
        path: &str,
        depth: usize,
    ) -> Result<()> {
        let Some(target) = EdgeTarget::resolve(self.schema, association, lhs)? else {
            if let AssociationKind::Component(component) = &association.kind {
                return self.walk_component_tree(state, component, lhs, path, depth);
            }
            return Ok(());
        };

        let key = AssociationKey::for_edge(&lhs.table, target.owner_columns(), association, &target.table);
        let alias_name = match (&association.kind, target.entity) {
            (AssociationKind::Entity(_), Some(entity)) => entity.name.as_str(),
            (
                AssociationKind::Collection(CollectionAssociation {
                    element: ElementKind::ManyToMany { .. },
                    ..
                }),
                Some(entity),
            ) => entity.name.as_str(),
            _ => name,
        };
        let edge = EdgeContext {
            path,
            alias_name,
            edge: association,
            depth,
            duplicate: state.detector.is_duplicate(&key),
            collection_joins: state.collection_joins,
        };

        let kind = self.policy.resolve_join_kind(&edge);
        trace!(path, ?kind, duplicate = edge.duplicate, "edge resolved");
        if !kind.is_joined() {
            return Ok(());
        }

        if !self.policy.is_explicit_join(path) {
            if let Some(alias) = state.detector.equivalent_alias(&key, &lhs.alias, &target.table) {
                debug!(path, alias, "duplicate join collapsed");
                let alias = alias.to_string();
                state.collapsed.insert(path.to_string(), alias.clone());
                return self.walk_target(state, association, &target, &alias, path, depth);
            }
        }

        let allocation = self.policy.generate_alias(&mut state.allocator, &edge)?;
        let bridge = match &target.bridge {
            Some(hop) => {
                let alias = state.allocator.mint(name, path)?;
                let condition = hop.condition(&lhs.alias, &alias)?;
                state.query_spaces.insert(hop.table.clone());
                Some(BridgeJoin {
                    table: hop.table.clone(),
                    alias,
                    condition,
                })
            }
            None => None,
        };
        let condition_lhs = bridge.as_ref().map_or(lhs.alias.as_str(), |b| b.alias.as_str());
        let condition = target.condition(condition_lhs, &allocation.physical)?;
        let with_clause = self.policy.with_clause(path, &allocation.physical)?;

        state.detector.bind(key, &lhs.alias, &target.table, &allocation.physical);
        state.query_spaces.insert(target.table.clone());
        if association.is_collection() {
            state.collection_joins += 1;
        }
        if let Some(logical) = &allocation.logical {
            state.user_aliases.push(logical.name().map(str::to_string));
        }

        debug!(path, alias = %allocation.physical, ?kind, "join planned");
        state.joins.push(JoinNode {
            path: path.to_string(),
            alias: allocation.physical.clone(),
            logical_alias: allocation.logical,
            kind,
            association: association.label().to_string(),
            table: target.table.clone(),
            entity: target.entity.map(|e| e.name.clone()),
            lhs_alias: lhs.alias.clone(),
            lhs_table: lhs.table.clone(),
            condition,
            bridge,
            with_clause,
            depth,
            collection: association.is_collection(),
        });

        self.walk_target(state, association, &target, &allocation.physical, path, depth)
    }

    /// Walk the far side of a joined edge from `alias`, one level deeper.
    fn walk_target(
        &self,
        state: &mut WalkState,
        association: &AssociationDef,
        target: &EdgeTarget<'_>,
        alias: &str,
        path: &str,
        depth: usize,
    ) -> Result<()> {
        match (&association.kind, target.entity) {
            (
                AssociationKind::Collection(CollectionAssociation {
                    element: ElementKind::Component(component),
                    ..
                }),
                _,
            ) => {
                let elements = LhsSqlInfo::for_elements(alias, &target.table);
                self.walk_component_tree(state, component, &elements, path, depth + 1)
            }
            (_, Some(entity)) => {
                let owner = LhsSqlInfo::for_entity(alias, entity);
                self.walk_entity_tree(state, entity, &owner, path, depth + 1)
            }
            _ => Ok(()),
        }
    }
}

fn qualify(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", path, name)
    }
}
