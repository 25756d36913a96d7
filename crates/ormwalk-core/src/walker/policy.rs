//! Fetch strategy policies.
//!
//! A [`JoinPolicy`] is the set of hooks the [`GraphWalker`](super::GraphWalker)
//! consults while walking: which join kind an edge gets, how its aliases are
//! allocated, and which statement fragments accompany the joins.
//! [`EntityLoadPolicy`] is the mapping-driven policy of plain object loading;
//! [`CriteriaPolicy`] layers caller requests on top of it.

use super::alias::{generate_alias, AliasAllocation, AliasAllocator, ROOT_SQL_ALIAS};
use crate::catalog::{AssociationDef, EntityDef, FetchMode};
use crate::config::PlannerConfig;
use crate::criteria::CriteriaTranslator;
use crate::error::{Error, Result};
use crate::plan::{JoinKind, JoinNode, LockMode, ResultTypeDescriptor};

/// One association edge as seen by a policy.
#[derive(Debug, Clone, Copy)]
pub struct EdgeContext<'e> {
    /// Full path of the edge.
    pub path: &'e str,
    /// Name minted aliases are derived from.
    pub alias_name: &'e str,
    /// The association.
    pub edge: &'e AssociationDef,
    /// Walk depth (0 for edges leaving the root).
    pub depth: usize,
    /// Whether a join over the same foreign key was already planned.
    pub duplicate: bool,
    /// Collection joins planned so far.
    pub collection_joins: usize,
}

/// Statement parts that accompany the join tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementFragments {
    /// Row shape.
    pub result_types: ResultTypeDescriptor,
    /// Select list for projections.
    pub select: Option<String>,
    /// Base where clause, before filters.
    pub where_clause: String,
    /// Order-by list.
    pub order_by: String,
    /// Group-by list.
    pub group_by: Option<String>,
    /// Having clause.
    pub having: Option<String>,
    /// Row lock.
    pub lock_mode: LockMode,
}

impl StatementFragments {
    /// Whole-entity load of `root` with no further clauses.
    pub fn entity(root: &EntityDef) -> Self {
        Self {
            result_types: ResultTypeDescriptor::entity(&root.name),
            select: None,
            where_clause: String::new(),
            order_by: String::new(),
            group_by: None,
            having: None,
            lock_mode: LockMode::None,
        }
    }
}

/// Hooks consulted by the graph walker.
pub trait JoinPolicy {
    /// Physical alias of the root table.
    fn root_alias(&self, root: &EntityDef) -> String;

    /// Caller alias of the root, appended last to the user alias list.
    fn root_user_alias(&self) -> Option<String> {
        None
    }

    /// First ordinal minted aliases may use.
    fn alias_seed(&self) -> usize;

    /// Join kind of an edge; `JoinKind::None` stops the walk at the edge.
    fn resolve_join_kind(&self, edge: &EdgeContext<'_>) -> JoinKind;

    /// Check if the caller asked for a join of its own at `path`.
    fn is_explicit_join(&self, _path: &str) -> bool {
        false
    }

    /// Allocate the aliases of a joined edge.
    fn generate_alias(
        &self,
        allocator: &mut AliasAllocator,
        edge: &EdgeContext<'_>,
    ) -> Result<AliasAllocation> {
        allocator.allocate(
            edge.alias_name,
            edge.path,
            edge.edge.consumes_user_alias(),
            None,
        )
    }

    /// Extra ON-clause restriction of the join at `path`.
    fn with_clause(&self, _path: &str, _alias: &str) -> Result<Option<String>> {
        Ok(None)
    }

    /// Statement fragments for a plan rooted at `root`.
    fn statement(&self, root: &EntityDef) -> Result<StatementFragments>;

    /// Validate the finished join list.
    fn check_joins(&self, _joins: &[JoinNode]) -> Result<()> {
        Ok(())
    }

    /// Comment describing the statement.
    fn comment(&self, root: &EntityDef) -> String;
}

/// Mapping-driven policy used to load entities by identifier.
#[derive(Debug, Clone)]
pub struct EntityLoadPolicy {
    max_fetch_depth: Option<usize>,
    max_collection_fetches: usize,
    alias_seed: usize,
}

impl EntityLoadPolicy {
    /// Create the policy from planner limits.
    pub fn new(config: &PlannerConfig) -> Self {
        Self {
            max_fetch_depth: config.max_fetch_depth,
            max_collection_fetches: config.max_collection_fetches,
            alias_seed: 1,
        }
    }

    /// Start minted aliases at `seed`.
    pub fn with_alias_seed(mut self, seed: usize) -> Self {
        self.alias_seed = seed;
        self
    }

    fn too_deep(&self, depth: usize) -> bool {
        self.max_fetch_depth.is_some_and(|max| depth >= max)
    }
}

impl JoinPolicy for EntityLoadPolicy {
    fn root_alias(&self, root: &EntityDef) -> String {
        generate_alias(&root.name, 0)
    }

    fn alias_seed(&self) -> usize {
        self.alias_seed
    }

    fn resolve_join_kind(&self, edge: &EdgeContext<'_>) -> JoinKind {
        if edge.edge.fetch != FetchMode::Join {
            return JoinKind::None;
        }
        if self.too_deep(edge.depth) {
            return JoinKind::None;
        }
        if edge.edge.is_collection() && edge.collection_joins >= self.max_collection_fetches {
            return JoinKind::None;
        }
        if edge.duplicate {
            return JoinKind::None;
        }
        JoinKind::for_fetch(edge.edge.nullable, edge.depth)
    }

    fn statement(&self, root: &EntityDef) -> Result<StatementFragments> {
        Ok(StatementFragments::entity(root))
    }

    fn comment(&self, root: &EntityDef) -> String {
        format!("load {}", root.name)
    }
}

/// Policy of criteria queries: explicit joins first, then projection
/// suppression, then per-path fetch modes over the entity load policy.
#[derive(Debug)]
pub struct CriteriaPolicy<'t, 'a> {
    translator: &'t CriteriaTranslator<'a>,
    base: EntityLoadPolicy,
}

impl<'t, 'a> CriteriaPolicy<'t, 'a> {
    /// Create the policy for a translated query.
    pub fn new(translator: &'t CriteriaTranslator<'a>, config: &PlannerConfig) -> Self {
        Self {
            translator,
            base: EntityLoadPolicy::new(config).with_alias_seed(translator.sql_alias_count()),
        }
    }
}

impl JoinPolicy for CriteriaPolicy<'_, '_> {
    fn root_alias(&self, _root: &EntityDef) -> String {
        ROOT_SQL_ALIAS.to_string()
    }

    fn root_user_alias(&self) -> Option<String> {
        Some(self.translator.root_alias().to_string())
    }

    fn alias_seed(&self) -> usize {
        self.translator.sql_alias_count()
    }

    fn resolve_join_kind(&self, edge: &EdgeContext<'_>) -> JoinKind {
        if let Some(kind) = self.translator.join_kind(edge.path) {
            return kind;
        }
        if self.translator.has_projection() {
            return JoinKind::None;
        }
        match self.translator.fetch_mode(edge.path) {
            FetchMode::Default => self.base.resolve_join_kind(edge),
            // duplicates are joined anyway and collapsed onto the first join
            FetchMode::Join => JoinKind::for_fetch(edge.edge.nullable, edge.depth),
            FetchMode::Select => JoinKind::None,
        }
    }

    fn is_explicit_join(&self, path: &str) -> bool {
        self.translator.is_join(path)
    }

    fn generate_alias(
        &self,
        allocator: &mut AliasAllocator,
        edge: &EdgeContext<'_>,
    ) -> Result<AliasAllocation> {
        allocator.allocate(
            edge.alias_name,
            edge.path,
            edge.edge.consumes_user_alias(),
            self.translator.criteria_for(edge.path),
        )
    }

    fn with_clause(&self, path: &str, alias: &str) -> Result<Option<String>> {
        self.translator.with_clause(path, alias)
    }

    fn statement(&self, root: &EntityDef) -> Result<StatementFragments> {
        let result_types = if self.translator.has_projection() {
            ResultTypeDescriptor::projection(self.translator.projected_types())
        } else {
            ResultTypeDescriptor::entity(&root.name)
        };

        Ok(StatementFragments {
            result_types,
            select: self.translator.select_fragment()?,
            where_clause: self.translator.where_condition()?,
            order_by: self.translator.order_by()?,
            group_by: self.translator.group_by()?,
            having: self.translator.having()?,
            lock_mode: self.translator.lock_mode(),
        })
    }

    fn check_joins(&self, joins: &[JoinNode]) -> Result<()> {
        for path in self.translator.explicit_paths() {
            if !joins.iter().any(|j| j.path == path) {
                return Err(Error::unsupported_fetch(
                    path,
                    "the parent association is not joined",
                ));
            }
        }
        Ok(())
    }

    fn comment(&self, _root: &EntityDef) -> String {
        "criteria query".to_string()
    }
}
