//! Planner entry points.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::cache::{CacheStats, PlanCache, PlanFingerprint};
use crate::catalog::{Catalog, SchemaBundle};
use crate::config::PlannerConfig;
use crate::criteria::{CriteriaQuery, CriteriaTranslator};
use crate::error::Result;
use crate::filter::EnabledFilters;
use crate::plan::PlanResult;
use crate::walker::{CriteriaPolicy, EntityLoadPolicy, GraphWalker};

/// Plans criteria queries and entity loads, optionally caching the results.
#[derive(Debug)]
pub struct Planner {
    config: PlannerConfig,
    cache: Option<PlanCache>,
}

impl Planner {
    /// Create a planner without a cache.
    pub fn new(config: PlannerConfig) -> Self {
        Self {
            config,
            cache: None,
        }
    }

    /// Cache up to `capacity` plans.
    pub fn with_cache(mut self, capacity: usize) -> Self {
        self.cache = Some(PlanCache::new(capacity));
        self
    }

    /// Planner configuration.
    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// The plan cache, when enabled.
    pub fn cache(&self) -> Option<&PlanCache> {
        self.cache.as_ref()
    }

    /// Cache statistics, when caching is enabled.
    pub fn cache_stats(&self) -> Option<&CacheStats> {
        self.cache.as_ref().map(PlanCache::stats)
    }

    /// Plan a criteria query against `schema`.
    #[instrument(skip_all, fields(root = %query.root_entity, schema_version = schema.version))]
    pub fn plan_criteria(
        &self,
        schema: &SchemaBundle,
        query: &CriteriaQuery,
        filters: &EnabledFilters,
    ) -> Result<Arc<PlanResult>> {
        self.cached(
            schema,
            || PlanFingerprint::for_criteria(schema, query, filters, &self.config),
            || {
                let translator = CriteriaTranslator::new(query, schema)?;
                let policy = CriteriaPolicy::new(&translator, &self.config);
                GraphWalker::new(schema, policy, &self.config).plan(translator.root(), filters)
            },
        )
    }

    /// Plan a criteria query against the catalog's current schema.
    pub fn plan_with_catalog(
        &self,
        catalog: &Catalog,
        query: &CriteriaQuery,
        filters: &EnabledFilters,
    ) -> Result<Arc<PlanResult>> {
        self.plan_criteria(&catalog.snapshot(), query, filters)
    }

    /// Plan the load of one `entity` by identifier.
    #[instrument(skip_all, fields(entity = entity, schema_version = schema.version))]
    pub fn plan_entity_load(
        &self,
        schema: &SchemaBundle,
        entity: &str,
        filters: &EnabledFilters,
    ) -> Result<Arc<PlanResult>> {
        self.cached(
            schema,
            || PlanFingerprint::for_entity_load(schema, entity, filters, &self.config),
            || {
                let root = schema.entity(entity)?;
                let policy = EntityLoadPolicy::new(&self.config);
                GraphWalker::new(schema, policy, &self.config).plan(root, filters)
            },
        )
    }

    fn cached(
        &self,
        schema: &SchemaBundle,
        fingerprint: impl FnOnce() -> Result<PlanFingerprint>,
        build: impl FnOnce() -> Result<PlanResult>,
    ) -> Result<Arc<PlanResult>> {
        let Some(cache) = &self.cache else {
            return build().map(Arc::new);
        };

        cache.sync_schema_version(schema.version);
        let fingerprint = fingerprint()?;
        if let Some(plan) = cache.get(&fingerprint) {
            debug!(%fingerprint, "plan cache hit");
            return Ok(plan);
        }

        let plan = Arc::new(build()?);
        cache.insert(fingerprint, plan.clone(), schema.version);
        debug!(%fingerprint, joins = plan.joins.len(), "plan cached");
        Ok(plan)
    }
}

impl Default for Planner {
    fn default() -> Self {
        Self::new(PlannerConfig::default())
    }
}
