//! Plan cache.
//!
//! Planning is a pure function of the schema, the query, the enabled filter
//! set and the planner configuration, so plans are cached under a fingerprint
//! of those inputs and dropped wholesale when the schema version moves.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::catalog::SchemaBundle;
use crate::config::PlannerConfig;
use crate::criteria::CriteriaQuery;
use crate::error::Result;
use crate::filter::EnabledFilters;
use crate::plan::PlanResult;

/// Fingerprint of a planning request.
///
/// The whole schema content is hashed, not just its version, so bundles that
/// share a version number never share plans. Filter parameter values are left
/// out: they never reach the plan, only which filters are enabled and which
/// parameters they carry do.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlanFingerprint([u8; 32]);

impl PlanFingerprint {
    /// Fingerprint of a criteria query plan.
    pub fn for_criteria(
        schema: &SchemaBundle,
        query: &CriteriaQuery,
        filters: &EnabledFilters,
        config: &PlannerConfig,
    ) -> Result<Self> {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"criteria\0");
        hasher.update(&serde_json::to_vec(query)?);
        Self::finish(hasher, schema, filters, config)
    }

    /// Fingerprint of an entity load plan.
    pub fn for_entity_load(
        schema: &SchemaBundle,
        entity: &str,
        filters: &EnabledFilters,
        config: &PlannerConfig,
    ) -> Result<Self> {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"entity\0");
        hasher.update(entity.as_bytes());
        Self::finish(hasher, schema, filters, config)
    }

    fn finish(
        mut hasher: blake3::Hasher,
        schema: &SchemaBundle,
        filters: &EnabledFilters,
        config: &PlannerConfig,
    ) -> Result<Self> {
        hasher.update(b"\0schema\0");
        hasher.update(&serde_json::to_vec(schema)?);
        for name in filters.names() {
            hasher.update(b"\0filter\0");
            hasher.update(name.as_bytes());
            for parameter in filters.parameter_names(name) {
                hasher.update(b"\0");
                hasher.update(parameter.as_bytes());
            }
        }
        hasher.update(b"\0config\0");
        hasher.update(&serde_json::to_vec(config)?);
        Ok(Self(*hasher.finalize().as_bytes()))
    }

    /// Hex encoding of the fingerprint.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for PlanFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex()[..16])
    }
}

impl fmt::Debug for PlanFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PlanFingerprint").field(&self.to_hex()).finish()
    }
}

/// Cached plan with metadata.
#[derive(Debug)]
pub struct CachedPlan {
    /// The plan.
    pub plan: Arc<PlanResult>,
    /// Schema version the plan was built against.
    pub schema_version: u64,
    /// Insertion sequence number; lower is older.
    pub sequence: u64,
    hit_count: AtomicU64,
}

impl CachedPlan {
    fn new(plan: Arc<PlanResult>, schema_version: u64, sequence: u64) -> Self {
        Self {
            plan,
            schema_version,
            sequence,
            hit_count: AtomicU64::new(0),
        }
    }

    /// Increment the hit count and return the new value.
    pub fn record_hit(&self) -> u64 {
        self.hit_count.fetch_add(1, AtomicOrdering::Relaxed) + 1
    }

    /// Get the current hit count.
    pub fn hits(&self) -> u64 {
        self.hit_count.load(AtomicOrdering::Relaxed)
    }
}

/// Cache statistics.
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl CacheStats {
    /// Get hit count.
    pub fn hits(&self) -> u64 {
        self.hits.load(AtomicOrdering::Relaxed)
    }

    /// Get miss count.
    pub fn misses(&self) -> u64 {
        self.misses.load(AtomicOrdering::Relaxed)
    }

    /// Get eviction count.
    pub fn evictions(&self) -> u64 {
        self.evictions.load(AtomicOrdering::Relaxed)
    }

    /// Hit rate between 0.0 and 1.0.
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits() as f64;
        let total = hits + self.misses() as f64;
        if total > 0.0 {
            hits / total
        } else {
            0.0
        }
    }
}

/// Bounded, thread-safe plan cache keyed by [`PlanFingerprint`].
///
/// When full, the oldest entry is evicted.
pub struct PlanCache {
    entries: RwLock<HashMap<PlanFingerprint, CachedPlan>>,
    max_entries: usize,
    current_schema_version: AtomicU64,
    next_sequence: AtomicU64,
    stats: CacheStats,
}

impl PlanCache {
    /// Create a cache holding at most `max_entries` plans.
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_entries,
            current_schema_version: AtomicU64::new(0),
            next_sequence: AtomicU64::new(0),
            stats: CacheStats::default(),
        }
    }

    /// Maximum number of cached plans.
    pub fn capacity(&self) -> usize {
        self.max_entries
    }

    /// Schema version the cache currently serves.
    pub fn schema_version(&self) -> u64 {
        self.current_schema_version.load(AtomicOrdering::SeqCst)
    }

    /// Cached plan for `fingerprint`, if built against the current schema.
    pub fn get(&self, fingerprint: &PlanFingerprint) -> Option<Arc<PlanResult>> {
        let current_version = self.schema_version();
        let guard = self.entries.read();

        if let Some(cached) = guard.get(fingerprint) {
            if cached.schema_version == current_version {
                cached.record_hit();
                self.stats.hits.fetch_add(1, AtomicOrdering::Relaxed);
                return Some(cached.plan.clone());
            }
        }

        self.stats.misses.fetch_add(1, AtomicOrdering::Relaxed);
        None
    }

    /// Insert a plan built against `schema_version`.
    pub fn insert(&self, fingerprint: PlanFingerprint, plan: Arc<PlanResult>, schema_version: u64) {
        if self.max_entries == 0 {
            return;
        }

        let current = self.schema_version();
        if schema_version > current {
            self.invalidate(schema_version);
        } else if schema_version < current {
            return;
        }

        let sequence = self.next_sequence.fetch_add(1, AtomicOrdering::Relaxed);
        let mut guard = self.entries.write();

        if guard.len() >= self.max_entries && !guard.contains_key(&fingerprint) {
            self.evict_oldest(&mut guard);
        }

        guard.insert(fingerprint, CachedPlan::new(plan, schema_version, sequence));
    }

    /// Drop every plan unless the cache already serves `schema_version`.
    pub fn sync_schema_version(&self, schema_version: u64) {
        if self.schema_version() != schema_version {
            self.invalidate(schema_version);
        }
    }

    /// Invalidate all plans (on schema change).
    pub fn invalidate(&self, new_schema_version: u64) {
        self.current_schema_version
            .store(new_schema_version, AtomicOrdering::SeqCst);
        self.entries.write().clear();
    }

    fn evict_oldest(&self, entries: &mut HashMap<PlanFingerprint, CachedPlan>) {
        let oldest = entries
            .iter()
            .min_by_key(|(_, cached)| cached.sequence)
            .map(|(key, _)| *key);

        if let Some(key) = oldest {
            entries.remove(&key);
            self.stats.evictions.fetch_add(1, AtomicOrdering::Relaxed);
        }
    }

    /// Get cache statistics.
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Hit count of the plan under `fingerprint`.
    pub fn hits_for(&self, fingerprint: &PlanFingerprint) -> Option<u64> {
        self.entries.read().get(fingerprint).map(CachedPlan::hits)
    }

    /// Get the current number of cached plans.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clear all cached plans.
    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

impl fmt::Debug for PlanCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlanCache")
            .field("len", &self.len())
            .field("max_entries", &self.max_entries)
            .field("schema_version", &self.schema_version())
            .finish()
    }
}
