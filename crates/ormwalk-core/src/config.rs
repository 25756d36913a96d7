//! Planner configuration.

use serde::{Deserialize, Serialize};

/// Default number of collection joins the default fetch policy allows.
pub const DEFAULT_MAX_COLLECTION_FETCHES: usize = 1;

/// Default recursion limit of the association walk.
pub const DEFAULT_MAX_WALK_DEPTH: usize = 16;

/// Limits applied while walking the association graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Depth from which the default fetch policy stops joining. None means
    /// unbounded.
    pub max_fetch_depth: Option<usize>,

    /// Collection joins the default fetch policy allows per plan; more would
    /// multiply result rows.
    pub max_collection_fetches: usize,

    /// Depth at which the walk stops recursing regardless of policy.
    pub max_walk_depth: usize,
}

impl PlannerConfig {
    /// Create a configuration with default limits.
    pub fn new() -> Self {
        Self {
            max_fetch_depth: None,
            max_collection_fetches: DEFAULT_MAX_COLLECTION_FETCHES,
            max_walk_depth: DEFAULT_MAX_WALK_DEPTH,
        }
    }

    /// Set the fetch depth limit.
    pub fn with_max_fetch_depth(mut self, depth: usize) -> Self {
        self.max_fetch_depth = Some(depth);
        self
    }

    /// Remove the fetch depth limit.
    pub fn without_fetch_depth_limit(mut self) -> Self {
        self.max_fetch_depth = None;
        self
    }

    /// Set the number of collection joins allowed by the default policy.
    pub fn with_max_collection_fetches(mut self, count: usize) -> Self {
        self.max_collection_fetches = count;
        self
    }

    /// Set the walk depth limit.
    pub fn with_max_walk_depth(mut self, depth: usize) -> Self {
        self.max_walk_depth = depth.max(1);
        self
    }

    /// Check if the default policy may still join at `depth`.
    pub fn allows_fetch_at(&self, depth: usize) -> bool {
        self.max_fetch_depth.map_or(true, |max| depth < max)
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self::new()
    }
}
