//! CLI configuration.

use std::path::PathBuf;

use clap::Parser;
use ormwalk_core::config::{DEFAULT_MAX_COLLECTION_FETCHES, DEFAULT_MAX_WALK_DEPTH};
use ormwalk_core::PlannerConfig;

use crate::error::{Error, Result};
use crate::formatter::OutputFormat;

/// What to plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanRequest {
    /// A criteria query read from a JSON file.
    Criteria(PathBuf),
    /// The by-identifier load of an entity.
    EntityLoad(String),
}

/// Resolved CLI configuration.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Schema bundle file.
    pub schema_path: PathBuf,
    /// Plan to build.
    pub request: PlanRequest,
    /// Enabled filter file, if any.
    pub filters_path: Option<PathBuf>,
    /// Output format.
    pub format: OutputFormat,
    /// Planner limits.
    pub planner: PlannerConfig,
}

impl CliConfig {
    /// Plan a criteria query from `query_path` against `schema_path`.
    pub fn criteria(schema_path: impl Into<PathBuf>, query_path: impl Into<PathBuf>) -> Self {
        Self::new(schema_path, PlanRequest::Criteria(query_path.into()))
    }

    /// Plan the load of `entity` against `schema_path`.
    pub fn entity_load(schema_path: impl Into<PathBuf>, entity: impl Into<String>) -> Self {
        Self::new(schema_path, PlanRequest::EntityLoad(entity.into()))
    }

    fn new(schema_path: impl Into<PathBuf>, request: PlanRequest) -> Self {
        Self {
            schema_path: schema_path.into(),
            request,
            filters_path: None,
            format: OutputFormat::Table,
            planner: PlannerConfig::default(),
        }
    }

    /// Read enabled filters from `path`.
    pub fn with_filters(mut self, path: impl Into<PathBuf>) -> Self {
        self.filters_path = Some(path.into());
        self
    }

    /// Set the output format.
    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the planner limits.
    pub fn with_planner(mut self, planner: PlannerConfig) -> Self {
        self.planner = planner;
        self
    }
}

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "ormwalk")]
#[command(version, about = "Inspect the join plan of a criteria query", long_about = None)]
pub struct Args {
    /// Schema bundle (JSON).
    #[arg(short, long)]
    pub schema: PathBuf,

    /// Criteria query to plan (JSON).
    #[arg(short, long, conflicts_with = "load")]
    pub query: Option<PathBuf>,

    /// Plan the by-identifier load of this entity instead of a query.
    #[arg(short, long)]
    pub load: Option<String>,

    /// Enabled filters with parameter values (JSON object).
    #[arg(short, long)]
    pub filters: Option<PathBuf>,

    /// Output format.
    #[arg(long, default_value = "table", value_enum)]
    pub format: OutputFormat,

    /// Depth from which mapping fetches stop joining (0 = unlimited).
    #[arg(long, default_value_t = 0)]
    pub max_fetch_depth: usize,

    /// Collection joins allowed by mapping fetches.
    #[arg(long, default_value_t = DEFAULT_MAX_COLLECTION_FETCHES)]
    pub max_collection_fetches: usize,

    /// Recursion limit of the association walk.
    #[arg(long, default_value_t = DEFAULT_MAX_WALK_DEPTH)]
    pub max_walk_depth: usize,
}

impl Args {
    /// Convert command-line arguments to CLI configuration.
    pub fn into_config(self) -> Result<CliConfig> {
        let config = match (self.query, self.load) {
            (Some(query), None) => CliConfig::criteria(self.schema, query),
            (None, Some(entity)) => CliConfig::entity_load(self.schema, entity),
            (Some(_), Some(_)) => {
                return Err(Error::Config("--query and --load are exclusive".to_string()))
            }
            (None, None) => {
                return Err(Error::Config("one of --query or --load is required".to_string()))
            }
        };

        let mut planner = PlannerConfig::new()
            .with_max_collection_fetches(self.max_collection_fetches)
            .with_max_walk_depth(self.max_walk_depth);
        if self.max_fetch_depth > 0 {
            planner = planner.with_max_fetch_depth(self.max_fetch_depth);
        }

        let mut config = config
            .with_format(self.format)
            .with_planner(planner);
        if let Some(filters) = self.filters {
            config = config.with_filters(filters);
        }
        Ok(config)
    }
}
