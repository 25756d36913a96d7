//! Plan command.

use std::path::Path;
use std::sync::Arc;

use ormwalk_core::{Catalog, CriteriaQuery, EnabledFilters, PlanResult, Planner, SchemaBundle};
use tracing::info;

use crate::config::{CliConfig, PlanRequest};
use crate::error::{Error, Result};
use crate::formatter::create_formatter;

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn parse<T: serde::de::DeserializeOwned>(what: &'static str, path: &Path) -> Result<T> {
    serde_json::from_str(&read(path)?).map_err(|source| Error::Parse {
        what,
        path: path.to_path_buf(),
        source,
    })
}

/// Load and apply the schema bundle at `path`.
pub fn load_catalog(path: &Path) -> Result<Catalog> {
    let bundle: SchemaBundle = parse("schema bundle", path)?;
    let catalog = Catalog::with_schema(bundle)?;
    info!(
        path = %path.display(),
        entities = catalog.list_entities().len(),
        "schema loaded"
    );
    Ok(catalog)
}

/// Build the plan described by `config`.
pub fn plan(config: &CliConfig) -> Result<Arc<PlanResult>> {
    let catalog = load_catalog(&config.schema_path)?;
    let schema = catalog.snapshot();

    let filters = match &config.filters_path {
        Some(path) => parse::<EnabledFilters>("filter set", path)?,
        None => EnabledFilters::new(),
    };

    let planner = Planner::new(config.planner.clone());
    let plan = match &config.request {
        PlanRequest::Criteria(path) => {
            let query: CriteriaQuery = parse("criteria query", path)?;
            planner.plan_criteria(&schema, &query, &filters)?
        }
        PlanRequest::EntityLoad(entity) => planner.plan_entity_load(&schema, entity, &filters)?,
    };

    info!(
        root = %plan.root_entity,
        joins = plan.joins.len(),
        collapsed = plan.collapsed_paths.len(),
        "plan built"
    );
    Ok(plan)
}

/// Build the plan and render it in the configured format.
pub fn run(config: &CliConfig) -> Result<String> {
    let plan = plan(config)?;
    Ok(create_formatter(config.format).format_plan(&plan))
}
