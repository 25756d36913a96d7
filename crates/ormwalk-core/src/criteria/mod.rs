//! Criteria requests and their translation into planner inputs.

mod query;
mod template;
mod translator;

pub use query::{
    CriteriaQuery, OrderSpec, ProjectedColumn, Projection, SubCriteria, DEFAULT_ROOT_ALIAS,
};
pub use translator::{CriteriaTranslator, ResolvedCriteria};

pub(crate) use template::render;
pub(crate) use translator::conjunction;
