//! Root-level where clause composition.

use super::enabled::EnabledFilters;
use super::source::FilterSource;
use crate::catalog::EntityDef;
use crate::criteria::conjunction;
use crate::error::Result;

/// Appends the root entity's filter fragment to the base where clause.
pub struct FilterFragmentComposer<'f> {
    source: &'f dyn FilterSource,
}

impl<'f> FilterFragmentComposer<'f> {
    /// Create a composer over a filter source.
    pub fn new(source: &'f dyn FilterSource) -> Self {
        Self { source }
    }

    /// Filter fragment of `root` under `root_alias`.
    pub fn fragment(
        &self,
        root_alias: &str,
        root: &EntityDef,
        enabled: &EnabledFilters,
    ) -> Result<String> {
        self.source.filter_fragment(root_alias, root, enabled)
    }

    /// Final where clause: `base_where` and-ed with the filter fragment.
    pub fn compose(
        &self,
        base_where: &str,
        root_alias: &str,
        root: &EntityDef,
        enabled: &EnabledFilters,
    ) -> Result<String> {
        let fragment = self.fragment(root_alias, root, enabled)?;
        let parts = [base_where.to_string(), fragment]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect();
        Ok(conjunction(parts))
    }
}
