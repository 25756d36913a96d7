//! Row filters.
//!
//! Callers enable named filters per planning pass. The filter source renders
//! the discriminator and enabled filter conditions of the root entity, and the
//! composer appends that fragment to the where clause once, at root level.

mod composer;
mod enabled;
mod source;

pub use composer::FilterFragmentComposer;
pub use enabled::EnabledFilters;
pub use source::{FilterSource, SchemaFilterSource};
