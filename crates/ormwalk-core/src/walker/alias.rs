//! Physical alias generation and allocation.

use crate::criteria::ResolvedCriteria;
use crate::error::{Error, Result};
use crate::plan::LogicalAlias;
use std::collections::HashMap;

/// Physical alias of the root table in criteria queries.
pub const ROOT_SQL_ALIAS: &str = "this_";

/// Longest prefix of a name kept in a generated alias.
const ALIAS_TRUNCATE_LENGTH: usize = 10;

/// Generate a SQL alias from a type, table or property name and an ordinal.
///
/// `Acme.LineItem` with ordinal 3 becomes `lineitem3_`. A name ending in a
/// digit gets an `x` appended before the ordinal, so the ordinal is always
/// the trailing digit run and distinct ordinals never collide.
pub fn generate_alias(description: &str, ordinal: usize) -> String {
    format!("{}{}_", alias_root(description), ordinal)
}

fn alias_root(description: &str) -> String {
    let unqualified = description.rsplit('.').next().unwrap_or(description);
    let truncated: String = unqualified.chars().take(ALIAS_TRUNCATE_LENGTH).collect();
    let mut root = truncated.to_lowercase().replace('$', "_");

    if root.is_empty() {
        root.push_str("alias");
    }
    if root.chars().last().is_some_and(|c| c.is_ascii_digit()) {
        root.push('x');
    }
    root
}

/// Outcome of allocating aliases for one join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasAllocation {
    /// Physical alias used in generated SQL.
    pub physical: String,
    /// Caller-facing slot, `None` for structural joins.
    pub logical: Option<LogicalAlias>,
}

/// Mints collision-free physical aliases for one planning pass.
#[derive(Debug)]
pub struct AliasAllocator {
    next: usize,
    claimed: HashMap<String, String>,
}

impl AliasAllocator {
    /// Create an allocator whose first minted ordinal is `seed`.
    ///
    /// The seed must lie past every ordinal already handed out in the
    /// statement (sub-criteria aliases, enclosing queries).
    pub fn new(seed: usize) -> Self {
        Self {
            next: seed,
            claimed: HashMap::new(),
        }
    }

    /// Record that `alias` serves `path`.
    pub fn claim(&mut self, alias: &str, path: &str) -> Result<()> {
        match self.claimed.get(alias) {
            Some(owner) if owner != path => Err(Error::AmbiguousAlias {
                alias: alias.to_string(),
                first: display_path(owner),
                second: display_path(path),
            }),
            Some(_) => Ok(()),
            None => {
                self.claimed.insert(alias.to_string(), path.to_string());
                Ok(())
            }
        }
    }

    /// Mint a fresh alias derived from `name` for `path`.
    pub fn mint(&mut self, name: &str, path: &str) -> Result<String> {
        let alias = generate_alias(name, self.next);
        self.next += 1;
        self.claim(&alias, path)?;
        Ok(alias)
    }

    /// Allocate the aliases of the join at `path`.
    ///
    /// An alias-consuming edge reuses the caller's sub-criteria alias when one
    /// is registered for the path and is otherwise anonymous; a structural
    /// edge always gets a fresh alias and no caller-facing slot.
    pub fn allocate(
        &mut self,
        name: &str,
        path: &str,
        consumes_user_alias: bool,
        criteria: Option<&ResolvedCriteria>,
    ) -> Result<AliasAllocation> {
        match (consumes_user_alias, criteria) {
            (true, Some(criteria)) => {
                self.claim(&criteria.sql_alias, path)?;
                Ok(AliasAllocation {
                    physical: criteria.sql_alias.clone(),
                    logical: Some(LogicalAlias::Named(criteria.alias.clone())),
                })
            }
            (true, None) => Ok(AliasAllocation {
                physical: self.mint(name, path)?,
                logical: Some(LogicalAlias::Anonymous),
            }),
            (false, Some(criteria)) => Err(Error::unsupported_fetch(
                path,
                format!(
                    "alias '{}' requested for a collection of plain values",
                    criteria.alias
                ),
            )),
            (false, None) => Ok(AliasAllocation {
                physical: self.mint(name, path)?,
                logical: None,
            }),
        }
    }

    /// Number of aliases claimed so far.
    #[cfg(test)]
    fn claimed_count(&self) -> usize {
        self.claimed.len()
    }
}

fn display_path(path: &str) -> String {
    if path.is_empty() {
        "<root>".to_string()
    } else {
        path.to_string()
    }
}
