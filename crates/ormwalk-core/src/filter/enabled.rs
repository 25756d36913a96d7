//! The caller's active filter set.

use crate::catalog::SchemaBundle;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Filters enabled for one planning pass, with their parameter values.
///
/// Parameter values are carried for the statement executor; planning only
/// checks that every declared parameter is supplied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnabledFilters {
    filters: BTreeMap<String, BTreeMap<String, Value>>,
}

impl EnabledFilters {
    /// Create an empty filter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable a filter without parameters.
    pub fn enable(mut self, name: impl Into<String>) -> Self {
        self.filters.entry(name.into()).or_default();
        self
    }

    /// Enable a filter with parameter values.
    pub fn enable_with<I, K, V>(mut self, name: impl Into<String>, parameters: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let entry = self.filters.entry(name.into()).or_default();
        for (key, value) in parameters {
            entry.insert(key.into(), value.into());
        }
        self
    }

    /// Disable a filter.
    pub fn disable(&mut self, name: &str) -> bool {
        self.filters.remove(name).is_some()
    }

    /// Check if a filter is enabled.
    pub fn is_enabled(&self, name: &str) -> bool {
        self.filters.contains_key(name)
    }

    /// Value of a filter parameter.
    pub fn parameter(&self, filter: &str, parameter: &str) -> Option<&Value> {
        self.filters.get(filter).and_then(|p| p.get(parameter))
    }

    /// Parameter names supplied for `filter`, in order.
    pub fn parameter_names(&self, filter: &str) -> Vec<&str> {
        self.filters
            .get(filter)
            .map(|p| p.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Enabled filter names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.filters.keys().map(String::as_str)
    }

    /// Number of enabled filters.
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Check if no filter is enabled.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Check every enabled filter against its declaration.
    pub fn validate(&self, schema: &SchemaBundle) -> Result<()> {
        for (name, parameters) in &self.filters {
            let def = schema
                .get_filter(name)
                .ok_or_else(|| Error::configuration(format!("unknown filter '{}'", name)))?;

            if let Some(missing) = def.parameters.iter().find(|p| !parameters.contains_key(*p)) {
                return Err(Error::configuration(format!(
                    "filter '{}' enabled without parameter '{}'",
                    name, missing
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_schema::sales_schema;

    #[test]
    fn test_enable_and_lookup() {
        let mut filters = EnabledFilters::new().enable_with("tenant", [("tenant_id", 42)]);

        assert!(filters.is_enabled("tenant"));
        assert_eq!(filters.parameter("tenant", "tenant_id"), Some(&Value::from(42)));
        assert_eq!(filters.names().collect::<Vec<_>>(), vec!["tenant"]);

        assert!(filters.disable("tenant"));
        assert!(filters.is_empty());
    }

    #[test]
    fn test_validate_against_schema() {
        let schema = sales_schema();

        let ok = EnabledFilters::new().enable_with("tenant", [("tenant_id", "acme")]);
        assert!(ok.validate(&schema).is_ok());

        let unknown = EnabledFilters::new().enable("archived");
        assert!(matches!(unknown.validate(&schema), Err(Error::Configuration(_))));

        let missing = EnabledFilters::new().enable("tenant");
        assert!(matches!(missing.validate(&schema), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_filters_from_json() {
        let filters: EnabledFilters =
            serde_json::from_str(r#"{ "tenant": { "tenant_id": 7 } }"#).unwrap();
        assert_eq!(filters.len(), 1);
        assert_eq!(filters.parameter("tenant", "tenant_id"), Some(&Value::from(7)));
    }
}
