//! Filter and discriminator metadata.

use serde::{Deserialize, Serialize};

/// A named row filter declared at schema level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterDef {
    /// Filter name.
    pub name: String,
    /// Declared parameter names.
    #[serde(default)]
    pub parameters: Vec<String>,
}

/// A filter condition attached to one entity.
///
/// The condition is opaque SQL with an `{alias}` placeholder for the
/// entity's table alias and `:param` placeholders for filter parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityFilter {
    /// Name of the [`FilterDef`] this condition belongs to.
    pub name: String,
    /// Condition template.
    pub condition: String,
}

/// Discriminator restriction narrowing a shared table to one type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discriminator {
    /// Discriminator column.
    pub column: String,
    /// Values identifying this type and its subtypes.
    pub values: Vec<String>,
}

impl FilterDef {
    /// Create a filter definition.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
        }
    }

    /// Declare a parameter.
    pub fn with_parameter(mut self, parameter: impl Into<String>) -> Self {
        self.parameters.push(parameter.into());
        self
    }
}

impl EntityFilter {
    /// Create an entity filter condition.
    pub fn new(name: impl Into<String>, condition: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            condition: condition.into(),
        }
    }
}

impl Discriminator {
    /// Create a discriminator restriction.
    pub fn new<I, S>(column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}
