//! Core type definitions for the catalog.

use serde::{Deserialize, Serialize};

/// Scalar column types known to the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarType {
    /// Boolean value.
    Bool,
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer.
    Int64,
    /// 64-bit floating point.
    Float64,
    /// Fixed-precision decimal.
    Decimal {
        /// Total number of digits.
        precision: u8,
        /// Number of digits after decimal point.
        scale: u8,
    },
    /// UTF-8 string.
    String,
    /// Binary data.
    Bytes,
    /// Timestamp.
    Timestamp,
    /// UUID (128-bit identifier).
    Uuid,
}

impl ScalarType {
    /// Check if this type is numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            ScalarType::Int32 | ScalarType::Int64 | ScalarType::Float64 | ScalarType::Decimal { .. }
        )
    }

    /// Short lowercase name used in plan output.
    pub fn name(&self) -> &'static str {
        match self {
            ScalarType::Bool => "bool",
            ScalarType::Int32 => "int32",
            ScalarType::Int64 => "int64",
            ScalarType::Float64 => "float64",
            ScalarType::Decimal { .. } => "decimal",
            ScalarType::String => "string",
            ScalarType::Bytes => "bytes",
            ScalarType::Timestamp => "timestamp",
            ScalarType::Uuid => "uuid",
        }
    }
}

/// Cascade style declared on an association.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CascadeStyle {
    /// No cascading.
    #[default]
    None,
    /// Cascade save and update.
    SaveUpdate,
    /// Cascade delete.
    Delete,
    /// Cascade everything.
    All,
}

/// Fetch mode, either mapped on an association or overridden per path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FetchMode {
    /// Defer to the mapping (overrides) or to lazy loading (mappings).
    #[default]
    Default,
    /// Fetch eagerly with an outer or inner join.
    Join,
    /// Fetch lazily with a follow-up select.
    #[serde(alias = "Lazy")]
    Select,
}

impl FetchMode {
    /// Check if this mode asks for an eager join.
    pub fn is_join(self) -> bool {
        self == FetchMode::Join
    }
}
