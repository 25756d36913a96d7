//! Core error types.

use thiserror::Error;

/// Planner errors.
///
/// Every error is raised synchronously during a single planning pass; no
/// partial plan is ever returned alongside one.
#[derive(Debug, Error)]
pub enum Error {
    /// Identifier or association metadata is malformed.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Caller-supplied aliasing forces two paths onto one alias.
    #[error("ambiguous alias '{alias}': bound to both '{first}' and '{second}'")]
    AmbiguousAlias {
        /// The contested alias.
        alias: String,
        /// Path (or alias) that claimed it first.
        first: String,
        /// Path (or alias) that tried to claim it second.
        second: String,
    },

    /// Eager join requested on a path whose shape cannot be joined.
    #[error("unsupported fetch request on '{path}': {reason}")]
    UnsupportedFetch {
        /// Offending association path.
        path: String,
        /// Why the request cannot be honored.
        reason: String,
    },

    /// Entity not present in the schema.
    #[error("unknown entity '{0}'")]
    UnknownEntity(String),

    /// Property path segment not present on its owner.
    #[error("unknown property '{property}' on '{owner}'")]
    UnknownProperty {
        /// Owning entity or component type.
        owner: String,
        /// Missing property name.
        property: String,
    },

    /// Fragment placeholder naming no known alias.
    #[error("unknown alias '{0}' in fragment")]
    UnknownAlias(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Shorthand for a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration(message.into())
    }

    /// Shorthand for an unsupported fetch request.
    pub fn unsupported_fetch(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::UnsupportedFetch {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
