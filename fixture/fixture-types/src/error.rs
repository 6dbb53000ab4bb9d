//! Error types for guidance operations.

use thiserror::Error;

use crate::ToolRole;

/// Errors that can occur while configuring or driving a guidance session.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FixtureError {
    /// Invalid configuration, detected at construction time.
    #[error("invalid configuration: {reason}")]
    InvalidConfiguration {
        /// Description of the configuration error.
        reason: String,
    },

    /// A tool pose required by the configuration was not supplied.
    #[error("missing pose for {role:?} tool")]
    MissingTool {
        /// The tool whose pose is missing.
        role: ToolRole,
    },

    /// A wire ordinal that does not name a task state.
    #[error("unknown task state ordinal: {0}")]
    UnknownTaskState(u8),
}

impl FixtureError {
    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            reason: reason.into(),
        }
    }

    /// Check if this is a configuration error.
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::InvalidConfiguration { .. })
    }

    /// Check if this is a missing tool error.
    #[must_use]
    pub fn is_missing_tool(&self) -> bool {
        matches!(self, Self::MissingTool { .. })
    }
}
