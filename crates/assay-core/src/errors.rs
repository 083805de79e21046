use thiserror::Error;

use crate::ast::Position;

/// Errors raised while compiling rules or rewriting a file
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RewriteError {
    #[error("Malformed template in rule '{rule}': {reason}")]
    MalformedTemplate { rule: String, reason: String },

    #[error("Duplicate rule id '{id}'")]
    DuplicateRule { id: String },

    #[error("Invalid binding in rule '{rule}': placeholder '{placeholder}' is not bound")]
    InvalidBinding { rule: String, placeholder: String },

    #[error("Recipe '{recipe}' did not reach a fixed point within {max_iterations} iterations")]
    NonConverging {
        recipe: String,
        max_iterations: usize,
    },

    #[error("Unsupported construct at {position}: {construct}")]
    Unsupported { position: Position, construct: String },

    #[error("Parse error at {position}: {message}")]
    Parse { position: Position, message: String },

    #[error("Rewrite cancelled")]
    Cancelled,
}

impl RewriteError {
    pub fn malformed(rule: &str, reason: impl Into<String>) -> Self {
        Self::MalformedTemplate {
            rule: rule.to_string(),
            reason: reason.into(),
        }
    }

    pub fn invalid_binding(rule: &str, placeholder: &str) -> Self {
        Self::InvalidBinding {
            rule: rule.to_string(),
            placeholder: placeholder.to_string(),
        }
    }

    /// Process exit code for command line wrappers
    pub fn exit_code(&self) -> i32 {
        match self {
            RewriteError::NonConverging { .. } => 2,
            RewriteError::MalformedTemplate { .. } | RewriteError::DuplicateRule { .. } => 3,
            RewriteError::InvalidBinding { .. } => 4,
            RewriteError::Unsupported { .. } => 5,
            RewriteError::Parse { .. } | RewriteError::Cancelled => 1,
        }
    }
}

/// Result type for rewrite operations
pub type Result<T> = std::result::Result<T, RewriteError>;
