use thiserror::Error;

/// Errors that are safe to expose to other modules.
///
/// The kinds mirror the externally observable failures; order visibility
/// failures are deliberately reported as `NotFound`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorefrontError {
    #[error("{message}")]
    NotFound { message: String },

    #[error("{message}")]
    Forbidden { message: String },

    #[error("{message}")]
    Unauthorized { message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("{message}")]
    Conflict { message: String },

    #[error("{message}")]
    InsufficientStock { message: String },

    #[error("{message}")]
    InvalidTransition { message: String },

    #[error("Internal error")]
    Internal,
}

impl StorefrontError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn insufficient_stock(message: impl Into<String>) -> Self {
        Self::InsufficientStock {
            message: message.into(),
        }
    }

    pub fn invalid_transition(message: impl Into<String>) -> Self {
        Self::InvalidTransition {
            message: message.into(),
        }
    }

    pub fn internal() -> Self {
        Self::Internal
    }
}
