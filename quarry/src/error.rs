//! Error types for the query layer

/// Errors raised while building, dispatching or interpreting requests
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Invalid operator: {0}")]
    InvalidOperator(String),

    #[error("Invalid predicate: {0}")]
    InvalidPredicate(String),

    #[error("Engine error ({status}): {reason}")]
    Engine { status: u16, reason: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),
}

impl Error {
    /// Short label for the error kind, used in log fields
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::InvalidOperator(_) => "invalid_operator",
            Self::InvalidPredicate(_) => "invalid_predicate",
            Self::Engine { .. } => "engine",
            Self::Transport(_) => "transport",
            Self::UnexpectedResponse(_) => "unexpected_response",
            Self::Json(_) => "json",
            Self::Config(_) => "config",
        }
    }

    /// Whether the error signals a missing document
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Caller mistakes detected before anything is sent
    pub fn is_caller_error(&self) -> bool {
        matches!(self, Self::InvalidOperator(_) | Self::InvalidPredicate(_))
    }
}
