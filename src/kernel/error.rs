use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },
    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: &'static str },
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// The store reached a state that breaks one of its invariants. This is a
    /// defect elsewhere and must not be retried or swallowed.
    #[error("consistency violation: {0}")]
    Consistency(String),
}

impl StoreError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn consistency(message: impl Into<String>) -> Self {
        let message = message.into();
        tracing::error!(%message, "store consistency violation");
        Self::Consistency(message)
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Consistency(_))
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
