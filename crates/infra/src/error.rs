use thiserror::Error;

/// Persistence failures.
///
/// | Variant | Meaning |
/// |---|---|
/// | `Conflict` | a uniqueness rule would be violated (live user email) |
/// | `Storage` | backend failure: connection, query, poisoned lock |
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl StoreError {
    pub(crate) fn poisoned(store: &str) -> Self {
        StoreError::Storage(format!("{store} lock poisoned"))
    }
}
