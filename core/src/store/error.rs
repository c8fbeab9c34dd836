use thiserror::Error;

/// Boxed error returned by reducers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

// ---------------------------------------------------------------------------
// Store errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum StoreError {
    /// The reducer refused the action. The state was left untouched.
    #[error("reducer rejected the action")]
    Reducer(#[source] BoxError),
    /// `set_state` was called from a reducer or listener of the same store.
    #[error("set_state called while the store is already applying an update")]
    Reentrant,
}

impl StoreError {
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::Reducer(_) => "reducer",
            StoreError::Reentrant => "reentrant",
        }
    }
}
