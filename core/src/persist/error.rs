use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::store::StoreError;

// ---------------------------------------------------------------------------
// Persistence errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to {action} {}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The state could not be encoded, or a stored document could not be
    /// decoded into the state type.
    #[error("failed to (de)serialize state for key \"{key}\"")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Keys become file names, so they are limited to `[A-Za-z0-9_.-]` and
    /// may not start with a dot.
    #[error("invalid storage key \"{0}\"")]
    InvalidKey(String),
}

impl PersistError {
    pub fn code(&self) -> &'static str {
        match self {
            PersistError::Io { .. } => "io",
            PersistError::Serialize { .. } => "serialize",
            PersistError::Store(err) => err.code(),
            PersistError::InvalidKey(_) => "invalid_key",
        }
    }

    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        PersistError::Io {
            action,
            path: path.into(),
            source,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_display_names_action_and_path() {
        let err = PersistError::io(
            "write",
            "/tmp/x.json",
            io::Error::new(io::ErrorKind::Other, "disk full"),
        );
        assert_eq!(err.to_string(), "failed to write /tmp/x.json");
        assert_eq!(err.code(), "io");
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("disk full"));
    }

    #[test]
    fn store_errors_keep_their_code() {
        let err = PersistError::from(StoreError::Reentrant);
        assert_eq!(err.code(), "reentrant");
        assert_eq!(err.to_string(), StoreError::Reentrant.to_string());
    }

    #[test]
    fn invalid_key_code() {
        let err = PersistError::InvalidKey("../etc".into());
        assert_eq!(err.code(), "invalid_key");
        assert_eq!(err.to_string(), "invalid storage key \"../etc\"");
    }
}
