use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Selector errors
// ---------------------------------------------------------------------------

/// Failure while evaluating a selector against a state value.
///
/// Raised at evaluation time, not compile time: whether a key exists depends
/// on the runtime shape of the state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    /// A bracket segment did not contain a base-10 integer.
    #[error("index \"{index}\" is not a valid integer and can not be used in selector \"{path}\"")]
    InvalidIndex { index: String, path: String },
    /// A property or index does not exist on the value being navigated.
    #[error("key \"{key}\" can not be selected from state when using selector \"{path}\"")]
    KeyNotFound { key: String, path: String },
    /// The state or the selection could not be converted to/from JSON.
    #[error("selection for \"{path}\" could not be converted: {message}")]
    Conversion { path: String, message: String },
}

/// Discriminant of [`SelectorError`], for callers that only branch on kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectorErrorKind {
    InvalidIndex,
    KeyNotFound,
    Conversion,
}

impl SelectorErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectorErrorKind::InvalidIndex => "invalid_index",
            SelectorErrorKind::KeyNotFound => "key_not_found",
            SelectorErrorKind::Conversion => "conversion",
        }
    }
}

impl SelectorError {
    pub fn kind(&self) -> SelectorErrorKind {
        match self {
            SelectorError::InvalidIndex { .. } => SelectorErrorKind::InvalidIndex,
            SelectorError::KeyNotFound { .. } => SelectorErrorKind::KeyNotFound,
            SelectorError::Conversion { .. } => SelectorErrorKind::Conversion,
        }
    }

    /// The full path that was being evaluated.
    pub fn path(&self) -> &str {
        match self {
            SelectorError::InvalidIndex { path, .. }
            | SelectorError::KeyNotFound { path, .. }
            | SelectorError::Conversion { path, .. } => path,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_key_and_path() {
        let err = SelectorError::KeyNotFound {
            key: "z".into(),
            path: "a.z".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("\"z\""));
        assert!(msg.contains("\"a.z\""));
    }

    #[test]
    fn kind_and_path_accessors() {
        let err = SelectorError::InvalidIndex {
            index: "x".into(),
            path: "a[x]".into(),
        };
        assert_eq!(err.kind(), SelectorErrorKind::InvalidIndex);
        assert_eq!(err.kind().as_str(), "invalid_index");
        assert_eq!(err.path(), "a[x]");
    }
}
