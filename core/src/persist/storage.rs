//! Key/value backends for persisted state.
//!
//! Values are serialized JSON documents stored under string keys.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tracing::trace;

use super::error::PersistError;


/// A string key/value store.
pub trait Storage {
    /// The stored value, or `None` if the key was never written or has been
    /// removed.
    fn get_item(&self, key: &str) -> Result<Option<String>, PersistError>;

    fn set_item(&self, key: &str, value: &str) -> Result<(), PersistError>;

    /// Removing a missing key is not an error.
    fn remove_item(&self, key: &str) -> Result<(), PersistError>;
}


// ---------------------------------------------------------------------------
// MemoryStorage
// ---------------------------------------------------------------------------

/// In-memory storage. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, PersistError> {
        Ok(self.items.borrow().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), PersistError> {
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), PersistError> {
        self.items.borrow_mut().remove(key);
        Ok(())
    }
}


// ---------------------------------------------------------------------------
// FileStorage
// ---------------------------------------------------------------------------

/// One `<key>.json` file per key under a root directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Create a storage rooted at `root`, creating the directory if needed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, PersistError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| PersistError::io("create", &root, e))?;
        Ok(FileStorage { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the document for `key`.
    pub fn item_path(&self, key: &str) -> Result<PathBuf, PersistError> {
        validate_key(key)?;
        Ok(self.root.join(format!("{}.json", key)))
    }

    /// Keys with a stored document, sorted.
    pub fn keys(&self) -> Result<Vec<String>, PersistError> {
        let entries =
            fs::read_dir(&self.root).map_err(|e| PersistError::io("read", &self.root, e))?;

        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| PersistError::io("read", &self.root, e))?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if let Some(key) = name.strip_suffix(".json") {
                if validate_key(key).is_ok() {
                    keys.push(key.to_string());
                }
            }
        }
        keys.sort();
        Ok(keys)
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, PersistError> {
        let path = self.item_path(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PersistError::io("read", path, e)),
        }
    }

    /// Writes to a hidden temp file next to the target, then renames it
    /// over the target so readers never see a partial document.
    fn set_item(&self, key: &str, value: &str) -> Result<(), PersistError> {
        let path = self.item_path(key)?;
        let tmp_path = self.root.join(format!(".{}.json.tmp", key));
        fs::write(&tmp_path, value).map_err(|e| PersistError::io("write", &tmp_path, e))?;
        if let Err(e) = fs::rename(&tmp_path, &path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(PersistError::io("rename", &tmp_path, e));
        }
        trace!(path = %path.display(), bytes = value.len(), "stored item");
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), PersistError> {
        let path = self.item_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PersistError::io("remove", path, e)),
        }
    }
}

fn validate_key(key: &str) -> Result<(), PersistError> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if valid {
        Ok(())
    } else {
        Err(PersistError::InvalidKey(key.to_string()))
    }
}
