//! Persistence of store state to a key/value [`Storage`].
//!
//! A [`PersistedStore`] restores a previously written snapshot when it is
//! opened and then writes the state back as JSON after every update.

pub mod error;
pub mod persisted;
pub mod storage;

pub use error::PersistError;
pub use persisted::PersistedStore;
pub use storage::{FileStorage, MemoryStorage, Storage};
