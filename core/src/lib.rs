//! Stateline core: single-threaded, in-memory application state.
//!
//! - [`selector`]: dotted/bracket path compiler (`user.addresses[0].city`)
//!   and the two-variant [`Selector`].
//! - [`store`]: observable [`Store`] with merge/replace updates, optional
//!   reducer, subscriptions and selection-scoped [`Binding`]s.
//! - [`throwable`]: the `Throwable` result convention, error-message helpers
//!   and the [`StatusStore`] lifecycle tracker.
//! - [`persist`]: keeps a store in sync with a key/value [`Storage`].
//! - [`settings`]: YAML settings, including named selectors.

pub mod persist;
pub mod selector;
pub mod settings;
pub mod store;
pub mod throwable;

pub use persist::{FileStorage, MemoryStorage, PersistError, PersistedStore, Storage};
pub use selector::{compile, PathSelector, Segment, Selector, SelectorError, SelectorErrorKind};
pub use settings::{Settings, SettingsError};
pub use store::{Binding, BoxError, Merge, ReadOnlyStore, Store, StoreError, Subscription};
pub use throwable::{
    get_error_code, get_error_message, handle_error, select_error, Failure, StatusStore,
    Throwable, ThrowableStatus,
};
