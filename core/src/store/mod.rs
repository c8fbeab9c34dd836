//! Observable state store.
//!
//! [`Store`] holds one value, mutated only through `set_state` (merge or
//! replace, optionally through a reducer). Subscribers are notified
//! synchronously with `(new, previous)`. [`Binding`]s narrow a subscription
//! to one selected slice of the state.

pub mod binding;
pub mod error;
pub mod merge;
pub mod observable;

pub use binding::Binding;
pub use error::{BoxError, StoreError};
pub use merge::Merge;
pub use observable::{Listener, ReadOnlyStore, Reducer, Store, Subscription};
