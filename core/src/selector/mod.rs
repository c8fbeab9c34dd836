//! String-path selectors.
//!
//! A path such as `user.addresses[0].city` is compiled once into a
//! [`PathSelector`] and then evaluated against any number of state
//! snapshots. Navigation is strict: a missing key is an error, never a
//! silent `null`.
//!
//! [`Selector`] pairs the compiled-path form with a plain typed function so
//! callers can pick the statically checked variant whenever the shape of the
//! state is known at compile time.

pub mod error;
pub mod path;
pub mod select;

pub use error::{SelectorError, SelectorErrorKind};
pub use path::{compile, PathSelector, Segment};
pub use select::{Selector, TypedPath};
