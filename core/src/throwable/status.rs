//! Lifecycle status of an async-style action: idle → loading → error/success.

use serde::{Deserialize, Serialize};

use super::{Failure, Throwable};
use crate::store::{Merge, Store, StoreError};


/// Where an action currently stands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum ThrowableStatus<R = (), E = Failure> {
    Idle,
    Loading,
    Error(E),
    Success(R),
}

impl<R, E> ThrowableStatus<R, E> {
    pub fn is_idle(&self) -> bool {
        matches!(self, ThrowableStatus::Idle)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, ThrowableStatus::Loading)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ThrowableStatus::Error(_))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ThrowableStatus::Success(_))
    }

    pub fn value(&self) -> Option<&R> {
        match self {
            ThrowableStatus::Success(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&E> {
        match self {
            ThrowableStatus::Error(err) => Some(err),
            _ => None,
        }
    }
}

impl<R, E> Default for ThrowableStatus<R, E> {
    fn default() -> Self {
        ThrowableStatus::Idle
    }
}

impl<R, E> From<Throwable<R, E>> for ThrowableStatus<R, E> {
    fn from(result: Throwable<R, E>) -> Self {
        match result {
            Ok(value) => ThrowableStatus::Success(value),
            Err(err) => ThrowableStatus::Error(err),
        }
    }
}

/// A status is a single tagged value; every update replaces it.
impl<R, E> Merge for ThrowableStatus<R, E> {
    fn merge(&mut self, patch: Self) {
        *self = patch;
    }
}


// ---------------------------------------------------------------------------
// StatusStore
// ---------------------------------------------------------------------------

/// Observable [`ThrowableStatus`], starting idle.
///
/// ```
/// use stateline_core::{Failure, StatusStore};
///
/// let status: StatusStore<String> = StatusStore::new();
/// status.set_loading().unwrap();
/// status.record(Ok("done".to_string())).unwrap();
/// assert_eq!(status.status().value().map(String::as_str), Some("done"));
/// ```
#[derive(Clone)]
pub struct StatusStore<R = (), E = Failure>
where
    R: Clone + 'static,
    E: Clone + 'static,
{
    store: Store<ThrowableStatus<R, E>>,
}

impl<R, E> StatusStore<R, E>
where
    R: Clone + 'static,
    E: Clone + 'static,
{
    pub fn new() -> Self {
        StatusStore {
            store: Store::new(ThrowableStatus::Idle),
        }
    }

    /// The underlying store, for subscriptions and bindings.
    pub fn store(&self) -> &Store<ThrowableStatus<R, E>> {
        &self.store
    }

    pub fn status(&self) -> ThrowableStatus<R, E> {
        self.store.get_state()
    }

    pub fn is_success(&self) -> bool {
        self.store.with_state(ThrowableStatus::is_success)
    }

    pub fn set_idle(&self) -> Result<(), StoreError> {
        self.store.replace_state(ThrowableStatus::Idle)
    }

    pub fn set_loading(&self) -> Result<(), StoreError> {
        self.store.replace_state(ThrowableStatus::Loading)
    }

    pub fn set_error(&self, error: E) -> Result<(), StoreError> {
        self.store.replace_state(ThrowableStatus::Error(error))
    }

    pub fn set_success(&self, value: R) -> Result<(), StoreError> {
        self.store.replace_state(ThrowableStatus::Success(value))
    }

    /// Record the outcome of a finished action.
    pub fn record(&self, result: Throwable<R, E>) -> Result<(), StoreError> {
        self.store.replace_state(result.into())
    }
}

impl<R, E> Default for StatusStore<R, E>
where
    R: Clone + 'static,
    E: Clone + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn starts_idle() {
        let status: StatusStore<u32> = StatusStore::new();
        assert!(status.status().is_idle());
        assert!(!status.is_success());
    }

    #[test]
    fn full_lifecycle() {
        let status: StatusStore<u32> = StatusStore::default();
        status.set_loading().unwrap();
        assert!(status.status().is_loading());

        status.set_error(Failure::new("timeout")).unwrap();
        assert_eq!(
            status.status().error().map(|f| f.message.as_str()),
            Some("timeout")
        );

        status.set_success(7).unwrap();
        assert!(status.is_success());
        assert_eq!(status.status().value(), Some(&7));

        status.set_idle().unwrap();
        assert!(status.status().is_idle());
    }

    #[test]
    fn record_throwable() {
        let status: StatusStore<&'static str> = StatusStore::new();
        status.record(Err(Failure::new("nope"))).unwrap();
        assert!(status.status().is_error());
        status.record(Ok("yes")).unwrap();
        assert_eq!(status.status(), ThrowableStatus::Success("yes"));
    }

    #[test]
    fn subscribers_see_transitions() {
        let status: StatusStore<u8> = StatusStore::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let _sub = status.store().subscribe(move |next, prev| {
            sink.borrow_mut().push((prev.clone(), next.clone()));
        });

        status.set_loading().unwrap();
        status.set_success(1).unwrap();

        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], (ThrowableStatus::Idle, ThrowableStatus::Loading));
        assert_eq!(seen[1], (ThrowableStatus::Loading, ThrowableStatus::Success(1)));
    }

    #[test]
    fn clones_share_status() {
        let status: StatusStore = StatusStore::new();
        let other = status.clone();
        other.set_success(()).unwrap();
        assert!(status.is_success());
    }

    #[test]
    fn serde_shape() {
        let idle: ThrowableStatus<u8> = ThrowableStatus::Idle;
        assert_eq!(serde_json::to_value(&idle).unwrap(), json!({"status": "idle"}));

        let ok: ThrowableStatus<u8> = ThrowableStatus::Success(3);
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            json!({"status": "success", "value": 3})
        );

        let err: ThrowableStatus<u8> = ThrowableStatus::Error(Failure::new("x"));
        let back: ThrowableStatus<u8> =
            serde_json::from_value(serde_json::to_value(&err).unwrap()).unwrap();
        assert_eq!(back, err);
    }
}
