use std::fmt;
use std::rc::Rc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use super::error::PersistError;
use super::storage::Storage;
use crate::store::{Merge, Store, Subscription};


/// A [`Store`] kept in sync with one key of a [`Storage`].
///
/// Opening restores the stored document, if there is one, by merging it into
/// the current state without going through the reducer. From then on every
/// committed update is serialized and written back. Write failures are
/// logged and never interrupt notification of other subscribers.
///
/// Syncing stops on [`close`](Self::close) or when the handle is dropped.
pub struct PersistedStore<S, A = S>
where
    S: Merge + Clone + 'static,
{
    store: Store<S, A>,
    key: String,
    storage: Rc<dyn Storage>,
    subscription: Subscription,
}

impl<S, A> PersistedStore<S, A>
where
    S: Merge + Clone + Serialize + DeserializeOwned + 'static,
{
    pub fn open(
        store: Store<S, A>,
        key: impl Into<String>,
        storage: Rc<dyn Storage>,
    ) -> Result<Self, PersistError> {
        let key = key.into();

        if let Some(raw) = storage.get_item(&key)? {
            let stored: S = serde_json::from_str(&raw).map_err(|source| PersistError::Serialize {
                key: key.clone(),
                source,
            })?;
            store.restore(stored, false)?;
            debug!(key = %key, "restored persisted state");
        }

        let writer_key = key.clone();
        let writer_storage = Rc::clone(&storage);
        let subscription = store.subscribe(move |state: &S, _previous: &S| {
            if let Err(err) = write_state(writer_storage.as_ref(), &writer_key, state) {
                warn!(key = %writer_key, error = %err, "failed to persist state");
            }
        });

        Ok(PersistedStore {
            store,
            key,
            storage,
            subscription,
        })
    }

    /// Write the current state now, regardless of pending updates.
    pub fn flush(&self) -> Result<(), PersistError> {
        self.store
            .with_state(|state| write_state(self.storage.as_ref(), &self.key, state))
    }
}

impl<S, A> PersistedStore<S, A>
where
    S: Merge + Clone + 'static,
{
    pub fn store(&self) -> &Store<S, A> {
        &self.store
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Remove the stored document. The in-memory state is kept, and the
    /// next update writes it again.
    pub fn clear(&self) -> Result<(), PersistError> {
        self.storage.remove_item(&self.key)
    }

    /// Stop writing updates to storage.
    pub fn close(&self) {
        self.subscription.unsubscribe();
    }
}

impl<S, A> Drop for PersistedStore<S, A>
where
    S: Merge + Clone + 'static,
{
    fn drop(&mut self) {
        self.subscription.unsubscribe();
    }
}

impl<S, A> fmt::Debug for PersistedStore<S, A>
where
    S: Merge + Clone + fmt::Debug + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersistedStore")
            .field("key", &self.key)
            .field("store", &self.store)
            .finish()
    }
}

fn write_state<S: Serialize>(storage: &dyn Storage, key: &str, state: &S) -> Result<(), PersistError> {
    let json = serde_json::to_string(state).map_err(|source| PersistError::Serialize {
        key: key.to_string(),
        source,
    })?;
    storage.set_item(key, &json)
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::{FileStorage, MemoryStorage};
    use serde::Deserialize;
    use serde_json::{json, Value};
    use std::collections::BTreeMap;

    fn memory() -> (MemoryStorage, Rc<dyn Storage>) {
        let storage = MemoryStorage::new();
        let shared: Rc<dyn Storage> = Rc::new(storage.clone());
        (storage, shared)
    }

    #[test]
    fn open_without_document_keeps_initial_and_writes_nothing() {
        let (raw, storage) = memory();
        let persisted = PersistedStore::open(Store::new(json!({"theme": "light"})), "prefs", storage)
            .unwrap();
        assert_eq!(persisted.store().get_state(), json!({"theme": "light"}));
        assert!(raw.is_empty());
    }

    #[test]
    fn updates_are_written_back() {
        let (raw, storage) = memory();
        let persisted = PersistedStore::open(Store::new(json!({"theme": "light"})), "prefs", storage)
            .unwrap();
        persisted.store().merge_state(json!({"font": 12})).unwrap();

        let written: Value =
            serde_json::from_str(&raw.get_item("prefs").unwrap().unwrap()).unwrap();
        assert_eq!(written, json!({"theme": "light", "font": 12}));
    }

    #[test]
    fn reopen_restores_by_merging() {
        let (raw, storage) = memory();
        raw.set_item("prefs", r#"{"theme":"dark"}"#).unwrap();

        let persisted = PersistedStore::open(
            Store::new(json!({"theme": "light", "font": 10})),
            "prefs",
            storage,
        )
        .unwrap();
        assert_eq!(
            persisted.store().get_state(),
            json!({"theme": "dark", "font": 10})
        );
    }

    #[test]
    fn restore_bypasses_reducer() {
        let (raw, storage) = memory();
        raw.set_item("n", r#"{"count":5}"#).unwrap();

        let store: Store<Value, i64> = Store::with_reducer(json!({"count": 0}), |state: &Value, by: i64| {
            let current = state["count"].as_i64().unwrap_or(0);
            Ok(json!({"count": current + by}))
        });
        let persisted = PersistedStore::open(store, "n", storage).unwrap();
        assert_eq!(persisted.store().get_state(), json!({"count": 5}));

        persisted.store().merge_state(2).unwrap();
        assert_eq!(raw.get_item("n").unwrap().as_deref(), Some(r#"{"count":7}"#));
    }

    #[test]
    fn typed_state_roundtrip() {
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        struct Prefs {
            theme: String,
            font: u8,
        }
        impl Merge for Prefs {
            fn merge(&mut self, patch: Self) {
                *self = patch;
            }
        }

        let (_raw, storage) = memory();
        let initial = Prefs { theme: "light".into(), font: 10 };
        {
            let persisted =
                PersistedStore::open(Store::new(initial.clone()), "prefs", Rc::clone(&storage))
                    .unwrap();
            persisted
                .store()
                .replace_state(Prefs { theme: "dark".into(), font: 14 })
                .unwrap();
        }
        let reopened = PersistedStore::open(Store::new(initial), "prefs", storage).unwrap();
        assert_eq!(
            reopened.store().get_state(),
            Prefs { theme: "dark".into(), font: 14 }
        );
    }

    #[test]
    fn corrupt_document_is_reported() {
        let (raw, storage) = memory();
        raw.set_item("prefs", "not json").unwrap();
        match PersistedStore::open(Store::new(json!({})), "prefs", storage) {
            Err(PersistError::Serialize { key, .. }) => assert_eq!(key, "prefs"),
            other => panic!("expected Serialize error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn close_stops_syncing() {
        let (raw, storage) = memory();
        let persisted = PersistedStore::open(Store::new(json!({})), "k", storage).unwrap();
        persisted.store().merge_state(json!({"a": 1})).unwrap();
        persisted.close();
        persisted.store().merge_state(json!({"b": 2})).unwrap();
        assert_eq!(raw.get_item("k").unwrap().as_deref(), Some(r#"{"a":1}"#));
        assert_eq!(persisted.store().listener_count(), 0);
    }

    #[test]
    fn drop_stops_syncing() {
        let (raw, storage) = memory();
        let store = Store::new(json!({}));
        {
            let _persisted = PersistedStore::open(store.clone(), "k", storage).unwrap();
            assert_eq!(store.listener_count(), 1);
        }
        assert_eq!(store.listener_count(), 0);
        store.merge_state(json!({"a": 1})).unwrap();
        assert_eq!(raw.get_item("k").unwrap(), None);
    }

    #[test]
    fn clear_and_flush() {
        let (raw, storage) = memory();
        let persisted = PersistedStore::open(Store::new(json!({"a": 1})), "k", storage).unwrap();
        persisted.flush().unwrap();
        assert_eq!(raw.get_item("k").unwrap().as_deref(), Some(r#"{"a":1}"#));

        persisted.clear().unwrap();
        assert_eq!(raw.get_item("k").unwrap(), None);
        assert_eq!(persisted.store().get_state(), json!({"a": 1}));
        assert_eq!(persisted.key(), "k");
    }

    struct ReadOnlyStorage;

    impl Storage for ReadOnlyStorage {
        fn get_item(&self, _key: &str) -> Result<Option<String>, PersistError> {
            Ok(None)
        }

        fn set_item(&self, key: &str, _value: &str) -> Result<(), PersistError> {
            Err(PersistError::InvalidKey(key.to_string()))
        }

        fn remove_item(&self, _key: &str) -> Result<(), PersistError> {
            Ok(())
        }
    }

    #[test]
    fn write_failure_does_not_block_other_subscribers() {
        let store = Store::new(BTreeMap::<String, i32>::new());
        let persisted = PersistedStore::open(store, "k", Rc::new(ReadOnlyStorage)).unwrap();

        let seen = Rc::new(std::cell::Cell::new(0));
        let counter = Rc::clone(&seen);
        let _sub = persisted
            .store()
            .subscribe(move |_: &BTreeMap<String, i32>, _: &BTreeMap<String, i32>| {
                counter.set(counter.get() + 1)
            });

        let mut patch = BTreeMap::new();
        patch.insert("a".to_string(), 1);
        persisted.store().merge_state(patch).unwrap();

        assert_eq!(seen.get(), 1);
        assert_eq!(persisted.store().with_state(|s| s.get("a").copied()), Some(1));
        assert!(persisted.flush().is_err());
    }

    #[test]
    fn file_backed_store_survives_reopen() {
        let tmp = tempfile::tempdir().unwrap();
        {
            let storage: Rc<dyn Storage> = Rc::new(FileStorage::new(tmp.path()).unwrap());
            let persisted =
                PersistedStore::open(Store::new(json!({"items": []})), "cart", storage).unwrap();
            persisted
                .store()
                .merge_state(json!({"items": [{"id": 1}]}))
                .unwrap();
        }
        let storage: Rc<dyn Storage> = Rc::new(FileStorage::new(tmp.path()).unwrap());
        let persisted =
            PersistedStore::open(Store::new(json!({"items": []})), "cart", storage).unwrap();
        assert_eq!(persisted.store().select_path("items[0].id").unwrap(), json!(1));
    }
}
