//! The observable store.
//!
//! A [`Store`] owns one state value behind a shared, single-threaded cell.
//! Handles are cheap to clone and all clones observe the same state. The
//! only way to change the state is [`Store::set_state`]; every successful
//! update is followed, synchronously and before `set_state` returns, by a
//! notification of every subscriber with `(new, previous)`.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::binding::Binding;
use super::error::{BoxError, StoreError};
use super::merge::Merge;
use crate::selector::{PathSelector, Selector, SelectorError};

/// Subscriber callback: `(new_state, previous_state)`.
pub type Listener<S> = Rc<dyn Fn(&S, &S)>;

/// Turns the current state and an action into the update to apply.
pub type Reducer<S, A> = Rc<dyn Fn(&S, A) -> Result<S, BoxError>>;


struct Shared<S> {
    state: RefCell<S>,
    listeners: RefCell<Vec<(u64, Listener<S>)>>,
    next_id: Cell<u64>,
    /// Set for the whole reduce → commit → notify sequence.
    updating: Cell<bool>,
}

/// Clears the `updating` flag even if a reducer or listener panics.
struct UpdateGuard<'a>(&'a Cell<bool>);

impl Drop for UpdateGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl<S: 'static> Shared<S> {
    fn add_listener(self: &Rc<Self>, listener: Listener<S>) -> Subscription {
        let mut listeners = self.listeners.borrow_mut();
        let existing = listeners
            .iter()
            .find(|(_, l)| Rc::ptr_eq(l, &listener))
            .map(|(id, _)| *id);
        let id = match existing {
            Some(id) => id,
            None => {
                let id = self.next_id.get();
                self.next_id.set(id + 1);
                listeners.push((id, listener));
                id
            }
        };

        let weak: Weak<Shared<S>> = Rc::downgrade(self);
        Subscription::new(move || {
            if let Some(shared) = weak.upgrade() {
                shared.listeners.borrow_mut().retain(|(lid, _)| *lid != id);
            }
        })
    }

    fn bind<T, F>(self: &Rc<Self>, evaluate: F) -> Binding<T>
    where
        F: Fn(&S) -> Result<T, SelectorError> + 'static,
        T: PartialEq + Clone + 'static,
    {
        let initial = {
            let state = self.state.borrow();
            evaluate(&*state)
        };
        Binding::attach(initial, |on_update| {
            self.add_listener(Rc::new(move |state: &S, _previous: &S| {
                on_update(evaluate(state))
            }))
        })
    }
}


/// Single-value observable store.
///
/// `A` is the action type accepted by [`set_state`](Self::set_state). For a
/// store built with [`Store::new`] it is the state type itself, used as a
/// patch. A store built with [`Store::with_reducer`] passes each action
/// through the reducer first.
pub struct Store<S, A = S> {
    shared: Rc<Shared<S>>,
    reducer: Reducer<S, A>,
}

impl<S> Store<S, S>
where
    S: Merge + Clone + 'static,
{
    /// Create a store whose actions are applied to the state directly.
    pub fn new(initial: S) -> Self {
        Store::with_reducer(initial, |_: &S, update: S| Ok(update))
    }
}

impl<S, A> Store<S, A>
where
    S: Merge + Clone + 'static,
{
    /// Create a store that runs every action through `reducer`.
    ///
    /// The reducer's output is merged into (or replaces) the current state,
    /// exactly as an action passed to a reducer-free store would be.
    pub fn with_reducer<F>(initial: S, reducer: F) -> Self
    where
        F: Fn(&S, A) -> Result<S, BoxError> + 'static,
    {
        Store {
            shared: Rc::new(Shared {
                state: RefCell::new(initial),
                listeners: RefCell::new(Vec::new()),
                next_id: Cell::new(0),
                updating: Cell::new(false),
            }),
            reducer: Rc::new(reducer),
        }
    }

    /// Current state (cloned).
    pub fn get_state(&self) -> S {
        self.shared.state.borrow().clone()
    }

    /// Borrow the current state without cloning it.
    pub fn with_state<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.shared.state.borrow())
    }

    /// Apply an action.
    ///
    /// With `replace == false` the update is shallow-merged onto the current
    /// state; with `replace == true` it becomes the new state. Subscribers
    /// are notified after the commit, even if the value did not change.
    ///
    /// A reducer failure leaves the state untouched and notifies nobody.
    pub fn set_state(&self, action: A, replace: bool) -> Result<(), StoreError> {
        if self.shared.updating.get() {
            return Err(StoreError::Reentrant);
        }
        self.shared.updating.set(true);
        let _guard = UpdateGuard(&self.shared.updating);

        let update = {
            let current = self.shared.state.borrow();
            (self.reducer)(&current, action).map_err(StoreError::Reducer)?
        };
        self.commit(update, replace);
        Ok(())
    }

    /// `set_state(action, false)`.
    pub fn merge_state(&self, action: A) -> Result<(), StoreError> {
        self.set_state(action, false)
    }

    /// `set_state(action, true)`.
    pub fn replace_state(&self, action: A) -> Result<(), StoreError> {
        self.set_state(action, true)
    }

    /// Write an already reduced update and notify. Callers hold the
    /// `updating` flag or are otherwise outside any notification.
    pub(crate) fn commit(&self, update: S, replace: bool) {
        let next = if replace {
            update
        } else {
            let mut next = self.shared.state.borrow().clone();
            next.merge(update);
            next
        };
        let previous = std::mem::replace(&mut *self.shared.state.borrow_mut(), next);

        // Snapshot so listeners may subscribe/unsubscribe while being called.
        let listeners: Vec<Listener<S>> = self
            .shared
            .listeners
            .borrow()
            .iter()
            .map(|(_, l)| Rc::clone(l))
            .collect();
        debug!(listeners = listeners.len(), replace, "state committed");

        let current = self.shared.state.borrow();
        for listener in &listeners {
            listener(&current, &previous);
        }
    }

    /// Load a state wholesale, bypassing the reducer.
    ///
    /// Used to restore a previously persisted snapshot.
    pub(crate) fn restore(&self, state: S, replace: bool) -> Result<(), StoreError> {
        if self.shared.updating.get() {
            return Err(StoreError::Reentrant);
        }
        self.shared.updating.set(true);
        let _guard = UpdateGuard(&self.shared.updating);
        self.commit(state, replace);
        Ok(())
    }

    /// Register a listener called with `(new_state, previous_state)` after
    /// every update.
    ///
    /// The listener stays registered until [`Subscription::unsubscribe`] is
    /// called; dropping the handle does not remove it.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&S, &S) + 'static,
    {
        self.subscribe_listener(Rc::new(listener))
    }

    /// Register a shared listener. Registering the same `Rc` twice keeps a
    /// single registration and returns a handle to it.
    pub fn subscribe_listener(&self, listener: Listener<S>) -> Subscription {
        self.shared.add_listener(listener)
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.shared.listeners.borrow().len()
    }

    // -------------------------------------------------------------------
    // Selection
    // -------------------------------------------------------------------

    /// One-shot read through a selector.
    pub fn select<T>(&self, selector: &Selector<S, T>) -> Result<T, SelectorError> {
        self.with_state(|state| selector.evaluate(state))
    }

    /// One-shot read through a string path.
    pub fn select_path(&self, path: &str) -> Result<Value, SelectorError>
    where
        S: Serialize,
    {
        let selector = PathSelector::compile(path);
        self.with_state(|state| selector.select_from(state))
    }

    /// Reactive read of the slice chosen by `selector`.
    ///
    /// Fails if the selector cannot be evaluated against the current state.
    /// The returned [`Binding`] re-evaluates on every update and only reports
    /// a change when the selected value differs from the previous one.
    pub fn use_state<T>(&self, selector: Selector<S, T>) -> Result<Binding<T>, SelectorError>
    where
        T: PartialEq + Clone + 'static,
    {
        let binding = self.bind(move |state: &S| selector.evaluate(state));
        binding.get()?;
        Ok(binding)
    }

    /// [`use_state`](Self::use_state) with a string path.
    pub fn use_state_path(&self, path: &str) -> Result<Binding<Value>, SelectorError>
    where
        S: Serialize,
    {
        self.use_state(Selector::path(path))
    }

    /// Reactive read through a plain function. Needs no serialization.
    pub fn use_selector<T, F>(&self, f: F) -> Binding<T>
    where
        F: Fn(&S) -> T + 'static,
        T: PartialEq + Clone + 'static,
    {
        self.bind(move |state: &S| Ok(f(state)))
    }

    /// Reactive read of the whole state.
    pub fn use_whole_state(&self) -> Binding<S>
    where
        S: PartialEq,
    {
        self.use_selector(S::clone)
    }

    fn bind<T, F>(&self, evaluate: F) -> Binding<T>
    where
        F: Fn(&S) -> Result<T, SelectorError> + 'static,
        T: PartialEq + Clone + 'static,
    {
        self.shared.bind(evaluate)
    }

    /// Observe-only handle sharing this store's state and listeners.
    pub fn read_only(&self) -> ReadOnlyStore<S> {
        ReadOnlyStore {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<S, A> Clone for Store<S, A> {
    fn clone(&self) -> Self {
        Store {
            shared: Rc::clone(&self.shared),
            reducer: Rc::clone(&self.reducer),
        }
    }
}

impl<S: fmt::Debug, A> fmt::Debug for Store<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("state", &*self.shared.state.borrow())
            .field("listeners", &self.shared.listeners.borrow().len())
            .finish()
    }
}


// ---------------------------------------------------------------------------
// ReadOnlyStore
// ---------------------------------------------------------------------------

/// Observe-only view of a [`Store`], from [`Store::read_only`].
///
/// Reads, subscriptions and bindings behave exactly as on the store; there
/// is no way to update the state through this handle.
pub struct ReadOnlyStore<S> {
    shared: Rc<Shared<S>>,
}

impl<S> ReadOnlyStore<S>
where
    S: Clone + 'static,
{
    pub fn get_state(&self) -> S {
        self.shared.state.borrow().clone()
    }

    pub fn with_state<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.shared.state.borrow())
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&S, &S) + 'static,
    {
        self.shared.add_listener(Rc::new(listener))
    }

    pub fn subscribe_listener(&self, listener: Listener<S>) -> Subscription {
        self.shared.add_listener(listener)
    }

    pub fn listener_count(&self) -> usize {
        self.shared.listeners.borrow().len()
    }

    pub fn select<T>(&self, selector: &Selector<S, T>) -> Result<T, SelectorError> {
        self.with_state(|state| selector.evaluate(state))
    }

    pub fn use_state<T>(&self, selector: Selector<S, T>) -> Result<Binding<T>, SelectorError>
    where
        T: PartialEq + Clone + 'static,
    {
        let binding = self.shared.bind(move |state: &S| selector.evaluate(state));
        binding.get()?;
        Ok(binding)
    }

    pub fn use_selector<T, F>(&self, f: F) -> Binding<T>
    where
        F: Fn(&S) -> T + 'static,
        T: PartialEq + Clone + 'static,
    {
        self.shared.bind(move |state: &S| Ok(f(state)))
    }
}

impl<S> Clone for ReadOnlyStore<S> {
    fn clone(&self) -> Self {
        ReadOnlyStore {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<S: fmt::Debug> fmt::Debug for ReadOnlyStore<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadOnlyStore")
            .field("state", &*self.shared.state.borrow())
            .finish()
    }
}


// ---------------------------------------------------------------------------
// Subscription
// ---------------------------------------------------------------------------

/// Handle returned by [`Store::subscribe`].
pub struct Subscription {
    cancel: Cell<Option<Box<dyn FnOnce()>>>,
}

impl Subscription {
    fn new(cancel: impl FnOnce() + 'static) -> Self {
        Subscription {
            cancel: Cell::new(Some(Box::new(cancel))),
        }
    }

    /// Remove the listener. Calling this again, or after the store has been
    /// dropped, does nothing.
    pub fn unsubscribe(&self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Subscription")
    }
}
