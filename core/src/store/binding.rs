//! Selection-scoped subscriptions.
//!
//! A [`Binding`] is what a rendering layer holds for one `use_state` call: it
//! tracks the selected slice and only reports a change when that slice's
//! value changes, regardless of how often the rest of the state moves.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use tracing::warn;

use super::observable::Subscription;
use crate::selector::SelectorError;


struct Slot<T> {
    current: RefCell<Result<T, SelectorError>>,
    version: Cell<u64>,
    callbacks: RefCell<Vec<Rc<dyn Fn(&T)>>>,
}

impl<T: PartialEq + Clone> Slot<T> {
    fn update(&self, next: Result<T, SelectorError>) {
        if *self.current.borrow() == next {
            return;
        }
        if let Err(err) = &next {
            warn!(error = %err, "selection failed after state update");
        }
        *self.current.borrow_mut() = next;
        self.version.set(self.version.get() + 1);

        let current = self.current.borrow();
        if let Ok(value) = &*current {
            let callbacks: Vec<Rc<dyn Fn(&T)>> = self.callbacks.borrow().clone();
            for callback in &callbacks {
                callback(value);
            }
        }
    }
}


/// Live view of one selected slice of a store.
///
/// Dropping the binding detaches it from the store.
pub struct Binding<T> {
    slot: Rc<Slot<T>>,
    subscription: Subscription,
}

impl<T> Binding<T>
where
    T: PartialEq + Clone + 'static,
{
    /// Build a binding from its first evaluation. `subscribe` receives the
    /// updater to call with each re-evaluation and returns the store
    /// subscription feeding it.
    pub(crate) fn attach<F>(initial: Result<T, SelectorError>, subscribe: F) -> Self
    where
        F: FnOnce(Box<dyn Fn(Result<T, SelectorError>)>) -> Subscription,
    {
        let slot = Rc::new(Slot {
            current: RefCell::new(initial),
            version: Cell::new(0),
            callbacks: RefCell::new(Vec::new()),
        });
        let weak = Rc::downgrade(&slot);
        let subscription = subscribe(Box::new(move |next| {
            if let Some(slot) = weak.upgrade() {
                slot.update(next);
            }
        }));
        Binding { slot, subscription }
    }

    /// The current selection, or the error from the latest evaluation.
    pub fn get(&self) -> Result<T, SelectorError> {
        self.slot.current.borrow().clone()
    }

    /// Number of times the selection has changed since the binding was
    /// created. Unchanged selections do not advance it.
    pub fn version(&self) -> u64 {
        self.slot.version.get()
    }

    /// Run `callback` with the new selection every time it changes.
    pub fn on_change<F>(&self, callback: F)
    where
        F: Fn(&T) + 'static,
    {
        self.slot.callbacks.borrow_mut().push(Rc::new(callback));
    }
}

impl<T> Drop for Binding<T> {
    fn drop(&mut self) {
        self.subscription.unsubscribe();
    }
}

impl<T: fmt::Debug> fmt::Debug for Binding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("current", &*self.slot.current.borrow())
            .field("version", &self.slot.version.get())
            .finish()
    }
}
