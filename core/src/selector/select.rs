//! The two-variant selector: compiled path or typed function.

use std::fmt;
use std::rc::Rc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::error::SelectorError;
use super::path::PathSelector;


/// Extracts a `T` from a state `S`.
///
/// `Func` is the statically checked form and places no requirement on `S`
/// or `T`. `Path` is the weaker-typed escape hatch for selections decided at
/// runtime (configuration, user input); it goes through serde, and its
/// failures only surface when it is evaluated.
pub enum Selector<S, T = Value> {
    Path(TypedPath<S, T>),
    Func(Rc<dyn Fn(&S) -> T>),
}

/// A compiled path together with the conversions from `S` and into `T`,
/// fixed when the selector is built.
pub struct TypedPath<S, T> {
    path: PathSelector,
    eval: Rc<dyn Fn(&S) -> Result<T, SelectorError>>,
}

impl<S, T> TypedPath<S, T> {
    pub fn path(&self) -> &PathSelector {
        &self.path
    }
}

impl<S, T> Clone for TypedPath<S, T> {
    fn clone(&self) -> Self {
        TypedPath {
            path: self.path.clone(),
            eval: Rc::clone(&self.eval),
        }
    }
}

impl<S, T> Selector<S, T>
where
    S: Serialize + 'static,
    T: DeserializeOwned + 'static,
{
    /// Compile a string path into a selector.
    pub fn path(path: &str) -> Self {
        Selector::from_path(PathSelector::compile(path))
    }

    /// Use an already compiled path.
    pub fn from_path(path: PathSelector) -> Self {
        let compiled = path.clone();
        Selector::Path(TypedPath {
            path,
            eval: Rc::new(move |state: &S| compiled.select_from(state)),
        })
    }
}

impl<S, T> Selector<S, T> {
    /// Wrap a typed function.
    pub fn func<F>(f: F) -> Self
    where
        F: Fn(&S) -> T + 'static,
    {
        Selector::Func(Rc::new(f))
    }

    pub fn is_path(&self) -> bool {
        matches!(self, Selector::Path(_))
    }

    /// Run the selector against a state snapshot.
    pub fn evaluate(&self, state: &S) -> Result<T, SelectorError> {
        match self {
            Selector::Path(path) => (path.eval)(state),
            Selector::Func(f) => Ok(f(state)),
        }
    }
}

impl<S, T> Clone for Selector<S, T> {
    fn clone(&self) -> Self {
        match self {
            Selector::Path(path) => Selector::Path(path.clone()),
            Selector::Func(f) => Selector::Func(Rc::clone(f)),
        }
    }
}

impl<S, T> fmt::Debug for Selector<S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Path(path) => f.debug_tuple("Path").field(&path.path().as_str()).finish(),
            Selector::Func(_) => f.write_str("Func(..)"),
        }
    }
}

impl<S, T> From<PathSelector> for Selector<S, T>
where
    S: Serialize + 'static,
    T: DeserializeOwned + 'static,
{
    fn from(path: PathSelector) -> Self {
        Selector::from_path(path)
    }
}

impl<S, T> From<&str> for Selector<S, T>
where
    S: Serialize + 'static,
    T: DeserializeOwned + 'static,
{
    fn from(path: &str) -> Self {
        Selector::path(path)
    }
}
