//! The `Throwable` result convention.
//!
//! Operations that can fail return a [`Throwable`] instead of unwinding
//! across a module boundary, and callers check the discriminant before
//! touching the value:
//!
//! ```
//! use stateline_core::{handle_error, Throwable};
//!
//! let result: Throwable<u32> = handle_error(|| 40 + 2);
//! match result {
//!     Ok(value) => assert_eq!(value, 42),
//!     Err(failure) => eprintln!("{}", failure.message),
//! }
//! ```
//!
//! For third-party code that panics, wrap the call in [`handle_error`]. For
//! arbitrary caught error values, [`get_error_message`] and
//! [`get_error_code`] extract something printable without ever failing.

pub mod status;

use std::any::Any;
use std::error::Error as StdError;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::persist::PersistError;
use crate::selector::SelectorError;
use crate::store::StoreError;

pub use status::{StatusStore, ThrowableStatus};

/// Success carrying `T`, or failure carrying `E`.
pub type Throwable<T = (), E = Failure> = Result<T, E>;


// ---------------------------------------------------------------------------
// Failure
// ---------------------------------------------------------------------------

/// Canonical failure payload: a human-readable message and an optional
/// machine-readable code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{message}")]
pub struct Failure {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl Failure {
    pub fn new(message: impl Into<String>) -> Self {
        Failure {
            message: message.into(),
            code: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Capture an error's message, appending its source chain.
    pub fn from_error(err: &(dyn StdError + 'static)) -> Self {
        let mut message = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        Failure::new(message)
    }
}

impl From<SelectorError> for Failure {
    fn from(err: SelectorError) -> Self {
        Failure::new(err.to_string()).with_code(err.kind().as_str())
    }
}

impl From<StoreError> for Failure {
    fn from(err: StoreError) -> Self {
        let code = err.code();
        Failure::from_error(&err).with_code(code)
    }
}

impl From<PersistError> for Failure {
    fn from(err: PersistError) -> Self {
        let code = err.code();
        Failure::from_error(&err).with_code(code)
    }
}


// ---------------------------------------------------------------------------
// Error inspection
// ---------------------------------------------------------------------------

/// Message of an arbitrary error value.
///
/// 1. If the value serializes to an object with a string `message`, that.
/// 2. Otherwise the value's JSON serialization.
/// 3. If serialization fails, the value's `Debug` rendering.
pub fn get_error_message<E>(error: &E) -> String
where
    E: Serialize + fmt::Debug + ?Sized,
{
    match serde_json::to_value(error) {
        Ok(value) => {
            if let Some(message) = string_field(&value, "message") {
                return message;
            }
            serde_json::to_string(&value).unwrap_or_else(|_| format!("{:?}", error))
        }
        Err(_) => format!("{:?}", error),
    }
}

/// The string `code` field of an arbitrary error value, if it has one.
pub fn get_error_code<E>(error: &E) -> Option<String>
where
    E: Serialize + ?Sized,
{
    serde_json::to_value(error)
        .ok()
        .and_then(|value| string_field(&value, "code"))
}

fn string_field(value: &Value, field: &str) -> Option<String> {
    match value {
        Value::Object(map) => match map.get(field) {
            Some(Value::String(s)) => Some(s.clone()),
            _ => None,
        },
        _ => None,
    }
}


// ---------------------------------------------------------------------------
// Panic → Throwable adapters
// ---------------------------------------------------------------------------

/// Run `f`, turning a panic into a [`Failure`] carrying the panic message.
pub fn handle_error<R, F>(f: F) -> Throwable<R>
where
    F: FnOnce() -> R,
{
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| panic_failure(payload.as_ref()))
}

/// Run a fallible `f` and map its error through `selector` into a
/// [`Failure`] message. Panics are converted like [`handle_error`].
///
/// Pair with [`get_error_message`] for arbitrary serializable errors:
/// `select_error(f, get_error_message)`.
pub fn select_error<R, E, F, M>(f: F, selector: M) -> Throwable<R>
where
    F: FnOnce() -> Result<R, E>,
    M: FnOnce(&E) -> String,
{
    match handle_error(f) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(Failure::new(selector(&err))),
        Err(failure) => Err(failure),
    }
}

fn panic_failure(payload: &(dyn Any + Send)) -> Failure {
    if let Some(failure) = payload.downcast_ref::<Failure>() {
        return failure.clone();
    }
    let message = if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panicked with a non-string payload".to_string()
    };
    Failure::new(message).with_code("panic")
}
