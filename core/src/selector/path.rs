//! Dotted path parser and evaluator.
//!
//! Parses paths like `user.name`, `user.addresses[0].city` or `matrix[1][0]`
//! into segments and walks a `serde_json::Value` with them. A token may
//! combine a property name with bracket indices: `a[0]` navigates into `a`
//! first, then into element 0.
//!
//! Parsing never fails. Bracket text that is not an integer is kept as a
//! [`Segment::InvalidIndex`] and reported when the path is evaluated.

use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::trace;

use super::error::SelectorError;


/// A single navigation step within a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Plain property access, e.g. `city`
    Property(String),
    /// Bracket index, e.g. `[0]`
    Index(usize),
    /// Bracket whose contents are not a base-10 integer, e.g. `[x]`
    InvalidIndex(String),
}

impl Segment {
    /// The key text reported in errors for this segment.
    pub fn key_text(&self) -> String {
        match self {
            Segment::Property(name) => name.clone(),
            Segment::Index(index) => index.to_string(),
            Segment::InvalidIndex(text) => text.clone(),
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Property(name) => f.write_str(name),
            Segment::Index(index) => write!(f, "[{}]", index),
            Segment::InvalidIndex(text) => write!(f, "[{}]", text),
        }
    }
}


/// A compiled path, reusable across any number of state snapshots.
///
/// Cloning is cheap: the source text and segments are shared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSelector {
    source: Rc<str>,
    segments: Rc<[Segment]>,
}

impl PathSelector {
    /// Compile a path string. See the module docs for the grammar.
    pub fn compile(path: &str) -> Self {
        let mut segments = Vec::new();
        for token in path.split('.') {
            parse_token(token, &mut segments);
        }
        trace!(path, segments = segments.len(), "compiled selector path");
        PathSelector {
            source: Rc::from(path),
            segments: Rc::from(segments),
        }
    }

    /// The path text this selector was compiled from.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Format the segments back to a normalized path.
    ///
    /// Indices are attached to the preceding property (`a[0].b`), so
    /// `a.[0]` normalizes to `a[0]`.
    pub fn to_dotted(&self) -> String {
        let mut out = String::new();
        for seg in self.segments.iter() {
            if matches!(seg, Segment::Property(_)) && !out.is_empty() {
                out.push('.');
            }
            out.push_str(&seg.to_string());
        }
        out
    }

    /// Walk `state` and return a reference to the selected value.
    pub fn select_value<'a>(&self, state: &'a Value) -> Result<&'a Value, SelectorError> {
        let mut value = state;
        for segment in self.segments.iter() {
            let next = match segment {
                Segment::Property(name) => lookup_property(value, name),
                Segment::Index(index) => lookup_index(value, *index),
                Segment::InvalidIndex(text) => {
                    return Err(SelectorError::InvalidIndex {
                        index: text.clone(),
                        path: self.source.to_string(),
                    });
                }
            };
            value = next.ok_or_else(|| SelectorError::KeyNotFound {
                key: segment.key_text(),
                path: self.source.to_string(),
            })?;
        }
        trace!(path = %self.source, "selected value");
        Ok(value)
    }

    /// Select from a JSON value and deserialize the result into `T`.
    pub fn select<T: DeserializeOwned>(&self, state: &Value) -> Result<T, SelectorError> {
        let selected = self.select_value(state)?;
        T::deserialize(selected).map_err(|e| self.conversion_error(e))
    }

    /// Select from any serializable state.
    ///
    /// The state is converted to a JSON value first, so this costs a full
    /// serialization per call. Prefer [`select`](Self::select) when the
    /// state already is a `serde_json::Value`.
    pub fn select_from<S, T>(&self, state: &S) -> Result<T, SelectorError>
    where
        S: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let value = serde_json::to_value(state).map_err(|e| self.conversion_error(e))?;
        self.select(&value)
    }

    fn conversion_error(&self, err: serde_json::Error) -> SelectorError {
        SelectorError::Conversion {
            path: self.source.to_string(),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for PathSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl FromStr for PathSelector {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(PathSelector::compile(s))
    }
}

impl From<&str> for PathSelector {
    fn from(s: &str) -> Self {
        PathSelector::compile(s)
    }
}

impl Serialize for PathSelector {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

impl<'de> Deserialize<'de> for PathSelector {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let path = String::deserialize(deserializer)?;
        Ok(PathSelector::compile(&path))
    }
}


/// Compile a path string into a reusable [`PathSelector`].
pub fn compile(path: &str) -> PathSelector {
    PathSelector::compile(path)
}


// ---------------------------------------------------------------------------
// Internal: token parsing
// ---------------------------------------------------------------------------

/// Parse one dot-separated token into `out`.
///
/// `name`, `name[0]`, `[0]` and `name[0][1]` are recognized. A token whose
/// brackets are unbalanced or followed by trailing text is a plain property.
fn parse_token(token: &str, out: &mut Vec<Segment>) {
    let Some(open) = token.find('[') else {
        out.push(Segment::Property(token.to_string()));
        return;
    };

    let (name, mut rest) = token.split_at(open);
    let mut indices = Vec::new();
    while !rest.is_empty() {
        let parsed = rest
            .strip_prefix('[')
            .and_then(|inner| inner.find(']').map(|close| (&inner[..close], &inner[close + 1..])));
        match parsed {
            Some((text, remainder)) => {
                indices.push(parse_index(text));
                rest = remainder;
            }
            None => {
                out.push(Segment::Property(token.to_string()));
                return;
            }
        }
    }

    if !name.is_empty() {
        out.push(Segment::Property(name.to_string()));
    }
    out.extend(indices);
}

fn parse_index(text: &str) -> Segment {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Segment::InvalidIndex(text.to_string());
    }
    match text.parse::<usize>() {
        Ok(index) => Segment::Index(index),
        Err(_) => Segment::InvalidIndex(text.to_string()),
    }
}


// ---------------------------------------------------------------------------
// Internal: key lookup
// ---------------------------------------------------------------------------

/// Property lookup. Objects match by key; arrays accept a decimal name as an
/// element index. Empty names and scalars never match.
fn lookup_property<'a>(value: &'a Value, name: &str) -> Option<&'a Value> {
    if name.is_empty() {
        return None;
    }
    match value {
        Value::Object(map) => map.get(name),
        Value::Array(items) => match parse_index(name) {
            Segment::Index(index) => items.get(index),
            _ => None,
        },
        _ => None,
    }
}

/// Index lookup. Arrays match by position; objects match the decimal key.
fn lookup_index(value: &Value, index: usize) -> Option<&Value> {
    match value {
        Value::Array(items) => items.get(index),
        Value::Object(map) => map.get(&index.to_string()),
        _ => None,
    }
}


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
