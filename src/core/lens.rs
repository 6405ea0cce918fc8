//! Path lens over nested structures.
//!
//! A lens reads and writes a value at a path without mutating the structure
//! it starts from: `set` always returns a new structure. The history uses it
//! for [`find`](super::StateHistory::find) and
//! [`update`](super::StateHistory::update).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// One step of a [`Path`]: an object key or a sequence index.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Index(usize),
    Key(String),
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        PathSegment::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Index(index) => write!(f, "{index}"),
            PathSegment::Key(key) => f.write_str(key),
        }
    }
}

/// Ordered sequence of keys addressing a value inside a nested structure.
///
/// # Example
///
/// ```rust
/// use rewind::core::{Path, PathSegment};
///
/// let path = Path::parse("user.tags.0");
/// assert_eq!(path.segments()[2], PathSegment::Index(0));
/// assert_eq!(path, Path::from(["user", "tags"]).index(0));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path(Vec<PathSegment>);

impl Path {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Parse a dotted path. Segments made only of digits become indices.
    pub fn parse(dotted: &str) -> Self {
        dotted
            .split('.')
            .filter(|segment| !segment.is_empty())
            .map(|segment| match segment.parse::<usize>() {
                Ok(index) => PathSegment::Index(index),
                Err(_) => PathSegment::Key(segment.to_string()),
            })
            .collect()
    }

    /// Append an object key.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.0.push(PathSegment::Key(key.into()));
        self
    }

    /// Append a sequence index.
    pub fn index(mut self, index: usize) -> Self {
        self.0.push(PathSegment::Index(index));
        self
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<PathSegment> for Path {
    fn from_iter<I: IntoIterator<Item = PathSegment>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<P: Into<PathSegment>, const N: usize> From<[P; N]> for Path {
    fn from(segments: [P; N]) -> Self {
        segments.into_iter().map(Into::into).collect()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

/// Non-mutating get/set by path.
///
/// Implementors are structured values that can be addressed by a [`Path`].
/// `set` must leave `self` untouched and return the updated copy.
pub trait PathLens: Sized {
    /// Look up the value at `path`, or `None` when any step is absent.
    fn view(&self, path: &Path) -> Option<&Self>;

    /// Return a copy of `self` with `value` stored at `path`, creating
    /// intermediate containers as needed.
    fn set(&self, path: &Path, value: Self) -> Self;

    /// Whether a looked-up value counts as present.
    ///
    /// Default implementation returns `true`.
    fn is_truthy(&self) -> bool {
        true
    }
}

impl PathLens for Value {
    fn view(&self, path: &Path) -> Option<&Self> {
        path.segments()
            .iter()
            .try_fold(self, |node, segment| match (node, segment) {
                (Value::Object(map), PathSegment::Key(key)) => map.get(key),
                (Value::Object(map), PathSegment::Index(index)) => map.get(&index.to_string()),
                (Value::Array(items), PathSegment::Index(index)) => items.get(*index),
                _ => None,
            })
    }

    fn set(&self, path: &Path, value: Self) -> Self {
        assoc(Some(self), path.segments(), value)
    }

    /// Null, `false`, zero, NaN and the empty string are falsy.
    fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(flag) => *flag,
            Value::Number(number) => number.as_f64().is_none_or(|n| n != 0.0 && !n.is_nan()),
            Value::String(text) => !text.is_empty(),
            Value::Array(_) | Value::Object(_) => true,
        }
    }
}

fn assoc(node: Option<&Value>, segments: &[PathSegment], value: Value) -> Value {
    let Some((segment, rest)) = segments.split_first() else {
        return value;
    };

    match (node, segment) {
        (Some(Value::Array(items)), PathSegment::Index(index)) => {
            let mut items = items.clone();
            if *index >= items.len() {
                items.resize(index + 1, Value::Null);
            }
            let child = assoc(items.get(*index), rest, value);
            items[*index] = child;
            Value::Array(items)
        }
        (Some(Value::Object(_)), _) | (_, PathSegment::Key(_)) => {
            let mut map = match node {
                Some(Value::Object(map)) => map.clone(),
                _ => Map::new(),
            };
            let key = segment.to_string();
            let child = assoc(map.get(&key), rest, value);
            map.insert(key, child);
            Value::Object(map)
        }
        (_, PathSegment::Index(index)) => {
            let mut items = vec![Value::Null; index + 1];
            items[*index] = assoc(None, rest, value);
            Value::Array(items)
        }
    }
}
