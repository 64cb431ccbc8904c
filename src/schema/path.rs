//! Addressable paths into a JSON document.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, StegoError};

/// One step of a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathStep {
    /// Object member
    Key(String),
    /// Array element
    Index(usize),
}

impl From<&str> for PathStep {
    fn from(key: &str) -> Self {
        PathStep::Key(key.to_string())
    }
}

impl From<usize> for PathStep {
    fn from(index: usize) -> Self {
        PathStep::Index(index)
    }
}

/// Ordered keys/indices locating one leaf in a JSON document.
///
/// Serialises as a plain array, e.g. `["messages", 1, "content"]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldPath(Vec<PathStep>);

impl FieldPath {
    /// Empty path (addresses the root)
    pub fn root() -> Self {
        Self::default()
    }

    /// Append an object key
    pub fn key(mut self, key: &str) -> Self {
        self.0.push(PathStep::Key(key.to_string()));
        self
    }

    /// Append an array index
    pub fn index(mut self, index: usize) -> Self {
        self.0.push(PathStep::Index(index));
        self
    }

    /// Steps in order
    pub fn steps(&self) -> &[PathStep] {
        &self.0
    }

    /// Number of steps
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the path addresses the root
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Resolve the path against `doc`
    pub fn get<'a>(&self, doc: &'a Value) -> Option<&'a Value> {
        self.0.iter().try_fold(doc, |node, step| match step {
            PathStep::Key(key) => node.as_object()?.get(key),
            PathStep::Index(idx) => node.as_array()?.get(*idx),
        })
    }

    fn get_mut<'a>(&self, doc: &'a mut Value) -> Option<&'a mut Value> {
        self.0.iter().try_fold(doc, |node, step| match step {
            PathStep::Key(key) => node.as_object_mut()?.get_mut(key),
            PathStep::Index(idx) => node.as_array_mut()?.get_mut(*idx),
        })
    }

    /// Replace the string at this path.
    ///
    /// Every step, the leaf included, must already resolve; otherwise the
    /// document is left untouched and [`StegoError::PathNotFound`] is
    /// returned.
    pub fn set(&self, doc: &mut Value, text: &str) -> Result<()> {
        if self.is_empty() {
            return Err(StegoError::PathNotFound("empty path".to_string()));
        }

        match self.get_mut(doc) {
            Some(leaf) => {
                *leaf = Value::String(text.to_string());
                Ok(())
            },
            None => Err(StegoError::PathNotFound(self.to_string())),
        }
    }
}

impl<S: Into<PathStep>> FromIterator<S> for FieldPath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl std::fmt::Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.is_empty() {
            return write!(f, "$");
        }
        for (i, step) in self.0.iter().enumerate() {
            match step {
                PathStep::Key(key) if i == 0 => write!(f, "{key}")?,
                PathStep::Key(key) => write!(f, ".{key}")?,
                PathStep::Index(idx) => write!(f, "[{idx}]")?,
            }
        }
        Ok(())
    }
}
