//! Path-addressable tree of named children and typed leaves.

use super::array::DataArray;
use crate::mesh_error::MeshError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One node of a mesh document.
///
/// Paths are `/`-separated child names (`"coordsets/coords/values/x"`).
/// Leaves are numeric [`DataArray`]s or text; interior nodes are objects.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum Node {
    #[default]
    Empty,
    Object(BTreeMap<String, Node>),
    Array(DataArray),
    Text(String),
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

impl Node {
    pub fn new() -> Self {
        Node::Empty
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Node::Empty)
    }

    /// Look up a descendant.
    pub fn fetch(&self, path: &str) -> Option<&Node> {
        let mut cur = self;
        for seg in segments(path) {
            match cur {
                Node::Object(children) => cur = children.get(seg)?,
                _ => return None,
            }
        }
        Some(cur)
    }

    /// Look up a descendant that must exist.
    pub fn fetch_existing(&self, path: &str) -> Result<&Node, MeshError> {
        self.fetch(path)
            .ok_or_else(|| MeshError::MissingField(path.to_string()))
    }

    pub fn has_path(&self, path: &str) -> bool {
        self.fetch(path).is_some()
    }

    /// Mutable access to a descendant, creating empty objects along the way.
    /// A leaf sitting on the path is replaced by an object.
    pub fn fetch_mut(&mut self, path: &str) -> &mut Node {
        let mut cur = self;
        for seg in segments(path) {
            if !matches!(cur, Node::Object(_)) {
                *cur = Node::Object(BTreeMap::new());
            }
            let Node::Object(children) = cur else {
                unreachable!("just replaced with an object")
            };
            cur = children.entry(seg.to_string()).or_default();
        }
        cur
    }

    /// Store `value` at `path`, replacing what was there.
    pub fn set(&mut self, path: &str, value: impl Into<Node>) {
        *self.fetch_mut(path) = value.into();
    }

    /// Detach and return the descendant at `path`.
    pub fn remove(&mut self, path: &str) -> Option<Node> {
        let (parent, leaf) = match path.trim_end_matches('/').rsplit_once('/') {
            Some((parent, leaf)) => (Some(parent), leaf),
            None => (None, path.trim_end_matches('/')),
        };
        let parent = match parent {
            Some(p) => self.fetch_mut_existing(p)?,
            None => self,
        };
        match parent {
            Node::Object(children) => children.remove(leaf),
            _ => None,
        }
    }

    fn fetch_mut_existing(&mut self, path: &str) -> Option<&mut Node> {
        let mut cur = self;
        for seg in segments(path) {
            match cur {
                Node::Object(children) => cur = children.get_mut(seg)?,
                _ => return None,
            }
        }
        Some(cur)
    }

    /// Named children in name order; leaves have none.
    pub fn children(&self) -> impl Iterator<Item = (&str, &Node)> {
        let map = match self {
            Node::Object(children) => Some(children),
            _ => None,
        };
        map.into_iter()
            .flat_map(|m| m.iter().map(|(k, v)| (k.as_str(), v)))
    }

    pub fn number_of_children(&self) -> usize {
        match self {
            Node::Object(children) => children.len(),
            _ => 0,
        }
    }

    pub fn as_array(&self) -> Option<&DataArray> {
        match self {
            Node::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Array at `path`, or a typed error.
    pub fn array_at(&self, path: &str) -> Result<&DataArray, MeshError> {
        self.fetch_existing(path)?
            .as_array()
            .ok_or_else(|| MeshError::TypeMismatch {
                path: path.to_string(),
                expected: "numeric array",
            })
    }

    /// Text at `path`, or a typed error.
    pub fn str_at(&self, path: &str) -> Result<&str, MeshError> {
        self.fetch_existing(path)?
            .as_str()
            .ok_or_else(|| MeshError::TypeMismatch {
                path: path.to_string(),
                expected: "string",
            })
    }

    /// Scalar integer value of a leaf (first element of its array).
    pub fn to_i64(&self) -> Option<i64> {
        self.as_array().and_then(DataArray::first_i64)
    }

    /// Scalar floating value of a leaf (first element of its array).
    pub fn to_f64(&self) -> Option<f64> {
        self.as_array().and_then(DataArray::first_f64)
    }

    /// Parse a document from JSON text. Numbers become `Float64` or `Int64`
    /// arrays, lists of numbers become arrays, strings become text.
    pub fn from_json(text: &str) -> Result<Node, MeshError> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        Ok(Node::from(&value))
    }

    /// Render as JSON; arrays of length one are written as scalars.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value;
        match self {
            Node::Empty => Value::Null,
            Node::Text(s) => Value::String(s.clone()),
            Node::Object(children) => Value::Object(
                children
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            Node::Array(a) => {
                let items: Vec<Value> = match a {
                    DataArray::Float64(v) => v.iter().map(|&x| Value::from(x)).collect(),
                    DataArray::UInt64(v) => v.iter().map(|&x| Value::from(x)).collect(),
                    _ => a.to_i64_vec().into_iter().map(Value::from).collect(),
                };
                if items.len() == 1 {
                    items.into_iter().next().unwrap_or(Value::Null)
                } else {
                    Value::Array(items)
                }
            }
        }
    }
}

impl From<&serde_json::Value> for Node {
    fn from(value: &serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => Node::Empty,
            Value::Bool(b) => Node::from(i64::from(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Node::from(i),
                None => Node::from(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => Node::Text(s.clone()),
            Value::Array(items) => {
                if items.iter().all(|v| v.is_i64()) {
                    Node::from(items.iter().filter_map(Value::as_i64).collect::<Vec<_>>())
                } else if items.iter().all(Value::is_number) {
                    Node::from(items.iter().filter_map(Value::as_f64).collect::<Vec<_>>())
                } else {
                    Node::Object(
                        items
                            .iter()
                            .enumerate()
                            .map(|(i, v)| (i.to_string(), Node::from(v)))
                            .collect(),
                    )
                }
            }
            Value::Object(map) => Node::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), Node::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<DataArray> for Node {
    fn from(a: DataArray) -> Self {
        Node::Array(a)
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Node::Text(s.to_string())
    }
}

impl From<String> for Node {
    fn from(s: String) -> Self {
        Node::Text(s)
    }
}

macro_rules! node_from_numeric {
    ($($t:ty),*) => {$(
        impl From<Vec<$t>> for Node {
            fn from(v: Vec<$t>) -> Self {
                Node::Array(DataArray::from(v))
            }
        }
        impl From<$t> for Node {
            fn from(x: $t) -> Self {
                Node::Array(DataArray::from(vec![x]))
            }
        }
    )*};
}

node_from_numeric!(i32, i64, u64, f64);
