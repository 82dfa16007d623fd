//! Field names and deep-path addressing into nested value trees.
//!
//! This module provides [`FieldName`] and [`PathSegment`] for naming a location
//! inside a `serde_json::Value` tree, plus the [`get`], [`set`], [`remove`] and
//! [`leaves`] helpers the store uses to read and write that tree.

use std::fmt::{self, Display};

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// A segment of a field name.
///
/// Names are built from segments that represent either object keys or array indices.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// An object key (e.g., `template`, `index.number_of_shards`)
    Field(String),
    /// An array index (e.g., `0`, `42`)
    Index(usize),
}

impl PathSegment {
    /// Creates a new field segment.
    pub fn field(name: impl Into<String>) -> Self {
        PathSegment::Field(name.into())
    }

    /// Creates a new index segment.
    pub fn index(idx: usize) -> Self {
        PathSegment::Index(idx)
    }
}

impl From<&str> for PathSegment {
    fn from(value: &str) -> Self {
        PathSegment::Field(value.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(value: String) -> Self {
        PathSegment::Field(value)
    }
}

impl From<usize> for PathSegment {
    fn from(value: usize) -> Self {
        PathSegment::Index(value)
    }
}

impl Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Field(name) => write!(f, "{}", name),
            PathSegment::Index(idx) => write!(f, "{}", idx),
        }
    }
}

/// The name of a field: a path to a location in a nested value tree.
///
/// A name is either a single key or an ordered list of keys and indices. The
/// structural form is what [`get`] and [`set`] walk; the dotted form returned
/// by [`FieldName::serialize`] is the identity key used by the error map and
/// the field registry.
///
/// A plain string converts to a single-segment name, so dots inside it stay
/// part of the key. Use [`FieldName::parse`] to split a dotted string.
///
/// # Example
///
/// ```rust
/// use formfield::FieldName;
///
/// let name = FieldName::from(["template", "settings", "index.number_of_shards"]);
/// assert_eq!(name.serialize(), "template.settings.index.number_of_shards");
///
/// let name = FieldName::root().push_field("aliases").push_index(0);
/// assert_eq!(name.to_string(), "aliases.0");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct FieldName {
    segments: Vec<PathSegment>,
}

impl FieldName {
    /// Creates an empty name addressing the whole tree.
    pub fn root() -> Self {
        Self::default()
    }

    /// Creates a name from a single key.
    pub fn from_field(name: impl Into<String>) -> Self {
        Self {
            segments: vec![PathSegment::Field(name.into())],
        }
    }

    /// Creates a name from a sequence of segments.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<PathSegment>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Splits a dotted string into a name; all-digit parts become indices.
    ///
    /// ```rust
    /// use formfield::{FieldName, PathSegment};
    ///
    /// let name = FieldName::parse("aliases.0.name");
    /// assert_eq!(name.len(), 3);
    /// assert_eq!(name.segments().nth(1), Some(&PathSegment::Index(0)));
    /// ```
    pub fn parse(dotted: &str) -> Self {
        if dotted.is_empty() {
            return Self::root();
        }
        Self {
            segments: dotted
                .split('.')
                .map(|part| match part.parse::<usize>() {
                    Ok(idx) if !part.starts_with('+') => PathSegment::Index(idx),
                    _ => PathSegment::Field(part.to_string()),
                })
                .collect(),
        }
    }

    /// Returns a new name with a field segment appended.
    pub fn push_field(&self, name: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::Field(name.into()));
        Self { segments }
    }

    /// Returns a new name with an index segment appended.
    pub fn push_index(&self, index: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::Index(index));
        Self { segments }
    }

    /// Returns a new name with every segment of `other` appended.
    pub fn join(&self, other: &FieldName) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        Self { segments }
    }

    /// Returns true if this name addresses the whole tree.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns the number of segments in this name.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns true if this name has no segments.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns an iterator over the segments.
    pub fn segments(&self) -> impl Iterator<Item = &PathSegment> {
        self.segments.iter()
    }

    /// Returns the parent name, or None for the root.
    pub fn parent(&self) -> Option<Self> {
        if self.segments.is_empty() {
            None
        } else {
            Some(Self {
                segments: self.segments[..self.segments.len() - 1].to_vec(),
            })
        }
    }

    /// Returns the last segment, or None for the root.
    pub fn last(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    /// Returns true if `self` equals `other` or lies underneath it.
    pub fn starts_with(&self, other: &FieldName) -> bool {
        self.segments.len() >= other.segments.len()
            && self.segments[..other.segments.len()] == other.segments[..]
    }

    /// Returns the dot-joined identity key of this name.
    pub fn serialize(&self) -> String {
        self.to_string()
    }
}

impl Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

impl Serialize for FieldName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl From<&str> for FieldName {
    fn from(value: &str) -> Self {
        Self::from_field(value)
    }
}

impl From<String> for FieldName {
    fn from(value: String) -> Self {
        Self::from_field(value)
    }
}

impl From<&String> for FieldName {
    fn from(value: &String) -> Self {
        Self::from_field(value.clone())
    }
}

impl From<&FieldName> for FieldName {
    fn from(value: &FieldName) -> Self {
        value.clone()
    }
}

impl From<Vec<PathSegment>> for FieldName {
    fn from(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }
}

impl<S: Into<PathSegment>, const N: usize> From<[S; N]> for FieldName {
    fn from(segments: [S; N]) -> Self {
        Self::from_segments(segments)
    }
}

/// Reads the value at `name`, or `None` when any step of the path is missing.
///
/// Index segments read object keys by their decimal spelling, and field
/// segments that spell a number read array items, so names behave the same
/// whether a level was created as an object or an array.
pub fn get<'a>(tree: &'a Value, name: &FieldName) -> Option<&'a Value> {
    name.segments().try_fold(tree, |node, segment| match (node, segment) {
        (Value::Object(map), PathSegment::Field(key)) => map.get(key),
        (Value::Object(map), PathSegment::Index(idx)) => map.get(&idx.to_string()),
        (Value::Array(items), PathSegment::Index(idx)) => items.get(*idx),
        (Value::Array(items), PathSegment::Field(key)) => {
            key.parse::<usize>().ok().and_then(|idx| items.get(idx))
        }
        _ => None,
    })
}

/// Writes `value` at `name`, creating intermediate containers as needed.
///
/// Missing levels become arrays when the next segment is an index and objects
/// otherwise. Scalars standing in the way are replaced. Arrays are padded with
/// `null` up to the written index. Writing the root name replaces the tree.
///
/// A non-numeric field segment addressed into an existing array replaces
/// that array with an object holding only the written key; the written shape
/// wins over the old one, as it does for scalars.
pub fn set(tree: &mut Value, name: &FieldName, value: Value) {
    let segments: Vec<&PathSegment> = name.segments().collect();
    let Some((last, parents)) = segments.split_last() else {
        *tree = value;
        return;
    };

    let mut node = tree;
    for (depth, segment) in parents.iter().enumerate() {
        let next = segments[depth + 1];
        node = child_mut(node, segment, next);
    }
    *slot_mut(node, last) = value;
}

/// Removes the value at `name`, returning it if it was present.
pub fn remove(tree: &mut Value, name: &FieldName) -> Option<Value> {
    let last = name.last()?.clone();
    let parent = name.parent().unwrap_or_default();

    let mut node = tree;
    for segment in parent.segments() {
        node = match (node, segment) {
            (Value::Object(map), PathSegment::Field(key)) => map.get_mut(key)?,
            (Value::Object(map), PathSegment::Index(idx)) => map.get_mut(&idx.to_string())?,
            (Value::Array(items), PathSegment::Index(idx)) => items.get_mut(*idx)?,
            (Value::Array(items), PathSegment::Field(key)) => {
                items.get_mut(key.parse::<usize>().ok()?)?
            }
            _ => return None,
        };
    }

    match (node, &last) {
        (Value::Object(map), PathSegment::Field(key)) => map.remove(key),
        (Value::Object(map), PathSegment::Index(idx)) => map.remove(&idx.to_string()),
        (Value::Array(items), PathSegment::Index(idx)) if *idx < items.len() => {
            Some(std::mem::replace(&mut items[*idx], Value::Null))
        }
        _ => None,
    }
}

/// Flattens a (partial) tree into its leaf locations.
///
/// Non-empty objects are walked; arrays, scalars and empty objects are leaves.
/// A non-object root is reported as a single root leaf.
///
/// ```rust
/// use formfield::path::leaves;
/// use serde_json::json;
///
/// let names: Vec<String> = leaves(&json!({"a": 1, "b": {"c": [1, 2]}}))
///     .into_iter()
///     .map(|(name, _)| name.serialize())
///     .collect();
/// assert_eq!(names, vec!["a", "b.c"]);
/// ```
pub fn leaves(tree: &Value) -> Vec<(FieldName, Value)> {
    let mut out = Vec::new();
    collect_leaves(tree, &FieldName::root(), &mut out);
    out
}

fn collect_leaves(node: &Value, prefix: &FieldName, out: &mut Vec<(FieldName, Value)>) {
    match node {
        Value::Object(map) if !map.is_empty() => {
            for (key, child) in map {
                collect_leaves(child, &prefix.push_field(key.clone()), out);
            }
        }
        other => out.push((prefix.clone(), other.clone())),
    }
}

fn empty_container_for(next: &PathSegment) -> Value {
    match next {
        PathSegment::Index(_) => Value::Array(Vec::new()),
        PathSegment::Field(_) => Value::Object(Map::new()),
    }
}

fn child_mut<'a>(node: &'a mut Value, segment: &PathSegment, next: &PathSegment) -> &'a mut Value {
    let slot = slot_mut(node, segment);
    if !slot.is_object() && !slot.is_array() {
        *slot = empty_container_for(next);
    }
    slot
}

/// Returns the slot addressed by `segment`, converting `node` into a container if needed.
///
/// An array addressed by a non-numeric key is replaced by an empty object.
fn slot_mut<'a>(node: &'a mut Value, segment: &PathSegment) -> &'a mut Value {
    let array_index = match (&*node, segment) {
        (Value::Array(_), PathSegment::Index(idx)) => Some(*idx),
        (Value::Array(_), PathSegment::Field(key)) => key.parse::<usize>().ok(),
        _ => None,
    };
    if array_index.is_none() && !node.is_object() {
        *node = Value::Object(Map::new());
    }

    match (node, array_index) {
        (Value::Array(items), Some(idx)) => {
            if items.len() <= idx {
                items.resize(idx + 1, Value::Null);
            }
            &mut items[idx]
        }
        (Value::Object(map), _) => map.entry(segment.to_string()).or_insert(Value::Null),
        _ => unreachable!("node is normalized to an array with an index or an object"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_root_name_is_empty() {
        let name = FieldName::root();
        assert!(name.is_root());
        assert!(name.is_empty());
        assert_eq!(name.len(), 0);
        assert_eq!(name.to_string(), "");
    }

    #[test]
    fn test_single_key_keeps_dots() {
        let name = FieldName::from("index.number_of_shards");
        assert_eq!(name.len(), 1);
        assert_eq!(name.serialize(), "index.number_of_shards");
    }

    #[test]
    fn test_numeric_segments_serialize_plain() {
        let name = FieldName::root()
            .push_field("aliases")
            .push_index(3)
            .push_field("name");
        assert_eq!(name.serialize(), "aliases.3.name");
    }

    #[test]
    fn test_parse_dotted() {
        let name = FieldName::parse("a.10.b");
        let segments: Vec<_> = name.segments().collect();
        assert_eq!(segments[0], &PathSegment::field("a"));
        assert_eq!(segments[1], &PathSegment::index(10));
        assert_eq!(segments[2], &PathSegment::field("b"));
        assert!(FieldName::parse("").is_root());
    }

    #[test]
    fn test_parent_and_last() {
        let name = FieldName::from(["a", "b"]);
        assert_eq!(name.parent().unwrap(), FieldName::from("a"));
        assert_eq!(name.last(), Some(&PathSegment::field("b")));
        assert!(FieldName::root().parent().is_none());
    }

    #[test]
    fn test_starts_with() {
        let name = FieldName::from(["settings", "index", "refresh"]);
        assert!(name.starts_with(&FieldName::from("settings")));
        assert!(name.starts_with(&name));
        assert!(!name.starts_with(&FieldName::from("index")));
    }

    #[test]
    fn test_get_missing_is_none() {
        assert_eq!(get(&json!({}), &FieldName::from(["a", "b"])), None);
        assert_eq!(get(&Value::Null, &FieldName::from("a")), None);
        assert_eq!(get(&json!({"a": 1}), &FieldName::from(["a", "b"])), None);
    }

    #[test]
    fn test_set_creates_objects() {
        let mut tree = json!({});
        set(&mut tree, &FieldName::from(["a", "b", "c"]), json!(1));
        assert_eq!(tree, json!({"a": {"b": {"c": 1}}}));
    }

    #[test]
    fn test_set_creates_arrays_for_indices() {
        let mut tree = json!({});
        set(
            &mut tree,
            &FieldName::root().push_field("list").push_index(2),
            json!("x"),
        );
        assert_eq!(tree, json!({"list": [null, null, "x"]}));
    }

    #[test]
    fn test_set_replaces_scalar_intermediate() {
        let mut tree = json!({"a": 5});
        set(&mut tree, &FieldName::from(["a", "b"]), json!(true));
        assert_eq!(tree, json!({"a": {"b": true}}));
    }

    #[test]
    fn test_set_field_key_replaces_array() {
        let mut tree = json!({"aliases": ["a", "b"]});
        set(&mut tree, &FieldName::from(["aliases", "1"]), json!("c"));
        assert_eq!(tree, json!({"aliases": ["a", "c"]}));

        set(&mut tree, &FieldName::from(["aliases", "primary"]), json!("c"));
        assert_eq!(tree, json!({"aliases": {"primary": "c"}}));
    }

    #[test]
    fn test_set_root_replaces_tree() {
        let mut tree = json!({"a": 1});
        set(&mut tree, &FieldName::root(), json!({"b": 2}));
        assert_eq!(tree, json!({"b": 2}));
    }

    #[test]
    fn test_index_segment_reads_object_key() {
        let tree = json!({"a": {"0": "zero"}});
        let name = FieldName::root().push_field("a").push_index(0);
        assert_eq!(get(&tree, &name), Some(&json!("zero")));
    }

    #[test]
    fn test_numeric_field_reads_array() {
        let tree = json!({"a": ["first"]});
        assert_eq!(get(&tree, &FieldName::from(["a", "0"])), Some(&json!("first")));
    }

    #[test]
    fn test_remove() {
        let mut tree = json!({"a": {"b": 1, "c": 2}});
        assert_eq!(remove(&mut tree, &FieldName::from(["a", "b"])), Some(json!(1)));
        assert_eq!(tree, json!({"a": {"c": 2}}));
        assert_eq!(remove(&mut tree, &FieldName::from(["x", "y"])), None);
    }

    #[test]
    fn test_leaves_treat_arrays_as_values() {
        let found = leaves(&json!({"a": {"b": 1}, "c": [1, 2], "d": {}}));
        let names: Vec<String> = found.iter().map(|(n, _)| n.serialize()).collect();
        assert_eq!(names, vec!["a.b", "c", "d"]);
        assert_eq!(found[1].1, json!([1, 2]));
    }
}
