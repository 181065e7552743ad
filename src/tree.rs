use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// An insertion-ordered mapping from key to child entry.
pub type EntryMap = IndexMap<String, Entry>;

/// A node in a parsed TNS tree.
///
/// Serializes as plain JSON: a `Leaf` is a string, an `Object` is a JSON
/// object in insertion order, a `List` is an array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Entry {
    Leaf(String),
    Object(EntryMap),
    /// Repeated sibling blocks with the same key, e.g. several `ADDRESS`
    /// entries under one `ADDRESS_LIST`. Elements are always objects when
    /// produced by the parser.
    List(Vec<Entry>),
}

impl Entry {
    /// An empty object.
    pub fn object() -> Self {
        Entry::Object(EntryMap::new())
    }

    /// An object holding a single `key = value` leaf.
    pub fn single(key: &str, value: &str) -> Self {
        let mut map = EntryMap::new();
        map.insert(key.to_string(), Entry::Leaf(value.to_string()));
        Entry::Object(map)
    }

    pub fn as_leaf(&self) -> Option<&str> {
        match self {
            Entry::Leaf(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&EntryMap> {
        match self {
            Entry::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Entry]> {
        match self {
            Entry::List(items) => Some(items),
            _ => None,
        }
    }

    /// Look up a child of an object by key.
    pub fn get(&self, key: &str) -> Option<&Entry> {
        self.as_object().and_then(|map| map.get(key))
    }

    /// Follow a sequence of object keys, e.g. `["DESCRIPTION", "CONNECT_DATA"]`.
    pub fn path(&self, keys: &[&str]) -> Option<&Entry> {
        keys.iter().try_fold(self, |node, key| node.get(key))
    }
}

impl Default for Entry {
    fn default() -> Self {
        Self::object()
    }
}

impl From<&str> for Entry {
    fn from(value: &str) -> Self {
        Entry::Leaf(value.to_string())
    }
}

/// Per-alias list of every leaf value, in the order the values were attached.
pub type SearchIndex = IndexMap<String, Vec<String>>;
