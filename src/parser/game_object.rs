use std::{fmt::Debug, rc::Rc};

use indexmap::{map::Iter as IndexMapIter, IndexMap};

/// A type alias for a game string.
/// Roughly meant to represent a raw string from a save file, reference counted so that it exists once in memory.
pub type GameString = Rc<String>;

/// The reserved key under which bare, non-keyed values inside a block
/// are collected, in encounter order. The save format writes implicit
/// lists like `historical={ 1 2 3 }` and this is where they end up.
pub const ANONYMOUS_KEY: &str = "__items";

/// A value that comes from a save file.
///
/// The format is loosely typed at the syntax level: numeric and boolean
/// looking fields are frequently consumed as text by callers, which is
/// why [SaveFileValue::as_string] coerces. All accessors return
/// [Option] instead of panicking; a missing or mistyped field is an
/// absent statistic, never a crash.
#[derive(PartialEq, Clone, Debug)]
pub enum SaveFileValue {
    /// A simple string value, may be anything in reality.
    String(GameString),
    /// A numeric value. Always a 64-bit float, even for integer-looking text.
    Real(f64),
    /// A boolean, only ever produced from the bare identifiers `yes`/`no`.
    Boolean(bool),
    /// A complex object value.
    Object(GameObjectMap),
    /// An ordered sequence, possibly heterogeneous.
    Array(Vec<SaveFileValue>),
}

impl SaveFileValue {
    /// Get the value as a string.
    /// Strings are returned directly; booleans and reals coerce to
    /// their textual form (`yes`/`no`, display formatting).
    pub fn as_string(&self) -> Option<GameString> {
        match self {
            SaveFileValue::String(s) => Some(s.clone()),
            SaveFileValue::Boolean(b) => {
                Some(GameString::new(if *b { "yes" } else { "no" }.to_owned()))
            }
            SaveFileValue::Real(r) => Some(GameString::new(format!("{}", r))),
            _ => None,
        }
    }

    /// Get the value as a number. Exact: no parsing of string values.
    pub fn as_real(&self) -> Option<f64> {
        match self {
            SaveFileValue::Real(r) => Some(*r),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            SaveFileValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Get the value as an object map.
    pub fn as_object(&self) -> Option<&GameObjectMap> {
        match self {
            SaveFileValue::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<SaveFileValue>> {
        match self {
            SaveFileValue::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Cardinality normalization. The format writes one occurrence as a
    /// bare object and multiple occurrences as a list of objects;
    /// callers must treat both uniformly. A lone object yields a
    /// one-element sequence, an array yields its object elements
    /// (anything else in it is dropped), any other value yields nothing.
    pub fn as_object_list(&self) -> Vec<&GameObjectMap> {
        match self {
            SaveFileValue::Object(o) => vec![o],
            SaveFileValue::Array(arr) => arr.iter().filter_map(|v| v.as_object()).collect(),
            _ => Vec::new(),
        }
    }
}

/// A game object that stores values as an ordered map.
///
/// Keys are unique: a second assignment to an existing key converts the
/// slot into an [SaveFileValue::Array] accumulating every value under
/// that key in encounter order, so held values are never discarded.
/// This is where the multi-key feature of the save file format lives.
#[derive(PartialEq, Clone, Default)]
pub struct GameObjectMap {
    inner: IndexMap<String, SaveFileValue>,
}

impl GameObjectMap {
    /// Create a new empty GameObjectMap
    pub fn new() -> Self {
        GameObjectMap {
            inner: IndexMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Get the value of a key
    pub fn get(&self, key: &str) -> Option<&SaveFileValue> {
        self.inner.get(key)
    }

    /// Single level typed lookups, for convenience.
    pub fn get_string(&self, key: &str) -> Option<GameString> {
        self.get(key).and_then(|v| v.as_string())
    }

    pub fn get_real(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(|v| v.as_real())
    }

    pub fn get_boolean(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|v| v.as_boolean())
    }

    pub fn get_object(&self, key: &str) -> Option<&GameObjectMap> {
        self.get(key).and_then(|v| v.as_object())
    }

    /// Walk successive object lookups. Absent as soon as any
    /// intermediate value is missing or is not an object.
    pub fn get_path(&self, keys: &[&str]) -> Option<&SaveFileValue> {
        let (first, rest) = keys.split_first()?;
        let mut current = self.get(first)?;
        for key in rest {
            current = current.as_object()?.get(key)?;
        }
        Some(current)
    }

    pub fn get_path_string(&self, keys: &[&str]) -> Option<GameString> {
        self.get_path(keys).and_then(|v| v.as_string())
    }

    pub fn get_path_real(&self, keys: &[&str]) -> Option<f64> {
        self.get_path(keys).and_then(|v| v.as_real())
    }

    /// Insert a new value into the object.
    /// If the key already exists, the value at that key alongside the new value will be stored in an array at that key.
    /// Thus held values are never discarded and here the multi key feature of the save file format is implemented.
    pub fn insert(&mut self, key: String, value: SaveFileValue) {
        match self.inner.get_mut(&key) {
            Some(SaveFileValue::Array(arr)) => {
                arr.push(value);
            }
            Some(val) => {
                let arr = vec![val.clone(), value];
                self.inner.insert(key, SaveFileValue::Array(arr));
            }
            None => {
                self.inner.insert(key, value);
            }
        }
    }

    /// Append a bare, non-keyed value to the reserved anonymous list.
    pub fn push_anonymous(&mut self, value: SaveFileValue) {
        match self.inner.get_mut(ANONYMOUS_KEY) {
            Some(SaveFileValue::Array(arr)) => {
                arr.push(value);
            }
            Some(val) => {
                // shouldn't happen, but be safe
                let arr = vec![val.clone(), value];
                self.inner
                    .insert(ANONYMOUS_KEY.to_owned(), SaveFileValue::Array(arr));
            }
            None => {
                self.inner
                    .insert(ANONYMOUS_KEY.to_owned(), SaveFileValue::Array(vec![value]));
            }
        }
    }
}

impl<'a> IntoIterator for &'a GameObjectMap {
    type Item = (&'a String, &'a SaveFileValue);
    type IntoIter = IndexMapIter<'a, String, SaveFileValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}

impl Debug for GameObjectMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "GameObjectMap({:?})", self.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn string_val(s: &str) -> SaveFileValue {
        SaveFileValue::String(GameString::new(s.to_owned()))
    }

    #[test]
    fn test_insert_folds_duplicates() {
        let mut obj = GameObjectMap::new();
        obj.insert("key".to_owned(), string_val("value"));
        assert_eq!(*obj.get_string("key").unwrap(), "value".to_owned());
        obj.insert("key".to_owned(), string_val("value2"));
        obj.insert("key".to_owned(), string_val("value3"));
        let arr = obj.get("key").unwrap().as_array().unwrap();
        assert_eq!(arr.len(), 3);
        assert_eq!(*arr[0].as_string().unwrap(), "value".to_owned());
        assert_eq!(*arr[2].as_string().unwrap(), "value3".to_owned());
    }

    #[test]
    fn test_anonymous_items_order() {
        let mut obj = GameObjectMap::new();
        obj.push_anonymous(SaveFileValue::Real(1.0));
        obj.push_anonymous(SaveFileValue::Real(2.0));
        let arr = obj.get(ANONYMOUS_KEY).unwrap().as_array().unwrap();
        assert_eq!(arr.len(), 2);
        assert_eq!(arr[0].as_real(), Some(1.0));
        assert_eq!(arr[1].as_real(), Some(2.0));
    }

    #[test]
    fn test_as_string_coercion() {
        assert_eq!(
            *SaveFileValue::Boolean(true).as_string().unwrap(),
            "yes".to_owned()
        );
        assert_eq!(
            *SaveFileValue::Boolean(false).as_string().unwrap(),
            "no".to_owned()
        );
        assert_eq!(*SaveFileValue::Real(7.0).as_string().unwrap(), "7".to_owned());
        assert!(SaveFileValue::Array(vec![]).as_string().is_none());
    }

    #[test]
    fn test_as_real_is_exact() {
        assert_eq!(string_val("5").as_real(), None);
        assert_eq!(SaveFileValue::Real(5.0).as_real(), Some(5.0));
    }

    #[test]
    fn test_path() {
        let mut inner = GameObjectMap::new();
        inner.insert("ruling_party".to_owned(), string_val("fascism"));
        let mut obj = GameObjectMap::new();
        obj.insert("politics".to_owned(), SaveFileValue::Object(inner));
        assert_eq!(
            *obj.get_path_string(&["politics", "ruling_party"]).unwrap(),
            "fascism".to_owned()
        );
        assert!(obj.get_path(&["politics", "missing"]).is_none());
        assert!(obj.get_path(&["missing", "ruling_party"]).is_none());
        // intermediate non-object
        assert!(obj
            .get_path(&["politics", "ruling_party", "deeper"])
            .is_none());
    }

    #[test]
    fn test_object_list_normalization() {
        let mut one = GameObjectMap::new();
        one.insert("a".to_owned(), SaveFileValue::Real(1.0));
        let lone = SaveFileValue::Object(one.clone());
        let listed = SaveFileValue::Array(vec![SaveFileValue::Object(one)]);
        let from_lone = lone.as_object_list();
        let from_list = listed.as_object_list();
        assert_eq!(from_lone.len(), 1);
        assert_eq!(from_list.len(), 1);
        assert_eq!(from_lone[0], from_list[0]);
        // non-objects are dropped, scalars yield nothing
        let mixed = SaveFileValue::Array(vec![SaveFileValue::Real(1.0)]);
        assert!(mixed.as_object_list().is_empty());
        assert!(SaveFileValue::Real(1.0).as_object_list().is_empty());
    }
}
