use std::collections::BTreeMap;

use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Deserialize, Serialize, Serializer};

use crate::value::Value;

/// Unvalidated input row keyed by column name.
pub type RawRecord = BTreeMap<String, Value>;

/// Category of a field error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The parse transform rejected the raw value.
    ParseFailed,
    TypeMismatch,
    /// The value is not a member of the allowed set.
    NotOneOf,
    Required,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ParseFailed => "parse_failed",
            ErrorKind::TypeMismatch => "type_mismatch",
            ErrorKind::NotOneOf => "not_one_of",
            ErrorKind::Required => "required",
        }
    }
}

/// Error attached to a single field result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub kind: ErrorKind,
    pub message: String,
}

/// Parsed value of one field with its optional error.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldResult {
    pub value: Value,
    pub error: Option<FieldError>,
}

impl FieldResult {
    pub fn valid(value: Value) -> Self {
        Self { value, error: None }
    }

    pub fn invalid(value: Value, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            value,
            error: Some(FieldError {
                kind,
                message: message.into(),
            }),
        }
    }

    pub fn message(&self) -> Option<&str> {
        self.error.as_ref().map(|error| error.message.as_str())
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(|error| error.kind)
    }

    /// True when the result carries a non-empty error message.
    pub fn has_error(&self) -> bool {
        self.message().is_some_and(|message| !message.is_empty())
    }
}

impl Serialize for FieldResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = if self.error.is_some() { 3 } else { 1 };
        let mut state = serializer.serialize_struct("FieldResult", len)?;
        state.serialize_field("value", &self.value)?;
        if let Some(error) = &self.error {
            state.serialize_field("error", &error.message)?;
            state.serialize_field("error_kind", &error.kind)?;
        }
        state.end()
    }
}

/// One-level group of outputs sharing a `parent` key.
#[derive(Debug, Clone, PartialEq)]
pub struct Group<T> {
    members: Vec<(String, T)>,
}

impl<T> Group<T> {
    pub fn new() -> Self {
        Self {
            members: Vec::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        self.members
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: T) {
        let key = key.into();
        match self.members.iter_mut().find(|(name, _)| *name == key) {
            Some((_, slot)) => *slot = value,
            None => self.members.push((key, value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.members
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl<T> Default for Group<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Top-level slot of a record: a flat field or a group.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry<T> {
    Field(T),
    Group(Group<T>),
}

impl<T> Entry<T> {
    pub fn as_field(&self) -> Option<&T> {
        match self {
            Entry::Field(value) => Some(value),
            Entry::Group(_) => None,
        }
    }

    pub fn as_group(&self) -> Option<&Group<T>> {
        match self {
            Entry::Field(_) => None,
            Entry::Group(group) => Some(group),
        }
    }
}

/// Insertion-ordered record of output entries.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordMap<T> {
    entries: Vec<(String, Entry<T>)>,
}

/// Per-field results for one input record.
pub type AnnotatedRecord = RecordMap<FieldResult>;

/// Bare parsed values for one input record.
pub type ParsedRecord = RecordMap<Value>;

impl<T> RecordMap<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Entry<T>> {
        self.entries
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, entry)| entry)
    }

    /// Flat field stored at `key`.
    pub fn field(&self, key: &str) -> Option<&T> {
        self.get(key).and_then(Entry::as_field)
    }

    pub fn group(&self, key: &str) -> Option<&Group<T>> {
        self.get(key).and_then(Entry::as_group)
    }

    /// Member `prop` of the group stored at `parent`.
    pub fn nested(&self, parent: &str, prop: &str) -> Option<&T> {
        self.group(parent).and_then(|group| group.get(prop))
    }

    /// Store a flat field, replacing any entry already at `key` in place.
    pub fn set_field(&mut self, key: impl Into<String>, value: T) {
        self.put(key.into(), Entry::Field(value));
    }

    /// Merge `value` into the group at `parent`; a flat field at `parent` is
    /// replaced by a fresh group.
    pub fn set_in_group(&mut self, parent: impl Into<String>, prop: impl Into<String>, value: T) {
        let parent = parent.into();
        if let Some((_, Entry::Group(group))) =
            self.entries.iter_mut().find(|(name, _)| *name == parent)
        {
            group.insert(prop, value);
            return;
        }

        let mut group = Group::new();
        group.insert(prop, value);
        self.put(parent, Entry::Group(group));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Entry<T>)> {
        self.entries
            .iter()
            .map(|(name, entry)| (name.as_str(), entry))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn put(&mut self, key: String, entry: Entry<T>) {
        match self.entries.iter_mut().find(|(name, _)| *name == key) {
            Some((_, slot)) => *slot = entry,
            None => self.entries.push((key, entry)),
        }
    }
}

impl<T> Default for RecordMap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl AnnotatedRecord {
    /// Shallow error check over the top-level entries.
    ///
    /// A group is looked at as a plain object: it only counts as erroneous
    /// when it holds a member literally named `error`.
    pub fn has_top_level_error(&self) -> bool {
        self.entries.iter().any(|(_, entry)| match entry {
            Entry::Field(result) => result.has_error(),
            Entry::Group(group) => group.get("error").is_some(),
        })
    }
}

impl<T: Serialize> Serialize for Group<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.members.len()))?;
        for (key, value) in &self.members {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<T: Serialize> Serialize for Entry<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Entry::Field(value) => value.serialize(serializer),
            Entry::Group(group) => group.serialize(serializer),
        }
    }
}

impl<T: Serialize> Serialize for RecordMap<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, entry) in &self.entries {
            map.serialize_entry(key, entry)?;
        }
        map.end()
    }
}

/// Flat diagnostic entry for one failed field of one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEntry {
    /// Ordinal of the record in the input batch.
    pub index: usize,
    /// Schema field key (not the output prop).
    pub key: String,
    pub error: String,
    pub kind: ErrorKind,
}
