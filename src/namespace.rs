use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{LayerfigError, display_value};

/// The result of a parse: one entry per output key.
///
/// Keys of items whose default is [`ItemDefault::Omit`](crate::ItemDefault::Omit)
/// and that were never mentioned are missing; every other key is present,
/// with `null` standing for "never resolved".
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Namespace {
    values: BTreeMap<String, Value>,
}

impl Namespace {
    pub(crate) fn new(values: BTreeMap<String, Value>) -> Self {
        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn into_inner(self) -> BTreeMap<String, Value> {
        self.values
    }

    /// The namespace as a JSON object.
    pub fn to_value(&self) -> Value {
        Value::Object(
            self.values
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }

    /// Extract a typed struct. Missing keys follow the usual serde rules, so
    /// `Option` fields cover omitted items.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, LayerfigError> {
        Ok(serde_json::from_value(self.to_value())?)
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.values.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{key} = {}", display_value(value))?;
        }
        Ok(())
    }
}

impl IntoIterator for Namespace {
    type Item = (String, Value);
    type IntoIter = std::collections::btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}
