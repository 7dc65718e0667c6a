//! Config snapshot values
//!
//! A training configuration gathered for logging is a [`ConfigMap`] of
//! [`ConfigValue`]s. Values may carry live objects (the learner,
//! callbacks) through [`ConfigValue::Object`]; those are expanded by
//! [`format_config`] before being attached to a run.
//!
//! Objects opt into expansion through the [`Describe`] capability: a
//! value either reports its stored construction arguments or it does not.

mod format;

pub use format::{format_config, format_config_value, NAME_KEY};

use std::collections::btree_map::{self, BTreeMap};
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Number, Value};

use crate::{Error, Result};

/// Capability of a value to describe how it was constructed.
///
/// `Display` gives the value's display form (recorded under `_name`
/// when the value is expanded).
pub trait Describe: fmt::Display + fmt::Debug + Send + Sync {
    /// Stored construction arguments, if this value keeps them.
    fn stored_args(&self) -> Option<ConfigMap> {
        None
    }
}

/// One value of a config snapshot.
#[derive(Debug, Clone)]
pub enum ConfigValue {
    /// Absent value
    Null,
    /// Boolean flag
    Bool(bool),
    /// Integer
    Int(i64),
    /// Floating point number
    Float(f64),
    /// String
    Str(String),
    /// Ordered list
    List(Vec<ConfigValue>),
    /// Nested mapping
    Map(ConfigMap),
    /// Live object, expanded by [`format_config_value`]
    Object(Arc<dyn Describe>),
}

impl ConfigValue {
    /// Wrap a describable object.
    #[must_use]
    pub fn object(value: impl Describe + 'static) -> Self {
        Self::Object(Arc::new(value))
    }

    /// Borrow the nested map, if this is one.
    #[must_use]
    pub const fn as_map(&self) -> Option<&ConfigMap> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Convert to JSON for storage under `key`.
    ///
    /// Strict conversion refuses values without a faithful JSON form
    /// (non-finite floats, unexpanded objects). Lenient conversion
    /// stores their display form instead.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParam`] naming the offending key path in
    /// strict mode.
    pub fn to_json(&self, key: &str, strict: bool) -> Result<Value> {
        let value = match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Int(i) => Value::from(*i),
            Self::Float(f) => match Number::from_f64(*f) {
                Some(number) => Value::Number(number),
                None if strict => return Err(invalid(key, format!("non-finite float {f}"))),
                None => Value::String(f.to_string()),
            },
            Self::Str(s) => Value::String(s.clone()),
            Self::List(items) => Value::Array(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| item.to_json(&format!("{key}[{i}]"), strict))
                    .collect::<Result<_>>()?,
            ),
            Self::Map(map) => Value::Object(map.to_json(key, strict)?),
            Self::Object(obj) if strict => {
                return Err(invalid(
                    key,
                    format!("object `{obj}` has no JSON form; format the config first"),
                ))
            }
            Self::Object(obj) => Value::String(obj.to_string()),
        };
        Ok(value)
    }
}

fn invalid(key: &str, reason: String) -> Error {
    Error::InvalidParam {
        key: key.to_string(),
        reason,
    }
}

impl PartialEq for ConfigValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => {
                Arc::ptr_eq(a, b) || (a.to_string() == b.to_string() && a.stored_args() == b.stored_args())
            }
            _ => false,
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Str(s) => f.write_str(s),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Map(map) => write!(f, "{map}"),
            Self::Object(obj) => write!(f, "{obj}"),
        }
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for ConfigValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u64> for ConfigValue {
    #[allow(clippy::cast_precision_loss)]
    fn from(value: u64) -> Self {
        i64::try_from(value).map_or(Self::Float(value as f64), Self::Int)
    }
}

impl From<usize> for ConfigValue {
    fn from(value: usize) -> Self {
        Self::from(value as u64)
    }
}

impl From<f64> for ConfigValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<ConfigMap> for ConfigValue {
    fn from(value: ConfigMap) -> Self {
        Self::Map(value)
    }
}

impl<T: Into<Self>> From<Vec<T>> for ConfigValue {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Self>> From<Option<T>> for ConfigValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Config snapshot: keys mapped to [`ConfigValue`]s, kept in key order.
///
/// Structured keys such as `("dls", "after_item")` are stored as nested
/// maps via [`ConfigMap::insert_path`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigMap(BTreeMap<String, ConfigValue>);

impl ConfigMap {
    /// Create an empty map.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Insert a top-level entry, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ConfigValue>) -> Option<ConfigValue> {
        self.0.insert(key.into(), value.into())
    }

    /// Insert under a structured key, creating intermediate maps.
    ///
    /// A non-map value sitting on an intermediate segment is replaced.
    /// An empty path is ignored.
    pub fn insert_path(&mut self, path: &[&str], value: impl Into<ConfigValue>) {
        let Some((last, parents)) = path.split_last() else {
            return;
        };
        let mut map = self;
        for segment in parents {
            let slot = map
                .0
                .entry((*segment).to_string())
                .or_insert_with(|| ConfigValue::Map(Self::new()));
            if !matches!(slot, ConfigValue::Map(_)) {
                *slot = ConfigValue::Map(Self::new());
            }
            map = match slot {
                ConfigValue::Map(inner) => inner,
                _ => unreachable!("slot was just made a map"),
            };
        }
        map.0.insert((*last).to_string(), value.into());
    }

    /// Look up a top-level entry.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.0.get(key)
    }

    /// Look up an entry under a structured key.
    #[must_use]
    pub fn get_path(&self, path: &[&str]) -> Option<&ConfigValue> {
        let (last, parents) = path.split_last()?;
        let mut map = self;
        for segment in parents {
            map = map.get(segment)?.as_map()?;
        }
        map.get(last)
    }

    /// True if a top-level key is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Remove a top-level entry.
    pub fn remove(&mut self, key: &str) -> Option<ConfigValue> {
        self.0.remove(key)
    }

    /// Number of top-level entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate top-level entries in key order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, ConfigValue> {
        self.0.iter()
    }

    /// Top-level keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Convert to a JSON object; nested keys are reported as `key.inner`.
    ///
    /// # Errors
    ///
    /// See [`ConfigValue::to_json`].
    pub fn to_json(&self, prefix: &str, strict: bool) -> Result<Map<String, Value>> {
        self.iter()
            .map(|(key, value)| {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                value.to_json(&path, strict).map(|json| (key.clone(), json))
            })
            .collect()
    }
}

impl fmt::Display for ConfigMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (key, value)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key}: {value}")?;
        }
        f.write_str("}")
    }
}

impl<K: Into<String>, V: Into<ConfigValue>> FromIterator<(K, V)> for ConfigMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl<K: Into<String>, V: Into<ConfigValue>> Extend<(K, V)> for ConfigMap {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.0.extend(iter.into_iter().map(|(k, v)| (k.into(), v.into())));
    }
}

impl IntoIterator for ConfigMap {
    type Item = (String, ConfigValue);
    type IntoIter = btree_map::IntoIter<String, ConfigValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ConfigMap {
    type Item = (&'a String, &'a ConfigValue);
    type IntoIter = btree_map::Iter<'a, String, ConfigValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Opaque;

    impl fmt::Display for Opaque {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("Opaque()")
        }
    }

    impl Describe for Opaque {}

    #[test]
    fn test_insert_path_nests() {
        let mut config = ConfigMap::new();
        config.insert_path(&["dls", "after_item"], "ToTensor");
        config.insert_path(&["dls", "after_batch"], "IntToFloatTensor");

        let dls = config.get("dls").and_then(ConfigValue::as_map).unwrap();
        assert_eq!(dls.len(), 2);
        assert_eq!(
            config.get_path(&["dls", "after_item"]),
            Some(&ConfigValue::from("ToTensor"))
        );
    }

    #[test]
    fn test_insert_path_replaces_scalar_parent() {
        let mut config = ConfigMap::new();
        config.insert("dataset", 1);
        config.insert_path(&["dataset", "tfms"], "Pipeline");
        assert_eq!(
            config.get_path(&["dataset", "tfms"]),
            Some(&ConfigValue::from("Pipeline"))
        );
    }

    #[test]
    fn test_strict_json_rejects_objects_and_nan() {
        let mut config = ConfigMap::new();
        config.insert("model", ConfigValue::object(Opaque));
        let err = config.to_json("", true).unwrap_err();
        assert!(err.to_string().contains("model"));

        let nan = ConfigValue::from(f64::NAN);
        assert!(nan.to_json("lr", true).is_err());
    }

    #[test]
    fn test_lenient_json_uses_display_form() {
        let mut config = ConfigMap::new();
        config.insert("model", ConfigValue::object(Opaque));
        config.insert("lr", f64::INFINITY);
        let json = config.to_json("", false).unwrap();
        assert_eq!(json["model"], Value::from("Opaque()"));
        assert_eq!(json["lr"], Value::from("inf"));
    }

    #[test]
    fn test_u64_overflow_becomes_float() {
        assert_eq!(ConfigValue::from(7_u64), ConfigValue::Int(7));
        assert!(matches!(ConfigValue::from(u64::MAX), ConfigValue::Float(_)));
    }
}
