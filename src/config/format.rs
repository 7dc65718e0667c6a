//! Normalization of gathered config snapshots before logging.

use super::{ConfigMap, ConfigValue};

/// Key holding the display form of an expanded object.
pub const NAME_KEY: &str = "_name";

/// Recursively normalize a config snapshot.
///
/// Nested maps are normalized recursively; every other value goes
/// through [`format_config_value`].
///
/// ```rust
/// use trueno_track::config::{format_config, ConfigMap, ConfigValue};
///
/// let mut inner = ConfigMap::new();
/// inner.insert("b", 1);
/// let mut config = ConfigMap::new();
/// config.insert("a", inner);
/// config.insert("c", vec![1, 2]);
///
/// assert_eq!(format_config(config.clone()), config);
/// ```
#[must_use]
pub fn format_config(config: ConfigMap) -> ConfigMap {
    config
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                ConfigValue::Map(map) => ConfigValue::Map(format_config(map)),
                other => format_config_value(other),
            };
            (key, value)
        })
        .collect()
}

/// Normalize one config value.
///
/// - lists are normalized element-wise;
/// - an object with stored arguments becomes a map of its formatted
///   arguments plus [`NAME_KEY`] holding the object's display form;
/// - an object without stored arguments becomes its display form;
/// - everything else is returned unchanged.
#[must_use]
pub fn format_config_value(value: ConfigValue) -> ConfigValue {
    match value {
        ConfigValue::List(items) => {
            ConfigValue::List(items.into_iter().map(format_config_value).collect())
        }
        ConfigValue::Object(obj) => match obj.stored_args() {
            Some(args) => {
                let mut expanded = format_config(args);
                expanded.insert(NAME_KEY, obj.to_string());
                ConfigValue::Map(expanded)
            }
            None => ConfigValue::Str(obj.to_string()),
        },
        other => other,
    }
}
