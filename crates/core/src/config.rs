//! Read-only run configuration with prefix-scoped views.

use std::collections::BTreeMap;
use std::sync::Arc;

/// Explicit list of feature locations; short-circuits selector resolution.
pub const FEATURES_PROPERTY_NAME: &str = "cucumber.features";

/// Regular expression scenarios must match to be discovered.
pub const FILTER_NAME_PROPERTY_NAME: &str = "cucumber.filter.name";

/// Selects the parallel executor when `true`.
pub const PARALLEL_EXECUTION_ENABLED_PROPERTY_NAME: &str = "cucumber.execution.parallel.enabled";

/// Prefix of every key visible to the parallel executor.
pub const PARALLEL_CONFIG_PREFIX: &str = "cucumber.execution.parallel.config.";

/// Errors raised when a configuration value has the wrong shape.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A value is present but cannot be interpreted
    #[error("invalid value '{value}' for '{key}': expected {expected}")]
    InvalidValue {
        /// Fully-qualified key
        key: String,
        /// Raw value
        value: String,
        /// What the slot accepts
        expected: &'static str,
    },

    /// A value required by another setting is absent
    #[error("missing value for '{key}'")]
    MissingValue {
        /// Fully-qualified key
        key: String,
    },

    /// JSON input could not be read
    #[error("JSON error: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// JSON input had a shape that cannot become a flat key/value map
    #[error("unsupported configuration: {0}")]
    Unsupported(String),
}

/// Result alias for configuration lookups.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// An immutable key/value view over the run configuration.
///
/// Cloning and scoping share the underlying map, so a view handed out once
/// resolves every key identically for the whole run.
#[derive(Debug, Clone, Default)]
pub struct Configuration {
    values: Arc<BTreeMap<String, String>>,
    prefix: String,
}

impl Configuration {
    /// Create a view over an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a view from key/value pairs. Later duplicates win.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let values = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            values: Arc::new(values),
            prefix: String::new(),
        }
    }

    /// Build a view from a flat JSON object.
    ///
    /// Strings, booleans and numbers are accepted as values.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let serde_json::Value::Object(map) = value else {
            return Err(ConfigError::Unsupported("top level must be an object".to_string()));
        };

        let mut values = BTreeMap::new();
        for (key, value) in map {
            let raw = match value {
                serde_json::Value::String(s) => s,
                serde_json::Value::Bool(b) => b.to_string(),
                serde_json::Value::Number(n) => n.to_string(),
                other => {
                    return Err(ConfigError::Unsupported(format!(
                        "value of '{}' must be a string, boolean or number, got {}",
                        key, other
                    )))
                }
            };
            values.insert(key, raw);
        }

        Ok(Self {
            values: Arc::new(values),
            prefix: String::new(),
        })
    }

    /// A view in which every lookup is prefixed with `prefix`.
    ///
    /// Scoping composes: `scoped("a.").scoped("b.")` reads `a.b.*`.
    pub fn scoped(&self, prefix: &str) -> Self {
        Self {
            values: Arc::clone(&self.values),
            prefix: format!("{}{}", self.prefix, prefix),
        }
    }

    /// `key` as stored in the underlying map.
    pub fn qualify(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    /// Raw value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(&self.qualify(key)).map(String::as_str)
    }

    /// Raw value for `key`, or `default` when absent.
    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    /// Value for `key` when present and not blank.
    pub fn get_non_blank(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.trim().is_empty())
    }

    /// Boolean value for `key`; `true`/`false`, case-insensitive.
    pub fn get_bool(&self, key: &str) -> Result<Option<bool>> {
        let Some(raw) = self.get(key) else {
            return Ok(None);
        };
        match raw.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(Some(true)),
            "false" => Ok(Some(false)),
            _ => Err(self.invalid(key, raw, "a boolean")),
        }
    }

    /// Boolean value for `key`, or `default` when absent.
    pub fn get_bool_or(&self, key: &str, default: bool) -> Result<bool> {
        Ok(self.get_bool(key)?.unwrap_or(default))
    }

    /// Unsigned integer value for `key`.
    pub fn get_usize(&self, key: &str) -> Result<Option<usize>> {
        self.get(key)
            .map(|raw| {
                raw.trim()
                    .parse::<usize>()
                    .map_err(|_| self.invalid(key, raw, "an unsigned integer"))
            })
            .transpose()
    }

    /// Floating point value for `key`.
    pub fn get_f64(&self, key: &str) -> Result<Option<f64>> {
        self.get(key)
            .map(|raw| {
                raw.trim()
                    .parse::<f64>()
                    .map_err(|_| self.invalid(key, raw, "a number"))
            })
            .transpose()
    }

    /// Keys visible through this view, with the prefix stripped.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.values
            .keys()
            .filter_map(move |k| k.strip_prefix(self.prefix.as_str()))
    }

    /// Whether two views share the same underlying map.
    pub fn same_source(&self, other: &Configuration) -> bool {
        Arc::ptr_eq(&self.values, &other.values)
    }

    fn invalid(&self, key: &str, raw: &str, expected: &'static str) -> ConfigError {
        ConfigError::InvalidValue {
            key: self.qualify(key),
            value: raw.to_string(),
            expected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Configuration {
        Configuration::from_pairs([
            ("cucumber.execution.parallel.enabled", "TRUE"),
            ("cucumber.execution.parallel.config.strategy", "fixed"),
            ("cucumber.execution.parallel.config.fixed.parallelism", "4"),
            ("cucumber.features", "  "),
            ("strategy", "top-level"),
        ])
    }

    #[test]
    fn test_get_and_default() {
        let config = config();
        assert_eq!(config.get("strategy"), Some("top-level"));
        assert_eq!(config.get("missing"), None);
        assert_eq!(config.get_or("missing", "fallback"), "fallback");
        assert_eq!(config.get_non_blank(FEATURES_PROPERTY_NAME), None);
    }

    #[test]
    fn test_bool_interpretation() {
        let config = config();
        assert!(config.get_bool_or(PARALLEL_EXECUTION_ENABLED_PROPERTY_NAME, false).unwrap());
        assert!(!config.get_bool_or("missing", false).unwrap());

        let bad = Configuration::from_pairs([("flag", "yes")]);
        let err = bad.get_bool("flag").unwrap_err();
        assert!(err.to_string().contains("'flag'"));
    }

    #[test]
    fn test_scoped_view_isolates_keys() {
        let config = config();
        let scoped = config.scoped(PARALLEL_CONFIG_PREFIX);

        assert_eq!(scoped.get("strategy"), Some("fixed"));
        assert_eq!(scoped.get_usize("fixed.parallelism").unwrap(), Some(4));
        assert_eq!(scoped.get(PARALLEL_EXECUTION_ENABLED_PROPERTY_NAME), None);

        let mut keys: Vec<_> = scoped.keys().collect();
        keys.sort();
        assert_eq!(keys, vec!["fixed.parallelism", "strategy"]);
        assert!(scoped.same_source(&config));
    }

    #[test]
    fn test_scoped_error_names_full_key() {
        let config = Configuration::from_pairs([("a.b.factor", "lots")]);
        let err = config.scoped("a.").scoped("b.").get_f64("factor").unwrap_err();
        assert!(err.to_string().contains("'a.b.factor'"));
    }

    #[test]
    fn test_from_json() {
        let config = Configuration::from_json(
            r#"{"cucumber.execution.parallel.enabled": true, "cucumber.execution.parallel.config.dynamic.factor": 1.5}"#,
        )
        .unwrap();
        assert_eq!(config.get_bool(PARALLEL_EXECUTION_ENABLED_PROPERTY_NAME).unwrap(), Some(true));
        assert_eq!(
            config.scoped(PARALLEL_CONFIG_PREFIX).get_f64("dynamic.factor").unwrap(),
            Some(1.5)
        );

        assert!(matches!(
            Configuration::from_json(r#"{"a": [1]}"#),
            Err(ConfigError::Unsupported(_))
        ));
        assert!(matches!(
            Configuration::from_json("[]"),
            Err(ConfigError::Unsupported(_))
        ));
    }
}
