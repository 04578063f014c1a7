//! Layered option lookup: parameters, then file, then default

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::paths::{default_config_dir, resolve_config_path, DEFAULT_CONFIG_FILE};
use crate::error::{AnalyticsError, Result};
use crate::keys::{normalize_entries, normalize_key};

/// Option name to value mapping, keys in canonical form.
pub type ConfigMap = serde_json::Map<String, Value>;

/// Parameter naming the configuration file to load.
pub const CONFIG_FILE: &str = "config_file";

/// Parameter that disables file loading when truthy.
pub const IGNORE_CONFIG_FILE: &str = "ignore_config_file";

/// Return the value for `key` from the first source that contains it.
///
/// Presence decides, not truthiness: an empty string or `null` stored in an
/// earlier source still shadows later ones.
pub fn lookup<'a>(sources: &[&'a ConfigMap], key: &str) -> Option<&'a Value> {
    sources.iter().find_map(|source| source.get(key))
}

/// Resolves options from explicit parameters layered over a YAML file.
///
/// Immutable once built. Parameter keys and top-level file keys are
/// normalized with [`normalize_key`], so `configFile` and `config_file`
/// name the same option. Supplying both spellings in one source is rejected.
///
/// # Examples
///
/// ```no_run
/// use analytics_core::ConfigResolver;
/// use serde_json::json;
///
/// # fn example() -> analytics_core::Result<()> {
/// let conf = ConfigResolver::new([("org_api_key", json!("param_key"))])?;
///
/// assert_eq!(conf.option("org_api_key"), Some(&json!("param_key")));
/// let base = conf.option_or_else("api_base", || json!("https://api.learningtapestry.com"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigResolver {
    param_config: ConfigMap,
    file_config: ConfigMap,
    config_path: Option<PathBuf>,
    loaded_from_file: bool,
}

impl ConfigResolver {
    /// Build a resolver, looking for the file under `./config`.
    pub fn new<I, K>(params: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
    {
        Self::with_config_dir(params, default_config_dir())
    }

    /// Build a resolver, resolving relative config file names under `config_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Two parameter keys normalize to the same option
    /// - `config_file` is not a string
    /// - The file exists but cannot be read
    /// - The file is not valid YAML or its top level is not a mapping
    pub fn with_config_dir<I, K>(params: I, config_dir: impl AsRef<Path>) -> Result<Self>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
    {
        let param_config: ConfigMap = normalize_entries(params)?.into_iter().collect();

        if is_truthy(param_config.get(IGNORE_CONFIG_FILE)) {
            debug!("Config file loading disabled by parameters");
            return Ok(Self {
                param_config,
                ..Self::default()
            });
        }

        let file_name = match param_config.get(CONFIG_FILE) {
            None | Some(Value::Null) => DEFAULT_CONFIG_FILE.to_string(),
            Some(Value::String(name)) => name.clone(),
            Some(other) => {
                return Err(AnalyticsError::Config(format!(
                    "'{}' must be a path string, got {}",
                    CONFIG_FILE, other
                )))
            }
        };

        let path = resolve_config_path(config_dir.as_ref(), &file_name);
        let file_config = load_file(&path)?;
        let loaded_from_file = file_config.is_some();

        Ok(Self {
            param_config,
            file_config: file_config.unwrap_or_default(),
            config_path: Some(path),
            loaded_from_file,
        })
    }

    /// Value of `key` from the parameters if present, from the file otherwise.
    pub fn option(&self, key: &str) -> Option<&Value> {
        lookup(
            &[&self.param_config, &self.file_config],
            &normalize_key(key),
        )
    }

    /// Like [`option`](Self::option), calling `default` only when neither tier has the key.
    pub fn option_or_else<F>(&self, key: &str, default: F) -> Value
    where
        F: FnOnce() -> Value,
    {
        self.option(key).cloned().unwrap_or_else(default)
    }

    /// Deserialize the resolved value of `key`.
    ///
    /// Missing keys and `null` values both give `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::Config`] if the value does not fit `T`.
    pub fn option_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.option(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => T::deserialize(value).map(Some).map_err(|e| {
                AnalyticsError::Config(format!("Invalid value for option '{}': {}", key, e))
            }),
        }
    }

    /// Options supplied as parameters.
    pub fn param_config(&self) -> &ConfigMap {
        &self.param_config
    }

    /// Options read from the configuration file (empty when none was loaded).
    pub fn file_config(&self) -> &ConfigMap {
        &self.file_config
    }

    /// Path of the configuration file that was consulted, if any.
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Whether the configuration file existed and was loaded.
    pub fn loaded_from_file(&self) -> bool {
        self.loaded_from_file
    }
}

/// Parse YAML configuration text into a normalized mapping.
///
/// An empty document is an empty mapping.
///
/// # Errors
///
/// Returns [`AnalyticsError::Config`] if the text is not YAML or its top level
/// is not a mapping.
pub fn parse_config(contents: &str) -> Result<ConfigMap> {
    if contents.trim().is_empty() {
        return Ok(ConfigMap::new());
    }

    let document: serde_yaml::Value = serde_yaml::from_str(contents)
        .map_err(|e| AnalyticsError::Config(format!("Failed to parse config file: {}", e)))?;

    match document {
        serde_yaml::Value::Null => Ok(ConfigMap::new()),
        serde_yaml::Value::Mapping(mapping) => {
            let entries = mapping
                .into_iter()
                .map(|(key, value)| {
                    let key = yaml_key(&key)?;
                    let value = serde_json::to_value(value).map_err(|e| {
                        AnalyticsError::Config(format!("Unsupported value for '{}': {}", key, e))
                    })?;
                    Ok((key, value))
                })
                .collect::<Result<Vec<_>>>()?;

            Ok(normalize_entries(entries)?.into_iter().collect())
        }
        _ => Err(AnalyticsError::Config(
            "Config file must contain a mapping at the top level".to_string(),
        )),
    }
}

fn load_file(path: &Path) -> Result<Option<ConfigMap>> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("Config file not found: {}", path.display());
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };

    let config = parse_config(&contents)?;
    info!(
        "Loaded {} option(s) from {}",
        config.len(),
        path.display()
    );
    Ok(Some(config))
}

fn yaml_key(key: &serde_yaml::Value) -> Result<String> {
    match key {
        serde_yaml::Value::String(s) => Ok(s.clone()),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        other => Err(AnalyticsError::Config(format!(
            "Unsupported config key: {:?}",
            other
        ))),
    }
}

fn is_truthy(value: Option<&Value>) -> bool {
    !matches!(value, None | Some(Value::Null) | Some(Value::Bool(false)))
}
