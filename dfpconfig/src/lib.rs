//! # DFP API client configuration
//!
//! This crate provides the configuration of the DFP client, including:
//! - Loading configuration from YAML files
//! - Merging with the embedded default configuration
//! - Environment variable overrides
//! - The on-disk cache of the last used request headers
//!
//! A [`Config`] is an immutable value handed to each client at
//! construction. Nothing is kept in global state, so clients built from
//! different directories never interfere.
//!
//! ## Usage
//!
//! ```no_run
//! use dfpconfig::Config;
//!
//! let config = Config::load("")?;
//! println!("xml log: {}", config.xml_log);
//! # Ok::<(), anyhow::Error>(())
//! ```

use anyhow::{anyhow, Result};
use dirs::home_dir;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::{
    env, fs,
    path::{Path, PathBuf},
};
use tracing::info;

mod cache;

pub use cache::{CachedHeaders, CACHE_FILE};

// Embedded defaults
const DEFAULT_CONFIG: &str = include_str!("dfpconfig.yaml");

const ENV_CONFIG_DIR: &str = "DFPAPI_HOME";
const ENV_PREFIX: &str = "DFPAPI_CONFIG__";
const CONFIG_FILE: &str = "config.yaml";
const DIR_NAME: &str = ".dfpapi";

/// Options of the DFP client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding `config.yaml` and the header cache
    pub home: PathBuf,
    /// Directory of the log file; console output when unset
    #[serde(with = "optional_path")]
    pub log_home: Option<PathBuf>,
    /// HTTP proxy URL (`http://host:port`)
    #[serde(with = "optional_text")]
    pub proxy: Option<String>,
    #[serde(with = "yes_no")]
    pub debug: bool,
    /// Log raw SOAP XML
    #[serde(with = "yes_no")]
    pub xml_log: bool,
    /// Log one line per request
    #[serde(with = "yes_no")]
    pub request_log: bool,
    /// Indent logged XML
    #[serde(with = "yes_no")]
    pub pretty_xml: bool,
    /// Ask for gzip-compressed responses
    #[serde(with = "yes_no")]
    pub compress: bool,
    /// Reject parameters an operation does not declare
    #[serde(with = "yes_no")]
    pub strict: bool,
    /// Seconds before an HTTP exchange is abandoned
    pub http_timeout: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            home: PathBuf::from(DIR_NAME),
            log_home: None,
            proxy: None,
            debug: false,
            xml_log: false,
            request_log: true,
            pretty_xml: true,
            compress: false,
            strict: true,
            http_timeout: 120,
        }
    }
}

impl Config {
    /// Finds a config directory by trying different locations in order
    fn find_config_dir(directory: &str) -> PathBuf {
        // 1. Try provided directory
        if !directory.is_empty() {
            return PathBuf::from(directory);
        }

        // 2. Try environment variable
        if let Ok(env_path) = env::var(ENV_CONFIG_DIR) {
            info!(env_var = ENV_CONFIG_DIR, path = %env_path, "Trying to load config from env");
            return PathBuf::from(env_path);
        }

        // 3. Try current directory
        if Path::new(DIR_NAME).exists() {
            return PathBuf::from(DIR_NAME);
        }

        // 4. Try home directory
        if let Some(home) = home_dir() {
            let home_config = home.join(DIR_NAME);
            if home_config.exists() {
                return home_config;
            }
        }

        PathBuf::from(DIR_NAME)
    }

    /// Loads the configuration
    ///
    /// The directory is searched in the following order:
    /// 1. The provided `directory` parameter if not empty
    /// 2. The `DFPAPI_HOME` environment variable
    /// 3. `.dfpapi` in the current directory
    /// 4. `.dfpapi` in the user's home directory
    ///
    /// The embedded defaults are merged with `config.yaml` from that
    /// directory when present, then `DFPAPI_CONFIG__<KEY>` environment
    /// variables are applied.
    pub fn load(directory: &str) -> Result<Self> {
        let config_dir = Self::find_config_dir(directory);
        info!(config_dir = %config_dir.display(), "Using config directory");

        let config_file = config_dir.join(CONFIG_FILE);
        let external = match fs::read(&config_file) {
            Ok(data) => {
                info!(config_file = %config_file.display(), "Loaded config file");
                Some(serde_yaml::from_slice::<Value>(&data)?)
            }
            Err(_) => {
                info!(config_file = %config_file.display(), "Config file not found, using default embedded config");
                None
            }
        };

        let mut value = Self::merged_defaults(external.as_ref())?;
        Self::apply_env_overrides(&mut value);

        Self::from_value(value, &config_dir)
    }

    /// Builds a configuration from a YAML document merged over the defaults.
    pub fn from_yaml_str(yaml: &str, home: &Path) -> Result<Self> {
        let external: Value = serde_yaml::from_str(yaml)?;
        let value = Self::merged_defaults(Some(&external))?;
        Self::from_value(value, home)
    }

    fn merged_defaults(external: Option<&Value>) -> Result<Value> {
        let mut default_value: Value = serde_yaml::from_str(DEFAULT_CONFIG)?;
        if let Some(external) = external {
            let external = Self::lower_keys_value(external.clone());
            if !external.is_null() && !external.is_mapping() {
                return Err(anyhow!("Configuration root must be a mapping"));
            }
            merge_yaml(&mut default_value, &external);
        }
        Ok(default_value)
    }

    fn from_value(value: Value, config_dir: &Path) -> Result<Self> {
        let mut config: Config = serde_yaml::from_value(value)?;
        if config.home.as_os_str().is_empty() {
            config.home = config_dir.to_path_buf();
        }
        Ok(config)
    }

    /// Writes the configuration to `config.yaml` in [`Config::home`].
    pub fn save(&self) -> Result<()> {
        fs::create_dir_all(&self.home)?;
        let yaml = serde_yaml::to_string(self)?;
        fs::write(self.home.join(CONFIG_FILE), yaml)?;
        Ok(())
    }

    fn apply_env_overrides(config: &mut Value) {
        for (key, value) in env::vars() {
            if let Some(name) = key.strip_prefix(ENV_PREFIX) {
                let yaml_value = Self::convert_env_value(&value);
                if let Value::Mapping(map) = config {
                    map.insert(Value::String(name.to_lowercase()), yaml_value);
                }
            }
        }
    }

    fn convert_env_value(value: &str) -> Value {
        if let Ok(parsed) = serde_yaml::from_str::<Value>(value) {
            return parsed;
        }
        Value::String(value.to_string())
    }

    fn lower_keys_value(value: Value) -> Value {
        match value {
            Value::Mapping(map) => {
                let mut new_map = Mapping::new();
                for (k, v) in map {
                    if let Value::String(s) = k {
                        new_map.insert(Value::String(s.to_lowercase()), Self::lower_keys_value(v));
                    } else {
                        new_map.insert(k, Self::lower_keys_value(v));
                    }
                }
                Value::Mapping(new_map)
            }
            Value::Sequence(seq) => {
                Value::Sequence(seq.into_iter().map(Self::lower_keys_value).collect())
            }
            _ => value,
        }
    }
}

/// Merges external YAML configuration into default configuration
///
/// Mappings are merged key by key; scalars and sequences from `external`
/// replace the default ones.
fn merge_yaml(default: &mut Value, external: &Value) {
    match (default, external) {
        (Value::Mapping(dmap), Value::Mapping(emap)) => {
            for (k, v) in emap {
                match dmap.get_mut(k) {
                    Some(dv) => merge_yaml(dv, v),
                    None => {
                        dmap.insert(k.clone(), v.clone());
                    }
                }
            }
        }
        (_, Value::Null) => {}
        (d, e) => *d = e.clone(),
    }
}

/// Reads `y`/`n`, `yes`/`no`, `true`/`false` and YAML booleans.
pub fn parse_flag(text: &str) -> Option<bool> {
    match text.trim().to_lowercase().as_str() {
        "y" | "yes" | "true" | "1" => Some(true),
        "n" | "no" | "false" | "0" | "" => Some(false),
        _ => None,
    }
}

mod yes_no {
    use serde::{de, Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(if *value { "y" } else { "n" })
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        match Flag::deserialize(deserializer)? {
            Flag::Bool(b) => Ok(b),
            Flag::Text(s) => super::parse_flag(&s)
                .ok_or_else(|| de::Error::custom(format!("expected y or n, got '{s}'"))),
        }
    }
}

mod optional_text {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(value.as_deref().unwrap_or(""))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
        let value = Option::<String>::deserialize(deserializer)?;
        Ok(value.filter(|s| !s.trim().is_empty()))
    }
}

mod optional_path {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::path::PathBuf;

    pub fn serialize<S: Serializer>(value: &Option<PathBuf>, serializer: S) -> Result<S::Ok, S::Error> {
        let text = value
            .as_ref()
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_default();
        serializer.serialize_str(&text)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<PathBuf>, D::Error> {
        let value = Option::<String>::deserialize(deserializer)?;
        Ok(value.filter(|s| !s.trim().is_empty()).map(PathBuf::from))
    }
}
