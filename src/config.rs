//! Factory configuration.
//!
//! Policies that change how the factory resolves beans. Values come from
//! code, from environment variables, or (with the `config` feature) from
//! JSON.

use std::env;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

/// Default bound on nested resolutions per thread.
pub const DEFAULT_MAX_RESOLUTION_DEPTH: usize = 1024;

/// Resolution policies for a [`BeanFactory`](crate::BeanFactory).
///
/// # Examples
///
/// ```rust
/// use ferrous_beans::FactoryConfig;
///
/// let config = FactoryConfig::default()
///     .with_circular_references(false)
///     .with_max_resolution_depth(64);
///
/// assert!(!config.allow_circular_references);
/// assert!(config.allow_description_overriding);
/// assert_eq!(config.max_resolution_depth, 64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct FactoryConfig {
    /// Expose early references so setter-style cycles between singletons
    /// resolve.
    pub allow_circular_references: bool,
    /// Let a later description (or alias) replace an earlier one with the
    /// same name.
    pub allow_description_overriding: bool,
    /// Accept a post-processor wrapping a bean whose raw early reference was
    /// already injected into another bean.
    pub allow_raw_injection_despite_wrapping: bool,
    pub max_resolution_depth: usize,
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self {
            allow_circular_references: true,
            allow_description_overriding: true,
            allow_raw_injection_despite_wrapping: false,
            max_resolution_depth: DEFAULT_MAX_RESOLUTION_DEPTH,
        }
    }
}

/// Configuration could not be read.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {key}")]
    InvalidValue { key: String, value: String },
    #[cfg(feature = "config")]
    #[error("invalid factory configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

impl FactoryConfig {
    pub fn with_circular_references(mut self, allow: bool) -> Self {
        self.allow_circular_references = allow;
        self
    }

    pub fn with_description_overriding(mut self, allow: bool) -> Self {
        self.allow_description_overriding = allow;
        self
    }

    pub fn with_raw_injection_despite_wrapping(mut self, allow: bool) -> Self {
        self.allow_raw_injection_despite_wrapping = allow;
        self
    }

    pub fn with_max_resolution_depth(mut self, depth: usize) -> Self {
        self.max_resolution_depth = depth;
        self
    }

    /// Parses a JSON object; missing fields keep their defaults.
    #[cfg(feature = "config")]
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads overrides from environment variables named
    /// `{PREFIX}_{FIELD}`, e.g. `BEANS_ALLOW_CIRCULAR_REFERENCES=false`.
    pub fn from_env(prefix: &str) -> Result<Self, ConfigError> {
        Self::from_source(prefix, |key| env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) but reading from `lookup`.
    pub fn from_source<F>(prefix: &str, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let key = |field: &str| {
            if prefix.is_empty() {
                field.to_uppercase()
            } else {
                format!("{}_{}", prefix.to_uppercase(), field.to_uppercase())
            }
        };

        let mut config = Self::default();
        if let Some(v) = read_bool(&lookup, &key("allow_circular_references"))? {
            config.allow_circular_references = v;
        }
        if let Some(v) = read_bool(&lookup, &key("allow_description_overriding"))? {
            config.allow_description_overriding = v;
        }
        if let Some(v) = read_bool(&lookup, &key("allow_raw_injection_despite_wrapping"))? {
            config.allow_raw_injection_despite_wrapping = v;
        }
        let depth_key = key("max_resolution_depth");
        if let Some(raw) = lookup(&depth_key) {
            config.max_resolution_depth = raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|d| *d > 0)
                .ok_or(ConfigError::InvalidValue {
                    key: depth_key,
                    value: raw,
                })?;
        }
        Ok(config)
    }
}

fn read_bool<F>(lookup: &F, key: &str) -> Result<Option<bool>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(Some(true)),
        "false" | "0" | "no" | "off" => Ok(Some(false)),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw,
        }),
    }
}
