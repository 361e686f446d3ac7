//! Storage configuration with override-on-load semantics.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::{Error, Result};

/// Default region: US East (N. Virginia).
pub const DEFAULT_REGION: &str = "us-east-1";
/// Default number of attempts per backend request.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 2;
/// Default per-attempt request timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "CLOUDFILES_";

/// Settings used to build a storage client.
#[derive(Clone, PartialEq, Eq)]
pub struct StorageConfig {
    /// Access key id.
    pub access_key: String,
    /// Secret access key.
    pub secret_key: String,
    /// Region the client signs requests for.
    pub region: String,
    /// Total attempts per request, including the first one.
    pub max_attempts: u32,
    /// Per-attempt timeout in milliseconds.
    pub timeout_ms: u64,
    /// Custom endpoint for S3-compatible stores.
    pub endpoint: Option<String>,
    /// Use path-style addressing (`endpoint/bucket/key`).
    pub force_path_style: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            access_key: String::new(),
            secret_key: String::new(),
            region: DEFAULT_REGION.to_string(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            endpoint: None,
            force_path_style: false,
        }
    }
}

impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageConfig")
            .field("access_key", &self.access_key)
            .field("secret_key", &"[REDACTED]")
            .field("region", &self.region)
            .field("max_attempts", &self.max_attempts)
            .field("timeout_ms", &self.timeout_ms)
            .field("endpoint", &self.endpoint)
            .field("force_path_style", &self.force_path_style)
            .finish()
    }
}

impl StorageConfig {
    /// Load defaults, then apply `overrides` on top.
    pub fn load(overrides: Option<ConfigOverrides>) -> Self {
        let mut config = Self::default();
        if let Some(overrides) = overrides {
            config.apply(overrides);
        }
        config
    }

    /// Merge overrides into this config. Unset fields keep their value.
    pub fn apply(&mut self, overrides: ConfigOverrides) {
        let ConfigOverrides {
            access_key,
            secret_key,
            region,
            max_attempts,
            timeout_ms,
            endpoint,
            force_path_style,
        } = overrides;

        if let Some(v) = access_key {
            self.access_key = v;
        }
        if let Some(v) = secret_key {
            self.secret_key = v;
        }
        if let Some(v) = region {
            self.region = v;
        }
        if let Some(v) = max_attempts {
            self.max_attempts = v;
        }
        if let Some(v) = timeout_ms {
            self.timeout_ms = v;
        }
        if endpoint.is_some() {
            self.endpoint = endpoint;
        }
        if let Some(v) = force_path_style {
            self.force_path_style = v;
        }
    }
}

/// Partial configuration merged over [`StorageConfig`] at load time.
///
/// Accepts the legacy upper-case keys (`KEY`, `SECRET`, `REGION`,
/// `MAX_RETRIES`, `TIMEOUT`) as aliases.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigOverrides {
    #[serde(default, alias = "KEY")]
    pub access_key: Option<String>,
    #[serde(default, alias = "SECRET")]
    pub secret_key: Option<String>,
    #[serde(default, alias = "REGION")]
    pub region: Option<String>,
    #[serde(default, alias = "MAX_RETRIES")]
    pub max_attempts: Option<u32>,
    #[serde(default, alias = "TIMEOUT")]
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub force_path_style: Option<bool>,
}

impl ConfigOverrides {
    /// Read overrides from a JSON file.
    ///
    /// # Errors
    /// - File cannot be read
    /// - Content is not a valid override object
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        serde_json::from_str(&raw).map_err(|e| {
            Error::InvalidInput(format!(
                "Invalid config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })
    }

    /// Read overrides from `CLOUDFILES_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read overrides through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |suffix: &str| lookup(&format!("{}{}", ENV_PREFIX, suffix));

        Ok(Self {
            access_key: var("ACCESS_KEY"),
            secret_key: var("SECRET_KEY"),
            region: var("REGION"),
            max_attempts: parse_var("MAX_ATTEMPTS", var("MAX_ATTEMPTS"))?,
            timeout_ms: parse_var("TIMEOUT_MS", var("TIMEOUT_MS"))?,
            endpoint: var("ENDPOINT"),
            force_path_style: parse_var("FORCE_PATH_STYLE", var("FORCE_PATH_STYLE"))?,
        })
    }

    /// Layer `other` on top of `self`; fields set in `other` win.
    pub fn merge(self, other: ConfigOverrides) -> Self {
        Self {
            access_key: other.access_key.or(self.access_key),
            secret_key: other.secret_key.or(self.secret_key),
            region: other.region.or(self.region),
            max_attempts: other.max_attempts.or(self.max_attempts),
            timeout_ms: other.timeout_ms.or(self.timeout_ms),
            endpoint: other.endpoint.or(self.endpoint),
            force_path_style: other.force_path_style.or(self.force_path_style),
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, value: Option<String>) -> Result<Option<T>> {
    value
        .map(|raw| {
            raw.trim().parse().map_err(|_| {
                Error::InvalidInput(format!("{}{} has an invalid value: {}", ENV_PREFIX, name, raw))
            })
        })
        .transpose()
}
