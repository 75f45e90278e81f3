//! Runtime configuration, read from `ONEPAGER_*` environment variables.

use std::time::Duration;

use crate::errors::ConfigError;
use crate::loader::{DirSource, HttpSource, PartitionSource};
use crate::store::{PartitionScheme, RecordStore, DEFAULT_MANIFEST};

pub const DEFAULT_DATA: &str = "data/chunks/";
pub const DEFAULT_PREFIX_LEN: usize = 3;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Directory path or `http(s)://` base URL holding manifest and partitions.
    pub data_location: String,
    pub scheme: PartitionScheme,
    pub fetch_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_location: DEFAULT_DATA.to_string(),
            scheme: PartitionScheme::default(),
            fetch_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset or blank keys take their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let data_location = get("ONEPAGER_DATA").unwrap_or_else(|| DEFAULT_DATA.to_string());
        let manifest = get("ONEPAGER_MANIFEST").unwrap_or_else(|| DEFAULT_MANIFEST.to_string());
        let prefix_len = parse_positive("ONEPAGER_PREFIX_LEN", get("ONEPAGER_PREFIX_LEN"))?
            .unwrap_or(DEFAULT_PREFIX_LEN as u64) as usize;
        let timeout = parse_positive("ONEPAGER_TIMEOUT_SECS", get("ONEPAGER_TIMEOUT_SECS"))?
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let scheme = match get("ONEPAGER_PARTITIONING").as_deref() {
            None | Some("manifest") => PartitionScheme::Manifest { name: manifest },
            Some("prefix") => PartitionScheme::Prefix { len: prefix_len },
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "ONEPAGER_PARTITIONING",
                    value: other.to_string(),
                })
            }
        };

        Ok(Self {
            data_location,
            scheme,
            fetch_timeout: Duration::from_secs(timeout),
        })
    }

    pub fn is_remote(&self) -> bool {
        let loc = self.data_location.to_ascii_lowercase();
        loc.starts_with("http://") || loc.starts_with("https://")
    }

    pub fn build_source(&self) -> Result<Box<dyn PartitionSource>, ConfigError> {
        if self.is_remote() {
            Ok(Box::new(HttpSource::new(&self.data_location, self.fetch_timeout)?))
        } else {
            Ok(Box::new(DirSource::new(&self.data_location)))
        }
    }

    /// The store for one session; build it once and share it by reference.
    pub fn build_store(&self) -> Result<RecordStore, ConfigError> {
        Ok(RecordStore::from_boxed(self.build_source()?, self.scheme.clone()))
    }
}

fn parse_positive(key: &'static str, value: Option<String>) -> Result<Option<u64>, ConfigError> {
    match value {
        None => Ok(None),
        Some(v) => match v.parse::<u64>() {
            Ok(n) if n > 0 => Ok(Some(n)),
            _ => Err(ConfigError::Invalid { key, value: v }),
        },
    }
}
