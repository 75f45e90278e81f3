//! Partitioned record store.
//!
//! Accounts are spread over many JSON partition files, each a flat map of
//! account number to record. The store decides which partitions may hold an
//! account, loads each one at most once per store lifetime, and answers with
//! the first record found in scan order.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use once_cell::sync::OnceCell;
use serde_json::Value;
use thiserror::Error;

use crate::errors::LookupError;
use crate::loader::PartitionSource;
use crate::types::{Manifest, RawRecord};
use crate::util::normalize_account;

pub const DEFAULT_MANIFEST: &str = "manifest.json";

/// How partitions are discovered for an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartitionScheme {
    /// Scan every file listed in the manifest, in listed order.
    Manifest { name: String },
    /// Look only in `<first len digits>.json`.
    Prefix { len: usize },
}

impl Default for PartitionScheme {
    fn default() -> Self {
        PartitionScheme::Manifest {
            name: DEFAULT_MANIFEST.to_string(),
        }
    }
}

/// One loaded partition file. Never mutated after parsing.
#[derive(Debug, Default)]
pub struct Partition {
    records: HashMap<String, Value>,
}

impl Partition {
    pub fn parse(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        let records: HashMap<String, Value> = serde_json::from_slice(bytes)?;
        Ok(Self { records })
    }

    /// Entries that are not JSON objects are treated as absent.
    pub fn get(&self, account: &str) -> Option<&RawRecord> {
        match self.records.get(account) {
            Some(Value::Object(record)) => Some(record),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// A successful lookup and the partition that answered it.
#[derive(Debug, Clone, PartialEq)]
pub struct Found {
    pub partition: String,
    pub record: RawRecord,
}

#[derive(Debug, Error)]
#[error("partition '{name}' unavailable: {reason}")]
struct PartitionUnavailable {
    name: String,
    reason: String,
}

pub struct RecordStore {
    source: Box<dyn PartitionSource>,
    scheme: PartitionScheme,
    manifest: OnceCell<Vec<String>>,
    partitions: RwLock<HashMap<String, Arc<Partition>>>,
}

impl RecordStore {
    pub fn new(source: impl PartitionSource + 'static, scheme: PartitionScheme) -> Self {
        Self::from_boxed(Box::new(source), scheme)
    }

    pub fn from_boxed(source: Box<dyn PartitionSource>, scheme: PartitionScheme) -> Self {
        Self {
            source,
            scheme,
            manifest: OnceCell::new(),
            partitions: RwLock::new(HashMap::new()),
        }
    }

    pub fn scheme(&self) -> &PartitionScheme {
        &self.scheme
    }

    /// Find the record for `account`, scanning candidate partitions in order.
    ///
    /// Partitions that fail to load are skipped; only an unusable manifest
    /// aborts the scan.
    pub fn resolve(&self, account: &str) -> Result<Found, LookupError> {
        let account = normalize_account(account);
        if account.is_empty() {
            return Err(LookupError::InvalidIdentifier);
        }

        for name in self.candidate_partitions(&account)? {
            let partition = match self.load_partition(&name) {
                Ok(p) => p,
                Err(e) => {
                    log::warn!("{}; continuing scan", e);
                    continue;
                }
            };
            if let Some(record) = partition.get(&account) {
                log::info!("account {} found in {}", account, name);
                return Ok(Found {
                    partition: name,
                    record: record.clone(),
                });
            }
        }

        Err(LookupError::AccountNotFound { account })
    }

    /// Manifest file list, fetched on first use and kept for the store's lifetime.
    /// Only the manifest scheme has one.
    fn manifest_files(&self, name: &str) -> Result<&[String], LookupError> {
        let files = self.manifest.get_or_try_init(|| {
            let location = self.source.locate(name);
            let unavailable = |reason: String| LookupError::ManifestUnavailable {
                location: location.clone(),
                reason,
            };
            let bytes = self
                .source
                .fetch(name)
                .map_err(|e| unavailable(e.to_string()))?;
            let manifest: Manifest =
                serde_json::from_slice(&bytes).map_err(|e| unavailable(e.to_string()))?;
            log::info!(
                "manifest {} lists {} partitions",
                location,
                manifest.files.len()
            );
            Ok::<_, LookupError>(manifest.files)
        })?;
        Ok(files.as_slice())
    }

    /// Number of partitions currently held in the cache.
    pub fn cached_partitions(&self) -> usize {
        self.partitions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn candidate_partitions(&self, account: &str) -> Result<Vec<String>, LookupError> {
        match &self.scheme {
            PartitionScheme::Manifest { name } => Ok(self.manifest_files(name)?.to_vec()),
            PartitionScheme::Prefix { len } => {
                let prefix: String = account.chars().take(*len).collect();
                Ok(vec![format!("{}.json", prefix)])
            }
        }
    }

    fn load_partition(&self, name: &str) -> Result<Arc<Partition>, PartitionUnavailable> {
        if let Some(hit) = self
            .partitions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
        {
            log::debug!("partition {} served from cache", name);
            return Ok(Arc::clone(hit));
        }

        log::debug!("fetching partition {}", self.source.locate(name));
        let unavailable = |reason: String| PartitionUnavailable {
            name: name.to_string(),
            reason,
        };
        let bytes = self
            .source
            .fetch(name)
            .map_err(|e| unavailable(e.to_string()))?;
        let parsed = Partition::parse(&bytes).map_err(|e| unavailable(e.to_string()))?;

        // A concurrent lookup may have loaded it meanwhile; keep the first copy.
        let mut cache = self
            .partitions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let entry = cache
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(parsed));
        Ok(Arc::clone(entry))
    }
}
