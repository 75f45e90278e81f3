//! Transports that hand raw partition bytes to the record store.
//!
//! The store never cares where bytes come from: a local `data/chunks/`
//! directory, a static web host, or an in-memory map in tests.

use crate::errors::FetchError;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Something that can fetch a named resource (manifest or partition file).
pub trait PartitionSource: Send + Sync {
    fn fetch(&self, name: &str) -> Result<Vec<u8>, FetchError>;

    /// Where `name` lives, for log and error messages.
    fn locate(&self, name: &str) -> String;
}

/// Partitions stored as files under one directory.
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl PartitionSource for DirSource {
    fn fetch(&self, name: &str) -> Result<Vec<u8>, FetchError> {
        let path = self.root.join(name);
        if !path.is_file() {
            return Err(FetchError::Missing {
                name: path.display().to_string(),
            });
        }
        Ok(std::fs::read(path)?)
    }

    fn locate(&self, name: &str) -> String {
        self.root.join(name).display().to_string()
    }
}

/// Partitions served over HTTP(S) below a base URL.
pub struct HttpSource {
    base: String,
    client: reqwest::blocking::Client,
}

impl HttpSource {
    pub fn new(base: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        let mut base = base.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        Ok(Self { base, client })
    }
}

impl PartitionSource for HttpSource {
    fn fetch(&self, name: &str) -> Result<Vec<u8>, FetchError> {
        let url = self.locate(name);
        let resp = self
            .client
            .get(&url)
            .header(reqwest::header::CACHE_CONTROL, "no-store")
            .send()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                name: url,
                status: status.as_u16(),
            });
        }
        Ok(resp.bytes()?.to_vec())
    }

    fn locate(&self, name: &str) -> String {
        format!("{}{}", self.base, name)
    }
}

/// In-memory transport. Counts fetches per name and can be told to fail
/// specific names, which makes cache and failure behaviour observable.
#[derive(Default)]
pub struct MemorySource {
    files: HashMap<String, Vec<u8>>,
    failing: Vec<String>,
    fetches: Mutex<HashMap<String, usize>>,
    total: AtomicUsize,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, name: &str, body: impl Into<Vec<u8>>) -> Self {
        self.files.insert(name.to_string(), body.into());
        self
    }

    /// Make every fetch of `name` fail with an I/O error.
    pub fn with_failure(mut self, name: &str) -> Self {
        self.failing.push(name.to_string());
        self
    }

    pub fn fetch_count(&self, name: &str) -> usize {
        self.fetches
            .lock()
            .map(|counts| counts.get(name).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    pub fn total_fetches(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }
}

impl PartitionSource for MemorySource {
    fn fetch(&self, name: &str) -> Result<Vec<u8>, FetchError> {
        self.total.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut counts) = self.fetches.lock() {
            *counts.entry(name.to_string()).or_insert(0) += 1;
        }
        if self.failing.iter().any(|f| f == name) {
            return Err(FetchError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                format!("injected failure for {}", name),
            )));
        }
        self.files
            .get(name)
            .cloned()
            .ok_or_else(|| FetchError::Missing {
                name: name.to_string(),
            })
    }

    fn locate(&self, name: &str) -> String {
        format!("memory://{}", name)
    }
}
