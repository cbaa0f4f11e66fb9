//! Persistent storage adapters.
//!
//! - [`MemoryStorage`]: in-memory [`StoragePort`] backend (host simulation
//!   and tests).
//! - [`KvStore`]: implements [`SessionStore`] and [`ConfigPort`] over any
//!   key/value backend.  Values are postcard-encoded.  Config is
//!   range-checked before it is written and again after it is read.

use std::collections::HashMap;

use log::{info, warn};

use crate::app::ports::{ConfigError, ConfigPort, SessionStore, StorageError, StoragePort};
use crate::checkpoint::SessionRecord;
use crate::config::SystemConfig;

const NAMESPACE: &str = "printctl";
const CONFIG_KEY: &str = "syscfg";
const SESSION_KEY: &str = "session";

/// Largest blob either record may occupy.
const MAX_BLOB_SIZE: usize = 512;

// ───────────────────────────────────────────────────────────────
// In-memory backend
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MemoryStorage {
    store: HashMap<String, Vec<u8>>,
    read_only: bool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        info!("MemoryStorage: simulation backend");
        Self::default()
    }

    /// Make every write fail with [`StorageError::IoError`].
    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    fn composite_key(namespace: &str, key: &str) -> String {
        format!("{}::{}", namespace, key)
    }
}

impl StoragePort for MemoryStorage {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        match self.store.get(&Self::composite_key(namespace, key)) {
            Some(data) => {
                let len = data.len().min(buf.len());
                buf[..len].copy_from_slice(&data[..len]);
                Ok(len)
            }
            None => Err(StorageError::NotFound),
        }
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        if self.read_only {
            return Err(StorageError::IoError);
        }
        self.store
            .insert(Self::composite_key(namespace, key), data.to_vec());
        Ok(())
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        self.store.remove(&Self::composite_key(namespace, key));
        Ok(())
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        self.store.contains_key(&Self::composite_key(namespace, key))
    }
}

// ───────────────────────────────────────────────────────────────
// Typed records over a key/value backend
// ───────────────────────────────────────────────────────────────

pub struct KvStore<S> {
    backend: S,
}

impl<S: StoragePort> KvStore<S> {
    pub fn new(backend: S) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut S {
        &mut self.backend
    }

    /// Remove the session record (job finished cleanly).
    pub fn clear_session(&mut self) -> Result<(), StorageError> {
        self.backend.delete(NAMESPACE, SESSION_KEY)
    }

    fn read_blob(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        if !self.backend.exists(NAMESPACE, key) {
            return Ok(None);
        }
        let mut buf = [0u8; MAX_BLOB_SIZE];
        let len = self.backend.read(NAMESPACE, key, &mut buf)?;
        Ok(Some(buf[..len].to_vec()))
    }

    fn write_record<T: serde::Serialize>(&mut self, key: &str, value: &T) -> Result<(), StorageError> {
        let bytes = postcard::to_allocvec(value).map_err(|_| StorageError::Corrupted)?;
        if bytes.len() > MAX_BLOB_SIZE {
            return Err(StorageError::Full);
        }
        self.backend.write(NAMESPACE, key, &bytes)
    }
}

impl<S: StoragePort> SessionStore for KvStore<S> {
    fn load_session(&self) -> Result<Option<SessionRecord>, StorageError> {
        match self.read_blob(SESSION_KEY)? {
            Some(bytes) => postcard::from_bytes(&bytes)
                .map(Some)
                .map_err(|_| StorageError::Corrupted),
            None => Ok(None),
        }
    }

    fn save_session(&mut self, record: &SessionRecord) -> Result<(), StorageError> {
        self.write_record(SESSION_KEY, record)
    }
}

impl<S: StoragePort> ConfigPort for KvStore<S> {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        let Some(bytes) = self.read_blob(CONFIG_KEY).map_err(storage_to_config)? else {
            info!("KvStore: no stored config, using defaults");
            return Ok(SystemConfig::default());
        };
        let cfg: SystemConfig = postcard::from_bytes(&bytes).map_err(|_| ConfigError::Corrupted)?;
        if let Err(e) = cfg.validate() {
            warn!("KvStore: stored config invalid ({})", e);
            return Err(e);
        }
        info!("KvStore: loaded config from store");
        Ok(cfg)
    }

    fn save(&mut self, config: &SystemConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.write_record(CONFIG_KEY, config)
            .map_err(storage_to_config)?;
        info!("KvStore: config saved");
        Ok(())
    }
}

fn storage_to_config(e: StorageError) -> ConfigError {
    match e {
        StorageError::NotFound => ConfigError::NotFound,
        StorageError::Full => ConfigError::StorageFull,
        StorageError::Corrupted => ConfigError::Corrupted,
        StorageError::IoError => ConfigError::IoError,
    }
}
