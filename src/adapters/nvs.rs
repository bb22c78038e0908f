//! Key-value storage adapter.
//!
//! Implements both [`ConfigPort`] and [`StoragePort`] on an in-memory map.
//! On the device this role belongs to the stack's persistence delegate;
//! the core only needs the namespaced read / write / delete contract.
//!
//! - Config validation: the config is checked before it is persisted.
//! - Namespace isolation: each subsystem uses its own namespace prefix.

use std::cell::RefCell;
use std::collections::HashMap;

use log::{info, warn};

use crate::app::ports::{ConfigError, ConfigPort, StorageError, StoragePort};
use crate::config::DeviceConfig;

const CONFIG_NAMESPACE: &str = "boltlock";
const CONFIG_KEY: &str = "devcfg";

/// Largest blob a single key may hold.
const MAX_BLOB_SIZE: usize = 4000;

pub struct NvsAdapter {
    store: RefCell<HashMap<String, Vec<u8>>>,
}

impl Default for NvsAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl NvsAdapter {
    pub fn new() -> Self {
        info!("NvsAdapter: in-memory backend");
        Self {
            store: RefCell::new(HashMap::new()),
        }
    }

    /// Drop every key (factory reset).
    pub fn erase_all(&mut self) {
        self.store.borrow_mut().clear();
        warn!("NvsAdapter: all keys erased");
    }

    fn composite_key(namespace: &str, key: &str) -> String {
        format!("{}::{}", namespace, key)
    }
}

impl ConfigPort for NvsAdapter {
    fn load(&self) -> Result<DeviceConfig, ConfigError> {
        let key = Self::composite_key(CONFIG_NAMESPACE, CONFIG_KEY);
        if let Some(bytes) = self.store.borrow().get(&key) {
            let cfg: DeviceConfig =
                postcard::from_bytes(bytes).map_err(|_| ConfigError::Corrupted)?;
            info!("NvsAdapter: loaded config from store");
            Ok(cfg)
        } else {
            info!("NvsAdapter: no stored config, using defaults");
            Ok(DeviceConfig::default())
        }
    }

    fn save(&self, config: &DeviceConfig) -> Result<(), ConfigError> {
        config.validate().map_err(|e| match e {
            crate::error::Error::Config(msg) => ConfigError::ValidationFailed(msg),
            _ => ConfigError::IoError,
        })?;
        let key = Self::composite_key(CONFIG_NAMESPACE, CONFIG_KEY);
        let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;
        self.store.borrow_mut().insert(key, bytes);
        info!("NvsAdapter: config saved");
        Ok(())
    }
}

impl StoragePort for NvsAdapter {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        let composite = Self::composite_key(namespace, key);
        match self.store.borrow().get(&composite) {
            Some(data) => {
                let len = data.len().min(buf.len());
                buf[..len].copy_from_slice(&data[..len]);
                Ok(len)
            }
            None => Err(StorageError::NotFound),
        }
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        if data.len() > MAX_BLOB_SIZE {
            return Err(StorageError::Full);
        }
        let composite = Self::composite_key(namespace, key);
        self.store.borrow_mut().insert(composite, data.to_vec());
        Ok(())
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        let composite = Self::composite_key(namespace, key);
        self.store.borrow_mut().remove(&composite);
        Ok(())
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        let composite = Self::composite_key(namespace, key);
        self.store.borrow().contains_key(&composite)
    }
}
