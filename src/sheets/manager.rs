use once_cell::sync::OnceCell;
use std::sync::Arc;
use tracing::{error, info};

use super::{CredentialSource, GoogleSheetsClient, MemoryStore, StoreError, TabularStore};
use crate::config::{SheetsConfig, StoreBackend};

/// Owns the process's single store handle. The handle is built lazily on
/// first use and never rebuilt; a failed build is remembered so every later
/// call fails the same way.
pub struct StoreManager {
    config: SheetsConfig,
    handle: OnceCell<Result<Arc<dyn TabularStore>, String>>,
}

impl StoreManager {
    pub fn new(config: SheetsConfig) -> Self {
        Self {
            config,
            handle: OnceCell::new(),
        }
    }

    /// Manager whose handle is already the given store.
    pub fn with_store(store: Arc<dyn TabularStore>) -> Self {
        Self {
            config: SheetsConfig::memory(),
            handle: OnceCell::with_value(Ok(store)),
        }
    }

    pub fn config(&self) -> &SheetsConfig {
        &self.config
    }

    /// The shared handle, building it on first call.
    pub fn store(&self) -> Result<Arc<dyn TabularStore>, StoreError> {
        self.handle
            .get_or_init(|| {
                Self::build(&self.config).map_err(|e| {
                    error!("Store client construction failed: {}", e);
                    e.to_string()
                })
            })
            .clone()
            .map_err(StoreError::Credentials)
    }

    fn build(config: &SheetsConfig) -> Result<Arc<dyn TabularStore>, StoreError> {
        match config.backend {
            StoreBackend::Memory => {
                info!("Using in-memory table store");
                Ok(Arc::new(MemoryStore::new()))
            }
            StoreBackend::Google => {
                let source = CredentialSource::resolve(config);
                let key = source.load()?;
                info!(
                    "Using Google Sheets store {} as {}",
                    config.spreadsheet_id, key.client_email
                );
                Ok(Arc::new(GoogleSheetsClient::new(config, key)?))
            }
        }
    }
}
