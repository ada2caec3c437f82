use std::sync::Arc;
use tracing::error;

use crate::auth::{AuthService, JwtError};
use crate::config::{SecurityConfig, SheetsConfig};
use crate::database::{schema, Repository, TableSchema};
use crate::services::{UserService, WorklogService};
use crate::sheets::{StoreError, StoreManager};

/// Shared handles passed to every handler and to the auth middleware.
#[derive(Clone)]
pub struct AppState {
    pub stores: Arc<StoreManager>,
    pub auth: Arc<AuthService>,
    pub users: Arc<UserService>,
    pub worklogs: Arc<WorklogService>,
}

impl AppState {
    pub fn new(sheets: SheetsConfig, security: &SecurityConfig) -> Result<Self, JwtError> {
        Self::with_stores(Arc::new(StoreManager::new(sheets)), security)
    }

    pub fn with_stores(stores: Arc<StoreManager>, security: &SecurityConfig) -> Result<Self, JwtError> {
        let auth = Arc::new(AuthService::new(security)?);
        let users = UserService::new(repository(&stores, schema::USERS), auth.clone());
        let worklogs = WorklogService::new(repository(&stores, schema::WORKLOGS));

        Ok(Self {
            stores,
            auth,
            users: Arc::new(users),
            worklogs: Arc::new(worklogs),
        })
    }

    /// Provisions the header row of every registered table. Each table is
    /// attempted even when an earlier one fails; the last failure is returned.
    pub async fn initialize_tables(&self) -> Result<(), StoreError> {
        let mut outcome = Ok(());
        for table in schema::REGISTRY {
            if let Err(e) = repository(&self.stores, *table).initialize().await {
                error!("Failed to initialize table '{}': {}", table.name, e);
                outcome = Err(e);
            }
        }
        outcome
    }
}

fn repository(stores: &Arc<StoreManager>, table: TableSchema) -> Repository {
    Repository::new(table, stores.clone(), stores.config().header_mode)
}
