pub mod applications;
pub mod checks;
pub mod secrets;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use appreg::{ApplicationManager, ApplicationRecord};
use appreg_memory::InMemoryApplicationStore;
use tokio_util::sync::CancellationToken;

use crate::config::CliConfig;
use crate::store;

/// Manager over a snapshot-backed in-memory store.
pub struct Registry {
    pub manager: ApplicationManager,
    pub cancel: CancellationToken,
    pub secret_bytes: usize,
    store: Arc<InMemoryApplicationStore>,
    snapshot: PathBuf,
}

impl Registry {
    pub fn open(snapshot: PathBuf, config: &CliConfig, cancel: CancellationToken) -> Result<Self> {
        let store = Arc::new(store::open(&snapshot, config.store.collation)?);
        let manager = ApplicationManager::with_config(store.clone(), &config.registry)?;
        Ok(Self {
            manager,
            cancel,
            secret_bytes: config.registry.secrets.generated_secret_bytes,
            store,
            snapshot,
        })
    }

    pub async fn find(&self, client_id: &str) -> Result<ApplicationRecord> {
        self.manager
            .find_by_client_id(client_id, &self.cancel)
            .await?
            .with_context(|| format!("Application \"{client_id}\" not found"))
    }

    pub fn save(&self) -> Result<()> {
        store::save(&self.snapshot, &self.store)
    }
}
