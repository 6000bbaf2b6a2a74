use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use appreg::ApplicationRecord;
use appreg_memory::{Collation, InMemoryApplicationStore};

/// Load the snapshot at `path` into a fresh store. A missing file yields an
/// empty store.
pub fn open(path: &Path, collation: Collation) -> Result<InMemoryApplicationStore> {
    let store = InMemoryApplicationStore::with_collation(collation);
    if !path.exists() {
        return Ok(store);
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot: {}", path.display()))?;
    let records: Vec<ApplicationRecord> = serde_json::from_str(&content)
        .with_context(|| format!("Invalid snapshot: {}", path.display()))?;
    store.restore(records)?;

    tracing::debug!(path = %path.display(), count = store.len(), "Loaded snapshot");
    Ok(store)
}

/// Write every stored application to `path`.
pub fn save(path: &Path, store: &InMemoryApplicationStore) -> Result<()> {
    let content = serde_json::to_string_pretty(&store.snapshot())?;
    fs::write(path, content)
        .with_context(|| format!("Failed to write snapshot: {}", path.display()))?;

    tracing::debug!(path = %path.display(), count = store.len(), "Saved snapshot");
    Ok(())
}
