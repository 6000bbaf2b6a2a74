use std::sync::atomic::{AtomicU64, Ordering};

use appreg::storage::{ApplicationFilter, ApplicationStore};
use appreg::{AppError, AppResult, ApplicationRecord};
use async_trait::async_trait;
use papaya::HashMap as PapayaHashMap;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

/// How client identifiers and URIs are compared by lookups.
///
/// Relational backends frequently compare text case-insensitively;
/// `CaseInsensitive` reproduces that so callers relying on ordinal semantics
/// can be exercised against it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collation {
    /// Byte-for-byte comparison.
    #[default]
    Ordinal,
    /// ASCII case-insensitive comparison.
    CaseInsensitive,
}

impl Collation {
    fn matches(self, stored: &str, wanted: &str) -> bool {
        match self {
            Self::Ordinal => stored == wanted,
            Self::CaseInsensitive => stored.eq_ignore_ascii_case(wanted),
        }
    }
}

/// Errors raised by the in-memory store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MemoryStoreError {
    /// An application with the same id is already stored.
    #[error("Application '{id}' already exists")]
    Conflict {
        /// Identifier of the stored application.
        id: String,
    },

    /// No application is stored under the id.
    #[error("Application '{id}' not found")]
    NotFound {
        /// Identifier that was looked up.
        id: String,
    },

    /// The record has no id.
    #[error("Application has no identifier")]
    MissingId,
}

impl From<MemoryStoreError> for AppError {
    fn from(err: MemoryStoreError) -> Self {
        AppError::storage(err.to_string())
    }
}

#[derive(Debug, Clone)]
struct StoredApplication {
    seq: u64,
    record: ApplicationRecord,
}

/// In-memory application store using a papaya lock-free HashMap.
///
/// Records are keyed by id. Listings follow insertion order; updates keep a
/// record's original position.
#[derive(Debug)]
pub struct InMemoryApplicationStore {
    data: PapayaHashMap<String, StoredApplication>,
    sequence: AtomicU64,
    collation: Collation,
}

impl InMemoryApplicationStore {
    /// Creates an empty store with ordinal collation.
    #[must_use]
    pub fn new() -> Self {
        Self::with_collation(Collation::Ordinal)
    }

    /// Creates an empty store with the given collation.
    #[must_use]
    pub fn with_collation(collation: Collation) -> Self {
        Self {
            data: PapayaHashMap::new(),
            sequence: AtomicU64::new(1),
            collation,
        }
    }

    /// Returns the lookup collation.
    #[must_use]
    pub fn collation(&self) -> Collation {
        self.collation
    }

    /// Number of stored applications.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.pin().len()
    }

    /// Returns `true` if no application is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All stored applications in insertion order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<ApplicationRecord> {
        self.ordered(|_| true)
    }

    /// Replaces the store content with `records`, preserving their order.
    ///
    /// Records without an id are assigned one.
    ///
    /// # Errors
    ///
    /// Returns a conflict if two records share an id. The store is left empty
    /// in that case.
    pub fn restore(&self, records: Vec<ApplicationRecord>) -> Result<(), MemoryStoreError> {
        let guard = self.data.pin();
        guard.clear();

        let total = records.len();
        for mut record in records {
            if let Err(err) = self.insert_new(&mut record) {
                guard.clear();
                return Err(err);
            }
        }

        tracing::debug!(count = total, "Restored application store");
        Ok(())
    }

    fn next_seq(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::SeqCst)
    }

    fn insert_new(&self, record: &mut ApplicationRecord) -> Result<(), MemoryStoreError> {
        let id = match record.id() {
            Some(id) => id.to_string(),
            None => {
                let id = uuid::Uuid::new_v4().to_string();
                record.id = Some(id.clone());
                id
            }
        };

        let stored = StoredApplication {
            seq: self.next_seq(),
            record: record.clone(),
        };

        self.data
            .pin()
            .try_insert(id.clone(), stored)
            .map(|_| ())
            .map_err(|_| MemoryStoreError::Conflict { id })
    }

    fn replace(&self, record: &ApplicationRecord) -> Result<(), MemoryStoreError> {
        let id = record.id().ok_or(MemoryStoreError::MissingId)?;
        let guard = self.data.pin();

        let seq = guard
            .get(id)
            .map(|existing| existing.seq)
            .ok_or_else(|| MemoryStoreError::NotFound { id: id.to_string() })?;

        guard.insert(
            id.to_string(),
            StoredApplication {
                seq,
                record: record.clone(),
            },
        );
        Ok(())
    }

    fn remove(&self, record: &ApplicationRecord) -> Result<(), MemoryStoreError> {
        let id = record.id().ok_or(MemoryStoreError::MissingId)?;
        self.data
            .pin()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| MemoryStoreError::NotFound { id: id.to_string() })
    }

    fn ordered(&self, predicate: impl Fn(&ApplicationRecord) -> bool) -> Vec<ApplicationRecord> {
        let guard = self.data.pin();
        let mut matching: Vec<&StoredApplication> = guard
            .iter()
            .map(|(_, stored)| stored)
            .filter(|stored| predicate(&stored.record))
            .collect();
        matching.sort_by_key(|stored| stored.seq);
        matching.into_iter().map(|s| s.record.clone()).collect()
    }

    fn page(
        records: Vec<ApplicationRecord>,
        count: Option<usize>,
        offset: Option<usize>,
    ) -> Vec<ApplicationRecord> {
        records
            .into_iter()
            .skip(offset.unwrap_or(0))
            .take(count.unwrap_or(usize::MAX))
            .collect()
    }

    fn any_uri(&self, uris: &[String], address: &str) -> bool {
        uris.iter().any(|u| self.collation.matches(u, address))
    }
}

impl Default for InMemoryApplicationStore {
    fn default() -> Self {
        Self::new()
    }
}

fn ensure_active(cancel: &CancellationToken) -> AppResult<()> {
    if cancel.is_cancelled() {
        return Err(AppError::Cancelled);
    }
    Ok(())
}

#[async_trait]
impl ApplicationStore for InMemoryApplicationStore {
    async fn count(&self, cancel: &CancellationToken) -> AppResult<u64> {
        ensure_active(cancel)?;
        Ok(self.len() as u64)
    }

    async fn count_matching(
        &self,
        filter: &ApplicationFilter,
        cancel: &CancellationToken,
    ) -> AppResult<u64> {
        ensure_active(cancel)?;
        let guard = self.data.pin();
        Ok(guard.iter().filter(|(_, s)| filter(&s.record)).count() as u64)
    }

    async fn create(
        &self,
        record: &mut ApplicationRecord,
        cancel: &CancellationToken,
    ) -> AppResult<()> {
        ensure_active(cancel)?;
        self.insert_new(record)?;
        Ok(())
    }

    async fn update(
        &self,
        record: &ApplicationRecord,
        cancel: &CancellationToken,
    ) -> AppResult<()> {
        ensure_active(cancel)?;
        self.replace(record)?;
        Ok(())
    }

    async fn delete(
        &self,
        record: &ApplicationRecord,
        cancel: &CancellationToken,
    ) -> AppResult<()> {
        ensure_active(cancel)?;
        self.remove(record)?;
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> AppResult<Option<ApplicationRecord>> {
        ensure_active(cancel)?;
        Ok(self.data.pin().get(id).map(|s| s.record.clone()))
    }

    async fn find_by_client_id(
        &self,
        client_id: &str,
        cancel: &CancellationToken,
    ) -> AppResult<Option<ApplicationRecord>> {
        ensure_active(cancel)?;
        let candidates = self.ordered(|r| {
            r.client_id()
                .is_some_and(|c| self.collation.matches(c, client_id))
        });

        // An exact match wins over one that only matches under the collation.
        let exact = candidates
            .iter()
            .position(|r| r.client_id() == Some(client_id))
            .unwrap_or(0);
        Ok(candidates.into_iter().nth(exact))
    }

    async fn find_by_post_logout_redirect_uri(
        &self,
        address: &str,
        cancel: &CancellationToken,
    ) -> AppResult<Vec<ApplicationRecord>> {
        ensure_active(cancel)?;
        Ok(self.ordered(|r| self.any_uri(&r.post_logout_redirect_uris, address)))
    }

    async fn find_by_redirect_uri(
        &self,
        address: &str,
        cancel: &CancellationToken,
    ) -> AppResult<Vec<ApplicationRecord>> {
        ensure_active(cancel)?;
        Ok(self.ordered(|r| self.any_uri(&r.redirect_uris, address)))
    }

    async fn list(
        &self,
        count: Option<usize>,
        offset: Option<usize>,
        cancel: &CancellationToken,
    ) -> AppResult<Vec<ApplicationRecord>> {
        ensure_active(cancel)?;
        Ok(Self::page(self.snapshot(), count, offset))
    }

    async fn list_matching(
        &self,
        filter: &ApplicationFilter,
        count: Option<usize>,
        offset: Option<usize>,
        cancel: &CancellationToken,
    ) -> AppResult<Vec<ApplicationRecord>> {
        ensure_active(cancel)?;
        Ok(Self::page(self.ordered(filter), count, offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(client_id: &str) -> ApplicationRecord {
        ApplicationRecord {
            client_id: Some(client_id.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_assigns_uuid() {
        let store = InMemoryApplicationStore::new();
        let cancel = CancellationToken::new();
        let mut app = record("portal");

        store.create(&mut app, &cancel).await.unwrap();

        let id = app.id().unwrap();
        assert!(uuid::Uuid::parse_str(id).is_ok());
        assert_eq!(store.find_by_id(id, &cancel).await.unwrap(), Some(app.clone()));
    }

    #[tokio::test]
    async fn test_create_duplicate_id_conflicts() {
        let store = InMemoryApplicationStore::new();
        let cancel = CancellationToken::new();
        let mut first = ApplicationRecord {
            id: Some("fixed".to_string()),
            ..record("a")
        };
        store.create(&mut first, &cancel).await.unwrap();

        let mut second = ApplicationRecord {
            id: Some("fixed".to_string()),
            ..record("b")
        };
        let err = store.create(&mut second, &cancel).await.unwrap_err();
        assert!(matches!(err, AppError::Storage { .. }));
        assert!(err.to_string().contains("already exists"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_update_and_delete_missing_record() {
        let store = InMemoryApplicationStore::new();
        let cancel = CancellationToken::new();
        let ghost = ApplicationRecord {
            id: Some("ghost".to_string()),
            ..record("ghost")
        };

        assert!(store.update(&ghost, &cancel).await.is_err());
        assert!(store.delete(&ghost, &cancel).await.is_err());
        assert!(store.delete(&record("no-id"), &cancel).await.is_err());
    }

    #[tokio::test]
    async fn test_listing_keeps_insertion_order_across_updates() {
        let store = InMemoryApplicationStore::new();
        let cancel = CancellationToken::new();
        let mut apps: Vec<_> = ["c", "a", "b"].into_iter().map(record).collect();
        for app in &mut apps {
            store.create(app, &cancel).await.unwrap();
        }

        apps[0].display_name = Some("Changed".to_string());
        store.update(&apps[0], &cancel).await.unwrap();

        let listed = store.list(None, None, &cancel).await.unwrap();
        assert_eq!(listed, apps);

        let page = store.list(Some(1), Some(1), &cancel).await.unwrap();
        assert_eq!(page, vec![apps[1].clone()]);

        let filter = |r: &ApplicationRecord| r.client_id() != Some("a");
        assert_eq!(store.count_matching(&filter, &cancel).await.unwrap(), 2);
        assert_eq!(
            store.get_matching(&filter, &cancel).await.unwrap(),
            Some(apps[0].clone())
        );
    }

    #[tokio::test]
    async fn test_collation_controls_lookups() {
        let cancel = CancellationToken::new();
        let mut app = ApplicationRecord {
            redirect_uris: vec!["https://app.example.com/cb".to_string()],
            ..record("Portal")
        };

        let ordinal = InMemoryApplicationStore::new();
        ordinal.create(&mut app.clone(), &cancel).await.unwrap();
        assert!(ordinal.find_by_client_id("portal", &cancel).await.unwrap().is_none());
        assert!(
            ordinal
                .find_by_redirect_uri("https://APP.example.com/cb", &cancel)
                .await
                .unwrap()
                .is_empty()
        );

        let relaxed = InMemoryApplicationStore::with_collation(Collation::CaseInsensitive);
        relaxed.create(&mut app, &cancel).await.unwrap();
        assert!(relaxed.find_by_client_id("portal", &cancel).await.unwrap().is_some());
        assert_eq!(
            relaxed
                .find_by_redirect_uri("https://APP.example.com/cb", &cancel)
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_case_insensitive_lookup_prefers_exact_client_id() {
        let store = InMemoryApplicationStore::with_collation(Collation::CaseInsensitive);
        let cancel = CancellationToken::new();
        store.create(&mut record("Alice"), &cancel).await.unwrap();
        store.create(&mut record("alice"), &cancel).await.unwrap();

        let found = store.find_by_client_id("alice", &cancel).await.unwrap();
        assert_eq!(found.unwrap().client_id(), Some("alice"));

        let found = store.find_by_client_id("ALICE", &cancel).await.unwrap();
        assert_eq!(found.unwrap().client_id(), Some("Alice"));
    }

    #[test]
    fn test_snapshot_restore() {
        let store = InMemoryApplicationStore::new();
        let records = vec![
            ApplicationRecord {
                id: Some("2".to_string()),
                ..record("second")
            },
            record("no-id"),
        ];

        store.restore(records).unwrap();
        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].id(), Some("2"));
        assert!(snapshot[1].id().is_some());

        let duplicates = vec![snapshot[0].clone(), snapshot[0].clone()];
        assert_eq!(
            store.restore(duplicates),
            Err(MemoryStoreError::Conflict {
                id: "2".to_string()
            })
        );
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_operations() {
        let store = InMemoryApplicationStore::new();
        let cancel = CancellationToken::new();
        cancel.cancel();

        assert!(matches!(store.count(&cancel).await, Err(AppError::Cancelled)));
        assert!(matches!(
            store.create(&mut record("x"), &cancel).await,
            Err(AppError::Cancelled)
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn test_collation_serde_names() {
        let json = serde_json::to_string(&Collation::CaseInsensitive).unwrap();
        assert_eq!(json, "\"case_insensitive\"");
    }
}
