//! Mock application store for unit tests.

use std::sync::RwLock;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::storage::{ApplicationFilter, ApplicationStore};
use crate::types::ApplicationRecord;
use crate::{AppError, AppResult};

/// Vec-backed store. Optionally compares client ids and URIs ignoring ASCII
/// case, like a relational backend with a case-insensitive collation.
pub(crate) struct MockApplicationStore {
    records: RwLock<Vec<ApplicationRecord>>,
    case_insensitive: bool,
    next_id: RwLock<u64>,
}

impl MockApplicationStore {
    pub(crate) fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            case_insensitive: false,
            next_id: RwLock::new(1),
        }
    }

    pub(crate) fn case_insensitive() -> Self {
        Self {
            case_insensitive: true,
            ..Self::new()
        }
    }

    pub(crate) fn insert(&self, record: ApplicationRecord) {
        self.records.write().unwrap().push(record);
    }

    pub(crate) fn all(&self) -> Vec<ApplicationRecord> {
        self.records.read().unwrap().clone()
    }

    fn matches(&self, stored: &str, wanted: &str) -> bool {
        if self.case_insensitive {
            stored.eq_ignore_ascii_case(wanted)
        } else {
            stored == wanted
        }
    }

    fn check(cancel: &CancellationToken) -> AppResult<()> {
        if cancel.is_cancelled() {
            return Err(AppError::Cancelled);
        }
        Ok(())
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
}

#[async_trait]
impl ApplicationStore for MockApplicationStore {
    async fn count(&self, cancel: &CancellationToken) -> AppResult<u64> {
        Self::check(cancel)?;
        Ok(self.records.read().unwrap().len() as u64)
    }

    async fn count_matching(
        &self,
        filter: &ApplicationFilter,
        cancel: &CancellationToken,
    ) -> AppResult<u64> {
        Self::check(cancel)?;
        Ok(self.records.read().unwrap().iter().filter(|r| filter(*r)).count() as u64)
    }

    async fn create(
        &self,
        record: &mut ApplicationRecord,
        cancel: &CancellationToken,
    ) -> AppResult<()> {
        Self::check(cancel)?;
        if record.id().is_none() {
            let mut next_id = self.next_id.write().unwrap();
            record.id = Some(next_id.to_string());
            *next_id += 1;
        }
        self.insert(record.clone());
        Ok(())
    }

    async fn update(
        &self,
        record: &ApplicationRecord,
        cancel: &CancellationToken,
    ) -> AppResult<()> {
        Self::check(cancel)?;
        let mut records = self.records.write().unwrap();
        let slot = records
            .iter_mut()
            .find(|r| r.id == record.id)
            .ok_or_else(|| AppError::storage("Application not found"))?;
        *slot = record.clone();
        Ok(())
    }

    async fn delete(
        &self,
        record: &ApplicationRecord,
        cancel: &CancellationToken,
    ) -> AppResult<()> {
        Self::check(cancel)?;
        self.records.write().unwrap().retain(|r| r.id != record.id);
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> AppResult<Option<ApplicationRecord>> {
        Self::check(cancel)?;
        Ok(self
            .records
            .read()
            .unwrap()
            .iter()
            .find(|r| r.id() == Some(id))
            .cloned())
    }

    async fn find_by_client_id(
        &self,
        client_id: &str,
        cancel: &CancellationToken,
    ) -> AppResult<Option<ApplicationRecord>> {
        Self::check(cancel)?;
        let records = self.records.read().unwrap();
        let exact = records.iter().find(|r| r.client_id() == Some(client_id));
        Ok(exact
            .or_else(|| {
                records
                    .iter()
                    .find(|r| r.client_id().is_some_and(|c| self.matches(c, client_id)))
            })
            .cloned())
    }

    async fn find_by_post_logout_redirect_uri(
        &self,
        address: &str,
        cancel: &CancellationToken,
    ) -> AppResult<Vec<ApplicationRecord>> {
        Self::check(cancel)?;
        Ok(self
            .records
            .read()
            .unwrap()
            .iter()
            .filter(|r| {
                r.post_logout_redirect_uris
                    .iter()
                    .any(|u| self.matches(u, address))
            })
            .cloned()
            .collect())
    }

    async fn find_by_redirect_uri(
        &self,
        address: &str,
        cancel: &CancellationToken,
    ) -> AppResult<Vec<ApplicationRecord>> {
        Self::check(cancel)?;
        Ok(self
            .records
            .read()
            .unwrap()
            .iter()
            .filter(|r| r.redirect_uris.iter().any(|u| self.matches(u, address)))
            .cloned()
            .collect())
    }

    async fn list(
        &self,
        count: Option<usize>,
        offset: Option<usize>,
        cancel: &CancellationToken,
    ) -> AppResult<Vec<ApplicationRecord>> {
        Self::check(cancel)?;
        Ok(Self::page(self.all(), count, offset))
    }

    async fn list_matching(
        &self,
        filter: &ApplicationFilter,
        count: Option<usize>,
        offset: Option<usize>,
        cancel: &CancellationToken,
    ) -> AppResult<Vec<ApplicationRecord>> {
        Self::check(cancel)?;
        let matching = self.all().into_iter().filter(|r| filter(r)).collect();
        Ok(Self::page(matching, count, offset))
    }
}
