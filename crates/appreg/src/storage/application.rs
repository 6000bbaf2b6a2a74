//! Application storage trait.
//!
//! Defines the interface for client application persistence operations.
//! Implementations are provided by storage backends (e.g., `appreg-memory`).

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::AppResult;
use crate::types::ApplicationRecord;

/// Predicate forwarded to the store by the generic count/list/get operations.
pub type ApplicationFilter = dyn Fn(&ApplicationRecord) -> bool + Send + Sync;

// =============================================================================
// Application Store Trait
// =============================================================================

/// Storage operations for client applications.
///
/// Backends may compare client identifiers and URIs with whatever collation
/// their engine applies (relational stores are frequently case-insensitive).
/// The [`ApplicationManager`](crate::ApplicationManager) re-checks every match
/// with ordinal comparison, so lookups only need to return a superset.
///
/// Every operation receives the caller's cancellation token and should return
/// [`AppError::Cancelled`](crate::AppError::Cancelled) once it is raised.
///
/// # Example
///
/// ```ignore
/// use appreg::storage::ApplicationStore;
///
/// async fn example(store: &impl ApplicationStore, cancel: &CancellationToken) -> AppResult<()> {
///     if let Some(record) = store.find_by_client_id("portal", cancel).await? {
///         println!("Found application: {:?}", record.display_name);
///     }
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait ApplicationStore: Send + Sync {
    /// Count all applications.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn count(&self, cancel: &CancellationToken) -> AppResult<u64>;

    /// Count the applications matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn count_matching(
        &self,
        filter: &ApplicationFilter,
        cancel: &CancellationToken,
    ) -> AppResult<u64>;

    /// Instantiate a new, empty record.
    fn instantiate(&self) -> ApplicationRecord {
        ApplicationRecord::default()
    }

    /// Persist a new application.
    ///
    /// The store assigns `record.id` when it is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if an application with the same id exists or the
    /// storage operation fails.
    async fn create(
        &self,
        record: &mut ApplicationRecord,
        cancel: &CancellationToken,
    ) -> AppResult<()>;

    /// Persist changes to an existing application.
    ///
    /// # Errors
    ///
    /// Returns an error if the application doesn't exist or the storage
    /// operation fails.
    async fn update(&self, record: &ApplicationRecord, cancel: &CancellationToken)
    -> AppResult<()>;

    /// Remove an application.
    ///
    /// # Errors
    ///
    /// Returns an error if the application doesn't exist or the storage
    /// operation fails.
    async fn delete(&self, record: &ApplicationRecord, cancel: &CancellationToken)
    -> AppResult<()>;

    /// Find an application by its store-assigned identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_id(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> AppResult<Option<ApplicationRecord>>;

    /// Find an application by its OAuth client_id.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_client_id(
        &self,
        client_id: &str,
        cancel: &CancellationToken,
    ) -> AppResult<Option<ApplicationRecord>>;

    /// Find the applications registering `address` as a post-logout redirect URI.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_post_logout_redirect_uri(
        &self,
        address: &str,
        cancel: &CancellationToken,
    ) -> AppResult<Vec<ApplicationRecord>>;

    /// Find the applications registering `address` as a redirect URI.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_redirect_uri(
        &self,
        address: &str,
        cancel: &CancellationToken,
    ) -> AppResult<Vec<ApplicationRecord>>;

    /// List applications in a stable order.
    ///
    /// # Arguments
    ///
    /// * `count` - Maximum number of applications to return
    /// * `offset` - Number of applications to skip for pagination
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn list(
        &self,
        count: Option<usize>,
        offset: Option<usize>,
        cancel: &CancellationToken,
    ) -> AppResult<Vec<ApplicationRecord>>;

    /// List the applications matching `filter`, in the same order as [`list`](Self::list).
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn list_matching(
        &self,
        filter: &ApplicationFilter,
        count: Option<usize>,
        offset: Option<usize>,
        cancel: &CancellationToken,
    ) -> AppResult<Vec<ApplicationRecord>>;

    /// Return the first application matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn get_matching(
        &self,
        filter: &ApplicationFilter,
        cancel: &CancellationToken,
    ) -> AppResult<Option<ApplicationRecord>> {
        let mut matches = self.list_matching(filter, Some(1), None, cancel).await?;
        Ok(matches.pop())
    }
}
