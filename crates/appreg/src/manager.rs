//! Client application manager.
//!
//! The [`ApplicationManager`] is the entry point of the engine. It reads and
//! writes through an [`ApplicationStore`], obfuscates and verifies secrets
//! through a [`SecretCodec`], answers entitlement questions through a
//! [`PermissionEvaluator`] and runs an [`ApplicationValidator`] before every
//! persist, aborting on the first violation.
//!
//! Every operation that reaches a collaborator takes a [`CancellationToken`]
//! and stops at the next collaborator call once the token is raised.

use std::collections::BTreeSet;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::{ConfigError, RegistryConfig};
use crate::permissions::{DefaultPermissionEvaluator, PermissionEvaluator, endpoints};
use crate::secret::{Argon2SecretHasher, SecretCodec, SecretHasher};
use crate::storage::{ApplicationFilter, ApplicationStore};
use crate::types::application::non_empty;
use crate::types::{
    AbsoluteUri, ApplicationDescriptor, ApplicationRecord, ClientType, consent_types,
};
use crate::validation::{ApplicationValidator, DefaultApplicationValidator, Violation};
use crate::{AppError, AppResult};

/// Orchestrates client application registration and validation.
///
/// # Example
///
/// ```ignore
/// use appreg::{ApplicationDescriptor, ApplicationManager};
///
/// let manager = ApplicationManager::new(store);
/// let cancel = CancellationToken::new();
///
/// let descriptor = ApplicationDescriptor::new("backend")
///     .with_secret("s3cr3t")
///     .with_permission("endpoint:token");
/// let record = manager.create_from_descriptor(&descriptor, &cancel).await?;
///
/// assert!(manager.validate_client_secret(&record, "s3cr3t", &cancel).await?);
/// ```
pub struct ApplicationManager {
    store: Arc<dyn ApplicationStore>,
    secrets: SecretCodec,
    permissions: Arc<dyn PermissionEvaluator>,
    validator: Arc<dyn ApplicationValidator>,
}

impl ApplicationManager {
    /// Creates a manager with the default Argon2id hasher, permission
    /// evaluator and validator.
    #[must_use]
    pub fn new(store: Arc<dyn ApplicationStore>) -> Self {
        Self {
            store,
            secrets: SecretCodec::default(),
            permissions: Arc::new(DefaultPermissionEvaluator),
            validator: Arc::new(DefaultApplicationValidator),
        }
    }

    /// Creates a manager whose secret hasher follows `config`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the configuration is invalid.
    pub fn with_config(
        store: Arc<dyn ApplicationStore>,
        config: &RegistryConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let hasher = Argon2SecretHasher::from_config(&config.secrets)
            .map_err(|e| ConfigError::InvalidValue(e.to_string()))?;
        Ok(Self::new(store).with_secret_hasher(Arc::new(hasher)))
    }

    /// Replaces the secret hashing primitive.
    #[must_use]
    pub fn with_secret_hasher(mut self, hasher: Arc<dyn SecretHasher>) -> Self {
        self.secrets = SecretCodec::new(hasher);
        self
    }

    /// Replaces the permission evaluator.
    #[must_use]
    pub fn with_permission_evaluator(mut self, evaluator: Arc<dyn PermissionEvaluator>) -> Self {
        self.permissions = evaluator;
        self
    }

    /// Replaces the validator.
    #[must_use]
    pub fn with_validator(mut self, validator: Arc<dyn ApplicationValidator>) -> Self {
        self.validator = validator;
        self
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn store(&self) -> &dyn ApplicationStore {
        self.store.as_ref()
    }

    // =========================================================================
    // Counting and listing
    // =========================================================================

    /// Count all applications.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails or the operation is cancelled.
    pub async fn count(&self, cancel: &CancellationToken) -> AppResult<u64> {
        ensure_active(cancel)?;
        self.store.count(cancel).await
    }

    /// Count the applications matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails or the operation is cancelled.
    pub async fn count_matching(
        &self,
        filter: &ApplicationFilter,
        cancel: &CancellationToken,
    ) -> AppResult<u64> {
        ensure_active(cancel)?;
        self.store.count_matching(filter, cancel).await
    }

    /// List applications, optionally paginated.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails or the operation is cancelled.
    pub async fn list(
        &self,
        count: Option<usize>,
        offset: Option<usize>,
        cancel: &CancellationToken,
    ) -> AppResult<Vec<ApplicationRecord>> {
        ensure_active(cancel)?;
        self.store.list(count, offset, cancel).await
    }

    /// List the applications matching `filter`, optionally paginated.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails or the operation is cancelled.
    pub async fn list_matching(
        &self,
        filter: &ApplicationFilter,
        count: Option<usize>,
        offset: Option<usize>,
        cancel: &CancellationToken,
    ) -> AppResult<Vec<ApplicationRecord>> {
        ensure_active(cancel)?;
        self.store.list_matching(filter, count, offset, cancel).await
    }

    /// Return the first application matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails or the operation is cancelled.
    pub async fn get_matching(
        &self,
        filter: &ApplicationFilter,
        cancel: &CancellationToken,
    ) -> AppResult<Option<ApplicationRecord>> {
        ensure_active(cancel)?;
        self.store.get_matching(filter, cancel).await
    }

    // =========================================================================
    // Creation and deletion
    // =========================================================================

    /// Create an application, obfuscating `secret` when one is supplied.
    ///
    /// When the record has no client type, it becomes `confidential` if a
    /// secret is supplied and `public` otherwise. The store assigns the
    /// record's identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The record already carries a secret hash (`Precondition`)
    /// - A non-public application is created without a secret, or the client
    ///   type is unknown (`InvalidState`)
    /// - The record fails validation (`Validation`)
    /// - The store fails or the operation is cancelled
    pub async fn create(
        &self,
        record: &mut ApplicationRecord,
        secret: Option<&str>,
        cancel: &CancellationToken,
    ) -> AppResult<()> {
        if record.client_secret().is_some() {
            return Err(AppError::precondition(
                "The client secret hash cannot be set directly on the application.",
            ));
        }

        let secret = secret.filter(|s| !s.is_empty());

        if record.client_type().is_none() {
            let inferred = if secret.is_some() {
                ClientType::Confidential
            } else {
                ClientType::Public
            };
            record.client_type = Some(inferred.as_str().to_string());
        }

        if secret.is_none() && !self.is_public(record)? {
            return Err(AppError::invalid_state(
                "A client secret must be provided when creating a confidential or hybrid application.",
            ));
        }

        if let Some(secret) = secret {
            ensure_active(cancel)?;
            record.client_secret = Some(self.secrets.obfuscate(secret).await?);
        }

        self.ensure_valid(record, cancel).await?;

        ensure_active(cancel)?;
        self.store.create(record, cancel).await?;

        tracing::debug!(
            id = record.id().unwrap_or_default(),
            client_id = record.client_id().unwrap_or_default(),
            "Application created"
        );
        Ok(())
    }

    /// Create an application from a descriptor and return the stored record.
    ///
    /// The descriptor's plaintext secret is obfuscated exactly once.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`create`](Self::create).
    pub async fn create_from_descriptor(
        &self,
        descriptor: &ApplicationDescriptor,
        cancel: &CancellationToken,
    ) -> AppResult<ApplicationRecord> {
        let mut record = self.store.instantiate();
        populate(&mut record, descriptor);

        let secret = record.client_secret.take();
        self.create(&mut record, secret.as_deref(), cancel).await?;
        Ok(record)
    }

    /// Delete an application.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails or the operation is cancelled.
    pub async fn delete(
        &self,
        record: &ApplicationRecord,
        cancel: &CancellationToken,
    ) -> AppResult<()> {
        ensure_active(cancel)?;
        self.store.delete(record, cancel).await?;

        tracing::debug!(
            id = record.id().unwrap_or_default(),
            client_id = record.client_id().unwrap_or_default(),
            "Application deleted"
        );
        Ok(())
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// Find an application by its store-assigned identifier.
    ///
    /// # Errors
    ///
    /// Returns `Precondition` for an empty identifier, or an error if the
    /// store fails or the operation is cancelled.
    pub async fn find_by_id(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> AppResult<Option<ApplicationRecord>> {
        if id.is_empty() {
            return Err(AppError::precondition("The identifier cannot be null or empty."));
        }

        ensure_active(cancel)?;
        self.store.find_by_id(id, cancel).await
    }

    /// Find an application by client identifier, compared ordinally.
    ///
    /// # Errors
    ///
    /// Returns `Precondition` for an empty identifier, or an error if the
    /// store fails or the operation is cancelled.
    pub async fn find_by_client_id(
        &self,
        client_id: &str,
        cancel: &CancellationToken,
    ) -> AppResult<Option<ApplicationRecord>> {
        if client_id.is_empty() {
            return Err(AppError::precondition("The identifier cannot be null or empty."));
        }

        ensure_active(cancel)?;
        let record = self.store.find_by_client_id(client_id, cancel).await?;

        // The store may have matched case-insensitively.
        Ok(record.filter(|r| r.client_id() == Some(client_id)))
    }

    /// Find the applications registering `address` as a post-logout redirect
    /// URI, compared ordinally.
    ///
    /// Each matching application is returned once, in store order, even if it
    /// registers `address` more than once.
    ///
    /// # Errors
    ///
    /// Returns `Precondition` for an empty address, or an error if the store
    /// fails or the operation is cancelled.
    pub async fn find_by_post_logout_redirect_uri(
        &self,
        address: &str,
        cancel: &CancellationToken,
    ) -> AppResult<Vec<ApplicationRecord>> {
        if address.is_empty() {
            return Err(AppError::precondition("The address cannot be null or empty."));
        }

        ensure_active(cancel)?;
        let candidates = self
            .store
            .find_by_post_logout_redirect_uri(address, cancel)
            .await?;

        Ok(candidates
            .into_iter()
            .filter(|r| r.post_logout_redirect_uris.iter().any(|u| u == address))
            .collect())
    }

    /// Find the applications registering `address` as a redirect URI,
    /// compared ordinally.
    ///
    /// Each matching application is returned once, in store order, even if it
    /// registers `address` more than once.
    ///
    /// # Errors
    ///
    /// Returns `Precondition` for an empty address, or an error if the store
    /// fails or the operation is cancelled.
    pub async fn find_by_redirect_uri(
        &self,
        address: &str,
        cancel: &CancellationToken,
    ) -> AppResult<Vec<ApplicationRecord>> {
        if address.is_empty() {
            return Err(AppError::precondition("The address cannot be null or empty."));
        }

        ensure_active(cancel)?;
        let candidates = self.store.find_by_redirect_uri(address, cancel).await?;

        Ok(candidates
            .into_iter()
            .filter(|r| r.redirect_uris.iter().any(|u| u == address))
            .collect())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Returns the client identifier.
    #[must_use]
    pub fn client_id<'a>(&self, record: &'a ApplicationRecord) -> Option<&'a str> {
        record.client_id()
    }

    /// Returns the client type.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` if the stored value is not a known client type.
    pub fn client_type(&self, record: &ApplicationRecord) -> AppResult<Option<ClientType>> {
        record
            .client_type()
            .map(|raw| {
                raw.parse::<ClientType>()
                    .map_err(|e| AppError::invalid_state(e.to_string()))
            })
            .transpose()
    }

    /// Returns the consent type, defaulting to `explicit`.
    #[must_use]
    pub fn consent_type<'a>(&self, record: &'a ApplicationRecord) -> &'a str {
        non_empty(&record.consent_type).unwrap_or(consent_types::EXPLICIT)
    }

    /// Returns the display name.
    #[must_use]
    pub fn display_name<'a>(&self, record: &'a ApplicationRecord) -> Option<&'a str> {
        non_empty(&record.display_name)
    }

    /// Returns the store-assigned identifier.
    #[must_use]
    pub fn id<'a>(&self, record: &'a ApplicationRecord) -> Option<&'a str> {
        record.id()
    }

    /// Returns the explicitly granted permissions.
    #[must_use]
    pub fn permissions<'a>(&self, record: &'a ApplicationRecord) -> &'a BTreeSet<String> {
        &record.permissions
    }

    /// Returns the post-logout redirect URIs.
    #[must_use]
    pub fn post_logout_redirect_uris<'a>(&self, record: &'a ApplicationRecord) -> &'a [String] {
        &record.post_logout_redirect_uris
    }

    /// Returns the redirect URIs.
    #[must_use]
    pub fn redirect_uris<'a>(&self, record: &'a ApplicationRecord) -> &'a [String] {
        &record.redirect_uris
    }

    /// Returns `true` if the stored client type is exactly `client_type`.
    #[must_use]
    pub fn has_client_type(&self, record: &ApplicationRecord, client_type: ClientType) -> bool {
        record.client_type() == Some(client_type.as_str())
    }

    /// Returns `true` if the effective consent type is `consent_type`.
    #[must_use]
    pub fn has_consent_type(&self, record: &ApplicationRecord, consent_type: &str) -> bool {
        self.consent_type(record) == consent_type
    }

    /// Returns `true` if the application is public. An absent type counts as public.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` if the stored client type is unknown.
    pub fn is_public(&self, record: &ApplicationRecord) -> AppResult<bool> {
        Ok(matches!(
            self.client_type(record)?,
            None | Some(ClientType::Public)
        ))
    }

    /// Returns `true` if the application is confidential.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` if the stored client type is unknown.
    pub fn is_confidential(&self, record: &ApplicationRecord) -> AppResult<bool> {
        Ok(self.client_type(record)? == Some(ClientType::Confidential))
    }

    /// Returns `true` if the application is hybrid.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` if the stored client type is unknown.
    pub fn is_hybrid(&self, record: &ApplicationRecord) -> AppResult<bool> {
        Ok(self.client_type(record)? == Some(ClientType::Hybrid))
    }

    /// Returns `true` if the application is granted `permission`, explicitly
    /// or by entailment.
    ///
    /// # Errors
    ///
    /// Returns `Precondition` for an empty permission name.
    pub fn has_permission(&self, record: &ApplicationRecord, permission: &str) -> AppResult<bool> {
        if permission.is_empty() {
            return Err(AppError::precondition("The permission name cannot be null or empty."));
        }

        Ok(self.permissions.has_permission(record, permission))
    }

    // =========================================================================
    // Updates
    // =========================================================================

    /// Validate and persist changes to an application. The secret is untouched.
    ///
    /// # Errors
    ///
    /// Returns `Validation` with the first violation, or an error if the store
    /// fails or the operation is cancelled.
    pub async fn update(
        &self,
        record: &ApplicationRecord,
        cancel: &CancellationToken,
    ) -> AppResult<()> {
        self.ensure_valid(record, cancel).await?;

        ensure_active(cancel)?;
        self.store.update(record, cancel).await?;

        tracing::debug!(
            id = record.id().unwrap_or_default(),
            client_id = record.client_id().unwrap_or_default(),
            "Application updated"
        );
        Ok(())
    }

    /// Replace the application's secret, then validate and persist.
    ///
    /// An absent or empty `secret` removes the stored secret.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`update`](Self::update).
    pub async fn update_with_secret(
        &self,
        record: &mut ApplicationRecord,
        secret: Option<&str>,
        cancel: &CancellationToken,
    ) -> AppResult<()> {
        match secret.filter(|s| !s.is_empty()) {
            None => record.client_secret = None,
            Some(secret) => {
                ensure_active(cancel)?;
                record.client_secret = Some(self.secrets.obfuscate(secret).await?);
            }
        }

        self.update(record, cancel).await
    }

    /// Apply `transform` to a descriptor snapshot of the application, then
    /// write the result back, validate and persist it.
    ///
    /// The descriptor initially holds the stored secret hash. Replacing it with
    /// a plaintext secret (or clearing it) routes through
    /// [`update_with_secret`](Self::update_with_secret); otherwise the secret
    /// is left as is.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if a stored URI cannot be parsed into the
    /// descriptor, plus the errors of [`update`](Self::update).
    pub async fn update_with<F>(
        &self,
        record: &mut ApplicationRecord,
        transform: F,
        cancel: &CancellationToken,
    ) -> AppResult<()>
    where
        F: FnOnce(&mut ApplicationDescriptor) + Send,
    {
        let comparand = record.client_secret.clone();

        let mut descriptor = self.to_descriptor(record)?;
        transform(&mut descriptor);
        populate(record, &descriptor);

        if non_empty(&record.client_secret) != non_empty(&comparand) {
            let secret = record.client_secret.take();
            return self
                .update_with_secret(record, secret.as_deref(), cancel)
                .await;
        }

        self.update(record, cancel).await
    }

    /// Build a descriptor snapshot of an application.
    ///
    /// The descriptor's secret is the stored hash.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if a stored URI is empty or not an absolute URI.
    pub fn to_descriptor(&self, record: &ApplicationRecord) -> AppResult<ApplicationDescriptor> {
        Ok(ApplicationDescriptor {
            client_id: record.client_id.clone(),
            client_secret: record.client_secret.clone(),
            client_type: record.client_type.clone(),
            consent_type: record.consent_type.clone(),
            display_name: record.display_name.clone(),
            permissions: record.permissions.clone(),
            post_logout_redirect_uris: parse_uris(record, &record.post_logout_redirect_uris)?,
            redirect_uris: parse_uris(record, &record.redirect_uris)?,
        })
    }

    // =========================================================================
    // Validation
    // =========================================================================

    /// Returns every violation of `record`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails or the operation is cancelled.
    pub async fn validate(
        &self,
        record: &ApplicationRecord,
        cancel: &CancellationToken,
    ) -> AppResult<Vec<Violation>> {
        ensure_active(cancel)?;
        self.validator
            .validate(self.store.as_ref(), record, cancel)
            .await
    }

    /// Verify a presented client secret.
    ///
    /// Public applications never authenticate with a secret, so this returns
    /// `false` for them, as it does for applications without a stored secret
    /// and for malformed stored hashes.
    ///
    /// # Errors
    ///
    /// Returns `Precondition` for an empty secret, `InvalidState` for an
    /// unknown client type, or `Cancelled`.
    pub async fn validate_client_secret(
        &self,
        record: &ApplicationRecord,
        secret: &str,
        cancel: &CancellationToken,
    ) -> AppResult<bool> {
        if secret.is_empty() {
            return Err(AppError::precondition("The secret cannot be null or empty."));
        }

        let client_id = record.client_id().unwrap_or_default();

        if self.is_public(record)? {
            tracing::warn!(
                client_id,
                "Client authentication cannot be enforced for public applications"
            );
            return Ok(false);
        }

        let Some(hash) = record.client_secret() else {
            tracing::warn!(
                client_id,
                "Client authentication failed because no secret is associated with the application"
            );
            return Ok(false);
        };

        ensure_active(cancel)?;
        if !self.secrets.verify(secret, hash).await? {
            tracing::warn!(client_id, "Client authentication failed");
            return Ok(false);
        }

        Ok(true)
    }

    /// Returns `true` if some application registers `address` as a
    /// post-logout redirect URI and may call the logout endpoint.
    ///
    /// # Errors
    ///
    /// Returns `Precondition` for an empty address, or an error if the store
    /// fails or the operation is cancelled.
    pub async fn validate_post_logout_redirect_uri(
        &self,
        address: &str,
        cancel: &CancellationToken,
    ) -> AppResult<bool> {
        for record in self.find_by_post_logout_redirect_uri(address, cancel).await? {
            if self.has_permission(&record, endpoints::LOGOUT)? {
                return Ok(true);
            }
        }

        tracing::warn!(
            address,
            "Post-logout redirect URI is not registered by any application allowed to use the logout endpoint"
        );
        Ok(false)
    }

    /// Returns `true` if `address` is one of the application's redirect URIs,
    /// compared ordinally.
    ///
    /// # Errors
    ///
    /// Returns `Precondition` for an empty address.
    pub fn validate_redirect_uri(&self, record: &ApplicationRecord, address: &str) -> AppResult<bool> {
        if address.is_empty() {
            return Err(AppError::precondition("The address cannot be null or empty."));
        }

        if record.redirect_uris.iter().any(|u| u == address) {
            return Ok(true);
        }

        tracing::warn!(
            client_id = record.client_id().unwrap_or_default(),
            address,
            "Redirect URI is not registered for the application"
        );
        Ok(false)
    }

    async fn ensure_valid(
        &self,
        record: &ApplicationRecord,
        cancel: &CancellationToken,
    ) -> AppResult<()> {
        let violations = self.validate(record, cancel).await?;
        match violations.into_iter().next() {
            None => Ok(()),
            Some(violation) => {
                tracing::debug!(
                    client_id = record.client_id().unwrap_or_default(),
                    violation = %violation,
                    "Application failed validation"
                );
                Err(AppError::validation(violation))
            }
        }
    }
}

impl std::fmt::Debug for ApplicationManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplicationManager")
            .field("secrets", &self.secrets)
            .finish_non_exhaustive()
    }
}

fn ensure_active(cancel: &CancellationToken) -> AppResult<()> {
    if cancel.is_cancelled() {
        return Err(AppError::Cancelled);
    }
    Ok(())
}

/// Copy every descriptor field onto the record.
fn populate(record: &mut ApplicationRecord, descriptor: &ApplicationDescriptor) {
    record.client_id = descriptor.client_id.clone();
    record.client_secret = descriptor.client_secret.clone();
    record.client_type = descriptor.client_type.clone();
    record.consent_type = descriptor.consent_type.clone();
    record.display_name = descriptor.display_name.clone();
    record.permissions = descriptor.permissions.clone();
    record.post_logout_redirect_uris = descriptor
        .post_logout_redirect_uris
        .iter()
        .map(|u| u.as_str().to_string())
        .collect();
    record.redirect_uris = descriptor
        .redirect_uris
        .iter()
        .map(|u| u.as_str().to_string())
        .collect();
}

fn parse_uris(record: &ApplicationRecord, uris: &[String]) -> AppResult<Vec<AbsoluteUri>> {
    uris.iter()
        .map(|u| AbsoluteUri::parse(u))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|violation| {
            tracing::warn!(
                client_id = record.client_id().unwrap_or_default(),
                violation = %violation,
                "Stored redirect URI could not be parsed"
            );
            AppError::validation(violation)
        })
}
