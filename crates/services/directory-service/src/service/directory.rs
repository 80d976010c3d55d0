//! Identity directory over three independently keyed tables.
//!
//! Uniqueness of email and handle comes solely from `insert_if_absent` on
//! the index tables. Multi-row writes record an undo log and replay it on
//! failure, and run on their own task so a dropped caller cannot stop them
//! halfway. The cache is read-through for lookups and invalidated after
//! every mutation; cache trouble never fails an operation.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use common::{AppError, AppResult, ResilienceConfig};
use domain::validation::{
    discriminator_candidates, validate_discriminator, validate_email, validate_username,
};
use domain::{
    Account, AccountDraft, EmailIndexEntry, Handle, HandleIndexEntry, IdentifierChange,
    ProfilePatch,
};

use super::compensation::{Compensation, Compensations, Rollback};
use crate::cache::{account_key, CacheAdapter};
use crate::storage::{Deadline, Row, RowKey, StorageAdapter};

/// Directory operations consumed by the HTTP layer.
#[async_trait]
pub trait DirectoryService: Send + Sync {
    /// Register a new account. Email and handle must both be free.
    async fn create_account(&self, draft: AccountDraft) -> AppResult<Account>;

    async fn get_by_id(&self, id: Uuid) -> AppResult<Account>;

    async fn get_by_email(&self, email: &str) -> AppResult<Account>;

    async fn get_by_handle(&self, username: &str, discriminator: &str) -> AppResult<Account>;

    /// Change non-identifying attributes.
    async fn update_profile(&self, id: Uuid, patch: ProfilePatch) -> AppResult<Account>;

    /// Re-key the account under a new email and/or handle.
    async fn update_identifiers(&self, id: Uuid, change: IdentifierChange)
        -> AppResult<Account>;

    async fn delete_account(&self, id: Uuid) -> AppResult<()>;

    /// Reachability of the backing stores.
    async fn health(&self) -> HealthReport;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub storage: bool,
    pub cache: bool,
}

impl HealthReport {
    /// The directory can serve without its cache.
    pub fn is_healthy(&self) -> bool {
        self.storage
    }
}

/// Concrete directory over a storage and a cache adapter.
#[derive(Clone)]
pub struct Directory {
    inner: Arc<Inner>,
}

struct Inner {
    storage: Arc<dyn StorageAdapter>,
    cache: Arc<dyn CacheAdapter>,
    resilience: ResilienceConfig,
    cache_ttl: Duration,
}

impl Directory {
    pub fn new(
        storage: Arc<dyn StorageAdapter>,
        cache: Arc<dyn CacheAdapter>,
        resilience: ResilienceConfig,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                storage,
                cache,
                resilience,
                cache_ttl,
            }),
        }
    }

    /// Run a multi-step write to completion on its own task.
    async fn spawn_write<T, F, Fut>(&self, op: &'static str, write: F) -> AppResult<T>
    where
        F: FnOnce(Arc<Inner>) -> Fut,
        Fut: Future<Output = AppResult<T>> + Send + 'static,
        T: Send + 'static,
    {
        tokio::spawn(write(self.inner.clone()))
            .await
            .map_err(|e| AppError::internal(format!("{} task failed: {}", op, e)))?
    }
}

impl Inner {
    fn deadline(&self) -> Deadline {
        Deadline::after(self.resilience.storage_timeout())
    }

    async fn claim(&self, row: Row) -> AppResult<bool> {
        self.storage.insert_if_absent(row, self.deadline()).await
    }

    async fn rollback(&self, undo: Compensations) -> Rollback {
        undo.run(self.storage.as_ref(), self.resilience.storage_timeout())
            .await
    }

    /// Delete rows a halted rollback had already re-claimed.
    async fn release(&self, restored: Vec<RowKey>) {
        for key in restored {
            if let Err(e) = self.storage.delete(key.clone(), self.deadline()).await {
                error!(key = %key, error = %e, "Could not release restored row");
            }
        }
    }

    /// Idempotent read, retried on `StorageUnavailable` with backoff.
    async fn read(&self, key: RowKey) -> AppResult<Row> {
        let mut attempt = 0;
        loop {
            match self.storage.get(key.clone(), self.deadline()).await {
                Err(AppError::StorageUnavailable(reason))
                    if attempt < self.resilience.read_retries =>
                {
                    warn!(key = %key, attempt = attempt + 1, error = %reason, "Storage read failed, retrying");
                    tokio::time::sleep(self.resilience.backoff(attempt)).await;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    // =========================================================================
    // Cache
    // =========================================================================

    async fn cache_call<F>(&self, call: F) -> AppResult<()>
    where
        F: Future<Output = AppResult<()>>,
    {
        match tokio::time::timeout(self.resilience.cache_timeout(), call).await {
            Ok(result) => result,
            Err(_) => Err(AppError::cache("cache call timed out")),
        }
    }

    async fn cached(&self, id: Uuid) -> Option<Account> {
        let key = account_key(id);
        let lookup = tokio::time::timeout(self.resilience.cache_timeout(), self.cache.get(&key));

        match lookup.await {
            Ok(Ok(Some(json))) => match serde_json::from_str::<Account>(&json) {
                Ok(account) => {
                    debug!(account_id = %id, "Cache hit");
                    Some(account)
                }
                Err(e) => {
                    warn!(account_id = %id, error = %e, "Discarding undecodable cache entry");
                    self.invalidate(id).await;
                    None
                }
            },
            Ok(Ok(None)) => {
                debug!(account_id = %id, "Cache miss");
                None
            }
            Ok(Err(e)) => {
                warn!(account_id = %id, error = %e, "Cache read failed, using storage");
                None
            }
            Err(_) => {
                warn!(account_id = %id, "Cache read timed out, using storage");
                None
            }
        }
    }

    async fn populate(&self, account: &Account) -> AppResult<()> {
        let json = serde_json::to_string(account)
            .map_err(|e| AppError::internal(format!("Serialization error: {}", e)))?;
        let key = account_key(account.id);
        self.cache_call(self.cache.set(&key, json, self.cache_ttl))
            .await
    }

    /// Write-through after create, falling back to invalidation.
    async fn prime(&self, account: &Account) {
        if let Err(e) = self.populate(account).await {
            warn!(account_id = %account.id, error = %e, "Cache write-through failed, invalidating");
            self.invalidate(account.id).await;
        }
    }

    async fn invalidate(&self, id: Uuid) {
        let key = account_key(id);
        if let Err(e) = self.cache_call(self.cache.invalidate(&key)).await {
            warn!(account_id = %id, error = %e, "Cache invalidation failed, entry stale until TTL");
        }
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    async fn get_by_id(&self, id: Uuid) -> AppResult<Account> {
        if let Some(account) = self.cached(id).await {
            return Ok(account);
        }

        let account = self.read(RowKey::Account(id)).await?.into_account()?;
        if let Err(e) = self.populate(&account).await {
            warn!(account_id = %id, error = %e, "Cache fill failed");
        }
        Ok(account)
    }

    async fn get_by_email(&self, email: &str) -> AppResult<Account> {
        let email = validate_email(email)?;
        let key = RowKey::Email(email);
        let entry = self.read(key.clone()).await?.into_email()?;

        let account = self
            .resolve(key, entry.account_id, entry.created_at)
            .await?;
        if account.email != entry.email {
            debug!(account_id = %account.id, "Email index row is stale");
            return Err(AppError::NotFound);
        }
        Ok(account)
    }

    async fn get_by_handle(&self, username: &str, discriminator: &str) -> AppResult<Account> {
        validate_username(username)?;
        validate_discriminator(discriminator)?;
        let key = RowKey::Handle(Handle::new(username, discriminator));
        let entry = self.read(key.clone()).await?.into_handle()?;

        let account = self
            .resolve(key, entry.account_id, entry.created_at)
            .await?;
        if account.handle() != entry.handle {
            debug!(account_id = %account.id, "Handle index row is stale");
            return Err(AppError::NotFound);
        }
        Ok(account)
    }

    /// Follow an index row to its account, healing rows that point nowhere.
    async fn resolve(
        &self,
        index_key: RowKey,
        account_id: Uuid,
        claimed_at: DateTime<Utc>,
    ) -> AppResult<Account> {
        match self.get_by_id(account_id).await {
            Err(AppError::NotFound) => {
                self.heal(index_key, account_id, claimed_at).await;
                Err(AppError::NotFound)
            }
            other => other,
        }
    }

    async fn heal(&self, index_key: RowKey, account_id: Uuid, claimed_at: DateTime<Utc>) {
        let age = (Utc::now() - claimed_at).to_std().unwrap_or_default();
        if age < self.resilience.dangling_index_grace() {
            debug!(key = %index_key, "Index row has no account yet, within grace period");
            return;
        }

        // Another reader may have healed the row and a create re-claimed the
        // key since we read it. Only delete the exact row we saw.
        if !self.still_claimed(&index_key, account_id, claimed_at).await {
            debug!(key = %index_key, "Index row changed since lookup, not healing");
            return;
        }

        warn!(key = %index_key, account_id = %account_id, "Removing dangling index row");
        if let Err(e) = self.storage.delete(index_key.clone(), self.deadline()).await {
            warn!(key = %index_key, error = %e, "Could not remove dangling index row");
        }
    }

    async fn still_claimed(
        &self,
        key: &RowKey,
        account_id: Uuid,
        claimed_at: DateTime<Utc>,
    ) -> bool {
        let claim = match self.storage.get(key.clone(), self.deadline()).await {
            Ok(Row::Email(entry)) => (entry.account_id, entry.created_at),
            Ok(Row::Handle(entry)) => (entry.account_id, entry.created_at),
            _ => return false,
        };
        claim == (account_id, claimed_at)
    }

    // =========================================================================
    // Writes
    // =========================================================================

    async fn create(&self, draft: AccountDraft) -> AppResult<Account> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        // 1. email index
        let email_row = Row::Email(EmailIndexEntry {
            email: draft.email.clone(),
            account_id: id,
            created_at: now,
        });
        if !self.claim(email_row).await? {
            debug!(email = %draft.email, "Email already registered");
            return Err(AppError::DuplicateEmail);
        }
        let mut undo = Compensations::new();
        undo.push(Compensation::Delete(RowKey::Email(draft.email.clone())));

        // 2. handle index
        let discriminator = match self
            .claim_handle(&draft.username, draft.discriminator.as_deref(), id, now)
            .await
        {
            Ok(discriminator) => discriminator,
            Err(e) => {
                self.rollback(undo).await;
                return Err(e);
            }
        };
        undo.push(Compensation::Delete(RowKey::Handle(Handle::new(
            draft.username.clone(),
            discriminator.clone(),
        ))));

        // 3. account row
        let account = Account::from_draft(id, draft, discriminator, now);
        undo.push(Compensation::Delete(RowKey::Account(id)));
        if let Err(e) = self
            .storage
            .put(Row::Account(account.clone()), self.deadline())
            .await
        {
            self.rollback(undo).await;
            return Err(e);
        }

        // 4. cache
        self.prime(&account).await;

        info!(account_id = %id, handle = %account.handle(), "Account created");
        Ok(account)
    }

    /// Claim the requested handle, or the lowest free discriminator.
    async fn claim_handle(
        &self,
        username: &str,
        requested: Option<&str>,
        account_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<String> {
        let handle_row = |discriminator: &str| {
            Row::Handle(HandleIndexEntry {
                handle: Handle::new(username, discriminator),
                account_id,
                created_at: now,
            })
        };

        if let Some(discriminator) = requested {
            if self.claim(handle_row(discriminator)).await? {
                return Ok(discriminator.to_string());
            }
            debug!(username, discriminator, "Handle already taken");
            return Err(AppError::DuplicateHandle);
        }

        for candidate in discriminator_candidates(self.resilience.max_discriminator_attempts) {
            if self.claim(handle_row(&candidate)).await? {
                return Ok(candidate);
            }
        }
        warn!(username, "No free discriminator within the attempt bound");
        Err(AppError::HandleExhausted)
    }

    async fn update_profile(&self, id: Uuid, patch: ProfilePatch) -> AppResult<Account> {
        let mut account = self.read(RowKey::Account(id)).await?.into_account()?;
        account.apply_profile(patch, Utc::now());

        self.storage
            .put(Row::Account(account.clone()), self.deadline())
            .await?;
        self.invalidate(id).await;

        debug!(account_id = %id, "Profile updated");
        Ok(account)
    }

    async fn update_identifiers(&self, id: Uuid, change: IdentifierChange) -> AppResult<Account> {
        let current = self.read(RowKey::Account(id)).await?.into_account()?;
        let (new_email, new_handle) = change.resolve(&current);
        let email_changed = new_email != current.email;
        let handle_changed = new_handle != current.handle();

        if !email_changed && !handle_changed {
            return Ok(current);
        }

        let now = Utc::now();
        let mut updated = current.clone();
        updated.email = new_email;
        updated.username = new_handle.username.clone();
        updated.discriminator = new_handle.discriminator.clone();
        updated.updated_at = now;

        let mut undo = Compensations::new();

        // 1. new email index
        if email_changed {
            if !self.claim(Row::Email(updated.email_index(now))).await? {
                return Err(AppError::DuplicateEmail);
            }
            undo.push(Compensation::Delete(RowKey::Email(updated.email.clone())));
        }

        // 2. new handle index
        if handle_changed {
            match self.claim(Row::Handle(updated.handle_index(now))).await {
                Ok(true) => undo.push(Compensation::Delete(RowKey::Handle(new_handle))),
                Ok(false) => {
                    self.rollback(undo).await;
                    return Err(AppError::DuplicateHandle);
                }
                Err(e) => {
                    self.rollback(undo).await;
                    return Err(e);
                }
            }
        }

        // 3. old index rows; the original row replays after their restores
        undo.push(Compensation::Put(Row::Account(current.clone())));
        if email_changed {
            let key = RowKey::Email(current.email.clone());
            if let Err(e) = self.storage.delete(key, self.deadline()).await {
                return self.unwind_rekey(undo, &updated, e).await;
            }
            undo.push(Compensation::Restore(Row::Email(current.email_index(now))));
        }
        if handle_changed {
            let key = RowKey::Handle(current.handle());
            if let Err(e) = self.storage.delete(key, self.deadline()).await {
                return self.unwind_rekey(undo, &updated, e).await;
            }
            undo.push(Compensation::Restore(Row::Handle(current.handle_index(now))));
        }

        // 4. account row
        if let Err(e) = self
            .storage
            .put(Row::Account(updated.clone()), self.deadline())
            .await
        {
            return self.unwind_rekey(undo, &updated, e).await;
        }

        // 5. cache
        self.invalidate(id).await;

        info!(
            account_id = %id,
            handle = %updated.handle(),
            email_changed,
            handle_changed,
            "Account re-keyed"
        );
        Ok(updated)
    }

    /// Roll a failed re-key back. If an old identifier was claimed by
    /// another account in the meantime, finish the re-key instead so this
    /// account keeps the new keys it already owns.
    async fn unwind_rekey(
        &self,
        undo: Compensations,
        updated: &Account,
        cause: AppError,
    ) -> AppResult<Account> {
        let Rollback::Halted { lost, restored } = self.rollback(undo).await else {
            return Err(cause);
        };

        warn!(account_id = %updated.id, lost = %lost, "Old identifier taken during rollback, completing re-key");
        self.release(restored).await;
        self.storage
            .put(Row::Account(updated.clone()), self.deadline())
            .await?;
        self.invalidate(updated.id).await;

        info!(account_id = %updated.id, handle = %updated.handle(), "Account re-keyed after halted rollback");
        Ok(updated.clone())
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let account = self.read(RowKey::Account(id)).await?.into_account()?;
        let now = Utc::now();
        let mut undo = Compensations::new();

        self.storage
            .delete(RowKey::Email(account.email.clone()), self.deadline())
            .await?;
        undo.push(Compensation::Restore(Row::Email(account.email_index(now))));

        if let Err(e) = self
            .storage
            .delete(RowKey::Handle(account.handle()), self.deadline())
            .await
        {
            return self.unwind_delete(undo, id, e).await;
        }
        undo.push(Compensation::Restore(Row::Handle(account.handle_index(now))));

        if let Err(e) = self
            .storage
            .delete(RowKey::Account(id), self.deadline())
            .await
        {
            return self.unwind_delete(undo, id, e).await;
        }

        self.invalidate(id).await;
        info!(account_id = %id, handle = %account.handle(), "Account deleted");
        Ok(())
    }

    /// Roll a failed delete back, or finish it when a released identifier
    /// has already been claimed by a new account.
    async fn unwind_delete(
        &self,
        undo: Compensations,
        id: Uuid,
        cause: AppError,
    ) -> AppResult<()> {
        let Rollback::Halted { lost, restored } = self.rollback(undo).await else {
            return Err(cause);
        };

        warn!(account_id = %id, lost = %lost, "Identifier taken during rollback, completing delete");
        self.release(restored).await;
        self.storage
            .delete(RowKey::Account(id), self.deadline())
            .await?;
        self.invalidate(id).await;

        info!(account_id = %id, "Account deleted after halted rollback");
        Ok(())
    }

    async fn health(&self) -> HealthReport {
        let storage = match self.storage.ping(self.deadline()).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Storage health check failed");
                false
            }
        };
        let cache = match self.cache_call(self.cache.ping()).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Cache health check failed");
                false
            }
        };
        HealthReport { storage, cache }
    }
}

#[async_trait]
impl DirectoryService for Directory {
    async fn create_account(&self, draft: AccountDraft) -> AppResult<Account> {
        let draft = draft.validate(Utc::now().date_naive())?;
        self.spawn_write("create_account", move |inner| async move {
            inner.create(draft).await
        })
        .await
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Account> {
        self.inner.get_by_id(id).await
    }

    async fn get_by_email(&self, email: &str) -> AppResult<Account> {
        self.inner.get_by_email(email).await
    }

    async fn get_by_handle(&self, username: &str, discriminator: &str) -> AppResult<Account> {
        self.inner.get_by_handle(username, discriminator).await
    }

    async fn update_profile(&self, id: Uuid, patch: ProfilePatch) -> AppResult<Account> {
        let patch = patch.validate()?;
        self.spawn_write("update_profile", move |inner| async move {
            inner.update_profile(id, patch).await
        })
        .await
    }

    async fn update_identifiers(
        &self,
        id: Uuid,
        change: IdentifierChange,
    ) -> AppResult<Account> {
        let change = change.validate()?;
        self.spawn_write("update_identifiers", move |inner| async move {
            inner.update_identifiers(id, change).await
        })
        .await
    }

    async fn delete_account(&self, id: Uuid) -> AppResult<()> {
        self.spawn_write("delete_account", move |inner| async move {
            inner.delete(id).await
        })
        .await
    }

    async fn health(&self) -> HealthReport {
        self.inner.health().await
    }
}
