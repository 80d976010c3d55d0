//! Storage layer: three independently keyed tables behind one adapter.
//!
//! The adapter offers single-row operations only. The one synchronization
//! primitive is `insert_if_absent`, which must be atomic per partition key.

pub mod entities;
mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::SeaOrmStore;

use std::fmt;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use uuid::Uuid;

use common::{AppError, AppResult};
use domain::{Account, EmailIndexEntry, Handle, HandleIndexEntry};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// The three tables of the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Accounts,
    AccountsByEmail,
    AccountsByHandle,
}

impl Table {
    pub fn name(&self) -> &'static str {
        match self {
            Table::Accounts => "accounts",
            Table::AccountsByEmail => "accounts_by_email",
            Table::AccountsByHandle => "accounts_by_handle",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Partition key of a row. The variant selects the table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RowKey {
    Account(Uuid),
    Email(String),
    Handle(Handle),
}

impl RowKey {
    pub fn table(&self) -> Table {
        match self {
            RowKey::Account(_) => Table::Accounts,
            RowKey::Email(_) => Table::AccountsByEmail,
            RowKey::Handle(_) => Table::AccountsByHandle,
        }
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowKey::Account(id) => write!(f, "{}/{}", self.table(), id),
            RowKey::Email(email) => write!(f, "{}/{}", self.table(), email),
            RowKey::Handle(handle) => write!(f, "{}/{}", self.table(), handle),
        }
    }
}

/// A full row of one of the three tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Row {
    Account(Account),
    Email(EmailIndexEntry),
    Handle(HandleIndexEntry),
}

impl Row {
    pub fn key(&self) -> RowKey {
        match self {
            Row::Account(account) => RowKey::Account(account.id),
            Row::Email(entry) => RowKey::Email(entry.email.clone()),
            Row::Handle(entry) => RowKey::Handle(entry.handle.clone()),
        }
    }

    pub fn table(&self) -> Table {
        self.key().table()
    }

    pub fn into_account(self) -> AppResult<Account> {
        match self {
            Row::Account(account) => Ok(account),
            other => Err(unexpected_row(Table::Accounts, &other)),
        }
    }

    pub fn into_email(self) -> AppResult<EmailIndexEntry> {
        match self {
            Row::Email(entry) => Ok(entry),
            other => Err(unexpected_row(Table::AccountsByEmail, &other)),
        }
    }

    pub fn into_handle(self) -> AppResult<HandleIndexEntry> {
        match self {
            Row::Handle(entry) => Ok(entry),
            other => Err(unexpected_row(Table::AccountsByHandle, &other)),
        }
    }
}

fn unexpected_row(expected: Table, row: &Row) -> AppError {
    AppError::internal(format!(
        "expected a {} row, storage returned {}",
        expected,
        row.table()
    ))
}

/// Absolute point in time by which a storage call must complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Deadline(Instant);

impl Deadline {
    pub fn after(timeout: Duration) -> Self {
        Self(Instant::now() + timeout)
    }

    pub fn instant(&self) -> Instant {
        self.0
    }

    pub fn is_elapsed(&self) -> bool {
        Instant::now() >= self.0
    }

    /// Fail fast when the deadline has already passed.
    pub fn check(&self, op: &str) -> AppResult<()> {
        if self.is_elapsed() {
            return Err(deadline_exceeded(op));
        }
        Ok(())
    }
}

fn deadline_exceeded(op: &str) -> AppError {
    AppError::storage(format!("{} exceeded its deadline", op))
}

/// Run a storage future, failing with `StorageUnavailable` at the deadline.
pub async fn with_deadline<T, F>(deadline: Deadline, op: &str, fut: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    match tokio::time::timeout_at(deadline.instant(), fut).await {
        Ok(result) => result,
        Err(_) => Err(deadline_exceeded(op)),
    }
}

/// Single-row storage adapter over the three directory tables.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    /// Atomically insert `row` unless its key exists; `false` when it does.
    async fn insert_if_absent(&self, row: Row, deadline: Deadline) -> AppResult<bool>;

    /// Fetch a row. `NotFound` when absent.
    async fn get(&self, key: RowKey, deadline: Deadline) -> AppResult<Row>;

    /// Unconditional upsert.
    async fn put(&self, row: Row, deadline: Deadline) -> AppResult<()>;

    /// Remove a row. Removing an absent row succeeds.
    async fn delete(&self, key: RowKey, deadline: Deadline) -> AppResult<()>;

    /// Connectivity check used by the health endpoint.
    async fn ping(&self, deadline: Deadline) -> AppResult<()>;
}
