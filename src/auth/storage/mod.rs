//! Persistence seams for accounts and refresh-token sessions.
//!
//! Production uses [`PgStore`]; tests swap in an in-memory store so the flows
//! can run without Postgres.

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::future::Future;
use uuid::Uuid;

use super::account::{Account, AccountKind, NewAccount};

#[cfg(test)]
pub(crate) mod memory;
mod postgres;

pub use postgres::PgStore;

/// Outcome when attempting to persist a new account.
#[derive(Debug)]
pub enum InsertOutcome {
    Created(Account),
    /// The identifier is already taken within its class.
    Conflict,
}

/// One persisted refresh token. Only the token digest is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub account_kind: AccountKind,
    pub account_id: Uuid,
    pub token_digest: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SessionRecord {
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

pub trait AccountStore: Send + Sync {
    fn identifier_exists(
        &self,
        kind: AccountKind,
        identifier: &str,
    ) -> impl Future<Output = Result<bool>> + Send;

    fn find_account(
        &self,
        kind: AccountKind,
        identifier: &str,
    ) -> impl Future<Output = Result<Option<Account>>> + Send;

    /// Insert relying on the storage-level unique constraint; a duplicate
    /// identifier yields [`InsertOutcome::Conflict`], not an error.
    fn insert_account(
        &self,
        account: &NewAccount,
    ) -> impl Future<Output = Result<InsertOutcome>> + Send;
}

pub trait SessionStore: Send + Sync {
    fn save_session(&self, record: &SessionRecord) -> impl Future<Output = Result<()>> + Send;

    fn find_session(
        &self,
        token_digest: &str,
    ) -> impl Future<Output = Result<Option<SessionRecord>>> + Send;

    /// Delete by exact digest match, returning the number of rows removed.
    fn delete_session(&self, token_digest: &str) -> impl Future<Output = Result<u64>> + Send;
}

/// Everything the auth flows need from storage.
pub trait Store: AccountStore + SessionStore + 'static {}

impl<T> Store for T where T: AccountStore + SessionStore + 'static {}
