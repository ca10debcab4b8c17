//! In-memory store used by unit tests.

use anyhow::{anyhow, Result};
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Mutex,
};
use uuid::Uuid;

use super::{AccountStore, InsertOutcome, SessionRecord, SessionStore};
use crate::auth::account::{Account, AccountKind, NewAccount};

/// Storage calls that can be made to fail individually.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Op {
    IdentifierExists,
    FindAccount,
    InsertAccount,
    SaveSession,
    FindSession,
    DeleteSession,
}

#[derive(Debug, Default)]
pub(crate) struct MemoryStore {
    accounts: Mutex<HashMap<(AccountKind, String), Account>>,
    sessions: Mutex<HashMap<String, SessionRecord>>,
    failing: AtomicBool,
    failing_ops: Mutex<HashSet<Op>>,
}

impl MemoryStore {
    /// Make every following call fail like an unreachable database.
    pub(crate) fn fail(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    /// Make only `op` fail; other calls keep working.
    pub(crate) fn fail_on(&self, op: Op) {
        if let Ok(mut ops) = self.failing_ops.lock() {
            ops.insert(op);
        }
    }

    fn check(&self, op: Op) -> Result<()> {
        let op_failing = self
            .failing_ops
            .lock()
            .map_err(|_| anyhow!("poisoned"))?
            .contains(&op);
        if op_failing || self.failing.load(Ordering::SeqCst) {
            return Err(anyhow!("storage unavailable"));
        }
        Ok(())
    }

    pub(crate) fn account_count(&self) -> usize {
        self.accounts.lock().map_or(0, |accounts| accounts.len())
    }

    pub(crate) fn session_count(&self) -> usize {
        self.sessions.lock().map_or(0, |sessions| sessions.len())
    }

    pub(crate) fn sessions(&self) -> Vec<SessionRecord> {
        self.sessions
            .lock()
            .map(|sessions| sessions.values().cloned().collect())
            .unwrap_or_default()
    }
}

impl AccountStore for MemoryStore {
    async fn identifier_exists(&self, kind: AccountKind, identifier: &str) -> Result<bool> {
        self.check(Op::IdentifierExists)?;
        let accounts = self.accounts.lock().map_err(|_| anyhow!("poisoned"))?;
        Ok(accounts.contains_key(&(kind, identifier.to_string())))
    }

    async fn find_account(&self, kind: AccountKind, identifier: &str) -> Result<Option<Account>> {
        self.check(Op::FindAccount)?;
        let accounts = self.accounts.lock().map_err(|_| anyhow!("poisoned"))?;
        Ok(accounts.get(&(kind, identifier.to_string())).cloned())
    }

    async fn insert_account(&self, account: &NewAccount) -> Result<InsertOutcome> {
        self.check(Op::InsertAccount)?;
        let mut accounts = self.accounts.lock().map_err(|_| anyhow!("poisoned"))?;
        let key = (
            account.class.kind(),
            account.class.identifier().to_string(),
        );
        if accounts.contains_key(&key) {
            return Ok(InsertOutcome::Conflict);
        }
        let created = Account {
            id: Uuid::now_v7(),
            class: account.class.clone(),
            password_hash: account.password_hash.clone(),
            created_at: Utc::now(),
        };
        accounts.insert(key, created.clone());
        Ok(InsertOutcome::Created(created))
    }
}

impl SessionStore for MemoryStore {
    async fn save_session(&self, record: &SessionRecord) -> Result<()> {
        self.check(Op::SaveSession)?;
        let mut sessions = self.sessions.lock().map_err(|_| anyhow!("poisoned"))?;
        if sessions.contains_key(&record.token_digest) {
            return Err(anyhow!("duplicate refresh token"));
        }
        sessions.insert(record.token_digest.clone(), record.clone());
        Ok(())
    }

    async fn find_session(&self, token_digest: &str) -> Result<Option<SessionRecord>> {
        self.check(Op::FindSession)?;
        let sessions = self.sessions.lock().map_err(|_| anyhow!("poisoned"))?;
        Ok(sessions.get(token_digest).cloned())
    }

    async fn delete_session(&self, token_digest: &str) -> Result<u64> {
        self.check(Op::DeleteSession)?;
        let mut sessions = self.sessions.lock().map_err(|_| anyhow!("poisoned"))?;
        Ok(u64::from(sessions.remove(token_digest).is_some()))
    }
}
