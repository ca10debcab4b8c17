//! Postgres-backed account and session storage (`sql/schema.sql`).

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, PgPool, Row};
use tracing::{info_span, Instrument, Span};
use uuid::Uuid;

use super::{AccountStore, InsertOutcome, SessionRecord, SessionStore};
use crate::auth::account::{Account, AccountClass, AccountKind, NewAccount};

#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn query_span(operation: &'static str, statement: &'static str) -> Span {
    info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = operation,
        db.statement = statement
    )
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

const RESIDENT_EXISTS: &str =
    "SELECT EXISTS(SELECT 1 FROM residents WHERE national_id = $1) AS exists";
const ADMIN_EXISTS: &str = "SELECT EXISTS(SELECT 1 FROM admins WHERE username = $1) AS exists";

const SELECT_RESIDENT: &str = r"
    SELECT id, national_id, name, rt, rw, password_hash, created_at
    FROM residents
    WHERE national_id = $1
";
const SELECT_ADMIN: &str = r"
    SELECT id, username, password_hash, created_at
    FROM admins
    WHERE username = $1
";

const INSERT_RESIDENT: &str = r"
    INSERT INTO residents (id, national_id, name, rt, rw, password_hash)
    VALUES ($1, $2, $3, $4, $5, $6)
    RETURNING created_at
";
const INSERT_ADMIN: &str = r"
    INSERT INTO admins (id, username, password_hash)
    VALUES ($1, $2, $3)
    RETURNING created_at
";

const INSERT_SESSION: &str = r"
    INSERT INTO refresh_tokens (token_hash, resident_id, admin_id, created_at, expires_at)
    VALUES ($1, $2, $3, $4, $5)
";
const SELECT_SESSION: &str = r"
    SELECT token_hash, resident_id, admin_id, created_at, expires_at
    FROM refresh_tokens
    WHERE token_hash = $1
";
const DELETE_SESSION: &str = "DELETE FROM refresh_tokens WHERE token_hash = $1";

fn account_from_row(kind: AccountKind, row: &PgRow) -> Result<Account> {
    let class = match kind {
        AccountKind::Resident => AccountClass::Resident {
            national_id: row.try_get("national_id")?,
            name: row.try_get("name")?,
            rt: row.try_get("rt")?,
            rw: row.try_get("rw")?,
        },
        AccountKind::Admin => AccountClass::Admin {
            username: row.try_get("username")?,
        },
    };

    Ok(Account {
        id: row.try_get("id")?,
        class,
        password_hash: row.try_get("password_hash")?,
        created_at: row.try_get("created_at")?,
    })
}

fn session_from_row(row: &PgRow) -> Result<SessionRecord> {
    let resident_id: Option<Uuid> = row.try_get("resident_id")?;
    let admin_id: Option<Uuid> = row.try_get("admin_id")?;
    let (account_kind, account_id) = match (resident_id, admin_id) {
        (Some(id), None) => (AccountKind::Resident, id),
        (None, Some(id)) => (AccountKind::Admin, id),
        _ => return Err(anyhow!("refresh token row must reference exactly one account")),
    };

    Ok(SessionRecord {
        account_kind,
        account_id,
        token_digest: row.try_get("token_hash")?,
        created_at: row.try_get("created_at")?,
        expires_at: row.try_get("expires_at")?,
    })
}

impl AccountStore for PgStore {
    async fn identifier_exists(&self, kind: AccountKind, identifier: &str) -> Result<bool> {
        let query = match kind {
            AccountKind::Resident => RESIDENT_EXISTS,
            AccountKind::Admin => ADMIN_EXISTS,
        };
        let row = sqlx::query(query)
            .bind(identifier)
            .fetch_one(&self.pool)
            .instrument(query_span("SELECT", query))
            .await
            .with_context(|| format!("failed to check {kind} identifier"))?;

        Ok(row.try_get("exists")?)
    }

    async fn find_account(&self, kind: AccountKind, identifier: &str) -> Result<Option<Account>> {
        let query = match kind {
            AccountKind::Resident => SELECT_RESIDENT,
            AccountKind::Admin => SELECT_ADMIN,
        };
        let row = sqlx::query(query)
            .bind(identifier)
            .fetch_optional(&self.pool)
            .instrument(query_span("SELECT", query))
            .await
            .with_context(|| format!("failed to lookup {kind} account"))?;

        row.map(|row| account_from_row(kind, &row)).transpose()
    }

    async fn insert_account(&self, account: &NewAccount) -> Result<InsertOutcome> {
        let id = Uuid::now_v7();
        let result = match &account.class {
            AccountClass::Resident {
                national_id,
                name,
                rt,
                rw,
            } => {
                sqlx::query(INSERT_RESIDENT)
                    .bind(id)
                    .bind(national_id)
                    .bind(name)
                    .bind(rt)
                    .bind(rw)
                    .bind(&account.password_hash)
                    .fetch_one(&self.pool)
                    .instrument(query_span("INSERT", INSERT_RESIDENT))
                    .await
            }
            AccountClass::Admin { username } => {
                sqlx::query(INSERT_ADMIN)
                    .bind(id)
                    .bind(username)
                    .bind(&account.password_hash)
                    .fetch_one(&self.pool)
                    .instrument(query_span("INSERT", INSERT_ADMIN))
                    .await
            }
        };

        let row = match result {
            Ok(row) => row,
            Err(err) if is_unique_violation(&err) => return Ok(InsertOutcome::Conflict),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("failed to insert {} account", account.class.kind()))
            }
        };
        let created_at: DateTime<Utc> = row.try_get("created_at")?;

        Ok(InsertOutcome::Created(Account {
            id,
            class: account.class.clone(),
            password_hash: account.password_hash.clone(),
            created_at,
        }))
    }
}

impl SessionStore for PgStore {
    async fn save_session(&self, record: &SessionRecord) -> Result<()> {
        let (resident_id, admin_id) = match record.account_kind {
            AccountKind::Resident => (Some(record.account_id), None),
            AccountKind::Admin => (None, Some(record.account_id)),
        };
        sqlx::query(INSERT_SESSION)
            .bind(&record.token_digest)
            .bind(resident_id)
            .bind(admin_id)
            .bind(record.created_at)
            .bind(record.expires_at)
            .execute(&self.pool)
            .instrument(query_span("INSERT", INSERT_SESSION))
            .await
            .context("failed to insert refresh token")?;

        Ok(())
    }

    async fn find_session(&self, token_digest: &str) -> Result<Option<SessionRecord>> {
        let row = sqlx::query(SELECT_SESSION)
            .bind(token_digest)
            .fetch_optional(&self.pool)
            .instrument(query_span("SELECT", SELECT_SESSION))
            .await
            .context("failed to lookup refresh token")?;

        row.map(|row| session_from_row(&row)).transpose()
    }

    async fn delete_session(&self, token_digest: &str) -> Result<u64> {
        let result = sqlx::query(DELETE_SESSION)
            .bind(token_digest)
            .execute(&self.pool)
            .instrument(query_span("DELETE", DELETE_SESSION))
            .await
            .context("failed to delete refresh token")?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::borrow::Cow;
    use std::error::Error as StdError;
    use std::fmt;

    #[derive(Debug)]
    struct TestDbError {
        code: Option<&'static str>,
    }

    impl fmt::Display for TestDbError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "test database error")
        }
    }

    impl StdError for TestDbError {}

    impl DatabaseError for TestDbError {
        fn message(&self) -> &str {
            "test database error"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            self.code.map(Cow::Borrowed)
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::UniqueViolation
        }
    }

    #[test]
    fn unique_violation_matches_sqlstate() {
        let err = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("23505"),
        }));
        assert!(is_unique_violation(&err));

        let err = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("23503"),
        }));
        assert!(!is_unique_violation(&err));

        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
    }
}
