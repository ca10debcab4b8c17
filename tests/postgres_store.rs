//! Postgres-backed storage and auth flows against a real database.
//!
//! Runs only when `RUKUN_TEST_DSN` points at a disposable database; the schema
//! in `sql/schema.sql` is applied on every run.

use anyhow::{anyhow, Result};
use chrono::{Duration, Utc};
use rukun::auth::{
    storage::{AccountStore, InsertOutcome, SessionRecord, SessionStore},
    token, AccountClass, AccountKind, AuthError, AuthService, PgStore, TokenConfig, TokenIssuer,
};
use secrecy::SecretString;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

const SCHEMA_SQL: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/sql/schema.sql"));

async fn store() -> Result<Option<PgStore>> {
    let Ok(dsn) = std::env::var("RUKUN_TEST_DSN") else {
        eprintln!("Skipping Postgres test: RUKUN_TEST_DSN not set");
        return Ok(None);
    };

    let pool = PgPoolOptions::new().max_connections(2).connect(&dsn).await?;
    // tests run in parallel; serialize schema creation
    let migrate = format!("BEGIN; SELECT pg_advisory_xact_lock(7161); {SCHEMA_SQL} COMMIT;");
    sqlx::raw_sql(&migrate).execute(&pool).await?;

    Ok(Some(PgStore::new(pool)))
}

/// Unique per run so repeated runs against one database do not collide.
fn national_id() -> String {
    format!("{:016}", Uuid::new_v4().as_u128() % 10_u128.pow(16))
}

fn username() -> String {
    format!("it_{}", &Uuid::new_v4().simple().to_string()[..10])
}

#[tokio::test]
async fn accounts_are_unique_per_class() -> Result<()> {
    let Some(store) = store().await? else {
        return Ok(());
    };

    let class = AccountClass::Resident {
        national_id: national_id(),
        name: "Budi".to_string(),
        rt: "01".to_string(),
        rw: "02".to_string(),
    };
    let new_account = rukun::auth::account::NewAccount {
        class: class.clone(),
        password_hash: "$argon2id$placeholder".to_string(),
    };

    let InsertOutcome::Created(created) = store.insert_account(&new_account).await? else {
        return Err(anyhow!("first insert should create the account"));
    };
    assert!(matches!(
        store.insert_account(&new_account).await?,
        InsertOutcome::Conflict
    ));

    assert!(
        store
            .identifier_exists(AccountKind::Resident, class.identifier())
            .await?
    );
    assert!(
        !store
            .identifier_exists(AccountKind::Admin, class.identifier())
            .await?
    );

    let found = store
        .find_account(AccountKind::Resident, class.identifier())
        .await?
        .ok_or_else(|| anyhow!("account not found"))?;
    assert_eq!(found.id, created.id);
    assert_eq!(found.class, class);
    Ok(())
}

#[tokio::test]
async fn sessions_are_saved_found_and_deleted_once() -> Result<()> {
    let Some(store) = store().await? else {
        return Ok(());
    };

    let new_account = rukun::auth::account::NewAccount {
        class: AccountClass::Admin {
            username: username(),
        },
        password_hash: "$argon2id$placeholder".to_string(),
    };
    let InsertOutcome::Created(admin) = store.insert_account(&new_account).await? else {
        return Err(anyhow!("admin insert failed"));
    };

    let now = Utc::now();
    let record = SessionRecord {
        account_kind: AccountKind::Admin,
        account_id: admin.id,
        token_digest: token::digest(&Uuid::new_v4().to_string()),
        created_at: now,
        expires_at: now + Duration::days(365),
    };
    store.save_session(&record).await?;

    let found = store
        .find_session(&record.token_digest)
        .await?
        .ok_or_else(|| anyhow!("session not found"))?;
    assert_eq!(found.account_kind, AccountKind::Admin);
    assert_eq!(found.account_id, admin.id);
    assert_eq!(
        found.expires_at.timestamp() - found.created_at.timestamp(),
        365 * 24 * 60 * 60
    );

    assert_eq!(store.delete_session(&record.token_digest).await?, 1);
    assert_eq!(store.delete_session(&record.token_digest).await?, 0);
    assert!(store.find_session(&record.token_digest).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn session_requires_existing_account() -> Result<()> {
    let Some(store) = store().await? else {
        return Ok(());
    };

    let now = Utc::now();
    let orphan = SessionRecord {
        account_kind: AccountKind::Resident,
        account_id: Uuid::new_v4(),
        token_digest: token::digest(&Uuid::new_v4().to_string()),
        created_at: now,
        expires_at: now + Duration::hours(1),
    };
    assert!(store.save_session(&orphan).await.is_err());
    Ok(())
}

#[tokio::test]
async fn full_flow_against_postgres() -> Result<()> {
    let Some(store) = store().await? else {
        return Ok(());
    };

    let service = AuthService::new(
        store,
        TokenIssuer::new(TokenConfig::new(
            SecretString::from("it-access".to_string()),
            SecretString::from("it-refresh".to_string()),
        )),
    );

    let username = username();
    service
        .register(
            AccountClass::Admin {
                username: username.clone(),
            },
            "abcd1234",
        )
        .await?;
    let duplicate = service
        .register(
            AccountClass::Admin {
                username: username.clone(),
            },
            "abcd1234",
        )
        .await;
    assert!(matches!(duplicate, Err(AuthError::Conflict(_))));

    let pair = service
        .login(AccountKind::Admin, &username, "abcd1234")
        .await?;
    let access = service.refresh(AccountKind::Admin, &pair.refresh_token).await?;
    service.authenticate(AccountKind::Admin, &access)?;

    service.logout(AccountKind::Admin, &pair.refresh_token).await?;
    assert!(matches!(
        service.logout(AccountKind::Admin, &pair.refresh_token).await,
        Err(AuthError::NotFound(_))
    ));
    Ok(())
}
