//! Register, login, refresh and logout flows for both account classes.
//!
//! Every flow is a straight sequence of fallible steps; the first failing step
//! decides the [`AuthError`] returned to the caller and nothing is retried.

use anyhow::{anyhow, Context};
use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};

use super::{
    account::{Account, AccountClass, AccountKind, NewAccount},
    error::AuthError,
    password,
    storage::{InsertOutcome, SessionRecord, Store},
    token::{self, Claims, IssuedToken, TokenError, TokenIssuer},
    types::TokenPairResponse,
    validate::{validate, CredentialKind},
};

const INVALID_NATIONAL_ID: &str = "National ID must be 16 digits";
const INVALID_USERNAME: &str = "Invalid username format";
const INVALID_PASSWORD: &str = "The password must be between 8-16 characters and contain numbers";
const INVALID_REFRESH_TOKEN: &str = "Invalid refresh token";
const EXPIRED_REFRESH_TOKEN: &str = "Refresh token expired, please log in again";
const INVALID_ACCESS_TOKEN: &str = "Invalid access token";
const EXPIRED_ACCESS_TOKEN: &str = "Access token expired, refresh it and retry";
const TOKEN_NOT_FOUND: &str = "Token not found";

pub struct AuthService<S> {
    store: S,
    tokens: TokenIssuer,
}

/// Run CPU-bound work (hashing, signing) off the async workers.
async fn offload<T, F>(work: F) -> Result<T, AuthError>
where
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let result = tokio::task::spawn_blocking(work)
        .await
        .context("blocking task failed")?;
    Ok(result?)
}

fn timestamp(seconds: i64) -> Result<DateTime<Utc>, AuthError> {
    DateTime::from_timestamp(seconds, 0)
        .ok_or_else(|| AuthError::Internal(anyhow!("token timestamp out of range: {seconds}")))
}

impl<S: Store> AuthService<S> {
    #[must_use]
    pub fn new(store: S, tokens: TokenIssuer) -> Self {
        Self { store, tokens }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    /// Create an account for `class` after format and uniqueness checks.
    ///
    /// # Errors
    /// `Validation` for malformed identifiers or passwords, `Conflict` when the
    /// identifier is taken, `Internal` for hashing or storage failures.
    #[instrument(skip(self, class, password), fields(kind = %class.kind()))]
    pub async fn register(&self, class: AccountClass, password: &str) -> Result<Account, AuthError> {
        let (credential, identifier_message, conflict_message) = match &class {
            AccountClass::Resident { .. } => (
                CredentialKind::NationalId,
                INVALID_NATIONAL_ID,
                "National ID already exists",
            ),
            AccountClass::Admin { .. } => (
                CredentialKind::Username,
                INVALID_USERNAME,
                "Username already exists",
            ),
        };
        if !validate(credential, class.identifier()) {
            return Err(AuthError::validation(identifier_message));
        }
        if !validate(CredentialKind::Password, password) {
            return Err(AuthError::validation(INVALID_PASSWORD));
        }

        let kind = class.kind();
        if self
            .store
            .identifier_exists(kind, class.identifier())
            .await?
        {
            debug!("identifier already registered");
            return Err(AuthError::conflict(conflict_message));
        }

        let password_hash = password::hash_blocking(password.to_string()).await?;

        // The unique constraint decides when two registrations race past the
        // existence check.
        match self
            .store
            .insert_account(&NewAccount {
                class,
                password_hash,
            })
            .await?
        {
            InsertOutcome::Created(account) => {
                info!(account_id = %account.id, "account registered");
                Ok(account)
            }
            InsertOutcome::Conflict => {
                warn!("identifier registered concurrently");
                Err(AuthError::conflict(conflict_message))
            }
        }
    }

    /// Authenticate and issue an access/refresh token pair.
    ///
    /// Unknown identifiers and wrong passwords yield the same error.
    ///
    /// # Errors
    /// `Unauthorized` for bad credentials, `Internal` otherwise.
    #[instrument(skip(self, identifier, password))]
    pub async fn login(
        &self,
        kind: AccountKind,
        identifier: &str,
        password: &str,
    ) -> Result<TokenPairResponse, AuthError> {
        let account = self.store.find_account(kind, identifier).await?;

        // Unknown identifiers still pay for a full verification.
        let digest = account
            .as_ref()
            .map_or(password::DUMMY_DIGEST, |account| account.password_hash.as_str())
            .to_string();
        let matched = password::verify_blocking(password.to_string(), digest).await?;

        let Some(account) = account else {
            debug!("unknown identifier");
            return Err(AuthError::invalid_credentials());
        };
        if !matched {
            debug!(account_id = %account.id, "password mismatch");
            return Err(AuthError::invalid_credentials());
        }

        let tokens = self.tokens.clone();
        let (account_id, class) = (account.id, account.class);
        let (access, refresh) = offload(move || {
            let now = Utc::now();
            let access = tokens.issue_access(account_id, class.clone(), now)?;
            let refresh = tokens.issue_refresh(account_id, class, now)?;
            Ok((access, refresh))
        })
        .await?;

        self.store
            .save_session(&SessionRecord {
                account_kind: kind,
                account_id,
                token_digest: token::digest(&refresh.token),
                created_at: timestamp(refresh.claims.iat)?,
                expires_at: timestamp(refresh.claims.exp)?,
            })
            .await?;

        info!(%account_id, "login succeeded");

        Ok(TokenPairResponse {
            access_token: access.token,
            refresh_token: refresh.token,
        })
    }

    /// Exchange a valid, still-persisted refresh token for a new access token.
    ///
    /// # Errors
    /// `Unauthorized` when the token is invalid, expired, revoked or belongs to
    /// the other account class.
    #[instrument(skip(self, refresh_token))]
    pub async fn refresh(
        &self,
        kind: AccountKind,
        refresh_token: &str,
    ) -> Result<String, AuthError> {
        let claims = self.verify_refresh(kind, refresh_token)?;

        let Some(session) = self
            .store
            .find_session(&token::digest(refresh_token))
            .await?
        else {
            debug!("refresh token not persisted");
            return Err(AuthError::unauthorized(INVALID_REFRESH_TOKEN));
        };
        if session.is_expired(Utc::now()) {
            return Err(AuthError::unauthorized(EXPIRED_REFRESH_TOKEN));
        }
        if session.account_id != claims.sub || session.account_kind != kind {
            warn!("refresh token row does not match its claims");
            return Err(AuthError::unauthorized(INVALID_REFRESH_TOKEN));
        }

        let tokens = self.tokens.clone();
        let access: IssuedToken =
            offload(move || tokens.issue_access(claims.sub, claims.class, Utc::now())).await?;

        Ok(access.token)
    }

    /// Revoke a refresh token.
    ///
    /// # Errors
    /// `Unauthorized` for an invalid token, `NotFound` when it was already
    /// removed, `Internal` for storage failures.
    #[instrument(skip(self, refresh_token))]
    pub async fn logout(&self, kind: AccountKind, refresh_token: &str) -> Result<(), AuthError> {
        let claims = self.verify_refresh(kind, refresh_token)?;

        let deleted = self
            .store
            .delete_session(&token::digest(refresh_token))
            .await?;
        if deleted == 0 {
            return Err(AuthError::not_found(TOKEN_NOT_FOUND));
        }

        info!(account_id = %claims.sub, "logout succeeded");
        Ok(())
    }

    /// Verify an access token for `kind` and return its claims.
    ///
    /// # Errors
    /// `Unauthorized`, with a distinct message once the token has expired.
    pub fn authenticate(&self, kind: AccountKind, access_token: &str) -> Result<Claims, AuthError> {
        let claims = self
            .tokens
            .verify_access(access_token)
            .map_err(|err| match err {
                TokenError::Expired => AuthError::unauthorized(EXPIRED_ACCESS_TOKEN),
                TokenError::InvalidSignature | TokenError::Malformed => {
                    AuthError::unauthorized(INVALID_ACCESS_TOKEN)
                }
            })?;
        if claims.class.kind() != kind {
            return Err(AuthError::unauthorized(INVALID_ACCESS_TOKEN));
        }
        Ok(claims)
    }

    fn verify_refresh(&self, kind: AccountKind, refresh_token: &str) -> Result<Claims, AuthError> {
        let claims = self
            .tokens
            .verify_refresh(refresh_token)
            .map_err(|err| match err {
                TokenError::Expired => AuthError::unauthorized(EXPIRED_REFRESH_TOKEN),
                TokenError::InvalidSignature | TokenError::Malformed => {
                    debug!("refresh token rejected: {err}");
                    AuthError::unauthorized(INVALID_REFRESH_TOKEN)
                }
            })?;
        if claims.class.kind() != kind {
            return Err(AuthError::unauthorized(INVALID_REFRESH_TOKEN));
        }
        Ok(claims)
    }
}
