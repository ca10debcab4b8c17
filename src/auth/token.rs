//! Signed access and refresh tokens (HS256 JWT).

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use ulid::Ulid;
use uuid::Uuid;

use super::{account::AccountClass, state::TokenConfig};

/// Claims embedded in both token kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Account id
    pub sub: Uuid,
    #[serde(flatten)]
    pub class: AccountClass,
    /// Issued-at (seconds since epoch)
    pub iat: i64,
    /// Expiry (seconds since epoch)
    pub exp: i64,
    /// Unique token id so tokens minted in the same second differ.
    pub jti: String,
}

impl Claims {
    fn new(
        account_id: Uuid,
        class: AccountClass,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<Self> {
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or_else(|| anyhow!("token lifetime out of range: {}s", ttl.num_seconds()))?;

        Ok(Self {
            sub: account_id,
            class,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: Ulid::new().to_string(),
        })
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    #[error("invalid token signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("malformed token")]
    Malformed,
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

/// Sign a token for `class` valid for `ttl` from `now`.
///
/// # Errors
/// Returns an error if `now + ttl` is out of range or encoding fails.
pub fn issue(
    account_id: Uuid,
    class: AccountClass,
    secret: &SecretString,
    ttl: Duration,
    now: DateTime<Utc>,
) -> Result<IssuedToken> {
    let claims = Claims::new(account_id, class, now, ttl)?;
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.expose_secret().as_bytes()),
    )
    .context("failed to sign token")?;

    Ok(IssuedToken { token, claims })
}

/// Verify signature and expiry, returning the claims.
///
/// # Errors
/// `InvalidSignature` when the token was not signed with `secret`, `Expired`
/// once `exp` has passed, `Malformed` for anything else.
pub fn verify(token: &str, secret: &SecretString) -> Result<Claims, TokenError> {
    // Pin the algorithm; no leeway so expiry is exact.
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.expose_secret().as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::InvalidSignature => TokenError::InvalidSignature,
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Malformed,
    })
}

/// SHA-256 hex digest of a token; refresh tokens are stored by digest only.
#[must_use]
pub fn digest(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn ttl(seconds: i64) -> Result<Duration> {
    Duration::try_seconds(seconds).ok_or_else(|| anyhow!("token lifetime out of range: {seconds}s"))
}

/// Issues and verifies both token kinds with the configured secrets and TTLs.
#[derive(Clone, Debug)]
pub struct TokenIssuer {
    config: TokenConfig,
}

impl TokenIssuer {
    #[must_use]
    pub fn new(config: TokenConfig) -> Self {
        Self { config }
    }

    /// # Errors
    /// Returns an error if signing fails.
    pub fn issue_access(
        &self,
        account_id: Uuid,
        class: AccountClass,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken> {
        issue(
            account_id,
            class,
            self.config.access_secret(),
            ttl(self.config.access_ttl_seconds())?,
            now,
        )
    }

    /// # Errors
    /// Returns an error if signing fails.
    pub fn issue_refresh(
        &self,
        account_id: Uuid,
        class: AccountClass,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken> {
        issue(
            account_id,
            class,
            self.config.refresh_secret(),
            ttl(self.config.refresh_ttl_seconds())?,
            now,
        )
    }

    /// # Errors
    /// See [`verify`].
    pub fn verify_access(&self, token: &str) -> Result<Claims, TokenError> {
        verify(token, self.config.access_secret())
    }

    /// # Errors
    /// See [`verify`].
    pub fn verify_refresh(&self, token: &str) -> Result<Claims, TokenError> {
        verify(token, self.config.refresh_secret())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret(value: &str) -> SecretString {
        SecretString::from(value.to_string())
    }

    fn resident() -> AccountClass {
        AccountClass::Resident {
            national_id: "1234567890123456".to_string(),
            name: "Budi".to_string(),
            rt: "01".to_string(),
            rw: "02".to_string(),
        }
    }

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(TokenConfig::new(secret("access-secret"), secret("refresh-secret")))
    }

    #[test]
    fn issue_and_verify_round_trip() -> Result<()> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let issued = issue(id, resident(), &secret("s3cret"), Duration::hours(1), now)?;
        let claims = verify(&issued.token, &secret("s3cret")).map_err(anyhow::Error::from)?;

        assert_eq!(claims, issued.claims);
        assert_eq!(claims.sub, id);
        assert_eq!(claims.class, resident());
        assert_eq!(claims.iat, now.timestamp());
        assert_eq!(claims.exp, claims.iat + 3600);
        Ok(())
    }

    #[test]
    fn access_token_expires_after_one_hour() -> Result<()> {
        let issuer = issuer();
        let id = Uuid::new_v4();

        let fresh = issuer.issue_access(id, resident(), Utc::now() - Duration::minutes(59))?;
        assert!(issuer.verify_access(&fresh.token).is_ok());

        let stale = issuer.issue_access(id, resident(), Utc::now() - Duration::minutes(61))?;
        assert_eq!(
            issuer.verify_access(&stale.token),
            Err(TokenError::Expired)
        );
        Ok(())
    }

    #[test]
    fn wrong_secret_is_invalid_signature() -> Result<()> {
        let issued = issue(
            Uuid::new_v4(),
            resident(),
            &secret("secret-A"),
            Duration::hours(1),
            Utc::now(),
        )?;
        assert_eq!(
            verify(&issued.token, &secret("secret-B")),
            Err(TokenError::InvalidSignature)
        );
        Ok(())
    }

    #[test]
    fn access_and_refresh_secrets_are_independent() -> Result<()> {
        let issuer = issuer();
        let refresh = issuer.issue_refresh(Uuid::new_v4(), resident(), Utc::now())?;
        assert_eq!(
            issuer.verify_access(&refresh.token),
            Err(TokenError::InvalidSignature)
        );
        assert!(issuer.verify_refresh(&refresh.token).is_ok());
        assert_eq!(refresh.claims.exp - refresh.claims.iat, 365 * 24 * 60 * 60);
        Ok(())
    }

    #[test]
    fn garbage_is_malformed() {
        assert_eq!(
            verify("not.a.jwt", &secret("s3cret")),
            Err(TokenError::Malformed)
        );
        assert_eq!(verify("", &secret("s3cret")), Err(TokenError::Malformed));
    }

    #[test]
    fn tokens_in_same_second_differ() -> Result<()> {
        let issuer = issuer();
        let id = Uuid::new_v4();
        let now = Utc::now();
        let first = issuer.issue_refresh(id, resident(), now)?;
        let second = issuer.issue_refresh(id, resident(), now)?;
        assert_ne!(first.token, second.token);
        assert_ne!(digest(&first.token), digest(&second.token));
        Ok(())
    }

    #[test]
    fn oversized_lifetime_is_an_error() -> Result<()> {
        let id = Uuid::new_v4();
        let huge = TokenIssuer::new(
            TokenConfig::new(secret("access-secret"), secret("refresh-secret"))
                .with_access_ttl_seconds(i64::MAX)
                .with_refresh_ttl_seconds(10_000_000_000_000),
        );
        assert!(huge.issue_access(id, resident(), Utc::now()).is_err());
        assert!(huge.issue_refresh(id, resident(), Utc::now()).is_err());

        let near_end = DateTime::<Utc>::MAX_UTC - Duration::seconds(10);
        assert!(issue(id, resident(), &secret("s3cret"), Duration::hours(1), near_end).is_err());
        Ok(())
    }

    #[test]
    fn digest_is_stable_hex() {
        let first = digest("token");
        assert_eq!(first, digest("token"));
        assert_ne!(first, digest("other"));
        assert_eq!(first.len(), 64);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
