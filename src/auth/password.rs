//! Argon2id password hashing.

use anyhow::{anyhow, Context, Result};
use argon2::{
    password_hash::{
        rand_core::{OsRng, RngCore},
        PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
    },
    Algorithm, Argon2, Params, Version,
};

// Fixed work parameters: 19 MiB memory, 2 passes, 1 lane.
const MEMORY_COST_KIB: u32 = 19_456;
const TIME_COST: u32 = 2;
const PARALLELISM: u32 = 1;
const SALT_LEN: usize = 16;

/// Digest verified for unknown identifiers so login costs the same either way.
/// Same parameters as [`hash`]; no password matches it.
pub const DUMMY_DIGEST: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$9A6CLfMw3IiC/zYyrLpFxg$lY631VDPeNK6KjfgW4yp3kNBNvVWdlMaNg2Clh6thfo";

fn hasher() -> Result<Argon2<'static>> {
    let params = Params::new(MEMORY_COST_KIB, TIME_COST, PARALLELISM, None)
        .map_err(|e| anyhow!("invalid argon2 parameters: {e}"))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hash a password with a fresh random salt, returning a PHC string.
///
/// # Errors
/// Returns an error if the OS RNG fails or the digest cannot be computed.
pub fn hash(password: &str) -> Result<String> {
    let mut salt_bytes = [0u8; SALT_LEN];
    OsRng
        .try_fill_bytes(&mut salt_bytes)
        .context("failed to generate password salt")?;
    let salt =
        SaltString::encode_b64(&salt_bytes).map_err(|e| anyhow!("failed to encode salt: {e}"))?;

    let digest = hasher()?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow!("failed to hash password: {e}"))?;

    Ok(digest.to_string())
}

/// Check a password against a stored PHC digest.
///
/// # Errors
/// Returns an error if the stored digest cannot be parsed or verification
/// fails for a reason other than a mismatch.
pub fn verify(password: &str, digest: &str) -> Result<bool> {
    let parsed = PasswordHash::new(digest).map_err(|e| anyhow!("invalid password hash: {e}"))?;

    match hasher()?.verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(anyhow!("failed to verify password: {e}")),
    }
}

/// Run [`hash`] on the blocking pool.
///
/// # Errors
/// Returns an error if hashing fails or the blocking task panics.
pub async fn hash_blocking(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || hash(&password))
        .await
        .context("password hashing task failed")?
}

/// Run [`verify`] on the blocking pool.
///
/// # Errors
/// Returns an error if verification fails or the blocking task panics.
pub async fn verify_blocking(password: String, digest: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || verify(&password, &digest))
        .await
        .context("password verification task failed")?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_correct() -> Result<()> {
        let digest = hash("abcd1234")?;
        assert!(verify("abcd1234", &digest)?);
        Ok(())
    }

    #[test]
    fn verify_wrong_password() -> Result<()> {
        let digest = hash("abcd1234")?;
        assert!(!verify("abcd1235", &digest)?);
        assert!(!verify("", &digest)?);
        Ok(())
    }

    #[test]
    fn different_salts_both_verify() -> Result<()> {
        let first = hash("same-pass1")?;
        let second = hash("same-pass1")?;
        assert_ne!(first, second);
        assert!(verify("same-pass1", &first)?);
        assert!(verify("same-pass1", &second)?);
        Ok(())
    }

    #[test]
    fn digest_uses_fixed_parameters() -> Result<()> {
        let digest = hash("abcd1234")?;
        assert!(digest.starts_with("$argon2id$v=19$m=19456,t=2,p=1$"));
        assert!(!digest.contains("abcd1234"));
        Ok(())
    }

    #[test]
    fn dummy_digest_parses_and_never_matches() -> Result<()> {
        let parsed = PasswordHash::new(DUMMY_DIGEST).map_err(|e| anyhow!("{e}"))?;
        assert_eq!(parsed.algorithm.as_str(), "argon2id");
        assert!(DUMMY_DIGEST.starts_with("$argon2id$v=19$m=19456,t=2,p=1$"));
        assert!(!verify("abcd1234", DUMMY_DIGEST)?);
        assert!(!verify("", DUMMY_DIGEST)?);
        Ok(())
    }

    #[test]
    fn malformed_digest_is_an_error() {
        assert!(verify("abcd1234", "not-a-phc-string").is_err());
    }

    #[tokio::test]
    async fn blocking_wrappers_round_trip() -> Result<()> {
        let digest = hash_blocking("abcd1234".to_string()).await?;
        assert!(verify_blocking("abcd1234".to_string(), digest.clone()).await?);
        assert!(!verify_blocking("wrong1234".to_string(), digest).await?);
        Ok(())
    }
}
