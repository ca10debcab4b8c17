//! Credential format checks run before any hashing or storage access.

use regex::Regex;

/// Which credential a value is checked as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKind {
    NationalId,
    Username,
    Password,
}

/// Check `value` against the format rules for `kind`.
#[must_use]
pub fn validate(kind: CredentialKind, value: &str) -> bool {
    match kind {
        CredentialKind::NationalId => valid_national_id(value),
        CredentialKind::Username => valid_username(value),
        CredentialKind::Password => valid_password(value),
    }
}

/// National identity numbers are exactly 16 decimal digits.
fn valid_national_id(national_id: &str) -> bool {
    Regex::new(r"^[0-9]{16}$").is_ok_and(|re| re.is_match(national_id))
}

/// 3 to 16 letters, digits or underscores.
fn valid_username(username: &str) -> bool {
    Regex::new(r"^[a-zA-Z0-9_]{3,16}$").is_ok_and(|re| re.is_match(username))
}

/// 8 to 16 characters from letters, digits and `!@#$%^&*`, at least one digit.
fn valid_password(password: &str) -> bool {
    // regex has no lookahead, so the digit requirement is checked separately
    Regex::new(r"^[a-zA-Z0-9!@#$%^&*]{8,16}$").is_ok_and(|re| re.is_match(password))
        && password.chars().any(|c| c.is_ascii_digit())
}
