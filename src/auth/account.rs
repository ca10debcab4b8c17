//! Account model shared by residents and administrators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Account partition; each kind has its own identifier scheme and table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    Resident,
    Admin,
}

impl AccountKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Resident => "resident",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Class-specific identity of an account.
///
/// Residents are identified by their national ID and carry their name and
/// RT/RW unit numbers; admins are identified by a username. The same shape is
/// embedded in token claims under a `class` tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "class", rename_all = "lowercase")]
pub enum AccountClass {
    Resident {
        national_id: String,
        name: String,
        rt: String,
        rw: String,
    },
    Admin {
        username: String,
    },
}

impl AccountClass {
    #[must_use]
    pub const fn kind(&self) -> AccountKind {
        match self {
            Self::Resident { .. } => AccountKind::Resident,
            Self::Admin { .. } => AccountKind::Admin,
        }
    }

    /// The unique identifier within the class.
    #[must_use]
    pub fn identifier(&self) -> &str {
        match self {
            Self::Resident { national_id, .. } => national_id,
            Self::Admin { username } => username,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Account {
    pub id: Uuid,
    pub class: AccountClass,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Account data ready to be persisted; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub class: AccountClass,
    pub password_hash: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kind_displays_as_lowercase() {
        assert_eq!(AccountKind::Resident.to_string(), "resident");
        assert_eq!(AccountKind::Admin.to_string(), "admin");
    }

    #[test]
    fn class_serializes_with_tag() -> serde_json::Result<()> {
        let admin = AccountClass::Admin {
            username: "pak_rt".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&admin)?,
            json!({"class": "admin", "username": "pak_rt"})
        );
        assert_eq!(admin.identifier(), "pak_rt");
        assert_eq!(admin.kind(), AccountKind::Admin);
        Ok(())
    }

    #[test]
    fn resident_identifier_is_national_id() {
        let resident = AccountClass::Resident {
            national_id: "1234567890123456".to_string(),
            name: "Budi".to_string(),
            rt: "01".to_string(),
            rw: "02".to_string(),
        };
        assert_eq!(resident.identifier(), "1234567890123456");
        assert_eq!(resident.kind(), AccountKind::Resident);
    }
}
