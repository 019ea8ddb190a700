//! Player identity and per-call context

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Signed-in user as reported by the remote identity primitive
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: String,
    pub email: String,
}

/// Owner of a local state namespace
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Profile {
    #[default]
    Guest,
    Account(UserIdentity),
}

impl Profile {
    pub fn from_user(user: Option<UserIdentity>) -> Self {
        match user {
            Some(user) => Self::Account(user),
            None => Self::Guest,
        }
    }

    /// Namespace key for local persistence
    pub fn storage_key(&self) -> String {
        match self {
            Self::Guest => "guest".to_string(),
            Self::Account(user) => format!("user:{}", user.id),
        }
    }

    pub fn user(&self) -> Option<&UserIdentity> {
        match self {
            Self::Guest => None,
            Self::Account(user) => Some(user),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Account(_))
    }
}

/// Explicit context passed into every engine call instead of reading the
/// wall clock or a global "current user".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayContext {
    pub today: NaiveDate,
    pub profile: Profile,
}

impl PlayContext {
    pub fn new(today: NaiveDate, profile: Profile) -> Self {
        Self { today, profile }
    }

    pub fn guest(today: NaiveDate) -> Self {
        Self::new(today, Profile::Guest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_keys_are_namespaced() {
        let user = UserIdentity {
            id: "abc".into(),
            email: "ash@example.com".into(),
        };
        assert_eq!(Profile::Guest.storage_key(), "guest");
        assert_eq!(Profile::Account(user).storage_key(), "user:abc");
    }
}
