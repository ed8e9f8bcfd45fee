//! User and account models.
//!
//! # Invariants
//! - A `User` always has exactly one `Account`; `User::username` is the
//!   account's login name.
//! - Password material never appears on `User`.

use crate::model::id::EntityId;
use serde::{Deserialize, Serialize};

pub type UserId = EntityId;
pub type AccountId = EntityId;

/// Profile read model, joined with the owning account's username.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    /// Unique display name.
    pub name: String,
    /// Login name from the linked account.
    pub username: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Login credentials, kept apart from profile data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: AccountId,
    pub user_id: UserId,
    pub username: String,
    /// Encoded hash produced by a `CredentialHasher`.
    pub password_hash: String,
}

/// Input for `UserRepository::create_user`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    /// Caller-supplied id, used by seeding and fixtures.
    pub id: Option<UserId>,
    pub name: String,
    pub username: String,
    /// Plaintext; hashed before it reaches storage.
    pub password: String,
}

impl NewUser {
    pub fn new(
        name: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn with_id(mut self, id: UserId) -> Self {
        self.id = Some(id);
        self
    }
}

/// Partial profile update; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub bio: Option<String>,
}
