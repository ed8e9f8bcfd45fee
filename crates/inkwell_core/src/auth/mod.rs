//! Identity collaborators: password hashing and bearer tokens.
//!
//! # Responsibility
//! - Define the seams repositories and services consume (`CredentialHasher`,
//!   `TokenIssuer`).
//! - Ship default implementations usable without extra wiring.
//!
//! # Invariants
//! - Plaintext passwords and tokens are never logged.

mod credentials;
mod token;

pub use credentials::{BcryptCredentialHasher, CredentialHasher};
pub use token::{Claims, JwtTokenIssuer, TokenIssuer, DEFAULT_TOKEN_TTL};

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Authentication failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Unknown username or wrong password; deliberately indistinguishable.
    InvalidCredentials,
    /// Token is malformed, expired, badly signed, or names an unknown user.
    InvalidToken(String),
    /// Token could not be issued.
    Token(String),
    /// Password hash could not be produced.
    Hashing(String),
}

impl AuthError {
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidCredentials | Self::InvalidToken(_) => 401,
            Self::Token(_) | Self::Hashing(_) => 500,
        }
    }
}

impl Display for AuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidCredentials => write!(f, "invalid username or password"),
            Self::InvalidToken(reason) => write!(f, "could not validate credentials: {reason}"),
            Self::Token(reason) => write!(f, "failed to issue token: {reason}"),
            Self::Hashing(reason) => write!(f, "failed to hash password: {reason}"),
        }
    }
}

impl Error for AuthError {}
