//! Use-case services over the repositories and identity/media collaborators.
//!
//! # Responsibility
//! - Orchestrate repository calls into request-level operations.
//! - Apply visibility rules that belong to the API boundary (drafts).
//! - Map every failure onto one error type with an HTTP status class.

pub mod account_service;
pub mod publishing_service;

use crate::auth::AuthError;
use crate::media::MediaError;
use crate::repo::error::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for account and publishing use-cases.
#[derive(Debug)]
pub enum ServiceError {
    /// Missing, invalid or expired credentials.
    Unauthenticated(String),
    /// Token issuance failed.
    Token(String),
    Repo(RepoError),
    Media(MediaError),
}

impl ServiceError {
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Unauthenticated(_) => 401,
            Self::Token(_) => 500,
            Self::Repo(err) => err.status_code(),
            Self::Media(err) => err.status_code(),
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthenticated(message) => write!(f, "{message}"),
            Self::Token(message) => write!(f, "failed to issue token: {message}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Media(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Media(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<MediaError> for ServiceError {
    fn from(value: MediaError) -> Self {
        Self::Media(value)
    }
}

impl From<AuthError> for ServiceError {
    fn from(value: AuthError) -> Self {
        match value {
            AuthError::Token(message) => Self::Token(message),
            AuthError::Hashing(message) => Self::Repo(RepoError::Internal(message)),
            other => Self::Unauthenticated(other.to_string()),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
