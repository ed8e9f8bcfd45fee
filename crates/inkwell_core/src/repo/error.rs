//! Repository error taxonomy and storage error translation.
//!
//! # Invariants
//! - SQLite constraint violations (unique, foreign key, not null, check)
//!   always translate to `Conflict`.
//! - Every other SQLite failure translates to `Internal` with the original
//!   message preserved.
//! - `PermissionDenied` never carries the target id, so the message does not
//!   echo caller input back.

use crate::db::DbError;
use rusqlite::ErrorCode;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Errors returned by every repository operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoError {
    /// Requested row is absent.
    NotFound { entity: &'static str, id: String },
    /// Uniqueness or referential-integrity violation.
    Conflict(String),
    /// Ownership gate failed on a mutation. The target exists.
    PermissionDenied { entity: &'static str },
    /// Caller-supplied data failed a pre-storage check.
    Validation(String),
    /// Connection schema is not at the version this binary expects.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Any other storage failure, or persisted data that cannot be read back.
    Internal(String),
}

impl RepoError {
    /// Maps the error to the HTTP status class used at the API boundary.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::PermissionDenied { .. } => 403,
            Self::NotFound { .. } => 404,
            Self::Conflict(_) => 409,
            Self::UninitializedConnection { .. } | Self::Internal(_) => 500,
        }
    }

    /// Stable short code used in log events.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::Conflict(_) => "conflict",
            Self::PermissionDenied { .. } => "permission_denied",
            Self::Validation(_) => "validation",
            Self::UninitializedConnection { .. } => "uninitialized_connection",
            Self::Internal(_) => "internal",
        }
    }

    pub(crate) fn not_found(entity: &'static str, id: impl Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Conflict(message) => write!(f, "conflict: {message}"),
            Self::PermissionDenied { entity } => {
                write!(f, "not permitted to modify this {}", entity.to_lowercase())
            }
            Self::Validation(message) => write!(f, "invalid input: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::Internal(message) => write!(f, "internal storage error: {message}"),
        }
    }
}

impl Error for RepoError {}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        match &value {
            rusqlite::Error::SqliteFailure(err, message)
                if err.code == ErrorCode::ConstraintViolation =>
            {
                Self::Conflict(message.clone().unwrap_or_else(|| value.to_string()))
            }
            _ => Self::Internal(value.to_string()),
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        match value {
            DbError::Sqlite(err) => err.into(),
            other => Self::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::RepoError;
    use rusqlite::Connection;

    #[test]
    fn unique_violation_translates_to_conflict() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (name TEXT UNIQUE); INSERT INTO t VALUES ('a');")
            .unwrap();
        let err: RepoError = conn
            .execute("INSERT INTO t VALUES ('a');", [])
            .unwrap_err()
            .into();
        match err {
            RepoError::Conflict(message) => assert!(message.contains("UNIQUE")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn other_failures_translate_to_internal_with_message() {
        let conn = Connection::open_in_memory().unwrap();
        let err: RepoError = conn
            .execute("INSERT INTO missing_table VALUES (1);", [])
            .unwrap_err()
            .into();
        match &err {
            RepoError::Internal(message) => assert!(message.contains("missing_table")),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn status_codes_follow_http_classes() {
        assert_eq!(RepoError::not_found("Blog", "x").status_code(), 404);
        assert_eq!(RepoError::Conflict("dup".into()).status_code(), 409);
        assert_eq!(
            RepoError::PermissionDenied { entity: "Blog" }.status_code(),
            403
        );
        assert_eq!(RepoError::Validation("bad".into()).status_code(), 400);
    }

    #[test]
    fn permission_message_is_generic() {
        let message = RepoError::PermissionDenied { entity: "Comment" }.to_string();
        assert_eq!(message, "not permitted to modify this comment");
    }
}
