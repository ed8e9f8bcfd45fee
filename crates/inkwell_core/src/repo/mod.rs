//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts per entity family.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Every operation runs inside `with_unit_of_work`; failures roll back.
//! - Single-entity reads return `NotFound` instead of `Option`.
//! - Blog and comment mutations pass the ownership gate first.

pub mod authorize;
pub mod blog_repo;
pub mod comment_repo;
pub mod error;
pub mod taxonomy_repo;
pub mod unit_of_work;
pub mod user_repo;

use crate::db::migrations::{current_user_version, latest_version};
use crate::repo::error::{RepoError, RepoResult};
use rusqlite::Connection;
use uuid::Uuid;

pub(crate) const USER_ENTITY: &str = "User";
pub(crate) const BLOG_ENTITY: &str = "Blog";
pub(crate) const TAG_ENTITY: &str = "Tag";
pub(crate) const CATEGORY_ENTITY: &str = "Category";
pub(crate) const COMMENT_ENTITY: &str = "Comment";

/// Hard cap for any `limit` accepted by list operations.
pub const PAGE_LIMIT_MAX: u32 = 100;

/// Normalizes a list limit: `0` means `default`, values above the cap clamp.
pub fn normalize_limit(limit: u32, default: u32) -> u32 {
    match limit {
        0 => default.min(PAGE_LIMIT_MAX),
        value if value > PAGE_LIMIT_MAX => PAGE_LIMIT_MAX,
        value => value,
    }
}

pub(crate) fn ensure_schema_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }
    Ok(())
}

/// Checks a required text field: non-blank and at most `max_chars`.
pub(crate) fn validate_required(field: &str, value: &str, max_chars: usize) -> RepoResult<()> {
    if value.trim().is_empty() {
        return Err(RepoError::Validation(format!("{field} cannot be empty")));
    }
    validate_length(field, value, max_chars)
}

/// Checks an optional text field against `max_chars`.
pub(crate) fn validate_optional(
    field: &str,
    value: Option<&str>,
    max_chars: usize,
) -> RepoResult<()> {
    match value {
        Some(value) => validate_length(field, value, max_chars),
        None => Ok(()),
    }
}

fn validate_length(field: &str, value: &str, max_chars: usize) -> RepoResult<()> {
    let length = value.chars().count();
    if length > max_chars {
        return Err(RepoError::Validation(format!(
            "{field} must be at most {max_chars} characters, got {length}"
        )));
    }
    Ok(())
}

pub(crate) fn parse_uuid(value: &str, column: &'static str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::Internal(format!("invalid uuid `{value}` in {column}")))
}

pub(crate) fn parse_bool(value: i64, column: &'static str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::Internal(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
