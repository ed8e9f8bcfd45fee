//! Transaction wrapper shared by every repository operation.
//!
//! # Responsibility
//! - Scope one repository operation to one SQLite transaction.
//! - Roll back on any failure before the error leaves the repository.
//! - Translate storage failures into the `RepoError` taxonomy.
//!
//! # Invariants
//! - Success returns the body's value unchanged, after commit.
//! - Write operations begin `IMMEDIATE`, so the write lock is held from the
//!   first read; ownership checks and the writes they guard cannot interleave
//!   with another writer.
//! - The not-found check is layered on top (`require_found`), never inside.

use crate::repo::error::{RepoError, RepoResult};
use log::{debug, error, warn};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::fmt::Display;
use std::time::Instant;

/// Lock behavior requested for one unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// `BEGIN DEFERRED`; shared lock acquired on first read.
    Read,
    /// `BEGIN IMMEDIATE`; reserved lock acquired up front.
    Write,
}

impl AccessMode {
    fn behavior(self) -> TransactionBehavior {
        match self {
            Self::Read => TransactionBehavior::Deferred,
            Self::Write => TransactionBehavior::Immediate,
        }
    }
}

/// Runs `body` inside one transaction on `conn`.
///
/// Commits when `body` succeeds, rolls back otherwise. SQLite errors raised by
/// `body`, by `BEGIN` or by `COMMIT` reach the caller already translated.
///
/// # Errors
/// - Whatever `body` returns.
/// - `Conflict`/`Internal` when the transaction cannot begin or commit.
pub fn with_unit_of_work<T>(
    conn: &Connection,
    operation: &'static str,
    mode: AccessMode,
    body: impl FnOnce(&Transaction<'_>) -> RepoResult<T>,
) -> RepoResult<T> {
    let started_at = Instant::now();
    let tx = Transaction::new_unchecked(conn, mode.behavior())
        .map_err(|err| log_failure(operation, started_at, RepoError::from(err)))?;

    let outcome = body(&tx);
    match outcome {
        Ok(value) => {
            tx.commit()
                .map_err(|err| log_failure(operation, started_at, RepoError::from(err)))?;
            debug!(
                "event={} module=repo status=ok duration_ms={}",
                operation,
                started_at.elapsed().as_millis()
            );
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback() {
                error!(
                    "event={} module=repo status=error error_code=rollback_failed error={}",
                    operation, rollback_err
                );
            }
            Err(log_failure(operation, started_at, err))
        }
    }
}

/// Turns an absent row into `RepoError::NotFound`.
///
/// Composed around a unit of work (or any row loader), so the 404 check is
/// stacked on top of storage error translation.
pub fn require_found<T>(
    entity: &'static str,
    id: impl Display,
    body: impl FnOnce() -> RepoResult<Option<T>>,
) -> RepoResult<T> {
    body()?.ok_or_else(|| RepoError::not_found(entity, id))
}

fn log_failure(operation: &'static str, started_at: Instant, err: RepoError) -> RepoError {
    let duration_ms = started_at.elapsed().as_millis();
    match &err {
        RepoError::Internal(_) | RepoError::UninitializedConnection { .. } => error!(
            "event={} module=repo status=error duration_ms={} error_code={} error={}",
            operation,
            duration_ms,
            err.error_code(),
            err
        ),
        RepoError::Conflict(_) => warn!(
            "event={} module=repo status=error duration_ms={} error_code={} error={}",
            operation,
            duration_ms,
            err.error_code(),
            err
        ),
        _ => debug!(
            "event={} module=repo status=rejected duration_ms={} error_code={}",
            operation,
            duration_ms,
            err.error_code()
        ),
    }
    err
}

#[cfg(test)]
mod tests {
    use super::{require_found, with_unit_of_work, AccessMode};
    use crate::repo::error::RepoError;
    use rusqlite::Connection;

    fn scratch_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE items (name TEXT NOT NULL UNIQUE);")
            .unwrap();
        conn
    }

    fn count(conn: &Connection) -> i64 {
        conn.query_row("SELECT COUNT(*) FROM items;", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn success_commits_and_returns_value_unchanged() {
        let conn = scratch_conn();
        let value = with_unit_of_work(&conn, "test_insert", AccessMode::Write, |tx| {
            tx.execute("INSERT INTO items (name) VALUES ('a');", [])?;
            Ok(42)
        })
        .unwrap();
        assert_eq!(value, 42);
        assert_eq!(count(&conn), 1);
    }

    #[test]
    fn storage_failure_rolls_back_earlier_writes() {
        let conn = scratch_conn();
        let err = with_unit_of_work(&conn, "test_insert", AccessMode::Write, |tx| {
            tx.execute("INSERT INTO items (name) VALUES ('a');", [])?;
            tx.execute("INSERT INTO items (name) VALUES ('a');", [])?;
            Ok(())
        })
        .unwrap_err();
        assert!(matches!(err, RepoError::Conflict(_)));
        assert_eq!(count(&conn), 0);
    }

    #[test]
    fn domain_failure_also_rolls_back() {
        let conn = scratch_conn();
        let err = with_unit_of_work(&conn, "test_insert", AccessMode::Write, |tx| {
            tx.execute("INSERT INTO items (name) VALUES ('a');", [])?;
            Err::<(), _>(RepoError::PermissionDenied { entity: "Item" })
        })
        .unwrap_err();
        assert_eq!(err, RepoError::PermissionDenied { entity: "Item" });
        assert_eq!(count(&conn), 0);
    }

    #[test]
    fn connection_is_reusable_after_rollback() {
        let conn = scratch_conn();
        let _ = with_unit_of_work(&conn, "test_fail", AccessMode::Write, |_| {
            Err::<(), _>(RepoError::Validation("nope".to_string()))
        });
        with_unit_of_work(&conn, "test_insert", AccessMode::Write, |tx| {
            tx.execute("INSERT INTO items (name) VALUES ('b');", [])?;
            Ok(())
        })
        .unwrap();
        assert_eq!(count(&conn), 1);
    }

    #[test]
    fn require_found_maps_none_to_not_found() {
        let err = require_found("Item", "abc", || Ok::<Option<()>, RepoError>(None)).unwrap_err();
        assert_eq!(
            err,
            RepoError::NotFound {
                entity: "Item",
                id: "abc".to_string()
            }
        );
        let value = require_found("Item", "abc", || Ok(Some(7))).unwrap();
        assert_eq!(value, 7);
    }
}
