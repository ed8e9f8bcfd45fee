//! Ownership gate for blog and comment mutations.
//!
//! # Invariants
//! - `caller_id` comes from the authenticated identity, never from request
//!   body data.
//! - The gate runs inside the write transaction of the mutation it guards.

use crate::model::user::UserId;
use crate::repo::error::{RepoError, RepoResult};
use log::warn;

/// Fails with `PermissionDenied` unless `caller_id` owns the entity.
pub fn ensure_owner(entity: &'static str, owner_id: UserId, caller_id: UserId) -> RepoResult<()> {
    if owner_id == caller_id {
        return Ok(());
    }

    warn!(
        "event=ownership_check module=repo status=denied entity={} caller_id={}",
        entity, caller_id
    );
    Err(RepoError::PermissionDenied { entity })
}
