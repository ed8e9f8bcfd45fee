//! Identifier generation.
//!
//! # Invariants
//! - Generated ids are UUIDv7: a millisecond timestamp prefix followed by
//!   random bits, so their hyphenated text form sorts by creation time.
//! - Ids are never reused for another row.

use uuid::Uuid;

/// Stable identifier shared by every entity kind.
pub type EntityId = Uuid;

/// Generates a new time-ordered identifier.
pub fn new_id() -> EntityId {
    Uuid::now_v7()
}

/// Returns the caller-supplied id, or a freshly generated one.
pub fn id_or_new(id: Option<EntityId>) -> EntityId {
    id.unwrap_or_else(new_id)
}
