//! Domain model for the blog publishing core.
//!
//! # Responsibility
//! - Define canonical read models returned by repositories.
//! - Define creation/update inputs accepted by repositories.
//!
//! # Invariants
//! - Every entity is identified by a stable `EntityId` assigned at creation.
//! - Timestamps are Unix epoch milliseconds.
//! - Deletion is a hard delete; there are no tombstones.

pub mod blog;
pub mod comment;
pub mod id;
pub mod taxonomy;
pub mod user;
