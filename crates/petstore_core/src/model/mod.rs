//! Pet domain model.
//!
//! # Responsibility
//! - Define canonical data structures used by store business logic.
//! - Own the write-payload validation rules shared by insert and update.
//!
//! # Invariants
//! - Every stored pet is identified by a storage-assigned `PetId`.
//! - Deletion is a hard delete; there are no tombstones.

pub mod pet;
