//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the storage-engine contract for the `pets` table.
//! - Isolate SQLite query details from provider routing and validation.
//!
//! # Invariants
//! - Repository APIs never emit change notifications.
//! - Repository APIs surface DB transport errors and invalid persisted rows.

pub mod pet_repo;
