//! Student record domain model.
//!
//! # Responsibility
//! - Define the canonical record shape mirrored from the student collection.
//! - Define the insertion payload the form controller hands to the store.
//!
//! # Invariants
//! - `StudentRecord::id` is assigned by the store and never changes.
//! - Records are created only; this system never updates or deletes them.

pub mod student;
