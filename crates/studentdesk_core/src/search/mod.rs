//! Free-text search over the canonical snapshot.
//!
//! # Responsibility
//! - Derive the visible subset of student records for a query.
//!
//! # Invariants
//! - Filtering never reorders records.

pub mod filter;
