//! Live list synchronization.
//!
//! # Responsibility
//! - Mirror a live student subscription into one canonical in-memory snapshot.
//!
//! # Invariants
//! - Every snapshot fully replaces the previous one; there is no local diffing.
//! - At most one subscription is open per controller.

pub mod list_sync;
