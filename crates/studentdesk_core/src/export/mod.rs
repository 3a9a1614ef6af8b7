//! Snapshot export.
//!
//! # Responsibility
//! - Encode the canonical snapshot as delimited text.
//! - Hand the payload to a "save as" sink.

pub mod csv;
