//! Student dashboard page composition.
//!
//! # Responsibility
//! - Compose list sync, search, export and the record form into one page.
//! - Own UI-only state: search text, modal visibility, pending notices.
//!
//! # See also
//! - `sync::list_sync`, `form::record_form`

pub mod listeners;
pub mod page;
