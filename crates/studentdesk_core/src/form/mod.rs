//! Record creation form.
//!
//! # Responsibility
//! - Hold transient field state for the "Add Student" modal.
//! - Turn valid input into exactly one collection insert per submit.

pub mod record_form;
