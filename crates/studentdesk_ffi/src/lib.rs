//! Flutter-facing bindings for the student dashboard core.

pub mod api;
