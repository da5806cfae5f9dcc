//! Flutter-facing bindings for the note quiz core.

pub mod api;
