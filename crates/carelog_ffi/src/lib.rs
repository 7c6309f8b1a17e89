//! Flutter-facing bindings for the care-log core.

pub mod api;
