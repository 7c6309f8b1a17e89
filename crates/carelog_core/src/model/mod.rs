//! Care record domain model.
//!
//! # Responsibility
//! - Define canonical shapes for clients, care entries and care info.
//! - Own timestamp formats shared by persistence, display and export.
//!
//! # Invariants
//! - Client ids are unique across the collection and never reused.
//! - Entry ids are unique within their parent client only.
//! - Entries are kept sorted by `created_at` descending.

pub mod care;
pub mod time;
