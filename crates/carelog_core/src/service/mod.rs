//! Use-case services over the persisted client collection.
//!
//! # Responsibility
//! - Turn repository calls into UI-level operations with validation.
//! - Keep FFI and CLI layers free of storage and codec details.

pub mod home_service;
pub mod share;
