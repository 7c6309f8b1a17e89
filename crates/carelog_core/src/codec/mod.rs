//! JSON codec for the persisted client collection.
//!
//! # Responsibility
//! - Encode the full client collection into the `home_items` JSON blob.
//! - Decode every historical blob shape into canonical records.
//!
//! # Invariants
//! - Decoding never fails: malformed input degrades to defaults or an empty
//!   collection.
//! - Decoded clients and their entries are sorted newest first.

mod decode;
mod encode;

pub use decode::{decode_clients, decode_clients_at, StoredClientShape};
pub use encode::encode_clients;
