//! Client display color assignment.
//!
//! # Responsibility
//! - Keep a fixed 8-color card palette.
//! - Assign a stored color to every client lacking one, preferring colors not
//!   used by other clients in the same pass.
//!
//! # Invariants
//! - Assigned colors always come from `CARD_PALETTE`.
//! - A stored (nonzero) color is never reassigned.
//! - Distinctness is best effort: with more than 8 clients colors repeat.
//!
//! Stored values use the UI toolkit's packed sRGB encoding: the ARGB word in
//! the upper 32 bits of an `i64`.

use crate::model::care::{Client, ClientId};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::{HashMap, HashSet};

/// Card palette as ARGB words.
pub const CARD_PALETTE: [u32; 8] = [
    0xFF3F_51B5, // indigo
    0xFF00_9688, // teal
    0xFF60_7D8B, // blue grey
    0xFFF5_7C00, // orange
    0xFF8E_24AA, // purple
    0xFF43_A047, // green
    0xFF39_49AB, // deep purple
    0xFF00_897B, // teal variant
];

/// Packs an ARGB word into the persisted color representation.
pub fn pack_argb(argb: u32) -> i64 {
    (u64::from(argb) << 32) as i64
}

/// Extracts the ARGB word from a persisted color value.
pub fn argb_from_packed(packed: i64) -> u32 {
    ((packed as u64) >> 32) as u32
}

/// Returns the packed value of every palette color.
pub fn packed_palette() -> [i64; 8] {
    CARD_PALETTE.map(pack_argb)
}

/// Picks a packed palette color not in `excluded`, or any palette color when
/// all of them are taken.
pub fn generate_card_color<R: Rng + ?Sized>(excluded: &HashSet<i64>, rng: &mut R) -> i64 {
    let palette = packed_palette();
    let available = palette
        .iter()
        .copied()
        .filter(|color| !excluded.contains(color))
        .collect::<Vec<_>>();

    let pool: &[i64] = if available.is_empty() {
        &palette
    } else {
        &available
    };
    // The pool is never empty: it falls back to the full palette.
    pool.choose(rng).copied().unwrap_or(palette[0])
}

/// Rendering colors (ARGB) for the current in-memory clients.
///
/// Stored colors are used as-is; clients still lacking a color get a fresh
/// random palette pick. Nothing is persisted.
pub fn assign_display_colors<R: Rng + ?Sized>(
    clients: &[Client],
    rng: &mut R,
) -> HashMap<ClientId, u32> {
    clients
        .iter()
        .map(|client| {
            let argb = if client.has_color() {
                argb_from_packed(client.color)
            } else {
                CARD_PALETTE.choose(rng).copied().unwrap_or(CARD_PALETTE[0])
            };
            (client.id, argb)
        })
        .collect()
}

/// Assigns a stored color to every client with `color == 0`.
///
/// Returns the updated clients and whether any color was assigned.
pub fn ensure_stored_colors<R: Rng + ?Sized>(
    clients: Vec<Client>,
    rng: &mut R,
) -> (Vec<Client>, bool) {
    let mut used = HashSet::new();
    let mut changed = false;

    let updated = clients
        .into_iter()
        .map(|mut client| {
            if !client.has_color() {
                client.color = generate_card_color(&used, rng);
                changed = true;
            }
            used.insert(client.color);
            client
        })
        .collect();

    (updated, changed)
}
