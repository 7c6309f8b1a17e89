//! Whole-collection persistence for clients and the next-id counter.
//!
//! # Responsibility
//! - Save the full client collection under `home_items` and the counter
//!   under `next_item_id`.
//! - Load and migrate any stored blob shape, self-healing the counter.
//!
//! # Invariants
//! - Loaded `next_client_id` is `max(stored, max client id + 1)`.
//! - A stored client id of `ClientId::MAX` pins the counter at `ClientId::MAX`;
//!   the service refuses to allocate from it.
//! - The blob and the counter are written as two independent puts.

use super::prefs_repo::PreferenceStore;
use super::RepoResult;
use crate::codec::{decode_clients_at, encode_clients};
use crate::model::care::{min_next_client_id, Client, ClientId};
use crate::model::time::{Clock, SystemClock};
use chrono::NaiveDateTime;
use log::{info, warn};
use std::time::Instant;

/// Preference key holding the JSON array of clients.
pub const KEY_ITEMS: &str = "home_items";
/// Preference key holding the next client id to allocate.
pub const KEY_NEXT_ID: &str = "next_item_id";

/// Loaded collection plus the id counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HomeSnapshot {
    /// Clients sorted newest first; entries sorted newest first.
    pub clients: Vec<Client>,
    pub next_client_id: ClientId,
}

/// Repository persisting the client collection in a preference store.
pub struct HomeRepository<S: PreferenceStore> {
    store: S,
}

impl<S: PreferenceStore> HomeRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Loads the collection, using the system clock for timestamp fallback.
    pub fn load(&self) -> RepoResult<HomeSnapshot> {
        self.load_at(SystemClock.now())
    }

    /// Loads the collection; unparseable timestamps become `now`.
    pub fn load_at(&self, now: NaiveDateTime) -> RepoResult<HomeSnapshot> {
        let started_at = Instant::now();
        let blob = self.store.get_string(KEY_ITEMS)?;
        let stored_next_id = self.store.get_int(KEY_NEXT_ID)?.unwrap_or(0);

        let clients = decode_clients_at(blob.as_deref(), now);
        let min_next_id = min_next_client_id(&clients).unwrap_or_else(|| {
            warn!("event=home_load module=repo status=degraded error_code=client_ids_exhausted");
            ClientId::MAX
        });
        if stored_next_id < min_next_id {
            warn!(
                "event=home_load module=repo status=healed stored_next_id={} computed_next_id={}",
                stored_next_id, min_next_id
            );
        }
        let next_client_id = stored_next_id.max(min_next_id);

        info!(
            "event=home_load module=repo status=ok clients={} next_client_id={} duration_ms={}",
            clients.len(),
            next_client_id,
            started_at.elapsed().as_millis()
        );
        Ok(HomeSnapshot {
            clients,
            next_client_id,
        })
    }

    /// Writes the entire collection and the counter.
    pub fn save(&self, clients: &[Client], next_client_id: ClientId) -> RepoResult<()> {
        let blob = encode_clients(clients)?;
        self.store.put_string(KEY_ITEMS, &blob)?;
        self.store.put_int(KEY_NEXT_ID, next_client_id)?;
        info!(
            "event=home_save module=repo status=ok clients={} next_client_id={} bytes={}",
            clients.len(),
            next_client_id,
            blob.len()
        );
        Ok(())
    }
}
