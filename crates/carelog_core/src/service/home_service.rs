//! Client/entry use-case service.
//!
//! # Responsibility
//! - Hold the in-memory client collection loaded at startup.
//! - Apply create/update/delete operations and re-persist the full set.
//! - Track navigation selection by stable id.
//!
//! # Invariants
//! - Client ids come from a monotonic counter and are never reused.
//! - Entry ids are `max + 1` within their client, or `0`.
//! - `i64::MAX` is never allocated; reaching it fails with `IdsExhausted`.
//! - Clients and entries stay sorted newest first.
//! - A selection whose id no longer exists resolves to "deselected".
//! - Mutations are applied in memory before persisting; a failed save is
//!   reported but does not roll the in-memory state back.

use crate::model::care::{sort_clients_descending, CareEntry, CareInfo, Client, ClientId, EntryId};
use crate::model::time::{Clock, SystemClock};
use crate::palette::{assign_display_colors, ensure_stored_colors, generate_card_color};
use crate::repo::home_repo::HomeRepository;
use crate::repo::prefs_repo::PreferenceStore;
use crate::repo::RepoError;
use crate::service::share::{prepare_share, ShareError, ShareRequest, ShareTargetProbe};
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Service error for client/entry use-cases.
#[derive(Debug)]
pub enum HomeError {
    /// Client title is empty after trimming.
    BlankTitle,
    ClientNotFound(ClientId),
    /// An entry was selected while no client is open.
    NoClientSelected,
    EntryNotFound {
        client_id: ClientId,
        entry_id: EntryId,
    },
    /// No id is left to allocate; `client_id` is set for entry ids.
    IdsExhausted { client_id: Option<ClientId> },
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for HomeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTitle => write!(f, "client title must not be blank"),
            Self::ClientNotFound(id) => write!(f, "client not found: {id}"),
            Self::NoClientSelected => write!(f, "no client is selected"),
            Self::EntryNotFound {
                client_id,
                entry_id,
            } => write!(f, "entry {entry_id} not found in client {client_id}"),
            Self::IdsExhausted { client_id: None } => write!(f, "client ids are exhausted"),
            Self::IdsExhausted {
                client_id: Some(client_id),
            } => write!(f, "entry ids are exhausted in client {client_id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for HomeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for HomeError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

pub type HomeResult<T> = Result<T, HomeError>;

/// Screen the navigation state currently resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HomeView<'a> {
    Home,
    Client(&'a Client),
    Entry {
        client: &'a Client,
        entry: &'a CareEntry,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Selection {
    client: Option<ClientId>,
    entry: Option<EntryId>,
}

/// Stateful facade over the persisted client collection.
pub struct HomeService<S: PreferenceStore> {
    repo: HomeRepository<S>,
    clients: Vec<Client>,
    next_client_id: ClientId,
    selection: Selection,
    last_export: Option<PathBuf>,
    clock: Box<dyn Clock>,
    rng: StdRng,
}

impl<S: PreferenceStore> HomeService<S> {
    /// Loads the collection using the system clock and an OS-seeded RNG.
    pub fn open(store: S) -> HomeResult<Self> {
        Self::open_with(store, Box::new(SystemClock), StdRng::from_entropy())
    }

    /// Loads the collection, assigns missing colors and persists them.
    pub fn open_with(store: S, clock: Box<dyn Clock>, mut rng: StdRng) -> HomeResult<Self> {
        let repo = HomeRepository::new(store);
        let snapshot = repo.load_at(clock.now())?;
        let (mut clients, colors_changed) = ensure_stored_colors(snapshot.clients, &mut rng);
        sort_clients_descending(&mut clients);

        let service = Self {
            repo,
            clients,
            next_client_id: snapshot.next_client_id,
            selection: Selection::default(),
            last_export: None,
            clock,
            rng,
        };
        if colors_changed {
            info!("event=home_open module=service status=colors_assigned");
            service.persist()?;
        }
        Ok(service)
    }

    /// Clients in display order (newest first).
    pub fn clients(&self) -> &[Client] {
        &self.clients
    }

    pub fn client(&self, client_id: ClientId) -> Option<&Client> {
        self.clients.iter().find(|client| client.id == client_id)
    }

    pub fn next_client_id(&self) -> ClientId {
        self.next_client_id
    }

    /// Creates a client with a trimmed title and a fresh palette color.
    pub fn create_client(&mut self, title: &str) -> HomeResult<ClientId> {
        let title = title.trim();
        if title.is_empty() {
            return Err(HomeError::BlankTitle);
        }

        let used_colors = self
            .clients
            .iter()
            .filter(|client| client.has_color())
            .map(|client| client.color)
            .collect::<HashSet<_>>();

        let id = self.next_client_id;
        let following = id
            .checked_add(1)
            .ok_or(HomeError::IdsExhausted { client_id: None })?;
        let mut client = Client::new(id, title, self.clock.now());
        client.color = generate_card_color(&used_colors, &mut self.rng);
        self.clients.push(client);
        sort_clients_descending(&mut self.clients);
        self.next_client_id = following;

        info!("event=client_create module=service status=ok client_id={id}");
        self.persist()?;
        Ok(id)
    }

    /// Deletes a client together with all of its entries.
    pub fn delete_client(&mut self, client_id: ClientId) -> HomeResult<()> {
        let index = self
            .clients
            .iter()
            .position(|client| client.id == client_id)
            .ok_or(HomeError::ClientNotFound(client_id))?;
        self.clients.remove(index);
        self.prune_selection();

        info!("event=client_delete module=service status=ok client_id={client_id}");
        self.persist()
    }

    /// Adds an empty entry titled with the current time.
    pub fn add_entry(&mut self, client_id: ClientId) -> HomeResult<EntryId> {
        let now = self.clock.now();
        let client = self.client_mut(client_id)?;
        let entry_id = client.next_entry_id().ok_or(HomeError::IdsExhausted {
            client_id: Some(client_id),
        })?;
        client.entries.push(CareEntry::new(entry_id, now));
        client.sort_entries();

        info!(
            "event=entry_create module=service status=ok client_id={client_id} entry_id={entry_id}"
        );
        self.persist()?;
        Ok(entry_id)
    }

    /// Replaces the care info of one entry; title and timestamp are kept.
    pub fn update_entry_care_info(
        &mut self,
        client_id: ClientId,
        entry_id: EntryId,
        care_info: CareInfo,
    ) -> HomeResult<()> {
        let entry = self
            .client_mut(client_id)?
            .entry_mut(entry_id)
            .ok_or(HomeError::EntryNotFound {
                client_id,
                entry_id,
            })?;
        entry.care_info = care_info;

        info!(
            "event=entry_update module=service status=ok client_id={client_id} entry_id={entry_id}"
        );
        self.persist()
    }

    /// Deletes one entry.
    pub fn delete_entry(&mut self, client_id: ClientId, entry_id: EntryId) -> HomeResult<()> {
        let client = self.client_mut(client_id)?;
        let index = client
            .entries
            .iter()
            .position(|entry| entry.id == entry_id)
            .ok_or(HomeError::EntryNotFound {
                client_id,
                entry_id,
            })?;
        client.entries.remove(index);
        self.prune_selection();

        info!(
            "event=entry_delete module=service status=ok client_id={client_id} entry_id={entry_id}"
        );
        self.persist()
    }

    /// Opens a client's entry list.
    pub fn select_client(&mut self, client_id: ClientId) -> HomeResult<()> {
        if self.client(client_id).is_none() {
            return Err(HomeError::ClientNotFound(client_id));
        }
        self.selection = Selection {
            client: Some(client_id),
            entry: None,
        };
        Ok(())
    }

    /// Opens one entry of the selected client.
    pub fn select_entry(&mut self, entry_id: EntryId) -> HomeResult<()> {
        self.prune_selection();
        let client_id = self.selection.client.ok_or(HomeError::NoClientSelected)?;
        let exists = self
            .client(client_id)
            .is_some_and(|client| client.entry(entry_id).is_some());
        if !exists {
            return Err(HomeError::EntryNotFound {
                client_id,
                entry_id,
            });
        }
        self.selection.entry = Some(entry_id);
        Ok(())
    }

    /// Steps back one level: entry → client → home.
    pub fn navigate_back(&mut self) {
        self.prune_selection();
        if self.selection.entry.is_some() {
            self.selection.entry = None;
        } else {
            self.selection = Selection::default();
        }
    }

    pub fn navigate_home(&mut self) {
        self.selection = Selection::default();
    }

    /// Resolves the selection to a screen, dropping stale ids.
    pub fn current_view(&mut self) -> HomeView<'_> {
        self.prune_selection();
        let Some(client) = self
            .selection
            .client
            .and_then(|client_id| self.clients.iter().find(|client| client.id == client_id))
        else {
            return HomeView::Home;
        };
        match self.selection.entry.and_then(|entry_id| client.entry(entry_id)) {
            Some(entry) => HomeView::Entry { client, entry },
            None => HomeView::Client(client),
        }
    }

    /// ARGB rendering colors keyed by client id.
    pub fn display_colors(&mut self) -> HashMap<ClientId, u32> {
        assign_display_colors(&self.clients, &mut self.rng)
    }

    /// Selected clients in display order; unknown ids are ignored.
    pub fn clients_for_export(&self, client_ids: &[ClientId]) -> Vec<Client> {
        let wanted = client_ids.iter().copied().collect::<HashSet<_>>();
        self.clients
            .iter()
            .filter(|client| wanted.contains(&client.id))
            .cloned()
            .collect()
    }

    /// Remembers the most recent successful export.
    pub fn record_export(&mut self, path: impl Into<PathBuf>) {
        self.last_export = Some(path.into());
    }

    pub fn last_export(&self) -> Option<&Path> {
        self.last_export.as_deref()
    }

    /// Whether the last export still exists and can be shared.
    pub fn is_share_enabled(&self) -> bool {
        self.last_export().is_some_and(Path::is_file)
    }

    /// Prepares a share of the last export, forgetting it if it vanished.
    pub fn prepare_share<P: ShareTargetProbe + ?Sized>(
        &mut self,
        probe: &P,
    ) -> Result<ShareRequest, ShareError> {
        let result = prepare_share(self.last_export(), probe);
        if result == Err(ShareError::NoRecentExport) {
            self.last_export = None;
        }
        result
    }

    fn client_mut(&mut self, client_id: ClientId) -> HomeResult<&mut Client> {
        self.clients
            .iter_mut()
            .find(|client| client.id == client_id)
            .ok_or(HomeError::ClientNotFound(client_id))
    }

    fn prune_selection(&mut self) {
        let Some(client_id) = self.selection.client else {
            self.selection.entry = None;
            return;
        };
        let Some(client) = self.clients.iter().find(|client| client.id == client_id) else {
            self.selection = Selection::default();
            return;
        };
        if let Some(entry_id) = self.selection.entry {
            if client.entry(entry_id).is_none() {
                self.selection.entry = None;
            }
        }
    }

    fn persist(&self) -> HomeResult<()> {
        self.repo.save(&self.clients, self.next_client_id)?;
        Ok(())
    }
}
