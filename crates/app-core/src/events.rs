//! Events and event registration
//!
//! The event list itself is a constant catalog. What changes on the device
//! is the remaining slot count per event (`eventSlots`) and the set of events
//! the user registered for (`registeredEvents`).

use app_state::SessionContext;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use storage::{keys, Collection, IdSet, LocalStore};

use crate::catalog::{self, Searchable};
use crate::error::{CoreError, Result};

/// An event in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Event id
    pub id: String,
    /// Title
    pub title: String,
    /// Category (Pelatihan, Seminar, ...)
    pub category: String,
    /// Date, `YYYY-MM-DD`
    pub date: String,
    /// Local start and end time
    pub time: String,
    /// Venue or "Online"
    pub location: String,
    /// Organizing body
    pub organizer: String,
    /// Short description
    pub description: String,
    /// Capacity when registration opened
    pub total_slots: u32,
}

/// An event together with the user's state for it
#[derive(Debug, Clone, PartialEq)]
pub struct EventView {
    /// The event
    pub event: Event,
    /// Slots still available
    pub slots_left: u32,
    /// Whether the user registered
    pub is_registered: bool,
}

impl Searchable for EventView {
    fn category(&self) -> &str {
        &self.event.category
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.event.title.as_str(),
            self.event.description.as_str(),
            self.event.location.as_str(),
            self.event.organizer.as_str(),
        ]
    }
}

#[allow(clippy::too_many_arguments)]
fn event(
    id: &str,
    title: &str,
    category: &str,
    date: &str,
    time: &str,
    location: &str,
    organizer: &str,
    description: &str,
    total_slots: u32,
) -> Event {
    Event {
        id: id.to_string(),
        title: title.to_string(),
        category: category.to_string(),
        date: date.to_string(),
        time: time.to_string(),
        location: location.to_string(),
        organizer: organizer.to_string(),
        description: description.to_string(),
        total_slots,
    }
}

/// The event catalog
pub fn seed_events() -> Vec<Event> {
    vec![
        event(
            "1",
            "Workshop Digital Marketing untuk UMKM",
            "Workshop",
            "2024-12-15",
            "09:00 - 15:00 WIB",
            "Gedung SMESCO, Jakarta Selatan",
            "Kementerian Koperasi dan UKM",
            "Strategi pemasaran media sosial dan marketplace untuk meningkatkan penjualan.",
            30,
        ),
        event(
            "2",
            "Pelatihan Manajemen Keuangan Bisnis",
            "Pelatihan",
            "2024-12-18",
            "13:00 - 16:00 WIB",
            "Online (Zoom)",
            "Dinas Koperasi dan UKM DKI Jakarta",
            "Pencatatan keuangan sederhana, arus kas, dan pemisahan keuangan usaha.",
            12,
        ),
        event(
            "3",
            "Seminar Akses Pembiayaan KUR",
            "Seminar",
            "2024-12-20",
            "10:00 - 12:00 WIB",
            "Balai Kota Bandung",
            "Bank BRI bersama Kemenkop UKM",
            "Syarat, proses pengajuan, dan tips lolos Kredit Usaha Rakyat.",
            50,
        ),
        event(
            "4",
            "Pameran Produk Lokal Nusantara",
            "Pameran",
            "2025-01-10",
            "08:00 - 17:00 WIB",
            "Jakarta Convention Center",
            "SMESCO Indonesia",
            "Kesempatan memamerkan produk unggulan kepada pembeli dan investor.",
            20,
        ),
        event(
            "5",
            "Webinar Ekspor untuk Pemula",
            "Webinar",
            "2025-01-15",
            "19:00 - 21:00 WIB",
            "Online (YouTube Live)",
            "Kementerian Perdagangan",
            "Langkah awal ekspor, dokumen yang dibutuhkan, dan mencari buyer luar negeri.",
            100,
        ),
    ]
}

fn seed_slots() -> Vec<(String, u32)> {
    seed_events().into_iter().map(|e| (e.id, e.total_slots)).collect()
}

fn find_event(id: &str) -> Result<Event> {
    seed_events()
        .into_iter()
        .find(|event| event.id == id)
        .ok_or_else(|| CoreError::NotFound(id.to_string()))
}

/// Events screen controller
pub struct EventsController {
    session: Arc<SessionContext>,
    slots: Collection<u32>,
    registered: IdSet,
}

impl EventsController {
    /// Create a controller over `store`
    pub fn new(store: Arc<dyn LocalStore>, session: Arc<SessionContext>) -> Self {
        Self {
            session,
            slots: Collection::new(Arc::clone(&store), keys::EVENT_SLOTS),
            registered: IdSet::new(store, keys::REGISTERED_EVENTS),
        }
    }

    /// All events with slot counts and registration state
    pub async fn load(&self) -> Vec<EventView> {
        let slots = catalog::load_or_seed(&self.slots, seed_slots).await;
        let registered = catalog::members(&self.registered).await;

        seed_events()
            .into_iter()
            .map(|event| EventView {
                slots_left: slots
                    .entries
                    .get(&event.id)
                    .map(|entry| entry.value)
                    .unwrap_or(event.total_slots),
                is_registered: registered.contains(&event.id),
                event,
            })
            .collect()
    }

    /// Filter loaded events by category and query
    pub fn filter(events: &[EventView], category: Option<&str>, query: &str) -> Vec<EventView> {
        catalog::filter(events, category, query)
    }

    /// Events the user registered for
    pub async fn my_events(&self) -> Vec<EventView> {
        self.load().await.into_iter().filter(|view| view.is_registered).collect()
    }

    /// Register the signed-in user for event `id`
    ///
    /// Takes one slot, then records the registration. If recording fails
    /// the slot is given back.
    pub async fn register(&self, id: &str) -> Result<EventView> {
        let user = self.session.require_user()?;
        let event = find_event(id)?;

        if self.registered.contains(id).await? {
            return Err(CoreError::AlreadyRegistered);
        }

        let slots = self.slots.seed(seed_slots()).await?;
        let current = slots
            .entries
            .get(id)
            .ok_or_else(|| CoreError::NotFound(id.to_string()))?;
        if current.value == 0 {
            return Err(CoreError::EventFull);
        }

        let taken = self.slots.replace(id, current.version, current.value - 1).await?;

        match self.registered.insert(id).await {
            Ok(true) => {}
            Ok(false) => {
                self.give_back_slot(&event).await;
                return Err(CoreError::AlreadyRegistered);
            }
            Err(e) => {
                self.give_back_slot(&event).await;
                return Err(e.into());
            }
        }

        tracing::info!(event_id = id, user_id = %user.id, slots_left = taken.value, "registered for event");
        Ok(EventView { event, slots_left: taken.value, is_registered: true })
    }

    /// Cancel the signed-in user's registration for event `id`
    pub async fn cancel(&self, id: &str) -> Result<EventView> {
        self.session.require_user()?;
        let event = find_event(id)?;

        if !self.registered.remove(id).await? {
            return Err(CoreError::NotRegistered);
        }

        let total = event.total_slots;
        match self.slots.modify(id, move |left| (left + 1).min(total)).await {
            Ok(released) => {
                tracing::info!(event_id = id, slots_left = released.value, "event registration cancelled");
                Ok(EventView { event, slots_left: released.value, is_registered: false })
            }
            Err(e) => {
                if let Err(undo) = self.registered.insert(id).await {
                    tracing::warn!(event_id = id, error = %undo, "could not restore registration");
                }
                Err(e.into())
            }
        }
    }

    async fn give_back_slot(&self, event: &Event) {
        let total = event.total_slots;
        if let Err(e) = self.slots.modify(&event.id, move |left| (left + 1).min(total)).await {
            tracing::warn!(event_id = %event.id, error = %e, "could not give back event slot");
        }
    }
}
