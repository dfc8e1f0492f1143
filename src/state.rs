use dashmap::DashMap;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::config::Config;
use crate::geo::{Geocoder, StaticGeocoder};
use crate::models::booking::{Booking, BookingEvent};
use crate::models::driver::Driver;
use crate::models::user::User;
use crate::models::vehicle::Vehicle;
use crate::observability::metrics::Metrics;

pub struct AppState {
    pub config: Config,
    pub users: DashMap<Uuid, User>,
    pub drivers: DashMap<Uuid, Driver>,
    pub vehicles: DashMap<Uuid, Vehicle>,
    pub bookings: DashMap<Uuid, Booking>,
    // Unique-key indexes backing the onboarding constraints: vehicle
    // registration numbers, driver emails/mobiles, user emails/phones.
    // Claimed atomically via `claim_unique` before the record is inserted.
    pub vehicle_registrations: DashMap<String, Uuid>,
    pub driver_contacts: DashMap<String, Uuid>,
    pub user_contacts: DashMap<String, Uuid>,
    pub geocoder: Box<dyn Geocoder>,
    pub booking_events_tx: broadcast::Sender<BookingEvent>,
    pub metrics: Metrics,
}

/// Claims `key` for `id` if nobody holds it. The check and the insert happen
/// under the entry lock, so two concurrent claims on the same key cannot both
/// succeed.
pub fn claim_unique(index: &DashMap<String, Uuid>, key: &str, id: Uuid) -> bool {
    use dashmap::mapref::entry::Entry;

    match index.entry(key.to_string()) {
        Entry::Occupied(_) => false,
        Entry::Vacant(slot) => {
            slot.insert(id);
            true
        }
    }
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self::with_geocoder(config, Box::new(StaticGeocoder::with_default_cities()))
    }

    pub fn with_geocoder(config: Config, geocoder: Box<dyn Geocoder>) -> Self {
        let (booking_events_tx, _unused_rx) = broadcast::channel(config.event_buffer_size);

        Self {
            config,
            users: DashMap::new(),
            drivers: DashMap::new(),
            vehicles: DashMap::new(),
            bookings: DashMap::new(),
            vehicle_registrations: DashMap::new(),
            driver_contacts: DashMap::new(),
            user_contacts: DashMap::new(),
            geocoder,
            booking_events_tx,
            metrics: Metrics::new(),
        }
    }
}
