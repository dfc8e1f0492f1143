use chrono::Utc;
use tracing::warn;
use uuid::Uuid;

use crate::geo::GeoPoint;
use crate::models::vehicle::Availability;
use crate::state::AppState;

/// Flips vehicle and driver availability as a side effect of a booking
/// transition. Callers must invoke these while holding the booking's map
/// entry, so concurrent transitions on the same booking cannot interleave the
/// flips. Entries are always taken in vehicle-then-driver order.
///
/// Both operations are idempotent: re-marking an already-engaged (or
/// already-free) pair is a no-op.
pub fn mark_engaged(state: &AppState, vehicle_id: Uuid, driver_id: Uuid) {
    if let Some(mut vehicle) = state.vehicles.get_mut(&vehicle_id) {
        if vehicle.availability != Availability::Engaged {
            vehicle.availability = Availability::Engaged;
            vehicle.updated_at = Utc::now();
            state.metrics.vehicles_engaged.inc();
        }
    } else {
        warn!(%vehicle_id, "mark_engaged: vehicle missing from registry");
    }

    if let Some(mut driver) = state.drivers.get_mut(&driver_id) {
        if driver.availability != Availability::Engaged {
            driver.availability = Availability::Engaged;
            driver.updated_at = Utc::now();
        }
    } else {
        warn!(%driver_id, "mark_engaged: driver missing from registry");
    }
}

/// Inverse of [`mark_engaged`]. When `new_position` is given (delivery
/// completed at the drop), both the vehicle and the driver move there.
pub fn mark_free(
    state: &AppState,
    vehicle_id: Uuid,
    driver_id: Uuid,
    new_position: Option<GeoPoint>,
) {
    if let Some(mut vehicle) = state.vehicles.get_mut(&vehicle_id) {
        if vehicle.availability != Availability::Free {
            vehicle.availability = Availability::Free;
            state.metrics.vehicles_engaged.dec();
        }
        if let Some(position) = new_position {
            vehicle.position = position;
        }
        vehicle.updated_at = Utc::now();
    } else {
        warn!(%vehicle_id, "mark_free: vehicle missing from registry");
    }

    if let Some(mut driver) = state.drivers.get_mut(&driver_id) {
        if driver.availability != Availability::Free {
            driver.availability = Availability::Free;
        }
        if let Some(position) = new_position {
            driver.position = position;
        }
        driver.updated_at = Utc::now();
    } else {
        warn!(%driver_id, "mark_free: driver missing from registry");
    }
}
