use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::engine::{availability, pricing};
use crate::error::AppError;
use crate::models::booking::{
    Booking, BookingEvent, DeliveryStatus, OrderStatus, RequestStatus, Stop,
};
use crate::state::AppState;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBookingRequest {
    pub user_id: Uuid,
    pub vehicle_id: Uuid,
    pub driver_id: Uuid,
    pub pickup_address: String,
    pub drop_address: String,
}

/// Which bookings a listing should return: everything, or one
/// request-status bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    All,
    Request(RequestStatus),
}

impl StatusFilter {
    pub fn from_param(param: Option<&str>) -> Result<Self, AppError> {
        match param.map(str::to_lowercase).as_deref() {
            None | Some("all") => Ok(StatusFilter::All),
            Some("pending") => Ok(StatusFilter::Request(RequestStatus::Pending)),
            Some("accepted") => Ok(StatusFilter::Request(RequestStatus::Accepted)),
            Some("rejected") => Ok(StatusFilter::Request(RequestStatus::Rejected)),
            Some("completed") => Ok(StatusFilter::Request(RequestStatus::Completed)),
            Some(other) => Err(AppError::Validation(format!(
                "unknown status filter: {other}"
            ))),
        }
    }

    fn matches(self, booking: &Booking) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Request(status) => booking.request_status == status,
        }
    }
}

/// Listing projection: enough for a booking overview without exposing the
/// full record.
#[derive(Debug, Clone, Serialize)]
pub struct BookingSummary {
    pub booking_id: Uuid,
    pub vehicle_id: Uuid,
    pub driver_id: Uuid,
    pub pickup_address: String,
    pub drop_address: String,
    pub distance_km: f64,
    pub total_price: f64,
    pub request_status: RequestStatus,
    pub delivery_status: DeliveryStatus,
    pub order_status: OrderStatus,
}

impl From<&Booking> for BookingSummary {
    fn from(booking: &Booking) -> Self {
        Self {
            booking_id: booking.id,
            vehicle_id: booking.vehicle_id,
            driver_id: booking.driver_id,
            pickup_address: booking.pickup.address.clone(),
            drop_address: booking.drop.address.clone(),
            distance_km: booking.distance_km,
            total_price: booking.total_price,
            request_status: booking.request_status,
            delivery_status: booking.delivery_status,
            order_status: booking.order_status,
        }
    }
}

/// Creates a booking with the fare locked in. Every check and the geocoding
/// happen before the insert, so a failure on any step leaves no booking
/// behind.
pub fn create_booking(state: &AppState, req: CreateBookingRequest) -> Result<Booking, AppError> {
    if !state.users.contains_key(&req.user_id) {
        return Err(AppError::NotFound("user".to_string()));
    }
    if !state.drivers.contains_key(&req.driver_id) {
        return Err(AppError::NotFound("driver".to_string()));
    }
    let (vehicle_pos, fuel_type) = state
        .vehicles
        .get(&req.vehicle_id)
        .map(|vehicle| (vehicle.position, vehicle.fuel_type))
        .ok_or_else(|| AppError::NotFound("vehicle".to_string()))?;

    let pickup_point = state.geocoder.resolve(&req.pickup_address)?;
    let drop_point = state.geocoder.resolve(&req.drop_address)?;

    let quote = pricing::estimate(
        &vehicle_pos,
        &pickup_point,
        &drop_point,
        fuel_type,
        state.config.average_speed_kmh,
    );

    let now = Utc::now();
    let booking = Booking {
        id: Uuid::new_v4(),
        user_id: req.user_id,
        vehicle_id: req.vehicle_id,
        driver_id: req.driver_id,
        pickup: Stop {
            address: req.pickup_address,
            point: pickup_point,
        },
        drop: Stop {
            address: req.drop_address,
            point: drop_point,
        },
        distance_km: quote.distance_km,
        estimated_delivery_hours: quote.estimated_delivery_hours,
        base_price: quote.base_price,
        gst: quote.gst,
        platform_fee: quote.platform_fee,
        total_price: quote.total_price,
        request_status: RequestStatus::Pending,
        delivery_status: DeliveryStatus::PendingPickup,
        order_status: OrderStatus::Pending,
        created_at: now,
        updated_at: now,
    };

    state.bookings.insert(booking.id, booking.clone());
    state.metrics.bookings_created_total.inc();
    let _ = state
        .booking_events_tx
        .send(BookingEvent::from_booking(&booking));

    info!(
        booking_id = %booking.id,
        user_id = %booking.user_id,
        vehicle_id = %booking.vehicle_id,
        total_price = booking.total_price,
        "booking created"
    );

    Ok(booking)
}

/// Moves the request axis. The read-check-write runs while holding the
/// booking's map entry, so concurrent calls on the same booking serialize:
/// one observes the pre-transition state and wins, the rest fail against the
/// transition table. The availability flip on acceptance happens under the
/// same entry guard.
pub fn update_request_status(
    state: &AppState,
    booking_id: Uuid,
    new_status: RequestStatus,
) -> Result<Booking, AppError> {
    let updated = {
        let mut booking = state
            .bookings
            .get_mut(&booking_id)
            .ok_or_else(|| AppError::NotFound("booking".to_string()))?;

        let current = booking.request_status;
        if current.is_terminal() {
            record_transition(state, "request", "rejected");
            return Err(AppError::AlreadyTerminal(format!(
                "request status is {current:?}"
            )));
        }
        if !current.can_transition(new_status) {
            record_transition(state, "request", "rejected");
            return Err(AppError::InvalidRequestTransition {
                from: current,
                to: new_status,
            });
        }

        booking.request_status = new_status;
        booking.updated_at = Utc::now();

        if new_status == RequestStatus::Accepted {
            availability::mark_engaged(state, booking.vehicle_id, booking.driver_id);
        }

        booking.clone()
    };

    record_transition(state, "request", "ok");
    let _ = state
        .booking_events_tx
        .send(BookingEvent::from_booking(&updated));

    info!(booking_id = %booking_id, status = ?new_status, "request status updated");
    Ok(updated)
}

/// Moves the delivery axis. Only meaningful once the driver has accepted.
/// Reaching `Delivered` frees the pair and relocates vehicle and driver to
/// the drop point; `Canceled` frees them in place.
pub fn update_delivery_status(
    state: &AppState,
    booking_id: Uuid,
    new_status: DeliveryStatus,
) -> Result<Booking, AppError> {
    let updated = {
        let mut booking = state
            .bookings
            .get_mut(&booking_id)
            .ok_or_else(|| AppError::NotFound("booking".to_string()))?;

        if booking.request_status != RequestStatus::Accepted {
            record_transition(state, "delivery", "rejected");
            return Err(AppError::PreconditionFailed(
                "booking request has not been accepted".to_string(),
            ));
        }

        let current = booking.delivery_status;
        if current.is_terminal() {
            record_transition(state, "delivery", "rejected");
            return Err(AppError::AlreadyTerminal(format!(
                "delivery status is {current:?}"
            )));
        }
        if !current.can_transition(new_status) {
            record_transition(state, "delivery", "rejected");
            return Err(AppError::InvalidDeliveryTransition {
                from: current,
                to: new_status,
            });
        }

        booking.delivery_status = new_status;
        booking.updated_at = Utc::now();

        match new_status {
            DeliveryStatus::Delivered => availability::mark_free(
                state,
                booking.vehicle_id,
                booking.driver_id,
                Some(booking.drop.point),
            ),
            DeliveryStatus::Canceled => {
                availability::mark_free(state, booking.vehicle_id, booking.driver_id, None)
            }
            _ => {}
        }

        booking.clone()
    };

    record_transition(state, "delivery", "ok");
    let _ = state
        .booking_events_tx
        .send(BookingEvent::from_booking(&updated));

    info!(booking_id = %booking_id, status = ?new_status, "delivery status updated");
    Ok(updated)
}

/// Moves the order axis: the user confirms receipt, allowed only after the
/// request was accepted and the shipment delivered.
pub fn update_order_status(
    state: &AppState,
    booking_id: Uuid,
    new_status: OrderStatus,
) -> Result<Booking, AppError> {
    let updated = {
        let mut booking = state
            .bookings
            .get_mut(&booking_id)
            .ok_or_else(|| AppError::NotFound("booking".to_string()))?;

        if new_status != OrderStatus::Received {
            record_transition(state, "order", "rejected");
            return Err(AppError::Validation(
                "order status can only move to Received".to_string(),
            ));
        }
        if booking.order_status == OrderStatus::Received {
            record_transition(state, "order", "rejected");
            return Err(AppError::AlreadyTerminal(
                "order already marked received".to_string(),
            ));
        }
        if booking.request_status != RequestStatus::Accepted
            || booking.delivery_status != DeliveryStatus::Delivered
        {
            record_transition(state, "order", "rejected");
            return Err(AppError::PreconditionFailed(
                "order can be received only after an accepted booking is delivered".to_string(),
            ));
        }

        booking.order_status = new_status;
        booking.updated_at = Utc::now();
        booking.clone()
    };

    record_transition(state, "order", "ok");
    let _ = state
        .booking_events_tx
        .send(BookingEvent::from_booking(&updated));

    info!(booking_id = %booking_id, "order marked received");
    Ok(updated)
}

/// Bookings owned by a user. A missing user is `NotFound`; a user with no
/// bookings gets an empty list.
pub fn list_for_user(
    state: &AppState,
    user_id: Uuid,
    filter: StatusFilter,
) -> Result<Vec<BookingSummary>, AppError> {
    if !state.users.contains_key(&user_id) {
        return Err(AppError::NotFound("user".to_string()));
    }
    Ok(list_where(state, filter, |booking| booking.user_id == user_id))
}

pub fn list_for_driver(
    state: &AppState,
    driver_id: Uuid,
    filter: StatusFilter,
) -> Result<Vec<BookingSummary>, AppError> {
    if !state.drivers.contains_key(&driver_id) {
        return Err(AppError::NotFound("driver".to_string()));
    }
    Ok(list_where(state, filter, |booking| {
        booking.driver_id == driver_id
    }))
}

fn list_where(
    state: &AppState,
    filter: StatusFilter,
    owner: impl Fn(&Booking) -> bool,
) -> Vec<BookingSummary> {
    let mut entries: Vec<(chrono::DateTime<Utc>, BookingSummary)> = state
        .bookings
        .iter()
        .filter(|entry| owner(entry.value()) && filter.matches(entry.value()))
        .map(|entry| (entry.value().created_at, BookingSummary::from(entry.value())))
        .collect();

    // Newest first.
    entries.sort_by(|a, b| b.0.cmp(&a.0));
    entries.into_iter().map(|(_, summary)| summary).collect()
}

fn record_transition(state: &AppState, axis: &str, outcome: &str) {
    state
        .metrics
        .booking_transitions_total
        .with_label_values(&[axis, outcome])
        .inc();
}
