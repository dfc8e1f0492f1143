use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::GeoPoint;

/// Whether the driver has taken on the booking.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
    Completed,
}

impl RequestStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, RequestStatus::Rejected | RequestStatus::Completed)
    }

    /// One-way transition table: Pending -> {Accepted, Rejected},
    /// Accepted -> Completed.
    pub fn can_transition(self, next: RequestStatus) -> bool {
        matches!(
            (self, next),
            (RequestStatus::Pending, RequestStatus::Accepted)
                | (RequestStatus::Pending, RequestStatus::Rejected)
                | (RequestStatus::Accepted, RequestStatus::Completed)
        )
    }
}

/// Physical progress of the shipment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DeliveryStatus {
    PendingPickup,
    InTransit,
    OutForDelivery,
    Delivered,
    Canceled,
}

impl DeliveryStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, DeliveryStatus::Delivered | DeliveryStatus::Canceled)
    }

    /// Forward chain PendingPickup -> InTransit -> OutForDelivery -> Delivered,
    /// with Canceled reachable from any non-terminal state.
    pub fn can_transition(self, next: DeliveryStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        if next == DeliveryStatus::Canceled {
            return true;
        }
        matches!(
            (self, next),
            (DeliveryStatus::PendingPickup, DeliveryStatus::InTransit)
                | (DeliveryStatus::InTransit, DeliveryStatus::OutForDelivery)
                | (DeliveryStatus::OutForDelivery, DeliveryStatus::Delivered)
        )
    }
}

/// User-facing confirmation of receipt, gated on delivery completion.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    Received,
}

/// A geocoded stop on the route: the free-text address the user supplied and
/// the coordinates it resolved to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stop {
    pub address: String,
    pub point: GeoPoint,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub vehicle_id: Uuid,
    pub driver_id: Uuid,
    pub pickup: Stop,
    pub drop: Stop,
    // Pricing is locked at creation and never recomputed on a transition.
    pub distance_km: f64,
    pub estimated_delivery_hours: f64,
    pub base_price: f64,
    pub gst: f64,
    pub platform_fee: f64,
    pub total_price: f64,
    pub request_status: RequestStatus,
    pub delivery_status: DeliveryStatus,
    pub order_status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Lifecycle change notification, broadcast to WebSocket subscribers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingEvent {
    pub booking_id: Uuid,
    pub request_status: RequestStatus,
    pub delivery_status: DeliveryStatus,
    pub order_status: OrderStatus,
    pub occurred_at: DateTime<Utc>,
}

impl BookingEvent {
    pub fn from_booking(booking: &Booking) -> Self {
        Self {
            booking_id: booking.id,
            request_status: booking.request_status,
            delivery_status: booking.delivery_status,
            order_status: booking.order_status,
            occurred_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DeliveryStatus, RequestStatus};

    #[test]
    fn request_status_allows_only_forward_moves() {
        assert!(RequestStatus::Pending.can_transition(RequestStatus::Accepted));
        assert!(RequestStatus::Pending.can_transition(RequestStatus::Rejected));
        assert!(RequestStatus::Accepted.can_transition(RequestStatus::Completed));

        assert!(!RequestStatus::Accepted.can_transition(RequestStatus::Pending));
        assert!(!RequestStatus::Pending.can_transition(RequestStatus::Completed));
        assert!(!RequestStatus::Rejected.can_transition(RequestStatus::Accepted));
        assert!(!RequestStatus::Completed.can_transition(RequestStatus::Pending));
    }

    #[test]
    fn terminal_request_statuses() {
        assert!(RequestStatus::Rejected.is_terminal());
        assert!(RequestStatus::Completed.is_terminal());
        assert!(!RequestStatus::Pending.is_terminal());
        assert!(!RequestStatus::Accepted.is_terminal());
    }

    #[test]
    fn delivery_status_follows_the_chain() {
        assert!(DeliveryStatus::PendingPickup.can_transition(DeliveryStatus::InTransit));
        assert!(DeliveryStatus::InTransit.can_transition(DeliveryStatus::OutForDelivery));
        assert!(DeliveryStatus::OutForDelivery.can_transition(DeliveryStatus::Delivered));

        assert!(!DeliveryStatus::PendingPickup.can_transition(DeliveryStatus::Delivered));
        assert!(!DeliveryStatus::InTransit.can_transition(DeliveryStatus::PendingPickup));
    }

    #[test]
    fn cancel_reachable_from_any_non_terminal_delivery_state() {
        assert!(DeliveryStatus::PendingPickup.can_transition(DeliveryStatus::Canceled));
        assert!(DeliveryStatus::InTransit.can_transition(DeliveryStatus::Canceled));
        assert!(DeliveryStatus::OutForDelivery.can_transition(DeliveryStatus::Canceled));

        assert!(!DeliveryStatus::Delivered.can_transition(DeliveryStatus::Canceled));
        assert!(!DeliveryStatus::Canceled.can_transition(DeliveryStatus::Canceled));
    }
}
