use std::collections::HashMap;
use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::routing::{get, post, put};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::{Role, authorize};
use crate::engine::lifecycle::{self, BookingSummary, CreateBookingRequest, StatusFilter};
use crate::error::AppError;
use crate::models::booking::{Booking, DeliveryStatus, OrderStatus, RequestStatus};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/bookings", post(create_booking))
        .route("/bookings/:id/request-status", put(update_request_status))
        .route("/bookings/:id/delivery-status", put(update_delivery_status))
        .route("/bookings/:id/order-status", put(update_order_status))
        .route("/users/:id/bookings", get(list_for_user))
        .route("/drivers/:id/bookings", get(list_for_driver))
}

async fn create_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<CreateBookingRequest>,
) -> Result<Json<Booking>, AppError> {
    authorize(
        &headers,
        Role::User,
        payload.user_id,
        &state.config.auth_secret,
    )?;

    let booking = lifecycle::create_booking(&state, payload)?;
    Ok(Json(booking))
}

#[derive(Deserialize)]
pub struct UpdateRequestStatusBody {
    pub status: RequestStatus,
}

#[derive(Deserialize)]
pub struct UpdateDeliveryStatusBody {
    pub status: DeliveryStatus,
}

#[derive(Deserialize)]
pub struct UpdateOrderStatusBody {
    pub status: OrderStatus,
}

async fn update_request_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(payload): Json<UpdateRequestStatusBody>,
) -> Result<Json<Booking>, AppError> {
    let driver_id = booking_driver(&state, id)?;
    authorize(&headers, Role::Driver, driver_id, &state.config.auth_secret)?;

    let booking = lifecycle::update_request_status(&state, id, payload.status)?;
    Ok(Json(booking))
}

async fn update_delivery_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(payload): Json<UpdateDeliveryStatusBody>,
) -> Result<Json<Booking>, AppError> {
    let driver_id = booking_driver(&state, id)?;
    authorize(&headers, Role::Driver, driver_id, &state.config.auth_secret)?;

    let booking = lifecycle::update_delivery_status(&state, id, payload.status)?;
    Ok(Json(booking))
}

async fn update_order_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(payload): Json<UpdateOrderStatusBody>,
) -> Result<Json<Booking>, AppError> {
    let user_id = state
        .bookings
        .get(&id)
        .map(|booking| booking.user_id)
        .ok_or_else(|| AppError::NotFound("booking".to_string()))?;
    authorize(&headers, Role::User, user_id, &state.config.auth_secret)?;

    let booking = lifecycle::update_order_status(&state, id, payload.status)?;
    Ok(Json(booking))
}

async fn list_for_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<Json<Vec<BookingSummary>>, AppError> {
    authorize(&headers, Role::User, id, &state.config.auth_secret)?;

    let filter = StatusFilter::from_param(params.get("status").map(String::as_str))?;
    let bookings = lifecycle::list_for_user(&state, id, filter)?;
    Ok(Json(bookings))
}

async fn list_for_driver(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<Json<Vec<BookingSummary>>, AppError> {
    authorize(&headers, Role::Driver, id, &state.config.auth_secret)?;

    let filter = StatusFilter::from_param(params.get("status").map(String::as_str))?;
    let bookings = lifecycle::list_for_driver(&state, id, filter)?;
    Ok(Json(bookings))
}

fn booking_driver(state: &AppState, booking_id: Uuid) -> Result<Uuid, AppError> {
    state
        .bookings
        .get(&booking_id)
        .map(|booking| booking.driver_id)
        .ok_or_else(|| AppError::NotFound("booking".to_string()))
}
