use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::routing::{get, patch, post};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::{Role, authorize_role};
use crate::engine::matching::{self, DriverMatch, VehicleMatch, VehicleSearchQuery};
use crate::error::AppError;
use crate::geo::GeoPoint;
use crate::models::vehicle::{Availability, FuelType, Vehicle, VehiclePatch};
use crate::state::{AppState, claim_unique};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/vehicles", post(create_vehicle).get(list_vehicles))
        .route("/vehicles/:id", patch(patch_vehicle))
        .route("/vehicles/search", post(search_vehicles))
        .route("/vehicles/:id/nearest-driver", get(nearest_driver))
}

#[derive(Deserialize)]
pub struct CreateVehicleRequest {
    pub model_name: String,
    pub registration_number: String,
    pub capacity_kg: f64,
    pub fuel_type: FuelType,
    pub position: GeoPoint,
}

async fn create_vehicle(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<CreateVehicleRequest>,
) -> Result<Json<Vehicle>, AppError> {
    authorize_role(&headers, Role::Admin, &state.config.auth_secret)?;

    if payload.capacity_kg <= 0.0 {
        return Err(AppError::Validation(
            "capacity_kg must be greater than zero".to_string(),
        ));
    }
    if !payload.position.in_range() {
        return Err(AppError::Validation(
            "vehicle coordinates out of range".to_string(),
        ));
    }

    let id = Uuid::new_v4();
    if !claim_unique(&state.vehicle_registrations, &payload.registration_number, id) {
        return Err(AppError::Conflict(
            "vehicle with this registration number already exists".to_string(),
        ));
    }

    let now = Utc::now();
    let vehicle = Vehicle {
        id,
        model_name: payload.model_name,
        registration_number: payload.registration_number,
        capacity_kg: payload.capacity_kg,
        fuel_type: payload.fuel_type,
        position: payload.position,
        availability: Availability::Free,
        created_at: now,
        updated_at: now,
    };

    state.vehicles.insert(vehicle.id, vehicle.clone());
    Ok(Json(vehicle))
}

async fn list_vehicles(State(state): State<Arc<AppState>>) -> Json<Vec<Vehicle>> {
    let vehicles = state
        .vehicles
        .iter()
        .map(|entry| entry.value().clone())
        .collect();
    Json(vehicles)
}

async fn patch_vehicle(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(payload): Json<VehiclePatch>,
) -> Result<Json<Vehicle>, AppError> {
    authorize_role(&headers, Role::Admin, &state.config.auth_secret)?;

    if let Some(capacity_kg) = payload.capacity_kg {
        if capacity_kg <= 0.0 {
            return Err(AppError::Validation(
                "capacity_kg must be greater than zero".to_string(),
            ));
        }
    }
    if let Some(position) = &payload.position {
        if !position.in_range() {
            return Err(AppError::Validation(
                "vehicle coordinates out of range".to_string(),
            ));
        }
    }

    let mut vehicle = state
        .vehicles
        .get_mut(&id)
        .ok_or_else(|| AppError::NotFound("vehicle".to_string()))?;

    vehicle.apply_patch(payload);
    Ok(Json(vehicle.clone()))
}

async fn search_vehicles(
    State(state): State<Arc<AppState>>,
    Json(query): Json<VehicleSearchQuery>,
) -> Result<Json<Vec<VehicleMatch>>, AppError> {
    let matches = matching::search_vehicles(&state, query).await?;
    Ok(Json(matches))
}

async fn nearest_driver(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<DriverMatch>, AppError> {
    let nearest = matching::find_nearest_driver(&state, id)?;
    Ok(Json(nearest))
}
