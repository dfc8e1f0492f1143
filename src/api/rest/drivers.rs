use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::routing::{patch, post};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::{Role, authorize, authorize_role};
use crate::error::AppError;
use crate::geo::GeoPoint;
use crate::models::driver::{Driver, DriverPatch};
use crate::models::vehicle::Availability;
use crate::state::{AppState, claim_unique};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/drivers", post(create_driver).get(list_drivers))
        .route("/drivers/:id", patch(patch_driver))
}

#[derive(Deserialize)]
pub struct CreateDriverRequest {
    pub name: String,
    pub email: String,
    pub mobile: String,
    pub regions: Option<Vec<String>>,
    pub position: GeoPoint,
}

async fn create_driver(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<CreateDriverRequest>,
) -> Result<Json<Driver>, AppError> {
    authorize_role(&headers, Role::Admin, &state.config.auth_secret)?;

    if payload.name.trim().is_empty() {
        return Err(AppError::Validation("name cannot be empty".to_string()));
    }
    if !payload.position.in_range() {
        return Err(AppError::Validation(
            "driver coordinates out of range".to_string(),
        ));
    }

    let id = Uuid::new_v4();
    if !claim_unique(&state.driver_contacts, &payload.email, id) {
        return Err(AppError::Conflict(
            "driver with this email or mobile already exists".to_string(),
        ));
    }
    if !claim_unique(&state.driver_contacts, &payload.mobile, id) {
        // Release the email claim so another onboarding can reuse it.
        state.driver_contacts.remove(&payload.email);
        return Err(AppError::Conflict(
            "driver with this email or mobile already exists".to_string(),
        ));
    }

    let now = Utc::now();
    let driver = Driver {
        id,
        name: payload.name,
        email: payload.email,
        mobile: payload.mobile,
        regions: payload.regions.unwrap_or_default(),
        position: payload.position,
        availability: Availability::Free,
        created_at: now,
        updated_at: now,
    };

    state.drivers.insert(driver.id, driver.clone());
    Ok(Json(driver))
}

async fn list_drivers(State(state): State<Arc<AppState>>) -> Json<Vec<Driver>> {
    let drivers = state
        .drivers
        .iter()
        .map(|entry| entry.value().clone())
        .collect();
    Json(drivers)
}

async fn patch_driver(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(payload): Json<DriverPatch>,
) -> Result<Json<Driver>, AppError> {
    authorize(&headers, Role::Driver, id, &state.config.auth_secret)?;

    if let Some(position) = &payload.position {
        if !position.in_range() {
            return Err(AppError::Validation(
                "driver coordinates out of range".to_string(),
            ));
        }
    }

    let mut driver = state
        .drivers
        .get_mut(&id)
        .ok_or_else(|| AppError::NotFound("driver".to_string()))?;

    driver.apply_patch(payload);
    Ok(Json(driver.clone()))
}
