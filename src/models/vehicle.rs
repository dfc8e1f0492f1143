use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::GeoPoint;

/// Whether a vehicle or driver can be offered to new bookings.
///
/// Replaces the two independent `is_available`/`active_status` booleans the
/// platform previously carried; the boolean pair allowed combinations with no
/// meaning ("available and en route").
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Availability {
    Free,
    Engaged,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum FuelType {
    Petrol,
    Diesel,
    Electric,
    #[serde(other)]
    Other,
}

impl FuelType {
    /// Fare rate per kilometre. Unrecognized fuel types deserialize to
    /// `Other` and price at the fallback rate rather than failing.
    pub fn rate_per_km(self) -> f64 {
        match self {
            FuelType::Petrol => 100.0,
            FuelType::Diesel => 90.0,
            FuelType::Electric => 60.0,
            FuelType::Other => 10.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: Uuid,
    pub model_name: String,
    pub registration_number: String,
    pub capacity_kg: f64,
    pub fuel_type: FuelType,
    pub position: GeoPoint,
    pub availability: Availability,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update for a vehicle. Only the fields listed here can be patched;
/// each is applied explicitly, field by field.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct VehiclePatch {
    pub model_name: Option<String>,
    pub capacity_kg: Option<f64>,
    pub fuel_type: Option<FuelType>,
    pub position: Option<GeoPoint>,
}

impl Vehicle {
    pub fn apply_patch(&mut self, patch: VehiclePatch) {
        if let Some(model_name) = patch.model_name {
            self.model_name = model_name;
        }
        if let Some(capacity_kg) = patch.capacity_kg {
            self.capacity_kg = capacity_kg;
        }
        if let Some(fuel_type) = patch.fuel_type {
            self.fuel_type = fuel_type;
        }
        if let Some(position) = patch.position {
            self.position = position;
        }
        self.updated_at = Utc::now();
    }
}
