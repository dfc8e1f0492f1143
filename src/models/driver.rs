use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::GeoPoint;
use crate::models::vehicle::Availability;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Driver {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub mobile: String,
    pub regions: Vec<String>,
    pub position: GeoPoint,
    pub availability: Availability,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Contact fields (email, mobile) are uniqueness keys and stay immutable
/// after onboarding, so the patch surface omits them.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct DriverPatch {
    pub name: Option<String>,
    pub regions: Option<Vec<String>>,
    pub position: Option<GeoPoint>,
}

impl Driver {
    pub fn apply_patch(&mut self, patch: DriverPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(regions) = patch.regions {
            self.regions = regions;
        }
        if let Some(position) = patch.position {
            self.position = position;
        }
        self.updated_at = Utc::now();
    }
}
