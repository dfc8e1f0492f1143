use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn in_range(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lng)
    }
}

const EARTH_RADIUS_KM: f64 = 6_371.0;

pub fn haversine_km(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lng = (b.lng - a.lng).to_radians();

    let sin_lat = (delta_lat / 2.0).sin();
    let sin_lng = (delta_lng / 2.0).sin();

    let haversine = sin_lat * sin_lat + lat1.cos() * lat2.cos() * sin_lng * sin_lng;
    let central_angle = 2.0 * haversine.sqrt().asin();

    EARTH_RADIUS_KM * central_angle
}

#[derive(Debug, Error)]
pub enum GeocodeError {
    /// The address is well-formed but the resolver knows no coordinates for
    /// it. Callers must not fall back to stale or partial coordinates.
    #[error("could not resolve address: {0}")]
    Unresolved(String),

    /// The resolver backend itself failed (network, quota, outage).
    #[error("geocoding backend failed: {0}")]
    Backend(String),
}

/// Resolves free-text addresses to coordinates. The in-memory table below is
/// the default; a networked resolver slots in behind the same trait.
pub trait Geocoder: Send + Sync {
    fn resolve(&self, address: &str) -> Result<GeoPoint, GeocodeError>;
}

pub struct StaticGeocoder {
    table: HashMap<String, GeoPoint>,
}

impl StaticGeocoder {
    pub fn new(entries: impl IntoIterator<Item = (String, GeoPoint)>) -> Self {
        let table = entries
            .into_iter()
            .map(|(name, point)| (name.to_lowercase(), point))
            .collect();
        Self { table }
    }

    pub fn with_default_cities() -> Self {
        Self::new([
            ("Bangalore".to_string(), GeoPoint { lat: 12.9716, lng: 77.5946 }),
            ("Chennai".to_string(), GeoPoint { lat: 13.0827, lng: 80.2707 }),
            ("Mumbai".to_string(), GeoPoint { lat: 19.0760, lng: 72.8777 }),
            ("Delhi".to_string(), GeoPoint { lat: 28.7041, lng: 77.1025 }),
            ("Hyderabad".to_string(), GeoPoint { lat: 17.3850, lng: 78.4867 }),
            ("Pune".to_string(), GeoPoint { lat: 18.5204, lng: 73.8567 }),
            ("Kolkata".to_string(), GeoPoint { lat: 22.5726, lng: 88.3639 }),
        ])
    }
}

impl Geocoder for StaticGeocoder {
    fn resolve(&self, address: &str) -> Result<GeoPoint, GeocodeError> {
        self.table
            .get(&address.trim().to_lowercase())
            .copied()
            .ok_or_else(|| GeocodeError::Unresolved(address.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::{haversine_km, GeoPoint, Geocoder, StaticGeocoder};

    #[test]
    fn zero_distance_for_same_point() {
        let p = GeoPoint {
            lat: 12.9716,
            lng: 77.5946,
        };
        let distance = haversine_km(&p, &p);
        assert!(distance < 1e-9);
    }

    #[test]
    fn distance_is_symmetric() {
        let bangalore = GeoPoint {
            lat: 12.9716,
            lng: 77.5946,
        };
        let chennai = GeoPoint {
            lat: 13.0827,
            lng: 80.2707,
        };
        let forward = haversine_km(&bangalore, &chennai);
        let back = haversine_km(&chennai, &bangalore);
        assert!((forward - back).abs() < 1e-9);
    }

    #[test]
    fn bangalore_to_chennai_is_around_290_km() {
        let bangalore = GeoPoint {
            lat: 12.9716,
            lng: 77.5946,
        };
        let chennai = GeoPoint {
            lat: 13.0827,
            lng: 80.2707,
        };
        let distance = haversine_km(&bangalore, &chennai);
        assert!((distance - 290.0).abs() < 5.0);
    }

    #[test]
    fn geocoder_is_case_insensitive() {
        let geocoder = StaticGeocoder::with_default_cities();
        let point = geocoder.resolve("  mumbai ").unwrap();
        assert!((point.lat - 19.0760).abs() < 1e-9);
    }

    #[test]
    fn geocoder_rejects_unknown_address() {
        let geocoder = StaticGeocoder::with_default_cities();
        assert!(geocoder.resolve("Atlantis").is_err());
    }

    #[test]
    fn coordinate_range_check() {
        assert!(GeoPoint { lat: 0.0, lng: 0.0 }.in_range());
        assert!(!GeoPoint { lat: 91.0, lng: 0.0 }.in_range());
        assert!(!GeoPoint {
            lat: 0.0,
            lng: -181.0
        }
        .in_range());
    }
}
