use std::time::Instant;

use futures::StreamExt;
use futures::stream;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::engine::pricing::{self, PriceQuote, round2};
use crate::error::AppError;
use crate::geo::{GeoPoint, haversine_km};
use crate::models::vehicle::{Availability, FuelType, Vehicle};
use crate::state::AppState;

#[derive(Debug, Clone, Deserialize)]
pub struct VehicleSearchQuery {
    pub capacity_kg: f64,
    pub fuel_type: Option<FuelType>,
    pub pickup: GeoPoint,
    pub drop: GeoPoint,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VehicleMatch {
    pub vehicle_id: Uuid,
    pub registration_number: String,
    pub model_name: String,
    pub capacity_kg: f64,
    pub fuel_type: FuelType,
    pub position: GeoPoint,
    pub distance_from_pickup_km: f64,
    #[serde(flatten)]
    pub quote: PriceQuote,
}

#[derive(Debug, Clone, Serialize)]
pub struct DriverMatch {
    pub driver_id: Uuid,
    pub name: String,
    pub distance_km: f64,
}

/// Finds free vehicles that can carry the load, priced against the query's
/// pickup and drop, cheapest first. An empty result is a valid outcome, not
/// an error.
///
/// Per-candidate quoting fans out with bounded concurrency; candidates are
/// snapshots, so an aborted request leaves no shared state half-written.
pub async fn search_vehicles(
    state: &AppState,
    query: VehicleSearchQuery,
) -> Result<Vec<VehicleMatch>, AppError> {
    validate_query(&query)?;
    let start = Instant::now();

    let candidates: Vec<Vehicle> = state
        .vehicles
        .iter()
        .filter_map(|entry| {
            let vehicle = entry.value();
            let eligible = vehicle.availability == Availability::Free
                && vehicle.capacity_kg >= query.capacity_kg
                && query.fuel_type.is_none_or(|fuel| vehicle.fuel_type == fuel);

            if eligible { Some(vehicle.clone()) } else { None }
        })
        .collect();

    let pickup = query.pickup;
    let drop = query.drop;
    let average_speed_kmh = state.config.average_speed_kmh;
    let max_pickup_distance_km = state.config.max_pickup_distance_km;

    let mut matches: Vec<VehicleMatch> = stream::iter(candidates)
        .map(|vehicle| async move {
            let distance_from_pickup_km = haversine_km(&vehicle.position, &pickup);
            let quote = pricing::estimate(
                &vehicle.position,
                &pickup,
                &drop,
                vehicle.fuel_type,
                average_speed_kmh,
            );

            VehicleMatch {
                vehicle_id: vehicle.id,
                registration_number: vehicle.registration_number,
                model_name: vehicle.model_name,
                capacity_kg: vehicle.capacity_kg,
                fuel_type: vehicle.fuel_type,
                position: vehicle.position,
                distance_from_pickup_km: round2(distance_from_pickup_km),
                quote,
            }
        })
        .buffer_unordered(state.config.search_concurrency.max(1))
        .collect()
        .await;

    matches.retain(|candidate| candidate.distance_from_pickup_km <= max_pickup_distance_km);
    matches.sort_by(|a, b| a.quote.total_price.total_cmp(&b.quote.total_price));

    let limit = query.limit.unwrap_or(state.config.search_limit);
    matches.truncate(limit);

    state
        .metrics
        .search_latency_seconds
        .with_label_values(&[if matches.is_empty() { "empty" } else { "matched" }])
        .observe(start.elapsed().as_secs_f64());

    info!(
        candidates = matches.len(),
        capacity_kg = query.capacity_kg,
        "vehicle search completed"
    );

    Ok(matches)
}

/// Returns the single closest free driver to the vehicle's position, ties
/// broken by the lowest driver id for determinism.
pub fn find_nearest_driver(state: &AppState, vehicle_id: Uuid) -> Result<DriverMatch, AppError> {
    let vehicle_pos = state
        .vehicles
        .get(&vehicle_id)
        .map(|vehicle| vehicle.position)
        .ok_or_else(|| AppError::NotFound("vehicle".to_string()))?;

    let nearest = state
        .drivers
        .iter()
        .filter(|entry| entry.value().availability == Availability::Free)
        .map(|entry| {
            let driver = entry.value();
            (
                driver.id,
                driver.name.clone(),
                haversine_km(&driver.position, &vehicle_pos),
            )
        })
        .min_by(|a, b| a.2.total_cmp(&b.2).then_with(|| a.0.cmp(&b.0)));

    match nearest {
        Some((driver_id, name, distance)) => Ok(DriverMatch {
            driver_id,
            name,
            distance_km: round2(distance),
        }),
        None => Err(AppError::NoMatchFound),
    }
}

fn validate_query(query: &VehicleSearchQuery) -> Result<(), AppError> {
    if query.capacity_kg <= 0.0 {
        return Err(AppError::Validation(
            "capacity_kg must be greater than zero".to_string(),
        ));
    }
    if !query.pickup.in_range() {
        return Err(AppError::Validation(
            "pickup coordinates out of range".to_string(),
        ));
    }
    if !query.drop.in_range() {
        return Err(AppError::Validation(
            "drop coordinates out of range".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::{VehicleSearchQuery, find_nearest_driver, search_vehicles};
    use crate::config::Config;
    use crate::error::AppError;
    use crate::geo::GeoPoint;
    use crate::models::driver::Driver;
    use crate::models::vehicle::{Availability, FuelType, Vehicle};
    use crate::state::AppState;

    const PICKUP: GeoPoint = GeoPoint {
        lat: 12.9716,
        lng: 77.5946,
    };
    const DROP: GeoPoint = GeoPoint {
        lat: 12.9352,
        lng: 77.6245,
    };

    fn vehicle(seed: u128, capacity_kg: f64, fuel: FuelType, pos: GeoPoint) -> Vehicle {
        Vehicle {
            id: Uuid::from_u128(seed),
            model_name: "Eicher Pro".to_string(),
            registration_number: format!("KA01-{seed}"),
            capacity_kg,
            fuel_type: fuel,
            position: pos,
            availability: Availability::Free,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn driver(seed: u128, pos: GeoPoint) -> Driver {
        Driver {
            id: Uuid::from_u128(seed),
            name: format!("driver-{seed}"),
            email: format!("driver{seed}@example.com"),
            mobile: format!("90000{seed:05}"),
            regions: vec![],
            position: pos,
            availability: Availability::Free,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn query(capacity_kg: f64) -> VehicleSearchQuery {
        VehicleSearchQuery {
            capacity_kg,
            fuel_type: None,
            pickup: PICKUP,
            drop: DROP,
            limit: None,
        }
    }

    #[tokio::test]
    async fn filters_capacity_and_availability() {
        let state = AppState::new(Config::default());

        let near = GeoPoint {
            lat: 12.97,
            lng: 77.60,
        };
        state
            .vehicles
            .insert(Uuid::from_u128(1), vehicle(1, 500.0, FuelType::Diesel, near));
        state
            .vehicles
            .insert(Uuid::from_u128(2), vehicle(2, 100.0, FuelType::Diesel, near));

        let mut engaged = vehicle(3, 900.0, FuelType::Diesel, near);
        engaged.availability = Availability::Engaged;
        state.vehicles.insert(Uuid::from_u128(3), engaged);

        let matches = search_vehicles(&state, query(300.0)).await.unwrap();

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].vehicle_id, Uuid::from_u128(1));
        assert!(matches[0].capacity_kg >= 300.0);
    }

    #[tokio::test]
    async fn results_are_sorted_by_total_price() {
        let state = AppState::new(Config::default());

        let near = GeoPoint {
            lat: 12.97,
            lng: 77.60,
        };
        let far = GeoPoint {
            lat: 13.10,
            lng: 77.80,
        };
        // Same fuel rate, so the farther vehicle quotes a higher price.
        state
            .vehicles
            .insert(Uuid::from_u128(1), vehicle(1, 500.0, FuelType::Diesel, far));
        state
            .vehicles
            .insert(Uuid::from_u128(2), vehicle(2, 500.0, FuelType::Diesel, near));

        let matches = search_vehicles(&state, query(300.0)).await.unwrap();

        assert_eq!(matches.len(), 2);
        assert!(matches[0].quote.total_price <= matches[1].quote.total_price);
        assert_eq!(matches[0].vehicle_id, Uuid::from_u128(2));
    }

    #[tokio::test]
    async fn fuel_filter_is_optional_but_honored() {
        let state = AppState::new(Config::default());
        let near = GeoPoint {
            lat: 12.97,
            lng: 77.60,
        };
        state
            .vehicles
            .insert(Uuid::from_u128(1), vehicle(1, 500.0, FuelType::Diesel, near));
        state.vehicles.insert(
            Uuid::from_u128(2),
            vehicle(2, 500.0, FuelType::Electric, near),
        );

        let mut electric_only = query(300.0);
        electric_only.fuel_type = Some(FuelType::Electric);

        let matches = search_vehicles(&state, electric_only).await.unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].fuel_type, FuelType::Electric);
    }

    #[tokio::test]
    async fn distant_vehicles_match_by_default() {
        // No pickup radius is configured out of the box, so a vehicle in
        // another city is still offered (at a long-haul price).
        let state = AppState::new(Config::default());
        let mumbai = GeoPoint {
            lat: 19.0760,
            lng: 72.8777,
        };
        state
            .vehicles
            .insert(Uuid::from_u128(1), vehicle(1, 500.0, FuelType::Diesel, mumbai));

        let matches = search_vehicles(&state, query(300.0)).await.unwrap();
        assert_eq!(matches.len(), 1);
        assert!(matches[0].distance_from_pickup_km > 500.0);
    }

    #[tokio::test]
    async fn configured_pickup_radius_drops_far_vehicles() {
        let config = Config {
            max_pickup_distance_km: 50.0,
            ..Config::default()
        };
        let state = AppState::new(config);

        let near = GeoPoint {
            lat: 12.97,
            lng: 77.60,
        };
        let mumbai = GeoPoint {
            lat: 19.0760,
            lng: 72.8777,
        };
        state
            .vehicles
            .insert(Uuid::from_u128(1), vehicle(1, 500.0, FuelType::Diesel, mumbai));
        state
            .vehicles
            .insert(Uuid::from_u128(2), vehicle(2, 500.0, FuelType::Diesel, near));

        let matches = search_vehicles(&state, query(300.0)).await.unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].vehicle_id, Uuid::from_u128(2));
    }

    #[tokio::test]
    async fn zero_capacity_query_is_rejected() {
        let state = AppState::new(Config::default());
        let result = search_vehicles(&state, query(0.0)).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn out_of_range_coordinates_are_rejected() {
        let state = AppState::new(Config::default());
        let mut bad = query(300.0);
        bad.pickup = GeoPoint {
            lat: 95.0,
            lng: 0.0,
        };
        let result = search_vehicles(&state, bad).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn nearest_driver_picks_the_closest() {
        let state = AppState::new(Config::default());
        let vehicle_pos = GeoPoint {
            lat: 12.97,
            lng: 77.60,
        };
        let vehicle_id = Uuid::from_u128(10);
        state
            .vehicles
            .insert(vehicle_id, vehicle(10, 500.0, FuelType::Diesel, vehicle_pos));

        state.drivers.insert(
            Uuid::from_u128(1),
            driver(
                1,
                GeoPoint {
                    lat: 13.20,
                    lng: 77.90,
                },
            ),
        );
        state.drivers.insert(
            Uuid::from_u128(2),
            driver(
                2,
                GeoPoint {
                    lat: 12.98,
                    lng: 77.61,
                },
            ),
        );

        let nearest = find_nearest_driver(&state, vehicle_id).unwrap();
        assert_eq!(nearest.driver_id, Uuid::from_u128(2));
    }

    #[test]
    fn nearest_driver_ties_break_on_lowest_id() {
        let state = AppState::new(Config::default());
        let pos = GeoPoint {
            lat: 12.97,
            lng: 77.60,
        };
        let vehicle_id = Uuid::from_u128(10);
        state
            .vehicles
            .insert(vehicle_id, vehicle(10, 500.0, FuelType::Diesel, pos));

        state.drivers.insert(Uuid::from_u128(7), driver(7, pos));
        state.drivers.insert(Uuid::from_u128(3), driver(3, pos));

        let nearest = find_nearest_driver(&state, vehicle_id).unwrap();
        assert_eq!(nearest.driver_id, Uuid::from_u128(3));
    }

    #[test]
    fn nearest_driver_without_candidates_is_no_match() {
        let state = AppState::new(Config::default());
        let pos = GeoPoint {
            lat: 12.97,
            lng: 77.60,
        };
        let vehicle_id = Uuid::from_u128(10);
        state
            .vehicles
            .insert(vehicle_id, vehicle(10, 500.0, FuelType::Diesel, pos));

        let mut busy = driver(1, pos);
        busy.availability = Availability::Engaged;
        state.drivers.insert(Uuid::from_u128(1), busy);

        let result = find_nearest_driver(&state, vehicle_id);
        assert!(matches!(result, Err(AppError::NoMatchFound)));
    }

    #[test]
    fn nearest_driver_for_unknown_vehicle_is_not_found() {
        let state = AppState::new(Config::default());
        let result = find_nearest_driver(&state, Uuid::new_v4());
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
