use serde::{Deserialize, Serialize};

use crate::geo::{GeoPoint, haversine_km};
use crate::models::vehicle::FuelType;

const GST_RATE: f64 = 0.28;
const PLATFORM_FEE_RATE: f64 = 0.15;

/// Fare locked in at booking time. All figures rounded to two decimals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceQuote {
    pub distance_km: f64,
    pub estimated_delivery_hours: f64,
    pub base_price: f64,
    pub gst: f64,
    pub platform_fee: f64,
    pub total_price: f64,
}

/// Prices a trip: the vehicle deadheads to the pickup, then hauls to the
/// drop. Base fare is the combined distance times the fuel-type rate; GST and
/// the platform fee are percentages of the base.
pub fn estimate(
    vehicle_pos: &GeoPoint,
    pickup: &GeoPoint,
    drop: &GeoPoint,
    fuel_type: FuelType,
    average_speed_kmh: f64,
) -> PriceQuote {
    let to_pickup = haversine_km(vehicle_pos, pickup);
    let to_drop = haversine_km(pickup, drop);
    let total_distance = to_pickup + to_drop;

    let base_price = total_distance * fuel_type.rate_per_km();
    let gst = base_price * GST_RATE;
    let platform_fee = base_price * PLATFORM_FEE_RATE;
    let total_price = base_price + gst + platform_fee;

    PriceQuote {
        distance_km: round2(total_distance),
        estimated_delivery_hours: round2(total_distance / average_speed_kmh),
        base_price: round2(base_price),
        gst: round2(gst),
        platform_fee: round2(platform_fee),
        total_price: round2(total_price),
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
