//! Great-circle distance between coordinates.
//!
//! Every distance in this crate is in kilometers. Directions providers report
//! meters; convert with [`km_to_meters`] / [`meters_to_km`] at that boundary.

use crate::model::GeoPoint;

/// Average driving speed assumption for time estimation.
const DEFAULT_SPEED_KMH: f64 = 40.0;

/// Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance between two points in kilometers.
///
/// NaN coordinates yield NaN.
pub fn distance(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1_rad = a.latitude.to_radians();
    let lat2_rad = b.latitude.to_radians();
    let delta_lat = (b.latitude - a.latitude).to_radians();
    let delta_lng = (b.longitude - a.longitude).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().asin();

    EARTH_RADIUS_KM * c
}

pub fn km_to_meters(km: f64) -> f64 {
    km * 1000.0
}

pub fn meters_to_km(meters: f64) -> f64 {
    meters / 1000.0
}

/// Straight-line travel time estimate.
///
/// Ignores roads entirely, so it underestimates in dense street grids.
#[derive(Debug, Clone, Copy)]
pub struct HaversineEstimator {
    /// Assumed average driving speed in km/h.
    pub speed_kmh: f64,
}

impl Default for HaversineEstimator {
    fn default() -> Self {
        Self {
            speed_kmh: DEFAULT_SPEED_KMH,
        }
    }
}

impl HaversineEstimator {
    pub fn new(speed_kmh: f64) -> Self {
        Self { speed_kmh }
    }

    /// Convert distance in km to travel time in seconds.
    pub fn km_to_seconds(&self, km: f64) -> u32 {
        if !(km.is_finite() && self.speed_kmh > 0.0) {
            return 0;
        }
        let hours = km / self.speed_kmh;
        (hours * 3600.0).round() as u32
    }
}
