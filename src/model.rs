//! Route, stop and navigation records shared by the sequencer and tracker.
//!
//! These mirror what the route backend and the directions service hand us.
//! Nothing here performs I/O.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A WGS84 coordinate in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// True for finite, in-range coordinates other than the (0, 0) placeholder
    /// the backend uses for un-geocoded addresses.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
            && !(self.latitude == 0.0 && self.longitude == 0.0)
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

impl From<(f64, f64)> for GeoPoint {
    fn from((latitude, longitude): (f64, f64)) -> Self {
        Self::new(latitude, longitude)
    }
}

impl From<GeoPoint> for (f64, f64) {
    fn from(point: GeoPoint) -> Self {
        (point.latitude, point.longitude)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopStatus {
    #[default]
    Pending,
    Completed,
    Skipped,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

/// A single delivery on a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub id: String,
    pub route_id: String,
    #[serde(default)]
    pub client_name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub sku: Option<String>,
    pub location: GeoPoint,
    /// Position in the sequence the dispatcher originally assigned.
    pub stop_order: u32,
    #[serde(default)]
    pub optimized_order: Option<u32>,
    #[serde(default)]
    pub status: StopStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Stop {
    pub fn new(id: impl Into<String>, route_id: impl Into<String>, location: GeoPoint) -> Self {
        Self {
            id: id.into(),
            route_id: route_id.into(),
            client_name: String::new(),
            address: String::new(),
            sku: None,
            location,
            stop_order: 0,
            optimized_order: None,
            status: StopStatus::Pending,
            notes: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == StopStatus::Pending
    }

    /// Records a completion decision taken by the driver.
    pub fn mark(&mut self, status: StopStatus, notes: Option<String>) {
        self.status = status;
        if notes.is_some() {
            self.notes = notes;
        }
    }
}

/// A driver's route for one day, with its stops in dispatcher order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub id: String,
    pub name: String,
    pub driver_id: String,
    #[serde(default)]
    pub status: RouteStatus,
    /// ISO-8601 date (`YYYY-MM-DD`).
    pub scheduled_date: String,
    #[serde(default)]
    pub total_stops: u32,
    #[serde(default)]
    pub completed_stops: u32,
    #[serde(default)]
    pub stops: Vec<Stop>,
}

impl Route {
    pub fn pending_stops(&self) -> impl Iterator<Item = &Stop> {
        self.stops.iter().filter(|stop| stop.is_pending())
    }

    /// Recomputes the counters from the owned stop list.
    pub fn refresh_counters(&mut self) {
        self.total_stops = self.stops.len() as u32;
        self.completed_stops = self
            .stops
            .iter()
            .filter(|stop| stop.status == StopStatus::Completed)
            .count() as u32;
    }
}

/// Human text plus its numeric value (meters or seconds).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextValue {
    pub text: String,
    pub value: f64,
}

/// One turn-by-turn step as returned by the directions provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationStep {
    pub instruction: String,
    pub distance: TextValue,
    pub duration: TextValue,
    pub start_location: GeoPoint,
    pub end_location: GeoPoint,
    #[serde(default)]
    pub maneuver: Option<String>,
    /// Encoded polyline for this step's geometry.
    #[serde(default)]
    pub polyline: String,
}

/// A directions response for an ordered list of waypoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Directions {
    pub steps: Vec<NavigationStep>,
    pub total_distance_m: f64,
    pub total_duration_s: f64,
    pub overview_polyline: String,
}

/// The `(stopId, order)` pair written back when a driver confirms a new order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopOrder {
    pub stop_id: String,
    pub order: u32,
}
