//! Collaborator seams.
//!
//! The core never calls these itself. They describe what the surrounding app
//! plugs in: the route backend, the login session, device location and a
//! turn-by-turn directions service.

use std::sync::mpsc::Sender;

use crate::error::Result;
use crate::model::{Directions, GeoPoint, Route, RouteStatus, StopOrder};

/// Remote source of truth for routes and stops.
///
/// Implementations must not retry internally.
pub trait RouteRepository {
    fn list_routes(&self) -> Result<Vec<Route>>;

    /// Fetches a route including its stops.
    fn route_details(&self, route_id: &str) -> Result<Route>;

    fn update_route_status(&self, route_id: &str, status: RouteStatus) -> Result<()>;

    fn complete_stop(&self, stop_id: &str, notes: Option<&str>) -> Result<()>;

    fn save_optimized_order(&self, route_id: &str, order: &[StopOrder]) -> Result<()>;

    fn delete_route(&self, route_id: &str) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Exchanges credentials for an opaque token and keeps it around.
pub trait SessionProvider {
    fn login(&mut self, credentials: &Credentials) -> Result<String>;

    fn logout(&mut self) -> Result<()>;

    /// Reuses a token persisted by an earlier login.
    fn restore(&mut self, token: String);

    /// The current token, if logged in.
    fn token(&self) -> Option<&str>;
}

/// Where session tokens live between launches.
pub trait TokenStore {
    fn load(&self) -> Result<Option<String>>;

    fn save(&self, token: &str) -> Result<()>;

    fn clear(&self) -> Result<()>;
}

/// A live location feed. Dropping the handle without calling `cancel` is a
/// leak; [`crate::tracker::Navigator`] always cancels.
pub trait Subscription {
    fn cancel(&mut self);
}

pub trait GeolocationProvider {
    fn current_position(&self) -> Result<GeoPoint>;

    /// Starts pushing position updates into `updates` until cancelled.
    fn subscribe(&self, updates: Sender<GeoPoint>) -> Result<Box<dyn Subscription>>;
}

/// Turn-by-turn directions for an ordered list of waypoints.
pub trait DirectionsProvider {
    fn directions(
        &self,
        origin: GeoPoint,
        destination: GeoPoint,
        waypoints: &[GeoPoint],
    ) -> Result<Directions>;
}
