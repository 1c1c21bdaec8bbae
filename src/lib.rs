//! Delivery route sequencing core.
//!
//! Orders a driver's stops with a nearest-neighbor heuristic over
//! great-circle distance, builds the navigation deep link for the ordered
//! stops, and tracks progress along them from live position updates.
//! Backend, login, location and directions services plug in through
//! [`traits`].

pub mod api;
pub mod config;
pub mod error;
pub mod haversine;
pub mod maneuver;
pub mod model;
pub mod osrm;
pub mod polyline;
pub mod sequencer;
pub mod session;
pub mod tracker;
pub mod traits;

pub use error::{Error, Result};
pub use haversine::distance;
pub use model::{Directions, GeoPoint, NavigationStep, Route, RouteStatus, Stop, StopOrder, StopStatus};
pub use sequencer::{build_navigation_link, optimize_order, plan_route, total_distance};
