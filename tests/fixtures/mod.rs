//! Shared fixtures for the integration tests.
//!
//! Coordinates are real Las Vegas / Henderson addresses (OpenStreetMap), so
//! the same stops also route on the Nevada OSRM extract.

pub mod delivery_stops;

pub use delivery_stops::*;
