//! OSRM HTTP adapter for turn-by-turn directions.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::model::{Directions, GeoPoint, NavigationStep, TextValue};
use crate::polyline;
use crate::traits::DirectionsProvider;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OsrmConfig {
    pub base_url: String,
    pub profile: String,
    pub timeout_secs: u64,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            profile: "driving".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OsrmClient {
    config: OsrmConfig,
    client: reqwest::blocking::Client,
}

impl OsrmClient {
    pub fn new(config: OsrmConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    fn route_url(&self, points: &[GeoPoint]) -> String {
        // OSRM takes lng,lat.
        let coords = points
            .iter()
            .map(|point| format!("{:.6},{:.6}", point.longitude, point.latitude))
            .collect::<Vec<_>>()
            .join(";");

        format!(
            "{}/route/v1/{}/{}?steps=true&overview=full&geometries=polyline",
            self.config.base_url.trim_end_matches('/'),
            self.config.profile,
            coords
        )
    }
}

impl DirectionsProvider for OsrmClient {
    fn directions(
        &self,
        origin: GeoPoint,
        destination: GeoPoint,
        waypoints: &[GeoPoint],
    ) -> Result<Directions> {
        let mut points = Vec::with_capacity(waypoints.len() + 2);
        points.push(origin);
        points.extend_from_slice(waypoints);
        points.push(destination);

        let response = self.client.get(self.route_url(&points)).send()?;
        let status = response.status();
        let body = response.text()?;

        let directions = parse_route_body(status, body)?;
        debug!(
            steps = directions.steps.len(),
            distance_m = directions.total_distance_m,
            "fetched directions"
        );
        Ok(directions)
    }
}

/// OSRM answers unroutable requests with 400 and a JSON `code`; any other
/// failure status, or a body that is not a route response, keeps its code.
fn parse_route_body(status: StatusCode, body: String) -> Result<Directions> {
    if !status.is_success() && status != StatusCode::BAD_REQUEST {
        return Err(Error::Status {
            status: status.as_u16(),
            body,
        });
    }

    match serde_json::from_str::<OsrmRouteResponse>(&body) {
        Ok(response) => response.into_directions(),
        Err(_) if !status.is_success() => Err(Error::Status {
            status: status.as_u16(),
            body,
        }),
        Err(err) => Err(err.into()),
    }
}

#[derive(Debug, Deserialize)]
struct OsrmRouteResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    distance: f64,
    duration: f64,
    #[serde(default)]
    geometry: String,
    #[serde(default)]
    legs: Vec<OsrmLeg>,
}

#[derive(Debug, Deserialize)]
struct OsrmLeg {
    #[serde(default)]
    steps: Vec<OsrmStep>,
}

#[derive(Debug, Deserialize)]
struct OsrmStep {
    distance: f64,
    duration: f64,
    #[serde(default)]
    geometry: String,
    #[serde(default)]
    name: String,
    maneuver: OsrmManeuver,
}

#[derive(Debug, Deserialize)]
struct OsrmManeuver {
    /// `[lng, lat]`
    location: [f64; 2],
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    modifier: Option<String>,
}

impl OsrmRouteResponse {
    fn into_directions(self) -> Result<Directions> {
        if self.code != "Ok" {
            return Err(Error::NoRoute(self.message.unwrap_or(self.code)));
        }
        let route = self
            .routes
            .into_iter()
            .next()
            .ok_or_else(|| Error::NoRoute("empty route list".to_string()))?;

        let steps = route
            .legs
            .into_iter()
            .flat_map(|leg| leg.steps)
            .map(OsrmStep::into_step)
            .collect();

        Ok(Directions {
            steps,
            total_distance_m: route.distance,
            total_duration_s: route.duration,
            overview_polyline: route.geometry,
        })
    }
}

impl OsrmStep {
    fn into_step(self) -> NavigationStep {
        let [lng, lat] = self.maneuver.location;
        let start_location = GeoPoint::new(lat, lng);
        let end_location = polyline::decode(&self.geometry)
            .last()
            .copied()
            .unwrap_or(start_location);
        let modifier = self.maneuver.modifier.as_deref();

        NavigationStep {
            instruction: instruction(&self.maneuver.kind, modifier, &self.name),
            distance: TextValue {
                text: distance_text(self.distance),
                value: self.distance,
            },
            duration: TextValue {
                text: duration_text(self.duration),
                value: self.duration,
            },
            start_location,
            end_location,
            maneuver: maneuver_tag(&self.maneuver.kind, modifier).map(str::to_string),
            polyline: self.geometry,
        }
    }
}

/// Maps an OSRM maneuver type/modifier pair onto the tag set understood by
/// [`crate::maneuver::classify_maneuver`].
pub fn maneuver_tag(kind: &str, modifier: Option<&str>) -> Option<&'static str> {
    let leftward = modifier.is_some_and(|m| m.contains("left"));

    match kind {
        "depart" | "arrive" => None,
        "roundabout" | "rotary" | "roundabout turn" | "exit roundabout" | "exit rotary" => {
            Some(if leftward { "roundabout-left" } else { "roundabout-right" })
        }
        "merge" => Some("merge"),
        "fork" => Some(if leftward { "fork-left" } else { "fork-right" }),
        "on ramp" | "off ramp" => Some(if leftward { "ramp-left" } else { "ramp-right" }),
        "ferry" => Some("ferry"),
        _ => match modifier? {
            "uturn" => Some("uturn-left"),
            "sharp left" => Some("turn-sharp-left"),
            "left" => Some("turn-left"),
            "slight left" if kind == "turn" => Some("turn-slight-left"),
            "slight left" => Some("keep-left"),
            "straight" => Some("straight"),
            "slight right" if kind == "turn" => Some("turn-slight-right"),
            "slight right" => Some("keep-right"),
            "right" => Some("turn-right"),
            "sharp right" => Some("turn-sharp-right"),
            _ => None,
        },
    }
}

fn instruction(kind: &str, modifier: Option<&str>, name: &str) -> String {
    let action = match (kind, modifier) {
        ("depart", _) => "Head out".to_string(),
        ("arrive", _) => return "Arrive at your destination".to_string(),
        ("roundabout" | "rotary", _) => "Enter the roundabout".to_string(),
        ("merge", _) => "Merge".to_string(),
        (_, Some("uturn")) => "Make a U-turn".to_string(),
        (_, Some("straight")) | (_, None) => "Continue".to_string(),
        (_, Some(modifier)) => format!("Turn {}", modifier),
    };

    if name.is_empty() {
        action
    } else {
        format!("{} onto {}", action, name)
    }
}

fn distance_text(meters: f64) -> String {
    if meters >= 1000.0 {
        format!("{:.1} km", meters / 1000.0)
    } else {
        format!("{} m", meters.round() as i64)
    }
}

fn duration_text(seconds: f64) -> String {
    let minutes = (seconds / 60.0).round().max(1.0) as i64;
    format!("{} min", minutes)
}
