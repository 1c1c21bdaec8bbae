//! Stop sequencing (greedy nearest neighbor).
//!
//! This is a heuristic: it usually lands close to the shortest tour for the
//! tens of stops a driver carries, but it does not guarantee the minimum total
//! distance. Results are deterministic: the scan runs in input order and the
//! lowest index wins an exact tie.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::haversine::{HaversineEstimator, distance};
use crate::model::{GeoPoint, Route, Stop, StopOrder};

/// The mapping service accepts at most this many intermediate waypoints.
pub const MAX_WAYPOINTS: usize = 9;

const DEFAULT_MAPS_HOST: &str = "www.google.com/maps";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SequencerConfig {
    /// Host and path prefix of the navigation deep link.
    pub maps_host: String,
    /// Leave completed and skipped stops out of the plan.
    pub pending_only: bool,
    /// Assumed average driving speed for the plan's time estimate.
    pub speed_kmh: f64,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            maps_host: DEFAULT_MAPS_HOST.to_string(),
            pending_only: true,
            speed_kmh: HaversineEstimator::default().speed_kmh,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionReason {
    InvalidCoordinates,
    NotPending,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExcludedStop {
    pub stop_id: String,
    pub reason: ExclusionReason,
}

/// A proposed visiting order. Nothing is persisted until the driver confirms
/// and the caller writes [`RoutePlan::order_pairs`] back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutePlan {
    pub route_id: Option<String>,
    pub stops: Vec<Stop>,
    pub excluded: Vec<ExcludedStop>,
    pub total_distance_km: f64,
    pub estimated_seconds: u32,
    pub navigation_url: String,
}

impl RoutePlan {
    /// 1-based `(stopId, order)` pairs in visiting order.
    pub fn order_pairs(&self) -> Vec<StopOrder> {
        self.stops
            .iter()
            .enumerate()
            .map(|(i, stop)| StopOrder {
                stop_id: stop.id.clone(),
                order: i as u32 + 1,
            })
            .collect()
    }

    /// Writes `optimized_order` onto the matching stops of a caller-owned list.
    /// Stops that are not part of the plan are left untouched.
    pub fn apply_to(&self, stops: &mut [Stop]) {
        for pair in self.order_pairs() {
            if let Some(stop) = stops.iter_mut().find(|stop| stop.id == pair.stop_id) {
                stop.optimized_order = Some(pair.order);
            }
        }
    }
}

/// Orders `stops` by repeatedly visiting the closest unvisited stop.
///
/// Starts from `start` when given, otherwise from the first stop (which is
/// then visited first, at distance zero). The result is always a permutation
/// of the input.
pub fn optimize_order(stops: &[Stop], start: Option<GeoPoint>) -> Vec<Stop> {
    if stops.len() <= 1 {
        return stops.to_vec();
    }

    let mut visited = vec![false; stops.len()];
    let mut ordered = Vec::with_capacity(stops.len());
    let mut current = start.unwrap_or(stops[0].location);

    while ordered.len() < stops.len() {
        let next = nearest_unvisited(current, stops, &visited);
        visited[next] = true;
        ordered.push(stops[next].clone());
        current = stops[next].location;
    }

    ordered
}

/// Index of the closest unvisited stop.
///
/// Strict `<` keeps the earliest index on ties. NaN distances never win, so
/// if nothing compares finite the first unvisited stop is taken.
fn nearest_unvisited(current: GeoPoint, stops: &[Stop], visited: &[bool]) -> usize {
    let mut best: Option<(usize, f64)> = None;
    let mut first_unvisited = None;

    for (i, stop) in stops.iter().enumerate() {
        if visited[i] {
            continue;
        }
        first_unvisited.get_or_insert(i);

        let d = distance(current, stop.location);
        let better = match best {
            Some((_, best_distance)) => d < best_distance,
            None => !d.is_nan(),
        };
        if better {
            best = Some((i, d));
        }
    }

    best.map(|(i, _)| i)
        .or(first_unvisited)
        .unwrap_or_default()
}

/// Sum of leg distances in kilometers, from `start` (if any) through every stop.
///
/// A single stop with no start has no legs and yields 0.
pub fn total_distance(ordered: &[Stop], start: Option<GeoPoint>) -> f64 {
    let Some(first) = ordered.first() else {
        return 0.0;
    };

    let lead_in = start.map_or(0.0, |start| distance(start, first.location));
    let legs: f64 = ordered
        .windows(2)
        .map(|pair| distance(pair[0].location, pair[1].location))
        .sum();

    lead_in + legs
}

/// Driving-mode deep link with origin, destination and up to
/// [`MAX_WAYPOINTS`] intermediate stops.
pub fn build_navigation_link(ordered: &[Stop], start: Option<GeoPoint>) -> String {
    build_navigation_link_for_host(ordered, start, DEFAULT_MAPS_HOST)
}

pub fn build_navigation_link_for_host(
    ordered: &[Stop],
    start: Option<GeoPoint>,
    maps_host: &str,
) -> String {
    let Some(last) = ordered.last() else {
        return String::new();
    };

    let (origin, between) = match start {
        Some(start) => (start, &ordered[..ordered.len() - 1]),
        None => {
            let inner = if ordered.len() > 2 {
                &ordered[1..ordered.len() - 1]
            } else {
                &[][..]
            };
            (ordered[0].location, inner)
        }
    };

    let mut url = format!(
        "https://{}/dir/?api=1&origin={}&destination={}&travelmode=driving",
        maps_host, origin, last.location
    );

    if between.len() > MAX_WAYPOINTS {
        debug!(
            dropped = between.len() - MAX_WAYPOINTS,
            "truncating navigation waypoints"
        );
    }

    let waypoints = between
        .iter()
        .take(MAX_WAYPOINTS)
        .map(|stop| stop.location.to_string())
        .collect::<Vec<_>>()
        .join("|");

    if !waypoints.is_empty() {
        url.push_str("&waypoints=");
        url.push_str(&waypoints);
    }

    url
}

/// Filters out stops the sequencer cannot place, orders the rest and derives
/// the distance, time estimate and deep link.
pub fn plan_route(stops: &[Stop], start: Option<GeoPoint>, config: &SequencerConfig) -> RoutePlan {
    let start = start.filter(|point| {
        let valid = point.is_valid();
        if !valid {
            warn!(%point, "ignoring invalid start location");
        }
        valid
    });

    let mut candidates = Vec::with_capacity(stops.len());
    let mut excluded = Vec::new();

    for stop in stops {
        if !stop.location.is_valid() {
            warn!(stop_id = %stop.id, location = %stop.location, "stop has no usable coordinates");
            excluded.push(ExcludedStop {
                stop_id: stop.id.clone(),
                reason: ExclusionReason::InvalidCoordinates,
            });
        } else if config.pending_only && !stop.is_pending() {
            excluded.push(ExcludedStop {
                stop_id: stop.id.clone(),
                reason: ExclusionReason::NotPending,
            });
        } else {
            candidates.push(stop.clone());
        }
    }

    let ordered = optimize_order(&candidates, start);
    let total_distance_km = total_distance(&ordered, start);
    let estimated_seconds =
        HaversineEstimator::new(config.speed_kmh).km_to_seconds(total_distance_km);
    let navigation_url = build_navigation_link_for_host(&ordered, start, &config.maps_host);

    debug!(
        stops = ordered.len(),
        excluded = excluded.len(),
        total_distance_km,
        "sequenced stops"
    );

    RoutePlan {
        route_id: stops.first().map(|stop| stop.route_id.clone()),
        stops: ordered,
        excluded,
        total_distance_km,
        estimated_seconds,
        navigation_url,
    }
}

/// Plans every route independently, in parallel.
pub fn plan_routes(
    routes: &[Route],
    start: Option<GeoPoint>,
    config: &SequencerConfig,
) -> Vec<RoutePlan> {
    routes
        .par_iter()
        .map(|route| {
            let mut plan = plan_route(&route.stops, start, config);
            plan.route_id = Some(route.id.clone());
            plan
        })
        .collect()
}
