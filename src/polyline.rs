//! Encoded polyline paths.
//!
//! Directions providers ship geometry in the standard polyline format: each
//! coordinate delta (scaled by 1e5) is zig-zag encoded, split into 5-bit
//! chunks with a 0x20 continuation bit, and offset by 63 into printable ASCII.
//! Latitude and longitude deltas accumulate independently.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::model::GeoPoint;

const PRECISION: f64 = 1e5;

/// A route geometry as decoded coordinates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<GeoPoint>,
}

impl Polyline {
    pub fn new(points: Vec<GeoPoint>) -> Self {
        Self { points }
    }

    /// Decodes an encoded polyline string.
    pub fn decode(encoded: &str) -> Self {
        Self::new(decode(encoded))
    }

    pub fn encode(&self) -> String {
        encode(&self.points)
    }

    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    pub fn into_points(self) -> Vec<GeoPoint> {
        self.points
    }

    /// Path length in kilometers.
    pub fn length_km(&self) -> f64 {
        self.points
            .windows(2)
            .map(|pair| crate::haversine::distance(pair[0], pair[1]))
            .sum()
    }
}

/// Decodes a polyline into coordinates.
///
/// Malformed, truncated or overflowing input stops at the last complete
/// coordinate pair.
pub fn decode(encoded: &str) -> Vec<GeoPoint> {
    let bytes = encoded.as_bytes();
    let mut points = Vec::new();
    let mut index = 0;
    let mut lat: i64 = 0;
    let mut lng: i64 = 0;

    while index < bytes.len() {
        let Some(delta_lat) = next_value(bytes, &mut index) else {
            warn!(offset = index, "truncated polyline");
            break;
        };
        let Some(delta_lng) = next_value(bytes, &mut index) else {
            warn!(offset = index, "truncated polyline");
            break;
        };

        let (Some(next_lat), Some(next_lng)) =
            (lat.checked_add(delta_lat), lng.checked_add(delta_lng))
        else {
            warn!(offset = index, "polyline delta out of range");
            break;
        };
        lat = next_lat;
        lng = next_lng;
        points.push(GeoPoint::new(lat as f64 / PRECISION, lng as f64 / PRECISION));
    }

    points
}

/// Reads one zig-zag varint. `None` if the input ends mid-value or holds a
/// byte outside the encoding alphabet.
fn next_value(bytes: &[u8], index: &mut usize) -> Option<i64> {
    let mut result: i64 = 0;
    let mut shift = 0;

    loop {
        let byte = *bytes.get(*index)?;
        *index += 1;
        if byte < 63 || shift > 60 {
            return None;
        }
        let chunk = (byte - 63) as i64;
        result |= (chunk & 0x1f) << shift;
        shift += 5;
        if chunk < 0x20 {
            break;
        }
    }

    Some(if result & 1 != 0 {
        !(result >> 1)
    } else {
        result >> 1
    })
}

/// Encodes coordinates. Points outside the WGS84 ranges (including NaN and
/// infinities) are skipped.
pub fn encode(points: &[GeoPoint]) -> String {
    let mut out = String::new();
    let mut prev_lat: i64 = 0;
    let mut prev_lng: i64 = 0;

    for point in points {
        if !in_range(point) {
            warn!(%point, "skipping unencodable point");
            continue;
        }
        let lat = (point.latitude * PRECISION).round() as i64;
        let lng = (point.longitude * PRECISION).round() as i64;
        push_value(&mut out, lat - prev_lat);
        push_value(&mut out, lng - prev_lng);
        prev_lat = lat;
        prev_lng = lng;
    }

    out
}

fn in_range(point: &GeoPoint) -> bool {
    (-90.0..=90.0).contains(&point.latitude) && (-180.0..=180.0).contains(&point.longitude)
}

fn push_value(out: &mut String, value: i64) {
    let mut v = if value < 0 { !(value << 1) } else { value << 1 };
    while v >= 0x20 {
        out.push((((v & 0x1f) | 0x20) as u8 + 63) as char);
        v >>= 5;
    }
    out.push((v as u8 + 63) as char);
}
