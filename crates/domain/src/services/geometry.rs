//! Spherical and planar geometry used by geofencing.
//!
//! Distances use the haversine formula on a sphere with the mean Earth radius
//! (6 371 008.8 m). Polygon membership is evaluated in longitude/latitude
//! space, which is accurate for fences up to a few kilometers across.

use geo::{Area, Coord, HaversineDistance, Intersects, LineString, Point, Polygon};
use serde::{Deserialize, Serialize};

/// A WGS84 coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    fn to_point(self) -> Point<f64> {
        Point::new(self.longitude, self.latitude)
    }

    fn to_coord(self) -> Coord<f64> {
        Coord {
            x: self.longitude,
            y: self.latitude,
        }
    }
}

/// Great-circle distance between two coordinates in meters.
pub fn haversine_distance_meters(a: GeoPoint, b: GeoPoint) -> f64 {
    a.to_point().haversine_distance(&b.to_point())
}

/// Whether `point` lies within `radius_meters` of `center`. The circle edge
/// counts as inside.
pub fn point_in_circle(point: GeoPoint, center: GeoPoint, radius_meters: f64) -> bool {
    haversine_distance_meters(point, center) <= radius_meters
}

/// Whether `point` lies inside or on the boundary of the polygon described by
/// `vertices`.
///
/// The ring may be given open or closed. Fewer than three distinct vertices
/// never contain anything.
pub fn point_in_polygon(point: GeoPoint, vertices: &[GeoPoint]) -> bool {
    match to_polygon(vertices) {
        Some(polygon) => polygon.intersects(&point.to_point()),
        None => false,
    }
}

/// Number of distinct vertices once an explicit closing vertex is dropped.
pub fn distinct_vertex_count(vertices: &[GeoPoint]) -> usize {
    open_ring(vertices).len()
}

/// Planar area of the ring in square degrees. Zero for degenerate rings.
pub fn ring_area(vertices: &[GeoPoint]) -> f64 {
    to_polygon(vertices)
        .map(|polygon| polygon.unsigned_area())
        .unwrap_or(0.0)
}

fn open_ring(vertices: &[GeoPoint]) -> &[GeoPoint] {
    match (vertices.first(), vertices.last()) {
        (Some(first), Some(last)) if vertices.len() > 1 && first == last => {
            &vertices[..vertices.len() - 1]
        }
        _ => vertices,
    }
}

fn to_polygon(vertices: &[GeoPoint]) -> Option<Polygon<f64>> {
    let ring = open_ring(vertices);
    if ring.len() < 3 {
        return None;
    }

    // Polygon::new closes the exterior ring.
    let exterior: LineString<f64> = ring.iter().map(|v| v.to_coord()).collect();
    Some(Polygon::new(exterior, vec![]))
}
