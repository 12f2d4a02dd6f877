//! Geodesic measurement of drawn features. All the math delegates to the
//! `geo` crate; this module only converts and formats.

use geo::{Distance, Geodesic, GeodesicArea, Haversine, Length, LineString, Point, Polygon};

use crate::types::{Coord, FeatureGeometry};

fn line_string(points: &[Coord]) -> LineString<f64> {
    LineString::from(
        points
            .iter()
            .map(|c| (c.long as f64, c.lat as f64))
            .collect::<Vec<_>>(),
    )
}

/// Geodesic length of a path over the WGS84 ellipsoid, in meters.
pub fn geodesic_length_m(points: &[Coord]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    Geodesic.length(&line_string(points))
}

/// Unsigned geodesic area of a ring, in square meters. The ring does not
/// need to be explicitly closed.
pub fn geodesic_area_m2(ring: &[Coord]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    Polygon::new(line_string(ring), vec![]).geodesic_area_unsigned()
}

/// Great-circle distance between two coordinates, in meters.
pub fn haversine_m(a: Coord, b: Coord) -> f64 {
    Haversine.distance(
        Point::new(a.long as f64, a.lat as f64),
        Point::new(b.long as f64, b.lat as f64),
    )
}

pub fn format_length(meters: f64) -> String {
    if meters < 1000.0 {
        format!("{meters:.0} m")
    } else {
        format!("{:.2} km", meters / 1000.0)
    }
}

pub fn format_area(square_meters: f64) -> String {
    format!("{:.2} km\u{b2}", square_meters / 1_000_000.0)
}

/// The measurement label for a finished or reshaped feature. Points report
/// through the results panel instead and carry no label.
pub fn label_for(geometry: &FeatureGeometry) -> Option<String> {
    match geometry {
        FeatureGeometry::Point(_) => None,
        FeatureGeometry::Line(points) => Some(format_length(geodesic_length_m(points))),
        FeatureGeometry::Polygon(points) => Some(format_area(geodesic_area_m2(points))),
        FeatureGeometry::Circle { center, edge } => {
            Some(format!("r = {}", format_length(haversine_m(*center, *edge))))
        }
    }
}
