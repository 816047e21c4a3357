//! Spatial predicates over the canonical geometry enum.

use crate::convert::to_geo_geometry;
use crate::measure;
use chainage_core::models::{Geometry, SpatialPredicate};
use chainage_core::{ChainageError, Result};
use geo::algorithm::contains::Contains;
use geo::algorithm::intersects::Intersects;
use geo::Geometry as GeoGeometry;

/// Check if two geometries intersect
pub fn intersects(a: &Geometry, b: &Geometry) -> bool {
    to_geo_geometry(a).intersects(&to_geo_geometry(b))
}

/// Check if `a` is completely within `b`
pub fn within(a: &Geometry, b: &Geometry) -> bool {
    to_geo_geometry(b).contains(&to_geo_geometry(a))
}

/// Planar distance between two geometries.
///
/// Supports the point and line combinations the pipeline's association
/// queries need; area geometries are rejected.
pub fn geometry_distance(a: &Geometry, b: &Geometry) -> Result<f64> {
    let unsupported = || ChainageError::GeometryType {
        expected: "Point or LineString".to_string(),
        found: format!("{} / {}", a.geometry_type(), b.geometry_type()),
    };
    let degenerate = |side: &Geometry| ChainageError::InvalidGeometry {
        location: side.geometry_type().to_string(),
        reason: "needs at least 2 vertices to measure distance".to_string(),
    };

    match (to_geo_geometry(a), to_geo_geometry(b)) {
        (GeoGeometry::Point(p1), GeoGeometry::Point(p2)) => {
            Ok((p2.x() - p1.x()).hypot(p2.y() - p1.y()))
        }
        (GeoGeometry::Point(p), GeoGeometry::LineString(ls)) => {
            measure::point_to_line_distance(p, &ls).ok_or_else(|| degenerate(b))
        }
        (GeoGeometry::LineString(ls), GeoGeometry::Point(p)) => {
            measure::point_to_line_distance(p, &ls).ok_or_else(|| degenerate(a))
        }
        (GeoGeometry::LineString(ls1), GeoGeometry::LineString(ls2)) => {
            measure::line_to_line_distance(&ls1, &ls2).ok_or_else(|| {
                if ls1.0.len() < 2 {
                    degenerate(a)
                } else {
                    degenerate(b)
                }
            })
        }
        _ => Err(unsupported()),
    }
}

/// Check if two geometries are within a planar distance of each other
pub fn within_distance(a: &Geometry, b: &Geometry, distance: f64) -> Result<bool> {
    Ok(geometry_distance(a, b)? <= distance)
}

/// Evaluate a spatial predicate between two geometries.
///
/// `distance` is required for `DWithin` and ignored otherwise.
pub fn evaluate_predicate(
    predicate: SpatialPredicate,
    a: &Geometry,
    b: &Geometry,
    distance: Option<f64>,
) -> Result<bool> {
    match predicate {
        SpatialPredicate::Within => Ok(within(a, b)),
        SpatialPredicate::Intersects => Ok(intersects(a, b)),
        SpatialPredicate::DWithin => {
            let distance = distance.ok_or_else(|| ChainageError::ConfigInvalid {
                key: "distance".to_string(),
                reason: "DWithin requires a distance".to_string(),
            })?;
            within_distance(a, b, distance)
        }
    }
}
