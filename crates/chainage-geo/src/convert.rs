//! Conversions between the canonical geometry enum and `geo` crate types.

use chainage_core::models::Geometry;
use chainage_core::{ChainageError, Result};
use geo::Geometry as GeoGeometry;

/// Convert a canonical Geometry to a geo::Geometry
pub fn to_geo_geometry(geom: &Geometry) -> GeoGeometry {
    match geom {
        Geometry::Point { coordinates } => {
            GeoGeometry::Point(geo::Point::new(coordinates[0], coordinates[1]))
        }
        Geometry::LineString { coordinates } => {
            GeoGeometry::LineString(coords_to_line_string(coordinates))
        }
        Geometry::Polygon { coordinates } => GeoGeometry::Polygon(rings_to_polygon(coordinates)),
        Geometry::MultiPoint { coordinates } => {
            let points: Vec<geo::Point> =
                coordinates.iter().map(|c| geo::Point::new(c[0], c[1])).collect();
            GeoGeometry::MultiPoint(geo::MultiPoint::new(points))
        }
        Geometry::MultiLineString { coordinates } => {
            let lines: Vec<geo::LineString> =
                coordinates.iter().map(|line| coords_to_line_string(line)).collect();
            GeoGeometry::MultiLineString(geo::MultiLineString::new(lines))
        }
        Geometry::MultiPolygon { coordinates } => {
            let polygons: Vec<geo::Polygon> =
                coordinates.iter().map(|poly| rings_to_polygon(poly)).collect();
            GeoGeometry::MultiPolygon(geo::MultiPolygon::new(polygons))
        }
    }
}

fn coords_to_line_string(coords: &[[f64; 2]]) -> geo::LineString {
    geo::LineString::new(coords.iter().map(|c| geo::Coord { x: c[0], y: c[1] }).collect())
}

fn rings_to_polygon(rings: &[Vec<[f64; 2]>]) -> geo::Polygon {
    if rings.is_empty() {
        return geo::Polygon::new(geo::LineString::new(vec![]), vec![]);
    }
    let exterior = coords_to_line_string(&rings[0]);
    let interiors: Vec<geo::LineString> =
        rings[1..].iter().map(|ring| coords_to_line_string(ring)).collect();
    geo::Polygon::new(exterior, interiors)
}

/// Convert a geo::Geometry to a canonical Geometry
pub fn from_geo_geometry(geom: &GeoGeometry) -> Geometry {
    match geom {
        GeoGeometry::Point(p) => Geometry::Point { coordinates: [p.x(), p.y()] },
        GeoGeometry::Line(l) => Geometry::LineString {
            coordinates: vec![[l.start.x, l.start.y], [l.end.x, l.end.y]],
        },
        GeoGeometry::LineString(ls) => from_geo_line_string(ls),
        GeoGeometry::Polygon(p) => Geometry::Polygon { coordinates: polygon_rings(p) },
        GeoGeometry::MultiPoint(mp) => {
            Geometry::MultiPoint { coordinates: mp.iter().map(|p| [p.x(), p.y()]).collect() }
        }
        GeoGeometry::MultiLineString(mls) => Geometry::MultiLineString {
            coordinates: mls.iter().map(|ls| ls.coords().map(|c| [c.x, c.y]).collect()).collect(),
        },
        GeoGeometry::MultiPolygon(mp) => {
            Geometry::MultiPolygon { coordinates: mp.iter().map(polygon_rings).collect() }
        }
        GeoGeometry::GeometryCollection(gc) => {
            // Take the first geometry or fall back to an empty point
            gc.iter()
                .next()
                .map(from_geo_geometry)
                .unwrap_or(Geometry::Point { coordinates: [0.0, 0.0] })
        }
        GeoGeometry::Rect(r) => from_geo_geometry(&GeoGeometry::Polygon(r.to_polygon())),
        GeoGeometry::Triangle(t) => from_geo_geometry(&GeoGeometry::Polygon(t.to_polygon())),
    }
}

fn polygon_rings(p: &geo::Polygon) -> Vec<Vec<[f64; 2]>> {
    let mut rings = Vec::with_capacity(1 + p.interiors().len());
    rings.push(p.exterior().coords().map(|c| [c.x, c.y]).collect());
    for interior in p.interiors() {
        rings.push(interior.coords().map(|c| [c.x, c.y]).collect());
    }
    rings
}

/// Convert a geo::Point to a canonical Geometry
pub fn from_geo_point(p: geo::Point) -> Geometry {
    Geometry::Point { coordinates: [p.x(), p.y()] }
}

/// Convert a geo::LineString to a canonical Geometry
pub fn from_geo_line_string(ls: &geo::LineString) -> Geometry {
    Geometry::LineString { coordinates: ls.coords().map(|c| [c.x, c.y]).collect() }
}

/// Extract a geo::Point, failing on any other geometry type
pub fn to_geo_point(geom: &Geometry) -> Result<geo::Point> {
    match geom {
        Geometry::Point { coordinates } => Ok(geo::Point::new(coordinates[0], coordinates[1])),
        other => Err(ChainageError::GeometryType {
            expected: "Point".to_string(),
            found: other.geometry_type().to_string(),
        }),
    }
}

/// Extract a geo::LineString, failing on any other geometry type
pub fn to_geo_line_string(geom: &Geometry) -> Result<geo::LineString> {
    match geom {
        Geometry::LineString { coordinates } => Ok(coords_to_line_string(coordinates)),
        other => Err(ChainageError::GeometryType {
            expected: "LineString".to_string(),
            found: other.geometry_type().to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_roundtrip() {
        let geom = Geometry::point(3120.5, 842.0);
        let geo_geom = to_geo_geometry(&geom);
        let back = from_geo_geometry(&geo_geom);
        assert_eq!(geom, back);
    }

    #[test]
    fn test_line_string_roundtrip() {
        let geom = Geometry::line_string(vec![[0.0, 0.0], [100.0, 0.0], [100.0, 50.0]]);
        let geo_geom = to_geo_geometry(&geom);
        let back = from_geo_geometry(&geo_geom);
        assert_eq!(geom, back);
    }

    #[test]
    fn test_polygon_roundtrip() {
        let geom = Geometry::polygon(vec![vec![
            [0.0, 0.0],
            [10.0, 0.0],
            [10.0, 10.0],
            [0.0, 10.0],
            [0.0, 0.0],
        ]]);
        let geo_geom = to_geo_geometry(&geom);
        let back = from_geo_geometry(&geo_geom);
        assert_eq!(geom, back);
    }

    #[test]
    fn test_typed_extraction() {
        let point = Geometry::point(1.0, 2.0);
        assert!(to_geo_point(&point).is_ok());

        let err = to_geo_line_string(&point).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("expected LineString"), "unexpected error: {}", message);
    }
}
