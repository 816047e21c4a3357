//! Arc-length measure math over polylines.
//!
//! Lengths and distances are computed manually from coordinate differences
//! so that projection, interpolation, and sub-path extraction all agree on
//! the same measure. Everything is planar Euclidean.

use geo::algorithm::intersects::Intersects;
use geo::{Coord, Line, LineString, Point};

/// Result of projecting a point onto a polyline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// Arc length from the polyline start to the projected location
    pub distance_along: f64,

    /// Planar distance from the input point to the projected location
    pub distance_from: f64,

    /// The projected location on the polyline
    pub location: Point,

    /// Direction from the input point toward the projected location,
    /// in degrees counterclockwise from the +x axis
    pub angle_degrees: f64,
}

fn segment_length(a: Coord, b: Coord) -> f64 {
    (b.x - a.x).hypot(b.y - a.y)
}

/// Total arc length of a polyline
pub fn polyline_length(line: &LineString) -> f64 {
    line.lines().map(|seg| segment_length(seg.start, seg.end)).sum()
}

/// Closest point on the segment `a -> b`, with its parameter `t` in [0, 1]
fn project_onto_segment(p: Coord, a: Coord, b: Coord) -> (Coord, f64) {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return (a, 0.0);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    (Coord { x: a.x + t * dx, y: a.y + t * dy }, t)
}

/// Project a point onto a polyline.
///
/// Returns the nearest location on the polyline together with the arc length
/// from the polyline start to that location and the approach angle. When two
/// locations are equally near, the one earlier along the polyline wins.
/// Returns `None` for polylines with fewer than two vertices or non-finite
/// coordinates.
pub fn project_onto(line: &LineString, point: Point) -> Option<Projection> {
    if line.0.len() < 2 {
        return None;
    }

    let p = Coord { x: point.x(), y: point.y() };
    let mut cumulative = 0.0;
    let mut best: Option<(f64, f64, Coord)> = None;

    for seg in line.lines() {
        let seg_len = segment_length(seg.start, seg.end);
        let (closest, t) = project_onto_segment(p, seg.start, seg.end);
        let dist = segment_length(p, closest);

        if dist.is_finite() {
            let along = cumulative + t * seg_len;
            let closer = match &best {
                Some((_, best_dist, _)) => dist < *best_dist,
                None => true,
            };
            if closer {
                best = Some((along, dist, closest));
            }
        }

        cumulative += seg_len;
    }

    let (distance_along, distance_from, location) = best?;
    let angle_degrees = (location.y - p.y).atan2(location.x - p.x).to_degrees();

    Some(Projection {
        distance_along,
        distance_from,
        location: Point::new(location.x, location.y),
        angle_degrees,
    })
}

/// Location on a polyline at the given arc length from its start.
///
/// The distance is clamped to `[0, length]`. Returns `None` for polylines
/// with fewer than two vertices.
pub fn interpolate_at(line: &LineString, distance: f64) -> Option<Point> {
    if line.0.len() < 2 {
        return None;
    }

    let mut remaining = distance.max(0.0);
    let mut last = line.0[0];

    for seg in line.lines() {
        let seg_len = segment_length(seg.start, seg.end);
        if remaining <= seg_len {
            if seg_len == 0.0 {
                return Some(Point::new(seg.start.x, seg.start.y));
            }
            let t = remaining / seg_len;
            return Some(Point::new(
                seg.start.x + t * (seg.end.x - seg.start.x),
                seg.start.y + t * (seg.end.y - seg.start.y),
            ));
        }
        remaining -= seg_len;
        last = seg.end;
    }

    // Distance beyond the end clamps to the last vertex
    Some(Point::new(last.x, last.y))
}

/// Sub-path of a polyline from its start vertex to the given arc length.
///
/// The result keeps every original vertex before the cut and ends at the
/// interpolated cut point. A distance of zero yields a degenerate two-vertex
/// path at the start; a distance at or beyond the full length reproduces the
/// whole polyline. Returns `None` for polylines with fewer than two vertices.
pub fn substring(line: &LineString, distance: f64) -> Option<LineString> {
    if line.0.len() < 2 {
        return None;
    }

    let start = line.0[0];
    if distance <= 0.0 {
        return Some(LineString::new(vec![start, start]));
    }

    let mut coords = vec![start];
    let mut remaining = distance;

    for seg in line.lines() {
        let seg_len = segment_length(seg.start, seg.end);
        if remaining >= seg_len {
            coords.push(seg.end);
            remaining -= seg_len;
            if remaining == 0.0 {
                break;
            }
        } else {
            let t = remaining / seg_len;
            coords.push(Coord {
                x: seg.start.x + t * (seg.end.x - seg.start.x),
                y: seg.start.y + t * (seg.end.y - seg.start.y),
            });
            break;
        }
    }

    Some(LineString::new(coords))
}

/// Minimum distance from a point to a polyline
pub fn point_to_line_distance(point: Point, line: &LineString) -> Option<f64> {
    project_onto(line, point).map(|projection| projection.distance_from)
}

/// Minimum distance between two segments; zero when they intersect
pub fn segment_distance(a: Line, b: Line) -> f64 {
    if a.intersects(&b) {
        return 0.0;
    }

    let candidates = [
        segment_length(a.start, project_onto_segment(a.start, b.start, b.end).0),
        segment_length(a.end, project_onto_segment(a.end, b.start, b.end).0),
        segment_length(b.start, project_onto_segment(b.start, a.start, a.end).0),
        segment_length(b.end, project_onto_segment(b.end, a.start, a.end).0),
    ];
    candidates.into_iter().fold(f64::INFINITY, f64::min)
}

/// Minimum distance between two polylines; zero when they cross.
///
/// Returns `None` when either polyline has fewer than two vertices.
pub fn line_to_line_distance(a: &LineString, b: &LineString) -> Option<f64> {
    if a.0.len() < 2 || b.0.len() < 2 {
        return None;
    }

    let mut min = f64::INFINITY;
    for seg_a in a.lines() {
        for seg_b in b.lines() {
            let dist = segment_distance(seg_a, seg_b);
            if dist < min {
                min = dist;
            }
            if min == 0.0 {
                return Some(0.0);
            }
        }
    }
    Some(min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn straight_route() -> LineString {
        LineString::from(vec![(0.0, 0.0), (500.0, 0.0)])
    }

    fn bent_route() -> LineString {
        LineString::from(vec![(0.0, 0.0), (100.0, 0.0), (100.0, 100.0)])
    }

    #[test]
    fn test_polyline_length() {
        assert_relative_eq!(polyline_length(&straight_route()), 500.0);
        assert_relative_eq!(polyline_length(&bent_route()), 200.0);
    }

    #[test]
    fn test_project_onto_straight_route() {
        let projection = project_onto(&straight_route(), Point::new(125.0, 30.0)).unwrap();
        assert_relative_eq!(projection.distance_along, 125.0);
        assert_relative_eq!(projection.distance_from, 30.0);
        assert_relative_eq!(projection.location.x(), 125.0);
        assert_relative_eq!(projection.location.y(), 0.0);
        // Straight down toward the route
        assert_relative_eq!(projection.angle_degrees, -90.0);
    }

    #[test]
    fn test_project_measures_around_bend() {
        let projection = project_onto(&bent_route(), Point::new(120.0, 50.0)).unwrap();
        // Nearest location is (100, 50) on the second leg, 150 along the route
        assert_relative_eq!(projection.distance_along, 150.0);
        assert_relative_eq!(projection.distance_from, 20.0);
        assert_relative_eq!(projection.angle_degrees, 180.0);
    }

    #[test]
    fn test_project_point_on_route() {
        let projection = project_onto(&straight_route(), Point::new(200.0, 0.0)).unwrap();
        assert_relative_eq!(projection.distance_from, 0.0);
        assert_relative_eq!(projection.distance_along, 200.0);
    }

    #[test]
    fn test_project_beyond_end_clamps_to_terminal() {
        let projection = project_onto(&straight_route(), Point::new(600.0, 10.0)).unwrap();
        assert_relative_eq!(projection.distance_along, 500.0);
        assert_relative_eq!(projection.distance_from, (100.0f64.powi(2) + 100.0).sqrt());
    }

    #[test]
    fn test_project_tie_keeps_earliest() {
        // Equidistant from both legs of the bend
        let projection = project_onto(&bent_route(), Point::new(90.0, 10.0)).unwrap();
        assert_relative_eq!(projection.distance_from, 10.0);
        assert_relative_eq!(projection.distance_along, 90.0, epsilon = 1e-9);
    }

    #[test]
    fn test_project_rejects_degenerate_polyline() {
        let single = LineString::new(vec![Coord { x: 1.0, y: 1.0 }]);
        assert!(project_onto(&single, Point::new(0.0, 0.0)).is_none());
    }

    #[test]
    fn test_interpolate_at() {
        let route = bent_route();
        let mid = interpolate_at(&route, 150.0).unwrap();
        assert_relative_eq!(mid.x(), 100.0);
        assert_relative_eq!(mid.y(), 50.0);

        let clamped = interpolate_at(&route, 1000.0).unwrap();
        assert_relative_eq!(clamped.x(), 100.0);
        assert_relative_eq!(clamped.y(), 100.0);
    }

    #[test]
    fn test_substring_mid_segment() {
        let cut = substring(&straight_route(), 125.0).unwrap();
        assert_eq!(cut.0.len(), 2);
        assert_relative_eq!(polyline_length(&cut), 125.0);
        assert_relative_eq!(cut.0[1].x, 125.0);
    }

    #[test]
    fn test_substring_keeps_intermediate_vertices() {
        let cut = substring(&bent_route(), 150.0).unwrap();
        assert_eq!(cut.0.len(), 3);
        assert_eq!(cut.0[1], Coord { x: 100.0, y: 0.0 });
        assert_eq!(cut.0[2], Coord { x: 100.0, y: 50.0 });
    }

    #[test]
    fn test_substring_zero_is_degenerate() {
        let cut = substring(&straight_route(), 0.0).unwrap();
        assert_eq!(cut.0.len(), 2);
        assert_eq!(cut.0[0], cut.0[1]);
    }

    #[test]
    fn test_substring_full_length_reproduces_route() {
        let route = bent_route();
        let cut = substring(&route, 200.0).unwrap();
        assert_eq!(cut, route);

        let beyond = substring(&route, 10_000.0).unwrap();
        assert_eq!(beyond, route);
    }

    #[test]
    fn test_substring_ends_exactly_on_vertex() {
        let cut = substring(&bent_route(), 100.0).unwrap();
        assert_eq!(cut.0.len(), 2);
        assert_eq!(cut.0[1], Coord { x: 100.0, y: 0.0 });
    }

    #[test]
    fn test_segment_distance() {
        let a = Line::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 10.0, y: 0.0 });
        let parallel = Line::new(Coord { x: 0.0, y: 5.0 }, Coord { x: 10.0, y: 5.0 });
        let crossing = Line::new(Coord { x: 5.0, y: -5.0 }, Coord { x: 5.0, y: 5.0 });

        assert_relative_eq!(segment_distance(a, parallel), 5.0);
        assert_relative_eq!(segment_distance(a, crossing), 0.0);
    }

    #[test]
    fn test_line_to_line_distance() {
        let a = LineString::from(vec![(0.0, 0.0), (10.0, 0.0)]);
        let b = LineString::from(vec![(20.0, 0.0), (30.0, 0.0)]);
        assert_relative_eq!(line_to_line_distance(&a, &b).unwrap(), 10.0);
    }

    proptest! {
        #[test]
        fn prop_substring_length_matches_distance(distance in 0.0f64..200.0) {
            let route = bent_route();
            let cut = substring(&route, distance).unwrap();
            prop_assert!((polyline_length(&cut) - distance).abs() < 1e-9);
        }

        #[test]
        fn prop_projection_distance_along_within_length(
            x in -100.0f64..600.0,
            y in -100.0f64..100.0,
        ) {
            let route = straight_route();
            let projection = project_onto(&route, Point::new(x, y)).unwrap();
            prop_assert!(projection.distance_along >= 0.0);
            prop_assert!(projection.distance_along <= polyline_length(&route) + 1e-9);
        }

        #[test]
        fn prop_interpolate_agrees_with_substring(distance in 0.0f64..200.0) {
            let route = bent_route();
            let point = interpolate_at(&route, distance).unwrap();
            let cut = substring(&route, distance).unwrap();
            let last = cut.0.last().unwrap();
            prop_assert!((last.x - point.x()).abs() < 1e-9);
            prop_assert!((last.y - point.y()).abs() < 1e-9);
        }
    }
}
