//! Flat-capped corridor buffering.
//!
//! The corridor around a route is built from one rectangle per route segment
//! plus one disk per interior vertex, unioned into a single (multi)polygon.
//! Because no disk is placed at the first or last vertex, the corridor ends
//! flush with the route ends instead of extending past them.

use geo::algorithm::coordinate_position::{CoordPos, CoordinatePosition};
use geo::{unary_union, Coord, Intersects, LineString, MultiPolygon, Point, Polygon};

/// Vertices used to approximate a full circle
const CIRCLE_SEGMENTS: usize = 32;

/// Build the flat-capped corridor polygon around a route.
///
/// `radius` is the half-width of the corridor in coordinate units. Zero
/// length route segments contribute nothing; a route whose segments are all
/// degenerate yields an empty corridor.
pub fn build_corridor(route: &LineString, radius: f64) -> MultiPolygon {
    let parts = corridor_parts(route, radius);
    if parts.is_empty() {
        return MultiPolygon::new(vec![]);
    }
    unary_union(&parts)
}

/// Build one corridor covering every route, as the union of the per-route
/// flat-capped buffers. Routes whose segments are all degenerate contribute
/// nothing.
pub fn build_corridor_multi<'a, I>(routes: I, radius: f64) -> MultiPolygon
where
    I: IntoIterator<Item = &'a LineString>,
{
    let parts: Vec<Polygon> = routes
        .into_iter()
        .flat_map(|route| corridor_parts(route, radius))
        .collect();
    if parts.is_empty() {
        return MultiPolygon::new(vec![]);
    }
    unary_union(&parts)
}

/// The un-unioned pieces of a single route's corridor: one rectangle per
/// non-degenerate segment plus one disk per interior vertex. Returns an empty
/// vec when no segment has length.
fn corridor_parts(route: &LineString, radius: f64) -> Vec<Polygon> {
    let mut parts: Vec<Polygon> = Vec::new();

    for seg in route.lines() {
        let dx = seg.end.x - seg.start.x;
        let dy = seg.end.y - seg.start.y;
        let len = dx.hypot(dy);
        if len == 0.0 {
            continue;
        }

        // Unit normal scaled to the radius
        let nx = -dy / len * radius;
        let ny = dx / len * radius;

        let ring = vec![
            Coord { x: seg.start.x + nx, y: seg.start.y + ny },
            Coord { x: seg.end.x + nx, y: seg.end.y + ny },
            Coord { x: seg.end.x - nx, y: seg.end.y - ny },
            Coord { x: seg.start.x - nx, y: seg.start.y - ny },
            Coord { x: seg.start.x + nx, y: seg.start.y + ny },
        ];
        parts.push(Polygon::new(LineString::new(ring), vec![]));
    }

    if parts.is_empty() {
        return parts;
    }

    // Disks fill the outside of each bend; none at the route ends
    for vertex in &route.0[1..route.0.len() - 1] {
        parts.push(disk(*vertex, radius));
    }

    parts
}

fn disk(center: Coord, radius: f64) -> Polygon {
    let mut ring = Vec::with_capacity(CIRCLE_SEGMENTS + 1);
    for i in 0..=CIRCLE_SEGMENTS {
        let theta = 2.0 * std::f64::consts::PI * (i as f64) / (CIRCLE_SEGMENTS as f64);
        ring.push(Coord {
            x: center.x + radius * theta.cos(),
            y: center.y + radius * theta.sin(),
        });
    }
    Polygon::new(LineString::new(ring), vec![])
}

/// Whether a point lies strictly inside the corridor.
///
/// Points on the corridor boundary are not inside.
pub fn strictly_inside(point: Point, corridor: &MultiPolygon) -> bool {
    let coord = Coord { x: point.x(), y: point.y() };
    corridor.coordinate_position(&coord) == CoordPos::Inside
}

/// Whether an entire line lies strictly inside the corridor.
///
/// Every vertex must be strictly interior and the line must not touch any
/// corridor boundary ring, so a line that grazes or crosses the edge is not
/// inside. Empty lines are not inside.
pub fn line_strictly_inside(line: &LineString, corridor: &MultiPolygon) -> bool {
    if line.0.is_empty() {
        return false;
    }
    if !line
        .0
        .iter()
        .all(|coord| corridor.coordinate_position(coord) == CoordPos::Inside)
    {
        return false;
    }
    corridor
        .0
        .iter()
        .flat_map(|poly| std::iter::once(poly.exterior()).chain(poly.interiors()))
        .all(|ring| !ring.intersects(line))
}
