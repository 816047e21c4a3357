//! Point-onto-route projection stage.

use serde_json::json;
use tracing::{debug, info};

use chainage_core::config::PipelineOptions;
use chainage_core::error::Result;
use chainage_core::models::{fields, Feature, Geometry, ProjectionTally};
use chainage_geo::convert::{from_geo_point, to_geo_point};
use chainage_geo::measure::{project_onto, Projection};
use chainage_store::FeatureStore;

use crate::context::{CollectionNames, Route};

/// Projects asset points onto their nearest route and derives the
/// projected-point and connection-line collections.
pub struct PointProjector<'a> {
    options: &'a PipelineOptions,
    names: &'a CollectionNames,
}

impl<'a> PointProjector<'a> {
    pub fn new(options: &'a PipelineOptions, names: &'a CollectionNames) -> Self {
        Self { options, names }
    }

    /// Run the projection stage.
    ///
    /// For every asset point: resolve the nearest route, write the durable
    /// near-analysis attributes (`CORRELATION_ID`, `DIST_TO_ROUTE`,
    /// `APPROACH_ANGLE`), and, for points within the projection threshold,
    /// emit one projected point and one connection line, both carrying the
    /// correlation ID. Fills each route's `owned` count with the retained
    /// points it won.
    ///
    /// Points that resolve to no route, or to two routes at exactly the same
    /// distance, are skipped and counted, never fatal. A point already
    /// carrying a `CORRELATION_ID` keeps it, so re-runs are stable.
    pub fn run<S: FeatureStore + ?Sized>(
        &self,
        store: &S,
        routes: &mut [Route],
    ) -> Result<ProjectionTally> {
        store.replace_collection(&self.names.projected_points)?;
        store.replace_collection(&self.names.connection_lines)?;

        let points = store.features(&self.names.asset_points)?;
        let mut tally = ProjectionTally { points_total: points.len(), ..Default::default() };

        if points.is_empty() {
            info!("no asset points to project");
            return Ok(tally);
        }

        for point_feature in &points {
            let point = match to_geo_point(&point_feature.geometry) {
                Ok(point) => point,
                Err(_) => {
                    debug!(
                        point = %point_feature.id,
                        geometry = %point_feature.geometry.geometry_type(),
                        "asset is not a point, skipping"
                    );
                    tally.points_skipped += 1;
                    continue;
                }
            };

            let Some((route_idx, projection)) = nearest_route(routes, point) else {
                debug!(point = %point_feature.id, "no unambiguous nearest route, skipping");
                tally.points_skipped += 1;
                continue;
            };

            // Correlation ID stays put on re-runs
            let correlation = match point_feature.correlation_id() {
                Some(existing) => existing,
                None => {
                    store.set_attribute(
                        &self.names.asset_points,
                        point_feature.id,
                        fields::CORRELATION_ID,
                        json!(point_feature.id.0),
                    )?;
                    point_feature.id.0
                }
            };

            // Near-analysis results are durable even past the threshold
            store.set_attribute(
                &self.names.asset_points,
                point_feature.id,
                fields::DIST_TO_ROUTE,
                json!(projection.distance_from),
            )?;
            store.set_attribute(
                &self.names.asset_points,
                point_feature.id,
                fields::APPROACH_ANGLE,
                json!(projection.angle_degrees),
            )?;

            if projection.distance_from > self.options.projection_threshold {
                debug!(
                    point = %point_feature.id,
                    distance = projection.distance_from,
                    threshold = self.options.projection_threshold,
                    "projection beyond threshold"
                );
                tally.points_out_of_threshold += 1;
                continue;
            }

            routes[route_idx].owned += 1;

            let mut projected =
                Feature::new(point_feature.id, from_geo_point(projection.location), point_feature.crs);
            projected.set_correlation_id(correlation);
            store.add_feature(&self.names.projected_points, projected)?;

            // Two-vertex asset-to-route line; coincident endpoints are fine
            // for a point sitting on the route
            let mut connection = Feature::new(
                point_feature.id,
                Geometry::line_string(vec![
                    [point.x(), point.y()],
                    [projection.location.x(), projection.location.y()],
                ]),
                point_feature.crs,
            );
            connection.set_correlation_id(correlation);
            store.add_feature(&self.names.connection_lines, connection)?;

            tally.points_projected += 1;
        }

        info!(
            total = tally.points_total,
            projected = tally.points_projected,
            out_of_threshold = tally.points_out_of_threshold,
            skipped = tally.points_skipped,
            "projection stage complete"
        );
        Ok(tally)
    }
}

/// Nearest route to a point across every candidate route.
///
/// Returns `None` when no route yields a projection or when two routes tie
/// at exactly the nearest distance (ambiguous ownership). A tie within one
/// route is not ambiguous; projection already resolves it to the earliest
/// location along that route.
fn nearest_route(routes: &[Route], point: geo::Point) -> Option<(usize, Projection)> {
    let mut best: Option<(usize, Projection)> = None;
    let mut ambiguous = false;

    for (idx, route) in routes.iter().enumerate() {
        let Some(projection) = project_onto(&route.line, point) else {
            continue;
        };
        match &best {
            None => best = Some((idx, projection)),
            Some((_, current)) => {
                if projection.distance_from < current.distance_from {
                    best = Some((idx, projection));
                    ambiguous = false;
                } else if projection.distance_from == current.distance_from {
                    ambiguous = true;
                }
            }
        }
    }

    if ambiguous {
        return None;
    }
    best
}
