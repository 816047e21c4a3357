//! Linear referencing stage: measure, cut, label.

use std::collections::HashMap;

use serde_json::json;
use tracing::{debug, info};

use chainage_core::config::PipelineOptions;
use chainage_core::error::Result;
use chainage_core::models::{Feature, FeatureId, ReferenceTally, Station};
use chainage_geo::convert::{from_geo_line_string, to_geo_point};
use chainage_geo::measure::{project_onto, substring};
use chainage_store::FeatureStore;

use crate::context::{CollectionNames, Route};

/// Projected points sit on their route; anything farther than this from
/// every route has no resolvable owner.
const OWNING_EPSILON: f64 = 1e-6;

/// Measures distance-along-route for each projected point, cuts the
/// start-to-point sub-path, and writes station labels.
pub struct LinearReferencer<'a> {
    options: &'a PipelineOptions,
    names: &'a CollectionNames,
}

impl<'a> LinearReferencer<'a> {
    pub fn new(options: &'a PipelineOptions, names: &'a CollectionNames) -> Self {
        Self { options, names }
    }

    /// Run the referencing stage.
    ///
    /// For each projected point: resolve the owning route, measure the arc
    /// length from the route start to the point, cut that sub-path into the
    /// segment collection, and write the rendered station onto both the
    /// segment and the asset point sharing its correlation ID. The segments
    /// are telescoping (they all share the route's start vertex), not a
    /// partition of the route.
    pub fn run<S: FeatureStore + ?Sized>(
        &self,
        store: &S,
        routes: &[Route],
    ) -> Result<ReferenceTally> {
        store.replace_collection(&self.names.route_segments)?;

        let projected = store.features(&self.names.projected_points)?;
        let mut tally = ReferenceTally::default();
        if projected.is_empty() {
            info!("no projected points to reference");
            return Ok(tally);
        }

        // Station labels go back to the asset sharing the correlation ID
        let assets = store.features(&self.names.asset_points)?;
        let mut asset_by_correlation: HashMap<u64, FeatureId> = HashMap::new();
        for asset in &assets {
            asset_by_correlation.insert(asset.correlation_id().unwrap_or(asset.id.0), asset.id);
        }

        for feature in &projected {
            let point = to_geo_point(&feature.geometry)?;
            let Some(route) = owning_route(routes, point) else {
                debug!(point = %feature.id, "projected point on no route, skipping");
                continue;
            };

            let Some(projection) = project_onto(&route.line, point) else {
                debug!(point = %feature.id, route = %route.id, "projection failed, skipping");
                continue;
            };
            // Guard the measure against floating-point drift
            let measure = projection.distance_along.clamp(0.0, route.length);

            let Some(sub_path) = substring(&route.line, measure) else {
                debug!(point = %feature.id, route = %route.id, "sub-path cut failed, skipping");
                continue;
            };
            let station = Station::from_distance(measure)?;

            let correlation = feature.correlation_id().unwrap_or(feature.id.0);
            let mut segment =
                Feature::new(feature.id, from_geo_line_string(&sub_path), feature.crs);
            segment.set_correlation_id(correlation);
            segment.set_attribute(&self.options.station_field, json!(station.to_string()));
            store.add_feature(&self.names.route_segments, segment)?;
            tally.segments_cut += 1;

            if let Some(asset_id) = asset_by_correlation.get(&correlation) {
                store.set_attribute(
                    &self.names.asset_points,
                    *asset_id,
                    &self.options.station_field,
                    json!(station.to_string()),
                )?;
                tally.points_stationed += 1;
            }
        }

        info!(
            segments = tally.segments_cut,
            stationed = tally.points_stationed,
            "linear referencing complete"
        );
        Ok(tally)
    }
}

/// The route a projected point belongs to.
///
/// Trivial with a single route; otherwise the first route (ascending ID)
/// the point lies on within [`OWNING_EPSILON`].
fn owning_route(routes: &[Route], point: geo::Point) -> Option<&Route> {
    if routes.len() == 1 {
        return routes.first();
    }
    routes.iter().find(|route| {
        project_onto(&route.line, point)
            .is_some_and(|projection| projection.distance_from <= OWNING_EPSILON)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainage_core::models::{fields, Geometry};
    use chainage_store::MemoryStore;

    fn referencer_setup() -> (MemoryStore, CollectionNames, PipelineOptions, Vec<Route>) {
        let store = MemoryStore::new();
        store.create_collection("asset_points").unwrap();
        store.create_collection("projected_points").unwrap();

        let names = CollectionNames::default();
        let options = PipelineOptions::default();
        let routes = vec![Route {
            id: FeatureId(1),
            line: geo::LineString::from(vec![(0.0, 0.0), (500.0, 0.0)]),
            length: 500.0,
            owned: 0,
        }];
        (store, names, options, routes)
    }

    fn add_pair(store: &MemoryStore, id: u64, asset: [f64; 2], projected: [f64; 2]) {
        let mut asset_feature =
            Feature::new(FeatureId(id), Geometry::point(asset[0], asset[1]), 4326);
        asset_feature.set_correlation_id(id);
        store.add_feature("asset_points", asset_feature).unwrap();

        let mut projected_feature =
            Feature::new(FeatureId(id), Geometry::point(projected[0], projected[1]), 4326);
        projected_feature.set_correlation_id(id);
        store.add_feature("projected_points", projected_feature).unwrap();
    }

    #[test]
    fn test_cuts_segments_and_labels_points() {
        let (store, names, options, routes) = referencer_setup();
        add_pair(&store, 1, [91.521, 10.0], [91.521, 0.0]);
        add_pair(&store, 2, [124.836, -5.0], [124.836, 0.0]);

        let tally = LinearReferencer::new(&options, &names).run(&store, &routes).unwrap();
        assert_eq!(tally.segments_cut, 2);
        assert_eq!(tally.points_stationed, 2);

        let segments = store.features("route_segments").unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].text(fields::STATIONING), Some("00+92"));
        assert_eq!(segments[1].text(fields::STATIONING), Some("01+25"));

        // Segments telescope from the route start
        let coords = segments[1].geometry.as_line_string().unwrap();
        assert_eq!(coords[0], [0.0, 0.0]);
        assert_eq!(coords[coords.len() - 1], [124.836, 0.0]);

        let asset = store.feature("asset_points", FeatureId(1)).unwrap();
        assert_eq!(asset.text(fields::STATIONING), Some("00+92"));
    }

    #[test]
    fn test_projection_at_route_start() {
        let (store, names, options, routes) = referencer_setup();
        add_pair(&store, 1, [0.0, 3.0], [0.0, 0.0]);

        LinearReferencer::new(&options, &names).run(&store, &routes).unwrap();

        let segments = store.features("route_segments").unwrap();
        assert_eq!(segments[0].text(fields::STATIONING), Some("00+00"));
        let coords = segments[0].geometry.as_line_string().unwrap();
        assert_eq!(coords.len(), 2);
        assert_eq!(coords[0], coords[1]);
    }

    #[test]
    fn test_owning_route_among_several() {
        let (store, names, options, _) = referencer_setup();
        let routes = vec![
            Route {
                id: FeatureId(1),
                line: geo::LineString::from(vec![(0.0, 0.0), (100.0, 0.0)]),
                length: 100.0,
                owned: 0,
            },
            Route {
                id: FeatureId(2),
                line: geo::LineString::from(vec![(0.0, 50.0), (100.0, 50.0)]),
                length: 100.0,
                owned: 0,
            },
        ];
        // On the second route
        add_pair(&store, 7, [60.0, 45.0], [60.0, 50.0]);

        let tally = LinearReferencer::new(&options, &names).run(&store, &routes).unwrap();
        assert_eq!(tally.segments_cut, 1);

        let segments = store.features("route_segments").unwrap();
        let coords = segments[0].geometry.as_line_string().unwrap();
        assert_eq!(coords[0], [0.0, 50.0], "segment must start on the owning route");
        assert_eq!(segments[0].text(fields::STATIONING), Some("00+60"));
    }

    #[test]
    fn test_point_on_no_route_is_skipped() {
        let (store, names, options, _) = referencer_setup();
        let routes = vec![
            Route {
                id: FeatureId(1),
                line: geo::LineString::from(vec![(0.0, 0.0), (100.0, 0.0)]),
                length: 100.0,
                owned: 0,
            },
            Route {
                id: FeatureId(2),
                line: geo::LineString::from(vec![(0.0, 50.0), (100.0, 50.0)]),
                length: 100.0,
                owned: 0,
            },
        ];
        // Stranded between the two routes
        add_pair(&store, 9, [50.0, 25.0], [50.0, 25.0]);

        let tally = LinearReferencer::new(&options, &names).run(&store, &routes).unwrap();
        assert_eq!(tally.segments_cut, 0);
        assert_eq!(tally.points_stationed, 0);
    }

    #[test]
    fn test_empty_projected_points_is_noop() {
        let (store, names, options, routes) = referencer_setup();
        let tally = LinearReferencer::new(&options, &names).run(&store, &routes).unwrap();
        assert_eq!(tally.segments_cut, 0);
        assert!(store.collection_exists("route_segments"));
    }
}
