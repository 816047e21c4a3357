//! Pipeline orchestration.

use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info};

use chainage_core::config::PipelineOptions;
use chainage_core::error::{ChainageError, Result};
use chainage_core::models::{CleanupTally, RunReport, Station};
use chainage_store::FeatureStore;

use crate::context::{CollectionNames, Route};
use crate::corridor::CorridorFilter;
use crate::orderer::SegmentOrderer;
use crate::projector::PointProjector;
use crate::propagator::AttributePropagator;
use crate::referencer::LinearReferencer;

/// Runs the stationing stages in their fixed order against a feature store.
///
/// A run is synchronous and deterministic: the same store contents and
/// options produce the same derived features, attributes, and report,
/// independent of insertion order.
pub struct Pipeline<S: FeatureStore> {
    store: S,
    options: PipelineOptions,
    names: CollectionNames,
}

impl<S: FeatureStore> Pipeline<S> {
    /// Create a pipeline over a store with the default collection names.
    pub fn new(store: S, options: PipelineOptions) -> Self {
        Self { store, options, names: CollectionNames::default() }
    }

    /// Create a pipeline with custom collection names.
    pub fn with_names(store: S, options: PipelineOptions, names: CollectionNames) -> Self {
        Self { store, options, names }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Execute one full run: project, corridor-filter, reference, order,
    /// propagate, then clean up the scratch collections.
    ///
    /// The report names the primary route: the one that retained the most
    /// projected points, ties resolving to the lowest route ID.
    pub fn run(&self) -> Result<RunReport> {
        self.options.validate()?;

        let started_at = Utc::now();
        let timer = Instant::now();

        let mut routes = Route::resolve_all(&self.store, &self.names.routes)?;
        info!(
            routes = routes.len(),
            strategy = %self.options.strategy,
            "pipeline started"
        );

        let projection =
            PointProjector::new(&self.options, &self.names).run(&self.store, &mut routes)?;
        let corridor =
            CorridorFilter::new(&self.options, &self.names).run(&self.store, &routes)?;
        let reference =
            LinearReferencer::new(&self.options, &self.names).run(&self.store, &routes)?;
        let ordering = SegmentOrderer::new(&self.options, &self.names).run(&self.store)?;
        let propagation = AttributePropagator::new(&self.options, &self.names).run(&self.store)?;
        let cleanup = self.cleanup()?;

        let primary = routes
            .iter()
            .max_by(|a, b| a.owned.cmp(&b.owned).then_with(|| b.id.cmp(&a.id)))
            .ok_or_else(|| ChainageError::RouteUnresolved {
                reason: "no routes resolved".to_string(),
            })?;

        let report = RunReport {
            route_id: primary.id,
            route_length: primary.length,
            route_end_station: Station::from_distance(primary.length)?,
            strategy: self.options.strategy,
            projection,
            corridor,
            reference,
            ordering,
            propagation,
            cleanup,
            started_at,
            elapsed_ms: timer.elapsed().as_millis() as u64,
        };

        info!(
            route = %report.route_id,
            end_station = %report.route_end_station,
            elapsed_ms = report.elapsed_ms,
            "pipeline finished"
        );
        Ok(report)
    }

    /// Delete the intermediate collections. Segments survive when
    /// `keep_segments` is set; connection lines are always an output.
    fn cleanup(&self) -> Result<CleanupTally> {
        let mut tally = CleanupTally::default();

        let mut scratch = vec![&self.names.projected_points, &self.names.end_points];
        if !self.options.keep_segments {
            scratch.push(&self.names.route_segments);
        }

        for name in scratch {
            if self.store.collection_exists(name) {
                self.store.delete_collection(name)?;
                tally.collections_deleted += 1;
                debug!(collection = name.as_str(), "dropped scratch collection");
            }
        }

        Ok(tally)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainage_core::models::{fields, Feature, FeatureId, Geometry};
    use chainage_store::MemoryStore;

    fn seeded_store(routes: &[(u64, Vec<[f64; 2]>)], points: &[(u64, [f64; 2])]) -> MemoryStore {
        let store = MemoryStore::new();
        store.create_collection("routes").unwrap();
        store.create_collection("asset_points").unwrap();
        for (id, coords) in routes {
            store
                .add_feature(
                    "routes",
                    Feature::new(FeatureId(*id), Geometry::line_string(coords.clone()), 4326),
                )
                .unwrap();
        }
        for (id, coords) in points {
            store
                .add_feature(
                    "asset_points",
                    Feature::new(FeatureId(*id), Geometry::point(coords[0], coords[1]), 4326),
                )
                .unwrap();
        }
        store
    }

    #[test]
    fn test_run_drops_scratch_collections() {
        let store = seeded_store(
            &[(1, vec![[0.0, 0.0], [100.0, 0.0]])],
            &[(1, [50.0, 5.0])],
        );
        let pipeline = Pipeline::new(store, PipelineOptions::default());

        let report = pipeline.run().unwrap();

        assert_eq!(report.cleanup.collections_deleted, 3);
        let store = pipeline.store();
        assert!(!store.collection_exists("projected_points"));
        assert!(!store.collection_exists("end_points"));
        assert!(!store.collection_exists("route_segments"));
        assert!(store.collection_exists("connection_lines"));

        let point = store.feature("asset_points", FeatureId(1)).unwrap();
        assert_eq!(point.text(fields::STATIONING), Some("00+50"));
    }

    #[test]
    fn test_run_keeps_segments_when_asked() {
        let store = seeded_store(
            &[(1, vec![[0.0, 0.0], [100.0, 0.0]])],
            &[(1, [50.0, 5.0])],
        );
        let options = PipelineOptions { keep_segments: true, ..PipelineOptions::default() };
        let pipeline = Pipeline::new(store, options);

        let report = pipeline.run().unwrap();

        assert_eq!(report.cleanup.collections_deleted, 2);
        let segments = pipeline.store().features("route_segments").unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].number(fields::SEGMENT_ID), Some(1.0));
        assert_eq!(segments[0].text(fields::STATIONING), Some("00+50"));
    }

    #[test]
    fn test_primary_route_tie_takes_lowest_id() {
        let store = seeded_store(
            &[
                (1, vec![[0.0, 0.0], [100.0, 0.0]]),
                (2, vec![[0.0, 50.0], [100.0, 50.0]]),
            ],
            &[(1, [10.0, 1.0]), (2, [20.0, 49.0])],
        );
        let pipeline = Pipeline::new(store, PipelineOptions::default());

        let report = pipeline.run().unwrap();

        // One retained point each
        assert_eq!(report.projection.points_projected, 2);
        assert_eq!(report.route_id, FeatureId(1));
        assert_eq!(report.route_length, 100.0);
        assert_eq!(report.route_end_station.to_string(), "01+00");
    }

    #[test]
    fn test_run_without_routes_fails() {
        let store = MemoryStore::new();
        store.create_collection("routes").unwrap();
        store.create_collection("asset_points").unwrap();

        let result = Pipeline::new(store, PipelineOptions::default()).run();
        assert!(matches!(result, Err(ChainageError::RouteUnresolved { .. })));
    }

    #[test]
    fn test_run_rejects_invalid_options() {
        let store = seeded_store(&[(1, vec![[0.0, 0.0], [100.0, 0.0]])], &[]);
        let options =
            PipelineOptions { corridor_radius: -1.0, ..PipelineOptions::default() };

        let result = Pipeline::new(store, options).run();
        assert!(matches!(result, Err(ChainageError::ConfigInvalid { .. })));
    }
}
