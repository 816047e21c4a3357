//! Attribute propagation stage.
//!
//! Pushes station values from the ranked segments out to the connection
//! lines and asset points, by one of two strategies, and provides the
//! generalized small-to-large attribute transfer. Both strategies are
//! idempotent: re-running over already-propagated collections rewrites the
//! same values.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde_json::json;
use tracing::{debug, info};

use chainage_core::config::PipelineOptions;
use chainage_core::error::Result;
use chainage_core::models::{
    Feature, FeatureId, Geometry, PropagationStrategy, PropagationTally, Station,
};
use chainage_geo::index::{IndexedFeature, SpatialIndex};
use chainage_geo::predicates::{geometry_distance, intersects};
use chainage_store::FeatureStore;

use crate::context::CollectionNames;

/// Propagates station values across the derived collections.
pub struct AttributePropagator<'a> {
    options: &'a PipelineOptions,
    names: &'a CollectionNames,
}

impl<'a> AttributePropagator<'a> {
    pub fn new(options: &'a PipelineOptions, names: &'a CollectionNames) -> Self {
        Self { options, names }
    }

    /// Run the configured propagation strategy.
    pub fn run<S: FeatureStore + ?Sized>(&self, store: &S) -> Result<PropagationTally> {
        match self.options.strategy {
            PropagationStrategy::NearestMatch => self.nearest_match(store),
            PropagationStrategy::Cascade => self.cascade(store),
        }
    }

    /// Nearest-match propagation.
    ///
    /// Each connection line takes the segment ID and station of its nearest
    /// segment within `snap_tolerance`; distance ties resolve to the lowest
    /// segment ID, which under telescoping segments is the shortest one
    /// covering the touch point. Each asset point then takes the station of
    /// its nearest stationed line within `point_tolerance`, ties resolving
    /// to the lowest correlation ID. Unmatched features keep their prior
    /// values.
    fn nearest_match<S: FeatureStore + ?Sized>(&self, store: &S) -> Result<PropagationTally> {
        let mut tally = PropagationTally::default();

        let segments = store.features(&self.names.route_segments)?;
        let lines = store.features(&self.names.connection_lines)?;

        if !segments.is_empty() {
            let index = SpatialIndex::from_features(&segments);
            let by_id: HashMap<FeatureId, &Feature> =
                segments.iter().map(|segment| (segment.id, segment)).collect();

            for line in &lines {
                let envelope = IndexedFeature::new(line.id, line.geometry.clone());
                let mut best: Option<(f64, u64, &Feature)> = None;

                for candidate in
                    index.query_near_envelope(envelope.envelope_corners(), self.options.snap_tolerance)
                {
                    let Some(segment) = by_id.get(&candidate.id) else { continue };
                    let Ok(distance) = geometry_distance(&line.geometry, &segment.geometry) else {
                        continue;
                    };
                    if distance > self.options.snap_tolerance {
                        continue;
                    }
                    let rank = segment
                        .number(&self.options.segment_field)
                        .map(|n| n as u64)
                        .unwrap_or(u64::MAX);
                    let better = match &best {
                        None => true,
                        Some((best_distance, best_rank, _)) => {
                            distance < *best_distance
                                || (distance == *best_distance && rank < *best_rank)
                        }
                    };
                    if better {
                        best = Some((distance, rank, segment));
                    }
                }

                match best {
                    Some((_, _, segment)) => {
                        self.copy_attribute(
                            store,
                            segment,
                            &self.names.connection_lines,
                            line.id,
                            &self.options.segment_field,
                        )?;
                        self.copy_attribute(
                            store,
                            segment,
                            &self.names.connection_lines,
                            line.id,
                            &self.options.station_field,
                        )?;
                        tally.lines_updated += 1;
                    }
                    None => {
                        debug!(line = %line.id, "no segment within snap tolerance");
                    }
                }
            }
        }

        // Reload: the lines now carry stations
        let lines = store.features(&self.names.connection_lines)?;
        let stationed: Vec<&Feature> = lines
            .iter()
            .filter(|line| line.attribute(&self.options.station_field).is_some())
            .collect();

        if !stationed.is_empty() {
            let index = SpatialIndex::from_features(stationed.iter().copied());
            let by_id: HashMap<FeatureId, &Feature> =
                stationed.iter().map(|line| (line.id, *line)).collect();

            let points = store.features(&self.names.asset_points)?;
            for point in &points {
                let Some(coords) = point.geometry.as_point() else { continue };
                let mut best: Option<(f64, u64, &Feature)> = None;

                for candidate in index.query_within_distance(coords, self.options.point_tolerance)
                {
                    let Some(line) = by_id.get(&candidate.id) else { continue };
                    let Ok(distance) = geometry_distance(&point.geometry, &line.geometry) else {
                        continue;
                    };
                    if distance > self.options.point_tolerance {
                        continue;
                    }
                    let correlation = line.correlation_id().unwrap_or(line.id.0);
                    let better = match &best {
                        None => true,
                        Some((best_distance, best_correlation, _)) => {
                            distance < *best_distance
                                || (distance == *best_distance && correlation < *best_correlation)
                        }
                    };
                    if better {
                        best = Some((distance, correlation, line));
                    }
                }

                match best {
                    Some((_, _, line)) => {
                        self.copy_attribute(
                            store,
                            line,
                            &self.names.asset_points,
                            point.id,
                            &self.options.station_field,
                        )?;
                        tally.points_updated += 1;
                    }
                    None => {
                        debug!(point = %point.id, "no stationed line within point tolerance");
                    }
                }
            }
        }

        info!(
            strategy = %PropagationStrategy::NearestMatch,
            lines = tally.lines_updated,
            points = tally.points_updated,
            "propagation complete"
        );
        Ok(tally)
    }

    /// Cascade propagation.
    ///
    /// Walks segment IDs ascending. Each step anchors on that segment's end
    /// point, selects the connection lines within `cascade_tolerance` of it,
    /// then the asset points within the same tolerance of those lines, and
    /// writes the segment's station (and ID, on the lines) over the
    /// selection. Later steps overwrite earlier ones, so a feature near two
    /// segment ends holds the higher segment's values when the cascade ends.
    /// The selection is rebuilt from scratch each step; an empty selection
    /// is a no-op for that step and the cascade continues.
    fn cascade<S: FeatureStore + ?Sized>(&self, store: &S) -> Result<PropagationTally> {
        let mut tally = PropagationTally::default();

        let segments = store.features(&self.names.route_segments)?;
        if segments.is_empty() {
            info!("no segments, skipping cascade");
            return Ok(tally);
        }

        let mut ranked: Vec<(u64, String)> = segments
            .iter()
            .filter_map(|segment| {
                let rank = segment.number(&self.options.segment_field)? as u64;
                let station = segment.text(&self.options.station_field)?.to_string();
                Some((rank, station))
            })
            .collect();
        ranked.sort_by_key(|(rank, _)| *rank);

        let end_points = store.features(&self.names.end_points)?;
        let mut anchor_by_rank: HashMap<u64, [f64; 2]> = HashMap::new();
        for end_point in &end_points {
            if let (Some(rank), Some(coords)) = (
                end_point.number(&self.options.segment_field),
                end_point.geometry.as_point(),
            ) {
                anchor_by_rank.insert(rank as u64, coords);
            }
        }

        let lines = store.features(&self.names.connection_lines)?;
        let points = store.features(&self.names.asset_points)?;
        let line_index = SpatialIndex::from_features(&lines);
        let point_index = SpatialIndex::from_features(&points);
        let line_by_id: HashMap<FeatureId, &Feature> =
            lines.iter().map(|line| (line.id, line)).collect();
        let tolerance = self.options.cascade_tolerance;

        let mut lines_touched: HashSet<FeatureId> = HashSet::new();
        let mut points_touched: HashSet<FeatureId> = HashSet::new();

        for (rank, station) in &ranked {
            let Some(anchor) = anchor_by_rank.get(rank) else {
                debug!(rank, "segment has no end point, skipping step");
                continue;
            };
            let anchor_geometry = Geometry::point(anchor[0], anchor[1]);

            let selected_lines: BTreeSet<FeatureId> = line_index
                .query_within_distance(*anchor, tolerance)
                .into_iter()
                .filter(|candidate| {
                    geometry_distance(&anchor_geometry, &candidate.geometry)
                        .map(|distance| distance <= tolerance)
                        .unwrap_or(false)
                })
                .map(|candidate| candidate.id)
                .collect();

            if selected_lines.is_empty() {
                debug!(rank, "no connection lines near segment end");
                continue;
            }

            let mut selected_points: BTreeSet<FeatureId> = BTreeSet::new();
            for line_id in &selected_lines {
                let Some(line) = line_by_id.get(line_id) else { continue };
                let envelope = IndexedFeature::new(line.id, line.geometry.clone());
                for candidate in
                    point_index.query_near_envelope(envelope.envelope_corners(), tolerance)
                {
                    let within = geometry_distance(&candidate.geometry, &line.geometry)
                        .map(|distance| distance <= tolerance)
                        .unwrap_or(false);
                    if within {
                        selected_points.insert(candidate.id);
                    }
                }
            }

            // Last writer wins: this rank overwrites anything lower
            for line_id in &selected_lines {
                store.set_attribute(
                    &self.names.connection_lines,
                    *line_id,
                    &self.options.station_field,
                    json!(station),
                )?;
                store.set_attribute(
                    &self.names.connection_lines,
                    *line_id,
                    &self.options.segment_field,
                    json!(rank),
                )?;
                lines_touched.insert(*line_id);
            }
            for point_id in &selected_points {
                store.set_attribute(
                    &self.names.asset_points,
                    *point_id,
                    &self.options.station_field,
                    json!(station),
                )?;
                points_touched.insert(*point_id);
            }

            debug!(
                rank,
                station = station.as_str(),
                lines = selected_lines.len(),
                points = selected_points.len(),
                "cascade step"
            );
        }

        tally.lines_updated = lines_touched.len();
        tally.points_updated = points_touched.len();
        info!(
            strategy = %PropagationStrategy::Cascade,
            steps = ranked.len(),
            lines = tally.lines_updated,
            points = tally.points_updated,
            "propagation complete"
        );
        Ok(tally)
    }

    /// Generalized small-to-large transfer.
    ///
    /// Copies the named attribute fields from every source feature onto each
    /// target feature its geometry intersects. Sources go in ascending
    /// station order (numeric, stable by feature ID; sources with no
    /// parseable station sort first), so higher-station sources win
    /// conflicts. Missing target fields are created by the write. Returns
    /// the number of distinct targets updated.
    pub fn transfer<S: FeatureStore + ?Sized>(
        &self,
        store: &S,
        source_collection: &str,
        target_collection: &str,
        fields: &[String],
    ) -> Result<usize> {
        let sources = store.features(source_collection)?;
        let targets = store.features(target_collection)?;
        if sources.is_empty() || targets.is_empty() {
            info!(
                source = source_collection,
                target = target_collection,
                "nothing to transfer"
            );
            return Ok(0);
        }

        let mut ordered: Vec<&Feature> = sources.iter().collect();
        ordered.sort_by_key(|feature| {
            feature
                .text(&self.options.station_field)
                .and_then(|label| label.parse::<Station>().ok())
                .map(|station| station.units())
                .unwrap_or(0)
        });

        let index = SpatialIndex::from_features(&targets);
        let mut updated: HashSet<FeatureId> = HashSet::new();

        for source in ordered {
            let envelope = IndexedFeature::new(source.id, source.geometry.clone());
            for candidate in index.query_near_envelope(envelope.envelope_corners(), 0.0) {
                if !intersects(&source.geometry, &candidate.geometry) {
                    continue;
                }
                let mut wrote = false;
                for field in fields {
                    if let Some(value) = source.attribute(field) {
                        store.set_attribute(target_collection, candidate.id, field, value.clone())?;
                        wrote = true;
                    }
                }
                if wrote {
                    updated.insert(candidate.id);
                }
            }
        }

        info!(
            source = source_collection,
            target = target_collection,
            updated = updated.len(),
            "transfer complete"
        );
        Ok(updated.len())
    }

    fn copy_attribute<S: FeatureStore + ?Sized>(
        &self,
        store: &S,
        from: &Feature,
        to_collection: &str,
        to_id: FeatureId,
        field: &str,
    ) -> Result<()> {
        if let Some(value) = from.attribute(field) {
            store.set_attribute(to_collection, to_id, field, value.clone())?;
        }
        Ok(())
    }
}
