//! Segment ordering stage: dense length ranks and end point anchors.

use serde_json::json;
use tracing::{debug, info};

use chainage_core::config::PipelineOptions;
use chainage_core::error::Result;
use chainage_core::models::{Feature, Geometry, OrderingTally};
use chainage_geo::convert::to_geo_line_string;
use chainage_geo::measure::polyline_length;
use chainage_store::FeatureStore;

use crate::context::CollectionNames;

/// Ranks route segments by length and derives their end point anchors.
pub struct SegmentOrderer<'a> {
    options: &'a PipelineOptions,
    names: &'a CollectionNames,
}

impl<'a> SegmentOrderer<'a> {
    pub fn new(options: &'a PipelineOptions, names: &'a CollectionNames) -> Self {
        Self { options, names }
    }

    /// Run the ordering stage.
    ///
    /// Since segments telescope from a common origin, sorting ascending by
    /// arc length puts them in station order; the 1-based dense rank becomes
    /// the segment ID, so the shortest segment gets 1 and the IDs are exactly
    /// `{1..=N}`. The sort is stable: equal lengths keep ascending feature ID
    /// order. Each segment also yields one end point feature at its terminal
    /// vertex, carrying the segment's ID and station as a tight-tolerance
    /// spatial anchor for the cascade.
    pub fn run<S: FeatureStore + ?Sized>(&self, store: &S) -> Result<OrderingTally> {
        store.replace_collection(&self.names.end_points)?;

        let segments = store.features(&self.names.route_segments)?;
        let mut tally = OrderingTally::default();
        if segments.is_empty() {
            info!("no segments to order");
            return Ok(tally);
        }

        let mut measured: Vec<(Feature, f64)> = Vec::with_capacity(segments.len());
        for segment in segments {
            let line = to_geo_line_string(&segment.geometry)?;
            let length = polyline_length(&line);
            measured.push((segment, length));
        }
        measured.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

        for (rank, (segment, length)) in measured.iter().enumerate() {
            let segment_id = rank as u64 + 1;
            store.set_attribute(
                &self.names.route_segments,
                segment.id,
                &self.options.segment_field,
                json!(segment_id),
            )?;
            debug!(segment = %segment.id, rank = segment_id, length, "ranked segment");
            tally.segments_ordered += 1;

            let Some(terminal) =
                segment.geometry.as_line_string().and_then(|coords| coords.last().copied())
            else {
                continue;
            };
            let mut end_point =
                Feature::new(segment.id, Geometry::point(terminal[0], terminal[1]), segment.crs);
            end_point.set_attribute(&self.options.segment_field, json!(segment_id));
            if let Some(station) = segment.text(&self.options.station_field) {
                end_point.set_attribute(&self.options.station_field, json!(station));
            }
            store.add_feature(&self.names.end_points, end_point)?;
            tally.end_points_created += 1;
        }

        info!(
            segments = tally.segments_ordered,
            end_points = tally.end_points_created,
            "segment ordering complete"
        );
        Ok(tally)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainage_core::models::{fields, FeatureId};
    use chainage_store::MemoryStore;

    fn orderer_setup() -> (MemoryStore, CollectionNames, PipelineOptions) {
        let store = MemoryStore::new();
        store.create_collection("route_segments").unwrap();
        (store, CollectionNames::default(), PipelineOptions::default())
    }

    fn add_segment(store: &MemoryStore, id: u64, end_x: f64, station: &str) {
        let mut segment = Feature::new(
            FeatureId(id),
            Geometry::line_string(vec![[0.0, 0.0], [end_x, 0.0]]),
            4326,
        );
        segment.set_attribute(fields::STATIONING, json!(station));
        store.add_feature("route_segments", segment).unwrap();
    }

    #[test]
    fn test_shortest_segment_gets_rank_one() {
        let (store, names, options) = orderer_setup();
        // Inserted out of length order on purpose
        add_segment(&store, 1, 480.0, "04+80");
        add_segment(&store, 2, 92.0, "00+92");
        add_segment(&store, 3, 125.0, "01+25");

        let tally = SegmentOrderer::new(&options, &names).run(&store).unwrap();
        assert_eq!(tally.segments_ordered, 3);
        assert_eq!(tally.end_points_created, 3);

        let ranks: Vec<(u64, u64)> = store
            .features("route_segments")
            .unwrap()
            .iter()
            .map(|s| (s.id.0, s.number(fields::SEGMENT_ID).unwrap() as u64))
            .collect();
        assert_eq!(ranks, vec![(1, 3), (2, 1), (3, 2)]);
    }

    #[test]
    fn test_ranks_are_dense_from_one() {
        let (store, names, options) = orderer_setup();
        for (id, end_x) in [(1u64, 300.0), (2, 150.0), (3, 450.0), (4, 75.0)] {
            add_segment(&store, id, end_x, "00+00");
        }

        SegmentOrderer::new(&options, &names).run(&store).unwrap();

        let mut ranks: Vec<u64> = store
            .features("route_segments")
            .unwrap()
            .iter()
            .map(|s| s.number(fields::SEGMENT_ID).unwrap() as u64)
            .collect();
        ranks.sort_unstable();
        assert_eq!(ranks, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_equal_lengths_keep_id_order() {
        let (store, names, options) = orderer_setup();
        add_segment(&store, 10, 50.0, "00+50");
        add_segment(&store, 11, 50.0, "00+50");

        SegmentOrderer::new(&options, &names).run(&store).unwrap();

        let segments = store.features("route_segments").unwrap();
        assert_eq!(segments[0].number(fields::SEGMENT_ID), Some(1.0));
        assert_eq!(segments[1].number(fields::SEGMENT_ID), Some(2.0));
    }

    #[test]
    fn test_end_points_carry_segment_attributes() {
        let (store, names, options) = orderer_setup();
        add_segment(&store, 1, 92.0, "00+92");

        SegmentOrderer::new(&options, &names).run(&store).unwrap();

        let end_points = store.features("end_points").unwrap();
        assert_eq!(end_points.len(), 1);
        assert_eq!(end_points[0].geometry.as_point(), Some([92.0, 0.0]));
        assert_eq!(end_points[0].number(fields::SEGMENT_ID), Some(1.0));
        assert_eq!(end_points[0].text(fields::STATIONING), Some("00+92"));
    }

    #[test]
    fn test_empty_segments_is_noop() {
        let (store, names, options) = orderer_setup();
        let tally = SegmentOrderer::new(&options, &names).run(&store).unwrap();
        assert_eq!(tally.segments_ordered, 0);
        assert!(store.collection_exists("end_points"));
    }
}
