//! Corridor containment filter stage.
//!
//! A scalar distance threshold can admit points that are only within range
//! of an extrapolated route extension; containment in the flat-capped
//! corridor polygon is the authoritative filter. The polygon is built,
//! applied, and dropped within the stage.

use geo::Geometry as GeoGeometry;
use tracing::{debug, info};

use chainage_core::config::PipelineOptions;
use chainage_core::error::Result;
use chainage_core::models::{CorridorTally, FeatureId};
use chainage_geo::convert::to_geo_geometry;
use chainage_geo::corridor::{build_corridor_multi, line_strictly_inside, strictly_inside};
use chainage_store::FeatureStore;

use crate::context::{CollectionNames, Route};

/// Removes derived features not entirely contained in the route corridor.
pub struct CorridorFilter<'a> {
    options: &'a PipelineOptions,
    names: &'a CollectionNames,
}

impl<'a> CorridorFilter<'a> {
    pub fn new(options: &'a PipelineOptions, names: &'a CollectionNames) -> Self {
        Self { options, names }
    }

    /// Run the corridor filter over the projected points and connection
    /// lines.
    ///
    /// A candidate survives only if it lies strictly inside the corridor;
    /// touching the boundary removes it. Removal is immediate and not
    /// reversible within the run. Asset points themselves are never deleted,
    /// only their derived features.
    pub fn run<S: FeatureStore + ?Sized>(
        &self,
        store: &S,
        routes: &[Route],
    ) -> Result<CorridorTally> {
        let corridor = build_corridor_multi(
            routes.iter().map(|route| &route.line),
            self.options.corridor_radius,
        );

        let mut tally = CorridorTally::default();
        for collection in [&self.names.projected_points, &self.names.connection_lines] {
            let features = store.features(collection)?;
            let mut removed: Vec<FeatureId> = Vec::new();

            for feature in &features {
                tally.candidates += 1;
                let inside = match to_geo_geometry(&feature.geometry) {
                    GeoGeometry::Point(point) => strictly_inside(point, &corridor),
                    GeoGeometry::LineString(line) => line_strictly_inside(&line, &corridor),
                    _ => {
                        debug!(
                            collection = collection.as_str(),
                            feature = %feature.id,
                            geometry = %feature.geometry.geometry_type(),
                            "containment not provable for this geometry, removing"
                        );
                        false
                    }
                };
                if !inside {
                    removed.push(feature.id);
                }
            }

            if !removed.is_empty() {
                store.delete_features(collection, &removed)?;
                debug!(
                    collection = collection.as_str(),
                    removed = removed.len(),
                    "removed candidates outside corridor"
                );
                tally.removed += removed.len();
            }
        }

        info!(
            radius = self.options.corridor_radius,
            candidates = tally.candidates,
            removed = tally.removed,
            "corridor filter complete"
        );
        Ok(tally)
    }
}
