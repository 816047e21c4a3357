//! Shared run context: collection names and resolved routes.

use geo::LineString;

use chainage_core::error::{ChainageError, Result};
use chainage_core::models::FeatureId;
use chainage_geo::convert::to_geo_line_string;
use chainage_geo::measure::polyline_length;
use chainage_geo::validation::ensure_valid;
use chainage_store::FeatureStore;

/// Names of the collections one run touches
#[derive(Debug, Clone)]
pub struct CollectionNames {
    /// Input route polylines
    pub routes: String,

    /// Input asset points; station attributes are written back here
    pub asset_points: String,

    /// Projection locations on the route (scratch)
    pub projected_points: String,

    /// Asset-to-projection connection lines (output)
    pub connection_lines: String,

    /// Route-start-to-point sub-paths (scratch unless kept)
    pub route_segments: String,

    /// Segment terminal vertices (scratch)
    pub end_points: String,
}

impl Default for CollectionNames {
    fn default() -> Self {
        Self {
            routes: "routes".to_string(),
            asset_points: "asset_points".to_string(),
            projected_points: "projected_points".to_string(),
            connection_lines: "connection_lines".to_string(),
            route_segments: "route_segments".to_string(),
            end_points: "end_points".to_string(),
        }
    }
}

/// A route polyline resolved from the route collection
#[derive(Debug, Clone)]
pub struct Route {
    /// Feature ID in the route collection
    pub id: FeatureId,

    /// The polyline itself
    pub line: LineString,

    /// Total arc length
    pub length: f64,

    /// Retained asset points this route owns; filled by the projector
    pub owned: usize,
}

impl Route {
    /// Resolve every route in a collection, ascending by feature ID.
    ///
    /// Fails when the collection is empty or any feature is not a valid
    /// LineString.
    pub fn resolve_all<S: FeatureStore + ?Sized>(
        store: &S,
        collection: &str,
    ) -> Result<Vec<Route>> {
        let features = store.features(collection)?;
        if features.is_empty() {
            return Err(ChainageError::RouteUnresolved {
                reason: format!("collection '{}' has no features", collection),
            });
        }

        let mut routes = Vec::with_capacity(features.len());
        for feature in &features {
            ensure_valid(&format!("{}/{}", collection, feature.id), &feature.geometry)?;
            let line = to_geo_line_string(&feature.geometry)?;
            let length = polyline_length(&line);
            routes.push(Route { id: feature.id, line, length, owned: 0 });
        }
        Ok(routes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainage_core::models::{Feature, Geometry};
    use chainage_store::MemoryStore;

    #[test]
    fn test_resolve_all_ascending() {
        let store = MemoryStore::new();
        store.create_collection("routes").unwrap();
        store
            .add_feature(
                "routes",
                Feature::new(
                    FeatureId(5),
                    Geometry::line_string(vec![[0.0, 0.0], [100.0, 0.0]]),
                    4326,
                ),
            )
            .unwrap();
        store
            .add_feature(
                "routes",
                Feature::new(
                    FeatureId(2),
                    Geometry::line_string(vec![[0.0, 50.0], [300.0, 50.0]]),
                    4326,
                ),
            )
            .unwrap();

        let routes = Route::resolve_all(&store, "routes").unwrap();
        assert_eq!(routes.len(), 2);
        assert_eq!(routes[0].id, FeatureId(2));
        assert_eq!(routes[0].length, 300.0);
        assert_eq!(routes[1].id, FeatureId(5));
        assert_eq!(routes[1].length, 100.0);
    }

    #[test]
    fn test_resolve_all_rejects_empty_collection() {
        let store = MemoryStore::new();
        store.create_collection("routes").unwrap();
        let err = Route::resolve_all(&store, "routes").unwrap_err();
        assert!(matches!(err, ChainageError::RouteUnresolved { .. }));
    }

    #[test]
    fn test_resolve_all_rejects_non_line_route() {
        let store = MemoryStore::new();
        store.create_collection("routes").unwrap();
        store
            .add_feature("routes", Feature::new(FeatureId(1), Geometry::point(0.0, 0.0), 4326))
            .unwrap();

        assert!(Route::resolve_all(&store, "routes").is_err());
    }
}
