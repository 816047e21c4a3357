//! R-tree index over features for the pipeline's association queries.
//!
//! Queries return bounding-box candidates; callers refine them with the
//! exact predicates in [`crate::predicates`].

use crate::convert::to_geo_geometry;
use chainage_core::models::{Feature, FeatureId, Geometry};
use rstar::{RTree, RTreeObject, AABB};

/// Indexed geometry with its feature ID
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedFeature {
    /// Identifier of the indexed feature
    pub id: FeatureId,

    /// The geometry itself
    pub geometry: Geometry,

    /// Bounding box for spatial indexing
    envelope: AABB<[f64; 2]>,
}

impl IndexedFeature {
    /// Create a new indexed feature
    pub fn new(id: FeatureId, geometry: Geometry) -> Self {
        let envelope = Self::compute_envelope(&geometry);
        Self { id, geometry, envelope }
    }

    /// Compute the bounding box (envelope) for a geometry
    fn compute_envelope(geometry: &Geometry) -> AABB<[f64; 2]> {
        use geo::algorithm::bounding_rect::BoundingRect;

        let geo_geom = to_geo_geometry(geometry);

        match geo_geom.bounding_rect() {
            Some(rect) => {
                let min = rect.min();
                let max = rect.max();
                AABB::from_corners([min.x, min.y], [max.x, max.y])
            }
            // Empty geometries get a degenerate envelope at the origin
            None => AABB::from_point([0.0, 0.0]),
        }
    }

    /// Corners of the envelope as ([min_x, min_y], [max_x, max_y])
    pub fn envelope_corners(&self) -> ([f64; 2], [f64; 2]) {
        (self.envelope.lower(), self.envelope.upper())
    }
}

impl RTreeObject for IndexedFeature {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Spatial index for efficient candidate lookups
pub struct SpatialIndex {
    tree: RTree<IndexedFeature>,
}

impl SpatialIndex {
    /// Create a new empty spatial index
    pub fn new() -> Self {
        Self { tree: RTree::new() }
    }

    /// Bulk-load an index from features
    pub fn from_features<'a, I>(features: I) -> Self
    where
        I: IntoIterator<Item = &'a Feature>,
    {
        let indexed: Vec<IndexedFeature> = features
            .into_iter()
            .map(|feature| IndexedFeature::new(feature.id, feature.geometry.clone()))
            .collect();

        Self { tree: RTree::bulk_load(indexed) }
    }

    /// Insert a geometry into the index
    pub fn insert(&mut self, id: FeatureId, geometry: Geometry) {
        self.tree.insert(IndexedFeature::new(id, geometry));
    }

    /// Candidates whose envelopes fall within a bounding box
    pub fn query_bbox(&self, min: [f64; 2], max: [f64; 2]) -> Vec<&IndexedFeature> {
        let bbox = AABB::from_corners(min, max);
        self.tree.locate_in_envelope_intersecting(&bbox).collect()
    }

    /// Candidates whose envelopes come within `max_distance` of a point.
    ///
    /// This is a bounding-box approximation; callers must refine with an
    /// exact distance check.
    pub fn query_within_distance(
        &self,
        point: [f64; 2],
        max_distance: f64,
    ) -> Vec<&IndexedFeature> {
        let min = [point[0] - max_distance, point[1] - max_distance];
        let max = [point[0] + max_distance, point[1] + max_distance];
        self.query_bbox(min, max)
    }

    /// Candidates whose envelopes come within `max_distance` of another
    /// feature's envelope
    pub fn query_near_envelope(
        &self,
        corners: ([f64; 2], [f64; 2]),
        max_distance: f64,
    ) -> Vec<&IndexedFeature> {
        let (min, max) = corners;
        self.query_bbox(
            [min[0] - max_distance, min[1] - max_distance],
            [max[0] + max_distance, max[1] + max_distance],
        )
    }

    /// Get the total number of features in the index
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Check if the index is empty
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Get all feature IDs in the index
    pub fn all_ids(&self) -> Vec<FeatureId> {
        self.tree.iter().map(|f| f.id).collect()
    }
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new()
    }
}
