use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::Geometry;

/// Attribute field names owned by the pipeline.
///
/// `STATIONING` and `SEGMENT_ID` are the default output names and can be
/// overridden in configuration; the rest are fixed.
pub mod fields {
    /// Rendered station label (`HH+RR`)
    pub const STATIONING: &str = "STATIONING";
    /// Dense segment rank assigned by length ordering
    pub const SEGMENT_ID: &str = "SEGMENT_ID";
    /// Link between an asset point, its projected point, and its connection line
    pub const CORRELATION_ID: &str = "CORRELATION_ID";
    /// Planar distance from the asset point to its projection on the route
    pub const DIST_TO_ROUTE: &str = "DIST_TO_ROUTE";
    /// Direction from the asset point toward the route, degrees CCW from +x
    pub const APPROACH_ANGLE: &str = "APPROACH_ANGLE";
}

/// Unique identifier for a feature within a collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FeatureId(pub u64);

impl std::fmt::Display for FeatureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A geometry with an identifier and an attribute map
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feature {
    /// Unique identifier within the owning collection
    pub id: FeatureId,

    /// Feature geometry
    pub geometry: Geometry,

    /// Attribute values keyed by field name
    pub attributes: HashMap<String, serde_json::Value>,

    /// CRS EPSG code, carried through untransformed
    pub crs: u32,
}

impl Feature {
    /// Create a new feature with an empty attribute map
    pub fn new(id: FeatureId, geometry: Geometry, crs: u32) -> Self {
        Self { id, geometry, attributes: HashMap::new(), crs }
    }

    /// Create a new feature with attributes
    pub fn with_attributes(
        id: FeatureId,
        geometry: Geometry,
        attributes: HashMap<String, serde_json::Value>,
        crs: u32,
    ) -> Self {
        Self { id, geometry, attributes, crs }
    }

    /// Read an attribute value
    pub fn attribute(&self, name: &str) -> Option<&serde_json::Value> {
        self.attributes.get(name)
    }

    /// Write an attribute value, creating the field if it does not exist
    pub fn set_attribute(&mut self, name: &str, value: serde_json::Value) {
        self.attributes.insert(name.to_string(), value);
    }

    /// Read an attribute as a float
    pub fn number(&self, name: &str) -> Option<f64> {
        self.attribute(name).and_then(|v| v.as_f64())
    }

    /// Read an attribute as a string slice
    pub fn text(&self, name: &str) -> Option<&str> {
        self.attribute(name).and_then(|v| v.as_str())
    }

    /// Correlation ID linking this feature across derived collections
    pub fn correlation_id(&self) -> Option<u64> {
        self.attribute(fields::CORRELATION_ID).and_then(|v| v.as_u64())
    }

    /// Assign the correlation ID
    pub fn set_correlation_id(&mut self, id: u64) {
        self.set_attribute(fields::CORRELATION_ID, serde_json::json!(id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_auto_create() {
        let mut feature = Feature::new(FeatureId(1), Geometry::point(0.0, 0.0), 4326);
        assert!(feature.attribute(fields::STATIONING).is_none());

        feature.set_attribute(fields::STATIONING, serde_json::json!("00+92"));
        assert_eq!(feature.text(fields::STATIONING), Some("00+92"));

        // Writing again replaces rather than duplicating
        feature.set_attribute(fields::STATIONING, serde_json::json!("01+25"));
        assert_eq!(feature.text(fields::STATIONING), Some("01+25"));
        assert_eq!(feature.attributes.len(), 1);
    }

    #[test]
    fn test_correlation_id_roundtrip() {
        let mut feature = Feature::new(FeatureId(7), Geometry::point(1.0, 2.0), 4326);
        assert!(feature.correlation_id().is_none());

        feature.set_correlation_id(7);
        assert_eq!(feature.correlation_id(), Some(7));
    }

    #[test]
    fn test_number_accessor() {
        let mut feature = Feature::new(FeatureId(1), Geometry::point(0.0, 0.0), 4326);
        feature.set_attribute(fields::DIST_TO_ROUTE, serde_json::json!(12.5));
        assert_eq!(feature.number(fields::DIST_TO_ROUTE), Some(12.5));
        assert!(feature.number("MISSING").is_none());
    }
}
