//! Chainage Geo - planar geometry engine
//!
//! Measure math (projection, arc length, sub-path extraction), flat-capped
//! corridor buffering, spatial predicates, geometry validation, and the
//! R-tree index the pipeline stages query through.
//!
//! All math is planar Euclidean in the units of the input coordinates.

pub mod convert;
pub mod corridor;
pub mod index;
pub mod measure;
pub mod predicates;
pub mod validation;

pub use convert::{from_geo_geometry, to_geo_geometry};
pub use corridor::{build_corridor, build_corridor_multi, line_strictly_inside, strictly_inside};
pub use index::{IndexedFeature, SpatialIndex};
pub use measure::{polyline_length, project_onto, substring, Projection};
pub use validation::{ensure_valid, validate_geometry, ValidationError, ValidationResult};
