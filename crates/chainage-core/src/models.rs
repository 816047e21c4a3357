pub mod feature;
pub mod geometry;
pub mod run;
pub mod station;

pub use feature::{fields, Feature, FeatureId};
pub use geometry::{Crs, Geometry, GeometryType, SpatialPredicate};
pub use run::{
    CleanupTally, CorridorTally, OrderingTally, ProjectionTally, PropagationStrategy,
    PropagationTally, ReferenceTally, RunReport,
};
pub use station::Station;
