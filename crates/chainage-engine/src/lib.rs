//! Chainage Engine - the stationing pipeline
//!
//! Executes the fixed stage order (project, corridor, reference, order,
//! propagate, cleanup) over one [`chainage_store::FeatureStore`], producing
//! a [`chainage_core::models::RunReport`]. Stages are synchronous and
//! single-threaded; each one finishes before the next starts, and every
//! iteration order is deterministic (ascending feature IDs, ascending segment
//! IDs, numeric station order).

pub mod context;
pub mod corridor;
pub mod orderer;
pub mod pipeline;
pub mod projector;
pub mod propagator;
pub mod referencer;

pub use context::{CollectionNames, Route};
pub use pipeline::Pipeline;
pub use propagator::AttributePropagator;
