//! Chainage Store - Feature collection storage port and adapters
//!
//! This crate defines the collection storage port the pipeline stages run
//! against and provides the in-memory adapter plus the GeoJSON file adapter
//! used to move collections in and out of a store.

pub mod geojson;
pub mod memory;
pub mod ports;

pub use memory::MemoryStore;
pub use ports::FeatureStore;
