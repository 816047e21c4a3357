//! Error types for chainage

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChainageError {
    // Collection errors
    #[error("Collection not found: {name}")]
    CollectionNotFound { name: String },

    #[error("Collection already exists: {name}")]
    CollectionExists { name: String },

    #[error("Feature not found: {id} in collection {collection}")]
    FeatureNotFound { collection: String, id: u64 },

    // Geometry errors
    #[error("Invalid geometry at {location}: {reason}")]
    InvalidGeometry { location: String, reason: String },

    #[error("Geometry type mismatch: expected {expected}, found {found}")]
    GeometryType { expected: String, found: String },

    // Route errors
    #[error("No route resolvable for the point set: {reason}")]
    RouteUnresolved { reason: String },

    #[error("Invalid station distance {distance}: {reason}")]
    InvalidStation { distance: f64, reason: String },

    #[error("Malformed station label '{label}': {reason}")]
    StationParse { label: String, reason: String },

    // Configuration errors
    #[error("Missing required configuration: {key}")]
    ConfigMissing { key: String },

    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // Pipeline errors
    #[error("Pipeline stage '{stage}' failed: {reason}")]
    StageFailed { stage: String, reason: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for ChainageError {
    fn from(err: serde_json::Error) -> Self {
        ChainageError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ChainageError>;
