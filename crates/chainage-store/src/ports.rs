use chainage_core::error::Result;
use chainage_core::models::{Feature, FeatureId};

/// Port for named feature collection storage.
///
/// Collections are flat, named sets of features. Adapters take `&self` and
/// manage their own interior synchronization; every snapshot they hand out is
/// ordered so the pipeline stages iterate deterministically.
pub trait FeatureStore: Send + Sync {
    /// Create an empty collection
    fn create_collection(&self, name: &str) -> Result<()>;

    /// Whether a collection with this name exists
    fn collection_exists(&self, name: &str) -> bool;

    /// Delete a collection and every feature in it
    fn delete_collection(&self, name: &str) -> Result<()>;

    /// Names of all collections, ascending
    fn list_collections(&self) -> Vec<String>;

    /// Number of features in a collection
    fn count(&self, collection: &str) -> Result<usize>;

    /// Store a feature and return its identifier.
    ///
    /// The feature keeps its own ID when that ID is free in the collection;
    /// otherwise a fresh ID is assigned. IDs are never reused within a store's
    /// lifetime.
    fn add_feature(&self, collection: &str, feature: Feature) -> Result<FeatureId>;

    /// Store many features in order, returning the assigned identifiers
    fn insert_features(&self, collection: &str, features: Vec<Feature>) -> Result<Vec<FeatureId>>;

    /// Retrieve a single feature by ID
    fn feature(&self, collection: &str, id: FeatureId) -> Result<Feature>;

    /// Snapshot of all features in a collection, ascending by feature ID
    fn features(&self, collection: &str) -> Result<Vec<Feature>>;

    /// Write one attribute on a stored feature, creating the field if needed
    fn set_attribute(
        &self,
        collection: &str,
        id: FeatureId,
        field: &str,
        value: serde_json::Value,
    ) -> Result<()>;

    /// Remove a feature from a collection
    fn delete_feature(&self, collection: &str, id: FeatureId) -> Result<()>;

    /// Remove several features, returning how many were deleted
    fn delete_features(&self, collection: &str, ids: &[FeatureId]) -> Result<usize> {
        for id in ids {
            self.delete_feature(collection, *id)?;
        }
        Ok(ids.len())
    }

    /// Leave `name` as an empty collection regardless of prior state
    fn replace_collection(&self, name: &str) -> Result<()> {
        if self.collection_exists(name) {
            self.delete_collection(name)?;
        }
        self.create_collection(name)
    }
}
