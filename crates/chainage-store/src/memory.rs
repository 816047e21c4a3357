//! In-memory storage implementation.
//!
//! This implementation uses `RwLock::unwrap()` intentionally. Lock poisoning
//! only occurs when another thread panicked while holding the lock, which is
//! an unrecoverable state.

use chainage_core::error::{ChainageError, Result};
use chainage_core::models::{Feature, FeatureId};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::ports::FeatureStore;

/// In-memory implementation of [`FeatureStore`].
///
/// Clones share the same underlying collections. Feature IDs come from one
/// store-wide counter, so an ID handed out once is never handed out again,
/// even across collections.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    collections: Arc<RwLock<HashMap<String, HashMap<FeatureId, Feature>>>>,
    next_id: Arc<RwLock<u64>>,
}

impl MemoryStore {
    /// Create a new empty in-memory store
    pub fn new() -> Self {
        Self::default()
    }
}

impl FeatureStore for MemoryStore {
    fn create_collection(&self, name: &str) -> Result<()> {
        let mut collections = self.collections.write().unwrap();
        if collections.contains_key(name) {
            return Err(ChainageError::CollectionExists { name: name.to_string() });
        }
        collections.insert(name.to_string(), HashMap::new());
        Ok(())
    }

    fn collection_exists(&self, name: &str) -> bool {
        let collections = self.collections.read().unwrap();
        collections.contains_key(name)
    }

    fn delete_collection(&self, name: &str) -> Result<()> {
        let mut collections = self.collections.write().unwrap();
        collections
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| ChainageError::CollectionNotFound { name: name.to_string() })
    }

    fn list_collections(&self) -> Vec<String> {
        let collections = self.collections.read().unwrap();
        let mut names: Vec<String> = collections.keys().cloned().collect();
        names.sort();
        names
    }

    fn count(&self, collection: &str) -> Result<usize> {
        let collections = self.collections.read().unwrap();
        collections
            .get(collection)
            .map(|features| features.len())
            .ok_or_else(|| ChainageError::CollectionNotFound { name: collection.to_string() })
    }

    fn add_feature(&self, collection: &str, mut feature: Feature) -> Result<FeatureId> {
        let mut collections = self.collections.write().unwrap();
        let features = collections
            .get_mut(collection)
            .ok_or_else(|| ChainageError::CollectionNotFound { name: collection.to_string() })?;

        let mut next_id = self.next_id.write().unwrap();
        if features.contains_key(&feature.id) {
            feature.id = FeatureId(*next_id);
        }
        // Keep the counter ahead of every ID ever stored
        *next_id = (*next_id).max(feature.id.0 + 1);

        let id = feature.id;
        features.insert(id, feature);
        Ok(id)
    }

    fn insert_features(&self, collection: &str, features: Vec<Feature>) -> Result<Vec<FeatureId>> {
        let mut ids = Vec::with_capacity(features.len());
        for feature in features {
            ids.push(self.add_feature(collection, feature)?);
        }
        Ok(ids)
    }

    fn feature(&self, collection: &str, id: FeatureId) -> Result<Feature> {
        let collections = self.collections.read().unwrap();
        let features = collections
            .get(collection)
            .ok_or_else(|| ChainageError::CollectionNotFound { name: collection.to_string() })?;
        features
            .get(&id)
            .cloned()
            .ok_or_else(|| ChainageError::FeatureNotFound { collection: collection.to_string(), id: id.0 })
    }

    fn features(&self, collection: &str) -> Result<Vec<Feature>> {
        let collections = self.collections.read().unwrap();
        let features = collections
            .get(collection)
            .ok_or_else(|| ChainageError::CollectionNotFound { name: collection.to_string() })?;
        let mut snapshot: Vec<Feature> = features.values().cloned().collect();
        snapshot.sort_by_key(|feature| feature.id);
        Ok(snapshot)
    }

    fn set_attribute(
        &self,
        collection: &str,
        id: FeatureId,
        field: &str,
        value: serde_json::Value,
    ) -> Result<()> {
        let mut collections = self.collections.write().unwrap();
        let features = collections
            .get_mut(collection)
            .ok_or_else(|| ChainageError::CollectionNotFound { name: collection.to_string() })?;
        let feature = features.get_mut(&id).ok_or_else(|| ChainageError::FeatureNotFound {
            collection: collection.to_string(),
            id: id.0,
        })?;
        feature.set_attribute(field, value);
        Ok(())
    }

    fn delete_feature(&self, collection: &str, id: FeatureId) -> Result<()> {
        let mut collections = self.collections.write().unwrap();
        let features = collections
            .get_mut(collection)
            .ok_or_else(|| ChainageError::CollectionNotFound { name: collection.to_string() })?;
        features
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| ChainageError::FeatureNotFound { collection: collection.to_string(), id: id.0 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainage_core::models::Geometry;

    fn point_feature(id: u64, x: f64, y: f64) -> Feature {
        Feature::new(FeatureId(id), Geometry::point(x, y), 4326)
    }

    #[test]
    fn test_create_and_delete_collection() {
        let store = MemoryStore::new();
        assert!(!store.collection_exists("points"));

        store.create_collection("points").unwrap();
        assert!(store.collection_exists("points"));
        assert_eq!(store.count("points").unwrap(), 0);

        store.delete_collection("points").unwrap();
        assert!(!store.collection_exists("points"));
    }

    #[test]
    fn test_create_duplicate_collection_fails() {
        let store = MemoryStore::new();
        store.create_collection("points").unwrap();
        let err = store.create_collection("points").unwrap_err();
        assert!(matches!(err, ChainageError::CollectionExists { .. }));
    }

    #[test]
    fn test_delete_missing_collection_fails() {
        let store = MemoryStore::new();
        let err = store.delete_collection("nope").unwrap_err();
        assert!(matches!(err, ChainageError::CollectionNotFound { .. }));
    }

    #[test]
    fn test_feature_keeps_free_id_and_reassigns_taken_id() {
        let store = MemoryStore::new();
        store.create_collection("points").unwrap();

        let first = store.add_feature("points", point_feature(7, 0.0, 0.0)).unwrap();
        assert_eq!(first, FeatureId(7));

        // Same ID again: a fresh one comes back, above anything stored so far
        let second = store.add_feature("points", point_feature(7, 1.0, 1.0)).unwrap();
        assert_eq!(second, FeatureId(8));
        assert_eq!(store.count("points").unwrap(), 2);
    }

    #[test]
    fn test_ids_are_not_reused_across_collections() {
        let store = MemoryStore::new();
        store.create_collection("a").unwrap();
        store.create_collection("b").unwrap();

        store.add_feature("a", point_feature(3, 0.0, 0.0)).unwrap();
        // Collection "b" is empty, but the counter already moved past 3
        let id = store.add_feature("b", point_feature(3, 0.0, 0.0)).unwrap();
        assert_eq!(id, FeatureId(3));

        let reassigned = store.add_feature("b", point_feature(3, 1.0, 1.0)).unwrap();
        assert_eq!(reassigned, FeatureId(4));
    }

    #[test]
    fn test_features_snapshot_is_ascending_by_id() {
        let store = MemoryStore::new();
        store.create_collection("points").unwrap();
        for id in [9u64, 2, 5, 1] {
            store.add_feature("points", point_feature(id, id as f64, 0.0)).unwrap();
        }

        let ids: Vec<u64> = store.features("points").unwrap().iter().map(|f| f.id.0).collect();
        assert_eq!(ids, vec![1, 2, 5, 9]);
    }

    #[test]
    fn test_set_attribute_persists() {
        let store = MemoryStore::new();
        store.create_collection("points").unwrap();
        let id = store.add_feature("points", point_feature(1, 0.0, 0.0)).unwrap();

        store.set_attribute("points", id, "STATIONING", serde_json::json!("00+92")).unwrap();
        let feature = store.feature("points", id).unwrap();
        assert_eq!(feature.text("STATIONING"), Some("00+92"));
    }

    #[test]
    fn test_set_attribute_on_missing_feature_fails() {
        let store = MemoryStore::new();
        store.create_collection("points").unwrap();
        let err = store
            .set_attribute("points", FeatureId(42), "STATIONING", serde_json::json!("00+00"))
            .unwrap_err();
        assert!(matches!(err, ChainageError::FeatureNotFound { .. }));
    }

    #[test]
    fn test_replace_collection_empties_existing() {
        let store = MemoryStore::new();
        store.create_collection("points").unwrap();
        store.add_feature("points", point_feature(1, 0.0, 0.0)).unwrap();

        store.replace_collection("points").unwrap();
        assert_eq!(store.count("points").unwrap(), 0);

        // Also works when the collection never existed
        store.replace_collection("fresh").unwrap();
        assert!(store.collection_exists("fresh"));
    }

    #[test]
    fn test_clones_share_state() {
        let store = MemoryStore::new();
        store.create_collection("points").unwrap();

        let clone = store.clone();
        clone.add_feature("points", point_feature(1, 0.0, 0.0)).unwrap();
        assert_eq!(store.count("points").unwrap(), 1);
    }

    #[test]
    fn test_delete_features_bulk() {
        let store = MemoryStore::new();
        store.create_collection("points").unwrap();
        for id in 1..=4u64 {
            store.add_feature("points", point_feature(id, 0.0, 0.0)).unwrap();
        }

        let deleted =
            store.delete_features("points", &[FeatureId(2), FeatureId(4)]).unwrap();
        assert_eq!(deleted, 2);
        let ids: Vec<u64> = store.features("points").unwrap().iter().map(|f| f.id.0).collect();
        assert_eq!(ids, vec![1, 3]);
    }
}
