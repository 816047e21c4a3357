//! GeoJSON file adapter.
//!
//! Reads FeatureCollections into store collections and writes store
//! collections back out. Coordinates are strictly planar 2D; a geometry the
//! engine cannot represent (a third ordinate, a GeometryCollection) fails the
//! read rather than being silently reshaped. Features without any geometry
//! are skipped with a log message.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use tracing::debug;

use chainage_core::error::{ChainageError, Result};
use chainage_core::models::{Feature, FeatureId, Geometry};

use crate::ports::FeatureStore;

/// A parsed GeoJSON FeatureCollection
#[derive(Debug, Clone)]
pub struct GeoJsonCollection {
    /// Features in file order
    pub features: Vec<Feature>,
    /// EPSG code from the `crs` member, defaulting to 4326
    pub crs: u32,
}

/// Read a GeoJSON FeatureCollection from a file.
///
/// Feature IDs come from the GeoJSON `id` member where it is a non-negative
/// integer; otherwise the feature takes its array index.
pub fn read_collection(path: &Path) -> Result<GeoJsonCollection> {
    let content = fs::read_to_string(path)?;

    let geojson: geojson::GeoJson = content.parse().map_err(|e| {
        ChainageError::Serialization(format!("failed to parse {} as GeoJSON: {}", path.display(), e))
    })?;

    let collection = match geojson {
        geojson::GeoJson::FeatureCollection(fc) => fc,
        geojson::GeoJson::Feature(_) => {
            return Err(ChainageError::GeometryType {
                expected: "FeatureCollection".to_string(),
                found: "Feature".to_string(),
            })
        }
        geojson::GeoJson::Geometry(_) => {
            return Err(ChainageError::GeometryType {
                expected: "FeatureCollection".to_string(),
                found: "Geometry".to_string(),
            })
        }
    };

    // CRS comes from the legacy foreign member; absent means WGS 84
    let crs = collection
        .foreign_members
        .as_ref()
        .and_then(|fm| fm.get("crs"))
        .and_then(extract_epsg_from_crs)
        .unwrap_or(4326);

    let mut features = Vec::with_capacity(collection.features.len());
    for (idx, gj_feature) in collection.features.into_iter().enumerate() {
        let Some(gj_geometry) = gj_feature.geometry else {
            debug!(file = %path.display(), index = idx, "skipping feature without geometry");
            continue;
        };

        let geometry_json = serde_json::to_value(&gj_geometry)?;
        let geometry = Geometry::from_geojson(&geometry_json).ok_or_else(|| {
            ChainageError::InvalidGeometry {
                location: format!("{} feature {}", path.display(), idx),
                reason: "geometry is not a planar 2D type".to_string(),
            }
        })?;

        let id = match gj_feature.id {
            Some(geojson::feature::Id::Number(n)) => n.as_u64().map(FeatureId),
            _ => None,
        }
        .unwrap_or(FeatureId(idx as u64));

        let attributes: HashMap<String, serde_json::Value> = gj_feature
            .properties
            .map(|props| props.into_iter().collect())
            .unwrap_or_default();

        features.push(Feature::with_attributes(id, geometry, attributes, crs));
    }

    Ok(GeoJsonCollection { features, crs })
}

/// Write features as a GeoJSON FeatureCollection.
///
/// A `crs` foreign member is written for anything other than EPSG:4326, which
/// GeoJSON implies.
pub fn write_collection(path: &Path, features: &[Feature], crs: u32) -> Result<()> {
    let gj_features: Vec<serde_json::Value> = features
        .iter()
        .map(|feature| {
            let properties: serde_json::Map<String, serde_json::Value> =
                feature.attributes.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
            serde_json::json!({
                "type": "Feature",
                "id": feature.id.0,
                "geometry": feature.geometry.to_geojson(),
                "properties": properties,
            })
        })
        .collect();

    let mut document = serde_json::json!({
        "type": "FeatureCollection",
        "features": gj_features,
    });
    if crs != 4326 {
        if let Some(obj) = document.as_object_mut() {
            obj.insert(
                "crs".to_string(),
                serde_json::json!({
                    "type": "name",
                    "properties": { "name": format!("EPSG:{}", crs) },
                }),
            );
        }
    }

    fs::write(path, serde_json::to_string_pretty(&document)?)?;
    Ok(())
}

/// Load a GeoJSON file into a store collection, replacing any prior contents.
/// Returns the number of features loaded.
pub fn load_into_store<S: FeatureStore + ?Sized>(
    store: &S,
    collection: &str,
    path: &Path,
) -> Result<usize> {
    let parsed = read_collection(path)?;
    store.replace_collection(collection)?;
    let count = parsed.features.len();
    store.insert_features(collection, parsed.features)?;
    debug!(collection, count, file = %path.display(), "loaded GeoJSON collection");
    Ok(count)
}

/// Write a store collection to a GeoJSON file. Returns the number of
/// features written.
pub fn export_from_store<S: FeatureStore + ?Sized>(
    store: &S,
    collection: &str,
    path: &Path,
) -> Result<usize> {
    let features = store.features(collection)?;
    let crs = features.first().map(|f| f.crs).unwrap_or(4326);
    write_collection(path, &features, crs)?;
    debug!(collection, count = features.len(), file = %path.display(), "wrote GeoJSON collection");
    Ok(features.len())
}

/// Extract an EPSG code from a legacy GeoJSON CRS object
fn extract_epsg_from_crs(crs: &serde_json::Value) -> Option<u32> {
    // Parse "EPSG:2276" or "urn:ogc:def:crs:EPSG::2276"
    let name = crs.get("properties")?.get("name")?.as_str()?;
    name.split(':').next_back()?.parse().ok()
}
