//! Boundary Feature Module
//! Pulls feature names out of TopoJSON topologies and GeoJSON collections.
//! Geometry is left to the renderer; only identity matters here.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::trace;

#[derive(Error, Debug)]
pub enum GeoError {
    #[error("Invalid boundary JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Topology has no object '{0}'")]
    MissingObject(String),
    #[error("Boundary file has no named features")]
    NoFeatures,
}

/// A named boundary feature.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoFeature {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
}

impl GeoFeature {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum BoundaryDocument {
    Topology {
        objects: IndexMap<String, TopoObject>,
    },
    FeatureCollection {
        features: Vec<RawFeature>,
    },
}

#[derive(Debug, Deserialize)]
struct TopoObject {
    #[serde(default)]
    geometries: Vec<RawFeature>,
}

#[derive(Debug, Deserialize)]
struct RawFeature {
    #[serde(default)]
    id: Option<serde_json::Value>,
    #[serde(default)]
    properties: Option<Properties>,
}

#[derive(Debug, Default, Deserialize)]
struct Properties {
    #[serde(default)]
    name: Option<String>,
    #[serde(default, rename = "NAME")]
    name_upper: Option<String>,
}

impl RawFeature {
    fn into_feature(self) -> Option<GeoFeature> {
        let props = self.properties.unwrap_or_default();
        let name = props
            .name
            .or(props.name_upper)
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())?;
        let id = self.id.map(|v| match v {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        });
        Some(GeoFeature { id, name })
    }
}

/// Parse a boundary file.
///
/// `object` names the topology object holding the features (the first one
/// when `None`); it is ignored for GeoJSON.
pub fn parse_boundaries(bytes: &[u8], object: Option<&str>) -> Result<Vec<GeoFeature>, GeoError> {
    let raw = match serde_json::from_slice::<BoundaryDocument>(bytes)? {
        BoundaryDocument::FeatureCollection { features } => features,
        BoundaryDocument::Topology { mut objects } => {
            let picked = match object {
                Some(name) => objects.shift_remove(name),
                None => objects.shift_remove_index(0).map(|(_, v)| v),
            };
            picked
                .ok_or_else(|| GeoError::MissingObject(object.unwrap_or("<first>").to_string()))?
                .geometries
        }
    };

    let total = raw.len();
    let features: Vec<GeoFeature> = raw.into_iter().filter_map(RawFeature::into_feature).collect();
    if features.is_empty() {
        return Err(GeoError::NoFeatures);
    }
    trace!(total, named = features.len(), "parsed boundary features");
    Ok(features)
}
