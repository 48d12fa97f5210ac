use std::fmt;

use foundation::ids::LayerId;
use serde::{Deserialize, Serialize};

/// Closed set of layer variants the viewer knows how to render.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LayerType {
    #[serde(rename = "BUILDING_LAYER")]
    Building,
}

impl LayerType {
    pub fn as_str(self) -> &'static str {
        match self {
            LayerType::Building => "BUILDING_LAYER",
        }
    }
}

impl fmt::Display for LayerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Format of the dataset a layer points at.
///
/// Unrecognised strings deserialize to `Unknown` so scene files from newer
/// catalogs still load; such layers render nothing.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DatasetFormat {
    #[serde(rename = "3dtiles")]
    Cesium3DTiles,
    #[serde(rename = "czml")]
    Czml,
    #[serde(rename = "geojson")]
    GeoJson,
    #[serde(rename = "gltf")]
    Gltf,
    #[serde(rename = "mvt")]
    Mvt,
    #[serde(rename = "wms")]
    Wms,
    #[serde(rename = "unknown", other)]
    Unknown,
}

impl DatasetFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            DatasetFormat::Cesium3DTiles => "3dtiles",
            DatasetFormat::Czml => "czml",
            DatasetFormat::GeoJson => "geojson",
            DatasetFormat::Gltf => "gltf",
            DatasetFormat::Mvt => "mvt",
            DatasetFormat::Wms => "wms",
            DatasetFormat::Unknown => "unknown",
        }
    }
}

pub trait Layer {
    fn id(&self) -> &LayerId;
    fn layer_type(&self) -> LayerType;
}
