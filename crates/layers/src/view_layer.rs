use foundation::ids::LayerId;
use runtime::Atom;
use serde::Deserialize;

use crate::layer::DatasetFormat;

/// Parameters shared by every view layer.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewLayerModelParams {
    #[serde(default)]
    pub id: Option<LayerId>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub format: Option<DatasetFormat>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub version: Option<u32>,
}

/// State every view layer carries, regardless of its type.
#[derive(Debug, Clone)]
pub struct ViewLayerModel {
    pub id: LayerId,
    pub title_atom: Atom<Option<String>>,
    pub hidden_atom: Atom<bool>,
    /// Id the rendering widget assigned once the data loaded.
    pub layer_id_atom: Atom<Option<String>>,
    pub format: Option<DatasetFormat>,
    pub url: Option<String>,
    pub version: Option<u32>,
}

pub fn create_view_layer_model(params: &ViewLayerModelParams) -> ViewLayerModel {
    ViewLayerModel {
        id: params.id.clone().unwrap_or_else(LayerId::generate),
        title_atom: Atom::labeled("titleAtom", params.title.clone()),
        hidden_atom: Atom::labeled("hiddenAtom", params.hidden),
        layer_id_atom: Atom::labeled("layerIdAtom", None),
        format: params.format,
        url: params.url.clone(),
        version: params.version,
    }
}
