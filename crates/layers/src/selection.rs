use foundation::ids::LayerId;
use serde::{Deserialize, Serialize};

/// What a screen-space selection points at.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SelectionKind {
    #[serde(rename = "TILESET_FEATURE")]
    TilesetFeature,
}

/// Something picked in screen space, attributed to the layer it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenSpaceSelectionEntry {
    #[serde(rename = "type")]
    pub kind: SelectionKind,
    pub key: String,
    pub layer_id: LayerId,
}

impl ScreenSpaceSelectionEntry {
    pub fn tileset_feature(layer_id: LayerId, key: impl Into<String>) -> Self {
        Self {
            kind: SelectionKind::TilesetFeature,
            key: key.into(),
            layer_id,
        }
    }
}

/// Builds the selection list for one layer, dropping duplicate keys while
/// keeping first-seen order.
pub fn selections_for<I, S>(layer_id: &LayerId, keys: I) -> Vec<ScreenSpaceSelectionEntry>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut out: Vec<ScreenSpaceSelectionEntry> = Vec::new();
    for key in keys {
        let key = key.into();
        if out.iter().any(|s| s.key == key) {
            continue;
        }
        out.push(ScreenSpaceSelectionEntry::tileset_feature(layer_id.clone(), key));
    }
    out
}
