use std::fmt;
use std::rc::Rc;

use foundation::ids::LayerId;
use runtime::{Atom, ReadAtom};
use serde::Serialize;

use crate::component::{ComponentAtom, ComponentKind, ComponentValue};
use crate::feature::{FeatureIndex, SearchedFeatures, TilesetProperty};
use crate::selection::ScreenSpaceSelectionEntry;
use crate::symbology::{ColorMap, ColorScheme};

/// Called by the rendering widget with the id it assigned to the loaded tileset.
pub type LoadHandler = Rc<dyn Fn(&str)>;

/// Everything the building tileset widget receives.
///
/// Cells are handed over by handle; the widget decides what to read and when.
#[derive(Clone)]
pub struct BuildingModelLayerContainerProps {
    pub id: LayerId,
    pub url: String,
    pub on_load: LoadHandler,
    pub layer_id_atom: Atom<Option<String>>,
    pub hidden: bool,
    pub textured: bool,
    pub feature_index_atom: Atom<Option<FeatureIndex>>,
    pub hidden_features_atom: Atom<Option<Vec<String>>>,
    pub properties_atom: Atom<Option<Vec<TilesetProperty>>>,
    pub color_property_atom: Atom<Option<String>>,
    pub color_scheme_atom: ReadAtom<Option<ColorScheme>>,
    pub color_map_atom: Atom<ColorMap>,
    pub color_range_atom: Atom<[f64; 2]>,
    pub searched_features_atom: Atom<Option<SearchedFeatures>>,
    pub selections: Atom<Vec<ScreenSpaceSelectionEntry>>,
    pub version: u32,
    pub component_atoms: Vec<ComponentAtom>,
}

impl fmt::Debug for BuildingModelLayerContainerProps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildingModelLayerContainerProps")
            .field("id", &self.id)
            .field("url", &self.url)
            .field("hidden", &self.hidden)
            .field("textured", &self.textured)
            .field("version", &self.version)
            .field("component_atoms", &self.component_atoms.len())
            .finish_non_exhaustive()
    }
}

/// Plain-value picture of container props, for logs and the CLI.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerSnapshot {
    pub id: LayerId,
    pub url: String,
    pub hidden: bool,
    pub textured: bool,
    pub version: u32,
    pub layer_id: Option<String>,
    pub feature_count: usize,
    pub hidden_features: Vec<String>,
    pub color_scheme: Option<ColorScheme>,
    pub searched_features: Option<SearchedFeatures>,
    pub selections: Vec<ScreenSpaceSelectionEntry>,
    pub components: Vec<ComponentSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentSnapshot {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ComponentKind,
    pub value: ComponentValue,
}

impl BuildingModelLayerContainerProps {
    pub fn snapshot(&self) -> ContainerSnapshot {
        ContainerSnapshot {
            id: self.id.clone(),
            url: self.url.clone(),
            hidden: self.hidden,
            textured: self.textured,
            version: self.version,
            layer_id: self.layer_id_atom.get(),
            feature_count: self
                .feature_index_atom
                .with(|idx| idx.as_ref().map_or(0, FeatureIndex::len)),
            hidden_features: self.hidden_features_atom.get().unwrap_or_default(),
            color_scheme: self.color_scheme_atom.get(),
            searched_features: self.searched_features_atom.get(),
            selections: self.selections.get(),
            components: self
                .component_atoms
                .iter()
                .map(|c| ComponentSnapshot {
                    id: c.id.clone(),
                    kind: c.kind,
                    value: c.value_atom.get(),
                })
                .collect(),
        }
    }
}
