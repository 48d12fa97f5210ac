use std::rc::Rc;

use foundation::ids::{CellId, LayerId};
use runtime::{Atom, EffectSlot, ReadAtom, Scheduler};
use serde::Deserialize;
use tracing::debug;

use crate::component::ComponentAtom;
use crate::container::{BuildingModelLayerContainerProps, LoadHandler};
use crate::feature::{FeatureIndex, SearchedFeatures, TilesetProperty};
use crate::layer::{DatasetFormat, Layer, LayerType};
use crate::selection::ScreenSpaceSelectionEntry;
use crate::symbology::{ColorMap, ColorScheme};
use crate::tileset::{TilesetLayerState, TilesetLayerStateParams, create_tileset_layer_state};
use crate::view_layer::{ViewLayerModel, ViewLayerModelParams, create_view_layer_model};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildingLayerModelParams {
    #[serde(flatten)]
    pub view: ViewLayerModelParams,
    #[serde(flatten)]
    pub tileset: TilesetLayerStateParams,
    pub municipality_code: String,
    pub title: String,
    #[serde(default)]
    pub textured: Option<bool>,
}

impl BuildingLayerModelParams {
    pub fn new(municipality_code: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            view: ViewLayerModelParams::default(),
            tileset: TilesetLayerStateParams::default(),
            municipality_code: municipality_code.into(),
            title: title.into(),
            textured: None,
        }
    }
}

/// Municipal building-model layer.
///
/// Composed from the generic view-layer state, the tileset-layer state and
/// the building's own fields. Cells are allocated here once and never replaced.
#[derive(Debug, Clone)]
pub struct BuildingLayerModel {
    pub view: ViewLayerModel,
    pub tileset: TilesetLayerState,
    pub municipality_code: String,
    pub title: String,
    pub textured: bool,
    // Not forwarded to the widget yet; it has no wireframe input.
    pub show_wireframe_atom: Atom<bool>,
}

pub fn create_building_layer(params: &BuildingLayerModelParams) -> BuildingLayerModel {
    let view = create_view_layer_model(&ViewLayerModelParams {
        title: Some(params.title.clone()),
        ..params.view.clone()
    });
    BuildingLayerModel {
        view,
        tileset: create_tileset_layer_state(&params.tileset),
        municipality_code: params.municipality_code.clone(),
        title: params.title.clone(),
        textured: params.textured.unwrap_or(false),
        show_wireframe_atom: Atom::labeled("showWireframeAtom", false),
    }
}

impl Layer for BuildingLayerModel {
    fn id(&self) -> &LayerId {
        &self.view.id
    }

    fn layer_type(&self) -> LayerType {
        LayerType::Building
    }
}

impl BuildingLayerModel {
    /// Props for the view, taken straight from the model.
    pub fn props(&self) -> BuildingLayerProps {
        let v = &self.view;
        let t = &self.tileset;
        BuildingLayerProps {
            id: v.id.clone(),
            format: v.format,
            url: v.url.clone(),
            title: Some(self.title.clone()),
            textured: self.textured,
            version: v.version,
            title_atom: v.title_atom.clone(),
            hidden_atom: v.hidden_atom.clone(),
            layer_id_atom: v.layer_id_atom.clone(),
            feature_index_atom: t.feature_index_atom.clone(),
            hidden_features_atom: t.hidden_features_atom.clone(),
            searched_features_atom: t.searched_features_atom.clone(),
            properties_atom: t.properties_atom.clone(),
            color_property_atom: t.color_property_atom.clone(),
            color_scheme_atom: t.color_scheme_atom.clone(),
            color_map_atom: t.color_map_atom.clone(),
            color_range_atom: t.color_range_atom.clone(),
            selections: t.selections.clone(),
            component_atoms: t.component_atoms.clone(),
            show_wireframe_atom: self.show_wireframe_atom.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BuildingLayerProps {
    pub id: LayerId,
    pub format: Option<DatasetFormat>,
    pub url: Option<String>,
    pub title: Option<String>,
    pub textured: bool,
    pub version: Option<u32>,
    pub title_atom: Atom<Option<String>>,
    pub hidden_atom: Atom<bool>,
    pub layer_id_atom: Atom<Option<String>>,
    pub feature_index_atom: Atom<Option<FeatureIndex>>,
    pub hidden_features_atom: Atom<Option<Vec<String>>>,
    pub searched_features_atom: Atom<Option<SearchedFeatures>>,
    pub properties_atom: Atom<Option<Vec<TilesetProperty>>>,
    pub color_property_atom: Atom<Option<String>>,
    pub color_scheme_atom: ReadAtom<Option<ColorScheme>>,
    pub color_map_atom: Atom<ColorMap>,
    pub color_range_atom: Atom<[f64; 2]>,
    pub selections: Atom<Vec<ScreenSpaceSelectionEntry>>,
    pub component_atoms: Option<Vec<ComponentAtom>>,
    pub show_wireframe_atom: Atom<bool>,
}

/// Mounted building view.
///
/// Holds only what must survive between renders: the last title the title
/// effect saw and the load handler, which keeps its identity for as long as
/// the layer-id cell stays the same.
#[derive(Default)]
pub struct BuildingLayer {
    title_effect: EffectSlot<Option<String>>,
    load_handler: Option<(CellId, LoadHandler)>,
}

impl std::fmt::Debug for BuildingLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildingLayer")
            .field("title", &self.title_effect.deps())
            .finish_non_exhaustive()
    }
}

impl BuildingLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Renders the layer: the tileset widget's props, or `None` when there is
    /// nothing to draw (no url, or a format this layer cannot render).
    ///
    /// Reads `hidden_atom`; every other cell is forwarded untouched. The title
    /// cell is synced through an effect that runs on the next flush.
    pub fn render(
        &mut self,
        props: &BuildingLayerProps,
        scheduler: &mut Scheduler,
    ) -> Option<BuildingModelLayerContainerProps> {
        let title_atom = props.title_atom.clone();
        let title = props.title.clone();
        self.title_effect
            .schedule_if_changed(&props.title, scheduler, "building.title", move || {
                title_atom.set(title);
            });

        let hidden = props.hidden_atom.get();
        let on_load = self.load_handler(&props.layer_id_atom);

        let url = match props.url.as_deref() {
            Some(url) if !url.is_empty() => url,
            _ => {
                debug!(layer = %props.id, "no url, nothing to render");
                return None;
            }
        };

        match props.format {
            Some(DatasetFormat::Cesium3DTiles) => Some(BuildingModelLayerContainerProps {
                id: props.id.clone(),
                url: url.to_string(),
                on_load,
                layer_id_atom: props.layer_id_atom.clone(),
                hidden,
                textured: props.textured,
                feature_index_atom: props.feature_index_atom.clone(),
                hidden_features_atom: props.hidden_features_atom.clone(),
                properties_atom: props.properties_atom.clone(),
                color_property_atom: props.color_property_atom.clone(),
                color_scheme_atom: props.color_scheme_atom.clone(),
                color_map_atom: props.color_map_atom.clone(),
                color_range_atom: props.color_range_atom.clone(),
                searched_features_atom: props.searched_features_atom.clone(),
                selections: props.selections.clone(),
                version: props.version.unwrap_or(0),
                component_atoms: props.component_atoms.clone().unwrap_or_default(),
            }),
            Some(
                DatasetFormat::Czml
                | DatasetFormat::GeoJson
                | DatasetFormat::Gltf
                | DatasetFormat::Mvt
                | DatasetFormat::Wms
                | DatasetFormat::Unknown,
            )
            | None => {
                debug!(layer = %props.id, format = ?props.format, "unsupported format, nothing to render");
                None
            }
        }
    }

    fn load_handler(&mut self, layer_id_atom: &Atom<Option<String>>) -> LoadHandler {
        if let Some((cell, handler)) = &self.load_handler {
            if *cell == layer_id_atom.id() {
                return Rc::clone(handler);
            }
        }
        let atom = layer_id_atom.clone();
        let handler: LoadHandler = Rc::new(move |layer_id: &str| {
            atom.set(Some(layer_id.to_string()));
        });
        self.load_handler = Some((layer_id_atom.id(), Rc::clone(&handler)));
        handler
    }
}
