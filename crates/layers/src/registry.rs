use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use foundation::ids::LayerId;
use runtime::{EventKind, Scheduler, Subscription};
use serde::Deserialize;
use tracing::{debug, info};

use crate::building::{BuildingLayer, BuildingLayerModel, BuildingLayerModelParams, create_building_layer};
use crate::container::BuildingModelLayerContainerProps;
use crate::layer::{Layer, LayerType};
use crate::selection::selections_for;

/// Construction parameters for any layer variant, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum LayerParams {
    #[serde(rename = "building")]
    Building(BuildingLayerModelParams),
}

#[derive(Debug, Clone)]
pub enum LayerModel {
    Building(BuildingLayerModel),
}

impl Layer for LayerModel {
    fn id(&self) -> &LayerId {
        match self {
            LayerModel::Building(m) => m.id(),
        }
    }

    fn layer_type(&self) -> LayerType {
        match self {
            LayerModel::Building(m) => m.layer_type(),
        }
    }
}

impl LayerModel {
    pub fn create(params: &LayerParams) -> Self {
        match params {
            LayerParams::Building(p) => LayerModel::Building(create_building_layer(p)),
        }
    }

    pub fn as_building(&self) -> Option<&BuildingLayerModel> {
        match self {
            LayerModel::Building(m) => Some(m),
        }
    }
}

/// What a layer view handed to the renderer.
#[derive(Debug, Clone)]
pub enum LayerElement {
    BuildingModel(BuildingModelLayerContainerProps),
}

#[derive(Debug, Clone)]
pub struct RenderedLayer {
    pub id: LayerId,
    pub element: Option<LayerElement>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    DuplicateLayer(LayerId),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::DuplicateLayer(id) => write!(f, "layer already exists: {id}"),
        }
    }
}

impl std::error::Error for RegistryError {}

#[derive(Debug)]
enum LayerView {
    Building(BuildingLayer),
}

struct Mount {
    model: LayerModel,
    view: LayerView,
    title: Option<String>,
    dirty: Rc<Cell<bool>>,
    element: Option<LayerElement>,
    _subscriptions: Vec<Subscription>,
}

impl Mount {
    fn new(model: LayerModel) -> Self {
        let dirty = Rc::new(Cell::new(true));
        let (view, title, subscriptions) = match &model {
            LayerModel::Building(m) => {
                let flag = Rc::clone(&dirty);
                let sub = m.view.hidden_atom.subscribe(move || flag.set(true));
                (
                    LayerView::Building(BuildingLayer::new()),
                    Some(m.title.clone()),
                    vec![sub],
                )
            }
        };
        Self {
            model,
            view,
            title,
            dirty,
            element: None,
            _subscriptions: subscriptions,
        }
    }

    fn render(&mut self, scheduler: &mut Scheduler) -> Option<LayerElement> {
        match (&self.model, &mut self.view) {
            (LayerModel::Building(model), LayerView::Building(view)) => {
                let mut props = model.props();
                props.title = self.title.clone();
                view.render(&props, scheduler).map(LayerElement::BuildingModel)
            }
        }
    }
}

/// Owns the scene's layers: creates their state, mounts their views and
/// re-renders them when a cell they read changes.
///
/// Ordering contract:
/// - `layers()` and `render()` follow insertion order.
#[derive(Default)]
pub struct LayerRegistry {
    mounts: Vec<Mount>,
}

impl LayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_layer(&mut self, params: &LayerParams) -> Result<LayerId, RegistryError> {
        let model = LayerModel::create(params);
        let id = model.id().clone();
        if self.position(&id).is_some() {
            return Err(RegistryError::DuplicateLayer(id));
        }
        info!(layer = %id, kind = %model.layer_type(), "add layer");
        self.mounts.push(Mount::new(model));
        Ok(id)
    }

    pub fn remove_layer(&mut self, id: &LayerId) -> bool {
        let Some(pos) = self.position(id) else {
            return false;
        };
        info!(layer = %id, "remove layer");
        self.mounts.remove(pos);
        true
    }

    pub fn len(&self) -> usize {
        self.mounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mounts.is_empty()
    }

    pub fn layer(&self, id: &LayerId) -> Option<&LayerModel> {
        self.mount(id).map(|m| &m.model)
    }

    pub fn layers(&self) -> impl Iterator<Item = &LayerModel> + '_ {
        self.mounts.iter().map(|m| &m.model)
    }

    /// Last element rendered for `id`, if any.
    pub fn element(&self, id: &LayerId) -> Option<&LayerElement> {
        self.mount(id).and_then(|m| m.element.as_ref())
    }

    pub fn set_hidden(&self, id: &LayerId, hidden: bool) -> bool {
        let Some(mount) = self.mount(id) else {
            return false;
        };
        match &mount.model {
            LayerModel::Building(m) => {
                m.view.hidden_atom.set(hidden);
            }
        }
        true
    }

    /// Changes the title handed to the view; the title cell follows after
    /// the next render and flush.
    pub fn rename_layer(&mut self, id: &LayerId, title: Option<String>) -> bool {
        let Some(pos) = self.position(id) else {
            return false;
        };
        let mount = &mut self.mounts[pos];
        if mount.title != title {
            mount.title = title;
            mount.dirty.set(true);
        }
        true
    }

    /// Replaces the selection list of one layer.
    pub fn select_features<I, S>(&self, id: &LayerId, keys: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let Some(mount) = self.mount(id) else {
            return false;
        };
        match &mount.model {
            LayerModel::Building(m) => {
                m.tileset.selections.set(selections_for(id, keys));
            }
        }
        true
    }

    /// Resolves the id a rendering widget reported on load back to the layer.
    pub fn find_by_layer_id(&self, layer_id: &str) -> Option<&LayerId> {
        self.mounts.iter().map(|m| &m.model).find_map(|model| match model {
            LayerModel::Building(b) => b
                .view
                .layer_id_atom
                .with(|v| v.as_deref() == Some(layer_id))
                .then(|| b.id()),
        })
    }

    /// Delivers a load notification the way the widget would, through the
    /// callback of the last rendered element. Returns `false` if the layer
    /// has no rendered element.
    pub fn notify_loaded(&self, id: &LayerId, layer_id: &str, scheduler: &mut Scheduler) -> bool {
        let Some(element) = self.element(id) else {
            return false;
        };
        match element {
            LayerElement::BuildingModel(props) => (props.on_load)(layer_id),
        }
        scheduler.emit(EventKind::Load, format!("{id}={layer_id}"));
        true
    }

    /// Re-renders every layer whose view is dirty and returns their new output.
    pub fn render(&mut self, scheduler: &mut Scheduler) -> Vec<RenderedLayer> {
        let mut out = Vec::new();
        for mount in &mut self.mounts {
            if !mount.dirty.replace(false) {
                continue;
            }
            let element = mount.render(scheduler);
            let id = mount.model.id().clone();
            let kind = if element.is_some() {
                EventKind::Render
            } else {
                EventKind::Skip
            };
            debug!(layer = %id, rendered = element.is_some(), "render layer");
            scheduler.emit(kind, id.as_str());
            mount.element = element.clone();
            out.push(RenderedLayer { id, element });
        }
        out
    }

    fn position(&self, id: &LayerId) -> Option<usize> {
        self.mounts.iter().position(|m| m.model.id() == id)
    }

    fn mount(&self, id: &LayerId) -> Option<&Mount> {
        self.mounts.iter().find(|m| m.model.id() == id)
    }
}

impl fmt::Debug for LayerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.mounts.iter().map(|m| m.model.id()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{LayerElement, LayerParams, LayerRegistry, RegistryError};
    use crate::building::BuildingLayerModelParams;
    use crate::layer::{DatasetFormat, Layer};
    use crate::view_layer::ViewLayerModelParams;
    use foundation::ids::LayerId;
    use runtime::{EventKind, Scheduler};

    fn building(id: &str, url: Option<&str>) -> LayerParams {
        let mut p = BuildingLayerModelParams::new("13101", format!("{id} title"));
        p.view = ViewLayerModelParams {
            id: Some(LayerId::new(id)),
            format: Some(DatasetFormat::Cesium3DTiles),
            url: url.map(str::to_string),
            ..Default::default()
        };
        LayerParams::Building(p)
    }

    fn rendered_ids(reg: &mut LayerRegistry, sched: &mut Scheduler) -> Vec<String> {
        reg.render(sched)
            .into_iter()
            .map(|r| r.id.as_str().to_string())
            .collect()
    }

    #[test]
    fn add_rejects_duplicate_ids() {
        let mut reg = LayerRegistry::new();
        reg.add_layer(&building("a", Some("u"))).unwrap();
        assert_eq!(
            reg.add_layer(&building("a", Some("u"))),
            Err(RegistryError::DuplicateLayer(LayerId::new("a")))
        );
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn first_render_covers_all_layers_in_insertion_order() {
        let mut reg = LayerRegistry::new();
        let mut sched = Scheduler::new();
        reg.add_layer(&building("b", Some("u"))).unwrap();
        reg.add_layer(&building("a", None)).unwrap();

        let out = reg.render(&mut sched);
        assert_eq!(out.len(), 2);
        assert!(out[0].element.is_some());
        assert!(out[1].element.is_none());
        assert_eq!(sched.bus().messages(EventKind::Render), vec!["b"]);
        assert_eq!(sched.bus().messages(EventKind::Skip), vec!["a"]);
    }

    #[test]
    fn only_dirty_layers_rerender() {
        let mut reg = LayerRegistry::new();
        let mut sched = Scheduler::new();
        let a = reg.add_layer(&building("a", Some("u"))).unwrap();
        reg.add_layer(&building("b", Some("u"))).unwrap();
        reg.render(&mut sched);
        assert!(rendered_ids(&mut reg, &mut sched).is_empty());

        assert!(reg.set_hidden(&a, true));
        assert_eq!(rendered_ids(&mut reg, &mut sched), vec!["a"]);
        match reg.element(&a).unwrap() {
            LayerElement::BuildingModel(props) => assert!(props.hidden),
        }
    }

    #[test]
    fn rename_flows_into_title_cell_after_flush() {
        let mut reg = LayerRegistry::new();
        let mut sched = Scheduler::new();
        let a = reg.add_layer(&building("a", Some("u"))).unwrap();
        reg.render(&mut sched);
        sched.flush();

        assert!(reg.rename_layer(&a, Some("Renamed".into())));
        assert_eq!(rendered_ids(&mut reg, &mut sched), vec!["a"]);
        sched.flush();
        let title = reg.layer(&a).unwrap().as_building().unwrap().view.title_atom.get();
        assert_eq!(title.as_deref(), Some("Renamed"));
    }

    #[test]
    fn load_notification_is_resolvable() {
        let mut reg = LayerRegistry::new();
        let mut sched = Scheduler::new();
        let a = reg.add_layer(&building("a", Some("u"))).unwrap();
        let b = reg.add_layer(&building("b", None)).unwrap();
        reg.render(&mut sched);

        assert!(reg.notify_loaded(&a, "prim-1", &mut sched));
        assert!(!reg.notify_loaded(&b, "prim-2", &mut sched));
        assert_eq!(reg.find_by_layer_id("prim-1"), Some(&a));
        assert_eq!(reg.find_by_layer_id("prim-2"), None);
        assert_eq!(sched.bus().messages(EventKind::Load), vec!["a=prim-1"]);
    }

    #[test]
    fn select_features_writes_layer_selection() {
        let mut reg = LayerRegistry::new();
        let a = reg.add_layer(&building("a", Some("u"))).unwrap();
        assert!(reg.select_features(&a, ["bldg_1", "bldg_2"]));
        let model = reg.layer(&a).unwrap().as_building().unwrap();
        assert_eq!(model.tileset.selections.get().len(), 2);
        assert!(!reg.select_features(&LayerId::new("missing"), ["x"]));
    }

    #[test]
    fn remove_releases_the_mount() {
        let mut reg = LayerRegistry::new();
        let a = reg.add_layer(&building("a", Some("u"))).unwrap();
        let hidden = reg.layer(&a).unwrap().as_building().unwrap().view.hidden_atom.clone();
        assert_eq!(hidden.listener_count(), 1);

        assert!(reg.remove_layer(&a));
        assert!(!reg.remove_layer(&a));
        assert!(reg.is_empty());
        assert_eq!(hidden.listener_count(), 0);
        assert!(reg.layer(&a).is_none());
        assert_eq!(reg.layers().count(), 0);
    }

    #[test]
    fn layer_params_are_tagged_by_type() {
        let p: LayerParams = serde_json::from_str(
            r#"{"type":"building","id":"x","municipalityCode":"27100","title":"Osaka"}"#,
        )
        .unwrap();
        let mut reg = LayerRegistry::new();
        let id = reg.add_layer(&p).unwrap();
        assert_eq!(id, LayerId::new("x"));
        assert_eq!(reg.layer(&id).unwrap().layer_type().as_str(), "BUILDING_LAYER");
    }
}
