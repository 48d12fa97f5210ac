use runtime::{Atom, ReadAtom, batch, derive};
use serde::Deserialize;
use tracing::debug;

use crate::component::{ComponentAtom, ComponentSpec};
use crate::feature::{FeatureIndex, SearchedFeatures, TilesetProperty, TilesetPropertyKind};
use crate::selection::ScreenSpaceSelectionEntry;
use crate::symbology::{ColorMap, ColorScheme};

pub const DEFAULT_COLOR_RANGE: [f64; 2] = [0.0, 100.0];

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TilesetLayerStateParams {
    #[serde(default)]
    pub hidden_features: Option<Vec<String>>,
    #[serde(default)]
    pub color_property: Option<String>,
    /// Name of a built-in colour map; unknown names fall back to the default.
    #[serde(default)]
    pub color_map: Option<String>,
    #[serde(default)]
    pub color_range: Option<[f64; 2]>,
    #[serde(default)]
    pub components: Vec<ComponentSpec>,
}

/// Cells shared by every 3D-tiles backed layer.
#[derive(Debug, Clone)]
pub struct TilesetLayerState {
    pub feature_index_atom: Atom<Option<FeatureIndex>>,
    pub hidden_features_atom: Atom<Option<Vec<String>>>,
    pub searched_features_atom: Atom<Option<SearchedFeatures>>,
    pub properties_atom: Atom<Option<Vec<TilesetProperty>>>,
    pub color_property_atom: Atom<Option<String>>,
    pub color_map_atom: Atom<ColorMap>,
    pub color_range_atom: Atom<[f64; 2]>,
    pub color_scheme_atom: ReadAtom<Option<ColorScheme>>,
    pub selections: Atom<Vec<ScreenSpaceSelectionEntry>>,
    pub component_atoms: Option<Vec<ComponentAtom>>,
}

pub fn create_tileset_layer_state(params: &TilesetLayerStateParams) -> TilesetLayerState {
    let color_map = match params.color_map.as_deref() {
        Some(name) => ColorMap::by_name(name).unwrap_or_else(|| {
            debug!(color_map = name, "unknown color map, using default");
            ColorMap::default()
        }),
        None => ColorMap::default(),
    };

    let properties_atom = Atom::labeled("propertiesAtom", None);
    let color_property_atom = Atom::labeled("colorPropertyAtom", params.color_property.clone());
    let color_map_atom = Atom::labeled("colorMapAtom", color_map);
    let color_range_atom = Atom::labeled(
        "colorRangeAtom",
        params.color_range.unwrap_or(DEFAULT_COLOR_RANGE),
    );

    let color_scheme_atom = {
        let (properties, property, map, range) = (
            properties_atom.clone(),
            color_property_atom.clone(),
            color_map_atom.clone(),
            color_range_atom.clone(),
        );
        derive(
            "colorSchemeAtom",
            &[&properties_atom, &color_property_atom, &color_map_atom, &color_range_atom],
            move || compute_color_scheme(&properties, &property, &map, &range),
        )
    };

    let component_atoms = if params.components.is_empty() {
        None
    } else {
        Some(
            params
                .components
                .iter()
                .enumerate()
                .map(|(i, spec)| ComponentAtom::from_spec(i, spec))
                .collect(),
        )
    };

    TilesetLayerState {
        feature_index_atom: Atom::labeled("featureIndexAtom", None),
        hidden_features_atom: Atom::labeled("hiddenFeaturesAtom", params.hidden_features.clone()),
        searched_features_atom: Atom::labeled("searchedFeaturesAtom", None),
        properties_atom,
        color_property_atom,
        color_map_atom,
        color_range_atom,
        color_scheme_atom,
        selections: Atom::labeled("selections", Vec::new()),
        component_atoms,
    }
}

fn compute_color_scheme(
    properties: &Atom<Option<Vec<TilesetProperty>>>,
    property: &Atom<Option<String>>,
    map: &Atom<ColorMap>,
    range: &Atom<[f64; 2]>,
) -> Option<ColorScheme> {
    let name = property.get()?;
    let kind = properties.with(|props| {
        props
            .as_ref()
            .and_then(|ps| ps.iter().find(|p| p.name == name))
            .map(|p| p.kind.clone())
    });
    match kind {
        Some(TilesetPropertyKind::Qualitative { values }) => {
            Some(map.with(|m| ColorScheme::qualitative(name, &values, m)))
        }
        Some(TilesetPropertyKind::Number { .. } | TilesetPropertyKind::Text) | None => {
            Some(ColorScheme::Quantitative {
                property: name,
                color_map: map.get(),
                color_range: range.get(),
            })
        }
    }
}

impl TilesetLayerState {
    /// Switches the colouring property. For numeric properties the colour
    /// range follows the property's reported bounds. Both writes land in one
    /// batch, so the scheme is recomputed once.
    pub fn select_color_property(&self, name: Option<&str>) {
        batch(|| self.write_color_property(name));
    }

    fn write_color_property(&self, name: Option<&str>) {
        self.color_property_atom.set(name.map(str::to_string));
        if let Some(name) = name {
            let bounds = self.properties_atom.with(|props| {
                props.as_ref().and_then(|ps| {
                    ps.iter().find(|p| p.name == name).and_then(|p| match p.kind {
                        TilesetPropertyKind::Number { min, max } => Some([min, max]),
                        _ => None,
                    })
                })
            });
            if let Some(bounds) = bounds {
                self.color_range_atom.set(bounds);
            }
        }
    }

    /// `false` for features listed in the hidden set.
    pub fn is_feature_visible(&self, key: &str) -> bool {
        self.hidden_features_atom
            .with(|hidden| !hidden.as_ref().is_some_and(|h| h.iter().any(|k| k == key)))
    }
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_COLOR_RANGE, TilesetLayerStateParams, create_tileset_layer_state};
    use crate::component::{ComponentKind, ComponentSpec};
    use crate::feature::TilesetProperty;
    use crate::symbology::{ColorMap, ColorScheme};
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn defaults_without_params() {
        let s = create_tileset_layer_state(&TilesetLayerStateParams::default());
        assert_eq!(s.color_range_atom.get(), DEFAULT_COLOR_RANGE);
        assert_eq!(s.color_map_atom.get(), ColorMap::plateau());
        assert_eq!(s.color_scheme_atom.get(), None);
        assert!(s.selections.get().is_empty());
        assert!(s.component_atoms.is_none());
        assert!(s.feature_index_atom.get().is_none());
    }

    #[test]
    fn unknown_color_map_falls_back_to_default() {
        let s = create_tileset_layer_state(&TilesetLayerStateParams {
            color_map: Some("sepia".into()),
            ..Default::default()
        });
        assert_eq!(s.color_map_atom.get().name, "plateau");
    }

    #[test]
    fn color_scheme_follows_property_map_and_range() {
        let s = create_tileset_layer_state(&TilesetLayerStateParams {
            color_property: Some("measuredHeight".into()),
            ..Default::default()
        });
        assert_eq!(
            s.color_scheme_atom.get(),
            Some(ColorScheme::Quantitative {
                property: "measuredHeight".into(),
                color_map: ColorMap::plateau(),
                color_range: DEFAULT_COLOR_RANGE,
            })
        );

        s.color_map_atom.set(ColorMap::viridis());
        s.color_range_atom.set([5.0, 50.0]);
        assert_eq!(
            s.color_scheme_atom.get(),
            Some(ColorScheme::Quantitative {
                property: "measuredHeight".into(),
                color_map: ColorMap::viridis(),
                color_range: [5.0, 50.0],
            })
        );

        s.color_property_atom.set(None);
        assert_eq!(s.color_scheme_atom.get(), None);
    }

    #[test]
    fn qualitative_property_yields_qualitative_scheme() {
        let s = create_tileset_layer_state(&TilesetLayerStateParams::default());
        s.properties_atom.set(Some(vec![TilesetProperty::qualitative(
            "usage",
            vec!["residential".into(), "commercial".into()],
        )]));
        s.select_color_property(Some("usage"));
        let scheme = s.color_scheme_atom.get().unwrap();
        assert!(matches!(scheme, ColorScheme::Qualitative { ref colors, .. } if colors.len() == 2));
        assert_eq!(s.color_range_atom.get(), DEFAULT_COLOR_RANGE);
    }

    #[test]
    fn selecting_numeric_property_adopts_its_bounds() {
        let s = create_tileset_layer_state(&TilesetLayerStateParams::default());
        s.properties_atom
            .set(Some(vec![TilesetProperty::number("measuredHeight", 2.5, 180.0)]));
        s.select_color_property(Some("measuredHeight"));
        assert_eq!(s.color_range_atom.get(), [2.5, 180.0]);
        assert_eq!(s.color_property_atom.get().as_deref(), Some("measuredHeight"));
    }

    #[test]
    fn switching_property_publishes_one_scheme() {
        let s = create_tileset_layer_state(&TilesetLayerStateParams {
            color_property: Some("storeys".into()),
            ..Default::default()
        });
        s.properties_atom.set(Some(vec![
            TilesetProperty::number("storeys", 1.0, 40.0),
            TilesetProperty::number("measuredHeight", 2.5, 180.0),
        ]));

        let seen = Rc::new(RefCell::new(Vec::new()));
        let (scheme, log) = (s.color_scheme_atom.clone(), Rc::clone(&seen));
        let _sub = s
            .color_scheme_atom
            .subscribe(move || log.borrow_mut().push(scheme.get()));

        s.select_color_property(Some("measuredHeight"));
        assert_eq!(
            *seen.borrow(),
            vec![Some(ColorScheme::Quantitative {
                property: "measuredHeight".into(),
                color_map: ColorMap::plateau(),
                color_range: [2.5, 180.0],
            })]
        );
    }

    #[test]
    fn components_keep_requested_order() {
        let s = create_tileset_layer_state(&TilesetLayerStateParams {
            components: vec![
                ComponentSpec { kind: ComponentKind::Shadow, value: None },
                ComponentSpec { kind: ComponentKind::Opacity, value: None },
            ],
            ..Default::default()
        });
        let kinds: Vec<ComponentKind> =
            s.component_atoms.unwrap().iter().map(|c| c.kind).collect();
        assert_eq!(kinds, vec![ComponentKind::Shadow, ComponentKind::Opacity]);
    }

    #[test]
    fn hidden_features_hide_only_listed_keys() {
        let s = create_tileset_layer_state(&TilesetLayerStateParams {
            hidden_features: Some(vec!["bldg_2".into()]),
            ..Default::default()
        });
        assert!(!s.is_feature_visible("bldg_2"));
        assert!(s.is_feature_visible("bldg_1"));
    }
}
