use runtime::Atom;
use serde::{Deserialize, Serialize};

/// Field components a layer panel can attach to a tileset layer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ComponentKind {
    Opacity,
    Shadow,
    FillColor,
}

impl ComponentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ComponentKind::Opacity => "opacity",
            ComponentKind::Shadow => "shadow",
            ComponentKind::FillColor => "fillColor",
        }
    }

    pub fn default_value(self) -> ComponentValue {
        match self {
            ComponentKind::Opacity => ComponentValue::Number(1.0),
            ComponentKind::Shadow => ComponentValue::Flag(false),
            ComponentKind::FillColor => ComponentValue::Text("#ffffff".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ComponentValue {
    Flag(bool),
    Number(f64),
    Text(String),
}

/// Requested component in layer params.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ComponentSpec {
    #[serde(rename = "type")]
    pub kind: ComponentKind,
    #[serde(default)]
    pub value: Option<ComponentValue>,
}

/// Per-component sub-cell owned by a layer.
#[derive(Debug, Clone)]
pub struct ComponentAtom {
    pub id: String,
    pub kind: ComponentKind,
    pub value_atom: Atom<ComponentValue>,
}

impl ComponentAtom {
    pub fn from_spec(index: usize, spec: &ComponentSpec) -> Self {
        let value = spec
            .value
            .clone()
            .unwrap_or_else(|| spec.kind.default_value());
        Self {
            id: format!("{}-{index}", spec.kind.as_str()),
            kind: spec.kind,
            value_atom: Atom::labeled("componentAtom", value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ComponentAtom, ComponentKind, ComponentSpec, ComponentValue};

    #[test]
    fn spec_without_value_uses_kind_default() {
        let spec: ComponentSpec = serde_json::from_str(r#"{"type":"opacity"}"#).unwrap();
        let c = ComponentAtom::from_spec(2, &spec);
        assert_eq!(c.id, "opacity-2");
        assert_eq!(c.value_atom.get(), ComponentValue::Number(1.0));
    }

    #[test]
    fn untagged_values_parse_by_shape() {
        let spec: ComponentSpec =
            serde_json::from_str(r##"{"type":"fillColor","value":"#ff0000"}"##).unwrap();
        assert_eq!(spec.kind, ComponentKind::FillColor);
        assert_eq!(spec.value, Some(ComponentValue::Text("#ff0000".into())));

        let spec: ComponentSpec =
            serde_json::from_str(r#"{"type":"shadow","value":true}"#).unwrap();
        assert_eq!(spec.value, Some(ComponentValue::Flag(true)));
    }
}
