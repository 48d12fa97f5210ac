use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Keys of the features a loaded tileset exposes.
///
/// Populated by the rendering widget once tiles arrive; iteration is in key
/// order so snapshots stay stable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureIndex {
    keys: BTreeSet<String>,
}

impl FeatureIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>) -> bool {
        self.keys.insert(key.into())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.keys.iter().map(String::as_str)
    }
}

/// Result of a feature search, kept on the layer so the widget can highlight
/// or isolate the matches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchedFeatures {
    /// Property name -> accepted values.
    #[serde(default)]
    pub conditions: BTreeMap<String, Vec<String>>,
    pub features: Vec<String>,
    #[serde(default)]
    pub highlight: bool,
}

impl SearchedFeatures {
    pub fn contains(&self, key: &str) -> bool {
        self.features.iter().any(|f| f == key)
    }

    /// Matches restricted to keys the index knows about, in search order.
    pub fn resolve<'a>(&'a self, index: &'a FeatureIndex) -> impl Iterator<Item = &'a str> + 'a {
        self.features
            .iter()
            .map(String::as_str)
            .filter(move |k| index.contains(k))
    }
}

/// Type of a feature property as reported by the loaded tileset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TilesetPropertyKind {
    Number { min: f64, max: f64 },
    Qualitative { values: Vec<String> },
    Text,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TilesetProperty {
    pub name: String,
    #[serde(flatten)]
    pub kind: TilesetPropertyKind,
}

impl TilesetProperty {
    pub fn number(name: impl Into<String>, min: f64, max: f64) -> Self {
        Self {
            name: name.into(),
            kind: TilesetPropertyKind::Number { min, max },
        }
    }

    pub fn qualitative(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: name.into(),
            kind: TilesetPropertyKind::Qualitative { values },
        }
    }
}
