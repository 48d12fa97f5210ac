use foundation::color::Color;
use serde::Serialize;

/// Named colour ramp sampled by `linear`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColorMap {
    pub name: String,
    pub stops: Vec<Color>,
}

fn rgb(r: u8, g: u8, b: u8) -> Color {
    Color::from_rgb8(r, g, b)
}

impl ColorMap {
    pub fn new(name: impl Into<String>, stops: Vec<Color>) -> Self {
        Self {
            name: name.into(),
            stops,
        }
    }

    /// Default ramp for building attributes: cool for low values, warm for high.
    pub fn plateau() -> Self {
        Self::new(
            "plateau",
            vec![
                rgb(0x2b, 0x83, 0xba),
                rgb(0xab, 0xdd, 0xa4),
                rgb(0xff, 0xff, 0xbf),
                rgb(0xfd, 0xae, 0x61),
                rgb(0xd7, 0x19, 0x1c),
            ],
        )
    }

    pub fn viridis() -> Self {
        Self::new(
            "viridis",
            vec![
                rgb(0x44, 0x01, 0x54),
                rgb(0x3b, 0x52, 0x8b),
                rgb(0x21, 0x91, 0x8c),
                rgb(0x5e, 0xc9, 0x62),
                rgb(0xfd, 0xe7, 0x25),
            ],
        )
    }

    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "plateau" => Some(Self::plateau()),
            "viridis" => Some(Self::viridis()),
            _ => None,
        }
    }

    /// Samples the ramp at `t`, clamped to `[0, 1]`.
    pub fn linear(&self, t: f64) -> Color {
        let n = self.stops.len();
        match n {
            0 => return Color::WHITE,
            1 => return self.stops[0],
            _ => {}
        }
        let scaled = t.clamp(0.0, 1.0) * (n - 1) as f64;
        let i = scaled.floor() as usize;
        if i >= n - 1 {
            return self.stops[n - 1];
        }
        self.stops[i].lerp(self.stops[i + 1], (scaled - i as f64) as f32)
    }
}

impl Default for ColorMap {
    fn default() -> Self {
        Self::plateau()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualitativeColor {
    pub value: String,
    pub color: Color,
}

/// How feature colours are derived from one feature property.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ColorScheme {
    Quantitative {
        property: String,
        #[serde(rename = "colorMap")]
        color_map: ColorMap,
        #[serde(rename = "colorRange")]
        color_range: [f64; 2],
    },
    Qualitative {
        property: String,
        colors: Vec<QualitativeColor>,
    },
}

impl ColorScheme {
    /// Spreads `values` evenly over `color_map`, in the given order.
    pub fn qualitative(property: impl Into<String>, values: &[String], color_map: &ColorMap) -> Self {
        let last = values.len().saturating_sub(1).max(1) as f64;
        let colors = values
            .iter()
            .enumerate()
            .map(|(i, v)| QualitativeColor {
                value: v.clone(),
                color: color_map.linear(i as f64 / last),
            })
            .collect();
        ColorScheme::Qualitative {
            property: property.into(),
            colors,
        }
    }

    pub fn property(&self) -> &str {
        match self {
            ColorScheme::Quantitative { property, .. } | ColorScheme::Qualitative { property, .. } => {
                property
            }
        }
    }

    /// Colour for one feature's property value, or `None` if the value does
    /// not map (wrong type, unlisted category).
    pub fn color_for(&self, value: &serde_json::Value) -> Option<Color> {
        match self {
            ColorScheme::Quantitative {
                color_map,
                color_range: [min, max],
                ..
            } => {
                let v = value.as_f64()?;
                if max <= min {
                    return Some(color_map.linear(0.0));
                }
                Some(color_map.linear((v - min) / (max - min)))
            }
            ColorScheme::Qualitative { colors, .. } => {
                let key = match value {
                    serde_json::Value::String(s) => s.clone(),
                    serde_json::Value::Number(n) => n.to_string(),
                    serde_json::Value::Bool(b) => b.to_string(),
                    _ => return None,
                };
                colors.iter().find(|c| c.value == key).map(|c| c.color)
            }
        }
    }
}
