pub mod building;
pub mod component;
pub mod config;
pub mod container;
pub mod feature;
pub mod layer;
pub mod registry;
pub mod selection;
pub mod symbology;
pub mod tileset;
pub mod view_layer;

pub use building::*;
pub use config::{ConfigError, SceneConfig};
pub use container::*;
pub use layer::*;
pub use registry::*;
