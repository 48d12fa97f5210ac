use std::path::PathBuf;

use clap::{Parser, Subcommand};
use foundation::ids::LayerId;
use layers::{ContainerSnapshot, Layer, LayerElement, LayerModel, LayerRegistry, SceneConfig};
use runtime::Scheduler;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Inspect the layers of a scene config")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the layers a scene config declares
    List {
        /// Scene config (JSON)
        scene: PathBuf,
    },

    /// Render every layer and print what the tileset renderer would receive
    Render {
        /// Scene config (JSON)
        scene: PathBuf,

        /// Hide a layer before rendering (repeatable)
        #[arg(long)]
        hide: Vec<String>,

        /// Simulate a renderer load: LAYER=RENDERER_LAYER_ID (repeatable)
        #[arg(long, value_parser = parse_pair)]
        loaded: Vec<(String, String)>,

        /// Select a feature: LAYER=FEATURE_KEY (repeatable)
        #[arg(long, value_parser = parse_pair)]
        select: Vec<(String, String)>,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },
}

fn parse_pair(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((k, v)) if !k.is_empty() && !v.is_empty() => Ok((k.to_string(), v.to_string())),
        _ => Err(format!("expected KEY=VALUE, got {s:?}")),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LayerReport {
    id: LayerId,
    #[serde(rename = "type")]
    kind: &'static str,
    municipality_code: String,
    title: Option<String>,
    element: Option<ContainerSnapshot>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = real_main() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn real_main() -> Result<(), String> {
    let args = Args::parse();
    match args.command {
        Command::List { scene } => cmd_list(scene),
        Command::Render {
            scene,
            hide,
            loaded,
            select,
            pretty,
        } => cmd_render(scene, &hide, &loaded, &select, pretty),
    }
}

fn cmd_list(scene: PathBuf) -> Result<(), String> {
    let config = SceneConfig::load(&scene).map_err(|e| e.to_string())?;
    let registry = config.build_registry().map_err(|e| e.to_string())?;
    for layer in registry.layers() {
        match layer {
            LayerModel::Building(b) => println!(
                "{}\t{}\t{}\t{}",
                b.id(),
                b.layer_type(),
                b.municipality_code,
                b.title
            ),
        }
    }
    Ok(())
}

fn cmd_render(
    scene: PathBuf,
    hide: &[String],
    loaded: &[(String, String)],
    select: &[(String, String)],
    pretty: bool,
) -> Result<(), String> {
    let config = SceneConfig::load(&scene).map_err(|e| e.to_string())?;
    let mut registry = config.build_registry().map_err(|e| e.to_string())?;
    info!(layers = registry.len(), scene = %scene.display(), "loaded scene");

    let mut scheduler = Scheduler::new();
    run_session(&mut registry, &mut scheduler, hide, loaded, select);

    let reports = reports(&registry);
    let payload = if pretty {
        serde_json::to_string_pretty(&reports)
    } else {
        serde_json::to_string(&reports)
    }
    .map_err(|e| format!("json: {e}"))?;
    println!("{payload}");
    Ok(())
}

/// Drives the registry the way a viewer session would: initial render, effect
/// flush, widget load callbacks, user edits, and a second render for
/// whatever those dirtied.
fn run_session(
    registry: &mut LayerRegistry,
    scheduler: &mut Scheduler,
    hide: &[String],
    loaded: &[(String, String)],
    select: &[(String, String)],
) {
    for id in hide {
        if !registry.set_hidden(&LayerId::new(id.as_str()), true) {
            warn!(layer = %id, "--hide: no such layer");
        }
    }

    registry.render(scheduler);
    scheduler.flush();

    for (id, layer_id) in loaded {
        if !registry.notify_loaded(&LayerId::new(id.as_str()), layer_id, scheduler) {
            warn!(layer = %id, "--loaded: layer has no rendered tileset");
        }
    }
    for (id, key) in select {
        let id = LayerId::new(id.as_str());
        let mut keys: Vec<String> = match registry.layer(&id) {
            Some(LayerModel::Building(b)) => b
                .tileset
                .selections
                .with(|s| s.iter().map(|f| f.key.clone()).collect()),
            None => {
                warn!(layer = %id, "--select: no such layer");
                continue;
            }
        };
        keys.push(key.clone());
        registry.select_features(&id, keys);
    }

    registry.render(scheduler);
    scheduler.flush();
}

fn reports(registry: &LayerRegistry) -> Vec<LayerReport> {
    registry
        .layers()
        .map(|layer| match layer {
            LayerModel::Building(b) => LayerReport {
                id: b.id().clone(),
                kind: b.layer_type().as_str(),
                municipality_code: b.municipality_code.clone(),
                title: b.view.title_atom.get(),
                element: registry.element(b.id()).map(|e| match e {
                    LayerElement::BuildingModel(props) => props.snapshot(),
                }),
            },
        })
        .collect()
}
