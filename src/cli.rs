use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::asset::AssetLibrary;
use crate::controller::{Phase, TrafficController};
use crate::opendrive;
use crate::playback::{self, PlaybackConfig};
use crate::resolver::LightBinding;
use crate::scene_description::SceneDescription;
use crate::scene_graph::{NodeKind, SceneGraph, SceneHost};
use crate::segmentation;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate signal playback and write a visibility report
    Play {
        /// Scene description JSON
        #[arg(long)]
        scene: PathBuf,

        /// Signal asset JSON
        #[arg(long)]
        assets: PathBuf,

        /// Frames per second
        #[arg(long, default_value_t = 60.0)]
        fps: f32,

        /// Seconds to simulate
        #[arg(long, default_value_t = 10.0)]
        duration: f32,

        /// Record a sample every N frames
        #[arg(long, default_value_t = 30)]
        sample_every: usize,

        /// Report path (stdout when omitted)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print the resolved configurations of every signal
    Inspect {
        #[arg(long)]
        scene: PathBuf,

        #[arg(long)]
        assets: PathBuf,
    },
    /// Print the segmentation folder of every tagged actor
    Categorize {
        #[arg(long)]
        scene: PathBuf,
    },
    /// Export the OpenDRIVE road network of a scene
    ExportOpendrive {
        #[arg(long)]
        scene: PathBuf,

        /// Path of the actor carrying the OpenDRIVE metadata
        #[arg(long)]
        actor: String,

        /// Map name used for the output file
        #[arg(long)]
        map: String,

        /// Project content directory
        #[arg(long)]
        content: PathBuf,

        /// Imported scene file whose .xodr sidecar is copied as well
        #[arg(long)]
        sidecar: Option<PathBuf>,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Play { scene, assets, fps, duration, sample_every, out } => {
            let config = PlaybackConfig { fps, duration, sample_every };
            play(&scene, &assets, &config, out.as_deref())?;
        }
        Commands::Inspect { scene, assets } => {
            let (scene, controller) = load(&scene, &assets)?;
            inspect(&scene, &controller);
        }
        Commands::Categorize { scene } => {
            let scene = load_description(&scene)?.build_graph();
            categorize(&scene);
        }
        Commands::ExportOpendrive { scene, actor, map, content, sidecar } => {
            let graph = load_description(&scene)?.build_graph();
            let actor_id = graph
                .find_path(&actor)
                .with_context(|| format!("No actor at {}", actor))?;
            match opendrive::write_open_drive(&graph, actor_id, &map, &content)? {
                Some(path) => println!("Wrote {}", path.display()),
                None => println!("No OpenDRIVE data on {}", actor),
            }
            if let Some(sidecar) = sidecar {
                if let Some(path) = opendrive::copy_open_drive(&sidecar, &content)? {
                    println!("Copied {}", path.display());
                }
            }
        }
    }
    Ok(())
}

fn load_description(path: &Path) -> Result<SceneDescription> {
    SceneDescription::load(path).with_context(|| format!("Failed to read scene {}", path.display()))
}

fn load(scene: &Path, assets: &Path) -> Result<(SceneGraph, TrafficController)> {
    let library = AssetLibrary::load(assets)
        .with_context(|| format!("Failed to read signal assets {}", assets.display()))?;
    let built = load_description(scene)?
        .build(library)
        .context("Failed to set up signals")?;
    Ok(built)
}

fn play(scene: &Path, assets: &Path, config: &PlaybackConfig, out: Option<&Path>) -> Result<()> {
    let (mut scene, mut controller) = load(scene, assets)?;
    let report = playback::simulate(&mut controller, &mut scene, config);
    let json = serde_json::to_string_pretty(&report)?;

    match out {
        Some(path) => {
            std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Wrote {} samples to {}", report.frames.len(), path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn inspect(scene: &SceneGraph, controller: &TrafficController) {
    for player in controller.signals() {
        println!(
            "signal {} on {} (asset {}{})",
            player.id(),
            scene.name(player.owner()).unwrap_or("?"),
            player.asset_id(),
            if player.is_legacy() { ", legacy" } else { "" }
        );
        for state in player.signal_states() {
            println!("  configuration {}", state.configuration);
            for light in &state.lights {
                let binding = match &light.binding {
                    LightBinding::Paired { on, off } => format!(
                        "on={} off={}",
                        describe(on.reference.as_ref().and_then(|r| r.component.as_deref()), on.reference.is_some()),
                        describe(off.reference.as_ref().and_then(|r| r.component.as_deref()), off.reference.is_some()),
                    ),
                    LightBinding::Legacy(single) => format!(
                        "mesh={}",
                        describe(single.reference.as_ref().and_then(|r| r.component.as_deref()), single.reference.is_some())
                    ),
                };
                println!("    {:<12} {:<10} {}", light.bulb, light.state.to_string(), binding);
            }
        }
    }
    for junction in controller.junctions() {
        let current = junction.current_phase().map(phase_label).unwrap_or_else(|| "-".to_string());
        println!("junction {} (current {})", junction.id, current);
        for phase in junction.phases() {
            let signals: Vec<String> = phase
                .signals
                .iter()
                .map(|s| format!("{}={}", s.signal, s.configuration))
                .collect();
            println!("  {:<12} {:>6.1}s  {}", phase_label(phase), phase.duration, signals.join(" "));
        }
    }
    println!(
        "{} signals, {} assets, {} junctions, {} scene nodes",
        controller.signals().len(),
        controller.assets().len(),
        controller.junctions().len(),
        scene.nodes.len()
    );
}

fn phase_label(phase: &Phase) -> String {
    phase.name.clone().unwrap_or_else(|| "<unnamed>".to_string())
}

fn describe(component: Option<&str>, found: bool) -> String {
    match (found, component) {
        (false, _) => "<missing>".to_string(),
        (true, Some(name)) => name.to_string(),
        (true, None) => "<primary mesh>".to_string(),
    }
}

fn categorize(scene: &SceneGraph) {
    for &root in scene.roots() {
        for actor in segmentation::segmented_actors(scene, root) {
            let name = scene.name(actor).unwrap_or("?");
            if let Some(folder) = segmentation::categorize_actor(scene, actor) {
                println!("{} -> {}", name, folder);
            }
        }
        for id in std::iter::once(root).chain(scene.descendants(root)) {
            let name = scene.name(id).unwrap_or("?");
            match scene.kind(id) {
                Some(NodeKind::Mesh) => {
                    if let Some(folder) = segmentation::categorize_mesh(scene, id) {
                        println!("{} -> {}", name, folder);
                    }
                }
                Some(NodeKind::Actor) => {
                    let vehicles = segmentation::categorize_vehicles(scene, id);
                    if let Some(folder) = vehicles.folder {
                        println!("{} vehicles ({} meshes) -> {}", name, vehicles.meshes.len(), folder);
                    }
                }
                _ => {}
            }
        }
    }
}
