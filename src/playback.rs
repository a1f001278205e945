//! Offline playback: runs a controller at a fixed frame rate and samples
//! which bulb meshes are visible.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::controller::TrafficController;
use crate::scene_graph::{SceneGraph, SceneHost};
use crate::signal_player::SignalPlayer;

/// Frame timing for an offline run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackConfig {
    pub fps: f32,
    /// Seconds to simulate.
    pub duration: f32,
    /// Record a sample every N frames.
    pub sample_every: usize,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            fps: 60.0,
            duration: 10.0,
            sample_every: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalSample {
    pub id: String,
    /// `None` until the signal has been given a configuration.
    pub configuration: Option<usize>,
    pub blinking: bool,
    /// Names of the visible bulb meshes of the current configuration.
    pub visible: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameSample {
    pub frame: usize,
    pub time: f32,
    pub signals: Vec<SignalSample>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackReport {
    pub generated_at: DateTime<Utc>,
    pub fps: f32,
    pub duration: f32,
    pub frames: Vec<FrameSample>,
}

/// Visible meshes bound to the player's current configuration.
pub fn visible_meshes<S: SceneHost + ?Sized>(player: &SignalPlayer, scene: &S) -> Vec<String> {
    let Some(state) = player.signal_states().get(player.current_config()) else {
        return Vec::new();
    };
    state
        .lights
        .iter()
        .flat_map(|light| light.binding.cached_handles())
        .filter(|&id| scene.is_visible(id) == Some(true))
        .filter_map(|id| scene.name(id).map(str::to_string))
        .collect()
}

fn sample(frame: usize, time: f32, controller: &TrafficController, scene: &SceneGraph) -> FrameSample {
    let signals = controller
        .signals()
        .iter()
        .map(|player| SignalSample {
            id: player.id().to_string(),
            configuration: player.is_configured().then(|| player.current_config()),
            blinking: player.is_blinking(),
            visible: if player.is_configured() {
                visible_meshes(player, scene)
            } else {
                Vec::new()
            },
        })
        .collect();
    FrameSample { frame, time, signals }
}

/// Start every junction and tick the controller for the configured duration.
///
/// Frame 0 is sampled right after start, before the first tick.
pub fn simulate(
    controller: &mut TrafficController,
    scene: &mut SceneGraph,
    config: &PlaybackConfig,
) -> PlaybackReport {
    let fps = if config.fps > 0.0 { config.fps } else { PlaybackConfig::default().fps };
    let dt = 1.0 / fps;
    let total_frames = (config.duration.max(0.0) * fps).ceil() as usize;
    let sample_every = config.sample_every.max(1);

    controller.start(scene);
    let mut frames = vec![sample(0, 0.0, controller, scene)];

    for frame in 1..=total_frames {
        controller.tick(dt, scene);
        if frame % sample_every == 0 {
            frames.push(sample(frame, frame as f32 * dt, controller, scene));
        }
    }

    log::info!("Simulated {} frames, {} samples", total_frames, frames.len());
    PlaybackReport {
        generated_at: Utc::now(),
        fps,
        duration: config.duration,
        frames,
    }
}
