//! Runtime playback of a resolved traffic signal.
//!
//! A player owns the resolved configuration table of one signal instance.
//! Selecting a configuration shows or hides every bulb mesh immediately;
//! blinking bulbs are then toggled on each tick from the player's own timer.

use crate::asset::BulbState;
use crate::error::SignalError;
use crate::resolver::{LightBinding, SignalState};
use crate::scene_graph::{EntityId, SceneHost};

/// Timing constants for signal playback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerConfig {
    /// Length of one blink cycle in seconds.
    pub blink_period: f32,
    /// Fraction of the cycle during which a blinking bulb is lit.
    pub blink_on_fraction: f32,
    /// The timer resets to zero once it exceeds this many seconds.
    pub timer_wrap: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            blink_period: 1.0,
            blink_on_fraction: 0.5,
            timer_wrap: 10000.0,
        }
    }
}

/// Plays one signal instance: configuration switching plus blinking.
#[derive(Debug, Clone)]
pub struct SignalPlayer {
    id: String,
    asset_id: String,
    /// Actor the signal is attached to; default anchor for component lookups.
    owner: EntityId,
    legacy: bool,
    signal_states: Vec<SignalState>,
    current_config: usize,
    configured: bool,
    timer: f32,
    blinking: bool,
    /// Whether the "light state not set up" error has been logged.
    logged_unresolved: bool,
    config: PlayerConfig,
}

impl SignalPlayer {
    pub fn new(
        id: impl Into<String>,
        asset_id: impl Into<String>,
        owner: EntityId,
        legacy: bool,
        signal_states: Vec<SignalState>,
    ) -> Self {
        Self {
            id: id.into(),
            asset_id: asset_id.into(),
            owner,
            legacy,
            signal_states,
            current_config: 0,
            configured: false,
            timer: 0.0,
            blinking: false,
            logged_unresolved: false,
            config: PlayerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: PlayerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn asset_id(&self) -> &str {
        &self.asset_id
    }

    pub fn owner(&self) -> EntityId {
        self.owner
    }

    pub fn is_legacy(&self) -> bool {
        self.legacy
    }

    pub fn current_config(&self) -> usize {
        self.current_config
    }

    /// False until a configuration has been selected successfully.
    pub fn is_configured(&self) -> bool {
        self.configured
    }

    pub fn timer(&self) -> f32 {
        self.timer
    }

    pub fn is_blinking(&self) -> bool {
        self.blinking
    }

    pub fn signal_states(&self) -> &[SignalState] {
        &self.signal_states
    }

    pub fn configuration_count(&self) -> usize {
        self.signal_states.len()
    }

    /// Whether blinking bulbs are lit at the current timer value.
    pub fn blink_phase(&self) -> bool {
        let period = self.config.blink_period;
        self.timer.rem_euclid(period) < period * self.config.blink_on_fraction
    }

    /// Switch to configuration `index` and apply its bulb visibility.
    ///
    /// An out-of-range index is rejected with a warning and leaves the player
    /// untouched. Bulbs without resolvable components are skipped; the first
    /// such bulb logs an error, later ones stay silent for this player.
    pub fn set_configuration<S: SceneHost + ?Sized>(
        &mut self,
        index: usize,
        scene: &mut S,
    ) -> Result<(), SignalError> {
        if index >= self.signal_states.len() {
            let err = SignalError::InvalidConfigurationIndex {
                signal: self.id.clone(),
                index,
                count: self.signal_states.len(),
            };
            log::warn!("{}", err);
            return Err(err);
        }

        self.current_config = index;
        self.configured = true;

        let owner = self.owner;
        let phase = self.blink_phase();
        let mut blinking = false;
        let mut unresolved = false;

        for light in &mut self.signal_states[index].lights {
            match &mut light.binding {
                LightBinding::Paired { on, off } => {
                    let on_id = on.resolve(&*scene, owner);
                    let off_id = off.resolve(&*scene, owner);
                    let (Some(on_id), Some(off_id)) = (on_id, off_id) else {
                        unresolved = true;
                        continue;
                    };
                    let lit = match &light.state {
                        BulbState::Off => false,
                        BulbState::On => true,
                        BulbState::Blinking => {
                            blinking = true;
                            phase
                        }
                        BulbState::Unknown(raw) => {
                            log_unknown_state(&self.id, raw);
                            continue;
                        }
                    };
                    scene.set_visible(on_id, lit);
                    scene.set_visible(off_id, !lit);
                }
                LightBinding::Legacy(single) => {
                    let Some(mesh) = single.resolve(&*scene, owner) else {
                        unresolved = true;
                        continue;
                    };
                    // Legacy meshes have no dark variant; blinking shows as off.
                    let lit = match &light.state {
                        BulbState::On => true,
                        BulbState::Off | BulbState::Blinking => false,
                        BulbState::Unknown(raw) => {
                            log_unknown_state(&self.id, raw);
                            continue;
                        }
                    };
                    scene.set_visible(mesh, lit);
                }
            }
        }

        self.blinking = blinking;
        if unresolved && !self.logged_unresolved {
            log::error!(
                "{}",
                SignalError::UnresolvedComponentReference {
                    signal: self.id.clone()
                }
            );
            self.logged_unresolved = true;
        }
        Ok(())
    }

    /// Advance the blink timer by `delta` seconds and refresh blinking bulbs.
    pub fn advance<S: SceneHost + ?Sized>(&mut self, delta: f32, scene: &mut S) {
        self.timer += delta;
        if self.timer > self.config.timer_wrap {
            self.timer = 0.0;
        }

        if !self.blinking {
            return;
        }

        let phase = self.blink_phase();
        let Some(state) = self.signal_states.get(self.current_config) else {
            return;
        };
        for light in &state.lights {
            if light.state != BulbState::Blinking {
                continue;
            }
            if let LightBinding::Paired { on, off } = &light.binding {
                if let (Some(on_id), Some(off_id)) = (on.cached(), off.cached()) {
                    scene.set_visible(on_id, phase);
                    scene.set_visible(off_id, !phase);
                }
            }
        }
    }
}

fn log_unknown_state(signal: &str, raw: &str) {
    log::error!(
        "{}",
        SignalError::UnknownBulbState {
            signal: signal.to_string(),
            state: raw.to_string(),
        }
    );
}
