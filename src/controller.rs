//! Traffic controller: owns the signal players of a scene and sequences
//! junction phases over time.

use std::collections::HashMap;

use serde::Deserialize;

use crate::asset::{AssetLibrary, AssetStore};
use crate::error::{Result, SignalError};
use crate::resolver::{self, NameResolver};
use crate::scene_graph::{EntityId, SceneHost};
use crate::signal_player::{PlayerConfig, SignalPlayer};

/// Configuration a phase assigns to one signal.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PhaseSignal {
    pub signal: String,
    pub configuration: usize,
}

/// A timed step of a junction.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Phase {
    #[serde(default)]
    pub name: Option<String>,
    /// Seconds spent in this phase.
    pub duration: f32,
    #[serde(default)]
    pub signals: Vec<PhaseSignal>,
}

/// A group of signals cycled through a fixed list of phases.
#[derive(Debug, Clone)]
pub struct Junction {
    pub id: String,
    phases: Vec<Phase>,
    current: usize,
    elapsed: f32,
}

impl Junction {
    pub fn new(id: impl Into<String>, phases: Vec<Phase>) -> Self {
        Self {
            id: id.into(),
            phases,
            current: 0,
            elapsed: 0.0,
        }
    }

    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_phase(&self) -> Option<&Phase> {
        self.phases.get(self.current)
    }

    /// Rewind to the first phase.
    pub fn start(&mut self) -> Option<&Phase> {
        self.current = 0;
        self.elapsed = 0.0;
        self.phases.first()
    }

    /// Advance time and return the indices of the phases entered, in order.
    ///
    /// At most one full cycle is entered per call. A phase with a
    /// non-positive duration lasts a single call.
    pub fn advance(&mut self, delta: f32) -> Vec<usize> {
        let mut entered = Vec::new();
        if self.phases.is_empty() {
            return entered;
        }

        self.elapsed += delta.max(0.0);
        while entered.len() < self.phases.len() {
            let duration = self.phases[self.current].duration.max(0.0);
            if self.elapsed < duration {
                break;
            }
            self.elapsed -= duration;
            self.current = (self.current + 1) % self.phases.len();
            entered.push(self.current);
            if self.phases[self.current].duration <= 0.0 {
                break;
            }
        }

        if entered.len() == self.phases.len() {
            // Drop whatever a huge delta left over instead of spinning.
            self.elapsed = 0.0;
        }
        entered
    }
}

/// Owns every signal player of a scene and the junctions driving them.
#[derive(Debug, Default)]
pub struct TrafficController {
    assets: AssetLibrary,
    signals: Vec<SignalPlayer>,
    by_id: HashMap<String, usize>,
    junctions: Vec<Junction>,
    player_config: PlayerConfig,
}

impl TrafficController {
    pub fn new(assets: AssetLibrary) -> Self {
        Self {
            assets,
            ..Self::default()
        }
    }

    pub fn with_player_config(mut self, config: PlayerConfig) -> Self {
        self.player_config = config;
        self
    }

    pub fn assets(&self) -> &AssetLibrary {
        &self.assets
    }

    /// Resolve a signal instance against its asset and start managing it.
    pub fn add_signal(
        &mut self,
        id: &str,
        asset_id: &str,
        owner: EntityId,
        names: &dyn NameResolver,
        legacy: bool,
    ) -> Result<&mut SignalPlayer> {
        let asset = self
            .assets
            .signal_asset(asset_id)
            .ok_or_else(|| SignalError::UnknownAsset(asset_id.to_string()))?;
        let states = resolver::resolve(id, asset_id, asset, names, legacy);
        log::debug!("Signal {} resolved with {} configurations", id, states.len());

        let player = SignalPlayer::new(id, asset_id, owner, legacy, states).with_config(self.player_config);
        let index = match self.by_id.get(id) {
            Some(&existing) => {
                log::warn!("Signal {} added twice, replacing the earlier instance", id);
                self.signals[existing] = player;
                existing
            }
            None => {
                self.signals.push(player);
                self.by_id.insert(id.to_string(), self.signals.len() - 1);
                self.signals.len() - 1
            }
        };
        Ok(&mut self.signals[index])
    }

    pub fn add_junction(&mut self, junction: Junction) {
        self.junctions.push(junction);
    }

    pub fn signal(&self, id: &str) -> Option<&SignalPlayer> {
        self.by_id.get(id).map(|&i| &self.signals[i])
    }

    pub fn signals(&self) -> &[SignalPlayer] {
        &self.signals
    }

    pub fn junctions(&self) -> &[Junction] {
        &self.junctions
    }

    pub fn set_signal_configuration<S: SceneHost + ?Sized>(
        &mut self,
        id: &str,
        index: usize,
        scene: &mut S,
    ) -> Result<()> {
        let &slot = self
            .by_id
            .get(id)
            .ok_or_else(|| SignalError::UnknownSignal(id.to_string()))?;
        self.signals[slot].set_configuration(index, scene)
    }

    /// Put every junction into its first phase.
    pub fn start<S: SceneHost + ?Sized>(&mut self, scene: &mut S) {
        let mut assignments = Vec::new();
        for junction in &mut self.junctions {
            if let Some(phase) = junction.start() {
                assignments.extend(phase.signals.iter().cloned());
            }
        }
        self.apply(&assignments, scene);
    }

    /// Advance junction phases, then tick every signal.
    pub fn tick<S: SceneHost + ?Sized>(&mut self, delta: f32, scene: &mut S) {
        let mut assignments = Vec::new();
        for junction in &mut self.junctions {
            for index in junction.advance(delta) {
                let phase = &junction.phases[index];
                log::debug!(
                    "Junction {} entered phase {}",
                    junction.id,
                    phase.name.as_deref().unwrap_or("<unnamed>")
                );
                assignments.extend(phase.signals.iter().cloned());
            }
        }
        self.apply(&assignments, scene);

        for player in &mut self.signals {
            player.advance(delta, scene);
        }
    }

    fn apply<S: SceneHost + ?Sized>(&mut self, assignments: &[PhaseSignal], scene: &mut S) {
        for assignment in assignments {
            match self.set_signal_configuration(&assignment.signal, assignment.configuration, scene) {
                Ok(()) => {}
                // The player has already warned about the index.
                Err(SignalError::InvalidConfigurationIndex { .. }) => {}
                Err(e) => log::warn!("{}", e),
            }
        }
    }
}
