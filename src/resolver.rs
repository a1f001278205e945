//! Turns a signal asset into per-configuration light bindings.
//!
//! Each light bulb of each configuration is bound to the scene components that
//! display it: an `_on`/`_off` mesh pair, or a single mesh for legacy scenes.
//! Finding those components is delegated to a [`NameResolver`].

use std::collections::HashMap;

use regex::Regex;

use crate::asset::{BulbState, SignalAsset};
use crate::component_ref::{ComponentRef, LazyComponent};
use crate::scene_graph::{EntityId, NodeKind, SceneHost};

/// Suffix of the mesh shown while a bulb is lit.
pub const ON_SUFFIX: &str = "_on";
/// Suffix of the mesh shown while a bulb is dark.
pub const OFF_SUFFIX: &str = "_off";

/// Finds the component a target name refers to.
pub trait NameResolver {
    fn resolve(&self, target: &str) -> Option<ComponentRef>;
}

/// Resolves names against a template hierarchy keyed by signal UUID.
///
/// The first descendant of the signal's template node whose name starts with
/// the target wins. The reference carries no anchor actor; it is pinned to the
/// instance's owner when played.
pub struct TemplateResolver<'a, S: SceneHost + ?Sized> {
    template: &'a S,
    /// The signal's template node; `None` when the signal isn't in the template.
    node: Option<EntityId>,
}

impl<'a, S: SceneHost + ?Sized> TemplateResolver<'a, S> {
    pub fn new(
        template: &'a S,
        uuid_to_node: &'a HashMap<String, EntityId>,
        signal_id: impl Into<String>,
    ) -> Self {
        let signal_id = signal_id.into();
        let node = uuid_to_node.get(&signal_id).copied();
        if node.is_none() {
            log::warn!("Signal {} not found inside this template.", signal_id);
        }
        Self { template, node }
    }
}

impl<S: SceneHost + ?Sized> NameResolver for TemplateResolver<'_, S> {
    fn resolve(&self, target: &str) -> Option<ComponentRef> {
        let node = self.node?;
        self.template
            .descendants(node)
            .into_iter()
            .filter_map(|id| self.template.name(id))
            .find(|name| name.starts_with(target))
            .map(ComponentRef::named)
    }
}

/// Resolves names by matching the live descendants of a spawned signal actor.
///
/// Each descendant's name is tested against `^<target>.*` with the target
/// taken literally; the first match in depth-first order wins.
pub struct PatternResolver<'a, S: SceneHost + ?Sized> {
    scene: &'a S,
    root: EntityId,
}

impl<'a, S: SceneHost + ?Sized> PatternResolver<'a, S> {
    pub fn new(scene: &'a S, root: EntityId) -> Self {
        Self { scene, root }
    }

    fn matcher(target: &str) -> Option<Regex> {
        match Regex::new(&format!("^{}.*", regex::escape(target))) {
            Ok(re) => Some(re),
            Err(e) => {
                log::warn!("Can't build a name pattern for bulb {:?}: {}", target, e);
                None
            }
        }
    }
}

impl<S: SceneHost + ?Sized> NameResolver for PatternResolver<'_, S> {
    fn resolve(&self, target: &str) -> Option<ComponentRef> {
        let pattern = Self::matcher(target)?;
        for id in self.scene.descendants(self.root) {
            let Some(name) = self.scene.name(id) else {
                continue;
            };
            if !pattern.is_match(name) {
                continue;
            }
            match self.scene.kind(id) {
                Some(NodeKind::Mesh) => {
                    let Some(actor) = self.scene.owner_actor(id) else {
                        continue;
                    };
                    return Some(ComponentRef::on_actor(actor, Some(name.to_string())));
                }
                Some(NodeKind::Actor) => return Some(ComponentRef::on_actor(id, None)),
                _ => {}
            }
        }
        None
    }
}

/// The components displaying one bulb.
#[derive(Debug, Clone, PartialEq)]
pub enum LightBinding {
    /// Separate meshes for the lit and dark appearance.
    Paired { on: LazyComponent, off: LazyComponent },
    /// One mesh, shown while lit.
    Legacy(LazyComponent),
}

impl LightBinding {
    /// True when every component this binding needs was found at resolve time.
    /// A pair with only one side found can't be played.
    pub fn is_complete(&self) -> bool {
        match self {
            LightBinding::Paired { on, off } => on.reference.is_some() && off.reference.is_some(),
            LightBinding::Legacy(single) => single.reference.is_some(),
        }
    }

    /// Nodes resolved so far, on before off.
    pub fn cached_handles(&self) -> Vec<EntityId> {
        match self {
            LightBinding::Paired { on, off } => on.cached().into_iter().chain(off.cached()).collect(),
            LightBinding::Legacy(single) => single.cached().into_iter().collect(),
        }
    }
}

/// Runtime binding of one bulb in one configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct LightInstanceState {
    pub bulb: String,
    pub state: BulbState,
    pub binding: LightBinding,
}

/// Resolved form of one configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalState {
    pub signal_id: String,
    pub asset_id: String,
    pub configuration: usize,
    pub lights: Vec<LightInstanceState>,
}

/// Build one [`SignalState`] per configuration of `asset`, in order.
///
/// Bulbs whose components can't be found are kept with empty references;
/// playback degrades to leaving them untouched.
pub fn resolve(
    signal_id: &str,
    asset_id: &str,
    asset: &SignalAsset,
    names: &dyn NameResolver,
    legacy: bool,
) -> Vec<SignalState> {
    asset
        .configurations
        .iter()
        .enumerate()
        .map(|(index, config)| {
            let lights = config
                .light_bulb_states
                .iter()
                .map(|bulb| {
                    let binding = if legacy {
                        LightBinding::Legacy(LazyComponent::new(names.resolve(&bulb.name)))
                    } else {
                        LightBinding::Paired {
                            on: LazyComponent::new(names.resolve(&format!("{}{}", bulb.name, ON_SUFFIX))),
                            off: LazyComponent::new(names.resolve(&format!("{}{}", bulb.name, OFF_SUFFIX))),
                        }
                    };
                    if !binding.is_complete() {
                        log::warn!(
                            "No component found for bulb {} of signal {} (configuration {})",
                            bulb.name,
                            signal_id,
                            index
                        );
                    }
                    LightInstanceState {
                        bulb: bulb.name.clone(),
                        state: bulb.state.clone(),
                        binding,
                    }
                })
                .collect();

            SignalState {
                signal_id: signal_id.to_string(),
                asset_id: asset_id.to_string(),
                configuration: index,
                lights,
            }
        })
        .collect()
}
