//! Lazily resolved references to mesh components.
//!
//! References are authored before the target component necessarily exists in
//! the scene, so they store a name and an anchor actor and are only turned
//! into a concrete node when first used.

use crate::scene_graph::{EntityId, SceneHost};

/// Names a mesh component on some actor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentRef {
    /// Component name; `None` selects the actor's primary mesh.
    pub component: Option<String>,
    /// Actor owning the component; `None` means the signal's own actor.
    pub other_actor: Option<EntityId>,
}

impl ComponentRef {
    pub fn named(component: impl Into<String>) -> Self {
        Self {
            component: Some(component.into()),
            other_actor: None,
        }
    }

    pub fn on_actor(actor: EntityId, component: Option<String>) -> Self {
        Self {
            component,
            other_actor: Some(actor),
        }
    }
}

/// A component reference plus its cached resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LazyComponent {
    /// `None` when resolution found nothing to reference.
    pub reference: Option<ComponentRef>,
    cached: Option<EntityId>,
}

impl LazyComponent {
    pub fn new(reference: Option<ComponentRef>) -> Self {
        Self {
            reference,
            cached: None,
        }
    }

    pub fn unresolved() -> Self {
        Self::default()
    }

    /// The cached node, if resolution has already succeeded.
    pub fn cached(&self) -> Option<EntityId> {
        self.cached
    }

    /// Resolve the reference against `scene`, caching the result.
    ///
    /// A missing anchor is pinned to `default_actor`. A cached node that no
    /// longer exists is dropped and resolved again.
    pub fn resolve<S: SceneHost + ?Sized>(
        &mut self,
        scene: &S,
        default_actor: EntityId,
    ) -> Option<EntityId> {
        if let Some(id) = self.cached {
            if scene.exists(id) {
                return Some(id);
            }
            self.cached = None;
        }

        let reference = self.reference.as_mut()?;
        let actor = *reference.other_actor.get_or_insert(default_actor);
        self.cached = scene.find_component(actor, reference.component.as_deref());
        self.cached
    }
}
