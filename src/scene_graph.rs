//! Scene graph that signals are resolved against and drawn into.
//!
//! Nodes form a forest of actors, mesh components and plain group nodes.
//! Every non-actor node belongs to its nearest actor ancestor, mirroring how
//! an engine attaches components to actors.

use std::collections::HashMap;

/// Unique identifier for scene nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

/// What a scene node represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Actor,
    Mesh,
    Group,
}

/// A node in the scene.
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: String,
    pub kind: NodeKind,
    pub parent: Option<EntityId>,
    pub children: Vec<EntityId>,
    pub visible: bool,
    /// Import metadata attached to the node (segmentation tags, OpenDRIVE data).
    pub metadata: HashMap<String, String>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            parent: None,
            children: Vec::new(),
            visible: true,
            metadata: HashMap::new(),
        }
    }
}

/// Host scene operations needed by signal resolution and playback.
pub trait SceneHost {
    fn exists(&self, id: EntityId) -> bool;
    fn name(&self, id: EntityId) -> Option<&str>;
    fn kind(&self, id: EntityId) -> Option<NodeKind>;
    fn parent(&self, id: EntityId) -> Option<EntityId>;
    fn children(&self, id: EntityId) -> &[EntityId];
    fn is_visible(&self, id: EntityId) -> Option<bool>;
    fn set_visible(&mut self, id: EntityId, visible: bool);

    /// All descendants of `root` in depth-first pre-order, excluding `root`.
    fn descendants(&self, root: EntityId) -> Vec<EntityId> {
        let mut out = Vec::new();
        let mut stack: Vec<EntityId> = self.children(root).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    /// The actor a node belongs to (itself when it is an actor).
    fn owner_actor(&self, id: EntityId) -> Option<EntityId> {
        let mut current = Some(id);
        while let Some(node) = current {
            if self.kind(node)? == NodeKind::Actor {
                return Some(node);
            }
            current = self.parent(node);
        }
        None
    }

    /// Find a mesh component owned by `actor`.
    ///
    /// With a name, the first owned mesh with exactly that name is returned;
    /// without one, the actor's first mesh. Meshes of attached child actors
    /// are not considered.
    fn find_component(&self, actor: EntityId, name: Option<&str>) -> Option<EntityId> {
        let mut stack: Vec<EntityId> = self.children(actor).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            match self.kind(id) {
                Some(NodeKind::Actor) | None => continue,
                Some(NodeKind::Mesh) => {
                    if name.map_or(true, |n| self.name(id) == Some(n)) {
                        return Some(id);
                    }
                }
                Some(NodeKind::Group) => {}
            }
            stack.extend(self.children(id).iter().rev().copied());
        }
        None
    }
}

/// In-memory scene graph.
#[derive(Debug)]
pub struct SceneGraph {
    /// All nodes indexed by their ID.
    pub nodes: HashMap<EntityId, SceneNode>,
    /// Top-level nodes in insertion order.
    roots: Vec<EntityId>,
    /// Next node ID to assign.
    next_id: u64,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            roots: Vec::new(),
            next_id: 1,
        }
    }

    /// Generate a new unique node ID.
    fn new_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Insert a node under `parent` (or as a root) and return its ID.
    /// A parent that doesn't exist makes the node a root.
    pub fn insert(&mut self, mut node: SceneNode, parent: Option<EntityId>) -> EntityId {
        let id = self.new_id();
        let parent = parent.filter(|p| self.nodes.contains_key(p));
        node.parent = parent;
        match parent.and_then(|p| self.nodes.get_mut(&p)) {
            Some(p) => p.children.push(id),
            None => self.roots.push(id),
        }
        self.nodes.insert(id, node);
        id
    }

    pub fn create_actor(&mut self, name: &str, parent: Option<EntityId>) -> EntityId {
        self.insert(SceneNode::new(name, NodeKind::Actor), parent)
    }

    pub fn create_mesh(&mut self, name: &str, parent: EntityId) -> EntityId {
        self.insert(SceneNode::new(name, NodeKind::Mesh), Some(parent))
    }

    pub fn create_group(&mut self, name: &str, parent: EntityId) -> EntityId {
        self.insert(SceneNode::new(name, NodeKind::Group), Some(parent))
    }

    /// Destroy a node and its whole subtree.
    /// Returns true if the node existed.
    pub fn destroy(&mut self, id: EntityId) -> bool {
        let Some(parent) = self.nodes.get(&id).map(|n| n.parent) else {
            return false;
        };
        match parent.and_then(|p| self.nodes.get_mut(&p)) {
            Some(parent) => parent.children.retain(|&c| c != id),
            None => self.roots.retain(|&r| r != id),
        }
        let mut doomed = self.descendants(id);
        doomed.push(id);
        for d in doomed {
            self.nodes.remove(&d);
        }
        true
    }

    /// Get a reference to a node by ID.
    pub fn get(&self, id: EntityId) -> Option<&SceneNode> {
        self.nodes.get(&id)
    }

    /// Get a mutable reference to a node by ID.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(&id)
    }

    pub fn roots(&self) -> &[EntityId] {
        &self.roots
    }

    /// Look up a metadata value on a node.
    pub fn metadata(&self, id: EntityId, key: &str) -> Option<&str> {
        self.nodes.get(&id)?.metadata.get(key).map(String::as_str)
    }

    /// Resolve a `/`-separated path of node names, starting at a root.
    pub fn find_path(&self, path: &str) -> Option<EntityId> {
        let mut parts = path.split('/').filter(|p| !p.is_empty());
        let first = parts.next()?;
        let mut current = *self
            .roots
            .iter()
            .find(|&&r| self.name(r) == Some(first))?;
        for part in parts {
            current = *self
                .children(current)
                .iter()
                .find(|&&c| self.name(c) == Some(part))?;
        }
        Some(current)
    }

    /// Attached actors directly below `actor` (through group and mesh nodes).
    pub fn attached_actors(&self, actor: EntityId) -> Vec<EntityId> {
        let mut out = Vec::new();
        let mut stack: Vec<EntityId> = self.children(actor).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if self.kind(id) == Some(NodeKind::Actor) {
                out.push(id);
            } else {
                stack.extend(self.children(id).iter().rev().copied());
            }
        }
        out
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneHost for SceneGraph {
    fn exists(&self, id: EntityId) -> bool {
        self.nodes.contains_key(&id)
    }

    fn name(&self, id: EntityId) -> Option<&str> {
        self.nodes.get(&id).map(|n| n.name.as_str())
    }

    fn kind(&self, id: EntityId) -> Option<NodeKind> {
        self.nodes.get(&id).map(|n| n.kind)
    }

    fn parent(&self, id: EntityId) -> Option<EntityId> {
        self.nodes.get(&id)?.parent
    }

    fn children(&self, id: EntityId) -> &[EntityId] {
        self.nodes
            .get(&id)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    fn is_visible(&self, id: EntityId) -> Option<bool> {
        self.nodes.get(&id).map(|n| n.visible)
    }

    fn set_visible(&mut self, id: EntityId, visible: bool) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.visible = visible;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signal_head(scene: &mut SceneGraph) -> (EntityId, EntityId, EntityId) {
        let actor = scene.create_actor("Signal_01", None);
        let group = scene.create_group("Head", actor);
        let red = scene.create_mesh("red_on", group);
        (actor, group, red)
    }

    #[test]
    fn test_create_nodes() {
        let mut scene = SceneGraph::new();
        let (actor, group, red) = signal_head(&mut scene);

        assert!(scene.exists(red));
        assert_eq!(scene.kind(actor), Some(NodeKind::Actor));
        assert_eq!(scene.parent(red), Some(group));
        assert_eq!(scene.children(actor), &[group]);
        assert_eq!(scene.roots(), &[actor]);
        assert_eq!(scene.is_visible(red), Some(true));
    }

    #[test]
    fn test_descendants_are_depth_first() {
        let mut scene = SceneGraph::new();
        let (actor, group, red) = signal_head(&mut scene);
        let green = scene.create_mesh("green_on", group);
        let pole = scene.create_mesh("pole", actor);

        assert_eq!(scene.descendants(actor), vec![group, red, green, pole]);
    }

    #[test]
    fn test_owner_actor() {
        let mut scene = SceneGraph::new();
        let (actor, _, red) = signal_head(&mut scene);
        let bulb_actor = scene.create_actor("Bulb", Some(actor));
        let bulb_mesh = scene.create_mesh("StaticMesh", bulb_actor);

        assert_eq!(scene.owner_actor(red), Some(actor));
        assert_eq!(scene.owner_actor(bulb_mesh), Some(bulb_actor));
        assert_eq!(scene.owner_actor(actor), Some(actor));
    }

    #[test]
    fn test_find_component_stays_within_actor() {
        let mut scene = SceneGraph::new();
        let (actor, _, red) = signal_head(&mut scene);
        let child = scene.create_actor("Bulb", Some(actor));
        scene.create_mesh("green_on", child);

        assert_eq!(scene.find_component(actor, Some("red_on")), Some(red));
        assert_eq!(scene.find_component(actor, Some("green_on")), None);
        assert_eq!(scene.find_component(actor, None), Some(red));
    }

    #[test]
    fn test_set_visible() {
        let mut scene = SceneGraph::new();
        let (_, _, red) = signal_head(&mut scene);

        scene.set_visible(red, false);
        assert_eq!(scene.is_visible(red), Some(false));
    }

    #[test]
    fn test_find_path() {
        let mut scene = SceneGraph::new();
        let (_, _, red) = signal_head(&mut scene);

        assert_eq!(scene.find_path("Signal_01/Head/red_on"), Some(red));
        assert_eq!(scene.find_path("/Signal_01/Head/red_on"), Some(red));
        assert_eq!(scene.find_path("Signal_01/Tail"), None);
        assert_eq!(scene.find_path(""), None);
    }

    #[test]
    fn test_destroy_subtree() {
        let mut scene = SceneGraph::new();
        let (actor, group, red) = signal_head(&mut scene);

        assert!(scene.destroy(group));
        assert!(!scene.exists(group));
        assert!(!scene.exists(red));
        assert!(scene.children(actor).is_empty());
        assert!(!scene.destroy(group));
    }

    #[test]
    fn test_attached_actors() {
        let mut scene = SceneGraph::new();
        let root = scene.create_actor("Root", None);
        let group = scene.create_group("Props", root);
        let a = scene.create_actor("A", Some(group));
        let b = scene.create_actor("B", Some(root));
        scene.create_actor("Nested", Some(a));

        assert_eq!(scene.attached_actors(root), vec![a, b]);
    }
}
