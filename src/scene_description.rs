//! JSON description of an imported scene.
//!
//! Describes the node hierarchy produced by import, the signal instances
//! placed in it and the junctions that sequence them. Building a description
//! yields a populated [`SceneGraph`] and a ready [`TrafficController`].

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::asset::AssetLibrary;
use crate::controller::{Junction, Phase, TrafficController};
use crate::error::{Result, SignalError};
use crate::resolver::{NameResolver, PatternResolver, TemplateResolver};
use crate::scene_graph::{EntityId, NodeKind, SceneGraph, SceneNode};

fn default_kind() -> NodeKind {
    NodeKind::Group
}

fn default_visible() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct NodeDescription {
    pub name: String,
    #[serde(default = "default_kind")]
    pub kind: NodeKind,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    #[serde(default)]
    pub children: Vec<NodeDescription>,
}

/// A signal instance placed in the scene.
#[derive(Debug, Clone, Deserialize)]
pub struct SignalDescription {
    pub id: String,
    /// Id of the signal asset.
    pub asset: String,
    /// Path of the actor the signal belongs to.
    pub owner: String,
    #[serde(default)]
    pub legacy: bool,
    /// Path of a template node to resolve bulb names against instead of the
    /// owner's live descendants.
    #[serde(default)]
    pub template: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JunctionDescription {
    pub id: String,
    #[serde(default)]
    pub phases: Vec<Phase>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SceneDescription {
    #[serde(default)]
    pub nodes: Vec<NodeDescription>,
    #[serde(default)]
    pub signals: Vec<SignalDescription>,
    #[serde(default)]
    pub junctions: Vec<JunctionDescription>,
}

impl SceneDescription {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Create the node hierarchy.
    pub fn build_graph(&self) -> SceneGraph {
        let mut scene = SceneGraph::new();
        for node in &self.nodes {
            insert_node(&mut scene, node, None);
        }
        scene
    }

    /// Create the node hierarchy and resolve every signal and junction.
    pub fn build(&self, assets: AssetLibrary) -> Result<(SceneGraph, TrafficController)> {
        let scene = self.build_graph();
        let mut controller = TrafficController::new(assets);

        for signal in &self.signals {
            let owner = find(&scene, &signal.owner)?;
            let uuids: HashMap<String, EntityId>;
            let template;
            let pattern;
            let names: &dyn NameResolver = match &signal.template {
                Some(path) => {
                    uuids = HashMap::from([(signal.id.clone(), find(&scene, path)?)]);
                    template = TemplateResolver::new(&scene, &uuids, signal.id.as_str());
                    &template
                }
                None => {
                    pattern = PatternResolver::new(&scene, owner);
                    &pattern
                }
            };
            controller.add_signal(&signal.id, &signal.asset, owner, names, signal.legacy)?;
        }

        for junction in &self.junctions {
            controller.add_junction(Junction::new(junction.id.clone(), junction.phases.clone()));
        }

        log::info!(
            "Scene built: {} nodes, {} signals, {} junctions",
            scene.nodes.len(),
            controller.signals().len(),
            controller.junctions().len()
        );
        Ok((scene, controller))
    }
}

fn find(scene: &SceneGraph, path: &str) -> Result<EntityId> {
    scene
        .find_path(path)
        .ok_or_else(|| SignalError::UnknownNode(path.to_string()))
}

fn insert_node(scene: &mut SceneGraph, desc: &NodeDescription, parent: Option<EntityId>) {
    let mut node = SceneNode::new(desc.name.clone(), desc.kind);
    node.visible = desc.visible;
    node.metadata = desc.metadata.clone();
    let id = scene.insert(node, parent);
    for child in &desc.children {
        insert_node(scene, child, Some(id));
    }
}
