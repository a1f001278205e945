pub mod error;
pub mod scene_graph;

// Signal resolution and playback
pub mod asset;
pub mod component_ref;
pub mod resolver;
pub mod signal_player;
pub mod controller;
pub mod playback;

// Scene import helpers
pub mod scene_description;
pub mod segmentation;
pub mod opendrive;

pub mod cli;

pub use asset::{AssetLibrary, AssetStore, BulbState, Configuration, LightBulbState, SignalAsset};
pub use controller::{Junction, Phase, PhaseSignal, TrafficController};
pub use error::SignalError;
pub use resolver::{LightBinding, LightInstanceState, NameResolver, PatternResolver, SignalState, TemplateResolver};
pub use scene_graph::{EntityId, NodeKind, SceneGraph, SceneHost};
pub use signal_player::{PlayerConfig, SignalPlayer};
