//! Semantic segmentation folders for imported meshes and actors.
//!
//! Imported nodes carry a segmentation tag in their metadata. The simulator
//! tags meshes by the folder they live in, so each tag maps to a folder name
//! placed next to the mesh's geometry folder.

use crate::scene_graph::{EntityId, SceneGraph, SceneHost};

pub const ACTOR_SEGMENTATION: &str = "ActorSegmentation";
pub const MESH_SEGMENTATION: &str = "MeshSegmentation";
pub const VEHICLE_SEGMENTATION: &str = "VehicleSegmentation";
/// Metadata key holding a mesh's asset package path.
pub const MESH_PACKAGE: &str = "MeshPackage";

const FALLBACK_FOLDER: &str = "None";
const UNDEFINED: &str = "UNDEFINED";
const SIGN_FOLDER: &str = "TrafficSign";

/// Folder name for a segmentation tag.
pub fn folder_for(tag: &str) -> Option<&'static str> {
    let folder = match tag {
        "Uncategorized" => "None",
        "Road" => "Road",
        "Sidewalk" => "Sidewalk",
        "Curb" => "Sidewalk",
        "Gutter" => "Road",
        "Marking" => "RoadLine",
        "Ground" => "Ground",
        "Building" => "Building",
        "Vehicle" => "Vehicles",
        "Bike" => "Vehicles",
        "Pedestrian" => "Pedestrian",
        "Sign" => "TrafficSign",
        "Signal" => "TrafficLight",
        "Foliage" => "Vegetation",
        "Prop" => "Other",
        "Bridge" => "Bridge",
        "UNDEFINED" => "None",
        _ => return None,
    };
    Some(folder)
}

/// `<map>/<geometry>/<folder>` for a mesh package like `/Game/<map>/<geometry>/<mesh>`.
pub fn segmentation_folder_name(package: &str, folder: &str) -> Option<String> {
    let parts: Vec<&str> = package.split('/').filter(|p| !p.is_empty()).collect();
    if parts.len() < 3 {
        return None;
    }
    let geometry = parts[parts.len() - 2];
    let map = parts[parts.len() - 3];
    Some(format!("{}/{}/{}", map, geometry, folder))
}

/// Folder name for a mesh tag. Unknown tags map to `UNDEFINED`; any tag
/// ending in `Sign` is a traffic sign.
pub fn mesh_folder(tag: &str) -> &'static str {
    if tag.ends_with("Sign") {
        return SIGN_FOLDER;
    }
    folder_for(tag).unwrap_or(UNDEFINED)
}

/// Folder name for an actor tag. Unknown tags map to `None`, unless they end
/// in `Sign`.
pub fn actor_folder(tag: &str) -> &'static str {
    let folder = folder_for(tag).unwrap_or(FALLBACK_FOLDER);
    if folder == FALLBACK_FOLDER && tag.ends_with("Sign") {
        SIGN_FOLDER
    } else {
        folder
    }
}

/// Target folder for a mesh node, from its segmentation tag and package.
pub fn categorize_mesh(scene: &SceneGraph, mesh: EntityId) -> Option<String> {
    let tag = scene.metadata(mesh, MESH_SEGMENTATION)?;
    let package = scene.metadata(mesh, MESH_PACKAGE)?;
    segmentation_folder_name(package, mesh_folder(tag))
}

/// Segmentation folder of an actor, if it is tagged.
pub fn categorize_actor(scene: &SceneGraph, actor: EntityId) -> Option<&'static str> {
    match scene.metadata(actor, ACTOR_SEGMENTATION) {
        Some(tag) => Some(actor_folder(tag)),
        None => {
            log::debug!("No segmentation data on {:?}", scene.name(actor));
            None
        }
    }
}

/// Every actor at or below `root` (following attached actors) that carries
/// an actor segmentation tag.
pub fn segmented_actors(scene: &SceneGraph, root: EntityId) -> Vec<EntityId> {
    let mut found = Vec::new();
    let mut stack = vec![root];
    while let Some(actor) = stack.pop() {
        stack.extend(scene.attached_actors(actor));
        if scene.metadata(actor, ACTOR_SEGMENTATION).is_some() {
            found.push(actor);
        }
    }
    found
}

/// Mesh packages of a vehicle actor tree and the folder they belong in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VehicleCategory {
    pub meshes: Vec<String>,
    pub folder: Option<String>,
}

/// Collect the primary mesh package of each actor in a tagged vehicle tree.
/// The folder is derived from the first mesh found.
pub fn categorize_vehicles(scene: &SceneGraph, actor: EntityId) -> VehicleCategory {
    let Some(tag) = scene.metadata(actor, VEHICLE_SEGMENTATION) else {
        return VehicleCategory::default();
    };

    let mut meshes = Vec::new();
    let mut stack = vec![actor];
    while let Some(current) = stack.pop() {
        stack.extend(scene.attached_actors(current));
        let package = scene
            .find_component(current, None)
            .and_then(|mesh| scene.metadata(mesh, MESH_PACKAGE));
        if let Some(package) = package {
            meshes.push(package.to_string());
        }
    }

    let folder = meshes
        .first()
        .and_then(|package| segmentation_folder_name(package, tag));
    VehicleCategory { meshes, folder }
}

/// Whether the simulator version sorts vehicles into the Cityscapes
/// ontology, i.e. is newer than 0.9.13.
pub fn should_categorize_vehicles_to_cityscape(version: &str) -> bool {
    let parts: Vec<&str> = version.split('.').collect();
    if parts.len() < 3 {
        return false;
    }
    let num = |s: &str| s.trim().parse::<u32>().unwrap_or(0);
    (num(parts[0]), num(parts[1]), num(parts[2])) > (0, 9, 13)
}
