//! OpenDRIVE export for imported scenes.
//!
//! The road network travels either embedded in the root actor's metadata or
//! as an `.xodr` file next to the imported scene. Both end up in the
//! simulator's OpenDRIVE map folder, named after the map.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::scene_graph::{EntityId, SceneGraph};

/// Metadata key holding the embedded OpenDRIVE document.
pub const OPENDRIVE_METADATA: &str = "OpenDRIVE";
pub const OPENDRIVE_EXTENSION: &str = "xodr";

/// Folder under the project content directory where maps' road networks live.
pub fn opendrive_dir(content_dir: &Path) -> PathBuf {
    content_dir.join("Carla").join("Maps").join("OpenDrive")
}

/// Write the OpenDRIVE document embedded in `actor`'s metadata.
///
/// Returns the written path, or `None` when the actor carries no document.
pub fn write_open_drive(
    scene: &SceneGraph,
    actor: EntityId,
    map_name: &str,
    content_dir: &Path,
) -> Result<Option<PathBuf>> {
    let Some(document) = scene.metadata(actor, OPENDRIVE_METADATA) else {
        log::info!("No OpenDRIVE data on actor {:?}", actor);
        return Ok(None);
    };

    let dir = opendrive_dir(content_dir);
    std::fs::create_dir_all(&dir)?;
    let path = dir.join(format!("{}.{}", map_name, OPENDRIVE_EXTENSION));
    std::fs::write(&path, document)?;
    log::info!("Wrote OpenDRIVE to {}", path.display());
    Ok(Some(path))
}

/// Copy the `.xodr` sidecar of an imported scene file into the map folder.
///
/// Returns the destination, or `None` when there is no sidecar.
pub fn copy_open_drive(scene_file: &Path, content_dir: &Path) -> Result<Option<PathBuf>> {
    let source = scene_file.with_extension(OPENDRIVE_EXTENSION);
    let Some(file_name) = source.file_name() else {
        return Ok(None);
    };
    if !source.is_file() {
        return Ok(None);
    }

    let dir = opendrive_dir(content_dir);
    std::fs::create_dir_all(&dir)?;
    let destination = dir.join(file_name);
    if let Err(e) = std::fs::copy(&source, &destination) {
        log::error!("Failed to copy OpenDrive to {}: {}", destination.display(), e);
        return Err(e.into());
    }
    Ok(Some(destination))
}
