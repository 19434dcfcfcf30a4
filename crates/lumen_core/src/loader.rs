//! JSON scene loading.
//!
//! A scene file lists meshes as raw position/index arrays together with
//! their surface, plus optional camera, point lights and render settings:
//!
//! ```json
//! {
//!   "camera": { "position": [0, 1, 3], "look_at": [0, 1, 0], "vfov": 60 },
//!   "render": { "width": 320, "height": 240, "samples_per_pixel": 32 },
//!   "meshes": [
//!     {
//!       "name": "floor",
//!       "positions": [[-1, 0, 1], [1, 0, 1], [1, 0, -1], [-1, 0, -1]],
//!       "indices": [0, 1, 2, 0, 2, 3],
//!       "material": { "diffuse": [0.7, 0.7, 0.7] }
//!     }
//!   ]
//! }
//! ```

use std::path::Path;

use lumen_math::Vec3;
use serde::Deserialize;
use thiserror::Error;

use crate::cornell::cornell_box;
use crate::mesh::{Mesh, MeshError};
use crate::scene::{CameraDesc, SceneDescription, SceneMesh, SurfaceMaterial};
use crate::settings::RenderSettings;

/// Errors that can occur during scene loading.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No geometry found in scene file")]
    NoGeometry,

    #[error("Invalid mesh '{name}': {source}")]
    InvalidMesh {
        name: String,
        #[source]
        source: MeshError,
    },
}

/// Result type for loading operations.
pub type LoadResult<T> = Result<T, LoadError>;

#[derive(Deserialize)]
struct SceneFile {
    #[serde(default)]
    camera: Option<CameraDesc>,
    #[serde(default)]
    render: RenderSettings,
    #[serde(default)]
    point_lights: Vec<Vec3>,
    /// Start from the built-in Cornell box and add `meshes` to it.
    #[serde(default)]
    cornell_box: bool,
    #[serde(default)]
    meshes: Vec<MeshEntry>,
}

#[derive(Deserialize)]
struct MeshEntry {
    name: String,
    positions: Vec<Vec3>,
    indices: Vec<u32>,
    #[serde(default)]
    material: SurfaceMaterial,
    #[serde(default)]
    offset: Vec3,
}

impl MeshEntry {
    fn into_scene_mesh(self) -> LoadResult<SceneMesh> {
        let mut mesh = Mesh::new(self.positions, self.indices);
        mesh.validate().map_err(|source| LoadError::InvalidMesh {
            name: self.name.clone(),
            source,
        })?;
        if self.offset != Vec3::ZERO {
            mesh.translate(self.offset);
        }
        Ok(SceneMesh::new(self.name, mesh, self.material))
    }
}

/// Load a scene description from a JSON file.
pub fn load_scene<P: AsRef<Path>>(path: P) -> LoadResult<SceneDescription> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let scene = load_scene_from_str(&text)?;
    log::info!(
        "Loaded {} meshes ({} triangles) from {}",
        scene.mesh_count(),
        scene.triangle_count(),
        path.display()
    );
    Ok(scene)
}

/// Parse a scene description from a JSON string.
pub fn load_scene_from_str(text: &str) -> LoadResult<SceneDescription> {
    let file: SceneFile = serde_json::from_str(text)?;

    let mut scene = if file.cornell_box {
        cornell_box()
    } else {
        SceneDescription::default()
    };
    scene.settings = file.render;
    if let Some(camera) = file.camera {
        scene.camera = camera;
    }
    scene.point_lights.extend(file.point_lights);

    for entry in file.meshes {
        let mesh = entry.into_scene_mesh()?;
        if mesh.mesh.triangle_count() == 0 {
            log::warn!("Skipping mesh '{}' without triangles", mesh.name);
            continue;
        }
        scene.add_mesh(mesh);
    }

    if scene.meshes.is_empty() {
        return Err(LoadError::NoGeometry);
    }

    Ok(scene)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    const FLOOR: &str = r#"{
        "camera": { "position": [0, 1, 3], "look_at": [0, 1, 0], "vfov": 60 },
        "render": { "width": 32, "height": 16 },
        "point_lights": [[0, 4, 0]],
        "meshes": [
            {
                "name": "floor",
                "positions": [[-1, 0, 1], [1, 0, 1], [1, 0, -1], [-1, 0, -1]],
                "indices": [0, 1, 2, 0, 2, 3],
                "material": { "diffuse": [0.7, 0.7, 0.7] },
                "offset": [0, -1, 0]
            }
        ]
    }"#;

    #[test]
    fn test_load_from_string() {
        init_logger();
        let scene = load_scene_from_str(FLOOR).unwrap();

        assert_eq!(scene.mesh_count(), 1);
        assert_eq!(scene.triangle_count(), 2);
        assert_eq!(scene.settings.width, 32);
        assert_eq!(scene.settings.max_depth, 5);
        assert_eq!(scene.camera.vfov, 60.0);
        assert_eq!(scene.camera.up, Vec3::Y);
        assert_eq!(scene.point_lights, vec![Vec3::new(0.0, 4.0, 0.0)]);

        let floor = scene.find_mesh("floor").unwrap();
        assert_eq!(floor.mesh.bounds.min.y, -1.0);
        assert_eq!(floor.material.emission, Vec3::ZERO);
    }

    #[test]
    fn test_empty_scene_is_error() {
        init_logger();
        let err = load_scene_from_str(r#"{ "meshes": [] }"#).unwrap_err();
        assert!(matches!(err, LoadError::NoGeometry));
    }

    #[test]
    fn test_invalid_mesh_is_error() {
        init_logger();
        let text = r#"{
            "meshes": [ { "name": "bad", "positions": [[0,0,0]], "indices": [0, 1, 2] } ]
        }"#;
        let err = load_scene_from_str(text).unwrap_err();

        match err {
            LoadError::InvalidMesh { name, source } => {
                assert_eq!(name, "bad");
                assert_eq!(
                    source,
                    MeshError::IndexOutOfBounds {
                        index: 1,
                        vertex_count: 1
                    }
                );
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_malformed_json_is_error() {
        init_logger();
        let err = load_scene_from_str("{ not json").unwrap_err();
        assert!(matches!(err, LoadError::Json(_)));
    }

    #[test]
    fn test_cornell_box_flag() {
        init_logger();
        let scene = load_scene_from_str(r#"{ "cornell_box": true }"#).unwrap();

        assert!(scene.emissive_area() > 0.0);
        assert!(scene.find_mesh("light").is_some());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        init_logger();
        let err = load_scene("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, LoadError::Io(_)));
    }
}
