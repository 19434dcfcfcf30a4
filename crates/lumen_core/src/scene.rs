//! Scene description types for Lumen.
//!
//! This is the renderer-agnostic view of a scene: named meshes with a
//! diffuse/emissive surface, a camera, optional point lights and the
//! render settings. The renderer builds its acceleration structures from it.

use lumen_math::{Color, Vec3};
use serde::{Deserialize, Serialize};

use crate::mesh::Mesh;
use crate::settings::RenderSettings;

/// Surface response of a mesh.
///
/// Only Lambertian reflection and constant emission are modelled.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceMaterial {
    /// Diffuse reflectance (RGB, 0-1)
    pub diffuse: Color,

    /// Emitted radiance (RGB, unbounded)
    pub emission: Color,
}

impl Default for SurfaceMaterial {
    fn default() -> Self {
        Self {
            diffuse: Color::new(0.5, 0.5, 0.5), // Grey default
            emission: Color::ZERO,
        }
    }
}

impl SurfaceMaterial {
    pub fn diffuse(diffuse: Color) -> Self {
        Self {
            diffuse,
            emission: Color::ZERO,
        }
    }

    pub fn emissive(emission: Color, diffuse: Color) -> Self {
        Self { diffuse, emission }
    }

    /// True if the surface emits any light.
    pub fn is_emissive(&self) -> bool {
        self.emission.length_squared() > 0.0
    }
}

/// A named mesh with its surface.
#[derive(Clone, Debug)]
pub struct SceneMesh {
    pub name: String,
    pub mesh: Mesh,
    pub material: SurfaceMaterial,
}

impl SceneMesh {
    pub fn new(name: impl Into<String>, mesh: Mesh, material: SurfaceMaterial) -> Self {
        Self {
            name: name.into(),
            mesh,
            material,
        }
    }
}

/// Pinhole camera placement.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraDesc {
    pub position: Vec3,
    pub look_at: Vec3,
    pub up: Vec3,
    /// Vertical field of view in degrees
    pub vfov: f32,
}

impl Default for CameraDesc {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            look_at: Vec3::new(0.0, 0.0, -1.0),
            up: Vec3::Y,
            vfov: 90.0,
        }
    }
}

/// Everything needed to render one image.
#[derive(Clone, Debug, Default)]
pub struct SceneDescription {
    pub meshes: Vec<SceneMesh>,
    pub camera: CameraDesc,
    /// Positions of white point lights used by the preview integrator
    pub point_lights: Vec<Vec3>,
    pub settings: RenderSettings,
}

impl SceneDescription {
    pub fn add_mesh(&mut self, mesh: SceneMesh) {
        self.meshes.push(mesh);
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(|m| m.mesh.triangle_count()).sum()
    }

    /// Total area of emissive meshes.
    pub fn emissive_area(&self) -> f32 {
        self.meshes
            .iter()
            .filter(|m| m.material.is_emissive())
            .map(|m| m.mesh.surface_area())
            .sum()
    }

    /// Get a mesh by name.
    pub fn find_mesh(&self, name: &str) -> Option<&SceneMesh> {
        self.meshes.iter().find(|m| m.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Mesh {
        Mesh::new(vec![Vec3::ZERO, Vec3::X, Vec3::Y], vec![0, 1, 2])
    }

    #[test]
    fn test_material_emissive() {
        assert!(!SurfaceMaterial::default().is_emissive());
        assert!(SurfaceMaterial::emissive(Color::ONE, Color::ZERO).is_emissive());
    }

    #[test]
    fn test_scene_counts() {
        let mut scene = SceneDescription::default();
        scene.add_mesh(SceneMesh::new("a", triangle(), SurfaceMaterial::default()));
        scene.add_mesh(SceneMesh::new(
            "light",
            triangle(),
            SurfaceMaterial::emissive(Color::splat(4.0), Color::ZERO),
        ));

        assert_eq!(scene.mesh_count(), 2);
        assert_eq!(scene.triangle_count(), 2);
        assert!((scene.emissive_area() - 0.5).abs() < 1e-6);
        assert!(scene.find_mesh("light").is_some());
        assert!(scene.find_mesh("missing").is_none());
    }
}
