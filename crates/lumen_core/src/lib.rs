//! Lumen Core - renderer-agnostic scene description.
//!
//! This crate provides:
//!
//! - **Scene types**: `SceneDescription`, `SceneMesh`, `Mesh`, `SurfaceMaterial`
//! - **Configuration**: `RenderSettings` with serde defaults
//! - **Loading**: JSON scene files and the built-in Cornell box
//!
//! # Example
//!
//! ```ignore
//! use lumen_core::load_scene;
//!
//! let scene = load_scene("scene.json")?;
//! println!("Loaded {} meshes, {} triangles",
//!     scene.mesh_count(),
//!     scene.triangle_count());
//! ```

pub mod cornell;
pub mod loader;
pub mod mesh;
pub mod scene;
pub mod settings;

// Re-export commonly used types
pub use cornell::cornell_box;
pub use loader::{load_scene, load_scene_from_str, LoadError, LoadResult};
pub use mesh::{Mesh, MeshError};
pub use scene::{CameraDesc, SceneDescription, SceneMesh, SurfaceMaterial};
pub use settings::{IntegratorKind, PixelOrder, RenderSettings};
