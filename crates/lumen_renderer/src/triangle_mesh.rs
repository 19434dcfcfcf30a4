//! Triangle meshes with their own nested BVH.

use lumen_core::{Mesh, SurfaceMaterial};
use lumen_math::{Bounds3, Color, Ray};
use rand::RngCore;

use crate::bvh::{Bvh, BvhError};
use crate::intersection::{Intersection, LightSample, SceneObject, DEFAULT_TINT};
use crate::triangle::Triangle;

/// A named set of triangles sharing one surface, indexed by a private BVH.
///
/// To the scene-level tree the mesh is a single object; a ray that reaches
/// it descends into the nested tree and reports the triangle it hit.
#[derive(Debug)]
pub struct TriangleMesh {
    name: String,
    triangles: Vec<Triangle>,
    bvh: Bvh,
    emission: Color,
}

impl TriangleMesh {
    /// Triangulate `mesh` and build its tree.
    pub fn new(
        name: impl Into<String>,
        mesh: &Mesh,
        material: SurfaceMaterial,
        max_leaf_size: usize,
    ) -> Result<Self, BvhError> {
        let triangles: Vec<Triangle> = mesh
            .extract_triangle_vertices()
            .into_iter()
            .map(|[a, b, c]| Triangle::new(a, b, c, material))
            .collect();
        Self::from_triangles(name, triangles, material.emission, max_leaf_size)
    }

    pub fn from_triangles(
        name: impl Into<String>,
        triangles: Vec<Triangle>,
        emission: Color,
        max_leaf_size: usize,
    ) -> Result<Self, BvhError> {
        let bvh = Bvh::build(&triangles, max_leaf_size)?;
        let name = name.into();
        log::debug!(
            "Mesh '{}': {} triangles, BVH depth {}",
            name,
            triangles.len(),
            bvh.depth()
        );
        Ok(Self {
            name,
            triangles,
            bvh,
            emission,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn bvh(&self) -> &Bvh {
        &self.bvh
    }
}

impl SceneObject for TriangleMesh {
    fn bounds(&self) -> Bounds3 {
        self.bvh.bounds()
    }

    fn intersect(&self, ray: &Ray, debug: bool) -> Intersection<'_> {
        if !self.bvh.bounds().hit(ray) {
            return Intersection::default();
        }
        self.bvh.intersect(&self.triangles, ray, debug)
    }

    fn area(&self) -> f32 {
        self.bvh.area()
    }

    fn emission(&self) -> Color {
        self.emission
    }

    fn set_color(&self, color: Color) {
        self.bvh.tint_all(&self.triangles, color);
    }

    fn color(&self) -> Color {
        self.triangles
            .first()
            .map_or(DEFAULT_TINT, |t| t.color())
    }

    fn sample(&self, rng: &mut dyn RngCore) -> LightSample {
        match self.bvh.sample(&self.triangles, rng) {
            Some(sample) => LightSample {
                emission: self.emission,
                ..sample
            },
            None => LightSample::default(),
        }
    }
}
