//! Mesh geometry representation for the Lumen scene description.
//!
//! A renderer-agnostic indexed triangle list. The renderer turns each mesh
//! into a set of single-sided triangles; winding is counter-clockwise when
//! seen from the front.

use lumen_math::{Bounds3, Vec3};
use thiserror::Error;

/// Structural problems in an indexed triangle list.
#[derive(Error, Debug, PartialEq)]
pub enum MeshError {
    #[error("index count {0} is not a multiple of three")]
    IndexCountNotMultipleOfThree(usize),

    #[error("index {index} out of bounds for {vertex_count} vertices")]
    IndexOutOfBounds { index: u32, vertex_count: usize },
}

/// A mesh consisting of vertex positions and triangle indices.
#[derive(Clone, Debug)]
pub struct Mesh {
    /// Vertex positions (one Vec3 per vertex)
    pub positions: Vec<Vec3>,

    /// Triangle indices (every 3 indices form a triangle)
    pub indices: Vec<u32>,

    /// Axis-aligned bounding box
    pub bounds: Bounds3,
}

impl Mesh {
    /// Create a new mesh from positions and indices.
    pub fn new(positions: Vec<Vec3>, indices: Vec<u32>) -> Self {
        let bounds = Self::compute_bounds(&positions);
        Self {
            positions,
            indices,
            bounds,
        }
    }

    /// A single quad `p0 p1 p2 p3` (counter-clockwise), split along `p0-p2`.
    pub fn quad(p0: Vec3, p1: Vec3, p2: Vec3, p3: Vec3) -> Self {
        Self::new(vec![p0, p1, p2, p3], vec![0, 1, 2, 0, 2, 3])
    }

    /// A quad wound so that its front face looks towards `target`.
    pub fn quad_facing(corners: [Vec3; 4], target: Vec3) -> Self {
        let [p0, p1, p2, p3] = corners;
        let normal = (p1 - p0).cross(p2 - p0);
        let center = (p0 + p1 + p2 + p3) * 0.25;
        if normal.dot(target - center) >= 0.0 {
            Self::quad(p0, p1, p2, p3)
        } else {
            Self::quad(p0, p3, p2, p1)
        }
    }

    /// Compute axis-aligned bounding box from positions.
    fn compute_bounds(positions: &[Vec3]) -> Bounds3 {
        positions.iter().fold(Bounds3::EMPTY, |mut acc, p| {
            acc.union_point(*p);
            acc
        })
    }

    /// Check index count and range.
    pub fn validate(&self) -> Result<(), MeshError> {
        if self.indices.len() % 3 != 0 {
            return Err(MeshError::IndexCountNotMultipleOfThree(self.indices.len()));
        }
        if let Some(&index) = self
            .indices
            .iter()
            .find(|&&i| i as usize >= self.positions.len())
        {
            return Err(MeshError::IndexOutOfBounds {
                index,
                vertex_count: self.positions.len(),
            });
        }
        Ok(())
    }

    /// Append another mesh, re-basing its indices.
    pub fn append(&mut self, other: &Mesh) {
        let base = self.positions.len() as u32;
        self.positions.extend_from_slice(&other.positions);
        self.indices.extend(other.indices.iter().map(|i| i + base));
        self.bounds.union(&other.bounds);
    }

    /// Move every vertex by `offset`.
    pub fn translate(&mut self, offset: Vec3) {
        for p in &mut self.positions {
            *p += offset;
        }
        self.bounds = Self::compute_bounds(&self.positions);
    }

    /// Get the number of triangles in the mesh.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Extract triangle vertices as [v0, v1, v2] triplets.
    ///
    /// Triangles referencing missing vertices are skipped with a warning.
    pub fn extract_triangle_vertices(&self) -> Vec<[Vec3; 3]> {
        let mut triangles = Vec::with_capacity(self.triangle_count());

        for chunk in self.indices.chunks_exact(3) {
            let i0 = chunk[0] as usize;
            let i1 = chunk[1] as usize;
            let i2 = chunk[2] as usize;

            if i0 >= self.positions.len()
                || i1 >= self.positions.len()
                || i2 >= self.positions.len()
            {
                log::warn!(
                    "Invalid triangle indices: [{}, {}, {}], vertex count: {}",
                    i0,
                    i1,
                    i2,
                    self.positions.len()
                );
                continue;
            }

            triangles.push([self.positions[i0], self.positions[i1], self.positions[i2]]);
        }

        triangles
    }

    /// Total surface area of all triangles.
    pub fn surface_area(&self) -> f32 {
        self.extract_triangle_vertices()
            .iter()
            .map(|[a, b, c]| (*b - *a).cross(*c - *a).length() * 0.5)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mesh_creation() {
        let positions = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ];
        let mesh = Mesh::new(positions, vec![0, 1, 2]);

        assert_eq!(mesh.positions.len(), 3);
        assert_eq!(mesh.triangle_count(), 1);
        assert!(mesh.validate().is_ok());
        assert!((mesh.surface_area() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_bounds_computation() {
        let positions = vec![
            Vec3::new(-1.0, -2.0, -3.0),
            Vec3::new(4.0, 5.0, 6.0),
            Vec3::new(0.0, 0.0, 0.0),
        ];
        let mesh = Mesh::new(positions, vec![0, 1, 2]);

        assert_eq!(mesh.bounds.min, Vec3::new(-1.0, -2.0, -3.0));
        assert_eq!(mesh.bounds.max, Vec3::new(4.0, 5.0, 6.0));
    }

    #[test]
    fn test_validate_rejects_bad_indices() {
        let positions = vec![Vec3::ZERO, Vec3::X, Vec3::Y];

        let short = Mesh::new(positions.clone(), vec![0, 1]);
        assert_eq!(
            short.validate(),
            Err(MeshError::IndexCountNotMultipleOfThree(2))
        );

        let out_of_range = Mesh::new(positions, vec![0, 1, 7]);
        assert_eq!(
            out_of_range.validate(),
            Err(MeshError::IndexOutOfBounds {
                index: 7,
                vertex_count: 3
            })
        );
    }

    #[test]
    fn test_quad_and_append() {
        let mut floor = Mesh::quad(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(2.0, 0.0, -2.0),
            Vec3::new(0.0, 0.0, -2.0),
        );
        assert_eq!(floor.triangle_count(), 2);
        assert!((floor.surface_area() - 4.0).abs() < 1e-5);

        let other = Mesh::new(vec![Vec3::ZERO, Vec3::X, Vec3::Y], vec![0, 1, 2]);
        floor.append(&other);

        assert_eq!(floor.positions.len(), 7);
        assert_eq!(&floor.indices[6..], &[4, 5, 6]);
        assert!(floor.validate().is_ok());
    }

    #[test]
    fn test_quad_facing_flips_winding() {
        let corners = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ];
        for target in [Vec3::new(0.5, 0.5, 3.0), Vec3::new(0.5, 0.5, -3.0)] {
            let quad = Mesh::quad_facing(corners, target);
            for [a, b, c] in quad.extract_triangle_vertices() {
                let normal = (b - a).cross(c - a);
                assert!(normal.dot(target - a) > 0.0);
            }
        }
    }

    #[test]
    fn test_translate() {
        let mut mesh = Mesh::new(vec![Vec3::ZERO, Vec3::X, Vec3::Y], vec![0, 1, 2]);
        mesh.translate(Vec3::new(0.0, 0.0, 5.0));

        assert_eq!(mesh.bounds.min.z, 5.0);
        assert_eq!(mesh.bounds.centroid(), Vec3::new(0.5, 0.5, 5.0));
    }

    #[test]
    fn test_extract_triangle_vertices_skips_invalid() {
        let positions = vec![Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::ONE];
        let mesh = Mesh::new(positions.clone(), vec![0, 1, 2, 1, 9, 2, 1, 3, 2]);
        let triangles = mesh.extract_triangle_vertices();

        assert_eq!(triangles.len(), 2);
        assert_eq!(triangles[1], [positions[1], positions[3], positions[2]]);
    }
}
