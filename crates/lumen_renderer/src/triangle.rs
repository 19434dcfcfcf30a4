//! Triangle primitive for ray tracing.
//!
//! Uses the Möller-Trumbore algorithm for ray-triangle intersection.
//! Triangles are single-sided: rays arriving from behind the face miss.

use std::sync::atomic::{AtomicU32, Ordering};

use lumen_core::SurfaceMaterial;
use lumen_math::{Bounds3, Color, Ray, Vec3};
use rand::RngCore;

use crate::intersection::{Intersection, LightSample, SceneObject, DEFAULT_TINT};
use crate::sampling::gen_f32;
use crate::EPSILON;

/// An RGBA8 color that can be written through a shared reference.
#[derive(Debug)]
pub struct AtomicColor(AtomicU32);

impl AtomicColor {
    pub fn new(color: Color) -> Self {
        Self(AtomicU32::new(Self::pack(color)))
    }

    pub fn load(&self) -> Color {
        Self::unpack(self.0.load(Ordering::Relaxed))
    }

    pub fn store(&self, color: Color) {
        self.0.store(Self::pack(color), Ordering::Relaxed);
    }

    fn pack(color: Color) -> u32 {
        let c = (color.clamp(Color::ZERO, Color::ONE) * 255.0).round();
        u32::from_le_bytes([c.x as u8, c.y as u8, c.z as u8, 255])
    }

    fn unpack(bits: u32) -> Color {
        let [r, g, b, _] = bits.to_le_bytes();
        Color::new(r as f32, g as f32, b as f32) / 255.0
    }
}

/// A triangle primitive.
#[derive(Debug)]
pub struct Triangle {
    /// Vertices
    p0: Vec3,
    p1: Vec3,
    p2: Vec3,
    /// Edges p1-p0 and p2-p0
    e1: Vec3,
    e2: Vec3,
    /// Pre-computed face normal (unit length, counter-clockwise front)
    normal: Vec3,
    area: f32,
    bounds: Bounds3,
    emission: Color,
    kd: Color,
    tint: AtomicColor,
}

impl Triangle {
    /// Create a new triangle from three vertices.
    pub fn new(p0: Vec3, p1: Vec3, p2: Vec3, material: SurfaceMaterial) -> Self {
        let e1 = p1 - p0;
        let e2 = p2 - p0;
        let cross = e1.cross(e2);

        let mut bounds = Bounds3::from_point(p0);
        bounds.union_point(p1);
        bounds.union_point(p2);

        Self {
            p0,
            p1,
            p2,
            e1,
            e2,
            normal: cross.normalize_or_zero(),
            area: cross.length() * 0.5,
            bounds,
            emission: material.emission,
            kd: material.diffuse,
            tint: AtomicColor::new(DEFAULT_TINT),
        }
    }

    pub fn vertices(&self) -> [Vec3; 3] {
        [self.p0, self.p1, self.p2]
    }

    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    pub fn kd(&self) -> Color {
        self.kd
    }
}

impl SceneObject for Triangle {
    fn bounds(&self) -> Bounds3 {
        self.bounds
    }

    /// Möller-Trumbore ray-triangle intersection algorithm.
    fn intersect(&self, ray: &Ray, _debug: bool) -> Intersection<'_> {
        let miss = Intersection::default();
        let dir = ray.direction();

        // Back face
        if dir.dot(self.normal) > 0.0 {
            return miss;
        }

        let s1 = dir.cross(self.e2);
        let det = s1.dot(self.e1);
        // Parallel, or a zero direction
        if det.abs() < EPSILON {
            return miss;
        }

        let inv_det = 1.0 / det;
        let s = ray.origin() - self.p0;
        let u = s.dot(s1) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return miss;
        }

        let s2 = s.cross(self.e1);
        let v = dir.dot(s2) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return miss;
        }

        let t = self.e2.dot(s2) * inv_det;
        if !ray.t().contains(t) {
            return miss;
        }

        Intersection {
            hit: true,
            point: self.p0 * (1.0 - u - v) + self.p1 * u + self.p2 * v,
            normal: self.normal,
            distance: t,
            emission: self.emission,
            kd: self.kd,
            object: Some(self),
        }
    }

    fn area(&self) -> f32 {
        self.area
    }

    fn emission(&self) -> Color {
        self.emission
    }

    fn set_color(&self, color: Color) {
        self.tint.store(color);
    }

    fn color(&self) -> Color {
        self.tint.load()
    }

    fn sample(&self, rng: &mut dyn RngCore) -> LightSample {
        let x = gen_f32(rng).sqrt();
        let y = gen_f32(rng);
        LightSample {
            point: self.p0 * (1.0 - x) + self.p1 * (x * (1.0 - y)) + self.p2 * (x * y),
            normal: self.normal,
            emission: self.emission,
            pdf: 1.0 / self.area,
        }
    }
}
