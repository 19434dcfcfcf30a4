//! SceneObject trait and Intersection record for ray-object queries.

use std::fmt;

use lumen_math::{Bounds3, Color, Ray, Vec3};
use rand::RngCore;

/// Record of a ray-object intersection.
///
/// When `hit` is false every other field is meaningless.
#[derive(Clone, Copy)]
pub struct Intersection<'a> {
    pub hit: bool,
    /// Point of intersection
    pub point: Vec3,
    /// Face normal of the hit primitive (not flipped towards the ray)
    pub normal: Vec3,
    /// Distance along the ray
    pub distance: f32,
    pub emission: Color,
    /// Diffuse reflectance
    pub kd: Color,
    /// The primitive that was hit. Borrowed from the scene, never owned.
    pub object: Option<&'a dyn SceneObject>,
}

impl Default for Intersection<'_> {
    fn default() -> Self {
        Self {
            hit: false,
            point: Vec3::ZERO,
            normal: Vec3::ZERO,
            distance: f32::INFINITY,
            emission: Color::ZERO,
            kd: Color::ZERO,
            object: None,
        }
    }
}

impl<'a> Intersection<'a> {
    /// True for a hit on a surface that emits light.
    pub fn is_emissive(&self) -> bool {
        self.hit && self.emission.length_squared() > 0.0
    }

    /// The closer of two results; a miss never wins over a hit.
    pub fn nearer(self, other: Intersection<'a>) -> Intersection<'a> {
        match (self.hit, other.hit) {
            (true, true) if other.distance < self.distance => other,
            (true, _) => self,
            (false, _) => other,
        }
    }
}

impl fmt::Debug for Intersection<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Intersection")
            .field("hit", &self.hit)
            .field("point", &self.point)
            .field("normal", &self.normal)
            .field("distance", &self.distance)
            .field("emission", &self.emission)
            .field("kd", &self.kd)
            .field("has_object", &self.object.is_some())
            .finish()
    }
}

/// A point drawn on an emissive surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightSample {
    pub point: Vec3,
    pub normal: Vec3,
    pub emission: Color,
    /// Probability density per unit area
    pub pdf: f32,
}

impl Default for LightSample {
    fn default() -> Self {
        Self {
            point: Vec3::ZERO,
            normal: Vec3::ZERO,
            emission: Color::ZERO,
            pdf: 0.0,
        }
    }
}

/// Debug tint applied to the nearest hit when `debug` tracing is on.
pub const DEBUG_HIT_COLOR: Color = Color::new(1.0, 0.0, 0.0);

/// Tint every object starts with.
pub const DEFAULT_TINT: Color = Color::new(0.5, 0.5, 0.5);

/// Anything the BVH can store: triangles, meshes, or boxes of either.
pub trait SceneObject: Send + Sync {
    /// World-space bounding box.
    fn bounds(&self) -> Bounds3;

    /// Nearest intersection within the ray's interval.
    ///
    /// `debug` is forwarded to nested trees so they can tint what they hit.
    fn intersect(&self, ray: &Ray, debug: bool) -> Intersection<'_>;

    /// Surface area.
    fn area(&self) -> f32;

    /// Emitted radiance.
    fn emission(&self) -> Color;

    /// Set the debug tint. Callable during traversal from any thread.
    fn set_color(&self, color: Color);

    /// Current debug tint.
    fn color(&self) -> Color {
        DEFAULT_TINT
    }

    /// Point on the surface drawn proportionally to area.
    fn sample(&self, rng: &mut dyn RngCore) -> LightSample;

    fn is_emissive(&self) -> bool {
        self.emission().length_squared() > 0.0
    }
}

impl<T: SceneObject + ?Sized> SceneObject for Box<T> {
    fn bounds(&self) -> Bounds3 {
        (**self).bounds()
    }

    fn intersect(&self, ray: &Ray, debug: bool) -> Intersection<'_> {
        (**self).intersect(ray, debug)
    }

    fn area(&self) -> f32 {
        (**self).area()
    }

    fn emission(&self) -> Color {
        (**self).emission()
    }

    fn set_color(&self, color: Color) {
        (**self).set_color(color)
    }

    fn color(&self) -> Color {
        (**self).color()
    }

    fn sample(&self, rng: &mut dyn RngCore) -> LightSample {
        (**self).sample(rng)
    }

    fn is_emissive(&self) -> bool {
        (**self).is_emissive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit_at(distance: f32) -> Intersection<'static> {
        Intersection {
            hit: true,
            distance,
            ..Default::default()
        }
    }

    #[test]
    fn test_default_is_miss() {
        let rec = Intersection::default();

        assert!(!rec.hit);
        assert_eq!(rec.distance, f32::INFINITY);
        assert!(rec.object.is_none());
        assert!(!rec.is_emissive());
    }

    #[test]
    fn test_nearer() {
        let near = hit_at(1.0);
        let far = hit_at(2.0);
        let miss = Intersection::default();

        assert_eq!(near.nearer(far).distance, 1.0);
        assert_eq!(far.nearer(near).distance, 1.0);
        assert_eq!(miss.nearer(far).distance, 2.0);
        assert_eq!(far.nearer(miss).distance, 2.0);
        assert!(!miss.nearer(Intersection::default()).hit);
    }
}
