use crate::{Interval, Vec3};

/// A ray in 3D space.
///
/// The direction is normalized on construction and the reciprocal direction
/// is cached for slab tests against bounding boxes. A zero-length direction
/// stays zero; such a ray hits no triangle.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    origin: Vec3,
    direction: Vec3,
    inv_direction: Vec3,
    dir_is_pos: [bool; 3],
    t: Interval,
}

impl Ray {
    /// Create a ray valid over `[0, f32::MAX]`.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self::with_interval(origin, direction, Interval::FORWARD)
    }

    /// Create a ray valid over the given parameter range.
    pub fn with_interval(origin: Vec3, direction: Vec3, t: Interval) -> Self {
        let direction = direction.normalize_or_zero();
        // IEEE division: a zero component gives a signed infinity, which the
        // slab test relies on instead of branching per axis.
        let inv_direction = Vec3::ONE / direction;
        // Sign bit rather than `> 0.0` so that +0.0 and -0.0 pick the planes
        // matching the sign of their infinite reciprocal.
        let dir_is_pos = [
            direction.x.is_sign_positive(),
            direction.y.is_sign_positive(),
            direction.z.is_sign_positive(),
        ];

        Self {
            origin,
            direction,
            inv_direction,
            dir_is_pos,
            t,
        }
    }

    /// Get the origin point of the ray.
    #[inline]
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    /// Get the (unit length or zero) direction of the ray.
    #[inline]
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Componentwise reciprocal of the direction.
    #[inline]
    pub fn inv_direction(&self) -> Vec3 {
        self.inv_direction
    }

    /// Per-axis flag: does the direction point towards +axis?
    #[inline]
    pub fn dir_is_pos(&self) -> [bool; 3] {
        self.dir_is_pos
    }

    /// Valid parameter range.
    #[inline]
    pub fn t(&self) -> Interval {
        self.t
    }

    /// Get the point along the ray at parameter t.
    ///
    /// Returns: origin + t * direction
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ray_normalizes_direction() {
        let ray = Ray::new(Vec3::new(1.0, 2.0, 3.0), Vec3::new(0.0, 4.0, 0.0));

        assert_eq!(ray.origin(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(ray.direction(), Vec3::Y);
        assert_eq!(ray.t(), Interval::FORWARD);
    }

    #[test]
    fn test_ray_at() {
        let ray = Ray::new(Vec3::ZERO, Vec3::X);

        assert_eq!(ray.at(0.0), Vec3::ZERO);
        assert_eq!(ray.at(1.0), Vec3::X);
        assert_eq!(ray.at(2.0), Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(ray.at(-1.0), Vec3::new(-1.0, 0.0, 0.0));
    }

    #[test]
    fn test_inverse_direction_of_axis_ray() {
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -2.0));
        let inv = ray.inv_direction();

        assert_eq!(inv.x, f32::INFINITY);
        assert_eq!(inv.y, f32::INFINITY);
        assert_eq!(inv.z, -1.0);
        assert_eq!(ray.dir_is_pos(), [true, true, false]);
    }

    #[test]
    fn test_zero_direction_stays_zero() {
        let ray = Ray::new(Vec3::ONE, Vec3::ZERO);

        assert_eq!(ray.direction(), Vec3::ZERO);
        assert!(!ray.inv_direction().is_nan());
        assert_eq!(ray.at(10.0), Vec3::ONE);
    }
}
