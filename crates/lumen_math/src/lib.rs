// Re-export glam for convenience
pub use glam::*;

// Lumen math types
mod bounds;
mod interval;
mod ray;

pub use bounds::{Axis, Bounds3};
pub use interval::Interval;
pub use ray::Ray;

/// Linear RGB color.
pub type Color = Vec3;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_operations() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 5.0, 6.0);
        let c = a + b;
        assert_eq!(c, Vec3::new(5.0, 7.0, 9.0));
    }

    #[test]
    fn test_ray_enters_bounds_at_expected_point() {
        let bounds = Bounds3::from_points(Vec3::new(2.0, -1.0, -1.0), Vec3::new(4.0, 1.0, 1.0));
        let ray = Ray::new(Vec3::ZERO, Vec3::X);

        assert!(bounds.hit(&ray));
        assert_eq!(ray.at(2.0), Vec3::new(2.0, 0.0, 0.0));
    }
}
