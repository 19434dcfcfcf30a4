//! Random sampling helpers shared by the geometry and the integrators.

use std::f32::consts::PI;

use lumen_math::Vec3;
use rand::{Rng, RngCore};

/// Density of [`uniform_hemisphere`] with respect to solid angle.
pub const UNIFORM_HEMISPHERE_PDF: f32 = 1.0 / (2.0 * PI);

/// Uniform `f32` in `[0, 1)`.
#[inline]
pub fn gen_f32(rng: &mut dyn RngCore) -> f32 {
    rng.gen::<f32>()
}

/// Two unit vectors completing `n` to a right-handed orthonormal basis.
///
/// `n` must be unit length. Branchless construction after Duff et al.
pub fn orthonormal_basis(n: Vec3) -> (Vec3, Vec3) {
    let sign = 1.0_f32.copysign(n.z);
    let a = -1.0 / (sign + n.z);
    let b = n.x * n.y * a;
    let t = Vec3::new(1.0 + sign * n.x * n.x * a, sign * b, -sign * n.x);
    let s = Vec3::new(b, sign + n.y * n.y * a, -n.y);
    (t, s)
}

/// Direction drawn uniformly from the hemisphere around `normal`.
pub fn uniform_hemisphere(normal: Vec3, rng: &mut dyn RngCore) -> Vec3 {
    let z = gen_f32(rng);
    let r = (1.0 - z * z).max(0.0).sqrt();
    let phi = 2.0 * PI * gen_f32(rng);
    let (t, s) = orthonormal_basis(normal);
    (t * (r * phi.cos()) + s * (r * phi.sin()) + normal * z).normalize_or_zero()
}
