use crate::{Ray, Vec3};

/// One of the three coordinate axes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// Component index (0=X, 1=Y, 2=Z).
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

/// Axis-aligned bounding box used by the BVH.
///
/// The empty box has `min = +inf` and `max = -inf`, so a union with any box
/// or point yields that box or point.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Bounds3 {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds3 {
    /// A box that contains nothing.
    pub const EMPTY: Bounds3 = Bounds3 {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    /// Create a box from two arbitrary corner points.
    pub fn from_points(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// A degenerate box around a single point.
    pub fn from_point(p: Vec3) -> Self {
        Self { min: p, max: p }
    }

    /// True for the empty sentinel (or any inverted box).
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Grow this box to also enclose `other`.
    pub fn union(&mut self, other: &Bounds3) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    /// Grow this box to also enclose `p`.
    pub fn union_point(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    /// Returns a box enclosing both inputs.
    pub fn surrounding(a: &Bounds3, b: &Bounds3) -> Bounds3 {
        let mut out = *a;
        out.union(b);
        out
    }

    pub fn diagonal(&self) -> Vec3 {
        self.max - self.min
    }

    /// Returns the center point of the bounding box.
    pub fn centroid(&self) -> Vec3 {
        0.5 * self.min + 0.5 * self.max
    }

    /// Axis along which the box is longest. Ties prefer X, then Y, then Z.
    pub fn max_extent(&self) -> Axis {
        let d = self.diagonal();
        if d.x >= d.y && d.x >= d.z {
            Axis::X
        } else if d.y >= d.z {
            Axis::Y
        } else {
            Axis::Z
        }
    }

    pub fn surface_area(&self) -> f32 {
        if self.is_empty() {
            return 0.0;
        }
        let d = self.diagonal();
        2.0 * (d.x * d.y + d.x * d.z + d.y * d.z)
    }

    /// Slab test.
    ///
    /// `dir_is_pos[i]` selects `min` as the entry plane on axis `i`. Zero
    /// direction components are handled by the infinite entries of `inv_dir`;
    /// a NaN plane distance (origin exactly on a plane) is ignored by the
    /// `max`/`min` reductions.
    pub fn intersect_p(&self, ray: &Ray, inv_dir: Vec3, dir_is_pos: [bool; 3]) -> bool {
        let o = ray.origin();
        let near = |i: usize| {
            let plane = if dir_is_pos[i] {
                self.min[i]
            } else {
                self.max[i]
            };
            (plane - o[i]) * inv_dir[i]
        };
        let far = |i: usize| {
            let plane = if dir_is_pos[i] {
                self.max[i]
            } else {
                self.min[i]
            };
            (plane - o[i]) * inv_dir[i]
        };

        let t_enter = near(0).max(near(1)).max(near(2));
        let t_exit = far(0).min(far(1)).min(far(2));
        t_enter <= t_exit && t_exit >= 0.0
    }

    /// Slab test using the ray's own cached reciprocal and sign flags.
    #[inline]
    pub fn hit(&self, ray: &Ray) -> bool {
        self.intersect_p(ray, ray.inv_direction(), ray.dir_is_pos())
    }
}

impl Default for Bounds3 {
    fn default() -> Self {
        Self::EMPTY
    }
}
