//! Bounding Volume Hierarchy (BVH) acceleration structure.
//!
//! A binary tree over a slice of [`SceneObject`]s built with a median split
//! on the longest centroid axis. The tree stores indices into that slice and
//! never owns geometry; traversal and sampling take the same slice back.

use lumen_math::{Bounds3, Ray};
use rand::RngCore;
use thiserror::Error;

use crate::intersection::{Intersection, LightSample, SceneObject, DEBUG_HIT_COLOR};
use crate::sampling::gen_f32;

/// Errors raised while building a BVH.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BvhError {
    #[error("invalid argument: max_leaf_size must be at least 1 (got {max_leaf_size})")]
    InvalidArgument { max_leaf_size: usize },
}

/// BVH node - either a branch with two children or a leaf with primitives.
#[derive(Debug)]
pub enum BvhNode {
    /// Internal node with two children.
    Branch {
        left: Box<BvhNode>,
        right: Box<BvhNode>,
        bounds: Bounds3,
        area: f32,
    },
    /// Leaf node holding a non-empty list of primitive indices.
    Leaf {
        primitives: Vec<usize>,
        bounds: Bounds3,
        area: f32,
    },
}

impl BvhNode {
    pub fn bounds(&self) -> Bounds3 {
        match self {
            BvhNode::Branch { bounds, .. } | BvhNode::Leaf { bounds, .. } => *bounds,
        }
    }

    /// Summed surface area of the primitives below this node.
    pub fn area(&self) -> f32 {
        match self {
            BvhNode::Branch { area, .. } | BvhNode::Leaf { area, .. } => *area,
        }
    }
}

/// Per-primitive data gathered once before the recursive build.
struct BuildEntry {
    index: usize,
    bounds: Bounds3,
    centroid: lumen_math::Vec3,
    area: f32,
}

/// A bounding volume hierarchy over an external primitive slice.
#[derive(Debug)]
pub struct Bvh {
    root: Option<Box<BvhNode>>,
    primitive_count: usize,
}

impl Bvh {
    /// An empty tree; every query misses.
    pub fn empty() -> Self {
        Self {
            root: None,
            primitive_count: 0,
        }
    }

    /// Build a tree over `primitives` with at most `max_leaf_size` per leaf.
    pub fn build<P: SceneObject>(primitives: &[P], max_leaf_size: usize) -> Result<Self, BvhError> {
        if max_leaf_size == 0 {
            return Err(BvhError::InvalidArgument { max_leaf_size });
        }
        if primitives.is_empty() {
            return Ok(Self::empty());
        }

        let mut entries: Vec<BuildEntry> = primitives
            .iter()
            .enumerate()
            .map(|(index, p)| {
                let bounds = p.bounds();
                BuildEntry {
                    index,
                    bounds,
                    centroid: bounds.centroid(),
                    area: p.area(),
                }
            })
            .collect();

        let root = Self::build_node(&mut entries, max_leaf_size);
        Ok(Self {
            root: Some(root),
            primitive_count: primitives.len(),
        })
    }

    /// Recursive construction over a non-empty slice.
    ///
    /// Median split: sort by centroid on the longest centroid axis and give
    /// the left child the extra element when the count is odd.
    fn build_node(entries: &mut [BuildEntry], max_leaf_size: usize) -> Box<BvhNode> {
        let n = entries.len();

        if n <= max_leaf_size {
            let bounds = entries.iter().fold(Bounds3::EMPTY, |mut acc, e| {
                acc.union(&e.bounds);
                acc
            });
            return Box::new(BvhNode::Leaf {
                primitives: entries.iter().map(|e| e.index).collect(),
                bounds,
                area: entries.iter().map(|e| e.area).sum(),
            });
        }

        let centroid_bounds = entries.iter().fold(Bounds3::EMPTY, |mut acc, e| {
            acc.union_point(e.centroid);
            acc
        });
        let axis = centroid_bounds.max_extent().index();

        entries.sort_unstable_by(|a, b| {
            a.centroid[axis]
                .partial_cmp(&b.centroid[axis])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mid = n.div_ceil(2);
        let (left_entries, right_entries) = entries.split_at_mut(mid);
        let left = Self::build_node(left_entries, max_leaf_size);
        let right = Self::build_node(right_entries, max_leaf_size);

        let bounds = Bounds3::surrounding(&left.bounds(), &right.bounds());
        let area = left.area() + right.area();
        Box::new(BvhNode::Branch {
            left,
            right,
            bounds,
            area,
        })
    }

    pub fn root(&self) -> Option<&BvhNode> {
        self.root.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Number of primitives the tree was built over.
    pub fn primitive_count(&self) -> usize {
        self.primitive_count
    }

    /// Bound of the whole tree; empty for an empty tree.
    pub fn bounds(&self) -> Bounds3 {
        self.root().map_or(Bounds3::EMPTY, BvhNode::bounds)
    }

    /// Summed primitive area; zero for an empty tree.
    pub fn area(&self) -> f32 {
        self.root().map_or(0.0, BvhNode::area)
    }

    /// Nearest intersection of `ray` with `primitives`.
    ///
    /// With `debug` set the nearest primitive is tinted red. Primitives are
    /// queried without `debug` so only the overall winner is tinted.
    pub fn intersect<'a, P: SceneObject>(
        &self,
        primitives: &'a [P],
        ray: &Ray,
        debug: bool,
    ) -> Intersection<'a> {
        let Some(root) = self.root() else {
            return Intersection::default();
        };

        let rec = Self::intersect_node(root, primitives, ray);
        if debug && rec.hit {
            if let Some(object) = rec.object {
                object.set_color(DEBUG_HIT_COLOR);
            }
        }
        rec
    }

    fn intersect_node<'a, P: SceneObject>(
        node: &BvhNode,
        primitives: &'a [P],
        ray: &Ray,
    ) -> Intersection<'a> {
        if !node.bounds().hit(ray) {
            return Intersection::default();
        }

        match node {
            BvhNode::Branch { left, right, .. } => {
                let hit_left = Self::intersect_node(left, primitives, ray);
                let hit_right = Self::intersect_node(right, primitives, ray);
                hit_left.nearer(hit_right)
            }
            BvhNode::Leaf {
                primitives: indices,
                ..
            } => indices
                .iter()
                .map(|&i| primitives[i].intersect(ray, false))
                .fold(Intersection::default(), Intersection::nearer),
        }
    }

    /// Draw a point on the primitives by descending the tree.
    ///
    /// Returns `None` for an empty tree. The tree must have non-zero area.
    pub fn sample<P: SceneObject>(
        &self,
        primitives: &[P],
        rng: &mut dyn RngCore,
    ) -> Option<LightSample> {
        let root = self.root()?;
        let total = root.area();
        debug_assert!(total > 0.0, "sampling a BVH without surface area");

        let p = gen_f32(rng).sqrt() * total;
        let mut sample = Self::sample_node(root, primitives, p, rng);
        sample.pdf /= total;
        Some(sample)
    }

    fn sample_node<P: SceneObject>(
        node: &BvhNode,
        primitives: &[P],
        p: f32,
        rng: &mut dyn RngCore,
    ) -> LightSample {
        match node {
            BvhNode::Branch { left, right, .. } => {
                if p < left.area() {
                    Self::sample_node(left, primitives, p, rng)
                } else {
                    Self::sample_node(right, primitives, p - left.area(), rng)
                }
            }
            BvhNode::Leaf {
                primitives: indices,
                area,
                ..
            } => {
                // Walk the leaf by the remaining p; float round-off keeps the last one
                let mut chosen = indices[0];
                let mut acc = 0.0;
                for &i in indices {
                    chosen = i;
                    acc += primitives[i].area();
                    if p < acc {
                        break;
                    }
                }
                let mut sample = primitives[chosen].sample(rng);
                sample.pdf *= area;
                sample
            }
        }
    }

    /// Reset the debug tint of every primitive.
    pub fn tint_all<P: SceneObject>(&self, primitives: &[P], color: lumen_math::Color) {
        let mut stack: Vec<&BvhNode> = self.root().into_iter().collect();
        while let Some(node) = stack.pop() {
            match node {
                BvhNode::Branch { left, right, .. } => {
                    stack.push(left);
                    stack.push(right);
                }
                BvhNode::Leaf {
                    primitives: indices,
                    ..
                } => {
                    for &i in indices {
                        primitives[i].set_color(color);
                    }
                }
            }
        }
    }

    /// Bounds of every node at `depth` (root is depth 0).
    ///
    /// Leaves shallower than `depth` are not repeated.
    pub fn bounds_at_depth(&self, depth: usize) -> Vec<Bounds3> {
        let mut out = Vec::new();
        let mut level: Vec<&BvhNode> = self.root().into_iter().collect();
        for _ in 0..depth {
            level = level
                .into_iter()
                .filter_map(|node| match node {
                    BvhNode::Branch { left, right, .. } => Some([&**left, &**right]),
                    BvhNode::Leaf { .. } => None,
                })
                .flatten()
                .collect();
        }
        out.extend(level.iter().map(|n| n.bounds()));
        out
    }

    /// Number of levels; 0 for an empty tree.
    pub fn depth(&self) -> usize {
        fn walk(node: &BvhNode) -> usize {
            match node {
                BvhNode::Branch { left, right, .. } => 1 + walk(left).max(walk(right)),
                BvhNode::Leaf { .. } => 1,
            }
        }
        self.root().map_or(0, walk)
    }

    pub fn node_count(&self) -> usize {
        self.count(|_| true)
    }

    pub fn leaf_count(&self) -> usize {
        self.count(|n| matches!(n, BvhNode::Leaf { .. }))
    }

    fn count(&self, pred: impl Fn(&BvhNode) -> bool) -> usize {
        let mut stack: Vec<&BvhNode> = self.root().into_iter().collect();
        let mut total = 0;
        while let Some(node) = stack.pop() {
            if pred(node) {
                total += 1;
            }
            if let BvhNode::Branch { left, right, .. } = node {
                stack.push(left);
                stack.push(right);
            }
        }
        total
    }
}

impl Default for Bvh {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intersection::DEFAULT_TINT;
    use crate::triangle::Triangle;
    use lumen_core::SurfaceMaterial;
    use lumen_math::{Color, Vec3};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    /// A unit right triangle in the plane z = `z`, facing +Z.
    fn tri_at(x: f32, y: f32, z: f32) -> Triangle {
        Triangle::new(
            Vec3::new(x, y, z),
            Vec3::new(x + 1.0, y, z),
            Vec3::new(x, y + 1.0, z),
            SurfaceMaterial::emissive(Color::ONE, Color::splat(0.5)),
        )
    }

    fn random_triangles(rng: &mut StdRng, n: usize) -> Vec<Triangle> {
        (0..n)
            .map(|_| {
                let base = Vec3::new(
                    rng.gen_range(-10.0..10.0),
                    rng.gen_range(-10.0..10.0),
                    rng.gen_range(-10.0..-1.0),
                );
                let a = Vec3::new(rng.gen_range(0.2..2.0), rng.gen_range(-0.5..0.5), 0.0);
                let b = Vec3::new(rng.gen_range(-0.5..0.5), rng.gen_range(0.2..2.0), 0.0);
                Triangle::new(base, base + a, base + b, SurfaceMaterial::default())
            })
            .collect()
    }

    fn check_structure(
        node: &BvhNode,
        prims: &[Triangle],
        max_leaf_size: usize,
        seen: &mut Vec<usize>,
    ) {
        match node {
            BvhNode::Branch {
                left,
                right,
                bounds,
                area,
            } => {
                assert_eq!(*bounds, Bounds3::surrounding(&left.bounds(), &right.bounds()));
                assert!((area - (left.area() + right.area())).abs() < 1e-3);
                check_structure(left, prims, max_leaf_size, seen);
                check_structure(right, prims, max_leaf_size, seen);
            }
            BvhNode::Leaf {
                primitives,
                bounds,
                area,
            } => {
                assert!(!primitives.is_empty());
                assert!(primitives.len() <= max_leaf_size);
                let mut expected = Bounds3::EMPTY;
                for &i in primitives {
                    expected.union(&prims[i].bounds());
                }
                assert_eq!(*bounds, expected);
                let sum: f32 = primitives.iter().map(|&i| prims[i].area()).sum();
                assert!((area - sum).abs() < 1e-4);
                seen.extend(primitives);
            }
        }
    }

    #[test]
    fn test_zero_leaf_size_is_rejected() {
        let prims = vec![tri_at(0.0, 0.0, -1.0)];
        let err = Bvh::build(&prims, 0).unwrap_err();

        assert_eq!(err, BvhError::InvalidArgument { max_leaf_size: 0 });
    }

    #[test]
    fn test_bvh_empty() {
        let prims: Vec<Triangle> = Vec::new();
        let bvh = Bvh::build(&prims, 1).unwrap();
        let mut rng = StdRng::seed_from_u64(1);

        assert!(bvh.is_empty());
        assert_eq!(bvh.depth(), 0);
        assert!(!bvh.intersect(&prims, &Ray::new(Vec3::ZERO, -Vec3::Z), false).hit);
        assert!(bvh.sample(&prims, &mut rng).is_none());
    }

    #[test]
    fn test_root_matches_union_and_area_sum() {
        let mut rng = StdRng::seed_from_u64(42);
        let prims = random_triangles(&mut rng, 37);
        let bvh = Bvh::build(&prims, 1).unwrap();

        let mut union = Bounds3::EMPTY;
        for p in &prims {
            union.union(&p.bounds());
        }
        let total: f32 = prims.iter().map(|p| p.area()).sum();

        assert_eq!(bvh.bounds(), union);
        assert!((bvh.area() - total).abs() < 1e-3);
    }

    #[test]
    fn test_structure_invariants() {
        let mut rng = StdRng::seed_from_u64(3);
        let prims = random_triangles(&mut rng, 50);

        for max_leaf_size in [1, 2, 4, 64] {
            let bvh = Bvh::build(&prims, max_leaf_size).unwrap();
            let mut seen = Vec::new();
            check_structure(bvh.root().unwrap(), &prims, max_leaf_size, &mut seen);

            seen.sort_unstable();
            assert_eq!(seen, (0..prims.len()).collect::<Vec<_>>());
            assert_eq!(bvh.node_count(), 2 * bvh.leaf_count() - 1);
        }
    }

    #[test]
    fn test_odd_element_goes_left() {
        let prims: Vec<Triangle> = (0..3).map(|i| tri_at(i as f32 * 3.0, 0.0, -1.0)).collect();
        let bvh = Bvh::build(&prims, 1).unwrap();

        match bvh.root().unwrap() {
            BvhNode::Branch { left, right, .. } => {
                assert!(matches!(**left, BvhNode::Branch { .. }));
                assert!(matches!(**right, BvhNode::Leaf { .. }));
            }
            BvhNode::Leaf { .. } => panic!("expected a branch at the root"),
        }
        assert_eq!(bvh.depth(), 3);
        assert_eq!(bvh.bounds_at_depth(1).len(), 2);
        assert_eq!(bvh.bounds_at_depth(2).len(), 2);
    }

    #[test]
    fn test_no_false_negatives_against_brute_force() {
        let mut rng = StdRng::seed_from_u64(99);
        let prims = random_triangles(&mut rng, 200);
        let bvh = Bvh::build(&prims, 1).unwrap();

        for _ in 0..500 {
            let origin = Vec3::new(rng.gen_range(-12.0..12.0), rng.gen_range(-12.0..12.0), 2.0);
            let target = Vec3::new(rng.gen_range(-12.0..12.0), rng.gen_range(-12.0..12.0), -5.0);
            let ray = Ray::new(origin, target - origin);

            let brute = prims
                .iter()
                .map(|p| p.intersect(&ray, false))
                .fold(Intersection::default(), Intersection::nearer);
            let tree = bvh.intersect(&prims, &ray, false);

            assert_eq!(tree.hit, brute.hit);
            if brute.hit {
                assert!((tree.distance - brute.distance).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn test_ray_missing_root_bounds_misses() {
        let mut rng = StdRng::seed_from_u64(5);
        let prims = random_triangles(&mut rng, 20);
        let bvh = Bvh::build(&prims, 2).unwrap();

        let ray = Ray::new(Vec3::new(100.0, 100.0, 0.0), -Vec3::Z);
        assert!(!bvh.bounds().hit(&ray));
        assert!(!bvh.intersect(&prims, &ray, false).hit);
    }

    #[test]
    fn test_ray_through_centroid_hits() {
        let prims = vec![tri_at(0.0, 0.0, -2.0)];
        let bvh = Bvh::build(&prims, 1).unwrap();
        let centroid = Vec3::new(1.0 / 3.0, 1.0 / 3.0, -2.0);

        let ray = Ray::new(Vec3::new(1.0 / 3.0, 1.0 / 3.0, 0.0), -Vec3::Z);
        let rec = bvh.intersect(&prims, &ray, false);

        assert!(rec.hit);
        assert!((rec.point - centroid).length() < 1e-5);
        assert!((rec.distance - 2.0).abs() < 1e-5);
        assert_eq!(rec.normal, Vec3::Z);
    }

    #[test]
    fn test_ray_parallel_to_single_triangle_misses() {
        let prims = vec![tri_at(0.0, 0.0, -2.0)];
        let bvh = Bvh::build(&prims, 1).unwrap();

        let ray = Ray::new(Vec3::new(0.25, 0.25, 0.0), Vec3::X);
        let rec = bvh.intersect(&prims, &ray, false);
        assert!(!rec.hit);
        assert_eq!(rec.distance, f32::INFINITY);

        // Pointing away from the plane
        let ray = Ray::new(Vec3::new(0.25, 0.25, 0.0), Vec3::Z);
        let rec = bvh.intersect(&prims, &ray, false);
        assert!(!rec.hit);
        assert_eq!(rec.distance, f32::INFINITY);
    }

    #[test]
    fn test_debug_tints_nearest_hit() {
        let prims = vec![tri_at(0.0, 0.0, -5.0), tri_at(0.0, 0.0, -2.0)];
        let bvh = Bvh::build(&prims, 1).unwrap();
        let ray = Ray::new(Vec3::new(0.25, 0.25, 0.0), -Vec3::Z);

        let rec = bvh.intersect(&prims, &ray, true);
        assert!((rec.distance - 2.0).abs() < 1e-5);
        assert_eq!(prims[1].color(), DEBUG_HIT_COLOR);
        assert_ne!(prims[0].color(), DEBUG_HIT_COLOR);

        bvh.tint_all(&prims, DEFAULT_TINT);
        assert_ne!(prims[1].color(), DEBUG_HIT_COLOR);
    }

    #[test]
    fn test_sample_stays_on_primitives() {
        let prims = vec![tri_at(0.0, 0.0, -1.0), tri_at(5.0, 0.0, -1.0)];
        let bvh = Bvh::build(&prims, 1).unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        let total = bvh.area();

        for _ in 0..1000 {
            let s = bvh.sample(&prims, &mut rng).unwrap();
            assert!(prims.iter().any(|p| {
                let b = p.bounds();
                (s.point - s.point.clamp(b.min, b.max)).length() < 1e-5
            }));
            // Single-primitive leaves: pdf is 1 / total area
            assert!((s.pdf - 1.0 / total).abs() < 1e-5);
        }
    }

    #[test]
    fn test_sample_with_shared_leaf() {
        let prims = vec![tri_at(0.0, 0.0, -1.0), tri_at(5.0, 0.0, -1.0)];
        let bvh = Bvh::build(&prims, 4).unwrap();
        let mut rng = StdRng::seed_from_u64(12);

        assert_eq!(bvh.leaf_count(), 1);
        let s = bvh.sample(&prims, &mut rng).unwrap();
        // 1/area(tri) * leaf area / total area
        assert!((s.pdf - 2.0).abs() < 1e-5);
    }
}
