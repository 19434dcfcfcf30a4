//! The renderable scene: owned objects, the scene-level BVH and lights.

use lumen_core::SceneDescription;
use lumen_math::{Ray, Vec3};
use rand::RngCore;

use crate::bvh::{Bvh, BvhError};
use crate::intersection::{Intersection, LightSample, SceneObject, DEFAULT_TINT};
use crate::sampling::gen_f32;
use crate::triangle_mesh::TriangleMesh;

/// Objects plus the acceleration structure built over them.
///
/// The scene owns its objects; the tree only indexes them. Adding an object
/// marks the tree stale until [`Scene::build_tree`] runs again.
pub struct Scene {
    objects: Vec<Box<dyn SceneObject>>,
    bvh: Option<Bvh>,
    stale: bool,
    point_lights: Vec<Vec3>,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
            bvh: None,
            stale: false,
            point_lights: Vec::new(),
        }
    }

    /// Build a scene of [`TriangleMesh`]es from a description.
    pub fn from_description(
        desc: &SceneDescription,
        max_leaf_size: usize,
    ) -> Result<Self, BvhError> {
        let mut scene = Self::new();
        for entry in &desc.meshes {
            if entry.mesh.triangle_count() == 0 {
                log::warn!("Skipping mesh '{}' without triangles", entry.name);
                continue;
            }
            let mesh = TriangleMesh::new(&entry.name, &entry.mesh, entry.material, max_leaf_size)?;
            scene.add_object(Box::new(mesh));
        }
        scene.point_lights = desc.point_lights.clone();
        scene.build_tree(max_leaf_size)?;
        Ok(scene)
    }

    pub fn add_object(&mut self, object: Box<dyn SceneObject>) {
        self.objects.push(object);
        self.stale = true;
    }

    pub fn add_point_light(&mut self, position: Vec3) {
        self.point_lights.push(position);
    }

    /// (Re)build the scene-level tree over the current objects.
    pub fn build_tree(&mut self, max_leaf_size: usize) -> Result<(), BvhError> {
        let bvh = Bvh::build(&self.objects, max_leaf_size)?;
        log::info!(
            "Built scene BVH: {} objects, {} nodes, depth {}, emissive area {:.2}",
            self.objects.len(),
            bvh.node_count(),
            bvh.depth(),
            self.emissive_area()
        );
        self.bvh = Some(bvh);
        self.stale = false;
        Ok(())
    }

    /// True when objects were added after the last build.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn has_tree(&self) -> bool {
        self.bvh.is_some()
    }

    pub fn bvh(&self) -> Option<&Bvh> {
        self.bvh.as_ref()
    }

    pub fn objects(&self) -> &[Box<dyn SceneObject>] {
        &self.objects
    }

    pub fn point_lights(&self) -> &[Vec3] {
        &self.point_lights
    }

    /// Nearest hit; misses everything before the first build.
    pub fn intersect(&self, ray: &Ray, debug: bool) -> Intersection<'_> {
        match &self.bvh {
            Some(bvh) => bvh.intersect(&self.objects, ray, debug),
            None => Intersection::default(),
        }
    }

    fn emitters(&self) -> impl Iterator<Item = &dyn SceneObject> + '_ {
        self.objects
            .iter()
            .map(|o| &**o)
            .filter(|o| o.is_emissive())
    }

    /// Total area of the emissive objects.
    pub fn emissive_area(&self) -> f32 {
        self.emitters().map(|o| o.area()).sum()
    }

    pub fn has_emitters(&self) -> bool {
        self.emissive_area() > 0.0
    }

    /// Pick an emissive object with probability proportional to its area and
    /// sample a point on it.
    ///
    /// The pdf is the object's own area density times its selection
    /// probability. `None` when nothing emits.
    pub fn sample_light(&self, rng: &mut dyn RngCore) -> Option<LightSample> {
        let total = self.emissive_area();
        if total <= 0.0 {
            return None;
        }

        let p = gen_f32(rng) * total;
        let mut acc = 0.0;
        let mut chosen = None;
        for object in self.emitters() {
            let area = object.area();
            if area <= 0.0 {
                continue;
            }
            chosen = Some(object);
            acc += area;
            if p <= acc {
                break;
            }
        }

        let object = chosen?;
        let mut sample = object.sample(rng);
        sample.pdf *= object.area() / total;
        Some(sample)
    }

    /// Sample through the scene tree's area-weighted descent.
    ///
    /// Covers every object, emissive or not.
    pub fn sample_tree(&self, rng: &mut dyn RngCore) -> Option<LightSample> {
        let bvh = self.bvh.as_ref()?;
        if bvh.area() <= 0.0 {
            return None;
        }
        bvh.sample(&self.objects, rng)
    }

    /// Reset the debug tint of every object.
    pub fn clear_debug_colors(&self) {
        for object in &self.objects {
            object.set_color(DEFAULT_TINT);
        }
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intersection::DEBUG_HIT_COLOR;
    use crate::triangle::Triangle;
    use lumen_core::{cornell_box, SurfaceMaterial};
    use lumen_math::Color;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn light_tri(x: f32) -> Triangle {
        Triangle::new(
            Vec3::new(x, 0.0, 0.0),
            Vec3::new(x + 1.0, 0.0, 0.0),
            Vec3::new(x, 1.0, 0.0),
            SurfaceMaterial::emissive(Color::ONE, Color::ZERO),
        )
    }

    #[test]
    fn test_empty_scene_misses() {
        let scene = Scene::new();
        let mut rng = StdRng::seed_from_u64(1);

        assert!(!scene.has_tree());
        assert!(!scene.intersect(&Ray::new(Vec3::ZERO, Vec3::X), false).hit);
        assert!(scene.sample_light(&mut rng).is_none());
        assert!(scene.sample_tree(&mut rng).is_none());
    }

    #[test]
    fn test_add_object_marks_stale() {
        init_logger();
        let mut scene = Scene::new();
        scene.add_object(Box::new(light_tri(0.0)));
        assert!(scene.is_stale());

        scene.build_tree(1).unwrap();
        assert!(!scene.is_stale());
        assert!(scene.has_tree());

        assert_eq!(
            scene.build_tree(0),
            Err(BvhError::InvalidArgument { max_leaf_size: 0 })
        );
    }

    #[test]
    fn test_light_sampling_is_balanced() {
        init_logger();
        let mut scene = Scene::new();
        scene.add_object(Box::new(light_tri(0.0)));
        scene.add_object(Box::new(light_tri(5.0)));
        scene.build_tree(1).unwrap();

        let mut rng = StdRng::seed_from_u64(42);
        let n = 20_000;
        let mut left = 0;
        for _ in 0..n {
            let s = scene.sample_light(&mut rng).unwrap();
            assert!((s.pdf - 1.0).abs() < 1e-5);
            if s.point.x < 2.5 {
                left += 1;
            }
        }

        let freq = left as f32 / n as f32;
        assert!((freq - 0.5).abs() < 0.02, "left frequency {freq}");
    }

    #[test]
    fn test_non_emissive_objects_are_never_sampled() {
        init_logger();
        let mut scene = Scene::new();
        scene.add_object(Box::new(Triangle::new(
            Vec3::new(10.0, 0.0, 0.0),
            Vec3::new(20.0, 0.0, 0.0),
            Vec3::new(10.0, 10.0, 0.0),
            SurfaceMaterial::default(),
        )));
        scene.add_object(Box::new(light_tri(0.0)));
        scene.build_tree(1).unwrap();
        let mut rng = StdRng::seed_from_u64(3);

        assert!((scene.emissive_area() - 0.5).abs() < 1e-6);
        for _ in 0..200 {
            let s = scene.sample_light(&mut rng).unwrap();
            assert!(s.point.x <= 1.0);
            assert!((s.pdf - 2.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_cornell_scene() {
        init_logger();
        let scene = Scene::from_description(&cornell_box(), 1).unwrap();

        assert_eq!(scene.objects().len(), 6);
        assert!((scene.emissive_area() - 130.0 * 105.0).abs() < 1.0);
        assert_eq!(scene.point_lights().len(), 1);

        // Straight up from the floor center hits the light
        let ray = Ray::new(Vec3::new(278.0, 1.0, 279.6), Vec3::Y);
        let rec = scene.intersect(&ray, false);
        assert!(rec.hit);
        assert!(rec.is_emissive());
        assert!((rec.point.y - 548.7).abs() < 1e-2);
    }

    #[test]
    fn test_debug_intersect_and_clear() {
        init_logger();
        let mut scene = Scene::new();
        scene.add_object(Box::new(light_tri(0.0)));
        scene.build_tree(1).unwrap();

        let ray = Ray::new(Vec3::new(0.2, 0.2, 1.0), -Vec3::Z);
        let rec = scene.intersect(&ray, true);
        assert_eq!(rec.object.unwrap().color(), DEBUG_HIT_COLOR);

        scene.clear_debug_colors();
        assert_ne!(scene.objects()[0].color(), DEBUG_HIT_COLOR);
    }
}
