//! Radiance estimators.
//!
//! [`PathTracer`] is a Monte Carlo path tracer for Lambertian surfaces with
//! next-event estimation and Russian roulette. [`PointLightShader`] is a fast
//! preview: point lights, hard shadows and a Lambert term.

use std::f32::consts::PI;

use lumen_core::{IntegratorKind, RenderSettings};
use lumen_math::{Color, Ray, Vec3};
use rand::RngCore;

use crate::camera::Camera;
use crate::intersection::{Intersection, DEFAULT_TINT};
use crate::sampling::{gen_f32, uniform_hemisphere, UNIFORM_HEMISPHERE_PDF};
use crate::scene::Scene;
use crate::EPSILON;

/// Counters collected while tracing one camera path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraceStats {
    /// Scene intersection queries, shadow rays included
    pub rays_cast: u64,
    /// Deepest recursion level that shaded a surface
    pub max_depth_reached: u32,
}

/// Path tracer with explicit light sampling.
///
/// Emitters are only seen directly by camera rays; deeper bounces get their
/// light from the explicit light samples so nothing is counted twice.
#[derive(Debug, Clone)]
pub struct PathTracer {
    pub max_depth: u32,
    /// Probability of continuing a path at each bounce
    pub russian_roulette: f32,
    pub background: Color,
}

impl Default for PathTracer {
    fn default() -> Self {
        Self {
            max_depth: 5,
            russian_roulette: 0.8,
            background: Color::ZERO,
        }
    }
}

impl PathTracer {
    pub fn new(settings: &RenderSettings) -> Self {
        Self {
            max_depth: settings.max_depth,
            russian_roulette: settings.russian_roulette.clamp(0.0, 1.0),
            background: settings.background,
        }
    }

    /// Radiance arriving along `ray` for a path at recursion level `depth`.
    pub fn cast_ray(&self, scene: &Scene, ray: &Ray, depth: u32, rng: &mut dyn RngCore) -> Color {
        let mut stats = TraceStats::default();
        self.cast_ray_with_stats(scene, ray, depth, rng, &mut stats)
    }

    pub fn cast_ray_with_stats(
        &self,
        scene: &Scene,
        ray: &Ray,
        depth: u32,
        rng: &mut dyn RngCore,
        stats: &mut TraceStats,
    ) -> Color {
        if depth > self.max_depth || !scene.has_tree() {
            return Color::ZERO;
        }

        stats.rays_cast += 1;
        let hit = scene.intersect(ray, false);
        if !hit.hit {
            return self.background;
        }
        self.shade(scene, &hit, depth, rng, stats)
    }

    /// Outgoing radiance at a surface point reached at `depth`.
    fn shade(
        &self,
        scene: &Scene,
        hit: &Intersection<'_>,
        depth: u32,
        rng: &mut dyn RngCore,
        stats: &mut TraceStats,
    ) -> Color {
        if depth > self.max_depth {
            return Color::ZERO;
        }
        if hit.is_emissive() {
            return if depth == 0 { hit.emission } else { Color::ZERO };
        }
        stats.max_depth_reached = stats.max_depth_reached.max(depth);

        let brdf = hit.kd / PI;
        let direct = if scene.has_emitters() {
            self.direct_light(scene, hit, brdf, rng, stats)
        } else {
            Color::ZERO
        };

        if gen_f32(rng) > self.russian_roulette {
            return direct;
        }

        let wo = uniform_hemisphere(hit.normal, rng);
        let bounce = Ray::new(hit.point + hit.normal * EPSILON, wo);
        stats.rays_cast += 1;
        let next = scene.intersect(&bounce, false);
        if !next.hit || next.is_emissive() {
            return direct;
        }

        let incoming = self.shade(scene, &next, depth + 1, rng, stats);
        let cos = wo.dot(hit.normal).max(0.0);
        let indirect = incoming * brdf * cos / UNIFORM_HEMISPHERE_PDF / self.russian_roulette;
        direct + indirect
    }

    /// One light sample with a shadow ray.
    fn direct_light(
        &self,
        scene: &Scene,
        hit: &Intersection<'_>,
        brdf: Color,
        rng: &mut dyn RngCore,
        stats: &mut TraceStats,
    ) -> Color {
        let Some(light) = scene.sample_light(rng) else {
            return Color::ZERO;
        };
        if light.pdf <= 0.0 {
            return Color::ZERO;
        }

        let to_light = light.point - hit.point;
        let dist2 = to_light.length_squared();
        if dist2 <= EPSILON * EPSILON {
            return Color::ZERO;
        }
        let dist = dist2.sqrt();
        let ws = to_light / dist;

        let cos_surface = ws.dot(hit.normal);
        let cos_light = -ws.dot(light.normal);
        if cos_surface <= 0.0 || cos_light <= 0.0 {
            return Color::ZERO;
        }

        let origin = hit.point + hit.normal * EPSILON;
        stats.rays_cast += 1;
        if !is_unoccluded(scene, origin, ws, dist) {
            return Color::ZERO;
        }

        light.emission * brdf * cos_surface * cos_light / dist2 / light.pdf
    }

    /// Average of `spp` paths through pixel (x, y).
    pub fn cast_ray_spp(
        &self,
        scene: &Scene,
        camera: &Camera,
        x: u32,
        y: u32,
        spp: u32,
        rng: &mut dyn RngCore,
    ) -> Color {
        let spp = spp.max(1);
        let mut sum = Color::ZERO;
        for _ in 0..spp {
            let ray = camera.get_ray(x, y, rng);
            sum += self.cast_ray(scene, &ray, 0, rng);
        }
        sum / spp as f32
    }
}

/// True when nothing blocks the segment from `origin` to `dist` along `dir`.
///
/// The far end sits on the light itself, so hits within a small relative
/// tolerance of `dist` count as reaching it.
fn is_unoccluded(scene: &Scene, origin: Vec3, dir: Vec3, dist: f32) -> bool {
    let blocker = scene.intersect(&Ray::new(origin, dir), false);
    !blocker.hit || blocker.distance >= dist * (1.0 - 1e-4) - EPSILON
}

/// Point lights with hard shadows, shaded by the object's debug tint.
#[derive(Debug, Clone)]
pub struct PointLightShader {
    /// Darkening factor applied to the final color
    pub shading_scale: f32,
    pub background: Color,
}

impl Default for PointLightShader {
    fn default() -> Self {
        Self {
            shading_scale: 0.6,
            background: Color::ZERO,
        }
    }
}

impl PointLightShader {
    pub fn new(settings: &RenderSettings) -> Self {
        Self {
            shading_scale: settings.shading_scale,
            background: settings.background,
        }
    }

    pub fn shade(&self, scene: &Scene, ray: &Ray) -> Color {
        let hit = scene.intersect(ray, false);
        if !hit.hit {
            return self.background;
        }

        let normal = hit.normal;
        let origin = if ray.direction().dot(normal) < 0.0 {
            hit.point + normal * EPSILON
        } else {
            hit.point - normal * EPSILON
        };

        let mut light_amount = 0.0;
        for &light in scene.point_lights() {
            let to_light = light - hit.point;
            let dist = to_light.length();
            if dist <= EPSILON {
                continue;
            }
            let dir = to_light / dist;
            let blocker = scene.intersect(&Ray::new(origin, dir), false);
            if blocker.hit && blocker.distance < dist {
                continue;
            }
            light_amount += dir.dot(normal).max(0.0);
        }

        let tint = hit.object.map_or(DEFAULT_TINT, |o| o.color());
        tint * light_amount * self.shading_scale
    }
}

/// The shading model selected by [`IntegratorKind`].
#[derive(Debug, Clone)]
pub enum Integrator {
    Path(PathTracer),
    PointLight(PointLightShader),
}

impl Integrator {
    pub fn from_settings(settings: &RenderSettings) -> Self {
        match settings.integrator {
            IntegratorKind::Path => Integrator::Path(PathTracer::new(settings)),
            IntegratorKind::PointLight => Integrator::PointLight(PointLightShader::new(settings)),
        }
    }

    /// Color of one camera ray.
    pub fn radiance(&self, scene: &Scene, ray: &Ray, rng: &mut dyn RngCore) -> Color {
        match self {
            Integrator::Path(tracer) => tracer.cast_ray(scene, ray, 0, rng),
            Integrator::PointLight(shader) => shader.shade(scene, ray),
        }
    }

    /// Average of `spp` camera rays through pixel (x, y).
    pub fn render_pixel(
        &self,
        scene: &Scene,
        camera: &Camera,
        x: u32,
        y: u32,
        spp: u32,
        rng: &mut dyn RngCore,
    ) -> Color {
        match self {
            Integrator::Path(tracer) => tracer.cast_ray_spp(scene, camera, x, y, spp, rng),
            Integrator::PointLight(shader) => shader.shade(scene, &camera.center_ray(x, y)),
        }
    }
}
