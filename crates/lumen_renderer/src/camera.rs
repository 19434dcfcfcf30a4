//! Pinhole camera for ray generation.

use lumen_core::CameraDesc;
use lumen_math::{Ray, Vec3};
use rand::RngCore;

use crate::sampling::gen_f32;

/// Camera for generating rays into the scene.
#[derive(Debug, Clone)]
pub struct Camera {
    // Image settings
    pub image_width: u32,
    pub image_height: u32,

    // Camera positioning
    look_from: Vec3,
    look_at: Vec3,
    vup: Vec3,

    /// Vertical field of view in degrees
    vfov: f32,
    /// Randomize the sample position inside the pixel
    jitter: bool,

    // Cached computed values (set by initialize())
    pixel00_loc: Vec3,
    pixel_delta_u: Vec3,
    pixel_delta_v: Vec3,
    w: Vec3,
}

impl Camera {
    /// Create a new camera with default settings.
    pub fn new() -> Self {
        let mut camera = Self {
            image_width: 256,
            image_height: 256,
            look_from: Vec3::ZERO,
            look_at: Vec3::new(0.0, 0.0, -1.0),
            vup: Vec3::Y,
            vfov: 90.0,
            jitter: false,
            pixel00_loc: Vec3::ZERO,
            pixel_delta_u: Vec3::ZERO,
            pixel_delta_v: Vec3::ZERO,
            w: Vec3::Z,
        };
        camera.initialize();
        camera
    }

    /// Camera placed as described, ready to generate rays.
    pub fn from_desc(desc: &CameraDesc, width: u32, height: u32) -> Self {
        let mut camera = Self::new()
            .with_resolution(width, height)
            .with_position(desc.position, desc.look_at, desc.up)
            .with_fov(desc.vfov);
        camera.initialize();
        camera
    }

    /// Set image resolution.
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.image_width = width.max(1);
        self.image_height = height.max(1);
        self
    }

    /// Set camera position.
    pub fn with_position(mut self, look_from: Vec3, look_at: Vec3, vup: Vec3) -> Self {
        self.look_from = look_from;
        self.look_at = look_at;
        self.vup = vup;
        self
    }

    pub fn with_fov(mut self, vfov: f32) -> Self {
        self.vfov = vfov;
        self
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Recompute the cached viewport (call after the builder methods).
    pub fn initialize(&mut self) {
        let theta = self.vfov.to_radians();
        let h = (theta / 2.0).tan();
        let viewport_height = 2.0 * h;
        let viewport_width = viewport_height * (self.image_width as f32 / self.image_height as f32);

        // Calculate camera basis vectors
        self.w = (self.look_from - self.look_at).normalize_or_zero();
        let u = self.vup.cross(self.w).normalize_or_zero();
        let v = self.w.cross(u);

        // Image rows run top to bottom
        let viewport_u = viewport_width * u;
        let viewport_v = -viewport_height * v;

        self.pixel_delta_u = viewport_u / self.image_width as f32;
        self.pixel_delta_v = viewport_v / self.image_height as f32;

        let viewport_upper_left = self.look_from - self.w - viewport_u / 2.0 - viewport_v / 2.0;
        self.pixel00_loc = viewport_upper_left + 0.5 * (self.pixel_delta_u + self.pixel_delta_v);
    }

    pub fn position(&self) -> Vec3 {
        self.look_from
    }

    /// Unit view direction.
    pub fn forward(&self) -> Vec3 {
        -self.w
    }

    /// Ray for pixel (i, j), jittered inside the pixel when enabled.
    pub fn get_ray(&self, i: u32, j: u32, rng: &mut dyn RngCore) -> Ray {
        if !self.jitter {
            return self.center_ray(i, j);
        }
        let offset = sample_square(rng);
        self.ray_through(i as f32 + 0.5 + offset.x, j as f32 + 0.5 + offset.y)
    }

    /// Ray through the center of pixel (i, j).
    pub fn center_ray(&self, i: u32, j: u32) -> Ray {
        self.ray_through(i as f32 + 0.5, j as f32 + 0.5)
    }

    /// Ray through continuous image coordinates (pixel corners are integers).
    fn ray_through(&self, x: f32, y: f32) -> Ray {
        let pixel_sample =
            self.pixel00_loc + (x - 0.5) * self.pixel_delta_u + (y - 0.5) * self.pixel_delta_v;
        Ray::new(self.look_from, pixel_sample - self.look_from)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

/// Sample a random point in the unit square [-0.5, 0.5] x [-0.5, 0.5].
fn sample_square(rng: &mut dyn RngCore) -> Vec3 {
    Vec3::new(gen_f32(rng) - 0.5, gen_f32(rng) - 0.5, 0.0)
}
