//! Render configuration.
//!
//! Every field has a default so a scene file only needs to name what it
//! changes. The viewer applies its command-line overrides on top.

use lumen_math::Vec3;
use serde::{Deserialize, Serialize};

/// Which shading model computes pixel colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegratorKind {
    /// Monte-Carlo path tracing with next-event estimation.
    #[default]
    Path,
    /// Point lights, hard shadows and a Lambert term. Fast preview.
    PointLight,
}

/// Order in which the scheduler hands out pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum PixelOrder {
    /// Row by row, top to bottom.
    #[default]
    Scanline,
    /// Square buckets, center first.
    Buckets { size: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub width: u32,
    pub height: u32,
    pub samples_per_pixel: u32,
    /// Deepest bounce that still shades; deeper calls return black.
    pub max_depth: u32,
    /// Continuation probability of the Russian roulette.
    pub russian_roulette: f32,
    /// Largest primitive count stored in a BVH leaf.
    pub max_leaf_size: usize,
    /// Cap on pixels enqueued but not yet drawn.
    pub max_outstanding: usize,
    /// Draw results committed per consumer tick.
    pub draw_batch: usize,
    /// Worker threads; 0 uses every hardware thread.
    pub threads: usize,
    pub integrator: IntegratorKind,
    pub pixel_order: PixelOrder,
    /// Darkening factor of the point-light preview.
    pub shading_scale: f32,
    pub background: Vec3,
    /// Randomize the sample position inside each pixel.
    pub jitter: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            width: 256,
            height: 256,
            samples_per_pixel: 16,
            max_depth: 5,
            russian_roulette: 0.8,
            max_leaf_size: 1,
            max_outstanding: 4096,
            draw_batch: 4096,
            threads: 0,
            integrator: IntegratorKind::Path,
            pixel_order: PixelOrder::Scanline,
            shading_scale: 0.6,
            background: Vec3::ZERO,
            jitter: false,
        }
    }
}

impl RenderSettings {
    /// Total pixel count of the output image.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}
