//! Lumen Renderer - CPU ray tracing
//!
//! BVH acceleration over single-sided triangle meshes, a Monte Carlo path
//! tracer with explicit light sampling, and a worker pipeline that computes
//! pixels on a thread pool while the host drains results into a framebuffer.

mod bucket;
mod bvh;
mod camera;
mod error;
mod integrator;
mod intersection;
mod pipeline;
mod renderer;
mod sampling;
mod scene;
mod triangle;
mod triangle_mesh;

pub use bucket::{generate_buckets, render_bucket, Bucket, BucketResult, DEFAULT_BUCKET_SIZE};
pub use bvh::{Bvh, BvhError, BvhNode};
pub use camera::Camera;
pub use error::{RenderError, RenderResult};
pub use integrator::{Integrator, PathTracer, PointLightShader, TraceStats};
pub use intersection::{Intersection, LightSample, SceneObject, DEBUG_HIT_COLOR, DEFAULT_TINT};
pub use pipeline::{DrawItem, PixelCoord, RenderPipeline, IDLE_SLEEP};
pub use renderer::{color_to_rgba, linear_to_gamma, render_image, ImageBuffer};
pub use sampling::{gen_f32, uniform_hemisphere, UNIFORM_HEMISPHERE_PDF};
pub use scene::Scene;
pub use triangle::{AtomicColor, Triangle};
pub use triangle_mesh::TriangleMesh;

/// Re-export math types from lumen_math
pub use lumen_math::{Bounds3, Color, Ray, Vec3};

/// Tolerance for degenerate intersections and surface offsets.
pub const EPSILON: f32 = 1e-5;
