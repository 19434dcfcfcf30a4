use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use lumen_core::{
    cornell_box, load_scene, IntegratorKind, PixelOrder, RenderSettings, SceneDescription,
};
use lumen_renderer::{
    render_image, Camera, ImageBuffer, Integrator, RenderPipeline, Scene, IDLE_SLEEP,
};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum IntegratorArg {
    Path,
    PointLight,
}

impl From<IntegratorArg> for IntegratorKind {
    fn from(arg: IntegratorArg) -> Self {
        match arg {
            IntegratorArg::Path => IntegratorKind::Path,
            IntegratorArg::PointLight => IntegratorKind::PointLight,
        }
    }
}

/// Render a triangle scene with the Lumen path tracer.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON scene file. Renders the built-in Cornell box when omitted.
    #[arg(long, short = 's', value_name = "FILE")]
    scene: Option<PathBuf>,

    /// Output PNG path.
    #[arg(long, short = 'o', value_name = "FILE", default_value = "render.png")]
    output: PathBuf,

    #[arg(long, value_name = "PX")]
    width: Option<u32>,

    #[arg(long, value_name = "PX")]
    height: Option<u32>,

    /// Samples per pixel.
    #[arg(long, value_name = "NUM")]
    spp: Option<u32>,

    /// Worker threads, 0 for every hardware thread.
    #[arg(long, short = 't', value_name = "NUM")]
    threads: Option<usize>,

    #[arg(long, value_enum)]
    integrator: Option<IntegratorArg>,

    /// Largest primitive count per BVH leaf.
    #[arg(long, value_name = "NUM")]
    max_leaf_size: Option<usize>,

    /// Schedule pixels in center-first buckets of this size.
    #[arg(long, value_name = "PX")]
    bucket_size: Option<u32>,

    /// Render all buckets at once with rayon instead of the worker pipeline.
    #[arg(long)]
    batch: bool,

    /// Tint the primitive hit by each camera ray red. Shows up in the
    /// point-light preview.
    #[arg(long)]
    debug_hits: bool,
}

impl Args {
    fn apply(&self, desc: &mut SceneDescription) {
        let settings = &mut desc.settings;
        if let Some(width) = self.width {
            settings.width = width;
        }
        if let Some(height) = self.height {
            settings.height = height;
        }
        if let Some(spp) = self.spp {
            settings.samples_per_pixel = spp;
        }
        if let Some(threads) = self.threads {
            settings.threads = threads;
        }
        if let Some(integrator) = self.integrator {
            settings.integrator = integrator.into();
        }
        if let Some(max_leaf_size) = self.max_leaf_size {
            settings.max_leaf_size = max_leaf_size;
        }
        if let Some(size) = self.bucket_size {
            settings.pixel_order = PixelOrder::Buckets { size };
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut desc = match &args.scene {
        Some(path) => load_scene(path)
            .with_context(|| format!("failed to load scene {}", path.display()))?,
        None => cornell_box(),
    };
    args.apply(&mut desc);
    let settings = desc.settings.clone();
    if settings.width == 0 || settings.height == 0 {
        bail!("image size must be non-zero, got {}x{}", settings.width, settings.height);
    }

    let start = Instant::now();
    let scene = Scene::from_description(&desc, settings.max_leaf_size)
        .context("failed to build scene BVH")?;
    log::info!(
        "Scene ready: {} objects, emissive area {:.1} ({:.2?})",
        scene.objects().len(),
        scene.emissive_area(),
        start.elapsed()
    );

    let camera = Camera::from_desc(&desc.camera, settings.width, settings.height)
        .with_jitter(settings.jitter);

    if args.debug_hits {
        trace_debug_hits(&scene, &camera);
    }

    let start = Instant::now();
    let image = if args.batch {
        let integrator = Integrator::from_settings(&settings);
        let bucket_size = match settings.pixel_order {
            PixelOrder::Buckets { size } => Some(size),
            PixelOrder::Scanline => None,
        };
        render_image(&scene, &camera, &integrator, settings.samples_per_pixel, bucket_size)
    } else {
        render_interactive(Arc::new(scene), camera, settings)
    };
    log::info!("Rendered in {:.2?}", start.elapsed());

    image
        .save_png(&args.output)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    Ok(())
}

/// Drive the worker pipeline the way a frame loop would.
fn render_interactive(scene: Arc<Scene>, camera: Camera, settings: RenderSettings) -> ImageBuffer {
    let mut pipeline = RenderPipeline::new(settings);
    pipeline.begin_pass(scene, camera);

    let mut last_report = Instant::now();
    while !pipeline.is_complete() {
        if pipeline.tick() == 0 {
            thread::sleep(IDLE_SLEEP);
        }
        if last_report.elapsed().as_secs() >= 1 {
            log::info!("{:.1}% drawn", pipeline.progress() * 100.0);
            last_report = Instant::now();
        }
    }
    pipeline.into_framebuffer()
}

/// Cast one center ray per pixel with hit tinting on, so the preview shows
/// which primitives the tree returns.
fn trace_debug_hits(scene: &Scene, camera: &Camera) {
    let mut hits = 0usize;
    for y in 0..camera.image_height {
        for x in 0..camera.image_width {
            if scene.intersect(&camera.center_ray(x, y), true).hit {
                hits += 1;
            }
        }
    }
    log::info!("Debug pass tinted primitives under {hits} pixels");
}
