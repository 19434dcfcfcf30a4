//! Multithreaded pixel pipeline.
//!
//! The host thread feeds pixel coordinates into a shared work queue; a fixed
//! pool of worker threads pops them, computes a color and pushes the result
//! onto a draw queue; the host drains the draw queue into the framebuffer.
//! The host drives both ends from its frame loop through [`RenderPipeline::tick`].
//!
//! Every pass has a generation number. Results computed for an older pass
//! are dropped when they reach the consumer.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use lumen_core::{PixelOrder, RenderSettings};
use lumen_math::Color;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::bucket::generate_buckets;
use crate::camera::Camera;
use crate::error::{RenderError, RenderResult};
use crate::integrator::Integrator;
use crate::renderer::ImageBuffer;
use crate::scene::Scene;

/// How long an idle worker sleeps before polling the work queue again.
pub const IDLE_SLEEP: Duration = Duration::from_millis(10);

/// A pixel to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelCoord {
    pub x: u32,
    pub y: u32,
}

impl PixelCoord {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// A computed pixel on its way to the framebuffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawItem {
    pub coord: PixelCoord,
    pub color: Color,
    /// Pass the color was computed for
    pub generation: u64,
}

/// Everything a worker needs to compute pixels of one pass.
struct PassContext {
    generation: u64,
    scene: Arc<Scene>,
    camera: Camera,
    integrator: Integrator,
    samples_per_pixel: u32,
}

/// Pending pixels together with the pass they belong to.
///
/// Kept under one lock so a popped pixel is always paired with the pass
/// that enqueued it.
#[derive(Default)]
struct WorkQueue {
    pixels: VecDeque<PixelCoord>,
    context: Option<Arc<PassContext>>,
}

struct Shared {
    work: Mutex<WorkQueue>,
    running: AtomicBool,
}

impl Shared {
    fn lock_work(&self) -> MutexGuard<'_, WorkQueue> {
        // A panicking worker cannot leave the queue half-updated
        self.work.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Producer/consumer render pipeline with a fixed worker pool.
pub struct RenderPipeline {
    shared: Arc<Shared>,
    draw_rx: Receiver<DrawItem>,
    workers: Vec<JoinHandle<()>>,
    settings: RenderSettings,
    framebuffer: ImageBuffer,
    generation: u64,
    active: bool,
    /// Pixels of the current pass in scheduling order
    order: Vec<PixelCoord>,
    cursor: usize,
    enqueued: usize,
    drawn: usize,
}

impl RenderPipeline {
    /// Start the worker pool. `settings.threads == 0` uses every hardware thread.
    pub fn new(settings: RenderSettings) -> Self {
        let count = if settings.threads == 0 {
            num_cpus::get()
        } else {
            settings.threads
        };
        Self::with_worker_count(settings, count)
    }

    /// Start exactly `count` workers. Zero workers leaves the queues to the caller.
    pub fn with_worker_count(settings: RenderSettings, count: usize) -> Self {
        let shared = Arc::new(Shared {
            work: Mutex::new(WorkQueue::default()),
            running: AtomicBool::new(true),
        });
        let (draw_tx, draw_rx) = crossbeam_channel::unbounded();

        let workers = (0..count)
            .map(|id| {
                let shared = Arc::clone(&shared);
                let draw_tx = draw_tx.clone();
                thread::Builder::new()
                    .name(format!("lumen-worker-{id}"))
                    .spawn(move || worker_loop(id, &shared, &draw_tx))
            })
            .filter_map(|spawned| match spawned {
                Ok(handle) => Some(handle),
                Err(err) => {
                    log::error!("Failed to spawn render worker: {err}");
                    None
                }
            })
            .collect::<Vec<_>>();
        log::info!("Render pipeline started with {} workers", workers.len());

        let framebuffer = ImageBuffer::new(settings.width, settings.height);
        Self {
            shared,
            draw_rx,
            workers,
            settings,
            framebuffer,
            generation: 0,
            active: false,
            order: Vec::new(),
            cursor: 0,
            enqueued: 0,
            drawn: 0,
        }
    }

    /// Start a new pass over `scene`.
    ///
    /// Pending work and undrawn results are thrown away; results still being
    /// computed for the previous pass are discarded when they arrive.
    pub fn begin_pass(&mut self, scene: Arc<Scene>, camera: Camera) {
        self.generation += 1;
        let width = self.settings.width;
        let height = self.settings.height;
        let mut camera = camera
            .with_resolution(width, height)
            .with_jitter(self.settings.jitter);
        camera.initialize();

        let context = Arc::new(PassContext {
            generation: self.generation,
            scene,
            camera,
            integrator: Integrator::from_settings(&self.settings),
            samples_per_pixel: self.settings.samples_per_pixel,
        });
        {
            let mut work = self.shared.lock_work();
            work.pixels.clear();
            work.context = Some(context);
        }
        let stale = self.draw_rx.try_iter().count();
        if stale > 0 {
            log::trace!("Dropped {stale} undrawn results of the previous pass");
        }

        self.order = scheduling_order(width, height, self.settings.pixel_order);
        self.cursor = 0;
        self.enqueued = 0;
        self.drawn = 0;
        self.active = true;
        if self.framebuffer.width != width || self.framebuffer.height != height {
            self.framebuffer = ImageBuffer::new(width, height);
        }
        self.framebuffer.clear(self.settings.background);

        log::info!(
            "Pass {} started: {}x{}, {} spp",
            self.generation,
            width,
            height,
            self.settings.samples_per_pixel
        );
    }

    /// Queue one pixel of the current pass.
    pub fn enqueue_pixel(&mut self, x: u32, y: u32) -> RenderResult<()> {
        if !self.active {
            return Err(RenderError::Pipeline("no pass has been started".into()));
        }
        let (width, height) = (self.framebuffer.width, self.framebuffer.height);
        if x >= width || y >= height {
            return Err(RenderError::Pipeline(format!(
                "pixel ({x}, {y}) outside {width}x{height} image"
            )));
        }
        self.shared.lock_work().pixels.push_back(PixelCoord::new(x, y));
        self.enqueued += 1;
        Ok(())
    }

    /// Next result of the current pass, skipping stale ones.
    pub fn try_dequeue_draw_result(&mut self) -> Option<DrawItem> {
        while let Ok(item) = self.draw_rx.try_recv() {
            if item.generation == self.generation {
                self.drawn += 1;
                return Some(item);
            }
        }
        None
    }

    /// Enqueue the next image row if the outstanding work is within bounds.
    ///
    /// Returns false when throttled or when every pixel has been scheduled.
    pub fn schedule_row(&mut self) -> bool {
        if !self.active || self.cursor >= self.order.len() {
            return false;
        }
        if self.outstanding() > self.settings.max_outstanding {
            return false;
        }

        let end = (self.cursor + self.framebuffer.width.max(1) as usize).min(self.order.len());
        let row = &self.order[self.cursor..end];
        self.shared.lock_work().pixels.extend(row.iter().copied());
        self.enqueued += row.len();
        self.cursor = end;
        true
    }

    /// Commit up to `draw_batch` results to the framebuffer.
    pub fn drain(&mut self) -> usize {
        let mut count = 0;
        while count < self.settings.draw_batch {
            let Some(item) = self.try_dequeue_draw_result() else {
                break;
            };
            self.framebuffer.set(item.coord.x, item.coord.y, item.color);
            count += 1;
        }
        if count > 0 {
            log::trace!("Drew {count} pixels ({:.1}%)", self.progress() * 100.0);
        }
        count
    }

    /// One frame of the host loop: schedule rows up to the cap, then drain.
    pub fn tick(&mut self) -> usize {
        while self.schedule_row() {}
        let drawn = self.drain();
        if drawn > 0 && self.is_complete() {
            log::info!("Pass {} complete", self.generation);
        }
        drawn
    }

    /// Pixels enqueued but not yet drawn.
    pub fn outstanding(&self) -> usize {
        self.enqueued.saturating_sub(self.drawn)
    }

    /// Pixels waiting in the work queue.
    pub fn queued(&self) -> usize {
        self.shared.lock_work().pixels.len()
    }

    /// Fraction of the image drawn in this pass.
    pub fn progress(&self) -> f32 {
        let total = self.framebuffer.pixels.len();
        if total == 0 {
            return 1.0;
        }
        self.drawn as f32 / total as f32
    }

    /// True once every pixel of the pass has been scheduled and drawn.
    pub fn is_complete(&self) -> bool {
        self.active && self.cursor >= self.order.len() && self.drawn >= self.enqueued
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn framebuffer(&self) -> &ImageBuffer {
        &self.framebuffer
    }

    pub fn into_framebuffer(mut self) -> ImageBuffer {
        std::mem::replace(&mut self.framebuffer, ImageBuffer::new(0, 0))
    }
}

impl Drop for RenderPipeline {
    fn drop(&mut self) {
        self.shared.running.store(false, Ordering::Release);
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                log::error!("A render worker panicked");
            }
        }
        log::debug!("Render pipeline stopped");
    }
}

/// Pixel order of a pass.
fn scheduling_order(width: u32, height: u32, order: PixelOrder) -> Vec<PixelCoord> {
    match order {
        PixelOrder::Scanline => (0..height)
            .flat_map(|y| (0..width).map(move |x| PixelCoord::new(x, y)))
            .collect(),
        PixelOrder::Buckets { size } => generate_buckets(width, height, size)
            .iter()
            .flat_map(|bucket| bucket.pixels())
            .map(|(x, y)| PixelCoord::new(x, y))
            .collect(),
    }
}

fn worker_loop(id: usize, shared: &Shared, draw_tx: &Sender<DrawItem>) {
    log::debug!("Render worker {id}: begin");
    let mut rng = StdRng::from_entropy();

    while shared.running.load(Ordering::Acquire) {
        let job = {
            let mut work = shared.lock_work();
            match work.pixels.pop_front() {
                Some(pixel) => work.context.clone().map(|ctx| (pixel, ctx)),
                None => None,
            }
        };

        let Some((pixel, ctx)) = job else {
            thread::sleep(IDLE_SLEEP);
            continue;
        };

        let color = ctx.integrator.render_pixel(
            &ctx.scene,
            &ctx.camera,
            pixel.x,
            pixel.y,
            ctx.samples_per_pixel,
            &mut rng,
        );
        let item = DrawItem {
            coord: pixel,
            color,
            generation: ctx.generation,
        };
        if draw_tx.send(item).is_err() {
            break;
        }
    }

    log::debug!("Render worker {id}: end");
}
