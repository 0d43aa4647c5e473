//! Parallel stratified sampling of the image.
//!
//! Rows are divided into one contiguous range per worker. Each range is
//! rendered by its own task on a dedicated rayon pool and writes only its
//! slice of the framebuffer.

use std::ops::Range;
use std::sync::Mutex;
use std::time::Instant;

use crate::{
    config::{ConfigError, RenderConfig},
    gen_f32, Camera, Color, Framebuffer, PathTracer, Scene,
};
use lumen_math::Vec2;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("invalid render configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to start render workers: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Split `height` rows into `workers` contiguous ranges. The first
/// `height % workers` ranges get one extra row; empty ranges are dropped.
pub fn row_ranges(height: u32, workers: usize) -> Vec<Range<u32>> {
    let workers = workers.max(1) as u32;
    let base = height / workers;
    let extra = height % workers;

    let mut ranges = Vec::with_capacity(workers as usize);
    let mut start = 0;
    for i in 0..workers {
        let rows = base + u32::from(i < extra);
        if rows > 0 {
            ranges.push(start..start + rows);
        }
        start += rows;
    }
    ranges
}

/// Side of the jittered grid used for `spp` samples: floor(sqrt(spp)).
fn grid_size(spp: u32) -> u32 {
    let mut n = (spp as f64).sqrt() as u32;
    while (n + 1) * (n + 1) <= spp {
        n += 1;
    }
    while n * n > spp {
        n -= 1;
    }
    n
}

/// Offset within the pixel for sample `index`. The first `grid * grid`
/// samples are jittered on the grid, the rest are uniform.
fn sample_offset(index: u32, grid: u32, rng: &mut dyn RngCore) -> Vec2 {
    let jitter = Vec2::new(gen_f32(rng), gen_f32(rng));
    if index < grid * grid {
        let cell = Vec2::new((index % grid) as f32, (index / grid) as f32);
        (cell + jitter) / grid as f32
    } else {
        jitter
    }
}

/// Finished-row counter shared by all workers.
struct Progress {
    total: u32,
    done: Mutex<u32>,
    started: Instant,
}

impl Progress {
    fn new(total: u32) -> Self {
        Self {
            total,
            done: Mutex::new(0),
            started: Instant::now(),
        }
    }

    fn row_finished(&self) {
        let mut done = match self.done.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *done += 1;

        let total = self.total.max(1);
        let percent = *done * 100 / total;
        if percent / 10 != (*done - 1) * 100 / total / 10 {
            log::info!("Rendered {}% ({:.1?})", percent, self.started.elapsed());
        }
    }
}

/// One worker's share of the image.
struct RowJob<'a> {
    worker: usize,
    rows: Range<u32>,
    pixels: &'a mut [Color],
}

/// Render the scene through `camera`.
pub fn render(
    scene: &Scene,
    camera: &Camera,
    config: &RenderConfig,
) -> Result<Framebuffer, RenderError> {
    config.validate()?;

    let width = camera.image_width;
    let height = camera.image_height;
    let mut framebuffer = Framebuffer::new(width, height);
    let tracer = PathTracer::from_config(config);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.threads)
        .build()?;

    log::info!(
        "Rendering {}x{} @ {} spp on {} threads",
        width,
        height,
        config.samples_per_pixel,
        config.threads
    );

    let start = Instant::now();
    let progress = Progress::new(height);

    let mut jobs = Vec::new();
    let mut rest = framebuffer.pixels.as_mut_slice();
    for (worker, rows) in row_ranges(height, config.threads).into_iter().enumerate() {
        let len = (rows.end - rows.start) as usize * width as usize;
        let (pixels, tail) = std::mem::take(&mut rest).split_at_mut(len);
        rest = tail;
        jobs.push(RowJob {
            worker,
            rows,
            pixels,
        });
    }

    pool.scope(|s| {
        for job in jobs {
            let tracer = &tracer;
            let progress = &progress;
            s.spawn(move |_| render_rows(job, scene, camera, tracer, config, progress));
        }
    });

    log::info!("Render finished in {:.2?}", start.elapsed());
    Ok(framebuffer)
}

fn render_rows(
    mut job: RowJob<'_>,
    scene: &Scene,
    camera: &Camera,
    tracer: &PathTracer,
    config: &RenderConfig,
    progress: &Progress,
) {
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(job.worker as u64)),
        None => StdRng::from_entropy(),
    };

    let width = camera.image_width as usize;
    let spp = config.samples_per_pixel;
    let grid = grid_size(spp);
    let weight = 1.0 / spp as f32;

    for (row, y) in job.rows.clone().enumerate() {
        let line = &mut job.pixels[row * width..(row + 1) * width];

        for (x, pixel) in line.iter_mut().enumerate() {
            let mut color = Color::ZERO;
            for i in 0..spp {
                let offset = sample_offset(i, grid, &mut rng);
                let ray = camera.get_ray(x as f32 + offset.x, y as f32 + offset.y);
                color += tracer.cast_ray(scene, &ray, 0, &mut rng) * weight;
            }
            *pixel = color;
        }

        progress.row_finished();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Material, Sphere};
    use lumen_math::Vec3;
    use std::sync::Arc;

    #[test]
    fn test_row_ranges_cover_image() {
        let ranges = row_ranges(10, 3);
        assert_eq!(ranges, vec![0..4, 4..7, 7..10]);

        let ranges = row_ranges(2, 4);
        assert_eq!(ranges, vec![0..1, 1..2]);

        assert_eq!(row_ranges(5, 0), vec![0..5]);
        assert!(row_ranges(0, 4).is_empty());
    }

    #[test]
    fn test_grid_size() {
        assert_eq!(grid_size(1), 1);
        assert_eq!(grid_size(3), 1);
        assert_eq!(grid_size(4), 2);
        assert_eq!(grid_size(32), 5);
        assert_eq!(grid_size(36), 6);
    }

    #[test]
    fn test_sample_offsets_are_stratified() {
        let mut rng = StdRng::seed_from_u64(3);
        let grid = grid_size(4);

        for i in 0..4 {
            let o = sample_offset(i, grid, &mut rng);
            let cell = ((o.x * 2.0) as u32, (o.y * 2.0) as u32);
            assert_eq!(cell, (i % 2, i / 2));
        }

        // Remainder samples cover the whole pixel
        let o = sample_offset(4, grid, &mut rng);
        assert!((0.0..1.0).contains(&o.x) && (0.0..1.0).contains(&o.y));
    }

    fn glowing_sphere() -> (Scene, Camera) {
        let mut scene = Scene::new(8, 6, 60.0);
        let light = Arc::new(Material::diffuse(Color::splat(0.5)).with_emission(Color::ONE));
        scene.add(Sphere::new(Vec3::new(0.0, 0.0, -3.0), 1.0, light));
        scene.build();

        let camera = Camera::for_scene(&scene).with_position(Vec3::ZERO, Vec3::NEG_Z, Vec3::Y);
        (scene, camera)
    }

    #[test]
    fn test_render_is_reproducible_with_seed() {
        let (scene, camera) = glowing_sphere();
        let config = RenderConfig {
            samples_per_pixel: 4,
            threads: 3,
            seed: Some(11),
            ..Default::default()
        };

        let a = render(&scene, &camera, &config).unwrap();
        let b = render(&scene, &camera, &config).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.pixels.len(), 48);

        // The sphere fills the middle of the frame
        assert!(a.get(4, 3).x >= 1.0);
        assert_eq!(a.get(0, 0), Color::ZERO);
    }

    #[test]
    fn test_render_rejects_invalid_config() {
        let (scene, camera) = glowing_sphere();
        let config = RenderConfig {
            samples_per_pixel: 0,
            ..Default::default()
        };

        let err = render(&scene, &camera, &config).unwrap_err();
        assert!(matches!(err, RenderError::Config(ConfigError::NoSamples)));
    }
}
