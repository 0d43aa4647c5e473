use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use lumen_renderer::render;

mod cornell;
mod scene_file;

use scene_file::SceneFile;

#[derive(Parser, Debug)]
#[command(name = "lumen")]
#[command(about = "Offline path tracer for OBJ scenes", long_about = None)]
struct Args {
    /// JSON scene file; the built-in Cornell box when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// OBJ file to render instead of the one named in the scene file
    #[arg(long)]
    obj: Option<PathBuf>,

    /// Samples per pixel
    #[arg(short, long)]
    spp: Option<u32>,

    /// Worker threads
    #[arg(short, long)]
    threads: Option<usize>,

    /// Seed for reproducible renders
    #[arg(long)]
    seed: Option<u64>,

    /// Output image; the format follows the extension
    #[arg(short, long, default_value = "lumen.png")]
    output: PathBuf,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    /// Command line values take precedence over the scene file.
    fn apply(&self, file: &mut SceneFile) {
        if let Some(obj) = &self.obj {
            file.obj = Some(obj.clone());
        }
        if let Some(spp) = self.spp {
            file.render.samples_per_pixel = spp;
        }
        if let Some(threads) = self.threads {
            file.render.threads = threads;
        }
        if self.seed.is_some() {
            file.render.seed = self.seed;
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_default_env()
        .filter_level(if args.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .init();

    let mut file = match &args.config {
        Some(path) => SceneFile::load(path)?,
        None => SceneFile::default(),
    };
    args.apply(&mut file);
    file.render.validate().context("invalid render settings")?;

    let scene = file.build_scene()?;
    let camera = file.camera(&scene);

    let framebuffer = render(&scene, &camera, &file.render)?;
    framebuffer
        .save(&args.output)
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_scene_file() {
        let args = Args::parse_from(["lumen", "--spp", "8", "--threads", "2", "--seed", "5"]);
        let mut file = SceneFile::default();
        args.apply(&mut file);

        assert_eq!(file.render.samples_per_pixel, 8);
        assert_eq!(file.render.threads, 2);
        assert_eq!(file.render.seed, Some(5));
        assert_eq!(args.output, PathBuf::from("lumen.png"));
    }

    #[test]
    fn test_unset_flags_keep_file_values() {
        let args = Args::parse_from(["lumen", "-c", "scene.json"]);
        let mut file = SceneFile::default();
        file.render.seed = Some(3);
        args.apply(&mut file);

        assert_eq!(file.render.seed, Some(3));
        assert_eq!(file.render.samples_per_pixel, 32);
        assert!(!args.verbose);
    }
}
