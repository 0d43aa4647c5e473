//! Texture lookup and caching for materials.
//!
//! Materials only ever ask a texture for the color (and alpha) at a surface
//! coordinate. Whether that is a constant or a decoded image is hidden behind
//! [`Texture`], and decoded images are shared through [`TextureCache`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::Color;

/// Errors that can occur during texture loading.
#[derive(Error, Debug)]
pub enum TextureError {
    #[error("failed to load texture {}: {source}", .path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("texture {} has no pixels", .path.display())]
    Empty { path: PathBuf },
}

pub type TextureResult<T> = Result<T, TextureError>;

/// A color lookup over surface coordinates.
#[derive(Clone, Debug)]
pub enum Texture {
    /// The same color everywhere.
    Constant(Color),
    /// A decoded image sampled with nearest-texel lookup.
    Image(ImageTexture),
}

impl Texture {
    pub fn constant(color: Color) -> Self {
        Texture::Constant(color)
    }

    /// Color at texture coordinates (u, v).
    pub fn evaluate(&self, u: f32, v: f32) -> Color {
        match self {
            Texture::Constant(color) => *color,
            Texture::Image(image) => {
                let [r, g, b, _] = image.texel(u, v);
                Color::new(r, g, b)
            }
        }
    }

    /// Coverage at texture coordinates (u, v). Images without an alpha
    /// channel and constants are fully opaque.
    pub fn evaluate_alpha(&self, u: f32, v: f32) -> f32 {
        match self {
            Texture::Constant(_) => 1.0,
            Texture::Image(image) => image.texel(u, v)[3],
        }
    }
}

/// Decoded image data, RGBA in [0, 1], row-major from the top row.
#[derive(Clone, Debug)]
pub struct ImageTexture {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<[f32; 4]>,
    /// Source file (for diagnostics)
    pub path: String,
}

impl ImageTexture {
    pub fn new(width: u32, height: u32, pixels: Vec<[f32; 4]>, path: impl Into<String>) -> Self {
        Self {
            width,
            height,
            pixels,
            path: path.into(),
        }
    }

    /// Nearest texel for (u, v). Coordinates wrap, v = 0 is the bottom row.
    fn texel(&self, u: f32, v: f32) -> [f32; 4] {
        let u = u.rem_euclid(1.0);
        let v = v.rem_euclid(1.0);

        let x = ((u * self.width as f32) as u32).min(self.width.saturating_sub(1));
        let y = (((1.0 - v) * self.height as f32) as u32).min(self.height.saturating_sub(1));

        self.pixels
            .get((y * self.width + x) as usize)
            .copied()
            .unwrap_or([0.0, 0.0, 0.0, 1.0])
    }

    /// Approximate memory footprint.
    pub fn size_bytes(&self) -> usize {
        self.pixels.len() * std::mem::size_of::<[f32; 4]>()
    }
}

/// Cache of decoded textures keyed by the path they were requested with.
#[derive(Default)]
pub struct TextureCache {
    textures: HashMap<String, Arc<Texture>>,
    /// Base directory for resolving relative paths
    base_dir: Option<PathBuf>,
}

impl TextureCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a texture cache with a base directory for relative paths.
    /// MTL files reference maps relative to their own directory.
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            textures: HashMap::new(),
            base_dir: Some(base_dir.into()),
        }
    }

    /// Load a texture from file, using the cache if available.
    pub fn load(&mut self, path: &str) -> TextureResult<Arc<Texture>> {
        if let Some(texture) = self.textures.get(path) {
            return Ok(texture.clone());
        }

        let full_path = self.resolve_path(path);
        let image = load_texture_file(&full_path)?;

        log::debug!(
            "Loaded texture: {} ({}x{}, {:.1} KB)",
            path,
            image.width,
            image.height,
            image.size_bytes() as f32 / 1024.0
        );

        let texture = Arc::new(Texture::Image(image));
        self.textures.insert(path.to_string(), texture.clone());
        Ok(texture)
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    fn resolve_path(&self, path: &str) -> PathBuf {
        let path = Path::new(path);

        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

fn load_texture_file(path: &Path) -> TextureResult<ImageTexture> {
    let img = image::open(path).map_err(|source| TextureError::Load {
        path: path.to_path_buf(),
        source,
    })?;

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(TextureError::Empty {
            path: path.to_path_buf(),
        });
    }

    // Texel bytes are taken as-is (no sRGB decode), matching how MTL
    // colors are interpreted.
    let pixels = rgba
        .pixels()
        .map(|p| {
            [
                p[0] as f32 / 255.0,
                p[1] as f32 / 255.0,
                p[2] as f32 / 255.0,
                p[3] as f32 / 255.0,
            ]
        })
        .collect();

    Ok(ImageTexture::new(
        width,
        height,
        pixels,
        path.to_string_lossy().to_string(),
    ))
}
