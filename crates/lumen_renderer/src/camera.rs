//! Pinhole camera for primary ray generation.

use crate::Scene;
use lumen_math::{Ray, Vec3};

/// Pinhole camera.
///
/// Builder methods keep the cached basis up to date, so a camera is ready
/// to generate rays as soon as it is configured.
#[derive(Clone, Debug)]
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

    // Cached computed values
    forward: Vec3,
    right: Vec3,
    up: Vec3,
    scale: f32,
    aspect: f32,
}

impl Camera {
    /// Create a new camera with default settings.
    pub fn new() -> Self {
        let mut camera = Self {
            image_width: 800,
            image_height: 450,
            look_from: Vec3::ZERO,
            look_at: Vec3::NEG_Z,
            vup: Vec3::Y,
            vfov: 90.0,
            forward: Vec3::NEG_Z,
            right: Vec3::X,
            up: Vec3::Y,
            scale: 1.0,
            aspect: 1.0,
        };
        camera.update();
        camera
    }

    /// Camera matching the scene's image size and field of view.
    pub fn for_scene(scene: &Scene) -> Self {
        Self::new()
            .with_resolution(scene.width(), scene.height())
            .with_fov(scene.fov())
    }

    /// Set image resolution.
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.image_width = width;
        self.image_height = height;
        self.update();
        self
    }

    /// Set camera position.
    pub fn with_position(mut self, look_from: Vec3, look_at: Vec3, vup: Vec3) -> Self {
        self.look_from = look_from;
        self.look_at = look_at;
        self.vup = vup;
        self.update();
        self
    }

    /// Set the vertical field of view in degrees.
    pub fn with_fov(mut self, vfov: f32) -> Self {
        self.vfov = vfov;
        self.update();
        self
    }

    pub fn position(&self) -> Vec3 {
        self.look_from
    }

    pub fn forward(&self) -> Vec3 {
        self.forward
    }

    fn update(&mut self) {
        self.forward = (self.look_at - self.look_from).normalize_or_zero();
        self.right = self.forward.cross(self.vup).normalize_or_zero();
        self.up = self.right.cross(self.forward);
        self.scale = (self.vfov.to_radians() * 0.5).tan();
        self.aspect = self.image_width as f32 / self.image_height.max(1) as f32;
    }

    /// Ray through the image-plane position `(x, y)`, in pixels from the
    /// top-left corner. Pixel `(i, j)` covers `[i, i+1) x [j, j+1)`.
    pub fn get_ray(&self, x: f32, y: f32) -> Ray {
        let ndc_x = x / self.image_width.max(1) as f32;
        let ndc_y = y / self.image_height.max(1) as f32;

        let px = (2.0 * ndc_x - 1.0) * self.aspect * self.scale;
        let py = (1.0 - 2.0 * ndc_y) * self.scale;

        Ray::new(
            self.look_from,
            px * self.right + py * self.up + self.forward,
        )
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}
