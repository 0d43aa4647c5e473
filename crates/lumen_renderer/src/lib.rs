//! Lumen Renderer - CPU path tracing
//!
//! A unidirectional Monte Carlo path tracer with next-event estimation and
//! Russian-roulette termination. The pieces, bottom-up:
//!
//! - [`Renderable`] objects ([`Sphere`], [`Triangle`], [`TriangleMesh`])
//! - a median-split [`Bvh`] over them
//! - the [`Material`] model (diffuse, microfacet, dielectric mirror)
//! - the [`Scene`], which owns the objects and the emissive-area table
//! - the [`PathTracer`] integrator
//! - [`render`], which splits the image into row ranges on a rayon pool

mod bvh;
mod camera;
mod config;
mod framebuffer;
mod integrator;
mod material;
mod object;
mod renderer;
mod scene;
mod sphere;
mod triangle;

pub use bvh::{Bvh, BvhNode, BvhStats};
pub use camera::Camera;
pub use config::{ConfigError, RenderConfig};
pub use framebuffer::{color_to_rgb8, Framebuffer};
pub use integrator::PathTracer;
pub use material::{Bsdf, Material, MaterialHeuristics};
pub use object::{Intersection, Renderable, SurfaceSample};
pub use renderer::{render, row_ranges, RenderError};
pub use scene::Scene;
pub use sphere::Sphere;
pub use triangle::{Triangle, TriangleMesh};

/// Re-export the description types and math used in this crate's API
pub use lumen_core::{Color, Texture};
pub use lumen_math::{Aabb, Interval, Ray, Vec2, Vec3};

use rand::{Rng, RngCore};

/// Probabilities and densities at or below this are treated as zero.
pub const EPSILON: f32 = 1e-5;

/// Uniform sample in [0, 1).
#[inline]
pub(crate) fn gen_f32(rng: &mut dyn RngCore) -> f32 {
    rng.gen::<f32>()
}
