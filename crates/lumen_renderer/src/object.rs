//! The `Renderable` trait and the records it produces.

use crate::{Color, Material};
use lumen_math::{Aabb, Interval, Ray, Vec2, Vec3};
use rand::RngCore;

/// Record of a ray-object intersection.
#[derive(Clone, Debug)]
pub struct Intersection<'a> {
    /// Ray parameter of the hit
    pub t: f32,
    /// World-space hit point
    pub point: Vec3,
    /// Shading normal, always facing against the incoming ray
    pub normal: Vec3,
    /// Whether the ray hit the outside of the surface
    pub front_face: bool,
    /// Texture coordinates
    pub uv: Vec2,
    /// Material at the hit point
    pub material: &'a Material,
    /// Emitted radiance (zero for non-emissive surfaces)
    pub emit: Color,
    /// Index of the hit object in the structure that was queried
    pub object: usize,
}

impl<'a> Intersection<'a> {
    pub fn new(ray: &Ray, t: f32, outward_normal: Vec3, uv: Vec2, material: &'a Material) -> Self {
        let mut hit = Self {
            t,
            point: ray.at(t),
            normal: outward_normal,
            front_face: true,
            uv,
            material,
            emit: material.emission,
            object: 0,
        };
        hit.set_face_normal(ray, outward_normal);
        hit
    }

    /// Set the face normal based on ray direction and outward normal.
    ///
    /// The normal is always stored pointing against the ray direction,
    /// so we need to track whether we hit the front or back face.
    pub fn set_face_normal(&mut self, ray: &Ray, outward_normal: Vec3) {
        self.front_face = ray.direction().dot(outward_normal) < 0.0;
        self.normal = if self.front_face {
            outward_normal
        } else {
            -outward_normal
        };
    }
}

/// A point drawn uniformly from an object's surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceSample {
    pub point: Vec3,
    /// Outward geometric normal at `point`
    pub normal: Vec3,
    /// Radiance emitted from `point`
    pub emit: Color,
}

/// Geometry the renderer can intersect and, for lights, sample.
pub trait Renderable: Send + Sync {
    /// Closest hit with `ray_t.min < t < ray_t.max`, if any.
    fn intersect<'a>(&'a self, ray: &Ray, ray_t: Interval) -> Option<Intersection<'a>>;

    fn bounding_box(&self) -> Aabb;

    /// Total surface area.
    fn area(&self) -> f32;

    /// Uniform-by-area surface sample and its density per unit area.
    fn sample(&self, rng: &mut dyn RngCore) -> (SurfaceSample, f32);

    fn material(&self) -> &Material;

    fn has_emission(&self) -> bool {
        self.material().has_emission()
    }
}
