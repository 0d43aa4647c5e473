//! Sphere primitive.

use std::f32::consts::PI;
use std::sync::Arc;

use crate::{
    gen_f32,
    object::{Intersection, Renderable, SurfaceSample},
    Material,
};
use lumen_math::{Aabb, Interval, Ray, Vec2, Vec3};
use rand::RngCore;

/// A sphere primitive.
pub struct Sphere {
    center: Vec3,
    radius: f32,
    material: Arc<Material>,
    bbox: Aabb,
}

impl Sphere {
    /// Create a new sphere.
    pub fn new(center: Vec3, radius: f32, material: Arc<Material>) -> Self {
        let radius = radius.max(0.0);
        let rvec = Vec3::splat(radius);
        let bbox = Aabb::from_points(center - rvec, center + rvec);

        Self {
            center,
            radius,
            material,
            bbox,
        }
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Get the UV coordinates for a point on the unit sphere.
    fn get_sphere_uv(p: Vec3) -> Vec2 {
        // theta: angle down from +Y
        // phi: angle around Y axis from +X
        let theta = (-p.y).clamp(-1.0, 1.0).acos();
        let phi = (-p.z).atan2(p.x) + PI;

        Vec2::new(phi / (2.0 * PI), theta / PI)
    }
}

impl Renderable for Sphere {
    fn intersect<'a>(&'a self, ray: &Ray, ray_t: Interval) -> Option<Intersection<'a>> {
        let oc = self.center - ray.origin();
        let a = ray.direction().length_squared();
        let h = ray.direction().dot(oc);
        let c = oc.length_squared() - self.radius * self.radius;

        let discriminant = h * h - a * c;
        if discriminant < 0.0 || a == 0.0 {
            return None;
        }

        let sqrtd = discriminant.sqrt();

        // Find the nearest root in the acceptable range
        let mut root = (h - sqrtd) / a;
        if !ray_t.surrounds(root) {
            root = (h + sqrtd) / a;
            if !ray_t.surrounds(root) {
                return None;
            }
        }

        let outward_normal = (ray.at(root) - self.center) / self.radius;
        let uv = Self::get_sphere_uv(outward_normal);
        Some(Intersection::new(ray, root, outward_normal, uv, &self.material))
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }

    fn area(&self) -> f32 {
        4.0 * PI * self.radius * self.radius
    }

    fn sample(&self, rng: &mut dyn RngCore) -> (SurfaceSample, f32) {
        let z = 1.0 - 2.0 * gen_f32(rng);
        let r = (1.0 - z * z).max(0.0).sqrt();
        let phi = 2.0 * PI * gen_f32(rng);
        let normal = Vec3::new(r * phi.cos(), r * phi.sin(), z);

        let sample = SurfaceSample {
            point: self.center + self.radius * normal,
            normal,
            emit: self.material.emission,
        };
        let area = self.area();
        let pdf = if area > 0.0 { 1.0 / area } else { 0.0 };
        (sample, pdf)
    }

    fn material(&self) -> &Material {
        &self.material
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Color;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn grey() -> Arc<Material> {
        Arc::new(Material::diffuse(Color::splat(0.5)))
    }

    #[test]
    fn test_sphere_hit() {
        let sphere = Sphere::new(Vec3::new(0.0, 0.0, -1.0), 0.5, grey());

        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
        let hit = sphere.intersect(&ray, Interval::new(0.001, f32::INFINITY)).unwrap();

        assert!((hit.t - 0.5).abs() < 0.001); // Should hit at t=0.5
        assert!(hit.front_face);
        assert!((hit.normal - Vec3::Z).length() < 1e-5);
        assert_eq!(hit.emit, Color::ZERO);
    }

    #[test]
    fn test_sphere_miss() {
        let sphere = Sphere::new(Vec3::new(0.0, 0.0, -1.0), 0.5, grey());

        // Ray pointing away from sphere
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 1.0, 0.0));
        assert!(sphere.intersect(&ray, Interval::new(0.001, f32::INFINITY)).is_none());
    }

    #[test]
    fn test_hit_from_inside_flips_normal() {
        let sphere = Sphere::new(Vec3::ZERO, 2.0, grey());
        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        let hit = sphere.intersect(&ray, Interval::FORWARD).unwrap();

        assert!((hit.t - 2.0).abs() < 1e-5);
        assert!(!hit.front_face);
        assert!((hit.normal + Vec3::X).length() < 1e-5);
    }

    #[test]
    fn test_samples_lie_on_surface() {
        let sphere = Sphere::new(Vec3::new(1.0, 2.0, 3.0), 0.5, grey());
        let mut rng = StdRng::seed_from_u64(42);

        let mut mean = Vec3::ZERO;
        for _ in 0..2000 {
            let (s, pdf) = sphere.sample(&mut rng);
            assert!(((s.point - sphere.center()).length() - 0.5).abs() < 1e-4);
            assert!((s.normal.length() - 1.0).abs() < 1e-4);
            assert!((pdf * sphere.area() - 1.0).abs() < 1e-5);
            mean += s.normal;
        }
        // Uniform directions average out
        assert!((mean / 2000.0).length() < 0.1);
    }
}
