//! Monte Carlo light transport.
//!
//! Each hit gathers direct light by sampling a point on an emissive surface
//! (next-event estimation) and continues the path with probability
//! `russian_roulette` along a material-sampled direction.

use crate::{gen_f32, Color, RenderConfig, Scene, EPSILON};
use lumen_math::{Ray, Vec3};
use rand::RngCore;

/// Base offset applied to ray origins leaving a surface, scaled by the
/// magnitude of the hit point.
const RAY_OFFSET: f32 = 1e-4;

/// Relative tolerance when matching a shadow-ray hit to the light sample.
const SHADOW_TOLERANCE: f32 = 1e-3;

/// Unidirectional path tracer with next-event estimation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathTracer {
    russian_roulette: f32,
    max_depth: Option<u32>,
}

impl PathTracer {
    pub fn new(russian_roulette: f32) -> Self {
        Self {
            russian_roulette: russian_roulette.clamp(0.0, 1.0),
            max_depth: None,
        }
    }

    pub fn from_config(config: &RenderConfig) -> Self {
        Self::new(config.russian_roulette).with_max_depth(config.max_depth)
    }

    pub fn with_max_depth(mut self, max_depth: Option<u32>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Radiance arriving along `ray` (towards its origin). `depth` is the
    /// number of bounces already taken; camera rays start at 0.
    pub fn cast_ray(&self, scene: &Scene, ray: &Ray, depth: u32, rng: &mut dyn RngCore) -> Color {
        self.trace(scene, ray, depth, true, rng)
    }

    /// `count_emission` is false after a non-specular bounce, whose
    /// emission was already gathered by next-event estimation.
    fn trace(
        &self,
        scene: &Scene,
        ray: &Ray,
        depth: u32,
        count_emission: bool,
        rng: &mut dyn RngCore,
    ) -> Color {
        if self.max_depth.is_some_and(|max| depth > max) {
            return Color::ZERO;
        }

        let Some(hit) = scene.intersect(ray) else {
            return Color::ZERO;
        };

        let material = hit.material;
        let n = hit.normal;
        let wi = -ray.direction();

        let mut radiance = if count_emission { hit.emit } else { Color::ZERO };

        // Direct lighting
        if !material.is_specular() {
            if let Some((light, pdf)) = scene.sample_emissive(rng) {
                let to_light = light.point - hit.point;
                let dist2 = to_light.length_squared();

                if pdf > EPSILON && dist2 > 0.0 {
                    let l = to_light / dist2.sqrt();
                    let cos_surface = n.dot(l);
                    let cos_light = light.normal.dot(-l);

                    if cos_surface > 0.0 && cos_light > 0.0 {
                        let shadow = Ray::new(offset_origin(hit.point, n, l), l);
                        let distance = (light.point - shadow.origin()).length();
                        let visible = scene.intersect(&shadow).is_some_and(|blocker| {
                            (blocker.t - distance).abs() < SHADOW_TOLERANCE * distance.max(1.0)
                        });

                        if visible {
                            let f = material.eval(wi, l, n, hit.uv);
                            radiance += light.emit * f * (cos_surface * cos_light / (dist2 * pdf));
                        }
                    }
                }
            }
        }

        // Indirect lighting
        if self.russian_roulette > 0.0 && gen_f32(rng) < self.russian_roulette {
            let wo = material.sample(wi, n, rng);
            let pdf = material.pdf(wi, wo, n);

            if pdf > EPSILON {
                let cos = n.dot(wo).max(0.0);
                let f = material.eval(wi, wo, n, hit.uv);
                let next = Ray::new(offset_origin(hit.point, n, wo), wo);
                let incoming = self.trace(scene, &next, depth + 1, material.is_specular(), rng);

                radiance += incoming * f * (cos / (pdf * self.russian_roulette));
            }
        }

        radiance
    }
}

/// Push `point` off the surface to the side `dir` leaves from.
fn offset_origin(point: Vec3, n: Vec3, dir: Vec3) -> Vec3 {
    let offset = RAY_OFFSET * (1.0 + point.abs().max_element());
    if dir.dot(n) >= 0.0 {
        point + n * offset
    } else {
        point - n * offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Material, Sphere, Triangle};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;

    fn lit_floor() -> Scene {
        let mut scene = Scene::new(4, 4, 40.0);
        let white = Arc::new(Material::diffuse(Color::splat(0.5)));
        let light = Arc::new(Material::diffuse(Color::ZERO).with_emission(Color::splat(4.0)));

        scene.add(Triangle::new(
            Vec3::new(-10.0, 0.0, -10.0),
            Vec3::new(-10.0, 0.0, 10.0),
            Vec3::new(10.0, 0.0, 0.0),
            white,
        ));
        scene.add(Sphere::new(Vec3::new(0.0, 3.0, 0.0), 0.5, light));
        scene.build();
        scene
    }

    #[test]
    fn test_miss_is_black() {
        let scene = lit_floor();
        let mut rng = StdRng::seed_from_u64(0);
        // Climbs away from the floor and passes wide of the light
        let ray = Ray::new(Vec3::new(0.0, 1.0, 0.0), Vec3::new(1.0, 0.2, 0.0));
        assert_eq!(PathTracer::new(0.8).cast_ray(&scene, &ray, 0, &mut rng), Color::ZERO);
    }

    #[test]
    fn test_camera_ray_sees_emission() {
        let scene = lit_floor();
        let mut rng = StdRng::seed_from_u64(0);
        let ray = Ray::new(Vec3::new(0.0, 3.0, 5.0), Vec3::NEG_Z);

        // Black light surface: only its own emission, no reflected light
        let color = PathTracer::new(0.0).cast_ray(&scene, &ray, 0, &mut rng);
        assert_eq!(color, Color::splat(4.0));
    }

    #[test]
    fn test_direct_light_is_non_negative_and_finite() {
        let scene = lit_floor();
        let tracer = PathTracer::new(0.8);
        let mut rng = StdRng::seed_from_u64(5);
        let ray = Ray::new(Vec3::new(0.0, 2.0, 4.0), Vec3::new(0.0, -2.0, -4.0));

        let mut sum = Color::ZERO;
        for _ in 0..500 {
            let c = tracer.cast_ray(&scene, &ray, 0, &mut rng);
            assert!(c.is_finite());
            assert!(c.min_element() >= 0.0);
            sum += c;
        }
        assert!(sum.x > 0.0);
    }

    #[test]
    fn test_max_depth_cuts_paths() {
        let scene = lit_floor();
        let mut rng = StdRng::seed_from_u64(1);
        let ray = Ray::new(Vec3::new(0.0, 3.0, 5.0), Vec3::NEG_Z);

        // Depth beyond the cap returns nothing, even for an emitter
        let tracer = PathTracer::new(1.0).with_max_depth(Some(2));
        assert_eq!(tracer.cast_ray(&scene, &ray, 3, &mut rng), Color::ZERO);
        assert_eq!(tracer.cast_ray(&scene, &ray, 2, &mut rng).x, 4.0);
    }

    #[test]
    fn test_offset_origin_follows_direction() {
        let p = Vec3::new(100.0, 0.0, 0.0);
        let above = offset_origin(p, Vec3::Y, Vec3::new(0.3, 0.5, 0.0));
        let below = offset_origin(p, Vec3::Y, Vec3::new(0.3, -0.5, 0.0));

        assert!(above.y > 0.0);
        assert!(below.y < 0.0);
        // Scaled by the point's magnitude
        assert!((above.y - RAY_OFFSET * 101.0).abs() < 1e-6);
    }
}
