//! Scene: the renderable objects, their BVH and the light table.

use std::sync::Arc;
use std::time::Instant;

use crate::{
    gen_f32,
    object::{Intersection, Renderable, SurfaceSample},
    Bvh,
};
use lumen_math::{Interval, Ray};
use rand::RngCore;

/// Everything the integrator needs to know about the world.
///
/// Objects are added first and [`Scene::build`] is called once before
/// rendering; queries on an unbuilt scene miss everything.
pub struct Scene {
    width: u32,
    height: u32,
    /// Vertical field of view in degrees
    fov: f32,
    objects: Vec<Arc<dyn Renderable>>,
    bvh: Bvh,
    /// Indices of emissive objects and the running sum of their areas
    lights: Vec<usize>,
    light_cdf: Vec<f32>,
    emissive_area: f32,
}

impl Scene {
    pub fn new(width: u32, height: u32, fov: f32) -> Self {
        Self {
            width,
            height,
            fov,
            objects: Vec::new(),
            bvh: Bvh::build(Vec::new(), 1),
            lights: Vec::new(),
            light_cdf: Vec::new(),
            emissive_area: 0.0,
        }
    }

    pub fn add<R: Renderable + 'static>(&mut self, object: R) {
        self.objects.push(Arc::new(object));
    }

    pub fn add_shared(&mut self, object: Arc<dyn Renderable>) {
        self.objects.push(object);
    }

    /// Build with one object per BVH leaf.
    pub fn build(&mut self) {
        self.build_with_leaf_size(1);
    }

    pub fn build_with_leaf_size(&mut self, leaf_size: usize) {
        let start = Instant::now();
        self.bvh = Bvh::build(self.objects.clone(), leaf_size);
        let stats = self.bvh.stats();

        self.lights.clear();
        self.light_cdf.clear();
        self.emissive_area = 0.0;
        for (index, object) in self.objects.iter().enumerate() {
            if object.has_emission() && object.area() > 0.0 {
                self.emissive_area += object.area();
                self.lights.push(index);
                self.light_cdf.push(self.emissive_area);
            }
        }

        log::info!(
            "Scene built in {:.2?}: {} objects, BVH {} nodes / {} leaves / depth {}",
            start.elapsed(),
            self.objects.len(),
            stats.nodes,
            stats.leaves,
            stats.depth
        );

        if self.lights.is_empty() {
            log::warn!("Scene has no emissive surfaces; the image will be black");
        } else {
            log::info!(
                "{} emissive objects, total area {:.3}",
                self.lights.len(),
                self.emissive_area
            );
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn fov(&self) -> f32 {
        self.fov
    }

    pub fn objects(&self) -> &[Arc<dyn Renderable>] {
        &self.objects
    }

    pub fn bvh(&self) -> &Bvh {
        &self.bvh
    }

    /// Closest hit in front of the ray origin.
    pub fn intersect(&self, ray: &Ray) -> Option<Intersection<'_>> {
        self.bvh.intersect(ray, Interval::FORWARD)
    }

    pub fn emissive_area(&self) -> f32 {
        self.emissive_area
    }

    /// Pick an emissive object with probability proportional to its area,
    /// then a point uniformly on it. The density is per unit of total
    /// emissive area. `None` when the scene has no emissive area.
    pub fn sample_emissive(&self, rng: &mut dyn RngCore) -> Option<(SurfaceSample, f32)> {
        if self.emissive_area <= 0.0 {
            return None;
        }

        let target = gen_f32(rng) * self.emissive_area;
        let slot = self
            .light_cdf
            .partition_point(|&a| a <= target)
            .min(self.lights.len() - 1);
        let object = &self.objects[self.lights[slot]];

        let (sample, pdf) = object.sample(rng);
        Some((sample, pdf * object.area() / self.emissive_area))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Color, Material, Sphere, Triangle};
    use lumen_math::Vec3;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn light(emission: f32) -> Arc<Material> {
        Arc::new(Material::diffuse(Color::ONE).with_emission(Color::splat(emission)))
    }

    #[test]
    fn test_unbuilt_scene_misses() {
        let mut scene = Scene::new(4, 4, 40.0);
        scene.add(Sphere::new(Vec3::ZERO, 1.0, light(1.0)));

        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z);
        assert!(scene.intersect(&ray).is_none());

        scene.build();
        let hit = scene.intersect(&ray).unwrap();
        assert!((hit.t - 4.0).abs() < 1e-5);
        assert_eq!(hit.emit, Color::ONE);
    }

    #[test]
    fn test_no_lights() {
        let mut scene = Scene::new(4, 4, 40.0);
        scene.add(Sphere::new(
            Vec3::ZERO,
            1.0,
            Arc::new(Material::diffuse(Color::ONE)),
        ));
        scene.build();

        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(scene.emissive_area(), 0.0);
        assert!(scene.sample_emissive(&mut rng).is_none());
    }

    #[test]
    fn test_light_selection_is_area_weighted() {
        let mut scene = Scene::new(4, 4, 40.0);
        // Area 0.5 at z = 0 and area 1.5 at z = 10
        scene.add(Triangle::new(Vec3::ZERO, Vec3::X, Vec3::Y, light(1.0)));
        scene.add(Triangle::new(
            Vec3::new(0.0, 0.0, 10.0),
            Vec3::new(3.0, 0.0, 10.0),
            Vec3::new(0.0, 1.0, 10.0),
            light(2.0),
        ));
        scene.add(Sphere::new(
            Vec3::splat(50.0),
            1.0,
            Arc::new(Material::diffuse(Color::ONE)),
        ));
        scene.build();

        assert!((scene.emissive_area() - 2.0).abs() < 1e-5);

        let mut rng = StdRng::seed_from_u64(9);
        let samples = 20_000;
        let mut far = 0;
        for _ in 0..samples {
            let (s, pdf) = scene.sample_emissive(&mut rng).unwrap();
            // Density is uniform over the whole emissive area
            assert!((pdf - 0.5).abs() < 1e-5);
            if s.point.z > 5.0 {
                far += 1;
                assert_eq!(s.emit, Color::splat(2.0));
            }
        }
        let fraction = far as f32 / samples as f32;
        assert!((fraction - 0.75).abs() < 0.02, "fraction = {fraction}");
    }
}
