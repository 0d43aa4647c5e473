//! Triangle primitives.
//!
//! Uses the Möller-Trumbore algorithm for ray-triangle intersection.
//! [`TriangleMesh`] groups the triangles of one imported mesh behind its own
//! BVH so the scene hierarchy sees a single object per mesh.

use std::sync::Arc;

use crate::{
    gen_f32,
    object::{Intersection, Renderable, SurfaceSample},
    Bvh, Material,
};
use lumen_core::mesh::{Mesh, MeshTriangle};
use lumen_math::{Aabb, Interval, Ray, Vec2, Vec3};
use rand::RngCore;

/// Leaf size of the per-mesh BVH.
const MESH_LEAF_SIZE: usize = 4;

/// A triangle primitive.
pub struct Triangle {
    /// Vertices
    v0: Vec3,
    v1: Vec3,
    v2: Vec3,
    /// Texture coordinates per vertex
    uvs: [Vec2; 3],
    /// Pre-computed face normal (unit length, zero if degenerate)
    normal: Vec3,
    area: f32,
    material: Arc<Material>,
    bbox: Aabb,
}

impl Triangle {
    /// Create a new triangle from three vertices.
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3, material: Arc<Material>) -> Self {
        let cross = (v1 - v0).cross(v2 - v0);

        Self {
            v0,
            v1,
            v2,
            uvs: [Vec2::ZERO, Vec2::X, Vec2::Y],
            normal: cross.normalize_or_zero(),
            area: 0.5 * cross.length(),
            material,
            bbox: Aabb::from_point_cloud([v0, v1, v2]),
        }
    }

    pub fn with_uvs(mut self, uvs: [Vec2; 3]) -> Self {
        self.uvs = uvs;
        self
    }

    pub fn from_mesh_triangle(triangle: &MeshTriangle, material: Arc<Material>) -> Self {
        let [v0, v1, v2] = triangle.positions;
        Self::new(v0, v1, v2, material).with_uvs(triangle.uvs)
    }

    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    pub fn is_degenerate(&self) -> bool {
        self.area <= 0.0
    }
}

impl Renderable for Triangle {
    /// Möller-Trumbore ray-triangle intersection algorithm.
    fn intersect<'a>(&'a self, ray: &Ray, ray_t: Interval) -> Option<Intersection<'a>> {
        let edge1 = self.v1 - self.v0;
        let edge2 = self.v2 - self.v0;

        let h = ray.direction().cross(edge2);
        let a = edge1.dot(h);

        // Ray is parallel to triangle
        if a.abs() < 1e-8 {
            return None;
        }

        let f = 1.0 / a;
        let s = ray.origin() - self.v0;
        let u = f * s.dot(h);

        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(edge1);
        let v = f * ray.direction().dot(q);

        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = f * edge2.dot(q);
        if !ray_t.surrounds(t) {
            return None;
        }

        let uv = self.uvs[0] * (1.0 - u - v) + self.uvs[1] * u + self.uvs[2] * v;
        Some(Intersection::new(ray, t, self.normal, uv, &self.material))
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }

    fn area(&self) -> f32 {
        self.area
    }

    fn sample(&self, rng: &mut dyn RngCore) -> (SurfaceSample, f32) {
        let s = gen_f32(rng).sqrt();
        let u2 = gen_f32(rng);
        let point = self.v0 * (1.0 - s) + self.v1 * (s * (1.0 - u2)) + self.v2 * (s * u2);

        let sample = SurfaceSample {
            point,
            normal: self.normal,
            emit: self.material.emission,
        };
        let pdf = if self.area > 0.0 { 1.0 / self.area } else { 0.0 };
        (sample, pdf)
    }

    fn material(&self) -> &Material {
        &self.material
    }
}

/// All triangles of one mesh, sharing a material.
pub struct TriangleMesh {
    name: String,
    triangles: Bvh,
    /// Running sum of triangle areas, for area-proportional sampling
    area_cdf: Vec<f32>,
    area: f32,
    material: Arc<Material>,
}

impl TriangleMesh {
    pub fn new(name: impl Into<String>, triangles: Vec<Triangle>, material: Arc<Material>) -> Self {
        let name = name.into();
        let total = triangles.len();

        let triangles: Vec<Arc<dyn Renderable>> = triangles
            .into_iter()
            .filter(|t| !t.is_degenerate())
            .map(|t| Arc::new(t) as Arc<dyn Renderable>)
            .collect();

        if triangles.len() < total {
            log::warn!(
                "Mesh {}: skipped {} degenerate triangles",
                name,
                total - triangles.len()
            );
        }

        let mut area = 0.0;
        let area_cdf = triangles
            .iter()
            .map(|t| {
                area += t.area();
                area
            })
            .collect();

        Self {
            name,
            triangles: Bvh::build(triangles, MESH_LEAF_SIZE),
            area_cdf,
            area,
            material,
        }
    }

    /// Triangulate an imported mesh with a single material.
    pub fn from_mesh(mesh: &Mesh, material: Arc<Material>) -> Self {
        let triangles = mesh
            .triangles()
            .iter()
            .map(|t| Triangle::from_mesh_triangle(t, material.clone()))
            .collect();
        Self::new(mesh.name.clone(), triangles, material)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }
}

impl Renderable for TriangleMesh {
    fn intersect<'a>(&'a self, ray: &Ray, ray_t: Interval) -> Option<Intersection<'a>> {
        self.triangles.intersect(ray, ray_t)
    }

    fn bounding_box(&self) -> Aabb {
        self.triangles.bounding_box()
    }

    fn area(&self) -> f32 {
        self.area
    }

    fn sample(&self, rng: &mut dyn RngCore) -> (SurfaceSample, f32) {
        let objects = self.triangles.objects();
        let target = gen_f32(rng) * self.area;
        let index = self
            .area_cdf
            .partition_point(|&a| a <= target)
            .min(objects.len().saturating_sub(1));

        match objects.get(index) {
            Some(triangle) => {
                let (sample, _) = triangle.sample(rng);
                (sample, 1.0 / self.area)
            }
            None => (
                SurfaceSample {
                    point: Vec3::ZERO,
                    normal: Vec3::ZERO,
                    emit: self.material.emission,
                },
                0.0,
            ),
        }
    }

    fn material(&self) -> &Material {
        &self.material
    }
}
