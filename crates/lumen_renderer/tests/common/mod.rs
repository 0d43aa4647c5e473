//! Scene-building helpers shared by the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use lumen_renderer::{Color, Material, Triangle, TriangleMesh, Vec3};

/// The 12 triangles of an axis-aligned box.
pub fn box_triangles(min: Vec3, max: Vec3, material: Arc<Material>) -> Vec<Triangle> {
    let corner = |i: usize| {
        Vec3::new(
            if i & 1 == 0 { min.x } else { max.x },
            if i & 2 == 0 { min.y } else { max.y },
            if i & 4 == 0 { min.z } else { max.z },
        )
    };

    // Each face as a quad of corner indices
    const FACES: [[usize; 4]; 6] = [
        [0, 2, 6, 4], // -X
        [1, 5, 7, 3], // +X
        [0, 4, 5, 1], // -Y
        [2, 3, 7, 6], // +Y
        [0, 1, 3, 2], // -Z
        [4, 6, 7, 5], // +Z
    ];

    FACES
        .iter()
        .flat_map(|[a, b, c, d]| {
            [
                Triangle::new(corner(*a), corner(*b), corner(*c), material.clone()),
                Triangle::new(corner(*a), corner(*c), corner(*d), material.clone()),
            ]
        })
        .collect()
}

pub fn box_mesh(name: &str, min: Vec3, max: Vec3, material: Arc<Material>) -> TriangleMesh {
    TriangleMesh::new(name, box_triangles(min, max, material.clone()), material)
}

pub fn diffuse(albedo: Color) -> Arc<Material> {
    Arc::new(Material::diffuse(albedo))
}

pub fn emitter(emission: Color) -> Arc<Material> {
    Arc::new(Material::diffuse(Color::ZERO).with_emission(emission))
}
