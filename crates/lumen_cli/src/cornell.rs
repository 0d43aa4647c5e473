//! Built-in Cornell box.
//!
//! The classic 555-unit room: white floor, ceiling and back wall, red and
//! green side walls, a warm ceiling light and a mirror ball.

use std::sync::Arc;

use lumen_core::Color;
use lumen_math::Vec3;
use lumen_renderer::{Material, Scene, Sphere, Triangle, TriangleMesh};

/// A planar quad as two triangles, wound `a b c` then `a c d`.
fn quad(a: Vec3, b: Vec3, c: Vec3, d: Vec3, material: &Arc<Material>) -> Vec<Triangle> {
    vec![
        Triangle::new(a, b, c, material.clone()),
        Triangle::new(a, c, d, material.clone()),
    ]
}

fn mesh(name: &str, triangles: Vec<Triangle>, material: Arc<Material>) -> TriangleMesh {
    TriangleMesh::new(name, triangles, material)
}

/// Unbuilt Cornell box scene; the caller builds the BVH.
pub fn cornell_box(width: u32, height: u32, fov: f32) -> Scene {
    let red = Arc::new(Material::diffuse(Color::new(0.63, 0.065, 0.05)).with_name("red"));
    let green = Arc::new(Material::diffuse(Color::new(0.14, 0.45, 0.091)).with_name("green"));
    let white = Arc::new(Material::diffuse(Color::new(0.725, 0.71, 0.68)).with_name("white"));
    let light = Arc::new(
        Material::diffuse(Color::splat(0.65))
            .with_emission(Color::new(34.0, 24.0, 8.0))
            .with_name("light"),
    );
    let mirror = Arc::new(Material::dielectric(12.85).with_name("mirror"));

    let p = Vec3::new;
    let mut scene = Scene::new(width, height, fov);

    let mut walls = Vec::new();
    // Floor
    walls.extend(quad(
        p(552.8, 0.0, 0.0),
        p(0.0, 0.0, 0.0),
        p(0.0, 0.0, 559.2),
        p(549.6, 0.0, 559.2),
        &white,
    ));
    // Ceiling
    walls.extend(quad(
        p(556.0, 548.8, 0.0),
        p(556.0, 548.8, 559.2),
        p(0.0, 548.8, 559.2),
        p(0.0, 548.8, 0.0),
        &white,
    ));
    // Back wall
    walls.extend(quad(
        p(549.6, 0.0, 559.2),
        p(0.0, 0.0, 559.2),
        p(0.0, 548.8, 559.2),
        p(556.0, 548.8, 559.2),
        &white,
    ));
    scene.add(mesh("walls", walls, white.clone()));

    // Left wall as seen from the camera
    let left = quad(
        p(552.8, 0.0, 0.0),
        p(549.6, 0.0, 559.2),
        p(556.0, 548.8, 559.2),
        p(556.0, 548.8, 0.0),
        &red,
    );
    scene.add(mesh("left", left, red));

    let right = quad(
        p(0.0, 0.0, 559.2),
        p(0.0, 0.0, 0.0),
        p(0.0, 548.8, 0.0),
        p(0.0, 548.8, 559.2),
        &green,
    );
    scene.add(mesh("right", right, green));

    // Just below the ceiling, facing down
    let lamp = quad(
        p(343.0, 548.7, 227.0),
        p(343.0, 548.7, 332.0),
        p(213.0, 548.7, 332.0),
        p(213.0, 548.7, 227.0),
        &light,
    );
    scene.add(mesh("light", lamp, light));

    scene.add(Sphere::new(p(150.0, 100.0, 200.0), 100.0, mirror));

    scene
}
