//! BVH query tests against analytic answers and brute force.

mod common;

use std::sync::Arc;

use lumen_renderer::{Bvh, BvhNode, Color, Interval, Ray, Renderable, Sphere, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn disjoint_boxes(count: usize) -> Vec<Arc<dyn Renderable>> {
    let material = common::diffuse(Color::splat(0.5));
    (0..count)
        .map(|i| {
            let x = 3.0 * i as f32;
            Arc::new(common::box_mesh(
                &format!("box{i}"),
                Vec3::new(x, 0.0, 0.0),
                Vec3::new(x + 1.0, 1.0, 1.0),
                material.clone(),
            )) as Arc<dyn Renderable>
        })
        .collect()
}

fn random_spheres(count: usize, seed: u64) -> Vec<Arc<dyn Renderable>> {
    let material = common::diffuse(Color::splat(0.5));
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let center = Vec3::new(
                rng.gen_range(-20.0..20.0),
                rng.gen_range(-20.0..20.0),
                rng.gen_range(-20.0..20.0),
            );
            Arc::new(Sphere::new(center, rng.gen_range(0.1..1.5), material.clone()))
                as Arc<dyn Renderable>
        })
        .collect()
}

fn random_ray(rng: &mut StdRng) -> Ray {
    let origin = Vec3::new(
        rng.gen_range(-30.0..30.0),
        rng.gen_range(-30.0..30.0),
        rng.gen_range(-30.0..30.0),
    );
    // Aim near the middle of the cloud so most rays hit something
    let target = Vec3::new(
        rng.gen_range(-10.0..10.0),
        rng.gen_range(-10.0..10.0),
        rng.gen_range(-10.0..10.0),
    );
    Ray::new(origin, target - origin)
}

/// Closest hit by testing every object.
fn brute_force(objects: &[Arc<dyn Renderable>], ray: &Ray) -> Option<(usize, f32)> {
    let mut closest: Option<(usize, f32)> = None;
    for (index, object) in objects.iter().enumerate() {
        let range = Interval::new(0.0, closest.map_or(f32::INFINITY, |(_, t)| t));
        if let Some(hit) = object.intersect(ray, range) {
            closest = Some((index, hit.t));
        }
    }
    closest
}

#[test]
fn test_single_box_hit_reports_object_and_distance() {
    for leaf_size in [1, 2, 4] {
        let bvh = Bvh::build(disjoint_boxes(6), leaf_size);

        // Straight into the front face (z = 0) of box 3
        let ray = Ray::new(Vec3::new(9.3, 0.6, -5.0), Vec3::Z);
        let hit = bvh.intersect(&ray, Interval::FORWARD).unwrap();
        assert_eq!(hit.object, 3, "leaf_size {leaf_size}");
        assert!((hit.t - 5.0).abs() < 1e-4);
        assert!((hit.normal - Vec3::NEG_Z).length() < 1e-5);

        // Along the row, only the first box is reported
        let ray = Ray::new(Vec3::new(-10.0, 0.6, 0.3), Vec3::X);
        let hit = bvh.intersect(&ray, Interval::FORWARD).unwrap();
        assert_eq!(hit.object, 0);
        assert!((hit.t - 10.0).abs() < 1e-4);

        // Through the gap between boxes 1 and 2
        let ray = Ray::new(Vec3::new(5.0, 0.5, -5.0), Vec3::Z);
        assert!(bvh.intersect(&ray, Interval::FORWARD).is_none());
    }
}

#[test]
fn test_nodes_enclose_their_contents() {
    fn check(node: &BvhNode, objects: &[Arc<dyn Renderable>], seen: &mut Vec<usize>) {
        match node {
            BvhNode::Empty => {}
            BvhNode::Leaf { objects: indices, bbox } => {
                for &i in indices {
                    assert!(bbox.encloses(&objects[i].bounding_box()));
                    seen.push(i);
                }
            }
            BvhNode::Branch { left, right, bbox } => {
                let union =
                    lumen_renderer::Aabb::surrounding(&left.bounding_box(), &right.bounding_box());
                assert_eq!(*bbox, union);
                check(left, objects, seen);
                check(right, objects, seen);
            }
        }
    }

    for leaf_size in [1, 3, 8] {
        let objects = random_spheres(200, 17);
        let bvh = Bvh::build(objects.clone(), leaf_size);

        let mut seen = Vec::new();
        check(bvh.root(), &objects, &mut seen);

        // Every object appears in exactly one leaf
        seen.sort_unstable();
        assert_eq!(seen, (0..200).collect::<Vec<_>>());
    }
}

#[test]
fn test_matches_brute_force() {
    let objects = random_spheres(150, 5);
    let bvh = Bvh::build(objects.clone(), 2);
    let mut rng = StdRng::seed_from_u64(99);

    let mut hits = 0;
    for _ in 0..2000 {
        let ray = random_ray(&mut rng);
        let expected = brute_force(&objects, &ray);
        let actual = bvh.intersect(&ray, Interval::FORWARD).map(|h| (h.object, h.t));

        match (expected, actual) {
            (None, None) => {}
            (Some((ei, et)), Some((ai, at))) => {
                assert_eq!(ei, ai);
                assert!((et - at).abs() < 1e-4);
                hits += 1;
            }
            other => panic!("BVH and brute force disagree: {other:?}"),
        }
    }
    assert!(hits > 200, "only {hits} rays hit anything");
}

#[test]
fn test_building_twice_gives_identical_answers() {
    let objects = random_spheres(300, 23);
    let first = Bvh::build(objects.clone(), 1);
    let second = Bvh::build(objects, 1);

    assert_eq!(first.stats(), second.stats());

    let mut rng = StdRng::seed_from_u64(4);
    for _ in 0..2000 {
        let ray = random_ray(&mut rng);
        let a = first.intersect(&ray, Interval::FORWARD).map(|h| (h.object, h.t));
        let b = second.intersect(&ray, Interval::FORWARD).map(|h| (h.object, h.t));
        assert_eq!(a, b);
    }
}
