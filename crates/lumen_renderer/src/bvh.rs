//! Bounding Volume Hierarchy (BVH) acceleration structure.
//!
//! A binary tree over an owned object list. Leaves store indices into that
//! list, so a hit can report which object it came from.

use std::sync::Arc;

use crate::object::{Intersection, Renderable};
use lumen_math::{Aabb, Interval, Ray, Vec3};

/// BVH node - either a branch with two children or a leaf with primitives.
#[derive(Debug)]
pub enum BvhNode {
    /// Internal node with two children.
    Branch {
        left: Box<BvhNode>,
        right: Box<BvhNode>,
        bbox: Aabb,
    },
    /// Leaf node holding indices into [`Bvh::objects`].
    Leaf { objects: Vec<usize>, bbox: Aabb },
    /// Empty node (for edge cases).
    Empty,
}

impl BvhNode {
    pub fn bounding_box(&self) -> Aabb {
        match self {
            BvhNode::Empty => Aabb::EMPTY,
            BvhNode::Leaf { bbox, .. } => *bbox,
            BvhNode::Branch { bbox, .. } => *bbox,
        }
    }
}

/// Shape of a built hierarchy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BvhStats {
    pub nodes: usize,
    pub leaves: usize,
    pub depth: usize,
}

/// Objects plus the tree built over them.
pub struct Bvh {
    objects: Vec<Arc<dyn Renderable>>,
    root: BvhNode,
}

impl Bvh {
    /// Build a BVH. Sets of at most `leaf_size` objects become leaves
    /// (a `leaf_size` of zero is treated as one).
    pub fn build(objects: Vec<Arc<dyn Renderable>>, leaf_size: usize) -> Self {
        if objects.is_empty() {
            return Self {
                objects,
                root: BvhNode::Empty,
            };
        }

        let boxes: Vec<Aabb> = objects.iter().map(|o| o.bounding_box()).collect();
        let centroids: Vec<Vec3> = boxes.iter().map(Aabb::centroid).collect();
        let indices = (0..objects.len()).collect();

        let root = build_node(indices, &boxes, &centroids, leaf_size.max(1));
        Self { objects, root }
    }

    pub fn root(&self) -> &BvhNode {
        &self.root
    }

    pub fn objects(&self) -> &[Arc<dyn Renderable>] {
        &self.objects
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn bounding_box(&self) -> Aabb {
        self.root.bounding_box()
    }

    pub fn stats(&self) -> BvhStats {
        fn walk(node: &BvhNode, depth: usize, stats: &mut BvhStats) {
            match node {
                BvhNode::Empty => {}
                BvhNode::Leaf { .. } => {
                    stats.nodes += 1;
                    stats.leaves += 1;
                    stats.depth = stats.depth.max(depth);
                }
                BvhNode::Branch { left, right, .. } => {
                    stats.nodes += 1;
                    walk(left, depth + 1, stats);
                    walk(right, depth + 1, stats);
                }
            }
        }

        let mut stats = BvhStats::default();
        walk(&self.root, 1, &mut stats);
        stats
    }

    /// Closest hit within `ray_t`. The returned intersection's `object` is
    /// the index of the hit object in [`Bvh::objects`].
    pub fn intersect(&self, ray: &Ray, ray_t: Interval) -> Option<Intersection<'_>> {
        self.root.bounding_box().hit(ray, ray_t)?;
        self.intersect_node(&self.root, ray, ray_t)
    }

    /// Node boxes are tested by the caller before descending.
    fn intersect_node<'a>(
        &'a self,
        node: &'a BvhNode,
        ray: &Ray,
        ray_t: Interval,
    ) -> Option<Intersection<'a>> {
        match node {
            BvhNode::Empty => None,

            BvhNode::Leaf { objects, .. } => {
                let mut closest = None;
                let mut range = ray_t;

                for &index in objects {
                    if let Some(mut hit) = self.objects[index].intersect(ray, range) {
                        range = range.with_max(hit.t);
                        hit.object = index;
                        closest = Some(hit);
                    }
                }
                closest
            }

            BvhNode::Branch { left, right, .. } => {
                let left_t = left.bounding_box().hit(ray, ray_t);
                let right_t = right.bounding_box().hit(ray, ray_t);

                // Visit the nearer child first so the farther one can be
                // searched with a shrunken interval (or skipped).
                let (near, far, far_t) = match (left_t, right_t) {
                    (None, None) => return None,
                    (Some(_), None) => return self.intersect_node(left, ray, ray_t),
                    (None, Some(_)) => return self.intersect_node(right, ray, ray_t),
                    (Some(l), Some(r)) if l <= r => (left, right, r),
                    (Some(l), Some(_)) => (right, left, l),
                };

                let near_hit = self.intersect_node(near, ray, ray_t);
                let range = match &near_hit {
                    Some(hit) => ray_t.with_max(hit.t),
                    None => ray_t,
                };
                if far_t > range.max {
                    return near_hit;
                }

                self.intersect_node(far, ray, range).or(near_hit)
            }
        }
    }
}

/// Recursive BVH construction.
///
/// Simple median-split approach: sort objects by centroid on the axis of
/// largest centroid spread, split in half, recurse.
fn build_node(
    mut indices: Vec<usize>,
    boxes: &[Aabb],
    centroids: &[Vec3],
    leaf_size: usize,
) -> BvhNode {
    let bbox = indices
        .iter()
        .fold(Aabb::EMPTY, |acc, &i| Aabb::surrounding(&acc, &boxes[i]));

    if indices.len() <= leaf_size {
        return BvhNode::Leaf {
            objects: indices,
            bbox,
        };
    }

    let centroid_bounds = Aabb::from_point_cloud(indices.iter().map(|&i| centroids[i]));
    let axis = centroid_bounds.longest_axis();

    indices.sort_by(|&a, &b| centroids[a][axis].total_cmp(&centroids[b][axis]));

    let mid = indices.len() / 2;
    let right = indices.split_off(mid);
    let left = indices;

    BvhNode::Branch {
        left: Box::new(build_node(left, boxes, centroids, leaf_size)),
        right: Box::new(build_node(right, boxes, centroids, leaf_size)),
        bbox,
    }
}
