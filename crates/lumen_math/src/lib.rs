//! Math primitives shared by the Lumen crates.
//!
//! Vector types come straight from glam; this crate only adds the ray,
//! parameter interval and axis-aligned box used by intersection code.

// Re-export glam for convenience
pub use glam::*;

mod aabb;
mod interval;
mod ray;

pub use aabb::Aabb;
pub use interval::Interval;
pub use ray::Ray;

/// Axis index with the largest component of `v` (0=X, 1=Y, 2=Z).
#[inline]
pub fn max_axis(v: Vec3) -> usize {
    if v.x > v.y && v.x > v.z {
        0
    } else if v.y > v.z {
        1
    } else {
        2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_axis() {
        assert_eq!(max_axis(Vec3::new(3.0, 1.0, 2.0)), 0);
        assert_eq!(max_axis(Vec3::new(0.0, 5.0, 2.0)), 1);
        assert_eq!(max_axis(Vec3::new(0.0, 1.0, 2.0)), 2);
    }

    #[test]
    fn test_max_axis_ties_prefer_later_axis() {
        assert_eq!(max_axis(Vec3::ONE), 2);
    }
}
