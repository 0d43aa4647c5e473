use crate::Vec3;

/// A ray in 3D space with an origin and a unit-length direction.
///
/// The reciprocal of the direction is cached at construction because every
/// bounding-box slab test along the ray needs it.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    inv_direction: Vec3,
}

impl Ray {
    /// Create a new ray. `direction` is normalized here.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        let direction = direction.normalize_or_zero();
        Self {
            origin,
            direction,
            inv_direction: direction.recip(),
        }
    }

    /// Get the origin point of the ray.
    #[inline]
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    /// Get the unit direction of the ray.
    #[inline]
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Component-wise reciprocal of the direction (infinite on zero axes).
    #[inline]
    pub fn inv_direction(&self) -> Vec3 {
        self.inv_direction
    }

    /// Get the point along the ray at distance t.
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ray_direction_is_normalized() {
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 3.0, 4.0));
        assert!((ray.direction().length() - 1.0).abs() < 1e-6);
        assert!((ray.direction().y - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_ray_at_is_a_distance() {
        let ray = Ray::new(Vec3::new(1.0, 0.0, 0.0), Vec3::new(10.0, 0.0, 0.0));

        assert_eq!(ray.at(0.0), Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(ray.at(2.5), Vec3::new(3.5, 0.0, 0.0));
    }

    #[test]
    fn test_inv_direction_handles_axis_aligned_rays() {
        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        assert_eq!(ray.inv_direction().x, 1.0);
        assert!(ray.inv_direction().y.is_infinite());
        assert!(ray.inv_direction().z.is_infinite());
    }
}
