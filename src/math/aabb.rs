use serde::Serialize;

use super::Point3;

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Aabb {
    /// Minimum corner of the bounding box.
    pub min: Point3,
    /// Maximum corner of the bounding box.
    pub max: Point3,
}

impl Aabb {
    /// Creates a bounding box from its two corners.
    #[must_use]
    pub fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }

    /// Creates an inverted box that any point will expand.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// Computes the bounding box of a set of points, or `None` if empty.
    #[must_use]
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point3>,
    {
        let mut aabb = Self::empty();
        let mut any = false;
        for p in points {
            aabb.expand_point(p);
            any = true;
        }
        any.then_some(aabb)
    }

    /// Grows the box to include `point`.
    pub fn expand_point(&mut self, point: &Point3) {
        self.min.x = self.min.x.min(point.x);
        self.min.y = self.min.y.min(point.y);
        self.min.z = self.min.z.min(point.z);
        self.max.x = self.max.x.max(point.x);
        self.max.y = self.max.y.max(point.y);
        self.max.z = self.max.z.max(point.z);
    }

    /// Grows the box to include `other`.
    pub fn expand(&mut self, other: &Self) {
        self.expand_point(&other.min);
        self.expand_point(&other.max);
    }

    /// Returns `true` if the open interiors of both boxes overlap on every axis.
    ///
    /// Boxes that merely touch (one box's minimum equals the other's maximum
    /// on some axis) are reported as disjoint.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        (0..3).all(|i| self.min[i] < other.max[i] && other.min[i] < self.max[i])
    }

    /// Overlap test with a tolerance, treating touching boxes as overlapping.
    #[must_use]
    pub fn intersects(&self, other: &Self, tolerance: f64) -> bool {
        (0..3).all(|i| {
            self.min[i] <= other.max[i] + tolerance && other.min[i] <= self.max[i] + tolerance
        })
    }

    /// Returns `true` if `other` lies within this box grown by `slack` on every side.
    #[must_use]
    pub fn contains_with_slack(&self, other: &Self, slack: f64) -> bool {
        (0..3).all(|i| other.min[i] >= self.min[i] - slack && other.max[i] <= self.max[i] + slack)
    }

    /// Returns `true` if `point` lies within the box grown by `tolerance`.
    #[must_use]
    pub fn contains_point(&self, point: &Point3, tolerance: f64) -> bool {
        (0..3).all(|i| point[i] >= self.min[i] - tolerance && point[i] <= self.max[i] + tolerance)
    }

    /// Returns a copy grown by `padding` on every side.
    #[must_use]
    pub fn padded(&self, padding: f64) -> Self {
        Self {
            min: Point3::new(self.min.x - padding, self.min.y - padding, self.min.z - padding),
            max: Point3::new(self.max.x + padding, self.max.y + padding, self.max.z + padding),
        }
    }

    /// Center of the box.
    #[must_use]
    pub fn center(&self) -> Point3 {
        nalgebra::center(&self.min, &self.max)
    }

    /// Index of the longest axis (0 = X, 1 = Y, 2 = Z).
    #[must_use]
    pub fn longest_axis(&self) -> usize {
        let d = self.max - self.min;
        if d.x >= d.y && d.x >= d.z {
            0
        } else if d.y >= d.z {
            1
        } else {
            2
        }
    }

    /// Slab test for a ray `origin + t * dir`, `t >= 0`.
    #[must_use]
    pub fn hit_by_ray(&self, origin: &Point3, dir: &super::Vector3) -> bool {
        let mut t_min = 0.0_f64;
        let mut t_max = f64::INFINITY;
        for i in 0..3 {
            if dir[i].abs() < super::TOLERANCE {
                if origin[i] < self.min[i] || origin[i] > self.max[i] {
                    return false;
                }
                continue;
            }
            let inv = 1.0 / dir[i];
            let mut t0 = (self.min[i] - origin[i]) * inv;
            let mut t1 = (self.max[i] - origin[i]) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_min > t_max {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Vector3;

    fn b(min: [f64; 3], max: [f64; 3]) -> Aabb {
        Aabb::new(
            Point3::new(min[0], min[1], min[2]),
            Point3::new(max[0], max[1], max[2]),
        )
    }

    #[test]
    fn from_points_collects_extent() {
        let pts = [
            Point3::new(1.0, -2.0, 3.0),
            Point3::new(-1.0, 4.0, 0.0),
            Point3::new(0.5, 0.0, 9.0),
        ];
        let aabb = Aabb::from_points(&pts).unwrap();
        assert_eq!(aabb.min, Point3::new(-1.0, -2.0, 0.0));
        assert_eq!(aabb.max, Point3::new(1.0, 4.0, 9.0));
    }

    #[test]
    fn from_no_points_is_none() {
        assert!(Aabb::from_points(&Vec::<Point3>::new()).is_none());
    }

    #[test]
    fn touching_boxes_do_not_overlap() {
        let a = b([0.0; 3], [1.0; 3]);
        let c = b([1.0, 0.0, 0.0], [2.0, 1.0, 1.0]);
        assert!(!a.overlaps(&c));
        assert!(a.intersects(&c, 0.0));
    }

    #[test]
    fn separated_on_one_axis_is_disjoint() {
        let a = b([0.0; 3], [1.0; 3]);
        let c = b([0.5, 0.5, 3.0], [2.0, 2.0, 4.0]);
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn nested_boxes_overlap() {
        let a = b([0.0; 3], [10.0; 3]);
        let c = b([2.0; 3], [3.0; 3]);
        assert!(a.overlaps(&c));
        assert!(c.overlaps(&a));
    }

    #[test]
    fn containment_with_slack() {
        let cavity = b([0.0; 3], [100.0; 3]);
        assert!(cavity.contains_with_slack(&b([-0.05, 0.0, 0.0], [100.05, 50.0, 50.0]), 0.1));
        assert!(!cavity.contains_with_slack(&b([-0.2, 0.0, 0.0], [50.0, 50.0, 50.0]), 0.1));
        assert!(!cavity.contains_with_slack(&b([0.0; 3], [50.0, 100.2, 50.0]), 0.1));
    }

    #[test]
    fn ray_slab_test() {
        let a = b([1.0; 3], [2.0; 3]);
        let origin = Point3::new(0.0, 1.5, 1.5);
        assert!(a.hit_by_ray(&origin, &Vector3::x()));
        assert!(!a.hit_by_ray(&origin, &-Vector3::x()));
        assert!(!a.hit_by_ray(&origin, &Vector3::y()));
    }

    #[test]
    fn longest_axis_picks_largest_extent() {
        assert_eq!(b([0.0; 3], [1.0, 5.0, 2.0]).longest_axis(), 1);
        assert_eq!(b([0.0; 3], [1.0, 1.0, 2.0]).longest_axis(), 2);
    }
}
