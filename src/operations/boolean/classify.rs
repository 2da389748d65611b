use tracing::trace;

use crate::math::intersect_3d::{point_on_triangle, ray_triangle_intersect, triangle_normal, RayHit};
use crate::math::{Aabb, Point3, Vector3, TOLERANCE};
use crate::mesh::{Bvh, Solid};

/// Ray directions tried in turn. Skewed so that rays rarely graze the
/// axis-aligned edges common in CAD output.
const RAY_DIRECTIONS: [[f64; 3]; 5] = [
    [1.0, 0.381_966, 0.236_068],
    [-0.267_949, 1.0, 0.414_214],
    [0.318_31, -0.577_35, 1.0],
    [-1.0, -0.707_107, 0.302_776],
    [0.141_421, 0.223_607, -1.0],
];

/// Minimum |cos| between normals for a point to count as lying on a face.
const COPLANAR_COS: f64 = 0.999;

/// Classification of a point relative to a solid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointClassification {
    Inside,
    Outside,
    /// On the boundary, on a face whose outward normal agrees with the
    /// probe normal.
    OnSameSense,
    /// On the boundary, on a face whose outward normal opposes the probe
    /// normal.
    OnOppositeSense,
}

/// Classifies points against one closed, outward-oriented solid.
#[derive(Debug)]
pub struct Classifier<'a> {
    solid: &'a Solid,
    bvh: &'a Bvh,
    bounds: Aabb,
    eps: f64,
}

impl<'a> Classifier<'a> {
    /// Creates a classifier for `solid` using its prebuilt hierarchy.
    #[must_use]
    pub fn new(solid: &'a Solid, bvh: &'a Bvh, eps: f64) -> Self {
        Self {
            solid,
            bvh,
            bounds: solid.bounds().unwrap_or_else(Aabb::empty),
            eps,
        }
    }

    /// Classifies `point`, a point on a surface with outward `normal`.
    ///
    /// Points within `eps` of a parallel face of the solid are reported as
    /// on the boundary; everything else is decided by ray parity.
    #[must_use]
    pub fn classify(&self, point: &Point3, normal: &Vector3) -> PointClassification {
        if !self.bounds.contains_point(point, self.eps) {
            return PointClassification::Outside;
        }
        if let Some(on_surface) = self.on_surface(point, normal) {
            return on_surface;
        }
        if self.contains(point) {
            PointClassification::Inside
        } else {
            PointClassification::Outside
        }
    }

    fn on_surface(&self, point: &Point3, normal: &Vector3) -> Option<PointClassification> {
        let probe = Aabb::new(*point, *point);
        let mut candidates = Vec::new();
        self.bvh.query_aabb(&probe, self.eps, &mut candidates);

        candidates.into_iter().find_map(|j| {
            let tri = self.solid.triangle(j as usize)?;
            let face_normal = triangle_normal(&tri)?;
            let alignment = face_normal.dot(normal);
            if alignment.abs() < COPLANAR_COS || !point_on_triangle(point, &tri, self.eps) {
                return None;
            }
            Some(if alignment > 0.0 {
                PointClassification::OnSameSense
            } else {
                PointClassification::OnOppositeSense
            })
        })
    }

    /// Returns `true` if `point` lies inside the solid by ray parity.
    ///
    /// Rays that pass too close to an edge or vertex are discarded and the
    /// next direction is tried. If every direction is degenerate the point
    /// is treated as outside.
    #[must_use]
    pub fn contains(&self, point: &Point3) -> bool {
        let mut candidates = Vec::new();
        for d in &RAY_DIRECTIONS {
            let dir = Vector3::new(d[0], d[1], d[2]).normalize();
            candidates.clear();
            self.bvh.query_ray(point, &dir, &mut candidates);

            let mut crossings = 0usize;
            let mut degenerate = false;
            for &j in &candidates {
                let Some(tri) = self.solid.triangle(j as usize) else {
                    continue;
                };
                match ray_triangle_intersect(point, &dir, &tri, TOLERANCE) {
                    RayHit::Hit(_) => crossings += 1,
                    RayHit::Degenerate => {
                        degenerate = true;
                        break;
                    }
                    RayHit::Miss => {}
                }
            }
            if !degenerate {
                return crossings % 2 == 1;
            }
        }
        trace!(?point, "all classification rays degenerate, assuming outside");
        false
    }
}
