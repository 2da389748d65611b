use smallvec::{smallvec, SmallVec};

use super::{Point3, Vector3, TOLERANCE};

/// Compute the area of a 3D polygon (coplanar points).
///
/// Uses the cross-product summation method projected along the polygon normal.
#[must_use]
pub fn polygon_area_3d(points: &[Point3], normal: &Vector3) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let n = points.len();
    let mut cross_sum = Vector3::new(0.0, 0.0, 0.0);
    let o = &points[0];
    for i in 1..n {
        let a = points[i] - o;
        let b = points[(i + 1) % n] - o;
        cross_sum += a.cross(&b);
    }
    0.5 * cross_sum.dot(normal).abs()
}

/// Vertex average of a polygon. For convex polygons this lies in the interior.
#[must_use]
pub fn polygon_centroid(points: &[Point3]) -> Point3 {
    let n = points.len();
    if n == 0 {
        return Point3::origin();
    }
    #[allow(clippy::cast_precision_loss)]
    let inv_n = 1.0 / n as f64;
    let sum = points
        .iter()
        .fold(Vector3::zeros(), |acc, p| acc + p.coords);
    Point3::from(sum * inv_n)
}

/// Splits a convex polygon by the infinite line through `line_p0` and
/// `line_p1`, both lying in the polygon's plane.
///
/// Returns the polygon unchanged when every vertex is on one side of the
/// line (within `eps`), otherwise the two halves.
#[must_use]
pub fn split_polygon_by_line(
    polygon: &[Point3],
    line_p0: &Point3,
    line_p1: &Point3,
    normal: &Vector3,
    eps: f64,
) -> SmallVec<[Vec<Point3>; 2]> {
    let n = polygon.len();
    let side_dir = normal.cross(&(line_p1 - line_p0));
    let side_len = side_dir.norm();
    if n < 3 || side_len < TOLERANCE {
        return smallvec![polygon.to_vec()];
    }
    let side_dir = side_dir / side_len;

    let signs: SmallVec<[f64; 8]> = polygon
        .iter()
        .map(|v| side_dir.dot(&(v - line_p0)))
        .collect();

    let has_positive = signs.iter().any(|&s| s > eps);
    let has_negative = signs.iter().any(|&s| s < -eps);
    if !has_positive || !has_negative {
        return smallvec![polygon.to_vec()];
    }

    let mut side_a: Vec<Point3> = Vec::with_capacity(n + 1);
    let mut side_b: Vec<Point3> = Vec::with_capacity(n + 1);

    for i in 0..n {
        let j = (i + 1) % n;
        let si = signs[i];
        let sj = signs[j];

        if si >= -eps {
            side_a.push(polygon[i]);
        }
        if si <= eps {
            side_b.push(polygon[i]);
        }

        if (si > eps && sj < -eps) || (si < -eps && sj > eps) {
            let t = si / (si - sj);
            let crossing = polygon[i] + (polygon[j] - polygon[i]) * t;
            side_a.push(crossing);
            side_b.push(crossing);
        }
    }

    let mut result = SmallVec::new();
    if side_a.len() >= 3 {
        result.push(side_a);
    }
    if side_b.len() >= 3 {
        result.push(side_b);
    }
    if result.is_empty() {
        result.push(polygon.to_vec());
    }
    result
}

/// Fan-triangulates a convex polygon, preserving its winding.
pub fn fan_triangulate(polygon: &[Point3]) -> impl Iterator<Item = [Point3; 3]> + '_ {
    (1..polygon.len().saturating_sub(1)).map(move |i| [polygon[0], polygon[i], polygon[i + 1]])
}
