use smallvec::SmallVec;

use super::{Point3, Vector3, TOLERANCE};

/// Barycentric tolerance used to detect rays grazing a triangle edge or vertex.
const BARYCENTRIC_EPS: f64 = 1e-9;

/// A triangle as its three corner points, counter-clockwise seen from outside.
pub type Triangle = [Point3; 3];

/// Relationship between two triangles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TriangleTriangleRelation {
    /// The triangles do not cross (touching at a single point counts as disjoint).
    Disjoint,
    /// The triangles cross along a segment lying in both of them.
    Segment { start: Point3, end: Point3 },
    /// The triangles lie in the same plane.
    Coplanar,
}

/// Unit normal of a triangle following its winding, or `None` when degenerate.
#[must_use]
pub fn triangle_normal(tri: &Triangle) -> Option<Vector3> {
    let n = (tri[1] - tri[0]).cross(&(tri[2] - tri[0]));
    let len = n.norm();
    (len > TOLERANCE).then(|| n / len)
}

/// Computes the intersection of two triangles.
///
/// `eps` is the distance below which a vertex is considered to lie on the
/// other triangle's plane.
#[must_use]
pub fn intersect_triangles(a: &Triangle, b: &Triangle, eps: f64) -> TriangleTriangleRelation {
    let (Some(na), Some(nb)) = (triangle_normal(a), triangle_normal(b)) else {
        return TriangleTriangleRelation::Disjoint;
    };

    let da = a.map(|p| nb.dot(&(p - b[0])));
    if da.iter().all(|d| d.abs() <= eps) {
        return TriangleTriangleRelation::Coplanar;
    }
    if all_strictly_one_side(&da, eps) {
        return TriangleTriangleRelation::Disjoint;
    }

    let db = b.map(|p| na.dot(&(p - a[0])));
    if all_strictly_one_side(&db, eps) {
        return TriangleTriangleRelation::Disjoint;
    }

    let dir = na.cross(&nb);
    let dir_len = dir.norm();
    if dir_len < TOLERANCE {
        return TriangleTriangleRelation::Disjoint;
    }
    let dir = dir / dir_len;

    let (Some(span_a), Some(span_b)) = (
        plane_span(a, &da, &dir, eps),
        plane_span(b, &db, &dir, eps),
    ) else {
        return TriangleTriangleRelation::Disjoint;
    };

    // Overlap of the two spans along the common line.
    let start = if span_a.lo.0 >= span_b.lo.0 { span_a.lo } else { span_b.lo };
    let end = if span_a.hi.0 <= span_b.hi.0 { span_a.hi } else { span_b.hi };
    if end.0 - start.0 <= eps {
        return TriangleTriangleRelation::Disjoint;
    }

    TriangleTriangleRelation::Segment {
        start: start.1,
        end: end.1,
    }
}

fn all_strictly_one_side(d: &[f64; 3], eps: f64) -> bool {
    d.iter().all(|&x| x > eps) || d.iter().all(|&x| x < -eps)
}

struct Span {
    lo: (f64, Point3),
    hi: (f64, Point3),
}

/// Where a triangle meets the other triangle's plane, as an interval along `dir`.
fn plane_span(tri: &Triangle, dist: &[f64; 3], dir: &Vector3, eps: f64) -> Option<Span> {
    let mut points: SmallVec<[Point3; 4]> = SmallVec::new();
    for i in 0..3 {
        let j = (i + 1) % 3;
        if dist[i].abs() <= eps {
            points.push(tri[i]);
        }
        let crosses = (dist[i] > eps && dist[j] < -eps) || (dist[i] < -eps && dist[j] > eps);
        if crosses {
            let t = dist[i] / (dist[i] - dist[j]);
            points.push(tri[i] + (tri[j] - tri[i]) * t);
        }
    }

    let mut iter = points.into_iter().map(|p| (dir.dot(&p.coords), p));
    let first = iter.next()?;
    let mut span = Span { lo: first, hi: first };
    for item in iter {
        if item.0 < span.lo.0 {
            span.lo = item;
        }
        if item.0 > span.hi.0 {
            span.hi = item;
        }
    }
    Some(span)
}

/// Outcome of casting a ray against a triangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RayHit {
    Miss,
    /// The ray crosses the triangle interior at parameter `t > 0`.
    Hit(f64),
    /// The ray passes too close to an edge or vertex to be counted reliably.
    Degenerate,
}

/// Casts the ray `origin + t * dir` against a triangle (Möller–Trumbore).
///
/// Only hits with `t > eps` are reported.
#[must_use]
#[allow(clippy::many_single_char_names)]
pub fn ray_triangle_intersect(origin: &Point3, dir: &Vector3, tri: &Triangle, eps: f64) -> RayHit {
    let e1 = tri[1] - tri[0];
    let e2 = tri[2] - tri[0];
    let p = dir.cross(&e2);
    let det = e1.dot(&p);
    if det.abs() < TOLERANCE {
        return RayHit::Miss;
    }
    let inv = 1.0 / det;

    let s = origin - tri[0];
    let u = s.dot(&p) * inv;
    if !(-BARYCENTRIC_EPS..=1.0 + BARYCENTRIC_EPS).contains(&u) {
        return RayHit::Miss;
    }
    let q = s.cross(&e1);
    let v = dir.dot(&q) * inv;
    if v < -BARYCENTRIC_EPS || u + v > 1.0 + BARYCENTRIC_EPS {
        return RayHit::Miss;
    }

    let t = e2.dot(&q) * inv;
    if t <= eps {
        return RayHit::Miss;
    }
    if u < BARYCENTRIC_EPS || v < BARYCENTRIC_EPS || u + v > 1.0 - BARYCENTRIC_EPS {
        return RayHit::Degenerate;
    }
    RayHit::Hit(t)
}

/// Returns `true` if `point` lies on the triangle within distance `eps`.
#[must_use]
pub fn point_on_triangle(point: &Point3, tri: &Triangle, eps: f64) -> bool {
    let Some(n) = triangle_normal(tri) else {
        return false;
    };
    let dist = n.dot(&(point - tri[0]));
    if dist.abs() > eps {
        return false;
    }
    let projected = point - n * dist;
    (0..3).all(|i| {
        let j = (i + 1) % 3;
        let edge = tri[j] - tri[i];
        edge.cross(&(projected - tri[i])).dot(&n) >= -eps * edge.norm()
    })
}
