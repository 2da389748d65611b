use crate::math::intersect_3d::triangle_normal;
use crate::math::polygon_3d::{polygon_area_3d, split_polygon_by_line};
use crate::math::{Point3, Vector3};
use crate::mesh::Solid;

use super::face_intersection::Cut;

/// Which operand a fragment originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolidSource {
    A,
    B,
}

/// A convex planar piece of one operand's surface that does not cross the
/// other operand's surface.
#[derive(Debug, Clone)]
pub struct Fragment {
    /// Boundary, wound like the source triangle.
    pub polygon: Vec<Point3>,
    /// Unit outward normal of the source triangle.
    pub normal: Vector3,
    pub source: SolidSource,
}

/// Splits every triangle of `solid` along its cut lines.
///
/// `cuts` is indexed like the solid's triangles. Degenerate triangles are
/// dropped.
#[must_use]
pub fn split_solid(
    solid: &Solid,
    cuts: &[Vec<Cut>],
    source: SolidSource,
    eps: f64,
) -> Vec<Fragment> {
    let mut fragments = Vec::with_capacity(solid.triangle_count());
    for (tri, tri_cuts) in solid.iter_triangles().zip(cuts) {
        let Some(normal) = triangle_normal(&tri) else {
            continue;
        };
        fragments.extend(
            split_triangle(&tri, &normal, tri_cuts, eps)
                .into_iter()
                .map(|polygon| Fragment {
                    polygon,
                    normal,
                    source,
                }),
        );
    }
    fragments
}

/// Splits a triangle by the infinite lines through each cut.
///
/// Cutting along whole lines rather than segments keeps every piece convex;
/// extra pieces away from the segment are harmless.
fn split_triangle(tri: &[Point3; 3], normal: &Vector3, cuts: &[Cut], eps: f64) -> Vec<Vec<Point3>> {
    let mut pieces = vec![tri.to_vec()];
    let mut applied: Vec<Cut> = Vec::new();

    for &(p0, p1) in cuts {
        if (p1 - p0).norm() <= eps {
            continue;
        }
        if applied.iter().any(|line| on_same_line(line, &p0, &p1, eps)) {
            continue;
        }
        applied.push((p0, p1));
        pieces = pieces
            .iter()
            .flat_map(|piece| split_polygon_by_line(piece, &p0, &p1, normal, eps))
            .collect();
    }

    if pieces.len() > 1 {
        let min_area = eps * eps;
        pieces.retain(|piece| polygon_area_3d(piece, normal) > min_area);
    }
    pieces
}

/// Returns `true` if both points lie within `eps` of the line through `line`.
fn on_same_line(line: &Cut, p0: &Point3, p1: &Point3, eps: f64) -> bool {
    let dir = line.1 - line.0;
    let len = dir.norm();
    if len <= eps {
        return false;
    }
    let dir = dir / len;
    [*p0, *p1]
        .into_iter()
        .all(|p| (p - line.0).cross(&dir).norm() <= eps)
}
