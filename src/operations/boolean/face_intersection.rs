use rayon::prelude::*;

use crate::math::intersect_3d::{intersect_triangles, Triangle, TriangleTriangleRelation};
use crate::math::{Aabb, Point3};
use crate::mesh::{Bvh, Solid};

/// A cut line on a triangle, given as two points it passes through.
pub type Cut = (Point3, Point3);

/// Cut lines gathered for every triangle of both operands.
#[derive(Debug, Default)]
pub struct TriangleCuts {
    /// Cuts per triangle of the first operand, indexed like its triangles.
    pub a: Vec<Vec<Cut>>,
    /// Cuts per triangle of the second operand.
    pub b: Vec<Vec<Cut>>,
}

impl TriangleCuts {
    /// Total number of cuts recorded on either operand.
    #[must_use]
    pub fn count(&self) -> usize {
        self.a.iter().chain(&self.b).map(Vec::len).sum()
    }
}

/// Finds where the surfaces of `a` and `b` meet and records the cut lines
/// each triangle must be split along.
///
/// Crossing triangles contribute their intersection segment to both
/// triangles. Coplanar triangles contribute each other's edges, so that
/// the overlap region becomes a separate fragment on both sides.
#[must_use]
pub fn collect_cuts(
    a: &Solid,
    b: &Solid,
    bvh_b: &Bvh,
    eps: f64,
    parallel: bool,
) -> TriangleCuts {
    let per_triangle = |i: usize| {
        a.triangle(i)
            .map(|tri| cuts_for_triangle(&tri, b, bvh_b, eps))
            .unwrap_or_default()
    };
    let found: Vec<(Vec<Cut>, Vec<(u32, Cut)>)> = if parallel {
        (0..a.triangle_count()).into_par_iter().map(per_triangle).collect()
    } else {
        (0..a.triangle_count()).map(per_triangle).collect()
    };

    let mut cuts_b = vec![Vec::new(); b.triangle_count()];
    let cuts_a = found
        .into_iter()
        .map(|(own, foreign)| {
            for (j, cut) in foreign {
                cuts_b[j as usize].push(cut);
            }
            own
        })
        .collect();

    TriangleCuts { a: cuts_a, b: cuts_b }
}

fn cuts_for_triangle(
    tri: &Triangle,
    other: &Solid,
    bvh: &Bvh,
    eps: f64,
) -> (Vec<Cut>, Vec<(u32, Cut)>) {
    let mut own = Vec::new();
    let mut foreign = Vec::new();
    let Some(bbox) = Aabb::from_points(tri) else {
        return (own, foreign);
    };

    let mut candidates = Vec::new();
    bvh.query_aabb(&bbox, eps, &mut candidates);

    for j in candidates {
        let Some(other_tri) = other.triangle(j as usize) else {
            continue;
        };
        match intersect_triangles(tri, &other_tri, eps) {
            TriangleTriangleRelation::Disjoint => {}
            TriangleTriangleRelation::Segment { start, end } => {
                own.push((start, end));
                foreign.push((j, (start, end)));
            }
            TriangleTriangleRelation::Coplanar => {
                for k in 0..3 {
                    let next = (k + 1) % 3;
                    own.push((other_tri[k], other_tri[next]));
                    foreign.push((j, (tri[k], tri[next])));
                }
            }
        }
    }
    (own, foreign)
}
