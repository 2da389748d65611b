//! Bounding volume hierarchy over the triangles of a [`Solid`].
//!
//! Turns the all-pairs triangle search of a boolean operation into
//! `O(n log n + k)` and keeps point classification ray casts logarithmic.

use smallvec::SmallVec;

use crate::math::{Aabb, Point3, Vector3};

use super::Solid;

/// Maximum number of triangles stored in a leaf.
const MAX_LEAF_SIZE: usize = 8;

/// Growth applied to boxes before ray tests, so flat boxes still register hits.
const RAY_PADDING: f64 = 1e-9;

#[derive(Debug)]
enum BvhNode {
    Leaf {
        bbox: Aabb,
        triangles: SmallVec<[u32; MAX_LEAF_SIZE]>,
    },
    Internal {
        bbox: Aabb,
        left: Box<BvhNode>,
        right: Box<BvhNode>,
    },
}

impl BvhNode {
    fn bbox(&self) -> &Aabb {
        match self {
            Self::Leaf { bbox, .. } | Self::Internal { bbox, .. } => bbox,
        }
    }
}

/// Bounding volume hierarchy for one solid's triangles.
#[derive(Debug)]
pub struct Bvh {
    root: Option<BvhNode>,
    /// Bounds of each triangle, by triangle index.
    boxes: Vec<Aabb>,
}

impl Bvh {
    /// Builds the hierarchy by median splits along the longest axis.
    #[must_use]
    pub fn build(solid: &Solid) -> Self {
        let boxes: Vec<Aabb> = solid
            .iter_triangles()
            .map(|tri| Aabb::from_points(&tri).unwrap_or_else(Aabb::empty))
            .collect();
        if boxes.is_empty() {
            return Self { root: None, boxes };
        }

        #[allow(clippy::cast_possible_truncation)]
        let mut indices: Vec<u32> = (0..boxes.len() as u32).collect();
        let root = build_recursive(&boxes, &mut indices);
        Self {
            root: Some(root),
            boxes,
        }
    }

    fn triangle_box(&self, index: u32) -> Option<&Aabb> {
        self.boxes.get(index as usize)
    }

    /// Collects triangles whose bounds intersect `region` grown by `tolerance`.
    pub fn query_aabb(&self, region: &Aabb, tolerance: f64, out: &mut Vec<u32>) {
        let Some(root) = &self.root else {
            return;
        };
        let mut stack: SmallVec<[&BvhNode; 32]> = SmallVec::new();
        stack.push(root);
        while let Some(node) = stack.pop() {
            if !node.bbox().intersects(region, tolerance) {
                continue;
            }
            match node {
                BvhNode::Leaf { triangles, .. } => {
                    let hits = triangles.iter().copied().filter(|&i| {
                        self.triangle_box(i)
                            .is_some_and(|b| b.intersects(region, tolerance))
                    });
                    out.extend(hits);
                }
                BvhNode::Internal { left, right, .. } => {
                    stack.push(left);
                    stack.push(right);
                }
            }
        }
    }

    /// Collects triangles whose bounds are hit by the ray `origin + t * dir`, `t >= 0`.
    pub fn query_ray(&self, origin: &Point3, dir: &Vector3, out: &mut Vec<u32>) {
        let Some(root) = &self.root else {
            return;
        };
        let mut stack: SmallVec<[&BvhNode; 32]> = SmallVec::new();
        stack.push(root);
        while let Some(node) = stack.pop() {
            if !node.bbox().padded(RAY_PADDING).hit_by_ray(origin, dir) {
                continue;
            }
            match node {
                BvhNode::Leaf { triangles, .. } => {
                    let hits = triangles.iter().copied().filter(|&i| {
                        self.triangle_box(i)
                            .is_some_and(|b| b.padded(RAY_PADDING).hit_by_ray(origin, dir))
                    });
                    out.extend(hits);
                }
                BvhNode::Internal { left, right, .. } => {
                    stack.push(left);
                    stack.push(right);
                }
            }
        }
    }
}

fn build_recursive(boxes: &[Aabb], indices: &mut [u32]) -> BvhNode {
    let mut bbox = Aabb::empty();
    for &i in indices.iter() {
        bbox.expand(&boxes[i as usize]);
    }

    if indices.len() <= MAX_LEAF_SIZE {
        return BvhNode::Leaf {
            bbox,
            triangles: indices.iter().copied().collect(),
        };
    }

    let axis = bbox.longest_axis();
    let mid = indices.len() / 2;
    indices.select_nth_unstable_by(mid, |&a, &b| {
        let ca = boxes[a as usize].center()[axis];
        let cb = boxes[b as usize].center()[axis];
        ca.total_cmp(&cb)
    });

    let (left, right) = indices.split_at_mut(mid);
    BvhNode::Internal {
        bbox,
        left: Box::new(build_recursive(boxes, left)),
        right: Box::new(build_recursive(boxes, right)),
    }
}
