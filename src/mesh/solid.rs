use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use crate::math::intersect_3d::Triangle;
use crate::math::{Aabb, Point3};

/// A closed triangle mesh representing one part or cavity.
///
/// Vertices are shared between triangles; triangles are wound
/// counter-clockwise when viewed from outside the solid.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Solid {
    name: String,
    vertices: Vec<Point3>,
    triangles: Vec<[u32; 3]>,
}

impl Solid {
    /// Creates a solid from an indexed triangle list.
    #[must_use]
    pub fn new(name: impl Into<String>, vertices: Vec<Point3>, triangles: Vec<[u32; 3]>) -> Self {
        Self {
            name: name.into(),
            vertices,
            triangles,
        }
    }

    /// Creates a solid with no geometry.
    #[must_use]
    pub fn empty(name: impl Into<String>) -> Self {
        Self::new(name, Vec::new(), Vec::new())
    }

    /// Creates a solid from a triangle soup, welding bit-identical corners.
    ///
    /// Triangles that collapse after welding are dropped.
    #[must_use]
    pub fn from_triangles<I>(name: impl Into<String>, triangles: I) -> Self
    where
        I: IntoIterator<Item = Triangle>,
    {
        let mut index: HashMap<[u64; 3], u32> = HashMap::new();
        let mut vertices = Vec::new();
        let mut faces = Vec::new();

        for tri in triangles {
            let ids = tri.map(|p| {
                // `+ 0.0` folds negative zero onto positive zero.
                let key = [p.x + 0.0, p.y + 0.0, p.z + 0.0].map(f64::to_bits);
                match index.entry(key) {
                    Entry::Occupied(e) => *e.get(),
                    Entry::Vacant(e) => {
                        #[allow(clippy::cast_possible_truncation)]
                        let id = vertices.len() as u32;
                        vertices.push(p);
                        *e.insert(id)
                    }
                }
            });
            if ids[0] != ids[1] && ids[1] != ids[2] && ids[2] != ids[0] {
                faces.push(ids);
            }
        }

        Self::new(name, vertices, faces)
    }

    /// Name of the part this solid represents.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the same geometry under a different name.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Vertex positions.
    #[must_use]
    pub fn vertices(&self) -> &[Point3] {
        &self.vertices
    }

    /// Triangle vertex indices.
    #[must_use]
    pub fn triangle_indices(&self) -> &[[u32; 3]] {
        &self.triangles
    }

    /// Number of triangles.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Returns `true` if the solid has no triangles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Corner points of triangle `index`, `None` if it is out of range.
    #[must_use]
    pub fn triangle(&self, index: usize) -> Option<Triangle> {
        let ids = self.triangles.get(index)?;
        Some([
            *self.vertices.get(ids[0] as usize)?,
            *self.vertices.get(ids[1] as usize)?,
            *self.vertices.get(ids[2] as usize)?,
        ])
    }

    /// Iterates over the corner points of every triangle.
    pub fn iter_triangles(&self) -> impl Iterator<Item = Triangle> + '_ {
        self.triangles
            .iter()
            .map(|t| t.map(|v| self.vertices[v as usize]))
    }

    /// Axis-aligned bounds of the referenced vertices, `None` when empty.
    #[must_use]
    pub fn bounds(&self) -> Option<Aabb> {
        if self.is_empty() {
            return None;
        }
        Aabb::from_points(
            self.triangles
                .iter()
                .flatten()
                .map(|&v| &self.vertices[v as usize]),
        )
    }

    /// Signed enclosed volume.
    ///
    /// Sums `(1/6) * v0 . (v1 x v2)` over all triangles; positive for
    /// outward-facing winding.
    #[must_use]
    pub fn signed_volume(&self) -> f64 {
        let sum: f64 = self
            .iter_triangles()
            .map(|[v0, v1, v2]| v0.coords.dot(&v1.coords.cross(&v2.coords)))
            .sum();
        sum / 6.0
    }

    /// Enclosed volume magnitude.
    #[must_use]
    pub fn volume(&self) -> f64 {
        self.signed_volume().abs()
    }

    /// Returns `true` if every vertex coordinate is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.vertices
            .iter()
            .all(|p| p.coords.iter().all(|c| c.is_finite()))
    }

    /// Counts edges that are not shared by exactly two consistently wound
    /// triangles. Zero for a closed, oriented manifold.
    #[must_use]
    pub fn open_edge_count(&self) -> usize {
        let mut directed: HashMap<(u32, u32), u32> = HashMap::new();
        for t in &self.triangles {
            for i in 0..3 {
                *directed.entry((t[i], t[(i + 1) % 3])).or_default() += 1;
            }
        }

        let mut seen: HashSet<(u32, u32)> = HashSet::new();
        let mut open = 0;
        for &(a, b) in directed.keys() {
            let key = (a.min(b), a.max(b));
            if !seen.insert(key) {
                continue;
            }
            let forward = directed.get(&(key.0, key.1)).copied().unwrap_or(0);
            let backward = directed.get(&(key.1, key.0)).copied().unwrap_or(0);
            if forward != 1 || backward != 1 {
                open += 1;
            }
        }
        open
    }

    /// Returns a copy with every triangle's winding reversed.
    #[must_use]
    pub fn flipped(&self) -> Self {
        Self {
            name: self.name.clone(),
            vertices: self.vertices.clone(),
            triangles: self.triangles.iter().map(|&[a, b, c]| [a, c, b]).collect(),
        }
    }
}
