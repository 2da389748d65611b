use std::f64::consts::TAU;

use crate::math::{Point3, Vector3, TOLERANCE};
use crate::mesh::Solid;

/// Default number of facets around the axis.
const DEFAULT_SEGMENTS: u32 = 32;

/// Creates a faceted cylinder solid from base center, radius, axis, and height.
///
/// The circular cross-section is approximated by a regular polygon with
/// [`with_segments`](Self::with_segments) sides, the way an exported CAD mesh
/// would be.
pub struct MakeCylinder {
    center: Point3,
    radius: f64,
    axis: Vector3,
    height: f64,
    segments: u32,
}

impl MakeCylinder {
    /// Creates a new `MakeCylinder` operation.
    #[must_use]
    pub fn new(center: Point3, radius: f64, axis: Vector3, height: f64) -> Self {
        Self {
            center,
            radius,
            axis,
            height,
            segments: DEFAULT_SEGMENTS,
        }
    }

    /// Sets the number of side facets. Values below 3 are raised to 3.
    #[must_use]
    pub fn with_segments(mut self, segments: u32) -> Self {
        self.segments = segments.max(3);
        self
    }

    /// Builds the cylinder as a closed mesh named `"cylinder"`.
    ///
    /// A degenerate axis falls back to `+Z`; a negative height extends the
    /// cylinder along `-axis`.
    #[must_use]
    pub fn build(&self) -> Solid {
        let axis = self.axis.try_normalize(TOLERANCE).unwrap_or_else(Vector3::z);
        let mut base = self.center;
        let mut height = self.height;
        if height < 0.0 {
            base += axis * height;
            height = -height;
        }

        let (u, v) = perpendicular_basis(&axis);
        let n = self.segments;
        let top_offset = axis * height;

        let bottom_rim: Vec<Point3> = (0..n)
            .map(|i| {
                let angle = TAU * f64::from(i) / f64::from(n);
                base + (u * angle.cos() + v * angle.sin()) * self.radius
            })
            .collect();
        let mut vertices = Vec::with_capacity(2 * n as usize + 2);
        vertices.extend_from_slice(&bottom_rim);
        vertices.extend(bottom_rim.iter().map(|p| p + top_offset));
        vertices.push(base);
        vertices.push(base + top_offset);

        let bottom_center = 2 * n;
        let top_center = 2 * n + 1;
        let mut triangles = Vec::with_capacity(4 * n as usize);
        for i in 0..n {
            let j = (i + 1) % n;
            triangles.push([bottom_center, j, i]);
            triangles.push([top_center, n + i, n + j]);
            triangles.push([i, j, n + j]);
            triangles.push([i, n + j, n + i]);
        }

        Solid::new("cylinder", vertices, triangles)
    }
}

/// Returns two unit vectors `(u, v)` with `u x v = axis`.
fn perpendicular_basis(axis: &Vector3) -> (Vector3, Vector3) {
    let helper = if axis.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    let u = axis.cross(&helper).normalize();
    let v = axis.cross(&u);
    (u, v)
}
