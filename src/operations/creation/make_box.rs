use crate::math::Point3;
use crate::mesh::Solid;

/// Corner indices of each box face, two outward-wound triangles per face.
///
/// Vertex `i` takes its x, y and z from the max corner when bit 0, 1 or 2
/// of `i` is set.
const BOX_TRIANGLES: [[u32; 3]; 12] = [
    [0, 2, 3],
    [0, 3, 1], // -Z
    [4, 5, 7],
    [4, 7, 6], // +Z
    [0, 1, 5],
    [0, 5, 4], // -Y
    [2, 6, 7],
    [2, 7, 3], // +Y
    [0, 4, 6],
    [0, 6, 2], // -X
    [1, 3, 7],
    [1, 7, 5], // +X
];

/// Creates an axis-aligned box solid from two corner points.
pub struct MakeBox {
    min_corner: Point3,
    max_corner: Point3,
}

impl MakeBox {
    /// Creates a new `MakeBox` operation.
    #[must_use]
    pub fn new(min_corner: Point3, max_corner: Point3) -> Self {
        Self {
            min_corner,
            max_corner,
        }
    }

    /// Builds the box as a closed 12-triangle mesh named `"box"`.
    ///
    /// The corners are normalized, so their order does not matter.
    #[must_use]
    pub fn build(&self) -> Solid {
        let lo = self.min_corner.inf(&self.max_corner);
        let hi = self.min_corner.sup(&self.max_corner);
        let vertices = (0..8)
            .map(|i| {
                Point3::new(
                    if i & 1 == 0 { lo.x } else { hi.x },
                    if i & 2 == 0 { lo.y } else { hi.y },
                    if i & 4 == 0 { lo.z } else { hi.z },
                )
            })
            .collect();
        Solid::new("box", vertices, BOX_TRIANGLES.to_vec())
    }
}
