mod bvh;
mod solid;
pub mod stl;

use std::path::Path;

use tracing::debug;

use crate::error::MeshError;

pub use bvh::Bvh;
pub use solid::Solid;

/// Loads a solid from a mesh artifact produced by the exporter.
///
/// # Errors
///
/// Returns an error if the file is missing or unparseable, or if it
/// contains no usable triangles.
pub fn load_solid(path: &Path, name: &str) -> Result<Solid, MeshError> {
    let solid = Solid::from_triangles(name, stl::read_stl(path)?);
    if solid.is_empty() {
        return Err(MeshError::Empty { name: name.into() });
    }
    debug!(
        name,
        path = %path.display(),
        triangles = solid.triangle_count(),
        volume = solid.volume(),
        "loaded mesh"
    );
    Ok(solid)
}
