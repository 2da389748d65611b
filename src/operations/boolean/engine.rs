use std::borrow::Cow;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::BooleanError;
use crate::math::polygon_3d::{fan_triangulate, polygon_centroid};
use crate::math::Aabb;
use crate::mesh::{Bvh, Solid};

use super::classify::Classifier;
use super::face_intersection::collect_cuts;
use super::select::{should_keep_fragment, BooleanOp, KeepDecision};
use super::split::{split_solid, Fragment, SolidSource};

/// Tuning for [`MeshBoolean`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BooleanConfig {
    /// Geometric tolerance in model units (millimeters) for plane,
    /// segment and on-surface tests.
    pub epsilon: f64,
    /// Classify fragments on the rayon thread pool.
    pub parallel: bool,
}

impl Default for BooleanConfig {
    fn default() -> Self {
        Self {
            epsilon: 1e-6,
            parallel: true,
        }
    }
}

/// A boolean engine over closed triangle meshes.
///
/// Implementations return an empty [`Solid`] when the result has no volume
/// and reserve errors for inputs they cannot process.
pub trait BooleanEngine {
    /// Computes `a - b`.
    ///
    /// # Errors
    ///
    /// Returns an error if either operand is unusable.
    fn difference(&self, a: &Solid, b: &Solid) -> Result<Solid, BooleanError>;

    /// Computes `a & b`.
    ///
    /// # Errors
    ///
    /// Returns an error if either operand is unusable.
    fn intersection(&self, a: &Solid, b: &Solid) -> Result<Solid, BooleanError>;
}

/// Triangle-mesh boolean engine.
///
/// Splits each operand's triangles along the curves where the surfaces
/// meet, classifies every fragment against the other operand and keeps
/// the fragments bounding the result.
#[derive(Debug, Clone, Default)]
pub struct MeshBoolean {
    config: BooleanConfig,
}

impl MeshBoolean {
    /// Creates an engine with the given tuning.
    #[must_use]
    pub fn new(config: BooleanConfig) -> Self {
        Self { config }
    }

    /// The engine's tuning.
    #[must_use]
    pub fn config(&self) -> &BooleanConfig {
        &self.config
    }

    /// Executes a boolean operation on two solids.
    ///
    /// Orchestrates the full pipeline: input checks, surface intersection,
    /// splitting, classification, selection and assembly.
    ///
    /// # Errors
    ///
    /// Returns an error if either operand is empty, has non-finite
    /// coordinates or is not a closed, consistently wound mesh.
    pub fn execute(&self, a: &Solid, b: &Solid, op: BooleanOp) -> Result<Solid, BooleanError> {
        let eps = self.config.epsilon;
        let (a, bounds_a) = prepare(a)?;
        let (b, bounds_b) = prepare(b)?;
        let name = result_name(&a, &b, op);

        // Step 1: AABB early-out
        if !bounds_a.intersects(&bounds_b, eps) {
            debug!(a = a.name(), b = b.name(), "operand bounds are disjoint");
            return Ok(match op {
                BooleanOp::Difference => a.into_owned().named(name),
                BooleanOp::Intersection => Solid::empty(name),
            });
        }

        // Step 2: find where the surfaces meet
        let bvh_a = Bvh::build(&a);
        let bvh_b = Bvh::build(&b);
        let cuts = collect_cuts(&a, &b, &bvh_b, eps, self.config.parallel);

        // Step 3: split both surfaces into fragments
        let fragments_a = split_solid(&a, &cuts.a, SolidSource::A, eps);
        let fragments_b = split_solid(&b, &cuts.b, SolidSource::B, eps);

        // Step 4: classify each fragment against the other operand and select
        let decisions_a = self.decide(&fragments_a, &Classifier::new(&b, &bvh_b, eps), op);
        let decisions_b = self.decide(&fragments_b, &Classifier::new(&a, &bvh_a, eps), op);

        // Step 5: assemble the kept fragments
        let kept = fragments_a
            .iter()
            .zip(decisions_a)
            .chain(fragments_b.iter().zip(decisions_b));
        let result = assemble(name, kept);

        debug!(
            op = ?op,
            a = a.name(),
            b = b.name(),
            cuts = cuts.count(),
            fragments = fragments_a.len() + fragments_b.len(),
            triangles = result.triangle_count(),
            volume = result.volume(),
            "boolean complete"
        );
        Ok(result)
    }

    fn decide(
        &self,
        fragments: &[Fragment],
        classifier: &Classifier<'_>,
        op: BooleanOp,
    ) -> Vec<KeepDecision> {
        let decide_one = |fragment: &Fragment| {
            let centroid = polygon_centroid(&fragment.polygon);
            let class = classifier.classify(&centroid, &fragment.normal);
            should_keep_fragment(fragment.source, class, op)
        };
        if self.config.parallel {
            fragments.par_iter().map(decide_one).collect()
        } else {
            fragments.iter().map(decide_one).collect()
        }
    }
}

impl BooleanEngine for MeshBoolean {
    fn difference(&self, a: &Solid, b: &Solid) -> Result<Solid, BooleanError> {
        self.execute(a, b, BooleanOp::Difference)
    }

    fn intersection(&self, a: &Solid, b: &Solid) -> Result<Solid, BooleanError> {
        self.execute(a, b, BooleanOp::Intersection)
    }
}

/// Checks an operand and orients it outward.
fn prepare(solid: &Solid) -> Result<(Cow<'_, Solid>, Aabb), BooleanError> {
    let Some(bounds) = solid.bounds() else {
        return Err(BooleanError::EmptyInput {
            name: solid.name().into(),
        });
    };
    if !solid.is_finite() {
        return Err(BooleanError::NonFinite {
            name: solid.name().into(),
        });
    }
    let open_edges = solid.open_edge_count();
    if open_edges > 0 {
        return Err(BooleanError::NotClosed {
            name: solid.name().into(),
            open_edges,
        });
    }

    if solid.signed_volume() < 0.0 {
        debug!(name = solid.name(), "operand is inside out, flipping");
        Ok((Cow::Owned(solid.flipped()), bounds))
    } else {
        Ok((Cow::Borrowed(solid), bounds))
    }
}

fn result_name(a: &Solid, b: &Solid, op: BooleanOp) -> String {
    match op {
        BooleanOp::Difference => format!("{} - {}", a.name(), b.name()),
        BooleanOp::Intersection => format!("{} & {}", a.name(), b.name()),
    }
}

/// Fan-triangulates kept fragments into a result solid.
fn assemble<'f>(name: String, kept: impl Iterator<Item = (&'f Fragment, KeepDecision)>) -> Solid {
    let mut triangles = Vec::new();
    for (fragment, decision) in kept {
        match decision {
            KeepDecision::Keep => triangles.extend(fan_triangulate(&fragment.polygon)),
            KeepDecision::KeepFlipped => {
                triangles.extend(fan_triangulate(&fragment.polygon).map(|[a, b, c]| [a, c, b]));
            }
            KeepDecision::Discard => {}
        }
    }
    Solid::from_triangles(name, triangles)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::math::{Point3, Vector3};
    use crate::operations::creation::{MakeBox, MakeCylinder};

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn cuboid(min: Point3, max: Point3) -> Solid {
        MakeBox::new(min, max).build()
    }

    fn engines() -> [MeshBoolean; 2] {
        [
            MeshBoolean::default(),
            MeshBoolean::new(BooleanConfig {
                parallel: false,
                ..BooleanConfig::default()
            }),
        ]
    }

    #[test]
    fn overlapping_boxes() {
        let a = cuboid(p(0.0, 0.0, 0.0), p(2.0, 2.0, 2.0));
        let b = cuboid(p(1.0, 1.0, 1.0), p(3.0, 3.0, 3.0));
        for engine in engines() {
            let diff = engine.difference(&a, &b).unwrap();
            assert_relative_eq!(diff.volume(), 7.0, epsilon = 1e-9);
            assert_eq!(diff.name(), "box - box");

            let common = engine.intersection(&a, &b).unwrap();
            assert_relative_eq!(common.volume(), 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn disjoint_boxes() {
        let engine = MeshBoolean::default();
        let a = cuboid(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0));
        let b = cuboid(p(5.0, 5.0, 5.0), p(6.0, 6.0, 6.0));
        let diff = engine.difference(&a, &b).unwrap();
        assert_relative_eq!(diff.volume(), 1.0, epsilon = 1e-12);
        assert!(engine.intersection(&a, &b).unwrap().is_empty());
    }

    #[test]
    fn box_inside_box() {
        let engine = MeshBoolean::default();
        let outer = cuboid(p(0.0, 0.0, 0.0), p(2.0, 2.0, 2.0));
        let inner = cuboid(p(0.5, 0.5, 0.5), p(1.5, 1.5, 1.5));

        let hollow = engine.difference(&outer, &inner).unwrap();
        assert_relative_eq!(hollow.volume(), 7.0, epsilon = 1e-9);

        let gone = engine.difference(&inner, &outer).unwrap();
        assert!(gone.is_empty());
        assert_relative_eq!(gone.volume(), 0.0);

        let common = engine.intersection(&outer, &inner).unwrap();
        assert_relative_eq!(common.volume(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn shared_faces() {
        let engine = MeshBoolean::default();
        let a = cuboid(p(0.0, 0.0, 0.0), p(2.0, 2.0, 2.0));
        let b = cuboid(p(1.0, 0.0, 0.0), p(2.0, 2.0, 2.0));

        let diff = engine.difference(&a, &b).unwrap();
        assert_relative_eq!(diff.volume(), 4.0, epsilon = 1e-9);

        let common = engine.intersection(&a, &b).unwrap();
        assert_relative_eq!(common.volume(), 4.0, epsilon = 1e-9);
    }

    #[test]
    fn touching_boxes_do_not_intersect() {
        let engine = MeshBoolean::default();
        let a = cuboid(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0));
        let b = cuboid(p(1.0, 0.0, 0.0), p(2.0, 1.0, 1.0));

        let common = engine.intersection(&a, &b).unwrap();
        assert!(common.volume() < 1e-9);

        let diff = engine.difference(&a, &b).unwrap();
        assert_relative_eq!(diff.volume(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn cylinder_through_box() {
        let engine = MeshBoolean::default();
        let slab = cuboid(p(-10.0, -10.0, 0.0), p(10.0, 10.0, 4.0));
        let rod = MakeCylinder::new(p(0.0, 0.0, -3.0), 2.0, Vector3::z(), 10.0)
            .with_segments(24)
            .build();
        let rod_area = rod.volume() / 10.0;

        let drilled = engine.difference(&slab, &rod).unwrap();
        assert_relative_eq!(drilled.volume(), 20.0 * 20.0 * 4.0 - rod_area * 4.0, epsilon = 1e-6);

        let protrusion = engine.difference(&rod, &slab).unwrap();
        assert_relative_eq!(protrusion.volume(), rod_area * 6.0, epsilon = 1e-6);

        let core = engine.intersection(&rod, &slab).unwrap();
        assert_relative_eq!(core.volume(), rod_area * 4.0, epsilon = 1e-6);
    }

    #[test]
    fn inside_out_operand_is_reoriented() {
        let engine = MeshBoolean::default();
        let a = cuboid(p(0.0, 0.0, 0.0), p(2.0, 2.0, 2.0)).flipped();
        let b = cuboid(p(1.0, 1.0, 1.0), p(3.0, 3.0, 3.0));
        let common = engine.intersection(&a, &b).unwrap();
        assert_relative_eq!(common.volume(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn open_mesh_is_rejected() {
        let engine = MeshBoolean::default();
        let cube = cuboid(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0));
        let mut tris = cube.triangle_indices().to_vec();
        tris.truncate(10);
        let open = Solid::new("lid_missing", cube.vertices().to_vec(), tris);

        let err = engine.difference(&open, &cube).unwrap_err();
        assert!(matches!(err, BooleanError::NotClosed { ref name, .. } if name == "lid_missing"));
    }

    #[test]
    fn empty_and_non_finite_inputs_are_rejected() {
        let engine = MeshBoolean::default();
        let cube = cuboid(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0));
        assert!(matches!(
            engine.intersection(&cube, &Solid::empty("nothing")),
            Err(BooleanError::EmptyInput { .. })
        ));

        let mut vertices = cube.vertices().to_vec();
        vertices[0].x = f64::NAN;
        let broken = Solid::new("nan", vertices, cube.triangle_indices().to_vec());
        assert!(matches!(
            engine.intersection(&broken, &cube),
            Err(BooleanError::NonFinite { .. })
        ));
    }
}
