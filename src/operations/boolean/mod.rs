mod classify;
mod engine;
mod face_intersection;
mod select;
mod split;

pub use classify::{Classifier, PointClassification};
pub use engine::{BooleanConfig, BooleanEngine, MeshBoolean};
pub use face_intersection::{collect_cuts, Cut, TriangleCuts};
pub use select::{should_keep_fragment, BooleanOp, KeepDecision};
pub use split::{split_solid, Fragment, SolidSource};
