use tracing::{debug, warn};

use crate::mesh::Solid;
use crate::operations::boolean::BooleanEngine;

use super::{CheckSettings, Measurement, Method, UnverifiablePolicy};

/// Checks that `a` and `b` do not overlap.
///
/// Solids whose bounding boxes are disjoint, touching included, pass
/// without calling the engine. Otherwise the volume of `a & b` is measured.
/// If the engine rejects the geometry the outcome follows
/// [`CheckSettings::unverifiable`].
pub fn check_intersection<E>(
    engine: &E,
    a: &Solid,
    b: &Solid,
    settings: &CheckSettings,
) -> Measurement
where
    E: BooleanEngine + ?Sized,
{
    if let (Some(bounds_a), Some(bounds_b)) = (a.bounds(), b.bounds()) {
        if !bounds_a.overlaps(&bounds_b) {
            debug!(a = a.name(), b = b.name(), "bounding boxes disjoint, skipping boolean");
            return Measurement::disjoint();
        }
    }

    match engine.intersection(a, b) {
        Ok(common) => {
            let measurement = Measurement::measured(&common, settings);
            if measurement.is_noise() {
                debug!(
                    a = a.name(),
                    b = b.name(),
                    volume = measurement.volume,
                    "collision below noise tolerance"
                );
            }
            measurement
        }
        Err(err) => {
            let passed = settings.unverifiable == UnverifiablePolicy::FailOpen;
            warn!(
                a = a.name(),
                b = b.name(),
                error = %err,
                passed,
                "boolean intersection failed, pair could not be verified"
            );
            Measurement {
                passed,
                volume: 0.0,
                method: Method::Unverified,
                warning: Some(format!(
                    "boolean op failed for {}\u{d7}{}: {err}; pair not verified",
                    a.name(),
                    b.name()
                )),
            }
        }
    }
}
