use tracing::{debug, warn};

use crate::mesh::Solid;
use crate::operations::boolean::BooleanEngine;

use super::{CheckSettings, Measurement, Method};

/// Checks that `component` lies inside `cavity`.
///
/// Measures the protrusion volume `component - cavity`. If the engine
/// rejects the geometry the component's bounds must instead fit within the
/// cavity's bounds grown by [`CheckSettings::fallback_slack`]; this path
/// reports no volume and cannot see protrusions inside the cavity's box.
pub fn check_containment<E>(
    engine: &E,
    component: &Solid,
    cavity: &Solid,
    settings: &CheckSettings,
) -> Measurement
where
    E: BooleanEngine + ?Sized,
{
    match engine.difference(component, cavity) {
        Ok(protrusion) => {
            let measurement = Measurement::measured(&protrusion, settings);
            if measurement.is_noise() {
                debug!(
                    component = component.name(),
                    volume = measurement.volume,
                    "protrusion below noise tolerance"
                );
            }
            measurement
        }
        Err(err) => {
            warn!(
                component = component.name(),
                error = %err,
                "boolean difference failed, falling back to bounding boxes"
            );
            let passed = match (component.bounds(), cavity.bounds()) {
                (Some(inner), Some(outer)) => {
                    outer.contains_with_slack(&inner, settings.fallback_slack)
                }
                _ => false,
            };
            Measurement {
                passed,
                volume: 0.0,
                method: Method::BoundsFallback,
                warning: Some(format!(
                    "boolean op failed for {}: {err}; checked bounding boxes only",
                    component.name()
                )),
            }
        }
    }
}
