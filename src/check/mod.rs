//! Containment and collision checks built on a [`BooleanEngine`].
//!
//! Both checks measure a volume with the engine, treat anything below the
//! noise tolerance as a pass, and degrade gracefully when the engine
//! rejects the geometry.
//!
//! [`BooleanEngine`]: crate::operations::boolean::BooleanEngine

mod containment;
mod intersection;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::mesh::Solid;

pub use containment::check_containment;
pub use intersection::check_intersection;

/// What to report when the boolean engine cannot process a component pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnverifiablePolicy {
    /// Report the pair as passed, with a warning.
    #[default]
    FailOpen,
    /// Report the pair as failed.
    FailClosed,
}

/// Thresholds shared by the containment and collision checks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckSettings {
    /// Volumes (mm^3) strictly below this are numerical noise and pass.
    pub noise_tolerance: f64,
    /// Per-side slack (mm) of the bounding-box containment fallback.
    pub fallback_slack: f64,
    /// Outcome for component pairs the engine cannot intersect.
    pub unverifiable: UnverifiablePolicy,
}

impl Default for CheckSettings {
    fn default() -> Self {
        Self {
            noise_tolerance: 0.01,
            fallback_slack: 0.1,
            unverifiable: UnverifiablePolicy::FailOpen,
        }
    }
}

impl CheckSettings {
    /// Returns `true` if `volume` is small enough to pass.
    #[must_use]
    pub fn within_tolerance(&self, volume: f64) -> bool {
        volume < self.noise_tolerance
    }
}

/// How a measurement was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    /// Exact boolean volume.
    Boolean,
    /// Bounding boxes do not overlap; no boolean was run.
    DisjointBounds,
    /// Boolean failed; bounding-box containment was used instead.
    BoundsFallback,
    /// Boolean failed and nothing else could be checked.
    Unverified,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Boolean => "boolean",
            Self::DisjointBounds => "disjoint bounds",
            Self::BoundsFallback => "bounding-box fallback",
            Self::Unverified => "unverified",
        })
    }
}

/// Outcome of a single containment or collision check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Measurement {
    pub passed: bool,
    /// Protrusion or collision volume in mm^3; `0.0` when not measured.
    pub volume: f64,
    pub method: Method,
    /// Set when the check degraded.
    pub warning: Option<String>,
}

impl Measurement {
    fn measured(result: &Solid, settings: &CheckSettings) -> Self {
        let volume = if result.is_empty() { 0.0 } else { result.volume() };
        Self {
            passed: settings.within_tolerance(volume),
            volume,
            method: Method::Boolean,
            warning: None,
        }
    }

    fn disjoint() -> Self {
        Self {
            passed: true,
            volume: 0.0,
            method: Method::DisjointBounds,
            warning: None,
        }
    }

    /// Returns `true` for a passing check that still measured some volume.
    #[must_use]
    pub fn is_noise(&self) -> bool {
        self.passed && self.volume > 0.0
    }
}


#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn tolerance_boundary() {
        let settings = CheckSettings::default();
        assert!(settings.within_tolerance(0.0));
        assert!(settings.within_tolerance(0.009));
        assert!(!settings.within_tolerance(0.01));
        assert!(!settings.within_tolerance(0.02));
    }

    #[test]
    fn settings_deserialize_with_defaults() {
        let settings: CheckSettings =
            serde_json::from_str(r#"{ "unverifiable": "fail-closed" }"#).unwrap();
        assert_eq!(settings.unverifiable, UnverifiablePolicy::FailClosed);
        assert!((settings.noise_tolerance - 0.01).abs() < f64::EPSILON);
        assert!((settings.fallback_slack - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn method_display() {
        assert_eq!(Method::BoundsFallback.to_string(), "bounding-box fallback");
        assert_eq!(Method::DisjointBounds.to_string(), "disjoint bounds");
    }
}
