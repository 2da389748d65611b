use std::fmt;

use serde::Serialize;

use crate::check::{Measurement, Method};
use crate::math::Aabb;
use crate::mesh::Solid;

/// The two kinds of check the validator runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    Containment,
    Collision,
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Containment => "containment",
            Self::Collision => "collision",
        })
    }
}

/// Outcome of one check, as reported to the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckResult {
    pub kind: CheckKind,
    /// Component name, or `"A\u{d7}B"` for a collision pair.
    pub subject: String,
    pub passed: bool,
    /// Measured protrusion or collision volume in mm^3, `None` when the
    /// check could not measure one.
    pub volume: Option<f64>,
    pub method: Method,
    /// Pass-through component whose containment result is informational.
    pub exempt: bool,
    pub warning: Option<String>,
}

impl CheckResult {
    pub(crate) fn containment(name: &str, measurement: Measurement, exempt: bool) -> Self {
        Self::from_measurement(CheckKind::Containment, name.to_owned(), measurement, exempt)
    }

    pub(crate) fn collision(a: &str, b: &str, measurement: Measurement) -> Self {
        Self::from_measurement(CheckKind::Collision, pair_label(a, b), measurement, false)
    }

    fn from_measurement(kind: CheckKind, subject: String, m: Measurement, exempt: bool) -> Self {
        let volume = match m.method {
            Method::Boolean | Method::DisjointBounds => Some(m.volume),
            Method::BoundsFallback | Method::Unverified => None,
        };
        Self {
            kind,
            subject,
            passed: exempt || m.passed,
            volume,
            method: m.method,
            exempt,
            warning: m.warning,
        }
    }
}

/// Label of a collision pair.
#[must_use]
pub fn pair_label(a: &str, b: &str) -> String {
    format!("{a}\u{d7}{b}")
}

/// Statistics of a loaded solid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SolidSummary {
    pub name: String,
    pub triangles: usize,
    pub volume: f64,
    pub bounds: Option<Aabb>,
}

impl SolidSummary {
    #[must_use]
    pub fn of(solid: &Solid) -> Self {
        Self {
            name: solid.name().to_owned(),
            triangles: solid.triangle_count(),
            volume: solid.volume(),
            bounds: solid.bounds(),
        }
    }
}

/// A registered component left out of every check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedComponent {
    pub name: String,
    pub reason: String,
}

/// Everything one validation run produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    /// Cavity first, then components in registry order.
    pub loaded: Vec<SolidSummary>,
    pub skipped: Vec<SkippedComponent>,
    /// Containment results in registry order, then collisions in pair order.
    pub results: Vec<CheckResult>,
}

impl ValidationReport {
    /// Overall verdict: every check passed.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.results.iter().all(|r| r.passed)
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.results.len()
    }

    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.results.iter().filter(|r| r.passed).count()
    }

    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.total() - self.passed_count()
    }

    /// Failed checks in report order.
    pub fn failures(&self) -> impl Iterator<Item = &CheckResult> + '_ {
        self.results.iter().filter(|r| !r.passed)
    }

    /// Results of one kind in report order.
    pub fn of_kind(&self, kind: CheckKind) -> impl Iterator<Item = &CheckResult> + '_ {
        self.results.iter().filter(move |r| r.kind == kind)
    }

    /// Looks up a result by kind and subject label.
    #[must_use]
    pub fn find(&self, kind: CheckKind, subject: &str) -> Option<&CheckResult> {
        self.results
            .iter()
            .find(|r| r.kind == kind && r.subject == subject)
    }
}
