//! Validation orchestrator.
//!
//! Loads the cavity and every registered component, checks each component
//! against the cavity, checks every component pair for collisions and
//! collects the outcomes into a [`ValidationReport`].

mod result;

use std::collections::HashMap;
use std::path::PathBuf;

use tracing::{info, warn};

use crate::check::{check_containment, check_intersection};
use crate::config::{ValidationConfig, CAVITY_NAME};
use crate::error::Result;
use crate::mesh::{load_solid, Solid};
use crate::operations::boolean::{BooleanEngine, MeshBoolean};

pub use result::{
    pair_label, CheckKind, CheckResult, SkippedComponent, SolidSummary, ValidationReport,
};

/// Mesh artifacts to validate, by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MeshSources {
    pub cavity: PathBuf,
    /// Components that have an artifact; registered names missing here are
    /// reported as skipped.
    pub components: HashMap<String, PathBuf>,
}

impl MeshSources {
    #[must_use]
    pub fn new(cavity: impl Into<PathBuf>) -> Self {
        Self {
            cavity: cavity.into(),
            components: HashMap::new(),
        }
    }

    /// Adds a component artifact.
    #[must_use]
    pub fn with_component(mut self, name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.components.insert(name.into(), path.into());
        self
    }
}

/// Runs the containment and collision checks for one enclosure.
#[derive(Debug, Clone)]
pub struct Validator<E = MeshBoolean> {
    config: ValidationConfig,
    engine: E,
}

impl Validator<MeshBoolean> {
    /// Creates a validator using the mesh boolean engine tuned by `config`.
    #[must_use]
    pub fn new(config: ValidationConfig) -> Self {
        let engine = MeshBoolean::new(config.boolean);
        Self { config, engine }
    }
}

impl<E: BooleanEngine> Validator<E> {
    /// Creates a validator with a custom boolean engine.
    #[must_use]
    pub fn with_engine(config: ValidationConfig, engine: E) -> Self {
        Self { config, engine }
    }

    #[must_use]
    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    #[must_use]
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Loads every mesh and runs all checks.
    ///
    /// Components whose artifact is missing or fails to load are skipped
    /// with a warning and recorded in [`ValidationReport::skipped`].
    ///
    /// # Errors
    ///
    /// Returns an error if the cavity mesh cannot be loaded; nothing can be
    /// checked without it.
    pub fn run(&self, sources: &MeshSources) -> Result<ValidationReport> {
        info!("loading meshes");
        let cavity = load_solid(&sources.cavity, CAVITY_NAME)?;

        let mut components = Vec::with_capacity(self.config.components.len());
        let mut skipped = Vec::new();
        for entry in &self.config.components {
            let Some(path) = sources.components.get(&entry.name) else {
                warn!(component = %entry.name, "no mesh artifact, skipping");
                skipped.push(SkippedComponent {
                    name: entry.name.clone(),
                    reason: "no mesh artifact".into(),
                });
                continue;
            };
            match load_solid(path, &entry.name) {
                Ok(solid) => components.push(solid),
                Err(err) => {
                    warn!(component = %entry.name, error = %err, "could not load mesh, skipping");
                    skipped.push(SkippedComponent {
                        name: entry.name.clone(),
                        reason: err.to_string(),
                    });
                }
            }
        }

        let mut report = self.validate_solids(&cavity, &components);
        report.skipped = skipped;
        Ok(report)
    }

    /// Runs all checks on already loaded solids.
    ///
    /// `components` are checked in the given order; the collision pairs
    /// follow that order with `i < j`.
    #[must_use]
    pub fn validate_solids(&self, cavity: &Solid, components: &[Solid]) -> ValidationReport {
        let settings = &self.config.checks;
        let mut results = Vec::with_capacity(components.len() * (components.len() + 1) / 2);

        info!(components = components.len(), "checking cavity containment");
        for component in components {
            let exempt = self.config.is_pass_through(component.name());
            let measurement = check_containment(&self.engine, component, cavity, settings);
            results.push(CheckResult::containment(component.name(), measurement, exempt));
        }

        info!("checking component collisions");
        for (i, a) in components.iter().enumerate() {
            for b in &components[i + 1..] {
                let measurement = check_intersection(&self.engine, a, b, settings);
                results.push(CheckResult::collision(a.name(), b.name(), measurement));
            }
        }

        let loaded = std::iter::once(cavity)
            .chain(components)
            .map(SolidSummary::of)
            .collect();
        let report = ValidationReport {
            loaded,
            skipped: Vec::new(),
            results,
        };
        info!(
            total = report.total(),
            failed = report.failed_count(),
            "validation finished"
        );
        report
    }
}
