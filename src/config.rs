//! Validation configuration.
//!
//! The component registry, pass-through set and check thresholds are one
//! immutable [`ValidationConfig`] value handed to the validator. The
//! defaults describe the enclosure model; a JSON file may override any
//! field.

use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::check::CheckSettings;
use crate::error::ConfigError;
use crate::operations::boolean::BooleanConfig;

/// Name under which the cavity is exported and reported.
pub const CAVITY_NAME: &str = "cavity";

/// One registered component: export selector and name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentEntry {
    pub selector: u32,
    pub name: String,
}

impl ComponentEntry {
    #[must_use]
    pub fn new(selector: u32, name: impl Into<String>) -> Self {
        Self {
            selector,
            name: name.into(),
        }
    }
}

/// Everything the validator needs to know besides the meshes themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidationConfig {
    /// Export selector producing the cavity solid.
    pub cavity_selector: u32,
    /// Components in check order.
    pub components: Vec<ComponentEntry>,
    /// Components that cross the enclosure wall by design.
    pub pass_through: BTreeSet<String>,
    pub checks: CheckSettings,
    pub boolean: BooleanConfig,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            cavity_selector: 1,
            components: vec![
                ComponentEntry::new(2, "woofer"),
                ComponentEntry::new(3, "tweeter"),
                ComponentEntry::new(4, "binding_posts"),
                ComponentEntry::new(5, "crossover_hp"),
                ComponentEntry::new(6, "crossover_lp"),
                ComponentEntry::new(7, "port_tube"),
            ],
            pass_through: ["woofer", "tweeter", "binding_posts"]
                .into_iter()
                .map(String::from)
                .collect(),
            checks: CheckSettings::default(),
            boolean: BooleanConfig::default(),
        }
    }
}

impl ValidationConfig {
    /// Reads and validates a JSON configuration file.
    ///
    /// Fields missing from the file keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the
    /// result fails [`validate`](Self::validate).
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut selectors = HashSet::new();
        let mut names = HashSet::new();
        for entry in &self.components {
            if entry.selector == self.cavity_selector {
                return Err(invalid(format!(
                    "component {} reuses the cavity selector {}",
                    entry.name, entry.selector
                )));
            }
            if !selectors.insert(entry.selector) {
                return Err(invalid(format!("duplicate selector {}", entry.selector)));
            }
            if !is_file_stem(&entry.name) {
                return Err(invalid(format!("invalid component name {:?}", entry.name)));
            }
            if entry.name == CAVITY_NAME {
                return Err(invalid(format!("component name {CAVITY_NAME:?} is reserved")));
            }
            if !names.insert(entry.name.as_str()) {
                return Err(invalid(format!("duplicate component name {}", entry.name)));
            }
        }

        if let Some(unknown) = self.pass_through.iter().find(|n| !names.contains(n.as_str())) {
            return Err(invalid(format!("pass-through component {unknown} is not registered")));
        }

        let tolerance = self.checks.noise_tolerance;
        if !(tolerance.is_finite() && tolerance > 0.0) {
            return Err(invalid(format!("noise tolerance must be positive, got {tolerance}")));
        }
        let slack = self.checks.fallback_slack;
        if !(slack.is_finite() && slack >= 0.0) {
            return Err(invalid(format!("fallback slack must be non-negative, got {slack}")));
        }
        let eps = self.boolean.epsilon;
        if !(eps.is_finite() && eps > 0.0) {
            return Err(invalid(format!("boolean epsilon must be positive, got {eps}")));
        }
        Ok(())
    }

    /// Returns `true` if `name` is exempt from the containment requirement.
    #[must_use]
    pub fn is_pass_through(&self, name: &str) -> bool {
        self.pass_through.contains(name)
    }

    /// Name of the component exported with `selector`.
    #[must_use]
    pub fn component_name(&self, selector: u32) -> Option<&str> {
        self.components
            .iter()
            .find(|c| c.selector == selector)
            .map(|c| c.name.as_str())
    }
}

fn invalid(message: String) -> ConfigError {
    ConfigError::Invalid(message)
}

/// Component names double as artifact file stems.
fn is_file_stem(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::check::UnverifiablePolicy;

    #[test]
    fn default_registry() {
        let config = ValidationConfig::default();
        config.validate().unwrap();
        assert_eq!(config.cavity_selector, 1);
        assert_eq!(config.component_name(2), Some("woofer"));
        assert_eq!(config.component_name(7), Some("port_tube"));
        assert_eq!(config.component_name(1), None);
        let names: Vec<&str> = config.components.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            ["woofer", "tweeter", "binding_posts", "crossover_hp", "crossover_lp", "port_tube"]
        );
    }

    #[test]
    fn pass_through_lookup() {
        let config = ValidationConfig::default();
        assert!(config.is_pass_through("woofer"));
        assert!(config.is_pass_through("binding_posts"));
        assert!(!config.is_pass_through("port_tube"));
        assert!(!config.is_pass_through("Woofer"));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let json = r#"{ "checks": { "unverifiable": "fail-closed" }, "pass_through": ["woofer"] }"#;
        let config: ValidationConfig = serde_json::from_str(json).unwrap();
        config.validate().unwrap();
        assert_eq!(config.checks.unverifiable, UnverifiablePolicy::FailClosed);
        assert!((config.checks.noise_tolerance - 0.01).abs() < f64::EPSILON);
        assert_eq!(config.components.len(), 6);
        assert!(!config.is_pass_through("tweeter"));
    }

    #[test]
    fn unknown_field_is_rejected() {
        assert!(serde_json::from_str::<ValidationConfig>(r#"{ "cavity": 1 }"#).is_err());
    }

    #[test]
    fn inconsistent_configs_are_rejected() {
        let mut config = ValidationConfig::default();
        config.components.push(ComponentEntry::new(2, "grille"));
        assert!(config.validate().unwrap_err().to_string().contains("duplicate selector 2"));

        let mut config = ValidationConfig::default();
        config.components.push(ComponentEntry::new(8, "woofer"));
        assert!(config.validate().is_err());

        let mut config = ValidationConfig::default();
        config.components.push(ComponentEntry::new(1, "grille"));
        assert!(config.validate().unwrap_err().to_string().contains("cavity selector"));

        let mut config = ValidationConfig::default();
        config.pass_through.insert("grille".into());
        assert!(config.validate().unwrap_err().to_string().contains("grille"));

        let mut config = ValidationConfig::default();
        config.checks.noise_tolerance = 0.0;
        assert!(config.validate().is_err());

        let mut config = ValidationConfig::default();
        config.components.push(ComponentEntry::new(9, "../escape"));
        assert!(config.validate().is_err());

        let mut config = ValidationConfig::default();
        config.components.push(ComponentEntry::new(9, CAVITY_NAME));
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fit.json");
        fs::write(
            &path,
            r#"{
                "components": [ { "selector": 5, "name": "crossover_hp" } ],
                "pass_through": []
            }"#,
        )
        .unwrap();
        let config = ValidationConfig::load(&path).unwrap();
        assert_eq!(config.components, vec![ComponentEntry::new(5, "crossover_hp")]);

        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            ValidationConfig::load(&path),
            Err(ConfigError::Parse { .. })
        ));
        assert!(matches!(
            ValidationConfig::load(&dir.path().join("missing.json")),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn invalid_file_contents_fail_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fit.json");
        fs::write(&path, r#"{ "pass_through": ["subwoofer"] }"#).unwrap();
        assert!(matches!(
            ValidationConfig::load(&path),
            Err(ConfigError::Invalid(_))
        ));
    }
}
