pub mod check;
pub mod config;
pub mod error;
pub mod export;
pub mod math;
pub mod mesh;
pub mod operations;
pub mod report;
pub mod validate;

pub use config::ValidationConfig;
pub use error::{CavityFitError, Result};
pub use validate::{MeshSources, ValidationReport, Validator};
