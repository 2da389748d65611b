use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for enclosure fit validation.
#[derive(Debug, Error)]
pub enum CavityFitError {
    #[error(transparent)]
    Mesh(#[from] MeshError),

    #[error(transparent)]
    Boolean(#[from] BooleanError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors raised while loading a mesh artifact.
#[derive(Debug, Error)]
pub enum MeshError {
    #[error("mesh file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid STL in {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("{name} mesh is empty")]
    Empty { name: String },
}

/// Errors raised by the mesh boolean engine.
#[derive(Debug, Error)]
pub enum BooleanError {
    #[error("{name} has no triangles")]
    EmptyInput { name: String },

    #[error("{name} contains non-finite coordinates")]
    NonFinite { name: String },

    #[error("{name} is not closed ({open_edges} open or non-manifold edges)")]
    NotClosed { name: String, open_edges: usize },

    #[error("boolean operation failed: {0}")]
    Failed(String),
}

/// Errors raised while exporting meshes through the external CAD tool.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("OpenSCAD not found; install it or pass --openscad PATH")]
    ToolNotFound,

    #[error("failed to launch {}: {source}", tool.display())]
    Spawn {
        tool: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("export of selector {selector} exited with {status}")]
    Failed {
        selector: u32,
        status: String,
        diagnostics: Vec<String>,
    },

    #[error("export of selector {selector} hit a model assertion")]
    Assertion { selector: u32, lines: Vec<String> },

    #[error("export of selector {selector} timed out after {seconds}s")]
    TimedOut { selector: u32, seconds: u64 },

    #[error("output file empty or missing: {}", path.display())]
    MissingArtifact { path: PathBuf },

    #[error("could not prepare output directory {}: {source}", path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors related to validation configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Convenience type alias for results using [`CavityFitError`].
pub type Result<T> = std::result::Result<T, CavityFitError>;
