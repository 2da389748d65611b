//! Mesh export through the OpenSCAD command line.
//!
//! The enclosure model selects what to render through the
//! `validation_export` variable: the cavity selector renders the inner
//! cavity, each component selector renders one component envelope.

use std::ffi::OsStr;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::config::{ValidationConfig, CAVITY_NAME};
use crate::error::ExportError;
use crate::validate::MeshSources;

/// Longest a single export may run.
pub const EXPORT_TIMEOUT: Duration = Duration::from_secs(300);

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Binary name searched on `PATH`.
const TOOL_NAME: &str = "openscad";

/// Install location of the macOS application bundle.
const MACOS_APP: &str = "/Applications/OpenSCAD.app/Contents/MacOS/OpenSCAD";

/// Locates the OpenSCAD binary: the macOS app bundle first, then `PATH`.
#[must_use]
pub fn find_openscad() -> Option<PathBuf> {
    let app = Path::new(MACOS_APP);
    if is_executable(app) {
        return Some(app.to_path_buf());
    }
    std::env::var_os("PATH").and_then(|paths| find_in_path(TOOL_NAME, &paths))
}

fn find_in_path(name: &str, paths: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(paths)
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path).is_ok_and(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Where the artifact for `name` lives inside `out_dir`.
#[must_use]
pub fn artifact_path(out_dir: &Path, name: &str) -> PathBuf {
    out_dir.join(format!("{name}.stl"))
}

/// Runs OpenSCAD once per selector.
#[derive(Debug, Clone)]
pub struct Exporter {
    tool: PathBuf,
    model: PathBuf,
    timeout: Duration,
}

impl Exporter {
    /// Creates an exporter rendering `model` with the binary at `tool`.
    #[must_use]
    pub fn new(tool: impl Into<PathBuf>, model: impl Into<PathBuf>) -> Self {
        Self {
            tool: tool.into(),
            model: model.into(),
            timeout: EXPORT_TIMEOUT,
        }
    }

    /// Overrides the per-export timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Exports the solid chosen by `selector` to `output`.
    ///
    /// An export fails when the tool exits unsuccessfully, when it prints
    /// an assertion failure (OpenSCAD may still exit 0), or when it leaves
    /// no non-empty file behind.
    ///
    /// # Errors
    ///
    /// Returns the first of these failures, or a spawn or timeout error.
    pub fn export_selector(&self, selector: u32, output: &Path) -> Result<(), ExportError> {
        // A stale artifact from an earlier run must not pass the final check.
        if let Err(err) = fs::remove_file(output) {
            if err.kind() != std::io::ErrorKind::NotFound {
                debug!(path = %output.display(), error = %err, "could not remove stale artifact");
            }
        }

        let define = format!("validation_export={selector}");
        debug!(
            tool = %self.tool.display(),
            model = %self.model.display(),
            output = %output.display(),
            define,
            "running export"
        );
        let mut child = Command::new(&self.tool)
            .arg(&self.model)
            .arg("-o")
            .arg(output)
            .arg("-D")
            .arg(&define)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ExportError::Spawn {
                tool: self.tool.clone(),
                source,
            })?;

        // Drain stderr on its own thread so a chatty tool cannot block on a full pipe.
        let stderr_reader = child.stderr.take().map(|mut pipe| {
            thread::spawn(move || {
                let mut text = String::new();
                // Partial output is still useful for diagnostics.
                let _ = pipe.read_to_string(&mut text);
                text
            })
        });

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {}
                Err(source) => {
                    return Err(ExportError::Spawn {
                        tool: self.tool.clone(),
                        source,
                    });
                }
            }
            if Instant::now() >= deadline {
                let _ = child.kill();
                let _ = child.wait();
                return Err(ExportError::TimedOut {
                    selector,
                    seconds: self.timeout.as_secs(),
                });
            }
            thread::sleep(POLL_INTERVAL);
        };

        let stderr = stderr_reader
            .and_then(|reader| reader.join().ok())
            .unwrap_or_default();

        if !status.success() {
            return Err(ExportError::Failed {
                selector,
                status: status.to_string(),
                diagnostics: matching_lines(&stderr, |l| {
                    l.contains("Assertion") || l.contains("ERROR")
                }),
            });
        }

        let assertions = matching_lines(&stderr, |l| l.contains("Assertion"));
        if !assertions.is_empty() {
            return Err(ExportError::Assertion {
                selector,
                lines: assertions,
            });
        }

        match fs::metadata(output) {
            Ok(meta) if meta.len() > 0 => Ok(()),
            _ => Err(ExportError::MissingArtifact {
                path: output.to_path_buf(),
            }),
        }
    }

    /// Exports the cavity and every registered component into `out_dir`.
    ///
    /// Components that fail to export are logged and left out of the
    /// returned sources.
    ///
    /// # Errors
    ///
    /// Returns an error if `out_dir` cannot be created or the cavity
    /// export fails.
    pub fn export_all(
        &self,
        config: &ValidationConfig,
        out_dir: &Path,
    ) -> Result<MeshSources, ExportError> {
        fs::create_dir_all(out_dir).map_err(|source| ExportError::OutputDir {
            path: out_dir.to_path_buf(),
            source,
        })?;

        info!(selector = config.cavity_selector, "exporting cavity");
        let cavity_path = artifact_path(out_dir, CAVITY_NAME);
        self.export_selector(config.cavity_selector, &cavity_path)?;

        let mut sources = MeshSources::new(cavity_path);
        for entry in &config.components {
            info!(component = %entry.name, selector = entry.selector, "exporting component");
            let path = artifact_path(out_dir, &entry.name);
            match self.export_selector(entry.selector, &path) {
                Ok(()) => {
                    sources.components.insert(entry.name.clone(), path);
                }
                Err(err) => {
                    warn!(component = %entry.name, error = %err, "could not export, skipping");
                    if let ExportError::Failed { diagnostics, .. } = &err {
                        for line in diagnostics {
                            warn!(component = %entry.name, "{line}");
                        }
                    }
                }
            }
        }
        Ok(sources)
    }
}

fn matching_lines(text: &str, keep: impl Fn(&str) -> bool) -> Vec<String> {
    text.lines().filter(|l| keep(l)).map(str::to_owned).collect()
}

/// Collects artifacts left in `out_dir` by an earlier export.
///
/// The cavity path is always returned; components without a file are
/// logged and left out.
#[must_use]
pub fn discover_existing(config: &ValidationConfig, out_dir: &Path) -> MeshSources {
    let mut sources = MeshSources::new(artifact_path(out_dir, CAVITY_NAME));
    for entry in &config.components {
        let path = artifact_path(out_dir, &entry.name);
        if path.is_file() {
            sources.components.insert(entry.name.clone(), path);
        } else {
            warn!(path = %path.display(), "artifact not found, skipping");
        }
    }
    sources
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn artifact_paths_use_component_names() {
        assert_eq!(
            artifact_path(Path::new("tmp/validation"), "port_tube"),
            PathBuf::from("tmp/validation/port_tube.stl")
        );
    }

    #[test]
    fn discover_existing_keeps_cavity_and_present_components() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("woofer.stl"), "solid woofer\nendsolid woofer\n").unwrap();

        let sources = discover_existing(&ValidationConfig::default(), dir.path());
        assert_eq!(sources.cavity, dir.path().join("cavity.stl"));
        assert_eq!(sources.components.len(), 1);
        assert_eq!(sources.components["woofer"], dir.path().join("woofer.stl"));
    }

    #[test]
    fn missing_tool_is_a_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = Exporter::new(dir.path().join("no-such-openscad"), "model.scad");
        let err = exporter
            .export_selector(1, &dir.path().join("cavity.stl"))
            .unwrap_err();
        assert!(matches!(err, ExportError::Spawn { .. }));
    }

    #[cfg(unix)]
    mod unix {
        use std::os::unix::fs::PermissionsExt;

        use super::*;

        /// Stand-in for OpenSCAD, run as `sh script <out flags>`; behaviour
        /// depends on the selector.
        const FAKE_EXPORTER: &str = r#"
out="$2"
sel="${4#validation_export=}"
case "$sel" in
  3) echo "WARNING: Assertion 'fits' failed in file model.scad, line 12" >&2
     printf 'solid x\n' > "$out" ;;
  4) echo "ERROR: Parser error in file model.scad" >&2
     echo "some other noise" >&2
     exit 1 ;;
  5) : ;;
  6) sleep 5 ;;
  9) exit 1 ;;
  *) printf 'solid part\nendsolid part\n' > "$out" ;;
esac
"#;

        fn exporter(dir: &Path) -> Exporter {
            let script = dir.join("model.sh");
            fs::write(&script, FAKE_EXPORTER).unwrap();
            Exporter::new("/bin/sh", script)
        }

        #[test]
        fn successful_export_writes_artifact() {
            let dir = tempfile::tempdir().unwrap();
            let out = dir.path().join("cavity.stl");
            exporter(dir.path()).export_selector(1, &out).unwrap();
            assert!(fs::metadata(&out).unwrap().len() > 0);
        }

        #[test]
        fn assertion_on_stderr_fails_despite_exit_zero() {
            let dir = tempfile::tempdir().unwrap();
            let err = exporter(dir.path())
                .export_selector(3, &dir.path().join("tweeter.stl"))
                .unwrap_err();
            let ExportError::Assertion { selector, lines } = err else {
                panic!("expected an assertion error");
            };
            assert_eq!(selector, 3);
            assert_eq!(lines.len(), 1);
            assert!(lines[0].contains("'fits'"));
        }

        #[test]
        fn non_zero_exit_keeps_error_lines() {
            let dir = tempfile::tempdir().unwrap();
            let err = exporter(dir.path())
                .export_selector(4, &dir.path().join("binding_posts.stl"))
                .unwrap_err();
            let ExportError::Failed { diagnostics, .. } = err else {
                panic!("expected an exit failure");
            };
            assert_eq!(diagnostics, ["ERROR: Parser error in file model.scad"]);
        }

        #[test]
        fn missing_output_is_an_error() {
            let dir = tempfile::tempdir().unwrap();
            let out = dir.path().join("crossover_hp.stl");
            fs::write(&out, "stale").unwrap();
            let err = exporter(dir.path()).export_selector(5, &out).unwrap_err();
            assert!(matches!(err, ExportError::MissingArtifact { .. }));
        }

        #[test]
        fn slow_export_times_out() {
            let dir = tempfile::tempdir().unwrap();
            let err = exporter(dir.path())
                .with_timeout(Duration::from_millis(200))
                .export_selector(6, &dir.path().join("crossover_lp.stl"))
                .unwrap_err();
            assert!(matches!(err, ExportError::TimedOut { selector: 6, .. }));
        }

        #[test]
        fn export_all_skips_failed_components() {
            let dir = tempfile::tempdir().unwrap();
            let out_dir = dir.path().join("validation");
            let sources = exporter(dir.path())
                .with_timeout(Duration::from_secs(1))
                .export_all(&ValidationConfig::default(), &out_dir)
                .unwrap();

            assert_eq!(sources.cavity, out_dir.join("cavity.stl"));
            let mut names: Vec<&str> = sources.components.keys().map(String::as_str).collect();
            names.sort_unstable();
            // Selectors 3-6 fail in the fake exporter.
            assert_eq!(names, ["port_tube", "woofer"]);
        }

        #[test]
        fn cavity_export_failure_is_fatal() {
            let dir = tempfile::tempdir().unwrap();
            let config = ValidationConfig {
                cavity_selector: 9,
                ..ValidationConfig::default()
            };
            let err = exporter(dir.path())
                .export_all(&config, &dir.path().join("validation"))
                .unwrap_err();
            assert!(matches!(err, ExportError::Failed { selector: 9, .. }));
        }

        #[test]
        fn path_search_finds_executables_only() {
            let dir = tempfile::tempdir().unwrap();
            let plain = dir.path().join("plain");
            let bin = dir.path().join("bin");
            fs::create_dir_all(&plain).unwrap();
            fs::create_dir_all(&bin).unwrap();
            fs::write(plain.join(TOOL_NAME), "").unwrap();
            let tool = bin.join(TOOL_NAME);
            fs::write(&tool, "#!/bin/sh\n").unwrap();
            fs::set_permissions(&tool, fs::Permissions::from_mode(0o755)).unwrap();

            let paths = std::env::join_paths([&plain, &bin]).unwrap();
            assert_eq!(find_in_path(TOOL_NAME, &paths), Some(tool));

            let only_plain = std::env::join_paths([&plain]).unwrap();
            assert_eq!(find_in_path(TOOL_NAME, &only_plain), None);
        }
    }
}
