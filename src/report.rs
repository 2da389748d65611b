//! Console rendering of a [`ValidationReport`].

use std::fmt::Write as _;

use colored::{Color, Colorize};

use crate::check::Method;
use crate::math::Point3;
use crate::validate::{CheckKind, CheckResult, SolidSummary, ValidationReport};

/// Renders validation reports as text for the terminal.
#[derive(Debug, Clone, Copy)]
pub struct ReportRenderer {
    verbose: bool,
    use_color: bool,
}

impl Default for ReportRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            verbose: false,
            use_color: true,
        }
    }

    /// Adds loaded-solid statistics, measured volumes and check methods.
    #[must_use]
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    #[must_use]
    pub fn with_color(mut self, use_color: bool) -> Self {
        self.use_color = use_color;
        self
    }

    /// Renders the whole report, summary last.
    #[must_use]
    pub fn render(&self, report: &ValidationReport) -> String {
        let mut out = String::new();

        if self.verbose && !report.loaded.is_empty() {
            let _ = writeln!(out, "{}", self.bold("Loaded meshes"));
            for solid in &report.loaded {
                let _ = writeln!(out, "  {}", loaded_line(solid));
            }
            out.push('\n');
        }

        let _ = writeln!(out, "{}", self.bold("=== CAVITY CONTAINMENT CHECKS ==="));
        for result in report.of_kind(CheckKind::Containment) {
            self.render_result(&mut out, result);
        }

        let _ = writeln!(out, "\n{}", self.bold("=== COMPONENT COLLISION CHECKS ==="));
        for result in report.of_kind(CheckKind::Collision) {
            self.render_result(&mut out, result);
        }

        if !report.skipped.is_empty() {
            let _ = writeln!(out, "\n{}", self.bold("=== SKIPPED COMPONENTS ==="));
            for skipped in &report.skipped {
                let _ = writeln!(
                    out,
                    "  [{}] {}: {}",
                    self.paint("SKIP", Color::Yellow),
                    skipped.name,
                    skipped.reason
                );
            }
        }

        let _ = writeln!(out, "\n{}", self.bold("=== SUMMARY ==="));
        out.push_str(&self.summary(report));
        out
    }

    /// The closing verdict, listing every failed check.
    #[must_use]
    pub fn summary(&self, report: &ValidationReport) -> String {
        let total = report.total();
        if report.passed() {
            let verdict = self.paint(&format!("ALL {total} CHECKS PASSED"), Color::Green);
            return format!("{verdict}\n");
        }
        let mut out = format!(
            "{}\n",
            self.paint(
                &format!("{} of {total} CHECKS FAILED:", report.failed_count()),
                Color::Red
            )
        );
        for failure in report.failures() {
            let line = format!("  \u{2717} {}: {}", failure.kind, failure.subject);
            let _ = writeln!(out, "{}", self.paint(&line, Color::Red));
        }
        out
    }

    fn render_result(&self, out: &mut String, result: &CheckResult) {
        let line = match result.kind {
            CheckKind::Containment if result.exempt => format!(
                "[{}] {} \u{2014} passes through wall by design ({} mm\u{b3} external)",
                self.paint("SKIP", Color::Green),
                result.subject,
                result
                    .volume
                    .map_or_else(|| "unknown".to_owned(), |v| format!("{v:.0}"))
            ),
            CheckKind::Containment => format!(
                "[{}] {} contained in cavity{}",
                self.status(result.passed),
                result.subject,
                self.detail("protrusion", result)
            ),
            CheckKind::Collision => format!(
                "[{}] {}{}",
                self.status(result.passed),
                spaced_label(&result.subject),
                self.detail("collision", result)
            ),
        };
        let _ = writeln!(out, "  {line}");

        if let Some(warning) = &result.warning {
            let warning = self.paint(&format!("warning: {warning}"), Color::Yellow);
            let _ = writeln!(out, "    {warning}");
        }
    }

    /// Volume shown after a check line: always for failures, and for
    /// every measured check when verbose.
    fn detail(&self, label: &str, result: &CheckResult) -> String {
        let volume = result.volume.filter(|_| !result.passed || self.verbose);
        let mut detail = volume.map_or_else(String::new, |v| {
            format!(" ({label}: {} mm\u{b3})", fmt_volume(v))
        });
        if self.verbose && result.method != Method::Boolean {
            let _ = write!(detail, " [{}]", result.method);
        }
        detail
    }

    fn status(&self, passed: bool) -> String {
        if passed {
            self.paint("PASS", Color::Green)
        } else {
            self.paint("FAIL", Color::Red)
        }
    }

    fn bold(&self, text: &str) -> String {
        if self.use_color {
            text.bold().to_string()
        } else {
            text.to_owned()
        }
    }

    fn paint(&self, text: &str, color: Color) -> String {
        if self.use_color {
            text.color(color).to_string()
        } else {
            text.to_owned()
        }
    }
}

fn loaded_line(solid: &SolidSummary) -> String {
    let bounds = solid.bounds.map_or_else(String::new, |b| {
        format!(", bounds {} \u{2192} {}", fmt_point(&b.min), fmt_point(&b.max))
    });
    format!(
        "{}: {} triangles, {:.1} mm\u{b3}{bounds}",
        solid.name, solid.triangles, solid.volume
    )
}

/// Two decimals, switching to scientific notation for volumes that would
/// otherwise round to zero.
fn fmt_volume(volume: f64) -> String {
    let magnitude = volume.abs();
    if magnitude > 0.0 && magnitude < 0.01 {
        format!("{volume:.3e}")
    } else {
        format!("{volume:.2}")
    }
}

fn fmt_point(p: &Point3) -> String {
    format!("[{:.1}, {:.1}, {:.1}]", p.x, p.y, p.z)
}

/// `"a×b"` rendered as `"a × b"` for reading.
fn spaced_label(label: &str) -> String {
    label.replace('\u{d7}', " \u{d7} ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::Measurement;
    use crate::math::Aabb;
    use crate::validate::SkippedComponent;

    fn result(
        kind: CheckKind,
        subject: &str,
        passed: bool,
        volume: f64,
        exempt: bool,
    ) -> CheckResult {
        CheckResult {
            kind,
            subject: subject.to_owned(),
            passed,
            volume: Some(volume),
            method: Method::Boolean,
            exempt,
            warning: None,
        }
    }

    fn plain() -> ReportRenderer {
        ReportRenderer::new().with_color(false)
    }

    #[test]
    fn passing_report() {
        let report = ValidationReport {
            results: vec![
                result(CheckKind::Containment, "woofer", true, 1834.4, true),
                result(CheckKind::Containment, "crossover_hp", true, 0.0, false),
                result(CheckKind::Collision, "woofer\u{d7}crossover_hp", true, 0.0, false),
            ],
            ..ValidationReport::default()
        };
        let text = plain().render(&report);

        assert!(text.contains(
            "[SKIP] woofer \u{2014} passes through wall by design (1834 mm\u{b3} external)"
        ));
        assert!(text.contains("  [PASS] crossover_hp contained in cavity\n"));
        assert!(text.contains("  [PASS] woofer \u{d7} crossover_hp\n"));
        assert!(text.ends_with("=== SUMMARY ===\nALL 3 CHECKS PASSED\n"));
        assert!(!text.contains("Loaded meshes"));
    }

    #[test]
    fn failing_report_lists_failures() {
        let report = ValidationReport {
            results: vec![
                result(CheckKind::Containment, "port_tube", false, 500.0, false),
                result(CheckKind::Collision, "crossover_lp\u{d7}port_tube", false, 12.345, false),
            ],
            ..ValidationReport::default()
        };
        let text = plain().render(&report);

        assert!(text.contains(
            "[FAIL] port_tube contained in cavity (protrusion: 500.00 mm\u{b3})"
        ));
        assert!(text.contains("[FAIL] crossover_lp \u{d7} port_tube (collision: 12.35 mm\u{b3})"));
        assert!(text.contains("2 of 2 CHECKS FAILED:\n"));
        assert!(text.contains("  \u{2717} containment: port_tube\n"));
        assert!(text.contains("  \u{2717} collision: crossover_lp\u{d7}port_tube\n"));
    }

    #[test]
    fn verbose_shows_statistics_and_methods() {
        let fallback = CheckResult::containment(
            "crossover_hp",
            Measurement {
                passed: true,
                volume: 0.0,
                method: Method::BoundsFallback,
                warning: Some("boolean op failed for crossover_hp: boom".to_owned()),
            },
            false,
        );
        let report = ValidationReport {
            loaded: vec![SolidSummary {
                name: "cavity".to_owned(),
                triangles: 12,
                volume: 8.0,
                bounds: Some(Aabb::new(Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 2.0, 2.0))),
            }],
            results: vec![
                fallback,
                result(CheckKind::Containment, "crossover_lp", true, 0.004, false),
            ],
            ..ValidationReport::default()
        };
        let text = plain().with_verbose(true).render(&report);

        assert!(text.contains(
            "cavity: 12 triangles, 8.0 mm\u{b3}, bounds [0.0, 0.0, 0.0] \u{2192} [2.0, 2.0, 2.0]"
        ));
        assert!(text.contains("[PASS] crossover_hp contained in cavity [bounding-box fallback]"));
        assert!(text.contains("    warning: boolean op failed for crossover_hp: boom"));
        assert!(text.contains(
            "[PASS] crossover_lp contained in cavity (protrusion: 4.000e-3 mm\u{b3})"
        ));
    }

    #[test]
    fn noise_volumes_stay_visible() {
        assert_eq!(fmt_volume(0.0), "0.00");
        assert_eq!(fmt_volume(0.009), "9.000e-3");
        assert_eq!(fmt_volume(0.01), "0.01");
        assert_eq!(fmt_volume(1834.456), "1834.46");

        let report = ValidationReport {
            results: vec![result(CheckKind::Collision, "a\u{d7}b", true, 2.5e-5, false)],
            ..ValidationReport::default()
        };
        let quiet = plain().render(&report);
        let verbose = plain().with_verbose(true).render(&report);
        assert!(quiet.contains("  [PASS] a \u{d7} b\n"));
        assert!(verbose.contains("  [PASS] a \u{d7} b (collision: 2.500e-5 mm\u{b3})\n"));
    }

    #[test]
    fn skipped_components_are_listed() {
        let report = ValidationReport {
            skipped: vec![SkippedComponent {
                name: "tweeter".to_owned(),
                reason: "tweeter mesh is empty".to_owned(),
            }],
            ..ValidationReport::default()
        };
        let text = plain().render(&report);
        assert!(text.contains("[SKIP] tweeter: tweeter mesh is empty"));
        assert!(text.contains("ALL 0 CHECKS PASSED"));
    }

    #[test]
    fn color_only_when_enabled() {
        colored::control::set_override(true);
        let report = ValidationReport::default();
        let colored_text = ReportRenderer::new().render(&report);
        let plain_text = plain().render(&report);
        colored::control::unset_override();

        assert!(colored_text.contains('\u{1b}'));
        assert!(!plain_text.contains('\u{1b}'));
    }
}
