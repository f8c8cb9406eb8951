//! Diagnostic rendering for human-readable console output.

use crate::diagnostic::Diagnostic;

const ANSI_RESET: &str = "\x1b[0m";

/// Trait for rendering diagnostics into formatted output strings.
pub trait DiagnosticRenderer {
    /// Renders a single diagnostic into a formatted string.
    fn render(&self, diag: &Diagnostic) -> String;
}

/// Renders diagnostics in a rustc-style terminal format.
///
/// Produces output like:
/// ```text
/// warning[W201]: input pad has no fanout and was removed
///   --> block `reset`
///    = note: ...
///    = help: ...
/// ```
pub struct TerminalRenderer {
    /// Whether to use ANSI color codes in output.
    pub color: bool,
}

impl TerminalRenderer {
    /// Creates a new terminal renderer.
    pub fn new(color: bool) -> Self {
        Self { color }
    }
}

impl DiagnosticRenderer for TerminalRenderer {
    fn render(&self, diag: &Diagnostic) -> String {
        let mut out = String::new();

        // Header line: severity[CODE]: message
        if self.color {
            out.push_str(&format!(
                "{}{}[{}]{ANSI_RESET}: {}\n",
                diag.severity.ansi_color(),
                diag.severity,
                diag.code,
                diag.message
            ));
        } else {
            out.push_str(&format!(
                "{}[{}]: {}\n",
                diag.severity, diag.code, diag.message
            ));
        }

        if let Some(subject) = &diag.subject {
            out.push_str(&format!("  --> {subject}\n"));
        }

        for note in &diag.notes {
            out.push_str(&format!("   = note: {note}\n"));
        }

        for help in &diag.help {
            out.push_str(&format!("   = help: {help}\n"));
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::{Category, DiagnosticCode};
    use crate::diagnostic::Subject;

    #[test]
    fn render_error_with_subject() {
        let code = DiagnosticCode::new(Category::Error, 101);
        let diag = Diagnostic::error(code, "clock net used as a LUT input")
            .with_subject(Subject::Net("clk".into()));

        let output = TerminalRenderer::new(false).render(&diag);

        assert!(output.contains("error[E101]: clock net used as a LUT input"));
        assert!(output.contains("--> net `clk`"));
    }

    #[test]
    fn render_warning_with_notes() {
        let code = DiagnosticCode::new(Category::Warning, 201);
        let diag = Diagnostic::warning(code, "input pad has no fanout")
            .with_note("the pad was removed from the netlist")
            .with_help("sweep dangling inputs in synthesis");

        let output = TerminalRenderer::new(false).render(&diag);

        assert!(output.contains("warning[W201]: input pad has no fanout"));
        assert!(output.contains("= note: the pad was removed from the netlist"));
        assert!(output.contains("= help: sweep dangling inputs in synthesis"));
    }

    #[test]
    fn render_without_subject_has_no_arrow() {
        let code = DiagnosticCode::new(Category::Packing, 1);
        let diag = Diagnostic::note(code, "12 logic blocks packed into 3 clusters");
        let output = TerminalRenderer::new(false).render(&diag);
        assert!(output.starts_with("note[P001]"));
        assert!(!output.contains("-->"));
    }

    #[test]
    fn color_wraps_header() {
        let code = DiagnosticCode::new(Category::Warning, 201);
        let diag = Diagnostic::warning(code, "x");
        let output = TerminalRenderer::new(true).render(&diag);
        assert!(output.starts_with("\x1b[1;33mwarning[W201]\x1b[0m: x"));
    }
}
