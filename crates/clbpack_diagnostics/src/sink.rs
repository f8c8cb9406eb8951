//! Collects messages from the builder, the checks, timing analysis and the
//! packing driver so the CLI can render them once a command finishes.

use crate::diagnostic::Diagnostic;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

/// Message collector passed by shared reference through every stage.
///
/// Errors are counted separately so `has_errors` never takes the lock.
pub struct DiagnosticSink {
    diagnostics: Mutex<Vec<Diagnostic>>,
    errors: AtomicUsize,
}

impl DiagnosticSink {
    /// An empty sink.
    pub fn new() -> Self {
        Self {
            diagnostics: Mutex::new(Vec::new()),
            errors: AtomicUsize::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Diagnostic>> {
        // Pushing cannot leave the Vec half-written, so a poisoned lock is usable.
        self.diagnostics
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Records `diag`.
    pub fn emit(&self, diag: Diagnostic) {
        if diag.severity.is_error() {
            self.errors.fetch_add(1, Ordering::Relaxed);
        }
        self.lock().push(diag);
    }

    /// Whether an error has been recorded. Decides the CLI exit code.
    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// Number of errors recorded, including drained ones.
    pub fn error_count(&self) -> usize {
        self.errors.load(Ordering::Relaxed)
    }

    /// Removes and returns everything recorded so far.
    pub fn take_all(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.lock())
    }

    /// A copy of everything recorded so far, in emission order.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.lock().clone()
    }
}

impl Default for DiagnosticSink {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::{Category, DiagnosticCode};
    use crate::diagnostic::Subject;

    const SWEPT_INPAD: DiagnosticCode = DiagnosticCode::new(Category::Warning, 201);
    const PACKING_STATS: DiagnosticCode = DiagnosticCode::new(Category::Packing, 1);

    fn swept(pad: &str) -> Diagnostic {
        Diagnostic::warning(SWEPT_INPAD, format!("removing unused input pad `{pad}`"))
            .with_subject(Subject::Net(pad.to_string()))
    }

    #[test]
    fn warnings_and_notes_are_not_errors() {
        let sink = DiagnosticSink::new();
        sink.emit(swept("reset"));
        sink.emit(Diagnostic::note(PACKING_STATS, "4 logic blocks in 1 cluster"));
        assert!(!sink.has_errors());
        assert_eq!(sink.diagnostics().len(), 2);
    }

    #[test]
    fn emission_order_is_kept() {
        let sink = DiagnosticSink::new();
        sink.emit(swept("a"));
        sink.emit(swept("b"));
        sink.emit(Diagnostic::note(PACKING_STATS, "stats"));
        let codes: Vec<String> = sink.diagnostics().iter().map(|d| d.code.to_string()).collect();
        assert_eq!(codes, vec!["W201", "W201", "P001"]);
        assert!(sink.diagnostics()[1].message.contains("`b`"));
    }

    #[test]
    fn error_survives_a_drain() {
        let sink = DiagnosticSink::new();
        sink.emit(Diagnostic::error(
            DiagnosticCode::new(Category::Error, 101),
            "clock net `clk` drives a LUT input",
        ));
        sink.emit(swept("reset"));
        assert_eq!(sink.take_all().len(), 2);
        assert!(sink.diagnostics().is_empty());
        assert!(sink.has_errors());
        assert_eq!(sink.error_count(), 1);
    }

    #[test]
    fn shared_between_threads() {
        use std::sync::Arc;
        use std::thread;

        let sink = Arc::new(DiagnosticSink::new());
        let handles: Vec<_> = ["a", "b"]
            .into_iter()
            .map(|pad| {
                let sink = Arc::clone(&sink);
                thread::spawn(move || sink.emit(swept(pad)))
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(sink.diagnostics().len(), 2);
        assert_eq!(sink.error_count(), 0);
    }
}
