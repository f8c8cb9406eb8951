//! How serious a packer message is.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a message. Ordered so that `Error` is the greatest.
///
/// The CLI shows notes only with `--verbose`; warnings unless `--quiet`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum Severity {
    /// Statistics, clock counts and critical path reports.
    Note,
    /// Something tolerated, such as a swept input pad.
    Warning,
    /// The run cannot produce a clustering.
    Error,
}

impl Severity {
    /// Returns `true` for [`Severity::Error`].
    pub fn is_error(self) -> bool {
        self == Severity::Error
    }

    /// Bold ANSI color for the rendered header.
    pub fn ansi_color(self) -> &'static str {
        match self {
            Severity::Note => "\x1b[1;32m",
            Severity::Warning => "\x1b[1;33m",
            Severity::Error => "\x1b[1;31m",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Note => "note",
            Severity::Warning => "warning",
            Severity::Error => "error",
        })
    }
}
