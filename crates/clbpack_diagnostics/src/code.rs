//! Message codes emitted by the packer.
//!
//! | Code   | Emitted by                | Meaning                                  |
//! |--------|---------------------------|------------------------------------------|
//! | `W201` | netlist builder           | unused input pad removed                 |
//! | `N101` | clock check               | number of clock nets found               |
//! | `T010` | timing analysis           | critical path before or during packing   |
//! | `T011` | packing driver            | critical path once every block is packed |
//! | `P001` | cluster validation        | cluster usage statistics                 |
//!
//! Hard failures are returned as errors rather than emitted, so `E` codes only
//! appear when a caller chooses to report one through a sink.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which stage family a code belongs to. Decides the code's letter.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Category {
    /// `E`
    Error,
    /// `W`: tolerated netlist problems.
    Warning,
    /// `T`: critical path reports.
    Timing,
    /// `P`: clustering statistics.
    Packing,
    /// `N`: netlist facts worth a note.
    Info,
}

impl Category {
    /// The code letter.
    pub fn prefix(self) -> char {
        match self {
            Category::Error => 'E',
            Category::Warning => 'W',
            Category::Timing => 'T',
            Category::Packing => 'P',
            Category::Info => 'N',
        }
    }
}

/// A code such as `T010`: the category letter and a three-digit number.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct DiagnosticCode {
    /// Stage family.
    pub category: Category,
    /// Number within the family.
    pub number: u16,
}

impl DiagnosticCode {
    /// Usable in `const` items, which is how each stage declares its codes.
    pub const fn new(category: Category, number: u16) -> Self {
        Self { category, number }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:03}", self.category.prefix(), self.number)
    }
}
