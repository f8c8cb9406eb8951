//! Diagnostic creation, severity management, and terminal rendering.
//!
//! This crate provides structured [`Diagnostic`] messages with severity levels,
//! category-prefixed codes, and an optional [`Subject`] naming the netlist
//! object the message is about. The [`DiagnosticSink`] accumulates diagnostics
//! while a netlist is checked, analyzed and packed, and [`TerminalRenderer`]
//! formats them for the console.

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod renderer;
pub mod severity;
pub mod sink;

pub use code::{Category, DiagnosticCode};
pub use diagnostic::{Diagnostic, Subject};
pub use renderer::{DiagnosticRenderer, TerminalRenderer};
pub use severity::Severity;
pub use sink::DiagnosticSink;
