//! The technology-mapped netlist consumed by the clusterer.
//!
//! A [`Netlist`] holds blocks (LUTs, latches, combined LUT+latch blocks and
//! I/O pads) and the nets connecting them. Block pin 0 is the block's only
//! driving pin, pins `1..=K` are LUT data inputs, and pin `K + 1` is the clock.
//! Every net lists its driver first and its receivers after it.
//!
//! Netlists are built from a JSON [`NetlistDescription`] by
//! [`NetlistBuilder`], which validates driver and pin shapes, sweeps unused
//! input pads and marks clock nets. The [`check`] module holds the fatal
//! up-front checks the clusterer runs before packing.

#![warn(missing_docs)]

pub mod builder;
pub mod check;
pub mod data;
pub mod error;

pub use builder::{BlockDescription, NetlistBuilder, NetlistDescription};
pub use check::{check_clocks, check_for_duplicate_inputs, mark_clock_nets};
pub use data::{Block, BlockKind, ClusterAssignment, Net, Netlist};
pub use error::NetlistError;
