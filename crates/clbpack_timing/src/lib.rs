//! Static timing and criticality analysis for the clusterer.
//!
//! [`TimingAnalyzer`] runs a unit-delay style analysis over the netlist: a
//! breadth-first sweep from sources computes each block's distance from the
//! nearest source, a second sweep from sinks computes required arrival times,
//! and every connection then gets a slack and a forward and backward
//! criticality in roughly `[0, 1]` plus small tie-breaker terms. Blocks are
//! ranked by criticality to pick timing-driven cluster seeds.
//!
//! Wire delay depends on the current packing: a connection inside one cluster
//! costs the intra-cluster delay, everything else the inter-cluster delay.
//! Re-running [`TimingAnalyzer::recompute`] after the packing changes is a
//! pure function of the netlist's cluster assignments.

#![warn(missing_docs)]

pub mod analyzer;
pub mod criticality;
pub mod error;
pub mod path;
pub mod sweep;

pub use analyzer::{DelayModel, TimingAnalyzer, TimingSummary};
pub use criticality::{MIN_SLACK_ALLOWED, SCALE_DISTANCE_VAL, SCALE_NUM_PATHS};
pub use error::TimingError;
pub use path::CriticalPathReport;
pub use sweep::MAX_ALLOWED_PATH_LEN;
