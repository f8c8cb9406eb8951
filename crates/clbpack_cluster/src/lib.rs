//! Greedy, seed-based packing of logic blocks into clusters.
//!
//! Packing opens one cluster at a time. A seed block (the most critical
//! unclustered block, or the one with the most external inputs) starts the
//! cluster, then the block with the highest gain that still fits the input
//! and clock budgets is added until the cluster is full or nothing fits.
//! Gains measure how many nets a candidate shares with the cluster, blended
//! with either the criticality of its connections to the cluster or the
//! number of connections it would absorb. An optional hill-climbing pass
//! then tries to fill the remaining slots.
//!
//! Use [`pack`] for a whole run. [`assemble`] and [`validate`] turn the
//! per-block assignments into per-cluster contents and recheck every budget
//! from scratch.

#![warn(missing_docs)]

pub mod assembly;
pub mod driver;
pub mod engine;
pub mod error;
pub mod free_list;
pub mod gain;
pub mod hill_climb;
pub mod occupancy;
pub mod summary;
pub mod validate;

pub use assembly::{assemble, ClusterAssembly};
pub use driver::{pack, PackOutcome};
pub use engine::{Clusterer, RunLatches, MARKED_FRAC};
pub use error::PackError;
pub use gain::{BlockGain, GainMode};
pub use summary::{ArchitectureSummary, ClusterSummary, ClusteringSummary};
pub use validate::{validate, ClusterBudgets, ClusterStats, ClusterUsage, UsageRange};

#[cfg(test)]
pub(crate) mod tests {
    use clbpack_common::BlockId;
    use clbpack_config::{PackOptions, SeedPolicy};
    use clbpack_diagnostics::DiagnosticSink;
    use clbpack_netlist::{Netlist, NetlistBuilder, NetlistDescription};

    pub(crate) fn build(json: &str, lut_size: usize) -> Netlist {
        let sink = DiagnosticSink::new();
        let desc = NetlistDescription::from_json(json).unwrap();
        NetlistBuilder::new(lut_size, &sink).build(&desc).unwrap()
    }

    pub(crate) fn id(nl: &Netlist, name: &str) -> BlockId {
        nl.block_by_name(name).unwrap()
    }

    /// Area-only options: no timing, seeds by external input count.
    pub(crate) fn area_options(cluster_size: usize, inputs_per_cluster: usize) -> PackOptions {
        PackOptions {
            cluster_size,
            inputs_per_cluster,
            timing_driven: false,
            seed_policy: SeedPolicy::MaxInputs,
            ..PackOptions::default()
        }
    }
}
