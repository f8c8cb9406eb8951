//! Serializable description of a finished packing.

use crate::driver::PackOutcome;
use crate::validate::ClusterStats;
use clbpack_config::PackOptions;
use clbpack_netlist::Netlist;
use clbpack_timing::TimingSummary;
use serde::Serialize;

/// The cluster architecture a packing targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchitectureSummary {
    /// Data inputs per LUT.
    pub lut_size: usize,
    /// Blocks per cluster.
    pub cluster_size: usize,
    /// Input pins per cluster.
    pub inputs_per_cluster: usize,
    /// Clock pins per cluster.
    pub clocks_per_cluster: usize,
    /// Whether clocks use dedicated routing.
    pub global_clocks: bool,
}

/// One cluster: its blocks by name and the pins they use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterSummary {
    /// Cluster index.
    pub index: usize,
    /// Names of its blocks.
    pub blocks: Vec<String>,
    /// Distinct input nets.
    pub inputs_used: usize,
    /// Distinct clock nets.
    pub clocks_used: usize,
}

/// Everything written out for a packing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusteringSummary {
    /// Target architecture.
    pub architecture: ArchitectureSummary,
    /// Every cluster in index order.
    pub clusters: Vec<ClusterSummary>,
    /// Occupancy and pin statistics.
    pub stats: ClusterStats,
    /// Timing of the packed netlist, for timing-driven runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing: Option<TimingSummary>,
}

impl ClusteringSummary {
    /// Collects the summary of a finished run.
    pub fn new(netlist: &Netlist, options: &PackOptions, outcome: &PackOutcome) -> Self {
        let clusters = outcome
            .assembly
            .contents
            .iter()
            .zip(&outcome.stats.per_cluster)
            .enumerate()
            .map(|(index, (blocks, usage))| ClusterSummary {
                index,
                blocks: blocks
                    .iter()
                    .map(|&b| netlist.block(b).name.clone())
                    .collect(),
                inputs_used: usage.inputs,
                clocks_used: usage.clocks,
            })
            .collect();

        Self {
            architecture: ArchitectureSummary {
                lut_size: options.lut_size,
                cluster_size: options.cluster_size,
                inputs_per_cluster: options.inputs_per_cluster,
                clocks_per_cluster: options.clocks_per_cluster,
                global_clocks: options.global_clocks,
            },
            clusters,
            stats: outcome.stats.clone(),
            timing: outcome.timing,
        }
    }
}
