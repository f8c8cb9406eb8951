//! Configuration types deserialized from `pack.toml`.
//!
//! Every field is optional so that a file only needs to mention what it
//! changes; [`resolve_options`](crate::resolve_options) supplies defaults.

use serde::{Deserialize, Serialize};

/// The top-level packing configuration parsed from `pack.toml`.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackConfig {
    /// Logic block and cluster architecture parameters.
    #[serde(default)]
    pub architecture: ArchitectureConfig,
    /// Greedy packing behaviour.
    #[serde(default)]
    pub packing: PackingConfig,
    /// Timing-driven packing parameters.
    #[serde(default)]
    pub timing: TimingConfig,
}

/// Cluster architecture: LUT width, capacity and pin budgets.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArchitectureConfig {
    /// Number of data inputs per LUT (K).
    pub lut_size: Option<usize>,
    /// Number of logic blocks per cluster (N).
    pub cluster_size: Option<usize>,
    /// Number of distinct external input nets a cluster may use (I).
    pub inputs_per_cluster: Option<usize>,
    /// Number of distinct clock nets a cluster may use.
    pub clocks_per_cluster: Option<usize>,
    /// Whether clocks are routed on dedicated global networks.
    pub global_clocks: Option<bool>,
}

/// Greedy packing switches.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackingConfig {
    /// Run the hill-climbing repair pass after greedy growth stalls.
    pub hill_climbing: Option<bool>,
    /// Allow blocks with no connection to the open cluster to be added.
    pub allow_unrelated_clustering: Option<bool>,
    /// Rank candidates by connections absorbed instead of timing.
    pub connection_driven: Option<bool>,
}

/// Timing-driven packing parameters.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimingConfig {
    /// Whether packing decisions use criticality.
    pub enabled: Option<bool>,
    /// How each new cluster's seed block is chosen.
    pub seed: Option<SeedPolicy>,
    /// Area/timing tradeoff: 0 favours shared nets, 1 favours criticality.
    pub alpha: Option<f32>,
    /// Number of blocks packed between timing recomputations.
    pub recompute_after: Option<usize>,
    /// Delay through a single logic block.
    pub block_delay: Option<f32>,
    /// Delay of a connection that stays inside one cluster.
    pub intra_cluster_net_delay: Option<f32>,
    /// Delay of a connection between clusters.
    pub inter_cluster_net_delay: Option<f32>,
    /// Stop timing analysis once the critical path is fully packed.
    pub allow_early_exit: Option<bool>,
}

/// How the first block of each new cluster is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedPolicy {
    /// Seed with the most critical unclustered block.
    Timing,
    /// Seed with the unclustered block using the most external inputs.
    MaxInputs,
}
