//! From-scratch check of a finished packing, and its statistics.

use crate::assembly::ClusterAssembly;
use crate::error::PackError;
use clbpack_common::NetId;
use clbpack_config::PackOptions;
use clbpack_diagnostics::{Category, Diagnostic, DiagnosticCode};
use clbpack_netlist::Netlist;
use serde::Serialize;

/// Note summarizing a packing.
const PACKING_STATS: DiagnosticCode = DiagnosticCode::new(Category::Packing, 1);

/// Per-cluster limits a packing is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusterBudgets {
    /// Distinct input nets allowed per cluster.
    pub inputs_per_cluster: usize,
    /// Distinct clock nets allowed per cluster.
    pub clocks_per_cluster: usize,
}

impl From<&PackOptions> for ClusterBudgets {
    fn from(options: &PackOptions) -> Self {
        Self {
            inputs_per_cluster: options.inputs_per_cluster,
            clocks_per_cluster: options.clocks_per_cluster,
        }
    }
}

/// Pins and slots used by one cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClusterUsage {
    /// Blocks in the cluster.
    pub occupancy: usize,
    /// Distinct input nets driven from outside.
    pub inputs: usize,
    /// Distinct clock nets.
    pub clocks: usize,
}

/// Smallest, mean and largest value over all clusters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct UsageRange {
    /// Smallest value.
    pub min: usize,
    /// Mean value.
    pub avg: f32,
    /// Largest value.
    pub max: usize,
}

impl UsageRange {
    fn over(values: impl Iterator<Item = usize> + Clone) -> Self {
        let count = values.clone().count();
        if count == 0 {
            return Self::default();
        }
        Self {
            min: values.clone().min().unwrap_or(0),
            avg: values.clone().sum::<usize>() as f32 / count as f32,
            max: values.max().unwrap_or(0),
        }
    }
}

/// Statistics of a checked packing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterStats {
    /// Logic blocks packed.
    pub logic_blocks: usize,
    /// Clusters built.
    pub num_clusters: usize,
    /// Blocks per cluster.
    pub occupancy: UsageRange,
    /// Input pins per cluster.
    pub inputs: UsageRange,
    /// Clock pins per cluster.
    pub clocks: UsageRange,
    /// Usage of each cluster.
    pub per_cluster: Vec<ClusterUsage>,
}

impl ClusterStats {
    /// Builds a packing note.
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::note(
            PACKING_STATS,
            format!(
                "packed {} logic block(s) into {} cluster(s)",
                self.logic_blocks, self.num_clusters
            ),
        )
        .with_note(format!(
            "blocks per cluster: avg {:.2}, min {}, max {}",
            self.occupancy.avg, self.occupancy.min, self.occupancy.max
        ))
        .with_note(format!(
            "inputs per cluster: avg {:.2}, min {}, max {}",
            self.inputs.avg, self.inputs.min, self.inputs.max
        ))
        .with_note(format!(
            "clocks per cluster: avg {:.2}, min {}, max {}",
            self.clocks.avg, self.clocks.min, self.clocks.max
        ))
    }
}

/// Pin counts of one cluster, recomputed from its blocks alone.
struct UsageCounter {
    pins: Vec<u32>,
    output: Vec<bool>,
    touched: Vec<NetId>,
}

impl UsageCounter {
    fn count(&mut self, netlist: &Netlist, assembly: &ClusterAssembly, cluster: usize) -> ClusterUsage {
        for net in self.touched.drain(..) {
            self.pins[net.index()] = 0;
            self.output[net.index()] = false;
        }

        let mut inputs: i64 = 0;
        let mut clocks = 0;
        for &id in assembly.blocks(cluster) {
            let block = netlist.block(id);
            if let Some(out) = block.output() {
                if self.pins[out.index()] > 0 && !netlist.is_clock(out) {
                    inputs -= 1;
                }
                self.add(out);
                self.output[out.index()] = true;
            }
            for net in block.input_pins().iter().flatten() {
                if self.pins[net.index()] == 0 {
                    inputs += 1;
                }
                self.add(*net);
            }
            if let Some(clock) = block.clock() {
                let count = self.pins[clock.index()];
                if count == 0 || (count == 1 && self.output[clock.index()]) {
                    clocks += 1;
                }
                self.add(clock);
            }
        }

        ClusterUsage {
            occupancy: assembly.occupancy[cluster],
            inputs: inputs.max(0) as usize,
            clocks,
        }
    }

    fn add(&mut self, net: NetId) {
        if self.pins[net.index()] == 0 {
            self.touched.push(net);
        }
        self.pins[net.index()] += 1;
    }
}

/// Recounts every cluster's pins from its blocks and checks them against the
/// budgets.
pub fn validate(
    netlist: &Netlist,
    assembly: &ClusterAssembly,
    budgets: &ClusterBudgets,
) -> Result<ClusterStats, PackError> {
    let mut counter = UsageCounter {
        pins: vec![0; netlist.num_nets()],
        output: vec![false; netlist.num_nets()],
        touched: Vec::new(),
    };
    let mut per_cluster = Vec::with_capacity(assembly.num_clusters());

    for cluster in 0..assembly.num_clusters() {
        if assembly.occupancy[cluster] == 0 {
            return Err(PackError::EmptyCluster { cluster });
        }
        let usage = counter.count(netlist, assembly, cluster);
        if usage.inputs > budgets.inputs_per_cluster {
            return Err(PackError::TooManyInputs {
                cluster,
                used: usage.inputs,
                budget: budgets.inputs_per_cluster,
            });
        }
        if usage.clocks > budgets.clocks_per_cluster {
            return Err(PackError::TooManyClocks {
                cluster,
                used: usage.clocks,
                budget: budgets.clocks_per_cluster,
            });
        }
        per_cluster.push(usage);
    }

    Ok(ClusterStats {
        logic_blocks: per_cluster.iter().map(|u| u.occupancy).sum(),
        num_clusters: per_cluster.len(),
        occupancy: UsageRange::over(per_cluster.iter().map(|u| u.occupancy)),
        inputs: UsageRange::over(per_cluster.iter().map(|u| u.inputs)),
        clocks: UsageRange::over(per_cluster.iter().map(|u| u.clocks)),
        per_cluster,
    })
}
