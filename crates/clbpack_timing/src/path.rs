//! Critical path extraction and reporting.

use crate::analyzer::TimingAnalyzer;
use clbpack_common::BlockId;
use clbpack_diagnostics::{Category, Diagnostic, DiagnosticCode};
use clbpack_netlist::{BlockKind, ClusterAssignment, Netlist};
use serde::Serialize;

/// Note summarizing the critical path.
const CRITICAL_PATH: DiagnosticCode = DiagnosticCode::new(Category::Timing, 10);

/// The most critical path, walked from its end back to its source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CriticalPathReport {
    /// Blocks on the path, from the path end to its source.
    pub blocks: Vec<BlockId>,
    /// Names of `blocks`.
    pub block_names: Vec<String>,
    /// Arrival time at the path end.
    pub length: f32,
    /// Number of blocks visited.
    pub total_blocks: usize,
    /// Visited blocks that are packed or packable (not pads).
    pub clusterable_blocks: usize,
    /// Distinct clusters crossed, counting each unclustered block as its own.
    pub num_clusters: usize,
    /// Hops that cross a cluster boundary or leave an unclustered block.
    pub external_nets: usize,
    /// Whether every clusterable block on the path has been packed.
    pub all_clustered: bool,
}

impl CriticalPathReport {
    /// Builds a timing note for the report.
    pub fn to_diagnostic(&self, cluster_size: usize) -> Diagnostic {
        Diagnostic::note(
            CRITICAL_PATH,
            format!(
                "critical path of length {:.2}: {} clusterable block(s) in {} cluster(s) of size {}",
                self.length, self.clusterable_blocks, self.num_clusters, cluster_size
            ),
        )
        .with_note(format!(
            "{} block(s) and {} external net(s) on the path",
            self.total_blocks, self.external_nets
        ))
        .with_note(format!("path (output to input): {}", self.block_names.join(" <- ")))
    }
}

impl TimingAnalyzer {
    /// Walks back from `farthest` along the most critical input of each block
    /// until an initial source is reached.
    ///
    /// The walk also ends when no input has positive criticality, and it
    /// never visits more blocks than the netlist has.
    pub fn report_critical_path(&self, netlist: &Netlist, farthest: BlockId) -> CriticalPathReport {
        let mut report = CriticalPathReport {
            blocks: Vec::new(),
            block_names: Vec::new(),
            length: self.delay_from_source(farthest),
            total_blocks: 0,
            clusterable_blocks: 0,
            num_clusters: usize::from(netlist.cluster_of(farthest) != ClusterAssignment::Never),
            external_nets: 0,
            all_clustered: true,
        };

        let mut current = farthest;
        let mut first_pass = true;
        for _ in 0..netlist.num_blocks() {
            let block = netlist.block(current);
            let assignment = netlist.cluster_of(current);
            report.blocks.push(current);
            report.block_names.push(block.name.clone());
            if assignment == ClusterAssignment::Unclustered {
                report.all_clustered = false;
            }
            report.total_blocks += 1;
            if assignment != ClusterAssignment::Never {
                report.clusterable_blocks += 1;
            }
            if self.is_initial_source(current) && !first_pass {
                break;
            }
            first_pass = false;

            let pins = match block.kind {
                BlockKind::OutPad => 0..=0,
                _ => 1..=self.lut_size,
            };
            let mut most_critical = 0.0_f32;
            let mut next = None;
            for pin in pins {
                let (Some(net), Some(pos)) = (block.pins[pin], self.net_pin_index(current, pin)) else {
                    continue;
                };
                let criticality = self.forward_criticality(net, pos);
                if criticality > most_critical {
                    most_critical = criticality;
                    next = netlist.net(net).driver();
                }
            }
            let Some(next) = next else {
                break;
            };

            let next_assignment = netlist.cluster_of(next);
            if next_assignment == ClusterAssignment::Unclustered || assignment != next_assignment {
                if next_assignment != ClusterAssignment::Never {
                    report.num_clusters += 1;
                }
                report.external_nets += 1;
            }
            current = next;
        }
        report
    }
}
