//! The packing run: seeds, growth, hill climbing and timing refreshes.

use crate::assembly::{assemble, ClusterAssembly};
use crate::engine::Clusterer;
use crate::error::PackError;
use crate::validate::{validate, ClusterBudgets, ClusterStats};
use clbpack_common::BlockId;
use clbpack_config::{PackOptions, SeedPolicy};
use clbpack_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink};
use clbpack_netlist::Netlist;
use clbpack_timing::{CriticalPathReport, TimingSummary};

/// Note emitted when the packed critical path unlocks unrelated clustering.
const CRITICAL_PATH_PACKED: DiagnosticCode = DiagnosticCode::new(Category::Timing, 11);

/// Everything a finished run produces.
#[derive(Debug, Clone)]
pub struct PackOutcome {
    /// Blocks of each cluster.
    pub assembly: ClusterAssembly,
    /// Pin usage and occupancy, checked against the budgets.
    pub stats: ClusterStats,
    /// Timing of the packed netlist, for timing-driven runs.
    pub timing: Option<TimingSummary>,
    /// Critical path of the packed netlist, for timing-driven runs.
    pub critical_path: Option<CriticalPathReport>,
}

/// Packs every logic block of `netlist` into clusters.
///
/// On success each logic block's assignment names its cluster and the
/// returned statistics have been checked from scratch against the budgets.
pub fn pack(
    netlist: &mut Netlist,
    options: &PackOptions,
    sink: &DiagnosticSink,
) -> Result<PackOutcome, PackError> {
    Clusterer::new(netlist, options, sink)?.run()
}

impl Clusterer<'_> {
    /// Runs the packing to completion.
    pub fn run(mut self) -> Result<PackOutcome, PackError> {
        if let Some(report) = self.analyze_timing()? {
            self.sink.emit(
                report
                    .to_diagnostic(self.options.cluster_size)
                    .with_note("before packing"),
            );
        }

        loop {
            self.reset_cluster();
            let Some(seed) = self.next_seed() else {
                break;
            };
            self.open_cluster();
            self.add_to_cluster(seed);
            if self.timing_active() {
                self.blocks_since_analysis += 1;
            }

            while let Some(block) = self.lut_for_cluster() {
                self.add_to_cluster(block);
                if self.timing_active() {
                    self.blocks_since_analysis += 1;
                    if self.blocks_since_analysis >= self.options.recompute_timing_after {
                        self.refresh_timing_during_growth()?;
                    }
                }
            }

            let added = if self.options.hill_climbing && self.latches.allow_unrelated() {
                self.hill_climb()
            } else {
                0
            };
            if self.timing_active() && added > 0 {
                self.blocks_since_analysis += added;
                if self.blocks_since_analysis >= self.options.recompute_timing_after {
                    self.analyze_timing()?;
                    self.blocks_since_analysis = 0;
                }
            }
        }

        let critical_path = self.analyze_timing()?;
        if let Some(report) = &critical_path {
            self.sink.emit(
                report
                    .to_diagnostic(self.options.cluster_size)
                    .with_note("after packing"),
            );
        }

        let assembly = assemble(self.netlist, self.num_clusters, self.options.cluster_size)?;
        let stats = validate(self.netlist, &assembly, &ClusterBudgets::from(&self.options))?;
        self.sink.emit(stats.to_diagnostic());
        Ok(PackOutcome {
            assembly,
            stats,
            timing: self.timing.as_ref().map(|t| *t.summary()),
            critical_path,
        })
    }

    /// Whether packed blocks still count towards the next timing update.
    fn timing_active(&self) -> bool {
        self.timing.is_some() && !self.latches.early_exit()
    }

    /// Re-times the netlist against the current packing and reports the
    /// critical path. Does nothing for runs without timing.
    fn analyze_timing(&mut self) -> Result<Option<CriticalPathReport>, PackError> {
        let Some(timing) = self.timing.as_mut() else {
            return Ok(None);
        };
        let netlist: &Netlist = &*self.netlist;
        let farthest = timing.recompute(netlist, &self.delays)?;
        Ok(farthest.map(|block| timing.report_critical_path(netlist, block)))
    }

    fn refresh_timing_during_growth(&mut self) -> Result<(), PackError> {
        let report = self.analyze_timing()?;
        self.recompute_length_gain_values();
        if let Some(report) = report.filter(|r| r.all_clustered) {
            let before = self.latches;
            self.latches
                .critical_path_packed(self.options.allow_early_exit);
            if self.latches != before {
                let mut diag = Diagnostic::note(
                    CRITICAL_PATH_PACKED,
                    format!(
                        "critical path fully packed after {} cluster(s); unrelated clustering enabled",
                        self.num_clusters
                    ),
                )
                .with_note(format!("path length {:.2}", report.length));
                if self.latches.early_exit() {
                    diag = diag.with_note("timing analysis stops until the end of the run");
                }
                self.sink.emit(diag);
            }
        }
        self.blocks_since_analysis = 0;
        Ok(())
    }

    /// Picks the block that opens the next cluster.
    fn next_seed(&mut self) -> Option<BlockId> {
        if self.options.seed_policy == SeedPolicy::Timing {
            if let Some(timing) = self.timing.as_mut() {
                return timing.most_critical_unclustered_block(self.netlist);
            }
        }
        self.free_block_with_most_ext_inputs(
            self.options.inputs_per_cluster as i32,
            self.options.clocks_per_cluster as i32,
        )
    }
}
