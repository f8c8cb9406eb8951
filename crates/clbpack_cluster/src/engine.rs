//! The clustering engine: the open cluster and the bookkeeping around it.
//!
//! A [`Clusterer`] owns every buffer the packing needs (gains, net occupancy,
//! free lists, the hill-climbing undo stack and the optional timing
//! analyzer). All of them are sized once from the netlist and reset per
//! cluster in time proportional to what the cluster touched.

use crate::error::PackError;
use crate::free_list::{FreeLists, RemovalPolicy};
use crate::gain::{GainMode, GainTable};
use crate::hill_climb::UndoRecord;
use crate::occupancy::NetOccupancy;
use clbpack_common::{BlockId, ClusterId, NetId};
use clbpack_config::PackOptions;
use clbpack_diagnostics::DiagnosticSink;
use clbpack_netlist::{check_clocks, check_for_duplicate_inputs, ClusterAssignment, Netlist};
use clbpack_timing::{DelayModel, TimingAnalyzer};

/// The marked list is scanned instead of every block while fewer than
/// `1 / MARKED_FRAC` of all blocks are marked.
pub const MARKED_FRAC: usize = 2;

/// Whether marking a net updates the gains of the blocks on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GainFlag {
    Gain,
    NoGain,
}

/// Which gain component ranks candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Ranking {
    /// Total gain, checked against both pin budgets.
    Total,
    /// Hill gain, checked against the clock budget only.
    Hill,
}

/// Run-wide switches. Both start from the options and can only turn on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunLatches {
    allow_unrelated: bool,
    early_exit: bool,
}

impl RunLatches {
    /// Creates the latches at the start of a run.
    pub fn new(allow_unrelated: bool) -> Self {
        Self {
            allow_unrelated,
            early_exit: false,
        }
    }

    /// Whether unconnected blocks may fill a cluster.
    pub fn allow_unrelated(&self) -> bool {
        self.allow_unrelated
    }

    /// Whether timing analysis has stopped for the rest of the run.
    pub fn early_exit(&self) -> bool {
        self.early_exit
    }

    /// Records that every block of the critical path has been packed.
    pub fn critical_path_packed(&mut self, allow_early_exit: bool) {
        self.allow_unrelated = true;
        if allow_early_exit {
            self.early_exit = true;
        }
    }
}

/// The cluster being filled.
#[derive(Debug, Clone)]
pub(crate) struct OpenCluster {
    pub id: ClusterId,
    pub blocks: Vec<BlockId>,
    pub inputs_used: i32,
    pub clocks_used: i32,
}

/// Greedy packer state for one run over a netlist.
pub struct Clusterer<'a> {
    pub(crate) netlist: &'a mut Netlist,
    pub(crate) options: PackOptions,
    pub(crate) sink: &'a DiagnosticSink,
    pub(crate) gain_mode: GainMode,
    pub(crate) gains: GainTable,
    pub(crate) nets: NetOccupancy,
    pub(crate) free: FreeLists,
    pub(crate) ext_inputs: Vec<usize>,
    pub(crate) timing: Option<TimingAnalyzer>,
    pub(crate) delays: DelayModel,
    pub(crate) cluster: OpenCluster,
    pub(crate) undo: Vec<UndoRecord>,
    pub(crate) latches: RunLatches,
    pub(crate) blocks_since_analysis: usize,
    pub(crate) num_clusters: usize,
}

impl<'a> Clusterer<'a> {
    /// Prepares a run. Any existing packing is discarded.
    ///
    /// Fails if the LUT widths disagree, if a clock net reaches a LUT input,
    /// if a block repeats an input net, or if timing analysis cannot be set
    /// up.
    pub fn new(
        netlist: &'a mut Netlist,
        options: &PackOptions,
        sink: &'a DiagnosticSink,
    ) -> Result<Self, PackError> {
        if options.lut_size != netlist.lut_size {
            return Err(PackError::LutSizeMismatch {
                expected: options.lut_size,
                found: netlist.lut_size,
            });
        }
        check_clocks(netlist)?;
        check_for_duplicate_inputs(netlist)?;
        netlist.clear_clustering();

        let ext_inputs: Vec<usize> = netlist.blocks.iter().map(|b| b.num_ext_inputs()).collect();
        let free = FreeLists::new(
            options.lut_size,
            netlist
                .block_ids()
                .filter(|&b| netlist.is_unclustered(b))
                .map(|b| (b, ext_inputs[b.index()])),
        );
        let timing = if options.timing_driven {
            Some(TimingAnalyzer::new(netlist, options.lut_size)?)
        } else {
            None
        };

        Ok(Self {
            gain_mode: GainMode::from_options(options),
            gains: GainTable::new(netlist.num_blocks()),
            nets: NetOccupancy::new(netlist.num_nets()),
            free,
            ext_inputs,
            timing,
            delays: DelayModel::new(
                options.block_delay,
                options.intra_cluster_net_delay,
                options.inter_cluster_net_delay,
            ),
            cluster: OpenCluster {
                id: ClusterId::from_index(0),
                blocks: Vec::with_capacity(options.cluster_size),
                inputs_used: 0,
                clocks_used: 0,
            },
            undo: Vec::with_capacity(options.cluster_size),
            latches: RunLatches::new(options.allow_unrelated_clustering),
            blocks_since_analysis: 0,
            num_clusters: 0,
            options: options.clone(),
            netlist,
            sink,
        })
    }

    /// Run-wide switches in their current state.
    pub fn latches(&self) -> RunLatches {
        self.latches
    }

    /// Clusters opened so far.
    pub fn num_clusters(&self) -> usize {
        self.num_clusters
    }

    /// Input pins still free in the open cluster.
    pub(crate) fn inputs_avail(&self) -> i32 {
        self.options.inputs_per_cluster as i32 - self.cluster.inputs_used
    }

    /// Clock pins still free in the open cluster.
    pub(crate) fn clocks_avail(&self) -> i32 {
        self.options.clocks_per_cluster as i32 - self.cluster.clocks_used
    }

    pub(crate) fn is_full(&self) -> bool {
        self.cluster.blocks.len() >= self.options.cluster_size
    }

    /// Empties the open cluster and unmarks everything it touched.
    pub(crate) fn reset_cluster(&mut self) {
        self.gains.reset();
        self.nets.reset();
        self.cluster.blocks.clear();
        self.cluster.inputs_used = 0;
        self.cluster.clocks_used = 0;
    }

    /// Numbers the next cluster. Call after [`reset_cluster`](Self::reset_cluster).
    pub(crate) fn open_cluster(&mut self) {
        self.cluster.id = ClusterId::from_index(self.num_clusters);
        self.num_clusters += 1;
    }

    /// Counts one more pin of `net` in the cluster.
    ///
    /// On the net's first pin, every unclustered block on it gains a shared
    /// net. With [`GainFlag::Gain`] the connection or length gains are
    /// updated as well.
    pub(crate) fn mark_and_update_partial_gain(
        &mut self,
        net: NetId,
        flag: GainFlag,
        block: BlockId,
        pin: usize,
    ) {
        if flag == GainFlag::Gain {
            if self.nets.pins_in_cluster(net) == 0 {
                let counts_as_input = !self.netlist.is_clock(net);
                let n = self.netlist.net(net);
                for &other in &n.pins[n.first_distinct_pin()..] {
                    if self.netlist.is_unclustered(other) {
                        self.gains
                            .touch(other, self.ext_inputs[other.index()], counts_as_input);
                    }
                }
            }
            if self.options.connection_driven {
                self.update_connection_gain(net, pin);
            } else if self.options.timing_driven {
                self.update_length_gain(net, block, pin);
            }
        }
        self.nets.add_pin(net);
    }

    fn update_connection_gain(&mut self, net: NetId, pin: usize) {
        if self.netlist.is_clock(net) {
            return;
        }
        let n = self.netlist.net(net);
        if pin == 0 {
            for &receiver in n.receivers() {
                if self.netlist.is_unclustered(receiver) {
                    self.gains.add_connection(receiver);
                }
            }
        } else if let Some(driver) = n.driver() {
            if self.netlist.is_unclustered(driver) {
                self.gains.add_connection(driver);
            }
        }
    }

    /// Raises length gains along `net` from the criticality of the
    /// connections between `block` and its unclustered neighbours.
    fn update_length_gain(&mut self, net: NetId, block: BlockId, pin: usize) {
        let Some(timing) = &self.timing else {
            return;
        };
        if self.netlist.is_clock(net) {
            return;
        }
        let n = self.netlist.net(net);
        if pin == 0 {
            for pos in n.first_distinct_pin()..n.num_pins() {
                let receiver = n.pins[pos];
                if self.netlist.is_unclustered(receiver) {
                    self.gains
                        .raise_length(receiver, timing.backward_criticality(net, pos));
                }
            }
        } else if let (Some(driver), Some(pos)) = (n.driver(), timing.net_pin_index(block, pin)) {
            if self.netlist.is_unclustered(driver) {
                self.gains
                    .raise_length(driver, timing.forward_criticality(net, pos));
            }
        }
    }

    /// Re-derives every marked block's length gain after a timing update.
    pub(crate) fn recompute_length_gain_values(&mut self) {
        self.gains.clear_length();
        let global_clocks = self.options.global_clocks;
        for i in 0..self.cluster.blocks.len() {
            let block = self.cluster.blocks[i];
            if let Some(out) = self.netlist.block(block).output() {
                if !(self.netlist.is_clock(out) && global_clocks) {
                    self.update_length_gain(out, block, 0);
                }
            }
            for pin in 1..=self.options.lut_size {
                if let Some(net) = self.netlist.block(block).pins[pin] {
                    self.update_length_gain(net, block, pin);
                }
            }
        }
        self.gains.refresh_totals(self.gain_mode);
    }

    /// Packs `block` into the open cluster and updates pin usage and gains.
    pub(crate) fn add_to_cluster(&mut self, block: BlockId) {
        self.netlist
            .set_cluster(block, ClusterAssignment::Cluster(self.cluster.id));
        self.cluster.blocks.push(block);
        let global_clocks = self.options.global_clocks;

        if let Some(out) = self.netlist.block(block).output() {
            let is_clock = self.netlist.is_clock(out);
            let flag = if is_clock && global_clocks {
                GainFlag::NoGain
            } else {
                GainFlag::Gain
            };
            self.mark_and_update_partial_gain(out, flag, block, 0);
            self.nets.set_output_in_cluster(out);
            // The net was an input of the cluster until now.
            if self.nets.pins_in_cluster(out) > 1 && !is_clock {
                self.cluster.inputs_used -= 1;
            }
        }

        for pin in 1..=self.options.lut_size {
            if let Some(net) = self.netlist.block(block).pins[pin] {
                self.mark_and_update_partial_gain(net, GainFlag::Gain, block, pin);
                if self.nets.pins_in_cluster(net) == 1 {
                    self.cluster.inputs_used += 1;
                }
            }
        }

        let clock_pin = self.netlist.block(block).clock_pin();
        if let Some(clock) = self.netlist.block(block).clock() {
            let flag = if global_clocks {
                GainFlag::NoGain
            } else {
                GainFlag::Gain
            };
            self.mark_and_update_partial_gain(clock, flag, block, clock_pin);
            let count = self.nets.pins_in_cluster(clock);
            if count == 1 || (count == 2 && self.nets.output_in_cluster(clock)) {
                self.cluster.clocks_used += 1;
            }
        }

        self.gains.refresh_totals(self.gain_mode);
    }

    /// Best unclustered marked block that fits the given budgets.
    ///
    /// While few blocks are marked only the marked list is scanned; otherwise
    /// every block is. Both paths consider marked blocks only, so they agree.
    pub(crate) fn highest_gain_block(
        &self,
        inputs_avail: i32,
        clocks_avail: i32,
        ranking: Ranking,
    ) -> Option<BlockId> {
        let netlist: &Netlist = &*self.netlist;
        let mut best: Option<(BlockId, f32)> = None;
        let mut consider = |block: BlockId| {
            if !netlist.is_unclustered(block) {
                return;
            }
            let Some(gain) = self.gains.get(block) else {
                return;
            };
            let value = match ranking {
                Ranking::Total => gain.total,
                Ranking::Hill => gain.hill as f32,
            };
            if best.is_some_and(|(_, best_value)| value <= best_value) {
                return;
            }
            let candidate = netlist.block(block);
            let feasible = match ranking {
                Ranking::Total => self.nets.inputs_and_clocks_feasible(
                    netlist,
                    candidate,
                    inputs_avail,
                    clocks_avail,
                ),
                Ranking::Hill => self.nets.clocks_feasible(candidate, clocks_avail),
            };
            if feasible {
                best = Some((block, value));
            }
        };

        if self.gains.marked().len() < netlist.num_blocks() / MARKED_FRAC {
            for &block in self.gains.marked() {
                consider(block);
            }
        } else {
            for block in netlist.block_ids() {
                consider(block);
            }
        }
        best.map(|(block, _)| block)
    }

    /// Next block for the open cluster, or `None` once it is full or nothing
    /// fits.
    pub(crate) fn lut_for_cluster(&mut self) -> Option<BlockId> {
        if self.is_full() {
            return None;
        }
        let inputs_avail = self.inputs_avail();
        let clocks_avail = self.clocks_avail();
        match self.highest_gain_block(inputs_avail, clocks_avail, Ranking::Total) {
            Some(block) => Some(block),
            None if self.latches.allow_unrelated() => {
                self.free_block_with_most_ext_inputs(inputs_avail, clocks_avail)
            }
            None => None,
        }
    }

    /// Unclustered block with the most external inputs that fits in
    /// `inputs_avail` inputs and `clocks_avail` clocks.
    pub(crate) fn free_block_with_most_ext_inputs(
        &mut self,
        inputs_avail: i32,
        clocks_avail: i32,
    ) -> Option<BlockId> {
        if inputs_avail < 0 {
            return None;
        }
        let start = (inputs_avail as usize).min(self.free.max_ext_inputs());
        let netlist: &Netlist = &*self.netlist;
        let nets = &self.nets;
        (0..=start).rev().find_map(|ext| {
            self.free.find(
                ext,
                RemovalPolicy::Remove,
                |b| netlist.is_unclustered(b),
                |b| nets.clocks_feasible(netlist.block(b), clocks_avail),
            )
        })
    }

    /// Unclustered block with the fewest external inputs that fits in
    /// `clocks_avail` clocks. Clustered entries are left in place.
    pub(crate) fn free_block_with_fewest_ext_inputs(&mut self, clocks_avail: i32) -> Option<BlockId> {
        let netlist: &Netlist = &*self.netlist;
        let nets = &self.nets;
        (0..=self.free.max_ext_inputs()).find_map(|ext| {
            self.free.find(
                ext,
                RemovalPolicy::Leave,
                |b| netlist.is_unclustered(b),
                |b| nets.clocks_feasible(netlist.block(b), clocks_avail),
            )
        })
    }
}
