//! The timing analyzer: per-block and per-connection timing state.
//!
//! All arrays are sized once in [`TimingAnalyzer::new`] from the netlist's
//! block and net counts. Each [`recompute`](TimingAnalyzer::recompute)
//! restores the transient state from the recorded source and sink sets and
//! re-derives everything from the netlist's current cluster assignments.

use crate::error::TimingError;
use clbpack_common::{BlockId, NetId};
use clbpack_netlist::{BlockKind, Netlist};
use serde::Serialize;

/// Delays used to time connections and blocks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DelayModel {
    /// Delay through any logic block.
    pub block_delay: f32,
    /// Delay of a connection between two blocks of the same cluster.
    pub intra_cluster_net_delay: f32,
    /// Delay of every other connection.
    pub inter_cluster_net_delay: f32,
}

impl DelayModel {
    /// Creates a delay model.
    pub fn new(block_delay: f32, intra_cluster_net_delay: f32, inter_cluster_net_delay: f32) -> Self {
        Self {
            block_delay,
            intra_cluster_net_delay,
            inter_cluster_net_delay,
        }
    }
}

impl Default for DelayModel {
    fn default() -> Self {
        Self::new(0.1, 0.1, 1.0)
    }
}

/// Headline numbers from the most recent analysis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TimingSummary {
    /// Largest arrival time at any pin.
    pub max_arrival_time: f32,
    /// Smallest connection slack.
    pub min_slack: f32,
    /// Largest connection slack.
    pub max_slack: f32,
    /// Number of connections whose slack ties the minimum.
    pub critical_connections: usize,
    /// Block where the longest path ends.
    pub farthest_block: Option<BlockId>,
    /// Mean distance from source over the initial sinks.
    pub avg_sink_distance: f32,
    /// Mean delay of one timed connection, block delay included.
    pub avg_connection_delay: f32,
}

/// Timing state of one block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct BlockTiming {
    pub delay_from_source: f32,
    pub required_arrival_time: f32,
    pub num_max_inputs: u64,
    pub num_max_outputs: u64,
}

/// Timing state of every pin of one net, parallel to the net's pin list.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct NetTiming {
    pub arrival_time: Vec<f32>,
    pub slack: Vec<f32>,
    pub forward_criticality: Vec<f32>,
    pub backward_criticality: Vec<f32>,
}

impl NetTiming {
    fn new(num_pins: usize) -> Self {
        Self {
            arrival_time: vec![0.0; num_pins],
            slack: vec![-1.0; num_pins],
            forward_criticality: vec![-1.0; num_pins],
            backward_criticality: vec![-1.0; num_pins],
        }
    }
}

/// Timing and criticality engine for one netlist.
///
/// The analyzer never holds the netlist; every call that needs it takes a
/// shared borrow so the clusterer can keep mutating cluster assignments
/// between analyses.
#[derive(Debug, Clone)]
pub struct TimingAnalyzer {
    pub(crate) lut_size: usize,
    pub(crate) num_nets: usize,
    /// `[block][block pin 0..=K]` position of that pin in its net.
    pub(crate) net_pin_index: Vec<Vec<Option<usize>>>,
    pub(crate) in_count: Vec<usize>,
    pub(crate) out_count: Vec<usize>,
    pub(crate) in_remaining: Vec<usize>,
    pub(crate) out_remaining: Vec<usize>,
    pub(crate) initial_sources: Vec<BlockId>,
    pub(crate) initial_sinks: Vec<BlockId>,
    pub(crate) is_initial_source: Vec<bool>,
    pub(crate) is_initial_sink: Vec<bool>,
    pub(crate) in_distance_queue: Vec<bool>,
    pub(crate) in_required_queue: Vec<bool>,
    pub(crate) queue: Vec<BlockId>,
    pub(crate) blocks: Vec<BlockTiming>,
    pub(crate) nets: Vec<NetTiming>,
    pub(crate) criticality: Vec<f32>,
    pub(crate) tie_breaker: Vec<f32>,
    pub(crate) crit_order: Vec<BlockId>,
    pub(crate) cursor: usize,
    pub(crate) summary: TimingSummary,
}

impl TimingAnalyzer {
    /// Allocates the timing state for `netlist` and classifies its sources
    /// and sinks.
    ///
    /// Fails if `lut_size` differs from the netlist's LUT width.
    pub fn new(netlist: &Netlist, lut_size: usize) -> Result<Self, TimingError> {
        if netlist.lut_size != lut_size {
            return Err(TimingError::LutSizeMismatch {
                expected: lut_size,
                found: netlist.lut_size,
            });
        }

        let num_blocks = netlist.num_blocks();
        let mut analyzer = Self {
            lut_size,
            num_nets: netlist.num_nets(),
            net_pin_index: vec![vec![None; lut_size + 1]; num_blocks],
            in_count: vec![0; num_blocks],
            out_count: vec![0; num_blocks],
            in_remaining: vec![0; num_blocks],
            out_remaining: vec![0; num_blocks],
            initial_sources: Vec::new(),
            initial_sinks: Vec::new(),
            is_initial_source: vec![false; num_blocks],
            is_initial_sink: vec![false; num_blocks],
            in_distance_queue: vec![false; num_blocks],
            in_required_queue: vec![false; num_blocks],
            queue: Vec::with_capacity(num_blocks),
            blocks: vec![
                BlockTiming {
                    delay_from_source: -1.0,
                    required_arrival_time: crate::sweep::MAX_ALLOWED_PATH_LEN,
                    num_max_inputs: 1,
                    num_max_outputs: 1,
                };
                num_blocks
            ],
            nets: netlist
                .nets
                .iter()
                .map(|n| NetTiming::new(n.num_pins()))
                .collect(),
            criticality: vec![-1.0; num_blocks],
            tie_breaker: vec![0.0; num_blocks],
            crit_order: netlist.block_ids().collect(),
            cursor: 0,
            summary: TimingSummary::default(),
        };
        analyzer.load_net_pin_index(netlist);
        analyzer.classify_sources_and_sinks(netlist);
        analyzer.count_inputs_and_outputs(netlist);
        Ok(analyzer)
    }

    fn load_net_pin_index(&mut self, netlist: &Netlist) {
        for net_id in netlist.net_ids() {
            let net = netlist.net(net_id);
            for (pos, &blk) in net.pins.iter().enumerate() {
                let block = netlist.block(blk);
                let index = &mut self.net_pin_index[blk.index()];
                match block.kind {
                    BlockKind::InPad => index[0] = Some(0),
                    BlockKind::OutPad => index[0] = Some(pos),
                    _ if pos == 0 => index[0] = Some(0),
                    _ => {
                        for pin in 1..=self.lut_size {
                            if block.pins[pin] == Some(net_id) {
                                index[pin] = Some(pos);
                            }
                        }
                    }
                }
            }
        }
    }

    fn classify_sources_and_sinks(&mut self, netlist: &Netlist) {
        for id in netlist.block_ids() {
            let block = netlist.block(id);
            let is_source = match block.kind {
                BlockKind::InPad | BlockKind::Latch | BlockKind::LutAndLatch => true,
                // A block whose only connection is its output is a constant
                // generator.
                BlockKind::OutPad => false,
                _ => block.num_nets() == 1,
            };
            if is_source {
                self.initial_sources.push(id);
                self.is_initial_source[id.index()] = true;
            }

            let output_is_clock = block.output().is_some_and(|n| netlist.is_clock(n));
            let is_sink = match block.kind {
                BlockKind::OutPad | BlockKind::Latch | BlockKind::LutAndLatch => true,
                BlockKind::InPad => false,
                _ => output_is_clock,
            };
            if is_sink {
                self.initial_sinks.push(id);
                self.is_initial_sink[id.index()] = true;
            }
        }
    }

    fn count_inputs_and_outputs(&mut self, netlist: &Netlist) {
        for id in netlist.block_ids() {
            let block = netlist.block(id);
            let connected = block.num_nets();
            self.in_count[id.index()] = match block.kind {
                BlockKind::OutPad => 1,
                BlockKind::InPad | BlockKind::Empty => 0,
                BlockKind::Lut => connected.saturating_sub(1),
                BlockKind::Latch | BlockKind::LutAndLatch => connected.saturating_sub(2),
            };

            self.out_count[id.index()] = match (block.kind, block.output()) {
                (BlockKind::OutPad, _) | (_, None) => 0,
                (_, Some(net)) if netlist.is_clock(net) => 0,
                (BlockKind::InPad, _) => 1,
                (_, Some(net)) => netlist.net(net).num_pins().saturating_sub(1),
            };
        }
    }

    pub(crate) fn check_shape(&self, netlist: &Netlist) -> Result<(), TimingError> {
        if netlist.num_blocks() != self.blocks.len() || netlist.num_nets() != self.num_nets {
            return Err(TimingError::NetlistChanged {
                expected: self.blocks.len(),
                found: netlist.num_blocks(),
                expected_nets: self.num_nets,
                found_nets: netlist.num_nets(),
            });
        }
        Ok(())
    }

    /// Runs a full analysis against the current packing and returns the block
    /// where the longest path ends (`None` for an empty netlist).
    ///
    /// Also re-sorts the criticality ranking and rewinds the seed cursor.
    pub fn recompute(
        &mut self,
        netlist: &Netlist,
        delays: &DelayModel,
    ) -> Result<Option<BlockId>, TimingError> {
        self.check_shape(netlist)?;
        self.reset();
        let forward = self.distance_from_sources(netlist, delays);
        self.assign_required_arrival_times(forward.max_arrival_time);
        let biggest_num_max_outputs = self.update_required_arrival_times(netlist, delays);
        self.calculate_slack_and_criticality(
            netlist,
            forward.max_arrival_time,
            forward
                .biggest_num_max_inputs
                .saturating_add(biggest_num_max_outputs),
        );
        self.sort_blocks_by_criticality();

        self.summary.max_arrival_time = forward.max_arrival_time;
        self.summary.farthest_block = forward.farthest_block;
        self.summary.avg_sink_distance = forward.avg_sink_distance;
        self.summary.avg_connection_delay = forward.avg_connection_delay;
        Ok(forward.farthest_block)
    }

    fn reset(&mut self) {
        self.in_remaining.copy_from_slice(&self.in_count);
        self.out_remaining.copy_from_slice(&self.out_count);
        self.in_distance_queue.copy_from_slice(&self.is_initial_source);
        self.in_required_queue.copy_from_slice(&self.is_initial_sink);
        for timing in &mut self.blocks {
            timing.delay_from_source = 0.0;
            timing.num_max_inputs = 1;
            timing.num_max_outputs = 1;
        }
        for net in &mut self.nets {
            net.arrival_time.fill(0.0);
        }
        self.criticality.fill(-1.0);
    }

    /// Returns the most critical block that is still unclustered, advancing
    /// past it. Returns `None` once the ranking is exhausted.
    pub fn most_critical_unclustered_block(&mut self, netlist: &Netlist) -> Option<BlockId> {
        while self.cursor < self.crit_order.len() {
            let block = self.crit_order[self.cursor];
            self.cursor += 1;
            if netlist.is_unclustered(block) {
                return Some(block);
            }
        }
        None
    }

    /// Position of a block pin (`0..=K`) within its net's pin list.
    pub fn net_pin_index(&self, block: BlockId, pin: usize) -> Option<usize> {
        self.net_pin_index[block.index()].get(pin).copied().flatten()
    }

    /// Criticality of a connection, tie-broken by the block driving it.
    pub fn forward_criticality(&self, net: NetId, pin: usize) -> f32 {
        self.nets[net.index()].forward_criticality[pin]
    }

    /// Criticality of a connection, tie-broken by the block it drives.
    pub fn backward_criticality(&self, net: NetId, pin: usize) -> f32 {
        self.nets[net.index()].backward_criticality[pin]
    }

    /// Slack of a connection.
    pub fn slack(&self, net: NetId, pin: usize) -> f32 {
        self.nets[net.index()].slack[pin]
    }

    /// Arrival time at a net pin.
    pub fn arrival_time(&self, net: NetId, pin: usize) -> f32 {
        self.nets[net.index()].arrival_time[pin]
    }

    /// Latest arrival time at any input of the block.
    pub fn delay_from_source(&self, block: BlockId) -> f32 {
        self.blocks[block.index()].delay_from_source
    }

    /// Latest time a signal may arrive at the block's inputs.
    pub fn required_arrival_time(&self, block: BlockId) -> f32 {
        self.blocks[block.index()].required_arrival_time
    }

    /// Number of maximum-length paths reaching the block's inputs.
    pub fn num_max_inputs(&self, block: BlockId) -> u64 {
        self.blocks[block.index()].num_max_inputs
    }

    /// Number of minimum-required-time paths leaving the block.
    pub fn num_max_outputs(&self, block: BlockId) -> u64 {
        self.blocks[block.index()].num_max_outputs
    }

    /// Criticality of an unclustered block, or `-1.0`.
    pub fn criticality(&self, block: BlockId) -> f32 {
        self.criticality[block.index()]
    }

    /// Whether the block starts timing paths.
    pub fn is_initial_source(&self, block: BlockId) -> bool {
        self.is_initial_source[block.index()]
    }

    /// Whether the block ends timing paths.
    pub fn is_initial_sink(&self, block: BlockId) -> bool {
        self.is_initial_sink[block.index()]
    }

    /// Results of the last [`recompute`](Self::recompute).
    pub fn summary(&self) -> &TimingSummary {
        &self.summary
    }

    /// The LUT width the analyzer was built for.
    pub fn lut_size(&self) -> usize {
        self.lut_size
    }
}
