//! Hill climbing: fill a cluster past its input budget, then roll back.
//!
//! Blocks are added even when they temporarily push the cluster over its
//! input budget, in the hope that later blocks absorb enough nets to bring it
//! back. Each addition records the inputs left afterwards; at the end the
//! additions are undone from the newest until the cluster is within budget.

use crate::engine::{Clusterer, GainFlag, Ranking};
use clbpack_common::BlockId;
use clbpack_netlist::ClusterAssignment;

/// One hill-climbing addition and the inputs left after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UndoRecord {
    /// The block added.
    pub block: BlockId,
    /// Input pins left once it was in; negative while over budget.
    pub inputs_avail: i32,
}

impl Clusterer<'_> {
    /// Tries to fill the open cluster and returns how many blocks stayed.
    pub(crate) fn hill_climb(&mut self) -> usize {
        if self.is_full() {
            return 0;
        }
        let cluster_size = self.options.cluster_size as i32;
        let mut inputs_avail = self.inputs_avail();
        let mut clocks_avail = self.clocks_avail();
        self.undo.clear();

        while !self.is_full() {
            let Some(block) = self.most_feasible_block(inputs_avail, clocks_avail) else {
                break;
            };
            inputs_avail += self.hill_gain(block);
            self.undo.push(UndoRecord {
                block,
                inputs_avail,
            });
            clocks_avail = self.hill_climbing_add_to_cluster(block, clocks_avail);

            // Even a full cluster of zero-cost blocks can't recover.
            let used = self.cluster.blocks.len() as i32;
            if inputs_avail + cluster_size - used < 0 {
                break;
            }
        }

        while let Some(record) = self.undo.last().copied() {
            if record.inputs_avail >= 0 {
                break;
            }
            self.undo.pop();
            self.cluster.blocks.pop();
            self.netlist
                .set_cluster(record.block, ClusterAssignment::Unclustered);
        }
        self.undo.len()
    }

    /// Change in free inputs from adding `block`. Blocks sharing nothing with
    /// the cluster bring in all their external inputs.
    fn hill_gain(&self, block: BlockId) -> i32 {
        match self.gains.get(block) {
            Some(gain) => gain.hill,
            None => -(self.ext_inputs[block.index()] as i32),
        }
    }

    /// Picks between the best-connected block and the block with the fewest
    /// external inputs, preferring the connected one unless it costs more.
    fn most_feasible_block(&mut self, inputs_avail: i32, clocks_avail: i32) -> Option<BlockId> {
        let connected = self.highest_gain_block(inputs_avail, clocks_avail, Ranking::Hill);
        let lowest = self.free_block_with_fewest_ext_inputs(clocks_avail);
        match (connected, lowest) {
            (Some(connected), Some(lowest)) => {
                if self.hill_gain(connected) >= -(self.ext_inputs[lowest.index()] as i32) {
                    Some(connected)
                } else {
                    Some(lowest)
                }
            }
            (connected, lowest) => connected.or(lowest),
        }
    }

    /// Adds `block` without touching the input count and returns the clocks
    /// left.
    fn hill_climbing_add_to_cluster(&mut self, block: BlockId, clocks_avail: i32) -> i32 {
        self.netlist
            .set_cluster(block, ClusterAssignment::Cluster(self.cluster.id));
        self.cluster.blocks.push(block);

        if let Some(out) = self.netlist.block(block).output() {
            let flag = if self.netlist.is_clock(out) {
                GainFlag::NoGain
            } else {
                GainFlag::Gain
            };
            self.mark_and_update_partial_gain(out, flag, block, 0);
            self.nets.set_output_in_cluster(out);
        }
        for pin in 1..=self.options.lut_size {
            if let Some(net) = self.netlist.block(block).pins[pin] {
                self.mark_and_update_partial_gain(net, GainFlag::Gain, block, pin);
            }
        }

        let mut clocks_avail = clocks_avail;
        let clock_pin = self.netlist.block(block).clock_pin();
        if let Some(clock) = self.netlist.block(block).clock() {
            self.mark_and_update_partial_gain(clock, GainFlag::NoGain, block, clock_pin);
            let count = self.nets.pins_in_cluster(clock);
            if count == 1 || (count == 2 && self.nets.output_in_cluster(clock)) {
                clocks_avail -= 1;
            }
        }
        clocks_avail
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{area_options, build, id};
    use clbpack_diagnostics::DiagnosticSink;

    /// `t` overshoots the input budget by one; `u` then absorbs `w` and
    /// brings nothing new, because its inputs are `t`'s output and `a`.
    const LOOP: &str = r#"{"blocks": [
        {"name": "a", "kind": "inpad", "output": "a"},
        {"name": "b", "kind": "inpad", "output": "b"},
        {"name": "c", "kind": "inpad", "output": "c"},
        {"name": "d", "kind": "inpad", "output": "d"},
        {"name": "clk", "kind": "inpad", "output": "clk"},
        {"name": "s", "kind": "lut", "output": "x", "inputs": ["a", "b", "c", "d"]},
        {"name": "t", "kind": "lut_and_latch", "output": "y", "inputs": ["x", "w"], "clock": "clk"},
        {"name": "u", "kind": "lut", "output": "w", "inputs": ["y", "a"]},
        {"name": "oy", "kind": "outpad", "inputs": ["y"]}
    ]}"#;

    fn grow(clusterer: &mut Clusterer<'_>, seed: BlockId) {
        clusterer.reset_cluster();
        clusterer.open_cluster();
        clusterer.add_to_cluster(seed);
        while let Some(block) = clusterer.lut_for_cluster() {
            clusterer.add_to_cluster(block);
        }
    }

    #[test]
    fn climbs_through_an_overfull_cluster() {
        let mut nl = build(LOOP, 4);
        let (s, t, u) = (id(&nl, "s"), id(&nl, "t"), id(&nl, "u"));
        let sink = DiagnosticSink::new();
        let mut clusterer = Clusterer::new(&mut nl, &area_options(3, 4), &sink).unwrap();

        grow(&mut clusterer, s);
        // Neither t nor u fits on its own.
        assert_eq!(clusterer.cluster.blocks, vec![s]);
        assert_eq!(clusterer.inputs_avail(), 0);

        assert_eq!(clusterer.hill_climb(), 2);
        assert_eq!(clusterer.cluster.blocks, vec![s, t, u]);
        assert_eq!(
            clusterer.undo,
            vec![
                UndoRecord {
                    block: t,
                    inputs_avail: -1
                },
                UndoRecord {
                    block: u,
                    inputs_avail: 0
                },
            ]
        );
        assert!(!clusterer.netlist.is_unclustered(u));
    }

    #[test]
    fn rolls_back_what_never_recovers() {
        let mut nl = build(LOOP, 4);
        let (s, t) = (id(&nl, "s"), id(&nl, "t"));
        let sink = DiagnosticSink::new();
        let mut clusterer = Clusterer::new(&mut nl, &area_options(2, 4), &sink).unwrap();

        grow(&mut clusterer, s);
        // t fills the last slot at one input over budget.
        assert_eq!(clusterer.hill_climb(), 0);
        assert_eq!(clusterer.cluster.blocks, vec![s]);
        assert!(clusterer.undo.is_empty());
        assert!(clusterer.netlist.is_unclustered(t));
    }

    #[test]
    fn full_cluster_is_left_alone() {
        let mut nl = build(LOOP, 4);
        let s = id(&nl, "s");
        let sink = DiagnosticSink::new();
        let mut clusterer = Clusterer::new(&mut nl, &area_options(1, 4), &sink).unwrap();
        grow(&mut clusterer, s);
        assert_eq!(clusterer.hill_climb(), 0);
        assert_eq!(clusterer.cluster.blocks, vec![s]);
    }

    #[test]
    fn unconnected_blocks_cost_their_inputs() {
        let mut nl = build(LOOP, 4);
        let (s, t) = (id(&nl, "s"), id(&nl, "t"));
        let sink = DiagnosticSink::new();
        let mut clusterer = Clusterer::new(&mut nl, &area_options(3, 4), &sink).unwrap();
        assert_eq!(clusterer.hill_gain(t), -2);
        grow(&mut clusterer, s);
        assert_eq!(clusterer.hill_gain(t), -1);
    }
}
