//! Net usage by the open cluster and the pin-budget feasibility checks.

use clbpack_common::NetId;
use clbpack_netlist::{Block, Netlist};

/// How many pins of each net lie inside the open cluster.
#[derive(Debug, Clone)]
pub struct NetOccupancy {
    pins_in_cluster: Vec<u32>,
    output_in_cluster: Vec<bool>,
    marked: Vec<NetId>,
}

impl NetOccupancy {
    /// Creates an empty occupancy table.
    pub fn new(num_nets: usize) -> Self {
        Self {
            pins_in_cluster: vec![0; num_nets],
            output_in_cluster: vec![false; num_nets],
            marked: Vec::new(),
        }
    }

    /// Pins of `net` inside the open cluster.
    pub fn pins_in_cluster(&self, net: NetId) -> u32 {
        self.pins_in_cluster[net.index()]
    }

    /// Whether the driver of `net` is inside the open cluster.
    pub fn output_in_cluster(&self, net: NetId) -> bool {
        self.output_in_cluster[net.index()]
    }

    /// Nets touched since the last reset.
    pub fn marked(&self) -> &[NetId] {
        &self.marked
    }

    /// Counts one more pin of `net` inside the cluster and returns the new
    /// count. The first pin marks the net.
    pub fn add_pin(&mut self, net: NetId) -> u32 {
        let count = &mut self.pins_in_cluster[net.index()];
        if *count == 0 {
            self.marked.push(net);
        }
        *count += 1;
        *count
    }

    /// Records that the driver of `net` joined the cluster.
    pub fn set_output_in_cluster(&mut self, net: NetId) {
        self.output_in_cluster[net.index()] = true;
    }

    /// Clears every touched net in `O(marked)`.
    pub fn reset(&mut self) {
        for net in self.marked.drain(..) {
            self.pins_in_cluster[net.index()] = 0;
            self.output_in_cluster[net.index()] = false;
        }
    }

    /// Whether adding `block` keeps the cluster within `clocks_avail` clocks.
    ///
    /// The clock costs nothing if a block of the cluster already uses it as a
    /// clock, but it does cost a pin if its only presence is the cluster
    /// driving it.
    pub fn clocks_feasible(&self, block: &Block, clocks_avail: i32) -> bool {
        let mut avail = clocks_avail;
        if let Some(clock) = block.clock() {
            let count = self.pins_in_cluster(clock);
            if count == 0 || (count == 1 && self.output_in_cluster(clock)) {
                avail -= 1;
            }
        }
        avail >= 0
    }

    /// Whether adding `block` keeps the cluster within both pin budgets.
    ///
    /// A block whose output already feeds the cluster frees the input pin
    /// that net used. Every input net new to the cluster costs one, unless it
    /// is the block's own output.
    pub fn inputs_and_clocks_feasible(
        &self,
        netlist: &Netlist,
        block: &Block,
        inputs_avail: i32,
        clocks_avail: i32,
    ) -> bool {
        let mut avail = inputs_avail;
        let output = block.output();
        if let Some(out) = output {
            if self.pins_in_cluster(out) != 0 && !netlist.is_clock(out) {
                avail += 1;
            }
        }
        for net in block.input_pins().iter().flatten() {
            if self.pins_in_cluster(*net) == 0 && Some(*net) != output {
                avail -= 1;
            }
        }
        self.clocks_feasible(block, clocks_avail) && avail >= 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(json: &str) -> Netlist {
        crate::tests::build(json, 4)
    }

    const CHAIN: &str = r#"{"blocks": [
        {"name": "a", "kind": "inpad", "output": "a"},
        {"name": "b", "kind": "inpad", "output": "b"},
        {"name": "clk", "kind": "inpad", "output": "clk"},
        {"name": "g", "kind": "lut", "output": "x", "inputs": ["a", "b"]},
        {"name": "h", "kind": "lut_and_latch", "output": "y", "inputs": ["x", "b", "y"], "clock": "clk"},
        {"name": "oy", "kind": "outpad", "inputs": ["y"]}
    ]}"#;

    fn net(nl: &Netlist, name: &str) -> NetId {
        nl.net_by_name(name).unwrap()
    }

    fn block<'a>(nl: &'a Netlist, name: &str) -> &'a Block {
        nl.block(nl.block_by_name(name).unwrap())
    }

    #[test]
    fn add_and_reset() {
        let nl = build(CHAIN);
        let mut occ = NetOccupancy::new(nl.num_nets());
        assert_eq!(occ.add_pin(net(&nl, "x")), 1);
        assert_eq!(occ.add_pin(net(&nl, "x")), 2);
        occ.set_output_in_cluster(net(&nl, "x"));
        assert_eq!(occ.marked(), &[net(&nl, "x")]);
        occ.reset();
        assert_eq!(occ.pins_in_cluster(net(&nl, "x")), 0);
        assert!(!occ.output_in_cluster(net(&nl, "x")));
        assert!(occ.marked().is_empty());
    }

    // -- Feasibility tests --

    #[test]
    fn empty_cluster_costs_every_ext_input() {
        let nl = build(CHAIN);
        let occ = NetOccupancy::new(nl.num_nets());
        let h = block(&nl, "h");
        // x and b cost a pin each; the feedback y is free.
        assert!(occ.inputs_and_clocks_feasible(&nl, h, 2, 1));
        assert!(!occ.inputs_and_clocks_feasible(&nl, h, 1, 1));
        assert!(!occ.inputs_and_clocks_feasible(&nl, h, 2, 0));
    }

    #[test]
    fn shared_nets_are_free() {
        let nl = build(CHAIN);
        let mut occ = NetOccupancy::new(nl.num_nets());
        // g is in the cluster: a and b are inputs, x is its output.
        occ.add_pin(net(&nl, "a"));
        occ.add_pin(net(&nl, "b"));
        occ.add_pin(net(&nl, "x"));
        occ.set_output_in_cluster(net(&nl, "x"));
        let h = block(&nl, "h");
        assert!(occ.inputs_and_clocks_feasible(&nl, h, 0, 1));
    }

    #[test]
    fn absorbed_output_frees_a_pin() {
        let nl = build(CHAIN);
        let mut occ = NetOccupancy::new(nl.num_nets());
        // h is in the cluster: x is one of its inputs.
        occ.add_pin(net(&nl, "x"));
        occ.add_pin(net(&nl, "b"));
        let g = block(&nl, "g");
        // g brings in a (b is shared) and absorbs x.
        assert!(occ.inputs_and_clocks_feasible(&nl, g, 0, 1));
    }

    #[test]
    fn driven_clock_still_costs_a_pin() {
        let nl = build(CHAIN);
        let mut occ = NetOccupancy::new(nl.num_nets());
        let h = block(&nl, "h");
        let clk = net(&nl, "clk");
        occ.add_pin(clk);
        occ.set_output_in_cluster(clk);
        assert!(!occ.clocks_feasible(h, 0));
        occ.add_pin(clk);
        assert!(occ.clocks_feasible(h, 0));
    }
}
