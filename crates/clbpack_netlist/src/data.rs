//! Core netlist data structures.
//!
//! Defines blocks (with a fixed-width pin array), nets (driver plus
//! receivers) and the per-block cluster assignment. The [`Netlist`] is the
//! aggregate that flows from the builder through timing analysis and
//! clustering; only its `cluster_of_block` table changes during packing.

use clbpack_common::{BlockId, ClusterId, NetId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The kind of a netlist block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockKind {
    /// A K-input lookup table.
    #[serde(rename = "lut")]
    Lut,
    /// A flip-flop with one data input and a clock.
    #[serde(rename = "latch")]
    Latch,
    /// A LUT whose output feeds a flip-flop inside the same logic block.
    #[serde(rename = "lut_and_latch")]
    LutAndLatch,
    /// A primary input pad.
    #[serde(rename = "inpad")]
    InPad,
    /// A primary output pad.
    #[serde(rename = "outpad")]
    OutPad,
    /// A removed block awaiting compression.
    #[serde(rename = "empty")]
    Empty,
}

impl BlockKind {
    /// Returns whether blocks of this kind are packed into clusters.
    pub fn is_clusterable(self) -> bool {
        matches!(self, Self::Lut | Self::Latch | Self::LutAndLatch)
    }

    /// Returns whether this kind contains a flip-flop.
    pub fn is_sequential(self) -> bool {
        matches!(self, Self::Latch | Self::LutAndLatch)
    }

    /// Returns whether this is an I/O pad.
    pub fn is_pad(self) -> bool {
        matches!(self, Self::InPad | Self::OutPad)
    }
}

impl std::fmt::Display for BlockKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Lut => "lut",
            Self::Latch => "latch",
            Self::LutAndLatch => "lut_and_latch",
            Self::InPad => "inpad",
            Self::OutPad => "outpad",
            Self::Empty => "empty",
        };
        f.write_str(s)
    }
}

/// A netlist block with `lut_size + 2` pin slots.
///
/// Slot 0 is the output (an OUTPAD's sole input also lives there), slots
/// `1..=K` are data inputs and the last slot is the clock. Open slots are
/// `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Instance name.
    pub name: String,
    /// What the block is.
    pub kind: BlockKind,
    /// Net on each pin slot.
    pub pins: Vec<Option<NetId>>,
}

impl Block {
    /// Creates a block with all `lut_size + 2` pins open.
    pub fn new(name: impl Into<String>, kind: BlockKind, lut_size: usize) -> Self {
        Self {
            name: name.into(),
            kind,
            pins: vec![None; lut_size + 2],
        }
    }

    /// Returns the net on pin 0.
    pub fn output(&self) -> Option<NetId> {
        self.pins.first().copied().flatten()
    }

    /// Returns the data input slots `1..=K`.
    pub fn input_pins(&self) -> &[Option<NetId>] {
        let last = self.pins.len().saturating_sub(1);
        &self.pins[1.min(last)..last]
    }

    /// Returns the net on the clock slot.
    pub fn clock(&self) -> Option<NetId> {
        if self.pins.len() < 2 {
            return None;
        }
        self.pins.last().copied().flatten()
    }

    /// Returns the index of the clock slot.
    pub fn clock_pin(&self) -> usize {
        self.pins.len() - 1
    }

    /// Number of connected pins of any kind.
    pub fn num_nets(&self) -> usize {
        self.pins.iter().filter(|p| p.is_some()).count()
    }

    /// Number of connected data input pins.
    pub fn num_input_pins(&self) -> usize {
        self.input_pins().iter().filter(|p| p.is_some()).count()
    }

    /// Number of connected inputs that are not the block's own output net.
    pub fn num_ext_inputs(&self) -> usize {
        let output = self.output();
        self.input_pins()
            .iter()
            .filter(|p| p.is_some() && **p != output)
            .count()
    }

    /// Iterates over `(pin, net)` for every connected data input.
    pub fn connected_inputs(&self) -> impl Iterator<Item = (usize, NetId)> + '_ {
        self.input_pins()
            .iter()
            .enumerate()
            .filter_map(|(i, p)| p.map(|net| (i + 1, net)))
    }
}

/// A net: one driver at position 0 followed by its receivers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Net {
    /// Net name.
    pub name: String,
    /// Blocks on the net, driver first.
    pub pins: Vec<BlockId>,
    /// Whether the net reaches a flip-flop clock pin.
    pub is_clock: bool,
    /// Whether the driver also appears among the receivers.
    pub feeds_driver: bool,
}

impl Net {
    /// Creates a net from its pin list, driver first.
    pub fn new(name: impl Into<String>, pins: Vec<BlockId>) -> Self {
        let feeds_driver = match pins.split_first() {
            Some((driver, receivers)) => receivers.contains(driver),
            None => false,
        };
        Self {
            name: name.into(),
            pins,
            is_clock: false,
            feeds_driver,
        }
    }

    /// Returns the driving block.
    pub fn driver(&self) -> Option<BlockId> {
        self.pins.first().copied()
    }

    /// Returns the receiving blocks.
    pub fn receivers(&self) -> &[BlockId] {
        self.pins.get(1..).unwrap_or(&[])
    }

    /// Number of pins on the net, driver included.
    pub fn num_pins(&self) -> usize {
        self.pins.len()
    }

    /// First pin position to visit when walking blocks on the net without
    /// counting a self-feeding driver twice.
    pub fn first_distinct_pin(&self) -> usize {
        usize::from(self.feeds_driver)
    }
}

/// Where a block has been packed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClusterAssignment {
    /// Clusterable and not yet packed.
    Unclustered,
    /// Packed into the given cluster.
    Cluster(ClusterId),
    /// Never clustered (pads and removed blocks).
    Never,
}

impl ClusterAssignment {
    /// Returns the cluster, if any.
    pub fn cluster(self) -> Option<ClusterId> {
        match self {
            Self::Cluster(c) => Some(c),
            _ => None,
        }
    }

    /// Returns whether the block is still waiting to be packed.
    pub fn is_unclustered(self) -> bool {
        self == Self::Unclustered
    }
}

/// The netlist aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Netlist {
    /// Data inputs per LUT (K).
    pub lut_size: usize,
    /// All blocks.
    pub blocks: Vec<Block>,
    /// All nets.
    pub nets: Vec<Net>,
    /// Cluster assignment of each block, parallel to `blocks`.
    pub cluster_of_block: Vec<ClusterAssignment>,
    /// Auxiliary index: block name to ID (rebuilt on deserialization).
    #[serde(skip)]
    block_by_name: HashMap<String, BlockId>,
    /// Auxiliary index: net name to ID (rebuilt on deserialization).
    #[serde(skip)]
    net_by_name: HashMap<String, NetId>,
}

impl Netlist {
    /// Creates an empty netlist for LUTs of the given width.
    pub fn new(lut_size: usize) -> Self {
        Self {
            lut_size,
            blocks: Vec::new(),
            nets: Vec::new(),
            cluster_of_block: Vec::new(),
            block_by_name: HashMap::new(),
            net_by_name: HashMap::new(),
        }
    }

    /// Adds a block and returns its ID. Clusterable blocks start out
    /// unclustered; everything else is never clustered.
    pub fn add_block(&mut self, block: Block) -> BlockId {
        let id = BlockId::from_index(self.blocks.len());
        self.block_by_name.insert(block.name.clone(), id);
        self.cluster_of_block.push(if block.kind.is_clusterable() {
            ClusterAssignment::Unclustered
        } else {
            ClusterAssignment::Never
        });
        self.blocks.push(block);
        id
    }

    /// Adds a net and returns its ID.
    pub fn add_net(&mut self, net: Net) -> NetId {
        let id = NetId::from_index(self.nets.len());
        self.net_by_name.insert(net.name.clone(), id);
        self.nets.push(net);
        id
    }

    /// Returns the block with the given ID.
    pub fn block(&self, id: BlockId) -> &Block {
        &self.blocks[id.index()]
    }

    /// Returns a mutable reference to the block with the given ID.
    pub fn block_mut(&mut self, id: BlockId) -> &mut Block {
        &mut self.blocks[id.index()]
    }

    /// Returns the net with the given ID.
    pub fn net(&self, id: NetId) -> &Net {
        &self.nets[id.index()]
    }

    /// Returns a mutable reference to the net with the given ID.
    pub fn net_mut(&mut self, id: NetId) -> &mut Net {
        &mut self.nets[id.index()]
    }

    /// Returns the number of blocks.
    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }

    /// Returns the number of nets.
    pub fn num_nets(&self) -> usize {
        self.nets.len()
    }

    /// Iterates over all block IDs.
    pub fn block_ids(&self) -> impl Iterator<Item = BlockId> {
        (0..self.blocks.len()).map(BlockId::from_index)
    }

    /// Iterates over all net IDs.
    pub fn net_ids(&self) -> impl Iterator<Item = NetId> {
        (0..self.nets.len()).map(NetId::from_index)
    }

    /// Looks up a block by name.
    pub fn block_by_name(&self, name: &str) -> Option<BlockId> {
        self.block_by_name.get(name).copied()
    }

    /// Looks up a net by name.
    pub fn net_by_name(&self, name: &str) -> Option<NetId> {
        self.net_by_name.get(name).copied()
    }

    /// Returns where a block has been packed.
    pub fn cluster_of(&self, id: BlockId) -> ClusterAssignment {
        self.cluster_of_block[id.index()]
    }

    /// Records where a block has been packed.
    pub fn set_cluster(&mut self, id: BlockId, assignment: ClusterAssignment) {
        self.cluster_of_block[id.index()] = assignment;
    }

    /// Returns whether a block is still waiting to be packed.
    pub fn is_unclustered(&self, id: BlockId) -> bool {
        self.cluster_of_block[id.index()].is_unclustered()
    }

    /// Returns whether a net is a clock net.
    pub fn is_clock(&self, id: NetId) -> bool {
        self.nets[id.index()].is_clock
    }

    /// Number of blocks that are packed into clusters.
    pub fn num_clusterable(&self) -> usize {
        self.blocks.iter().filter(|b| b.kind.is_clusterable()).count()
    }

    /// Number of nets flagged as clocks.
    pub fn num_clock_nets(&self) -> usize {
        self.nets.iter().filter(|n| n.is_clock).count()
    }

    /// Returns every clusterable block to the unclustered state.
    pub fn clear_clustering(&mut self) {
        for (i, block) in self.blocks.iter().enumerate() {
            self.cluster_of_block[i] = if block.kind.is_clusterable() {
                ClusterAssignment::Unclustered
            } else {
                ClusterAssignment::Never
            };
        }
    }

    /// Removes [`BlockKind::Empty`] blocks and nets with no pins, renumbering
    /// the survivors and rewriting every reference to them.
    pub fn compress(&mut self) {
        let mut block_map: Vec<Option<BlockId>> = Vec::with_capacity(self.blocks.len());
        let mut next = 0;
        for block in &self.blocks {
            if block.kind == BlockKind::Empty {
                block_map.push(None);
            } else {
                block_map.push(Some(BlockId::from_index(next)));
                next += 1;
            }
        }

        let mut net_map: Vec<Option<NetId>> = Vec::with_capacity(self.nets.len());
        next = 0;
        for net in &self.nets {
            if net.pins.is_empty() {
                net_map.push(None);
            } else {
                net_map.push(Some(NetId::from_index(next)));
                next += 1;
            }
        }

        let blocks = std::mem::take(&mut self.blocks);
        let assignments = std::mem::take(&mut self.cluster_of_block);
        for ((mut block, assignment), mapped) in blocks.into_iter().zip(assignments).zip(&block_map)
        {
            if mapped.is_none() {
                continue;
            }
            for pin in &mut block.pins {
                *pin = pin.and_then(|n| net_map[n.index()]);
            }
            self.blocks.push(block);
            self.cluster_of_block.push(assignment);
        }

        let nets = std::mem::take(&mut self.nets);
        for (mut net, mapped) in nets.into_iter().zip(&net_map) {
            if mapped.is_none() {
                continue;
            }
            net.pins = net.pins.iter().filter_map(|b| block_map[b.index()]).collect();
            self.nets.push(net);
        }

        self.rebuild_indices();
    }

    /// Rebuilds auxiliary indices after deserialization or compression.
    pub fn rebuild_indices(&mut self) {
        self.block_by_name.clear();
        for (i, block) in self.blocks.iter().enumerate() {
            self.block_by_name
                .insert(block.name.clone(), BlockId::from_index(i));
        }
        self.net_by_name.clear();
        for (i, net) in self.nets.iter().enumerate() {
            self.net_by_name.insert(net.name.clone(), NetId::from_index(i));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b(i: usize) -> BlockId {
        BlockId::from_index(i)
    }

    fn n(i: usize) -> NetId {
        NetId::from_index(i)
    }

    // -- Block tests --

    #[test]
    fn block_pin_slots() {
        let mut lut = Block::new("l", BlockKind::Lut, 4);
        assert_eq!(lut.pins.len(), 6);
        lut.pins[0] = Some(n(0));
        lut.pins[1] = Some(n(1));
        lut.pins[3] = Some(n(2));
        assert_eq!(lut.output(), Some(n(0)));
        assert_eq!(lut.input_pins().len(), 4);
        assert_eq!(lut.clock(), None);
        assert_eq!(lut.clock_pin(), 5);
        assert_eq!(lut.num_nets(), 3);
        assert_eq!(lut.num_input_pins(), 2);
        let inputs: Vec<_> = lut.connected_inputs().collect();
        assert_eq!(inputs, vec![(1, n(1)), (3, n(2))]);
    }

    #[test]
    fn ext_inputs_exclude_own_output() {
        let mut lut = Block::new("l", BlockKind::Lut, 4);
        lut.pins[0] = Some(n(0));
        lut.pins[1] = Some(n(0));
        lut.pins[2] = Some(n(1));
        assert_eq!(lut.num_input_pins(), 2);
        assert_eq!(lut.num_ext_inputs(), 1);
    }

    #[test]
    fn latch_clock_slot() {
        let mut ff = Block::new("ff", BlockKind::Latch, 4);
        ff.pins[0] = Some(n(0));
        ff.pins[1] = Some(n(1));
        ff.pins[5] = Some(n(2));
        assert_eq!(ff.clock(), Some(n(2)));
        assert_eq!(ff.num_input_pins(), 1);
        assert_eq!(ff.num_nets(), 3);
    }

    #[test]
    fn kind_predicates() {
        assert!(BlockKind::Lut.is_clusterable());
        assert!(BlockKind::LutAndLatch.is_sequential());
        assert!(!BlockKind::InPad.is_clusterable());
        assert!(BlockKind::OutPad.is_pad());
        assert!(!BlockKind::Empty.is_pad());
        assert_eq!(BlockKind::LutAndLatch.to_string(), "lut_and_latch");
    }

    // -- Net tests --

    #[test]
    fn net_driver_and_receivers() {
        let net = Net::new("x", vec![b(0), b(1), b(2)]);
        assert_eq!(net.driver(), Some(b(0)));
        assert_eq!(net.receivers(), &[b(1), b(2)]);
        assert!(!net.feeds_driver);
        assert_eq!(net.first_distinct_pin(), 0);
    }

    #[test]
    fn self_feeding_net() {
        let net = Net::new("loop", vec![b(3), b(1), b(3)]);
        assert!(net.feeds_driver);
        assert_eq!(net.first_distinct_pin(), 1);
    }

    #[test]
    fn empty_net_has_no_driver() {
        let net = Net::new("dead", Vec::new());
        assert_eq!(net.driver(), None);
        assert!(net.receivers().is_empty());
    }

    // -- Netlist tests --

    fn small_netlist() -> Netlist {
        let mut nl = Netlist::new(4);
        let mut pad = Block::new("a", BlockKind::InPad, 4);
        pad.pins[0] = Some(n(0));
        let mut unused = Block::new("b", BlockKind::InPad, 4);
        unused.pins[0] = Some(n(1));
        let mut lut = Block::new("l", BlockKind::Lut, 4);
        lut.pins[0] = Some(n(2));
        lut.pins[1] = Some(n(0));
        let mut out = Block::new("out:x", BlockKind::OutPad, 4);
        out.pins[0] = Some(n(2));
        nl.add_block(pad);
        nl.add_block(unused);
        nl.add_block(lut);
        nl.add_block(out);
        nl.add_net(Net::new("a", vec![b(0), b(2)]));
        nl.add_net(Net::new("b", vec![b(1)]));
        nl.add_net(Net::new("x", vec![b(2), b(3)]));
        nl
    }

    #[test]
    fn initial_assignments() {
        let nl = small_netlist();
        assert_eq!(nl.cluster_of(b(0)), ClusterAssignment::Never);
        assert!(nl.is_unclustered(b(2)));
        assert_eq!(nl.num_clusterable(), 1);
        assert_eq!(nl.block_by_name("l"), Some(b(2)));
        assert_eq!(nl.net_by_name("x"), Some(n(2)));
    }

    #[test]
    fn set_and_clear_clustering() {
        let mut nl = small_netlist();
        nl.set_cluster(b(2), ClusterAssignment::Cluster(ClusterId::from_raw(0)));
        assert_eq!(nl.cluster_of(b(2)).cluster(), Some(ClusterId::from_raw(0)));
        nl.clear_clustering();
        assert!(nl.is_unclustered(b(2)));
        assert_eq!(nl.cluster_of(b(3)), ClusterAssignment::Never);
    }

    #[test]
    fn compress_renumbers() {
        let mut nl = small_netlist();
        nl.block_mut(b(1)).kind = BlockKind::Empty;
        nl.net_mut(n(1)).pins.clear();
        nl.compress();

        assert_eq!(nl.num_blocks(), 3);
        assert_eq!(nl.num_nets(), 2);
        assert_eq!(nl.block_by_name("b"), None);
        assert_eq!(nl.net_by_name("b"), None);

        let lut = nl.block_by_name("l").unwrap();
        assert_eq!(lut, b(1));
        let x = nl.net_by_name("x").unwrap();
        assert_eq!(x, n(1));
        assert_eq!(nl.block(lut).output(), Some(x));
        assert_eq!(nl.net(x).pins, vec![b(1), b(2)]);
        assert!(nl.is_unclustered(lut));
        assert_eq!(nl.cluster_of_block.len(), 3);
    }

    #[test]
    fn rebuild_after_deserialize() {
        let nl = small_netlist();
        let json = serde_json::to_string(&nl).unwrap();
        let mut back: Netlist = serde_json::from_str(&json).unwrap();
        assert_eq!(back.block_by_name("l"), None);
        back.rebuild_indices();
        assert_eq!(back.block_by_name("l"), Some(b(2)));
        assert_eq!(back.net_by_name("a"), Some(n(0)));
    }
}
