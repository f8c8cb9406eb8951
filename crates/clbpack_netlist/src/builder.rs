//! Construction of a [`Netlist`] from a JSON description.
//!
//! The description names each block with its kind and the nets on its
//! output, data inputs and clock. [`NetlistBuilder`] checks pin shapes,
//! derives every net's pin list (driver first, then receivers in block
//! order), sweeps input pads whose nets go nowhere, and marks clock nets.

use crate::check::mark_clock_nets;
use crate::data::{Block, BlockKind, Net, Netlist};
use crate::error::NetlistError;
use clbpack_common::{BlockId, NetId};
use clbpack_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink, Subject};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Net names that read as unconnected pins in mapped netlists.
const RESERVED_NET_NAMES: [&str; 2] = ["open", "unconn"];

/// Warning emitted when an unused input pad is removed.
const SWEPT_INPAD: DiagnosticCode = DiagnosticCode::new(Category::Warning, 201);

/// A whole netlist as written in JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NetlistDescription {
    /// Blocks in file order.
    pub blocks: Vec<BlockDescription>,
}

/// One block as written in JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BlockDescription {
    /// Instance name, unique across the netlist.
    pub name: String,
    /// Block kind.
    pub kind: BlockKind,
    /// Net driven by the block. Absent for output pads.
    #[serde(default)]
    pub output: Option<String>,
    /// Nets on the data inputs, in pin order; `null` leaves a pin open.
    #[serde(default)]
    pub inputs: Vec<Option<String>>,
    /// Clock net of a flip-flop.
    #[serde(default)]
    pub clock: Option<String>,
}

impl NetlistDescription {
    /// Parses a description from JSON text.
    pub fn from_json(text: &str) -> Result<Self, NetlistError> {
        serde_json::from_str(text).map_err(|e| NetlistError::InvalidDescription(e.to_string()))
    }
}

/// Builds validated netlists for a fixed LUT width.
pub struct NetlistBuilder<'a> {
    lut_size: usize,
    sink: &'a DiagnosticSink,
}

impl<'a> NetlistBuilder<'a> {
    /// Creates a builder that reports warnings and notes to `sink`.
    pub fn new(lut_size: usize, sink: &'a DiagnosticSink) -> Self {
        Self { lut_size, sink }
    }

    /// Builds a netlist from a description.
    pub fn build(&self, desc: &NetlistDescription) -> Result<Netlist, NetlistError> {
        let mut seen = HashSet::new();
        for block in &desc.blocks {
            if !seen.insert(block.name.as_str()) {
                return Err(NetlistError::DuplicateBlockName {
                    name: block.name.clone(),
                });
            }
            self.check_shape(block)?;
        }

        let mut nets = NetTable::default();
        let mut netlist = Netlist::new(self.lut_size);
        let clock_pin = self.lut_size + 1;
        for desc_block in &desc.blocks {
            let mut block = Block::new(desc_block.name.clone(), desc_block.kind, self.lut_size);
            if desc_block.kind == BlockKind::OutPad {
                block.pins[0] = desc_block
                    .inputs
                    .first()
                    .and_then(|n| n.as_deref())
                    .map(|n| nets.intern(n));
            } else {
                block.pins[0] = desc_block.output.as_deref().map(|n| nets.intern(n));
                for (i, input) in desc_block.inputs.iter().enumerate() {
                    block.pins[i + 1] = input.as_deref().map(|n| nets.intern(n));
                }
                block.pins[clock_pin] = desc_block.clock.as_deref().map(|n| nets.intern(n));
            }
            netlist.add_block(block);
        }

        self.connect_nets(&mut netlist, &nets.names)?;
        mark_clock_nets(&mut netlist, self.sink);
        Ok(netlist)
    }

    fn connect_nets(&self, netlist: &mut Netlist, net_names: &[String]) -> Result<(), NetlistError> {
        let num_nets = net_names.len();
        let mut drivers: Vec<Option<BlockId>> = vec![None; num_nets];
        let mut receivers: Vec<Vec<BlockId>> = vec![Vec::new(); num_nets];

        for id in netlist.block_ids() {
            let block = netlist.block(id);
            if block.kind == BlockKind::OutPad {
                if let Some(net) = block.output() {
                    receivers[net.index()].push(id);
                }
                continue;
            }
            if let Some(net) = block.output() {
                if let Some(first) = drivers[net.index()] {
                    return Err(NetlistError::MultipleDrivers {
                        net: net_names[net.index()].clone(),
                        first: netlist.block(first).name.clone(),
                        second: block.name.clone(),
                    });
                }
                drivers[net.index()] = Some(id);
            }
            for net in block.pins[1..].iter().flatten() {
                receivers[net.index()].push(id);
            }
        }

        let mut swept = false;
        for (i, name) in net_names.iter().enumerate() {
            let Some(driver) = drivers[i] else {
                return Err(NetlistError::MissingDriver {
                    net: name.clone(),
                });
            };
            let mut pins = Vec::with_capacity(receivers[i].len() + 1);
            if receivers[i].is_empty() {
                let driver_block = netlist.block(driver);
                if driver_block.kind != BlockKind::InPad {
                    return Err(NetlistError::NoReceivers {
                        net: name.clone(),
                        driver: driver_block.name.clone(),
                    });
                }
                let message = format!("removing unused input pad `{}`", driver_block.name);
                self.sink.emit(
                    Diagnostic::warning(SWEPT_INPAD, message).with_subject(Subject::Net(name.clone())),
                );
                netlist.block_mut(driver).kind = BlockKind::Empty;
                swept = true;
            } else {
                pins.push(driver);
                pins.append(&mut receivers[i]);
            }
            netlist.add_net(Net::new(name.clone(), pins));
        }

        if swept {
            netlist.compress();
        }
        Ok(())
    }

    fn check_shape(&self, block: &BlockDescription) -> Result<(), NetlistError> {
        let bad = |reason: &str| NetlistError::BadPinShape {
            block: block.name.clone(),
            reason: reason.to_string(),
        };

        for net in block
            .output
            .iter()
            .chain(block.inputs.iter().flatten())
            .chain(block.clock.iter())
        {
            if RESERVED_NET_NAMES.contains(&net.as_str()) {
                return Err(NetlistError::ReservedNetName {
                    block: block.name.clone(),
                    net: net.clone(),
                });
            }
        }

        match block.kind {
            BlockKind::InPad => {
                if block.output.is_none() {
                    return Err(bad("input pad drives no net"));
                }
                if block.inputs.iter().any(Option::is_some) || block.clock.is_some() {
                    return Err(bad("input pad cannot have inputs"));
                }
            }
            BlockKind::OutPad => {
                if block.output.is_some() || block.clock.is_some() {
                    return Err(bad("output pad can only have one input"));
                }
                if block.inputs.len() != 1 || block.inputs[0].is_none() {
                    return Err(bad("output pad needs exactly one input"));
                }
            }
            BlockKind::Lut | BlockKind::LutAndLatch | BlockKind::Latch => {
                if block.output.is_none() {
                    return Err(bad("logic block drives no net"));
                }
                if block.inputs.len() > self.lut_size {
                    return Err(NetlistError::TooManyInputs {
                        block: block.name.clone(),
                        count: block.inputs.len(),
                        lut_size: self.lut_size,
                    });
                }
                match block.kind {
                    BlockKind::Lut if block.clock.is_some() => {
                        return Err(bad("LUT cannot have a clock"));
                    }
                    BlockKind::Latch | BlockKind::LutAndLatch if block.clock.is_none() => {
                        return Err(bad("flip-flop needs a clock"));
                    }
                    BlockKind::Latch
                        if block.inputs.iter().filter(|i| i.is_some()).count() != 1 =>
                    {
                        return Err(bad("latch needs exactly one data input"));
                    }
                    _ => {}
                }
            }
            BlockKind::Empty => return Err(bad("empty blocks cannot be described")),
        }
        Ok(())
    }
}

/// Net names in order of first appearance.
#[derive(Default)]
struct NetTable {
    ids: HashMap<String, NetId>,
    names: Vec<String>,
}

impl NetTable {
    fn intern(&mut self, name: &str) -> NetId {
        if let Some(&id) = self.ids.get(name) {
            return id;
        }
        let id = NetId::from_index(self.names.len());
        self.ids.insert(name.to_string(), id);
        self.names.push(name.to_string());
        id
    }
}
