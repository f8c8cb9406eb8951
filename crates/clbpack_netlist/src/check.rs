//! Fatal up-front checks and clock-net marking.

use crate::data::Netlist;
use crate::error::NetlistError;
use clbpack_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink};

/// Note reporting how many clock nets were found.
const CLOCK_NET_COUNT: DiagnosticCode = DiagnosticCode::new(Category::Info, 101);

/// Flags every net that reaches a flip-flop clock pin as a clock net and
/// returns how many there are. Previous flags are cleared first.
pub fn mark_clock_nets(netlist: &mut Netlist, sink: &DiagnosticSink) -> usize {
    for net in &mut netlist.nets {
        net.is_clock = false;
    }
    let clocks: Vec<_> = netlist
        .blocks
        .iter()
        .filter(|b| b.kind.is_sequential())
        .filter_map(|b| b.clock())
        .collect();
    for clock in clocks {
        netlist.net_mut(clock).is_clock = true;
    }

    let count = netlist.num_clock_nets();
    sink.emit(Diagnostic::note(
        CLOCK_NET_COUNT,
        format!("netlist contains {count} clock net(s)"),
    ));
    count
}

/// Fails if any clock net drives a LUT data input.
pub fn check_clocks(netlist: &Netlist) -> Result<(), NetlistError> {
    for block in netlist.blocks.iter().filter(|b| b.kind.is_clusterable()) {
        for (_, net) in block.connected_inputs() {
            if netlist.is_clock(net) {
                return Err(NetlistError::ClockOnLutInput {
                    net: netlist.net(net).name.clone(),
                    block: block.name.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Fails if any logic block connects one net to two of its data inputs.
pub fn check_for_duplicate_inputs(netlist: &Netlist) -> Result<(), NetlistError> {
    for block in netlist.blocks.iter().filter(|b| b.kind.is_clusterable()) {
        let inputs = block.input_pins();
        for (i, pin) in inputs.iter().enumerate() {
            let Some(net) = pin else { continue };
            if inputs[i + 1..].contains(pin) {
                return Err(NetlistError::DuplicateInput {
                    net: netlist.net(*net).name.clone(),
                    block: block.name.clone(),
                });
            }
        }
    }
    Ok(())
}
