//! `clbpack check`: builds a netlist and runs the checks packing would run,
//! without packing it.

use std::path::Path;

use clbpack_config::ArchitectureConfig;
use clbpack_diagnostics::DiagnosticSink;
use clbpack_netlist::{check_clocks, check_for_duplicate_inputs, Netlist};

use crate::pipeline::{load_pack_config, read_netlist, render_diagnostics};
use crate::{CheckArgs, GlobalArgs};

/// Runs the `clbpack check` command.
///
/// Returns exit code 0 if the netlist can be packed and 1 otherwise.
pub fn run(args: &CheckArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let mut config = load_pack_config(global)?;
    if args.lut_size.is_some() {
        config.architecture.lut_size = args.lut_size;
    }
    let options = clbpack_config::resolve_options(&config)?;

    if !global.quiet {
        eprintln!("   Checking {} (K={})", args.netlist, options.lut_size);
    }

    let sink = DiagnosticSink::new();
    let result = check_netlist(Path::new(&args.netlist), options.lut_size, &sink);
    render_diagnostics(&sink, global);
    let netlist = result?;

    if !global.quiet {
        eprintln!(
            "   Result: {} block(s), {} net(s), {} clock net(s), {} logic block(s)",
            netlist.num_blocks(),
            netlist.num_nets(),
            netlist.num_clock_nets(),
            netlist.num_clusterable()
        );
        if global.verbose {
            print_architecture(&config.architecture);
        }
    }

    if sink.has_errors() {
        return Ok(1);
    }
    Ok(0)
}

fn check_netlist(
    path: &Path,
    lut_size: usize,
    sink: &DiagnosticSink,
) -> Result<Netlist, Box<dyn std::error::Error>> {
    let netlist = read_netlist(path, lut_size, sink)?;
    check_clocks(&netlist)?;
    check_for_duplicate_inputs(&netlist)?;
    Ok(netlist)
}

fn print_architecture(arch: &ArchitectureConfig) {
    let show = |value: Option<usize>| match value {
        Some(v) => v.to_string(),
        None => "default".to_string(),
    };
    eprintln!(
        "   Architecture: cluster size {}, {} input(s), {} clock(s) per cluster",
        show(arch.cluster_size),
        show(arch.inputs_per_cluster),
        show(arch.clocks_per_cluster)
    );
}
