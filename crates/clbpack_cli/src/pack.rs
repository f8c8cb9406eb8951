//! `clbpack pack`: the full clustering flow.
//!
//! 1. Load `pack.toml` and apply flag overrides
//! 2. Read and build the netlist
//! 3. Pack it into clusters
//! 4. Render diagnostics and print statistics
//! 5. Write the JSON clustering

use std::path::Path;

use clbpack_cluster::{pack, ClusteringSummary, PackOutcome};
use clbpack_config::PackOptions;
use clbpack_diagnostics::DiagnosticSink;
use clbpack_netlist::Netlist;

use crate::pipeline::{read_netlist, render_diagnostics, resolve};
use crate::{GlobalArgs, PackArgs};

/// Runs the `clbpack pack` command.
///
/// Returns exit code 0 on success and 1 if errors were reported.
pub fn run(args: &PackArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let options = resolve(global, &args.overrides)?;

    if !global.quiet {
        eprintln!(
            "   Packing {} (K={}, N={}, I={}, {})",
            args.netlist,
            options.lut_size,
            options.cluster_size,
            options.inputs_per_cluster,
            if options.timing_driven {
                "timing-driven"
            } else {
                "area-driven"
            }
        );
    }

    let sink = DiagnosticSink::new();
    let result = build_and_pack(Path::new(&args.netlist), &options, &sink);
    render_diagnostics(&sink, global);
    let (netlist, outcome) = result?;

    let summary = ClusteringSummary::new(&netlist, &options, &outcome);
    let json = serde_json::to_string_pretty(&summary)?;
    match args.output {
        Some(ref path) => std::fs::write(path, json + "\n")
            .map_err(|e| format!("failed to write {path}: {e}"))?,
        None => println!("{json}"),
    }

    if !global.quiet {
        let stats = &outcome.stats;
        eprintln!(
            "   Result: {} logic block(s) in {} cluster(s), {:.2} block(s) and {:.2} input(s) per cluster",
            stats.logic_blocks, stats.num_clusters, stats.occupancy.avg, stats.inputs.avg
        );
        if let Some(timing) = outcome.timing {
            eprintln!(
                "   Critical path: {:.2} after packing",
                timing.max_arrival_time
            );
        }
        if let Some(ref path) = args.output {
            eprintln!("   Wrote {path}");
        }
    }

    if sink.has_errors() {
        return Ok(1);
    }
    Ok(0)
}

fn build_and_pack(
    path: &Path,
    options: &PackOptions,
    sink: &DiagnosticSink,
) -> Result<(Netlist, PackOutcome), Box<dyn std::error::Error>> {
    let mut netlist = read_netlist(path, options.lut_size, sink)?;
    let outcome = pack(&mut netlist, options, sink)?;
    Ok((netlist, outcome))
}
