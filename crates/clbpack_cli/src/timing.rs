//! `clbpack timing`: one timing analysis of the unpacked netlist.

use std::path::Path;

use clbpack_config::PackOptions;
use clbpack_diagnostics::DiagnosticSink;
use clbpack_netlist::{check_clocks, Netlist};
use clbpack_timing::{CriticalPathReport, DelayModel, TimingAnalyzer, TimingSummary};

use crate::pipeline::{read_netlist, render_diagnostics, resolve};
use crate::{GlobalArgs, TimingArgs};

/// Runs the `clbpack timing` command.
///
/// Prints the critical path and slack figures. Returns exit code 0 on success.
pub fn run(args: &TimingArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let options = resolve(global, &args.overrides)?;

    if !global.quiet {
        eprintln!(
            "   Timing {} (block {}, intra {}, inter {})",
            args.netlist,
            options.block_delay,
            options.intra_cluster_net_delay,
            options.inter_cluster_net_delay
        );
    }

    let sink = DiagnosticSink::new();
    let result = analyze(Path::new(&args.netlist), &options, &sink);
    let (summary, report) = match result {
        Ok(analysis) => analysis,
        Err(e) => {
            render_diagnostics(&sink, global);
            return Err(e);
        }
    };
    if let Some(ref report) = report {
        sink.emit(report.to_diagnostic(options.cluster_size).with_note("before packing"));
    }
    render_diagnostics(&sink, global);

    if !global.quiet {
        match report {
            Some(report) => {
                eprintln!(
                    "   Critical path: {:.2} through {} block(s)",
                    report.length, report.total_blocks
                );
                eprintln!("   Path: {}", report.block_names.join(" <- "));
            }
            None => eprintln!("   Critical path: none (no timed connections)"),
        }
        eprintln!(
            "   Result: min slack {:.2}, max slack {:.2}, {} critical connection(s)",
            summary.min_slack, summary.max_slack, summary.critical_connections
        );
    }

    if sink.has_errors() {
        return Ok(1);
    }
    Ok(0)
}

fn analyze(
    path: &Path,
    options: &PackOptions,
    sink: &DiagnosticSink,
) -> Result<(TimingSummary, Option<CriticalPathReport>), Box<dyn std::error::Error>> {
    let netlist: Netlist = read_netlist(path, options.lut_size, sink)?;
    check_clocks(&netlist)?;
    let delays = DelayModel::new(
        options.block_delay,
        options.intra_cluster_net_delay,
        options.inter_cluster_net_delay,
    );
    let mut analyzer = TimingAnalyzer::new(&netlist, options.lut_size)?;
    let report = analyzer
        .recompute(&netlist, &delays)?
        .map(|farthest| analyzer.report_critical_path(&netlist, farthest));
    Ok((*analyzer.summary(), report))
}
