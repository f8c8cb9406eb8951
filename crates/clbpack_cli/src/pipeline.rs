//! Shared pipeline helpers for CLI commands.
//!
//! Contains the steps every command starts with: locating and loading
//! `pack.toml`, applying command-line overrides, reading and building the
//! netlist, and rendering collected diagnostics.

use std::path::Path;

use clbpack_config::{PackConfig, PackOptions, SeedPolicy, CONFIG_FILE_NAME};
use clbpack_diagnostics::{DiagnosticRenderer, DiagnosticSink, Severity, TerminalRenderer};
use clbpack_netlist::{Netlist, NetlistBuilder, NetlistDescription};

use crate::{GlobalArgs, OverrideArgs, SeedChoice};

/// Loads the packing configuration.
///
/// If `--config` is given that file must exist. Otherwise `pack.toml` in the
/// current directory is used when present, and an empty configuration when
/// it is not.
pub fn load_pack_config(global: &GlobalArgs) -> Result<PackConfig, Box<dyn std::error::Error>> {
    if let Some(ref path) = global.config {
        return Ok(clbpack_config::load_config_file(Path::new(path))?);
    }
    let dir = std::env::current_dir()?;
    if dir.join(CONFIG_FILE_NAME).is_file() {
        Ok(clbpack_config::load_config(&dir)?)
    } else {
        Ok(PackConfig::default())
    }
}

/// Writes command-line overrides into `config`. Unset flags leave the file's
/// values alone.
pub fn apply_overrides(config: &mut PackConfig, args: &OverrideArgs) {
    let arch = &mut config.architecture;
    if args.lut_size.is_some() {
        arch.lut_size = args.lut_size;
    }
    if args.cluster_size.is_some() {
        arch.cluster_size = args.cluster_size;
    }
    if args.inputs_per_cluster.is_some() {
        arch.inputs_per_cluster = args.inputs_per_cluster;
    }
    if args.clocks_per_cluster.is_some() {
        arch.clocks_per_cluster = args.clocks_per_cluster;
    }
    if args.local_clocks {
        arch.global_clocks = Some(false);
    }

    let packing = &mut config.packing;
    if args.no_hill_climbing {
        packing.hill_climbing = Some(false);
    }
    if args.no_unrelated {
        packing.allow_unrelated_clustering = Some(false);
    }
    if args.connection_driven {
        packing.connection_driven = Some(true);
    }

    let timing = &mut config.timing;
    if args.no_timing {
        timing.enabled = Some(false);
    }
    if let Some(seed) = args.seed {
        timing.seed = Some(match seed {
            SeedChoice::Timing => SeedPolicy::Timing,
            SeedChoice::MaxInputs => SeedPolicy::MaxInputs,
        });
    }
    if args.alpha.is_some() {
        timing.alpha = args.alpha;
    }
    if args.recompute_after.is_some() {
        timing.recompute_after = args.recompute_after;
    }
    if args.allow_early_exit {
        timing.allow_early_exit = Some(true);
    }
}

/// Loads the configuration, applies `overrides` and resolves the options.
pub fn resolve(
    global: &GlobalArgs,
    overrides: &OverrideArgs,
) -> Result<PackOptions, Box<dyn std::error::Error>> {
    let mut config = load_pack_config(global)?;
    apply_overrides(&mut config, overrides);
    Ok(clbpack_config::resolve_options(&config)?)
}

/// Reads a JSON netlist description and builds it for `lut_size`-input LUTs.
pub fn read_netlist(
    path: &Path,
    lut_size: usize,
    sink: &DiagnosticSink,
) -> Result<Netlist, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    let desc = NetlistDescription::from_json(&text)?;
    Ok(NetlistBuilder::new(lut_size, sink).build(&desc)?)
}

/// Renders the diagnostics from a sink to stderr.
///
/// Notes are shown only with `--verbose`; everything is hidden by `--quiet`
/// except errors. Returns the number of diagnostics rendered.
pub fn render_diagnostics(sink: &DiagnosticSink, global: &GlobalArgs) -> usize {
    let renderer = TerminalRenderer::new(global.color);
    let mut count = 0;
    for diag in sink.diagnostics() {
        let shown = match diag.severity {
            Severity::Error => true,
            Severity::Warning => !global.quiet,
            Severity::Note => global.verbose && !global.quiet,
        };
        if shown {
            eprintln!("{}", renderer.render(&diag));
            count += 1;
        }
    }
    count
}
