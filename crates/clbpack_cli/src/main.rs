//! clbpack: packs a technology-mapped netlist of LUTs and flip-flops into
//! logic clusters.
//!
//! Provides `clbpack pack` for the full clustering flow, `clbpack check` for
//! validating a netlist without packing it, and `clbpack timing` for a timing
//! analysis of the unpacked netlist.

#![warn(missing_docs)]

mod check;
mod pack;
mod pipeline;
mod timing;

use std::process;

use clap::{Parser, Subcommand, ValueEnum};

/// clbpack: a timing-driven logic block clusterer.
#[derive(Parser, Debug)]
#[command(name = "clbpack", version, about = "Timing-driven CLB packer")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose output, including informational notes.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Control colored output.
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Path to a custom `pack.toml` configuration file.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Pack a netlist into clusters and write the clustering.
    Pack(PackArgs),
    /// Validate a netlist without packing it.
    Check(CheckArgs),
    /// Report the critical path of the unpacked netlist.
    Timing(TimingArgs),
}

/// Arguments for the `clbpack pack` subcommand.
#[derive(Parser, Debug)]
pub struct PackArgs {
    /// Netlist description in JSON.
    pub netlist: String,

    /// Output path for the JSON clustering (default: stdout).
    #[arg(short, long)]
    pub output: Option<String>,

    /// Overrides for `pack.toml` settings.
    #[command(flatten)]
    pub overrides: OverrideArgs,
}

/// Arguments for the `clbpack check` subcommand.
#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Netlist description in JSON.
    pub netlist: String,

    /// Number of LUT data inputs.
    #[arg(long)]
    pub lut_size: Option<usize>,
}

/// Arguments for the `clbpack timing` subcommand.
#[derive(Parser, Debug)]
pub struct TimingArgs {
    /// Netlist description in JSON.
    pub netlist: String,

    /// Overrides for `pack.toml` settings.
    #[command(flatten)]
    pub overrides: OverrideArgs,
}

/// Command-line overrides of `pack.toml` values.
#[derive(clap::Args, Debug, Default)]
pub struct OverrideArgs {
    /// Number of LUT data inputs (K).
    #[arg(long)]
    pub lut_size: Option<usize>,

    /// Logic blocks per cluster (N).
    #[arg(long)]
    pub cluster_size: Option<usize>,

    /// Distinct input nets per cluster (I).
    #[arg(long)]
    pub inputs_per_cluster: Option<usize>,

    /// Distinct clock nets per cluster.
    #[arg(long)]
    pub clocks_per_cluster: Option<usize>,

    /// Route clocks on the general interconnect instead of global networks.
    #[arg(long)]
    pub local_clocks: bool,

    /// Area/timing tradeoff in [0, 1].
    #[arg(long)]
    pub alpha: Option<f32>,

    /// Pack without timing analysis.
    #[arg(long)]
    pub no_timing: bool,

    /// Skip the hill-climbing pass.
    #[arg(long)]
    pub no_hill_climbing: bool,

    /// How each cluster's first block is chosen.
    #[arg(long, value_enum)]
    pub seed: Option<SeedChoice>,

    /// Blocks packed between timing updates.
    #[arg(long)]
    pub recompute_after: Option<usize>,

    /// Only fill a cluster with blocks connected to it.
    #[arg(long)]
    pub no_unrelated: bool,

    /// Rank candidates by absorbed connections instead of timing.
    #[arg(long)]
    pub connection_driven: bool,

    /// Stop timing updates once the critical path is packed.
    #[arg(long)]
    pub allow_early_exit: bool,
}

/// Seed selection policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SeedChoice {
    /// The most critical unpacked block.
    Timing,
    /// The unpacked block with the most used inputs.
    #[value(name = "max-inputs")]
    MaxInputs,
}

/// Controls whether colored output is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Detect from terminal capabilities.
    Auto,
    /// Always produce colored output.
    Always,
    /// Never produce colored output.
    Never,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print informational notes.
    pub verbose: bool,
    /// Whether to use colored output.
    pub color: bool,
    /// Optional path to a custom config file.
    pub config: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    let color = match cli.color {
        ColorChoice::Auto => atty_is_terminal(),
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    };

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        color,
        config: cli.config,
    };

    let result = match cli.command {
        Command::Pack(ref args) => pack::run(args, &global),
        Command::Check(ref args) => check::run(args, &global),
        Command::Timing(ref args) => timing::run(args, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// Checks the TERM env var as a stand-in for terminal detection.
fn atty_is_terminal() -> bool {
    std::env::var("TERM").is_ok()
}
