//! Resolution of a partial [`PackConfig`] into validated [`PackOptions`].

use crate::error::ConfigError;
use crate::types::{PackConfig, SeedPolicy};
use serde::Serialize;

/// Largest LUT width accepted.
const MAX_LUT_SIZE: usize = 16;

/// Largest cluster accepted. Pin budgets are tracked as `i32`, so
/// `cluster_size * lut_size` must stay well inside that range.
const MAX_CLUSTER_SIZE: usize = 4096;

/// Default LUT width.
const DEFAULT_LUT_SIZE: usize = 4;

/// Default area/timing tradeoff.
const DEFAULT_ALPHA: f32 = 0.75;

/// Default number of packed blocks between timing recomputations.
const DEFAULT_RECOMPUTE_AFTER: usize = 32767;

/// Default delay through a logic block.
const DEFAULT_BLOCK_DELAY: f32 = 0.1;

/// Default delay of an intra-cluster connection.
const DEFAULT_INTRA_CLUSTER_DELAY: f32 = 0.1;

/// Default delay of an inter-cluster connection.
const DEFAULT_INTER_CLUSTER_DELAY: f32 = 1.0;

/// The fully resolved, range-checked options consumed by the clusterer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackOptions {
    /// Number of data inputs per LUT (K).
    pub lut_size: usize,
    /// Number of logic blocks per cluster (N).
    pub cluster_size: usize,
    /// Distinct external input nets allowed per cluster.
    pub inputs_per_cluster: usize,
    /// Distinct clock nets allowed per cluster.
    pub clocks_per_cluster: usize,
    /// Whether clocks use dedicated global routing.
    pub global_clocks: bool,
    /// Whether the hill-climbing repair pass runs.
    pub hill_climbing: bool,
    /// Whether packing decisions use criticality.
    pub timing_driven: bool,
    /// How cluster seeds are chosen.
    pub seed_policy: SeedPolicy,
    /// Area/timing tradeoff in `[0, 1]`.
    pub alpha: f32,
    /// Blocks packed between timing recomputations.
    pub recompute_timing_after: usize,
    /// Delay through a logic block.
    pub block_delay: f32,
    /// Delay of a connection inside one cluster.
    pub intra_cluster_net_delay: f32,
    /// Delay of a connection between clusters.
    pub inter_cluster_net_delay: f32,
    /// Whether unrelated blocks may fill a cluster from the start.
    pub allow_unrelated_clustering: bool,
    /// Whether timing analysis stops once the critical path is packed.
    pub allow_early_exit: bool,
    /// Whether gains favour absorbed connections over timing.
    pub connection_driven: bool,
}

impl Default for PackOptions {
    fn default() -> Self {
        // Defaults are the unvalidated resolution of an empty file, which is
        // always within range.
        fill_defaults(&PackConfig::default())
    }
}

fn fill_defaults(config: &PackConfig) -> PackOptions {
    let arch = &config.architecture;
    let lut_size = arch.lut_size.unwrap_or(DEFAULT_LUT_SIZE);
    let cluster_size = arch.cluster_size.unwrap_or(1);
    let timing = &config.timing;

    PackOptions {
        lut_size,
        cluster_size,
        inputs_per_cluster: arch
            .inputs_per_cluster
            .unwrap_or(cluster_size.saturating_mul(lut_size)),
        clocks_per_cluster: arch.clocks_per_cluster.unwrap_or(1),
        global_clocks: arch.global_clocks.unwrap_or(true),
        hill_climbing: config.packing.hill_climbing.unwrap_or(true),
        timing_driven: timing.enabled.unwrap_or(true),
        seed_policy: timing.seed.unwrap_or(SeedPolicy::Timing),
        alpha: timing.alpha.unwrap_or(DEFAULT_ALPHA),
        recompute_timing_after: timing.recompute_after.unwrap_or(DEFAULT_RECOMPUTE_AFTER),
        block_delay: timing.block_delay.unwrap_or(DEFAULT_BLOCK_DELAY),
        intra_cluster_net_delay: timing
            .intra_cluster_net_delay
            .unwrap_or(DEFAULT_INTRA_CLUSTER_DELAY),
        inter_cluster_net_delay: timing
            .inter_cluster_net_delay
            .unwrap_or(DEFAULT_INTER_CLUSTER_DELAY),
        allow_unrelated_clustering: config.packing.allow_unrelated_clustering.unwrap_or(true),
        allow_early_exit: timing.allow_early_exit.unwrap_or(false),
        connection_driven: config.packing.connection_driven.unwrap_or(false),
    }
}

/// Fills unset fields with defaults and validates every value.
///
/// Returns [`ConfigError::ValidationError`] describing the first value that is
/// out of range. The clusterer relies on these checks and does not repeat them.
pub fn resolve_options(config: &PackConfig) -> Result<PackOptions, ConfigError> {
    let options = fill_defaults(config);
    validate_options(&options)?;
    Ok(options)
}

fn invalid(message: String) -> Result<(), ConfigError> {
    Err(ConfigError::ValidationError(message))
}

fn validate_options(o: &PackOptions) -> Result<(), ConfigError> {
    if o.lut_size < 2 || o.lut_size > MAX_LUT_SIZE {
        return invalid(format!(
            "lut_size must be between 2 and {MAX_LUT_SIZE}, got {}",
            o.lut_size
        ));
    }
    if o.cluster_size < 1 || o.cluster_size > MAX_CLUSTER_SIZE {
        return invalid(format!(
            "cluster_size must be between 1 and {MAX_CLUSTER_SIZE}, got {}",
            o.cluster_size
        ));
    }
    let max_inputs = o.cluster_size * o.lut_size;
    if o.inputs_per_cluster < o.lut_size || o.inputs_per_cluster > max_inputs {
        return invalid(format!(
            "inputs_per_cluster must be between {} and {max_inputs}, got {}",
            o.lut_size, o.inputs_per_cluster
        ));
    }
    if o.clocks_per_cluster < 1 || o.clocks_per_cluster > o.cluster_size {
        return invalid(format!(
            "clocks_per_cluster must be between 1 and {}, got {}",
            o.cluster_size, o.clocks_per_cluster
        ));
    }
    if !(0.0..=1.0).contains(&o.alpha) {
        return invalid(format!("alpha must be within [0, 1], got {}", o.alpha));
    }
    if o.recompute_timing_after < 1 {
        return invalid("recompute_after must be at least 1".to_string());
    }
    for (name, value) in [
        ("block_delay", o.block_delay),
        ("intra_cluster_net_delay", o.intra_cluster_net_delay),
        ("inter_cluster_net_delay", o.inter_cluster_net_delay),
    ] {
        if !value.is_finite() || value < 0.0 {
            return invalid(format!("{name} must be a non-negative number, got {value}"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_config_from_str;

    fn resolve(toml: &str) -> Result<PackOptions, ConfigError> {
        resolve_options(&load_config_from_str(toml).unwrap())
    }

    #[test]
    fn empty_config_resolves_to_defaults() {
        let options = resolve("").unwrap();
        assert_eq!(options, PackOptions::default());
        assert_eq!(options.lut_size, 4);
        assert_eq!(options.cluster_size, 1);
        assert_eq!(options.inputs_per_cluster, 4);
        assert_eq!(options.clocks_per_cluster, 1);
        assert!(options.global_clocks);
        assert!(options.timing_driven);
        assert_eq!(options.seed_policy, SeedPolicy::Timing);
        assert_eq!(options.alpha, 0.75);
        assert!(!options.allow_early_exit);
        assert!(!options.connection_driven);
    }

    #[test]
    fn inputs_default_scales_with_cluster() {
        let options = resolve("[architecture]\nlut_size = 4\ncluster_size = 5\n").unwrap();
        assert_eq!(options.inputs_per_cluster, 20);
    }

    #[test]
    fn explicit_values_survive() {
        let options = resolve(
            "[architecture]\ncluster_size = 4\ninputs_per_cluster = 10\n\
             [timing]\nenabled = false\nalpha = 0.0\n",
        )
        .unwrap();
        assert_eq!(options.inputs_per_cluster, 10);
        assert!(!options.timing_driven);
        assert_eq!(options.alpha, 0.0);
    }

    // -- Range checks --

    #[test]
    fn lut_size_out_of_range() {
        let err = resolve("[architecture]\nlut_size = 1\n").unwrap_err();
        assert!(format!("{err}").contains("lut_size"));
        assert!(resolve("[architecture]\nlut_size = 17\n").is_err());
    }

    #[test]
    fn inputs_below_lut_size() {
        let err = resolve("[architecture]\ncluster_size = 4\ninputs_per_cluster = 3\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn inputs_above_full_connectivity() {
        let err = resolve("[architecture]\ncluster_size = 2\ninputs_per_cluster = 9\n").unwrap_err();
        assert!(format!("{err}").contains("inputs_per_cluster"));
    }

    #[test]
    fn clocks_exceed_cluster_size() {
        let err = resolve("[architecture]\ncluster_size = 2\nclocks_per_cluster = 3\n").unwrap_err();
        assert!(format!("{err}").contains("clocks_per_cluster"));
    }

    #[test]
    fn zero_cluster_size() {
        assert!(resolve("[architecture]\ncluster_size = 0\ninputs_per_cluster = 4\n").is_err());
    }

    #[test]
    fn huge_cluster_size_rejected() {
        let err = resolve("[architecture]\ncluster_size = 9223372036854775807\ninputs_per_cluster = 4\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
        assert!(format!("{err}").contains("cluster_size"));
        assert!(resolve("[architecture]\ncluster_size = 4097\n").is_err());

        let options = resolve("[architecture]\ncluster_size = 4096\n").unwrap();
        assert_eq!(options.inputs_per_cluster, 4096 * 4);
    }

    #[test]
    fn alpha_out_of_range() {
        let err = resolve("[timing]\nalpha = 1.5\n").unwrap_err();
        assert!(format!("{err}").contains("alpha"));
    }

    #[test]
    fn negative_delay_rejected() {
        let err = resolve("[timing]\ninter_cluster_net_delay = -1.0\n").unwrap_err();
        assert!(format!("{err}").contains("inter_cluster_net_delay"));
    }

    #[test]
    fn zero_recompute_interval_rejected() {
        assert!(resolve("[timing]\nrecompute_after = 0\n").is_err());
    }
}
