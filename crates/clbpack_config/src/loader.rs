//! Configuration file loading.

use crate::error::ConfigError;
use crate::types::PackConfig;
use std::path::Path;

/// The file name looked up in a project directory.
pub const CONFIG_FILE_NAME: &str = "pack.toml";

/// Loads a `pack.toml` configuration from a project directory.
///
/// Reads `<project_dir>/pack.toml`. A missing file is an I/O error; callers
/// that treat the file as optional should check for it first.
pub fn load_config(project_dir: &Path) -> Result<PackConfig, ConfigError> {
    load_config_file(&project_dir.join(CONFIG_FILE_NAME))
}

/// Loads a configuration from an explicit file path.
pub fn load_config_file(path: &Path) -> Result<PackConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    load_config_from_str(&content)
}

/// Parses a configuration from a string.
///
/// Only syntax and field names are checked here; value ranges are checked by
/// [`resolve_options`](crate::resolve_options) once overrides are applied.
pub fn load_config_from_str(content: &str) -> Result<PackConfig, ConfigError> {
    toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SeedPolicy;

    #[test]
    fn parse_empty_config() {
        let config = load_config_from_str("").unwrap();
        assert!(config.architecture.lut_size.is_none());
        assert!(config.timing.enabled.is_none());
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
[architecture]
lut_size = 4
cluster_size = 4
inputs_per_cluster = 10
clocks_per_cluster = 1
global_clocks = true

[packing]
hill_climbing = false
allow_unrelated_clustering = true
connection_driven = false

[timing]
enabled = true
seed = "max_inputs"
alpha = 0.5
recompute_after = 64
block_delay = 0.1
intra_cluster_net_delay = 0.1
inter_cluster_net_delay = 1.0
allow_early_exit = true
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.architecture.cluster_size, Some(4));
        assert_eq!(config.architecture.inputs_per_cluster, Some(10));
        assert_eq!(config.packing.hill_climbing, Some(false));
        assert_eq!(config.timing.seed, Some(SeedPolicy::MaxInputs));
        assert_eq!(config.timing.alpha, Some(0.5));
        assert_eq!(config.timing.recompute_after, Some(64));
        assert_eq!(config.timing.allow_early_exit, Some(true));
    }

    #[test]
    fn unknown_field_errors() {
        let err = load_config_from_str("[architecture]\nlut_width = 6\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn bad_seed_errors() {
        let err = load_config_from_str("[timing]\nseed = \"random\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn invalid_toml_errors() {
        let err = load_config_from_str("this is not valid toml {{{}}}").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn load_from_project_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[architecture]\nlut_size = 6\n",
        )
        .unwrap();
        let config = load_config(dir.path()).unwrap();
        assert_eq!(config.architecture.lut_size, Some(6));
    }

    #[test]
    fn io_error_from_nonexistent_dir() {
        let err = load_config(Path::new("/nonexistent/dir")).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }
}
