//! Parsing, validation and resolution of `pack.toml` packing configuration.
//!
//! This crate reads the configuration file into a partially-filled
//! [`PackConfig`], lets callers override individual fields (the CLI does this
//! from its flags), and resolves the result into a fully-populated, range-checked
//! [`PackOptions`] that the clustering engine consumes without further checks.
//!
//! # Usage
//!
//! ```ignore
//! let config = clbpack_config::load_config(Path::new("."))?;
//! let options = clbpack_config::resolve_options(&config)?;
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod resolve;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_file, load_config_from_str, CONFIG_FILE_NAME};
pub use resolve::{resolve_options, PackOptions};
pub use types::*;
