//! Packing errors.

use clbpack_netlist::NetlistError;
use clbpack_timing::TimingError;

/// Errors raised while packing or checking a finished packing.
#[derive(Debug, thiserror::Error)]
pub enum PackError {
    /// The netlist failed a precondition.
    #[error(transparent)]
    Netlist(#[from] NetlistError),

    /// Timing analysis failed.
    #[error(transparent)]
    Timing(#[from] TimingError),

    /// The options and the netlist disagree on the LUT width.
    #[error("options use {expected}-input LUTs but the netlist was built for {found}")]
    LutSizeMismatch {
        /// LUT width from the options.
        expected: usize,
        /// LUT width of the netlist.
        found: usize,
    },

    /// A logic block was left without a cluster.
    #[error("block `{block}` was never packed")]
    Unassigned {
        /// The unpacked block.
        block: String,
    },

    /// A logic block names a cluster that does not exist.
    #[error("block `{block}` is in cluster {cluster} but only {num_clusters} cluster(s) exist")]
    ClusterOutOfRange {
        /// The offending block.
        block: String,
        /// The cluster it names.
        cluster: usize,
        /// Number of clusters built.
        num_clusters: usize,
    },

    /// A cluster holds more blocks than it has slots.
    #[error("cluster {cluster} holds more than {capacity} block(s)")]
    OverCapacity {
        /// The overfull cluster.
        cluster: usize,
        /// Blocks per cluster.
        capacity: usize,
    },

    /// A pad or removed block was given a cluster.
    #[error("block `{block}` cannot be packed but is assigned to a cluster")]
    PadInCluster {
        /// The offending block.
        block: String,
    },

    /// A cluster holds no blocks.
    #[error("cluster {cluster} is empty")]
    EmptyCluster {
        /// The empty cluster.
        cluster: usize,
    },

    /// A cluster uses more input pins than allowed.
    #[error("cluster {cluster} uses {used} input(s), more than the {budget} allowed")]
    TooManyInputs {
        /// The offending cluster.
        cluster: usize,
        /// Distinct input nets it uses.
        used: usize,
        /// Inputs per cluster.
        budget: usize,
    },

    /// A cluster uses more clock pins than allowed.
    #[error("cluster {cluster} uses {used} clock(s), more than the {budget} allowed")]
    TooManyClocks {
        /// The offending cluster.
        cluster: usize,
        /// Distinct clock nets it uses.
        used: usize,
        /// Clocks per cluster.
        budget: usize,
    },
}
