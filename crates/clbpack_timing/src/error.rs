//! Timing analysis errors.

/// Errors raised when the analyzer and the netlist disagree.
#[derive(Debug, thiserror::Error)]
pub enum TimingError {
    /// The analyzer was asked for a LUT width the netlist was not built with.
    #[error("timing analysis for {expected}-input LUTs cannot use a netlist of {found}-input LUTs")]
    LutSizeMismatch {
        /// LUT width requested.
        expected: usize,
        /// LUT width of the netlist.
        found: usize,
    },

    /// The netlist's shape changed after the analyzer was initialized.
    #[error("netlist has {found} blocks and {found_nets} nets, timing was initialized for {expected} and {expected_nets}")]
    NetlistChanged {
        /// Blocks at initialization.
        expected: usize,
        /// Blocks now.
        found: usize,
        /// Nets at initialization.
        expected_nets: usize,
        /// Nets now.
        found_nets: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_lut_size_mismatch() {
        let err = TimingError::LutSizeMismatch {
            expected: 6,
            found: 4,
        };
        assert_eq!(
            format!("{err}"),
            "timing analysis for 6-input LUTs cannot use a netlist of 4-input LUTs"
        );
    }
}
