//! Netlist construction and consistency errors.

/// A structural problem that makes a netlist unusable for clustering.
#[derive(Debug, thiserror::Error)]
pub enum NetlistError {
    /// The JSON description could not be parsed.
    #[error("invalid netlist description: {0}")]
    InvalidDescription(String),

    /// Two blocks share the same name.
    #[error("duplicate block name `{name}`")]
    DuplicateBlockName {
        /// The repeated name.
        name: String,
    },

    /// A block uses one of the reserved net names.
    #[error("block `{block}` uses reserved net name `{net}`")]
    ReservedNetName {
        /// The offending block.
        block: String,
        /// The reserved name.
        net: String,
    },

    /// A block has more data inputs than the LUT width allows.
    #[error("block `{block}` has {count} inputs but the LUT size is {lut_size}")]
    TooManyInputs {
        /// The offending block.
        block: String,
        /// Number of inputs given.
        count: usize,
        /// The configured LUT width.
        lut_size: usize,
    },

    /// A block's pins do not match what its kind requires.
    #[error("block `{block}` has a malformed pin list: {reason}")]
    BadPinShape {
        /// The offending block.
        block: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A net is driven by more than one block.
    #[error("net `{net}` has multiple drivers: `{first}` and `{second}`")]
    MultipleDrivers {
        /// The net.
        net: String,
        /// The first driver seen.
        first: String,
        /// The second driver seen.
        second: String,
    },

    /// A net has receivers but no driver.
    #[error("net `{net}` has no driver")]
    MissingDriver {
        /// The net.
        net: String,
    },

    /// A net driven by something other than an input pad has no receivers.
    #[error("net `{net}` driven by `{driver}` has no receivers")]
    NoReceivers {
        /// The net.
        net: String,
        /// Its driving block.
        driver: String,
    },

    /// A clock net feeds a LUT data input.
    #[error("clock net `{net}` drives a LUT input of block `{block}`")]
    ClockOnLutInput {
        /// The clock net.
        net: String,
        /// The block whose data input it reaches.
        block: String,
    },

    /// A block connects the same net to two of its input pins.
    #[error("block `{block}` uses net `{net}` on more than one input pin")]
    DuplicateInput {
        /// The repeated net.
        net: String,
        /// The offending block.
        block: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_multiple_drivers() {
        let err = NetlistError::MultipleDrivers {
            net: "n1".into(),
            first: "lut_a".into(),
            second: "lut_b".into(),
        };
        assert_eq!(
            format!("{err}"),
            "net `n1` has multiple drivers: `lut_a` and `lut_b`"
        );
    }

    #[test]
    fn display_clock_on_lut_input() {
        let err = NetlistError::ClockOnLutInput {
            net: "clk".into(),
            block: "l0".into(),
        };
        assert_eq!(
            format!("{err}"),
            "clock net `clk` drives a LUT input of block `l0`"
        );
    }

    #[test]
    fn display_too_many_inputs() {
        let err = NetlistError::TooManyInputs {
            block: "big".into(),
            count: 5,
            lut_size: 4,
        };
        assert!(format!("{err}").contains("5 inputs"));
    }
}
