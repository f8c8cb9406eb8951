//! Per-block attraction to the open cluster.
//!
//! A block has a [`BlockGain`] only while it is marked, i.e. while it shares
//! at least one net with the open cluster. Unmarked blocks have no gain at
//! all, which keeps them out of every gain-based ranking.

use clbpack_common::BlockId;
use clbpack_config::PackOptions;

/// Gain components of one marked block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockGain {
    /// Nets shared with the open cluster.
    pub sharing: u32,
    /// Connections that would be absorbed into the cluster.
    pub connection: u32,
    /// Criticality of the most critical connection to the cluster.
    pub length: f32,
    /// Reduction in cluster inputs if the block were added.
    pub hill: i32,
    /// Weighted combination used to rank growth candidates.
    pub total: f32,
}

/// How the gain components combine into a total.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GainMode {
    /// Blend shared nets with absorbed connections.
    Connection {
        /// Weight of absorbed connections.
        alpha: f32,
    },
    /// Blend criticality with shared nets.
    Timing {
        /// Weight of criticality.
        alpha: f32,
        /// Weight of each shared net, `(1 - alpha)` spread over the pins of a
        /// logic block.
        shared_net_weight: f32,
    },
    /// Shared nets only.
    Sharing,
}

impl GainMode {
    /// Picks the gain mode for a run. Connection-driven packing wins over
    /// timing-driven packing when both are enabled.
    pub fn from_options(options: &PackOptions) -> Self {
        if options.connection_driven {
            Self::Connection {
                alpha: options.alpha,
            }
        } else if options.timing_driven {
            // Clock pins don't count as shareable under global clocks.
            let pins = if options.global_clocks {
                options.lut_size + 1
            } else {
                options.lut_size + 2
            };
            Self::Timing {
                alpha: options.alpha,
                shared_net_weight: (1.0 - options.alpha) / pins as f32,
            }
        } else {
            Self::Sharing
        }
    }

    /// Combines a block's components.
    pub fn total(self, gain: &BlockGain) -> f32 {
        match self {
            Self::Connection { alpha } => {
                (1.0 - alpha) * gain.sharing as f32 + alpha * gain.connection as f32
            }
            Self::Timing {
                alpha,
                shared_net_weight,
            } => alpha * gain.length + shared_net_weight * gain.sharing as f32,
            Self::Sharing => gain.sharing as f32,
        }
    }
}

/// Gains of every block plus the list of marked blocks.
#[derive(Debug, Clone)]
pub struct GainTable {
    entries: Vec<Option<BlockGain>>,
    marked: Vec<BlockId>,
}

impl GainTable {
    /// Creates a table with every block unmarked.
    pub fn new(num_blocks: usize) -> Self {
        Self {
            entries: vec![None; num_blocks],
            marked: Vec::new(),
        }
    }

    /// Returns a block's gain if it is marked.
    pub fn get(&self, block: BlockId) -> Option<&BlockGain> {
        self.entries[block.index()].as_ref()
    }

    /// Blocks marked since the last reset, in marking order.
    pub fn marked(&self) -> &[BlockId] {
        &self.marked
    }

    /// Records that `block` shares one more net with the cluster.
    ///
    /// The first touch marks the block. `counts_as_input` is false for clock
    /// nets, which never occupy cluster input pins and so leave the hill gain
    /// alone.
    pub fn touch(&mut self, block: BlockId, ext_inputs: usize, counts_as_input: bool) {
        let bump = i32::from(counts_as_input);
        match &mut self.entries[block.index()] {
            Some(gain) => {
                gain.sharing += 1;
                gain.hill += bump;
            }
            entry @ None => {
                *entry = Some(BlockGain {
                    sharing: 1,
                    connection: 0,
                    length: 0.0,
                    hill: bump - ext_inputs as i32,
                    total: 0.0,
                });
                self.marked.push(block);
            }
        }
    }

    /// Counts one more connection absorbed by adding a marked block.
    pub fn add_connection(&mut self, block: BlockId) {
        if let Some(gain) = &mut self.entries[block.index()] {
            gain.connection += 1;
        }
    }

    /// Raises a marked block's length gain to at least `criticality`.
    pub fn raise_length(&mut self, block: BlockId, criticality: f32) {
        if let Some(gain) = &mut self.entries[block.index()] {
            if criticality > gain.length {
                gain.length = criticality;
            }
        }
    }

    /// Zeroes the length gain of every marked block.
    pub fn clear_length(&mut self) {
        for block in &self.marked {
            if let Some(gain) = &mut self.entries[block.index()] {
                gain.length = 0.0;
            }
        }
    }

    /// Recomputes the total gain of every marked block.
    pub fn refresh_totals(&mut self, mode: GainMode) {
        for block in &self.marked {
            if let Some(gain) = &mut self.entries[block.index()] {
                gain.total = mode.total(gain);
            }
        }
    }

    /// Unmarks every marked block in `O(marked)`.
    pub fn reset(&mut self) {
        for block in self.marked.drain(..) {
            self.entries[block.index()] = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b(i: usize) -> BlockId {
        BlockId::from_index(i)
    }

    #[test]
    fn first_touch_marks() {
        let mut table = GainTable::new(4);
        assert!(table.get(b(2)).is_none());
        table.touch(b(2), 3, true);
        let gain = table.get(b(2)).unwrap();
        assert_eq!(gain.sharing, 1);
        assert_eq!(gain.hill, -2);
        assert_eq!(table.marked(), &[b(2)]);

        table.touch(b(2), 3, true);
        let gain = table.get(b(2)).unwrap();
        assert_eq!(gain.sharing, 2);
        assert_eq!(gain.hill, -1);
        assert_eq!(table.marked().len(), 1);
    }

    #[test]
    fn clock_touch_leaves_hill() {
        let mut table = GainTable::new(2);
        table.touch(b(0), 1, false);
        assert_eq!(table.get(b(0)).unwrap().hill, -1);
        table.touch(b(0), 1, false);
        assert_eq!(table.get(b(0)).unwrap().hill, -1);
        assert_eq!(table.get(b(0)).unwrap().sharing, 2);
    }

    #[test]
    fn unmarked_blocks_ignore_updates() {
        let mut table = GainTable::new(2);
        table.add_connection(b(1));
        table.raise_length(b(1), 0.9);
        assert!(table.get(b(1)).is_none());
    }

    #[test]
    fn length_only_rises() {
        let mut table = GainTable::new(1);
        table.touch(b(0), 0, true);
        table.raise_length(b(0), 0.5);
        table.raise_length(b(0), 0.25);
        assert_eq!(table.get(b(0)).unwrap().length, 0.5);
        table.clear_length();
        assert_eq!(table.get(b(0)).unwrap().length, 0.0);
    }

    #[test]
    fn reset_unmarks_everything() {
        let mut table = GainTable::new(3);
        table.touch(b(0), 1, true);
        table.touch(b(2), 1, true);
        table.reset();
        assert!(table.marked().is_empty());
        assert!(table.get(b(0)).is_none());
        assert!(table.get(b(2)).is_none());
    }

    // -- Total gain tests --

    fn sample() -> BlockGain {
        BlockGain {
            sharing: 2,
            connection: 3,
            length: 0.5,
            hill: 0,
            total: 0.0,
        }
    }

    #[test]
    fn sharing_total() {
        assert_eq!(GainMode::Sharing.total(&sample()), 2.0);
    }

    #[test]
    fn connection_total() {
        let mode = GainMode::Connection { alpha: 0.5 };
        assert_eq!(mode.total(&sample()), 2.5);
    }

    #[test]
    fn timing_total() {
        let options = PackOptions {
            alpha: 0.5,
            lut_size: 4,
            global_clocks: true,
            ..PackOptions::default()
        };
        let mode = GainMode::from_options(&options);
        assert_eq!(
            mode,
            GainMode::Timing {
                alpha: 0.5,
                shared_net_weight: 0.1
            }
        );
        assert_eq!(mode.total(&sample()), 0.25 + 0.2);
    }

    #[test]
    fn local_clocks_spread_weight_wider() {
        let options = PackOptions {
            alpha: 0.0,
            lut_size: 4,
            global_clocks: false,
            ..PackOptions::default()
        };
        match GainMode::from_options(&options) {
            GainMode::Timing {
                shared_net_weight, ..
            } => assert_eq!(shared_net_weight, 1.0 / 6.0),
            other => panic!("unexpected mode {other:?}"),
        }
    }

    #[test]
    fn connection_driven_wins() {
        let options = PackOptions {
            connection_driven: true,
            timing_driven: true,
            ..PackOptions::default()
        };
        assert!(matches!(
            GainMode::from_options(&options),
            GainMode::Connection { .. }
        ));
    }
}
