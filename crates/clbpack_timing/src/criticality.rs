//! Slack, connection criticality and the block criticality ranking.

use crate::analyzer::TimingAnalyzer;
use clbpack_common::EQUAL_EPSILON;
use clbpack_netlist::{BlockKind, Netlist};

/// Slacks below this are treated as zero.
pub const MIN_SLACK_ALLOWED: f32 = 1e-6;

/// Weight of the path-count tie-breaker.
pub const SCALE_NUM_PATHS: f32 = 1e-2;

/// Weight of the distance-from-source tie-breaker.
pub const SCALE_DISTANCE_VAL: f32 = 1e-4;

impl TimingAnalyzer {
    /// Block pins whose connections are timed: an OUTPAD's pin 0, otherwise
    /// the data inputs. INPADs have none.
    fn timed_input_pins(&self, kind: BlockKind) -> std::ops::RangeInclusive<usize> {
        match kind {
            BlockKind::OutPad => 0..=0,
            _ => 1..=self.lut_size,
        }
    }

    pub(crate) fn calculate_slack_and_criticality(
        &mut self,
        netlist: &Netlist,
        max_arrival_time: f32,
        sum_biggest_max: u64,
    ) {
        let mut max_slack = 0.0_f32;
        let mut min_slack = crate::sweep::MAX_ALLOWED_PATH_LEN;
        let mut critical_connections = 0;

        for id in netlist.block_ids() {
            let block = netlist.block(id);
            if block.kind == BlockKind::InPad {
                continue;
            }
            for pin in self.timed_input_pins(block.kind) {
                let (Some(net), Some(pos)) = (block.pins[pin], self.net_pin_index(id, pin)) else {
                    continue;
                };
                let mut slack = self.blocks[id.index()].required_arrival_time
                    - self.nets[net.index()].arrival_time[pos];
                if slack < MIN_SLACK_ALLOWED {
                    slack = 0.0;
                }
                self.nets[net.index()].slack[pos] = slack;

                if (slack - min_slack).abs() < EQUAL_EPSILON {
                    critical_connections += 1;
                } else if slack < min_slack {
                    min_slack = slack;
                    critical_connections = 1;
                }
                max_slack = max_slack.max(slack);
            }
        }

        for (i, timing) in self.blocks.iter().enumerate() {
            let paths = if sum_biggest_max > 0 {
                SCALE_NUM_PATHS
                    * timing.num_max_inputs.saturating_add(timing.num_max_outputs) as f32
                    / sum_biggest_max as f32
            } else {
                0.0
            };
            let distance = if max_arrival_time > 0.0 {
                SCALE_DISTANCE_VAL * timing.delay_from_source / max_arrival_time
            } else {
                0.0
            };
            self.tie_breaker[i] = paths + distance;
        }

        let base = |slack: f32| {
            if max_slack > MIN_SLACK_ALLOWED {
                1.0 - slack / max_slack
            } else {
                1.0
            }
        };

        for id in netlist.block_ids() {
            let block = netlist.block(id);
            if block.kind == BlockKind::InPad {
                continue;
            }
            let unclustered = netlist.is_unclustered(id);
            for pin in self.timed_input_pins(block.kind) {
                let (Some(net), Some(pos)) = (block.pins[pin], self.net_pin_index(id, pin)) else {
                    continue;
                };
                let Some(driver) = netlist.net(net).driver() else {
                    continue;
                };
                let timing = &mut self.nets[net.index()];
                let slack = timing.slack[pos];
                timing.forward_criticality[pos] = base(slack) + self.tie_breaker[driver.index()];
                let backward = base(slack) + self.tie_breaker[id.index()];
                timing.backward_criticality[pos] = backward;
                if unclustered && backward > self.criticality[id.index()] {
                    self.criticality[id.index()] = backward;
                }
            }
        }

        if critical_connections == 0 {
            min_slack = 0.0;
        }
        self.summary.min_slack = min_slack;
        self.summary.max_slack = max_slack;
        self.summary.critical_connections = critical_connections;
    }

    /// Orders blocks by criticality, most critical first, and rewinds the
    /// seed cursor. Clustered blocks sit at `-1` and sort last.
    pub(crate) fn sort_blocks_by_criticality(&mut self) {
        let criticality = &self.criticality;
        self.crit_order
            .sort_by(|a, b| criticality[b.index()].total_cmp(&criticality[a.index()]));
        self.cursor = 0;
    }
}
