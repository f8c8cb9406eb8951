//! The forward (arrival) and backward (required time) breadth-first sweeps.
//!
//! Both sweeps are countdown traversals: a block joins the queue once every
//! connection feeding it (forward) or fed by it (backward) has been visited.
//! Clock nets are never traversed.

use crate::analyzer::{DelayModel, TimingAnalyzer};
use clbpack_common::{BlockId, EQUAL_EPSILON};
use clbpack_netlist::{BlockKind, Netlist};

/// Initial required arrival time before the first analysis.
pub const MAX_ALLOWED_PATH_LEN: f32 = 10000.0;

/// What the forward sweep learned about the netlist.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ForwardResult {
    pub max_arrival_time: f32,
    pub farthest_block: Option<BlockId>,
    pub biggest_num_max_inputs: u64,
    pub avg_sink_distance: f32,
    pub avg_connection_delay: f32,
}

/// Wire delay between two blocks under the current packing.
fn wire_delay(netlist: &Netlist, from: BlockId, to: BlockId, delays: &DelayModel) -> f32 {
    match (netlist.cluster_of(from).cluster(), netlist.cluster_of(to).cluster()) {
        (Some(a), Some(b)) if a == b => delays.intra_cluster_net_delay,
        _ => delays.inter_cluster_net_delay,
    }
}

impl TimingAnalyzer {
    pub(crate) fn distance_from_sources(
        &mut self,
        netlist: &Netlist,
        delays: &DelayModel,
    ) -> ForwardResult {
        let mut max_arrival_time = 0.0_f32;
        let mut farthest_block = (netlist.num_blocks() > 0).then(|| BlockId::from_index(0));
        let mut biggest_num_max_inputs = 0;
        let mut connection_delay_sum = 0.0_f32;
        let mut num_connections = 0usize;

        self.queue.clear();
        self.queue.extend_from_slice(&self.initial_sources);
        let mut head = 0;
        while head < self.queue.len() {
            let parent = self.queue[head];
            head += 1;

            let block = netlist.block(parent);
            // An OUTPAD's pin 0 is an input.
            if block.kind == BlockKind::OutPad {
                continue;
            }
            let Some(out_net) = block.output() else {
                continue;
            };
            let net = netlist.net(out_net);
            if net.is_clock {
                continue;
            }

            let parent_is_source = self.is_initial_source[parent.index()];
            let parent_delay = self.blocks[parent.index()].delay_from_source;
            let parent_paths = self.blocks[parent.index()].num_max_inputs;

            for pos in 1..net.num_pins() {
                let discovered = net.pins[pos];
                let step = wire_delay(netlist, parent, discovered, delays) + delays.block_delay;
                connection_delay_sum += step;
                num_connections += 1;
                let arrival = if parent_is_source {
                    step
                } else {
                    parent_delay + step
                };

                let timing = &mut self.blocks[discovered.index()];
                let incoming_paths = if parent_is_source { 1 } else { parent_paths };
                if (timing.delay_from_source - arrival).abs() < EQUAL_EPSILON {
                    timing.num_max_inputs = timing.num_max_inputs.saturating_add(incoming_paths);
                } else if timing.delay_from_source < arrival {
                    timing.num_max_inputs = incoming_paths;
                }
                biggest_num_max_inputs = biggest_num_max_inputs.max(timing.num_max_inputs);

                self.nets[out_net.index()].arrival_time[pos] = arrival;
                if arrival > timing.delay_from_source {
                    timing.delay_from_source = arrival;
                }

                if (arrival - max_arrival_time).abs() >= EQUAL_EPSILON && arrival > max_arrival_time {
                    max_arrival_time = arrival;
                    farthest_block = Some(discovered);
                }

                let remaining = &mut self.in_remaining[discovered.index()];
                if *remaining > 0 {
                    *remaining -= 1;
                    if *remaining == 0 && !self.in_distance_queue[discovered.index()] {
                        self.in_distance_queue[discovered.index()] = true;
                        self.queue.push(discovered);
                    }
                }
            }
        }

        let sink_distance_sum: f32 = self
            .initial_sinks
            .iter()
            .map(|b| self.blocks[b.index()].delay_from_source)
            .sum();
        ForwardResult {
            max_arrival_time,
            farthest_block,
            biggest_num_max_inputs,
            avg_sink_distance: mean(sink_distance_sum, self.initial_sinks.len()),
            avg_connection_delay: mean(connection_delay_sum, num_connections),
        }
    }

    pub(crate) fn assign_required_arrival_times(&mut self, max_arrival_time: f32) {
        for timing in &mut self.blocks {
            timing.required_arrival_time = max_arrival_time;
        }
    }

    /// Returns the largest `num_max_outputs` seen.
    pub(crate) fn update_required_arrival_times(
        &mut self,
        netlist: &Netlist,
        delays: &DelayModel,
    ) -> u64 {
        let mut biggest_num_max_outputs = 0;

        self.queue.clear();
        self.queue.extend_from_slice(&self.initial_sinks);
        let mut head = 0;
        while head < self.queue.len() {
            let sink = self.queue[head];
            head += 1;

            let block = netlist.block(sink);
            let pins = match block.kind {
                BlockKind::InPad => continue,
                BlockKind::OutPad => 0..=0,
                // Clock pins are not timed.
                _ => 1..=self.lut_size,
            };

            let sink_is_initial = self.is_initial_sink[sink.index()];
            let sink_required = self.blocks[sink.index()].required_arrival_time;
            let sink_paths = self.blocks[sink.index()].num_max_outputs;

            for pin in pins {
                let Some(in_net) = block.pins[pin] else {
                    continue;
                };
                let Some(driver) = netlist.net(in_net).driver() else {
                    continue;
                };

                let required = sink_required
                    - wire_delay(netlist, driver, sink, delays)
                    - delays.block_delay;

                let remaining = &mut self.out_remaining[driver.index()];
                let now_complete = if *remaining > 0 {
                    *remaining -= 1;
                    *remaining == 0
                } else {
                    false
                };

                let timing = &mut self.blocks[driver.index()];
                let outgoing_paths = if sink_is_initial { 1 } else { sink_paths };
                if (timing.delay_from_source - required).abs() < EQUAL_EPSILON {
                    timing.num_max_outputs = timing.num_max_outputs.saturating_add(outgoing_paths);
                } else if timing.required_arrival_time > required {
                    timing.num_max_outputs = outgoing_paths;
                }
                biggest_num_max_outputs = biggest_num_max_outputs.max(timing.num_max_outputs);

                // Sinks keep the required time they started with.
                if !self.is_initial_sink[driver.index()] && timing.required_arrival_time > required {
                    timing.required_arrival_time = required;
                }

                if now_complete && !self.in_required_queue[driver.index()] {
                    self.in_required_queue[driver.index()] = true;
                    self.queue.push(driver);
                }
            }
        }

        biggest_num_max_outputs
    }
}

fn mean(sum: f32, count: usize) -> f32 {
    if count == 0 {
        0.0
    } else {
        sum / count as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::tests::{build, id, near_tie, DECIMAL_DELAYS, DELAYS, FORK};
    use clbpack_common::{approx_eq, ClusterId};
    use clbpack_netlist::ClusterAssignment;

    // -- Forward sweep tests --

    #[test]
    fn chain_arrival_times() {
        let nl = build(FORK);
        let mut ta = TimingAnalyzer::new(&nl, 4).unwrap();
        let farthest = ta.recompute(&nl, &DELAYS).unwrap();
        assert_eq!(farthest, Some(id(&nl, "o2")));
        assert_eq!(ta.delay_from_source(id(&nl, "l1")), 1.5);
        assert_eq!(ta.delay_from_source(id(&nl, "l2")), 3.0);
        assert_eq!(ta.delay_from_source(id(&nl, "o2")), 4.5);
        assert_eq!(ta.delay_from_source(id(&nl, "l3")), 1.5);
        assert_eq!(ta.delay_from_source(id(&nl, "o3")), 3.0);
        assert_eq!(ta.summary().max_arrival_time, 4.5);

        let x2 = nl.net_by_name("x2").unwrap();
        assert_eq!(ta.arrival_time(x2, 1), 4.5);
    }

    #[test]
    fn intra_cluster_connections_are_faster() {
        let mut nl = build(FORK);
        let c0 = ClusterAssignment::Cluster(ClusterId::from_raw(0));
        nl.set_cluster(id(&nl, "l1"), c0);
        nl.set_cluster(id(&nl, "l2"), c0);
        let mut ta = TimingAnalyzer::new(&nl, 4).unwrap();
        ta.recompute(&nl, &DELAYS).unwrap();
        assert_eq!(ta.delay_from_source(id(&nl, "l2")), 2.25);
        assert_eq!(ta.delay_from_source(id(&nl, "o2")), 3.75);
    }

    #[test]
    fn reconvergent_paths_tie() {
        let nl = build(
            r#"{"blocks": [
            {"name": "a", "kind": "inpad", "output": "a"},
            {"name": "l1", "kind": "lut", "output": "x1", "inputs": ["a"]},
            {"name": "l2", "kind": "lut", "output": "x2", "inputs": ["a"]},
            {"name": "l3", "kind": "lut", "output": "y", "inputs": ["x1", "x2"]},
            {"name": "o", "kind": "outpad", "inputs": ["y"]}
        ]}"#,
        );
        let mut ta = TimingAnalyzer::new(&nl, 4).unwrap();
        ta.recompute(&nl, &DELAYS).unwrap();
        assert_eq!(ta.delay_from_source(id(&nl, "l3")), 3.0);
        assert_eq!(ta.num_max_inputs(id(&nl, "l3")), 2);
        assert_eq!(ta.num_max_inputs(id(&nl, "o")), 2);
    }

    #[test]
    fn arrivals_within_epsilon_tie() {
        let nl = near_tie();
        let mut ta = TimingAnalyzer::new(&nl, 4).unwrap();
        ta.recompute(&nl, &DECIMAL_DELAYS).unwrap();

        let x5 = nl.net_by_name("x5").unwrap();
        let y = nl.net_by_name("y").unwrap();
        let through_chain = ta.arrival_time(x5, 1);
        let direct = ta.arrival_time(y, 1);
        assert_ne!(through_chain, direct);
        assert!(approx_eq(through_chain, direct));
        assert_eq!(ta.num_max_inputs(id(&nl, "j")), 2);
        assert_eq!(ta.delay_from_source(id(&nl, "j")), through_chain.max(direct));
    }

    #[test]
    fn deep_reconvergence_saturates_path_counts() {
        // Every stage reads both blocks of the stage before it, so the number
        // of longest paths doubles per stage and passes u64::MAX.
        const STAGES: usize = 70;
        let mut blocks = vec![
            r#"{"name": "a", "kind": "inpad", "output": "p_in"}"#.to_string(),
            r#"{"name": "b", "kind": "inpad", "output": "q_in"}"#.to_string(),
        ];
        for k in 0..STAGES {
            let (p_prev, q_prev) = if k == 0 {
                ("p_in".to_string(), "q_in".to_string())
            } else {
                (format!("p{}", k - 1), format!("q{}", k - 1))
            };
            for side in ["p", "q"] {
                blocks.push(format!(
                    r#"{{"name": "{side}{k}", "kind": "lut", "output": "{side}{k}", "inputs": ["{p_prev}", "{q_prev}"]}}"#
                ));
            }
        }
        let last = STAGES - 1;
        blocks.push(format!(r#"{{"name": "op", "kind": "outpad", "inputs": ["p{last}"]}}"#));
        blocks.push(format!(r#"{{"name": "oq", "kind": "outpad", "inputs": ["q{last}"]}}"#));
        let nl = build(&format!(r#"{{"blocks": [{}]}}"#, blocks.join(",")));

        let mut ta = TimingAnalyzer::new(&nl, 4).unwrap();
        let farthest = ta.recompute(&nl, &DELAYS).unwrap();
        assert!(farthest.is_some());
        assert_eq!(ta.num_max_inputs(id(&nl, "p0")), 2);
        assert_eq!(ta.num_max_inputs(id(&nl, "p10")), 1 << 11);
        assert_eq!(ta.num_max_inputs(id(&nl, &format!("p{last}"))), u64::MAX);
        assert_eq!(ta.num_max_outputs(id(&nl, "p0")), u64::MAX);
        assert_eq!(ta.summary().max_arrival_time, 1.5 * (STAGES + 1) as f32);
        for block in nl.block_ids() {
            assert!(ta.criticality(block).is_finite());
        }
    }

    #[test]
    fn clock_nets_are_not_traversed() {
        let nl = build(
            r#"{"blocks": [
            {"name": "clk", "kind": "inpad", "output": "clk"},
            {"name": "d", "kind": "inpad", "output": "d"},
            {"name": "ff", "kind": "latch", "output": "q", "inputs": ["d"], "clock": "clk"},
            {"name": "g", "kind": "lut", "output": "y", "inputs": ["q"]},
            {"name": "o", "kind": "outpad", "inputs": ["y"]}
        ]}"#,
        );
        let mut ta = TimingAnalyzer::new(&nl, 4).unwrap();
        ta.recompute(&nl, &DELAYS).unwrap();
        // The latch restarts timing, so g is one hop from a source.
        assert_eq!(ta.delay_from_source(id(&nl, "g")), 1.5);
        assert_eq!(ta.delay_from_source(id(&nl, "o")), 3.0);
        let clk = nl.net_by_name("clk").unwrap();
        assert_eq!(ta.arrival_time(clk, 1), 0.0);
    }

    // -- Backward sweep tests --

    #[test]
    fn required_times_on_fork() {
        let nl = build(FORK);
        let mut ta = TimingAnalyzer::new(&nl, 4).unwrap();
        ta.recompute(&nl, &DELAYS).unwrap();
        assert_eq!(ta.required_arrival_time(id(&nl, "o2")), 4.5);
        assert_eq!(ta.required_arrival_time(id(&nl, "o3")), 4.5);
        assert_eq!(ta.required_arrival_time(id(&nl, "l2")), 3.0);
        assert_eq!(ta.required_arrival_time(id(&nl, "l1")), 1.5);
        assert_eq!(ta.required_arrival_time(id(&nl, "l3")), 3.0);
        assert_eq!(ta.required_arrival_time(id(&nl, "a")), 0.0);

        assert_eq!(ta.num_max_outputs(id(&nl, "l2")), 2);
        assert_eq!(ta.num_max_outputs(id(&nl, "l1")), 3);
        assert_eq!(ta.num_max_outputs(id(&nl, "l3")), 1);
        assert_eq!(ta.num_max_outputs(id(&nl, "a")), 4);
    }

    #[test]
    fn averages() {
        let nl = build(FORK);
        let mut ta = TimingAnalyzer::new(&nl, 4).unwrap();
        ta.recompute(&nl, &DELAYS).unwrap();
        let summary = ta.summary();
        // Sinks o2 and o3 sit at 4.5 and 3.0.
        assert!(approx_eq(summary.avg_sink_distance, 3.75));
        // Five connections, all inter-cluster.
        assert!(approx_eq(summary.avg_connection_delay, 1.5));
    }
}
