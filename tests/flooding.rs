//! End-to-end flooding behavior over generated topologies.

use std::collections::{HashMap, HashSet, VecDeque};

use flooding_mesh_simulator::common::scene::{NodeRecord, Scene};
use flooding_mesh_simulator::{
    Medium, MessageId, NodeId, NodeKind, NodeStatus, Position, ProcessOutcome, Simulation, SimulationConfig,
};
use proptest::prelude::*;

fn record(id: NodeId, x: i32, y: i32, power: u32, online: bool) -> NodeRecord {
    NodeRecord {
        id,
        pos: Position::new(x, y),
        power,
        status: NodeStatus::from_online(online),
        kind: NodeKind::Flooding,
    }
}

fn build(records: Vec<NodeRecord>) -> Simulation {
    Simulation::from_scene(&Scene { nodes: records }, &SimulationConfig::default()).unwrap()
}

/// Hop distance from `from` to `to` over the online reachability graph.
fn hops(medium: &Medium, from: NodeId, to: NodeId) -> Option<u64> {
    let mut adjacency: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
    for (a, b) in medium.links() {
        adjacency.entry(a).or_default().push(b);
    }

    let mut seen = HashSet::from([from]);
    let mut queue = VecDeque::from([(from, 0u64)]);
    while let Some((node, distance)) = queue.pop_front() {
        if node == to {
            return Some(distance);
        }
        for &next in adjacency.get(&node).into_iter().flatten() {
            if seen.insert(next) {
                queue.push_back((next, distance + 1));
            }
        }
    }
    None
}

fn topology(max_nodes: usize) -> impl Strategy<Value = Vec<(i32, i32, u32, bool)>> {
    prop::collection::vec((0..20i32, 0..20i32, 0..8u32, prop::bool::weighted(0.8)), 1..max_nodes)
}

fn records_from(nodes: &[(i32, i32, u32, bool)]) -> Vec<NodeRecord> {
    nodes
        .iter()
        .enumerate()
        .map(|(i, &(x, y, power, online))| record(i as NodeId, x, y, power, online))
        .collect()
}

proptest! {
    #[test]
    fn each_id_is_consumed_and_relayed_at_most_once(nodes in topology(10), injections in 1..4usize) {
        let mut sim = build(records_from(&nodes));
        let mut consumed: HashSet<(NodeId, MessageId)> = HashSet::new();
        let mut relayed: HashSet<(NodeId, MessageId)> = HashSet::new();

        for _ in 0..injections {
            let _ = sim.inject_new_message();
        }

        for _ in 0..(4 * nodes.len() + 4) {
            let report = sim.step();
            for (node, outcome) in &report.outcomes {
                match outcome {
                    ProcessOutcome::Consumed(m) => prop_assert!(consumed.insert((*node, m.id))),
                    ProcessOutcome::Relayed(m) => prop_assert!(relayed.insert((*node, m.id))),
                    _ => {}
                }
            }
            for &(node, id) in relayed.iter() {
                prop_assert!(sim.medium().find_node_by_id(node).unwrap().has_relayed(id));
            }
            for &(node, id) in consumed.iter() {
                prop_assert!(sim.medium().find_node_by_id(node).unwrap().has_consumed(id));
            }
        }
    }

    #[test]
    fn received_messages_wait_for_the_next_step(nodes in topology(10)) {
        let mut sim = build(records_from(&nodes));
        let _ = sim.inject_new_message();

        let mut first_received: HashMap<NodeId, u64> = HashMap::new();
        for _ in 0..(3 * nodes.len() + 3) {
            let report = sim.step();
            for (node, outcome) in &report.outcomes {
                if *node == 0 {
                    continue;
                }
                let received = first_received.get(node).copied();
                prop_assert!(received.is_some(), "node {} processed without a delivery", node);
                prop_assert!(received.unwrap() < report.step, "{:?}", outcome);
            }
            for emission in &report.emissions {
                for &recipient in &emission.recipients {
                    first_received.entry(recipient).or_insert(report.step);
                }
            }
        }
    }

    #[test]
    fn offline_nodes_never_queue_or_emit(nodes in topology(10)) {
        let mut sim = build(records_from(&nodes));
        let _ = sim.inject_new_message();
        let offline: Vec<NodeId> = sim.medium().nodes().iter().filter(|n| !n.is_online()).map(|n| n.id()).collect();

        for _ in 0..(3 * nodes.len() + 3) {
            let report = sim.step();
            for emission in &report.emissions {
                prop_assert!(!offline.contains(&emission.emitter));
                prop_assert!(emission.recipients.iter().all(|r| !offline.contains(r)));
            }
            for id in &offline {
                let node = sim.medium().find_node_by_id(*id).unwrap();
                prop_assert!(node.input_queue().is_empty());
                prop_assert!(node.output_queue().is_empty());
            }
        }
    }

    #[test]
    fn delivery_step_equals_hop_count(positions in prop::collection::vec((0..12i32, 0..12i32), 2..9), power in 1..6u32) {
        let records: Vec<NodeRecord> = positions
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| record(i as NodeId, x, y, power, true))
            .collect();
        let mut sim = build(records);
        let destination = sim.medium().get_highest_node_id();
        let expected = hops(sim.medium(), 0, destination);

        sim.inject_new_message().unwrap();
        let mut delivered_at = None;
        for _ in 0..(3 * positions.len() + 3) {
            let report = sim.step();
            if report.deliveries().any(|(node, _)| node == destination) {
                delivered_at = Some(report.step);
            }
        }

        prop_assert_eq!(delivered_at, expected);
    }
}

#[test]
fn chain_of_ranges_is_required_for_delivery() {
    let mut sim = build(vec![
        record(0, 0, 0, 5, true),
        record(1, 3, 0, 5, true),
        record(3, 10, 0, 5, true),
    ]);
    sim.inject_new_message().unwrap();
    for _ in 0..10 {
        sim.step();
    }
    assert_eq!(sim.stats().delivered, 0);

    // A relay covering the gap completes the chain for the next message.
    assert_eq!(sim.create_node(Position::new(7, 0)), 2);
    sim.inject_new_message().unwrap();
    let mut delivered = Vec::new();
    for _ in 0..10 {
        let report = sim.step();
        delivered.extend(report.deliveries().map(|(node, m)| (report.step, node, m.id)));
    }
    assert_eq!(delivered, vec![(13, 3, 1)]);
}

#[test]
fn duplicate_burst_drains_one_per_step() {
    // Node 4 hears the flood from nodes 1, 2 and 3 in the same step.
    let mut sim = build(vec![
        record(0, 0, 0, 2, true),
        record(1, 2, 0, 4, true),
        record(2, 1, 1, 4, true),
        record(3, 1, -1, 4, true),
        record(4, 4, 0, 0, true),
        record(5, 50, 50, 0, true),
    ]);
    sim.inject_new_message().unwrap();
    sim.step();
    sim.step();

    let burst = sim.medium().find_node_by_id(4).unwrap().input_queue().len();
    assert_eq!(burst, 3);

    let mut remaining = burst;
    while remaining > 0 {
        sim.step();
        let now = sim.medium().find_node_by_id(4).unwrap().input_queue().len();
        assert_eq!(now + 1, remaining);
        remaining = now;
    }
    assert!(sim.medium().find_node_by_id(4).unwrap().has_relayed(0));
}
