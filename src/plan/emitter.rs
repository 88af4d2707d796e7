//! Distribution plan emission.
//!
//! Packages the topology, address plan and forwarding entries into a
//! [`DistributionPlan`] and checks that the pieces agree with each other.

use log::info;

use super::types::{DistributionPlan, SessionSpec, TrafficSpec};
use crate::error::PlanError;
use crate::ip::{assign_interface_addresses, AddressPlan};
use crate::topology::{shared_nodes, ChainTopology, NodeId};
use crate::tree::{DistributionTree, ForwardingEntry};
use crate::utils::validate_multicast_group;

fn inconsistent(message: String) -> PlanError {
    PlanError::PlanConsistency(message)
}

/// Check that every forwarding entry refers to known segments, that its
/// node is actually attached to them, and that relays carry the tree's group
fn check_entries(topology: &ChainTopology, tree: &DistributionTree) -> Result<(), PlanError> {
    for entry in &tree.entries {
        let node = entry.node();
        if !topology.contains_node(node) {
            return Err(inconsistent(format!("{:?} references unknown node {}", entry, node)));
        }
        for segment in entry.segments() {
            let Some(lan) = topology.segment(segment) else {
                return Err(inconsistent(format!(
                    "{:?} references unknown segment {}",
                    entry, segment
                )));
            };
            if !lan.contains(node) {
                return Err(inconsistent(format!(
                    "node {} is not attached to segment {} referenced by {:?}",
                    node, segment, entry
                )));
            }
        }
        if let ForwardingEntry::Relay(rule) = entry {
            if rule.group != tree.group {
                return Err(inconsistent(format!(
                    "relay on node {} forwards {} but the tree distributes {}",
                    rule.router, rule.group, tree.group
                )));
            }
        }
    }
    Ok(())
}

/// Check endpoint roles against segment membership.
///
/// Boundary nodes are recomputed from the segments rather than read from the
/// topology, which may have been deserialized without validation.
fn check_endpoints(topology: &ChainTopology, source: NodeId, sink: NodeId) -> Result<(), PlanError> {
    if topology.source() != Some(source) {
        return Err(inconsistent(format!(
            "source node {} is not the first member of segment 0",
            source
        )));
    }

    let segments = topology.segments();
    let Some(last) = segments.last() else {
        return Err(inconsistent("topology has no segments".to_string()));
    };
    if !last.contains(sink) {
        return Err(inconsistent(format!(
            "sink node {} is not a member of the last segment {}",
            sink, last.index
        )));
    }

    let boundaries: Vec<NodeId> = segments
        .windows(2)
        .flat_map(|pair| shared_nodes(&pair[0], &pair[1]))
        .collect();
    if boundaries.contains(&source) {
        return Err(inconsistent(format!("source node {} is also a boundary node", source)));
    }
    if sink == source || boundaries.contains(&sink) {
        return Err(inconsistent(format!(
            "sink node {} must not be the source or a boundary node",
            sink
        )));
    }

    if topology.sink() != sink {
        return Err(inconsistent(format!(
            "sink node {} does not match the chain's designated sink {}",
            sink,
            topology.sink()
        )));
    }
    Ok(())
}

/// Check application timing and ports
fn check_session(traffic: &TrafficSpec, session: &SessionSpec) -> Result<(), PlanError> {
    if traffic.packet_size == 0 {
        return Err(inconsistent("traffic packet size must be positive".to_string()));
    }
    if traffic.start >= traffic.stop {
        return Err(inconsistent(format!(
            "traffic start {:?} must be before stop {:?}",
            traffic.start, traffic.stop
        )));
    }
    let listener = &session.listener;
    if listener.port != traffic.port {
        return Err(inconsistent(format!(
            "listener port {} does not match traffic port {}",
            listener.port, traffic.port
        )));
    }
    if listener.start >= listener.stop {
        return Err(inconsistent(format!(
            "listener start {:?} must be before stop {:?}",
            listener.start, listener.stop
        )));
    }
    Ok(())
}

/// Package a validated distribution plan.
///
/// Fails with [`PlanError::PlanConsistency`] if the rules reference unknown
/// segments or nodes, the address plan does not cover exactly the chain's
/// segments, the endpoints disagree with the topology, or the traffic
/// specification does not target the tree's group.
pub fn emit_plan(
    topology: &ChainTopology,
    address_plan: &AddressPlan,
    tree: &DistributionTree,
    source: NodeId,
    sink: NodeId,
    traffic: TrafficSpec,
    session: SessionSpec,
) -> Result<DistributionPlan, PlanError> {
    if topology.is_empty() {
        return Err(inconsistent("topology has no segments".to_string()));
    }

    check_entries(topology, tree)?;

    if address_plan.len() != topology.len() {
        return Err(inconsistent(format!(
            "address plan has {} blocks for {} segments",
            address_plan.len(),
            topology.len()
        )));
    }
    if let Some(block) = address_plan.blocks().find(|block| topology.segment(block.segment).is_none()) {
        return Err(inconsistent(format!(
            "address block {} assigned to unknown segment {}",
            block.network, block.segment
        )));
    }
    if !address_plan.is_disjoint() {
        return Err(inconsistent("address blocks overlap".to_string()));
    }

    check_endpoints(topology, source, sink)?;

    validate_multicast_group(tree.group).map_err(inconsistent)?;
    if traffic.group != tree.group {
        return Err(inconsistent(format!(
            "traffic targets {} but the tree distributes {}",
            traffic.group, tree.group
        )));
    }
    check_session(&traffic, &session)?;

    let registry = assign_interface_addresses(topology, address_plan)?;
    let source_address = registry
        .address_of(source, 0)
        .ok_or_else(|| inconsistent(format!("source node {} has no address on segment 0", source)))?;

    info!(
        "Emitted plan: {} segments, source {} ({}), sink {}, group {}",
        topology.len(),
        source,
        source_address,
        sink,
        tree.group
    );

    Ok(DistributionPlan {
        topology: topology.clone(),
        addresses: address_plan.clone(),
        interfaces: registry.assignments(),
        group: tree.group,
        source,
        source_address,
        sink,
        entries: tree.entries.clone(),
        channel: session.channel,
        traffic,
        listener: session.listener,
        tracing: session.tracing,
    })
}
