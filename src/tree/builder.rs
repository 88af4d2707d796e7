//! Distribution tree construction.
//!
//! Walks the chain from source to sink and emits, for every hop, the
//! forwarding entries a node needs to push the group's traffic one segment
//! further: a default route at the source, then a relay rule plus a default
//! route at every junction's boundary node.

use std::net::Ipv4Addr;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::PlanError;
use crate::topology::{shared_nodes, ChainTopology, NodeId};

/// Group-matched forwarding entry installed on a boundary node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayRule {
    pub router: NodeId,
    pub input_segment: usize,
    pub output_segment: usize,
    pub group: Ipv4Addr,
}

/// Fallback multicast route for traffic without a more specific match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultRoute {
    pub node: NodeId,
    pub output_segment: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ForwardingEntry {
    Relay(RelayRule),
    Default(DefaultRoute),
}

impl ForwardingEntry {
    /// Node the entry is installed on
    pub fn node(&self) -> NodeId {
        match self {
            Self::Relay(rule) => rule.router,
            Self::Default(route) => route.node,
        }
    }

    /// Segment indices the entry refers to
    pub fn segments(&self) -> Vec<usize> {
        match self {
            Self::Relay(rule) => vec![rule.input_segment, rule.output_segment],
            Self::Default(route) => vec![route.output_segment],
        }
    }
}

/// Ordered forwarding entries realizing one group's tree over the chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionTree {
    pub group: Ipv4Addr,
    pub entries: Vec<ForwardingEntry>,
}

impl DistributionTree {
    pub fn relay_rules(&self) -> impl Iterator<Item = &RelayRule> {
        self.entries.iter().filter_map(|entry| match entry {
            ForwardingEntry::Relay(rule) => Some(rule),
            ForwardingEntry::Default(_) => None,
        })
    }

    pub fn default_routes(&self) -> impl Iterator<Item = &DefaultRoute> {
        self.entries.iter().filter_map(|entry| match entry {
            ForwardingEntry::Default(route) => Some(route),
            ForwardingEntry::Relay(_) => None,
        })
    }
}

/// Build the forwarding entries for `group` along the chain.
///
/// Junction boundary nodes are recomputed from segment membership, so a
/// topology that never went through [`crate::topology::build_chain`] still
/// fails cleanly with [`PlanError::DisconnectedChain`].
///
/// # Examples
/// ```
/// use chaincast::topology::build_chain;
/// use chaincast::tree::build_distribution_tree;
///
/// let chain = build_chain(&[vec![0, 1, 2], vec![2, 3, 4]]).unwrap();
/// let tree = build_distribution_tree(&chain, "225.1.2.4".parse().unwrap()).unwrap();
/// assert_eq!(tree.relay_rules().count(), 1);
/// assert_eq!(tree.default_routes().count(), 2);
/// ```
pub fn build_distribution_tree(
    topology: &ChainTopology,
    group: Ipv4Addr,
) -> Result<DistributionTree, PlanError> {
    let source = topology
        .source()
        .ok_or_else(|| PlanError::InvalidTopology("chain has no segments".to_string()))?;

    let segments = topology.segments();
    let mut entries = Vec::with_capacity(2 * segments.len() - 1);
    entries.push(ForwardingEntry::Default(DefaultRoute { node: source, output_segment: 0 }));

    for (junction, pair) in segments.windows(2).enumerate() {
        let shared = shared_nodes(&pair[0], &pair[1]);
        let [boundary] = shared[..] else {
            return Err(PlanError::DisconnectedChain { junction });
        };

        debug!(
            "Junction {}: node {} relays {} from segment {} to {}",
            junction,
            boundary,
            group,
            junction,
            junction + 1
        );
        entries.push(ForwardingEntry::Relay(RelayRule {
            router: boundary,
            input_segment: junction,
            output_segment: junction + 1,
            group,
        }));
        entries.push(ForwardingEntry::Default(DefaultRoute {
            node: boundary,
            output_segment: junction + 1,
        }));
    }

    info!(
        "Built distribution tree for {}: {} relay rules, {} default routes",
        group,
        segments.len() - 1,
        segments.len()
    );
    Ok(DistributionTree { group, entries })
}
