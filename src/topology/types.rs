//! Topology type definitions.
//!
//! This file contains the chain topology model: LAN segments, the shared
//! boundary nodes joining adjacent segments, and the roles derived from a
//! node's position in the chain.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Opaque node identifier (index into the simulator's node container)
pub type NodeId = u32;

/// A single broadcast domain in the chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanSegment {
    /// Position of the segment in the chain, starting at 0
    pub index: usize,
    /// Member nodes, in installation order
    pub members: Vec<NodeId>,
}

impl LanSegment {
    /// Returns true if the node is attached to this segment
    pub fn contains(&self, node: NodeId) -> bool {
        self.members.contains(&node)
    }

    /// Position of the node within the segment's member list
    pub fn position(&self, node: NodeId) -> Option<usize> {
        self.members.iter().position(|&member| member == node)
    }
}

/// Role of a node, derived from where it sits in the chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeRole {
    /// First member of the first segment; originates the multicast stream
    Source,
    /// Boundary node shared by two adjacent segments
    Relay,
    /// Designated listener in the last segment
    Sink,
    /// Any other member
    Plain,
}

/// Immutable chain of LAN segments.
///
/// Only [`crate::topology::build_chain`] validates the invariants. A topology
/// obtained through deserialization is taken as-is, which is why the tree
/// builder re-derives the junctions from segment membership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainTopology {
    pub(crate) segments: Vec<LanSegment>,
    /// Boundary node of junction `i` (between segment `i` and `i + 1`)
    pub(crate) junctions: Vec<NodeId>,
    pub(crate) sink: NodeId,
}

impl ChainTopology {
    pub fn segments(&self) -> &[LanSegment] {
        &self.segments
    }

    pub fn segment(&self, index: usize) -> Option<&LanSegment> {
        self.segments.get(index)
    }

    /// Number of segments in the chain
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Boundary nodes, one per junction, in chain order
    pub fn junctions(&self) -> &[NodeId] {
        &self.junctions
    }

    /// The multicast source: first member of the first segment
    pub fn source(&self) -> Option<NodeId> {
        self.segments.first().and_then(|segment| segment.members.first().copied())
    }

    pub fn sink(&self) -> NodeId {
        self.sink
    }

    /// Returns true if the node is a member of any segment
    pub fn contains_node(&self, node: NodeId) -> bool {
        self.segments.iter().any(|segment| segment.contains(node))
    }

    /// All distinct nodes of the chain, sorted
    pub fn nodes(&self) -> BTreeSet<NodeId> {
        self.segments
            .iter()
            .flat_map(|segment| segment.members.iter().copied())
            .collect()
    }

    /// Indices of the segments the node is attached to
    pub fn segments_of(&self, node: NodeId) -> Vec<usize> {
        self.segments
            .iter()
            .filter(|segment| segment.contains(node))
            .map(|segment| segment.index)
            .collect()
    }

    /// Derive the role of a node from its position in the chain
    pub fn role_of(&self, node: NodeId) -> Option<NodeRole> {
        if !self.contains_node(node) {
            return None;
        }
        if self.source() == Some(node) {
            Some(NodeRole::Source)
        } else if self.junctions.contains(&node) {
            Some(NodeRole::Relay)
        } else if self.sink == node {
            Some(NodeRole::Sink)
        } else {
            Some(NodeRole::Plain)
        }
    }
}
