//! Chain construction and validation.
//!
//! Turns an ordered list of segment membership lists into a validated
//! [`ChainTopology`].

use std::collections::{BTreeMap, HashSet};

use log::debug;

use super::types::{ChainTopology, LanSegment, NodeId};
use crate::error::PlanError;

/// Nodes attached to both segments, in the order they appear in `a`
pub(crate) fn shared_nodes(a: &LanSegment, b: &LanSegment) -> Vec<NodeId> {
    a.members.iter().copied().filter(|&node| b.contains(node)).collect()
}

/// Build a chain whose sink is the last member of the last segment.
///
/// # Examples
/// ```
/// use chaincast::topology::build_chain;
///
/// let chain = build_chain(&[vec![0, 1, 2], vec![2, 3, 4]]).unwrap();
/// assert_eq!(chain.junctions(), &[2]);
/// assert_eq!(chain.source(), Some(0));
/// assert_eq!(chain.sink(), 4);
/// ```
pub fn build_chain(segments: &[Vec<NodeId>]) -> Result<ChainTopology, PlanError> {
    build_chain_with_sink(segments, None)
}

/// Build a chain with an explicitly designated sink.
///
/// The sink must be a member of the last segment that is neither the source
/// nor a boundary node.
pub fn build_chain_with_sink(
    segments: &[Vec<NodeId>],
    sink: Option<NodeId>,
) -> Result<ChainTopology, PlanError> {
    if segments.is_empty() {
        return Err(PlanError::InvalidTopology("chain has no segments".to_string()));
    }

    let segments: Vec<LanSegment> = segments
        .iter()
        .enumerate()
        .map(|(index, members)| LanSegment { index, members: members.clone() })
        .collect();

    for segment in &segments {
        if segment.members.len() < 2 {
            return Err(PlanError::InvalidTopology(format!(
                "segment {} has {} node(s), at least 2 are required",
                segment.index,
                segment.members.len()
            )));
        }
        let mut seen = HashSet::new();
        for &node in &segment.members {
            if !seen.insert(node) {
                return Err(PlanError::InvalidTopology(format!(
                    "node {} appears more than once in segment {}",
                    node, segment.index
                )));
            }
        }
    }

    let mut junctions = Vec::with_capacity(segments.len() - 1);
    for pair in segments.windows(2) {
        let shared = shared_nodes(&pair[0], &pair[1]);
        if shared.len() != 1 {
            return Err(PlanError::InvalidTopology(format!(
                "segments {} and {} share {} node(s), expected exactly one boundary node",
                pair[0].index,
                pair[1].index,
                shared.len()
            )));
        }
        junctions.push(shared[0]);
    }

    // Any node attached to several segments must be the boundary of exactly
    // one junction and attached to nothing else.
    let mut attachments: BTreeMap<NodeId, Vec<usize>> = BTreeMap::new();
    for segment in &segments {
        for &node in &segment.members {
            attachments.entry(node).or_default().push(segment.index);
        }
    }
    for (node, indices) in &attachments {
        if indices.len() == 1 {
            continue;
        }
        let is_junction = indices.len() == 2
            && indices[1] == indices[0] + 1
            && junctions[indices[0]] == *node;
        if !is_junction {
            return Err(PlanError::InvalidTopology(format!(
                "node {} appears in segments {:?} but is not the boundary node of a single junction",
                node, indices
            )));
        }
    }

    let source = segments[0].members[0];
    if junctions.contains(&source) {
        return Err(PlanError::InvalidTopology(format!(
            "source node {} cannot also be a boundary node",
            source
        )));
    }

    let last = &segments[segments.len() - 1];
    let sink = match sink {
        Some(node) => node,
        None => last.members[last.members.len() - 1],
    };
    if !last.contains(sink) {
        return Err(PlanError::InvalidTopology(format!(
            "sink node {} is not a member of the last segment {}",
            sink, last.index
        )));
    }
    if sink == source || junctions.contains(&sink) {
        return Err(PlanError::InvalidTopology(format!(
            "sink node {} must not be the source or a boundary node",
            sink
        )));
    }

    debug!(
        "Built chain with {} segments, junctions {:?}, source {}, sink {}",
        segments.len(),
        junctions,
        source,
        sink
    );

    Ok(ChainTopology { segments, junctions, sink })
}
