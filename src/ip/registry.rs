//! Interface address registry.
//!
//! This file tracks the concrete address every (node, segment) interface
//! receives from its segment's block and guarantees that no address is handed
//! out twice. Numbering mirrors the engine's sequential address helper: the
//! k-th member of a segment gets host k+1 of the block.

use std::collections::{BTreeMap, HashMap};
use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

use super::allocator::{AddressBlock, AddressPlan};
use crate::error::PlanError;
use crate::topology::{ChainTopology, LanSegment, NodeId};

/// Address held by one node on one segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceAddress {
    pub node: NodeId,
    pub segment: usize,
    pub address: Ipv4Addr,
}

/// Registry of interface addresses across the whole chain
#[derive(Debug, Default)]
pub struct InterfaceAddressRegistry {
    /// Address -> owning (node, segment), for collision detection
    owners: HashMap<Ipv4Addr, (NodeId, usize)>,
    /// (node, segment) -> address, ordered for deterministic output
    by_interface: BTreeMap<(NodeId, usize), Ipv4Addr>,
}

impl InterfaceAddressRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an address for an interface, rejecting reuse by another interface
    pub fn register(&mut self, node: NodeId, segment: usize, address: Ipv4Addr) -> Result<(), PlanError> {
        if let Some(&(owner, owner_segment)) = self.owners.get(&address) {
            if (owner, owner_segment) != (node, segment) {
                return Err(PlanError::PlanConsistency(format!(
                    "address {} already assigned to node {} on segment {}",
                    address, owner, owner_segment
                )));
            }
            return Ok(());
        }
        if let Some(existing) = self.by_interface.get(&(node, segment)) {
            return Err(PlanError::PlanConsistency(format!(
                "node {} already holds {} on segment {}",
                node, existing, segment
            )));
        }
        self.owners.insert(address, (node, segment));
        self.by_interface.insert((node, segment), address);
        Ok(())
    }

    /// Number every member of a segment from its block
    pub fn assign_segment(&mut self, segment: &LanSegment, block: &AddressBlock) -> Result<(), PlanError> {
        for (position, &node) in segment.members.iter().enumerate() {
            let address = block.host(position as u32 + 1).ok_or_else(|| {
                PlanError::AddressSpaceExhausted(format!(
                    "block {} has no host address for member {} of segment {}",
                    block.network, position, segment.index
                ))
            })?;
            self.register(node, segment.index, address)?;
        }
        Ok(())
    }

    pub fn address_of(&self, node: NodeId, segment: usize) -> Option<Ipv4Addr> {
        self.by_interface.get(&(node, segment)).copied()
    }

    /// The interface that owns a given address
    pub fn owner_of(&self, address: Ipv4Addr) -> Option<(NodeId, usize)> {
        self.owners.get(&address).copied()
    }

    pub fn len(&self) -> usize {
        self.by_interface.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_interface.is_empty()
    }

    /// All assignments, ordered by node then segment
    pub fn assignments(&self) -> Vec<InterfaceAddress> {
        self.by_interface
            .iter()
            .map(|(&(node, segment), &address)| InterfaceAddress { node, segment, address })
            .collect()
    }
}

/// Number every interface of the chain from the address plan
pub fn assign_interface_addresses(
    topology: &ChainTopology,
    plan: &AddressPlan,
) -> Result<InterfaceAddressRegistry, PlanError> {
    let mut registry = InterfaceAddressRegistry::new();
    for segment in topology.segments() {
        let block = plan.get(segment.index).ok_or_else(|| {
            PlanError::PlanConsistency(format!("segment {} has no address block", segment.index))
        })?;
        registry.assign_segment(segment, block)?;
    }
    log::info!("Assigned {} interface addresses", registry.len());
    Ok(registry)
}
