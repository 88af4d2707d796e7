//! Segment address block allocation.
//!
//! Each LAN segment receives its own block, handed out in chain order by
//! stepping one block at a time from the configured base network. With the
//! default /24 blocks this increments the third octet: `10.1.1.0/24`,
//! `10.1.2.0/24`, and so on.

use std::collections::BTreeMap;
use std::net::Ipv4Addr;

use ipnet::Ipv4Net;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::PlanError;
use crate::topology::ChainTopology;

/// Longest segment prefix that still leaves room for two hosts
const MAX_SEGMENT_PREFIX: u8 = 30;

/// Address block owned by one segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressBlock {
    pub segment: usize,
    pub network: Ipv4Net,
}

impl AddressBlock {
    /// Network address of the block (e.g. `10.1.1.0`)
    pub fn base(&self) -> Ipv4Addr {
        self.network.network()
    }

    /// Dotted netmask of the block (e.g. `255.255.255.0`)
    pub fn mask(&self) -> Ipv4Addr {
        self.network.netmask()
    }

    /// Number of usable host addresses (network and broadcast excluded)
    pub fn host_capacity(&self) -> u32 {
        let size = 1u64 << (32 - u32::from(self.network.prefix_len()));
        size.saturating_sub(2) as u32
    }

    /// Host address by 1-based ordinal, the way the engine's address helper
    /// numbers interfaces
    pub fn host(&self, ordinal: u32) -> Option<Ipv4Addr> {
        if ordinal == 0 || ordinal > self.host_capacity() {
            return None;
        }
        Some(Ipv4Addr::from(u32::from(self.base()) + ordinal))
    }

    pub fn overlaps(&self, other: &AddressBlock) -> bool {
        self.network.contains(&other.network) || other.network.contains(&self.network)
    }
}

/// Address blocks keyed by segment index
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressPlan {
    blocks: BTreeMap<usize, AddressBlock>,
}

impl AddressPlan {
    pub fn get(&self, segment: usize) -> Option<&AddressBlock> {
        self.blocks.get(&segment)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Blocks in segment order
    pub fn blocks(&self) -> impl Iterator<Item = &AddressBlock> {
        self.blocks.values()
    }

    /// Returns true if no two blocks overlap
    pub fn is_disjoint(&self) -> bool {
        let blocks: Vec<&AddressBlock> = self.blocks.values().collect();
        blocks
            .iter()
            .enumerate()
            .all(|(i, a)| blocks[i + 1..].iter().all(|b| !a.overlaps(b)))
    }
}

/// Assign one address block per segment.
///
/// `base_network` carries both the first block's address and the budget: its
/// prefix bounds the range blocks may be drawn from, so `10.1.1.0/16` with
/// `/24` blocks allows `10.1.1.0/24` through `10.1.255.0/24`.
///
/// # Examples
/// ```
/// use chaincast::ip::assign_blocks;
/// use chaincast::topology::build_chain;
///
/// let chain = build_chain(&[vec![0, 1, 2], vec![2, 3, 4]]).unwrap();
/// let plan = assign_blocks(&chain, "10.1.1.0/16".parse().unwrap(), 24).unwrap();
/// assert_eq!(plan.get(1).unwrap().network.to_string(), "10.1.2.0/24");
/// ```
pub fn assign_blocks(
    topology: &ChainTopology,
    base_network: Ipv4Net,
    segment_prefix: u8,
) -> Result<AddressPlan, PlanError> {
    if segment_prefix < base_network.prefix_len() || segment_prefix > MAX_SEGMENT_PREFIX {
        return Err(PlanError::AddressSpaceExhausted(format!(
            "segment prefix /{} does not fit inside budget {}",
            segment_prefix,
            base_network.trunc()
        )));
    }

    let budget = base_network.trunc();
    let block_size = 1u64 << (32 - u32::from(segment_prefix));
    let block_mask = !(block_size - 1);
    let start = u64::from(u32::from(base_network.addr())) & block_mask;
    let budget_end = u64::from(u32::from(budget.broadcast()));
    let available = (budget_end + 1 - start) / block_size;

    let requested = topology.len() as u64;
    if requested > available {
        return Err(PlanError::AddressSpaceExhausted(format!(
            "{} segments requested but only {} /{} blocks fit between {} and the end of {}",
            requested,
            available,
            segment_prefix,
            Ipv4Addr::from(start as u32),
            budget
        )));
    }

    let mut blocks = BTreeMap::new();
    for segment in topology.segments() {
        let address = Ipv4Addr::from((start + segment.index as u64 * block_size) as u32);
        let network = Ipv4Net::new(address, segment_prefix)
            .map_err(|e| PlanError::AddressSpaceExhausted(e.to_string()))?;
        let block = AddressBlock { segment: segment.index, network };

        if segment.members.len() as u64 > u64::from(block.host_capacity()) {
            return Err(PlanError::AddressSpaceExhausted(format!(
                "segment {} has {} members but block {} only holds {} hosts",
                segment.index,
                segment.members.len(),
                network,
                block.host_capacity()
            )));
        }

        debug!("Segment {} -> {} (mask {})", segment.index, network, block.mask());
        blocks.insert(segment.index, block);
    }

    let plan = AddressPlan { blocks };
    if !plan.is_disjoint() {
        return Err(PlanError::PlanConsistency(
            "assigned address blocks overlap".to_string(),
        ));
    }

    info!("Assigned {} address blocks starting at {}", plan.len(), Ipv4Addr::from(start as u32));
    Ok(plan)
}
