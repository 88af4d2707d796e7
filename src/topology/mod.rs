//! Network topology module.
//!
//! This module contains the chain topology model: LAN segments joined
//! end-to-end through shared boundary nodes, and its validation.

pub mod types;
pub mod chain;

// Re-export key types and functions for easier access
pub use types::{ChainTopology, LanSegment, NodeId, NodeRole};
pub use chain::{build_chain, build_chain_with_sink};
pub(crate) use chain::shared_nodes;
