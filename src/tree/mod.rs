//! Multicast distribution tree module.
//!
//! Derives the static relay rules and default routes that carry a single
//! source's group traffic down the chain.

pub mod builder;

pub use builder::{build_distribution_tree, DefaultRoute, DistributionTree, ForwardingEntry, RelayRule};
