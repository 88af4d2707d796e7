//! IP address allocation and management module.
//!
//! This module hands out one disjoint address block per LAN segment and
//! numbers every interface inside its segment's block.

pub mod registry;
pub mod allocator;

// Re-export commonly used types
pub use allocator::{assign_blocks, AddressBlock, AddressPlan};
pub use registry::{assign_interface_addresses, InterfaceAddress, InterfaceAddressRegistry};
