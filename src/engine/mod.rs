//! # Simulation engine boundary
//!
//! The planner never talks to a network stack directly. Everything it needs
//! from the discrete-event engine is captured by the [`SimulationEngine`]
//! trait, and [`apply_plan`] drives that trait from a finished
//! [`crate::plan::DistributionPlan`].
//!
//! ## Install Order
//!
//! 1. **Segments**: one CSMA channel per LAN segment, one device per member
//! 2. **Addresses**: each segment's block is assigned to its devices
//! 3. **Routes**: relay rules, each with its own router and interfaces, then
//!    default routes, in plan order
//! 4. **Membership**: the sink joins the group
//! 5. **Applications**: source generator and sink listener
//! 6. **Tracing**: ASCII and pcap captures, when enabled
//!
//! ## Bundled Engine
//!
//! [`ScriptEngine`] records every call as an [`EngineCommand`] and renders the
//! sequence to YAML for an external runner.

pub mod apply;
pub mod script;

use std::net::Ipv4Addr;

use color_eyre::Result;
use serde::{Deserialize, Serialize};

use crate::ip::AddressBlock;
use crate::plan::{ChannelSpec, ListenerSpec, TraceSpec, TrafficSpec};
use crate::topology::{LanSegment, NodeId};

pub use apply::{apply_plan, InstallReport};
pub use script::{EngineCommand, ScenarioScript, ScriptEngine};

/// A network device attached to a node, numbered per node in install order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InterfaceHandle {
    pub node: NodeId,
    pub device: u32,
}

/// Operations the planner requires from a simulation engine
pub trait SimulationEngine {
    /// Attach every member of the segment to a shared channel; returns one
    /// handle per member, in member order
    fn install_segment(&mut self, segment: &LanSegment, channel: &ChannelSpec) -> Result<Vec<InterfaceHandle>>;

    /// Assign the block's host addresses to the segment's devices
    fn assign_addresses(&mut self, block: &AddressBlock, interfaces: &[InterfaceHandle]) -> Result<()>;

    /// Install an (S, G) forwarding entry on a router
    fn add_multicast_route(
        &mut self,
        router: NodeId,
        input: InterfaceHandle,
        source: Ipv4Addr,
        group: Ipv4Addr,
        outputs: &[InterfaceHandle],
    ) -> Result<()>;

    /// Install the fallback multicast route of a node
    fn set_default_multicast_route(&mut self, node: NodeId, output: InterfaceHandle) -> Result<()>;

    fn join_group(&mut self, node: NodeId, group: Ipv4Addr) -> Result<()>;

    fn schedule_source(&mut self, node: NodeId, traffic: &TrafficSpec) -> Result<()>;

    fn schedule_sink(&mut self, node: NodeId, listener: &ListenerSpec) -> Result<()>;

    /// Enable packet capture; returns the names of the trace artifacts
    fn enable_tracing(&mut self, tracing: &TraceSpec) -> Result<Vec<String>>;
}
