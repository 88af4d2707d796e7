//! Distribution plan type definitions.
//!
//! This module contains the plan handed to the simulation engine, together
//! with the channel, application and tracing settings that travel with it.

use std::net::{Ipv4Addr, SocketAddrV4};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ip::{AddressPlan, InterfaceAddress};
use crate::topology::{ChainTopology, NodeId};
use crate::tree::{DefaultRoute, ForwardingEntry, RelayRule};
use crate::utils::DataRate;

// ============================================================================
// Session Settings
// ============================================================================

/// Frame encapsulation used on the shared channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Encapsulation {
    /// Ethernet II (DIX) framing
    #[default]
    Dix,
    /// 802.2 LLC/SNAP framing
    Llc,
}

/// Attributes of the CSMA channel every segment is built on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSpec {
    pub data_rate: DataRate,
    #[serde(with = "humantime_serde")]
    pub delay: Duration,
    pub encapsulation: Encapsulation,
}

impl Default for ChannelSpec {
    fn default() -> Self {
        Self {
            data_rate: DataRate::from_bps(5_000_000),
            delay: Duration::from_millis(2),
            encapsulation: Encapsulation::Dix,
        }
    }
}

/// Constant-rate UDP generator run at the source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficSpec {
    pub group: Ipv4Addr,
    pub port: u16,
    pub rate: DataRate,
    /// Payload size in bytes
    pub packet_size: u32,
    #[serde(with = "humantime_serde")]
    pub start: Duration,
    #[serde(with = "humantime_serde")]
    pub stop: Duration,
}

impl TrafficSpec {
    /// Destination socket address (group:port)
    pub fn destination(&self) -> SocketAddrV4 {
        SocketAddrV4::new(self.group, self.port)
    }
}

/// UDP packet sink run at the sink node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListenerSpec {
    pub bind: Ipv4Addr,
    pub port: u16,
    #[serde(with = "humantime_serde")]
    pub start: Duration,
    #[serde(with = "humantime_serde")]
    pub stop: Duration,
}

impl ListenerSpec {
    pub fn bind_address(&self) -> SocketAddrV4 {
        SocketAddrV4::new(self.bind, self.port)
    }
}

/// Packet capture settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceSpec {
    /// ASCII trace of every enqueue, dequeue and receive event
    pub ascii_file: Option<String>,
    /// Prefix for per-interface pcap captures
    pub pcap_prefix: Option<String>,
    pub promiscuous: bool,
}

impl TraceSpec {
    /// Capture file name for one device: `<prefix>-<node>-<device>.pcap`
    pub fn pcap_file_name(&self, node: NodeId, device: u32) -> Option<String> {
        self.pcap_prefix
            .as_ref()
            .map(|prefix| format!("{}-{}-{}.pcap", prefix, node, device))
    }
}

/// Everything besides the forwarding plan the engine needs for one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSpec {
    pub channel: ChannelSpec,
    pub listener: ListenerSpec,
    pub tracing: Option<TraceSpec>,
}

// ============================================================================
// Distribution Plan
// ============================================================================

/// Complete, validated addressing and forwarding plan for one chain.
///
/// Serialized to `plan.json`; applied to an engine by [`crate::engine::apply_plan`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionPlan {
    pub topology: ChainTopology,
    pub addresses: AddressPlan,
    /// Interface addresses, ordered by node then segment
    pub interfaces: Vec<InterfaceAddress>,
    pub group: Ipv4Addr,
    pub source: NodeId,
    /// Source interface address on segment 0, used as the (S, G) source
    pub source_address: Ipv4Addr,
    pub sink: NodeId,
    /// Forwarding entries in installation order
    pub entries: Vec<ForwardingEntry>,
    pub channel: ChannelSpec,
    pub traffic: TrafficSpec,
    pub listener: ListenerSpec,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracing: Option<TraceSpec>,
}

impl DistributionPlan {
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

    pub fn interface_address(&self, node: NodeId, segment: usize) -> Option<Ipv4Addr> {
        self.interfaces
            .iter()
            .find(|iface| iface.node == node && iface.segment == segment)
            .map(|iface| iface.address)
    }
}
