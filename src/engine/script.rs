//! Recording engine.
//!
//! [`ScriptEngine`] implements [`SimulationEngine`] by numbering devices the
//! way the simulator does (per node, from 0, in install order) and recording
//! each call. The recorded commands form the scenario script consumed by the
//! external runner.

use std::collections::{BTreeMap, BTreeSet};
use std::net::{Ipv4Addr, SocketAddrV4};
use std::time::Duration;

use color_eyre::eyre::{bail, WrapErr};
use color_eyre::Result;
use ipnet::Ipv4Net;
use log::warn;
use serde::Serialize;

use super::{InterfaceHandle, SimulationEngine};
use crate::ip::AddressBlock;
use crate::plan::{ChannelSpec, Encapsulation, ListenerSpec, TraceSpec, TrafficSpec};
use crate::topology::{LanSegment, NodeId};
use crate::utils::DataRate;

/// One recorded engine call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EngineCommand {
    InstallSegment {
        segment: usize,
        nodes: Vec<NodeId>,
        devices: Vec<InterfaceHandle>,
        data_rate: DataRate,
        #[serde(with = "humantime_serde")]
        delay: Duration,
        encapsulation: Encapsulation,
    },
    AssignAddresses {
        network: Ipv4Net,
        mask: Ipv4Addr,
        devices: Vec<InterfaceHandle>,
    },
    AddMulticastRoute {
        router: NodeId,
        input: InterfaceHandle,
        source: Ipv4Addr,
        group: Ipv4Addr,
        outputs: Vec<InterfaceHandle>,
    },
    SetDefaultMulticastRoute {
        node: NodeId,
        output: InterfaceHandle,
    },
    JoinGroup {
        node: NodeId,
        group: Ipv4Addr,
    },
    StartSource {
        node: NodeId,
        destination: SocketAddrV4,
        rate: DataRate,
        packet_size: u32,
        #[serde(with = "humantime_serde")]
        start: Duration,
        #[serde(with = "humantime_serde")]
        stop: Duration,
    },
    StartSink {
        node: NodeId,
        bind: SocketAddrV4,
        #[serde(with = "humantime_serde")]
        start: Duration,
        #[serde(with = "humantime_serde")]
        stop: Duration,
    },
    EnableTracing {
        #[serde(skip_serializing_if = "Option::is_none")]
        ascii_file: Option<String>,
        pcap_files: Vec<String>,
        promiscuous: bool,
    },
}

/// Serialized form of a recorded run
#[derive(Debug, Serialize)]
pub struct ScenarioScript<'a> {
    pub name: &'a str,
    pub commands: &'a [EngineCommand],
}

/// Engine that records calls instead of simulating them
#[derive(Debug, Default)]
pub struct ScriptEngine {
    /// Next device index per node
    next_device: BTreeMap<NodeId, u32>,
    devices: BTreeSet<InterfaceHandle>,
    memberships: BTreeSet<(NodeId, Ipv4Addr)>,
    commands: Vec<EngineCommand>,
}

impl ScriptEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[EngineCommand] {
        &self.commands
    }

    /// Installed devices, ordered by node then device index
    pub fn devices(&self) -> impl Iterator<Item = &InterfaceHandle> {
        self.devices.iter()
    }

    /// Render the recorded commands as a YAML scenario script
    pub fn to_yaml(&self, name: &str) -> Result<String> {
        let script = ScenarioScript { name, commands: &self.commands };
        Ok(serde_yaml::to_string(&script)?)
    }

    fn allocate_device(&mut self, node: NodeId) -> InterfaceHandle {
        let counter = self.next_device.entry(node).or_insert(0);
        let handle = InterfaceHandle { node, device: *counter };
        *counter += 1;
        self.devices.insert(handle);
        handle
    }

    fn ensure_node(&self, node: NodeId) -> Result<()> {
        if !self.next_device.contains_key(&node) {
            bail!("Node {} has no devices installed", node);
        }
        Ok(())
    }

    fn ensure_device(&self, handle: InterfaceHandle, owner: NodeId) -> Result<()> {
        if handle.node != owner {
            bail!("Device {:?} does not belong to node {}", handle, owner);
        }
        if !self.devices.contains(&handle) {
            bail!("Device {:?} has not been installed", handle);
        }
        Ok(())
    }
}

impl SimulationEngine for ScriptEngine {
    fn install_segment(&mut self, segment: &LanSegment, channel: &ChannelSpec) -> Result<Vec<InterfaceHandle>> {
        let devices: Vec<InterfaceHandle> = segment
            .members
            .iter()
            .map(|&node| self.allocate_device(node))
            .collect();

        self.commands.push(EngineCommand::InstallSegment {
            segment: segment.index,
            nodes: segment.members.clone(),
            devices: devices.clone(),
            data_rate: channel.data_rate,
            delay: channel.delay,
            encapsulation: channel.encapsulation,
        });
        Ok(devices)
    }

    fn assign_addresses(&mut self, block: &AddressBlock, interfaces: &[InterfaceHandle]) -> Result<()> {
        if interfaces.len() as u64 > u64::from(block.host_capacity()) {
            bail!("Block {} cannot number {} devices", block.network, interfaces.len());
        }
        for handle in interfaces {
            self.ensure_device(*handle, handle.node)?;
        }
        self.commands.push(EngineCommand::AssignAddresses {
            network: block.network,
            mask: block.mask(),
            devices: interfaces.to_vec(),
        });
        Ok(())
    }

    fn add_multicast_route(
        &mut self,
        router: NodeId,
        input: InterfaceHandle,
        source: Ipv4Addr,
        group: Ipv4Addr,
        outputs: &[InterfaceHandle],
    ) -> Result<()> {
        self.ensure_device(input, router)?;
        if outputs.is_empty() {
            bail!("Multicast route on node {} has no output devices", router);
        }
        for output in outputs {
            self.ensure_device(*output, router)?;
            if *output == input {
                bail!("Multicast route on node {} forwards back out its input {:?}", router, input);
            }
        }
        self.commands.push(EngineCommand::AddMulticastRoute {
            router,
            input,
            source,
            group,
            outputs: outputs.to_vec(),
        });
        Ok(())
    }

    fn set_default_multicast_route(&mut self, node: NodeId, output: InterfaceHandle) -> Result<()> {
        self.ensure_device(output, node)?;
        self.commands.push(EngineCommand::SetDefaultMulticastRoute { node, output });
        Ok(())
    }

    fn join_group(&mut self, node: NodeId, group: Ipv4Addr) -> Result<()> {
        self.ensure_node(node)
            .wrap_err_with(|| format!("Node {} cannot join {}", node, group))?;
        if !self.memberships.insert((node, group)) {
            warn!("Node {} already joined {}", node, group);
            return Ok(());
        }
        self.commands.push(EngineCommand::JoinGroup { node, group });
        Ok(())
    }

    fn schedule_source(&mut self, node: NodeId, traffic: &TrafficSpec) -> Result<()> {
        self.ensure_node(node)
            .wrap_err_with(|| format!("Cannot start the source on node {}", node))?;
        self.commands.push(EngineCommand::StartSource {
            node,
            destination: traffic.destination(),
            rate: traffic.rate,
            packet_size: traffic.packet_size,
            start: traffic.start,
            stop: traffic.stop,
        });
        Ok(())
    }

    fn schedule_sink(&mut self, node: NodeId, listener: &ListenerSpec) -> Result<()> {
        self.ensure_node(node)
            .wrap_err_with(|| format!("Cannot start the sink on node {}", node))?;
        self.commands.push(EngineCommand::StartSink {
            node,
            bind: listener.bind_address(),
            start: listener.start,
            stop: listener.stop,
        });
        Ok(())
    }

    fn enable_tracing(&mut self, tracing: &TraceSpec) -> Result<Vec<String>> {
        let pcap_files: Vec<String> = self
            .devices
            .iter()
            .filter_map(|handle| tracing.pcap_file_name(handle.node, handle.device))
            .collect();

        let mut artifacts = Vec::with_capacity(pcap_files.len() + 1);
        if let Some(ascii) = &tracing.ascii_file {
            artifacts.push(ascii.clone());
        }
        artifacts.extend(pcap_files.iter().cloned());

        self.commands.push(EngineCommand::EnableTracing {
            ascii_file: tracing.ascii_file.clone(),
            pcap_files,
            promiscuous: tracing.promiscuous,
        });
        Ok(artifacts)
    }
}
