//! Plan installation.
//!
//! Drives a [`SimulationEngine`] from a [`DistributionPlan`]. Every relay rule
//! resolves its own router and interfaces; nothing is carried over from one
//! junction to the next.

use std::collections::HashMap;

use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use log::{debug, info};
use serde::Serialize;

use super::{InterfaceHandle, SimulationEngine};
use crate::plan::DistributionPlan;
use crate::topology::NodeId;
use crate::tree::ForwardingEntry;

/// Summary of what was installed
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct InstallReport {
    pub segments: usize,
    pub interfaces: usize,
    pub relay_rules: usize,
    pub default_routes: usize,
    pub trace_artifacts: Vec<String>,
}

/// Interface handles keyed by (node, segment)
struct InterfaceMap(HashMap<(NodeId, usize), InterfaceHandle>);

impl InterfaceMap {
    fn get(&self, node: NodeId, segment: usize) -> Result<InterfaceHandle> {
        self.0
            .get(&(node, segment))
            .copied()
            .ok_or_else(|| eyre!("No interface installed for node {} on segment {}", node, segment))
    }
}

/// Install a plan against an engine
pub fn apply_plan<E: SimulationEngine + ?Sized>(plan: &DistributionPlan, engine: &mut E) -> Result<InstallReport> {
    let mut report = InstallReport::default();
    let mut interfaces = InterfaceMap(HashMap::new());

    info!("Installing {} segments", plan.topology.len());
    for segment in plan.topology.segments() {
        let handles = engine
            .install_segment(segment, &plan.channel)
            .wrap_err_with(|| format!("Failed to install segment {}", segment.index))?;
        if handles.len() != segment.members.len() {
            return Err(eyre!(
                "Engine returned {} interfaces for the {} members of segment {}",
                handles.len(),
                segment.members.len(),
                segment.index
            ));
        }
        for (&node, &handle) in segment.members.iter().zip(&handles) {
            interfaces.0.insert((node, segment.index), handle);
        }

        let block = plan
            .addresses
            .get(segment.index)
            .ok_or_else(|| eyre!("Segment {} has no address block", segment.index))?;
        engine
            .assign_addresses(block, &handles)
            .wrap_err_with(|| format!("Failed to assign {} to segment {}", block.network, segment.index))?;

        report.segments += 1;
        report.interfaces += handles.len();
    }

    info!("Configuring multicast routes for {}", plan.group);
    for entry in &plan.entries {
        match entry {
            ForwardingEntry::Relay(rule) => {
                let input = interfaces.get(rule.router, rule.input_segment)?;
                let output = interfaces.get(rule.router, rule.output_segment)?;
                debug!("Relay on node {}: {:?} -> {:?}", rule.router, input, output);
                engine.add_multicast_route(rule.router, input, plan.source_address, rule.group, &[output])?;
                report.relay_rules += 1;
            }
            ForwardingEntry::Default(route) => {
                let output = interfaces.get(route.node, route.output_segment)?;
                debug!("Default multicast route on node {} via {:?}", route.node, output);
                engine.set_default_multicast_route(route.node, output)?;
                report.default_routes += 1;
            }
        }
    }

    engine.join_group(plan.sink, plan.group)?;

    info!("Creating applications");
    engine.schedule_source(plan.source, &plan.traffic)?;
    engine.schedule_sink(plan.sink, &plan.listener)?;

    if let Some(tracing) = &plan.tracing {
        info!("Configuring tracing");
        report.trace_artifacts = engine.enable_tracing(tracing)?;
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineCommand, ScriptEngine};
    use crate::ip::AddressBlock;
    use crate::orchestrator::build_plan;
    use crate::plan::{ChannelSpec, ListenerSpec, TraceSpec, TrafficSpec};
    use crate::scenarios::BuiltinScenario;
    use crate::topology::LanSegment;
    use std::net::Ipv4Addr;

    fn three_lan_plan() -> DistributionPlan {
        build_plan(&BuiltinScenario::ThreeLan.config()).unwrap()
    }

    #[test]
    fn test_apply_three_lan_plan() {
        let plan = three_lan_plan();
        let mut engine = ScriptEngine::new();
        let report = apply_plan(&plan, &mut engine).unwrap();

        assert_eq!(report.segments, 3);
        assert_eq!(report.interfaces, 9);
        assert_eq!(report.relay_rules, 2);
        assert_eq!(report.default_routes, 3);
        // One ASCII trace plus a pcap per device
        assert_eq!(report.trace_artifacts.len(), 10);
    }

    #[test]
    fn test_each_relay_uses_its_own_interfaces() {
        let plan = three_lan_plan();
        let mut engine = ScriptEngine::new();
        apply_plan(&plan, &mut engine).unwrap();

        let routes: Vec<(NodeId, InterfaceHandle, Vec<InterfaceHandle>, Ipv4Addr)> = engine
            .commands()
            .iter()
            .filter_map(|command| match command {
                EngineCommand::AddMulticastRoute { router, input, outputs, source, .. } => {
                    Some((*router, *input, outputs.clone(), *source))
                }
                _ => None,
            })
            .collect();

        assert_eq!(
            routes,
            vec![
                (
                    2,
                    InterfaceHandle { node: 2, device: 0 },
                    vec![InterfaceHandle { node: 2, device: 1 }],
                    Ipv4Addr::new(10, 1, 1, 1),
                ),
                (
                    4,
                    InterfaceHandle { node: 4, device: 0 },
                    vec![InterfaceHandle { node: 4, device: 1 }],
                    Ipv4Addr::new(10, 1, 1, 1),
                ),
            ]
        );
    }

    #[test]
    fn test_install_order() {
        let plan = three_lan_plan();
        let mut engine = ScriptEngine::new();
        apply_plan(&plan, &mut engine).unwrap();

        let ops: Vec<&str> = engine
            .commands()
            .iter()
            .map(|command| match command {
                EngineCommand::InstallSegment { .. } => "segment",
                EngineCommand::AssignAddresses { .. } => "addresses",
                EngineCommand::AddMulticastRoute { .. } => "route",
                EngineCommand::SetDefaultMulticastRoute { .. } => "default",
                EngineCommand::JoinGroup { .. } => "join",
                EngineCommand::StartSource { .. } => "source",
                EngineCommand::StartSink { .. } => "sink",
                EngineCommand::EnableTracing { .. } => "tracing",
            })
            .collect();
        assert_eq!(
            ops,
            vec![
                "segment", "addresses", "segment", "addresses", "segment", "addresses",
                "default", "route", "default", "route", "default",
                "join", "source", "sink", "tracing",
            ]
        );
    }

    /// Engine that hands back too few devices
    struct ShortEngine;

    impl SimulationEngine for ShortEngine {
        fn install_segment(&mut self, segment: &LanSegment, _: &ChannelSpec) -> Result<Vec<InterfaceHandle>> {
            Ok(vec![InterfaceHandle { node: segment.members[0], device: 0 }])
        }
        fn assign_addresses(&mut self, _: &AddressBlock, _: &[InterfaceHandle]) -> Result<()> {
            Ok(())
        }
        fn add_multicast_route(
            &mut self,
            _: NodeId,
            _: InterfaceHandle,
            _: Ipv4Addr,
            _: Ipv4Addr,
            _: &[InterfaceHandle],
        ) -> Result<()> {
            Ok(())
        }
        fn set_default_multicast_route(&mut self, _: NodeId, _: InterfaceHandle) -> Result<()> {
            Ok(())
        }
        fn join_group(&mut self, _: NodeId, _: Ipv4Addr) -> Result<()> {
            Ok(())
        }
        fn schedule_source(&mut self, _: NodeId, _: &TrafficSpec) -> Result<()> {
            Ok(())
        }
        fn schedule_sink(&mut self, _: NodeId, _: &ListenerSpec) -> Result<()> {
            Ok(())
        }
        fn enable_tracing(&mut self, _: &TraceSpec) -> Result<Vec<String>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_short_engine_is_reported() {
        let plan = three_lan_plan();
        assert!(apply_plan(&plan, &mut ShortEngine).is_err());
    }
}
