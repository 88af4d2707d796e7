//! Plan orchestrator.
//!
//! This module coordinates the planning pipeline, from a validated
//! configuration through topology, address and tree construction to the
//! written plan and scenario script.

use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use log::info;
use serde::Serialize;

use crate::config::Config;
use crate::engine::{apply_plan, InstallReport, ScriptEngine};
use crate::ip::assign_blocks;
use crate::plan::{emit_plan, DistributionPlan};
use crate::topology::{build_chain_with_sink, NodeId};
use crate::tree::build_distribution_tree;

pub const PLAN_FILE: &str = "plan.json";
pub const SCRIPT_FILE: &str = "scenario.yaml";
pub const MANIFEST_FILE: &str = "manifest.json";

/// Headline numbers of a plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanSummary {
    pub segments: usize,
    pub nodes: usize,
    pub relay_rules: usize,
    pub default_routes: usize,
    pub source: NodeId,
    pub source_address: Ipv4Addr,
    pub sink: NodeId,
    pub group: Ipv4Addr,
}

/// Metadata written next to the plan
#[derive(Debug, Serialize)]
pub struct Manifest {
    pub tool: &'static str,
    pub version: &'static str,
    pub scenario: String,
    pub generated_at: DateTime<Utc>,
    pub files: Vec<String>,
    pub summary: PlanSummary,
    pub install: InstallReport,
}

/// Paths and results of a generated scenario
#[derive(Debug)]
pub struct ScenarioOutputs {
    pub plan_path: PathBuf,
    pub script_path: PathBuf,
    pub manifest_path: PathBuf,
    pub summary: PlanSummary,
    pub report: InstallReport,
}

/// Run the planning pipeline for a configuration
pub fn build_plan(config: &Config) -> Result<DistributionPlan> {
    let segments = config.chain.segments()?;

    info!("Building chain topology with {} segments", segments.len());
    let topology = build_chain_with_sink(&segments, config.chain.sink).wrap_err("Invalid chain topology")?;

    info!("Assigning address blocks from {}", config.network.base_network);
    let addresses = assign_blocks(&topology, config.network.base_network, config.network.segment_prefix)?;

    info!("Configuring multicast distribution for {}", config.multicast.group);
    let tree = build_distribution_tree(&topology, config.multicast.group)?;

    let source = topology
        .source()
        .ok_or_else(|| eyre!("Chain topology has no source node"))?;
    let plan = emit_plan(
        &topology,
        &addresses,
        &tree,
        source,
        topology.sink(),
        config.traffic_spec(),
        config.session_spec(),
    )?;

    Ok(plan)
}

pub fn summarize(plan: &DistributionPlan) -> PlanSummary {
    PlanSummary {
        segments: plan.topology.len(),
        nodes: plan.topology.nodes().len(),
        relay_rules: plan.relay_rules().count(),
        default_routes: plan.default_routes().count(),
        source: plan.source,
        source_address: plan.source_address,
        sink: plan.sink,
        group: plan.group,
    }
}

/// Plan the scenario and write `plan.json`, `scenario.yaml` and `manifest.json`
/// into `output_dir`
pub fn generate_scenario(config: &Config, output_dir: &Path) -> Result<ScenarioOutputs> {
    let plan = build_plan(config)?;

    let mut engine = ScriptEngine::new();
    let report = apply_plan(&plan, &mut engine).wrap_err("Failed to install plan on script engine")?;

    std::fs::create_dir_all(output_dir)
        .wrap_err_with(|| format!("Failed to create output directory '{}'", output_dir.display()))?;

    // Write plan
    let plan_path = output_dir.join(PLAN_FILE);
    let plan_json = serde_json::to_string_pretty(&plan)?;
    std::fs::write(&plan_path, plan_json)
        .wrap_err_with(|| format!("Failed to write '{}'", plan_path.display()))?;

    // Write scenario script
    let script_path = output_dir.join(SCRIPT_FILE);
    let script_yaml = engine.to_yaml(&config.general.name)?;
    std::fs::write(&script_path, script_yaml)
        .wrap_err_with(|| format!("Failed to write '{}'", script_path.display()))?;

    // Write manifest
    let summary = summarize(&plan);
    let manifest = Manifest {
        tool: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        scenario: config.general.name.clone(),
        generated_at: Utc::now(),
        files: vec![PLAN_FILE.to_string(), SCRIPT_FILE.to_string()],
        summary: summary.clone(),
        install: report.clone(),
    };
    let manifest_path = output_dir.join(MANIFEST_FILE);
    std::fs::write(&manifest_path, serde_json::to_string_pretty(&manifest)?)
        .wrap_err_with(|| format!("Failed to write '{}'", manifest_path.display()))?;

    info!("Generated scenario '{}' in {:?}", config.general.name, output_dir);
    info!("  - Segments: {}, nodes: {}", summary.segments, summary.nodes);
    info!(
        "  - Source node {} ({}) -> sink node {} on group {}",
        summary.source, summary.source_address, summary.sink, summary.group
    );
    info!("  - Relay rules: {}, default routes: {}", summary.relay_rules, summary.default_routes);
    if !report.trace_artifacts.is_empty() {
        info!("  - Trace artifacts: {}", report.trace_artifacts.len());
    }

    Ok(ScenarioOutputs {
        plan_path,
        script_path,
        manifest_path,
        summary,
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenarios::BuiltinScenario;

    #[test]
    fn test_build_plan_is_deterministic() {
        let config = BuiltinScenario::SevenLan.config();
        let first = serde_json::to_string(&build_plan(&config).unwrap()).unwrap();
        let second = serde_json::to_string(&build_plan(&config).unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_summary() {
        let plan = build_plan(&BuiltinScenario::SevenLan.config()).unwrap();
        let summary = summarize(&plan);
        assert_eq!(summary.segments, 7);
        assert_eq!(summary.nodes, 15);
        assert_eq!(summary.relay_rules, 6);
        assert_eq!(summary.default_routes, 7);
        assert_eq!(summary.sink, 14);
        assert_eq!(summary.source_address, Ipv4Addr::new(10, 1, 1, 1));
    }

    #[test]
    fn test_invalid_chain_fails_pipeline() {
        let mut config = BuiltinScenario::ThreeLan.config();
        config.chain.scenario = None;
        config.chain.segments = Some(vec![vec![0, 1, 2], vec![3, 4, 5]]);
        assert!(build_plan(&config).is_err());
    }
}
