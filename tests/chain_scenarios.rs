//! End-to-end planning tests for chained LAN scenarios.

use std::io::Write;
use std::net::Ipv4Addr;

use chaincast::config_loader::load_config;
use chaincast::engine::{apply_plan, ScriptEngine};
use chaincast::ip::assign_blocks;
use chaincast::orchestrator::{build_plan, generate_scenario, MANIFEST_FILE, PLAN_FILE, SCRIPT_FILE};
use chaincast::plan::DistributionPlan;
use chaincast::scenarios::BuiltinScenario;
use chaincast::topology::build_chain;
use chaincast::tree::{build_distribution_tree, DefaultRoute, ForwardingEntry, RelayRule};
use chaincast::PlanError;
use tempfile::NamedTempFile;

const GROUP: Ipv4Addr = Ipv4Addr::new(225, 1, 2, 4);

fn relay(router: u32, input_segment: usize, output_segment: usize) -> ForwardingEntry {
    ForwardingEntry::Relay(RelayRule { router, input_segment, output_segment, group: GROUP })
}

fn default_route(node: u32, output_segment: usize) -> ForwardingEntry {
    ForwardingEntry::Default(DefaultRoute { node, output_segment })
}

#[test]
fn test_three_lan_plan() {
    let plan = build_plan(&BuiltinScenario::ThreeLan.config()).unwrap();

    assert_eq!(plan.source, 0);
    assert_eq!(plan.sink, 6);
    assert_eq!(plan.source_address, Ipv4Addr::new(10, 1, 1, 1));
    assert_eq!(
        plan.entries,
        vec![
            default_route(0, 0),
            relay(2, 0, 1),
            default_route(2, 1),
            relay(4, 1, 2),
            default_route(4, 2),
        ]
    );

    let blocks: Vec<String> = plan.addresses.blocks().map(|block| block.network.to_string()).collect();
    assert_eq!(blocks, vec!["10.1.1.0/24", "10.1.2.0/24", "10.1.3.0/24"]);
}

#[test]
fn test_seven_lan_plan() {
    let plan = build_plan(&BuiltinScenario::SevenLan.config()).unwrap();

    let routers: Vec<u32> = plan.relay_rules().map(|rule| rule.router).collect();
    assert_eq!(routers, vec![2, 4, 6, 7, 9, 11]);
    for (i, rule) in plan.relay_rules().enumerate() {
        assert_eq!(rule.input_segment, i);
        assert_eq!(rule.output_segment, i + 1);
        assert_eq!(rule.group, GROUP);
    }
    assert_eq!(plan.default_routes().count(), 7);
    assert_eq!(plan.sink, 14);
    assert_eq!(plan.addresses.get(6).unwrap().network.to_string(), "10.1.7.0/24");
}

#[test]
fn test_single_segment_chain() {
    let chain = build_chain(&[vec![0, 1, 2]]).unwrap();
    let tree = build_distribution_tree(&chain, GROUP).unwrap();

    assert_eq!(tree.relay_rules().count(), 0);
    assert_eq!(tree.entries, vec![default_route(0, 0)]);

    let addresses = assign_blocks(&chain, "10.1.1.0/16".parse().unwrap(), 24).unwrap();
    assert_eq!(addresses.len(), 1);
}

#[test]
fn test_disjoint_segments_are_rejected() {
    let result = build_chain(&[vec![0, 1, 2], vec![3, 4, 5]]);
    assert!(matches!(result, Err(PlanError::InvalidTopology(_))));
}

#[test]
fn test_address_budget_exhaustion() {
    let segments: Vec<Vec<u32>> = (0..300u32).map(|i| vec![i, i + 1]).collect();
    let chain = build_chain(&segments).unwrap();
    let result = assign_blocks(&chain, "10.1.1.0/16".parse().unwrap(), 24);
    assert!(matches!(result, Err(PlanError::AddressSpaceExhausted(_))));
}

#[test]
fn test_plans_are_reproducible() {
    let config = BuiltinScenario::SevenLan.config();
    let first = serde_json::to_vec_pretty(&build_plan(&config).unwrap()).unwrap();
    let second = serde_json::to_vec_pretty(&build_plan(&config).unwrap()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_entries_reference_chain_nodes() {
    let plan = build_plan(&BuiltinScenario::SevenLan.config()).unwrap();

    for entry in &plan.entries {
        let attached = plan.topology.segments_of(entry.node());
        assert!(!attached.is_empty());
        for segment in entry.segments() {
            assert!(attached.contains(&segment));
            assert!(plan.addresses.get(segment).is_some());
        }
    }
}

#[test]
fn test_plan_installs_on_script_engine() {
    let plan = build_plan(&BuiltinScenario::ThreeLan.config()).unwrap();
    let mut engine = ScriptEngine::new();

    let report = apply_plan(&plan, &mut engine).unwrap();
    assert_eq!(report.segments, 3);
    assert_eq!(report.relay_rules, 2);
    assert_eq!(report.default_routes, 3);

    let yaml = engine.to_yaml("three-lan").unwrap();
    assert!(yaml.contains("add_multicast_route"));
    assert!(yaml.contains("join_group"));
}

#[test]
fn test_generate_scenario_writes_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let config = BuiltinScenario::ThreeLan.config();

    let outputs = generate_scenario(&config, dir.path()).unwrap();
    assert_eq!(outputs.plan_path, dir.path().join(PLAN_FILE));
    assert!(dir.path().join(PLAN_FILE).exists());
    assert!(dir.path().join(SCRIPT_FILE).exists());
    assert!(dir.path().join(MANIFEST_FILE).exists());

    let written = std::fs::read_to_string(&outputs.plan_path).unwrap();
    let reloaded: DistributionPlan = serde_json::from_str(&written).unwrap();
    assert_eq!(reloaded, build_plan(&config).unwrap());
}

#[test]
fn test_plan_from_config_file() {
    let yaml = r#"
general:
  name: "custom-chain"
network:
  data_rate: "10Mbps"
  delay: "1ms"
  base_network: "192.168.10.0/20"
chain:
  segments:
    - [10, 11]
    - [11, 12, 13]
  sink: 12
multicast:
  group: 239.255.0.1
  port: 5000
tracing:
  enabled: false
"#;
    let mut temp_file = NamedTempFile::new().unwrap();
    write!(temp_file, "{}", yaml).unwrap();

    let config = load_config(temp_file.path()).unwrap();
    let plan = build_plan(&config).unwrap();

    assert_eq!(plan.source, 10);
    assert_eq!(plan.sink, 12);
    assert_eq!(plan.group, Ipv4Addr::new(239, 255, 0, 1));
    assert_eq!(plan.source_address, Ipv4Addr::new(192, 168, 10, 1));
    assert_eq!(plan.addresses.get(1).unwrap().network.to_string(), "192.168.11.0/24");
    assert!(plan.tracing.is_none());
    assert_eq!(plan.traffic.port, 5000);
}
