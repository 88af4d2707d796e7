use chaincast::config::Config;
use chaincast::config_loader::{self, ScenarioOverrides};
use chaincast::orchestrator;
use chaincast::scenarios::BuiltinScenario;
use chaincast::topology::NodeId;
use chaincast::utils::DataRate;
use clap::Parser;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use env_logger::Env;
use log::info;
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::time::Duration;

fn parse_delay(value: &str) -> Result<Duration, String> {
    humantime_serde::re::humantime::parse_duration(value).map_err(|e| e.to_string())
}

/// Static multicast distribution planner for chained LAN simulations
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the scenario configuration YAML file
    #[arg(short, long, required_unless_present = "scenario", conflicts_with = "scenario")]
    config: Option<PathBuf>,

    /// Use a built-in scenario instead of a configuration file
    #[arg(short, long, value_enum)]
    scenario: Option<BuiltinScenario>,

    /// Output directory for the plan and scenario script
    #[arg(short, long, default_value = "chaincast_output")]
    output: PathBuf,

    /// Print the plan summary without writing any files
    #[arg(long)]
    dry_run: bool,

    /// Write the effective configuration to this path and exit
    #[arg(long)]
    write_config: Option<PathBuf>,

    /// Override the channel data rate (e.g. "10Mbps")
    #[arg(long)]
    data_rate: Option<DataRate>,

    /// Override the channel delay (e.g. "5ms")
    #[arg(long, value_parser = parse_delay)]
    delay: Option<Duration>,

    /// Override the multicast group
    #[arg(long)]
    group: Option<Ipv4Addr>,

    /// Override the sink node
    #[arg(long)]
    sink: Option<NodeId>,

    /// Disable packet tracing
    #[arg(long)]
    no_tracing: bool,
}

impl Args {
    fn overrides(&self) -> ScenarioOverrides {
        ScenarioOverrides {
            data_rate: self.data_rate,
            delay: self.delay,
            group: self.group,
            sink: self.sink,
            no_tracing: self.no_tracing,
        }
    }
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Parse command-line arguments
    let args = Args::parse();

    let mut config: Config = match (&args.config, args.scenario) {
        (Some(path), _) => config_loader::load_config(path)?,
        (None, Some(scenario)) => scenario.config(),
        (None, None) => unreachable!("clap requires --config or --scenario"),
    };

    // Initialize logging; RUST_LOG wins over the configured level
    let default_filter = config.general.log_level.clone().unwrap_or_else(|| "info".to_string());
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    info!("Starting Chaincast multicast planner");
    match (&args.config, args.scenario) {
        (Some(path), _) => info!("Configuration file: {:?}", path),
        (_, Some(scenario)) => info!("Built-in scenario: {}", scenario.name()),
        _ => {}
    }

    config_loader::apply_overrides(&mut config, &args.overrides())?;

    if let Some(path) = &args.write_config {
        config_loader::write_config(&config, path)?;
        return Ok(());
    }

    if args.dry_run {
        let plan = orchestrator::build_plan(&config)?;
        let summary = orchestrator::summarize(&plan);
        println!("{}", serde_json::to_string_pretty(&summary).wrap_err("Failed to render plan summary")?);
        return Ok(());
    }

    info!("Output directory: {:?}", args.output);
    let outputs = orchestrator::generate_scenario(&config, &args.output)?;

    info!("Plan written to {:?}", outputs.plan_path);
    info!("Scenario script written to {:?}", outputs.script_path);
    info!("Manifest written to {:?}", outputs.manifest_path);
    info!("Planning completed successfully");
    Ok(())
}
