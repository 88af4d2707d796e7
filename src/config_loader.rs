use crate::config::Config;
use crate::topology::NodeId;
use crate::utils::DataRate;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::info;
use std::fs::File;
use std::net::Ipv4Addr;
use std::path::Path;
use std::time::Duration;

/// Load and parse configuration from a YAML file
pub fn load_config(config_path: &Path) -> Result<Config> {
    info!("Loading configuration from: {:?}", config_path);

    // Open the configuration file
    let file = File::open(config_path)
        .wrap_err_with(|| format!("Failed to open configuration '{}'", config_path.display()))?;

    // Parse the YAML content
    let config: Config = serde_yaml::from_reader(file)
        .wrap_err_with(|| format!("Failed to parse configuration '{}'", config_path.display()))?;

    // Validate the configuration
    config.validate()?;

    Ok(config)
}

/// Write a configuration back out as YAML, e.g. to start from a built-in scenario
pub fn write_config(config: &Config, path: &Path) -> Result<()> {
    let yaml = serde_yaml::to_string(config)?;
    std::fs::write(path, yaml)
        .wrap_err_with(|| format!("Failed to write configuration '{}'", path.display()))?;
    info!("Configuration written to: {:?}", path);
    Ok(())
}

/// CLI arguments that can override YAML settings
#[derive(Debug, Clone, Default)]
pub struct ScenarioOverrides {
    pub data_rate: Option<DataRate>,
    pub delay: Option<Duration>,
    pub group: Option<Ipv4Addr>,
    pub sink: Option<NodeId>,
    pub no_tracing: bool,
}

/// Apply CLI overrides to a configuration
pub fn apply_overrides(config: &mut Config, overrides: &ScenarioOverrides) -> Result<()> {
    if let Some(rate) = overrides.data_rate {
        info!("Overriding channel data rate: {}", rate);
        config.network.data_rate = rate;
    }

    if let Some(delay) = overrides.delay {
        info!("Overriding channel delay: {:?}", delay);
        config.network.delay = delay;
    }

    if let Some(group) = overrides.group {
        info!("Overriding multicast group: {}", group);
        config.multicast.group = group;
    }

    if let Some(sink) = overrides.sink {
        info!("Overriding sink node: {}", sink);
        config.chain.sink = Some(sink);
    }

    if overrides.no_tracing {
        info!("Tracing disabled from the command line");
        config.tracing.enabled = false;
    }

    // Re-validate after applying overrides
    config.validate()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenarios::BuiltinScenario;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config() {
        let yaml = r#"
general:
  name: "three-lan"
chain:
  segments:
    - [0, 1, 2]
    - [2, 3, 4]
    - [4, 5, 6]
traffic:
  rate: "255b/s"
  packet_size: 128
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", yaml).unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.general.name, "three-lan");
        assert_eq!(config.chain.segments().unwrap().len(), 3);
    }

    #[test]
    fn test_load_rejects_invalid_config() {
        let yaml = r#"
chain:
  segments: [[0, 1]]
multicast:
  group: 10.0.0.1
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", yaml).unwrap();

        assert!(load_config(temp_file.path()).is_err());
    }

    #[test]
    fn test_apply_overrides() {
        let mut config = BuiltinScenario::ThreeLan.config();

        let overrides = ScenarioOverrides {
            data_rate: Some(DataRate::from_bps(10_000_000)),
            delay: Some(Duration::from_millis(5)),
            group: Some(Ipv4Addr::new(239, 0, 0, 1)),
            sink: Some(5),
            no_tracing: true,
        };

        apply_overrides(&mut config, &overrides).unwrap();
        assert_eq!(config.network.data_rate.bps(), 10_000_000);
        assert_eq!(config.network.delay, Duration::from_millis(5));
        assert_eq!(config.multicast.group, Ipv4Addr::new(239, 0, 0, 1));
        assert_eq!(config.chain.sink, Some(5));
        assert!(!config.tracing.enabled);
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let mut config = BuiltinScenario::ThreeLan.config();
        let overrides = ScenarioOverrides {
            group: Some(Ipv4Addr::new(192, 168, 0, 1)),
            ..Default::default()
        };
        assert!(apply_overrides(&mut config, &overrides).is_err());
    }

    #[test]
    fn test_write_then_load() {
        let config = BuiltinScenario::SevenLan.config();
        let temp_file = NamedTempFile::new().unwrap();

        write_config(&config, temp_file.path()).unwrap();
        let loaded = load_config(temp_file.path()).unwrap();
        assert_eq!(loaded, config);
    }
}
