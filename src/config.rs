use std::net::Ipv4Addr;
use std::time::Duration;

use ipnet::Ipv4Net;
use serde::{Deserialize, Serialize};

use crate::plan::{ChannelSpec, Encapsulation, ListenerSpec, SessionSpec, TraceSpec, TrafficSpec};
use crate::scenarios::BuiltinScenario;
use crate::topology::NodeId;
use crate::utils::{validate_multicast_group, DataRate};

/// Log levels accepted in `general.log_level`
const LOG_LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];

/// Scenario configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    pub chain: ChainConfig,
    #[serde(default)]
    pub multicast: MulticastConfig,
    #[serde(default)]
    pub traffic: TrafficConfig,
    #[serde(default)]
    pub listener: ListenerConfig,
    #[serde(default)]
    pub tracing: TracingConfig,
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        // Validate general settings
        if self.general.name.trim().is_empty() {
            return Err(ValidationError::InvalidGeneral("name cannot be empty".to_string()));
        }
        if let Some(level) = &self.general.log_level {
            if !LOG_LEVELS.contains(&level.to_lowercase().as_str()) {
                return Err(ValidationError::InvalidGeneral(format!(
                    "unknown log_level '{}', expected one of {:?}",
                    level, LOG_LEVELS
                )));
            }
        }

        // Validate network settings
        let network = &self.network;
        if network.segment_prefix < network.base_network.prefix_len() || network.segment_prefix > 30 {
            return Err(ValidationError::InvalidNetwork(format!(
                "segment_prefix /{} must be between /{} and /30",
                network.segment_prefix,
                network.base_network.prefix_len()
            )));
        }

        self.chain.segments()?;

        validate_multicast_group(self.multicast.group).map_err(ValidationError::InvalidMulticast)?;
        if self.multicast.port == 0 {
            return Err(ValidationError::InvalidMulticast("port cannot be 0".to_string()));
        }

        if self.traffic.packet_size == 0 {
            return Err(ValidationError::InvalidTraffic("packet_size must be positive".to_string()));
        }
        if self.traffic.start >= self.traffic.stop {
            return Err(ValidationError::InvalidTraffic(format!(
                "traffic start {:?} must be before stop {:?}",
                self.traffic.start, self.traffic.stop
            )));
        }
        if self.listener.start >= self.listener.stop {
            return Err(ValidationError::InvalidTraffic(format!(
                "listener start {:?} must be before stop {:?}",
                self.listener.start, self.listener.stop
            )));
        }

        self.tracing.validate()?;

        Ok(())
    }

    pub fn channel_spec(&self) -> ChannelSpec {
        ChannelSpec {
            data_rate: self.network.data_rate,
            delay: self.network.delay,
            encapsulation: self.network.encapsulation,
        }
    }

    pub fn traffic_spec(&self) -> TrafficSpec {
        TrafficSpec {
            group: self.multicast.group,
            port: self.multicast.port,
            rate: self.traffic.rate,
            packet_size: self.traffic.packet_size,
            start: self.traffic.start,
            stop: self.traffic.stop,
        }
    }

    /// Listener bound to the wildcard address on the multicast port
    pub fn listener_spec(&self) -> ListenerSpec {
        ListenerSpec {
            bind: Ipv4Addr::UNSPECIFIED,
            port: self.multicast.port,
            start: self.listener.start,
            stop: self.listener.stop,
        }
    }

    pub fn session_spec(&self) -> SessionSpec {
        SessionSpec {
            channel: self.channel_spec(),
            listener: self.listener_spec(),
            tracing: self.tracing.trace_spec(),
        }
    }
}

/// Shared general configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Scenario name, used for the script header
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

/// Channel and addressing settings shared by every segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub data_rate: DataRate,
    #[serde(with = "humantime_serde")]
    pub delay: Duration,
    pub encapsulation: Encapsulation,
    /// First block address plus the prefix budget blocks are drawn from
    pub base_network: Ipv4Net,
    pub segment_prefix: u8,
}

/// Chain description: a built-in scenario or explicit segment lists
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChainConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenario: Option<BuiltinScenario>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segments: Option<Vec<Vec<NodeId>>>,
    /// Sink override; defaults to the last member of the last segment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sink: Option<NodeId>,
}

impl ChainConfig {
    /// Segment membership lists, resolved from the built-in scenario if one is named
    pub fn segments(&self) -> Result<Vec<Vec<NodeId>>, ValidationError> {
        match (&self.scenario, &self.segments) {
            (Some(_), Some(_)) => Err(ValidationError::InvalidChain(
                "specify either scenario or segments, not both".to_string(),
            )),
            (None, None) => Err(ValidationError::InvalidChain(
                "either scenario or segments must be provided".to_string(),
            )),
            (Some(scenario), None) => Ok(scenario.segments()),
            (None, Some(segments)) if segments.is_empty() => Err(ValidationError::InvalidChain(
                "segments cannot be an empty list".to_string(),
            )),
            (None, Some(segments)) => Ok(segments.clone()),
        }
    }
}

/// Multicast group settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MulticastConfig {
    pub group: Ipv4Addr,
    pub port: u16,
}

/// Source application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrafficConfig {
    pub rate: DataRate,
    pub packet_size: u32,
    #[serde(with = "humantime_serde")]
    pub start: Duration,
    #[serde(with = "humantime_serde")]
    pub stop: Duration,
}

/// Sink application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListenerConfig {
    #[serde(with = "humantime_serde")]
    pub start: Duration,
    #[serde(with = "humantime_serde")]
    pub stop: Duration,
}

/// Packet capture settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TracingConfig {
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ascii_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pcap_prefix: Option<String>,
    pub promiscuous: bool,
}

impl TracingConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if !self.enabled {
            return Ok(());
        }
        if self.ascii_file.is_none() && self.pcap_prefix.is_none() {
            return Err(ValidationError::InvalidTracing(
                "tracing is enabled but neither ascii_file nor pcap_prefix is set".to_string(),
            ));
        }
        let blank = |value: &Option<String>| value.as_deref().map_or(false, |s| s.trim().is_empty());
        if blank(&self.ascii_file) || blank(&self.pcap_prefix) {
            return Err(ValidationError::InvalidTracing(
                "ascii_file and pcap_prefix cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Trace settings for the plan, or `None` when tracing is disabled
    pub fn trace_spec(&self) -> Option<TraceSpec> {
        self.enabled.then(|| TraceSpec {
            ascii_file: self.ascii_file.clone(),
            pcap_prefix: self.pcap_prefix.clone(),
            promiscuous: self.promiscuous,
        })
    }
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid general configuration: {0}")]
    InvalidGeneral(String),
    #[error("Invalid network configuration: {0}")]
    InvalidNetwork(String),
    #[error("Invalid chain configuration: {0}")]
    InvalidChain(String),
    #[error("Invalid multicast configuration: {0}")]
    InvalidMulticast(String),
    #[error("Invalid traffic configuration: {0}")]
    InvalidTraffic(String),
    #[error("Invalid tracing configuration: {0}")]
    InvalidTracing(String),
}

/// Default implementations
impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            name: "csma-multicast".to_string(),
            log_level: Some("info".to_string()),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        let channel = ChannelSpec::default();
        Self {
            data_rate: channel.data_rate,
            delay: channel.delay,
            encapsulation: channel.encapsulation,
            base_network: Ipv4Net::new_assert(Ipv4Addr::new(10, 1, 1, 0), 16),
            segment_prefix: 24,
        }
    }
}

impl Default for MulticastConfig {
    fn default() -> Self {
        Self {
            group: Ipv4Addr::new(225, 1, 2, 4),
            port: 9, // Discard port (RFC 863)
        }
    }
}

impl Default for TrafficConfig {
    fn default() -> Self {
        Self {
            rate: DataRate::from_bps(255),
            packet_size: 128,
            start: Duration::from_secs(1),
            stop: Duration::from_secs(10),
        }
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            start: Duration::from_secs(1),
            stop: Duration::from_secs(12),
        }
    }
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ascii_file: Some("csma-multicast.tr".to_string()),
            pcap_prefix: Some("csma-multicast".to_string()),
            promiscuous: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> Config {
        serde_yaml::from_str("chain:\n  segments: [[0, 1, 2], [2, 3, 4]]\n").unwrap()
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = minimal();
        assert!(config.validate().is_ok());
        assert_eq!(config.network.data_rate.bps(), 5_000_000);
        assert_eq!(config.network.delay, Duration::from_millis(2));
        assert_eq!(config.network.base_network.to_string(), "10.1.1.0/16");
        assert_eq!(config.multicast.group, Ipv4Addr::new(225, 1, 2, 4));
        assert_eq!(config.traffic.packet_size, 128);
        assert_eq!(config.listener.stop, Duration::from_secs(12));
        assert!(config.tracing.enabled);
    }

    #[test]
    fn test_full_config() {
        let yaml = r#"
general:
  name: "lab"
  log_level: debug
network:
  data_rate: "10Mbps"
  delay: "5ms"
  encapsulation: Llc
  base_network: "192.168.1.0/16"
  segment_prefix: 24
chain:
  segments:
    - [0, 1, 2]
    - [2, 3]
  sink: 3
multicast:
  group: 239.1.1.1
  port: 5000
traffic:
  rate: "1kbps"
  packet_size: 512
  start: "2s"
  stop: "20s"
listener:
  start: "1s"
  stop: "25s"
tracing:
  enabled: false
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.network.encapsulation, Encapsulation::Llc);
        assert_eq!(config.chain.sink, Some(3));
        assert_eq!(config.traffic_spec().destination().to_string(), "239.1.1.1:5000");
        assert_eq!(config.listener_spec().bind_address().to_string(), "0.0.0.0:5000");
        assert!(config.tracing.trace_spec().is_none());
    }

    #[test]
    fn test_chain_source_is_exclusive() {
        let mut config = minimal();
        config.chain.scenario = Some(BuiltinScenario::ThreeLan);
        assert!(matches!(config.validate(), Err(ValidationError::InvalidChain(_))));

        config.chain.segments = None;
        assert!(config.validate().is_ok());
        assert_eq!(config.chain.segments().unwrap().len(), 3);

        config.chain.scenario = None;
        assert!(matches!(config.validate(), Err(ValidationError::InvalidChain(_))));

        config.chain.segments = Some(Vec::new());
        assert!(matches!(config.validate(), Err(ValidationError::InvalidChain(_))));
    }

    #[test]
    fn test_invalid_group() {
        let mut config = minimal();
        config.multicast.group = Ipv4Addr::new(10, 1, 1, 1);
        assert!(matches!(config.validate(), Err(ValidationError::InvalidMulticast(_))));
        config.multicast.group = Ipv4Addr::new(224, 0, 0, 13);
        assert!(matches!(config.validate(), Err(ValidationError::InvalidMulticast(_))));
    }

    #[test]
    fn test_invalid_timing() {
        let mut config = minimal();
        config.traffic.stop = config.traffic.start;
        assert!(matches!(config.validate(), Err(ValidationError::InvalidTraffic(_))));

        let mut config = minimal();
        config.listener.start = Duration::from_secs(30);
        assert!(matches!(config.validate(), Err(ValidationError::InvalidTraffic(_))));
    }

    #[test]
    fn test_invalid_network_and_tracing() {
        let mut config = minimal();
        config.network.segment_prefix = 8;
        assert!(matches!(config.validate(), Err(ValidationError::InvalidNetwork(_))));

        let mut config = minimal();
        config.tracing.ascii_file = None;
        config.tracing.pcap_prefix = None;
        assert!(matches!(config.validate(), Err(ValidationError::InvalidTracing(_))));

        let mut config = minimal();
        config.general.log_level = Some("loud".to_string());
        assert!(matches!(config.validate(), Err(ValidationError::InvalidGeneral(_))));
    }
}
