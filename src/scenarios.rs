//! Built-in chain scenarios.
//!
//! Two reference layouts ship with the tool:
//!
//! ```text
//! three-lan:
//!                 Lan1
//!             ===========
//!             |    |    |
//!   n0   n1   n2   n3   n4   n5   n6
//!   |    |    |         |    |    |
//!   ===========         ===========
//!      Lan0                Lan2
//!
//! seven-lan:
//!                 Lan1                 Lan3                    Lan5
//!             ============        ==============         ================
//!             |    |    |          |          |           |      |     |
//!   n0   n1   n2   n3   n4   n5   n6          n7   n8    n9     n10   n11   n12    n13     n14
//!   |    |    |         |    |     |          |     |     |            |     |      |      |
//!   ===========         ============          =============            ======================
//!       Lan0              Lan2                     Lan4                       Lan6
//! ```
//!
//! In both, n0 is the multicast source and the last node of the last LAN
//! listens for the group.

use serde::{Deserialize, Serialize};

use crate::config::{ChainConfig, Config, GeneralConfig, TracingConfig};
use crate::topology::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum BuiltinScenario {
    /// Three LANs joined at n2 and n4
    ThreeLan,
    /// Seven LANs joined at n2, n4, n6, n7, n9 and n11
    SevenLan,
}

impl BuiltinScenario {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ThreeLan => "three-lan",
            Self::SevenLan => "seven-lan",
        }
    }

    /// Segment membership lists, in chain order
    pub fn segments(&self) -> Vec<Vec<NodeId>> {
        match self {
            Self::ThreeLan => vec![vec![0, 1, 2], vec![2, 3, 4], vec![4, 5, 6]],
            Self::SevenLan => vec![
                vec![0, 1, 2],
                vec![2, 3, 4],
                vec![4, 5, 6],
                vec![6, 7],
                vec![7, 8, 9],
                vec![9, 10, 11],
                vec![11, 12, 13, 14],
            ],
        }
    }

    /// Complete configuration for the scenario with default settings
    pub fn config(&self) -> Config {
        Config {
            general: GeneralConfig {
                name: self.name().to_string(),
                ..GeneralConfig::default()
            },
            network: Default::default(),
            chain: ChainConfig {
                scenario: Some(*self),
                segments: None,
                sink: None,
            },
            multicast: Default::default(),
            traffic: Default::default(),
            listener: Default::default(),
            tracing: TracingConfig {
                promiscuous: self.promiscuous_capture(),
                ..TracingConfig::default()
            },
        }
    }

    /// Whether pcap captures put devices in promiscuous mode
    fn promiscuous_capture(&self) -> bool {
        match self {
            Self::ThreeLan => true,
            Self::SevenLan => false,
        }
    }
}
