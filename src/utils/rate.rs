//! Data rate parsing utilities.
//!
//! This module parses data rate strings (e.g. "5Mbps", "255b/s") into bits per
//! second, accepting the unit spellings the simulation engine understands.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Number followed by an optional unit, e.g. "5Mbps", "1.5 kb/s", "5000000"
static RATE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d+(?:\.\d+)?)\s*([A-Za-z]*(?:/s|ps)?)\s*$").expect("Invalid data rate regex")
});

/// A link or application data rate in bits per second
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DataRate {
    bits_per_second: u64,
}

impl DataRate {
    pub const fn from_bps(bits_per_second: u64) -> Self {
        Self { bits_per_second }
    }

    pub fn bps(&self) -> u64 {
        self.bits_per_second
    }
}

/// Multiplier (in bits) for a unit suffix
fn unit_multiplier(unit: &str) -> Option<f64> {
    let multiplier = match unit {
        "" | "b/s" | "bps" => 1.0,
        "B/s" | "Bps" => 8.0,
        "kb/s" | "kbps" | "Kb/s" | "Kbps" => 1e3,
        "KB/s" | "kB/s" | "KBps" | "kBps" => 8e3,
        "Kib/s" => 1024.0,
        "KiB/s" => 8.0 * 1024.0,
        "Mb/s" | "Mbps" => 1e6,
        "MB/s" | "MBps" => 8e6,
        "Mib/s" => 1024.0 * 1024.0,
        "MiB/s" => 8.0 * 1024.0 * 1024.0,
        "Gb/s" | "Gbps" => 1e9,
        "GB/s" | "GBps" => 8e9,
        "Gib/s" => 1024.0 * 1024.0 * 1024.0,
        "GiB/s" => 8.0 * 1024.0 * 1024.0 * 1024.0,
        _ => return None,
    };
    Some(multiplier)
}

/// Parse a data rate string to bits per second
///
/// # Examples
/// ```
/// use chaincast::utils::rate::parse_data_rate;
///
/// assert_eq!(parse_data_rate("255b/s"), Ok(255));
/// assert_eq!(parse_data_rate("5Mbps"), Ok(5_000_000));
/// assert_eq!(parse_data_rate("5000000"), Ok(5_000_000));
/// assert!(parse_data_rate("fast").is_err());
/// ```
pub fn parse_data_rate(rate: &str) -> Result<u64, String> {
    let caps = RATE_PATTERN
        .captures(rate)
        .ok_or_else(|| format!("Invalid data rate format: {}", rate))?;

    let value: f64 = caps[1]
        .parse()
        .map_err(|_| format!("Invalid data rate value: {}", rate))?;
    let multiplier = unit_multiplier(&caps[2])
        .ok_or_else(|| format!("Unknown data rate unit '{}' in {}", &caps[2], rate))?;

    let bits = (value * multiplier).round();
    if bits < 1.0 {
        return Err(format!("Data rate must be positive: {}", rate));
    }
    Ok(bits as u64)
}

impl FromStr for DataRate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_data_rate(s).map(Self::from_bps)
    }
}

impl TryFrom<String> for DataRate {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DataRate> for String {
    fn from(rate: DataRate) -> Self {
        rate.to_string()
    }
}

impl fmt::Display for DataRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}bps", self.bits_per_second)
    }
}
