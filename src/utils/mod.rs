//! Shared utilities: data rate parsing and multicast address checks.

pub mod ip_utils;
pub mod rate;

pub use ip_utils::validate_multicast_group;
pub use rate::{parse_data_rate, DataRate};
