//! IP utility functions for multicast group validation.

use std::net::Ipv4Addr;

/// Check if an address lies in the IPv4 multicast range (224.0.0.0/4)
pub fn is_multicast_group(group: Ipv4Addr) -> bool {
    group.is_multicast()
}

/// Check if an address is in the local network control block (224.0.0.0/24),
/// which is reserved for routing protocols and never forwarded
pub fn is_local_control_group(group: Ipv4Addr) -> bool {
    let octets = group.octets();
    octets[0] == 224 && octets[1] == 0 && octets[2] == 0
}

/// Validate that an address can be used as a forwarded multicast group
pub fn validate_multicast_group(group: Ipv4Addr) -> Result<(), String> {
    if !is_multicast_group(group) {
        return Err(format!("{} is not a multicast address (224.0.0.0/4)", group));
    }
    if is_local_control_group(group) {
        return Err(format!(
            "{} is in the reserved local network control block 224.0.0.0/24",
            group
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_multicast_group() {
        assert!(validate_multicast_group(Ipv4Addr::new(225, 1, 2, 4)).is_ok());
        assert!(validate_multicast_group(Ipv4Addr::new(239, 255, 255, 255)).is_ok());
        assert!(validate_multicast_group(Ipv4Addr::new(224, 0, 1, 1)).is_ok());

        assert!(validate_multicast_group(Ipv4Addr::new(10, 1, 1, 1)).is_err());
        assert!(validate_multicast_group(Ipv4Addr::new(240, 0, 0, 1)).is_err());
        assert!(validate_multicast_group(Ipv4Addr::new(224, 0, 0, 5)).is_err());
    }
}
