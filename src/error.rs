//! Planning errors.
//!
//! Every planning stage (topology construction, address assignment, tree
//! building and plan emission) reports failures through [`PlanError`]. The
//! planner is deterministic, so any of these means the input is malformed and
//! the plan must not be handed to an engine.

/// Errors that can occur while computing a distribution plan
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    #[error("Invalid topology: {0}")]
    InvalidTopology(String),

    #[error("Address space exhausted: {0}")]
    AddressSpaceExhausted(String),

    #[error("Disconnected chain: segments {junction} and {} do not share exactly one boundary node", .junction + 1)]
    DisconnectedChain { junction: usize },

    #[error("Plan consistency error: {0}")]
    PlanConsistency(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = PlanError::DisconnectedChain { junction: 1 };
        assert_eq!(
            err.to_string(),
            "Disconnected chain: segments 1 and 2 do not share exactly one boundary node"
        );

        let err = PlanError::InvalidTopology("chain has no segments".to_string());
        assert_eq!(err.to_string(), "Invalid topology: chain has no segments");
    }
}
