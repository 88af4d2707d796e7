//! Distribution plan module.
//!
//! The plan is the single artifact the planner hands to a simulation engine:
//! topology, address blocks, interface addresses, forwarding entries, endpoint
//! roles and the session (channel, applications, tracing) settings.

pub mod types;
pub mod emitter;

pub use emitter::emit_plan;
pub use types::{
    ChannelSpec,
    DistributionPlan,
    Encapsulation,
    ListenerSpec,
    SessionSpec,
    TraceSpec,
    TrafficSpec,
};
