//! # Chaincast - Static multicast planning for chained LAN simulations
//!
//! This library computes the static multicast forwarding plan for a chain of
//! LAN segments joined end-to-end through shared boundary nodes, and hands
//! that plan to a discrete-event network simulation engine.
//!
//! ## Overview
//!
//! A single source at the head of the chain sends UDP datagrams to a multicast
//! group; every boundary node relays the group's traffic into the next
//! segment; a sink at the tail of the chain joins the group and listens. The
//! planner works out everything that has to be installed for that to happen,
//! without any simulator present.
//!
//! ## Key Features
//!
//! - **Validated Topologies**: Chains are checked for shared boundary nodes and stray reuse
//! - **Disjoint Addressing**: One block per segment, `10.1.1.0/24`, `10.1.2.0/24`, ...
//! - **Loop-Driven Routing**: One relay rule and default route per junction
//! - **Engine Boundary**: A small trait separates planning from installation
//! - **Reproducible**: Identical input produces byte-identical plans
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - `config`: Type-safe scenario configuration and YAML parsing
//! - `config_loader`: Configuration file loading and CLI overrides
//! - `topology`: Chain topology model and validation
//! - `ip`: Segment address blocks and interface addresses
//! - `tree`: Multicast distribution tree construction
//! - `plan`: Distribution plan packaging and consistency checks
//! - `engine`: Simulation engine trait, plan installation and the recording engine
//! - `scenarios`: Built-in chain layouts
//! - `orchestrator`: High-level orchestration of plan generation
//! - `utils`: Data rate parsing and multicast address checks
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use chaincast::{config_loader, orchestrator};
//! use std::path::Path;
//!
//! // Load configuration from YAML file
//! let config = config_loader::load_config(Path::new("scenario.yaml"))?;
//!
//! // Plan the scenario and write plan.json, scenario.yaml and manifest.json
//! let outputs = orchestrator::generate_scenario(&config, Path::new("chaincast_output"))?;
//! println!("{} relay rules", outputs.summary.relay_rules);
//! # Ok::<(), color_eyre::eyre::Error>(())
//! ```
//!
//! ## Configuration Format
//!
//! ```yaml
//! general:
//!   name: "csma-multicast"
//!
//! network:
//!   data_rate: "5Mbps"
//!   delay: "2ms"
//!   base_network: "10.1.1.0/16"
//!
//! chain:
//!   segments:
//!     - [0, 1, 2]
//!     - [2, 3, 4]
//!     - [4, 5, 6]
//!
//! multicast:
//!   group: 225.1.2.4
//!   port: 9
//! ```
//!
//! ## Error Handling
//!
//! Planning stages return the typed [`error::PlanError`]. Pipeline and I/O
//! functions return `color_eyre::Result` with context attached.

pub mod config;
pub mod config_loader;
pub mod error;

pub mod topology;
pub mod ip;
pub mod tree;
pub mod plan;
pub mod engine;
pub mod scenarios;
pub mod utils;
pub mod orchestrator;

pub use error::PlanError;
