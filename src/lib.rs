//! Agent-based simulation of opinion polarization driven by attention and
//! information exchange on a social network.
//!
//! An [`Engine`] builds a [`Network`], places one agent per node, and then
//! advances the whole population one tick at a time: an agent selected in
//! proportion to its attention interacts with a random neighbor, after which
//! every agent's attention decays and its opinion integrates one step of a
//! bistable stochastic differential equation. Every tick is recorded by a
//! [`DataRecorder`].

pub mod config;
pub mod dynamics;
pub mod engine;
pub mod error;
pub mod generator;
pub mod network;
pub mod population;
pub mod recorder;
pub mod scheduler;

pub use config::{Config, ModelParams, RunParams};
pub use engine::Engine;
pub use error::{Error, Result};
pub use generator::{AgentType, Generator, InitialState, ValueDistribution};
pub use network::{Network, NodeLabel, Topology};
pub use population::{AgentState, Population};
pub use recorder::{DataRecorder, Snapshot};
