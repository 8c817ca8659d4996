//! # scenefsm-host
//!
//! Runtime host for scenefsm programs.
//!
//! This crate provides:
//! - YAML and environment configuration
//! - A simulated resource activator with configurable latency
//! - An async tick loop that drives the interpreter
//! - Broadcast of fired transitions to subscribers

pub mod activator;
pub mod config;
pub mod error;
pub mod runner;

pub use activator::{DelayedHandle, SimulatedActivator};
pub use config::{Config, ConfigError, ProgramConfig, RuntimeConfig};
pub use error::HostError;
pub use runner::{load_graph, Runner, RunnerSnapshot, RunnerStats};
