//! Cleanstop Core - shared vocabulary for graceful training interruption
//!
//! Provides error handling, gate configuration and the traits a host
//! training loop implements so hooks can ask it to stop between steps.

pub mod config;
pub mod error;
pub mod hooks;
pub mod types;

pub use config::GateConfig;
pub use error::{Error, Result};
pub use hooks::{RunContext, RunController, StepHook};
pub use types::*;
