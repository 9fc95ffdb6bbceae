//! Core type definitions shared by gates and hosts

use serde::{Deserialize, Serialize};
use std::fmt;

/// Training step counter
pub type Step = u64;

/// Lifecycle phase of an interrupt gate
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum GatePhase {
    /// Handler not registered yet; the process keeps its original
    /// interrupt behavior
    Uninstalled,

    /// Handler registered, waiting for an interrupt
    Armed,

    /// Interrupt observed and previous handler restored (terminal)
    Triggered,

    /// Interrupt observed before any handler was installed; nothing was
    /// captured and nothing will be installed (terminal)
    Interrupted,
}

impl GatePhase {
    /// Derive the phase from the two gate flags
    pub fn from_flags(handler_installed: bool, stop_requested: bool) -> Self {
        match (handler_installed, stop_requested) {
            (true, true) => GatePhase::Triggered,
            (false, true) => GatePhase::Interrupted,
            (true, false) => GatePhase::Armed,
            (false, false) => GatePhase::Uninstalled,
        }
    }
}

impl fmt::Display for GatePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GatePhase::Uninstalled => "uninstalled",
            GatePhase::Armed => "armed",
            GatePhase::Triggered => "triggered",
            GatePhase::Interrupted => "interrupted",
        };
        f.write_str(name)
    }
}
