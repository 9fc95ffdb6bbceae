//! Gate configuration types

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Interrupt gate configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Session label attached to every log event
    pub session: String,

    /// Restore the previous interrupt handler when a gate is dropped while
    /// still armed
    pub restore_on_drop: bool,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            session: "training".to_string(),
            restore_on_drop: true,
        }
    }
}

impl GateConfig {
    /// Create a config for the named session
    pub fn for_session(session: impl Into<String>) -> Self {
        Self {
            session: session.into(),
            ..Default::default()
        }
    }

    /// Set restore-on-drop behavior
    pub fn restore_on_drop(mut self, restore: bool) -> Self {
        self.restore_on_drop = restore;
        self
    }

    /// Check the configuration for values the gate cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.session.trim().is_empty() {
            return Err(Error::InvalidConfig {
                message: "session label must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Parse and validate a JSON config document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: GateConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}
