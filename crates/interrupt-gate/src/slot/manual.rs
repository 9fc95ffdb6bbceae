//! In-process interrupt slot
//!
//! Behaves like the SIGINT slot but keeps the disposition in memory, so a
//! host can feed interrupts from its own sources (a supervisor channel, a
//! console command) and tests can deliver them deterministically.

use super::{Disposition, InterruptSlot, StopFlag};
use cleanstop_core::{Error, Result};
use parking_lot::Mutex;
use std::sync::Arc;

/// Outcome of delivering one interrupt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// A gate took the interrupt and will stop at the next step boundary
    Deferred,

    /// No gate was armed; the interrupt reached this disposition instead
    Passthrough(Disposition),
}

#[derive(Debug)]
struct ManualState {
    active: Disposition,
    previous: Option<Disposition>,
    flag: Option<Arc<StopFlag>>,
    abandoned: bool,
    installs: usize,
}

/// Cloneable in-memory interrupt slot; clones share one disposition
#[derive(Debug, Clone)]
pub struct ManualSlot {
    state: Arc<Mutex<ManualState>>,
}

impl ManualSlot {
    /// Create a slot whose original disposition is the platform default
    pub fn new() -> Self {
        Self::with_disposition(Disposition::Default)
    }

    /// Create a slot whose original disposition is `active`
    pub fn with_disposition(active: Disposition) -> Self {
        Self {
            state: Arc::new(Mutex::new(ManualState {
                active,
                previous: None,
                flag: None,
                abandoned: false,
                installs: 0,
            })),
        }
    }

    /// Deliver one interrupt
    pub fn deliver(&self) -> Delivery {
        let mut state = self.state.lock();
        if state.active != Disposition::Gate {
            return Delivery::Passthrough(state.active);
        }

        if let Some(flag) = state.flag.take() {
            flag.raise();
        }
        state.abandoned = false;
        state.active = state.previous.take().unwrap_or(Disposition::Default);
        Delivery::Deferred
    }

    /// Overwrite the active disposition the way an unrelated component would
    pub fn replace_disposition(&self, active: Disposition) {
        self.state.lock().active = active;
    }

    /// Number of times a gate handler has been installed
    pub fn install_count(&self) -> usize {
        self.state.lock().installs
    }

    /// Disposition captured at installation, while a gate holds the slot
    pub fn captured(&self) -> Option<Disposition> {
        self.state.lock().previous
    }
}

impl Default for ManualSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl InterruptSlot for ManualSlot {
    fn signal_name(&self) -> &'static str {
        "manual interrupt"
    }

    fn arm(&self, flag: Arc<StopFlag>) -> Result<()> {
        let mut state = self.state.lock();
        if state.previous.is_some() && !state.abandoned {
            return Err(Error::SlotOccupied {
                signal: self.signal_name().to_string(),
            });
        }

        // An abandoned handler is taken over along with its captured disposition
        if !state.abandoned {
            state.previous = Some(state.active);
        }
        state.abandoned = false;
        state.active = Disposition::Gate;
        state.flag = Some(flag);
        state.installs += 1;
        Ok(())
    }

    fn disarm(&self) -> Result<bool> {
        let mut state = self.state.lock();
        state.flag = None;
        state.abandoned = false;
        match state.previous.take() {
            Some(previous) => {
                state.active = previous;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn disposition(&self) -> Result<Disposition> {
        Ok(self.state.lock().active)
    }

    fn abandon(&self) {
        let mut state = self.state.lock();
        if state.previous.is_some() {
            state.abandoned = true;
        }
    }
}
