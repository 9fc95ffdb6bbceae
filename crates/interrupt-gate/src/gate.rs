//! Interrupt gate: turns one interrupt into a stop request at the next step
//! boundary

use crate::slot::{Disposition, InterruptSlot, StopFlag};
use chrono::{DateTime, Utc};
use cleanstop_core::{GateConfig, GatePhase, Result, RunContext, Step, StepHook};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[cfg(unix)]
use crate::slot::PosixSlot;

/// Interrupt gate bound to the real SIGINT disposition
#[cfg(unix)]
pub type SigintGate = InterruptGate<PosixSlot>;

/// Step hook that defers an interrupt until the current step completes
///
/// The handler is installed on the first `on_before_step`, so setup work
/// before the first step keeps the original interrupt behavior. The first
/// interrupt after that raises the stop flag and puts the original handler
/// back, so a second interrupt behaves as if the gate were never there.
pub struct InterruptGate<S: InterruptSlot> {
    /// Configuration
    config: GateConfig,

    /// Interrupt slot owning the captured previous handler
    slot: S,

    /// Stop flag raised from the signal path
    flag: Arc<StopFlag>,

    /// Whether the handler has been installed
    handler_installed: bool,

    /// Steps completed since the gate was created
    steps_observed: Step,

    /// When a step boundary first saw the stop flag
    stop_observed_at: Option<DateTime<Utc>>,
}

#[cfg(unix)]
impl InterruptGate<PosixSlot> {
    /// Create a gate for the process SIGINT disposition
    pub fn new(config: GateConfig) -> Result<Self> {
        Self::with_slot(PosixSlot::new(), config)
    }
}

impl<S: InterruptSlot> InterruptGate<S> {
    /// Create a gate over an arbitrary interrupt slot
    pub fn with_slot(slot: S, config: GateConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            slot,
            flag: Arc::new(StopFlag::new()),
            handler_installed: false,
            steps_observed: 0,
            stop_observed_at: None,
        })
    }

    /// Install the handler if this is the first step
    pub fn on_before_step(&mut self) -> Result<()> {
        if self.handler_installed || self.flag.is_raised() {
            return Ok(());
        }

        self.slot.arm(Arc::clone(&self.flag))?;
        self.handler_installed = true;

        info!(
            session = %self.config.session,
            signal = self.slot.signal_name(),
            "Interrupt handler installed; interrupt will stop after the current step"
        );
        Ok(())
    }

    /// Forward a pending stop to the host
    pub fn on_after_step(&mut self, ctx: &dyn RunContext) -> Result<()> {
        self.steps_observed += 1;
        if !self.flag.is_raised() {
            return Ok(());
        }

        if self.stop_observed_at.is_none() {
            self.stop_observed_at = Some(Utc::now());

            // Free the handler state now that the signal path is done with it
            match self.slot.disarm() {
                Ok(true) => debug!(session = %self.config.session, "Previous handler restored at step boundary"),
                Ok(false) => {}
                Err(e) => warn!(session = %self.config.session, error = %e, "Failed to release interrupt slot"),
            }

            info!(
                session = %self.config.session,
                step = self.steps_observed,
                host_stopping = ctx.stop_requested(),
                "Interrupt received; requesting graceful stop"
            );
        } else {
            debug!(
                session = %self.config.session,
                step = self.steps_observed,
                "Repeating stop request"
            );
        }

        ctx.request_stop()
    }

    /// In-process equivalent of the signal path
    ///
    /// Raises the stop flag and restores the previous handler. Safe to call
    /// in any phase, including before installation, where nothing is restored
    /// and the gate moves to `GatePhase::Interrupted`.
    pub fn handle_interrupt(&self) {
        self.flag.raise();
        if let Err(e) = self.slot.disarm() {
            warn!(
                session = %self.config.session,
                error = %e,
                "Failed to restore interrupt handler; stop is still pending"
            );
        }
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> GatePhase {
        GatePhase::from_flags(self.handler_installed, self.flag.is_raised())
    }

    /// Whether an interrupt has been observed
    pub fn is_stop_requested(&self) -> bool {
        self.flag.is_raised()
    }

    /// Whether the handler has ever been installed
    pub fn is_handler_installed(&self) -> bool {
        self.handler_installed
    }

    /// Steps completed since the gate was created
    pub fn steps_observed(&self) -> Step {
        self.steps_observed
    }

    /// When a step boundary first saw the stop
    pub fn stop_observed_at(&self) -> Option<DateTime<Utc>> {
        self.stop_observed_at
    }

    /// Currently active interrupt disposition
    pub fn active_disposition(&self) -> Result<Disposition> {
        self.slot.disposition()
    }

    /// Get configuration
    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Get the interrupt slot
    pub fn slot(&self) -> &S {
        &self.slot
    }
}

impl<S: InterruptSlot> StepHook for InterruptGate<S> {
    fn before_step(&mut self) -> Result<()> {
        self.on_before_step()
    }

    fn after_step(&mut self, ctx: &dyn RunContext) -> Result<()> {
        self.on_after_step(ctx)
    }
}

impl<S: InterruptSlot> Drop for InterruptGate<S> {
    fn drop(&mut self) {
        if self.phase() != GatePhase::Armed {
            let _ = self.slot.disarm();
            return;
        }

        if !self.config.restore_on_drop {
            debug!(session = %self.config.session, "Gate dropped while armed; leaving handler installed");
            self.slot.abandon();
            return;
        }

        match self.slot.disarm() {
            Ok(true) => warn!(
                session = %self.config.session,
                "Gate dropped while armed; previous interrupt handler restored"
            ),
            Ok(false) => {}
            Err(e) => warn!(
                session = %self.config.session,
                error = %e,
                "Failed to restore interrupt handler on drop"
            ),
        }
    }
}
