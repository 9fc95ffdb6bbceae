//! Graceful interruption for checkpointed training loops
//!
//! An [`InterruptGate`] is a step hook. It takes over SIGINT once training
//! steps begin and turns the first Ctrl-C into a stop request at the next
//! step boundary, so the host can flush its checkpoint. It then hands SIGINT
//! back to the previous handler, so a second Ctrl-C still aborts.
//!
//! # Example
//!
//! ```no_run
//! use cleanstop_core::{GateConfig, RunController};
//! use interrupt_gate::SigintGate;
//!
//! let controller = RunController::new();
//! let mut gate = SigintGate::new(GateConfig::for_session("resnet50")).unwrap();
//!
//! let mut step = 0u64;
//! while !controller.should_stop() && step < 10_000 {
//!     gate.on_before_step().unwrap();
//!     step += 1; // run one training step
//!     gate.on_after_step(&controller).unwrap();
//! }
//! // save the checkpoint for `step` here
//! ```

pub mod gate;
pub mod slot;

pub use gate::InterruptGate;
#[cfg(unix)]
pub use gate::SigintGate;
#[cfg(unix)]
pub use slot::PosixSlot;
pub use slot::{Delivery, Disposition, InterruptSlot, ManualSlot, StopFlag};

// Re-export types from cleanstop-core for convenience
pub use cleanstop_core::{GateConfig, GatePhase, RunContext, RunController, StepHook};
