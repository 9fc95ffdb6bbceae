//! A checkpointing host loop interrupted in the middle of a step

use anyhow::Result;
use cleanstop_core::{GateConfig, RunContext, RunController, Step, StepHook};
use interrupt_gate::{Disposition, PosixSlot, SigintGate};
use nix::sys::signal::{raise, Signal};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Checkpoint {
    step: Step,
    weights: Vec<f32>,
}

/// Hook that records how many steps it saw, next to the gate
#[derive(Default)]
struct StepCounter {
    steps: Step,
}

impl StepHook for StepCounter {
    fn after_step(&mut self, _ctx: &dyn RunContext) -> cleanstop_core::Result<()> {
        self.steps += 1;
        Ok(())
    }
}

fn save(dir: &Path, checkpoint: &Checkpoint) -> Result<()> {
    let path = dir.join(format!("step-{}.json", checkpoint.step));
    std::fs::write(path, serde_json::to_vec(checkpoint)?)?;
    Ok(())
}

#[test]
fn test_interrupt_mid_step_saves_checkpoint() -> Result<()> {
    integration_tests::init_tracing();

    let dir = tempfile::tempdir()?;
    let before = PosixSlot::current()?;
    assert_ne!(before, Disposition::Gate);

    let controller = RunController::new();
    let mut hooks: Vec<Box<dyn StepHook>> = vec![
        Box::new(SigintGate::new(GateConfig::for_session("checkpoint-host"))?),
        Box::new(StepCounter::default()),
    ];

    let mut state = Checkpoint {
        step: 0,
        weights: vec![0.0; 4],
    };

    while !controller.should_stop() && state.step < 1_000 {
        for hook in hooks.iter_mut() {
            hook.before_step()?;
        }

        for w in state.weights.iter_mut() {
            *w += 0.5;
        }
        if state.step == 4 {
            // Operator presses Ctrl-C while step 5 is running
            raise(Signal::SIGINT)?;
        }
        state.step += 1;

        for hook in hooks.iter_mut() {
            hook.after_step(&controller)?;
        }
    }

    // The interrupted step completed and nothing after it started
    assert_eq!(state.step, 5);
    assert_eq!(controller.stop_requests(), 1);
    assert_eq!(PosixSlot::current()?, before);

    save(dir.path(), &state)?;
    let saved: Checkpoint =
        serde_json::from_slice(&std::fs::read(dir.path().join("step-5.json"))?)?;
    assert_eq!(saved, state);
    assert_eq!(saved.weights, vec![2.5; 4]);

    drop(hooks);
    assert_eq!(PosixSlot::current()?, before);
    Ok(())
}
