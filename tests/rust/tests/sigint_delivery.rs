//! Real SIGINT delivery against a gate
//!
//! The SIGINT disposition is process-wide, so this binary holds a single
//! test that walks the whole lifecycle in order.

use anyhow::Result;
use cleanstop_core::{GateConfig, GatePhase, RunController};
use interrupt_gate::{Disposition, PosixSlot, SigintGate};
use nix::sys::signal::{self, raise, SaFlags, SigAction, SigHandler, SigSet, Signal};
use std::sync::atomic::{AtomicUsize, Ordering};

static ORIGINAL_HITS: AtomicUsize = AtomicUsize::new(0);

extern "C" fn original_handler(_signum: libc::c_int) {
    ORIGINAL_HITS.fetch_add(1, Ordering::SeqCst);
}

fn hits() -> usize {
    ORIGINAL_HITS.load(Ordering::SeqCst)
}

#[test]
fn test_sigint_lifecycle() -> Result<()> {
    integration_tests::init_tracing();

    // Stand-in for whatever handler the process had before training
    let original = SigAction::new(
        SigHandler::Handler(original_handler),
        SaFlags::empty(),
        SigSet::empty(),
    );
    let displaced = unsafe { signal::sigaction(Signal::SIGINT, &original)? };
    let before = PosixSlot::current()?;
    assert!(matches!(before, Disposition::Foreign(_)));

    let controller = RunController::new();
    let mut gate = SigintGate::new(GateConfig::for_session("sigint-lifecycle"))?;

    // Setup phase: the gate has not taken over yet
    raise(Signal::SIGINT)?;
    assert_eq!(hits(), 1);
    assert_eq!(gate.phase(), GatePhase::Uninstalled);
    assert_eq!(PosixSlot::current()?, before);

    // Three clean steps
    for _ in 0..3 {
        gate.on_before_step()?;
        gate.on_after_step(&controller)?;
    }
    assert_eq!(controller.stop_requests(), 0);
    assert_eq!(gate.phase(), GatePhase::Armed);
    assert_eq!(PosixSlot::current()?, Disposition::Gate);

    // First interrupt is absorbed and the original handler comes back
    raise(Signal::SIGINT)?;
    assert_eq!(hits(), 1);
    assert!(gate.is_stop_requested());
    assert_eq!(gate.phase(), GatePhase::Triggered);
    assert_eq!(PosixSlot::current()?, before);

    // Step 4 forwards the stop exactly once
    gate.on_before_step()?;
    assert_eq!(controller.stop_requests(), 0);
    gate.on_after_step(&controller)?;
    assert_eq!(controller.stop_requests(), 1);
    assert_eq!(PosixSlot::current()?, before);

    // Second interrupt gets the pre-installation behavior
    raise(Signal::SIGINT)?;
    assert_eq!(hits(), 2);

    // Later steps keep asking, and never reinstall
    gate.on_before_step()?;
    gate.on_after_step(&controller)?;
    assert_eq!(controller.stop_requests(), 2);
    assert_eq!(PosixSlot::current()?, before);

    drop(gate);
    assert_eq!(PosixSlot::current()?, before);

    unsafe { signal::sigaction(Signal::SIGINT, &displaced)? };
    Ok(())
}
