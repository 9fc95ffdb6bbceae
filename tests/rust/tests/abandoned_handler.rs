//! Gates dropped without restoring their handler
//!
//! Walks consecutive sessions in one process: a later gate takes over a
//! handler an earlier one left installed, and a late interrupt that lands
//! on an abandoned handler still puts the original disposition back.

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

fn leaky_session(name: &str) -> Result<SigintGate> {
    let mut gate = SigintGate::new(GateConfig::for_session(name).restore_on_drop(false))?;
    gate.on_before_step()?;
    Ok(gate)
}

#[test]
fn test_sessions_after_abandoned_handler() -> Result<()> {
    integration_tests::init_tracing();

    let original = SigAction::new(
        SigHandler::Handler(original_handler),
        SaFlags::empty(),
        SigSet::empty(),
    );
    let displaced = unsafe { signal::sigaction(Signal::SIGINT, &original)? };
    let before = PosixSlot::current()?;
    assert!(matches!(before, Disposition::Foreign(_)));

    // First session leaves its handler behind
    drop(leaky_session("first")?);
    assert_eq!(PosixSlot::current()?, Disposition::Gate);

    // Second session arms over it and restores the disposition the first captured
    let controller = RunController::new();
    let mut second = SigintGate::new(GateConfig::for_session("second"))?;
    second.on_before_step()?;
    assert_eq!(second.phase(), GatePhase::Armed);

    raise(Signal::SIGINT)?;
    assert_eq!(hits(), 0);
    assert_eq!(second.phase(), GatePhase::Triggered);
    assert_eq!(PosixSlot::current()?, before);

    second.on_after_step(&controller)?;
    assert_eq!(controller.stop_requests(), 1);
    drop(second);
    assert_eq!(PosixSlot::current()?, before);

    // A late interrupt on an abandoned handler is absorbed and restores
    drop(leaky_session("third")?);
    assert_eq!(PosixSlot::current()?, Disposition::Gate);
    raise(Signal::SIGINT)?;
    assert_eq!(hits(), 0);
    assert_eq!(PosixSlot::current()?, before);

    // The next gate still arms, capturing the restored disposition
    let mut fourth = SigintGate::new(GateConfig::for_session("fourth"))?;
    fourth.on_before_step()?;
    assert_eq!(fourth.phase(), GatePhase::Armed);
    assert_eq!(PosixSlot::current()?, Disposition::Gate);
    drop(fourth);
    assert_eq!(PosixSlot::current()?, before);

    raise(Signal::SIGINT)?;
    assert_eq!(hits(), 1);

    unsafe { signal::sigaction(Signal::SIGINT, &displaced)? };
    Ok(())
}
