//! Fixtures shared by the benchmarks

use cleanstop_core::GateConfig;
use interrupt_gate::{InterruptGate, ManualSlot};

/// A gate that has installed its handler on an in-memory slot
pub fn armed_gate() -> (InterruptGate<ManualSlot>, ManualSlot) {
    let slot = ManualSlot::new();
    let mut gate = InterruptGate::with_slot(slot.clone(), GateConfig::for_session("bench"))
        .expect("default config is valid");
    gate.on_before_step().expect("manual slot arms");
    (gate, slot)
}
