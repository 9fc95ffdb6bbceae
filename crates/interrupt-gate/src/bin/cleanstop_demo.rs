//! Demo host loop
//!
//! Runs a toy training loop behind an interrupt gate. Press Ctrl-C once to
//! stop after the current step and write a checkpoint record; press it
//! again to abort immediately.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use cleanstop_core::{GateConfig, RunController, Step};
use interrupt_gate::SigintGate;

#[derive(Debug, Serialize)]
struct CheckpointRecord {
    id: String,
    step: Step,
    created_at: DateTime<Utc>,
    interrupted: bool,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn write_checkpoint(dir: &Path, step: Step, interrupted: bool) -> cleanstop_core::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;

    let record = CheckpointRecord {
        id: format!("ckpt-{}-{}", step, Uuid::new_v4()),
        step,
        created_at: Utc::now(),
        interrupted,
    };
    let path = dir.join(format!("{}.json", record.id));
    std::fs::write(&path, serde_json::to_vec_pretty(&record)?)?;
    Ok(path)
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cleanstop_demo=info,interrupt_gate=info,cleanstop_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Session label from args or use default
    let session = std::env::args().nth(1).unwrap_or_else(|| "demo".to_string());
    let total_steps: Step = env_or("CLEANSTOP_STEPS", 1_000);
    let step_time = Duration::from_millis(env_or("CLEANSTOP_STEP_MS", 250));
    let checkpoint_dir = PathBuf::from(env_or(
        "CLEANSTOP_CHECKPOINT_DIR",
        "./checkpoints".to_string(),
    ));

    tracing::info!(
        session = %session,
        total_steps,
        step_ms = step_time.as_millis() as u64,
        "Setting up (Ctrl-C aborts immediately until the first step)"
    );

    let controller = RunController::new();
    let mut gate = SigintGate::new(GateConfig::for_session(session))?;

    let mut step: Step = 0;
    while step < total_steps && !controller.should_stop() {
        if let Err(e) = gate.on_before_step() {
            // Misuse and non-signal failures end the run; an OS refusal is retried next step
            if e.is_fatal() || !e.is_signal_error() {
                return Err(e.into());
            }
            tracing::warn!(step, error = %e, "Interrupt handler not installed; retrying next step");
        }
        std::thread::sleep(step_time);
        step += 1;
        gate.on_after_step(&controller)?;
    }

    let path = write_checkpoint(&checkpoint_dir, step, controller.should_stop())?;
    tracing::info!(
        step,
        path = %path.display(),
        interrupted = controller.should_stop(),
        "Checkpoint written"
    );

    Ok(())
}
