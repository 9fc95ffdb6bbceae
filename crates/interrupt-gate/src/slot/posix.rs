//! SIGINT slot backed by sigaction(2)
//!
//! The signal path finds its gate through a single process-wide pointer.
//! The handler swaps that pointer out, raises the stop flag, restores the
//! captured disposition and marks the record released. All four steps are
//! async-signal-safe. The record is freed later, outside signal context, by
//! whoever holds the slot.
//!
//! A slot dropped without restoring parks its record in a second pointer.
//! The next slot to arm adopts it: it takes over the live handler and keeps
//! the disposition the abandoned gate captured, or frees it if a late signal
//! already consumed it.

use super::{Disposition, InterruptSlot, StopFlag};
use cleanstop_core::{Error, Result};
use nix::errno::Errno;
use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal};
use parking_lot::Mutex;
use std::mem::MaybeUninit;
use std::ptr::{self, NonNull};
use std::sync::atomic::{AtomicBool, AtomicPtr, Ordering};
use std::sync::Arc;

const SIGNAL: Signal = Signal::SIGINT;

/// State the signal handler needs
struct Armed {
    flag: Arc<StopFlag>,
    previous: libc::sigaction,
    released: AtomicBool,
}

/// Record of the gate currently receiving SIGINT, null when none
static ARMED: AtomicPtr<Armed> = AtomicPtr::new(ptr::null_mut());

/// Record left behind by a slot that abandoned its handler, null when none
static ABANDONED: AtomicPtr<Armed> = AtomicPtr::new(ptr::null_mut());

struct ArmedPtr(NonNull<Armed>);

// SAFETY: the pointee is only shared through ARMED and its own atomics.
unsafe impl Send for ArmedPtr {}

extern "C" fn on_interrupt(_signum: libc::c_int) {
    let armed = ARMED.swap(ptr::null_mut(), Ordering::AcqRel);
    if armed.is_null() {
        return;
    }

    // SAFETY: the record is not freed until `released` is set.
    let armed = unsafe { &*armed };
    armed.flag.raise();
    // SAFETY: `previous` was filled in by the kernel when the slot was armed.
    unsafe {
        libc::sigaction(SIGNAL as libc::c_int, &armed.previous, ptr::null_mut());
    }
    armed.released.store(true, Ordering::Release);
}

fn query() -> Result<libc::sigaction> {
    let mut current = MaybeUninit::<libc::sigaction>::uninit();
    // SAFETY: a null new action only reads the current disposition.
    let res = unsafe { libc::sigaction(SIGNAL as libc::c_int, ptr::null(), current.as_mut_ptr()) };
    Errno::result(res).map_err(|e| Error::SignalRegistration {
        signal: SIGNAL.as_str().to_string(),
        message: format!("query failed: {}", e),
    })?;
    // SAFETY: sigaction succeeded, so `current` is initialized.
    Ok(unsafe { current.assume_init() })
}

fn restore(previous: &libc::sigaction) -> Result<()> {
    // SAFETY: `previous` is a disposition the kernel handed back earlier.
    let res = unsafe { libc::sigaction(SIGNAL as libc::c_int, previous, ptr::null_mut()) };
    Errno::result(res)
        .map(drop)
        .map_err(|e| Error::HandlerRestore {
            signal: SIGNAL.as_str().to_string(),
            message: e.to_string(),
        })
}

fn classify(action: &libc::sigaction) -> Disposition {
    let handler = action.sa_sigaction;
    if handler == libc::SIG_DFL {
        Disposition::Default
    } else if handler == libc::SIG_IGN {
        Disposition::Ignore
    } else if handler == on_interrupt as libc::sighandler_t {
        Disposition::Gate
    } else {
        Disposition::Foreign(handler)
    }
}

/// Take back an armed record and free it
///
/// Restores the captured disposition unless the signal path already did.
fn reclaim(armed: NonNull<Armed>) -> Result<bool> {
    let raw = armed.as_ptr();
    let outcome = match ARMED.compare_exchange(raw, ptr::null_mut(), Ordering::AcqRel, Ordering::Acquire) {
        // SAFETY: swapped out of ARMED, so only this thread can reach it.
        Ok(_) => restore(unsafe { &(*raw).previous }).map(|_| true),
        Err(_) => {
            // The handler owns it until it finishes restoring
            collect(raw);
            return Ok(false);
        }
    };

    // SAFETY: allocated by Box in `arm` and no longer reachable elsewhere.
    drop(unsafe { Box::from_raw(raw) });
    outcome
}

/// Wait for the signal path to finish with a record it swapped out of ARMED,
/// then free it
fn collect(raw: *mut Armed) {
    // SAFETY: the record stays allocated until freed below.
    while !unsafe { (*raw).released.load(Ordering::Acquire) } {
        std::hint::spin_loop();
    }
    // SAFETY: released, and no owner other than the caller remains.
    drop(unsafe { Box::from_raw(raw) });
}

/// Take over an abandoned record for `flag`
///
/// Returns the new record, published in place of the old one, or `None` if
/// a late signal consumed the old one first. The handler stays installed
/// across the swap, so no interrupt falls in a gap.
fn adopt(abandoned: NonNull<Armed>, flag: Arc<StopFlag>) -> Option<NonNull<Armed>> {
    let old = abandoned.as_ptr();
    let armed = NonNull::from(Box::leak(Box::new(Armed {
        flag,
        // SAFETY: abandoned records stay allocated until collected here.
        previous: unsafe { (*old).previous },
        released: AtomicBool::new(false),
    })));

    match ARMED.compare_exchange(old, armed.as_ptr(), Ordering::AcqRel, Ordering::Acquire) {
        Ok(_) => {
            // SAFETY: swapped out of ARMED with no owner left.
            drop(unsafe { Box::from_raw(old) });
            Some(armed)
        }
        Err(_) => {
            // The handler took it and restored the captured disposition
            collect(old);
            // SAFETY: never published, so nothing else can reach it.
            drop(unsafe { Box::from_raw(armed.as_ptr()) });
            None
        }
    }
}

/// SIGINT slot for the current process
///
/// Only one slot can hold SIGINT at a time; arming a second one fails with
/// `Error::SlotOccupied` until the first is released or triggered. A slot
/// that abandoned its handler does not block: the next slot adopts it.
pub struct PosixSlot {
    held: Mutex<Option<ArmedPtr>>,
}

impl PosixSlot {
    /// Create an unarmed slot
    pub fn new() -> Self {
        Self {
            held: Mutex::new(None),
        }
    }

    /// Current SIGINT disposition of the process
    pub fn current() -> Result<Disposition> {
        query().map(|action| classify(&action))
    }
}

impl Default for PosixSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl InterruptSlot for PosixSlot {
    fn signal_name(&self) -> &'static str {
        SIGNAL.as_str()
    }

    fn arm(&self, flag: Arc<StopFlag>) -> Result<()> {
        let mut held = self.held.lock();
        let occupied = || Error::SlotOccupied {
            signal: SIGNAL.as_str().to_string(),
        };
        if held.is_some() {
            return Err(occupied());
        }

        if let Some(abandoned) = NonNull::new(ABANDONED.swap(ptr::null_mut(), Ordering::AcqRel)) {
            if let Some(armed) = adopt(abandoned, Arc::clone(&flag)) {
                *held = Some(ArmedPtr(armed));
                return Ok(());
            }
        }

        let previous = query()?;
        let armed = NonNull::from(Box::leak(Box::new(Armed {
            flag,
            previous,
            released: AtomicBool::new(false),
        })));

        if ARMED
            .compare_exchange(ptr::null_mut(), armed.as_ptr(), Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            // SAFETY: never published, so nothing else can reach it.
            drop(unsafe { Box::from_raw(armed.as_ptr()) });
            return Err(occupied());
        }

        let action = SigAction::new(
            SigHandler::Handler(on_interrupt),
            SaFlags::SA_RESTART,
            SigSet::empty(),
        );
        // SAFETY: on_interrupt only performs async-signal-safe operations.
        if let Err(e) = unsafe { signal::sigaction(SIGNAL, &action) } {
            let _ = reclaim(armed);
            return Err(Error::SignalRegistration {
                signal: SIGNAL.as_str().to_string(),
                message: e.to_string(),
            });
        }

        *held = Some(ArmedPtr(armed));
        Ok(())
    }

    fn disarm(&self) -> Result<bool> {
        match self.held.lock().take() {
            Some(ArmedPtr(armed)) => reclaim(armed),
            None => Ok(false),
        }
    }

    fn disposition(&self) -> Result<Disposition> {
        Self::current()
    }

    fn abandon(&self) {
        // The record stays reachable from ARMED for a late signal
        if let Some(ArmedPtr(armed)) = self.held.lock().take() {
            let stale = ABANDONED.swap(armed.as_ptr(), Ordering::AcqRel);
            if !stale.is_null() {
                collect(stale);
            }
        }
    }
}

impl Drop for PosixSlot {
    fn drop(&mut self) {
        if let Some(ArmedPtr(armed)) = self.held.get_mut().take() {
            let _ = reclaim(armed);
        }
    }
}
