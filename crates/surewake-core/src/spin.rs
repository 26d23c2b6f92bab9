//! Internal low-level lock for the condvar's bookkeeping.
//!
//! Every critical section guarded by this lock is O(1) pointer relinking
//! with no suspension inside, so a busy-wait lock is appropriate: blocking
//! here through the condvar itself would recurse. The lock word is zero
//! when unlocked, which keeps the containing structures valid under
//! all-zero initialization.

use core::sync::atomic::{AtomicU32, Ordering};

const UNLOCKED: u32 = 0;
const LOCKED: u32 = 1;

/// A minimal test-and-set spinlock. Not fair and not reentrant; hold times
/// must stay in the nanosecond range.
pub(crate) struct RawSpin {
    word: AtomicU32,
}

impl RawSpin {
    pub(crate) const fn new() -> Self {
        Self {
            word: AtomicU32::new(UNLOCKED),
        }
    }

    /// Spins until the lock is acquired. Released when the guard drops.
    pub(crate) fn lock(&self) -> SpinGuard<'_> {
        loop {
            if self
                .word
                .compare_exchange_weak(UNLOCKED, LOCKED, Ordering::Acquire, Ordering::Relaxed)
                .is_ok()
            {
                return SpinGuard { spin: self };
            }
            while self.word.load(Ordering::Relaxed) == LOCKED {
                core::hint::spin_loop();
            }
        }
    }
}

pub(crate) struct SpinGuard<'a> {
    spin: &'a RawSpin,
}

impl Drop for SpinGuard<'_> {
    fn drop(&mut self) {
        self.spin.word.store(UNLOCKED, Ordering::Release);
    }
}
