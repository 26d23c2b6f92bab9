//! External lock seam and the two reference locks.
//!
//! The condvar never names a concrete mutex; it talks to [`RawLock`].
//! [`ClassicLock`] is an ordinary host mutex and exercises the classic
//! wake strategy (woken thread re-acquires). [`HandoffMutex`] can adopt a
//! waiter's own record and convey ownership to it directly, which is what
//! wait morphing needs.

#![allow(unsafe_code)]

use core::cell::Cell;
use core::ptr::NonNull;
use core::sync::atomic::{AtomicBool, Ordering};

use parking_lot::lock_api::RawMutex as _;

use crate::platform::Platform;
use crate::queue::{wake_owner, WaitRecord, WaitState, WaiterQueue};
use crate::spin::RawSpin;

/// The external lock as seen by the condvar.
///
/// `lock` and `unlock` are the usual acquire/release pair; `unlock` must
/// only be called by the thread holding the lock. `grant_to` exists only
/// on locks that advertise `SUPPORTS_HANDOFF` and is how a waker conveys
/// ownership to a chosen waiter without releasing the lock for open
/// contention.
pub trait RawLock<P: Platform> {
    /// Whether this lock can adopt a transferred wait record. Selects the
    /// wake strategy at the type level.
    const SUPPORTS_HANDOFF: bool;

    fn lock(&self);

    /// Releases the lock. Panics if the calling thread does not hold it,
    /// where the implementation can tell.
    fn unlock(&self);

    /// Adopts `rec`, whose thread becomes the lock's owner: immediately if
    /// the lock is free, otherwise when the current holder unlocks. The
    /// lock delivers the wakeup (`WokenOwner`) once ownership is conveyed.
    ///
    /// # Safety
    ///
    /// `rec` must be a live record unlinked from every queue, published as
    /// `Transferred`, whose thread stays suspended until a final state is
    /// published. Must only be called when `SUPPORTS_HANDOFF` is true.
    unsafe fn grant_to(&self, rec: NonNull<WaitRecord<P::Thread>>) {
        let _ = rec;
        unreachable!("lock does not support ownership handoff");
    }
}

// ---------------------------------------------------------------------------
// ClassicLock
// ---------------------------------------------------------------------------

/// Plain mutual-exclusion lock over `parking_lot`'s raw mutex. No handoff;
/// a woken waiter re-acquires it in open contention.
pub struct ClassicLock {
    raw: parking_lot::RawMutex,
    held: AtomicBool,
}

impl ClassicLock {
    pub const fn new() -> Self {
        Self {
            raw: parking_lot::RawMutex::INIT,
            held: AtomicBool::new(false),
        }
    }

    pub fn lock(&self) {
        self.raw.lock();
        self.held.store(true, Ordering::Relaxed);
    }

    pub fn unlock(&self) {
        assert!(
            self.held.swap(false, Ordering::Relaxed),
            "unlock of a ClassicLock that is not held"
        );
        // SAFETY: the held flag was set by the acquiring thread and just
        // swapped off by this call, so the lock is held in this context.
        unsafe { self.raw.unlock() };
    }
}

impl Default for ClassicLock {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Platform> RawLock<P> for ClassicLock {
    const SUPPORTS_HANDOFF: bool = false;

    fn lock(&self) {
        ClassicLock::lock(self);
    }

    fn unlock(&self) {
        ClassicLock::unlock(self);
    }
}

// ---------------------------------------------------------------------------
// HandoffMutex
// ---------------------------------------------------------------------------

/// FIFO mutex that grants ownership directly to the oldest waiter.
///
/// Waiters queue stack records exactly like condvar waiters do; `unlock`
/// never releases into open contention while someone is queued, it conveys
/// ownership to the head record and wakes that thread as the owner.
/// `grant_to` splices a condvar-transferred record into the same protocol.
pub struct HandoffMutex<P: Platform> {
    spin: RawSpin,
    owner: Cell<Option<P::Thread>>,
    waiters: WaiterQueue<P::Thread>,
}

// The owner cell and queue are only touched under `spin`.
unsafe impl<P: Platform> Sync for HandoffMutex<P> {}
unsafe impl<P: Platform> Send for HandoffMutex<P> {}

impl<P: Platform> HandoffMutex<P> {
    pub const fn new() -> Self {
        Self {
            spin: RawSpin::new(),
            owner: Cell::new(None),
            waiters: WaiterQueue::new(),
        }
    }

    /// Whether the calling thread holds the lock.
    pub fn is_held_by_current(&self) -> bool {
        let me = P::current();
        let _g = self.spin.lock();
        let owner = self.owner.take();
        let held = owner.as_ref() == Some(&me);
        self.owner.set(owner);
        held
    }

    pub fn lock(&self) {
        let me = P::current();
        let rec = WaitRecord::new(me.clone());
        {
            let _g = self.spin.lock();
            let owner = self.owner.take();
            match owner {
                None => {
                    self.owner.set(Some(me));
                    return;
                }
                Some(cur) => {
                    assert!(cur != me, "recursive lock of a HandoffMutex");
                    self.owner.set(Some(cur));
                }
            }
            // SAFETY: spin held; rec lives on this frame until it leaves
            // the queue, which only happens once a final state is
            // published below.
            unsafe { self.waiters.push_back(NonNull::from(&rec)) };
        }
        loop {
            P::suspend();
            if rec.state() == WaitState::WokenOwner {
                // Ownership was recorded by the granter before the wakeup.
                return;
            }
        }
    }

    pub fn unlock(&self) {
        let me = P::current();
        let grant = {
            let _g = self.spin.lock();
            let owner = self.owner.take();
            assert!(
                owner.as_ref() == Some(&me),
                "unlock of a HandoffMutex by a non-owner"
            );
            // SAFETY: spin held.
            match unsafe { self.waiters.pop_front() } {
                None => None,
                Some(next) => {
                    // SAFETY: next is live until it observes a final
                    // state, which has not been published yet.
                    let successor = unsafe { next.as_ref() }.thread().clone();
                    self.owner.set(Some(successor));
                    Some(next)
                }
            }
        };
        if let Some(rec) = grant {
            // SAFETY: rec was just unlinked, has no final state yet, and
            // its thread is already recorded as owner.
            unsafe { wake_owner::<P>(rec) };
        }
    }
}

impl<P: Platform> Default for HandoffMutex<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Platform> RawLock<P> for HandoffMutex<P> {
    const SUPPORTS_HANDOFF: bool = true;

    fn lock(&self) {
        HandoffMutex::lock(self);
    }

    fn unlock(&self) {
        HandoffMutex::unlock(self);
    }

    unsafe fn grant_to(&self, rec: NonNull<WaitRecord<P::Thread>>) {
        let convey = {
            let _g = self.spin.lock();
            let owner = self.owner.take();
            match owner {
                None => {
                    // Free lock implies an empty queue under the handoff
                    // discipline, so rec becomes owner right away.
                    // SAFETY: rec is live per the caller's contract.
                    let successor = unsafe { rec.as_ref() }.thread().clone();
                    self.owner.set(Some(successor));
                    true
                }
                Some(cur) => {
                    self.owner.set(Some(cur));
                    // SAFETY: spin held; rec is live and unlinked per the
                    // caller's contract, and stays live until a later
                    // unlock publishes its final state.
                    unsafe { self.waiters.push_back(rec) };
                    false
                }
            }
        };
        if convey {
            // SAFETY: rec is unlinked, final state unpublished, and its
            // thread is now the recorded owner.
            unsafe { wake_owner::<P>(rec) };
        }
    }
}
