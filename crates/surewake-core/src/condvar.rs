//! The condition variable.
//!
//! `wait` returns only because of a matching `wake_one`/`wake_all` or
//! because the caller's deadline expired; there are no spurious wakeups.
//! Wakeups go to waiters in strict FIFO order. All per-waiter bookkeeping
//! lives in the waiting thread's own call frame, so waiting allocates
//! nothing.
//!
//! When the external lock supports ownership handoff
//! ([`RawLock::SUPPORTS_HANDOFF`]), `wake_one` transfers the lock straight
//! to the chosen waiter instead of waking it to contend: the waiter
//! returns already holding the lock. With a plain lock the woken thread
//! re-acquires normally.
//!
//! A `Condvar` whose backing memory is all zero bytes is a valid empty
//! condvar, and [`Condvar::new`] is `const`, so statics need no
//! initialization ritual. There is no teardown operation; dropping a
//! condvar that still has queued waiters is a caller error.

#![allow(unsafe_code)]

use core::cell::Cell;
use core::marker::PhantomData;
use core::ptr::NonNull;
use std::time::Instant;

use crate::lock::RawLock;
use crate::platform::Platform;
use crate::queue::{WaitRecord, WaitState, WaiterQueue};
use crate::spin::RawSpin;

/// How a timed wait ended.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitStatus {
    /// An explicit `wake_one`/`wake_all` released this waiter.
    Woken,
    /// The deadline passed first. The external lock is re-acquired before
    /// returning, same as on a wakeup.
    TimedOut,
}

/// Condition variable over a [`Platform`] and an external lock type.
///
/// All waiters concurrently queued on one condvar must pass the same lock
/// instance; mixing locks panics. The lock is only remembered while the
/// queue is non-empty.
pub struct Condvar<P: Platform, L: RawLock<P>> {
    spin: RawSpin,
    waiters: WaiterQueue<P::Thread>,
    user_lock: Cell<Option<NonNull<L>>>,
    _platform: PhantomData<fn() -> P>,
}

// All fields behind `spin`; the lock pointer is only dereferenced while a
// waiter that registered it is still blocked, which keeps the lock alive.
unsafe impl<P: Platform, L: RawLock<P> + Sync> Sync for Condvar<P, L> {}
unsafe impl<P: Platform, L: RawLock<P> + Sync> Send for Condvar<P, L> {}

impl<P: Platform, L: RawLock<P>> Condvar<P, L> {
    /// An empty condvar. Equivalent to zeroed memory.
    pub const fn new() -> Self {
        Self {
            spin: RawSpin::new(),
            waiters: WaiterQueue::new(),
            user_lock: Cell::new(None),
            _platform: PhantomData,
        }
    }

    /// Blocks until an explicit wakeup. `lock` must be held by the caller;
    /// it is released for the duration of the wait and held again on
    /// return (via handoff or re-acquisition, depending on the lock).
    pub fn wait(&self, lock: &L) {
        let status = self.wait_inner(lock, None);
        debug_assert_eq!(status, WaitStatus::Woken);
    }

    /// Like [`wait`](Condvar::wait), but gives up once `deadline` passes.
    /// Exactly one of the wakeup and the timeout wins; on `TimedOut` no
    /// wakeup was consumed.
    pub fn wait_deadline(&self, lock: &L, deadline: Instant) -> WaitStatus {
        self.wait_inner(lock, Some(deadline))
    }

    /// Waits until `pred` is true, re-checking after every wakeup.
    ///
    /// Single waits never wake spuriously, but with several consumers of
    /// one condition another thread can consume the state between the
    /// wakeup and the return from `wait`, so condition re-checks stay
    /// mandatory. Use this instead of a bare `wait` whenever the wakeup
    /// stands for "the condition may now hold".
    pub fn wait_until(&self, lock: &L, mut pred: impl FnMut() -> bool) {
        while !pred() {
            self.wait(lock);
        }
    }

    fn wait_inner(&self, lock: &L, deadline: Option<Instant>) -> WaitStatus {
        let rec = WaitRecord::new(P::current());
        {
            let _g = self.spin.lock();
            let this_lock = NonNull::from(lock);
            match self.user_lock.get() {
                None => self.user_lock.set(Some(this_lock)),
                Some(cur) => assert!(
                    cur == this_lock,
                    "concurrent waiters on one condvar must use the same lock"
                ),
            }
            // SAFETY: spin held; rec lives on this frame until it leaves
            // the queue, and it only leaves the queue together with a
            // final-state publication that ends the loop below.
            unsafe { self.waiters.push_back(NonNull::from(&rec)) };
            // Unlocked while the record is already visible, so a wakeup
            // sent by the next lock holder cannot be lost. Wakers that pop
            // the record before we suspend just leave a pending permit.
            lock.unlock();
        }

        loop {
            match rec.state() {
                WaitState::WokenOwner => {
                    // Ownership was conveyed by the waker's lock handoff.
                    return WaitStatus::Woken;
                }
                WaitState::Woken => {
                    lock.lock();
                    return WaitStatus::Woken;
                }
                WaitState::TimedOut => {
                    lock.lock();
                    return WaitStatus::TimedOut;
                }
                WaitState::Waiting | WaitState::Transferred => {}
            }
            match deadline {
                None => P::suspend(),
                Some(d) => {
                    if P::suspend_until(d) && self.try_expire(&rec) {
                        lock.lock();
                        return WaitStatus::TimedOut;
                    }
                    // Either a permit arrived or a waker claimed the
                    // record first; loop until the final state lands.
                }
            }
        }
    }

    /// Timeout side of the wake-vs-deadline race. Returns true if the
    /// record was still unclaimed and the timeout won.
    fn try_expire(&self, rec: &WaitRecord<P::Thread>) -> bool {
        let _g = self.spin.lock();
        if rec.state() != WaitState::Waiting {
            return false;
        }
        // SAFETY: spin held, and a Waiting record is still linked here.
        unsafe { self.waiters.remove(NonNull::from(rec)) };
        if self.waiters.is_empty() {
            self.user_lock.set(None);
        }
        rec.publish(WaitState::TimedOut);
        true
    }

    /// Wakes the oldest waiter; does nothing if no thread is waiting.
    ///
    /// On a handoff-capable lock this conveys lock ownership to the chosen
    /// waiter (immediately if the lock is free, otherwise when the current
    /// holder unlocks); no other thread gets a chance to slip in between.
    pub fn wake_one(&self) {
        let mut runnable: Option<P::Thread> = None;
        let mut handoff: Option<(NonNull<WaitRecord<P::Thread>>, NonNull<L>)> = None;
        {
            let _g = self.spin.lock();
            // SAFETY: spin held.
            let Some(rec_ptr) = (unsafe { self.waiters.pop_front() }) else {
                return;
            };
            let grant_lock = if L::SUPPORTS_HANDOFF {
                match self.user_lock.get() {
                    Some(lock) => lock,
                    None => unreachable!("queued waiter without a recorded lock"),
                }
            } else {
                NonNull::dangling()
            };
            if self.waiters.is_empty() {
                self.user_lock.set(None);
            }
            // SAFETY: rec stays live until its final state is published,
            // and Transferred is not final.
            let rec = unsafe { rec_ptr.as_ref() };
            if L::SUPPORTS_HANDOFF {
                // Claimed under the spin so a concurrent timeout loses the
                // race before we let go of the lock.
                rec.publish(WaitState::Transferred);
                handoff = Some((rec_ptr, grant_lock));
            } else {
                // Handle copied out first: the record may be gone the
                // instant Woken is visible.
                runnable = Some(rec.thread().clone());
                rec.publish(WaitState::Woken);
            }
        }
        if let Some(thread) = runnable {
            P::make_runnable(&thread);
        }
        if let Some((rec, lock)) = handoff {
            // SAFETY: the transferred waiter stays blocked (keeping both
            // the record and the lock it borrowed alive) until the grant
            // publishes WokenOwner; rec is unlinked and Transferred.
            unsafe { lock.as_ref().grant_to(rec) };
        }
    }

    /// Wakes every waiter queued at the time of the call, in FIFO order.
    /// Each one re-acquires the lock normally; handoff never applies here.
    /// Threads that start waiting during the call are not released.
    pub fn wake_all(&self) {
        let _g = self.spin.lock();
        self.user_lock.set(None);
        // SAFETY: spin held throughout; handles are copied out before each
        // publication, and no record is touched after its state is final.
        while let Some(rec_ptr) = unsafe { self.waiters.pop_front() } {
            let rec = unsafe { rec_ptr.as_ref() };
            let thread = rec.thread().clone();
            rec.publish(WaitState::Woken);
            P::make_runnable(&thread);
        }
    }

    /// Whether any thread is currently queued. Inherently racy; useful for
    /// tests and for waker-side fast paths.
    pub fn has_waiters(&self) -> bool {
        let _g = self.spin.lock();
        !self.waiters.is_empty()
    }

    /// Number of queued waiters at this instant.
    pub fn waiter_count(&self) -> usize {
        let _g = self.spin.lock();
        // SAFETY: spin held.
        unsafe { self.waiters.len() }
    }
}

impl<P: Platform, L: RawLock<P>> Default for Condvar<P, L> {
    fn default() -> Self {
        Self::new()
    }
}
