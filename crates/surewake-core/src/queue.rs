//! Per-wait records and the intrusive FIFO they link into.
//!
//! A [`WaitRecord`] lives in the waiting thread's own call frame for the
//! duration of exactly one wait. The queue stores raw links into that
//! storage, so enqueueing and waking never allocate. Every link mutation
//! happens under the spinlock of the primitive that owns the queue; the
//! outcome word is atomic so the woken thread can read its result after
//! the waker has already dropped that lock.

#![allow(unsafe_code)]

use core::cell::Cell;
use core::ptr::{self, NonNull};
use core::sync::atomic::{AtomicU8, Ordering};

use crate::platform::Platform;

/// Outcome slot of a [`WaitRecord`].
///
/// `Waiting` is the zero value. `Transferred` is the wait-morphing
/// intermediate: the record has been claimed by a waker and handed to the
/// external lock, but ownership has not been conveyed yet. The waiting
/// thread may only return once it observes `Woken`, `WokenOwner`, or
/// `TimedOut`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub(crate) enum WaitState {
    Waiting = 0,
    Transferred = 1,
    Woken = 2,
    WokenOwner = 3,
    TimedOut = 4,
}

impl WaitState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => WaitState::Waiting,
            1 => WaitState::Transferred,
            2 => WaitState::Woken,
            3 => WaitState::WokenOwner,
            4 => WaitState::TimedOut,
            _ => unreachable!("corrupt wait state {raw}"),
        }
    }
}

/// Bookkeeping for one blocked thread, owned by that thread's stack frame.
///
/// A record is reachable from a queue only while its thread is blocked in
/// the corresponding wait call; whoever unlinks it must publish a final
/// state so the owner can tear it down.
pub struct WaitRecord<T> {
    next: Cell<*mut WaitRecord<T>>,
    prev: Cell<*mut WaitRecord<T>>,
    thread: T,
    state: AtomicU8,
}

impl<T> WaitRecord<T> {
    pub(crate) fn new(thread: T) -> Self {
        Self {
            next: Cell::new(ptr::null_mut()),
            prev: Cell::new(ptr::null_mut()),
            thread,
            state: AtomicU8::new(WaitState::Waiting as u8),
        }
    }

    /// Handle used to reawaken the thread that owns this record.
    pub fn thread(&self) -> &T {
        &self.thread
    }

    pub(crate) fn state(&self) -> WaitState {
        WaitState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Publishes the record's outcome. After a final state (anything other
    /// than `Transferred`) is published, the owning thread may return and
    /// pop the record's stack frame, so the publisher must not touch the
    /// record again; copy the thread handle out first.
    pub(crate) fn publish(&self, state: WaitState) {
        self.state.store(state as u8, Ordering::Release);
    }
}

/// Marks `rec` as owning its external lock and delivers the wakeup.
///
/// This is the final step of an ownership grant: lock implementations call
/// it once the waiter's thread is the lock's owner.
///
/// # Safety
///
/// `rec` must point to a live record that has been unlinked from every
/// queue and has no final state published yet. The caller must have
/// recorded the waiter as the lock's owner before calling.
pub unsafe fn wake_owner<P: Platform>(rec: NonNull<WaitRecord<P::Thread>>) {
    // SAFETY: the record is live until its owner observes a final state,
    // which is only published below.
    let rec = unsafe { rec.as_ref() };
    let thread = rec.thread().clone();
    rec.publish(WaitState::WokenOwner);
    P::make_runnable(&thread);
}

/// Intrusive FIFO of [`WaitRecord`]s, oldest at the head.
///
/// Purely pointer relinking; the queue owns nothing. All-zero bytes are a
/// valid empty queue. The mutating operations are `unsafe` because they
/// dereference the raw links: the caller must hold the lock that guards
/// this queue and every record linked into it.
pub struct WaiterQueue<T> {
    head: Cell<*mut WaitRecord<T>>,
    tail: Cell<*mut WaitRecord<T>>,
}

impl<T> WaiterQueue<T> {
    pub const fn new() -> Self {
        Self {
            head: Cell::new(ptr::null_mut()),
            tail: Cell::new(ptr::null_mut()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.head.get().is_null()
    }

    /// Appends `rec` at the tail (newest position).
    ///
    /// # Safety
    ///
    /// Caller holds the guarding lock; `rec` is live, unlinked, and stays
    /// live until removed from the queue.
    pub unsafe fn push_back(&self, rec: NonNull<WaitRecord<T>>) {
        let rec_ptr = rec.as_ptr();
        let old_tail = self.tail.get();
        // SAFETY: per contract, rec and old_tail (if any) are live records
        // linked only into this queue, and we hold its guarding lock.
        unsafe {
            (*rec_ptr).next.set(ptr::null_mut());
            (*rec_ptr).prev.set(old_tail);
            if old_tail.is_null() {
                self.head.set(rec_ptr);
            } else {
                (*old_tail).next.set(rec_ptr);
            }
        }
        self.tail.set(rec_ptr);
    }

    /// Unlinks and returns the oldest record, if any.
    ///
    /// # Safety
    ///
    /// Caller holds the guarding lock.
    pub unsafe fn pop_front(&self) -> Option<NonNull<WaitRecord<T>>> {
        let head = self.head.get();
        if head.is_null() {
            return None;
        }
        // SAFETY: head is a live linked record; we hold the guarding lock.
        unsafe {
            let next = (*head).next.get();
            self.head.set(next);
            if next.is_null() {
                self.tail.set(ptr::null_mut());
            } else {
                (*next).prev.set(ptr::null_mut());
            }
            (*head).next.set(ptr::null_mut());
            (*head).prev.set(ptr::null_mut());
            Some(NonNull::new_unchecked(head))
        }
    }

    /// Unlinks `rec` from anywhere in the queue in O(1). Used by the
    /// timeout path, where the expiring record is usually not the head.
    ///
    /// # Safety
    ///
    /// Caller holds the guarding lock and `rec` is currently linked into
    /// this queue.
    pub unsafe fn remove(&self, rec: NonNull<WaitRecord<T>>) {
        let rec_ptr = rec.as_ptr();
        // SAFETY: rec and its neighbors are live linked records; we hold
        // the guarding lock.
        unsafe {
            let prev = (*rec_ptr).prev.get();
            let next = (*rec_ptr).next.get();
            if prev.is_null() {
                self.head.set(next);
            } else {
                (*prev).next.set(next);
            }
            if next.is_null() {
                self.tail.set(prev);
            } else {
                (*next).prev.set(prev);
            }
            (*rec_ptr).next.set(ptr::null_mut());
            (*rec_ptr).prev.set(ptr::null_mut());
        }
    }

    /// Number of linked records.
    ///
    /// # Safety
    ///
    /// Caller holds the guarding lock.
    pub unsafe fn len(&self) -> usize {
        let mut n = 0;
        let mut cur = self.head.get();
        while !cur.is_null() {
            n += 1;
            // SAFETY: cur is a live linked record; we hold the guarding lock.
            cur = unsafe { (*cur).next.get() };
        }
        n
    }
}
