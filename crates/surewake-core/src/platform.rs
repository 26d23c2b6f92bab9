//! Scheduler and timer seam.
//!
//! The condvar needs exactly three capabilities from its environment:
//! identify the current thread, suspend it (optionally with a deadline),
//! and make a suspended thread runnable again. [`Platform`] captures those
//! and nothing else, so the same wait/wake logic runs on a host OS thread
//! or on a kernel scheduler.

use std::time::Instant;

/// Environment capabilities required by the wait/wake machinery.
///
/// The suspension primitive is permit-based: a `make_runnable` delivered
/// before the target suspends must not be lost, and the target's next
/// suspension consumes it instead of blocking. A suspension may also end
/// without a permit (a stray earlier permit, or host-level noise), so
/// callers always re-check their wakeup condition in a loop.
pub trait Platform {
    /// Opaque handle naming one thread. Cloned by wakers before they
    /// publish a wakeup, since the waiter's stack record may vanish the
    /// moment the wakeup is visible.
    type Thread: Clone + PartialEq + Send + 'static;

    /// Handle of the calling thread.
    fn current() -> Self::Thread;

    /// Blocks the calling thread until a permit arrives. Consumes one
    /// pending permit immediately if present.
    fn suspend();

    /// Blocks like [`suspend`](Platform::suspend), but returns once
    /// `deadline` passes even without a permit. Returns `true` if the
    /// deadline passed, `false` if a permit ended the suspension.
    fn suspend_until(deadline: Instant) -> bool;

    /// Delivers a permit to `thread`, waking it if suspended. Never
    /// blocks for long and is safe to call from any thread.
    fn make_runnable(thread: &Self::Thread);
}

/// [`Platform`] backed by host OS threads.
///
/// Each thread owns a parker (a boolean permit under a `parking_lot`
/// mutex/condvar pair) living in a thread-local `Arc`; the `Thread` handle
/// is a clone of that `Arc`, so a waker can deliver the permit even after
/// the parked thread has left the wait call.
pub struct HostPlatform;

mod parker {
    use std::sync::Arc;
    use std::time::Instant;

    use parking_lot::{Condvar, Mutex};

    pub struct Parker {
        permit: Mutex<bool>,
        ready: Condvar,
    }

    impl Parker {
        fn new() -> Self {
            Self {
                permit: Mutex::new(false),
                ready: Condvar::new(),
            }
        }

        pub fn park(&self) {
            let mut permit = self.permit.lock();
            while !*permit {
                self.ready.wait(&mut permit);
            }
            *permit = false;
        }

        /// Returns `true` on deadline expiry without a permit.
        pub fn park_until(&self, deadline: Instant) -> bool {
            let mut permit = self.permit.lock();
            while !*permit {
                if self.ready.wait_until(&mut permit, deadline).timed_out() {
                    let expired = !*permit;
                    *permit = false;
                    return expired;
                }
            }
            *permit = false;
            false
        }

        pub fn unpark(&self) {
            let mut permit = self.permit.lock();
            *permit = true;
            self.ready.notify_one();
        }
    }

    thread_local! {
        static CURRENT: Arc<Parker> = Arc::new(Parker::new());
    }

    pub fn current() -> Arc<Parker> {
        CURRENT.with(Arc::clone)
    }
}

/// Handle to a host thread's parker.
#[derive(Clone)]
pub struct HostThread(std::sync::Arc<parker::Parker>);

impl PartialEq for HostThread {
    fn eq(&self, other: &Self) -> bool {
        std::sync::Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Platform for HostPlatform {
    type Thread = HostThread;

    fn current() -> HostThread {
        HostThread(parker::current())
    }

    fn suspend() {
        parker::current().park();
    }

    fn suspend_until(deadline: Instant) -> bool {
        parker::current().park_until(deadline)
    }

    fn make_runnable(thread: &HostThread) {
        thread.0.unpark();
    }
}
