//! A condition variable that never wakes spuriously.
//!
//! [`Condvar::wait`] returns only because some thread called
//! [`Condvar::wake_one`] or [`Condvar::wake_all`] on this condvar, or (for
//! the timed variant) because the deadline passed. Waiters are released in
//! strict FIFO order, and all per-waiter bookkeeping lives on the waiting
//! thread's stack, so waiting and waking never allocate.
//!
//! The external lock and the scheduler are both trait seams:
//!
//! - [`RawLock`] is the lock the condition protects. [`ClassicLock`] is an
//!   ordinary host mutex; [`HandoffMutex`] additionally supports ownership
//!   handoff, which lets `wake_one` convey the lock straight to the chosen
//!   waiter (wait morphing) so it returns already holding it.
//! - [`Platform`] supplies thread identity, suspension (with or without a
//!   deadline), and wakeup delivery. [`HostPlatform`] implements it on OS
//!   threads.
//!
//! A zeroed `Condvar` is a valid empty one and [`Condvar::new`] is
//! `const`, so statics work without initialization code. There is no
//! teardown operation.
//!
//! Even without spurious wakeups, a condition shared by several consumers
//! still needs a predicate loop ([`Condvar::wait_until`]): another thread
//! can consume the state between the wakeup and the waiter's return.
//!
//! ```
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicBool, Ordering};
//! use std::thread;
//! use surewake_core::{ClassicLock, Condvar, HostPlatform};
//!
//! let cv = Arc::new(Condvar::<HostPlatform, ClassicLock>::new());
//! let lock = Arc::new(ClassicLock::new());
//! let ready = Arc::new(AtomicBool::new(false));
//!
//! let waiter = {
//!     let (cv, lock, ready) = (cv.clone(), lock.clone(), ready.clone());
//!     thread::spawn(move || {
//!         lock.lock();
//!         cv.wait_until(&lock, || ready.load(Ordering::Relaxed));
//!         lock.unlock();
//!     })
//! };
//!
//! lock.lock();
//! ready.store(true, Ordering::Relaxed);
//! cv.wake_one();
//! lock.unlock();
//! waiter.join().unwrap();
//! ```

pub mod condvar;
pub mod contract;
pub mod lock;
pub mod platform;
pub mod queue;
mod spin;

pub use condvar::{Condvar, WaitStatus};
pub use lock::{ClassicLock, HandoffMutex, RawLock};
pub use platform::{HostPlatform, HostThread, Platform};
pub use queue::WaitRecord;

/// Condvar over host OS threads, the common case.
pub type HostCondvar<L> = Condvar<HostPlatform, L>;
