//! Abstract transition contract for the condvar.
//!
//! A tiny executable model of the observable behavior: how each operation
//! changes the queued-waiter count, how many waiters it releases, and
//! which wake strategy makes the released thread re-acquire the external
//! lock. The model is pure `const fn` arithmetic with no threads in it,
//! which makes the core guarantees (nothing releases a waiter except an
//! explicit wake or an expired timer; wake-all drains exactly the queue
//! found at call time) checkable as a plain case table.

/// Coarse lifecycle phase, derived from the queued-waiter count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CondvarPhase {
    /// No thread queued.
    Idle,
    /// At least one thread queued.
    Waiting,
}

/// Operations that can touch the waiter queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CondvarOp {
    /// A thread enters an untimed wait.
    Wait,
    /// A thread enters a wait with a deadline.
    TimedWait,
    /// `wake_one`.
    WakeOne,
    /// `wake_all`.
    WakeAll,
    /// A timed waiter's deadline fires while its record is unclaimed.
    TimerExpire,
}

/// Wake strategy selected by the external lock type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeStrategy {
    /// Woken waiter re-acquires the lock in open contention.
    Classic,
    /// `wake_one` conveys lock ownership to the waiter directly.
    Morphing,
}

/// Effect of one operation on the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// Queued waiters after the operation.
    pub queued: usize,
    /// Waiters released to their callers by the operation.
    pub released: usize,
}

pub const fn phase(queued: usize) -> CondvarPhase {
    if queued == 0 {
        CondvarPhase::Idle
    } else {
        CondvarPhase::Waiting
    }
}

/// Applies `op` to a condvar with `queued` waiters.
///
/// Every release is accounted to exactly one of `WakeOne`, `WakeAll`, or
/// `TimerExpire`; `Wait`/`TimedWait` never release anyone. That is the
/// no-spurious-wakeup property at the model level.
#[must_use]
pub const fn condvar_transition(queued: usize, op: CondvarOp) -> Transition {
    match op {
        CondvarOp::Wait | CondvarOp::TimedWait => Transition {
            queued: queued + 1,
            released: 0,
        },
        CondvarOp::WakeOne | CondvarOp::TimerExpire => {
            if queued == 0 {
                // wake_one on an empty queue is a no-op; a timer that
                // fires after a wake claimed its record releases nothing
                // extra.
                Transition {
                    queued: 0,
                    released: 0,
                }
            } else {
                Transition {
                    queued: queued - 1,
                    released: 1,
                }
            }
        }
        CondvarOp::WakeAll => Transition {
            queued: 0,
            released: queued,
        },
    }
}

/// Whether a waiter released by `op` re-acquires the external lock itself.
///
/// Morphing only short-circuits the single-wakeup path; broadcast and
/// timeout always go through ordinary re-acquisition.
#[must_use]
pub const fn strategy_reacquires_lock(strategy: WakeStrategy, op: CondvarOp) -> bool {
    match (strategy, op) {
        (WakeStrategy::Morphing, CondvarOp::WakeOne) => false,
        _ => true,
    }
}
