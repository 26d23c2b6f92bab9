//! Executable scenarios, one per guarantee of the primitive.
//!
//! A scenario is a plain function driving real threads against
//! `surewake-core`; it fails by panicking (failed assertion or a panicked
//! worker thread propagated through `join`). [`Scenario::execute`] turns
//! the panic into a structured [`ScenarioOutcome`].

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use surewake_core::{ClassicLock, Condvar, HandoffMutex, HostCondvar, HostPlatform, WaitStatus};

use crate::report::ScenarioOutcome;

type ClassicCondvar = HostCondvar<ClassicLock>;
type MorphCondvar = Condvar<HostPlatform, HandoffMutex<HostPlatform>>;

/// One named scenario.
pub struct Scenario {
    pub name: &'static str,
    pub summary: &'static str,
    run: fn(),
}

impl Scenario {
    /// Runs the scenario, converting a panic into a failed outcome.
    #[must_use]
    pub fn execute(&self) -> ScenarioOutcome {
        let result = panic::catch_unwind(AssertUnwindSafe(self.run));
        let detail = result.err().map(|payload| {
            if let Some(s) = payload.downcast_ref::<&str>() {
                (*s).to_string()
            } else if let Some(s) = payload.downcast_ref::<String>() {
                s.clone()
            } else {
                "scenario panicked".to_string()
            }
        });
        ScenarioOutcome {
            name: self.name.to_string(),
            summary: self.summary.to_string(),
            passed: detail.is_none(),
            detail,
        }
    }
}

/// Every scenario, in a stable order.
#[must_use]
pub fn all_scenarios() -> &'static [Scenario] {
    &SCENARIOS
}

static SCENARIOS: [Scenario; 9] = [
    Scenario {
        name: "no_spurious_wakeup",
        summary: "wait stays blocked until an explicit wake",
        run: no_spurious_wakeup,
    },
    Scenario {
        name: "fifo_wake_order",
        summary: "wake_one releases waiters oldest first",
        run: fifo_wake_order,
    },
    Scenario {
        name: "wake_all_completeness",
        summary: "wake_all releases everyone queued, later arrivals stay",
        run: wake_all_completeness,
    },
    Scenario {
        name: "timeout_wake_single_winner",
        summary: "a racing wake and deadline never both claim a waiter",
        run: timeout_wake_single_winner,
    },
    Scenario {
        name: "timed_out_holds_lock",
        summary: "a timed-out waiter returns holding the external lock",
        run: timed_out_holds_lock,
    },
    Scenario {
        name: "morphing_direct_handoff",
        summary: "wake_one on a free handoff lock conveys ownership at once",
        run: morphing_direct_handoff,
    },
    Scenario {
        name: "morphing_deferred_handoff",
        summary: "ownership transfer waits for the waker's unlock",
        run: morphing_deferred_handoff,
    },
    Scenario {
        name: "waker_decides",
        summary: "waker-side permit accounting needs no waiter re-check",
        run: waker_decides,
    },
    Scenario {
        name: "static_condvar",
        summary: "const-constructed statics work with no init code",
        run: static_condvar,
    },
];

fn spin_until(what: &str, mut cond: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !cond() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        thread::yield_now();
    }
}

fn no_spurious_wakeup() {
    let cv = Arc::new(ClassicCondvar::new());
    let lock = Arc::new(ClassicLock::new());
    let returned = Arc::new(AtomicBool::new(false));

    let waiter = {
        let (cv, lock, returned) = (cv.clone(), lock.clone(), returned.clone());
        thread::spawn(move || {
            lock.lock();
            cv.wait(&lock);
            returned.store(true, Ordering::SeqCst);
            lock.unlock();
        })
    };

    spin_until("waiter to queue", || cv.has_waiters());
    thread::sleep(Duration::from_millis(150));
    assert!(
        !returned.load(Ordering::SeqCst),
        "waiter returned without a wake"
    );

    lock.lock();
    cv.wake_one();
    lock.unlock();
    waiter.join().expect("waiter thread");
}

fn fifo_wake_order() {
    let cv = Arc::new(ClassicCondvar::new());
    let lock = Arc::new(ClassicLock::new());
    let order = Arc::new(parking_lot::Mutex::new(Vec::new()));

    let mut waiters = Vec::new();
    for id in 0..4u32 {
        waiters.push(thread::spawn({
            let (cv, lock, order) = (cv.clone(), lock.clone(), order.clone());
            move || {
                lock.lock();
                cv.wait(&lock);
                lock.unlock();
                order.lock().push(id);
            }
        }));
        spin_until("waiter to queue", || cv.waiter_count() as u32 == id + 1);
    }

    for woken in 1..=4usize {
        cv.wake_one();
        spin_until("woken waiter to record", || order.lock().len() == woken);
    }
    for w in waiters {
        w.join().expect("waiter thread");
    }
    assert_eq!(*order.lock(), vec![0, 1, 2, 3], "wake order not FIFO");
}

fn wake_all_completeness() {
    let cv = Arc::new(ClassicCondvar::new());
    let lock = Arc::new(ClassicLock::new());
    let released = Arc::new(AtomicUsize::new(0));

    let mut waiters = Vec::new();
    for _ in 0..5 {
        let (cv, lock, released) = (cv.clone(), lock.clone(), released.clone());
        waiters.push(thread::spawn(move || {
            lock.lock();
            cv.wait(&lock);
            lock.unlock();
            released.fetch_add(1, Ordering::SeqCst);
        }));
    }
    spin_until("all waiters to queue", || cv.waiter_count() == 5);
    cv.wake_all();
    for w in waiters {
        w.join().expect("waiter thread");
    }
    assert_eq!(released.load(Ordering::SeqCst), 5);

    // A waiter that arrives after the broadcast is untouched by it.
    let late = {
        let (cv, lock) = (cv.clone(), lock.clone());
        thread::spawn(move || {
            lock.lock();
            cv.wait(&lock);
            lock.unlock();
        })
    };
    spin_until("late waiter to queue", || cv.has_waiters());
    thread::sleep(Duration::from_millis(100));
    assert!(!late.is_finished(), "late waiter released by earlier broadcast");
    cv.wake_one();
    late.join().expect("late waiter thread");
}

fn timeout_wake_single_winner() {
    let cv = Arc::new(ClassicCondvar::new());
    let lock = Arc::new(ClassicLock::new());

    for round in 0..20u64 {
        let wait_ms = 1 + round % 3;
        let wake_ms = 1 + (round / 2) % 3;

        let waiter = {
            let (cv, lock) = (cv.clone(), lock.clone());
            thread::spawn(move || {
                lock.lock();
                let status =
                    cv.wait_deadline(&lock, Instant::now() + Duration::from_millis(wait_ms));
                lock.unlock();
                status
            })
        };
        let waker = {
            let (cv, lock) = (cv.clone(), lock.clone());
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(wake_ms));
                lock.lock();
                cv.wake_one();
                lock.unlock();
            })
        };

        // Either outcome is legal; hangs and queue corruption are not.
        let _status: WaitStatus = waiter.join().expect("waiter thread");
        waker.join().expect("waker thread");
        assert_eq!(cv.waiter_count(), 0, "record leaked after round {round}");
    }
}

fn timed_out_holds_lock() {
    let cv = ClassicCondvar::new();
    let lock = ClassicLock::new();

    lock.lock();
    let start = Instant::now();
    let status = cv.wait_deadline(&lock, start + Duration::from_millis(10));
    assert_eq!(status, WaitStatus::TimedOut);
    assert!(start.elapsed() >= Duration::from_millis(10), "returned early");
    // Unlock panics unless the lock actually came back with us.
    lock.unlock();
}

fn morphing_direct_handoff() {
    let cv = Arc::new(MorphCondvar::new());
    let lock = Arc::new(HandoffMutex::<HostPlatform>::new());

    let waiter = {
        let (cv, lock) = (cv.clone(), lock.clone());
        thread::spawn(move || {
            lock.lock();
            cv.wait(&lock);
            assert!(
                lock.is_held_by_current(),
                "waiter returned without lock ownership"
            );
            lock.unlock();
        })
    };
    spin_until("waiter to queue", || cv.has_waiters());
    // The lock is free, so the grant conveys ownership on the spot.
    cv.wake_one();
    waiter.join().expect("waiter thread");
}

fn morphing_deferred_handoff() {
    let cv = Arc::new(MorphCondvar::new());
    let lock = Arc::new(HandoffMutex::<HostPlatform>::new());

    let waiter = {
        let (cv, lock) = (cv.clone(), lock.clone());
        thread::spawn(move || {
            lock.lock();
            cv.wait(&lock);
            assert!(lock.is_held_by_current());
            lock.unlock();
        })
    };
    spin_until("waiter to queue", || cv.has_waiters());

    lock.lock();
    cv.wake_one();
    // Ownership is pledged but not conveyed while we still hold the lock.
    thread::sleep(Duration::from_millis(80));
    assert!(!waiter.is_finished(), "waiter ran inside waker's critical section");
    lock.unlock();
    waiter.join().expect("waiter thread");
}

fn waker_decides() {
    struct Sem {
        lock: ClassicLock,
        permits: AtomicU32,
        cv: ClassicCondvar,
    }

    impl Sem {
        // The permit counter only changes while `lock` is held.
        fn post(&self) {
            self.lock.lock();
            if self.cv.has_waiters() {
                // Permit handed straight to the oldest waiter.
                self.cv.wake_one();
            } else {
                self.permits.fetch_add(1, Ordering::Relaxed);
            }
            self.lock.unlock();
        }

        fn acquire(&self) {
            self.lock.lock();
            if self.permits.load(Ordering::Relaxed) > 0 {
                self.permits.fetch_sub(1, Ordering::Relaxed);
            } else {
                // Being woken is the permit; no re-check needed.
                self.cv.wait(&self.lock);
            }
            self.lock.unlock();
        }
    }

    let sem = Arc::new(Sem {
        lock: ClassicLock::new(),
        permits: AtomicU32::new(0),
        cv: ClassicCondvar::new(),
    });

    let mut takers = Vec::new();
    for _ in 0..3 {
        let sem = sem.clone();
        takers.push(thread::spawn(move || sem.acquire()));
    }
    spin_until("takers to queue", || sem.cv.waiter_count() == 3);

    for _ in 0..3 {
        sem.post();
    }
    for t in takers {
        t.join().expect("taker thread");
    }

    sem.post();
    assert_eq!(sem.permits.load(Ordering::Relaxed), 1);
    sem.acquire();
    assert_eq!(sem.permits.load(Ordering::Relaxed), 0);
}

fn static_condvar() {
    static CV: ClassicCondvar = ClassicCondvar::new();
    static LOCK: ClassicLock = ClassicLock::new();

    let waiter = thread::spawn(|| {
        LOCK.lock();
        CV.wait(&LOCK);
        LOCK.unlock();
    });
    spin_until("waiter to queue", || CV.has_waiters());
    LOCK.lock();
    CV.wake_one();
    LOCK.unlock();
    waiter.join().expect("waiter thread");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_names_are_unique() {
        let mut names: Vec<_> = all_scenarios().iter().map(|s| s.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), all_scenarios().len());
    }

    #[test]
    fn failing_run_is_reported_not_propagated() {
        let scenario = Scenario {
            name: "always_fails",
            summary: "fixture",
            run: || panic!("expected failure"),
        };
        let outcome = scenario.execute();
        assert!(!outcome.passed);
        assert_eq!(outcome.detail.as_deref(), Some("expected failure"));
    }
}
