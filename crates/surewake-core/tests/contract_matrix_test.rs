//! Case-table check of the abstract transition contract.

use surewake_core::contract::{
    condvar_transition, phase, strategy_reacquires_lock, CondvarOp, CondvarPhase, Transition,
    WakeStrategy,
};

struct Case {
    name: &'static str,
    queued: usize,
    op: CondvarOp,
    expect: Transition,
}

const CASES: &[Case] = &[
    Case {
        name: "wait_on_idle_enqueues",
        queued: 0,
        op: CondvarOp::Wait,
        expect: Transition { queued: 1, released: 0 },
    },
    Case {
        name: "timed_wait_stacks_behind_existing_waiters",
        queued: 2,
        op: CondvarOp::TimedWait,
        expect: Transition { queued: 3, released: 0 },
    },
    Case {
        name: "wake_one_on_idle_is_noop",
        queued: 0,
        op: CondvarOp::WakeOne,
        expect: Transition { queued: 0, released: 0 },
    },
    Case {
        name: "wake_one_releases_the_oldest",
        queued: 3,
        op: CondvarOp::WakeOne,
        expect: Transition { queued: 2, released: 1 },
    },
    Case {
        name: "wake_all_on_idle_is_noop",
        queued: 0,
        op: CondvarOp::WakeAll,
        expect: Transition { queued: 0, released: 0 },
    },
    Case {
        name: "wake_all_drains_the_queue",
        queued: 4,
        op: CondvarOp::WakeAll,
        expect: Transition { queued: 0, released: 4 },
    },
    Case {
        name: "timer_expiry_releases_its_waiter",
        queued: 2,
        op: CondvarOp::TimerExpire,
        expect: Transition { queued: 1, released: 1 },
    },
    Case {
        name: "timer_losing_the_race_releases_nothing",
        queued: 0,
        op: CondvarOp::TimerExpire,
        expect: Transition { queued: 0, released: 0 },
    },
];

#[test]
fn transition_matrix() {
    for case in CASES {
        let got = condvar_transition(case.queued, case.op);
        assert_eq!(got, case.expect, "case {}", case.name);
    }
}

#[test]
fn no_release_without_wake_or_timer() {
    for queued in 0..16 {
        for op in [CondvarOp::Wait, CondvarOp::TimedWait] {
            assert_eq!(condvar_transition(queued, op).released, 0);
        }
    }
}

#[test]
fn wake_one_never_releases_more_than_one() {
    for queued in 0..16 {
        assert!(condvar_transition(queued, CondvarOp::WakeOne).released <= 1);
    }
}

#[test]
fn strategy_matrix() {
    let cases: &[(WakeStrategy, CondvarOp, bool)] = &[
        (WakeStrategy::Classic, CondvarOp::WakeOne, true),
        (WakeStrategy::Classic, CondvarOp::WakeAll, true),
        (WakeStrategy::Classic, CondvarOp::TimerExpire, true),
        (WakeStrategy::Morphing, CondvarOp::WakeOne, false),
        (WakeStrategy::Morphing, CondvarOp::WakeAll, true),
        (WakeStrategy::Morphing, CondvarOp::TimerExpire, true),
    ];
    for &(strategy, op, expect) in cases {
        assert_eq!(
            strategy_reacquires_lock(strategy, op),
            expect,
            "{strategy:?} / {op:?}"
        );
    }
}

#[test]
fn phase_matches_queue_state() {
    assert_eq!(phase(0), CondvarPhase::Idle);
    for queued in 1..8 {
        assert_eq!(phase(queued), CondvarPhase::Waiting);
    }
}
