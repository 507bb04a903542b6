#![allow(missing_docs)]
#![cfg(feature = "loom")]

use adventure::{AdventureError, barrier::ReusableBarrier, group::TaskGroup};
use core::num::NonZeroUsize;
use loom::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    thread,
};

fn two() -> NonZeroUsize {
    NonZeroUsize::new(2).unwrap()
}

#[test]
fn loom_barrier_orders_phases() {
    loom::model(|| {
        // Each participant publishes its progress before arriving and reads the
        // other's progress after being released. Relaxed atomics make the
        // barrier the only source of ordering.
        let barrier = Arc::new(ReusableBarrier::new(two()));
        let progress = Arc::new([AtomicUsize::new(0), AtomicUsize::new(0)]);

        let participant = |me: usize, barrier: Arc<ReusableBarrier>, progress: Arc<[AtomicUsize; 2]>| {
            move || {
                for phase in 1..=2 {
                    progress[me].store(phase, Ordering::Relaxed);
                    barrier.wait().unwrap();
                    assert!(progress[1 - me].load(Ordering::Relaxed) >= phase);
                }
            }
        };

        let other = thread::spawn(participant(1, barrier.clone(), progress.clone()));
        participant(0, barrier.clone(), progress.clone())();
        other.join().unwrap();
        assert_eq!(barrier.generation(), 2);
    });
}

#[test]
fn loom_barrier_late_waiter_is_not_confused_by_next_phase() {
    loom::model(|| {
        // The leader of phase 0 may arrive at phase 1 before the other
        // participant even noticed phase 0 ended; exactly one leader per phase
        // must still be elected and generations must be reported in order.
        let barrier = Arc::new(ReusableBarrier::new(two()));
        let leaders = Arc::new(AtomicUsize::new(0));

        let run = |barrier: Arc<ReusableBarrier>, leaders: Arc<AtomicUsize>| {
            move || {
                for expected in 0..3 {
                    let result = barrier.wait().unwrap();
                    assert_eq!(result.generation(), expected);
                    if result.is_leader() {
                        leaders.fetch_add(1, Ordering::Relaxed);
                    }
                }
            }
        };

        let other = thread::spawn(run(barrier.clone(), leaders.clone()));
        run(barrier.clone(), leaders.clone())();
        other.join().unwrap();
        assert_eq!(leaders.load(Ordering::Relaxed), 3);
        assert_eq!(barrier.generation(), 3);
    });
}

#[test]
fn loom_barrier_poison_releases_waiter() {
    loom::model(|| {
        let barrier = Arc::new(ReusableBarrier::new(two()));
        let waiter = {
            let barrier = barrier.clone();
            thread::spawn(move || barrier.wait())
        };
        barrier.poison();
        assert!(matches!(
            waiter.join().unwrap(),
            Err(AdventureError::PhaseAborted)
        ));
    });
}

#[test]
fn loom_group_waits_for_nested_children() {
    loom::model(|| {
        // root -> child (thread A) -> grandchild (thread B)
        let (group, root) = TaskGroup::new();
        let visited = Arc::new([AtomicUsize::new(0), AtomicUsize::new(0)]);

        let child = root.fork();
        let child_thread = {
            let visited = visited.clone();
            thread::spawn(move || {
                let grandchild = child.fork();
                let grandchild_thread = {
                    let visited = visited.clone();
                    thread::spawn(move || {
                        grandchild.run(|_| visited[1].store(1, Ordering::Relaxed));
                    })
                };
                child.run(|_| visited[0].store(1, Ordering::Relaxed));
                grandchild_thread
            })
        };
        drop(root);

        group.wait().unwrap();
        assert!(group.is_drained());
        // Everything the tree did is visible once the group drained.
        assert_eq!(visited[0].load(Ordering::Relaxed), 1);
        assert_eq!(visited[1].load(Ordering::Relaxed), 1);

        child_thread.join().unwrap().join().unwrap();
    });
}

#[test]
fn loom_group_cancellation_is_reported() {
    loom::model(|| {
        let (group, root) = TaskGroup::new();
        let child = root.fork();
        let worker = thread::spawn(move || child.run(|_| {}));
        group.cancel();
        drop(root);
        assert!(matches!(group.wait(), Err(AdventureError::PhaseAborted)));
        worker.join().unwrap();
    });
}
