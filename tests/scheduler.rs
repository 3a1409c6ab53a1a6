use std::{
    cell::RefCell,
    rc::Rc,
    time::{Duration, Instant},
};

use tickio::{
    scheduler::{Scheduler, TaskOutcome},
    DriveOutcome,
};

#[test]
fn runs_tasks_in_slot_order_every_tick() {
    let mut scheduler = Scheduler::new(8);
    let order: Rc<RefCell<Vec<u32>>> = Rc::new(RefCell::new(Vec::new()));

    for id in [1u32, 2, 3] {
        let order = Rc::clone(&order);
        scheduler
            .spawn(move |_| {
                order.borrow_mut().push(id);
                TaskOutcome::Active
            })
            .unwrap();
    }
    assert_eq!(scheduler.task_count(), 3);

    scheduler.tick(Instant::now());
    scheduler.tick(Instant::now());
    assert_eq!(*order.borrow(), vec![1, 2, 3, 1, 2, 3]);
}

#[test]
fn tick_passes_the_supplied_time() {
    let mut scheduler = Scheduler::new(2);
    let seen: Rc<RefCell<Option<Instant>>> = Rc::new(RefCell::new(None));
    let slot = Rc::clone(&seen);
    scheduler
        .spawn(move |now| {
            *slot.borrow_mut() = Some(now);
            TaskOutcome::Idle
        })
        .unwrap();

    let now = Instant::now() + Duration::from_secs(30);
    scheduler.tick(now);
    assert_eq!(*seen.borrow(), Some(now));
}

#[test]
fn spawn_fails_when_full() {
    let mut scheduler = Scheduler::new(2);
    scheduler.spawn(|_| TaskOutcome::Idle).unwrap();
    scheduler.spawn(|_| TaskOutcome::Idle).unwrap();
    assert!(scheduler.spawn(|_| TaskOutcome::Idle).is_err());
    assert_eq!(scheduler.task_count(), 2);
    assert_eq!(scheduler.capacity(), 2);
}

#[test]
fn completion_vacates_the_slot_mid_tick() {
    let mut scheduler = Scheduler::new(4);
    let runs: Rc<RefCell<u32>> = Rc::new(RefCell::new(0));
    let counter = Rc::clone(&runs);
    scheduler
        .spawn(move |_| {
            *counter.borrow_mut() += 1;
            if *counter.borrow() == 3 {
                TaskOutcome::Complete
            } else {
                TaskOutcome::Active
            }
        })
        .unwrap();

    for _ in 0..5 {
        scheduler.tick(Instant::now());
    }
    assert_eq!(*runs.borrow(), 3);
    assert_eq!(scheduler.task_count(), 0);

    // the slot is reusable afterwards
    scheduler.spawn(|_| TaskOutcome::Idle).unwrap();
    assert_eq!(scheduler.task_count(), 1);
}

#[test]
fn completing_task_does_not_skip_or_rerun_others() {
    let mut scheduler = Scheduler::new(4);
    let order: Rc<RefCell<Vec<&'static str>>> = Rc::new(RefCell::new(Vec::new()));

    let first = Rc::clone(&order);
    scheduler
        .spawn(move |_| {
            first.borrow_mut().push("first");
            TaskOutcome::Complete
        })
        .unwrap();
    let second = Rc::clone(&order);
    scheduler
        .spawn(move |_| {
            second.borrow_mut().push("second");
            TaskOutcome::Idle
        })
        .unwrap();

    scheduler.tick(Instant::now());
    assert_eq!(*order.borrow(), vec!["first", "second"]);
    assert_eq!(scheduler.task_count(), 1);
}

#[test]
fn stale_handles_are_inert() {
    let mut scheduler = Scheduler::new(2);
    let first = scheduler.spawn(|_| TaskOutcome::Idle).unwrap();

    assert!(scheduler.remove(first));
    assert!(!scheduler.remove(first));
    assert_eq!(scheduler.task_count(), 0);

    // the replacement reuses the slot but carries a new generation
    let ran: Rc<RefCell<u32>> = Rc::new(RefCell::new(0));
    let counter = Rc::clone(&ran);
    let second = scheduler
        .spawn(move |_| {
            *counter.borrow_mut() += 1;
            TaskOutcome::Idle
        })
        .unwrap();
    assert!(!scheduler.remove(first));
    assert_eq!(scheduler.task_count(), 1);

    scheduler.tick(Instant::now());
    assert_eq!(*ran.borrow(), 1);
    assert!(scheduler.remove(second));
}

#[test]
fn tick_outcome_reflects_task_progress() {
    let mut scheduler = Scheduler::new(2);
    assert_eq!(scheduler.tick(Instant::now()), DriveOutcome::Idle);

    scheduler.spawn(|_| TaskOutcome::Idle).unwrap();
    assert_eq!(scheduler.tick(Instant::now()), DriveOutcome::Idle);

    scheduler.spawn(|_| TaskOutcome::Active).unwrap();
    assert_eq!(scheduler.tick(Instant::now()), DriveOutcome::Active);
}

#[test]
fn min_tick_stretches_short_ticks() {
    let mut scheduler = Scheduler::new(2).with_min_tick(Duration::from_millis(20));
    scheduler.spawn(|_| TaskOutcome::Idle).unwrap();

    let started = Instant::now();
    scheduler.tick(Instant::now());
    assert!(started.elapsed() >= Duration::from_millis(15));
}

#[test]
fn dispose_clears_every_slot_and_drops_tasks() {
    let mut scheduler = Scheduler::new(4);
    let owned: Rc<RefCell<u32>> = Rc::new(RefCell::new(0));
    for _ in 0..3 {
        let owned = Rc::clone(&owned);
        scheduler
            .spawn(move |_| {
                *owned.borrow_mut() += 1;
                TaskOutcome::Idle
            })
            .unwrap();
    }
    assert_eq!(Rc::strong_count(&owned), 4);

    scheduler.dispose();
    assert_eq!(scheduler.task_count(), 0);
    assert!(scheduler.is_empty());
    // task closures were dropped, releasing their captured state
    assert_eq!(Rc::strong_count(&owned), 1);
}
