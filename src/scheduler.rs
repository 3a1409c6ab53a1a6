//! Cooperative single-threaded tick scheduler.
//!
//! A [`Scheduler`] owns a fixed-capacity table of task slots and advances every live task
//! once per [`Scheduler::tick`], passing the caller-supplied monotonic time. There is no
//! preemption and no hidden threading: a task runs until it returns, so tasks must do one
//! bounded unit of work per invocation.
//!
//! A task removes itself by returning [`TaskOutcome::Complete`] from its own invocation,
//! which vacates its slot mid-tick without disturbing the iteration. External removal goes
//! through [`Scheduler::remove`] with the handle returned at spawn time; handles carry a
//! generation counter, so a handle that outlived its task (the slot was vacated or reused)
//! is ignored instead of destroying an unrelated task.

use std::time::{Duration, Instant};

use log::trace;

use crate::DriveOutcome;

/// Returned by a scheduler task to report progress and control its own lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    /// Work was done; tick again as soon as possible.
    Active,
    /// No work was available this tick.
    Idle,
    /// The task is finished; vacate its slot.
    Complete,
}

/// Handle to a spawned task, valid until the task completes or is removed.
///
/// Holding a handle past its task's lifetime is safe: the generation counter makes stale
/// handles inert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskHandle {
    index: usize,
    generation: u64,
}

/// Error returned by [`Scheduler::spawn`] when every slot is occupied.
#[derive(Debug, thiserror::Error)]
#[error("scheduler task table is full")]
pub struct SchedulerFull;

type TaskFn = Box<dyn FnMut(Instant) -> TaskOutcome>;

struct Slot {
    generation: u64,
    task: Option<TaskFn>,
}

/// A fixed-capacity cooperative task table.
///
/// Explicitly constructed and owned by whoever drives it; multiple independent schedulers
/// are fine. Tick order follows slot order, which callers must not rely on for priority.
pub struct Scheduler {
    slots: Vec<Slot>,
    min_tick: Option<Duration>,
}
impl Scheduler {
    /// Create a scheduler with a fixed number of task slots.
    pub fn new(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        for _ in 0..capacity {
            slots.push(Slot {
                generation: 0,
                task: None,
            });
        }
        Self {
            slots,
            min_tick: None,
        }
    }

    /// Enforce a minimum wall-clock duration per tick; a tick that finishes early sleeps
    /// the remainder. Useful to yield CPU fairly when the table is mostly idle.
    pub fn with_min_tick(mut self, min_tick: Duration) -> Self {
        self.min_tick = Some(min_tick);
        self
    }

    /// Claim a free slot for `task` and return its handle.
    ///
    /// The task is invoked once per tick with the tick's `now` until it returns
    /// [`TaskOutcome::Complete`] or is removed.
    pub fn spawn<F>(&mut self, task: F) -> Result<TaskHandle, SchedulerFull>
    where
        F: FnMut(Instant) -> TaskOutcome + 'static,
    {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.task.is_none() {
                slot.task = Some(Box::new(task));
                trace!("scheduler spawned task in slot {index}");
                return Ok(TaskHandle {
                    index,
                    generation: slot.generation,
                });
            }
        }
        Err(SchedulerFull)
    }

    /// Remove the task behind `handle`, vacating its slot.
    ///
    /// Returns `false` when the handle is stale: its task already completed, was removed,
    /// or its slot has been reused by a later spawn.
    pub fn remove(&mut self, handle: TaskHandle) -> bool {
        match self.slots.get_mut(handle.index) {
            Some(slot) if slot.generation == handle.generation && slot.task.is_some() => {
                slot.task = None;
                slot.generation += 1;
                trace!("scheduler removed task in slot {}", handle.index);
                true
            }
            _ => false,
        }
    }

    /// Invoke every live task once, in slot order, passing `now`.
    ///
    /// Returns [`DriveOutcome::Active`] when any task reported progress or completed.
    /// Tasks spawned before this call are all visited exactly once, even when earlier
    /// tasks complete mid-iteration.
    pub fn tick(&mut self, now: Instant) -> DriveOutcome {
        let started = Instant::now();
        let mut outcome = DriveOutcome::Idle;
        for index in 0..self.slots.len() {
            let Some(mut task) = self.slots[index].task.take() else {
                continue;
            };
            match task(now) {
                TaskOutcome::Active => {
                    self.slots[index].task = Some(task);
                    outcome = DriveOutcome::Active;
                }
                TaskOutcome::Idle => {
                    self.slots[index].task = Some(task);
                }
                TaskOutcome::Complete => {
                    self.slots[index].generation += 1;
                    outcome = DriveOutcome::Active;
                    trace!("scheduler task in slot {index} completed");
                }
            }
        }
        if let Some(min_tick) = self.min_tick {
            let elapsed = started.elapsed();
            if elapsed < min_tick {
                std::thread::sleep(min_tick - elapsed);
            }
        }
        outcome
    }

    /// Number of occupied slots.
    pub fn task_count(&self) -> usize {
        self.slots.iter().filter(|s| s.task.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.task_count() == 0
    }

    /// Total number of slots, occupied or not.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Vacate every slot.
    ///
    /// Task closures are dropped, releasing whatever state they own; callers remain
    /// responsible for any external resources a task did not own.
    pub fn dispose(&mut self) {
        for slot in self.slots.iter_mut() {
            if slot.task.take().is_some() {
                slot.generation += 1;
            }
        }
    }
}
impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("capacity", &self.slots.len())
            .field("task_count", &self.task_count())
            .finish()
    }
}
